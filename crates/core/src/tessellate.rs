use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::error::ChartError;
use crate::geometry::{Point, Polygon};
use crate::hierarchy::Hierarchy;

/// Pluggable tessellation capability: annotate every hierarchy node with a
/// polygon (and leaves with a site point), partitioning the boundary so
/// sibling areas are proportional to their values.
pub trait Tessellator {
    fn tessellate(
        &self,
        hierarchy: &mut Hierarchy,
        boundary: &Polygon,
        seed: u64,
    ) -> Result<(), ChartError>;
}

/// Weighted-Voronoi (power diagram) treemap. Each internal node's polygon is
/// partitioned among its children by clipping against pairwise power
/// bisectors, with Lloyd-style site relaxation and multiplicative weight
/// adaptation until cell areas match the value proportions within tolerance.
pub struct PowerDiagram {
    pub max_iterations: usize,
    /// Convergence bound on the worst per-cell area error, as a fraction of
    /// the parent polygon's area.
    pub tolerance: f64,
}

impl Default for PowerDiagram {
    fn default() -> Self {
        PowerDiagram {
            max_iterations: 400,
            tolerance: 0.005,
        }
    }
}

impl Tessellator for PowerDiagram {
    fn tessellate(
        &self,
        hierarchy: &mut Hierarchy,
        boundary: &Polygon,
        seed: u64,
    ) -> Result<(), ChartError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let root = hierarchy.root;
        hierarchy.nodes[root.0 as usize].polygon = Some(boundary.clone());
        hierarchy.nodes[root.0 as usize].site = Some(boundary.centroid());

        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            let children = hierarchy.node(id).children.clone();
            if children.is_empty() {
                continue;
            }
            let parent_poly = match hierarchy.node(id).polygon.clone() {
                Some(p) => p,
                None => continue,
            };
            let values: Vec<f64> = children
                .iter()
                .map(|c| hierarchy.node(*c).value)
                .collect();
            let cells = self.partition(&parent_poly, &values, &mut rng);
            for (child, (cell, site)) in children.iter().zip(cells) {
                let node = &mut hierarchy.nodes[child.0 as usize];
                node.polygon = Some(cell);
                node.site = Some(site);
                queue.push_back(*child);
            }
        }
        Ok(())
    }
}

impl PowerDiagram {
    /// Split `parent` into one cell per value, returning each cell with its
    /// interior site point.
    fn partition(
        &self,
        parent: &Polygon,
        values: &[f64],
        rng: &mut StdRng,
    ) -> Vec<(Polygon, Point)> {
        let n = values.len();
        let parent_area = parent.area();
        if n == 1 {
            return vec![(parent.clone(), parent.centroid())];
        }
        // a zero-total group gets a sliver cell; there is no room left to
        // subdivide, so every child shares the degenerate parent cell
        if parent.is_empty() || parent_area < 1e-12 {
            let anchor = parent.centroid();
            return (0..n).map(|_| (parent.clone(), anchor)).collect();
        }

        let total: f64 = values.iter().sum();
        // floor zero-value children at a sliver so their cells stay defined
        let fractions: Vec<f64> = values.iter().map(|v| (v / total).max(1e-6)).collect();
        let fsum: f64 = fractions.iter().sum();
        let targets: Vec<f64> = fractions.iter().map(|f| f / fsum * parent_area).collect();

        let mut sites: Vec<Point> = (0..n).map(|_| random_point_in(parent, rng)).collect();
        // weights live on the squared-length scale; seed them from the
        // target areas so adaptation has traction from the first iteration
        let w_floor = parent_area * 1e-9;
        let mut weights: Vec<f64> = targets
            .iter()
            .map(|t| (t / std::f64::consts::PI).max(w_floor))
            .collect();

        let mut cells = power_cells(parent, &sites, &weights);
        for iter in 0..self.max_iterations {
            // a swallowed cell gets a fresh site and its initial weight back
            let mut rescued = false;
            for i in 0..n {
                if cells[i].is_empty() || cells[i].area() < parent_area * 1e-9 {
                    sites[i] = random_point_in(parent, rng);
                    weights[i] = (targets[i] / std::f64::consts::PI).max(w_floor);
                    rescued = true;
                }
            }
            if !rescued {
                let areas: Vec<f64> = cells.iter().map(|c| c.area()).collect();
                let max_err = areas
                    .iter()
                    .zip(&targets)
                    .map(|(a, t)| (a - t).abs() / parent_area)
                    .fold(0.0, f64::max);
                if max_err < self.tolerance {
                    debug!(iter, max_err, "tessellation converged");
                    return finish(cells, sites);
                }
                for i in 0..n {
                    sites[i] = cells[i].centroid();
                    let a = areas[i].max(parent_area * 1e-6);
                    // damped multiplicative update on the squared-length scale
                    let factor = (targets[i] / a).sqrt().clamp(0.5, 2.0);
                    weights[i] = (weights[i] * factor).max(w_floor);
                }
            }
            cells = power_cells(parent, &sites, &weights);
        }
        warn!(
            cells = n,
            "tessellation hit the iteration cap before converging"
        );
        finish(cells, sites)
    }
}

fn finish(cells: Vec<Polygon>, sites: Vec<Point>) -> Vec<(Polygon, Point)> {
    cells
        .into_iter()
        .zip(sites)
        .map(|(cell, site)| {
            // extreme weight spreads can push a site out of its own cell
            let anchor = if cell.contains(site, 1e-9) {
                site
            } else {
                cell.centroid()
            };
            (cell, anchor)
        })
        .collect()
}

/// Power cell of each site: the parent polygon clipped by every pairwise
/// power bisector `|p - si|^2 - wi <= |p - sj|^2 - wj`.
fn power_cells(parent: &Polygon, sites: &[Point], weights: &[f64]) -> Vec<Polygon> {
    let n = sites.len();
    (0..n)
        .map(|i| {
            let si = sites[i];
            let mut cell = parent.clone();
            for j in 0..n {
                if j == i || cell.is_empty() {
                    continue;
                }
                let sj = sites[j];
                let a = 2.0 * (sj.x - si.x);
                let b = 2.0 * (sj.y - si.y);
                let c = (sj.x * sj.x + sj.y * sj.y) - (si.x * si.x + si.y * si.y)
                    + weights[i]
                    - weights[j];
                cell = cell.clip_halfplane(a, b, c);
            }
            cell
        })
        .collect()
}

fn random_point_in(polygon: &Polygon, rng: &mut StdRng) -> Point {
    let (min, max) = polygon.bbox();
    if !(max.x > min.x && max.y > min.y) {
        return polygon.centroid();
    }
    for _ in 0..1000 {
        let p = Point::new(rng.gen_range(min.x..max.x), rng.gen_range(min.y..max.y));
        if polygon.contains(p, 0.0) {
            return p;
        }
    }
    polygon.centroid()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ellipse_boundary;
    use crate::hierarchy::{Hierarchy, NodeKind};
    use crate::model::Record;

    fn rec(symbol: &str, name: &str, marketcap: f64, country: &str) -> Record {
        Record {
            symbol: symbol.into(),
            name: name.into(),
            marketcap,
            country: country.into(),
        }
    }

    fn scenario() -> Hierarchy {
        let records = vec![
            rec("A", "Alpha", 1000.0, "X"),
            rec("B", "Beta", 3000.0, "X"),
            rec("C", "Gamma", 2000.0, "Y"),
        ];
        Hierarchy::build(&records).unwrap()
    }

    fn tessellated(seed: u64) -> Hierarchy {
        let mut h = scenario();
        let boundary = ellipse_boundary(360.0);
        PowerDiagram::default()
            .tessellate(&mut h, &boundary, seed)
            .unwrap();
        h
    }

    fn area_of(h: &Hierarchy, key: &str) -> f64 {
        h.nodes
            .iter()
            .find(|n| n.key == key)
            .and_then(|n| n.polygon.as_ref())
            .map(|p| p.area())
            .unwrap()
    }

    #[test]
    fn areas_track_value_proportions() {
        let h = tessellated(1);
        let group_ratio = area_of(&h, "X") / area_of(&h, "Y");
        assert!(
            (1.7..2.3).contains(&group_ratio),
            "group X should cover about twice group Y, got ratio {group_ratio}"
        );
        let leaf_ratio = area_of(&h, "B") / area_of(&h, "A");
        assert!(
            (2.4..3.6).contains(&leaf_ratio),
            "leaf B should cover about three times leaf A, got ratio {leaf_ratio}"
        );
    }

    #[test]
    fn children_partition_their_parent() {
        let h = tessellated(1);
        let boundary_area = ellipse_boundary(360.0).area();
        let group_sum: f64 = h.groups().map(|g| g.polygon.as_ref().unwrap().area()).sum();
        assert!((group_sum - boundary_area).abs() / boundary_area < 0.01);
        for g in h.groups() {
            let child_sum: f64 = g
                .children
                .iter()
                .map(|c| h.node(*c).polygon.as_ref().unwrap().area())
                .sum();
            let own = g.polygon.as_ref().unwrap().area();
            assert!((child_sum - own).abs() / own < 0.01);
        }
    }

    #[test]
    fn polygons_nest_inside_their_parents() {
        let h = tessellated(1);
        let eps = 1e-6 * 360.0;
        let boundary = ellipse_boundary(360.0);
        for g in h.groups() {
            let gp = g.polygon.as_ref().unwrap();
            for p in &gp.0 {
                assert!(boundary.contains(*p, eps));
            }
            for c in &g.children {
                let leaf = h.node(*c);
                for p in &leaf.polygon.as_ref().unwrap().0 {
                    assert!(gp.contains(*p, eps));
                }
            }
        }
    }

    #[test]
    fn sites_anchor_inside_their_cells() {
        let h = tessellated(1);
        for n in h.nodes.iter().filter(|n| n.kind != NodeKind::Root) {
            let site = n.site.unwrap();
            assert!(n.polygon.as_ref().unwrap().contains(site, 1e-6));
        }
    }

    #[test]
    fn identical_seeds_reproduce_the_layout() {
        let a = tessellated(7);
        let b = tessellated(7);
        for (na, nb) in a.nodes.iter().zip(&b.nodes) {
            assert_eq!(na.polygon, nb.polygon);
            assert_eq!(na.site, nb.site);
        }
    }

    #[test]
    fn zero_total_group_gets_a_sliver_without_failing() {
        let records = vec![
            rec("A", "Alpha", 1000.0, "X"),
            rec("B", "Beta", 3000.0, "X"),
            rec("C", "Gamma", 0.0, "Z"),
            rec("D", "Delta", 0.0, "Z"),
        ];
        let mut h = Hierarchy::build(&records).unwrap();
        let boundary = ellipse_boundary(360.0);
        PowerDiagram::default()
            .tessellate(&mut h, &boundary, 1)
            .unwrap();
        for n in h.nodes.iter().filter(|n| n.kind != NodeKind::Root) {
            assert!(n.polygon.is_some());
            assert!(n.site.is_some());
        }
        // the zero-valued group stays a sliver of the chart
        let z = h.groups().find(|g| g.key == "Z").unwrap();
        let z_area = z.polygon.as_ref().unwrap().area();
        assert!(z_area < boundary.area() * 0.01);
    }

    #[test]
    fn single_child_inherits_the_parent_polygon() {
        let records = vec![rec("A", "Alpha", 1000.0, "X")];
        let mut h = Hierarchy::build(&records).unwrap();
        let boundary = ellipse_boundary(360.0);
        PowerDiagram::default()
            .tessellate(&mut h, &boundary, 1)
            .unwrap();
        let group = h.groups().next().unwrap();
        assert_eq!(group.polygon.as_ref().unwrap(), &boundary);
        let leaf = h.leaves().next().unwrap();
        assert_eq!(leaf.polygon.as_ref().unwrap(), &boundary);
    }
}
