use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ChartError;
use crate::geometry::{ellipse_boundary, Point, Polygon};
use crate::hierarchy::{Hierarchy, NodeId, NodeKind};
use crate::model::Datum;
use crate::tessellate::Tessellator;

/// Logical viewbox: 800x800 units centered on the origin.
pub const VIEW_SIZE: f64 = 800.0;
/// Margin reserved on all four sides of the viewbox.
pub const MARGIN: f64 = 40.0;
/// Usable chart radius inside the margins.
pub const RADIUS: f64 = (VIEW_SIZE - 2.0 * MARGIN) / 2.0;
/// Radius of the circle the group labels ride on.
pub const LABEL_RADIUS: f64 = RADIUS + 20.0;

/// A fully tessellated chart for one dataset. Computed once per dataset;
/// never incrementally updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartLayout {
    pub hierarchy: Hierarchy,
    pub seed: u64,
}

impl ChartLayout {
    pub fn compute<D: Datum>(
        records: &[D],
        tessellator: &dyn Tessellator,
        seed: u64,
    ) -> Result<Self, ChartError> {
        let mut hierarchy = Hierarchy::build(records)?;
        let boundary = ellipse_boundary(RADIUS);
        tessellator.tessellate(&mut hierarchy, &boundary, seed)?;
        info!(
            groups = hierarchy.groups().count(),
            leaves = hierarchy.leaves().count(),
            seed,
            "chart layout computed"
        );
        Ok(ChartLayout { hierarchy, seed })
    }

    /// Leaf under the given chart-space point, if any. Only leaf polygons
    /// take pointer interaction; group and root shapes are pass-through.
    pub fn leaf_at(&self, p: Point) -> Option<NodeId> {
        self.hierarchy
            .leaves()
            .find(|n| {
                n.polygon
                    .as_ref()
                    .map(|poly| poly.contains(p, 0.0))
                    .unwrap_or(false)
            })
            .map(|n| n.id)
    }
}

/// Border weight per hierarchy depth: the root outline is invisible, group
/// outlines are heavy, leaf outlines are hairlines.
pub fn stroke_weight(depth: u8) -> f32 {
    match depth {
        1 => 4.0,
        2 => 1.0,
        _ => 0.0,
    }
}

pub fn fills(kind: NodeKind) -> bool {
    kind == NodeKind::Leaf
}

/// Icon edge length for a leaf value: grows sub-linearly, capped at 64 units.
pub fn icon_size(value: f64) -> f64 {
    (value / 1e8).sqrt().min(64.0)
}

/// A 180-degree circular arc carrying a group label, in the clock-style
/// angle convention (zero at twelve o'clock, increasing clockwise).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelArc {
    pub start: f64,
    pub end: f64,
    pub radius: f64,
}

impl LabelArc {
    /// Fit an arc around the group's site point. The arc is centered on the
    /// site's mid-angle; when that angle falls in the lower half-plane the
    /// endpoints swap so the text never renders upside-down.
    pub fn around(site: Point, radius: f64) -> Self {
        let mid = mid_angle(site);
        let flipped = mid > FRAC_PI_2 && mid < 3.0 * FRAC_PI_2;
        let (start, end) = if flipped {
            (mid + FRAC_PI_2, mid - FRAC_PI_2)
        } else {
            (mid - FRAC_PI_2, mid + FRAC_PI_2)
        };
        LabelArc { start, end, radius }
    }

    pub fn flipped(&self) -> bool {
        self.end < self.start
    }

    /// Point at parameter `t` in [0, 1] along the arc.
    pub fn point_at(&self, t: f64) -> Point {
        let a = self.start + (self.end - self.start) * t;
        Point::new(self.radius * a.sin(), -self.radius * a.cos())
    }

    /// Screen-space angle of the traversal direction at `t`, for glyphs
    /// that follow the arc.
    pub fn tangent_at(&self, t: f64) -> f64 {
        let a = self.start + (self.end - self.start) * t;
        let dir = if self.flipped() { -1.0 } else { 1.0 };
        (dir * a.sin()).atan2(dir * a.cos())
    }

    pub fn arc_length(&self) -> f64 {
        (self.end - self.start).abs() * self.radius
    }
}

/// Angle of the site direction in the clock convention the arcs use.
pub fn mid_angle(site: Point) -> f64 {
    site.y.atan2(site.x) + FRAC_PI_2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;
    use crate::tessellate::PowerDiagram;
    use std::f64::consts::PI;

    fn rec(symbol: &str, name: &str, marketcap: f64, country: &str) -> Record {
        Record {
            symbol: symbol.into(),
            name: name.into(),
            marketcap,
            country: country.into(),
        }
    }

    #[test]
    fn radius_is_derived_from_viewbox_and_margins() {
        assert!((RADIUS - 360.0).abs() < 1e-12);
        assert!((LABEL_RADIUS - 380.0).abs() < 1e-12);
    }

    #[test]
    fn stroke_weight_per_depth() {
        assert_eq!(stroke_weight(0), 0.0);
        assert_eq!(stroke_weight(1), 4.0);
        assert_eq!(stroke_weight(2), 1.0);
    }

    #[test]
    fn icon_size_is_sublinear_and_capped() {
        assert!((icon_size(1e8) - 1.0).abs() < 1e-9);
        assert!((icon_size(4e8) - 2.0).abs() < 1e-9);
        assert_eq!(icon_size(1e12), 64.0);
        assert_eq!(icon_size(0.0), 0.0);
    }

    #[test]
    fn label_arc_spans_half_a_turn_through_the_site_direction() {
        // site straight up in screen coordinates (negative y)
        let arc = LabelArc::around(Point::new(0.0, -100.0), 380.0);
        assert!(!arc.flipped());
        assert!((arc.arc_length() - PI * 380.0).abs() < 1e-9);
        let mid = arc.point_at(0.5);
        assert!((mid.x - 0.0).abs() < 1e-9);
        assert!((mid.y + 380.0).abs() < 1e-9);
    }

    #[test]
    fn lower_half_plane_arcs_are_flipped() {
        // site straight down: mid-angle pi, inside (pi/2, 3pi/2)
        let arc = LabelArc::around(Point::new(0.0, 100.0), 380.0);
        assert!(arc.flipped());
        let mid = arc.point_at(0.5);
        assert!((mid.x - 0.0).abs() < 1e-9);
        assert!((mid.y - 380.0).abs() < 1e-9);
        // site to the right: mid-angle pi/2 exactly, not flipped
        let right = LabelArc::around(Point::new(100.0, 0.0), 380.0);
        assert!(!right.flipped());
    }

    #[test]
    fn hit_test_finds_only_leaves() {
        let records = vec![
            rec("A", "Alpha", 1000.0, "X"),
            rec("B", "Beta", 3000.0, "X"),
            rec("C", "Gamma", 2000.0, "Y"),
        ];
        let layout = ChartLayout::compute(&records, &PowerDiagram::default(), 1).unwrap();
        for leaf in layout.hierarchy.leaves() {
            let site = leaf.site.unwrap();
            assert_eq!(layout.leaf_at(site), Some(leaf.id));
        }
        // far outside the boundary
        assert_eq!(layout.leaf_at(Point::new(1000.0, 1000.0)), None);
    }
}
