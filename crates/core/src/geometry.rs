use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn dist2(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// A simple polygon as an ordered vertex list. Edges run between consecutive
/// vertices, closing from the last back to the first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polygon(pub Vec<Point>);

impl Polygon {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.len() < 3
    }

    fn signed_area(&self) -> f64 {
        let pts = &self.0;
        let n = pts.len();
        if n < 3 {
            return 0.0;
        }
        let mut acc = 0.0;
        for i in 0..n {
            let p = pts[i];
            let q = pts[(i + 1) % n];
            acc += p.x * q.y - q.x * p.y;
        }
        acc * 0.5
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Area-weighted centroid, falling back to the vertex mean for
    /// near-degenerate polygons.
    pub fn centroid(&self) -> Point {
        let pts = &self.0;
        let n = pts.len();
        if n == 0 {
            return Point::default();
        }
        let a = self.signed_area();
        if a.abs() < 1e-12 {
            let sx: f64 = pts.iter().map(|p| p.x).sum();
            let sy: f64 = pts.iter().map(|p| p.y).sum();
            return Point::new(sx / n as f64, sy / n as f64);
        }
        let mut cx = 0.0;
        let mut cy = 0.0;
        for i in 0..n {
            let p = pts[i];
            let q = pts[(i + 1) % n];
            let cross = p.x * q.y - q.x * p.y;
            cx += (p.x + q.x) * cross;
            cy += (p.y + q.y) * cross;
        }
        Point::new(cx / (6.0 * a), cy / (6.0 * a))
    }

    pub fn bbox(&self) -> (Point, Point) {
        let mut min = Point::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in &self.0 {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        (min, max)
    }

    /// Even-odd containment test. Points within `eps` of an edge count as
    /// inside, so clipped polygons test as contained in their parent.
    pub fn contains(&self, p: Point, eps: f64) -> bool {
        let pts = &self.0;
        let n = pts.len();
        if n < 3 {
            return false;
        }
        let eps2 = eps * eps;
        for i in 0..n {
            if dist2_to_segment(p, pts[i], pts[(i + 1) % n]) <= eps2 {
                return true;
            }
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = pts[i];
            let b = pts[j];
            if (a.y > p.y) != (b.y > p.y) {
                let x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
                if p.x < x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Sutherland-Hodgman clip against the half-plane `a*x + b*y <= c`.
    pub fn clip_halfplane(&self, a: f64, b: f64, c: f64) -> Polygon {
        let pts = &self.0;
        let n = pts.len();
        let mut out = Vec::with_capacity(n + 4);
        let side = |p: Point| a * p.x + b * p.y - c;
        for i in 0..n {
            let cur = pts[i];
            let next = pts[(i + 1) % n];
            let sc = side(cur);
            let sn = side(next);
            if sc <= 0.0 {
                out.push(cur);
            }
            if (sc < 0.0 && sn > 0.0) || (sc > 0.0 && sn < 0.0) {
                let t = sc / (sc - sn);
                out.push(Point::new(
                    cur.x + t * (next.x - cur.x),
                    cur.y + t * (next.y - cur.y),
                ));
            }
        }
        Polygon(out)
    }
}

fn dist2_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab2 = a.dist2(b);
    if ab2 == 0.0 {
        return p.dist2(a);
    }
    let t = (((p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y)) / ab2).clamp(0.0, 1.0);
    p.dist2(Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y)))
}

/// Clip boundary for the whole chart: a 100-point polygonal ellipse of
/// radius `r`, scaled to 99% so no tessellation site lands exactly on the
/// boundary curve.
pub fn ellipse_boundary(r: f64) -> Polygon {
    let pts = (0..100)
        .map(|i| {
            let a = (i as f64 / 50.0) * std::f64::consts::PI;
            Point::new(0.99 * r * a.cos(), 0.99 * r * a.sin())
        })
        .collect();
    Polygon(pts)
}
