use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;

/// Axis-aligned bounding box in screen coordinates (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl BBox {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        !(x < self.left || x > self.right || y < self.top || y > self.bottom)
    }
}

/// A closed polygon stored as a flat list of coordinate pairs
/// `[x0, y0, x1, y1, ...]`, matching the kernel's output layout.
///
/// The vertex list is immutable after construction. The bounding box is
/// computed in one pass on the first containment query and reused for every
/// later one; immutability guarantees the memoized box can never go stale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<f64>,
    #[serde(skip)]
    bbox: OnceCell<BBox>,
}

impl PartialEq for Polygon {
    fn eq(&self, other: &Self) -> bool {
        // Memoization state is not part of polygon identity.
        self.points == other.points
    }
}

impl Polygon {
    /// Construct from a flat coordinate list. The length must be even.
    pub fn new(points: Vec<f64>) -> Self {
        debug_assert!(points.len() % 2 == 0, "flat coordinate list must pair up");
        Self {
            points,
            bbox: OnceCell::new(),
        }
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = DVec2>) -> Self {
        let mut points = Vec::new();
        for p in pairs {
            points.push(p.x);
            points.push(p.y);
        }
        Self::new(points)
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn vertex_count(&self) -> usize {
        self.points.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The memoized bounding box, computed on first access.
    pub fn bbox(&self) -> BBox {
        *self.bbox.get_or_init(|| {
            let mut b = BBox {
                left: f64::INFINITY,
                right: f64::NEG_INFINITY,
                top: f64::INFINITY,
                bottom: f64::NEG_INFINITY,
            };
            for i in 0..self.vertex_count() {
                let px = self.points[i * 2];
                let py = self.points[i * 2 + 1];
                b.left = b.left.min(px);
                b.right = b.right.max(px);
                b.top = b.top.min(py);
                b.bottom = b.bottom.max(py);
            }
            b
        })
    }

    /// Containment test with a bounding-box fast path.
    ///
    /// The box only ever short-circuits the obviously-outside case; points
    /// inside the box fall through to the exact even-odd crossing test, so
    /// the answer is identical to the unaccelerated test.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        if !self.bbox().contains(x, y) {
            return false;
        }
        self.contains_exact(x, y)
    }

    /// Even-odd crossing test over the vertex list.
    fn contains_exact(&self, x: f64, y: f64) -> bool {
        let n = self.vertex_count();
        if n == 0 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let xi = self.points[i * 2];
            let yi = self.points[i * 2 + 1];
            let xj = self.points[j * 2];
            let yj = self.points[j * 2 + 1];
            if (yi > y) != (yj > y) && x < (xj - xi) * ((y - yi) / (yj - yi)) + xi {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Unsigned area via the shoelace formula.
    pub fn area(&self) -> f64 {
        let n = self.vertex_count();
        if n < 3 {
            return 0.0;
        }
        let mut area = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            area += self.points[i * 2] * self.points[j * 2 + 1];
            area -= self.points[j * 2] * self.points[i * 2 + 1];
        }
        area.abs() / 2.0
    }
}
