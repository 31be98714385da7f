//! Geometry helpers shared by the scene, snapping, pen editor and placement.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A layout axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Start edge and length of `rect` along this axis.
    pub fn extent(self, rect: Rect) -> (f64, f64) {
        match self {
            Axis::X => (rect.x0, rect.width()),
            Axis::Y => (rect.y0, rect.height()),
        }
    }

    /// Start and end of `rect` on the perpendicular axis.
    pub fn cross_span(self, rect: Rect) -> (f64, f64) {
        match self {
            Axis::X => (rect.y0, rect.y1),
            Axis::Y => (rect.x0, rect.x1),
        }
    }

    /// Vector of length `amount` along this axis.
    pub fn vec(self, amount: f64) -> Vec2 {
        match self {
            Axis::X => Vec2::new(amount, 0.0),
            Axis::Y => Vec2::new(0.0, amount),
        }
    }
}

/// Bounding box of a set of rectangles, or `None` for an empty set.
pub fn bounding_box<I>(rects: I) -> Option<Rect>
where
    I: IntoIterator<Item = Rect>,
{
    rects.into_iter().fold(None, |acc, rect| {
        Some(match acc {
            Some(r) => r.union(rect),
            None => rect,
        })
    })
}

/// Strict axis-aligned overlap. Rectangles that only touch do not overlap.
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && a.x1 > b.x0 && a.y0 < b.y1 && a.y1 > b.y0
}

/// Distance from a point to a line segment (clamped projection).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}

/// Synthesize symmetric handles for the anchor at `index`.
///
/// The direction runs from the previous neighbor to the next one (wrapping
/// when `closed`); an open endpoint uses its single neighbor. Returns the
/// `(left, right)` offsets, each `length` long. An isolated point gets zero
/// handles.
pub fn smooth_handles(points: &[Point], index: usize, closed: bool, length: f64) -> (Vec2, Vec2) {
    let n = points.len();
    let Some(&p) = points.get(index) else {
        return (Vec2::ZERO, Vec2::ZERO);
    };

    let prev = if closed {
        Some(points[(index + n - 1) % n])
    } else {
        index.checked_sub(1).map(|i| points[i])
    };
    let next = if closed {
        Some(points[(index + 1) % n])
    } else {
        points.get(index + 1).copied()
    };

    let dir = match (prev, next) {
        (Some(prev), Some(next)) => next - prev,
        (None, Some(next)) => next - p,
        (Some(prev), None) => p - prev,
        (None, None) => Vec2::ZERO,
    };

    let len = dir.hypot();
    let norm = if len > 0.0 { dir / len } else { dir };
    (-norm * length, norm * length)
}
