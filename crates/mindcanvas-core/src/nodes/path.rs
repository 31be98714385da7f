//! Vector path anchors and the normalized local space they live in.
//!
//! Anchors of a committed path are stored in 0..1 coordinates relative to the
//! node's bounding box. Handle offsets are relative to their anchor and use
//! the same normalized units.

use crate::geometry::{point_to_segment_dist, smooth_handles};
use kurbo::{Affine, BezPath, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// A path anchor with optional bezier handle offsets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
    /// Left (inbound) handle offset, relative to the anchor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<Vec2>,
    /// Right (outbound) handle offset, relative to the anchor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<Vec2>,
}

impl PathPoint {
    /// A corner anchor with no handles.
    pub fn corner(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            left: None,
            right: None,
        }
    }

    pub fn from_point(point: Point) -> Self {
        Self::corner(point.x, point.y)
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// An anchor is smooth when it carries any handle.
    pub fn is_smooth(&self) -> bool {
        self.left.is_some() || self.right.is_some()
    }

    pub fn with_handles(self, left: Vec2, right: Vec2) -> Self {
        Self {
            left: Some(left),
            right: Some(right),
            ..self
        }
    }

    pub fn without_handles(self) -> Self {
        Self {
            left: None,
            right: None,
            ..self
        }
    }

    pub fn translated(self, delta: Vec2) -> Self {
        Self {
            x: self.x + delta.x,
            y: self.y + delta.y,
            ..self
        }
    }
}

/// Whether a path renders and edits as closed.
pub fn is_closed(points: &[PathPoint], closed: bool) -> bool {
    closed && points.len() > 1
}

/// Anchor positions without handles.
pub fn positions(points: &[PathPoint]) -> Vec<Point> {
    points.iter().map(PathPoint::position).collect()
}

/// Build the outline through the anchors.
///
/// A segment is cubic when the previous anchor has a right handle and the
/// current anchor has a left handle, otherwise straight. The closing segment
/// is always straight.
pub fn build_path(points: &[PathPoint], closed: bool) -> BezPath {
    let mut path = BezPath::new();
    let Some(first) = points.first() else {
        return path;
    };
    path.move_to(first.position());
    for pair in points.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        match (prev.right, curr.left) {
            (Some(out), Some(inb)) => {
                path.curve_to(prev.position() + out, curr.position() + inb, curr.position());
            }
            _ => path.line_to(curr.position()),
        }
    }
    if is_closed(points, closed) {
        path.close_path();
    }
    path
}

/// Build the outline of normalized anchors scaled to a node of `size`.
pub fn build_scaled_path(points: &[PathPoint], closed: bool, size: Size) -> BezPath {
    let mut path = build_path(points, closed);
    path.apply_affine(Affine::scale_non_uniform(size.width, size.height));
    path
}

/// Anchor at `index` with direction-aware smooth handles.
pub fn smoothed(points: &[PathPoint], index: usize, closed: bool, length: f64) -> Option<PathPoint> {
    let point = *points.get(index)?;
    let (left, right) = smooth_handles(&positions(points), index, closed, length);
    Some(point.with_handles(left, right))
}

/// Index of the anchor closest to `local`.
pub fn nearest_anchor(points: &[PathPoint], local: Point) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, (p.position() - local).hypot()))
        .fold(None, |best: Option<(usize, f64)>, (i, dist)| match best {
            Some((_, best_dist)) if best_dist <= dist => best,
            _ => Some((i, dist)),
        })
        .map(|(i, _)| i)
}

/// Index of the segment start closest to `local`, by straight-segment distance.
/// Closed paths include the segment from the last anchor back to the first.
pub fn nearest_segment(points: &[PathPoint], local: Point, closed: bool) -> Option<usize> {
    let n = points.len();
    let segments = if is_closed(points, closed) {
        n
    } else {
        n.saturating_sub(1)
    };

    (0..segments)
        .map(|i| {
            let a = points[i].position();
            let b = points[(i + 1) % n].position();
            (i, point_to_segment_dist(local, a, b))
        })
        .fold(None, |best: Option<(usize, f64)>, (i, dist)| match best {
            Some((_, best_dist)) if best_dist <= dist => best,
            _ => Some((i, dist)),
        })
        .map(|(i, _)| i)
}

/// Normalize world-space anchors into the 0..1 space of their bounding box.
///
/// Returns the box (width and height floored to 1) and the normalized anchors.
/// Handles are divided by the box size without translation.
pub fn normalize(points: &[PathPoint]) -> Option<(Rect, Vec<PathPoint>)> {
    let first = points.first()?;
    let (mut min, mut max) = (first.position(), first.position());
    for p in points {
        min = Point::new(min.x.min(p.x), min.y.min(p.y));
        max = Point::new(max.x.max(p.x), max.y.max(p.y));
    }
    let width = (max.x - min.x).max(1.0);
    let height = (max.y - min.y).max(1.0);
    let scale = |v: Vec2| Vec2::new(v.x / width, v.y / height);

    let normalized = points
        .iter()
        .map(|p| PathPoint {
            x: (p.x - min.x) / width,
            y: (p.y - min.y) / height,
            left: p.left.map(scale),
            right: p.right.map(scale),
        })
        .collect();

    Some((Rect::from_origin_size(min, Size::new(width, height)), normalized))
}

/// World-space anchor positions for normalized anchors of a node at `frame`.
pub fn denormalize(points: &[PathPoint], frame: Rect) -> Vec<Point> {
    points
        .iter()
        .map(|p| Point::new(frame.x0 + p.x * frame.width(), frame.y0 + p.y * frame.height()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::PathEl;

    fn square() -> Vec<PathPoint> {
        vec![
            PathPoint::corner(0.0, 0.0),
            PathPoint::corner(1.0, 0.0),
            PathPoint::corner(1.0, 1.0),
            PathPoint::corner(0.0, 1.0),
        ]
    }

    #[test]
    fn test_is_closed_requires_two_points() {
        assert!(!is_closed(&[PathPoint::corner(0.0, 0.0)], true));
        assert!(is_closed(&square(), true));
        assert!(!is_closed(&square(), false));
    }

    #[test]
    fn test_build_path_lines_and_curves() {
        let mut points = square();
        points[0].right = Some(Vec2::new(0.2, 0.0));
        points[1].left = Some(Vec2::new(-0.2, 0.0));
        let path = build_path(&points, true);
        let elements: Vec<PathEl> = path.elements().to_vec();

        assert!(matches!(elements[0], PathEl::MoveTo(_)));
        assert!(matches!(elements[1], PathEl::CurveTo(..)));
        assert!(matches!(elements[2], PathEl::LineTo(_)));
        assert!(matches!(elements[3], PathEl::LineTo(_)));
        assert!(matches!(elements[4], PathEl::ClosePath));
    }

    #[test]
    fn test_build_path_needs_both_handles() {
        let mut points = square();
        points[0].right = Some(Vec2::new(0.2, 0.0));
        let path = build_path(&points, false);
        assert!(path.elements().iter().all(|el| !matches!(el, PathEl::CurveTo(..))));
        assert!(!matches!(path.elements().last(), Some(PathEl::ClosePath)));
    }

    #[test]
    fn test_nearest_anchor() {
        assert_eq!(nearest_anchor(&square(), Point::new(0.9, 0.8)), Some(2));
        assert_eq!(nearest_anchor(&[], Point::ZERO), None);
    }

    #[test]
    fn test_nearest_segment_wraps_when_closed() {
        let points = square();
        // Near the left edge, which is the closing segment 3 -> 0
        assert_eq!(nearest_segment(&points, Point::new(0.05, 0.5), true), Some(3));
        // Open paths have no closing segment
        assert_eq!(nearest_segment(&points, Point::new(0.05, 0.5), false), Some(0));
        assert_eq!(nearest_segment(&points[..1], Point::ZERO, false), None);
    }

    #[test]
    fn test_normalize_roundtrip() {
        let world = vec![
            PathPoint::corner(10.0, 20.0),
            PathPoint::corner(110.0, 20.0),
            PathPoint::corner(60.0, 220.0),
        ];
        let (frame, normalized) = normalize(&world).unwrap();
        assert_eq!(frame, Rect::new(10.0, 20.0, 110.0, 220.0));
        for (a, b) in denormalize(&normalized, frame).iter().zip(&world) {
            assert!((a.x - b.x).abs() < 1e-9);
            assert!((a.y - b.y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_normalize_coincident_points_floor() {
        let world = vec![PathPoint::corner(5.0, 5.0), PathPoint::corner(5.0, 5.0)];
        let (frame, normalized) = normalize(&world).unwrap();
        assert!((frame.width() - 1.0).abs() < f64::EPSILON);
        assert!((frame.height() - 1.0).abs() < f64::EPSILON);
        assert!(normalized.iter().all(|p| p.x == 0.0 && p.y == 0.0));
    }

    #[test]
    fn test_normalize_scales_handles() {
        let world = vec![
            PathPoint::corner(0.0, 0.0).with_handles(Vec2::new(-20.0, -10.0), Vec2::new(20.0, 10.0)),
            PathPoint::corner(200.0, 100.0),
        ];
        let (_, normalized) = normalize(&world).unwrap();
        assert_eq!(normalized[0].right, Some(Vec2::new(0.1, 0.1)));
        assert_eq!(normalized[0].left, Some(Vec2::new(-0.1, -0.1)));
        assert_eq!(normalized[1].left, None);
    }

    #[test]
    fn test_smoothed_uses_neighbors() {
        let points = square();
        let p = smoothed(&points, 1, false, 0.2).unwrap();
        assert!(p.is_smooth());
        let right = p.right.unwrap();
        // Direction from (0,0) to (1,1)
        assert!((right.x - right.y).abs() < 1e-10);
        assert!((right.hypot() - 0.2).abs() < 1e-10);
    }
}
