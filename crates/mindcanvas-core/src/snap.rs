//! Drag snapping: alignment to other nodes and the canvas center, plus
//! equal-spacing between neighbors.

use crate::geometry::{Axis, bounding_box};
use kurbo::{Line, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A transient guide line shown while a snap is active.
///
/// `axis` is the axis `position` is measured on: an [`Axis::X`] guide is a
/// vertical line at `x = position` running from `start` to `end` in y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapGuide {
    pub axis: Axis,
    pub position: f64,
    pub start: f64,
    pub end: f64,
}

impl SnapGuide {
    /// Guide as a world-space line segment.
    pub fn line(&self) -> Line {
        match self.axis {
            Axis::X => Line::new((self.position, self.start), (self.position, self.end)),
            Axis::Y => Line::new((self.start, self.position), (self.end, self.position)),
        }
    }
}

/// Correction to add to a proposed drag delta, and the guides to draw.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapResult {
    pub offset: Vec2,
    pub guides: Vec<SnapGuide>,
}

impl SnapResult {
    /// No correction and no guides.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_snapped(&self) -> bool {
        !self.guides.is_empty()
    }

    /// Guides of one axis.
    pub fn guides_on(&self, axis: Axis) -> impl Iterator<Item = &SnapGuide> {
        self.guides.iter().filter(move |g| g.axis == axis)
    }
}

/// A reference position with the perpendicular extent its guide covers.
#[derive(Debug, Clone, Copy)]
struct Reference {
    position: f64,
    span: (f64, f64),
}

/// Compute the snap correction for moving the `moving` boxes by `delta`.
///
/// `others` are the boxes of every non-moving node, `canvas_center` is the
/// world point under the viewport center and `tolerance` is in world units.
/// Each axis is solved independently. An equal-spacing match within
/// tolerance overrides plain alignment on its axis.
pub fn compute_snap(moving: &[Rect], others: &[Rect], delta: Vec2, canvas_center: Point, tolerance: f64) -> SnapResult {
    if others.is_empty() {
        return SnapResult::none();
    }
    let Some(bounds) = bounding_box(moving.iter().copied()) else {
        return SnapResult::none();
    };
    let moved = bounds + delta;

    let mut result = SnapResult::none();
    for (axis, center) in [(Axis::X, canvas_center.x), (Axis::Y, canvas_center.y)] {
        let (offset, guides) = snap_axis(axis, moved, others, center, tolerance);
        result.offset += axis.vec(offset);
        result.guides.extend(guides);
    }
    result
}

/// Snap one axis of `moved`.
///
/// The closest edge or center alignment within `tolerance` wins first. An
/// equal-spacing match within tolerance then replaces it outright, even when
/// the alignment was closer: a box dropped between two neighbors lands at the
/// equalized gap rather than on a nearer edge of either neighbor.
fn snap_axis(axis: Axis, moved: Rect, others: &[Rect], center: f64, tolerance: f64) -> (f64, Vec<SnapGuide>) {
    let (start, size) = axis.extent(moved);
    let moved_span = axis.cross_span(moved);
    let targets = [start, start + size / 2.0, start + size];

    let mut references: Vec<Reference> = others
        .iter()
        .flat_map(|&rect| {
            let (pos, len) = axis.extent(rect);
            let span = axis.cross_span(rect);
            [pos, pos + len, pos + len / 2.0].map(|position| Reference { position, span })
        })
        .collect();
    references.push(Reference {
        position: center,
        span: moved_span,
    });

    let mut offset = 0.0;
    let mut guides = Vec::new();
    let mut best = f64::INFINITY;
    for &target in &targets {
        for reference in &references {
            let dist = (reference.position - target).abs();
            if dist <= tolerance && dist < best {
                best = dist;
                offset = reference.position - target;
                guides = vec![SnapGuide {
                    axis,
                    position: reference.position,
                    start: reference.span.0.min(moved_span.0),
                    end: reference.span.1.max(moved_span.1),
                }];
            }
        }
    }

    if let Some((spacing_offset, spacing_guides)) = snap_spacing(axis, moved, others, tolerance) {
        offset = spacing_offset;
        guides = spacing_guides;
    }

    (offset, guides)
}

/// Equal-spacing match for one axis: place the moved box so it repeats the
/// gap of an adjacent neighbor pair (centered between them, after the pair,
/// or before it).
fn snap_spacing(axis: Axis, moved: Rect, others: &[Rect], tolerance: f64) -> Option<(f64, Vec<SnapGuide>)> {
    if others.len() < 2 {
        return None;
    }
    let (start, size) = axis.extent(moved);
    let moved_span = axis.cross_span(moved);

    let mut sorted = others.to_vec();
    sorted.sort_by(|a, b| axis.extent(*a).0.total_cmp(&axis.extent(*b).0));

    let guide = |position: f64, neighbor: Rect| {
        let span = axis.cross_span(neighbor);
        SnapGuide {
            axis,
            position,
            start: span.0.min(moved_span.0),
            end: span.1.max(moved_span.1),
        }
    };

    let mut best: Option<(f64, Vec<SnapGuide>)> = None;
    let mut best_dist = f64::INFINITY;
    for pair in sorted.windows(2) {
        let (first, second) = (pair[0], pair[1]);
        let (first_start, first_len) = axis.extent(first);
        let (second_start, second_len) = axis.extent(second);
        let first_end = first_start + first_len;
        let second_end = second_start + second_len;
        let gap = second_start - first_end;
        if gap <= 0.0 {
            continue;
        }

        let mut candidates = Vec::with_capacity(3);
        if gap >= size {
            candidates.push((first_end + (gap - size) / 2.0, first, second));
        }
        candidates.push((second_end + gap, second, first));
        candidates.push((first_start - gap - size, first, second));

        for (desired, near, far) in candidates {
            let dist = (desired - start).abs();
            if dist <= tolerance && dist < best_dist {
                best_dist = dist;
                best = Some((desired - start, vec![guide(desired, near), guide(desired + size, far)]));
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAR_CENTER: Point = Point::new(1e6, 1e6);

    fn square(x: f64, y: f64, size: f64) -> Rect {
        Rect::new(x, y, x + size, y + size)
    }

    #[test]
    fn test_no_others_no_snap() {
        let result = compute_snap(&[square(0.0, 0.0, 10.0)], &[], Vec2::new(3.0, 3.0), FAR_CENTER, 8.0);
        assert_eq!(result, SnapResult::none());
    }

    #[test]
    fn test_snap_left_edges() {
        let other = square(100.0, 300.0, 50.0);
        let moving = square(0.0, 0.0, 20.0);
        let result = compute_snap(&[moving], &[other], Vec2::new(95.0, 0.0), FAR_CENTER, 8.0);
        assert!((result.offset.x - 5.0).abs() < 1e-9);
        assert!(result.offset.y.abs() < 1e-9);

        let guide = result.guides_on(Axis::X).next().unwrap();
        assert!((guide.position - 100.0).abs() < 1e-9);
        // Span covers both boxes in y
        assert!((guide.start - 0.0).abs() < 1e-9);
        assert!((guide.end - 350.0).abs() < 1e-9);
    }

    #[test]
    fn test_tolerance_boundary() {
        let other = square(100.0, 500.0, 200.0);
        let moving = square(0.0, 0.0, 20.0);

        // Left edge lands 8 away from the other's left edge
        let at = compute_snap(&[moving], &[other], Vec2::new(108.0, 0.0), FAR_CENTER, 8.0);
        assert!((at.offset.x + 8.0).abs() < 1e-9);

        let beyond = compute_snap(&[moving], &[other], Vec2::new(109.0, 0.0), FAR_CENTER, 8.0);
        assert!(beyond.offset.x.abs() < 1e-9);
        assert_eq!(beyond.guides_on(Axis::X).count(), 0);
    }

    #[test]
    fn test_first_pair_wins_ties() {
        // Moving left edge and right edge are both 2 away from references;
        // the left-edge target is enumerated first.
        let others = [square(-2.0, 500.0, 10.0), square(22.0, 900.0, 10.0)];
        let moving = square(0.0, 0.0, 20.0);
        let result = compute_snap(&[moving], &others, Vec2::ZERO, FAR_CENTER, 8.0);
        assert!((result.offset.x + 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_canvas_center_reference() {
        let other = square(1000.0, 1000.0, 10.0);
        let moving = square(0.0, 0.0, 20.0);
        let result = compute_snap(&[moving], &[other], Vec2::new(-13.0, 0.0), Point::new(0.0, 500.0), 8.0);
        // Center x at -3 snaps to 0
        assert!((result.offset.x - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_equal_spacing_between_neighbors() {
        let a = Rect::new(0.0, 0.0, 50.0, 50.0);
        let b = Rect::new(200.0, 0.0, 250.0, 50.0);
        let c = Rect::new(500.0, 0.0, 550.0, 50.0);
        // Drag c so its left edge sits at 60
        let result = compute_snap(&[c], &[a, b], Vec2::new(-440.0, 0.0), FAR_CENTER, 80.0);

        assert!((c.x0 - 440.0 + result.offset.x - 100.0).abs() < 1e-9);
        let vertical: Vec<&SnapGuide> = result.guides_on(Axis::X).collect();
        assert_eq!(vertical.len(), 2);
        assert!((vertical[0].position - 100.0).abs() < 1e-9);
        assert!((vertical[1].position - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_equal_spacing_after_pair() {
        let a = Rect::new(0.0, 0.0, 50.0, 50.0);
        let b = Rect::new(100.0, 0.0, 150.0, 50.0);
        let moving = square(0.0, 300.0, 50.0);
        // Left edge at 195; the repeating position is 200
        let result = compute_snap(&[moving], &[a, b], Vec2::new(195.0, 0.0), FAR_CENTER, 8.0);
        assert!((result.offset.x - 5.0).abs() < 1e-9);
        assert_eq!(result.guides_on(Axis::X).count(), 2);
    }

    #[test]
    fn test_equal_spacing_beats_closer_alignment() {
        let a = Rect::new(0.0, 0.0, 50.0, 50.0);
        let b = Rect::new(200.0, 0.0, 250.0, 50.0);
        let moving = square(0.0, 300.0, 50.0);
        // Left edge at 95 is 2 from the canvas center but 5 from the equal gap at 100
        let result = compute_snap(&[moving], &[a, b], Vec2::new(95.0, 0.0), Point::new(97.0, 5000.0), 8.0);
        assert!((result.offset.x - 5.0).abs() < 1e-9);
        assert_eq!(result.guides_on(Axis::X).count(), 2);
    }

    #[test]
    fn test_spacing_ignores_overlapping_pairs() {
        let a = Rect::new(0.0, 0.0, 50.0, 50.0);
        let b = Rect::new(40.0, 200.0, 90.0, 250.0);
        let moving = square(0.0, 500.0, 10.0);
        let result = compute_snap(&[moving], &[a, b], Vec2::new(300.0, 0.0), FAR_CENTER, 8.0);
        assert!(result.offset.x.abs() < 1e-9);
        assert_eq!(result.guides_on(Axis::X).count(), 0);
    }

    #[test]
    fn test_guide_line_orientation() {
        let guide = SnapGuide {
            axis: Axis::Y,
            position: 10.0,
            start: 0.0,
            end: 5.0,
        };
        let line = guide.line();
        assert_eq!(line.p0, Point::new(0.0, 10.0));
        assert_eq!(line.p1, Point::new(5.0, 10.0));
    }
}
