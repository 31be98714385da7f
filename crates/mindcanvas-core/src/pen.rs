//! Pen tool: building new vector paths and editing the anchors of existing ones.
//!
//! While drawing, anchors are kept in world space. Finalizing normalizes them
//! into the new node's 0..1 box. Editing operations work on committed path
//! nodes and return replacement nodes.

use crate::nodes::path::{self, PathPoint};
use crate::nodes::{Node, NodeData, NodeId, NodeStyle, Paint};
use kurbo::{BezPath, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Anchor and handle hit radius in screen pixels.
pub const CONTROL_HIT_RADIUS: f64 = 5.0;

/// Observable state of the pen editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenState {
    Idle,
    /// Accumulating anchors for a new path.
    Drawing,
    /// Dragging out mirrored handles for the anchor just placed.
    HandleDrag,
    /// A committed path is open for anchor-level editing.
    Editing,
}

/// Whether new and converted anchors get handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenPointMode {
    #[default]
    Corner,
    Smooth,
}

/// Which part of an anchor a control drag moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    Anchor,
    Left,
    Right,
}

/// The anchor currently targeted by edit commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveAnchor {
    pub node_id: NodeId,
    pub index: usize,
}

/// Result of a pen press on empty canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenPress {
    /// A path is being edited; blank-canvas presses do not start a new one.
    Ignored,
    /// An anchor was appended at this index.
    Added(usize),
    /// The in-progress path should be finalized.
    Finish { closed: bool },
}

/// Pen tool state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PenEditor {
    /// In-progress anchors in world space.
    pub points: Vec<PathPoint>,
    /// Last pointer position, for the rubber-band preview.
    pub pointer: Option<Point>,
    /// Whether the pointer is held after placing an anchor.
    pub dragging: bool,
    /// Index of the in-progress anchor receiving handles.
    pub active_index: Option<usize>,
    pub mode: PenPointMode,
    /// Committed path open for editing.
    pub editing_path: Option<NodeId>,
    pub active_anchor: Option<ActiveAnchor>,
}

impl PenEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PenState {
        if !self.points.is_empty() {
            if self.dragging && self.active_index.is_some() {
                PenState::HandleDrag
            } else {
                PenState::Drawing
            }
        } else if self.editing_path.is_some() {
            PenState::Editing
        } else {
            PenState::Idle
        }
    }

    /// Handle a pen press on empty canvas.
    ///
    /// Secondary clicks and double-clicks finish the path open; a click within
    /// `close_threshold` of the first anchor with at least three anchors placed
    /// finishes it closed. Anything else appends an anchor and starts a handle
    /// drag for it.
    pub fn press(&mut self, world: Point, secondary: bool, click_count: u32, close_threshold: f64) -> PenPress {
        if self.editing_path.is_some() {
            return PenPress::Ignored;
        }
        if secondary {
            return PenPress::Finish { closed: false };
        }
        if click_count == 2 && self.points.len() > 1 {
            return PenPress::Finish { closed: false };
        }
        if self.is_near_start(world, close_threshold) {
            return PenPress::Finish { closed: true };
        }

        self.points.push(PathPoint::from_point(world));
        let index = self.points.len() - 1;
        self.active_index = Some(index);
        self.dragging = true;
        PenPress::Added(index)
    }

    /// Whether `world` would close the in-progress path.
    pub fn is_near_start(&self, world: Point, close_threshold: f64) -> bool {
        match self.points.first() {
            Some(first) if self.points.len() > 2 => (world - first.position()).hypot() < close_threshold,
            _ => false,
        }
    }

    /// Track the pointer. While dragging after a press, the active anchor gets
    /// a right handle at the pointer and a mirrored left handle.
    /// Returns true when handles were updated.
    pub fn pointer_moved(&mut self, world: Point) -> bool {
        self.pointer = Some(world);
        if !self.dragging {
            return false;
        }
        let Some(point) = self.active_index.and_then(|i| self.points.get_mut(i)) else {
            return false;
        };
        let handle = world - point.position();
        point.left = Some(-handle);
        point.right = Some(handle);
        true
    }

    pub fn release(&mut self) {
        self.dragging = false;
    }

    /// Discard the in-progress path.
    pub fn cancel(&mut self) {
        self.points.clear();
        self.active_index = None;
    }

    /// Clear all drawing state (tool switch).
    pub fn reset_drawing(&mut self) {
        self.points.clear();
        self.pointer = None;
        self.dragging = false;
        self.active_index = None;
    }

    /// Clear the editing target.
    pub fn stop_editing(&mut self) {
        self.editing_path = None;
        self.active_anchor = None;
    }

    /// Commit the in-progress anchors as a path node.
    ///
    /// With fewer than two anchors the drawing state is cleared and nothing
    /// is created. Otherwise the new node becomes the editing target with its
    /// last anchor active.
    pub fn finalize(&mut self, closed: bool) -> Option<Node> {
        let points = std::mem::take(&mut self.points);
        self.active_index = None;
        self.dragging = false;
        if points.len() < 2 {
            return None;
        }
        let (frame, normalized) = path::normalize(&points)?;
        let last = normalized.len() - 1;

        let node = Node::new(
            NodeData::Path {
                points: normalized,
                closed,
            },
            frame,
        )
        .with_style(NodeStyle {
            fill: Some(Paint::css("#dbeafe")),
            stroke: Some(Paint::css("#3b82f6")),
            stroke_width: 2.0,
            ..NodeStyle::default()
        });

        self.editing_path = Some(node.id);
        self.active_anchor = Some(ActiveAnchor {
            node_id: node.id,
            index: last,
        });
        log::debug!("Finalized path {} with {} anchors (closed: {closed})", node.id, last + 1);
        Some(node)
    }

    /// Open a committed path for editing at `index`.
    pub fn edit(&mut self, node_id: NodeId, index: Option<usize>) {
        self.editing_path = Some(node_id);
        self.active_anchor = index.map(|index| ActiveAnchor { node_id, index });
    }

    /// Make an anchor active and sync the point mode to its type.
    pub fn select_anchor(&mut self, node: &Node, index: usize) {
        self.editing_path = Some(node.id);
        self.active_anchor = Some(ActiveAnchor {
            node_id: node.id,
            index,
        });
        if let Some(point) = node.path().and_then(|(points, _)| points.get(index)) {
            self.mode = if point.is_smooth() {
                PenPointMode::Smooth
            } else {
                PenPointMode::Corner
            };
        }
    }

    /// Preview of the in-progress path in world space, with a rubber band to
    /// the pointer unless a handle is being dragged.
    pub fn preview(&self) -> BezPath {
        let mut preview = path::build_path(&self.points, false);
        if let Some(pointer) = self.pointer {
            if !self.points.is_empty() && !self.dragging {
                preview.line_to(pointer);
            }
        }
        preview
    }
}

/// Move an anchor or one of its handles by a delta in normalized units.
/// A missing handle starts from zero.
pub fn move_control(node: &Node, index: usize, kind: ControlKind, delta: Vec2) -> Option<Node> {
    let (points, _) = node.path()?;
    let mut points = points.to_vec();
    let point = points.get_mut(index)?;
    match kind {
        ControlKind::Anchor => *point = point.translated(delta),
        ControlKind::Left => point.left = Some(point.left.unwrap_or(Vec2::ZERO) + delta),
        ControlKind::Right => point.right = Some(point.right.unwrap_or(Vec2::ZERO) + delta),
    }
    Some(node.with_path_points(points))
}

/// World-space delta converted to the node's normalized units. A degenerate
/// dimension yields no movement on that axis.
pub fn local_delta(node: &Node, world_delta: Vec2) -> Vec2 {
    let local = |d: f64, size: f64| if size > 0.0 { d / size } else { 0.0 };
    Vec2::new(local(world_delta.x, node.width), local(world_delta.y, node.height))
}

/// Toggle an anchor: smooth becomes corner, corner gets `±offset` handles on x.
pub fn toggle_anchor(node: &Node, index: usize, offset: f64) -> Option<Node> {
    let (points, _) = node.path()?;
    let mut points = points.to_vec();
    let point = points.get_mut(index)?;
    *point = if point.is_smooth() {
        point.without_handles()
    } else {
        point.with_handles(Vec2::new(-offset, 0.0), Vec2::new(offset, 0.0))
    };
    Some(node.with_path_points(points))
}

/// Convert an anchor to `mode`. Smooth uses neighbor-direction handles of
/// `length`.
pub fn convert_anchor(node: &Node, index: usize, mode: PenPointMode, length: f64) -> Option<Node> {
    let (points, closed) = node.path()?;
    let closed = path::is_closed(points, closed);
    let converted = match mode {
        PenPointMode::Corner => points.get(index)?.without_handles(),
        PenPointMode::Smooth => path::smoothed(points, index, closed, length)?,
    };
    let mut points = points.to_vec();
    points[index] = converted;
    Some(node.with_path_points(points))
}

/// Insert an anchor at `local` right after the nearest existing anchor.
/// Smooth mode gives it neighbor-direction handles. Returns the new node and
/// the inserted index.
pub fn insert_after_nearest(node: &Node, local: Point, mode: PenPointMode, length: f64) -> Option<(Node, usize)> {
    let (points, closed) = node.path()?;
    let closed = path::is_closed(points, closed);
    let index = path::nearest_anchor(points, local)? + 1;

    let mut points = points.to_vec();
    points.insert(index, PathPoint::from_point(local));
    if mode == PenPointMode::Smooth {
        if let Some(smooth) = path::smoothed(&points, index, closed, length) {
            points[index] = smooth;
        }
    }
    Some((node.with_path_points(points), index))
}

/// Insert an anchor at `local` on the nearest segment. Smooth mode gives it
/// neighbor-direction handles computed with the anchor in place.
pub fn insert_on_segment(node: &Node, local: Point, mode: PenPointMode, length: f64) -> Option<(Node, usize)> {
    let (points, closed) = node.path()?;
    let closed = path::is_closed(points, closed);
    let segment = path::nearest_segment(points, local, closed)?;
    let index = segment + 1;

    let mut points = points.to_vec();
    points.insert(index, PathPoint::from_point(local));
    if mode == PenPointMode::Smooth {
        if let Some(smooth) = path::smoothed(&points, index, closed, length) {
            points[index] = smooth;
        }
    }
    Some((node.with_path_points(points), index))
}

/// World position of a path node's anchor.
pub fn anchor_world_position(node: &Node, index: usize) -> Option<Point> {
    control_world_position(node, index, ControlKind::Anchor)
}

/// World position of an anchor or one of its handles, if present.
pub fn control_world_position(node: &Node, index: usize, kind: ControlKind) -> Option<Point> {
    let (points, _) = node.path()?;
    let p = points.get(index)?;
    let local = match kind {
        ControlKind::Anchor => p.position(),
        ControlKind::Left => p.position() + p.left?,
        ControlKind::Right => p.position() + p.right?,
    };
    Some(Point::new(node.x + local.x * node.width, node.y + local.y * node.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{PathEl, Rect};

    fn path_node(points: Vec<PathPoint>, closed: bool) -> Node {
        Node::new(NodeData::Path { points, closed }, Rect::new(0.0, 0.0, 100.0, 100.0))
    }

    fn square_node(closed: bool) -> Node {
        path_node(
            vec![
                PathPoint::corner(0.0, 0.0),
                PathPoint::corner(1.0, 0.0),
                PathPoint::corner(1.0, 1.0),
                PathPoint::corner(0.0, 1.0),
            ],
            closed,
        )
    }

    #[test]
    fn test_states() {
        let mut pen = PenEditor::new();
        assert_eq!(pen.state(), PenState::Idle);
        pen.press(Point::new(0.0, 0.0), false, 1, 10.0);
        assert_eq!(pen.state(), PenState::HandleDrag);
        pen.release();
        assert_eq!(pen.state(), PenState::Drawing);
        let node = pen.finalize(false);
        assert!(node.is_none());
        assert_eq!(pen.state(), PenState::Idle);
    }

    #[test]
    fn test_close_near_start() {
        let mut pen = PenEditor::new();
        for p in [(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)] {
            pen.press(Point::new(p.0, p.1), false, 1, 10.0);
            pen.release();
        }
        assert_eq!(pen.press(Point::new(3.0, 4.0), false, 1, 10.0), PenPress::Finish { closed: true });

        let node = pen.finalize(true).unwrap();
        let (points, closed) = node.path().unwrap();
        assert_eq!(points.len(), 3);
        assert!(closed);
        assert_eq!(pen.state(), PenState::Editing);
        assert_eq!(pen.active_anchor.map(|a| a.index), Some(2));
    }

    #[test]
    fn test_close_requires_three_points() {
        let mut pen = PenEditor::new();
        pen.press(Point::new(0.0, 0.0), false, 1, 10.0);
        pen.press(Point::new(100.0, 0.0), false, 1, 10.0);
        assert_eq!(pen.press(Point::new(1.0, 1.0), false, 1, 10.0), PenPress::Added(2));
    }

    #[test]
    fn test_finish_variants() {
        let mut pen = PenEditor::new();
        assert_eq!(pen.press(Point::ZERO, true, 1, 10.0), PenPress::Finish { closed: false });
        pen.press(Point::new(0.0, 0.0), false, 1, 10.0);
        // A double-click needs two anchors already placed
        assert_eq!(pen.press(Point::new(5.0, 0.0), false, 2, 10.0), PenPress::Added(1));
        assert_eq!(pen.press(Point::new(5.0, 0.0), false, 2, 10.0), PenPress::Finish { closed: false });
    }

    #[test]
    fn test_ignored_while_editing() {
        let mut pen = PenEditor::new();
        pen.edit(uuid::Uuid::new_v4(), Some(0));
        assert_eq!(pen.press(Point::ZERO, false, 1, 10.0), PenPress::Ignored);
        assert!(pen.points.is_empty());
    }

    #[test]
    fn test_handle_drag_mirrors() {
        let mut pen = PenEditor::new();
        pen.press(Point::new(10.0, 10.0), false, 1, 10.0);
        assert!(pen.pointer_moved(Point::new(30.0, 5.0)));
        let p = pen.points[0];
        assert_eq!(p.right, Some(Vec2::new(20.0, -5.0)));
        assert_eq!(p.left, Some(Vec2::new(-20.0, 5.0)));

        pen.release();
        assert!(!pen.pointer_moved(Point::new(50.0, 50.0)));
        assert_eq!(pen.points[0].right, Some(Vec2::new(20.0, -5.0)));
    }

    #[test]
    fn test_finalize_normalizes() {
        let mut pen = PenEditor::new();
        let clicks = [Point::new(10.0, 20.0), Point::new(210.0, 20.0), Point::new(110.0, 120.0)];
        for p in clicks {
            pen.press(p, false, 1, 10.0);
            pen.release();
        }
        let node = pen.finalize(false).unwrap();
        assert!((node.x - 10.0).abs() < 1e-9);
        assert!((node.width - 200.0).abs() < 1e-9);
        assert!((node.height - 100.0).abs() < 1e-9);
        assert_eq!(node.style.stroke, Some(Paint::css("#3b82f6")));

        let world = path::denormalize(node.path().unwrap().0, node.bounds());
        for (a, b) in world.iter().zip(clicks) {
            assert!((a.x - b.x).abs() < 1e-9);
            assert!((a.y - b.y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_finalize_keeps_zero_handles() {
        let mut pen = PenEditor::new();
        pen.press(Point::new(0.0, 0.0), false, 1, 10.0);
        pen.pointer_moved(Point::new(0.0, 0.0));
        pen.release();
        pen.press(Point::new(10.0, 10.0), false, 1, 10.0);
        let node = pen.finalize(false).unwrap();
        assert_eq!(node.path().unwrap().0[0].right, Some(Vec2::ZERO));
    }

    #[test]
    fn test_escape_cancels() {
        let mut pen = PenEditor::new();
        pen.press(Point::new(0.0, 0.0), false, 1, 10.0);
        pen.cancel();
        assert!(pen.points.is_empty());
        assert!(pen.active_index.is_none());
    }

    #[test]
    fn test_preview_rubber_band() {
        let mut pen = PenEditor::new();
        pen.press(Point::new(0.0, 0.0), false, 1, 10.0);
        pen.release();
        pen.pointer_moved(Point::new(50.0, 0.0));
        let elements = pen.preview().elements().to_vec();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[1], PathEl::LineTo(Point::new(50.0, 0.0)));

        // No rubber band while dragging a handle
        pen.press(Point::new(50.0, 0.0), false, 1, 10.0);
        pen.pointer_moved(Point::new(60.0, 0.0));
        assert!(matches!(pen.preview().elements().last(), Some(PathEl::LineTo(_))));
        assert_eq!(pen.preview().elements().len(), 2);
    }

    #[test]
    fn test_select_anchor_syncs_mode() {
        let mut node = square_node(true);
        node = toggle_anchor(&node, 1, 0.1).unwrap();
        let mut pen = PenEditor::new();
        pen.select_anchor(&node, 1);
        assert_eq!(pen.mode, PenPointMode::Smooth);
        pen.select_anchor(&node, 0);
        assert_eq!(pen.mode, PenPointMode::Corner);
        assert_eq!(pen.editing_path, Some(node.id));
    }

    #[test]
    fn test_move_control() {
        let node = square_node(false);
        let moved = move_control(&node, 1, ControlKind::Anchor, Vec2::new(0.1, 0.2)).unwrap();
        let p = moved.path().unwrap().0[1];
        assert!((p.x - 1.1).abs() < 1e-9 && (p.y - 0.2).abs() < 1e-9);

        let handle = move_control(&node, 1, ControlKind::Left, Vec2::new(-0.1, 0.0)).unwrap();
        let p = handle.path().unwrap().0[1];
        assert_eq!(p.left, Some(Vec2::new(-0.1, 0.0)));
        assert_eq!(p.right, None);
        assert!(move_control(&node, 9, ControlKind::Anchor, Vec2::ZERO).is_none());
    }

    #[test]
    fn test_local_delta() {
        let node = Node::new(NodeData::Rectangle, Rect::new(0.0, 0.0, 200.0, 50.0));
        assert_eq!(local_delta(&node, Vec2::new(20.0, 5.0)), Vec2::new(0.1, 0.1));
    }

    #[test]
    fn test_toggle_anchor() {
        let node = square_node(false);
        let smooth = toggle_anchor(&node, 2, 0.1).unwrap();
        let p = smooth.path().unwrap().0[2];
        assert_eq!(p.left, Some(Vec2::new(-0.1, 0.0)));
        assert_eq!(p.right, Some(Vec2::new(0.1, 0.0)));

        let corner = toggle_anchor(&smooth, 2, 0.1).unwrap();
        assert!(!corner.path().unwrap().0[2].is_smooth());
    }

    #[test]
    fn test_convert_anchor() {
        let node = square_node(true);
        let smooth = convert_anchor(&node, 0, PenPointMode::Smooth, 0.2).unwrap();
        let right = smooth.path().unwrap().0[0].right.unwrap();
        assert!((right.hypot() - 0.2).abs() < 1e-9);

        let corner = convert_anchor(&smooth, 0, PenPointMode::Corner, 0.2).unwrap();
        assert!(!corner.path().unwrap().0[0].is_smooth());
    }

    #[test]
    fn test_insert_after_nearest_anchor() {
        let node = square_node(true);
        let (inserted, index) =
            insert_after_nearest(&node, Point::new(0.9, 0.1), PenPointMode::Corner, 0.2).unwrap();
        assert_eq!(index, 2);
        assert_eq!(inserted.path().unwrap().0.len(), 5);
        assert_eq!(inserted.path().unwrap().0[2], PathPoint::corner(0.9, 0.1));
    }

    #[test]
    fn test_insert_after_nearest_smooth() {
        let node = square_node(true);
        let (inserted, index) =
            insert_after_nearest(&node, Point::new(0.9, 0.1), PenPointMode::Smooth, 0.2).unwrap();
        assert_eq!(index, 2);
        let p = inserted.path().unwrap().0[2];
        assert!(p.is_smooth());
        // Neighbors (1,0) and (1,1): vertical handles
        assert!(p.right.unwrap().x.abs() < 1e-9);
        assert!((p.right.unwrap().y - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_insert_on_segment_closing_edge() {
        let node = square_node(true);
        let (inserted, index) = insert_on_segment(&node, Point::new(0.0, 0.5), PenPointMode::Corner, 0.2).unwrap();
        assert_eq!(index, 4);
        assert_eq!(inserted.path().unwrap().0[4], PathPoint::corner(0.0, 0.5));
    }

    #[test]
    fn test_insert_on_segment_smooth() {
        let node = square_node(false);
        let (inserted, index) = insert_on_segment(&node, Point::new(0.5, 0.0), PenPointMode::Smooth, 0.2).unwrap();
        assert_eq!(index, 1);
        let p = inserted.path().unwrap().0[1];
        // Neighbors (0,0) and (1,0): horizontal handles
        assert!((p.right.unwrap().x - 0.2).abs() < 1e-9);
        assert!(p.right.unwrap().y.abs() < 1e-9);
    }

    #[test]
    fn test_anchor_world_position() {
        let node = Node::new(
            NodeData::Path {
                points: vec![PathPoint::corner(0.5, 1.0)],
                closed: false,
            },
            Rect::new(10.0, 20.0, 110.0, 70.0),
        );
        assert_eq!(anchor_world_position(&node, 0), Some(Point::new(60.0, 70.0)));
        assert_eq!(anchor_world_position(&node, 1), None);

        let smooth = toggle_anchor(&node, 0, 0.1).unwrap();
        let handle = control_world_position(&smooth, 0, ControlKind::Right).unwrap();
        assert!((handle.x - 70.0).abs() < 1e-9 && (handle.y - 70.0).abs() < 1e-9);
        assert_eq!(control_world_position(&node, 0, ControlKind::Left), None);
    }
}
