//! Resize handles and the resize manipulation.

use crate::nodes::{Node, NodeData, NodeId, NodeKind};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Resize handle hit radius in screen pixels.
pub const HANDLE_HIT_RADIUS: f64 = 6.0;

/// Named resize handle on a node's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl ResizeHandle {
    pub fn all() -> &'static [ResizeHandle] {
        &[
            ResizeHandle::NW,
            ResizeHandle::N,
            ResizeHandle::NE,
            ResizeHandle::E,
            ResizeHandle::SE,
            ResizeHandle::S,
            ResizeHandle::SW,
            ResizeHandle::W,
        ]
    }

    pub fn has_north(self) -> bool {
        matches!(self, ResizeHandle::N | ResizeHandle::NE | ResizeHandle::NW)
    }

    pub fn has_south(self) -> bool {
        matches!(self, ResizeHandle::S | ResizeHandle::SE | ResizeHandle::SW)
    }

    pub fn has_east(self) -> bool {
        matches!(self, ResizeHandle::E | ResizeHandle::NE | ResizeHandle::SE)
    }

    pub fn has_west(self) -> bool {
        matches!(self, ResizeHandle::W | ResizeHandle::NW | ResizeHandle::SW)
    }

    /// Corner handles scale text; edge handles reflow it.
    pub fn is_corner(self) -> bool {
        matches!(self, ResizeHandle::NE | ResizeHandle::NW | ResizeHandle::SE | ResizeHandle::SW)
    }

    /// Position of this handle on `bounds`.
    pub fn position(self, bounds: Rect) -> Point {
        let center = bounds.center();
        let x = if self.has_west() {
            bounds.x0
        } else if self.has_east() {
            bounds.x1
        } else {
            center.x
        };
        let y = if self.has_north() {
            bounds.y0
        } else if self.has_south() {
            bounds.y1
        } else {
            center.y
        };
        Point::new(x, y)
    }

    /// CSS cursor name, for hosts that show one while hovering.
    pub fn cursor(self) -> &'static str {
        match self {
            ResizeHandle::N | ResizeHandle::S => "ns-resize",
            ResizeHandle::E | ResizeHandle::W => "ew-resize",
            ResizeHandle::NE | ResizeHandle::SW => "nesw-resize",
            ResizeHandle::NW | ResizeHandle::SE => "nwse-resize",
        }
    }
}

/// Find the handle of `bounds` under a world-space point.
/// `tolerance` is in world units (screen radius divided by scale).
pub fn hit_test_handles(bounds: Rect, point: Point, tolerance: f64) -> Option<ResizeHandle> {
    ResizeHandle::all()
        .iter()
        .copied()
        .find(|handle| (handle.position(bounds) - point).hypot2() <= tolerance * tolerance)
}

/// Whether a node kind shows resize handles.
pub fn is_resizable(kind: NodeKind) -> bool {
    !matches!(kind, NodeKind::Line | NodeKind::Arrow | NodeKind::Draw)
}

/// State of an in-progress resize: the node as it was when the drag began.
#[derive(Debug, Clone)]
pub struct ResizeState {
    pub node_id: NodeId,
    pub handle: ResizeHandle,
    /// World-space pointer position at resize start.
    pub start_point: Point,
    pub original: Node,
}

impl ResizeState {
    pub fn new(original: Node, handle: ResizeHandle, start_point: Point) -> Self {
        Self {
            node_id: original.id,
            handle,
            start_point,
            original,
        }
    }

    /// Cumulative world-space delta since the resize started.
    pub fn delta(&self, current: Point) -> Vec2 {
        current - self.start_point
    }
}

/// Limits applied by [`apply_resize`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeLimits {
    pub min_size: f64,
    pub min_font_size: f64,
}

/// Resize `original` by a cumulative world-space `delta` dragged on `handle`.
///
/// Aspect-locked nodes and images keep the original ratio, with the opposite
/// edge held in place for `n`/`w` handles. Text dragged by a corner scales its
/// font with the width ratio. Width and height never drop below `min_size`.
pub fn apply_resize(original: &Node, handle: ResizeHandle, delta: Vec2, limits: ResizeLimits) -> Node {
    let (x0, y0, w0, h0) = (original.x, original.y, original.width, original.height);
    let f0 = original.font_size();
    let (mut x, mut y, mut w, mut h, mut font) = (x0, y0, w0, h0, f0);

    if handle.has_east() {
        w = w0 + delta.x;
    }
    if handle.has_west() {
        w = w0 - delta.x;
        x = x0 + delta.x;
    }
    if handle.has_south() {
        h = h0 + delta.y;
    }
    if handle.has_north() {
        h = h0 - delta.y;
        y = y0 + delta.y;
    }

    if (original.aspect_ratio_locked || original.kind() == NodeKind::Image) && h0 != 0.0 {
        let ratio = w0 / h0;
        if handle.has_east() || handle.has_west() {
            h = w / ratio;
            if handle.has_north() {
                y = y0 + (h0 - h);
            }
        } else {
            w = h * ratio;
            if handle.has_west() {
                x = x0 + (w0 - w);
            }
        }
    }

    if original.kind() == NodeKind::Text && handle.is_corner() && w0 != 0.0 {
        let ratio = w / w0;
        font = (f0 * ratio).max(limits.min_font_size);
        h = h0 * ratio;
    }

    let mut node = Node {
        x,
        y,
        width: w.max(limits.min_size),
        height: h.max(limits.min_size),
        ..original.clone()
    };
    if let NodeData::Text(style) | NodeData::Sticky(style) = &mut node.data {
        style.font_size = font.round();
    }
    node
}
