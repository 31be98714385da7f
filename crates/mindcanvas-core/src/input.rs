//! Input events for pointer, wheel and keyboard handling.

use crate::nodes::NodeId;
use crate::pen::ControlKind;
use crate::selection::ResizeHandle;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Double-click detection constants.
const DOUBLE_CLICK_TIME_MS: u64 = 500;
const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// What a pointer press landed on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HitTarget {
    /// Empty canvas.
    Canvas,
    /// A node body.
    Node { node: NodeId },
    /// The body of a path node, with the pointer in its normalized local space.
    PathBody { node: NodeId, local: Point },
    ResizeHandle { node: NodeId, handle: ResizeHandle },
    /// An anchor or handle of the path being edited.
    PathControl {
        node: NodeId,
        index: usize,
        #[serde(rename = "control")]
        kind: ControlKind,
    },
    /// The bitmap of an image in crop mode.
    CropImage { node: NodeId },
}

/// A pointer press.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerInput {
    /// Screen position.
    pub position: Point,
    #[serde(default)]
    pub button: MouseButton,
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Consecutive click count reported by the host. When absent it is
    /// derived from `time_ms` and the previous press.
    #[serde(default)]
    pub click_count: Option<u32>,
    #[serde(default)]
    pub time_ms: u64,
    /// Hit target reported by the host. When absent the controller hit-tests.
    #[serde(default)]
    pub target: Option<HitTarget>,
}

impl PointerInput {
    /// A plain left click at a screen position.
    pub fn at(position: Point) -> Self {
        Self {
            position,
            button: MouseButton::Left,
            modifiers: Modifiers::NONE,
            click_count: Some(1),
            time_ms: 0,
            target: None,
        }
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_clicks(mut self, count: u32) -> Self {
        self.click_count = Some(count);
        self
    }

    pub fn with_target(mut self, target: HitTarget) -> Self {
        self.target = Some(target);
        self
    }
}

/// Keys the engine reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Delete,
    Backspace,
    Escape,
    Enter,
    Character(String),
}

/// Input events consumed by the interaction controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    PointerDown(PointerInput),
    PointerMove {
        position: Point,
    },
    PointerUp {
        position: Point,
    },
    /// The pointer left the canvas; ends the gesture like a release.
    PointerLeave,
    /// The platform cancelled the gesture.
    PointerCancel,
    Wheel {
        position: Point,
        delta: Vec2,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Key {
        key: Key,
        /// A text input has focus; global shortcuts are skipped.
        #[serde(default)]
        text_focus: bool,
    },
}

/// Derives click counts from press times and positions.
#[derive(Debug, Clone, Default)]
pub struct ClickTracker {
    last: Option<(u64, Point)>,
    count: u32,
}

impl ClickTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a press and return its click count. Presses within 500ms and
    /// 5px of the previous one extend the sequence.
    pub fn register(&mut self, position: Point, time_ms: u64) -> u32 {
        let continues = self.last.is_some_and(|(last_time, last_pos)| {
            time_ms.saturating_sub(last_time) < DOUBLE_CLICK_TIME_MS
                && (position - last_pos).hypot() < DOUBLE_CLICK_DISTANCE
        });
        self.count = if continues { self.count + 1 } else { 1 };
        self.last = Some((time_ms, position));
        self.count
    }

    /// Forget the previous press.
    pub fn reset(&mut self) {
        self.last = None;
        self.count = 0;
    }
}
