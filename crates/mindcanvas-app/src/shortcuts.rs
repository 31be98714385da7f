//! Keyboard and pointer shortcut registry and documentation.

/// A shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(key: &'static str, ctrl: bool, shift: bool, description: &'static str) -> Self {
        Self {
            key,
            ctrl,
            shift,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Scroll").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }
}

/// Registry of all shortcuts the engine reacts to.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("Delete", false, false, "Delete selected nodes"),
            Shortcut::new("Backspace", false, false, "Delete selected nodes"),
            Shortcut::new("Escape", false, false, "Discard the path being drawn (pen)"),
            Shortcut::new("Enter", false, false, "Finish the path being drawn as open (pen)"),
            Shortcut::new("Scroll", false, false, "Pan the canvas"),
            Shortcut::new("Scroll", true, false, "Zoom around the cursor"),
            Shortcut::new("Middle-drag", false, false, "Pan the canvas"),
            Shortcut::new("Click", false, true, "Add or remove a node from the selection"),
            Shortcut::new("Drag", false, true, "Add box-selected nodes to the selection"),
            Shortcut::new("Double-click", false, false, "Edit node content, or edit a path with the pen"),
            Shortcut::new("Right-click", false, false, "Finish the path being drawn as open (pen)"),
        ]
    }

    /// Render the shortcut table.
    pub fn table() -> String {
        let mut out = String::from("=== Shortcuts ===\n");
        for shortcut in Self::all() {
            out.push_str(&format!("  {:20} {}\n", shortcut.format(), shortcut.description));
        }
        out
    }
}
