//! Session scripts: an initial scene, a viewport and a list of steps replayed
//! through the interaction controller.

use crate::error::AppResult;
use kurbo::Size;
use mindcanvas_core::geometry::Axis;
use mindcanvas_core::nodes::StyleUpdate;
use mindcanvas_core::{
    Alignment, CannedSuggestions, Controller, EngineConfig, InputEvent, Node, NodeId, PenPointMode, Tool,
    initial_nodes,
};
use serde::Deserialize;
use std::path::Path;

fn default_viewport() -> Size {
    Size::new(1280.0, 800.0)
}

/// Engine commands issued outside the pointer stream (toolbar buttons,
/// panels, completed uploads).
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    SetTool { tool: Tool },
    ToggleSnapping,
    ZoomIn,
    ZoomOut,
    Align { alignment: Alignment },
    Distribute { axis: Axis },
    Group,
    Ungroup,
    BringToFront,
    SendToBack,
    DeleteSelected,
    SelectLayer {
        node: NodeId,
        #[serde(default)]
        multi: bool,
    },
    UpdateContent { node: NodeId, content: String },
    UpdateStyle { style: StyleUpdate },
    ToggleCrop,
    SetPenMode { mode: PenPointMode },
    /// An image finished decoding with the given pixel size.
    ImageLoaded { src: String, width: f64, height: f64 },
    /// Suggestions for a node, answered with a recorded response body.
    Suggest { node: NodeId, response: String },
    CancelPending,
}

/// One replayed step.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Input(InputEvent),
    Command(Command),
}

/// A replayable session.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    #[serde(default = "default_viewport")]
    pub viewport: Size,
    /// Starting scene. The welcome nodes are used when absent.
    #[serde(default)]
    pub nodes: Option<Vec<Node>>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Session {
    pub fn from_json(json: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Replay every step and return the resulting controller.
    pub fn replay(self, config: EngineConfig) -> AppResult<Controller> {
        let nodes = self.nodes.unwrap_or_else(initial_nodes);
        let mut controller = Controller::new(config, self.viewport).with_nodes(nodes);
        let total = self.steps.len();

        for (i, step) in self.steps.into_iter().enumerate() {
            log::trace!("Step {}/{total}: {step:?}", i + 1);
            match step {
                Step::Input(event) => controller.handle(event),
                Step::Command(command) => apply(&mut controller, command)?,
            }
        }

        log::debug!(
            "Replayed {total} steps: {} nodes, {} selected",
            controller.scene().len(),
            controller.scene().selection().len()
        );
        Ok(controller)
    }
}

fn apply(controller: &mut Controller, command: Command) -> AppResult<()> {
    match command {
        Command::SetTool { tool } => controller.set_tool(tool),
        Command::ToggleSnapping => controller.toggle_snapping(),
        Command::ZoomIn => controller.zoom_in(),
        Command::ZoomOut => controller.zoom_out(),
        Command::Align { alignment } => {
            controller.align(alignment);
        }
        Command::Distribute { axis } => {
            controller.distribute(axis);
        }
        Command::Group => {
            controller.group();
        }
        Command::Ungroup => {
            controller.ungroup();
        }
        Command::BringToFront => controller.bring_to_front(),
        Command::SendToBack => controller.send_to_back(),
        Command::DeleteSelected => {
            controller.delete_selected();
        }
        Command::SelectLayer { node, multi } => controller.select_layer(node, multi),
        Command::UpdateContent { node, content } => controller.update_content(node, &content)?,
        Command::UpdateStyle { style } => {
            controller.update_style(&style);
        }
        Command::ToggleCrop => {
            controller.toggle_crop();
        }
        Command::SetPenMode { mode } => controller.set_pen_mode(mode),
        Command::ImageLoaded { src, width, height } => {
            let ticket = controller.content_ticket();
            controller.complete_image(ticket, src, Size::new(width, height));
        }
        Command::Suggest { node, response } => {
            let source = CannedSuggestions::new(response);
            let queued = controller.request_suggestions(&source, node)?;
            log::info!("Queued {queued} suggestions");
        }
        Command::CancelPending => controller.cancel_pending(),
    }
    Ok(())
}
