//! Interaction controller: turns pointer, wheel and keyboard input into scene,
//! viewport and pen editor changes.
//!
//! The controller owns all interaction state. After every state-changing
//! operation it runs [`Controller::reconcile`], which prunes references to
//! deleted or deselected nodes and resets editing modes that no longer apply
//! to the active tool.

use crate::config::EngineConfig;
use crate::content::{BatchTicket, PendingBatch, SuggestionSource, brainstorm_prompt};
use crate::error::{CanvasError, CanvasResult};
use crate::geometry::Axis;
use crate::input::{ClickTracker, HitTarget, InputEvent, Key, Modifiers, MouseButton, PointerInput};
use crate::nodes::{Crop, GroupId, Node, NodeId, NodeKind, StyleUpdate};
use crate::pen::{self, CONTROL_HIT_RADIUS, ControlKind, PenEditor, PenPointMode, PenPress};
use crate::placement::{GridLayout, PlacementParams, find_free_origin};
use crate::scene::{Alignment, Scene};
use crate::selection::{
    HANDLE_HIT_RADIUS, ResizeHandle, ResizeLimits, ResizeState, apply_resize, hit_test_handles, is_resizable,
};
use crate::snap::{SnapGuide, SnapResult, compute_snap};
use crate::tools::{Tool, create_node, update_drawn_node};
use crate::viewport::Viewport;
use kurbo::{Point, Rect, Size, Vec2};
use std::collections::HashSet;

/// Selection rectangle state for marquee selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRect {
    /// Starting point in world coordinates.
    pub start: Point,
    /// Current point in world coordinates.
    pub current: Point,
    /// Shift was held at the press; hits join the existing selection.
    pub additive: bool,
}

impl SelectionRect {
    pub fn to_rect(&self) -> Rect {
        Rect::from_points(self.start, self.current)
    }
}

/// The drag-class operation in progress. Only one is active at a time.
#[derive(Debug, Clone, Default)]
pub enum Interaction {
    #[default]
    Idle,
    /// Last screen position of the pan.
    Panning { last_screen: Point },
    BoxSelecting(SelectionRect),
    /// World position the next move delta is measured from.
    NodeDragging { last_world: Point },
    Resizing(ResizeState),
    ShapeDrawing { node_id: NodeId, start: Point },
    /// Dragging a path anchor or handle under pointer capture.
    ControlDragging {
        node_id: NodeId,
        index: usize,
        kind: ControlKind,
        last_world: Point,
    },
    /// Dragging an image's content in crop mode under pointer capture.
    Cropping {
        node_id: NodeId,
        start_screen: Point,
        original: Crop,
    },
}

impl Interaction {
    /// Whether the pointer is captured by the dragged element.
    pub fn captures_pointer(&self) -> bool {
        matches!(self, Interaction::ControlDragging { .. } | Interaction::Cropping { .. })
    }
}

/// Application state plus the input state machine driving it.
#[derive(Debug, Clone)]
pub struct Controller {
    config: EngineConfig,
    scene: Scene,
    viewport: Viewport,
    tool: Tool,
    pen: PenEditor,
    interaction: Interaction,
    /// Node in content-edit mode.
    editing_node: Option<NodeId>,
    /// Image in crop mode.
    cropping_image: Option<NodeId>,
    snapping: bool,
    guides: Vec<SnapGuide>,
    pending: PendingBatch,
    clicks: ClickTracker,
    /// Target of a press that completed a double-click, dispatched on release.
    double_click: Option<HitTarget>,
}

impl Controller {
    /// Create a controller over an empty scene with the world origin centered
    /// in a viewport of `viewport_size`.
    pub fn new(config: EngineConfig, viewport_size: Size) -> Self {
        let viewport = Viewport::new(viewport_size).with_scale_bounds(config.min_scale, config.max_scale);
        Self {
            snapping: config.snapping_enabled,
            config,
            scene: Scene::new(),
            viewport,
            tool: Tool::default(),
            pen: PenEditor::new(),
            interaction: Interaction::Idle,
            editing_node: None,
            cropping_image: None,
            guides: Vec::new(),
            pending: PendingBatch::new(),
            clicks: ClickTracker::new(),
            double_click: None,
        }
    }

    /// Replace the scene contents.
    pub fn with_nodes(mut self, nodes: Vec<Node>) -> Self {
        self.scene = Scene::from_nodes(nodes);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn pen(&self) -> &PenEditor {
        &self.pen
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn editing_node(&self) -> Option<NodeId> {
        self.editing_node
    }

    pub fn cropping_image(&self) -> Option<NodeId> {
        self.cropping_image
    }

    pub fn snapping(&self) -> bool {
        self.snapping
    }

    /// Snap guides to render for the drag in progress.
    pub fn guides(&self) -> &[SnapGuide] {
        &self.guides
    }

    pub fn pending(&self) -> &PendingBatch {
        &self.pending
    }

    /// Marquee rectangle while box-selecting.
    pub fn selection_rect(&self) -> Option<Rect> {
        match &self.interaction {
            Interaction::BoxSelecting(rect) => Some(rect.to_rect()),
            _ => None,
        }
    }

    pub fn pointer_captured(&self) -> bool {
        self.interaction.captures_pointer()
    }

    /// World position of the active anchor, for overlays.
    pub fn active_anchor_position(&self) -> Option<Point> {
        let anchor = self.pen.active_anchor?;
        pen::anchor_world_position(self.scene.get(anchor.node_id)?, anchor.index)
    }

    /// Whether a pen press at the pointer would close the path being drawn.
    pub fn pointer_closes_path(&self) -> bool {
        let threshold = self.config.close_threshold(self.viewport.scale);
        self.pen
            .pointer
            .is_some_and(|pointer| self.pen.is_near_start(pointer, threshold))
    }

    /// Dispatch an input event.
    pub fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerDown(input) => self.handle_press(input),
            InputEvent::PointerMove { position } => self.handle_move(position),
            InputEvent::PointerUp { .. } => self.handle_release(),
            InputEvent::PointerLeave => {
                self.double_click = None;
                self.handle_release();
            }
            InputEvent::PointerCancel => self.cancel(),
            InputEvent::Wheel {
                position,
                delta,
                modifiers,
            } => self.handle_wheel(position, delta, modifiers),
            InputEvent::Key { key, text_focus } => self.handle_key(&key, text_focus),
        }
    }

    /// Resolve what lies under a screen position: path controls of the path
    /// being edited, then resize handles of a single selection, then the
    /// topmost node.
    pub fn hit_test(&self, screen: Point) -> HitTarget {
        let world = self.viewport.screen_to_world(screen);
        let scale = self.viewport.scale;

        if let Some(target) = self.hit_test_controls(world, CONTROL_HIT_RADIUS / scale) {
            return target;
        }

        if self.tool == Tool::Select {
            if let [id] = self.scene.selection() {
                if let Some(node) = self.scene.get(*id).filter(|n| is_resizable(n.kind())) {
                    if let Some(handle) = hit_test_handles(node.bounds(), world, HANDLE_HIT_RADIUS / scale) {
                        return HitTarget::ResizeHandle { node: node.id, handle };
                    }
                }
            }
        }

        let Some(node) = self.scene.hit_test(world).and_then(|id| self.scene.get(id)) else {
            return HitTarget::Canvas;
        };
        if self.cropping_image == Some(node.id) {
            return HitTarget::CropImage { node: node.id };
        }
        if node.is_path() {
            let local = pen::local_delta(node, world - node.origin());
            return HitTarget::PathBody {
                node: node.id,
                local: local.to_point(),
            };
        }
        HitTarget::Node { node: node.id }
    }

    fn hit_test_controls(&self, world: Point, radius: f64) -> Option<HitTarget> {
        let node = self.scene.get(self.pen.editing_path?)?;
        let (points, _) = node.path()?;
        let hits = |kind: ControlKind| {
            (0..points.len()).find(|&index| {
                pen::control_world_position(node, index, kind)
                    .is_some_and(|p| (p - world).hypot() <= radius)
            })
        };
        [ControlKind::Anchor, ControlKind::Left, ControlKind::Right]
            .into_iter()
            .find_map(|kind| {
                hits(kind).map(|index| HitTarget::PathControl {
                    node: node.id,
                    index,
                    kind,
                })
            })
    }

    // --- Pointer ---

    /// Handle a pointer press.
    pub fn handle_press(&mut self, input: PointerInput) {
        let screen = input.position;
        let world = self.viewport.screen_to_world(screen);
        let clicks = match input.click_count {
            Some(count) => count,
            None => self.clicks.register(screen, input.time_ms),
        };
        let target = input.target.unwrap_or_else(|| self.hit_test(screen));
        self.double_click = (clicks >= 2).then_some(target);

        self.press(target, screen, world, input.button, input.modifiers, clicks);
        self.reconcile();
    }

    fn press(
        &mut self,
        target: HitTarget,
        screen: Point,
        world: Point,
        button: MouseButton,
        modifiers: Modifiers,
        clicks: u32,
    ) {
        match target {
            HitTarget::PathControl { node, index, kind } => {
                self.start_control_drag(node, index, kind, world);
                return;
            }
            HitTarget::ResizeHandle { node, handle } => {
                self.start_resize(node, handle, world);
                return;
            }
            HitTarget::CropImage { node } if self.cropping_image == Some(node) => {
                self.start_crop_drag(node, screen);
                return;
            }
            _ => {}
        }

        let on_canvas = target == HitTarget::Canvas;
        if on_canvas && !self.pending.is_empty() {
            self.place_pending(world);
            return;
        }

        if on_canvas && self.tool == Tool::Select {
            self.editing_node = None;
            self.pen.stop_editing();
        }

        if self.tool == Tool::Hand || button == MouseButton::Middle {
            self.interaction = Interaction::Panning { last_screen: screen };
            return;
        }

        match target {
            HitTarget::Canvas => self.canvas_press(world, button, modifiers, clicks),
            HitTarget::Node { node } | HitTarget::CropImage { node } => self.node_press(node, world, modifiers),
            HitTarget::PathBody { node, local } => {
                // A second click on the edited path inserts on release instead.
                let double_click_edit = clicks >= 2 && self.pen.editing_path == Some(node);
                self.node_press(node, world, modifiers);
                if self.tool == Tool::Pen && !double_click_edit {
                    self.insert_anchor_on_segment(node, local);
                }
            }
            HitTarget::PathControl { .. } | HitTarget::ResizeHandle { .. } => {}
        }
    }

    fn canvas_press(&mut self, world: Point, button: MouseButton, modifiers: Modifiers, clicks: u32) {
        if self.tool == Tool::Pen {
            let threshold = self.config.close_threshold(self.viewport.scale);
            match self.pen.press(world, button == MouseButton::Right, clicks, threshold) {
                PenPress::Finish { closed } => self.finish_path(closed),
                PenPress::Added(index) => log::trace!("Pen anchor {index} at ({}, {})", world.x, world.y),
                PenPress::Ignored => {}
            }
            return;
        }

        if self.tool == Tool::Select {
            if !modifiers.shift {
                self.scene.clear_selection();
            }
            self.interaction = Interaction::BoxSelecting(SelectionRect {
                start: world,
                current: world,
                additive: modifiers.shift,
            });
            return;
        }

        if self.editing_node.is_some() {
            return;
        }
        let Some(node) = create_node(self.tool, world) else {
            return;
        };
        let id = node.id;
        self.scene.insert(node);
        self.scene.select_only(id);
        if self.tool.is_drawn() {
            self.interaction = Interaction::ShapeDrawing { node_id: id, start: world };
        } else {
            self.set_tool(Tool::Select);
        }
    }

    fn node_press(&mut self, id: NodeId, world: Point, modifiers: Modifiers) {
        let Some(node) = self.scene.get(id) else {
            return;
        };

        if self.tool == Tool::Pen && node.is_path() {
            let has_points = node.points().is_some_and(|p| !p.is_empty());
            self.scene.select_only(id);
            self.editing_node = Some(id);
            self.pen.reset_drawing();
            self.pen.edit(id, has_points.then_some(0));
            return;
        }
        if self.tool != Tool::Select {
            return;
        }

        let group = self.scene.group_members(id);
        if modifiers.shift {
            if self.scene.is_selected(id) {
                self.scene.deselect(id);
                return;
            }
            if group.is_empty() {
                self.scene.add_to_selection([id]);
            } else {
                self.scene.add_to_selection(group);
            }
        } else if !group.is_empty() {
            self.scene.select(group);
        } else if !self.scene.is_selected(id) {
            self.scene.select_only(id);
        }

        self.interaction = Interaction::NodeDragging { last_world: world };
    }

    fn start_resize(&mut self, id: NodeId, handle: ResizeHandle, world: Point) {
        if let Some(node) = self.scene.get(id) {
            self.interaction = Interaction::Resizing(ResizeState::new(node.clone(), handle, world));
        }
    }

    fn start_control_drag(&mut self, id: NodeId, index: usize, kind: ControlKind, world: Point) {
        let Some(node) = self.scene.get(id) else {
            return;
        };
        self.pen.select_anchor(node, index);
        self.interaction = Interaction::ControlDragging {
            node_id: id,
            index,
            kind,
            last_world: world,
        };
    }

    fn start_crop_drag(&mut self, id: NodeId, screen: Point) {
        let original = self.scene.get(id).and_then(Node::crop).unwrap_or_default();
        self.interaction = Interaction::Cropping {
            node_id: id,
            start_screen: screen,
            original,
        };
    }

    /// Handle pointer movement to a screen position.
    pub fn handle_move(&mut self, screen: Point) {
        let world = self.viewport.screen_to_world(screen);

        if self.interaction.captures_pointer() {
            self.captured_move(screen, world);
            return;
        }
        if !self.pending.is_empty() {
            self.pending.position = Some(world);
        }
        if self.tool == Tool::Pen && self.pen.pointer_moved(world) {
            return;
        }

        match &mut self.interaction {
            Interaction::Resizing(state) => {
                let limits = ResizeLimits {
                    min_size: self.config.min_node_size,
                    min_font_size: self.config.min_font_size,
                };
                let resized = apply_resize(&state.original, state.handle, state.delta(world), limits);
                if let Err(err) = self.scene.replace(resized) {
                    log::warn!("Resize target vanished: {err}");
                }
            }
            Interaction::Panning { last_screen } => {
                self.viewport.pan(screen - *last_screen);
                *last_screen = screen;
            }
            Interaction::ShapeDrawing { node_id, start } => {
                if self.scene.selection().len() == 1 {
                    let (id, start) = (*node_id, *start);
                    self.scene
                        .update_where(|n| n.id == id, |n| update_drawn_node(n, start, world));
                }
            }
            Interaction::BoxSelecting(rect) => rect.current = world,
            Interaction::NodeDragging { last_world } => {
                let delta = world - *last_world;
                let snap = if self.snapping {
                    let moving: Vec<Rect> = self.scene.selected_nodes().map(Node::bounds).collect();
                    let others: Vec<Rect> = self.scene.unselected_nodes().map(Node::bounds).collect();
                    let tolerance = self.config.snap_tolerance(self.viewport.scale);
                    compute_snap(&moving, &others, delta, self.viewport.visual_center(), tolerance)
                } else {
                    SnapResult::none()
                };
                let total = delta + snap.offset;
                self.scene.update_selected(|n| n.translated(total));
                *last_world = world + snap.offset;
                self.guides = snap.guides;
            }
            Interaction::Idle | Interaction::ControlDragging { .. } | Interaction::Cropping { .. } => {
                self.guides.clear();
            }
        }
    }

    fn captured_move(&mut self, screen: Point, world: Point) {
        match &mut self.interaction {
            Interaction::ControlDragging {
                node_id,
                index,
                kind,
                last_world,
            } => {
                let delta = world - *last_world;
                *last_world = world;
                let moved = self
                    .scene
                    .get(*node_id)
                    .and_then(|node| pen::move_control(node, *index, *kind, pen::local_delta(node, delta)));
                if let Some(node) = moved {
                    if let Err(err) = self.scene.replace(node) {
                        log::warn!("Control drag target vanished: {err}");
                    }
                }
            }
            Interaction::Cropping {
                node_id,
                start_screen,
                original,
            } => {
                let crop = original.offset_by(screen - *start_screen);
                let id = *node_id;
                self.scene.update_where(|n| n.id == id, |n| n.with_crop(crop));
            }
            _ => {}
        }
    }

    /// Handle a pointer release. A release ending a double-click dispatches
    /// the double-click afterwards.
    pub fn handle_release(&mut self) {
        if self.tool == Tool::Pen {
            self.pen.release();
        }
        self.guides.clear();

        match std::mem::take(&mut self.interaction) {
            Interaction::BoxSelecting(rect) => {
                let hits = self.scene.nodes_in_rect(rect.to_rect());
                if rect.additive {
                    self.scene.add_to_selection(hits);
                } else {
                    self.scene.select(hits);
                }
            }
            Interaction::ShapeDrawing { .. } if self.tool != Tool::Pencil => {
                self.tool = Tool::Select;
                log::debug!("Drawing finished, switching to {}", self.tool.name());
            }
            _ => {}
        }

        if let Some(target) = self.double_click.take() {
            self.double_click_on(target);
        }
        self.reconcile();
    }

    /// Abort the gesture in progress and release pointer capture.
    pub fn cancel(&mut self) {
        self.pen.release();
        self.guides.clear();
        self.interaction = Interaction::Idle;
        self.double_click = None;
        self.reconcile();
    }

    fn double_click_on(&mut self, target: HitTarget) {
        match target {
            HitTarget::PathControl {
                node,
                index,
                kind: ControlKind::Anchor,
            } => {
                let offset = self.config.toggle_handle_offset;
                let toggled = self
                    .scene
                    .get(node)
                    .and_then(|n| pen::toggle_anchor(n, index, offset));
                if let Some(toggled) = toggled {
                    self.pen.select_anchor(&toggled, index);
                    self.commit_node(toggled);
                }
            }
            HitTarget::PathBody { node, local } if self.pen.editing_path == Some(node) => {
                let (mode, length) = (self.pen.mode, self.config.smooth_handle_length);
                let inserted = self
                    .scene
                    .get(node)
                    .and_then(|n| pen::insert_after_nearest(n, local, mode, length));
                if let Some((updated, index)) = inserted {
                    self.pen.select_anchor(&updated, index);
                    self.commit_node(updated);
                }
            }
            HitTarget::Node { node } | HitTarget::PathBody { node, .. } | HitTarget::CropImage { node } => {
                self.edit_node(node);
            }
            HitTarget::Canvas | HitTarget::PathControl { .. } | HitTarget::ResizeHandle { .. } => {}
        }
    }

    /// Select a node solely and enter content-edit mode. Paths switch to the
    /// pen tool with anchor 0 active.
    pub fn edit_node(&mut self, id: NodeId) {
        let Some(node) = self.scene.get(id) else {
            return;
        };
        let is_path = node.is_path();
        let has_points = node.points().is_some_and(|p| !p.is_empty());

        self.scene.select_only(id);
        self.editing_node = Some(id);
        if is_path {
            self.tool = Tool::Pen;
            self.pen.edit(id, has_points.then_some(0));
        } else {
            self.tool = Tool::Select;
        }
        self.reconcile();
    }

    /// Handle a wheel event: zoom about the cursor with ctrl/cmd, pan otherwise.
    pub fn handle_wheel(&mut self, screen: Point, delta: Vec2, modifiers: Modifiers) {
        if modifiers.command() {
            let factor = 1.0 - delta.y * self.config.wheel_zoom_sensitivity;
            self.viewport.zoom_at(screen, factor);
        } else {
            self.viewport.pan(-delta);
        }
    }

    /// Handle a key press. Skipped while a text input has focus.
    pub fn handle_key(&mut self, key: &Key, text_focus: bool) {
        if text_focus {
            return;
        }
        match key {
            Key::Delete | Key::Backspace => {
                self.scene.delete_selected();
            }
            Key::Escape if self.tool == Tool::Pen => self.pen.cancel(),
            Key::Enter if self.tool == Tool::Pen && self.pen.points.len() > 1 => self.finish_path(false),
            _ => {}
        }
        self.reconcile();
    }

    // --- Pen ---

    fn finish_path(&mut self, closed: bool) {
        let Some(node) = self.pen.finalize(closed) else {
            return;
        };
        let id = node.id;
        self.scene.insert(node);
        self.scene.select_only(id);
        self.editing_node = Some(id);
    }

    fn insert_anchor_on_segment(&mut self, id: NodeId, local: Point) {
        let (mode, length) = (self.pen.mode, self.config.smooth_handle_length);
        let inserted = self
            .scene
            .get(id)
            .and_then(|n| pen::insert_on_segment(n, local, mode, length));
        if let Some((updated, index)) = inserted {
            self.pen.select_anchor(&updated, index);
            self.commit_node(updated);
        }
    }

    /// Make an anchor of a path active.
    pub fn select_anchor(&mut self, id: NodeId, index: usize) {
        if let Some(node) = self.scene.get(id) {
            self.pen.select_anchor(node, index);
        }
        self.reconcile();
    }

    /// Set the pen point mode and convert the active anchor to it.
    pub fn set_pen_mode(&mut self, mode: PenPointMode) {
        self.pen.mode = mode;
        if let Some(anchor) = self.pen.active_anchor {
            let length = self.config.smooth_handle_length;
            let converted = self
                .scene
                .get(anchor.node_id)
                .and_then(|n| pen::convert_anchor(n, anchor.index, mode, length));
            if let Some(node) = converted {
                self.commit_node(node);
            }
        }
        self.reconcile();
    }

    fn commit_node(&mut self, node: Node) {
        if let Err(err) = self.scene.replace(node) {
            log::warn!("Dropping edit: {err}");
        }
    }

    // --- Commands ---

    pub fn set_tool(&mut self, tool: Tool) {
        if self.tool != tool {
            log::debug!("Tool: {} -> {}", self.tool.name(), tool.name());
        }
        self.tool = tool;
        self.reconcile();
    }

    pub fn set_snapping(&mut self, enabled: bool) {
        self.snapping = enabled;
        if !enabled {
            self.guides.clear();
        }
    }

    pub fn toggle_snapping(&mut self) {
        self.set_snapping(!self.snapping);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_by(self.config.zoom_in_factor);
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_by(self.config.zoom_out_factor);
    }

    pub fn resize_viewport(&mut self, size: Size) {
        self.viewport.resize(size);
    }

    pub fn delete_selected(&mut self) -> usize {
        let removed = self.scene.delete_selected();
        self.reconcile();
        removed
    }

    pub fn align(&mut self, alignment: Alignment) -> bool {
        self.scene.align_selected(alignment)
    }

    pub fn distribute(&mut self, axis: Axis) -> bool {
        self.scene.distribute_selected(axis)
    }

    pub fn group(&mut self) -> Option<GroupId> {
        self.scene.group_selected()
    }

    pub fn ungroup(&mut self) -> usize {
        self.scene.ungroup_selected()
    }

    pub fn bring_to_front(&mut self) {
        self.scene.bring_to_front();
    }

    pub fn send_to_back(&mut self) {
        self.scene.send_to_back();
    }

    /// Select from the layer list: a plain click selects solely, a modifier
    /// click toggles membership.
    pub fn select_layer(&mut self, id: NodeId, multi: bool) {
        if multi {
            self.scene.toggle_selection(id);
        } else {
            self.scene.select_only(id);
        }
        self.reconcile();
    }

    /// Replace a node's text content.
    pub fn update_content(&mut self, id: NodeId, content: &str) -> CanvasResult<()> {
        let updated = self
            .scene
            .update_where(|n| n.id == id, |n| n.clone().with_content(content));
        if updated == 0 {
            return Err(CanvasError::UnknownNode(id));
        }
        Ok(())
    }

    /// Apply a partial style to every selected node.
    pub fn update_style(&mut self, update: &StyleUpdate) -> usize {
        self.scene.update_selected(|n| n.with_style_update(update))
    }

    /// Enter or leave crop mode for the single selected image. Entering
    /// unlocks the aspect ratio and gives the image a default crop; leaving
    /// locks it again. Returns whether crop mode is now on.
    pub fn toggle_crop(&mut self) -> bool {
        let image = match self.scene.selection() {
            [id] => self.scene.get(*id).filter(|n| n.kind() == NodeKind::Image),
            _ => None,
        };
        let Some((id, crop)) = image.map(|n| (n.id, n.crop().unwrap_or_default())) else {
            return false;
        };

        if self.cropping_image == Some(id) {
            self.cropping_image = None;
            self.scene.update_where(
                |n| n.id == id,
                |n| Node {
                    aspect_ratio_locked: true,
                    ..n.clone()
                },
            );
            return false;
        }

        self.cropping_image = Some(id);
        self.scene.update_where(
            |n| n.id == id,
            |n| Node {
                aspect_ratio_locked: false,
                ..n.with_crop(crop)
            },
        );
        true
    }

    // --- Pending content ---

    /// Ticket for an upload or suggestion request issued now.
    pub fn content_ticket(&self) -> BatchTicket {
        self.pending.ticket()
    }

    /// Complete an image upload. The first image of a batch previews at the
    /// viewport center and switches to the select tool. Stale tickets are
    /// dropped.
    pub fn complete_image(&mut self, ticket: BatchTicket, src: impl Into<String>, decoded: Size) -> bool {
        if !self
            .pending
            .push_image(ticket, src, decoded, self.config.max_upload_dimension)
        {
            return false;
        }
        if self.pending.position.is_none() {
            self.pending.position = Some(self.viewport.visual_center());
        }
        self.set_tool(Tool::Select);
        true
    }

    /// Ask `source` for ideas branching off a node's content and queue them
    /// as pending sticky notes. Source failures propagate and leave the scene
    /// untouched.
    pub fn request_suggestions(&mut self, source: &dyn SuggestionSource, id: NodeId) -> CanvasResult<usize> {
        let node = self.scene.get(id).ok_or(CanvasError::UnknownNode(id))?;
        let prompt = brainstorm_prompt(&node.content);
        let ticket = self.pending.ticket();
        let suggestions = source.suggest(&prompt)?;

        let queued = self.pending.push_suggestions(ticket, suggestions);
        if queued > 0 {
            if self.pending.position.is_none() {
                self.pending.position = Some(self.viewport.visual_center());
            }
            self.set_tool(Tool::Select);
        }
        Ok(queued)
    }

    /// Discard pending content.
    pub fn cancel_pending(&mut self) {
        self.pending.clear();
    }

    /// Place the pending batch as a grid centered near `world`, avoiding
    /// existing nodes, and select the placed nodes.
    pub fn place_pending(&mut self, world: Point) {
        let items = self.pending.take();
        if items.is_empty() {
            return;
        }
        let sizes: Vec<Size> = items.iter().map(|item| item.size).collect();
        let grid = GridLayout::new(&sizes, self.config.pending_spacing);
        let obstacles: Vec<Rect> = self.scene.nodes().iter().map(Node::bounds).collect();
        let params = PlacementParams {
            padding: self.config.placement_padding,
            max_iterations: self.config.placement_max_iterations,
            min_step: self.config.placement_min_step,
            max_step: self.config.placement_max_step,
        };
        let origin = find_free_origin(world, grid.footprint(), &obstacles, params);

        let nodes: Vec<Node> = items
            .iter()
            .zip(grid.positions(origin, &sizes))
            .map(|(item, position)| item.to_node(position))
            .collect();
        let ids: Vec<NodeId> = nodes.iter().map(|n| n.id).collect();
        log::debug!("Placed {} pending items at ({}, {})", ids.len(), origin.x, origin.y);

        self.scene.insert_many(nodes);
        self.scene.select(ids);
        self.set_tool(Tool::Select);
    }

    // --- Reconciliation ---

    /// Bring derived state back in line with the scene and the active tool.
    pub fn reconcile(&mut self) {
        self.scene.prune_selection();

        if self.tool == Tool::Pen {
            let primary = self
                .scene
                .primary()
                .filter(|n| n.is_path())
                .map(|n| (n.id, n.points().is_some_and(|p| !p.is_empty())));
            if let Some((id, has_points)) = primary {
                let keeps_anchor = self.pen.active_anchor.is_some_and(|a| a.node_id == id);
                let index = if keeps_anchor {
                    self.pen.active_anchor.map(|a| a.index)
                } else {
                    has_points.then_some(0)
                };
                self.pen.edit(id, index);
                self.editing_node = Some(id);
            }
        } else {
            self.pen.reset_drawing();
            self.pen.stop_editing();
            if self.tool != Tool::Select {
                self.editing_node = None;
            }
        }

        let selected: HashSet<NodeId> = self.scene.selection().iter().copied().collect();
        if let Some(anchor) = self.pen.active_anchor {
            let valid = selected.contains(&anchor.node_id)
                && self
                    .scene
                    .get(anchor.node_id)
                    .and_then(Node::points)
                    .is_some_and(|p| anchor.index < p.len());
            if !valid {
                self.pen.active_anchor = None;
            }
        }
        if self.pen.editing_path.is_some_and(|id| !self.scene.contains(id)) {
            self.pen.stop_editing();
        }
        if self.editing_node.is_some_and(|id| !self.scene.contains(id)) {
            self.editing_node = None;
        }
        if self.cropping_image.is_some_and(|id| !selected.contains(&id)) {
            self.cropping_image = None;
        }
    }
}
