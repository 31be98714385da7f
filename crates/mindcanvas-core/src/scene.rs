//! Scene model: the node collection, the selection and grouping.
//!
//! Nodes live in paint order (back to front). Every mutation builds a new
//! collection and swaps it in, so a [`Scene::snapshot`] taken before the
//! mutation keeps observing fully-formed nodes.

use crate::error::{CanvasError, CanvasResult};
use crate::geometry::{Axis, bounding_box, rects_overlap};
use crate::nodes::{GroupId, Node, NodeId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Alignment target for [`Scene::align_selected`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    CenterX,
    Right,
    Top,
    CenterY,
    Bottom,
}

/// Node collection plus the ordered selection.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: Arc<Vec<Node>>,
    /// Selected ids in insertion order. The last one is the primary selection.
    selection: Vec<NodeId>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self {
            nodes: Arc::new(nodes),
            selection: Vec::new(),
        }
    }

    /// Load a scene from a JSON array of node records.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        let nodes: Vec<Node> = serde_json::from_str(json)?;
        Ok(Self::from_nodes(nodes))
    }

    /// Serialize the nodes as a JSON array.
    pub fn to_json(&self) -> CanvasResult<String> {
        Ok(serde_json::to_string_pretty(self.nodes.as_slice())?)
    }

    /// Nodes in paint order (back to front).
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Shared handle to the current collection.
    pub fn snapshot(&self) -> Arc<Vec<Node>> {
        Arc::clone(&self.nodes)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    fn commit(&mut self, nodes: Vec<Node>) {
        self.nodes = Arc::new(nodes);
    }

    /// Append a node at the front of the paint order.
    pub fn insert(&mut self, node: Node) {
        self.insert_many(vec![node]);
    }

    /// Append nodes at the front of the paint order.
    pub fn insert_many(&mut self, new_nodes: Vec<Node>) {
        let mut nodes = Vec::with_capacity(self.nodes.len() + new_nodes.len());
        nodes.extend(self.nodes.iter().cloned());
        nodes.extend(new_nodes);
        self.commit(nodes);
    }

    /// Replace every node matching `pred` with `f(node)`. Returns how many matched.
    pub fn update_where<P, F>(&mut self, pred: P, f: F) -> usize
    where
        P: Fn(&Node) -> bool,
        F: Fn(&Node) -> Node,
    {
        let mut count = 0;
        let nodes = self
            .nodes
            .iter()
            .map(|n| {
                if pred(n) {
                    count += 1;
                    f(n)
                } else {
                    n.clone()
                }
            })
            .collect();
        if count > 0 {
            self.commit(nodes);
        }
        count
    }

    /// Replace every selected node with `f(node)`.
    pub fn update_selected<F>(&mut self, f: F) -> usize
    where
        F: Fn(&Node) -> Node,
    {
        let selected: HashSet<NodeId> = self.selection.iter().copied().collect();
        self.update_where(|n| selected.contains(&n.id), f)
    }

    /// Replace the node with the same id.
    pub fn replace(&mut self, node: Node) -> CanvasResult<()> {
        let id = node.id;
        if !self.contains(id) {
            return Err(CanvasError::UnknownNode(id));
        }
        self.update_where(|n| n.id == id, |_| node.clone());
        Ok(())
    }

    /// Delete nodes by id and prune them from the selection.
    pub fn delete(&mut self, ids: &HashSet<NodeId>) -> usize {
        let before = self.nodes.len();
        let nodes: Vec<Node> = self.nodes.iter().filter(|n| !ids.contains(&n.id)).cloned().collect();
        let removed = before - nodes.len();
        if removed > 0 {
            self.commit(nodes);
            self.prune_selection();
        }
        removed
    }

    /// Delete every selected node and clear the selection.
    pub fn delete_selected(&mut self) -> usize {
        let ids: HashSet<NodeId> = self.selection.iter().copied().collect();
        let removed = self.delete(&ids);
        self.selection.clear();
        removed
    }

    /// Move selected nodes to the end of the paint order, keeping their relative order.
    pub fn bring_to_front(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        let (picked, others) = self.partition_selected();
        self.commit(others.into_iter().chain(picked).collect());
    }

    /// Move selected nodes to the start of the paint order, keeping their relative order.
    pub fn send_to_back(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        let (picked, others) = self.partition_selected();
        self.commit(picked.into_iter().chain(others).collect());
    }

    fn partition_selected(&self) -> (Vec<Node>, Vec<Node>) {
        let selected: HashSet<NodeId> = self.selection.iter().copied().collect();
        self.nodes.iter().cloned().partition(|n| selected.contains(&n.id))
    }

    /// Assign a fresh shared group id to the selection. Needs at least 2 nodes.
    pub fn group_selected(&mut self) -> Option<GroupId> {
        if self.selection.len() < 2 {
            return None;
        }
        let group_id = Uuid::new_v4();
        self.update_selected(|n| Node {
            group_id: Some(group_id),
            ..n.clone()
        });
        log::debug!("Grouped {} nodes as {group_id}", self.selection.len());
        Some(group_id)
    }

    /// Clear the group id of every selected node.
    pub fn ungroup_selected(&mut self) -> usize {
        self.update_selected(|n| Node {
            group_id: None,
            ..n.clone()
        })
    }

    /// Ids of every node sharing `id`'s group, or empty if it is ungrouped.
    pub fn group_members(&self, id: NodeId) -> Vec<NodeId> {
        match self.get(id).and_then(|n| n.group_id) {
            Some(group) => self
                .nodes
                .iter()
                .filter(|n| n.group_id == Some(group))
                .map(|n| n.id)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Align the selected nodes to an edge or center of their bounding box.
    /// No-op with fewer than 2 selected nodes.
    pub fn align_selected(&mut self, alignment: Alignment) -> bool {
        if self.selection.len() < 2 {
            return false;
        }
        let Some(bounds) = self.selection_bounds() else {
            return false;
        };
        let center = bounds.center();
        self.update_selected(|n| {
            let mut node = n.clone();
            match alignment {
                Alignment::Left => node.x = bounds.x0,
                Alignment::Right => node.x = bounds.x1 - n.width,
                Alignment::CenterX => node.x = center.x - n.width / 2.0,
                Alignment::Top => node.y = bounds.y0,
                Alignment::Bottom => node.y = bounds.y1 - n.height,
                Alignment::CenterY => node.y = center.y - n.height / 2.0,
            }
            node
        });
        true
    }

    /// Space the selected nodes evenly along an axis, keeping the first node in
    /// place. The gap may come out negative when nodes overlap the span.
    /// No-op with fewer than 3 selected nodes.
    pub fn distribute_selected(&mut self, axis: Axis) -> bool {
        if self.selection.len() < 3 {
            return false;
        }
        let mut ordered: Vec<(NodeId, f64, f64)> = self
            .selected_nodes()
            .map(|n| {
                let (start, size) = axis.extent(n.bounds());
                (n.id, start, size)
            })
            .collect();
        if ordered.len() < 3 {
            return false;
        }
        ordered.sort_by(|a, b| a.1.total_cmp(&b.1));

        let (first, last) = (ordered[0], ordered[ordered.len() - 1]);
        let span = last.1 + last.2 - first.1;
        let sizes: f64 = ordered.iter().map(|&(_, _, size)| size).sum();
        let gap = (span - sizes) / (ordered.len() - 1) as f64;

        let mut cursor = first.1;
        let targets: Vec<(NodeId, f64)> = ordered
            .iter()
            .map(|&(id, _, size)| {
                let pos = cursor;
                cursor += size + gap;
                (id, pos)
            })
            .collect();

        self.update_selected(|n| {
            let mut node = n.clone();
            if let Some(&(_, pos)) = targets.iter().find(|(id, _)| *id == n.id) {
                match axis {
                    Axis::X => node.x = pos,
                    Axis::Y => node.y = pos,
                }
            }
            node
        });
        true
    }

    /// Ids of nodes strictly overlapping `rect`, in paint order.
    pub fn nodes_in_rect(&self, rect: Rect) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| rects_overlap(n.bounds(), rect))
            .map(|n| n.id)
            .collect()
    }

    /// Topmost node whose box contains `point`.
    pub fn hit_test(&self, point: Point) -> Option<NodeId> {
        self.nodes
            .iter()
            .rev()
            .find(|n| n.bounds().contains(point))
            .map(|n| n.id)
    }

    /// Bounding box of all nodes.
    pub fn bounds(&self) -> Option<Rect> {
        bounding_box(self.nodes.iter().map(Node::bounds))
    }

    // --- Selection ---

    pub fn selection(&self) -> &[NodeId] {
        &self.selection
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.selection.contains(&id)
    }

    /// Replace the selection. Unknown and duplicate ids are dropped.
    pub fn select(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.selection.clear();
        self.add_to_selection(ids);
    }

    pub fn select_only(&mut self, id: NodeId) {
        self.select([id]);
    }

    /// Append ids to the selection, skipping unknown and already-selected ones.
    pub fn add_to_selection(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        for id in ids {
            if self.contains(id) && !self.selection.contains(&id) {
                self.selection.push(id);
            }
        }
    }

    pub fn deselect(&mut self, id: NodeId) {
        self.selection.retain(|&selected| selected != id);
    }

    /// Toggle one id, as a modifier-click in a layer list does.
    pub fn toggle_selection(&mut self, id: NodeId) {
        if self.is_selected(id) {
            self.deselect(id);
        } else {
            self.add_to_selection([id]);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Drop selected ids that no longer reference a node.
    pub fn prune_selection(&mut self) {
        let live: HashSet<NodeId> = self.nodes.iter().map(|n| n.id).collect();
        self.selection.retain(|id| live.contains(id));
    }

    /// The most recently selected node, used for reading style values.
    pub fn primary(&self) -> Option<&Node> {
        self.selection.last().and_then(|&id| self.get(id))
    }

    /// Selected nodes in paint order.
    pub fn selected_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| self.selection.contains(&n.id))
    }

    /// Nodes that are not selected, in paint order.
    pub fn unselected_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| !self.selection.contains(&n.id))
    }

    pub fn selection_bounds(&self) -> Option<Rect> {
        bounding_box(self.selected_nodes().map(Node::bounds))
    }

    /// The group id shared by every selected node, if there is one.
    pub fn selection_group(&self) -> Option<GroupId> {
        let mut nodes = self.selected_nodes();
        let group = nodes.next()?.group_id?;
        nodes.all(|n| n.group_id == Some(group)).then_some(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::NodeData;

    fn rect_node(x: f64, y: f64, w: f64, h: f64) -> Node {
        Node::new(NodeData::Rectangle, Rect::new(x, y, x + w, y + h))
    }

    fn scene_with(nodes: Vec<Node>) -> (Scene, Vec<NodeId>) {
        let ids = nodes.iter().map(|n| n.id).collect();
        (Scene::from_nodes(nodes), ids)
    }

    #[test]
    fn test_insert_and_get() {
        let mut scene = Scene::new();
        let node = rect_node(0.0, 0.0, 10.0, 10.0);
        let id = node.id;
        scene.insert(node);
        assert_eq!(scene.len(), 1);
        assert!(scene.get(id).is_some());
    }

    #[test]
    fn test_snapshot_unaffected_by_mutation() {
        let (mut scene, ids) = scene_with(vec![rect_node(0.0, 0.0, 10.0, 10.0)]);
        let snapshot = scene.snapshot();
        scene.select_only(ids[0]);
        scene.update_selected(|n| n.translated(kurbo::Vec2::new(5.0, 0.0)));

        assert!((snapshot[0].x - 0.0).abs() < f64::EPSILON);
        assert!((scene.nodes()[0].x - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_replace_unknown_node() {
        let mut scene = Scene::new();
        let result = scene.replace(rect_node(0.0, 0.0, 1.0, 1.0));
        assert!(matches!(result, Err(CanvasError::UnknownNode(_))));
    }

    #[test]
    fn test_delete_prunes_selection() {
        let (mut scene, ids) = scene_with(vec![rect_node(0.0, 0.0, 10.0, 10.0), rect_node(20.0, 0.0, 10.0, 10.0)]);
        scene.select(ids.clone());
        scene.delete(&HashSet::from([ids[0]]));
        assert_eq!(scene.selection(), &[ids[1]]);
    }

    #[test]
    fn test_delete_selected() {
        let (mut scene, ids) = scene_with(vec![rect_node(0.0, 0.0, 10.0, 10.0), rect_node(20.0, 0.0, 10.0, 10.0)]);
        scene.select_only(ids[1]);
        assert_eq!(scene.delete_selected(), 1);
        assert!(scene.selection().is_empty());
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_select_skips_unknown_and_duplicates() {
        let (mut scene, ids) = scene_with(vec![rect_node(0.0, 0.0, 10.0, 10.0)]);
        scene.select([ids[0], Uuid::new_v4(), ids[0]]);
        assert_eq!(scene.selection(), &[ids[0]]);
    }

    #[test]
    fn test_primary_is_last_selected() {
        let (mut scene, ids) = scene_with(vec![rect_node(0.0, 0.0, 10.0, 10.0), rect_node(20.0, 0.0, 10.0, 10.0)]);
        scene.select([ids[1], ids[0]]);
        assert_eq!(scene.primary().map(|n| n.id), Some(ids[0]));
    }

    #[test]
    fn test_bring_to_front_and_send_to_back() {
        let (mut scene, ids) = scene_with(vec![
            rect_node(0.0, 0.0, 1.0, 1.0),
            rect_node(0.0, 0.0, 1.0, 1.0),
            rect_node(0.0, 0.0, 1.0, 1.0),
        ]);
        scene.select_only(ids[0]);
        scene.bring_to_front();
        let order: Vec<NodeId> = scene.nodes().iter().map(|n| n.id).collect();
        assert_eq!(order, vec![ids[1], ids[2], ids[0]]);

        scene.select_only(ids[2]);
        scene.send_to_back();
        let order: Vec<NodeId> = scene.nodes().iter().map(|n| n.id).collect();
        assert_eq!(order, vec![ids[2], ids[1], ids[0]]);
    }

    #[test]
    fn test_group_requires_two() {
        let (mut scene, ids) = scene_with(vec![rect_node(0.0, 0.0, 1.0, 1.0), rect_node(5.0, 0.0, 1.0, 1.0)]);
        scene.select_only(ids[0]);
        assert!(scene.group_selected().is_none());

        scene.select(ids.clone());
        let group = scene.group_selected().unwrap();
        assert_eq!(scene.selection_group(), Some(group));
        assert_eq!(scene.group_members(ids[0]).len(), 2);

        scene.ungroup_selected();
        assert!(scene.group_members(ids[0]).is_empty());
        assert_eq!(scene.selection_group(), None);
    }

    #[test]
    fn test_align_left_idempotent() {
        let (mut scene, ids) = scene_with(vec![
            rect_node(10.0, 0.0, 20.0, 10.0),
            rect_node(-5.0, 30.0, 40.0, 10.0),
            rect_node(50.0, 60.0, 5.0, 10.0),
        ]);
        scene.select(ids);
        assert!(scene.align_selected(Alignment::Left));
        let once: Vec<Node> = scene.nodes().to_vec();
        scene.align_selected(Alignment::Left);
        assert_eq!(scene.nodes(), once.as_slice());
        assert!(scene.nodes().iter().all(|n| (n.x + 5.0).abs() < f64::EPSILON));
    }

    #[test]
    fn test_align_right_and_center() {
        let (mut scene, ids) = scene_with(vec![rect_node(0.0, 0.0, 20.0, 10.0), rect_node(80.0, 0.0, 20.0, 40.0)]);
        scene.select(ids.clone());
        scene.align_selected(Alignment::Right);
        assert!(scene.nodes().iter().all(|n| (n.x - 80.0).abs() < f64::EPSILON));

        scene.align_selected(Alignment::CenterY);
        let first = scene.get(ids[0]).unwrap();
        assert!((first.y - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_align_needs_two() {
        let (mut scene, ids) = scene_with(vec![rect_node(10.0, 0.0, 20.0, 10.0)]);
        scene.select(ids);
        assert!(!scene.align_selected(Alignment::Left));
        assert!((scene.nodes()[0].x - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_distribute_equal_gaps() {
        let (mut scene, ids) = scene_with(vec![
            rect_node(0.0, 0.0, 10.0, 10.0),
            rect_node(70.0, 0.0, 30.0, 10.0),
            rect_node(20.0, 0.0, 20.0, 10.0),
            rect_node(200.0, 0.0, 10.0, 10.0),
        ]);
        scene.select(ids.clone());
        assert!(scene.distribute_selected(Axis::X));

        let mut nodes: Vec<&Node> = scene.nodes().iter().collect();
        nodes.sort_by(|a, b| a.x.total_cmp(&b.x));
        let gaps: Vec<f64> = nodes.windows(2).map(|w| w[1].x - (w[0].x + w[0].width)).collect();
        for gap in &gaps {
            assert!((gap - gaps[0]).abs() < 1e-9);
        }
        assert!((scene.get(ids[0]).unwrap().x - 0.0).abs() < 1e-9);
        assert!((scene.get(ids[3]).unwrap().x - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_distribute_negative_gap_allowed() {
        let (mut scene, ids) = scene_with(vec![
            rect_node(0.0, 0.0, 50.0, 10.0),
            rect_node(10.0, 0.0, 50.0, 10.0),
            rect_node(20.0, 0.0, 50.0, 10.0),
        ]);
        scene.select(ids.clone());
        scene.distribute_selected(Axis::X);
        // span 70, sizes 150 -> gap -40
        assert!((scene.get(ids[1]).unwrap().x - 10.0).abs() < 1e-9);
        assert!((scene.get(ids[2]).unwrap().x - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_distribute_needs_three() {
        let (mut scene, ids) = scene_with(vec![rect_node(0.0, 0.0, 10.0, 10.0), rect_node(50.0, 0.0, 10.0, 10.0)]);
        scene.select(ids);
        assert!(!scene.distribute_selected(Axis::Y));
    }

    #[test]
    fn test_nodes_in_rect_strict() {
        let (scene, ids) = scene_with(vec![rect_node(0.0, 0.0, 10.0, 10.0), rect_node(20.0, 0.0, 10.0, 10.0)]);
        // Touches the first node's right edge only
        assert_eq!(scene.nodes_in_rect(Rect::new(10.0, 0.0, 25.0, 5.0)), vec![ids[1]]);
        assert!(scene.nodes_in_rect(Rect::new(10.0, 0.0, 20.0, 5.0)).is_empty());
    }

    #[test]
    fn test_hit_test_topmost() {
        let (scene, ids) = scene_with(vec![rect_node(0.0, 0.0, 10.0, 10.0), rect_node(5.0, 5.0, 10.0, 10.0)]);
        assert_eq!(scene.hit_test(Point::new(7.0, 7.0)), Some(ids[1]));
        assert_eq!(scene.hit_test(Point::new(1.0, 1.0)), Some(ids[0]));
        assert_eq!(scene.hit_test(Point::new(100.0, 1.0)), None);
    }

    #[test]
    fn test_json_roundtrip() {
        let (scene, _) = scene_with(crate::nodes::initial_nodes());
        let json = scene.to_json().unwrap();
        let loaded = Scene::from_json(&json).unwrap();
        assert_eq!(loaded.nodes(), scene.nodes());
    }
}
