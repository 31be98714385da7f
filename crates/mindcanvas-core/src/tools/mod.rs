//! Tool system for the whiteboard.

use crate::nodes::{Node, NodeData, NodeStyle, Paint, PathPoint, TextStyle};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Size of a text node created by a click.
const TEXT_SIZE: (f64, f64) = (200.0, 60.0);
const TEXT_FONT_SIZE: f64 = 24.0;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    #[default]
    Select,
    Hand,
    Sticky,
    Text,
    Rectangle,
    Circle,
    Triangle,
    Star,
    Diamond,
    Hexagon,
    Pentagon,
    Pencil,
    Arrow,
    Line,
    Image,
    Pen,
}

impl Tool {
    pub fn all() -> &'static [Tool] {
        &[
            Tool::Select,
            Tool::Hand,
            Tool::Sticky,
            Tool::Text,
            Tool::Rectangle,
            Tool::Circle,
            Tool::Triangle,
            Tool::Star,
            Tool::Diamond,
            Tool::Hexagon,
            Tool::Pentagon,
            Tool::Pencil,
            Tool::Arrow,
            Tool::Line,
            Tool::Image,
            Tool::Pen,
        ]
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Select => "Selection",
            Tool::Hand => "Hand",
            Tool::Sticky => "Sticky note",
            Tool::Text => "Text",
            Tool::Rectangle => "Rectangle",
            Tool::Circle => "Circle",
            Tool::Triangle => "Triangle",
            Tool::Star => "Star",
            Tool::Diamond => "Diamond",
            Tool::Hexagon => "Hexagon",
            Tool::Pentagon => "Pentagon",
            Tool::Pencil => "Pencil",
            Tool::Arrow => "Arrow",
            Tool::Line => "Line",
            Tool::Image => "Upload image",
            Tool::Pen => "Pen",
        }
    }

    /// Payload of the box shape this tool draws.
    fn shape_data(self) -> Option<NodeData> {
        Some(match self {
            Tool::Rectangle => NodeData::Rectangle,
            Tool::Circle => NodeData::Circle,
            Tool::Triangle => NodeData::Triangle,
            Tool::Star => NodeData::Star,
            Tool::Diamond => NodeData::Diamond,
            Tool::Hexagon => NodeData::Hexagon,
            Tool::Pentagon => NodeData::Pentagon,
            _ => return None,
        })
    }

    /// Whether pressing on the canvas with this tool creates a node.
    pub fn creates_nodes(self) -> bool {
        self.shape_data().is_some() || matches!(self, Tool::Text | Tool::Pencil | Tool::Arrow | Tool::Line)
    }

    /// Whether the created node keeps growing while the pointer moves.
    /// Text is placed at once and edited in place.
    pub fn is_drawn(self) -> bool {
        self.creates_nodes() && self != Tool::Text
    }
}

/// Create the node a tool places at a world-space press.
pub fn create_node(tool: Tool, at: Point) -> Option<Node> {
    if let Some(data) = tool.shape_data() {
        let node = Node::new(data, Rect::from_points(at, at)).with_style(NodeStyle {
            fill: Some(Paint::css("#dbeafe")),
            stroke: Some(Paint::css("#94a3b8")),
            stroke_width: 1.0,
            ..NodeStyle::default()
        });
        return Some(node);
    }

    let node = match tool {
        Tool::Text => {
            let origin = Point::new(at.x, at.y - TEXT_SIZE.1 / 2.0);
            Node::new(
                NodeData::Text(TextStyle::sized(TEXT_FONT_SIZE)),
                Rect::from_origin_size(origin, TEXT_SIZE),
            )
            .with_color(Paint::transparent())
            .with_style(NodeStyle {
                fill: Some(Paint::css("#000000")),
                ..NodeStyle::default()
            })
        }
        Tool::Pencil => Node::new(
            NodeData::Draw {
                points: vec![PathPoint::corner(0.0, 0.0)],
            },
            Rect::from_points(at, at),
        )
        .with_color(Paint::css("#1e293b")),
        Tool::Line | Tool::Arrow => {
            let points = vec![PathPoint::corner(0.0, 0.0), PathPoint::corner(0.0, 0.0)];
            let data = if tool == Tool::Line {
                NodeData::Line { points }
            } else {
                NodeData::Arrow { points }
            };
            Node::new(data, Rect::from_points(at, at)).with_color(Paint::css("#64748b"))
        }
        _ => return None,
    };
    Some(node)
}

/// Grow a node being drawn toward the pointer.
///
/// Freehand strokes append the pointer as a new point; lines and arrows move
/// their end point; box shapes span from `start` to the pointer in any
/// direction.
pub fn update_drawn_node(node: &Node, start: Point, pointer: Point) -> Node {
    let local = pointer - node.origin();
    let mut node = node.clone();
    match &mut node.data {
        NodeData::Draw { points } => {
            points.push(PathPoint::corner(local.x, local.y));
            node.width = node.width.max(local.x);
            node.height = node.height.max(local.y);
        }
        NodeData::Line { points } | NodeData::Arrow { points } => {
            *points = vec![PathPoint::corner(0.0, 0.0), PathPoint::corner(local.x, local.y)];
        }
        _ => {
            let (dx, dy) = (pointer.x - start.x, pointer.y - start.y);
            node.x = if dx < 0.0 { pointer.x } else { start.x };
            node.y = if dy < 0.0 { pointer.y } else { start.y };
            node.width = dx.abs();
            node.height = dy.abs();
        }
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::NodeKind;

    #[test]
    fn test_tool_serde_names() {
        assert_eq!(serde_json::to_string(&Tool::Pen).unwrap(), "\"pen\"");
        assert_eq!(serde_json::from_str::<Tool>("\"hand\"").unwrap(), Tool::Hand);
    }

    #[test]
    fn test_creating_tools() {
        assert!(Tool::Rectangle.creates_nodes());
        assert!(Tool::Text.creates_nodes());
        assert!(!Tool::Text.is_drawn());
        assert!(Tool::Pencil.is_drawn());
        assert!(!Tool::Select.creates_nodes());
        assert!(!Tool::Pen.creates_nodes());
        assert!(!Tool::Sticky.creates_nodes());
    }

    #[test]
    fn test_create_shape_defaults() {
        let node = create_node(Tool::Hexagon, Point::new(5.0, 6.0)).unwrap();
        assert_eq!(node.kind(), NodeKind::Hexagon);
        assert_eq!(node.bounds(), Rect::new(5.0, 6.0, 5.0, 6.0));
        assert_eq!(node.color, Paint::white());
        assert_eq!(node.style.fill, Some(Paint::css("#dbeafe")));
        assert!((node.style.stroke_width - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_create_text() {
        let node = create_node(Tool::Text, Point::new(10.0, 100.0)).unwrap();
        assert_eq!(node.bounds(), Rect::new(10.0, 70.0, 210.0, 130.0));
        assert!((node.font_size() - 24.0).abs() < f64::EPSILON);
        assert_eq!(node.color, Paint::transparent());
    }

    #[test]
    fn test_create_line_has_two_points() {
        let node = create_node(Tool::Arrow, Point::ZERO).unwrap();
        assert_eq!(node.kind(), NodeKind::Arrow);
        assert_eq!(node.points().map(<[PathPoint]>::len), Some(2));
        assert_eq!(node.color, Paint::css("#64748b"));
    }

    #[test]
    fn test_drag_rectangle_any_direction() {
        let start = Point::new(0.0, 0.0);
        let node = create_node(Tool::Rectangle, start).unwrap();
        let drawn = update_drawn_node(&node, start, Point::new(100.0, 50.0));
        assert_eq!(drawn.bounds(), Rect::new(0.0, 0.0, 100.0, 50.0));

        let flipped = update_drawn_node(&drawn, start, Point::new(-30.0, -20.0));
        assert_eq!(flipped.bounds(), Rect::new(-30.0, -20.0, 0.0, 0.0));
    }

    #[test]
    fn test_pencil_appends_points() {
        let node = create_node(Tool::Pencil, Point::new(10.0, 10.0)).unwrap();
        let node = update_drawn_node(&node, Point::new(10.0, 10.0), Point::new(40.0, 30.0));
        let node = update_drawn_node(&node, Point::new(10.0, 10.0), Point::new(20.0, 50.0));
        assert_eq!(node.points().map(<[PathPoint]>::len), Some(3));
        assert!((node.width - 30.0).abs() < f64::EPSILON);
        assert!((node.height - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_line_moves_end_point() {
        let node = create_node(Tool::Line, Point::new(10.0, 10.0)).unwrap();
        let node = update_drawn_node(&node, Point::new(10.0, 10.0), Point::new(15.0, 30.0));
        assert_eq!(node.points().unwrap()[1], PathPoint::corner(5.0, 20.0));
    }
}
