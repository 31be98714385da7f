//! Node definitions for the whiteboard.

mod image;
pub mod path;
mod text;

pub use image::{Crop, ImageData, fit_dimensions};
pub use path::PathPoint;
pub use text::{
    DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE, FontStyle, FontWeight, TextAlign, TextDecoration, TextStyle,
};

use crate::error::{CanvasError, CanvasResult};
use kurbo::{Affine, BezPath, Ellipse, Point, Rect, Shape as _, Size, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for nodes.
pub type NodeId = Uuid;
/// Shared identifier for grouped nodes.
pub type GroupId = Uuid;

/// Tolerance used when flattening curved outlines.
const OUTLINE_TOLERANCE: f64 = 0.1;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// CSS form: `transparent`, `#rrggbb`, or `#rrggbbaa`.
    pub fn to_css(&self) -> String {
        match self.a {
            0 => "transparent".to_string(),
            255 => format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b),
            a => format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, a),
        }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Fill or stroke paint: a solid color, a CSS gradient function, or an
/// image-fill reference. Serialized as its CSS string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Paint {
    Solid(SerializableColor),
    Gradient(String),
    Image(String),
}

impl Paint {
    /// Parse a CSS paint string.
    pub fn parse(value: &str) -> CanvasResult<Self> {
        let trimmed = value.trim();
        if trimmed.contains("gradient(") {
            return Ok(Paint::Gradient(trimmed.to_string()));
        }
        if trimmed.starts_with("url(") {
            return Ok(Paint::Image(trimmed.to_string()));
        }
        let color = peniko::color::parse_color(trimmed).map_err(|err| CanvasError::InvalidColor {
            value: value.to_string(),
            reason: err.to_string(),
        })?;
        let color: Color = color.to_alpha_color::<peniko::color::Srgb>();
        Ok(Paint::Solid(color.into()))
    }

    /// Parse a paint known to be valid at compile time, falling back to
    /// transparent.
    pub fn css(value: &str) -> Self {
        Self::parse(value).unwrap_or_else(|err| {
            log::warn!("{err}");
            Paint::Solid(SerializableColor::transparent())
        })
    }

    pub fn transparent() -> Self {
        Paint::Solid(SerializableColor::transparent())
    }

    pub fn white() -> Self {
        Paint::Solid(SerializableColor::white())
    }

    /// Solid color as a renderer color, if this paint is solid.
    pub fn solid_color(&self) -> Option<Color> {
        match self {
            Paint::Solid(color) => Some((*color).into()),
            Paint::Gradient(_) | Paint::Image(_) => None,
        }
    }

    pub fn to_css(&self) -> String {
        match self {
            Paint::Solid(color) => color.to_css(),
            Paint::Gradient(css) | Paint::Image(css) => css.clone(),
        }
    }
}

impl TryFrom<String> for Paint {
    type Error = CanvasError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Paint::parse(&value)
    }
}

impl From<Paint> for String {
    fn from(paint: Paint) -> Self {
        paint.to_css()
    }
}

/// Where a stroke sits relative to the outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeAlign {
    Inside,
    #[default]
    Center,
    Outside,
}

/// Dash pattern of a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// Fill and stroke attributes shared by all nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeStyle {
    /// Shape background, or text color for text nodes.
    pub fill: Option<Paint>,
    pub stroke: Option<Paint>,
    pub stroke_width: f64,
    pub stroke_align: StrokeAlign,
    pub stroke_style: StrokeStyle,
    pub opacity: Option<f64>,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            stroke_width: 0.0,
            stroke_align: StrokeAlign::default(),
            stroke_style: StrokeStyle::default(),
            opacity: None,
        }
    }
}

/// Partial style update applied to every selected node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleUpdate {
    pub color: Option<Paint>,
    pub fill: Option<Paint>,
    pub stroke: Option<Paint>,
    pub stroke_width: Option<f64>,
    pub stroke_align: Option<StrokeAlign>,
    pub stroke_style: Option<StrokeStyle>,
    pub opacity: Option<f64>,
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub font_weight: Option<FontWeight>,
    pub font_style: Option<FontStyle>,
    pub decoration: Option<TextDecoration>,
    pub align: Option<TextAlign>,
    pub aspect_ratio_locked: Option<bool>,
}

/// Discriminant of a node variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Sticky,
    Text,
    Rectangle,
    Circle,
    Triangle,
    Star,
    Diamond,
    Hexagon,
    Pentagon,
    Arrow,
    Line,
    Draw,
    Image,
    Path,
}

/// Variant-specific node payload, tagged by `type`.
///
/// `Draw`, `Line` and `Arrow` points are world-unit offsets from the node
/// origin; `Path` points are normalized to the node's box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeData {
    Sticky(TextStyle),
    Text(TextStyle),
    Rectangle,
    Circle,
    Triangle,
    Star,
    Diamond,
    Hexagon,
    Pentagon,
    Arrow { points: Vec<PathPoint> },
    Line { points: Vec<PathPoint> },
    Draw { points: Vec<PathPoint> },
    Image(ImageData),
    Path {
        points: Vec<PathPoint>,
        /// Records without the flag are closed.
        #[serde(default = "closed_by_default")]
        closed: bool,
    },
}

fn closed_by_default() -> bool {
    true
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Sticky(_) => NodeKind::Sticky,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Rectangle => NodeKind::Rectangle,
            NodeData::Circle => NodeKind::Circle,
            NodeData::Triangle => NodeKind::Triangle,
            NodeData::Star => NodeKind::Star,
            NodeData::Diamond => NodeKind::Diamond,
            NodeData::Hexagon => NodeKind::Hexagon,
            NodeData::Pentagon => NodeKind::Pentagon,
            NodeData::Arrow { .. } => NodeKind::Arrow,
            NodeData::Line { .. } => NodeKind::Line,
            NodeData::Draw { .. } => NodeKind::Draw,
            NodeData::Image(_) => NodeKind::Image,
            NodeData::Path { .. } => NodeKind::Path,
        }
    }
}

/// A node on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(flatten)]
    pub data: NodeData,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Text payload, empty for shapes.
    #[serde(default)]
    pub content: String,
    /// Base color (sticky background, legacy shape background).
    pub color: Paint,
    #[serde(default)]
    pub style: NodeStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    #[serde(default)]
    pub aspect_ratio_locked: bool,
}

impl Node {
    /// Create a node with a fresh id and default style.
    pub fn new(data: NodeData, frame: Rect) -> Self {
        Self {
            id: Uuid::new_v4(),
            data,
            x: frame.x0,
            y: frame.y0,
            width: frame.width(),
            height: frame.height(),
            content: String::new(),
            color: Paint::white(),
            style: NodeStyle::default(),
            group_id: None,
            aspect_ratio_locked: false,
        }
    }

    pub fn with_id(mut self, id: NodeId) -> Self {
        self.id = id;
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_color(mut self, color: Paint) -> Self {
        self.color = color;
        self
    }

    pub fn with_style(mut self, style: NodeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Axis-aligned box in world coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Copy moved by a world-space delta.
    pub fn translated(&self, delta: Vec2) -> Self {
        Self {
            x: self.x + delta.x,
            y: self.y + delta.y,
            ..self.clone()
        }
    }

    /// Typography, for text and sticky nodes.
    pub fn text_style(&self) -> Option<&TextStyle> {
        match &self.data {
            NodeData::Text(style) | NodeData::Sticky(style) => Some(style),
            _ => None,
        }
    }

    /// Font size used as the base for text scaling.
    pub fn font_size(&self) -> f64 {
        self.text_style().map_or(DEFAULT_FONT_SIZE, |style| style.font_size)
    }

    /// Anchors of point-based nodes.
    pub fn points(&self) -> Option<&[PathPoint]> {
        match &self.data {
            NodeData::Arrow { points }
            | NodeData::Line { points }
            | NodeData::Draw { points }
            | NodeData::Path { points, .. } => Some(points),
            _ => None,
        }
    }

    pub fn is_path(&self) -> bool {
        matches!(self.data, NodeData::Path { .. })
    }

    /// Path anchors and the closed flag, for path nodes.
    pub fn path(&self) -> Option<(&[PathPoint], bool)> {
        match &self.data {
            NodeData::Path { points, closed } => Some((points, *closed)),
            _ => None,
        }
    }

    /// Copy of a path node with replaced anchors. Other nodes are returned unchanged.
    pub fn with_path_points(&self, new_points: Vec<PathPoint>) -> Self {
        let mut node = self.clone();
        if let NodeData::Path { points, .. } = &mut node.data {
            *points = new_points;
        }
        node
    }

    /// Crop of an image node.
    pub fn crop(&self) -> Option<Crop> {
        match &self.data {
            NodeData::Image(image) => image.crop,
            _ => None,
        }
    }

    /// Copy with the crop replaced. Non-image nodes are returned unchanged.
    pub fn with_crop(&self, crop: Crop) -> Self {
        let mut node = self.clone();
        if let NodeData::Image(image) = &mut node.data {
            image.crop = Some(crop);
        }
        node
    }

    /// Copy with every present field of `update` applied.
    pub fn with_style_update(&self, update: &StyleUpdate) -> Self {
        let mut node = self.clone();
        if let Some(color) = &update.color {
            node.color = color.clone();
        }
        if let Some(fill) = &update.fill {
            node.style.fill = Some(fill.clone());
        }
        if let Some(stroke) = &update.stroke {
            node.style.stroke = Some(stroke.clone());
        }
        if let Some(width) = update.stroke_width {
            node.style.stroke_width = width;
        }
        if let Some(align) = update.stroke_align {
            node.style.stroke_align = align;
        }
        if let Some(style) = update.stroke_style {
            node.style.stroke_style = style;
        }
        if let Some(opacity) = update.opacity {
            node.style.opacity = Some(opacity);
        }
        if let Some(locked) = update.aspect_ratio_locked {
            node.aspect_ratio_locked = locked;
        }
        if let NodeData::Text(text) | NodeData::Sticky(text) = &mut node.data {
            if let Some(family) = &update.font_family {
                text.font_family = family.clone();
            }
            if let Some(size) = update.font_size {
                text.font_size = size;
            }
            if let Some(weight) = update.font_weight {
                text.font_weight = weight;
            }
            if let Some(style) = update.font_style {
                text.font_style = style;
            }
            if let Some(decoration) = update.decoration {
                text.decoration = decoration;
            }
            if let Some(align) = update.align {
                text.align = align;
            }
        }
        node
    }

    /// Outline in node-local coordinates (origin at the node's top-left).
    pub fn outline(&self) -> BezPath {
        let (w, h) = (self.width, self.height);
        match &self.data {
            NodeData::Sticky(_) | NodeData::Text(_) | NodeData::Rectangle | NodeData::Image(_) => {
                Rect::new(0.0, 0.0, w, h).to_path(OUTLINE_TOLERANCE)
            }
            NodeData::Circle => Ellipse::from_rect(Rect::new(0.0, 0.0, w, h)).to_path(OUTLINE_TOLERANCE),
            NodeData::Triangle => polygon(&[(0.5, 0.0), (0.0, 1.0), (1.0, 1.0)], w, h),
            NodeData::Diamond => polygon(&[(0.5, 0.0), (1.0, 0.5), (0.5, 1.0), (0.0, 0.5)], w, h),
            NodeData::Pentagon => polygon(
                &[(0.5, 0.0), (1.0, 0.38), (0.81, 1.0), (0.19, 1.0), (0.0, 0.38)],
                w,
                h,
            ),
            NodeData::Hexagon => polygon(
                &[(0.5, 0.0), (1.0, 0.25), (1.0, 0.75), (0.5, 1.0), (0.0, 0.75), (0.0, 0.25)],
                w,
                h,
            ),
            NodeData::Star => star(w, h),
            NodeData::Arrow { points } | NodeData::Line { points } | NodeData::Draw { points } => {
                path::build_path(points, false)
            }
            NodeData::Path { points, closed } => path::build_scaled_path(points, *closed, self.size()),
        }
    }

    /// Outline in world coordinates.
    pub fn world_outline(&self) -> BezPath {
        let mut outline = self.outline();
        outline.apply_affine(Affine::translate(self.origin().to_vec2()));
        outline
    }
}

/// Closed polygon from fractional vertices of a `w`×`h` box.
fn polygon(vertices: &[(f64, f64)], w: f64, h: f64) -> BezPath {
    let mut path = BezPath::new();
    for (i, &(fx, fy)) in vertices.iter().enumerate() {
        let p = Point::new(fx * w, fy * h);
        if i == 0 {
            path.move_to(p);
        } else {
            path.line_to(p);
        }
    }
    path.close_path();
    path
}

/// Five-spike star inscribed in the smaller box dimension.
fn star(w: f64, h: f64) -> BezPath {
    const SPIKES: usize = 5;
    let center = Point::new(w / 2.0, h / 2.0);
    let outer = w.min(h) / 2.0;
    let inner = outer / 2.5;

    let mut path = BezPath::new();
    for i in 0..SPIKES * 2 {
        let r = if i % 2 == 0 { outer } else { inner };
        let angle = std::f64::consts::PI * i as f64 / SPIKES as f64 - std::f64::consts::FRAC_PI_2;
        let p = center + Vec2::from_angle(angle) * r;
        if i == 0 {
            path.move_to(p);
        } else {
            path.line_to(p);
        }
    }
    path.close_path();
    path
}

/// Nodes shown on a fresh canvas.
pub fn initial_nodes() -> Vec<Node> {
    let welcome = Node::new(
        NodeData::Text(TextStyle {
            font_size: 32.0,
            font_weight: FontWeight::Bold,
            align: TextAlign::Center,
            ..TextStyle::default()
        }),
        Rect::new(0.0, -100.0, 400.0, -20.0),
    )
    .with_content("Welcome to Mind Canvas")
    .with_color(Paint::transparent())
    .with_style(NodeStyle {
        fill: Some(Paint::css("#1e293b")),
        ..NodeStyle::default()
    });

    let sticky = Node::new(
        NodeData::Sticky(TextStyle {
            align: TextAlign::Left,
            ..TextStyle::sized(16.0)
        }),
        Rect::new(-150.0, 50.0, 50.0, 250.0),
    )
    .with_content("Drag the background to pan.\nScroll to zoom.")
    .with_color(Paint::css("#fef3c7"));

    vec![welcome, sticky]
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Shape as _;

    #[test]
    fn test_paint_parse_hex() {
        let paint = Paint::parse("#dbeafe").unwrap();
        assert_eq!(paint, Paint::Solid(SerializableColor::new(0xdb, 0xea, 0xfe, 255)));
        assert_eq!(paint.to_css(), "#dbeafe");
    }

    #[test]
    fn test_paint_parse_transparent() {
        let paint = Paint::parse("transparent").unwrap();
        assert_eq!(paint, Paint::transparent());
        assert_eq!(paint.to_css(), "transparent");
    }

    #[test]
    fn test_paint_gradient_and_image() {
        let gradient = Paint::parse("linear-gradient(90deg, #fff, #000)").unwrap();
        assert!(matches!(gradient, Paint::Gradient(_)));
        assert!(gradient.solid_color().is_none());

        let image = Paint::parse("url(#pattern)").unwrap();
        assert!(matches!(image, Paint::Image(_)));
    }

    #[test]
    fn test_paint_rejects_garbage() {
        assert!(matches!(Paint::parse("not-a-color"), Err(CanvasError::InvalidColor { .. })));
    }

    #[test]
    fn test_node_json_shape() {
        let node = Node::new(NodeData::Rectangle, Rect::new(0.0, 0.0, 100.0, 50.0))
            .with_color(Paint::css("#dbeafe"));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "rectangle");
        assert_eq!(json["color"], "#dbeafe");

        let back: Node = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_path_node_json_roundtrip() {
        let node = Node::new(
            NodeData::Path {
                points: vec![
                    PathPoint::corner(0.0, 0.0),
                    PathPoint::corner(1.0, 1.0).with_handles(Vec2::new(-0.1, 0.0), Vec2::new(0.1, 0.0)),
                ],
                closed: true,
            },
            Rect::new(0.0, 0.0, 10.0, 10.0),
        );
        let json = serde_json::to_string(&node).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back.path().map(|(p, c)| (p.len(), c)), Some((2, true)));
    }

    #[test]
    fn test_path_without_closed_flag_is_closed() {
        let node = Node::new(
            NodeData::Path {
                points: vec![PathPoint::corner(0.0, 0.0), PathPoint::corner(1.0, 1.0)],
                closed: false,
            },
            Rect::new(0.0, 0.0, 10.0, 10.0),
        );
        let mut json = serde_json::to_value(&node).unwrap();
        json.as_object_mut().unwrap().remove("closed");

        let back: Node = serde_json::from_value(json).unwrap();
        assert_eq!(back.path().map(|(_, c)| c), Some(true));
    }

    #[test]
    fn test_bounds() {
        let node = Node::new(NodeData::Circle, Rect::new(10.0, 20.0, 40.0, 60.0));
        assert_eq!(node.bounds(), Rect::new(10.0, 20.0, 40.0, 60.0));
        assert_eq!(node.kind(), NodeKind::Circle);
    }

    #[test]
    fn test_outline_polygons_stay_in_box() {
        for data in [NodeData::Triangle, NodeData::Diamond, NodeData::Pentagon, NodeData::Hexagon, NodeData::Star] {
            let node = Node::new(data, Rect::new(0.0, 0.0, 100.0, 80.0));
            let bbox = node.outline().bounding_box();
            assert!(bbox.x0 >= -1e-9 && bbox.y0 >= -1e-9);
            assert!(bbox.x1 <= 100.0 + 1e-9 && bbox.y1 <= 80.0 + 1e-9);
        }
    }

    #[test]
    fn test_world_outline_is_translated() {
        let node = Node::new(NodeData::Rectangle, Rect::new(50.0, 60.0, 70.0, 90.0));
        let bbox = node.world_outline().bounding_box();
        assert!((bbox.x0 - 50.0).abs() < 1e-9);
        assert!((bbox.y1 - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_style_update_applies_to_text() {
        let node = Node::new(NodeData::Text(TextStyle::default()), Rect::new(0.0, 0.0, 10.0, 10.0));
        let updated = node.with_style_update(&StyleUpdate {
            font_size: Some(40.0),
            stroke_width: Some(3.0),
            ..StyleUpdate::default()
        });
        assert!((updated.font_size() - 40.0).abs() < f64::EPSILON);
        assert!((updated.style.stroke_width - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_initial_nodes() {
        let nodes = initial_nodes();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].kind(), NodeKind::Text);
        assert_eq!(nodes[1].kind(), NodeKind::Sticky);
        assert!((nodes[1].width - 200.0).abs() < f64::EPSILON);
    }
}
