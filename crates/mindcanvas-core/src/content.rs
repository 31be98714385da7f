//! Pending content produced by external sources (image uploads, content
//! suggestions) waiting to be placed on the canvas.

use crate::nodes::{ImageData, Node, NodeData, NodeKind, Paint, TextStyle, fit_dimensions};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Size of a sticky note created from a suggestion.
pub const SUGGESTION_SIZE: f64 = 200.0;

/// Errors from content sources.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Content source unavailable: {0}")]
    Unavailable(String),
    #[error("Content request failed: {0}")]
    Request(String),
    #[error("Malformed content response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Named color theme for suggested sticky notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorKey {
    #[default]
    Yellow,
    Blue,
    Green,
    Red,
    Purple,
    White,
    Slate,
}

impl ColorKey {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "yellow" => Some(ColorKey::Yellow),
            "blue" => Some(ColorKey::Blue),
            "green" => Some(ColorKey::Green),
            "red" => Some(ColorKey::Red),
            "purple" => Some(ColorKey::Purple),
            "white" => Some(ColorKey::White),
            "slate" => Some(ColorKey::Slate),
            _ => None,
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            ColorKey::Yellow => "#fef3c7",
            ColorKey::Blue => "#dbeafe",
            ColorKey::Green => "#dcfce7",
            ColorKey::Red => "#fee2e2",
            ColorKey::Purple => "#f3e8ff",
            ColorKey::White => "#ffffff",
            ColorKey::Slate => "#f1f5f9",
        }
    }

    pub fn paint(self) -> Paint {
        Paint::css(self.hex())
    }
}

/// A short piece of suggested content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub content: String,
    pub kind: NodeKind,
    pub color_key: ColorKey,
}

/// A producer of suggested content: given a prompt, candidate short strings
/// with a color hint.
pub trait SuggestionSource {
    fn suggest(&self, prompt: &str) -> Result<Vec<Suggestion>, ContentError>;
}

/// Prompt asking for ideas that branch off a node's text.
pub fn brainstorm_prompt(content: &str) -> String {
    format!(
        "I am using an infinite canvas brainstorming tool.\n\
         I have a node with the text: \"{content}\".\n\
         Generate 3 distinct, brief, and creative related ideas or sub-tasks that could branch off from this node.\n\
         Keep the content short (under 10 words).\n\
         Return the result as a JSON array."
    )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestionRecord {
    content: String,
    #[serde(default)]
    color_suggestion: Option<String>,
}

/// Parse a suggestion response: a JSON array of `{content, colorSuggestion}`.
/// Missing or unknown colors fall back to yellow. An empty body yields no
/// suggestions.
pub fn parse_suggestions(body: &str) -> Result<Vec<Suggestion>, ContentError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let records: Vec<SuggestionRecord> = serde_json::from_str(body)?;
    Ok(records
        .into_iter()
        .map(|record| {
            let color_key = record
                .color_suggestion
                .as_deref()
                .and_then(ColorKey::from_name)
                .unwrap_or_default();
            Suggestion {
                content: record.content,
                kind: NodeKind::Sticky,
                color_key,
            }
        })
        .collect())
}

/// A source that answers every prompt with the same response body.
#[derive(Debug, Clone, Default)]
pub struct CannedSuggestions {
    pub response: String,
}

impl CannedSuggestions {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

impl SuggestionSource for CannedSuggestions {
    fn suggest(&self, _prompt: &str) -> Result<Vec<Suggestion>, ContentError> {
        parse_suggestions(&self.response)
    }
}

/// What a pending item becomes once placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PendingContent {
    Image { src: String },
    Sticky { content: String, color_key: ColorKey },
}

/// One item of a pending batch, with its fitted size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingItem {
    pub content: PendingContent,
    pub size: Size,
}

impl PendingItem {
    /// Build the node for this item at `origin`.
    pub fn to_node(&self, origin: Point) -> Node {
        let frame = Rect::from_origin_size(origin, self.size);
        match &self.content {
            PendingContent::Image { src } => {
                let mut node = Node::new(NodeData::Image(ImageData::new(src.clone())), frame);
                node.aspect_ratio_locked = true;
                node
            }
            PendingContent::Sticky { content, color_key } => {
                Node::new(NodeData::Sticky(TextStyle::default()), frame)
                    .with_content(content.clone())
                    .with_color(color_key.paint())
            }
        }
    }
}

/// Ticket identifying the batch an asynchronous request was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTicket(u64);

/// Content waiting for a placement click.
///
/// Every time the batch is taken for placement or discarded its generation
/// advances, so completions for older tickets are recognized and dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingBatch {
    items: Vec<PendingItem>,
    /// Preview position in world space.
    pub position: Option<Point>,
    generation: u64,
}

impl PendingBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[PendingItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Ticket for a request whose result belongs in the current batch.
    pub fn ticket(&self) -> BatchTicket {
        BatchTicket(self.generation)
    }

    pub fn is_current(&self, ticket: BatchTicket) -> bool {
        ticket.0 == self.generation
    }

    /// Queue an item for `ticket`. Returns false and drops the item when the
    /// ticket belongs to a batch that was already placed or discarded.
    pub fn push(&mut self, ticket: BatchTicket, item: PendingItem) -> bool {
        if !self.is_current(ticket) {
            log::warn!(
                "Dropping stale pending content (ticket {}, current {})",
                ticket.0,
                self.generation
            );
            return false;
        }
        self.items.push(item);
        true
    }

    /// Queue a decoded image, fitted to `max_dim` on its longer side.
    pub fn push_image(
        &mut self,
        ticket: BatchTicket,
        src: impl Into<String>,
        decoded: Size,
        max_dim: f64,
    ) -> bool {
        let item = PendingItem {
            content: PendingContent::Image { src: src.into() },
            size: fit_dimensions(decoded.width, decoded.height, max_dim),
        };
        self.push(ticket, item)
    }

    /// Queue suggestions as sticky notes.
    pub fn push_suggestions(&mut self, ticket: BatchTicket, suggestions: Vec<Suggestion>) -> usize {
        let mut queued = 0;
        for suggestion in suggestions {
            if suggestion.kind != NodeKind::Sticky {
                log::debug!("Ignoring suggestion of kind {:?}", suggestion.kind);
                continue;
            }
            let item = PendingItem {
                content: PendingContent::Sticky {
                    content: suggestion.content,
                    color_key: suggestion.color_key,
                },
                size: Size::new(SUGGESTION_SIZE, SUGGESTION_SIZE),
            };
            if self.push(ticket, item) {
                queued += 1;
            }
        }
        queued
    }

    /// Remove every item for placement and start a new generation.
    pub fn take(&mut self) -> Vec<PendingItem> {
        self.generation += 1;
        self.position = None;
        std::mem::take(&mut self.items)
    }

    /// Discard the batch.
    pub fn clear(&mut self) {
        self.take();
    }
}
