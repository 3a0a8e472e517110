//! Interfaces the engine consumes from its host document.
//!
//! The engine never owns the document. It reads structure and geometry through
//! [`DocumentTree`] and [`Geometry`], and the only mutations it performs are the
//! reversible leaf swaps done by the highlight renderer.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node is not a child of the given parent")]
    NotAChild,
    #[error("node is detached from the document")]
    Detached,
    #[error("unknown node")]
    UnknownNode,
    #[error("sub-document is not accessible: {0}")]
    Inaccessible(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Body,
    Generic,
    /// Highlight wrapper created by the engine.
    Marker,
    Script,
    Style,
    NoScript,
    Embed,
    Object,
    Select,
    TextArea,
    /// Frame containers. Their content documents are reached through
    /// [`DocumentTree::sub_documents`], never by descending.
    Frame,
}

impl ElementKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "body" => Self::Body,
            "mark" | "marker" => Self::Marker,
            "script" => Self::Script,
            "style" => Self::Style,
            "noscript" => Self::NoScript,
            "embed" => Self::Embed,
            "object" => Self::Object,
            "select" => Self::Select,
            "textarea" => Self::TextArea,
            "frame" | "iframe" => Self::Frame,
            _ => Self::Generic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element(ElementKind),
    Text,
}

/// Whether a node and its whole subtree stay out of the flattened text.
pub fn is_ignored(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Element(
            ElementKind::Script
                | ElementKind::Style
                | ElementKind::NoScript
                | ElementKind::Embed
                | ElementKind::Object
                | ElementKind::Select
                | ElementKind::TextArea
                | ElementKind::Frame
        )
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    #[default]
    Inline,
    Block,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    Collapse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Clip,
    Scroll,
    Auto,
}

impl Overflow {
    pub fn clips(self) -> bool {
        matches!(self, Self::Hidden | Self::Clip)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputedStyle {
    pub display: Display,
    pub visibility: Visibility,
    pub opacity: f64,
    pub overflow: Overflow,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::default(),
            visibility: Visibility::default(),
            opacity: 1.0,
            overflow: Overflow::default(),
        }
    }
}

impl ComputedStyle {
    pub fn is_hidden(&self) -> bool {
        self.display == Display::None || self.visibility != Visibility::Visible || self.opacity <= 0.0
    }
}

/// Structural access to the host document.
pub trait DocumentTree {
    type Node: Copy + Eq + fmt::Debug;

    fn root(&self) -> Self::Node;

    /// Content documents of embedded frames, in document order. Frames the
    /// host may not read (cross-origin) are reported as `Err`.
    fn sub_documents(&self) -> Vec<Result<Self::Node, TreeError>>;

    fn kind(&self, node: Self::Node) -> NodeKind;

    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Text of a text leaf, `None` for any other node.
    fn text(&self, node: Self::Node) -> Option<&str>;

    /// Inserts `new` under `parent` before `anchor`, or last when `anchor` is `None`.
    fn insert_before(
        &mut self,
        parent: Self::Node,
        new: Self::Node,
        anchor: Option<Self::Node>,
    ) -> Result<(), TreeError>;

    fn remove_child(&mut self, parent: Self::Node, node: Self::Node) -> Result<(), TreeError>;

    fn create_text_node(&mut self, text: &str) -> Self::Node;

    fn create_marker_node(&mut self, text: &str, class: &str) -> Self::Node;

    fn set_class(&mut self, node: Self::Node, class: &str);
}

/// Layout queries. Rectangles are relative to the viewport, like a browser's
/// client rects; [`Geometry::scroll_origin`] converts them to page space.
pub trait Geometry: DocumentTree {
    fn bounding_rect(&self, node: Self::Node) -> Rect;

    fn computed_style(&self, node: Self::Node) -> ComputedStyle;

    /// Nearest positioned ancestor whose box clips the node's geometry.
    fn offset_parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Scroll offset of the document containing `node`.
    fn scroll_origin(&self, node: Self::Node) -> (f64, f64);

    /// Scrollable width and height of the document.
    fn document_extents(&self) -> (f64, f64);

    fn viewport_size(&self) -> (f64, f64);

    /// Width the host actually renders the page at, when it differs from the
    /// document's own width (zoom).
    fn rendered_page_width(&self) -> Option<f64> {
        None
    }
}
