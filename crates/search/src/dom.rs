//! Arena-backed in-memory document.
//!
//! `MemoryDocument` implements [`DocumentTree`] and [`Geometry`] without a
//! layout engine: boxes are assigned explicitly in page coordinates, and a
//! node without its own box reports the box of its nearest ancestor that has
//! one. Nodes are never freed; detached nodes simply have no parent.

use std::fmt::Write as _;

use crate::tree::{
    ComputedStyle, DocumentTree, ElementKind, Geometry, NodeKind, Rect, TreeError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    text: Option<String>,
    class: Option<String>,
    rect: Option<Rect>,
    style: ComputedStyle,
    positioned: bool,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            text: None,
            class: None,
            rect: None,
            style: ComputedStyle::default(),
            positioned: false,
        }
    }
}

#[derive(Debug, Clone)]
struct Frame {
    document: NodeId,
    accessible: bool,
}

#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<NodeData>,
    root: NodeId,
    body: NodeId,
    frames: Vec<Frame>,
    scroll: (f64, f64),
    extents: (f64, f64),
    viewport: (f64, f64),
    rendered_page_width: Option<f64>,
}

pub const DEFAULT_VIEWPORT: (f64, f64) = (1024.0, 768.0);

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// An empty document with a body covering the default viewport.
    pub fn new() -> Self {
        let mut document = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            body: NodeId(0),
            frames: Vec::new(),
            scroll: (0.0, 0.0),
            extents: DEFAULT_VIEWPORT,
            viewport: DEFAULT_VIEWPORT,
            rendered_page_width: None,
        };
        let (root, body) = document.new_document_node();
        document.root = root;
        document.body = body;
        document
    }

    fn new_document_node(&mut self) -> (NodeId, NodeId) {
        let root = self.push(NodeData::new(NodeKind::Document));
        let body = self.push(NodeData::new(NodeKind::Element(ElementKind::Body)));
        self.link(root, body);
        (root, body)
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(data);
        NodeId(self.nodes.len() - 1)
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn data(&self, node: NodeId) -> Result<&NodeData, TreeError> {
        self.nodes.get(node.0).ok_or(TreeError::UnknownNode)
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Adds an embedded frame and returns the body of its content document.
    pub fn add_frame(&mut self, accessible: bool) -> NodeId {
        let (document, body) = self.new_document_node();
        self.frames.push(Frame {
            document,
            accessible,
        });
        body
    }

    pub fn append_element(&mut self, parent: NodeId, kind: ElementKind) -> NodeId {
        let node = self.push(NodeData::new(NodeKind::Element(kind)));
        self.link(parent, node);
        node
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let node = self.create_text_node(text);
        self.link(parent, node);
        node
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        self.nodes[node.0].rect = Some(rect);
    }

    pub fn set_style(&mut self, node: NodeId, style: ComputedStyle) {
        self.nodes[node.0].style = style;
    }

    /// Positioned elements act as offset parents for their descendants.
    pub fn set_positioned(&mut self, node: NodeId, positioned: bool) {
        self.nodes[node.0].positioned = positioned;
    }

    pub fn set_scroll(&mut self, x: f64, y: f64) {
        self.scroll = (x, y);
    }

    pub fn set_extents(&mut self, width: f64, height: f64) {
        self.extents = (width, height);
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = (width, height);
    }

    pub fn set_rendered_page_width(&mut self, width: Option<f64>) {
        self.rendered_page_width = width;
    }

    pub fn class(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0)?.class.as_deref()
    }

    /// Concatenated text of every text node under `node`, ignoring nothing.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut text = String::new();
        self.collect_text(node, &mut text);
        text
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let data = &self.nodes[node.0];
        if let Some(text) = &data.text {
            out.push_str(text);
        }
        for child in &data.children {
            self.collect_text(*child, out);
        }
    }

    /// Compact structural dump, e.g. `<body>"Hello "<mark.scour-match>"World"</mark></body>`.
    pub fn outline(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_outline(node, &mut out);
        out
    }

    fn write_outline(&self, node: NodeId, out: &mut String) {
        let data = &self.nodes[node.0];
        let name = match data.kind {
            NodeKind::Text => {
                let _ = write!(out, "{:?}", data.text.as_deref().unwrap_or_default());
                return;
            }
            NodeKind::Document => "#document",
            NodeKind::Element(kind) => element_name(kind),
        };
        out.push('<');
        out.push_str(name);
        if let Some(class) = &data.class {
            out.push('.');
            out.push_str(class);
        }
        out.push('>');
        for child in &data.children {
            self.write_outline(*child, out);
        }
        let _ = write!(out, "</{name}>");
    }

    fn nearest_rect(&self, node: NodeId) -> Option<Rect> {
        let mut current = Some(node);
        while let Some(id) = current {
            let data = &self.nodes[id.0];
            if data.rect.is_some() {
                return data.rect;
            }
            current = data.parent;
        }
        None
    }
}

fn element_name(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Body => "body",
        ElementKind::Generic => "div",
        ElementKind::Marker => "mark",
        ElementKind::Script => "script",
        ElementKind::Style => "style",
        ElementKind::NoScript => "noscript",
        ElementKind::Embed => "embed",
        ElementKind::Object => "object",
        ElementKind::Select => "select",
        ElementKind::TextArea => "textarea",
        ElementKind::Frame => "iframe",
    }
}

impl DocumentTree for MemoryDocument {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        self.root
    }

    fn sub_documents(&self) -> Vec<Result<NodeId, TreeError>> {
        self.frames
            .iter()
            .map(|frame| {
                if frame.accessible {
                    Ok(frame.document)
                } else {
                    Err(TreeError::Inaccessible("cross-origin frame".to_string()))
                }
            })
            .collect()
    }

    fn kind(&self, node: NodeId) -> NodeKind {
        self.nodes[node.0].kind
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes[node.0].children.clone()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0)?.text.as_deref()
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        new: NodeId,
        anchor: Option<NodeId>,
    ) -> Result<(), TreeError> {
        self.data(parent)?;
        if let Some(old_parent) = self.data(new)?.parent {
            self.remove_child(old_parent, new)?;
        }

        let siblings = &self.nodes[parent.0].children;
        let index = match anchor {
            Some(anchor) => siblings
                .iter()
                .position(|child| *child == anchor)
                .ok_or(TreeError::NotAChild)?,
            None => siblings.len(),
        };
        self.nodes[parent.0].children.insert(index, new);
        self.nodes[new.0].parent = Some(parent);
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, node: NodeId) -> Result<(), TreeError> {
        self.data(node)?;
        let index = self
            .data(parent)?
            .children
            .iter()
            .position(|child| *child == node)
            .ok_or(TreeError::NotAChild)?;
        self.nodes[parent.0].children.remove(index);
        self.nodes[node.0].parent = None;
        Ok(())
    }

    fn create_text_node(&mut self, text: &str) -> NodeId {
        let mut data = NodeData::new(NodeKind::Text);
        data.text = Some(text.to_string());
        self.push(data)
    }

    fn create_marker_node(&mut self, text: &str, class: &str) -> NodeId {
        let mut data = NodeData::new(NodeKind::Element(ElementKind::Marker));
        data.class = Some(class.to_string());
        let marker = self.push(data);
        let text = self.create_text_node(text);
        self.link(marker, text);
        marker
    }

    fn set_class(&mut self, node: NodeId, class: &str) {
        if let Some(data) = self.nodes.get_mut(node.0) {
            data.class = Some(class.to_string());
        }
    }
}

impl Geometry for MemoryDocument {
    fn bounding_rect(&self, node: NodeId) -> Rect {
        let page = self
            .nearest_rect(node)
            .unwrap_or_else(|| Rect::new(0.0, 0.0, self.extents.0, self.extents.1));
        Rect::new(
            page.x - self.scroll.0,
            page.y - self.scroll.1,
            page.width,
            page.height,
        )
    }

    fn computed_style(&self, node: NodeId) -> ComputedStyle {
        self.nodes[node.0].style
    }

    fn offset_parent(&self, node: NodeId) -> Option<NodeId> {
        let mut current = self.nodes[node.0].parent;
        while let Some(id) = current {
            let data = &self.nodes[id.0];
            if data.positioned || data.kind == NodeKind::Element(ElementKind::Body) {
                return Some(id);
            }
            current = data.parent;
        }
        None
    }

    fn scroll_origin(&self, _node: NodeId) -> (f64, f64) {
        self.scroll
    }

    fn document_extents(&self) -> (f64, f64) {
        self.extents
    }

    fn viewport_size(&self) -> (f64, f64) {
        self.viewport
    }

    fn rendered_page_width(&self) -> Option<f64> {
        self.rendered_page_width
    }
}
