use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use scour_search::{
    ComputedStyle, Display, DocumentTree, ElementKind, Overflow, Rect, Visibility,
    dom::{MemoryDocument, NodeId},
};
use serde::Deserialize;

/// On-disk description of a laid-out page.
#[derive(Debug, Deserialize)]
pub struct DocumentFile {
    #[serde(default)]
    pub viewport: Option<Size>,
    #[serde(default)]
    pub scroll: Option<Point>,
    #[serde(default)]
    pub extents: Option<Size>,
    #[serde(default)]
    pub page_width: Option<f64>,
    pub root: NodeSpec,
    #[serde(default)]
    pub frames: Vec<FrameSpec>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Size {
    #[serde(alias = "width")]
    pub w: f64,
    #[serde(alias = "height")]
    pub h: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RectSpec {
    pub x: f64,
    pub y: f64,
    #[serde(alias = "width")]
    pub w: f64,
    #[serde(alias = "height")]
    pub h: f64,
}

#[derive(Debug, Deserialize)]
pub struct FrameSpec {
    #[serde(default = "default_accessible")]
    pub accessible: bool,
    pub root: NodeSpec,
}

fn default_accessible() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NodeSpec {
    Text { text: String },
    Element(ElementSpec),
}

#[derive(Debug, Default, Deserialize)]
pub struct ElementSpec {
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub rect: Option<RectSpec>,
    #[serde(default)]
    pub style: StyleSpec,
    #[serde(default)]
    pub positioned: bool,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StyleSpec {
    pub display: Option<String>,
    pub visibility: Option<String>,
    pub opacity: Option<f64>,
    pub overflow: Option<String>,
}

pub fn load_document(path: &Path) -> Result<MemoryDocument> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read document {}", path.display()))?;
    parse_document(&contents)
        .with_context(|| format!("Invalid document {}", path.display()))
}

pub fn parse_document(contents: &str) -> Result<MemoryDocument> {
    let file: DocumentFile =
        serde_json::from_str(contents).context("Failed to parse document JSON")?;
    build_document(&file)
}

pub fn build_document(file: &DocumentFile) -> Result<MemoryDocument> {
    let mut doc = MemoryDocument::new();
    if let Some(viewport) = file.viewport {
        doc.set_viewport(viewport.w, viewport.h);
    }
    // Without explicit extents the page is exactly one viewport.
    if let Some(extents) = file.extents.or(file.viewport) {
        doc.set_extents(extents.w, extents.h);
    }
    if let Some(scroll) = file.scroll {
        doc.set_scroll(scroll.x, scroll.y);
    }
    doc.set_rendered_page_width(file.page_width);

    let body = doc.body();
    populate_body(&mut doc, body, &file.root).context("root")?;

    for (index, frame) in file.frames.iter().enumerate() {
        let frame_body = doc.add_frame(frame.accessible);
        populate_body(&mut doc, frame_body, &frame.root)
            .with_context(|| format!("frame {index}"))?;
    }

    Ok(doc)
}

/// Outlines of the main document and every readable frame, in that order.
pub fn snapshot(doc: &MemoryDocument) -> Vec<String> {
    let mut outlines = vec![doc.outline(doc.root())];
    outlines.extend(
        doc.sub_documents()
            .into_iter()
            .flatten()
            .map(|frame| doc.outline(frame)),
    );
    outlines
}

fn populate_body(doc: &mut MemoryDocument, body: NodeId, spec: &NodeSpec) -> Result<()> {
    match spec {
        NodeSpec::Text { text } => {
            doc.append_text(body, text);
        }
        NodeSpec::Element(element) => {
            if let Some(tag) = element.tag.as_deref()
                && ElementKind::from_tag(tag) != ElementKind::Body
            {
                bail!("document root must be a body element, found <{tag}>");
            }
            apply_element(doc, body, element)?;
        }
    }
    Ok(())
}

fn apply_element(doc: &mut MemoryDocument, node: NodeId, spec: &ElementSpec) -> Result<()> {
    if let Some(rect) = spec.rect {
        doc.set_rect(node, Rect::new(rect.x, rect.y, rect.w, rect.h));
    }
    doc.set_style(node, parse_style(&spec.style)?);
    doc.set_positioned(node, spec.positioned);

    for child in &spec.children {
        match child {
            NodeSpec::Text { text } => {
                doc.append_text(node, text);
            }
            NodeSpec::Element(element) => {
                let kind = ElementKind::from_tag(element.tag.as_deref().unwrap_or("div"));
                let child_node = doc.append_element(node, kind);
                apply_element(doc, child_node, element)?;
            }
        }
    }
    Ok(())
}

fn parse_style(spec: &StyleSpec) -> Result<ComputedStyle> {
    let mut style = ComputedStyle::default();

    if let Some(display) = spec.display.as_deref() {
        style.display = match display.trim().to_ascii_lowercase().as_str() {
            "none" => Display::None,
            "block" => Display::Block,
            "inline" => Display::Inline,
            other => bail!("unknown display value {other:?}"),
        };
    }

    if let Some(visibility) = spec.visibility.as_deref() {
        style.visibility = match visibility.trim().to_ascii_lowercase().as_str() {
            "visible" => Visibility::Visible,
            "hidden" => Visibility::Hidden,
            "collapse" => Visibility::Collapse,
            other => bail!("unknown visibility value {other:?}"),
        };
    }

    if let Some(opacity) = spec.opacity {
        style.opacity = opacity.clamp(0.0, 1.0);
    }

    if let Some(overflow) = spec.overflow.as_deref() {
        style.overflow = match overflow.trim().to_ascii_lowercase().as_str() {
            "visible" => Overflow::Visible,
            "hidden" => Overflow::Hidden,
            "clip" => Overflow::Clip,
            "scroll" => Overflow::Scroll,
            "auto" => Overflow::Auto,
            other => bail!("unknown overflow value {other:?}"),
        };
    }

    Ok(style)
}
