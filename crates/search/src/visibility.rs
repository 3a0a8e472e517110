use crate::budget::{Deadline, Step};
use crate::matcher::Match;
use crate::tree::{ElementKind, Geometry, NodeKind};

/// Whether `node` can be brought into view by scrolling the page.
///
/// Walks up to the body. Any hidden ancestor rejects the node. The node's own
/// box and the box of each offset parent along the way are intersected in
/// page coordinates; the result must not start above or left of the page
/// origin, run past the document extents, or become empty.
pub fn is_node_visible<G: Geometry>(host: &G, node: G::Node) -> bool {
    let (scroll_x, scroll_y) = host.scroll_origin(node);
    let (extent_width, extent_height) = host.document_extents();

    let mut top = f64::NEG_INFINITY;
    let mut left = f64::NEG_INFINITY;
    let mut bottom = f64::INFINITY;
    let mut right = f64::INFINITY;

    let mut next_offset_parent = host.offset_parent(node);
    let mut current = Some(node);
    while let Some(element) = current {
        if matches!(
            host.kind(element),
            NodeKind::Document | NodeKind::Element(ElementKind::Body)
        ) {
            break;
        }

        let style = host.computed_style(element);
        if style.is_hidden() {
            return false;
        }

        if element == node || Some(element) == next_offset_parent {
            let rect = host.bounding_rect(element);
            if style.overflow.clips() && rect.is_empty() {
                return false;
            }

            top = top.max(rect.y + scroll_y);
            left = left.max(rect.x + scroll_x);
            bottom = bottom.min(rect.bottom() + scroll_y);
            right = right.min(rect.right() + scroll_x);

            if top < 0.0 || left < 0.0 || right > extent_width || bottom > extent_height {
                return false;
            }
            // Clipped out of an offset parent entirely.
            if top > bottom || left > right {
                return false;
            }
            next_offset_parent = host.offset_parent(element);
        }

        current = host.parent(element);
    }
    true
}

/// A match is visible when every one of its markers is.
pub fn is_match_visible<G: Geometry>(host: &G, m: &Match<G::Node>) -> bool {
    !m.markers.is_empty() && m.markers.iter().all(|marker| is_node_visible(host, *marker))
}

/// Resumable assignment of visible ordinals.
#[derive(Debug, Clone, Default)]
pub struct VisibleCounter {
    cursor: usize,
    visible_count: usize,
}

impl VisibleCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of visible matches found so far, never more than the cap.
    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    /// Visible matches get ordinals `1..=cap` in document order. Once `cap`
    /// visible matches have been seen, every later match gets `cap` without
    /// any geometry work. A cap of 0 counts as 1.
    pub fn step<G: Geometry>(
        &mut self,
        host: &G,
        matches: &mut [Match<G::Node>],
        cap: usize,
        deadline: &Deadline,
    ) -> Step {
        let cap = cap.max(1);
        let total = matches.len();
        while let Some(m) = matches.get_mut(self.cursor) {
            if self.visible_count >= cap {
                m.visible_ordinal = Some(cap);
            } else if is_match_visible(host, m) {
                self.visible_count += 1;
                m.visible_ordinal = Some(self.visible_count);
            } else {
                m.visible_ordinal = None;
            }

            self.cursor += 1;
            if self.cursor < total && deadline.expired() {
                return Step::Suspended;
            }
        }
        Step::Completed
    }
}
