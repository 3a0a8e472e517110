use serde::Serialize;

use crate::engine::FindConfig;
use crate::matcher::Match;
use crate::tree::{DocumentTree, Geometry};
use crate::visibility::is_match_visible;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Scroll offset, in rendered page pixels, that brings a match into view.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScrollTarget {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub id: usize,
    pub visible_ordinal: Option<usize>,
    pub target: ScrollTarget,
}

/// The selected-match pointer.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    selected: Option<usize>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Selects the next visible match in `direction`, wrapping around.
    ///
    /// The current highlight is dropped first. Returns `None` without moving
    /// the selection when there are no matches or none of them is visible.
    pub fn advance<G: Geometry>(
        &mut self,
        host: &mut G,
        matches: &[Match<G::Node>],
        direction: Direction,
        config: &FindConfig,
    ) -> Option<Selection> {
        let len = matches.len();
        if len == 0 {
            return None;
        }

        let origin = self.selected;
        if let Some(previous) = origin.and_then(|id| matches.get(id)) {
            set_marker_class(host, previous, &config.marker_class);
        }
        let mut index = step_index(origin, direction, len);
        let first = index;
        while !is_match_visible(&*host, &matches[index]) {
            if Some(index) == origin {
                return None;
            }
            index = step_index(Some(index), direction, len);
            if index == first {
                return None;
            }
        }

        Some(self.select_index(host, matches, index, config))
    }

    /// Selects match `id` if it exists and is visible.
    pub fn select<G: Geometry>(
        &mut self,
        host: &mut G,
        matches: &[Match<G::Node>],
        id: usize,
        config: &FindConfig,
    ) -> Option<Selection> {
        let target = matches.get(id)?;
        if !is_match_visible(&*host, target) {
            return None;
        }
        Some(self.select_index(host, matches, id, config))
    }

    fn select_index<G: Geometry>(
        &mut self,
        host: &mut G,
        matches: &[Match<G::Node>],
        index: usize,
        config: &FindConfig,
    ) -> Selection {
        if let Some(previous) = self.selected.and_then(|id| matches.get(id)) {
            set_marker_class(host, previous, &config.marker_class);
        }
        let current = &matches[index];
        set_marker_class(host, current, &config.selected_marker_class);
        self.selected = Some(index);

        Selection {
            id: index,
            visible_ordinal: current.visible_ordinal,
            target: scroll_target(&*host, current),
        }
    }
}

fn step_index(from: Option<usize>, direction: Direction, len: usize) -> usize {
    match (from, direction) {
        (None, Direction::Forward) => 0,
        (None, Direction::Backward) => len - 1,
        (Some(i), Direction::Forward) => (i + 1) % len,
        (Some(0), Direction::Backward) => len - 1,
        (Some(i), Direction::Backward) => i - 1,
    }
}

fn set_marker_class<T: DocumentTree>(tree: &mut T, m: &Match<T::Node>, class: &str) {
    for marker in &m.markers {
        tree.set_class(*marker, class);
    }
}

/// Scroll offset that centres the match's first marker in the viewport,
/// clamped so the viewport stays inside the document, then scaled to the
/// width the host renders the page at.
pub fn scroll_target<G: Geometry>(host: &G, m: &Match<G::Node>) -> ScrollTarget {
    let Some(marker) = m.markers.first().copied() else {
        return ScrollTarget::default();
    };

    let rect = host.bounding_rect(marker);
    let (scroll_x, scroll_y) = host.scroll_origin(marker);
    let (viewport_width, viewport_height) = host.viewport_size();
    let (extent_width, extent_height) = host.document_extents();

    let x = center_on(rect.x + scroll_x, rect.width, viewport_width, extent_width);
    let y = center_on(rect.y + scroll_y, rect.height, viewport_height, extent_height);

    let scale = host
        .rendered_page_width()
        .filter(|width| *width > 0.0 && extent_width > 0.0)
        .map_or(1.0, |width| width / extent_width);

    ScrollTarget {
        x: x * scale,
        y: y * scale,
    }
}

fn center_on(position: f64, size: f64, viewport: f64, extent: f64) -> f64 {
    let max = (extent - viewport).max(0.0);
    (position - (viewport - size) / 2.0).clamp(0.0, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{MemoryDocument, NodeId};
    use crate::tree::{ElementKind, Rect};

    fn page_with_matches(ys: &[f64]) -> (MemoryDocument, Vec<Match<NodeId>>) {
        let mut doc = MemoryDocument::new();
        doc.set_extents(1000.0, 3000.0);
        doc.set_viewport(400.0, 300.0);
        let body = doc.body();
        let matches = ys
            .iter()
            .enumerate()
            .map(|(i, y)| {
                let div = doc.append_element(body, ElementKind::Generic);
                doc.set_rect(div, Rect::new(100.0, *y, 40.0, 10.0));
                let marker = doc.create_marker_node("hit", "scour-match");
                doc.insert_before(div, marker, None).unwrap();
                let mut m = Match::new(i, i * 10, i * 10 + 3);
                m.markers.push(marker);
                m.visible_ordinal = Some(i + 1);
                m
            })
            .collect();
        (doc, matches)
    }

    #[test]
    fn test_navigation_wraps() {
        let (mut doc, matches) = page_with_matches(&[10.0, 20.0, 30.0]);
        let config = FindConfig::default();
        let mut nav = Navigator::new();

        let ids: Vec<usize> = (0..4)
            .map(|_| {
                nav.advance(&mut doc, &matches, Direction::Forward, &config)
                    .unwrap()
                    .id
            })
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 0]);

        let back = nav
            .advance(&mut doc, &matches, Direction::Backward, &config)
            .unwrap();
        assert_eq!(back.id, 2);
    }

    #[test]
    fn backward_without_selection_starts_at_last() {
        let (mut doc, matches) = page_with_matches(&[10.0, 20.0, 30.0]);
        let mut nav = Navigator::new();
        let selection = nav
            .advance(&mut doc, &matches, Direction::Backward, &FindConfig::default())
            .unwrap();
        assert_eq!(selection.id, 2);
    }

    #[test]
    fn hidden_matches_are_skipped() {
        let (mut doc, matches) = page_with_matches(&[10.0, -500.0, 30.0]);
        let config = FindConfig::default();
        let mut nav = Navigator::new();

        assert_eq!(
            nav.advance(&mut doc, &matches, Direction::Forward, &config)
                .unwrap()
                .id,
            0
        );
        assert_eq!(
            nav.advance(&mut doc, &matches, Direction::Forward, &config)
                .unwrap()
                .id,
            2
        );
        assert_eq!(
            nav.advance(&mut doc, &matches, Direction::Backward, &config)
                .unwrap()
                .id,
            0
        );
    }

    #[test]
    fn single_visible_match_is_reselected() {
        let (mut doc, matches) = page_with_matches(&[-10.0, 40.0, -30.0]);
        let config = FindConfig::default();
        let mut nav = Navigator::new();
        for _ in 0..4 {
            let selection = nav
                .advance(&mut doc, &matches, Direction::Forward, &config)
                .unwrap();
            assert_eq!(selection.id, 1);
        }
    }

    #[test]
    fn nothing_visible_leaves_selection_alone() {
        let (mut doc, matches) = page_with_matches(&[-10.0, -20.0]);
        let config = FindConfig::default();
        let mut nav = Navigator::new();
        assert!(nav
            .advance(&mut doc, &matches, Direction::Forward, &config)
            .is_none());
        assert!(nav
            .advance(&mut doc, &matches, Direction::Backward, &config)
            .is_none());
        assert_eq!(nav.selected(), None);

        let mut doc = MemoryDocument::new();
        assert!(nav
            .advance(&mut doc, &[], Direction::Forward, &config)
            .is_none());
    }

    #[test]
    fn highlight_is_dropped_when_nothing_stays_visible() {
        let (mut doc, matches) = page_with_matches(&[10.0]);
        let config = FindConfig::default();
        let mut nav = Navigator::new();
        nav.advance(&mut doc, &matches, Direction::Forward, &config)
            .unwrap();

        let marker = matches[0].markers[0];
        let div = doc.parent(marker).unwrap();
        doc.set_rect(div, Rect::new(100.0, -500.0, 40.0, 10.0));

        assert!(nav
            .advance(&mut doc, &matches, Direction::Forward, &config)
            .is_none());
        assert_eq!(nav.selected(), Some(0));
        assert_eq!(doc.class(marker), Some("scour-match"));
    }

    #[test]
    fn selection_moves_the_highlight() {
        let (mut doc, matches) = page_with_matches(&[10.0, 20.0]);
        let config = FindConfig::default();
        let mut nav = Navigator::new();

        nav.advance(&mut doc, &matches, Direction::Forward, &config);
        assert_eq!(doc.class(matches[0].markers[0]), Some("scour-match-selected"));

        nav.advance(&mut doc, &matches, Direction::Forward, &config);
        assert_eq!(doc.class(matches[0].markers[0]), Some("scour-match"));
        assert_eq!(doc.class(matches[1].markers[0]), Some("scour-match-selected"));
    }

    #[test]
    fn select_jumps_to_visible_match_only() {
        let (mut doc, matches) = page_with_matches(&[10.0, -20.0, 30.0]);
        let config = FindConfig::default();
        let mut nav = Navigator::new();

        assert_eq!(nav.select(&mut doc, &matches, 2, &config).unwrap().id, 2);
        assert!(nav.select(&mut doc, &matches, 1, &config).is_none());
        assert!(nav.select(&mut doc, &matches, 9, &config).is_none());
        assert_eq!(nav.selected(), Some(2));
    }

    #[test]
    fn scroll_target_centres_and_clamps() {
        let (mut doc, matches) = page_with_matches(&[10.0, 1500.0, 2995.0]);
        // Near the top the offset clamps to zero.
        assert_eq!(scroll_target(&doc, &matches[0]), ScrollTarget { x: 0.0, y: 0.0 });

        // x: 100 - (400 - 40) / 2 = -80 -> 0; y: 1500 - (300 - 10) / 2 = 1355.
        assert_eq!(scroll_target(&doc, &matches[1]), ScrollTarget { x: 0.0, y: 1355.0 });

        // Near the bottom the offset clamps to extent - viewport.
        assert_eq!(scroll_target(&doc, &matches[2]).y, 2700.0);

        // Scrolling the page does not move the target.
        doc.set_scroll(0.0, 800.0);
        assert_eq!(scroll_target(&doc, &matches[1]).y, 1355.0);

        // Zoomed rendering scales the target.
        doc.set_rendered_page_width(Some(2000.0));
        assert_eq!(scroll_target(&doc, &matches[1]).y, 2710.0);
    }
}
