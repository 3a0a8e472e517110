//! Reversible leaf swaps that wrap matched text in marker nodes.

use log::warn;

use crate::budget::{Deadline, Step};
use crate::flatten::Section;
use crate::matcher::{Match, PartialMatch};
use crate::tree::{DocumentTree, TreeError};

/// Replaces one text leaf with plain text and marker nodes, and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement<N> {
    pub original_leaf: N,
    pub new_nodes: Vec<N>,
    /// Parent the swap was applied under; `None` while not applied.
    parent: Option<N>,
}

impl<N: Copy + Eq + std::fmt::Debug> Replacement<N> {
    pub fn new(original_leaf: N, new_nodes: Vec<N>) -> Self {
        Self {
            original_leaf,
            new_nodes,
            parent: None,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.parent.is_some()
    }

    pub fn apply<T: DocumentTree<Node = N>>(&mut self, tree: &mut T) -> Result<(), TreeError> {
        if self.is_applied() {
            return Ok(());
        }

        let parent = tree
            .parent(self.original_leaf)
            .ok_or(TreeError::Detached)?;
        for node in &self.new_nodes {
            tree.insert_before(parent, *node, Some(self.original_leaf))?;
        }
        tree.remove_child(parent, self.original_leaf)?;
        self.parent = Some(parent);
        Ok(())
    }

    pub fn revert<T: DocumentTree<Node = N>>(&mut self, tree: &mut T) -> Result<(), TreeError> {
        let Some(parent) = self.parent else {
            return Ok(());
        };

        tree.insert_before(parent, self.original_leaf, self.new_nodes.first().copied())?;
        for node in &self.new_nodes {
            tree.remove_child(parent, *node)?;
        }
        self.parent = None;
        Ok(())
    }
}

/// Builds the replacement for a section from its partial matches, which must
/// be sorted by `begin` and non-overlapping. Marker nodes are recorded on the
/// owning matches. Returns `None` when there is nothing to highlight.
pub fn close_section<T: DocumentTree>(
    tree: &mut T,
    section: &Section<T::Node>,
    partials: &[PartialMatch],
    matches: &mut [Match<T::Node>],
    marker_class: &str,
) -> Option<Replacement<T::Node>> {
    if partials.is_empty() {
        return None;
    }

    // Slice the original text so the highlighted copy keeps its casing.
    let text = tree.text(section.leaf).unwrap_or_default().to_string();
    let mut new_nodes = Vec::with_capacity(partials.len() * 2 + 1);
    let mut cursor = 0;
    for partial in partials {
        let begin = partial.begin - section.begin;
        let end = partial.end - section.begin;
        if begin > cursor {
            new_nodes.push(tree.create_text_node(&text[cursor..begin]));
        }
        let marker = tree.create_marker_node(&text[begin..end], marker_class);
        new_nodes.push(marker);
        if let Some(owner) = matches.get_mut(partial.match_id) {
            owner.markers.push(marker);
        }
        cursor = end;
    }
    if cursor < text.len() {
        new_nodes.push(tree.create_text_node(&text[cursor..]));
    }

    Some(Replacement::new(section.leaf, new_nodes))
}

/// Applies replacements from `cursor` on, in section order, until done or out of time.
pub fn apply_pending<T: DocumentTree>(
    tree: &mut T,
    replacements: &mut [Replacement<T::Node>],
    cursor: &mut usize,
    deadline: &Deadline,
) -> Step {
    while let Some(replacement) = replacements.get_mut(*cursor) {
        if let Err(err) = replacement.apply(tree) {
            warn!(
                "could not highlight {:?}: {}",
                replacement.original_leaf, err
            );
        }
        *cursor += 1;
        if *cursor < replacements.len() && deadline.expired() {
            return Step::Suspended;
        }
    }
    Step::Completed
}

pub fn apply_all<T: DocumentTree>(tree: &mut T, replacements: &mut [Replacement<T::Node>]) {
    let mut cursor = 0;
    let _ = apply_pending(tree, replacements, &mut cursor, &Deadline::unbounded());
}

/// Restores every applied leaf. This is the only path back to the original tree.
pub fn revert_all<T: DocumentTree>(tree: &mut T, replacements: &mut [Replacement<T::Node>]) {
    for replacement in replacements.iter_mut() {
        if let Err(err) = replacement.revert(tree) {
            warn!(
                "could not restore {:?}: {}",
                replacement.original_leaf, err
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;

    fn section_for(doc: &mut MemoryDocument, text: &str) -> Section<crate::dom::NodeId> {
        let body = doc.body();
        let leaf = doc.append_text(body, text);
        Section {
            begin: 10,
            end: 10 + text.len(),
            leaf,
        }
    }

    #[test]
    fn gaps_keep_original_casing() {
        let mut doc = MemoryDocument::new();
        let section = section_for(&mut doc, "The Quick brown fox");
        let mut matches = vec![Match::new(0, 14, 19)];
        let partials = [PartialMatch {
            match_id: 0,
            begin: 14,
            end: 19,
        }];

        let replacement =
            close_section(&mut doc, &section, &partials, &mut matches, "hit").unwrap();

        let texts: Vec<String> = replacement
            .new_nodes
            .iter()
            .map(|node| doc.text_content(*node))
            .collect();
        assert_eq!(texts, vec!["The ", "Quick", " brown fox"]);
        assert_eq!(matches[0].markers, vec![replacement.new_nodes[1]]);
        assert_eq!(doc.class(replacement.new_nodes[1]), Some("hit"));
    }

    #[test]
    fn adjacent_partials_emit_no_empty_text() {
        let mut doc = MemoryDocument::new();
        let section = section_for(&mut doc, "abab");
        let mut matches = vec![Match::new(0, 10, 12), Match::new(1, 12, 14)];
        let partials = [
            PartialMatch {
                match_id: 0,
                begin: 10,
                end: 12,
            },
            PartialMatch {
                match_id: 1,
                begin: 12,
                end: 14,
            },
        ];

        let replacement =
            close_section(&mut doc, &section, &partials, &mut matches, "hit").unwrap();
        assert_eq!(replacement.new_nodes.len(), 2);
        assert_eq!(matches[1].markers.len(), 1);
    }

    #[test]
    fn no_partials_means_no_replacement() {
        let mut doc = MemoryDocument::new();
        let section = section_for(&mut doc, "untouched");
        assert!(close_section(&mut doc, &section, &[], &mut [], "hit").is_none());
    }

    #[test]
    fn apply_then_revert_restores_structure() {
        let mut doc = MemoryDocument::new();
        let section = section_for(&mut doc, "one two one");
        let body = doc.body();
        doc.append_text(body, " tail");
        let before = doc.outline(doc.root());

        let mut matches = vec![Match::new(0, 10, 13), Match::new(1, 18, 21)];
        let partials = [
            PartialMatch {
                match_id: 0,
                begin: 10,
                end: 13,
            },
            PartialMatch {
                match_id: 1,
                begin: 18,
                end: 21,
            },
        ];
        let mut replacements =
            vec![close_section(&mut doc, &section, &partials, &mut matches, "hit").unwrap()];

        apply_all(&mut doc, &mut replacements);
        assert!(replacements[0].is_applied());
        assert_eq!(
            doc.outline(body),
            "<body><mark.hit>\"one\"</mark>\" two \"<mark.hit>\"one\"</mark>\" tail\"</body>"
        );

        revert_all(&mut doc, &mut replacements);
        assert!(!replacements[0].is_applied());
        assert_eq!(doc.outline(doc.root()), before);

        // Reverting twice is harmless.
        revert_all(&mut doc, &mut replacements);
        assert_eq!(doc.outline(doc.root()), before);
    }
}
