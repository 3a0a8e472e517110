use std::mem;

use crate::budget::{Deadline, Step};
use crate::engine::QueryPattern;
use crate::flatten::FlatText;
use crate::highlight::{Replacement, close_section};
use crate::tree::DocumentTree;

/// One occurrence of the query in the flattened buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match<N> {
    pub id: usize,
    pub begin: usize,
    pub end: usize,
    pub markers: Vec<N>,
    pub visible_ordinal: Option<usize>,
}

impl<N> Match<N> {
    pub fn new(id: usize, begin: usize, end: usize) -> Self {
        Self {
            id,
            begin,
            end,
            markers: Vec::new(),
            visible_ordinal: None,
        }
    }
}

/// The part of a match that falls inside a single section, in buffer offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialMatch {
    pub match_id: usize,
    pub begin: usize,
    pub end: usize,
}

/// Where matching and rendering write their results.
pub struct MatchSink<'a, N> {
    pub matches: &'a mut Vec<Match<N>>,
    pub replacements: &'a mut Vec<Replacement<N>>,
    pub marker_class: &'a str,
}

/// Resumable forward scan of the flattened buffer.
///
/// Sections are looked up through a cursor that only ever moves forward, so
/// mapping all matches onto sections costs O(sections + matches) overall.
/// Partial matches collect for the section under the cursor and are handed to
/// the renderer when the cursor leaves it.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    scan_pos: usize,
    section: usize,
    /// Match being split across sections and the offset it resumes at.
    pending: Option<(usize, usize)>,
    open: Vec<PartialMatch>,
    exhausted: bool,
}

impl Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step<T: DocumentTree>(
        &mut self,
        tree: &mut T,
        pattern: &QueryPattern,
        flat: &FlatText<T::Node>,
        sink: &mut MatchSink<'_, T::Node>,
        deadline: &Deadline,
    ) -> Step {
        loop {
            if let Some((id, pos)) = self.pending {
                let end = sink.matches[id].end;
                let next = self.place(tree, flat, sink, id, pos, end);
                self.pending = (next < end).then_some((id, next));
                if deadline.expired() {
                    return Step::Suspended;
                }
                continue;
            }

            if self.exhausted {
                break;
            }

            match pattern.find_at(flat.buffer(), self.scan_pos) {
                Some((begin, end)) if end > begin => {
                    let id = sink.matches.len();
                    sink.matches.push(Match::new(id, begin, end));
                    self.scan_pos = end;
                    self.pending = Some((id, begin));
                }
                _ => self.exhausted = true,
            }
        }

        self.close_open(tree, flat, sink);
        Step::Completed
    }

    /// Records the partial of match `id` that starts at `pos` and returns
    /// where the next partial of the same match would start.
    fn place<T: DocumentTree>(
        &mut self,
        tree: &mut T,
        flat: &FlatText<T::Node>,
        sink: &mut MatchSink<'_, T::Node>,
        id: usize,
        pos: usize,
        end: usize,
    ) -> usize {
        let sections = flat.sections();
        let index = self.section + sections[self.section..].partition_point(|s| s.end <= pos);
        let Some(section) = sections.get(index) else {
            unreachable!("match offset {pos} lies beyond the last section");
        };

        if index != self.section {
            self.close_open(tree, flat, sink);
            self.section = index;
        }

        let partial_end = end.min(section.end);
        self.open.push(PartialMatch {
            match_id: id,
            begin: pos,
            end: partial_end,
        });
        partial_end
    }

    fn close_open<T: DocumentTree>(
        &mut self,
        tree: &mut T,
        flat: &FlatText<T::Node>,
        sink: &mut MatchSink<'_, T::Node>,
    ) {
        if self.open.is_empty() {
            return;
        }

        let partials = mem::take(&mut self.open);
        let section = flat.sections()[self.section];
        if let Some(replacement) =
            close_section(tree, &section, &partials, sink.matches, sink.marker_class)
        {
            sink.replacements.push(replacement);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::dom::{MemoryDocument, NodeId};
    use crate::flatten::Flattener;
    use crate::tree::ElementKind;

    struct Run {
        flat: FlatText<NodeId>,
        matches: Vec<Match<NodeId>>,
        replacements: Vec<Replacement<NodeId>>,
    }

    fn run(doc: &mut MemoryDocument, query: &str, budget: Option<Duration>) -> Run {
        let mut flat = FlatText::default();
        let mut flattener = Flattener::seed(doc);
        let _ = flattener.step(doc, &mut flat, &Deadline::unbounded());

        let pattern = QueryPattern::compile(query).unwrap();
        let mut matches = Vec::new();
        let mut replacements = Vec::new();
        let mut matcher = Matcher::new();
        loop {
            let deadline = budget.map_or_else(Deadline::unbounded, Deadline::after);
            let mut sink = MatchSink {
                matches: &mut matches,
                replacements: &mut replacements,
                marker_class: "hit",
            };
            if matcher.step(doc, &pattern, &flat, &mut sink, &deadline) == Step::Completed {
                break;
            }
        }
        Run {
            flat,
            matches,
            replacements,
        }
    }

    #[test]
    fn single_leaf_single_match() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        doc.append_text(body, "The quick brown fox");

        let result = run(&mut doc, "quick", None);
        assert_eq!(result.flat.sections().len(), 1);
        assert_eq!(result.matches.len(), 1);
        assert_eq!((result.matches[0].begin, result.matches[0].end), (4, 9));
        assert_eq!(result.replacements.len(), 1);

        let texts: Vec<String> = result.replacements[0]
            .new_nodes
            .iter()
            .map(|node| doc.text_content(*node))
            .collect();
        assert_eq!(texts, vec!["The ", "quick", " brown fox"]);
        assert_eq!(result.matches[0].markers, vec![result.replacements[0].new_nodes[1]]);
    }

    #[test]
    fn match_spanning_two_leaves() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        doc.append_text(body, "Hello");
        doc.append_text(body, "World");

        let result = run(&mut doc, "oW", None);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].markers.len(), 2);
        assert_eq!(result.replacements.len(), 2);
        assert_eq!(doc.text_content(result.matches[0].markers[0]), "o");
        assert_eq!(doc.text_content(result.matches[0].markers[1]), "W");
    }

    #[test]
    fn match_spanning_three_leaves_skips_empty_ones() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        doc.append_text(body, "ab");
        doc.append_text(body, "");
        let span = doc.append_element(body, ElementKind::Generic);
        doc.append_text(span, "c");
        doc.append_text(body, "de");

        let result = run(&mut doc, "bcd", None);
        assert_eq!(result.matches.len(), 1);
        let marked: Vec<String> = result.matches[0]
            .markers
            .iter()
            .map(|node| doc.text_content(*node))
            .collect();
        assert_eq!(marked, vec!["b", "c", "d"]);
        assert_eq!(result.replacements.len(), 3);
    }

    #[test]
    fn matches_are_ordered_and_disjoint() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        for chunk in ["aaa", "a", "aa", "xa", "aaaa"] {
            doc.append_text(body, chunk);
        }

        let result = run(&mut doc, "aa", None);
        assert!(!result.matches.is_empty());
        for (i, pair) in result.matches.windows(2).enumerate() {
            assert_eq!(pair[0].id, i);
            assert!(pair[0].end <= pair[1].begin);
        }
        for m in &result.matches {
            assert_eq!(&result.flat.buffer()[m.begin..m.end], "aa");
        }
    }

    #[test]
    fn several_matches_share_one_replacement() {
        let mut doc = MemoryDocument::new();
        let body = doc.body();
        doc.append_text(body, "cat dog cat");
        doc.append_text(body, " bird cat");

        let result = run(&mut doc, "CAT", None);
        assert_eq!(result.matches.len(), 3);
        assert_eq!(result.replacements.len(), 2);
        assert_eq!(result.replacements[0].new_nodes.len(), 3);
        assert_eq!(result.replacements[1].new_nodes.len(), 2);
    }

    #[test]
    fn suspending_between_partials_gives_same_result() {
        let build = || {
            let mut doc = MemoryDocument::new();
            let body = doc.body();
            for chunk in ["fo", "o b", "ar f", "oo", "foo"] {
                doc.append_text(body, chunk);
            }
            doc
        };

        let mut whole_doc = build();
        let whole = run(&mut whole_doc, "foo", None);
        let mut sliced_doc = build();
        let sliced = run(&mut sliced_doc, "foo", Some(Duration::ZERO));

        assert_eq!(whole.matches.len(), 3);
        assert_eq!(whole.matches, sliced.matches);
        assert_eq!(whole.replacements, sliced.replacements);
    }
}
