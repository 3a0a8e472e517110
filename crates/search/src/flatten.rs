use log::debug;

use crate::budget::{Deadline, Step};
use crate::engine::fold_case;
use crate::tree::{DocumentTree, NodeKind, is_ignored};

/// A range of the flattened buffer backed by one text leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<N> {
    pub begin: usize,
    pub end: usize,
    pub leaf: N,
}

impl<N> Section<N> {
    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }
}

/// Case-folded text of every searchable leaf, in document order.
#[derive(Debug, Clone)]
pub struct FlatText<N> {
    buffer: String,
    sections: Vec<Section<N>>,
}

impl<N> Default for FlatText<N> {
    fn default() -> Self {
        Self {
            buffer: String::new(),
            sections: Vec::new(),
        }
    }
}

impl<N: Copy> FlatText<N> {
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn sections(&self) -> &[Section<N>] {
        &self.sections
    }

    fn push_leaf(&mut self, leaf: N, text: &str) {
        let begin = self.buffer.len();
        self.buffer.push_str(&fold_case(text));
        self.sections.push(Section {
            begin,
            end: self.buffer.len(),
            leaf,
        });
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.sections.clear();
    }
}

/// Resumable depth-first walk over the main document and its accessible frames.
#[derive(Debug, Clone)]
pub struct Flattener<N> {
    stack: Vec<N>,
}

impl<N: Copy + std::fmt::Debug> Flattener<N> {
    /// Frames are pushed first and the main root last, so the main document is
    /// flattened first, followed by frames in document order.
    pub fn seed<T: DocumentTree<Node = N>>(tree: &T) -> Self {
        let mut stack = Vec::new();
        for frame in tree.sub_documents().into_iter().rev() {
            match frame {
                Ok(document) => stack.push(document),
                Err(err) => debug!("skipping sub-document: {}", err),
            }
        }
        stack.push(tree.root());
        Self { stack }
    }

    pub fn is_done(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn step<T: DocumentTree<Node = N>>(
        &mut self,
        tree: &T,
        flat: &mut FlatText<N>,
        deadline: &Deadline,
    ) -> Step {
        while let Some(node) = self.stack.pop() {
            let kind = tree.kind(node);
            if !is_ignored(kind) {
                if kind == NodeKind::Text {
                    if let Some(text) = tree.text(node) {
                        flat.push_leaf(node, text);
                    }
                } else {
                    self.stack.extend(tree.children(node).into_iter().rev());
                }
            }

            if !self.stack.is_empty() && deadline.expired() {
                return Step::Suspended;
            }
        }
        Step::Completed
    }
}
