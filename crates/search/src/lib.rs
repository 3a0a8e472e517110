//! Incremental find-in-page for Scour.
//!
//! A search runs as a sequence of resumable phases (flatten, match and
//! highlight, apply, count visible) driven by [`FindInPage::pump`] under a
//! per-call time budget.

mod budget;
pub mod dom;
mod engine;
mod flatten;
mod highlight;
mod matcher;
mod navigation;
mod state;
mod tree;
mod visibility;

pub use budget::{Deadline, Step};
pub use engine::{
    DEFAULT_HIGHLIGHT_COLOR, DEFAULT_MARKER_CLASS, DEFAULT_MAX_VISIBLE,
    DEFAULT_SELECTED_HIGHLIGHT_COLOR, DEFAULT_SELECTED_MARKER_CLASS, FindConfig, PatternError,
    QueryPattern, fold_case,
};
pub use flatten::{FlatText, Flattener, Section};
pub use highlight::{Replacement, apply_all, apply_pending, close_section, revert_all};
pub use matcher::{Match, MatchSink, Matcher, PartialMatch};
pub use navigation::{Direction, Navigator, ScrollTarget, Selection, scroll_target};
pub use state::{FindInPage, FindOutcome, Phase, SelectedMatch};
pub use tree::{
    ComputedStyle, Display, DocumentTree, ElementKind, Geometry, NodeKind, Overflow, Rect,
    TreeError, Visibility, is_ignored,
};
pub use visibility::{VisibleCounter, is_match_visible, is_node_visible};
