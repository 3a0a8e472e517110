use regex::{Regex, RegexBuilder};
use thiserror::Error;

pub const DEFAULT_MAX_VISIBLE: usize = 100;
pub const DEFAULT_MARKER_CLASS: &str = "scour-match";
pub const DEFAULT_SELECTED_MARKER_CLASS: &str = "scour-match-selected";
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "#ffff00";
pub const DEFAULT_SELECTED_HIGHLIGHT_COLOR: &str = "#ff9632";

/// Compiled-program limit for a query. The default regex limit rejects
/// literals of a few hundred thousand characters.
const QUERY_SIZE_LIMIT: usize = 1 << 30;

#[derive(Debug, Clone, PartialEq)]
pub struct FindConfig {
    /// Visible ordinals saturate at this value. Values below 1 act as 1.
    pub max_visible: usize,
    pub marker_class: String,
    pub selected_marker_class: String,
    pub highlight_color: String,
    pub selected_highlight_color: String,
}

impl Default for FindConfig {
    fn default() -> Self {
        Self {
            max_visible: DEFAULT_MAX_VISIBLE,
            marker_class: DEFAULT_MARKER_CLASS.to_string(),
            selected_marker_class: DEFAULT_SELECTED_MARKER_CLASS.to_string(),
            highlight_color: DEFAULT_HIGHLIGHT_COLOR.to_string(),
            selected_highlight_color: DEFAULT_SELECTED_HIGHLIGHT_COLOR.to_string(),
        }
    }
}

impl FindConfig {
    /// CSS the host injects so marker classes are painted.
    pub fn stylesheet(&self) -> String {
        format!(
            ".{} {{ background-color: {} !important; color: #000000 !important; }}\n\
             .{} {{ background-color: {} !important; color: #000000 !important; }}\n",
            self.marker_class,
            self.highlight_color,
            self.selected_marker_class,
            self.selected_highlight_color,
        )
    }
}

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("empty query")]
    Empty,
    #[error(transparent)]
    Regex(#[from] regex::Error),
}

/// Lowercases `text` one character at a time, keeping any character whose
/// lowercase form would change the UTF-8 length. Offsets into the folded
/// string are therefore valid offsets into the original.
pub fn fold_case(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for c in text.chars() {
        let mut lower = c.to_lowercase();
        match (lower.next(), lower.next()) {
            (Some(l), None) if l.len_utf8() == c.len_utf8() => folded.push(l),
            _ => folded.push(c),
        }
    }
    folded
}

/// A literal, case-insensitive query compiled for scanning a folded buffer.
#[derive(Debug, Clone)]
pub struct QueryPattern {
    query: String,
    regex: Regex,
}

impl QueryPattern {
    /// Compiles `query` as a case-insensitive literal. Compilation is not
    /// time-sliced; its cost grows with the query length.
    pub fn compile(query: &str) -> Result<Self, PatternError> {
        if query.is_empty() {
            return Err(PatternError::Empty);
        }

        let regex = RegexBuilder::new(&regex::escape(&fold_case(query)))
            .size_limit(QUERY_SIZE_LIMIT)
            .build()?;
        Ok(Self {
            query: query.to_string(),
            regex,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Next occurrence in `folded` starting at or after byte offset `start`.
    pub fn find_at(&self, folded: &str, start: usize) -> Option<(usize, usize)> {
        if start > folded.len() {
            return None;
        }
        self.regex.find_at(folded, start).map(|m| (m.start(), m.end()))
    }
}
