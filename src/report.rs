use std::fmt::Write as _;

use scour_search::{FindOutcome, SelectedMatch};
use serde::Serialize;

/// Result of one driver run, printable as text or JSON.
#[derive(Debug, Serialize)]
pub struct Summary<'a> {
    pub query: &'a str,
    pub slices: usize,
    pub total_matches: usize,
    pub outcome: FindOutcome,
    /// One entry per `--next`/`--previous` step; `null` when nothing was selectable.
    pub steps: Vec<Option<SelectedMatch>>,
    /// (ordinal, visible count) of the final selection.
    pub position: Option<(usize, usize)>,
}

impl Summary<'_> {
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:?}: {} in {} {}",
            self.query,
            describe(&self.outcome),
            self.slices,
            if self.slices == 1 { "slice" } else { "slices" }
        );
        let _ = writeln!(out, "  {} total matches", self.total_matches);

        for (index, step) in self.steps.iter().enumerate() {
            match step {
                Some(selected) => {
                    let _ = writeln!(out, "  step {}: {}", index + 1, describe_selected(selected));
                }
                None => {
                    let _ = writeln!(out, "  step {}: nothing to select", index + 1);
                }
            }
        }

        if let Some((ordinal, count)) = self.position {
            let _ = writeln!(out, "  position {} of {}", ordinal, count);
        }
        out
    }
}

pub fn describe(outcome: &FindOutcome) -> String {
    match outcome {
        FindOutcome::Found {
            visible_count,
            selected,
        } => format!(
            "{} visible, {}",
            visible_count,
            describe_selected(selected)
        ),
        FindOutcome::NoResults => "no results".to_string(),
        FindOutcome::Timeout => "timed out".to_string(),
    }
}

fn describe_selected(selected: &SelectedMatch) -> String {
    format!(
        "match {} at ({:.1}, {:.1})",
        selected.ordinal, selected.x, selected.y
    )
}
