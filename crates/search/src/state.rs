use std::time::Duration;

use log::{debug, warn};
use serde::Serialize;

use crate::budget::{Deadline, Step};
use crate::engine::{FindConfig, PatternError, QueryPattern};
use crate::flatten::{FlatText, Flattener, Section};
use crate::highlight::{Replacement, apply_pending, revert_all};
use crate::matcher::{Match, MatchSink, Matcher};
use crate::navigation::{Direction, Navigator, Selection, scroll_target};
use crate::tree::Geometry;
use crate::visibility::VisibleCounter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Building,
    Matching,
    Replacing,
    CountingVisible,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SelectedMatch {
    /// Visible ordinal of the selected match, 0 when it has none.
    pub ordinal: usize,
    pub x: f64,
    pub y: f64,
}

impl From<Selection> for SelectedMatch {
    fn from(selection: Selection) -> Self {
        Self {
            ordinal: selection.visible_ordinal.unwrap_or(0),
            x: selection.target.x,
            y: selection.target.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FindOutcome {
    Found {
        visible_count: usize,
        selected: SelectedMatch,
    },
    NoResults,
    /// The time budget ran out; call `pump` again to continue.
    Timeout,
}

/// Everything one search owns, including the cursors that let each phase resume.
#[derive(Debug)]
struct Session<N> {
    pattern: QueryPattern,
    phase: Phase,
    flat: FlatText<N>,
    flattener: Flattener<N>,
    matcher: Matcher,
    matches: Vec<Match<N>>,
    replacements: Vec<Replacement<N>>,
    applied: usize,
    counter: VisibleCounter,
    navigator: Navigator,
}

/// Find-in-page driver. At most one session is live; starting a new search
/// tears down the previous one.
#[derive(Debug)]
pub struct FindInPage<N> {
    config: FindConfig,
    session: Option<Session<N>>,
}

impl<N: Copy + Eq + std::fmt::Debug> Default for FindInPage<N> {
    fn default() -> Self {
        Self::new(FindConfig::default())
    }
}

impl<N: Copy + Eq + std::fmt::Debug> FindInPage<N> {
    pub fn new(config: FindConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.session.as_ref().map_or(Phase::Idle, |s| s.phase)
    }

    pub fn query(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.pattern.query())
    }

    pub fn buffer(&self) -> &str {
        self.session.as_ref().map_or("", |s| s.flat.buffer())
    }

    pub fn sections(&self) -> &[Section<N>] {
        match &self.session {
            Some(session) => session.flat.sections(),
            None => &[],
        }
    }

    pub fn matches(&self) -> &[Match<N>] {
        match &self.session {
            Some(session) => &session.matches,
            None => &[],
        }
    }

    pub fn replacements(&self) -> &[Replacement<N>] {
        match &self.session {
            Some(session) => &session.replacements,
            None => &[],
        }
    }

    pub fn visible_count(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, |s| s.counter.visible_count())
    }

    /// Visible ordinal of the selected match and the visible count.
    pub fn position(&self) -> Option<(usize, usize)> {
        let session = self.session.as_ref()?;
        let selected = session.matches.get(session.navigator.selected()?)?;
        Some((
            selected.visible_ordinal.unwrap_or(0),
            session.counter.visible_count(),
        ))
    }

    /// Starts a search for `query` and pumps it once with `budget`.
    pub fn start<G: Geometry<Node = N>>(
        &mut self,
        host: &mut G,
        query: &str,
        budget: Duration,
    ) -> FindOutcome {
        self.cleanup(host);

        let pattern = match QueryPattern::compile(query) {
            Ok(pattern) => pattern,
            Err(PatternError::Empty) => return FindOutcome::NoResults,
            Err(err) => {
                warn!("cannot search for {:?}: {}", query, err);
                return FindOutcome::NoResults;
            }
        };

        debug!("starting search for {:?}", query);
        self.session = Some(Session {
            pattern,
            phase: Phase::Building,
            flat: FlatText::default(),
            flattener: Flattener::seed(&*host),
            matcher: Matcher::new(),
            matches: Vec::new(),
            replacements: Vec::new(),
            applied: 0,
            counter: VisibleCounter::new(),
            navigator: Navigator::new(),
        });
        self.pump(host, budget)
    }

    /// Continues the live session for at most `budget`. Must not be re-entered.
    pub fn pump<G: Geometry<Node = N>>(&mut self, host: &mut G, budget: Duration) -> FindOutcome {
        let Some(session) = self.session.as_mut() else {
            return FindOutcome::NoResults;
        };
        let deadline = Deadline::after(budget);

        loop {
            let step = match session.phase {
                Phase::Idle | Phase::Done => break,
                Phase::Building => session.flattener.step(&*host, &mut session.flat, &deadline),
                Phase::Matching => {
                    let mut sink = MatchSink {
                        matches: &mut session.matches,
                        replacements: &mut session.replacements,
                        marker_class: &self.config.marker_class,
                    };
                    session
                        .matcher
                        .step(host, &session.pattern, &session.flat, &mut sink, &deadline)
                }
                Phase::Replacing => apply_pending(
                    host,
                    &mut session.replacements,
                    &mut session.applied,
                    &deadline,
                ),
                Phase::CountingVisible => session.counter.step(
                    &*host,
                    &mut session.matches,
                    self.config.max_visible,
                    &deadline,
                ),
            };

            if step == Step::Suspended {
                debug!("search suspended in {:?}", session.phase);
                return FindOutcome::Timeout;
            }

            session.phase = next_phase(session.phase);
            debug!(
                "search entered {:?}: {} sections, {} matches, {} replacements",
                session.phase,
                session.flat.sections().len(),
                session.matches.len(),
                session.replacements.len()
            );
            if session.phase == Phase::Done {
                let selection = session.navigator.advance(
                    host,
                    &session.matches,
                    Direction::Forward,
                    &self.config,
                );
                return session.outcome(selection);
            }
            if deadline.expired() {
                return FindOutcome::Timeout;
            }
        }

        let selection = session
            .navigator
            .selected()
            .and_then(|id| session.matches.get(id))
            .map(|m| Selection {
                id: m.id,
                visible_ordinal: m.visible_ordinal,
                target: scroll_target(&*host, m),
            });
        session.outcome(selection)
    }

    pub fn next<G: Geometry<Node = N>>(&mut self, host: &mut G) -> Option<SelectedMatch> {
        self.navigate(host, Direction::Forward)
    }

    pub fn previous<G: Geometry<Node = N>>(&mut self, host: &mut G) -> Option<SelectedMatch> {
        self.navigate(host, Direction::Backward)
    }

    fn navigate<G: Geometry<Node = N>>(
        &mut self,
        host: &mut G,
        direction: Direction,
    ) -> Option<SelectedMatch> {
        let session = self.session.as_mut()?;
        if session.phase != Phase::Done {
            return None;
        }
        session
            .navigator
            .advance(host, &session.matches, direction, &self.config)
            .map(SelectedMatch::from)
    }

    /// Selects match `id` directly, if it is visible.
    pub fn select<G: Geometry<Node = N>>(
        &mut self,
        host: &mut G,
        id: usize,
    ) -> Option<SelectedMatch> {
        let session = self.session.as_mut()?;
        if session.phase != Phase::Done {
            return None;
        }
        session
            .navigator
            .select(host, &session.matches, id, &self.config)
            .map(SelectedMatch::from)
    }

    /// Restores the document and drops the session. Safe to call at any time.
    pub fn cleanup<G: Geometry<Node = N>>(&mut self, host: &mut G) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        revert_all(host, &mut session.replacements);
        debug!(
            "search for {:?} cleaned up in {:?}",
            session.pattern.query(),
            session.phase
        );
    }
}

fn next_phase(phase: Phase) -> Phase {
    match phase {
        Phase::Idle => Phase::Building,
        Phase::Building => Phase::Matching,
        Phase::Matching => Phase::Replacing,
        Phase::Replacing => Phase::CountingVisible,
        Phase::CountingVisible | Phase::Done => Phase::Done,
    }
}

impl<N> Session<N> {
    fn outcome(&self, selection: Option<Selection>) -> FindOutcome {
        match selection {
            Some(selection) => FindOutcome::Found {
                visible_count: self.counter.visible_count(),
                selected: selection.into(),
            },
            None => FindOutcome::NoResults,
        }
    }
}
