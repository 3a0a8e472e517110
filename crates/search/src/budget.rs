use std::time::{Duration, Instant};

/// Result of running one resumable phase.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Suspended,
    Completed,
}

/// Time budget for a single pump.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// Budgets too large to represent as an instant never expire.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now().checked_add(budget),
        }
    }

    pub fn unbounded() -> Self {
        Self { at: None }
    }

    pub fn expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_budget_expires_immediately() {
        assert!(Deadline::after(Duration::ZERO).expired());
    }

    #[test]
    fn huge_budget_never_expires() {
        assert!(!Deadline::after(Duration::MAX).expired());
        assert!(!Deadline::unbounded().expired());
    }
}
