//! Debounced search session.
//!
//! Input is only dispatched once it has been quiet for `SEARCH_DEBOUNCE`.
//! Requests are never cancelled. Each dispatch carries a generation number and
//! a completion is applied only if it still belongs to the latest generation.

use std::time::{Duration, Instant};

use crate::error::ApiResult;
use crate::models::SearchCandidate;
use crate::scoring::RankedCandidate;

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// A query handed to the API, tagged with the generation it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub generation: u64,
    pub query: String,
}

#[derive(Debug, Clone)]
pub enum SearchState {
    /// Nothing to show (blank input, or a selection was just made)
    Idle,
    /// Latest results, possibly empty
    Results(Vec<RankedCandidate>),
    /// The last search failed; `query` is kept for a retry
    Failed { query: String, message: String },
}

/// What happened to a completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Failed,
    /// Superseded by a newer dispatch or selection; result dropped
    Stale,
}

#[derive(Debug)]
pub struct SearchSession {
    quiet_period: Duration,
    input: String,
    changed_at: Option<Instant>,
    generation: u64,
    selected_name: Option<String>,
    state: SearchState,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

impl SearchSession {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            input: String::new(),
            changed_at: None,
            generation: 0,
            selected_name: None,
            state: SearchState::Idle,
        }
    }

    /// Record an input change. Restarts the quiet period.
    pub fn input(&mut self, text: &str, now: Instant) {
        self.input = text.to_string();
        self.changed_at = Some(now);
    }

    /// When the pending input becomes due, if any input is pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.changed_at.map(|at| at + self.quiet_period)
    }

    /// Dispatch the pending input if it has been quiet long enough.
    ///
    /// Blank input clears the results instead of dispatching. Input equal to
    /// the selected item's name needs no search.
    pub fn poll(&mut self, now: Instant) -> Option<Dispatch> {
        let due = self.deadline()?;
        if now < due {
            return None;
        }
        self.changed_at = None;

        let query = self.input.trim();
        if query.is_empty() {
            self.state = SearchState::Idle;
            return None;
        }
        if self.is_selected(query) {
            return None;
        }

        self.generation += 1;
        Some(Dispatch {
            generation: self.generation,
            query: query.to_string(),
        })
    }

    /// Apply a finished request unless it has gone stale.
    pub fn complete(
        &mut self,
        dispatch: &Dispatch,
        outcome: ApiResult<Vec<RankedCandidate>>,
    ) -> Completion {
        if dispatch.generation != self.generation || self.is_selected(&dispatch.query) {
            return Completion::Stale;
        }
        match outcome {
            Ok(results) => {
                self.state = SearchState::Results(results);
                Completion::Applied
            }
            Err(e) => {
                self.state = SearchState::Failed {
                    query: dispatch.query.clone(),
                    message: e.to_string(),
                };
                Completion::Failed
            }
        }
    }

    /// Select a candidate. Results are cleared right away, and anything still
    /// in flight is invalidated.
    pub fn select(&mut self, candidate: &SearchCandidate) {
        self.state = SearchState::Idle;
        self.selected_name = Some(candidate.name.clone());
        self.input = candidate.name.clone();
        self.changed_at = None;
        self.generation += 1;
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn results(&self) -> &[RankedCandidate] {
        match &self.state {
            SearchState::Results(r) => r.as_slice(),
            _ => &[],
        }
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.selected_name.as_deref()
    }

    fn is_selected(&self, query: &str) -> bool {
        self.selected_name.as_deref() == Some(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::scoring::rank_candidates;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn results(name: &str) -> Vec<RankedCandidate> {
        rank_candidates(vec![SearchCandidate::artist("id", name, Some(10), None)], name)
    }

    #[test]
    fn test_waits_for_quiet_period() {
        let t0 = Instant::now();
        let mut s = SearchSession::default();
        s.input("radio", t0);
        assert_eq!(s.poll(t0 + ms(299)), None);

        // Another keystroke restarts the timer
        s.input("radiohead", t0 + ms(200));
        assert_eq!(s.poll(t0 + ms(400)), None);
        let d = s.poll(t0 + ms(500)).unwrap();
        assert_eq!(d.query, "radiohead");
        // Nothing pending afterwards
        assert_eq!(s.poll(t0 + ms(2000)), None);
    }

    #[test]
    fn test_blank_input_clears_without_dispatch() {
        let t0 = Instant::now();
        let mut s = SearchSession::default();
        s.input("queen", t0);
        let d = s.poll(t0 + ms(300)).unwrap();
        assert_eq!(s.complete(&d, Ok(results("Queen"))), Completion::Applied);
        assert_eq!(s.results().len(), 1);

        s.input("   ", t0 + ms(400));
        assert_eq!(s.poll(t0 + ms(700)), None);
        assert!(s.results().is_empty());
        assert!(matches!(s.state(), SearchState::Idle));
    }

    #[test]
    fn test_stale_completion_dropped() {
        let t0 = Instant::now();
        let mut s = SearchSession::default();
        s.input("rad", t0);
        let old = s.poll(t0 + ms(300)).unwrap();
        s.input("radiohead", t0 + ms(350));
        let new = s.poll(t0 + ms(650)).unwrap();
        assert!(new.generation > old.generation);

        assert_eq!(s.complete(&new, Ok(results("Radiohead"))), Completion::Applied);
        // The older request lands last and must not replace newer results
        assert_eq!(s.complete(&old, Ok(results("Radar"))), Completion::Stale);
        assert_eq!(s.results()[0].candidate.name, "Radiohead");
    }

    #[test]
    fn test_failure_keeps_query() {
        let t0 = Instant::now();
        let mut s = SearchSession::default();
        s.input("radiohead", t0);
        let d = s.poll(t0 + ms(300)).unwrap();
        assert_eq!(s.complete(&d, Err(ApiError::Unauthorized)), Completion::Failed);
        match s.state() {
            SearchState::Failed { query, .. } => assert_eq!(query, "radiohead"),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_selection_clears_and_suppresses() {
        let t0 = Instant::now();
        let mut s = SearchSession::default();
        s.input("radiohead", t0);
        let d = s.poll(t0 + ms(300)).unwrap();
        s.complete(&d, Ok(results("Radiohead")));
        let picked = s.results()[0].candidate.clone();

        s.input("radioh", t0 + ms(400));
        let in_flight = s.poll(t0 + ms(700)).unwrap();
        s.select(&picked);
        assert!(s.results().is_empty());
        assert_eq!(s.selected_name(), Some("Radiohead"));

        // In-flight request from before the selection is dropped
        assert_eq!(s.complete(&in_flight, Ok(results("Radioh"))), Completion::Stale);
        assert!(s.results().is_empty());

        // Re-entering the selected name does not search
        s.input("Radiohead", t0 + ms(800));
        assert_eq!(s.poll(t0 + ms(1100)), None);

        // Anything else does
        s.input("Portishead", t0 + ms(1200));
        assert!(s.poll(t0 + ms(1500)).is_some());
    }
}
