//! Sequential status scan over every barring category
//!
//! The channel is a single ordered pipe, so categories are queried one at a
//! time in [`SCAN_ORDER`]; the next query is only produced once the previous
//! completion has been fed back. Results accumulate in a working copy that
//! replaces the aggregate only when the whole scan succeeds.

use std::fmt;

use cbar_core::{AggregateBarringState, BarringCategory, BarringError, Outcome};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Query order of a scan
pub const SCAN_ORDER: [BarringCategory; 5] = BarringCategory::DIRECTIONAL;

/// Identifies one scan so late completions of a cancelled scan can be dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanId(u64);

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scan-{}", self.0)
    }
}

/// What the coordinator wants next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStep {
    /// Issue this query
    Query {
        scan: ScanId,
        category: BarringCategory,
    },
    /// All categories answered; the new aggregate
    Complete(AggregateBarringState),
    /// Scan stopped on a failed query
    Aborted(BarringError),
    /// Completion did not belong to the running scan
    Ignored,
}

#[derive(Debug)]
struct ActiveScan {
    id: ScanId,
    position: usize,
    working: AggregateBarringState,
}

/// Drives the "query all categories" workflow
#[derive(Debug, Default)]
pub struct ScanCoordinator {
    active: Option<ActiveScan>,
    next_id: u64,
}

impl ScanCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_scanning(&self) -> bool {
        self.active.is_some()
    }

    /// Start a scan from `current`, detaching any scan still running
    pub fn begin(&mut self, current: AggregateBarringState) -> ScanStep {
        if let Some(previous) = self.active.take() {
            debug!(scan = %previous.id, "Detaching previous scan");
        }

        self.next_id += 1;
        let id = ScanId(self.next_id);
        self.active = Some(ActiveScan {
            id,
            position: 0,
            working: current,
        });

        debug!(scan = %id, "Scan started");
        ScanStep::Query {
            scan: id,
            category: SCAN_ORDER[0],
        }
    }

    /// Feed back the completion of a query
    pub fn on_query_complete(
        &mut self,
        scan: ScanId,
        category: BarringCategory,
        outcome: &Outcome,
    ) -> ScanStep {
        let Some(active) = self.active.as_mut() else {
            debug!(%scan, ?category, "No scan running, completion dropped");
            return ScanStep::Ignored;
        };
        if active.id != scan {
            debug!(%scan, current = %active.id, "Completion from a detached scan dropped");
            return ScanStep::Ignored;
        }
        if SCAN_ORDER[active.position] != category {
            warn!(
                %scan,
                ?category,
                expected = ?SCAN_ORDER[active.position],
                "Out-of-order scan completion dropped"
            );
            return ScanStep::Ignored;
        }

        match outcome {
            Outcome::Ok {
                enabled: Some(true),
            } => {
                active.working.activate(category);
            }
            Outcome::Ok {
                enabled: Some(false),
            } => {
                active.working.deactivate(category);
            }
            Outcome::Ok { enabled: None } => {
                return self.abort(category, BarringError::UnexpectedResponse);
            }
            other => {
                let error = other.error().unwrap_or(BarringError::UnexpectedResponse);
                return self.abort(category, error);
            }
        }

        debug!(%scan, ?category, "Category status received");
        active.position += 1;

        if active.position == SCAN_ORDER.len() {
            let working = active.working;
            self.active = None;
            info!(
                %scan,
                outgoing = ?working.outgoing(),
                incoming = ?working.incoming(),
                "Scan complete"
            );
            return ScanStep::Complete(working);
        }

        ScanStep::Query {
            scan,
            category: SCAN_ORDER[active.position],
        }
    }

    /// Detach the running scan; returns whether one was running
    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                info!(scan = %active.id, position = active.position, "Scan cancelled");
                true
            }
            None => false,
        }
    }

    fn abort(&mut self, category: BarringCategory, error: BarringError) -> ScanStep {
        if let Some(active) = self.active.take() {
            warn!(scan = %active.id, ?category, %error, "Scan aborted");
        }
        ScanStep::Aborted(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ok(enabled: bool) -> Outcome {
        Outcome::Ok {
            enabled: Some(enabled),
        }
    }

    /// Run a full scan, answering each category with `answer`
    fn run_scan(
        coordinator: &mut ScanCoordinator,
        start: AggregateBarringState,
        answer: impl Fn(BarringCategory) -> Outcome,
    ) -> (Vec<BarringCategory>, ScanStep) {
        let mut queried = Vec::new();
        let mut step = coordinator.begin(start);
        while let ScanStep::Query { scan, category } = step {
            queried.push(category);
            step = coordinator.on_query_complete(scan, category, &answer(category));
        }
        (queried, step)
    }

    #[test]
    fn test_queries_in_fixed_order() {
        let mut c = ScanCoordinator::new();
        let (queried, step) = run_scan(&mut c, Default::default(), |_| ok(false));
        assert_eq!(queried, SCAN_ORDER.to_vec());
        assert_eq!(step, ScanStep::Complete(AggregateBarringState::default()));
        assert!(!c.is_scanning());
    }

    #[test]
    fn test_single_enabled_category() {
        let mut c = ScanCoordinator::new();
        let (_, step) = run_scan(&mut c, Default::default(), |cat| {
            ok(cat == BarringCategory::OutgoingInternational)
        });
        let ScanStep::Complete(state) = step else {
            panic!("Expected Complete");
        };
        assert_eq!(state.outgoing(), Some(BarringCategory::OutgoingInternational));
        assert_eq!(state.incoming(), None);
    }

    #[test]
    fn test_later_category_wins() {
        let mut c = ScanCoordinator::new();
        let (_, step) = run_scan(&mut c, Default::default(), |cat| {
            ok(matches!(
                cat,
                BarringCategory::OutgoingAllCalls
                    | BarringCategory::OutgoingInternationalExceptHome
                    | BarringCategory::IncomingAll
                    | BarringCategory::IncomingWhenRoaming
            ))
        });
        let ScanStep::Complete(state) = step else {
            panic!("Expected Complete");
        };
        assert_eq!(
            state.outgoing(),
            Some(BarringCategory::OutgoingInternationalExceptHome)
        );
        assert_eq!(state.incoming(), Some(BarringCategory::IncomingWhenRoaming));
    }

    #[test]
    fn test_disabled_clears_previous_value() {
        let mut start = AggregateBarringState::default();
        start.activate(BarringCategory::IncomingAll);
        let mut c = ScanCoordinator::new();
        let (_, step) = run_scan(&mut c, start, |_| ok(false));
        assert_eq!(step, ScanStep::Complete(AggregateBarringState::default()));
    }

    #[test]
    fn test_exception_aborts() {
        let mut c = ScanCoordinator::new();
        let (queried, step) = run_scan(&mut c, Default::default(), |cat| {
            if cat == BarringCategory::OutgoingInternationalExceptHome {
                Outcome::Exception("radio link lost".into())
            } else {
                ok(true)
            }
        });
        assert_eq!(queried.len(), 3);
        assert_eq!(
            step,
            ScanStep::Aborted(BarringError::Exception("radio link lost".into()))
        );
        assert!(!c.is_scanning());
    }

    #[test]
    fn test_status_missing_is_unexpected() {
        let mut c = ScanCoordinator::new();
        let (_, step) = run_scan(&mut c, Default::default(), |_| Outcome::Ok { enabled: None });
        assert_eq!(step, ScanStep::Aborted(BarringError::UnexpectedResponse));
    }

    #[test]
    fn test_cancelled_scan_ignores_late_completion() {
        let mut c = ScanCoordinator::new();
        let ScanStep::Query { scan, category } = c.begin(Default::default()) else {
            panic!("Expected first query");
        };
        assert!(c.cancel());
        assert!(!c.cancel());
        assert_eq!(c.on_query_complete(scan, category, &ok(true)), ScanStep::Ignored);
    }

    #[test]
    fn test_restart_detaches_previous_scan() {
        let mut c = ScanCoordinator::new();
        let ScanStep::Query { scan: first, .. } = c.begin(Default::default()) else {
            panic!("Expected first query");
        };
        let ScanStep::Query { scan: second, category } = c.begin(Default::default()) else {
            panic!("Expected first query");
        };
        assert_ne!(first, second);
        assert_eq!(c.on_query_complete(first, category, &ok(true)), ScanStep::Ignored);
        assert!(matches!(
            c.on_query_complete(second, category, &ok(true)),
            ScanStep::Query { .. }
        ));
    }

    #[test]
    fn test_repeat_scan_is_idempotent() {
        let answer = |cat: BarringCategory| ok(cat == BarringCategory::IncomingWhenRoaming);
        let mut c = ScanCoordinator::new();
        let (_, first) = run_scan(&mut c, Default::default(), answer);
        let ScanStep::Complete(state) = first.clone() else {
            panic!("Expected Complete");
        };
        let (_, second) = run_scan(&mut c, state, answer);
        assert_eq!(first, second);
    }
}
