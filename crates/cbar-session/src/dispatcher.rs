//! Issues set / cancel-all / change-password commands and applies results

use cbar_core::{
    AggregateBarringState, BarringCategory, BarringError, BarringResult, ChannelRequest, Outcome,
    Password, PendingSelection,
};
use tracing::{info, warn};

/// Operation currently in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SetCategory {
        target: BarringCategory,
        enable: bool,
    },
    CancelAll,
    ChangePassword,
}

/// Result of a finished operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub operation: Operation,
    pub result: BarringResult<()>,
    /// The aggregate was modified
    pub aggregate_changed: bool,
    /// The failure cannot be recovered within this session
    pub terminal: bool,
}

/// Holds the busy marker; at most one operation is in flight
#[derive(Debug, Default)]
pub struct OperationDispatcher {
    in_flight: Option<Operation>,
}

impl OperationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<Operation> {
        self.in_flight
    }

    /// Activate or deactivate a single category
    pub fn set_category(
        &mut self,
        target: BarringCategory,
        enable: bool,
        password: Password,
    ) -> BarringResult<ChannelRequest> {
        self.ensure_idle()?;
        if target.direction().is_none() {
            return Err(BarringError::InvalidSelection(format!(
                "{} cannot be set directly",
                target
            )));
        }

        self.in_flight = Some(Operation::SetCategory { target, enable });
        info!(category = ?target, enable, "Setting barring category");
        Ok(ChannelRequest::Set {
            category: target,
            enable,
            password,
        })
    }

    /// Deactivate every barring category
    pub fn cancel_all(
        &mut self,
        aggregate: &AggregateBarringState,
        password: Password,
    ) -> BarringResult<ChannelRequest> {
        self.ensure_idle()?;
        if aggregate.is_clear() {
            return Err(BarringError::NothingToCancel);
        }

        self.in_flight = Some(Operation::CancelAll);
        info!("Cancelling all barring");
        Ok(ChannelRequest::Set {
            category: BarringCategory::AllBarring,
            enable: false,
            password,
        })
    }

    /// Change the barring password
    pub fn change_password(&mut self, old: Password, new: Password) -> BarringResult<ChannelRequest> {
        self.ensure_idle()?;

        self.in_flight = Some(Operation::ChangePassword);
        info!("Changing barring password");
        Ok(ChannelRequest::ChangePassword {
            category: BarringCategory::AllBarring,
            old,
            new,
        })
    }

    /// Apply the outcome of the in-flight operation and clear the busy marker
    pub fn complete(
        &mut self,
        outcome: &Outcome,
        aggregate: &mut AggregateBarringState,
        pending: &mut Option<PendingSelection>,
    ) -> Option<Completion> {
        let Some(operation) = self.in_flight.take() else {
            warn!(?outcome, "Operation completion with nothing in flight");
            return None;
        };

        let error = outcome.error();
        let mut completion = Completion {
            operation,
            result: error.clone().map_or(Ok(()), Err),
            aggregate_changed: false,
            terminal: false,
        };

        match operation {
            Operation::SetCategory { target, enable } => {
                *pending = None;
                if error.is_none() {
                    if enable {
                        aggregate.activate(target);
                    } else {
                        aggregate.deactivate(target);
                    }
                    completion.aggregate_changed = true;
                }
            }
            Operation::CancelAll => {
                if error.is_none() {
                    aggregate.clear();
                    completion.aggregate_changed = true;
                } else {
                    completion.terminal = true;
                }
            }
            Operation::ChangePassword => {}
        }

        match &completion.result {
            Ok(()) => info!(?operation, "Operation succeeded"),
            Err(e) => warn!(?operation, error = %e, "Operation failed"),
        }
        Some(completion)
    }

    fn ensure_idle(&self) -> BarringResult<()> {
        if let Some(op) = self.in_flight {
            warn!(in_flight = ?op, "Operation rejected, dispatcher busy");
            return Err(BarringError::Busy);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cbar_core::Direction;
    use pretty_assertions::assert_eq;

    fn ok() -> Outcome {
        Outcome::Ok { enabled: None }
    }

    #[test]
    fn test_set_category_success() {
        let mut d = OperationDispatcher::new();
        let mut aggregate = AggregateBarringState::default();
        let mut pending = Some(
            PendingSelection::new(Direction::Incoming, BarringCategory::IncomingAll, true).unwrap(),
        );

        let req = d
            .set_category(BarringCategory::IncomingAll, true, Password::new("1234"))
            .unwrap();
        assert_eq!(req.category(), BarringCategory::IncomingAll);
        assert!(d.is_busy());

        let c = d.complete(&ok(), &mut aggregate, &mut pending).unwrap();
        assert_eq!(c.result, Ok(()));
        assert!(c.aggregate_changed);
        assert_eq!(aggregate.incoming(), Some(BarringCategory::IncomingAll));
        assert_eq!(pending, None);
        assert!(!d.is_busy());
    }

    #[test]
    fn test_set_category_failure_leaves_aggregate() {
        let mut d = OperationDispatcher::new();
        let mut aggregate = AggregateBarringState::default();
        aggregate.activate(BarringCategory::OutgoingAllCalls);
        let mut pending = Some(
            PendingSelection::new(Direction::Outgoing, BarringCategory::OutgoingAllCalls, false)
                .unwrap(),
        );

        d.set_category(BarringCategory::OutgoingAllCalls, false, Password::new("1234"))
            .unwrap();
        let c = d
            .complete(&Outcome::Exception("denied".into()), &mut aggregate, &mut pending)
            .unwrap();
        assert_eq!(c.result, Err(BarringError::Exception("denied".into())));
        assert!(!c.terminal);
        assert_eq!(aggregate.outgoing(), Some(BarringCategory::OutgoingAllCalls));
        assert_eq!(pending, None);
        assert!(!d.is_busy());
    }

    #[test]
    fn test_cancel_all_requires_active_barring() {
        let mut d = OperationDispatcher::new();
        let aggregate = AggregateBarringState::default();
        assert_eq!(
            d.cancel_all(&aggregate, Password::new("1234")),
            Err(BarringError::NothingToCancel)
        );
        assert!(!d.is_busy());
    }

    #[test]
    fn test_cancel_all_outcomes() {
        let mut d = OperationDispatcher::new();
        let mut aggregate = AggregateBarringState::default();
        aggregate.activate(BarringCategory::OutgoingInternational);
        aggregate.activate(BarringCategory::IncomingAll);
        let mut pending = None;

        d.cancel_all(&aggregate, Password::new("1234")).unwrap();
        let c = d
            .complete(&Outcome::UnexpectedResponse, &mut aggregate, &mut pending)
            .unwrap();
        assert!(c.terminal);
        assert!(!aggregate.is_clear());

        d.cancel_all(&aggregate, Password::new("1234")).unwrap();
        let c = d.complete(&ok(), &mut aggregate, &mut pending).unwrap();
        assert_eq!(c.result, Ok(()));
        assert!(aggregate.is_clear());
    }

    #[test]
    fn test_change_password_does_not_touch_aggregate() {
        let mut d = OperationDispatcher::new();
        let mut aggregate = AggregateBarringState::default();
        aggregate.activate(BarringCategory::IncomingAll);
        let mut pending = None;

        let req = d
            .change_password(Password::new("1111"), Password::new("2222"))
            .unwrap();
        assert_eq!(req.category(), BarringCategory::AllBarring);
        let c = d
            .complete(&Outcome::Exception("x".into()), &mut aggregate, &mut pending)
            .unwrap();
        assert_eq!(c.operation, Operation::ChangePassword);
        assert!(!c.aggregate_changed);
        assert!(!c.terminal);
        assert_eq!(aggregate.incoming(), Some(BarringCategory::IncomingAll));
    }

    #[test]
    fn test_busy_rejects_second_operation() {
        let mut d = OperationDispatcher::new();
        d.change_password(Password::new("1111"), Password::new("2222"))
            .unwrap();
        assert_eq!(
            d.set_category(BarringCategory::IncomingAll, true, Password::new("1111")),
            Err(BarringError::Busy)
        );
    }

    #[test]
    fn test_completion_without_operation() {
        let mut d = OperationDispatcher::new();
        let mut aggregate = AggregateBarringState::default();
        assert!(d.complete(&ok(), &mut aggregate, &mut None).is_none());
    }
}
