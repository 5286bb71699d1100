//! Events consumed and effects produced by the session state machine

use cbar_core::{
    AggregateBarringState, BarringCategory, BarringError, ChannelRequest, Direction, Outcome,
    Password,
};
use serde::Serialize;

use crate::coordinator::ScanId;
use crate::dialog::DialogView;

/// Inbound request from the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// First display of the session
    Start { radio_available: bool },
    /// Drop the cache and re-activate
    Refresh { radio_available: bool },
    SelectCategory {
        direction: Direction,
        target: BarringCategory,
        desired_enabled: bool,
    },
    SubmitPassword(Password),
    CancelDialog,
    RequestCancelAll,
    RequestChangePassword,
    /// Detach a running scan
    CancelScan,
}

/// Everything the session reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Command(SessionCommand),
    QueryCompleted {
        scan: ScanId,
        category: BarringCategory,
        outcome: Outcome,
    },
    OperationCompleted {
        outcome: Outcome,
    },
}

impl From<SessionCommand> for SessionEvent {
    fn from(command: SessionCommand) -> Self {
        SessionEvent::Command(command)
    }
}

/// Where the completion of an issued request is routed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Query {
        scan: ScanId,
        category: BarringCategory,
    },
    Operation,
}

impl Reply {
    /// Wrap a classified channel result into the matching event
    pub fn into_event(self, outcome: Outcome) -> SessionEvent {
        match self {
            Reply::Query { scan, category } => SessionEvent::QueryCompleted {
                scan,
                category,
                outcome,
            },
            Reply::Operation => SessionEvent::OperationCompleted { outcome },
        }
    }
}

/// Side effect requested by the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Tell the presentation layer
    Notify(SessionUpdate),
    /// Send a request over the command channel
    Issue {
        request: ChannelRequest,
        reply: Reply,
    },
}

/// Outbound notification to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionUpdate {
    AggregateChanged {
        state: AggregateBarringState,
    },
    DialogChanged {
        dialog: DialogView,
    },
    BusyChanged {
        busy: bool,
    },
    OperationResult {
        success: bool,
        message: Option<BarringError>,
    },
    /// Non-recoverable; the presentation layer should close the session
    Terminated {
        reason: BarringError,
    },
}

impl SessionUpdate {
    pub fn failure(error: BarringError) -> Self {
        SessionUpdate::OperationResult {
            success: false,
            message: Some(error),
        }
    }

    pub fn success() -> Self {
        SessionUpdate::OperationResult {
            success: true,
            message: None,
        }
    }

    /// Whether this is a user-visible notification rather than a state refresh
    pub fn is_notification(&self) -> bool {
        matches!(
            self,
            SessionUpdate::OperationResult { .. } | SessionUpdate::Terminated { .. }
        ) || matches!(self, SessionUpdate::DialogChanged { dialog } if dialog.error.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_serializes_tagged() {
        let json = serde_json::to_value(SessionUpdate::failure(BarringError::NothingToCancel))
            .unwrap();
        assert_eq!(json["event"], "operation_result");
        assert_eq!(json["success"], false);
        assert_eq!(json["message"]["kind"], "nothing_to_cancel");
    }

    #[test]
    fn test_reply_routes_completion() {
        let event = Reply::Operation.into_event(Outcome::RadioOff);
        assert_eq!(
            event,
            SessionEvent::OperationCompleted {
                outcome: Outcome::RadioOff
            }
        );
    }
}
