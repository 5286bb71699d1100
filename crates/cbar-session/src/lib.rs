//! cbar-session - Call barring session orchestration
//!
//! The pieces of a session, each usable on its own:
//! - [`coordinator`]: sequential status scan over all categories
//! - [`dialog`]: password entry state machine
//! - [`dispatcher`]: set / cancel-all / change-password operations
//! - [`sync`]: cache freshness and snapshots
//!
//! [`BarringSession`] composes them into a single-threaded state machine and
//! [`spawn_session`] runs it as a tokio task against a
//! [`CommandChannel`](cbar_core::CommandChannel).

pub mod config;
pub mod coordinator;
pub mod dialog;
pub mod dispatcher;
pub mod events;
pub mod runtime;
pub mod session;
pub mod sync;

pub use config::SessionConfig;
pub use coordinator::{ScanCoordinator, ScanId, ScanStep, SCAN_ORDER};
pub use dialog::{DialogStage, DialogView, PasswordEntry, ToggleIntent};
pub use dispatcher::{Completion, Operation, OperationDispatcher};
pub use events::{Effect, Reply, SessionCommand, SessionEvent, SessionUpdate};
pub use runtime::{spawn_session, SessionClosed, SessionHandle};
pub use session::BarringSession;
pub use sync::{Activation, SessionSnapshot, SnapshotError, StateSync};
