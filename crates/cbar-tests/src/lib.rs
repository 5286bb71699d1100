//! End-to-end tests for call barring sessions
//!
//! Sessions are spawned with `spawn_session` over a [`MockChannel`], so the
//! whole stack runs: sequencer, state machine, classifier and channel.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cbar-tests
//! ```
//!
//! # Test Structure
//!
//! - `scan_e2e.rs` - status scans, caching, cancellation, timeouts
//! - `operations_e2e.rs` - password dialogs and set / cancel-all / change-password

use std::sync::Arc;
use std::time::Duration;

use cbar_core::{AggregateBarringState, BarringError, CommandChannel};
use cbar_ril::{MockChannel, MockConfig};
use cbar_session::{
    spawn_session, DialogView, SessionConfig, SessionHandle, SessionSnapshot, SessionUpdate,
};
use tokio::sync::mpsc::UnboundedReceiver;

/// How long to wait for a single update before failing the test
const UPDATE_TIMEOUT: Duration = Duration::from_secs(5);

/// A spawned session wired to a mock network
pub struct TestHarness {
    pub channel: Arc<MockChannel>,
    pub handle: SessionHandle,
    updates: UnboundedReceiver<SessionUpdate>,
    /// Every update received so far
    pub seen: Vec<SessionUpdate>,
}

impl TestHarness {
    pub fn new(mock: MockConfig) -> Self {
        Self::with_options(mock, SessionConfig::default(), None)
    }

    pub fn with_options(
        mock: MockConfig,
        session: SessionConfig,
        snapshot: Option<SessionSnapshot>,
    ) -> Self {
        let channel = Arc::new(MockChannel::new(&mock).expect("valid mock config"));
        let (handle, updates) = spawn_session(
            Arc::clone(&channel) as Arc<dyn CommandChannel>,
            session,
            snapshot,
        );
        Self {
            channel,
            handle,
            updates,
            seen: Vec::new(),
        }
    }

    /// Mock network with the given facility codes active
    pub fn with_active(codes: &[&str]) -> Self {
        Self::new(MockConfig {
            active: codes.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        })
    }

    pub async fn next_update(&mut self) -> SessionUpdate {
        let update = tokio::time::timeout(UPDATE_TIMEOUT, self.updates.recv())
            .await
            .expect("timed out waiting for a session update")
            .expect("session stopped");
        self.seen.push(update.clone());
        update
    }

    /// Skip updates until one matches
    pub async fn wait_for(&mut self, pred: impl Fn(&SessionUpdate) -> bool) -> SessionUpdate {
        loop {
            let update = self.next_update().await;
            if pred(&update) {
                return update;
            }
        }
    }

    /// Wait for the next published aggregate, failing on errors
    pub async fn wait_for_aggregate(&mut self) -> AggregateBarringState {
        match self
            .wait_for(|u| {
                matches!(
                    u,
                    SessionUpdate::AggregateChanged { .. }
                        | SessionUpdate::OperationResult { success: false, .. }
                        | SessionUpdate::Terminated { .. }
                )
            })
            .await
        {
            SessionUpdate::AggregateChanged { state } => state,
            other => panic!("Expected aggregate, got {:?}", other),
        }
    }

    /// Wait for an operation result or termination
    pub async fn wait_for_result(&mut self) -> Result<(), BarringError> {
        match self
            .wait_for(|u| {
                matches!(
                    u,
                    SessionUpdate::OperationResult { .. } | SessionUpdate::Terminated { .. }
                )
            })
            .await
        {
            SessionUpdate::OperationResult { success: true, .. } => Ok(()),
            SessionUpdate::OperationResult {
                message: Some(error),
                ..
            } => Err(error),
            SessionUpdate::Terminated { reason } => Err(reason),
            other => panic!("Unexpected result {:?}", other),
        }
    }

    pub async fn wait_for_dialog(&mut self) -> DialogView {
        match self
            .wait_for(|u| matches!(u, SessionUpdate::DialogChanged { .. }))
            .await
        {
            SessionUpdate::DialogChanged { dialog } => dialog,
            other => panic!("Expected dialog, got {:?}", other),
        }
    }

    /// Start the session and wait for the first aggregate
    pub async fn start(&mut self) -> AggregateBarringState {
        self.handle.start().expect("session running");
        self.wait_for_aggregate().await
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.handle.snapshot().await.expect("session running")
    }

    /// Updates already queued, without waiting
    pub fn drain(&mut self) -> Vec<SessionUpdate> {
        let mut drained = Vec::new();
        while let Ok(update) = self.updates.try_recv() {
            self.seen.push(update.clone());
            drained.push(update);
        }
        drained
    }

    /// Number of user-visible notifications received so far
    pub fn notifications(&self) -> usize {
        self.seen.iter().filter(|u| u.is_notification()).count()
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        let _ = self.handle.shutdown();
    }
}
