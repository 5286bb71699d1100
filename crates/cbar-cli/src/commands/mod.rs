//! Command implementations for cbar-cli
//!
//! Every command drives a spawned session the way a settings screen would:
//! activate it, wait for the barring state, then walk the password dialog.

pub mod cancel_all;
pub mod change_password;
pub mod query;
pub mod set;

pub use cancel_all::cancel_all;
pub use change_password::change_password;
pub use query::query;
pub use set::set;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use cbar_core::{AggregateBarringState, BarringError, CommandChannel};
use cbar_session::{
    spawn_session, DialogView, SessionConfig, SessionHandle, SessionSnapshot, SessionUpdate,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

/// What the session answered after an operation was submitted
#[derive(Debug)]
pub enum Reply {
    Done {
        success: bool,
        message: Option<BarringError>,
        state: Option<AggregateBarringState>,
    },
    /// The dialog moved on and wants another entry
    Prompt(DialogView),
}

/// A running session plus its update stream
pub struct Driver {
    handle: SessionHandle,
    updates: UnboundedReceiver<SessionUpdate>,
    state_file: Option<PathBuf>,
}

impl Driver {
    /// Spawn a session, resuming from `state_file` when it exists
    pub fn spawn(
        channel: Arc<dyn CommandChannel>,
        config: SessionConfig,
        state_file: Option<PathBuf>,
    ) -> Result<Self> {
        let snapshot = match &state_file {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read state file: {}", path.display()))?;
                let snapshot = SessionSnapshot::from_json(&content)
                    .with_context(|| format!("Failed to parse state file: {}", path.display()))?;
                debug!(path = %path.display(), "Resuming session");
                Some(snapshot)
            }
            _ => None,
        };

        let (handle, updates) = spawn_session(channel, config, snapshot);
        Ok(Self {
            handle,
            updates,
            state_file,
        })
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Activate the session and wait for the barring state
    pub async fn activate(&mut self, refresh: bool) -> Result<AggregateBarringState> {
        if refresh {
            self.handle.refresh()?;
        } else {
            self.handle.start()?;
        }

        loop {
            match self.next().await? {
                SessionUpdate::AggregateChanged { state } => return Ok(state),
                SessionUpdate::OperationResult {
                    message: Some(error),
                    ..
                } => bail!("Failed to query call barring: {}", error),
                SessionUpdate::Terminated { reason } => bail!("Session ended: {}", reason),
                _ => {}
            }
        }
    }

    /// Wait for the session to settle after a command
    pub async fn reply(&mut self) -> Result<Reply> {
        let mut state = None;
        loop {
            match self.next().await? {
                SessionUpdate::AggregateChanged { state: s } => state = Some(s),
                SessionUpdate::DialogChanged { dialog } if dialog.open => {
                    return Ok(Reply::Prompt(dialog));
                }
                SessionUpdate::DialogChanged { .. } | SessionUpdate::BusyChanged { .. } => {}
                SessionUpdate::OperationResult { success, message } => {
                    return Ok(Reply::Done {
                        success,
                        message,
                        state,
                    });
                }
                SessionUpdate::Terminated { reason } => {
                    return Ok(Reply::Done {
                        success: false,
                        message: Some(reason),
                        state,
                    });
                }
            }
        }
    }

    /// Persist the session (when a state file is configured) and stop it
    pub async fn finish(self) -> Result<()> {
        if let Some(path) = &self.state_file {
            let snapshot = self.handle.snapshot().await?;
            let json = snapshot.to_json()?;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write state file: {}", path.display()))?;
            debug!(path = %path.display(), "Session state saved");
        }
        self.handle.shutdown()?;
        Ok(())
    }

    async fn next(&mut self) -> Result<SessionUpdate> {
        let update = self
            .updates
            .recv()
            .await
            .context("Session stopped unexpectedly")?;
        debug!(?update, "Session update");
        Ok(update)
    }
}

/// Submit a password and expect the dialog to finish
///
/// A re-prompt means the entry was rejected locally; the dialog is dismissed
/// and the rejection reported.
pub async fn submit_final(driver: &mut Driver, password: &str) -> Result<Reply> {
    driver.handle().submit_password(password)?;
    match driver.reply().await? {
        Reply::Prompt(dialog) => {
            driver.handle().cancel_dialog()?;
            let reason = dialog
                .error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "password not accepted".to_string());
            bail!("{}", reason)
        }
        done => Ok(done),
    }
}

/// Submit a password and expect the dialog to advance to another prompt
pub async fn submit_step(driver: &mut Driver, password: &str) -> Result<DialogView> {
    driver.handle().submit_password(password)?;
    match driver.reply().await? {
        Reply::Prompt(dialog) => {
            if let Some(error) = dialog.error {
                driver.handle().cancel_dialog()?;
                bail!("{}", error);
            }
            Ok(dialog)
        }
        Reply::Done { message, .. } => bail!(
            "Dialog closed unexpectedly: {}",
            message.map(|e| e.to_string()).unwrap_or_default()
        ),
    }
}
