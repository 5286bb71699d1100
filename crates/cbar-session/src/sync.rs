//! Session state persistence and activation
//!
//! A full scan costs five serialized round trips, so a fresh aggregate is
//! republished from cache on re-activation instead of re-scanning.
//! Snapshots never contain password buffers.

use cbar_core::{AggregateBarringState, BarringError, PendingSelection};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::dialog::{DialogStage, PasswordEntry, ToggleIntent};

/// Snapshot encoding errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Invalid session snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serializable session state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub aggregate: AggregateBarringState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingSelection>,
    pub dialog_stage: DialogStage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toggle_intent: Option<ToggleIntent>,
    #[serde(default)]
    pub dialog_open: bool,
    pub stale: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<BarringError>,
    pub saved_at: DateTime<Utc>,
}

impl SessionSnapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(s)?)
    }
}

/// What activation decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Radio unavailable; the session cannot continue
    RadioOff,
    /// Cached state is stale; run a scan
    Scan,
    /// Cached state is fresh; publish it as-is
    Republish(AggregateBarringState),
}

/// Cached aggregate plus its freshness
#[derive(Debug, Clone)]
pub struct StateSync {
    aggregate: AggregateBarringState,
    stale: bool,
}

impl Default for StateSync {
    fn default() -> Self {
        Self {
            aggregate: AggregateBarringState::default(),
            stale: true,
        }
    }
}

impl StateSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aggregate(&self) -> AggregateBarringState {
        self.aggregate
    }

    pub fn aggregate_mut(&mut self) -> &mut AggregateBarringState {
        &mut self.aggregate
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Store the result of a completed scan
    pub fn mark_fresh(&mut self, aggregate: AggregateBarringState) {
        self.aggregate = aggregate;
        self.stale = false;
    }

    /// Force the next activation to scan
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn on_activate(&self, radio_available: bool) -> Activation {
        if !radio_available {
            warn!("Radio unavailable, not querying barring status");
            return Activation::RadioOff;
        }
        if self.stale {
            debug!("Barring state stale, scanning");
            Activation::Scan
        } else {
            debug!("Republishing cached barring state");
            Activation::Republish(self.aggregate)
        }
    }

    pub fn snapshot(
        &self,
        pending: Option<PendingSelection>,
        dialog: &PasswordEntry,
    ) -> SessionSnapshot {
        SessionSnapshot {
            aggregate: self.aggregate,
            pending,
            dialog_stage: dialog.stage(),
            toggle_intent: dialog.intent(),
            dialog_open: dialog.is_open(),
            stale: self.stale,
            last_error: dialog.last_error().cloned(),
            saved_at: Utc::now(),
        }
    }

    /// Rebuild session state from a snapshot
    ///
    /// A pending selection only survives when the restored dialog is still
    /// collecting the password for it.
    pub fn restore(snapshot: SessionSnapshot) -> (Self, Option<PendingSelection>, PasswordEntry) {
        let dialog = PasswordEntry::restore(
            snapshot.dialog_stage,
            snapshot.toggle_intent,
            snapshot.dialog_open,
            snapshot.last_error,
        );

        let pending = match (snapshot.pending, dialog.intent()) {
            (Some(p), Some(ToggleIntent::ApplySelection)) => Some(p),
            (Some(p), _) => {
                debug!(?p, "Dropping pending selection without an open dialog");
                None
            }
            (None, _) => None,
        };
        let dialog = if pending.is_none() && dialog.intent() == Some(ToggleIntent::ApplySelection)
        {
            PasswordEntry::new()
        } else {
            dialog
        };

        info!(
            stale = snapshot.stale,
            saved_at = %snapshot.saved_at,
            "Session state restored"
        );
        (
            Self {
                aggregate: snapshot.aggregate,
                stale: snapshot.stale,
            },
            pending,
            dialog,
        )
    }
}
