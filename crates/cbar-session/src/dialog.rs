//! Password entry state machine
//!
//! ```text
//!                       begin_change / cancel / dispatch
//!                                  │
//!                                  ▼
//!   ┌──────────────► CollectingOldPassword ──valid──► CollectingNewPassword ◄─┐
//!   │                                                      │ valid             │ mismatch
//!   │                                                      ▼                   │
//!   │ dispatch ChangePassword ◄──── match ──── ConfirmingNewPassword ──────────┘
//!   │
//!   └── dispatch SetCategory / CancelAll ◄── valid ── CollectingTogglePassword
//!                                                           ▲
//!                                              begin_toggle │
//! ```
//!
//! An invalid entry (length outside `[4, 8]`) re-prompts the same stage.
//! `Idle` is entered only when the session terminates.

use cbar_core::{is_valid_password, BarringError, Password};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Stage of the password dialog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogStage {
    Idle,
    #[default]
    CollectingOldPassword,
    CollectingNewPassword,
    ConfirmingNewPassword,
    CollectingTogglePassword,
}

/// What a single-entry (toggle) dialog was opened for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleIntent {
    ApplySelection,
    CancelAll,
}

/// Operation collected by the dialog, ready for dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordOperation {
    SetCategory { password: Password },
    CancelAll { password: Password },
    ChangePassword { old: Password, new: Password },
}

/// Result of submitting an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordStep {
    /// Entry rejected; the same stage is prompted again with this error
    Reprompt(BarringError),
    /// Moved to the next stage
    Advanced,
    /// Collection finished
    Emit(PasswordOperation),
    /// No dialog was open
    Ignored,
}

/// What the presentation layer should show
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialogView {
    pub stage: DialogStage,
    pub open: bool,
    pub title: String,
    pub message: Option<String>,
    pub error: Option<BarringError>,
}

/// Password dialog state
#[derive(Debug, Clone, Default)]
pub struct PasswordEntry {
    stage: DialogStage,
    intent: Option<ToggleIntent>,
    open: bool,
    old_password: Option<Password>,
    first_password: Option<Password>,
    last_error: Option<BarringError>,
}

impl PasswordEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted fields. Stages that depend on a password buffer
    /// fall back to `CollectingOldPassword`, since buffers are never persisted.
    pub fn restore(
        stage: DialogStage,
        intent: Option<ToggleIntent>,
        open: bool,
        last_error: Option<BarringError>,
    ) -> Self {
        let (stage, intent, open) = match (stage, intent) {
            (DialogStage::CollectingNewPassword | DialogStage::ConfirmingNewPassword, _) => {
                debug!(?stage, "Password buffers not restored, restarting change");
                (DialogStage::CollectingOldPassword, None, open)
            }
            (DialogStage::CollectingTogglePassword, None) => {
                (DialogStage::CollectingOldPassword, None, false)
            }
            (DialogStage::CollectingTogglePassword, Some(i)) => (stage, Some(i), open),
            (DialogStage::Idle, _) => (DialogStage::Idle, None, false),
            (DialogStage::CollectingOldPassword, _) => (stage, None, open),
        };
        Self {
            stage,
            intent,
            open,
            old_password: None,
            first_password: None,
            last_error,
        }
    }

    pub fn stage(&self) -> DialogStage {
        self.stage
    }

    pub fn intent(&self) -> Option<ToggleIntent> {
        self.intent
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn last_error(&self) -> Option<&BarringError> {
        self.last_error.as_ref()
    }

    pub fn has_first_password(&self) -> bool {
        self.first_password.is_some()
    }

    /// Open a single-entry dialog
    pub fn begin_toggle(&mut self, intent: ToggleIntent) {
        self.reset(DialogStage::CollectingTogglePassword);
        self.intent = Some(intent);
        self.open = true;
    }

    /// Open the change-password dialog at its first stage
    pub fn begin_change(&mut self) {
        self.reset(DialogStage::CollectingOldPassword);
        self.open = true;
    }

    /// Dialog dismissed negatively
    pub fn cancel(&mut self) {
        self.reset(DialogStage::CollectingOldPassword);
    }

    /// No more dialogs for this session
    pub fn close(&mut self) {
        self.reset(DialogStage::Idle);
    }

    pub fn submit(&mut self, text: &str) -> PasswordStep {
        if self.stage == DialogStage::Idle || !self.open {
            debug!(stage = ?self.stage, "Password submitted with no dialog open");
            return PasswordStep::Ignored;
        }

        if !is_valid_password(text) {
            return self.reprompt(BarringError::InvalidPassword);
        }
        let entry = Password::new(text);

        match self.stage {
            DialogStage::CollectingOldPassword => {
                self.old_password = Some(entry);
                self.stage = DialogStage::CollectingNewPassword;
                PasswordStep::Advanced
            }
            DialogStage::CollectingNewPassword => {
                self.first_password = Some(entry);
                self.stage = DialogStage::ConfirmingNewPassword;
                PasswordStep::Advanced
            }
            DialogStage::ConfirmingNewPassword => {
                let (Some(old), Some(new)) = (self.old_password.clone(), self.first_password.clone())
                else {
                    warn!("Confirmation without collected passwords, restarting change");
                    self.begin_change();
                    return PasswordStep::Advanced;
                };
                if entry != new {
                    self.first_password = None;
                    self.stage = DialogStage::CollectingNewPassword;
                    return self.reprompt(BarringError::PasswordMismatch);
                }
                self.reset(DialogStage::CollectingOldPassword);
                PasswordStep::Emit(PasswordOperation::ChangePassword { old, new })
            }
            DialogStage::CollectingTogglePassword => {
                let intent = self.intent;
                self.reset(DialogStage::CollectingOldPassword);
                match intent {
                    Some(ToggleIntent::ApplySelection) => {
                        PasswordStep::Emit(PasswordOperation::SetCategory { password: entry })
                    }
                    Some(ToggleIntent::CancelAll) => {
                        PasswordStep::Emit(PasswordOperation::CancelAll { password: entry })
                    }
                    None => {
                        warn!("Toggle dialog without intent");
                        PasswordStep::Ignored
                    }
                }
            }
            DialogStage::Idle => PasswordStep::Ignored,
        }
    }

    /// Present the dialog, consuming any pending error
    pub fn view(&mut self) -> DialogView {
        let (title, prompt) = match self.stage {
            DialogStage::Idle => ("", None),
            DialogStage::CollectingTogglePassword => ("Input password", None),
            DialogStage::CollectingOldPassword => ("Change password", Some("Enter old password")),
            DialogStage::CollectingNewPassword => ("Change password", Some("Enter new password")),
            DialogStage::ConfirmingNewPassword => {
                ("Change password", Some("Confirm new password"))
            }
        };

        let error = self.last_error.take();
        let message = match (&error, prompt) {
            (Some(e), Some(p)) => Some(format!("{}\n{}", e, p)),
            (Some(e), None) => Some(e.to_string()),
            (None, p) => p.map(str::to_string),
        };

        DialogView {
            stage: self.stage,
            open: self.open,
            title: title.to_string(),
            message,
            error,
        }
    }

    fn reprompt(&mut self, error: BarringError) -> PasswordStep {
        debug!(stage = ?self.stage, %error, "Re-prompting password");
        self.last_error = Some(error.clone());
        PasswordStep::Reprompt(error)
    }

    fn reset(&mut self, stage: DialogStage) {
        self.stage = stage;
        self.intent = None;
        self.open = false;
        self.old_password = None;
        self.first_password = None;
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("123", false)]
    #[case("1234", true)]
    #[case("12345678", true)]
    #[case("123456789", false)]
    fn test_length_boundaries(#[case] entry: &str, #[case] accepted: bool) {
        let mut fsm = PasswordEntry::new();
        fsm.begin_toggle(ToggleIntent::ApplySelection);
        let step = fsm.submit(entry);
        if accepted {
            assert!(matches!(
                step,
                PasswordStep::Emit(PasswordOperation::SetCategory { .. })
            ));
        } else {
            assert_eq!(step, PasswordStep::Reprompt(BarringError::InvalidPassword));
            assert_eq!(fsm.stage(), DialogStage::CollectingTogglePassword);
        }
    }

    #[test]
    fn test_invalid_entry_keeps_stage() {
        let mut fsm = PasswordEntry::new();
        fsm.begin_toggle(ToggleIntent::ApplySelection);
        assert_eq!(
            fsm.submit("12"),
            PasswordStep::Reprompt(BarringError::InvalidPassword)
        );
        assert_eq!(fsm.stage(), DialogStage::CollectingTogglePassword);
        assert_eq!(fsm.last_error(), Some(&BarringError::InvalidPassword));
        assert!(fsm.is_open());
    }

    #[test]
    fn test_change_password_flow() {
        let mut fsm = PasswordEntry::new();
        fsm.begin_change();
        assert_eq!(fsm.submit("1111"), PasswordStep::Advanced);
        assert_eq!(fsm.stage(), DialogStage::CollectingNewPassword);
        assert_eq!(fsm.submit("5678"), PasswordStep::Advanced);
        assert_eq!(fsm.stage(), DialogStage::ConfirmingNewPassword);
        assert!(fsm.has_first_password());

        let step = fsm.submit("5678");
        assert_eq!(
            step,
            PasswordStep::Emit(PasswordOperation::ChangePassword {
                old: Password::new("1111"),
                new: Password::new("5678"),
            })
        );
        assert_eq!(fsm.stage(), DialogStage::CollectingOldPassword);
        assert!(!fsm.has_first_password());
        assert!(!fsm.is_open());
    }

    #[test]
    fn test_mismatch_returns_to_new_password() {
        let mut fsm = PasswordEntry::new();
        fsm.begin_change();
        fsm.submit("1111");
        fsm.submit("5678");

        assert_eq!(
            fsm.submit("5679"),
            PasswordStep::Reprompt(BarringError::PasswordMismatch)
        );
        assert_eq!(fsm.stage(), DialogStage::CollectingNewPassword);
        assert!(!fsm.has_first_password());

        // Old password survives the mismatch
        fsm.submit("4321");
        let step = fsm.submit("4321");
        assert_eq!(
            step,
            PasswordStep::Emit(PasswordOperation::ChangePassword {
                old: Password::new("1111"),
                new: Password::new("4321"),
            })
        );
    }

    #[test]
    fn test_cancel_all_intent() {
        let mut fsm = PasswordEntry::new();
        fsm.begin_toggle(ToggleIntent::CancelAll);
        assert_eq!(
            fsm.submit("0000"),
            PasswordStep::Emit(PasswordOperation::CancelAll {
                password: Password::new("0000")
            })
        );
    }

    #[test]
    fn test_cancel_resets() {
        let mut fsm = PasswordEntry::new();
        fsm.begin_change();
        fsm.submit("1111");
        fsm.cancel();
        assert_eq!(fsm.stage(), DialogStage::CollectingOldPassword);
        assert!(!fsm.is_open());
        assert_eq!(fsm.submit("1111"), PasswordStep::Ignored);
    }

    #[test]
    fn test_view_consumes_error() {
        let mut fsm = PasswordEntry::new();
        fsm.begin_change();
        fsm.submit("1");
        let view = fsm.view();
        assert_eq!(view.title, "Change password");
        assert_eq!(
            view.message.as_deref(),
            Some("Invalid password\nEnter old password")
        );
        assert_eq!(view.error, Some(BarringError::InvalidPassword));

        let again = fsm.view();
        assert_eq!(again.message.as_deref(), Some("Enter old password"));
        assert_eq!(again.error, None);
    }

    #[test]
    fn test_restore_falls_back_without_buffers() {
        let fsm = PasswordEntry::restore(DialogStage::ConfirmingNewPassword, None, true, None);
        assert_eq!(fsm.stage(), DialogStage::CollectingOldPassword);
        assert!(fsm.is_open());
        assert!(!fsm.has_first_password());

        let fsm = PasswordEntry::restore(DialogStage::CollectingTogglePassword, None, true, None);
        assert_eq!(fsm.stage(), DialogStage::CollectingOldPassword);
        assert!(!fsm.is_open());
    }
}
