//! The barring session state machine
//!
//! [`BarringSession`] owns every piece of per-session state and is driven by
//! one event at a time. It never performs I/O: channel requests and
//! presentation updates come back as [`Effect`]s for the runtime to carry out.
//!
//! At most one channel request is outstanding. A request produced while an
//! earlier one (for example a query from a cancelled scan) has not yet
//! completed is held back and issued when the channel frees up.

use std::collections::VecDeque;

use cbar_core::{
    AggregateBarringState, BarringCategory, BarringError, ChannelRequest, Direction, Outcome,
    PendingSelection,
};
use tracing::{debug, info, warn};

use crate::coordinator::{ScanCoordinator, ScanStep};
use crate::dialog::{DialogStage, PasswordEntry, PasswordOperation, PasswordStep, ToggleIntent};
use crate::dispatcher::OperationDispatcher;
use crate::events::{Effect, Reply, SessionCommand, SessionEvent, SessionUpdate};
use crate::sync::{Activation, SessionSnapshot, StateSync};

#[derive(Debug, Default)]
pub struct BarringSession {
    sync: StateSync,
    coordinator: ScanCoordinator,
    dialog: PasswordEntry,
    dispatcher: OperationDispatcher,
    pending: Option<PendingSelection>,
    channel_busy: bool,
    deferred: VecDeque<(ChannelRequest, Reply)>,
    terminated: bool,
}

impl BarringSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume a session from a snapshot
    pub fn from_snapshot(snapshot: SessionSnapshot) -> Self {
        let (sync, pending, dialog) = StateSync::restore(snapshot);
        Self {
            sync,
            dialog,
            pending,
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.sync.snapshot(self.pending, &self.dialog)
    }

    pub fn aggregate(&self) -> AggregateBarringState {
        self.sync.aggregate()
    }

    pub fn is_stale(&self) -> bool {
        self.sync.is_stale()
    }

    pub fn pending(&self) -> Option<PendingSelection> {
        self.pending
    }

    pub fn dialog_stage(&self) -> DialogStage {
        self.dialog.stage()
    }

    pub fn is_dialog_open(&self) -> bool {
        self.dialog.is_open()
    }

    /// Busy marker: a scan or an operation is in flight
    pub fn is_busy(&self) -> bool {
        self.coordinator.is_scanning() || self.dispatcher.is_busy()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn handle(&mut self, event: SessionEvent) -> Vec<Effect> {
        if self.terminated {
            debug!(?event, "Session terminated, event ignored");
            return Vec::new();
        }

        let was_busy = self.is_busy();
        let mut effects = match event {
            SessionEvent::Command(command) => self.on_command(command),
            SessionEvent::QueryCompleted {
                scan,
                category,
                outcome,
            } => {
                let mut effects = self.release_channel();
                let step = self.coordinator.on_query_complete(scan, category, &outcome);
                effects.extend(self.apply_scan_step(step));
                effects
            }
            SessionEvent::OperationCompleted { outcome } => {
                let mut effects = self.release_channel();
                effects.extend(self.on_operation_completed(&outcome));
                effects
            }
        };

        let busy = self.is_busy();
        if busy != was_busy {
            effects.insert(0, Effect::Notify(SessionUpdate::BusyChanged { busy }));
        }
        effects
    }

    fn on_command(&mut self, command: SessionCommand) -> Vec<Effect> {
        match command {
            SessionCommand::Start { radio_available } => self.activate(radio_available),
            SessionCommand::Refresh { radio_available } => {
                if self.is_busy() {
                    return self.reject_busy("refresh");
                }
                self.sync.invalidate();
                self.activate(radio_available)
            }
            SessionCommand::SelectCategory {
                direction,
                target,
                desired_enabled,
            } => self.select_category(direction, target, desired_enabled),
            SessionCommand::SubmitPassword(password) => {
                if self.is_busy() {
                    return self.reject_busy("submit password");
                }
                let step = self.dialog.submit(password.expose());
                self.on_password_step(step)
            }
            SessionCommand::CancelDialog => {
                debug!(stage = ?self.dialog.stage(), "Password dialog cancelled");
                self.dialog.cancel();
                self.pending = None;
                self.dialog_changed()
            }
            SessionCommand::RequestCancelAll => {
                if self.is_busy() {
                    return self.reject_busy("cancel all");
                }
                if self.sync.aggregate().is_clear() {
                    info!("Cancel all requested with no barring active");
                    return notify(SessionUpdate::failure(BarringError::NothingToCancel));
                }
                self.pending = None;
                self.dialog.begin_toggle(ToggleIntent::CancelAll);
                self.dialog_changed()
            }
            SessionCommand::RequestChangePassword => {
                if self.is_busy() {
                    return self.reject_busy("change password");
                }
                self.pending = None;
                self.dialog.begin_change();
                self.dialog_changed()
            }
            SessionCommand::CancelScan => {
                self.coordinator.cancel();
                Vec::new()
            }
        }
    }

    fn activate(&mut self, radio_available: bool) -> Vec<Effect> {
        if self.is_busy() {
            return self.reject_busy("start");
        }
        match self.sync.on_activate(radio_available) {
            Activation::RadioOff => self.terminate(BarringError::RadioOff),
            Activation::Scan => {
                let step = self.coordinator.begin(self.sync.aggregate());
                self.apply_scan_step(step)
            }
            Activation::Republish(state) => notify(SessionUpdate::AggregateChanged { state }),
        }
    }

    fn select_category(
        &mut self,
        direction: Direction,
        target: BarringCategory,
        desired_enabled: bool,
    ) -> Vec<Effect> {
        if self.is_busy() {
            return self.reject_busy("select category");
        }
        let selection = match PendingSelection::new(direction, target, desired_enabled) {
            Ok(selection) => selection,
            Err(reason) => {
                warn!(%direction, ?target, "Selection rejected");
                return notify(SessionUpdate::failure(BarringError::InvalidSelection(
                    reason,
                )));
            }
        };

        let state = self.sync.aggregate();
        if selection.is_noop(&state) {
            debug!(?selection, "Selection matches current state");
            self.pending = None;
            return notify(SessionUpdate::AggregateChanged { state });
        }

        if let Some(previous) = self.pending.replace(selection) {
            debug!(?previous, "Discarding unconsumed selection");
        }
        self.dialog.begin_toggle(ToggleIntent::ApplySelection);
        self.dialog_changed()
    }

    fn on_password_step(&mut self, step: PasswordStep) -> Vec<Effect> {
        let operation = match step {
            PasswordStep::Reprompt(_) | PasswordStep::Advanced => return self.dialog_changed(),
            PasswordStep::Ignored => return Vec::new(),
            PasswordStep::Emit(operation) => operation,
        };

        let request = match operation {
            PasswordOperation::SetCategory { password } => match self.pending {
                Some(selection) => self.dispatcher.set_category(
                    selection.target,
                    selection.desired_enabled,
                    password,
                ),
                None => {
                    warn!("Toggle password collected without a pending selection");
                    Err(BarringError::InvalidSelection(
                        "no category selected".to_string(),
                    ))
                }
            },
            PasswordOperation::CancelAll { password } => {
                self.dispatcher.cancel_all(&self.sync.aggregate(), password)
            }
            PasswordOperation::ChangePassword { old, new } => {
                self.dispatcher.change_password(old, new)
            }
        };

        let mut effects = self.dialog_changed();
        match request {
            Ok(request) => effects.extend(self.issue(request, Reply::Operation)),
            Err(error) => {
                self.pending = None;
                effects.push(Effect::Notify(SessionUpdate::failure(error)));
            }
        }
        effects
    }

    fn on_operation_completed(&mut self, outcome: &Outcome) -> Vec<Effect> {
        let Some(completion) =
            self.dispatcher
                .complete(outcome, self.sync.aggregate_mut(), &mut self.pending)
        else {
            return Vec::new();
        };

        let mut effects = Vec::new();
        if completion.aggregate_changed {
            effects.push(Effect::Notify(SessionUpdate::AggregateChanged {
                state: self.sync.aggregate(),
            }));
        }

        match completion.result {
            Ok(()) => effects.push(Effect::Notify(SessionUpdate::success())),
            Err(error) if completion.terminal => effects.extend(self.terminate(error)),
            Err(error) => effects.push(Effect::Notify(SessionUpdate::failure(error))),
        }
        effects
    }

    fn apply_scan_step(&mut self, step: ScanStep) -> Vec<Effect> {
        match step {
            ScanStep::Query { scan, category } => {
                self.issue(ChannelRequest::Query { category }, Reply::Query { scan, category })
            }
            ScanStep::Complete(state) => {
                self.sync.mark_fresh(state);
                notify(SessionUpdate::AggregateChanged { state })
            }
            ScanStep::Aborted(error) => {
                self.sync.invalidate();
                notify(SessionUpdate::failure(error))
            }
            ScanStep::Ignored => Vec::new(),
        }
    }

    fn issue(&mut self, request: ChannelRequest, reply: Reply) -> Vec<Effect> {
        if self.channel_busy {
            debug!(category = ?request.category(), "Channel busy, request deferred");
            self.deferred.push_back((request, reply));
            return Vec::new();
        }
        self.channel_busy = true;
        vec![Effect::Issue { request, reply }]
    }

    fn release_channel(&mut self) -> Vec<Effect> {
        self.channel_busy = false;
        match self.deferred.pop_front() {
            Some((request, reply)) => self.issue(request, reply),
            None => Vec::new(),
        }
    }

    fn dialog_changed(&mut self) -> Vec<Effect> {
        notify(SessionUpdate::DialogChanged {
            dialog: self.dialog.view(),
        })
    }

    fn reject_busy(&self, what: &str) -> Vec<Effect> {
        warn!(command = what, "Rejected while busy");
        notify(SessionUpdate::failure(BarringError::Busy))
    }

    fn terminate(&mut self, reason: BarringError) -> Vec<Effect> {
        warn!(%reason, "Session terminated");
        self.coordinator.cancel();
        self.dialog.close();
        self.pending = None;
        self.deferred.clear();
        self.terminated = true;
        notify(SessionUpdate::Terminated { reason })
    }

}

fn notify(update: SessionUpdate) -> Vec<Effect> {
    vec![Effect::Notify(update)]
}
