//! Session sequencer
//!
//! A spawned task owns the [`BarringSession`] and processes one event at a
//! time: commands from [`SessionHandle`]s and completions of channel calls.
//! Channel calls run in their own tasks and post their classified result back
//! to the sequencer, so nothing ever blocks the event loop.

use std::sync::Arc;

use cbar_core::{
    classify, BarringCategory, ChannelError, ChannelRequest, CommandChannel, Direction, Password,
    RawResponse,
};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::events::{Effect, Reply, SessionCommand, SessionEvent, SessionUpdate};
use crate::session::BarringSession;
use crate::sync::SessionSnapshot;

/// The session task has stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Barring session closed")]
pub struct SessionClosed;

enum Message {
    /// Start or refresh; radio availability is checked by the sequencer
    Activate { refresh: bool },
    Command(SessionCommand),
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown,
}

/// Cloneable inbound API of a running session
#[derive(Clone)]
pub struct SessionHandle {
    id: Uuid,
    tx: mpsc::UnboundedSender<Message>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle").field("id", &self.id).finish()
    }
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn start(&self) -> Result<(), SessionClosed> {
        self.send(Message::Activate { refresh: false })
    }

    pub fn refresh(&self) -> Result<(), SessionClosed> {
        self.send(Message::Activate { refresh: true })
    }

    pub fn select_category(
        &self,
        direction: Direction,
        target: BarringCategory,
        desired_enabled: bool,
    ) -> Result<(), SessionClosed> {
        self.command(SessionCommand::SelectCategory {
            direction,
            target,
            desired_enabled,
        })
    }

    pub fn submit_password(&self, text: impl Into<String>) -> Result<(), SessionClosed> {
        self.command(SessionCommand::SubmitPassword(Password::new(text)))
    }

    pub fn cancel_dialog(&self) -> Result<(), SessionClosed> {
        self.command(SessionCommand::CancelDialog)
    }

    pub fn request_cancel_all(&self) -> Result<(), SessionClosed> {
        self.command(SessionCommand::RequestCancelAll)
    }

    pub fn request_change_password(&self) -> Result<(), SessionClosed> {
        self.command(SessionCommand::RequestChangePassword)
    }

    pub fn cancel_scan(&self) -> Result<(), SessionClosed> {
        self.command(SessionCommand::CancelScan)
    }

    /// Current state, for persisting across interruption
    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionClosed> {
        let (tx, rx) = oneshot::channel();
        self.send(Message::Snapshot(tx))?;
        rx.await.map_err(|_| SessionClosed)
    }

    /// Detach any running scan and stop the session task
    pub fn shutdown(&self) -> Result<(), SessionClosed> {
        self.send(Message::Shutdown)
    }

    fn command(&self, command: SessionCommand) -> Result<(), SessionClosed> {
        self.send(Message::Command(command))
    }

    fn send(&self, message: Message) -> Result<(), SessionClosed> {
        self.tx.send(message).map_err(|_| SessionClosed)
    }
}

/// Spawn a session on the current tokio runtime
///
/// Returns the inbound handle and the stream of updates for the presentation
/// layer. The session stays idle until [`SessionHandle::start`].
pub fn spawn_session(
    channel: Arc<dyn CommandChannel>,
    config: SessionConfig,
    snapshot: Option<SessionSnapshot>,
) -> (SessionHandle, mpsc::UnboundedReceiver<SessionUpdate>) {
    let id = Uuid::new_v4();
    let (tx, rx) = mpsc::unbounded_channel();
    let (updates_tx, updates_rx) = mpsc::unbounded_channel();
    let (completions_tx, completions_rx) = mpsc::unbounded_channel();

    let session = match snapshot {
        Some(snapshot) => BarringSession::from_snapshot(snapshot),
        None => BarringSession::new(),
    };

    let sequencer = Sequencer {
        session,
        channel,
        config,
        commands: rx,
        completions_tx,
        completions: completions_rx,
        updates: updates_tx,
    };

    let span = info_span!("barring_session", session = %id);
    tokio::spawn(sequencer.run().instrument(span));

    (SessionHandle { id, tx }, updates_rx)
}

struct Sequencer {
    session: BarringSession,
    channel: Arc<dyn CommandChannel>,
    config: SessionConfig,
    commands: mpsc::UnboundedReceiver<Message>,
    completions_tx: mpsc::UnboundedSender<SessionEvent>,
    completions: mpsc::UnboundedReceiver<SessionEvent>,
    updates: mpsc::UnboundedSender<SessionUpdate>,
}

impl Sequencer {
    async fn run(mut self) {
        info!("Session started");
        loop {
            tokio::select! {
                message = self.commands.recv() => match message {
                    Some(Message::Activate { refresh }) => {
                        let radio_available = self.channel.radio_available().await;
                        let command = if refresh {
                            SessionCommand::Refresh { radio_available }
                        } else {
                            SessionCommand::Start { radio_available }
                        };
                        self.dispatch(command.into());
                    }
                    Some(Message::Command(command)) => self.dispatch(command.into()),
                    Some(Message::Snapshot(reply)) => {
                        if reply.send(self.session.snapshot()).is_err() {
                            debug!("Snapshot requester went away");
                        }
                    }
                    Some(Message::Shutdown) | None => break,
                },
                Some(event) = self.completions.recv() => self.dispatch(event),
            }
        }

        self.session.handle(SessionCommand::CancelScan.into());
        info!("Session stopped");
    }

    fn dispatch(&mut self, event: SessionEvent) {
        for effect in self.session.handle(event) {
            match effect {
                Effect::Notify(update) => {
                    if self.updates.send(update).is_err() {
                        debug!("Update receiver dropped");
                    }
                }
                Effect::Issue { request, reply } => self.spawn_call(request, reply),
            }
        }
    }

    fn spawn_call(&self, request: ChannelRequest, reply: Reply) {
        let channel = Arc::clone(&self.channel);
        let completions = self.completions_tx.clone();
        let timeout = self.config.command_timeout();

        let call = async move {
            let category = request.category();
            debug!(?category, "Channel request issued");
            let raw = match timeout {
                Some(limit) => match tokio::time::timeout(limit, channel.execute(&request)).await
                {
                    Ok(raw) => raw,
                    Err(_) => {
                        warn!(
                            ?category,
                            timeout_ms = limit.as_millis() as u64,
                            "Channel request timed out"
                        );
                        RawResponse::exception(ChannelError::Timeout(format!(
                            "no reply within {} ms",
                            limit.as_millis()
                        )))
                    }
                },
                None => channel.execute(&request).await,
            };

            let outcome = classify(&raw);
            debug!(?category, ?outcome, "Channel request completed");
            if completions.send(reply.into_event(outcome)).is_err() {
                debug!(?category, "Session gone, completion dropped");
            }
        };
        tokio::spawn(call.in_current_span());
    }
}
