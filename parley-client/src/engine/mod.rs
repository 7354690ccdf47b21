//! The negotiation client: one task per participant that owns the relay
//! connection and the media session and consumes every input from a single
//! `select!` loop.

mod call_session;
mod handle_signal_impl;
mod join_impl;
mod reporter;
mod session_event_impl;
mod teardown_impl;

use crate::ClientConfig;
use crate::ClientError;
use crate::media::{MediaBackend, RemoteAudio, SessionEvent};
use call_session::CallSession;
use parley_core::InboundFrame;
use reporter::Reporter;
use std::future::pending;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Connecting,
    Joined,
    Offering,
    Answering,
    Connected,
    Leaving,
    Disconnected,
}

/// What the client reports to the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    StateChanged(CallState),
    /// Human-readable progress or failure text.
    Status(String),
    RemoteAudio(RemoteAudio),
    Muted(bool),
}

enum ClientCommand {
    Join {
        room: String,
        reply: oneshot::Sender<Result<(), ClientError>>,
    },
    Leave {
        reply: oneshot::Sender<()>,
    },
    SetMuted {
        muted: bool,
        reply: oneshot::Sender<bool>,
    },
}

/// Cheap, cloneable front of a running [`NegotiationClient`].
///
/// The client task stops, hanging up any call, once every handle is dropped.
#[derive(Clone)]
pub struct ClientHandle {
    commands: mpsc::UnboundedSender<ClientCommand>,
    state: watch::Receiver<CallState>,
}

impl ClientHandle {
    /// Join `room` and resolve once the relay has acknowledged the join.
    pub async fn join(&self, room: impl Into<String>) -> Result<(), ClientError> {
        let (reply, reply_rx) = oneshot::channel();
        self.commands
            .send(ClientCommand::Join {
                room: room.into(),
                reply,
            })
            .map_err(|_| ClientError::Closed)?;
        reply_rx.await.map_err(|_| ClientError::Closed)?
    }

    /// Hang up. Does nothing when there is no call.
    pub async fn leave(&self) {
        let (reply, reply_rx) = oneshot::channel();
        if self.commands.send(ClientCommand::Leave { reply }).is_ok() {
            let _ = reply_rx.await;
        }
    }

    /// Returns `false` when there is no local track to mute.
    pub async fn set_muted(&self, muted: bool) -> bool {
        let (reply, reply_rx) = oneshot::channel();
        if self
            .commands
            .send(ClientCommand::SetMuted { muted, reply })
            .is_err()
        {
            return false;
        }
        reply_rx.await.unwrap_or(false)
    }

    pub fn state(&self) -> CallState {
        *self.state.borrow()
    }
}

pub struct NegotiationClient<B: MediaBackend> {
    config: ClientConfig,
    backend: B,
    report: Reporter,
    commands: mpsc::UnboundedReceiver<ClientCommand>,
    session_tx: mpsc::UnboundedSender<(u64, SessionEvent)>,
    session_rx: mpsc::UnboundedReceiver<(u64, SessionEvent)>,
    call: Option<CallSession<B>>,
    next_call_id: u64,
}

impl<B: MediaBackend> NegotiationClient<B> {
    /// Start the client task. Events are delivered on the returned receiver.
    pub fn spawn(
        config: ClientConfig,
        backend: B,
    ) -> (ClientHandle, mpsc::UnboundedReceiver<ClientEvent>) {
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(CallState::Idle);
        let (session_tx, session_rx) = mpsc::unbounded_channel();

        let client = Self {
            config,
            backend,
            report: Reporter::new(state_tx, events_tx),
            commands,
            session_tx,
            session_rx,
            call: None,
            next_call_id: 0,
        };
        tokio::spawn(client.run());

        let handle = ClientHandle {
            commands: command_tx,
            state,
        };
        (handle, events_rx)
    }

    async fn run(mut self) {
        info!("Negotiation client started");

        loop {
            let deadline = self.call.as_ref().and_then(|call| call.deadline);

            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => break,
                },

                frame = next_frame(&mut self.call) => match frame {
                    Some(frame) => self.handle_frame(frame).await,
                    None => self.handle_relay_closed().await,
                },

                Some((call_id, event)) = self.session_rx.recv() => {
                    self.handle_session_event(call_id, event).await
                }

                _ = wait_until(deadline) => self.handle_deadline().await,
            }
        }

        self.shutdown().await;
        info!("Negotiation client stopped");
    }

    async fn handle_command(&mut self, cmd: ClientCommand) {
        match cmd {
            ClientCommand::Join { room, reply } => self.handle_join(room, reply).await,
            ClientCommand::Leave { reply } => {
                self.handle_leave().await;
                let _ = reply.send(());
            }
            ClientCommand::SetMuted { muted, reply } => {
                let _ = reply.send(self.set_muted(muted));
            }
        }
    }

    fn set_muted(&mut self, muted: bool) -> bool {
        let Some(call) = &self.call else {
            return false;
        };
        call.set_muted(muted);
        self.report.event(ClientEvent::Muted(muted));
        true
    }
}

async fn next_frame<B: MediaBackend>(call: &mut Option<CallSession<B>>) -> Option<InboundFrame> {
    match call {
        Some(call) => call.relay.recv().await,
        None => pending().await,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => pending().await,
    }
}
