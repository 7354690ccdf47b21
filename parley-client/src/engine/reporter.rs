use crate::engine::{CallState, ClientEvent};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// Publishes state transitions and events; kept apart from the call so both
/// can be borrowed at once.
pub(super) struct Reporter {
    state: watch::Sender<CallState>,
    events: mpsc::UnboundedSender<ClientEvent>,
}

impl Reporter {
    pub(super) fn new(
        state: watch::Sender<CallState>,
        events: mpsc::UnboundedSender<ClientEvent>,
    ) -> Self {
        Self { state, events }
    }

    pub(super) fn state(&self) -> CallState {
        *self.state.borrow()
    }

    pub(super) fn set_state(&self, next: CallState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            info!("Call state: {:?} -> {:?}", prev, next);
            self.event(ClientEvent::StateChanged(next));
        }
    }

    pub(super) fn status(&self, text: impl Into<String>) {
        let text = text.into();
        info!("Status: {}", text);
        self.event(ClientEvent::Status(text));
    }

    pub(super) fn event(&self, event: ClientEvent) {
        if self.events.send(event).is_err() {
            debug!("Client event dropped: no receiver");
        }
    }
}
