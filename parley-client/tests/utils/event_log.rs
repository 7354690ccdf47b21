use anyhow::{Context, Result};
use parley_client::{CallState, ClientEvent};
use std::time::Duration;
use tokio::sync::mpsc;

use super::client_helpers::{EVENT_TIMEOUT_MS, SILENCE_MS};

/// Collects a client's events so tests can wait on them and inspect history.
pub struct EventLog {
    rx: mpsc::UnboundedReceiver<ClientEvent>,
    seen: Vec<ClientEvent>,
    cursor: usize,
}

impl EventLog {
    pub fn new(rx: mpsc::UnboundedReceiver<ClientEvent>) -> Self {
        Self {
            rx,
            seen: Vec::new(),
            cursor: 0,
        }
    }

    /// Wait for the next event after the last match that satisfies `pred`.
    pub async fn wait_for(&mut self, pred: impl Fn(&ClientEvent) -> bool) -> Result<ClientEvent> {
        if let Some(pos) = self.seen[self.cursor..].iter().position(&pred) {
            self.cursor += pos + 1;
            return Ok(self.seen[self.cursor - 1].clone());
        }
        self.cursor = self.seen.len();

        let deadline = Duration::from_millis(EVENT_TIMEOUT_MS);
        loop {
            let event = tokio::time::timeout(deadline, self.rx.recv())
                .await
                .with_context(|| format!("Timed out; events so far: {:?}", self.seen))?
                .context("Client event channel closed")?;
            self.seen.push(event.clone());
            self.cursor = self.seen.len();
            if pred(&event) {
                return Ok(event);
            }
        }
    }

    pub async fn wait_for_state(&mut self, state: CallState) -> Result<()> {
        self.wait_for(|e| *e == ClientEvent::StateChanged(state))
            .await
            .map(|_| ())
    }

    pub async fn wait_for_status(&mut self, text: &str) -> Result<()> {
        self.wait_for(|e| matches!(e, ClientEvent::Status(s) if s.contains(text)))
            .await
            .map(|_| ())
    }

    /// Pull in whatever arrives within a short quiet period.
    pub async fn settle(&mut self) {
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_millis(SILENCE_MS), self.rx.recv()).await
        {
            self.seen.push(event);
        }
    }

    /// Every state transition seen so far, in order.
    pub fn states(&self) -> Vec<CallState> {
        self.seen
            .iter()
            .filter_map(|e| match e {
                ClientEvent::StateChanged(state) => Some(*state),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&ClientEvent) -> bool) -> usize {
        self.seen.iter().filter(|e| pred(e)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
