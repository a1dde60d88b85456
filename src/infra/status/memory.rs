//! In-memory boot-status source.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::core::{CallFailure, Delivery, StandingCall, StatusTransport};

/// Status source for development and tests.
///
/// Each standing call first receives the deliveries scripted for it with
/// [`InMemoryStatusSource::script_call`], then whatever is broadcast with
/// [`InMemoryStatusSource::push`] while it stays open.
#[derive(Default)]
pub struct InMemoryStatusSource {
    calls: AtomicUsize,
    scripts: Mutex<VecDeque<Vec<Delivery>>>,
    open: Mutex<Vec<mpsc::UnboundedSender<Delivery>>>,
    requests: Mutex<Vec<StandingCall>>,
}

impl InMemoryStatusSource {
    /// Create a source with no scripts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the deliveries the next unscripted call receives on open.
    pub fn script_call(&self, deliveries: Vec<Delivery>) {
        self.scripts.lock().push_back(deliveries);
    }

    /// Send a delivery to every open call. Returns how many received it.
    pub fn push(&self, delivery: &Delivery) -> usize {
        let mut open = self.open.lock();
        open.retain(|tx| tx.send(delivery.clone()).is_ok());
        open.len()
    }

    /// Broadcast a successful update.
    pub fn push_status(&self, response: Value) -> usize {
        self.push(&Ok(response))
    }

    /// Broadcast a failure.
    pub fn push_failure(&self, failure: CallFailure) -> usize {
        self.push(&Err(failure))
    }

    /// End every open call without a failure, as a source shutting down
    /// uncleanly would.
    pub fn close_all(&self) {
        self.open.lock().clear();
    }

    /// Number of standing calls issued so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of calls whose receiver is still alive.
    pub fn open_calls(&self) -> usize {
        let mut open = self.open.lock();
        open.retain(|tx| !tx.is_closed());
        open.len()
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<StandingCall> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl StatusTransport for InMemoryStatusSource {
    async fn call(&self, request: &StandingCall) -> mpsc::UnboundedReceiver<Delivery> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(script) = self.scripts.lock().pop_front() {
            for delivery in script {
                let _ = tx.send(delivery);
            }
        }
        self.open.lock().push(tx);
        rx
    }
}
