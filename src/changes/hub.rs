//! Fan-out broadcast of changes
//!
//! One internal registry of per-subscriber queues, written by the storage
//! layer's commit path. Every subscriber sees every change, in emission
//! order, through its own queue. Subscribers never race on a shared channel
//! and a slow subscriber never blocks the writer.

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{Change, ChangeStream};

/// Registry handing out independent change subscriptions
///
/// The storage layer's `changes()` capability is backed by one of these.
pub struct ChangeHub {
    inner: Mutex<HubState>,
}

struct HubState {
    subscribers: Vec<mpsc::UnboundedSender<Change>>,
    closed: bool,
}

impl ChangeHub {
    /// Create an empty hub
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HubState {
                subscribers: Vec::new(),
                closed: false,
            }),
        }
    }

    /// Open a fresh subscription starting from now
    ///
    /// After [`close`](Self::close) the returned stream is already at
    /// end-of-stream.
    pub fn subscribe(&self) -> ChangeStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.inner.lock();
        if !state.closed {
            state.subscribers.push(tx);
        }
        ChangeStream::new(rx)
    }

    /// Hand a change to every live subscriber
    ///
    /// Subscribers whose stream has been dropped are pruned here.
    pub fn publish(&self, change: &Change) {
        let mut state = self.inner.lock();
        state
            .subscribers
            .retain(|tx| tx.send(change.clone()).is_ok());
    }

    /// Shut the hub down, terminating every subscription
    pub fn close(&self) {
        let mut state = self.inner.lock();
        state.closed = true;
        state.subscribers.clear();
    }

    /// Number of live subscriptions
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}
