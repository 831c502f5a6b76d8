//! The change feed
//!
//! Every mutation the storage layer commits is emitted as a [`Change`].
//! Independent consumers subscribe through the [`hub`], derive filtered views
//! with the [`filter`] combinators, and react without ever blocking the
//! writer or each other.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::types::Record;

pub mod filter;
pub mod hub;

pub use filter::{filter, filter_kind};
pub use hub::ChangeHub;

/// What happened to the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    /// The record was created
    Create,
    /// The record was modified
    Update,
    /// The record was deleted
    Delete,
}

/// An immutable record of one mutation to a stored entity
///
/// Assigned by the storage layer at emission time. Each consumer receives its
/// own copy; no consumer can mutate a change shared with another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    kind: ChangeKind,
    record: Record,
}

impl Change {
    /// Create a new change
    #[must_use]
    pub fn new(kind: ChangeKind, record: Record) -> Self {
        Self { kind, record }
    }

    /// What happened
    #[must_use]
    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    /// The record the mutation touched
    #[must_use]
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Consume the change, yielding the record
    #[must_use]
    pub fn into_record(self) -> Record {
        self.record
    }
}

/// An order-preserving stream of changes
///
/// Produced by [`ChangeHub::subscribe`] and by each [`filter`] stage. The
/// stream ends when its producer goes away: the hub shuts down, or the
/// upstream stage finishes draining a closed source.
#[derive(Debug)]
pub struct ChangeStream {
    rx: mpsc::UnboundedReceiver<Change>,
}

impl ChangeStream {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Change>) -> Self {
        Self { rx }
    }

    /// Receive the next change, or `None` once the stream has closed
    pub async fn recv(&mut self) -> Option<Change> {
        self.rx.recv().await
    }
}

impl Stream for ChangeStream {
    type Item = Change;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
