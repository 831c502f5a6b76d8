//! Transport collaborator traits
//!
//! Whatever carries bytes to and from the remote party. Any send or receive
//! error is fatal for the affected session only, never for a router.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::PhoneNumber;

/// Outbound message delivery keyed by identity (an SMS gateway)
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one line of text to the identity
    async fn send(&self, to: &PhoneNumber, body: &str) -> Result<()>;
}

/// Write half of a connected socket (a web terminal)
#[async_trait]
pub trait SocketTx: Send {
    /// Deliver one line of text over the connection
    async fn send(&mut self, body: &str) -> Result<()>;

    /// Close the connection; best-effort, errors are swallowed
    async fn close(&mut self);
}

/// Read half of a connected socket
#[async_trait]
pub trait SocketRx: Send {
    /// Block for the next inbound line; `Ok(None)` is clean closure
    async fn receive(&mut self) -> Result<Option<String>>;
}
