//! Per-identity command sessions and their routers
//!
//! Inbound traffic from many concurrent external identities is routed to
//! exactly one live [`CommandSession`] per identity. Two routers share the
//! same machinery:
//!
//! - [`MessageRouter`]: fire-and-forget messages (SMS); a session is created
//!   lazily on the first message from an unknown identity.
//! - [`SocketRouter`]: connected web terminals; a second concurrent
//!   connection for an identity is rejected outright.
//!
//! Every routing decision (create, forward, evict) happens on a single
//! control loop that alone owns the session map, so no locking is needed
//! anywhere in this module. Sessions talk to the world through a pair of
//! channels; the only teardown triggers are transport failure, the
//! interpreter's exit, and router cancellation.

use uuid::Uuid;

pub mod command;
pub mod interpreter;
pub mod router;
pub mod socket;
pub mod text_ui;
pub mod transport;

pub use command::{CommandSession, ExitCallback, NO_ACCOUNT_MESSAGE};
pub use interpreter::{CommandInterpreter, Outcome};
pub use router::{InboundHandle, InboundMessage, MessageRouter};
pub use socket::{DUPLICATE_SESSION_MESSAGE, SocketHandle, SocketRouter, SocketSession};
pub use text_ui::TextUi;
pub use transport::{SocketRx, SocketTx, Transport};

/// Most inbound lines an identity may queue while its interpreter is busy
pub(crate) const INPUT_QUEUE_CAPACITY: usize = 64;

/// Output is handed to the transport one line at a time
pub(crate) const OUTPUT_QUEUE_CAPACITY: usize = 1;

/// Request to remove one session from a router's map
///
/// Carries the generation tag so a late signal for an already-replaced
/// session is discarded instead of evicting its successor.
pub(crate) struct Eviction<K> {
    pub(crate) key: K,
    pub(crate) session_id: Uuid,
}
