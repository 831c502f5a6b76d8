//! # Vita Relay
//!
//! Real-time change propagation and per-identity session routing for the
//! Vita life tracker. Two tightly coupled pieces make up the crate:
//!
//! 1. A **change feed**: every mutation the storage layer commits is emitted
//!    as a [`Change`]; independent consumers (reactive agents, websocket
//!    clients) each derive a filtered, order-preserving view of the stream
//!    without blocking the writer or each other.
//! 2. A **session multiplexer**: inbound traffic from many concurrent
//!    external identities (phone numbers, authenticated users) is routed to
//!    exactly one live [`CommandSession`] per identity, with lazy creation
//!    and teardown on transport failure, all without a single lock.
//!
//! ## Filtering changes
//!
//! ```no_run
//! use futures::FutureExt;
//! use vita_relay::{ChangeHub, RecordKind, filter, filter_kind};
//!
//! # async fn example() {
//! let hub = ChangeHub::new();
//!
//! // Stages compose; each adds one forwarding task and one channel hop.
//! let events = filter_kind(hub.subscribe(), RecordKind::Event);
//! let mut named = filter(events, |change| {
//!     futures::future::ready(!change.record().id().as_str().is_empty()).boxed()
//! });
//!
//! while let Some(change) = named.recv().await {
//!     log::info!("saw {:?} of {}", change.kind(), change.record().id());
//! }
//! # }
//! ```
//!
//! ## Routing sessions
//!
//! The surrounding server constructs a [`MessageRouter`] (SMS) or a
//! [`SocketRouter`] (web terminals) with its storage and interpreter
//! collaborators, spawns `run`, and delivers inbound traffic through the
//! router's handle. Everything else (session creation, FIFO forwarding,
//! eviction on transport failure) happens inside the router's single
//! control loop.
//!
//! ## Architecture
//!
//! - [`types`]: identifiers and the typed records the core dereferences
//! - [`changes`]: [`Change`], the fan-out [`ChangeHub`], and the [`filter`]
//!   combinators
//! - [`store`]: the [`Storage`] collaborator boundary and an in-memory
//!   reference implementation
//! - [`agents`]: the reactive agent pattern and its three concrete agents
//! - [`session`]: command sessions, their routers, and the transport and
//!   interpreter collaborator traits
//! - [`error`]: error types and handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod agents;
pub mod changes;
pub mod error;
pub mod session;
pub mod store;
pub mod types;

// Re-export commonly used types for external API
pub use changes::{Change, ChangeHub, ChangeKind, ChangeStream, filter, filter_kind};
pub use error::{RelayError, Result};
pub use store::{MemStore, Storage};
pub use types::{
    Event, Location, PhoneNumber, Profile, Record, RecordId, RecordKind, Tag, Task, User,
};

// Agent entry points
pub use agents::{
    TASK_DROP_GOAL, TASK_MAKE_GOAL, WEB_SENSOR_LOCATION, location_agent, readable_events,
    task_agent, web_sensors_agent,
};

// Session layer
pub use session::{
    CommandInterpreter, CommandSession, InboundHandle, InboundMessage, MessageRouter, Outcome,
    SocketHandle, SocketRouter, SocketRx, SocketSession, SocketTx, TextUi, Transport,
};

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
