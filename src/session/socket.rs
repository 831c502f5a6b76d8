//! Connection-driven session router (web terminals)
//!
//! The stricter variant used for interactive sessions: connections arrive
//! pre-authenticated, and a second concurrent connection for an identity is
//! told off and closed instead of queued. Otherwise the shape matches
//! [`MessageRouter`](super::MessageRouter): one control loop owns the map,
//! no locks.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::command::{CommandSession, ExitCallback};
use super::interpreter::CommandInterpreter;
use super::text_ui::TextUi;
use super::transport::{SocketRx, SocketTx};
use super::{Eviction, INPUT_QUEUE_CAPACITY, OUTPUT_QUEUE_CAPACITY};
use crate::types::{RecordId, User};

/// Sent on a second concurrent connection attempt before it is closed
pub const DUPLICATE_SESSION_MESSAGE: &str = "A user may only have one command session at once";

/// A freshly accepted, authenticated terminal connection
pub struct SocketSession {
    /// The authenticated principal; its id is the routing key
    pub user: User,
    /// Write half of the connection
    pub tx: Box<dyn SocketTx>,
    /// Read half of the connection
    pub rx: Box<dyn SocketRx>,
}

/// Cheap cloneable handle for delivering accepted connections to the router
#[derive(Clone)]
pub struct SocketHandle {
    tx: mpsc::UnboundedSender<SocketSession>,
}

impl SocketHandle {
    /// Enqueue a connection for routing; never blocks
    pub fn deliver(&self, socket: SocketSession) {
        if self.tx.send(socket).is_err() {
            log::warn!("socket router is gone; dropping connection");
        }
    }
}

/// Per-identity session multiplexer for connected terminals
pub struct SocketRouter {
    interpreter: Arc<dyn CommandInterpreter>,
    inbound_tx: mpsc::UnboundedSender<SocketSession>,
    inbound_rx: mpsc::UnboundedReceiver<SocketSession>,
}

struct SessionEntry {
    session_id: Uuid,
    stop: CancellationToken,
}

impl SocketRouter {
    /// Create a router over the given interpreter
    #[must_use]
    pub fn new(interpreter: Arc<dyn CommandInterpreter>) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self {
            interpreter,
            inbound_tx,
            inbound_rx,
        }
    }

    /// Handle for the surrounding server to deliver connections with
    #[must_use]
    pub fn handle(&self) -> SocketHandle {
        SocketHandle {
            tx: self.inbound_tx.clone(),
        }
    }

    /// Run the control loop until the token is cancelled
    pub async fn run(mut self, token: CancellationToken) {
        let (evict_tx, mut evict_rx) = mpsc::unbounded_channel::<Eviction<RecordId>>();
        let mut sessions: HashMap<RecordId, SessionEntry> = HashMap::new();

        loop {
            tokio::select! {
                Some(socket) = self.inbound_rx.recv() => {
                    let key = socket.user.id.clone();
                    if sessions.contains_key(&key) {
                        // Strict single-session rule: tell the newcomer off
                        // and close it. The live session and the router keep
                        // running.
                        let SocketSession { mut tx, .. } = socket;
                        tokio::spawn(async move {
                            if let Err(e) = tx.send(DUPLICATE_SESSION_MESSAGE).await {
                                log::debug!("rejected socket went away early: {e}");
                            }
                            tx.close().await;
                        });
                        continue;
                    }
                    let entry = self.open_session(socket, &evict_tx);
                    sessions.insert(key, entry);
                }
                Some(eviction) = evict_rx.recv() => {
                    let live = sessions
                        .get(&eviction.key)
                        .is_some_and(|entry| entry.session_id == eviction.session_id);
                    if live && let Some(entry) = sessions.remove(&eviction.key) {
                        // Stopping the pump drops the only input sender,
                        // which closes the session's read loop.
                        entry.stop.cancel();
                        log::debug!("evicted session for {}", eviction.key);
                    }
                }
                _ = token.cancelled() => break,
            }
        }

        for (_, entry) in sessions.drain() {
            entry.stop.cancel();
        }
    }

    fn open_session(
        &self,
        socket: SocketSession,
        evict_tx: &mpsc::UnboundedSender<Eviction<RecordId>>,
    ) -> SessionEntry {
        let SocketSession { user, mut tx, mut rx } = socket;
        let session_id = Uuid::new_v4();
        let stop = CancellationToken::new();
        let (input_tx, input_rx) = mpsc::channel(INPUT_QUEUE_CAPACITY);
        let (output_tx, mut output_rx) = mpsc::channel::<String>(OUTPUT_QUEUE_CAPACITY);

        // Output forwarder: owns the write half. A failed send tears the
        // session down; a cleanly closed output closes the socket.
        {
            let evict = evict_tx.clone();
            let key = user.id.clone();
            tokio::spawn(async move {
                while let Some(line) = output_rx.recv().await {
                    log::debug!("forwarding to {key}: {line}");
                    if let Err(e) = tx.send(&line).await {
                        log::warn!("socket send to {key} failed: {e}");
                        let _ = evict.send(Eviction {
                            key,
                            session_id,
                        });
                        return;
                    }
                }
                tx.close().await;
            });
        }

        // Input pump: owns the read half and the only input sender. Receive
        // errors and clean closure both evict; the session token stops the
        // pump when the router evicts first.
        {
            let evict = evict_tx.clone();
            let key = user.id.clone();
            let stop = stop.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = stop.cancelled() => return,
                        received = rx.receive() => match received {
                            Ok(Some(line)) => {
                                if input_tx.send(line).await.is_err() {
                                    return;
                                }
                            }
                            Ok(None) => {
                                let _ = evict.send(Eviction { key, session_id });
                                return;
                            }
                            Err(e) => {
                                log::warn!("socket read from {key} failed: {e}");
                                let _ = evict.send(Eviction { key, session_id });
                                return;
                            }
                        }
                    }
                }
            });
        }

        let on_exit: ExitCallback = {
            let evict = evict_tx.clone();
            let key = user.id.clone();
            Box::new(move || {
                let _ = evict.send(Eviction {
                    key: key.clone(),
                    session_id,
                });
            })
        };

        let ui = TextUi::new(input_rx, output_tx);
        let session = CommandSession::new(Some(user), self.interpreter.clone(), ui, on_exit);
        tokio::spawn(session.start());

        log::debug!("opened socket session {session_id}");
        SessionEntry { session_id, stop }
    }
}
