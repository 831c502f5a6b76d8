//! Message-driven session router (SMS)
//!
//! Routes fire-and-forget inbound messages to per-identity sessions,
//! creating a session lazily on the first message from an unknown phone
//! number. The session map is owned by the control loop alone; every
//! create/forward/evict decision is serialized through it.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::command::{CommandSession, ExitCallback};
use super::interpreter::CommandInterpreter;
use super::text_ui::TextUi;
use super::transport::Transport;
use super::{Eviction, INPUT_QUEUE_CAPACITY, OUTPUT_QUEUE_CAPACITY};
use crate::store::Storage;
use crate::types::PhoneNumber;

/// One inbound SMS
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Number the message was sent to (the service's own number)
    pub to: PhoneNumber,
    /// Number the message came from; the routing key
    pub from: PhoneNumber,
    /// Message text
    pub body: String,
}

/// Cheap cloneable handle for delivering inbound messages to the router
#[derive(Clone)]
pub struct InboundHandle {
    tx: mpsc::UnboundedSender<InboundMessage>,
}

impl InboundHandle {
    /// Enqueue a message for routing; never blocks
    pub fn deliver(&self, message: InboundMessage) {
        if self.tx.send(message).is_err() {
            log::warn!("message router is gone; dropping inbound message");
        }
    }
}

/// Per-identity session multiplexer for message transports
pub struct MessageRouter {
    storage: Arc<dyn Storage>,
    interpreter: Arc<dyn CommandInterpreter>,
    inbound_tx: mpsc::UnboundedSender<InboundMessage>,
    inbound_rx: mpsc::UnboundedReceiver<InboundMessage>,
}

struct SessionEntry {
    session_id: Uuid,
    input: mpsc::Sender<String>,
}

impl MessageRouter {
    /// Create a router over the given collaborators
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, interpreter: Arc<dyn CommandInterpreter>) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self {
            storage,
            interpreter,
            inbound_tx,
            inbound_rx,
        }
    }

    /// Handle for the surrounding server to deliver inbound messages with
    #[must_use]
    pub fn handle(&self) -> InboundHandle {
        InboundHandle {
            tx: self.inbound_tx.clone(),
        }
    }

    /// Run the control loop until the token is cancelled
    ///
    /// Consumes the router; on return every session's input channel has been
    /// closed, so every read loop terminates.
    pub async fn run(mut self, token: CancellationToken, transport: Arc<dyn Transport>) {
        let (evict_tx, mut evict_rx) = mpsc::unbounded_channel::<Eviction<PhoneNumber>>();
        let mut sessions: HashMap<PhoneNumber, SessionEntry> = HashMap::new();

        loop {
            tokio::select! {
                Some(message) = self.inbound_rx.recv() => {
                    if !sessions.contains_key(&message.from) {
                        let entry = self.open_session(&message.from, &transport, &evict_tx).await;
                        sessions.insert(message.from.clone(), entry);
                    }
                    if let Some(entry) = sessions.get(&message.from) {
                        match entry.input.try_send(message.body) {
                            Ok(()) => {}
                            Err(TrySendError::Full(_)) => {
                                log::warn!("{}: input queue full, dropping message", message.from);
                            }
                            Err(TrySendError::Closed(_)) => {
                                // Session is on its way out; its eviction is
                                // already in flight.
                                log::debug!("{}: session input closed", message.from);
                            }
                        }
                    }
                }
                Some(eviction) = evict_rx.recv() => {
                    let live = sessions
                        .get(&eviction.key)
                        .is_some_and(|entry| entry.session_id == eviction.session_id);
                    if live {
                        // Dropping the entry drops the input sender, which
                        // closes the session's read loop.
                        sessions.remove(&eviction.key);
                        log::debug!("evicted session for {}", eviction.key);
                    }
                }
                _ = token.cancelled() => break,
            }
        }

        // Close every remaining input channel so the read loops exit.
        sessions.clear();
    }

    async fn open_session(
        &self,
        from: &PhoneNumber,
        transport: &Arc<dyn Transport>,
        evict_tx: &mpsc::UnboundedSender<Eviction<PhoneNumber>>,
    ) -> SessionEntry {
        let session_id = Uuid::new_v4();
        let (input_tx, input_rx) = mpsc::channel(INPUT_QUEUE_CAPACITY);
        let (output_tx, mut output_rx) = mpsc::channel::<String>(OUTPUT_QUEUE_CAPACITY);

        // Output forwarder: drains the session's output into the transport.
        // The first failed send tears the session down.
        {
            let transport = transport.clone();
            let evict = evict_tx.clone();
            let to = from.clone();
            tokio::spawn(async move {
                while let Some(line) = output_rx.recv().await {
                    if let Err(e) = transport.send(&to, &line).await {
                        log::warn!("send to {to} failed: {e}");
                        let _ = evict.send(Eviction {
                            key: to,
                            session_id,
                        });
                        return;
                    }
                }
            });
        }

        // An unresolvable principal still gets a session; it explains itself
        // and exits without entering the read loop.
        let principal = match self.storage.user_for_phone(from.as_str()).await {
            Ok(user) => user,
            Err(e) => {
                log::error!("resolving {from}: {e}");
                None
            }
        };

        let on_exit: ExitCallback = {
            let evict = evict_tx.clone();
            let key = from.clone();
            Box::new(move || {
                let _ = evict.send(Eviction {
                    key: key.clone(),
                    session_id,
                });
            })
        };

        let ui = TextUi::new(input_rx, output_tx);
        let session = CommandSession::new(principal, self.interpreter.clone(), ui, on_exit);
        tokio::spawn(session.start());

        log::debug!("opened session {session_id} for {from}");
        SessionEntry {
            session_id,
            input: input_tx,
        }
    }
}
