//! The command session shell
//!
//! One stateful conversation bound to one identity: a read-evaluate loop
//! that tokenizes inbound lines and hands them to the interpreter, strictly
//! one at a time.

use std::sync::Arc;

use super::interpreter::{CommandInterpreter, Outcome};
use super::text_ui::TextUi;
use crate::types::User;

/// Sent to identities no account could be resolved for
pub const NO_ACCOUNT_MESSAGE: &str = "Looks like you don't have an account, sorry :(";

/// Invoked when a session ends on its own terms
///
/// Idempotent from the router's point of view: it enqueues an eviction
/// tagged with the session's generation, and stale generations are
/// discarded, so invoking it more than once cannot corrupt router state.
pub type ExitCallback = Box<dyn Fn() + Send + Sync>;

/// A bidirectional text pipe bound to one identity
pub struct CommandSession {
    principal: Option<User>,
    interpreter: Arc<dyn CommandInterpreter>,
    ui: TextUi,
    on_exit: ExitCallback,
}

impl CommandSession {
    /// Assemble a session from its resolved principal and channel ends
    #[must_use]
    pub fn new(
        principal: Option<User>,
        interpreter: Arc<dyn CommandInterpreter>,
        ui: TextUi,
        on_exit: ExitCallback,
    ) -> Self {
        Self {
            principal,
            interpreter,
            ui,
            on_exit,
        }
    }

    /// Run the read-evaluate loop until the input channel closes
    ///
    /// A session whose principal could not be resolved explains itself to
    /// the remote party and signals exit without ever entering the loop.
    pub async fn start(mut self) {
        let Some(user) = self.principal.take() else {
            if let Err(e) = self.ui.output(NO_ACCOUNT_MESSAGE).await {
                log::debug!("unresolved session could not say goodbye: {e}");
            }
            (self.on_exit)();
            return;
        };

        while let Some(line) = self.ui.next_line().await {
            let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
            if tokens.is_empty() {
                continue;
            }

            // The interpreter may converse via the UI in our absence; lines
            // arriving meanwhile wait in the input queue.
            match self.interpreter.dispatch(&user, &tokens, &mut self.ui).await {
                Ok(Outcome::Continue) => {}
                Ok(Outcome::Exit) => {
                    (self.on_exit)();
                    break;
                }
                Err(e) => log::error!("command session for {}: {e}", user.id),
            }
        }
    }
}
