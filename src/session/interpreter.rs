//! Command interpreter collaborator trait

use async_trait::async_trait;

use super::text_ui::TextUi;
use crate::error::Result;
use crate::types::User;

/// What the session should do after a dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Keep reading input
    Continue,
    /// End the session at the protocol level
    Exit,
}

/// Executes one parsed command against storage on behalf of a principal
///
/// The business logic behind the commands lives outside this crate; the
/// session layer only tokenizes input, runs dispatches one at a time, and
/// relays whatever the interpreter writes to the [`TextUi`].
#[async_trait]
pub trait CommandInterpreter: Send + Sync {
    /// Execute one command
    ///
    /// May hold the session for as long as it likes (further inbound lines
    /// queue up) and may use [`TextUi::ask`] to converse.
    async fn dispatch(&self, principal: &User, tokens: &[String], ui: &mut TextUi)
    -> Result<Outcome>;
}
