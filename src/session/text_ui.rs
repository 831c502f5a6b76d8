//! Channel-backed text UI
//!
//! Adapts a command-line style interpreter to a medium in which you can only
//! exchange strings, like text messaging or a web terminal. One end of the
//! session's input/output channel pair.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::{RelayError, Result};

/// How long [`TextUi::ask`] waits for the remote party to answer
const ASK_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// The interpreter-facing end of a session's channel pair
pub struct TextUi {
    input: mpsc::Receiver<String>,
    output: mpsc::Sender<String>,
}

impl TextUi {
    /// Build a UI over a session's input receiver and output sender
    #[must_use]
    pub fn new(input: mpsc::Receiver<String>, output: mpsc::Sender<String>) -> Self {
        Self { input, output }
    }

    /// Next inbound line, or `None` once the input channel has closed
    pub async fn next_line(&mut self) -> Option<String> {
        self.input.recv().await
    }

    async fn send(&self, text: &str) -> Result<()> {
        self.output
            .send(text.to_string())
            .await
            .map_err(|_| RelayError::SessionClosed)
    }

    /// Send normal output to the remote party
    pub async fn output(&self, text: &str) -> Result<()> {
        self.send(text).await
    }

    /// Send information related to previous output
    pub async fn info(&self, text: &str) -> Result<()> {
        self.send(text).await
    }

    /// Send an error line
    pub async fn error(&self, text: &str) -> Result<()> {
        self.send(text).await
    }

    /// Send a warning line
    pub async fn warn(&self, text: &str) -> Result<()> {
        self.send(text).await
    }

    /// Pose a question and wait for the next inbound line as the answer
    ///
    /// An unanswered question times out after five minutes; the remote party
    /// is told, and the pending command fails.
    pub async fn ask(&mut self, prompt: &str) -> Result<String> {
        self.send(prompt).await?;
        match tokio::time::timeout(ASK_TIMEOUT, self.input.recv()).await {
            Ok(Some(answer)) => Ok(answer),
            Ok(None) => Err(RelayError::SessionClosed),
            Err(_) => {
                let _ = self.send("timeout").await;
                Err(RelayError::timeout("ask went unanswered"))
            }
        }
    }
}
