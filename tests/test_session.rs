//! Unit-level tests for the command session shell
//!
//! Drives a `CommandSession` directly over hand-built channels: read-loop
//! termination, the unresolved-principal path, protocol-level exit, and the
//! conversational ask flow.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use vita_relay::error::Result;
use vita_relay::{
    CommandInterpreter, CommandSession, Outcome, RecordId, TextUi, User,
    session::NO_ACCOUNT_MESSAGE,
};

struct EchoInterpreter;

#[async_trait]
impl CommandInterpreter for EchoInterpreter {
    async fn dispatch(
        &self,
        principal: &User,
        tokens: &[String],
        ui: &mut TextUi,
    ) -> Result<Outcome> {
        match tokens[0].as_str() {
            "exit" => {
                ui.output("bye").await?;
                Ok(Outcome::Exit)
            }
            "name" => {
                let answer = ui.ask("What name?").await?;
                ui.output(&format!("named {answer}")).await?;
                Ok(Outcome::Continue)
            }
            _ => {
                ui.output(&format!("{}: {}", principal.id, tokens.join(" ")))
                    .await?;
                Ok(Outcome::Continue)
            }
        }
    }
}

struct Harness {
    input: mpsc::Sender<String>,
    output: mpsc::Receiver<String>,
    exits: Arc<AtomicUsize>,
    handle: tokio::task::JoinHandle<()>,
}

fn spawn_session(principal: Option<User>) -> Harness {
    let (input_tx, input_rx) = mpsc::channel(16);
    let (output_tx, output_rx) = mpsc::channel(16);
    let exits = Arc::new(AtomicUsize::new(0));

    let counter = exits.clone();
    let session = CommandSession::new(
        principal,
        Arc::new(EchoInterpreter),
        TextUi::new(input_rx, output_tx),
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );
    let handle = tokio::spawn(session.start());

    Harness {
        input: input_tx,
        output: output_rx,
        exits,
        handle,
    }
}

async fn next_output(harness: &mut Harness) -> String {
    tokio::time::timeout(Duration::from_secs(1), harness.output.recv())
        .await
        .expect("timed out waiting for session output")
        .expect("session output channel closed")
}

#[tokio::test]
async fn lines_are_dispatched_and_echoed() {
    let _ = env_logger::builder().is_test(true).try_init();

    let user = User {
        id: RecordId::from("u1"),
    };
    let mut harness = spawn_session(Some(user));

    harness.input.send("hello there".to_string()).await.unwrap();
    assert_eq!(next_output(&mut harness).await, "u1: hello there");
}

#[tokio::test]
async fn read_loop_terminates_when_input_closes() {
    let _ = env_logger::builder().is_test(true).try_init();

    let user = User {
        id: RecordId::from("u2"),
    };
    let harness = spawn_session(Some(user));

    drop(harness.input);
    tokio::time::timeout(Duration::from_secs(1), harness.handle)
        .await
        .expect("read loop did not terminate")
        .unwrap();
}

#[tokio::test]
async fn unresolved_principal_never_enters_the_read_loop() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut harness = spawn_session(None);

    assert_eq!(next_output(&mut harness).await, NO_ACCOUNT_MESSAGE);
    tokio::time::timeout(Duration::from_secs(1), harness.handle)
        .await
        .expect("session did not return")
        .unwrap();
    assert_eq!(harness.exits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn exit_command_invokes_the_callback_and_stops() {
    let _ = env_logger::builder().is_test(true).try_init();

    let user = User {
        id: RecordId::from("u3"),
    };
    let mut harness = spawn_session(Some(user));

    harness.input.send("exit".to_string()).await.unwrap();
    assert_eq!(next_output(&mut harness).await, "bye");

    tokio::time::timeout(Duration::from_secs(1), harness.handle)
        .await
        .expect("session did not stop after exit")
        .unwrap();
    assert_eq!(harness.exits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn interpreter_converses_through_ask() {
    let _ = env_logger::builder().is_test(true).try_init();

    let user = User {
        id: RecordId::from("u4"),
    };
    let mut harness = spawn_session(Some(user));

    // The answer is sent before the question is even read; it waits in the
    // input queue, exactly as a second SMS would.
    harness.input.send("name".to_string()).await.unwrap();
    harness.input.send("ada".to_string()).await.unwrap();

    assert_eq!(next_output(&mut harness).await, "What name?");
    assert_eq!(next_output(&mut harness).await, "named ada");
}

#[tokio::test]
async fn blank_lines_are_skipped() {
    let _ = env_logger::builder().is_test(true).try_init();

    let user = User {
        id: RecordId::from("u5"),
    };
    let mut harness = spawn_session(Some(user));

    harness.input.send("   ".to_string()).await.unwrap();
    harness.input.send("ping".to_string()).await.unwrap();
    assert_eq!(next_output(&mut harness).await, "u5: ping");
}
