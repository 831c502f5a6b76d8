//! Integration tests for the connection-driven socket router
//!
//! Exercises the strict single-session rule, eviction on send failure and
//! on clean closure, reconnection, and cancellation teardown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use vita_relay::error::{RelayError, Result};
use vita_relay::{
    CommandInterpreter, Outcome, RecordId, SocketRouter, SocketRx, SocketSession, SocketTx,
    TextUi, User, session::DUPLICATE_SESSION_MESSAGE,
};

struct MockTx {
    sent: mpsc::UnboundedSender<String>,
    fail: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl SocketTx for MockTx {
    async fn send(&mut self, body: &str) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RelayError::transport("socket torn"));
        }
        let _ = self.sent.send(body.to_string());
        Ok(())
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

struct MockRx {
    lines: mpsc::Receiver<String>,
}

#[async_trait]
impl SocketRx for MockRx {
    async fn receive(&mut self) -> Result<Option<String>> {
        Ok(self.lines.recv().await)
    }
}

/// One mocked browser connection: feed lines in, observe lines out.
struct Conn {
    feed: mpsc::Sender<String>,
    seen: mpsc::UnboundedReceiver<String>,
    fail: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

fn connect(user: &User) -> (SocketSession, Conn) {
    let (feed_tx, feed_rx) = mpsc::channel(16);
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();
    let fail = Arc::new(AtomicBool::new(false));
    let closed = Arc::new(AtomicBool::new(false));

    let socket = SocketSession {
        user: user.clone(),
        tx: Box::new(MockTx {
            sent: seen_tx,
            fail: fail.clone(),
            closed: closed.clone(),
        }),
        rx: Box::new(MockRx { lines: feed_rx }),
    };

    (
        socket,
        Conn {
            feed: feed_tx,
            seen: seen_rx,
            fail,
            closed,
        },
    )
}

struct EchoInterpreter;

#[async_trait]
impl CommandInterpreter for EchoInterpreter {
    async fn dispatch(
        &self,
        principal: &User,
        tokens: &[String],
        ui: &mut TextUi,
    ) -> Result<Outcome> {
        ui.output(&format!("{}: {}", principal.id, tokens.join(" ")))
            .await?;
        Ok(Outcome::Continue)
    }
}

fn start_router() -> (
    vita_relay::SocketHandle,
    CancellationToken,
    tokio::task::JoinHandle<()>,
) {
    let router = SocketRouter::new(Arc::new(EchoInterpreter));
    let handle = router.handle();
    let token = CancellationToken::new();
    let join = tokio::spawn(router.run(token.clone()));
    (handle, token, join)
}

fn test_user(id: &str) -> User {
    User {
        id: RecordId::from(id),
    }
}

async fn next_seen(conn: &mut Conn) -> String {
    tokio::time::timeout(Duration::from_secs(1), conn.seen.recv())
        .await
        .expect("timed out waiting for socket output")
        .expect("socket output channel closed")
}

#[tokio::test]
async fn lines_round_trip_through_the_session() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (handle, _token, _join) = start_router();
    let user = test_user("w1");
    let (socket, mut conn) = connect(&user);

    handle.deliver(socket);
    conn.feed.send("hello web".to_string()).await.unwrap();

    assert_eq!(next_seen(&mut conn).await, "w1: hello web");
}

#[tokio::test]
async fn second_concurrent_connection_is_rejected() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (handle, _token, _join) = start_router();
    let user = test_user("w2");

    let (first, mut first_conn) = connect(&user);
    handle.deliver(first);
    conn_settle().await;

    let (second, mut second_conn) = connect(&user);
    handle.deliver(second);

    assert_eq!(next_seen(&mut second_conn).await, DUPLICATE_SESSION_MESSAGE);
    wait_until(&second_conn.closed).await;

    // The original session is untouched.
    first_conn.feed.send("still here".to_string()).await.unwrap();
    assert_eq!(next_seen(&mut first_conn).await, "w2: still here");
}

#[tokio::test]
async fn clean_closure_evicts_and_allows_reconnecting() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (handle, _token, _join) = start_router();
    let user = test_user("w3");

    let (first, first_conn) = connect(&user);
    handle.deliver(first);
    conn_settle().await;

    // The browser goes away; the pump sees EOF and evicts.
    drop(first_conn.feed);
    conn_settle().await;

    let (second, mut second_conn) = connect(&user);
    handle.deliver(second);
    second_conn.feed.send("back".to_string()).await.unwrap();
    assert_eq!(next_seen(&mut second_conn).await, "w3: back");
}

#[tokio::test]
async fn send_failure_evicts_and_allows_reconnecting() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (handle, _token, _join) = start_router();
    let user = test_user("w4");

    let (first, first_conn) = connect(&user);
    handle.deliver(first);
    conn_settle().await;

    first_conn.fail.store(true, Ordering::SeqCst);
    first_conn.feed.send("doomed".to_string()).await.unwrap();
    conn_settle().await;

    let (second, mut second_conn) = connect(&user);
    handle.deliver(second);
    second_conn.feed.send("back".to_string()).await.unwrap();
    assert_eq!(next_seen(&mut second_conn).await, "w4: back");
}

#[tokio::test]
async fn cancellation_tears_every_session_down() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (handle, token, join) = start_router();
    let user = test_user("w5");

    let (socket, mut conn) = connect(&user);
    handle.deliver(socket);
    conn.feed.send("hello".to_string()).await.unwrap();
    let _ = next_seen(&mut conn).await;

    token.cancel();
    tokio::time::timeout(Duration::from_secs(1), join)
        .await
        .expect("router did not stop after cancellation")
        .unwrap();

    // Teardown closes the socket once the session's output drains.
    wait_until(&conn.closed).await;
}

/// Give the router's control loop a beat to process what we just delivered.
async fn conn_settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

async fn wait_until(flag: &Arc<AtomicBool>) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while !flag.load(Ordering::SeqCst) {
        assert!(
            tokio::time::Instant::now() < deadline,
            "flag never became true"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
