//! Composable, order-preserving change filters
//!
//! Each combinator starts exactly one forwarding task and adds one channel
//! hop. Stages compose: `filter(filter(source, p1), p2)` behaves as logical
//! AND. When the source closes, every derived stream closes after draining
//! the elements already accepted.

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::mpsc;

use super::{Change, ChangeStream};
use crate::types::RecordKind;

/// Derive a stream forwarding only the changes the predicate accepts
///
/// The predicate is awaited per change, in source order; it may consult the
/// storage layer (an access check, say) but must not block indefinitely. A
/// predicate that cannot decide (a failed storage call) should answer
/// `false` for that event rather than error. If a predicate panics, the
/// stage's task dies and the output closes instead of hanging downstream
/// consumers.
///
/// Async predicates clone whatever they need out of the borrowed change
/// before building their future.
pub fn filter<P>(mut source: ChangeStream, mut predicate: P) -> ChangeStream
where
    P: FnMut(&Change) -> BoxFuture<'static, bool> + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(change) = source.recv().await {
            if !predicate(&change).await {
                continue;
            }
            if tx.send(change).is_err() {
                // Downstream consumer is gone; stop forwarding.
                return;
            }
        }
    });

    ChangeStream::new(rx)
}

/// [`filter`] specialized to a record kind match
pub fn filter_kind(source: ChangeStream, kind: RecordKind) -> ChangeStream {
    filter(source, move |change: &Change| {
        futures::future::ready(change.record().kind() == kind).boxed()
    })
}
