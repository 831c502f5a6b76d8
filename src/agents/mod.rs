//! Reactive agents
//!
//! An agent is a long-lived task subscribed to a filtered view of the change
//! feed on behalf of one user. Each agent differs only in its filter and its
//! reaction body; the subscription plumbing and the select loop are shared
//! here.
//!
//! Reactions are executed synchronously, one change at a time, and are
//! best-effort: a malformed payload or a failed storage write is logged and
//! skipped, never fatal to the loop. The loop ends when the change feed
//! closes or the agent's token is cancelled.

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::changes::{Change, ChangeStream, filter, filter_kind};
use crate::store::Storage;
use crate::types::{RecordKind, User};

pub mod location;
pub mod task;
pub mod web_sensors;

pub use location::location_agent;
pub use task::{TASK_DROP_GOAL, TASK_MAKE_GOAL, task_agent};
pub use web_sensors::{WEB_SENSOR_LOCATION, web_sensors_agent};

/// The subscription every agent starts from: event changes the user may read
///
/// An access check that errors answers "not readable" for that event, so a
/// flaky storage call can never wedge the pipeline.
pub fn readable_events(storage: &Arc<dyn Storage>, user: &User) -> ChangeStream {
    let source = filter_kind(storage.changes(), RecordKind::Event);
    let storage = storage.clone();
    let user = user.clone();
    filter(source, move |change: &Change| {
        let storage = storage.clone();
        let user = user.clone();
        let record = change.record().clone();
        async move { storage.can_read(&user, &record).await.unwrap_or(false) }.boxed()
    })
}

/// Drive an agent's select loop until the stream closes or the token fires
pub(crate) async fn run<F, Fut>(
    name: &str,
    token: CancellationToken,
    mut changes: ChangeStream,
    mut react: F,
) where
    F: FnMut(Change) -> Fut,
    Fut: Future<Output = ()>,
{
    loop {
        tokio::select! {
            maybe = changes.recv() => match maybe {
                Some(change) => react(change).await,
                None => {
                    log::warn!("{name}: change feed closed");
                    break;
                }
            },
            _ = token.cancelled() => {
                log::debug!("{name}: cancelled");
                break;
            }
        }
    }
}
