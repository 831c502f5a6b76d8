//! Task agent
//!
//! Interprets events as task commands: the event name selects the command,
//! the payload's `task_id` names the task to act on.

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::readable_events;
use crate::error::{RelayError, Result};
use crate::store::Storage;
use crate::types::{Event, Record, RecordId, User, tags};

/// Event name requesting that a task be marked as a goal
pub const TASK_MAKE_GOAL: &str = "TASK_MAKE_GOAL";

/// Event name requesting that a task stop being a goal
pub const TASK_DROP_GOAL: &str = "TASK_DROP_GOAL";

/// Run the task agent for one user until cancelled
pub async fn task_agent(
    token: CancellationToken,
    storage: Arc<dyn Storage>,
    user: User,
) -> Result<()> {
    let changes = readable_events(&storage, &user);

    super::run("task agent", token, changes, move |change| {
        let storage = storage.clone();
        let user = user.clone();
        async move {
            let Record::Event(event) = change.record() else {
                return;
            };
            let include = match event.name.as_str() {
                TASK_MAKE_GOAL => true,
                TASK_DROP_GOAL => false,
                _ => return,
            };
            if let Err(e) = toggle_goal(storage.as_ref(), &user, event, include).await {
                log::error!("task agent {}: {e}", event.name);
            }
        }
    })
    .await;

    Ok(())
}

/// Include or exclude the GOAL tag on the task the event references
async fn toggle_goal(
    storage: &dyn Storage,
    user: &User,
    event: &Event,
    include: bool,
) -> Result<()> {
    let goal = storage.tag_named(user, tags::GOAL).await?;

    let task_id = event
        .data
        .get("task_id")
        .and_then(Value::as_str)
        .ok_or_else(|| RelayError::invalid_payload("event data missing task_id"))?;

    let mut task = storage.find_task(&RecordId::from(task_id)).await?;
    if include {
        task.include_tag(&goal);
    } else {
        task.exclude_tag(&goal);
    }

    storage.save(Record::Task(task)).await?;
    Ok(())
}
