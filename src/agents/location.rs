//! Location agent
//!
//! Watches for location-update events and mirrors the newest position onto
//! the user's profile, creating the profile on first write.

use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use super::readable_events;
use crate::changes::{Change, filter};
use crate::error::Result;
use crate::store::Storage;
use crate::types::{Event, Profile, Record, User, tags};

/// Run the location agent for one user until cancelled
///
/// Reacts to events carrying both the LOCATION and UPDATE tags. Tag
/// resolution happens once, up front; failure there is a configuration
/// problem and aborts startup rather than surfacing later inside the loop.
pub async fn location_agent(
    token: CancellationToken,
    storage: Arc<dyn Storage>,
    user: User,
) -> Result<()> {
    let loc_tag = storage.tag_named(&user, tags::LOCATION).await?;
    let upd_tag = storage.tag_named(&user, tags::UPDATE).await?;

    let changes = filter(readable_events(&storage, &user), move |change: &Change| {
        let hit = match change.record() {
            Record::Event(e) => e.has_tag(&loc_tag) && e.has_tag(&upd_tag),
            _ => false,
        };
        futures::future::ready(hit).boxed()
    });

    let reaction_storage = storage.clone();
    let reaction_user = user.clone();
    super::run("location agent", token, changes, move |change| {
        let storage = reaction_storage.clone();
        let user = reaction_user.clone();
        async move {
            if let Record::Event(event) = change.record() {
                apply_location(storage.as_ref(), &user, event).await;
            }
        }
    })
    .await;

    Ok(())
}

/// Point the user's profile at the event's location attachment
async fn apply_location(storage: &dyn Storage, user: &User, event: &Event) {
    let location = match storage.event_location(event).await {
        Ok(Some(location)) => location,
        Ok(None) => {
            log::warn!(
                "location agent: event {} has no location attachment",
                event.id
            );
            return;
        }
        Err(e) => {
            log::error!("location agent: {e}");
            return;
        }
    };

    let now = Utc::now();
    let mut profile = match storage.profile_for(user).await {
        Ok(Some(profile)) => profile,
        Ok(None) => Profile {
            id: storage.new_id(),
            owner: user.id.clone(),
            phone: None,
            location_id: None,
            created_at: now,
            updated_at: now,
        },
        Err(e) => {
            log::error!("location agent: {e}");
            return;
        }
    };

    profile.location_id = Some(location.id);
    profile.updated_at = now;

    if let Err(e) = storage.save(Record::Profile(profile)).await {
        log::error!("location agent: {e}");
    }
}
