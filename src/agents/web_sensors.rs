//! Web sensors agent
//!
//! Translates raw browser sensor payloads into canonical location updates,
//! tagged as web-sourced so downstream consumers can tell them apart.

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::readable_events;
use crate::error::Result;
use crate::store::Storage;
use crate::types::{Event, Record, User, tags};

/// Event name carrying a raw browser geolocation reading
pub const WEB_SENSOR_LOCATION: &str = "WEB_SENSOR_LOCATION";

/// Run the web sensors agent for one user until cancelled
pub async fn web_sensors_agent(
    token: CancellationToken,
    storage: Arc<dyn Storage>,
    user: User,
) -> Result<()> {
    let changes = readable_events(&storage, &user);

    super::run("web sensors agent", token, changes, move |change| {
        let storage = storage.clone();
        let user = user.clone();
        async move {
            let Record::Event(event) = change.record() else {
                return;
            };
            if event.name == WEB_SENSOR_LOCATION {
                sensor_location(storage.as_ref(), &user, event).await;
            }
        }
    })
    .await;

    Ok(())
}

/// Re-record a raw sensor reading as a canonical location update
async fn sensor_location(storage: &dyn Storage, user: &User, event: &Event) {
    log::debug!("web sensor payload: {:?}", event.data);

    let web_tag = match storage.tag_named(user, tags::WEB).await {
        Ok(tag) => tag,
        Err(e) => {
            log::error!("web sensors agent: {e}");
            return;
        }
    };

    // Readings without both coordinates are noise; drop them quietly.
    let Some(latitude) = event.data.get("latitude").and_then(Value::as_f64) else {
        return;
    };
    let Some(longitude) = event.data.get("longitude").and_then(Value::as_f64) else {
        return;
    };

    if let Err(e) = storage
        .location_update(user, 0.0, latitude, longitude, &[web_tag])
        .await
    {
        log::error!("web sensors agent: {e}");
    }
}
