//! Storage collaborator boundary
//!
//! The storage engine itself (query execution, access policy, persistence)
//! lives outside this crate. [`Storage`] is the surface the relay core
//! consumes: a change subscription, an access check, and the handful of
//! record operations the agents' reactions and the session layer need.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::changes::ChangeStream;
use crate::error::Result;
use crate::types::{Event, Location, Profile, Record, RecordId, Tag, Task, User, tags};

pub mod mem;

pub use mem::MemStore;

/// Name of the canonical event recorded for a location update
pub const LOCATION_UPDATE: &str = "LOCATION_UPDATE";

/// The storage layer as seen by the relay core
#[async_trait]
pub trait Storage: Send + Sync {
    /// Open an independent change subscription starting from now
    ///
    /// Each call returns a fresh stream; it closes when the underlying
    /// connection fails or the provider shuts down.
    fn changes(&self) -> ChangeStream;

    /// Mint an identifier for a record about to be created
    fn new_id(&self) -> RecordId;

    /// Whether the principal may read the record
    ///
    /// Callers inside filter predicates treat an error as "not readable" for
    /// that event; it is never fatal to a pipeline.
    async fn can_read(&self, principal: &User, record: &Record) -> Result<bool>;

    /// Resolve the user registered with the given phone number
    async fn user_for_phone(&self, phone: &str) -> Result<Option<User>>;

    /// Find the owner's tag with the given name, creating it on first use
    async fn tag_named(&self, owner: &User, name: &str) -> Result<Tag>;

    /// Look up a task by id
    async fn find_task(&self, id: &RecordId) -> Result<Task>;

    /// The owner's profile, if one has been written yet
    async fn profile_for(&self, owner: &User) -> Result<Option<Profile>>;

    /// Resolve an event's location attachment
    async fn event_location(&self, event: &Event) -> Result<Option<Location>>;

    /// Commit a record, emitting a Create or Update change
    async fn save(&self, record: Record) -> Result<Record>;

    /// Remove a record, emitting a Delete change
    async fn delete(&self, id: &RecordId) -> Result<()>;

    /// Record a canonical location update on behalf of the owner
    ///
    /// Writes the [`Location`], then a [`LOCATION_UPDATE`] event tagged
    /// LOCATION and UPDATE (plus `extra_tags`) that carries the coordinates
    /// and references the location.
    async fn location_update(
        &self,
        owner: &User,
        altitude: f64,
        latitude: f64,
        longitude: f64,
        extra_tags: &[Tag],
    ) -> Result<(Event, Location)> {
        let location = Location {
            id: self.new_id(),
            owner: owner.id.clone(),
            altitude,
            latitude,
            longitude,
        };
        self.save(Record::Location(location.clone())).await?;

        let loc_tag = self.tag_named(owner, tags::LOCATION).await?;
        let upd_tag = self.tag_named(owner, tags::UPDATE).await?;
        let mut tag_ids = vec![loc_tag.id, upd_tag.id];
        tag_ids.extend(extra_tags.iter().map(|t| t.id.clone()));

        let mut data = Map::new();
        data.insert("altitude".to_string(), Value::from(altitude));
        data.insert("latitude".to_string(), Value::from(latitude));
        data.insert("longitude".to_string(), Value::from(longitude));

        let event = Event {
            id: self.new_id(),
            owner: owner.id.clone(),
            name: LOCATION_UPDATE.to_string(),
            data,
            tag_ids,
            location_id: Some(location.id.clone()),
        };
        self.save(Record::Event(event.clone())).await?;

        Ok((event, location))
    }
}
