//! Typed records and record kinds
//!
//! The storage layer owns the full data model; this module defines the slice
//! of it the relay core dereferences: events the agents react to, and the
//! records their reactions touch (profiles, tasks, locations, tags).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::identifiers::RecordId;

/// Well-known tag names used by the reactive agents
pub mod tags {
    /// Tag marking location-related events
    pub const LOCATION: &str = "LOCATION";
    /// Tag marking update events
    pub const UPDATE: &str = "UPDATE";
    /// Tag marking a task as a goal
    pub const GOAL: &str = "GOAL";
    /// Tag marking web-sourced records
    pub const WEB: &str = "WEB";
}

/// Kind of a stored record, the type tag every change carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// An account holder
    User,
    /// A timestamped occurrence with an arbitrary data payload
    Event,
    /// A unit of work
    Task,
    /// A geographic position
    Location,
    /// Per-user denormalized state (phone number, last location)
    Profile,
    /// A user-scoped label attachable to events and tasks
    Tag,
}

impl RecordKind {
    /// Get the kind as a string slice
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Event => "event",
            Self::Task => "task",
            Self::Location => "location",
            Self::Profile => "profile",
            Self::Tag => "tag",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An account holder, the principal sessions and agents act on behalf of
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable identifier
    pub id: RecordId,
}

/// A user-scoped label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Stable identifier
    pub id: RecordId,
    /// Owning user
    pub owner: RecordId,
    /// Label text, unique per owner
    pub name: String,
}

/// A unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Stable identifier
    pub id: RecordId,
    /// Owning user
    pub owner: RecordId,
    /// Human-readable name
    pub name: String,
    /// Tags currently attached to the task
    pub tag_ids: Vec<RecordId>,
}

impl Task {
    /// Attach a tag, keeping the list duplicate-free
    pub fn include_tag(&mut self, tag: &Tag) {
        if !self.tag_ids.contains(&tag.id) {
            self.tag_ids.push(tag.id.clone());
        }
    }

    /// Detach a tag if present
    pub fn exclude_tag(&mut self, tag: &Tag) {
        self.tag_ids.retain(|id| id != &tag.id);
    }
}

/// A geographic position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Stable identifier
    pub id: RecordId,
    /// Owning user
    pub owner: RecordId,
    /// Altitude in meters
    pub altitude: f64,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

/// Per-user denormalized state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Stable identifier
    pub id: RecordId,
    /// Owning user
    pub owner: RecordId,
    /// Phone number the user texts from, if registered
    pub phone: Option<String>,
    /// Most recent known location
    pub location_id: Option<RecordId>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// A timestamped occurrence with an arbitrary data payload
///
/// Events are the lingua franca of the system: external surfaces record them,
/// reactive agents interpret them by name, tags and payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Stable identifier
    pub id: RecordId,
    /// Owning user
    pub owner: RecordId,
    /// Event name, doubles as a command selector for agents
    pub name: String,
    /// Free-form payload
    pub data: Map<String, Value>,
    /// Tags attached to the event
    pub tag_ids: Vec<RecordId>,
    /// Location attachment, if any
    pub location_id: Option<RecordId>,
}

impl Event {
    /// Whether the event carries the given tag
    #[must_use]
    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tag_ids.contains(&tag.id)
    }
}

/// A stored record of any kind
///
/// Changes carry records by value; consumers own their copy and may not
/// observe mutation from elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Record {
    /// An account holder
    User(User),
    /// A timestamped occurrence
    Event(Event),
    /// A unit of work
    Task(Task),
    /// A geographic position
    Location(Location),
    /// Per-user denormalized state
    Profile(Profile),
    /// A user-scoped label
    Tag(Tag),
}

impl Record {
    /// The record's type tag
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::User(_) => RecordKind::User,
            Self::Event(_) => RecordKind::Event,
            Self::Task(_) => RecordKind::Task,
            Self::Location(_) => RecordKind::Location,
            Self::Profile(_) => RecordKind::Profile,
            Self::Tag(_) => RecordKind::Tag,
        }
    }

    /// The record's stable identifier
    #[must_use]
    pub fn id(&self) -> &RecordId {
        match self {
            Self::User(u) => &u.id,
            Self::Event(e) => &e.id,
            Self::Task(t) => &t.id,
            Self::Location(l) => &l.id,
            Self::Profile(p) => &p.id,
            Self::Tag(t) => &t.id,
        }
    }

    /// The owning user, where the kind has one
    ///
    /// A user record is its own owner.
    #[must_use]
    pub fn owner(&self) -> &RecordId {
        match self {
            Self::User(u) => &u.id,
            Self::Event(e) => &e.owner,
            Self::Task(t) => &t.owner,
            Self::Location(l) => &l.owner,
            Self::Profile(p) => &p.owner,
            Self::Tag(t) => &t.owner,
        }
    }
}
