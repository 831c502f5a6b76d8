//! In-memory storage
//!
//! Reference implementation of [`Storage`] backed by a single record map and
//! a [`ChangeHub`]. Changes are published while the map lock is held, so
//! emission order always matches commit order.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use super::Storage;
use crate::changes::{Change, ChangeHub, ChangeKind, ChangeStream};
use crate::error::{RelayError, Result};
use crate::types::{Event, Location, Profile, Record, RecordId, Tag, Task, User};

/// In-memory [`Storage`] implementation
pub struct MemStore {
    hub: ChangeHub,
    records: Mutex<HashMap<RecordId, Record>>,
}

impl MemStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            hub: ChangeHub::new(),
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Create a user registered with the given phone number
    ///
    /// Writes the user record and a profile carrying the phone, so
    /// [`Storage::user_for_phone`] resolves it.
    pub async fn seed_user(&self, phone: &str) -> Result<User> {
        let user = User { id: self.new_id() };
        self.save(Record::User(user.clone())).await?;

        let now = Utc::now();
        let profile = Profile {
            id: self.new_id(),
            owner: user.id.clone(),
            phone: Some(phone.to_string()),
            location_id: None,
            created_at: now,
            updated_at: now,
        };
        self.save(Record::Profile(profile)).await?;

        Ok(user)
    }

    /// Shut down the change feed, terminating every subscription
    pub fn close(&self) {
        self.hub.close();
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemStore {
    fn changes(&self) -> ChangeStream {
        self.hub.subscribe()
    }

    fn new_id(&self) -> RecordId {
        RecordId::generate()
    }

    async fn can_read(&self, principal: &User, record: &Record) -> Result<bool> {
        Ok(record.owner() == &principal.id)
    }

    async fn user_for_phone(&self, phone: &str) -> Result<Option<User>> {
        let records = self.records.lock();
        let owner = records.values().find_map(|r| match r {
            Record::Profile(p) if p.phone.as_deref() == Some(phone) => Some(p.owner.clone()),
            _ => None,
        });
        Ok(owner.map(|id| User { id }))
    }

    async fn tag_named(&self, owner: &User, name: &str) -> Result<Tag> {
        {
            let records = self.records.lock();
            let found = records.values().find_map(|r| match r {
                Record::Tag(t) if t.owner == owner.id && t.name == name => Some(t.clone()),
                _ => None,
            });
            if let Some(tag) = found {
                return Ok(tag);
            }
        }

        let tag = Tag {
            id: self.new_id(),
            owner: owner.id.clone(),
            name: name.to_string(),
        };
        self.save(Record::Tag(tag.clone())).await?;
        Ok(tag)
    }

    async fn find_task(&self, id: &RecordId) -> Result<Task> {
        let records = self.records.lock();
        match records.get(id) {
            Some(Record::Task(t)) => Ok(t.clone()),
            _ => Err(RelayError::not_found(format!("task {id}"))),
        }
    }

    async fn profile_for(&self, owner: &User) -> Result<Option<Profile>> {
        let records = self.records.lock();
        Ok(records.values().find_map(|r| match r {
            Record::Profile(p) if p.owner == owner.id => Some(p.clone()),
            _ => None,
        }))
    }

    async fn event_location(&self, event: &Event) -> Result<Option<Location>> {
        let Some(location_id) = &event.location_id else {
            return Ok(None);
        };
        let records = self.records.lock();
        Ok(match records.get(location_id) {
            Some(Record::Location(l)) => Some(l.clone()),
            _ => None,
        })
    }

    async fn save(&self, record: Record) -> Result<Record> {
        let mut records = self.records.lock();
        let kind = if records.contains_key(record.id()) {
            ChangeKind::Update
        } else {
            ChangeKind::Create
        };
        records.insert(record.id().clone(), record.clone());
        // Publish before releasing the lock: emission order == commit order.
        self.hub.publish(&Change::new(kind, record.clone()));
        Ok(record)
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        let mut records = self.records.lock();
        match records.remove(id) {
            Some(record) => {
                self.hub.publish(&Change::new(ChangeKind::Delete, record));
                Ok(())
            }
            None => Err(RelayError::not_found(format!("record {id}"))),
        }
    }
}
