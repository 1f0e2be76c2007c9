use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::{Context, Result};

use crate::config::{StorageBackend, StorageOptions};
use crate::events::EventStore;

mod file;
mod schema;
mod sqlite;

pub use file::FileSlots;
pub use sqlite::SqliteSlots;

/// Fixed slot holding the serialized event store.
pub const EVENTS_SLOT: &str = "calendarEvents";

/// Minimal key-value persistence the calendar core depends on.
pub trait SlotStore {
    fn read_slot(&self, key: &str) -> Result<Option<String>>;
    fn write_slot(&self, key: &str, value: &str) -> Result<()>;
}

/// Opens the backend selected in config.
pub fn open(options: &StorageOptions) -> Result<Box<dyn SlotStore>> {
    match options.backend {
        StorageBackend::Sqlite => {
            let slots = SqliteSlots::open(options).context("opening sqlite slot storage")?;
            tracing::debug!(
                backend = %options.backend,
                path = %slots.database_path().display(),
                "opened slot storage"
            );
            Ok(Box::new(slots))
        }
        StorageBackend::Json => {
            let slots =
                FileSlots::open(options.slots_dir.clone()).context("opening json slot storage")?;
            tracing::debug!(
                backend = %options.backend,
                dir = %slots.dir().display(),
                "opened slot storage"
            );
            Ok(Box::new(slots))
        }
    }
}

/// Loads the event store, treating an absent, unreadable or corrupt slot as
/// an empty store.
pub fn load(storage: &dyn SlotStore) -> EventStore {
    let raw = match storage.read_slot(EVENTS_SLOT) {
        Ok(Some(raw)) => raw,
        Ok(None) => return EventStore::default(),
        Err(err) => {
            tracing::warn!(?err, "failed to read stored events, starting empty");
            return EventStore::default();
        }
    };
    match EventStore::from_json(&raw) {
        Ok(store) => {
            tracing::debug!(dates = store.len(), "loaded events");
            store
        }
        Err(err) => {
            tracing::warn!(%err, "stored events are malformed, starting empty");
            EventStore::default()
        }
    }
}

/// Overwrites the slot with the full store.
pub fn save(storage: &dyn SlotStore, store: &EventStore) -> Result<()> {
    let json = store.to_json().context("serialising events")?;
    storage
        .write_slot(EVENTS_SLOT, &json)
        .context("persisting events")
}

/// Process-local slots, used by tests and embedders without a data dir.
#[derive(Debug, Default)]
pub struct MemorySlots {
    slots: RefCell<HashMap<String, String>>,
}

impl MemorySlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(key: &str, value: &str) -> Self {
        let slots = Self::default();
        slots
            .slots
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        slots
    }
}

impl SlotStore for MemorySlots {
    fn read_slot(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.borrow().get(key).cloned())
    }

    fn write_slot(&self, key: &str, value: &str) -> Result<()> {
        self.slots
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
