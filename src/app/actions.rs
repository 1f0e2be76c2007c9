use crate::calendar::CalendarDate;
use crate::events::{EventError, EventStore};
use crate::storage::{self, SlotStore};

/// Result of writing the store back after a mutation. The in-memory change
/// stands either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Failed(String),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved)
    }
}

pub struct ActionDispatcher<'a> {
    storage: &'a dyn SlotStore,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(storage: &'a dyn SlotStore) -> Self {
        Self { storage }
    }

    pub fn add_event(
        &self,
        store: &mut EventStore,
        date: &CalendarDate,
        text: &str,
    ) -> Result<SaveOutcome, EventError> {
        store.add_event(date, text)?;
        tracing::debug!(date = %date.key(), "event added");
        Ok(self.persist(store))
    }

    /// Removes the event at `index`; absent dates and out-of-range indexes
    /// leave the store and the slot untouched.
    pub fn delete_event(
        &self,
        store: &mut EventStore,
        date: &CalendarDate,
        index: usize,
    ) -> Option<(String, SaveOutcome)> {
        let removed = store.delete_event(date, index)?;
        tracing::debug!(date = %date.key(), index, "event deleted");
        Some((removed, self.persist(store)))
    }

    fn persist(&self, store: &EventStore) -> SaveOutcome {
        match storage::save(self.storage, store) {
            Ok(()) => SaveOutcome::Saved,
            Err(err) => {
                tracing::error!(?err, "failed to persist events");
                SaveOutcome::Failed(format!("{err:#}"))
            }
        }
    }
}
