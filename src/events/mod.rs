use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::{date_key, CalendarDate};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("event text cannot be empty")]
    EmptyText,
}

/// Notes attached to calendar days, keyed by `YYYY-MM-DD`.
///
/// Each key holds at least one entry; removing the last entry for a day drops
/// the key. Keys and entries keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventStore {
    entries: IndexMap<String, Vec<String>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        let mut store: EventStore = serde_json::from_str(raw)?;
        store.entries.retain(|_, events| !events.is_empty());
        Ok(store)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn add_event(&mut self, date: &CalendarDate, text: &str) -> Result<(), EventError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EventError::EmptyText);
        }
        self.entries
            .entry(date_key(date))
            .or_default()
            .push(text.to_string());
        Ok(())
    }

    /// Removes the entry at `index` for `date`, returning it. Unknown dates and
    /// out-of-range indexes leave the store untouched.
    pub fn delete_event(&mut self, date: &CalendarDate, index: usize) -> Option<String> {
        let key = date_key(date);
        let events = self.entries.get_mut(&key)?;
        if index >= events.len() {
            return None;
        }
        let removed = events.remove(index);
        if events.is_empty() {
            self.entries.shift_remove(&key);
        }
        Some(removed)
    }

    pub fn events_for(&self, date: &CalendarDate) -> &[String] {
        self.entries
            .get(&date_key(date))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn event_count(&self, date: &CalendarDate) -> usize {
        self.events_for(date).len()
    }

    pub fn contains_date(&self, date: &CalendarDate) -> bool {
        self.entries.contains_key(&date_key(date))
    }

    /// Date keys with at least one event, in insertion order.
    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, events)| (key.as_str(), events.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_events(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn date(year: i32, month: u8, day: u8) -> CalendarDate {
        CalendarDate::new(year, month, day).expect("valid date")
    }

    #[test]
    fn events_keep_insertion_order() -> anyhow::Result<()> {
        let mut store = EventStore::new();
        let day = date(2024, 2, 5);
        store.add_event(&day, "Dentist")?;
        store.add_event(&day, "Meeting")?;
        assert_eq!(store.events_for(&day), ["Dentist", "Meeting"]);
        assert_eq!(store.event_count(&day), 2);
        assert_eq!(store.total_events(), 2);
        Ok(())
    }

    #[test]
    fn blank_text_is_rejected_without_changes() -> anyhow::Result<()> {
        let mut store = EventStore::new();
        let day = date(2024, 2, 5);
        store.add_event(&day, "keep")?;
        let before = store.clone();
        assert_matches!(store.add_event(&day, "   "), Err(EventError::EmptyText));
        assert_matches!(store.add_event(&date(2024, 2, 6), ""), Err(EventError::EmptyText));
        assert_eq!(store, before);
        Ok(())
    }

    #[test]
    fn added_text_is_trimmed() -> anyhow::Result<()> {
        let mut store = EventStore::new();
        let day = date(2024, 2, 5);
        store.add_event(&day, "  Call Mom \n")?;
        assert_eq!(store.events_for(&day), ["Call Mom"]);
        Ok(())
    }

    #[test]
    fn deleting_last_event_drops_the_key() -> anyhow::Result<()> {
        let mut store = EventStore::from_json(r#"{"2024-03-05":["x"]}"#)?;
        let removed = store.delete_event(&date(2024, 2, 5), 0);
        assert_eq!(removed.as_deref(), Some("x"));
        assert!(store.is_empty());
        assert_eq!(store.to_json()?, "{}");
        Ok(())
    }

    #[test]
    fn delete_preserves_order_of_remaining_events() -> anyhow::Result<()> {
        let mut store = EventStore::new();
        let day = date(2024, 2, 5);
        for text in ["a", "b", "c"] {
            store.add_event(&day, text)?;
        }
        assert_eq!(store.delete_event(&day, 1).as_deref(), Some("b"));
        assert_eq!(store.events_for(&day), ["a", "c"]);
        assert!(store.contains_date(&day));
        Ok(())
    }

    #[test]
    fn delete_ignores_unknown_dates_and_bad_indexes() -> anyhow::Result<()> {
        let mut store = EventStore::new();
        let day = date(2024, 2, 5);
        store.add_event(&day, "only")?;
        let before = store.clone();
        assert_eq!(store.delete_event(&day, 1), None);
        assert_eq!(store.delete_event(&date(2024, 2, 6), 0), None);
        assert_eq!(store, before);
        Ok(())
    }

    #[test]
    fn decoding_drops_empty_entries() -> anyhow::Result<()> {
        let store = EventStore::from_json(r#"{"2024-03-05":[],"2024-03-06":["kept"]}"#)?;
        assert_eq!(store.len(), 1);
        assert_eq!(store.dates().collect::<Vec<_>>(), vec!["2024-03-06"]);
        Ok(())
    }

    #[test]
    fn json_form_is_an_object_of_arrays() -> anyhow::Result<()> {
        let mut store = EventStore::new();
        store.add_event(&date(2024, 2, 6), "second day")?;
        store.add_event(&date(2024, 2, 5), "first day")?;
        assert_eq!(
            store.to_json()?,
            r#"{"2024-03-06":["second day"],"2024-03-05":["first day"]}"#
        );
        assert!(EventStore::from_json("[1, 2]").is_err());
        Ok(())
    }
}
