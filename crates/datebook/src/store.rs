//! The event store: a flat list of events persisted as one JSON array under a
//! single storage key.
//!
//! Every mutation reads the whole list, changes it, and writes the whole list
//! back. Reads never fail: an unreadable or corrupt slot is logged and treated
//! as empty. Writes propagate storage errors unchanged.

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::event::CalendarEvent;
use crate::index::DateIndex;
use crate::storage::KeyValueStorage;
use crate::time;

/// The slot the browser build has always used.
pub const DEFAULT_STORAGE_KEY: &str = "calendarEvents";

#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Storage key holding the serialized event array.
    pub key: String,
    /// Zone in which calendar days are judged.
    pub timezone: Tz,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_STORAGE_KEY.to_string(),
            timezone: Tz::UTC,
        }
    }
}

impl StoreConfig {
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Set the zone from an IANA name, e.g. `"Europe/Oslo"`.
    pub fn with_timezone(mut self, name: &str) -> Result<Self> {
        self.timezone = time::parse_timezone(name)?;
        Ok(self)
    }
}

/// Handle over the persisted event list. It owns its storage medium; there is
/// exactly one writer.
#[derive(Debug)]
pub struct EventStore<S> {
    storage: S,
    config: StoreConfig,
}

impl<S: KeyValueStorage> EventStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, StoreConfig::default())
    }

    pub fn with_config(storage: S, config: StoreConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn timezone(&self) -> &Tz {
        &self.config.timezone
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Every stored event, in stored order.
    pub fn list_all(&self) -> Vec<CalendarEvent> {
        match self.storage.get(&self.config.key) {
            Ok(Some(blob)) => decode_events(&blob),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(
                    key = %self.config.key,
                    error = %e,
                    "could not read stored events, treating as empty"
                );
                Vec::new()
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<CalendarEvent> {
        self.list_all().into_iter().find(|e| e.id == id)
    }

    /// Insert or replace by id. The first event with a matching id is
    /// replaced in place; otherwise the event is appended.
    ///
    /// The event is normalized and validated first; the stored form is
    /// returned.
    pub fn save(&mut self, mut event: CalendarEvent) -> Result<CalendarEvent> {
        event.normalize();
        event.validate()?;

        let mut events = self.list_all();
        match events.iter_mut().find(|e| e.id == event.id) {
            Some(existing) => {
                debug!(id = %event.id, "replacing event");
                *existing = event.clone();
            }
            None => {
                debug!(id = %event.id, "adding event");
                events.push(event.clone());
            }
        }
        self.persist(&events)?;
        Ok(event)
    }

    /// Remove the first event with `id`. Returns whether anything was
    /// removed; an unknown id is not an error, but the list is still
    /// written back.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let mut events = self.list_all();
        let removed = match events.iter().position(|e| e.id == id) {
            Some(pos) => {
                events.remove(pos);
                true
            }
            None => false,
        };
        debug!(id, removed, "delete");
        self.persist(&events)?;
        Ok(removed)
    }

    /// Events whose anchor falls on `day` in the store's zone. Calendar-day
    /// equality, not a time-range comparison.
    pub fn events_on(&self, day: NaiveDate) -> Vec<CalendarEvent> {
        self.index().events_on(day)
    }

    pub fn has_events(&self, day: NaiveDate) -> bool {
        self.index().has_events(day)
    }

    pub fn has_important_events(&self, day: NaiveDate) -> bool {
        self.index().has_important_events(day)
    }

    /// A fresh index over the current contents.
    pub fn index(&self) -> DateIndex {
        DateIndex::new(self.list_all(), self.config.timezone)
    }

    fn persist(&mut self, events: &[CalendarEvent]) -> Result<()> {
        let blob = serde_json::to_string(events)?;
        self.storage.set(&self.config.key, &blob)
    }
}

/// Decode a persisted blob. Anything that is not a JSON array yields no
/// events; records that fail to decode are skipped individually.
fn decode_events(blob: &str) -> Vec<CalendarEvent> {
    let records = match serde_json::from_str::<Value>(blob) {
        Ok(Value::Array(records)) => records,
        Ok(other) => {
            warn!(kind = json_kind(&other), "stored events are not an array, treating as empty");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = %e, "stored events are not valid JSON, treating as empty");
            return Vec::new();
        }
    };

    records
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| match serde_json::from_value::<CalendarEvent>(record) {
            Ok(mut event) => {
                event.normalize();
                Some(event)
            }
            Err(e) => {
                warn!(index = i, error = %e, "skipping malformed stored event");
                None
            }
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
