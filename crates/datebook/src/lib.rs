//! # datebook
//!
//! Core of a single-user personal calendar.
//!
//! Events live in one flat list serialized into a single key-value slot. On top
//! of that store sit the calendar-day queries the grid needs, on-the-fly
//! recurrence expansion, and a reminder scheduler that arms one timer per
//! `(event, offset)` pair and hands fired reminders to a notification gateway.
//!
//! ## Modules
//!
//! - [`event`]: `CalendarEvent`, `RecurrenceRule` and the model invariants
//! - [`category`]: the fixed category table (labels and colors)
//! - [`time`]: zone-aware parsing, calendar-day and month arithmetic helpers
//! - [`storage`]: the injected key-value medium (`MemoryStorage`, `FileStorage`)
//! - [`store`]: `EventStore` (list, upsert, delete, events on a day)
//! - [`index`]: calendar-day queries for the grid
//! - [`recurrence`]: recurrence rule → occurrence dates within a window
//! - [`reminder`]: reminder fire times and the timer-tracking scheduler
//! - [`notify`]: the notification gateway contract and notification content
//! - [`filter`]: search and filter composition
//! - [`weather`]: weather collaborator contract and deterministic fallback
//! - [`error`]: Error types

pub mod category;
pub mod error;
pub mod event;
pub mod filter;
pub mod index;
pub mod notify;
pub mod recurrence;
pub mod reminder;
pub mod storage;
pub mod store;
pub mod time;
pub mod weather;

pub use category::{Category, CategoryInfo};
pub use error::DatebookError;
pub use event::{CalendarEvent, RecurrenceRule, RecurrenceType};
pub use filter::{DateRange, EventFilter};
pub use index::{DateIndex, DatedOccurrence, DayMarker};
pub use notify::{MemoryGateway, Notification, NotificationGateway, Permission};
pub use recurrence::{expand_occurrences, Occurrences, Window};
pub use reminder::{
    initialize_notifications, plan_reminders, ManualTimers, Reminder, ReminderScheduler, Timers,
};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::{EventStore, StoreConfig};
pub use weather::{
    forecast_or_fallback, mock_forecast, mock_weather, weather_or_fallback, Coordinates, Forecast,
    WeatherData, WeatherProvider,
};
