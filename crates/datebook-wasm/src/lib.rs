//! WASM bindings for datebook.
//!
//! Exposes the event store, calendar-day queries, recurrence expansion,
//! filtering and reminder planning to the browser UI via `wasm-bindgen`.
//! Complex values cross the boundary as JSON strings.
//!
//! The JavaScript side owns the `localStorage` slot: store operations take the
//! current blob (or `undefined` when the slot is empty) and mutating ones
//! return the blob to write back. Reminder timers are armed by JavaScript from
//! the fire times [`plan_reminders`] returns.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p datebook-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir web/pkg/ \
//!   target/wasm32-unknown-unknown/release/datebook_wasm.wasm
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use datebook::event::{describe_offset, REMINDER_PRESETS};
use datebook::store::DEFAULT_STORAGE_KEY;
use datebook::time;
use datebook::{
    expand_occurrences, mock_forecast, mock_weather, CalendarEvent, Category, EventFilter,
    EventStore, MemoryStorage, Notification, StoreConfig, Window,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CategoryDto {
    key: &'static str,
    label: &'static str,
    color: &'static str,
    bg_color: &'static str,
}

#[derive(Serialize)]
struct ReminderPresetDto {
    value: u32,
    label: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReminderDto {
    event_id: String,
    offset_minutes: u32,
    fire_at: String,
    /// Milliseconds from `now` until the reminder should fire, ready for
    /// `setTimeout`.
    delay_ms: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OccurrenceDto {
    event_id: String,
    date: NaiveDate,
    at: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn parse_tz(timezone: &str) -> Result<Tz, JsValue> {
    time::parse_timezone(timezone).map_err(js_err)
}

fn parse_date(s: &str) -> Result<NaiveDate, JsValue> {
    time::parse_date(s).map_err(js_err)
}

fn parse_instant(s: &str, tz: &Tz) -> Result<DateTime<Utc>, JsValue> {
    time::parse_datetime_in(s, tz).map_err(js_err)
}

fn parse_event(json: &str) -> Result<CalendarEvent, JsValue> {
    serde_json::from_str(json).map_err(|e| JsValue::from_str(&format!("Invalid event JSON: {}", e)))
}

/// A store over an in-memory copy of the slot.
fn store_from_blob(
    blob: Option<String>,
    timezone: &str,
) -> Result<EventStore<MemoryStorage>, JsValue> {
    let config = StoreConfig::default().with_timezone(timezone).map_err(js_err)?;
    let mut storage = MemoryStorage::new();
    if let Some(blob) = blob {
        storage.insert(DEFAULT_STORAGE_KEY, blob);
    }
    Ok(EventStore::with_config(storage, config))
}

fn blob_of(store: &EventStore<MemoryStorage>) -> Result<String, JsValue> {
    to_json(&store.list_all())
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// A fresh event id for the "new event" form path.
#[wasm_bindgen(js_name = "newEventId")]
pub fn new_event_id() -> String {
    CalendarEvent::new("", Utc::now()).id
}

/// All events in the blob, normalized. A corrupt blob reads as `[]`.
#[wasm_bindgen(js_name = "listEvents")]
pub fn list_events(blob: Option<String>) -> Result<String, JsValue> {
    let store = store_from_blob(blob, "UTC")?;
    blob_of(&store)
}

/// Upsert `event_json` into the blob and return the blob to persist.
#[wasm_bindgen(js_name = "saveEvent")]
pub fn save_event(blob: Option<String>, event_json: &str) -> Result<String, JsValue> {
    let mut store = store_from_blob(blob, "UTC")?;
    store.save(parse_event(event_json)?).map_err(js_err)?;
    blob_of(&store)
}

/// Remove the event with `id` and return the blob to persist.
#[wasm_bindgen(js_name = "deleteEvent")]
pub fn delete_event(blob: Option<String>, id: &str) -> Result<String, JsValue> {
    let mut store = store_from_blob(blob, "UTC")?;
    store.delete(id).map_err(js_err)?;
    blob_of(&store)
}

/// Events anchored on `date` (`YYYY-MM-DD`) in `timezone`.
#[wasm_bindgen(js_name = "eventsOn")]
pub fn events_on(blob: Option<String>, date: &str, timezone: &str) -> Result<String, JsValue> {
    let store = store_from_blob(blob, timezone)?;
    to_json(&store.events_on(parse_date(date)?))
}

#[wasm_bindgen(js_name = "hasEvents")]
pub fn has_events(blob: Option<String>, date: &str, timezone: &str) -> Result<bool, JsValue> {
    let store = store_from_blob(blob, timezone)?;
    Ok(store.has_events(parse_date(date)?))
}

#[wasm_bindgen(js_name = "hasImportantEvents")]
pub fn has_important_events(
    blob: Option<String>,
    date: &str,
    timezone: &str,
) -> Result<bool, JsValue> {
    let store = store_from_blob(blob, timezone)?;
    Ok(store.has_important_events(parse_date(date)?))
}

/// Per-day `{date, has_events, has_important}` for a grid month.
#[wasm_bindgen(js_name = "monthMarkers")]
pub fn month_markers(
    blob: Option<String>,
    year: i32,
    month: u32,
    timezone: &str,
) -> Result<String, JsValue> {
    let store = store_from_blob(blob, timezone)?;
    to_json(&store.index().month_markers(year, month))
}

/// Every occurrence of every stored event within a grid month.
#[wasm_bindgen(js_name = "monthOccurrences")]
pub fn month_occurrences(
    blob: Option<String>,
    year: i32,
    month: u32,
    timezone: &str,
) -> Result<String, JsValue> {
    let store = store_from_blob(blob, timezone)?;
    let dtos: Vec<OccurrenceDto> = store
        .index()
        .occurrences_in_month(year, month)
        .into_iter()
        .map(|o| OccurrenceDto {
            event_id: o.event.id,
            date: o.date,
            at: o.at.to_rfc3339(),
        })
        .collect();
    to_json(&dtos)
}

// ---------------------------------------------------------------------------
// Recurrence and filtering
// ---------------------------------------------------------------------------

/// Occurrence instants (RFC 3339) of one event within `[from, to]`.
#[wasm_bindgen(js_name = "expandOccurrences")]
pub fn expand(event_json: &str, from: &str, to: &str, timezone: &str) -> Result<String, JsValue> {
    let tz = parse_tz(timezone)?;
    let event = parse_event(event_json)?;
    let window = Window::new(parse_instant(from, &tz)?, parse_instant(to, &tz)?);
    let instants: Vec<String> = expand_occurrences(&event, window, tz)
        .map(|at| at.to_rfc3339())
        .collect();
    to_json(&instants)
}

/// Apply a search/filter bar state to a JSON array of events.
#[wasm_bindgen(js_name = "filterEvents")]
pub fn filter_events(
    events_json: &str,
    filter_json: &str,
    timezone: &str,
) -> Result<String, JsValue> {
    let tz = parse_tz(timezone)?;
    let events: Vec<CalendarEvent> = serde_json::from_str(events_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid events JSON: {}", e)))?;
    let filter: EventFilter = serde_json::from_str(filter_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid filter JSON: {}", e)))?;
    to_json(&filter.apply(&events, &tz))
}

// ---------------------------------------------------------------------------
// Reminders and notifications
// ---------------------------------------------------------------------------

/// Future reminders of an event relative to `now`, with the delay to arm.
#[wasm_bindgen(js_name = "planReminders")]
pub fn plan_reminders(event_json: &str, now: &str) -> Result<String, JsValue> {
    let event = parse_event(event_json)?;
    let now = parse_instant(now, &Tz::UTC)?;
    let dtos: Vec<ReminderDto> = datebook::plan_reminders(&event, now)
        .into_iter()
        .map(|r| ReminderDto {
            delay_ms: (r.fire_at - now).num_milliseconds(),
            fire_at: r.fire_at.to_rfc3339(),
            event_id: r.event_id,
            offset_minutes: r.offset_minutes,
        })
        .collect();
    to_json(&dtos)
}

/// Title, body and tag for the notification a fired reminder shows.
#[wasm_bindgen(js_name = "notificationFor")]
pub fn notification_for(event_json: &str, offset_minutes: u32) -> Result<String, JsValue> {
    let event = parse_event(event_json)?;
    to_json(&Notification::for_event(&event, offset_minutes))
}

// ---------------------------------------------------------------------------
// Static tables and weather fallback
// ---------------------------------------------------------------------------

#[wasm_bindgen(js_name = "categories")]
pub fn categories() -> Result<String, JsValue> {
    let dtos: Vec<CategoryDto> = Category::ALL
        .into_iter()
        .map(|c| {
            let info = c.info();
            CategoryDto {
                key: c.key(),
                label: info.label,
                color: info.color,
                bg_color: info.bg_color,
            }
        })
        .collect();
    to_json(&dtos)
}

#[wasm_bindgen(js_name = "reminderPresets")]
pub fn reminder_presets() -> Result<String, JsValue> {
    let dtos: Vec<ReminderPresetDto> = REMINDER_PRESETS
        .into_iter()
        .map(|value| ReminderPresetDto {
            value,
            label: describe_offset(value),
        })
        .collect();
    to_json(&dtos)
}

#[wasm_bindgen(js_name = "mockWeather")]
pub fn weather_fallback(date: &str) -> Result<String, JsValue> {
    to_json(&mock_weather(parse_date(date)?))
}

#[wasm_bindgen(js_name = "mockForecast")]
pub fn forecast_fallback(start: &str, days: Option<u32>) -> Result<String, JsValue> {
    let days = days.unwrap_or(datebook::weather::DEFAULT_FORECAST_DAYS);
    to_json(&mock_forecast(parse_date(start)?, days))
}
