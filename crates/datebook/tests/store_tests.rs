//! Tests for the event store and the calendar-day index.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use datebook::store::DEFAULT_STORAGE_KEY;
use datebook::{
    CalendarEvent, Category, DatebookError, EventStore, KeyValueStorage, MemoryStorage,
    RecurrenceRule, RecurrenceType, StoreConfig,
};

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn store() -> EventStore<MemoryStorage> {
    EventStore::new(MemoryStorage::new())
}

// ---------------------------------------------------------------------------
// list / save / delete
// ---------------------------------------------------------------------------

#[test]
fn empty_store_lists_nothing() {
    assert!(store().list_all().is_empty());
}

#[test]
fn saved_event_round_trips() {
    let mut store = store();
    let event = CalendarEvent::new("Quarterly review", at(2026, 4, 14, 9, 30))
        .with_description("Room 4B")
        .with_important(true)
        .with_category(Category::Work)
        .with_recurrence(RecurrenceRule::new(RecurrenceType::Monthly).every(3).times(4))
        .with_reminders([15, 60]);

    store.save(event.clone()).unwrap();

    let all = store.list_all();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0], event);
}

#[test]
fn saving_twice_with_same_id_keeps_one_event() {
    let mut store = store();
    let event = CalendarEvent::new("Draft", at(2026, 4, 14, 9, 0)).with_id("e1");
    store.save(event.clone()).unwrap();
    store.save(event.clone()).unwrap();

    let all = store.list_all();
    assert_eq!(all.iter().filter(|e| e.id == "e1").count(), 1);
}

#[test]
fn save_replaces_in_place_and_keeps_order() {
    let mut store = store();
    for id in ["a", "b", "c"] {
        store
            .save(CalendarEvent::new(id.to_uppercase(), at(2026, 4, 14, 9, 0)).with_id(id))
            .unwrap();
    }
    store
        .save(CalendarEvent::new("B, edited", at(2026, 4, 15, 10, 0)).with_id("b"))
        .unwrap();

    let all = store.list_all();
    let ids: Vec<&str> = all.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
    assert_eq!(all[1].title, "B, edited");
}

#[test]
fn save_rejects_blank_title_and_leaves_store_untouched() {
    let mut store = store();
    let err = store
        .save(CalendarEvent::new("  ", at(2026, 4, 14, 9, 0)))
        .unwrap_err();
    assert!(matches!(err, DatebookError::InvalidEvent(_)));
    assert_eq!(store.storage().get(DEFAULT_STORAGE_KEY).unwrap(), None);
}

#[test]
fn save_normalizes_before_storing() {
    let mut store = store();
    let stored = store
        .save(
            CalendarEvent::new("Plain", at(2026, 4, 14, 9, 0))
                .with_recurrence(RecurrenceRule::new(RecurrenceType::None))
                .with_reminders([]),
        )
        .unwrap();
    assert!(stored.recurrence.is_none());
    assert!(stored.reminder_minutes.is_none());

    let blob = store.storage().get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
    assert!(!blob.contains("recurrence"));
    assert!(!blob.contains("reminderMinutes"));
}

#[test]
fn delete_removes_exactly_one() {
    let mut store = store();
    for i in 0..5 {
        let event = CalendarEvent::new(format!("Event {i}"), at(2026, 4, 14, 9, 0));
        store.save(event.with_id(format!("e{i}"))).unwrap();
    }

    assert!(store.delete("e2").unwrap());

    let all = store.list_all();
    assert_eq!(all.len(), 4);
    assert!(all.iter().all(|e| e.id != "e2"));
}

#[test]
fn deleting_unknown_id_is_a_no_op() {
    let mut store = store();
    store
        .save(CalendarEvent::new("Keep", at(2026, 4, 14, 9, 0)).with_id("keep"))
        .unwrap();
    assert!(!store.delete("missing").unwrap());
    assert_eq!(store.list_all().len(), 1);
}

#[test]
fn write_failure_propagates() {
    let mut store = EventStore::new(MemoryStorage::with_capacity_limit(64));
    let err = store
        .save(
            CalendarEvent::new("A title long enough to blow a tiny quota", at(2026, 4, 14, 9, 0))
                .with_description("and then some"),
        )
        .unwrap_err();
    assert!(matches!(err, DatebookError::StorageWrite(_)));
    assert!(store.list_all().is_empty());
}

// ---------------------------------------------------------------------------
// tolerant reads
// ---------------------------------------------------------------------------

fn seeded(blob: &str) -> EventStore<MemoryStorage> {
    let mut storage = MemoryStorage::new();
    storage.insert(DEFAULT_STORAGE_KEY, blob);
    EventStore::new(storage)
}

#[test]
fn corrupt_blob_reads_as_empty() {
    assert!(seeded("{not json").list_all().is_empty());
    assert!(seeded(r#"{"id":"x"}"#).list_all().is_empty());
}

#[test]
fn malformed_records_are_skipped() {
    let store = seeded(
        r#"[
            {"id":"ok","date":"2026-04-14T09:00:00.000Z","title":"Fine"},
            {"id":"bad","date":"not a date","title":"Broken"},
            {"title":"No id"}
        ]"#,
    );
    let all = store.list_all();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, "ok");
}

#[test]
fn legacy_records_get_defaults() {
    let store = seeded(
        r#"[{"id":"old","date":"2026-04-14T09:00:00.000Z","title":"Legacy","important":true,
             "category":"errands","reminderMinutes":[],"recurrence":{"type":"none"}}]"#,
    );
    let event = &store.list_all()[0];
    assert_eq!(event.category, Category::Other);
    assert!(event.important);
    assert!(event.reminder_minutes.is_none());
    assert!(event.recurrence.is_none());
}

#[test]
fn custom_key_is_honoured() {
    let config = StoreConfig::default().with_key("work-calendar");
    let mut store = EventStore::with_config(MemoryStorage::new(), config);
    store
        .save(CalendarEvent::new("Sync", at(2026, 4, 14, 9, 0)))
        .unwrap();
    assert!(store.storage().get("work-calendar").unwrap().is_some());
    assert!(store.storage().get(DEFAULT_STORAGE_KEY).unwrap().is_none());
}

// ---------------------------------------------------------------------------
// calendar-day queries
// ---------------------------------------------------------------------------

#[test]
fn same_day_different_times_both_match() {
    let mut store = store();
    store
        .save(CalendarEvent::new("Breakfast", at(2026, 4, 14, 7, 0)))
        .unwrap();
    store
        .save(CalendarEvent::new("Late call", at(2026, 4, 14, 23, 30)))
        .unwrap();
    store
        .save(CalendarEvent::new("Next day", at(2026, 4, 15, 0, 0)))
        .unwrap();

    let on_day = store.events_on(day(2026, 4, 14));
    assert_eq!(on_day.len(), 2);
    assert!(store.has_events(day(2026, 4, 15)));
    assert!(!store.has_events(day(2026, 4, 16)));
}

#[test]
fn calendar_day_is_judged_in_store_zone() {
    let config = StoreConfig::default()
        .with_timezone("America/Los_Angeles")
        .unwrap();
    let mut store = EventStore::with_config(MemoryStorage::new(), config);
    // 03:00 UTC on the 15th is 20:00 PDT on the 14th.
    store
        .save(CalendarEvent::new("Evening", at(2026, 4, 15, 3, 0)))
        .unwrap();

    assert_eq!(store.events_on(day(2026, 4, 14)).len(), 1);
    assert!(store.events_on(day(2026, 4, 15)).is_empty());
}

#[test]
fn important_flag_drives_important_query() {
    let mut store = store();
    store
        .save(CalendarEvent::new("Routine", at(2026, 4, 14, 9, 0)))
        .unwrap();
    assert!(store.has_events(day(2026, 4, 14)));
    assert!(!store.has_important_events(day(2026, 4, 14)));

    store
        .save(CalendarEvent::new("Deadline", at(2026, 4, 14, 17, 0)).with_important(true))
        .unwrap();
    assert!(store.has_important_events(day(2026, 4, 14)));
}

#[test]
fn month_markers_cover_every_day() {
    let mut store = store();
    store
        .save(CalendarEvent::new("Payday", at(2026, 2, 27, 9, 0)).with_important(true))
        .unwrap();
    store
        .save(CalendarEvent::new("Coffee", at(2026, 2, 3, 9, 0)))
        .unwrap();

    let markers = store.index().month_markers(2026, 2);
    assert_eq!(markers.len(), 28);
    assert!(markers[2].has_events && !markers[2].has_important);
    assert!(markers[26].has_events && markers[26].has_important);
    assert_eq!(markers.iter().filter(|m| m.has_events).count(), 2);
}

#[test]
fn month_occurrences_expand_recurring_events() {
    let mut store = store();
    store
        .save(
            CalendarEvent::new("Standup", at(2026, 1, 5, 9, 0))
                .with_id("standup")
                .with_recurrence(RecurrenceRule::new(RecurrenceType::Weekly)),
        )
        .unwrap();
    store
        .save(CalendarEvent::new("Dentist", at(2026, 2, 11, 14, 0)).with_id("dentist"))
        .unwrap();

    let occurrences = store.index().occurrences_in_month(2026, 2);
    let days: Vec<(u32, &str)> = occurrences
        .iter()
        .map(|o| (chrono::Datelike::day(&o.date), o.event.id.as_str()))
        .collect();
    assert_eq!(
        days,
        [
            (2, "standup"),
            (9, "standup"),
            (11, "dentist"),
            (16, "standup"),
            (23, "standup")
        ]
    );
}
