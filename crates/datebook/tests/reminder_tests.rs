//! Tests for reminder planning, the timer-tracking scheduler and the
//! notification gateway wiring.

use chrono::{DateTime, Duration, TimeZone, Utc};
use datebook::reminder::fire_time;
use datebook::{
    initialize_notifications, plan_reminders, CalendarEvent, ManualTimers, MemoryGateway,
    NotificationGateway, Permission, ReminderScheduler,
};

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn meeting(reminders: &[u32]) -> CalendarEvent {
    CalendarEvent::new("Planning", at(2026, 5, 4, 14, 0))
        .with_id("planning")
        .with_reminders(reminders.iter().copied())
}

fn scheduler() -> ReminderScheduler<ManualTimers> {
    ReminderScheduler::new(ManualTimers::new())
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

#[test]
fn fire_time_is_event_time_minus_offset() {
    let event = meeting(&[]);
    assert_eq!(fire_time(&event, 0), event.date);
    assert_eq!(fire_time(&event, 90), at(2026, 5, 4, 12, 30));
}

#[test]
fn past_reminders_are_not_planned() {
    let event = meeting(&[0, 30, 120]);
    // 13:00: the 120-minute reminder (12:00) has passed.
    let planned = plan_reminders(&event, at(2026, 5, 4, 13, 0));
    let offsets: Vec<u32> = planned.iter().map(|r| r.offset_minutes).collect();
    assert_eq!(offsets, [0, 30]);
}

#[test]
fn reminder_exactly_now_is_not_planned() {
    let event = meeting(&[30]);
    assert!(plan_reminders(&event, at(2026, 5, 4, 13, 30)).is_empty());
}

#[test]
fn event_without_reminders_plans_nothing() {
    assert!(plan_reminders(&meeting(&[]), at(2026, 5, 1, 0, 0)).is_empty());
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

#[test]
fn no_timer_armed_for_past_fire_time() {
    let mut scheduler = scheduler();
    let armed = scheduler.schedule(&meeting(&[60]), at(2026, 5, 4, 13, 30));
    assert!(armed.is_empty());
    assert_eq!(scheduler.armed_count(), 0);
    assert_eq!(scheduler.timers().pending(), 0);
}

#[test]
fn each_offset_gets_its_own_timer() {
    let mut scheduler = scheduler();
    scheduler.schedule(&meeting(&[0, 15, 60]), at(2026, 5, 1, 0, 0));
    assert_eq!(scheduler.armed_count(), 3);
    assert!(scheduler.is_armed("planning", 0));
    assert!(scheduler.is_armed("planning", 15));
    assert!(scheduler.is_armed("planning", 60));
}

#[test]
fn rescheduling_an_edit_cancels_stale_timers() {
    let mut scheduler = scheduler();
    let now = at(2026, 5, 1, 0, 0);
    scheduler.schedule(&meeting(&[15, 60]), now);

    // The edit drops the 60-minute reminder and adds a 5-minute one.
    scheduler.schedule(&meeting(&[5, 15]), now);

    assert!(!scheduler.is_armed("planning", 60));
    assert!(scheduler.is_armed("planning", 5));
    assert!(scheduler.is_armed("planning", 15));
    assert_eq!(scheduler.timers().pending(), 2);
}

#[test]
fn repeated_offset_arms_a_single_cancellable_timer() {
    let mut scheduler = scheduler();
    let now = at(2026, 5, 1, 0, 0);
    // Not normalized: the event never went through the store.
    let event = meeting(&[10, 10]);

    assert_eq!(plan_reminders(&event, now).len(), 1);
    let armed = scheduler.schedule(&event, now);
    assert_eq!(armed.len(), 1);
    assert_eq!(scheduler.armed_count(), 1);
    assert_eq!(scheduler.timers().pending(), 1);

    assert_eq!(scheduler.cancel_all_for("planning"), 1);
    assert_eq!(scheduler.timers().pending(), 0);
    let gateway = MemoryGateway::granted();
    assert!(scheduler.fire_due(at(2026, 5, 4, 14, 0), &gateway).is_empty());
    assert!(gateway.drain().is_empty());
}

#[test]
fn cancel_all_for_touches_only_that_event() {
    let mut scheduler = scheduler();
    let now = at(2026, 5, 1, 0, 0);
    scheduler.schedule(&meeting(&[15, 60]), now);
    let other = CalendarEvent::new("Other", at(2026, 5, 4, 9, 0))
        .with_id("other")
        .with_reminders([10]);
    scheduler.schedule(&other, now);

    assert_eq!(scheduler.cancel_all_for("planning"), 2);
    assert_eq!(scheduler.armed_count(), 1);
    assert!(scheduler.is_armed("other", 10));
    assert_eq!(scheduler.cancel_all_for("planning"), 0);
}

#[test]
fn due_timers_fire_in_order_through_gateway() {
    let mut scheduler = scheduler();
    let gateway = MemoryGateway::granted();
    scheduler.schedule(&meeting(&[0, 15, 60]), at(2026, 5, 4, 9, 0));

    let fired = scheduler.fire_due(at(2026, 5, 4, 13, 50), &gateway);
    let offsets: Vec<u32> = fired.iter().map(|r| r.offset_minutes).collect();
    assert_eq!(offsets, [60, 15]);

    let shown = gateway.drain();
    assert_eq!(shown.len(), 2);
    assert_eq!(shown[0].body, "Reminder: Planning starts in 60 minutes");
    assert_eq!(shown[1].body, "Reminder: Planning starts in 15 minutes");

    assert_eq!(scheduler.armed_count(), 1);
    assert!(scheduler.is_armed("planning", 0));

    // Firing again at the same instant is a no-op.
    assert!(scheduler.fire_due(at(2026, 5, 4, 13, 50), &gateway).is_empty());
}

#[test]
fn firing_without_permission_shows_nothing() {
    let mut scheduler = scheduler();
    let gateway = MemoryGateway::new(Permission::Denied);
    scheduler.schedule(&meeting(&[15]), at(2026, 5, 4, 9, 0));

    let fired = scheduler.fire_due(at(2026, 5, 4, 14, 0), &gateway);
    assert_eq!(fired.len(), 1);
    assert!(gateway.drain().is_empty());
}

#[test]
fn prune_forgets_fired_entries() {
    let mut scheduler = scheduler();
    scheduler.schedule(&meeting(&[0, 60]), at(2026, 5, 4, 9, 0));
    scheduler.prune_fired(at(2026, 5, 4, 13, 30));
    assert!(!scheduler.is_armed("planning", 60));
    assert!(scheduler.is_armed("planning", 0));
}

#[test]
fn armed_list_is_ordered_by_fire_time() {
    let mut scheduler = scheduler();
    let now = at(2026, 5, 1, 0, 0);
    scheduler.schedule(&meeting(&[0, 1440]), now);
    let early = CalendarEvent::new("Early", at(2026, 5, 2, 8, 0))
        .with_id("early")
        .with_reminders([0]);
    scheduler.schedule(&early, now);

    let fire_times: Vec<DateTime<Utc>> = scheduler.armed().iter().map(|r| r.fire_at).collect();
    let mut sorted = fire_times.clone();
    sorted.sort();
    assert_eq!(fire_times, sorted);
    assert_eq!(scheduler.armed()[0].event_id, "early");
}

// ---------------------------------------------------------------------------
// Initialisation
// ---------------------------------------------------------------------------

#[test]
fn initialisation_schedules_only_when_granted() {
    let events = vec![meeting(&[15]), meeting(&[30]).with_id("second")];
    let now = at(2026, 5, 1, 0, 0);

    let mut refused = scheduler();
    let denied = MemoryGateway::new(Permission::Denied);
    assert!(!initialize_notifications(&denied, &mut refused, &events, now));
    assert_eq!(refused.armed_count(), 0);

    let mut accepted = scheduler();
    let granted = MemoryGateway::new(Permission::Granted);
    assert!(initialize_notifications(&granted, &mut accepted, &events, now));
    assert_eq!(granted.permission(), Permission::Granted);
    assert_eq!(accepted.armed_count(), 2);
}

#[test]
fn restart_rescheduling_skips_what_already_passed() {
    let events = vec![
        meeting(&[15]),
        CalendarEvent::new("Yesterday", at(2026, 5, 3, 9, 0))
            .with_id("past")
            .with_reminders([0]),
    ];
    let mut scheduler = scheduler();
    let armed = scheduler.schedule_all(&events, at(2026, 5, 4, 0, 0) + Duration::hours(1));
    assert_eq!(armed, 1);
    assert!(!scheduler.is_armed("past", 0));
}
