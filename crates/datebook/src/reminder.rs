//! Reminder scheduling.
//!
//! Each reminder offset on an event yields one fire time,
//! `event.date - offset`. Only fire times strictly after "now" are armed;
//! a reminder whose moment has passed is dropped, never fired late.
//!
//! The scheduler keeps every armed timer keyed by `(event id, offset)`.
//! Scheduling an event first cancels whatever was armed for it, so editing
//! an event never leaves timers for its old reminder set behind.
//! Timers live in memory only; after a restart the caller re-runs
//! [`ReminderScheduler::schedule_all`] over the stored events.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use crate::event::CalendarEvent;
use crate::notify::NotificationGateway;

/// One planned reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub event_id: String,
    pub offset_minutes: u32,
    pub fire_at: DateTime<Utc>,
}

pub fn fire_time(event: &CalendarEvent, offset_minutes: u32) -> DateTime<Utc> {
    event.date - Duration::minutes(offset_minutes as i64)
}

/// Reminders for `event` that are still ahead of `now`, in offset order.
/// A repeated offset yields one reminder.
pub fn plan_reminders(event: &CalendarEvent, now: DateTime<Utc>) -> Vec<Reminder> {
    let offsets: BTreeSet<u32> = event.reminders().iter().copied().collect();
    offsets
        .into_iter()
        .filter_map(|offset| {
            let fire_at = fire_time(event, offset);
            if fire_at <= now {
                debug!(id = %event.id, offset, %fire_at, "reminder time already passed, skipping");
                return None;
            }
            Some(Reminder {
                event_id: event.id.clone(),
                offset_minutes: offset,
                fire_at,
            })
        })
        .collect()
}

/// One-shot timer facility. On expiry a timer must call
/// [`NotificationGateway::show`] with the event and offset it was armed for.
pub trait Timers {
    type Handle;

    fn arm(&mut self, reminder: &Reminder, event: &CalendarEvent) -> Self::Handle;

    /// Withdraw a timer. Disarming one that already fired is harmless.
    fn disarm(&mut self, handle: Self::Handle);
}

struct Armed<H> {
    reminder: Reminder,
    handle: H,
}

pub struct ReminderScheduler<T: Timers> {
    timers: T,
    armed: BTreeMap<(String, u32), Armed<T::Handle>>,
}

impl<T: Timers> ReminderScheduler<T> {
    pub fn new(timers: T) -> Self {
        Self {
            timers,
            armed: BTreeMap::new(),
        }
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    /// Cancel everything armed for `event`, then arm its future reminders.
    /// Returns what was armed.
    pub fn schedule(&mut self, event: &CalendarEvent, now: DateTime<Utc>) -> Vec<Reminder> {
        self.cancel_all_for(&event.id);
        let planned = plan_reminders(event, now);
        for reminder in &planned {
            let handle = self.timers.arm(reminder, event);
            debug!(
                id = %reminder.event_id,
                offset = reminder.offset_minutes,
                fire_at = %reminder.fire_at,
                "armed reminder"
            );
            let previous = self.armed.insert(
                (reminder.event_id.clone(), reminder.offset_minutes),
                Armed {
                    reminder: reminder.clone(),
                    handle,
                },
            );
            if let Some(previous) = previous {
                self.timers.disarm(previous.handle);
            }
        }
        planned
    }

    /// Schedule every event; returns the number of timers armed.
    pub fn schedule_all<'a>(
        &mut self,
        events: impl IntoIterator<Item = &'a CalendarEvent>,
        now: DateTime<Utc>,
    ) -> usize {
        events
            .into_iter()
            .map(|event| self.schedule(event, now).len())
            .sum()
    }

    /// Disarm every timer belonging to `event_id`. Returns how many were
    /// withdrawn.
    pub fn cancel_all_for(&mut self, event_id: &str) -> usize {
        let keys: Vec<(String, u32)> = self
            .armed
            .range((event_id.to_string(), 0)..=(event_id.to_string(), u32::MAX))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &keys {
            if let Some(armed) = self.armed.remove(key) {
                self.timers.disarm(armed.handle);
            }
        }
        if !keys.is_empty() {
            debug!(id = event_id, cancelled = keys.len(), "cancelled reminders");
        }
        keys.len()
    }

    pub fn cancel_all(&mut self) {
        for (_, armed) in std::mem::take(&mut self.armed) {
            self.timers.disarm(armed.handle);
        }
    }

    /// Forget entries whose fire time is at or before `now`; their timers
    /// have run.
    pub fn prune_fired(&mut self, now: DateTime<Utc>) {
        self.armed.retain(|_, armed| armed.reminder.fire_at > now);
    }

    pub fn is_armed(&self, event_id: &str, offset_minutes: u32) -> bool {
        self.armed
            .contains_key(&(event_id.to_string(), offset_minutes))
    }

    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    /// Armed reminders ordered by fire time.
    pub fn armed(&self) -> Vec<Reminder> {
        let mut out: Vec<Reminder> = self.armed.values().map(|a| a.reminder.clone()).collect();
        out.sort_by(|a, b| {
            a.fire_at
                .cmp(&b.fire_at)
                .then_with(|| a.event_id.cmp(&b.event_id))
        });
        out
    }
}

/// Ask for permission and, only if granted, schedule every event's
/// reminders. Returns whether permission was granted.
pub fn initialize_notifications<'a, T, G>(
    gateway: &G,
    scheduler: &mut ReminderScheduler<T>,
    events: impl IntoIterator<Item = &'a CalendarEvent>,
    now: DateTime<Utc>,
) -> bool
where
    T: Timers,
    G: NotificationGateway + ?Sized,
{
    let granted = gateway.request_permission();
    if granted {
        let armed = scheduler.schedule_all(events, now);
        debug!(armed, "notifications initialised");
    }
    granted
}

/// Timers driven by an explicit clock. Nothing fires until
/// [`ReminderScheduler::fire_due`] is called with a later instant. The CLI's
/// `reminders` listing and the tests use it.
#[derive(Debug, Default)]
pub struct ManualTimers {
    next_handle: u64,
    pending: BTreeMap<u64, (DateTime<Utc>, CalendarEvent, u32)>,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Remove and return timers due at `now`, earliest first.
    fn take_due(&mut self, now: DateTime<Utc>) -> Vec<(DateTime<Utc>, CalendarEvent, u32)> {
        let due: Vec<u64> = self
            .pending
            .iter()
            .filter(|(_, (fire_at, _, _))| *fire_at <= now)
            .map(|(handle, _)| *handle)
            .collect();
        let mut fired: Vec<_> = due
            .into_iter()
            .filter_map(|handle| self.pending.remove(&handle))
            .collect();
        fired.sort_by(|a, b| a.0.cmp(&b.0));
        fired
    }
}

impl Timers for ManualTimers {
    type Handle = u64;

    fn arm(&mut self, reminder: &Reminder, event: &CalendarEvent) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.pending
            .insert(handle, (reminder.fire_at, event.clone(), reminder.offset_minutes));
        handle
    }

    fn disarm(&mut self, handle: u64) {
        self.pending.remove(&handle);
    }
}

impl ReminderScheduler<ManualTimers> {
    /// Fire every timer due at `now` through `gateway`, in fire-time order.
    pub fn fire_due<G>(&mut self, now: DateTime<Utc>, gateway: &G) -> Vec<Reminder>
    where
        G: NotificationGateway + ?Sized,
    {
        let fired = self.timers.take_due(now);
        fired
            .into_iter()
            .map(|(fire_at, event, offset)| {
                self.armed.remove(&(event.id.clone(), offset));
                gateway.show(&event, offset);
                Reminder {
                    event_id: event.id,
                    offset_minutes: offset,
                    fire_at,
                }
            })
            .collect()
    }
}
