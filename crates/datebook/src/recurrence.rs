//! Recurrence expansion -- turns one stored event into the concrete
//! occurrence instants that fall inside a query window.
//!
//! Occurrence `k` (counting from 0 at the anchor) is `anchor + k * interval`
//! units. Arithmetic happens on the anchor's wall-clock time in the store's
//! zone, so a 09:00 weekly meeting stays at 09:00 across DST changes.
//! Monthly and yearly steps keep the anchor's day of month and clamp it to
//! the last day of shorter months; the clamp is always computed from the
//! anchor, so Jan 31 monthly gives Feb 28, Mar 31, Apr 30.
//!
//! Generation stops at the first of: the `count`-th occurrence, an occurrence
//! whose calendar day is after `end_date`, or an occurrence after the
//! window's end. Both `count` and `end_date` may be set; whichever bites
//! first wins.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

use crate::event::{CalendarEvent, RecurrenceType};
use crate::time;

/// An inclusive instant range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl Window {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        self.from <= *at && *at <= self.to
    }
}

/// Lazy occurrence sequence for one event. Cloning it, or calling
/// [`Occurrences::restart`], replays the sequence from the window start.
#[derive(Debug, Clone)]
pub struct Occurrences {
    anchor: NaiveDateTime,
    kind: RecurrenceType,
    interval: u32,
    end_day: Option<NaiveDate>,
    count: Option<u32>,
    window: Window,
    tz: Tz,
    start_k: u64,
    next_k: u64,
    done: bool,
}

/// Expand `event` over `window`, judging wall-clock times and days in `tz`.
///
/// A non-recurring event yields its anchor alone if the anchor is inside the
/// window.
pub fn expand_occurrences(event: &CalendarEvent, window: Window, tz: Tz) -> Occurrences {
    let anchor = event.date.with_timezone(&tz).naive_local();
    let (kind, interval, end_day, count) = match &event.recurrence {
        Some(rule) if rule.kind != RecurrenceType::None => (
            rule.kind,
            rule.interval.max(1),
            rule.end_date.map(|d| time::local_date(&d, &tz)),
            rule.count,
        ),
        _ => (RecurrenceType::None, 1, None, None),
    };

    let mut occurrences = Occurrences {
        anchor,
        kind,
        interval,
        end_day,
        count,
        window,
        tz,
        start_k: 0,
        next_k: 0,
        done: window.from > window.to,
    };
    occurrences.start_k = occurrences.first_candidate();
    occurrences.next_k = occurrences.start_k;
    occurrences
}

impl Occurrences {
    pub fn restart(&mut self) {
        self.next_k = self.start_k;
        self.done = self.window.from > self.window.to;
    }

    /// Lowest `k` worth evaluating. Every occurrence below it lies on a
    /// calendar day before the window opens, so skipping them changes
    /// nothing, `count` included, since `k` is still the occurrence index.
    fn first_candidate(&self) -> u64 {
        let from_day = time::local_date(&self.window.from, &self.tz);
        let anchor_day = self.anchor.date();
        if from_day <= anchor_day {
            return 0;
        }
        let interval = self.interval as i64;
        let steps = match self.kind {
            RecurrenceType::None => 0,
            RecurrenceType::Daily => (from_day - anchor_day).num_days() / interval,
            RecurrenceType::Weekly => (from_day - anchor_day).num_days() / (7 * interval),
            RecurrenceType::Monthly => month_index(from_day) - month_index(anchor_day),
            RecurrenceType::Yearly => (from_day.year() - anchor_day.year()) as i64,
        };
        let steps = match self.kind {
            RecurrenceType::Monthly | RecurrenceType::Yearly => steps / interval,
            _ => steps,
        };
        (steps - 1).max(0) as u64
    }

    /// Wall-clock time of occurrence `k`, or `None` past chrono's range.
    fn nth_local(&self, k: u64) -> Option<NaiveDateTime> {
        let step = k.checked_mul(self.interval as u64)?;
        let date = match self.kind {
            RecurrenceType::None => {
                if k > 0 {
                    return None;
                }
                self.anchor.date()
            }
            RecurrenceType::Daily => self.anchor.date().checked_add_days(Days::new(step))?,
            RecurrenceType::Weekly => self
                .anchor
                .date()
                .checked_add_days(Days::new(step.checked_mul(7)?))?,
            RecurrenceType::Monthly => {
                time::add_months_clamped(self.anchor.date(), u32::try_from(step).ok()?)?
            }
            RecurrenceType::Yearly => time::add_months_clamped(
                self.anchor.date(),
                u32::try_from(step.checked_mul(12)?).ok()?,
            )?,
        };
        Some(date.and_time(self.anchor.time()))
    }
}

impl Iterator for Occurrences {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let k = self.next_k;
            if self.count.is_some_and(|c| k >= c as u64) {
                self.done = true;
                break;
            }
            let Some(local) = self.nth_local(k) else {
                self.done = true;
                break;
            };
            self.next_k += 1;

            if self.end_day.is_some_and(|end| local.date() > end) {
                self.done = true;
                break;
            }
            let at = time::local_to_utc(local, &self.tz);
            if at > self.window.to {
                self.done = true;
                break;
            }
            if at >= self.window.from {
                return Some(at);
            }
        }
        None
    }
}

fn month_index(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}
