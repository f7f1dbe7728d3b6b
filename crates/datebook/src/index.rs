//! Calendar-day queries over an event list.
//!
//! These are linear scans; the list belongs to one person and is small, so
//! recomputing on every grid render is the accepted cost.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::event::CalendarEvent;
use crate::recurrence::{expand_occurrences, Window};
use crate::time;

/// What the grid needs to decorate one day tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayMarker {
    pub date: NaiveDate,
    pub has_events: bool,
    pub has_important: bool,
}

/// One expanded occurrence of an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatedOccurrence {
    pub date: NaiveDate,
    pub at: DateTime<Utc>,
    pub event: CalendarEvent,
}

#[derive(Debug, Clone)]
pub struct DateIndex {
    events: Vec<CalendarEvent>,
    tz: Tz,
}

impl DateIndex {
    pub fn new(events: Vec<CalendarEvent>, tz: Tz) -> Self {
        Self { events, tz }
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn events_on(&self, day: NaiveDate) -> Vec<CalendarEvent> {
        events_on(&self.events, day, &self.tz)
    }

    pub fn has_events(&self, day: NaiveDate) -> bool {
        self.events.iter().any(|e| e.local_date(&self.tz) == day)
    }

    pub fn has_important_events(&self, day: NaiveDate) -> bool {
        self.events
            .iter()
            .any(|e| e.important && e.local_date(&self.tz) == day)
    }

    /// One marker per day of the month, judged on anchor dates.
    pub fn month_markers(&self, year: i32, month: u32) -> Vec<DayMarker> {
        month_days(year, month)
            .map(|date| DayMarker {
                date,
                has_events: self.has_events(date),
                has_important: self.has_important_events(date),
            })
            .collect()
    }

    /// Every occurrence of every event that lands in the month, recurring
    /// events expanded, sorted by time.
    pub fn occurrences_in_month(&self, year: i32, month: u32) -> Vec<DatedOccurrence> {
        let Some(window) = month_window(year, month, &self.tz) else {
            return Vec::new();
        };
        let mut out: Vec<DatedOccurrence> = self
            .events
            .iter()
            .flat_map(|event| {
                expand_occurrences(event, window, self.tz).map(move |at| DatedOccurrence {
                    date: time::local_date(&at, &self.tz),
                    at,
                    event: event.clone(),
                })
            })
            .collect();
        out.sort_by(|a, b| a.at.cmp(&b.at).then_with(|| a.event.id.cmp(&b.event.id)));
        out
    }
}

/// Events whose anchor falls on `day` in `tz`.
pub fn events_on(events: &[CalendarEvent], day: NaiveDate, tz: &Tz) -> Vec<CalendarEvent> {
    events
        .iter()
        .filter(|e| e.local_date(tz) == day)
        .cloned()
        .collect()
}

fn month_days(year: i32, month: u32) -> impl Iterator<Item = NaiveDate> {
    let last = time::days_in_month(year, month);
    (1..=last).filter_map(move |d| NaiveDate::from_ymd_opt(year, month, d))
}

/// The instant range covering a whole local month.
pub fn month_window(year: i32, month: u32, tz: &Tz) -> Option<Window> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = NaiveDate::from_ymd_opt(year, month, time::days_in_month(year, month))?;
    Some(day_span_window(first, last, tz))
}

/// Window from the start of `first` to the last instant of `last`, local days.
pub fn day_span_window(first: NaiveDate, last: NaiveDate, tz: &Tz) -> Window {
    let from = time::local_to_utc(first.and_time(NaiveTime::MIN), tz);
    let to = match last.succ_opt() {
        Some(next) => {
            time::local_to_utc(next.and_time(NaiveTime::MIN), tz)
                - chrono::Duration::nanoseconds(1)
        }
        None => DateTime::<Utc>::MAX_UTC,
    };
    Window::new(from, to)
}
