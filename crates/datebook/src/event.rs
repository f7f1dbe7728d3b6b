//! The calendar event model.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::category::Category;
use crate::error::{DatebookError, Result};
use crate::time::{self, iso};

/// Reminder offsets offered by the event form, in minutes before the event.
pub const REMINDER_PRESETS: [u32; 10] = [0, 5, 10, 15, 30, 60, 120, 1440, 2880, 10080];

/// Offset given to a freshly added reminder.
pub const DEFAULT_REMINDER_MINUTES: u32 = 30;

/// A single calendar entry. For recurring events `date` is the anchor: the
/// first occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    #[serde(with = "iso")]
    pub date: DateTime<Utc>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub important: bool,
    #[serde(default)]
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_minutes: Option<Vec<u32>>,
    /// Reserved linkage for materialized occurrences. Nothing in this crate
    /// sets it; it is carried through storage untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_recurrence_instance: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_event_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// Also what an unknown stored type reads as.
    #[default]
    #[serde(other)]
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    #[serde(rename = "type")]
    pub kind: RecurrenceType,
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// Inclusive bound, compared by calendar day.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "iso::option")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

fn default_interval() -> u32 {
    1
}

impl CalendarEvent {
    /// A new one-off event with a fresh id.
    pub fn new(title: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            title: title.into(),
            description: None,
            important: false,
            category: Category::Other,
            recurrence: None,
            reminder_minutes: None,
            is_recurrence_instance: None,
            parent_event_id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_important(mut self, important: bool) -> Self {
        self.important = important;
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_recurrence(mut self, recurrence: RecurrenceRule) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    pub fn with_reminders(mut self, minutes: impl IntoIterator<Item = u32>) -> Self {
        self.reminder_minutes = Some(minutes.into_iter().collect());
        self
    }

    /// Apply the model invariants in place:
    /// - a `none` recurrence is no recurrence, and interval 0 reads as 1
    /// - reminder offsets are sorted and deduplicated, and an empty list is absent
    /// - an empty description is absent
    pub fn normalize(&mut self) {
        if let Some(rule) = &mut self.recurrence {
            if rule.kind == RecurrenceType::None {
                self.recurrence = None;
            } else if rule.interval == 0 {
                rule.interval = 1;
            }
        }
        if let Some(minutes) = &mut self.reminder_minutes {
            minutes.sort_unstable();
            minutes.dedup();
            if minutes.is_empty() {
                self.reminder_minutes = None;
            }
        }
        if self.description.as_deref().is_some_and(|d| d.trim().is_empty()) {
            self.description = None;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(DatebookError::InvalidEvent("id must not be empty".to_string()));
        }
        if self.title.trim().is_empty() {
            return Err(DatebookError::InvalidEvent(format!(
                "event '{}' has an empty title",
                self.id
            )));
        }
        Ok(())
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence
            .as_ref()
            .is_some_and(|r| r.kind != RecurrenceType::None)
    }

    /// The calendar day of the anchor in `tz`.
    pub fn local_date(&self, tz: &Tz) -> NaiveDate {
        time::local_date(&self.date, tz)
    }

    /// Reminder offsets, empty when none are set.
    pub fn reminders(&self) -> &[u32] {
        self.reminder_minutes.as_deref().unwrap_or(&[])
    }
}

impl RecurrenceRule {
    pub fn new(kind: RecurrenceType) -> Self {
        Self {
            kind,
            interval: 1,
            end_date: None,
            count: None,
        }
    }

    pub fn every(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    pub fn until(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn times(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// Human summary, e.g. "Every 2 weeks until 2026-05-01".
    pub fn describe(&self) -> String {
        let unit = match self.kind {
            RecurrenceType::None => return "Does not repeat".to_string(),
            RecurrenceType::Daily => "day",
            RecurrenceType::Weekly => "week",
            RecurrenceType::Monthly => "month",
            RecurrenceType::Yearly => "year",
        };
        let mut out = match self.interval.max(1) {
            1 => match self.kind {
                RecurrenceType::Daily => "Daily".to_string(),
                RecurrenceType::Weekly => "Weekly".to_string(),
                RecurrenceType::Monthly => "Monthly".to_string(),
                _ => "Yearly".to_string(),
            },
            n => format!("Every {} {}s", n, unit),
        };
        if let Some(end) = self.end_date {
            out.push_str(&format!(" until {}", end.format("%Y-%m-%d")));
        }
        if let Some(count) = self.count {
            out.push_str(&format!(
                ", {} {}",
                count,
                if count == 1 { "time" } else { "times" }
            ));
        }
        out
    }
}

/// Display label for a reminder offset, matching the form's menu.
pub fn describe_offset(minutes: u32) -> String {
    match minutes {
        0 => "At time of event".to_string(),
        m if m % 10080 == 0 => plural(m / 10080, "week"),
        m if m % 1440 == 0 => plural(m / 1440, "day"),
        m if m % 60 == 0 => plural(m / 60, "hour"),
        m => plural(m, "minute"),
    }
}

fn plural(n: u32, unit: &str) -> String {
    if n == 1 {
        format!("1 {} before", unit)
    } else {
        format!("{} {}s before", n, unit)
    }
}
