//! Search and filter composition for event lists.
//!
//! A filter is four optional criteria ANDed together: a case-insensitive
//! substring on title or description, category membership, the importance
//! flag, and an inclusive calendar-day range. An unset criterion passes
//! everything.

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::event::CalendarEvent;

/// Inclusive calendar-day range; either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start.is_none_or(|s| s <= day) && self.end.is_none_or(|e| day <= e)
    }

    pub fn is_open(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventFilter {
    pub query: Option<String>,
    /// Empty means every category.
    pub categories: Vec<Category>,
    pub only_important: bool,
    pub date_range: DateRange,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.categories = categories.into_iter().collect();
        self
    }

    pub fn only_important(mut self) -> Self {
        self.only_important = true;
        self
    }

    pub fn between(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.date_range = DateRange::new(start, end);
        self
    }

    /// True when the filter lets everything through.
    pub fn is_pass_through(&self) -> bool {
        self.needle().is_none()
            && self.categories.is_empty()
            && !self.only_important
            && self.date_range.is_open()
    }

    fn needle(&self) -> Option<String> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, event: &CalendarEvent, tz: &Tz) -> bool {
        matches_query(event, self.needle().as_deref())
            && self.matches_category(event)
            && (!self.only_important || event.important)
            && self.date_range.contains(event.local_date(tz))
    }

    fn matches_category(&self, event: &CalendarEvent) -> bool {
        self.categories.is_empty() || self.categories.contains(&event.category)
    }

    /// Events passing every criterion, in their original order.
    pub fn apply(&self, events: &[CalendarEvent], tz: &Tz) -> Vec<CalendarEvent> {
        let needle = self.needle();
        events
            .iter()
            .filter(|e| matches_query(e, needle.as_deref()))
            .filter(|e| self.matches_category(e))
            .filter(|e| !self.only_important || e.important)
            .filter(|e| self.date_range.contains(e.local_date(tz)))
            .cloned()
            .collect()
    }
}

/// `needle` must already be lowercased.
fn matches_query(event: &CalendarEvent, needle: Option<&str>) -> bool {
    let Some(needle) = needle else {
        return true;
    };
    event.title.to_lowercase().contains(needle)
        || event
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}
