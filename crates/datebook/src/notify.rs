//! Notification gateway contract.
//!
//! The host's notification facility is permission gated: it may be missing
//! altogether, the user may not have been asked yet, or the user may have
//! refused. A refusal is a state the UI shows, not an error; delivery simply
//! becomes a no-op.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::CalendarEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Not asked yet.
    #[default]
    Default,
    Granted,
    Denied,
}

/// What gets shown for one fired reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Replaces an earlier notification for the same event on hosts that
    /// honour tags.
    pub tag: String,
    pub event_id: String,
    pub event_date: DateTime<Utc>,
    pub offset_minutes: u32,
}

impl Notification {
    pub fn for_event(event: &CalendarEvent, offset_minutes: u32) -> Self {
        let body = if offset_minutes > 0 {
            format!(
                "Reminder: {} starts in {} {}",
                event.title,
                offset_minutes,
                if offset_minutes == 1 { "minute" } else { "minutes" }
            )
        } else {
            event.description.clone().unwrap_or_default()
        };
        Self {
            title: event.title.clone(),
            body,
            tag: format!("event-{}", event.id),
            event_id: event.id.clone(),
            event_date: event.date,
            offset_minutes,
        }
    }
}

/// The host notification facility.
///
/// Implementors provide the four primitive operations; `request_permission`
/// and `show` carry the gating policy. All methods take `&self` so one
/// gateway can be shared with timer callbacks.
pub trait NotificationGateway {
    fn is_supported(&self) -> bool;

    fn permission(&self) -> Permission;

    /// Ask the user. Only called while the permission is still `Default`.
    fn prompt(&self) -> Permission;

    /// Put a notification on screen. Only called with permission granted.
    fn deliver(&self, notification: &Notification);

    /// Returns whether notifications may be shown. Never prompts a user who
    /// already answered.
    fn request_permission(&self) -> bool {
        if !self.is_supported() {
            return false;
        }
        match self.permission() {
            Permission::Granted => true,
            Permission::Denied => false,
            Permission::Default => self.prompt() == Permission::Granted,
        }
    }

    /// Fire-and-forget. Silently does nothing without permission.
    fn show(&self, event: &CalendarEvent, offset_minutes: u32) {
        if !self.is_supported() || self.permission() != Permission::Granted {
            return;
        }
        self.deliver(&Notification::for_event(event, offset_minutes));
    }
}

/// A gateway that keeps delivered notifications in memory, for hosts that
/// collect them after the fact and for tests.
#[derive(Debug)]
pub struct MemoryGateway {
    supported: bool,
    permission: Mutex<Permission>,
    prompt_answer: Permission,
    delivered: Mutex<Vec<Notification>>,
}

impl MemoryGateway {
    /// Supported, not yet asked; a prompt will be answered with `answer`.
    pub fn new(answer: Permission) -> Self {
        Self {
            supported: true,
            permission: Mutex::new(Permission::Default),
            prompt_answer: answer,
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn granted() -> Self {
        let gateway = Self::new(Permission::Granted);
        gateway.set_permission(Permission::Granted);
        gateway
    }

    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new(Permission::Denied)
        }
    }

    pub fn set_permission(&self, permission: Permission) {
        if let Ok(mut current) = self.permission.lock() {
            *current = permission;
        }
    }

    /// Take everything delivered so far.
    pub fn drain(&self) -> Vec<Notification> {
        self.delivered
            .lock()
            .map(|mut d| std::mem::take(&mut *d))
            .unwrap_or_default()
    }
}

impl NotificationGateway for MemoryGateway {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn permission(&self) -> Permission {
        self.permission.lock().map(|p| *p).unwrap_or(Permission::Denied)
    }

    fn prompt(&self) -> Permission {
        self.set_permission(self.prompt_answer);
        self.prompt_answer
    }

    fn deliver(&self, notification: &Notification) {
        if let Ok(mut delivered) = self.delivered.lock() {
            delivered.push(notification.clone());
        }
    }
}
