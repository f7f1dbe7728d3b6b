//! `datebook watch`: keep reminder timers armed and print notifications to
//! the terminal as they fire.
//!
//! Timers are tokio tasks. The store file is re-read on an interval so events
//! added or edited by another `datebook` invocation get their timers
//! re-armed, and deleted events lose theirs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use chrono_tz::Tz;
use datebook::{
    initialize_notifications, CalendarEvent, EventStore, FileStorage, Notification,
    NotificationGateway, Permission, Reminder, ReminderScheduler, Timers,
};
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, info};

/// Prints notifications to stdout, with times in the store's zone. Running
/// `watch` is the opt-in, so the prompt always grants.
#[derive(Debug)]
pub struct TerminalGateway {
    permission: Mutex<Permission>,
    tz: Tz,
}

impl TerminalGateway {
    pub fn new(tz: Tz) -> Self {
        Self {
            permission: Mutex::new(Permission::Default),
            tz,
        }
    }

    fn render(&self, notification: &Notification) -> String {
        let starts = notification.event_date.with_timezone(&self.tz).format("%H:%M");
        if notification.body.is_empty() {
            format!("[{}] {}", starts, notification.title)
        } else {
            format!("[{}] {}: {}", starts, notification.title, notification.body)
        }
    }
}

impl NotificationGateway for TerminalGateway {
    fn is_supported(&self) -> bool {
        true
    }

    fn permission(&self) -> Permission {
        self.permission.lock().map(|p| *p).unwrap_or(Permission::Denied)
    }

    fn prompt(&self) -> Permission {
        if let Ok(mut p) = self.permission.lock() {
            *p = Permission::Granted;
        }
        Permission::Granted
    }

    fn deliver(&self, notification: &Notification) {
        info!(
            id = %notification.event_id,
            offset = notification.offset_minutes,
            "notification"
        );
        println!("{}", self.render(notification));
    }
}

/// One tokio task per armed reminder.
pub struct TokioTimers {
    runtime: Handle,
    gateway: Arc<TerminalGateway>,
}

impl TokioTimers {
    pub fn new(runtime: Handle, gateway: Arc<TerminalGateway>) -> Self {
        Self { runtime, gateway }
    }
}

impl Timers for TokioTimers {
    type Handle = AbortHandle;

    fn arm(&mut self, reminder: &Reminder, event: &CalendarEvent) -> AbortHandle {
        let delay = (reminder.fire_at - Utc::now()).to_std().unwrap_or_default();
        let gateway = Arc::clone(&self.gateway);
        let event = event.clone();
        let offset = reminder.offset_minutes;
        self.runtime
            .spawn(async move {
                tokio::time::sleep(delay).await;
                gateway.show(&event, offset);
            })
            .abort_handle()
    }

    fn disarm(&mut self, handle: AbortHandle) {
        handle.abort();
    }
}

pub async fn run(
    store: EventStore<FileStorage>,
    poll: Duration,
    stop_after: Option<Duration>,
) -> Result<()> {
    let gateway = Arc::new(TerminalGateway::new(*store.timezone()));
    let timers = TokioTimers::new(Handle::current(), Arc::clone(&gateway));
    let mut scheduler = ReminderScheduler::new(timers);

    let events = store.list_all();
    if !initialize_notifications(gateway.as_ref(), &mut scheduler, &events, Utc::now()) {
        anyhow::bail!("Notifications are not available");
    }
    let mut known: HashMap<String, CalendarEvent> =
        events.into_iter().map(|e| (e.id.clone(), e)).collect();
    println!(
        "Watching {} reminder(s) across {} event(s). Press Ctrl-C to stop.",
        scheduler.armed_count(),
        known.len()
    );

    let deadline = async {
        match stop_after {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);
    let mut ticker = tokio::time::interval(poll);
    // The first tick completes immediately; the store was just read.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = &mut deadline => break,
            _ = ticker.tick() => {
                let now = Utc::now();
                scheduler.prune_fired(now);
                known = resync(&store, &mut scheduler, known, now);
            }
        }
    }

    scheduler.cancel_all();
    debug!("watch stopped");
    Ok(())
}

/// Re-arm changed events and drop timers of deleted ones. Returns the new
/// snapshot.
fn resync<T: Timers>(
    store: &EventStore<FileStorage>,
    scheduler: &mut ReminderScheduler<T>,
    mut known: HashMap<String, CalendarEvent>,
    now: chrono::DateTime<Utc>,
) -> HashMap<String, CalendarEvent> {
    let mut current = HashMap::new();
    for event in store.list_all() {
        if known.remove(&event.id).as_ref() != Some(&event) {
            let armed = scheduler.schedule(&event, now);
            debug!(id = %event.id, armed = armed.len(), "event changed, rescheduled");
        }
        current.insert(event.id.clone(), event);
    }
    for id in known.keys() {
        scheduler.cancel_all_for(id);
    }
    current
}
