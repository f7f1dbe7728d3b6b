//! `datebook` CLI: a personal calendar in the terminal.
//!
//! Events live in `<data dir>/calendarEvents.json`, the same JSON array the
//! browser build keeps in `localStorage`.
//!
//! ## Usage
//!
//! ```sh
//! # Add a weekly event with two reminders
//! datebook add "Team sync" --at "2026-05-04 14:00" --repeat weekly --remind 15 --remind 60
//!
//! # What is on a given day, and which days of May have anything
//! datebook day 2026-05-04
//! datebook month 2026 5
//!
//! # Search
//! datebook list --query sync --category work --important
//!
//! # Every occurrence of one event in a range
//! datebook occurrences <id> --from 2026-05-01 --to 2026-06-30
//!
//! # Keep reminder timers armed and print them as they fire
//! datebook watch
//! ```
//!
//! Calendar days are judged in `--timezone` (or `DATEBOOK_TZ`), UTC by
//! default. `-v` raises log verbosity on stderr; `RUST_LOG` overrides it.

mod watch;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand, ValueEnum};
use datebook::event::describe_offset;
use datebook::time;
use datebook::weather::DEFAULT_FORECAST_DAYS;
use datebook::{
    expand_occurrences, mock_forecast, CalendarEvent, Category, EventFilter, EventStore,
    FileStorage, ManualTimers, RecurrenceRule, RecurrenceType, ReminderScheduler, StoreConfig,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "datebook",
    version,
    about = "Personal calendar with recurring events and reminders"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the event store
    #[arg(long, global = true, env = "DATEBOOK_DIR")]
    data_dir: Option<PathBuf>,

    /// IANA zone in which calendar days are judged
    #[arg(long, global = true, env = "DATEBOOK_TZ", default_value = "UTC")]
    timezone: String,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new event
    Add {
        title: String,
        /// Start time, e.g. "2026-05-04 14:00" (local to --timezone) or RFC 3339
        #[arg(long)]
        at: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        important: bool,
        /// work, personal, family, health or other
        #[arg(short, long, default_value = "other")]
        category: Category,
        #[command(flatten)]
        repeat: RepeatArgs,
        /// Reminder offset in minutes before the start; repeatable
        #[arg(short, long = "remind")]
        remind: Vec<u32>,
        /// Print the saved event as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change fields of an existing event
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        at: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        important: Option<bool>,
        #[arg(short, long)]
        category: Option<Category>,
        #[command(flatten)]
        repeat: RepeatArgs,
        /// Replace the reminder offsets; repeatable
        #[arg(short, long = "remind", conflicts_with = "no_reminders")]
        remind: Vec<u32>,
        /// Remove all reminders
        #[arg(long)]
        no_reminders: bool,
        #[arg(long)]
        json: bool,
    },
    /// Delete an event
    Delete { id: String },
    /// List events, optionally filtered
    List {
        /// Case-insensitive match on title or description
        #[arg(short, long)]
        query: Option<String>,
        /// Keep only these categories; repeatable
        #[arg(short, long = "category")]
        category: Vec<Category>,
        /// Keep only important events
        #[arg(long)]
        important: bool,
        /// First calendar day, inclusive
        #[arg(long)]
        from: Option<String>,
        /// Last calendar day, inclusive
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Events on one calendar day
    Day {
        date: String,
        #[arg(long)]
        json: bool,
    },
    /// Day markers for a month, or every occurrence in it
    Month {
        year: i32,
        month: u32,
        /// List expanded occurrences instead of per-day markers
        #[arg(long)]
        occurrences: bool,
        #[arg(long)]
        json: bool,
    },
    /// Occurrences of one event between two days
    Occurrences {
        id: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        json: bool,
    },
    /// Reminders that would be armed now, in firing order
    Reminders {
        /// Pretend the current time is this instant
        #[arg(long)]
        now: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Offline weather forecast starting at a day
    Weather {
        date: String,
        #[arg(long, default_value_t = DEFAULT_FORECAST_DAYS)]
        days: u32,
        #[arg(long)]
        json: bool,
    },
    /// Arm reminder timers and print notifications until interrupted
    Watch {
        /// Seconds between store re-reads
        #[arg(long, default_value_t = 30)]
        poll: u64,
        /// Stop after this many seconds
        #[arg(long)]
        stop_after: Option<u64>,
    },
}

#[derive(clap::Args)]
struct RepeatArgs {
    /// Recurrence frequency
    #[arg(long, value_enum)]
    repeat: Option<Repeat>,
    /// Repeat every N units
    #[arg(long)]
    every: Option<u32>,
    /// Last day of the series, inclusive
    #[arg(long)]
    until: Option<String>,
    /// Total number of occurrences
    #[arg(long)]
    count: Option<u32>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Repeat {
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl From<Repeat> for RecurrenceType {
    fn from(r: Repeat) -> Self {
        match r {
            Repeat::None => RecurrenceType::None,
            Repeat::Daily => RecurrenceType::Daily,
            Repeat::Weekly => RecurrenceType::Weekly,
            Repeat::Monthly => RecurrenceType::Monthly,
            Repeat::Yearly => RecurrenceType::Yearly,
        }
    }
}

impl RepeatArgs {
    fn is_empty(&self) -> bool {
        self.repeat.is_none()
            && self.every.is_none()
            && self.until.is_none()
            && self.count.is_none()
    }

    /// Merge into `existing`. A `--repeat` starts a fresh rule; the other
    /// flags adjust whatever rule is there.
    fn apply(&self, existing: Option<RecurrenceRule>, tz: &Tz) -> Result<Option<RecurrenceRule>> {
        if self.is_empty() {
            return Ok(existing);
        }
        let mut rule = match (self.repeat, existing) {
            (Some(kind), _) => RecurrenceRule::new(kind.into()),
            (None, Some(rule)) => rule,
            (None, None) => anyhow::bail!(
                "--every, --until and --count need --repeat on an event that does not repeat"
            ),
        };
        if let Some(every) = self.every {
            rule = rule.every(every);
        }
        if let Some(until) = &self.until {
            rule = rule.until(parse_instant(until, tz)?);
        }
        if let Some(count) = self.count {
            rule = rule.times(count);
        }
        Ok(Some(rule))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = StoreConfig::default()
        .with_timezone(&cli.timezone)
        .with_context(|| format!("Unknown timezone: {}", cli.timezone))?;
    let tz = config.timezone;
    let dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let mut store = EventStore::with_config(FileStorage::new(dir), config);

    match cli.command {
        Commands::Add {
            title,
            at,
            description,
            important,
            category,
            repeat,
            remind,
            json,
        } => {
            let mut event = CalendarEvent::new(title, parse_instant(&at, &tz)?)
                .with_important(important)
                .with_category(category)
                .with_reminders(remind);
            if let Some(description) = description {
                event = event.with_description(description);
            }
            event.recurrence = repeat.apply(None, &tz)?;
            let saved = store.save(event).context("Failed to save event")?;
            print_saved(&saved, &tz, json)?;
        }
        Commands::Edit {
            id,
            title,
            at,
            description,
            important,
            category,
            repeat,
            remind,
            no_reminders,
            json,
        } => {
            let mut event = store
                .get(&id)
                .with_context(|| format!("No event with id {}", id))?;
            if let Some(title) = title {
                event.title = title;
            }
            if let Some(at) = at {
                event.date = parse_instant(&at, &tz)?;
            }
            if let Some(description) = description {
                event.description = Some(description);
            }
            if let Some(important) = important {
                event.important = important;
            }
            if let Some(category) = category {
                event.category = category;
            }
            event.recurrence = repeat.apply(event.recurrence.take(), &tz)?;
            if no_reminders {
                event.reminder_minutes = None;
            } else if !remind.is_empty() {
                event.reminder_minutes = Some(remind);
            }
            let saved = store.save(event).context("Failed to save event")?;
            print_saved(&saved, &tz, json)?;
        }
        Commands::Delete { id } => {
            if !store.delete(&id).context("Failed to delete event")? {
                anyhow::bail!("No event with id {}", id);
            }
            println!("Deleted {}", id);
        }
        Commands::List {
            query,
            category,
            important,
            from,
            to,
            json,
        } => {
            let mut filter = EventFilter::new()
                .with_categories(category)
                .between(parse_day(from.as_deref())?, parse_day(to.as_deref())?);
            if let Some(query) = query {
                filter = filter.with_query(query);
            }
            if important {
                filter = filter.only_important();
            }
            let mut events = filter.apply(&store.list_all(), &tz);
            events.sort_by_key(|e| e.date);
            print_events(&events, &tz, json)?;
        }
        Commands::Day { date, json } => {
            let day = time::parse_date(&date)?;
            print_events(&store.events_on(day), &tz, json)?;
        }
        Commands::Month {
            year,
            month,
            occurrences,
            json,
        } => {
            if !(1..=12).contains(&month) {
                anyhow::bail!("Month must be between 1 and 12, got {}", month);
            }
            let index = store.index();
            if occurrences {
                let occurrences = index.occurrences_in_month(year, month);
                if json {
                    println!("{}", serde_json::to_string_pretty(&occurrences)?);
                } else {
                    for o in &occurrences {
                        println!("{}  {}", format_local(&o.at, &tz), event_line(&o.event));
                    }
                }
            } else {
                let markers = index.month_markers(year, month);
                if json {
                    println!("{}", serde_json::to_string_pretty(&markers)?);
                } else {
                    for m in markers.iter().filter(|m| m.has_events) {
                        println!("{}{}", m.date, if m.has_important { "  !" } else { "" });
                    }
                }
            }
        }
        Commands::Occurrences { id, from, to, json } => {
            let event = store
                .get(&id)
                .with_context(|| format!("No event with id {}", id))?;
            let first = time::parse_date(&from)?;
            let last = time::parse_date(&to)?;
            let window = datebook::index::day_span_window(first, last, &tz);
            let instants: Vec<DateTime<Utc>> = expand_occurrences(&event, window, tz).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&instants)?);
            } else {
                for at in &instants {
                    println!("{}", format_local(at, &tz));
                }
            }
        }
        Commands::Reminders { now, json } => {
            let now = match now {
                Some(s) => parse_instant(&s, &tz)?,
                None => Utc::now(),
            };
            let events = store.list_all();
            let mut scheduler = ReminderScheduler::new(ManualTimers::new());
            scheduler.schedule_all(&events, now);
            let armed = scheduler.armed();
            if json {
                println!("{}", serde_json::to_string_pretty(&armed)?);
            } else {
                for r in &armed {
                    let title = events
                        .iter()
                        .find(|e| e.id == r.event_id)
                        .map(|e| e.title.as_str())
                        .unwrap_or_default();
                    println!(
                        "{}  {} ({})",
                        format_local(&r.fire_at, &tz),
                        title,
                        describe_offset(r.offset_minutes)
                    );
                }
            }
        }
        Commands::Weather { date, days, json } => {
            let forecast = mock_forecast(time::parse_date(&date)?, days);
            if json {
                println!("{}", serde_json::to_string_pretty(&forecast)?);
            } else {
                for w in &forecast.daily {
                    println!(
                        "{}  {:>4.1}°C  {}  humidity {}%  wind {} km/h",
                        w.date, w.temperature, w.description, w.humidity, w.wind_speed
                    );
                }
            }
        }
        Commands::Watch { poll, stop_after } => {
            watch::run(
                store,
                Duration::from_secs(poll.max(1)),
                stop_after.map(Duration::from_secs),
            )
            .await?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("datebook"))
        .unwrap_or_else(|| PathBuf::from(".datebook"))
}

fn parse_instant(s: &str, tz: &Tz) -> Result<DateTime<Utc>> {
    time::parse_datetime_in(s, tz).with_context(|| format!("Invalid date/time: {}", s))
}

fn parse_day(s: Option<&str>) -> Result<Option<chrono::NaiveDate>> {
    s.map(|s| time::parse_date(s).with_context(|| format!("Invalid date: {}", s)))
        .transpose()
}

fn format_local(at: &DateTime<Utc>, tz: &Tz) -> String {
    at.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string()
}

fn event_line(event: &CalendarEvent) -> String {
    let mut line = format!("{}  {}", event.title, event.category);
    if event.important {
        line.push_str("  !");
    }
    if let Some(rule) = event.recurrence.as_ref().filter(|_| event.is_recurring()) {
        line.push_str(&format!("  ({})", rule.describe()));
    }
    line
}

fn print_events(events: &[CalendarEvent], tz: &Tz, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(events)?);
        return Ok(());
    }
    if events.is_empty() {
        println!("No events");
    }
    for event in events {
        println!("{}  {}  {}", event.id, format_local(&event.date, tz), event_line(event));
    }
    Ok(())
}

fn print_saved(event: &CalendarEvent, tz: &Tz, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(event)?);
    } else {
        println!("Saved {}  {}  {}", event.id, format_local(&event.date, tz), event_line(event));
    }
    Ok(())
}
