//! # BreadDuty Scheduler
//!
//! The timed dispatcher: three independent recurring jobs on cooperative
//! tokio timers.
//!
//! ```text
//! engine (tokio timers)
//!   ├── daily  → dispatch::send_due_reminders (1-day lookahead, mark notified)
//!   ├── daily  → dispatch::purge_past_dates   (retention cleanup)
//!   └── Tue/Thu 09:15 local → dispatch::broadcast_today
//! ```
//!
//! Each job logs and swallows its own errors; one failing run never blocks
//! the other jobs or the next run.

pub mod dispatch;
pub mod engine;
pub mod schedule;

pub use dispatch::{BroadcastSummary, ReminderRun, broadcast_today, purge_past_dates, send_due_reminders};
pub use engine::spawn_jobs;
pub use schedule::WeeklySchedule;
