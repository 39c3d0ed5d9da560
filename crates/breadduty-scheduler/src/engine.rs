//! Background job engine — spawns the three recurring loops.

use std::sync::Arc;

use chrono::{Local, Weekday};
use tokio::sync::Mutex;

use breadduty_core::config::SchedulerConfig;
use breadduty_mailer::Outbox;
use breadduty_store::Store;

use crate::dispatch;
use crate::schedule::WeeklySchedule;

/// Spawn the reminder, purge, and broadcast loops on the current runtime.
///
/// Jobs are independent: each has its own timer, its own skip-if-running
/// guard, and logs its own failures without affecting the others.
pub fn spawn_jobs(store: Arc<Store>, outbox: Outbox, config: SchedulerConfig) {
    spawn_reminder_job(store.clone(), outbox.clone(), &config);
    spawn_purge_job(store.clone(), &config);
    spawn_broadcast_job(store, outbox, &config);
}

fn spawn_reminder_job(store: Arc<Store>, outbox: Outbox, config: &SchedulerConfig) {
    let period = std::time::Duration::from_secs(config.daily_interval_secs);
    let lookahead = config.reminder_lookahead_days;
    let guard = Arc::new(Mutex::new(()));

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let Ok(_running) = guard.try_lock() else {
                tracing::warn!("Reminder job still running; skipping this tick");
                continue;
            };
            let today = Local::now().date_naive();
            match dispatch::send_due_reminders(&store, &outbox, today, lookahead) {
                Ok(run) => {
                    tracing::info!(
                        "Daily reminder job: {} due, {} queued",
                        run.due,
                        run.sent
                    );
                }
                Err(e) => tracing::error!("Daily reminder job failed: {e}"),
            }
        }
    });
}

fn spawn_purge_job(store: Arc<Store>, config: &SchedulerConfig) {
    let period = std::time::Duration::from_secs(config.daily_interval_secs);
    let guard = Arc::new(Mutex::new(()));

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let Ok(_running) = guard.try_lock() else {
                tracing::warn!("Purge job still running; skipping this tick");
                continue;
            };
            let today = Local::now().date_naive();
            match dispatch::purge_past_dates(&store, today) {
                Ok(removed) if removed > 0 => {
                    tracing::info!("Purge job removed {removed} past duty date(s)");
                }
                Ok(_) => {}
                Err(e) => tracing::error!("Purge job failed: {e}"),
            }
        }
    });
}

fn spawn_broadcast_job(store: Arc<Store>, outbox: Outbox, config: &SchedulerConfig) {
    let schedule = WeeklySchedule::new(
        &[Weekday::Tue, Weekday::Thu],
        config.broadcast_hour,
        config.broadcast_minute,
    );

    tokio::spawn(async move {
        loop {
            let now = Local::now();
            let Some(next) = schedule.next_after(now) else {
                tracing::error!(
                    "Broadcast schedule unsatisfiable ({}:{:02}); job disabled",
                    schedule.hour,
                    schedule.minute
                );
                return;
            };
            let wait = (next - now)
                .to_std()
                .unwrap_or(std::time::Duration::from_secs(60));
            tracing::debug!("Next day-of broadcast at {next}");
            tokio::time::sleep(wait).await;

            let today = Local::now().date_naive();
            match dispatch::broadcast_today(&store, &outbox, today, None, None) {
                Ok(summary) => match summary.skipped {
                    Some(reason) => tracing::info!("Broadcast skipped: {reason}"),
                    None => tracing::info!("Broadcast queued for {} recipient(s)", summary.sent),
                },
                Err(e) => tracing::error!("Broadcast job failed: {e}"),
            }
        }
    });
}
