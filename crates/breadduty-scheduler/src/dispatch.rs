//! Dispatch orchestration — the notification selector, the day-of
//! broadcast, and retention cleanup. Shared by the scheduled jobs and the
//! manual HTTP routes.

use chrono::{Datelike, NaiveDate};

use breadduty_core::types::{DutyDate, is_duty_weekday};
use breadduty_core::{Result, message};
use breadduty_mailer::{Outbox, OutboundMail};
use breadduty_store::Store;

/// Summary of one reminder pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReminderRun {
    /// Duty dates returned by the due query.
    pub due: usize,
    /// Reminders queued (and marked notified).
    pub sent: usize,
    /// Dates skipped as data anomalies (non-Tue/Thu weekday).
    pub skipped: usize,
}

/// Summary of one day-of broadcast.
#[derive(Debug, Clone, Default)]
pub struct BroadcastSummary {
    pub sent: usize,
    /// Reason nothing was sent, when the day is not a duty day.
    pub skipped: Option<String>,
}

/// Build the reminder mail for one duty date against today's directory
/// state. Returns `None` for a date on a non-duty weekday — a data anomaly
/// that is skipped without sending or marking.
fn build_reminder(store: &Store, duty: &DutyDate) -> Result<Option<OutboundMail>> {
    let weekday = duty.date.weekday();
    if !is_duty_weekday(weekday) {
        tracing::warn!(
            "Duty date {} falls on {weekday}; skipping (data anomaly)",
            duty.date
        );
        return Ok(None);
    }

    // Headcount reflects the directory as of now, not generation time.
    let headcount = store.eligible_users(weekday)?.len();
    let body = message::reminder_body(&duty.user.name, duty.date, headcount);
    Ok(Some(OutboundMail {
        to: duty.user.email.clone(),
        to_name: duty.user.name.clone(),
        subject: message::REMINDER_SUBJECT.to_string(),
        body,
    }))
}

/// Select duty dates due within `[today, today + lookahead_days]`, queue a
/// reminder for each, and mark them notified.
///
/// The mark happens once the mail is queued, regardless of how the send
/// later turns out — at-most-one-attempt semantics. A date that slipped
/// through on a wrong weekday is skipped silently and left unmarked.
pub fn send_due_reminders(
    store: &Store,
    outbox: &Outbox,
    today: NaiveDate,
    lookahead_days: i64,
) -> Result<ReminderRun> {
    let due = store.due_dates(today, lookahead_days)?;
    let mut run = ReminderRun {
        due: due.len(),
        ..ReminderRun::default()
    };

    for duty in &due {
        match build_reminder(store, duty)? {
            Some(mail) => {
                outbox.enqueue(mail);
                store.mark_notified(duty.id)?;
                run.sent += 1;
            }
            None => run.skipped += 1,
        }
    }

    if run.due > 0 {
        tracing::info!(
            "Reminder pass: {} due, {} queued, {} skipped",
            run.due,
            run.sent,
            run.skipped
        );
    }
    Ok(run)
}

/// Day-of broadcast ("time for coffee") to everyone eligible today.
///
/// Directory-driven only — duty-date rows are never touched. On a
/// non-duty weekday this is a no-op with a skip reason and zero sends.
pub fn broadcast_today(
    store: &Store,
    outbox: &Outbox,
    today: NaiveDate,
    subject: Option<&str>,
    custom_message: Option<&str>,
) -> Result<BroadcastSummary> {
    let weekday = today.weekday();
    if !is_duty_weekday(weekday) {
        return Ok(BroadcastSummary {
            sent: 0,
            skipped: Some(format!("{today} is a {weekday}, not a duty day")),
        });
    }

    let subject = subject.unwrap_or(message::BROADCAST_SUBJECT);
    let body = message::broadcast_body(custom_message);
    let recipients = store.eligible_users(weekday)?;

    for user in &recipients {
        outbox.enqueue(OutboundMail {
            to: user.email.clone(),
            to_name: user.name.clone(),
            subject: subject.to_string(),
            body: body.clone(),
        });
    }

    tracing::info!("Broadcast queued for {} recipient(s)", recipients.len());
    Ok(BroadcastSummary {
        sent: recipients.len(),
        skipped: None,
    })
}

/// Retention cleanup: drop duty dates strictly before `today`.
pub fn purge_past_dates(store: &Store, today: NaiveDate) -> Result<usize> {
    store.purge_before(today)
}
