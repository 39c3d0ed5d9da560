//! Reminder and broadcast message rendering.
//!
//! The reminder quantity scales with the day's headcount: two units per
//! confirmed attendee, counted against today's directory state rather than
//! the state at roster-generation time.

use chrono::NaiveDate;

/// Subject line for duty reminders.
pub const REMINDER_SUBJECT: &str = "Reminder: you're on bread duty";

/// Default subject for the day-of broadcast.
pub const BROADCAST_SUBJECT: &str = "Time for coffee";

/// Fixed tail of every day-of broadcast body.
pub const BROADCAST_DEFAULT_BODY: &str =
    "Fresh bread is on its way — see you in the kitchen for coffee!";

/// Units to bring per eligible person on the duty day.
pub const QUANTITY_PER_PERSON: usize = 2;

/// Mail-facing date format (day first, as the office reads it).
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// Body of the reminder mail sent to the assigned user.
pub fn reminder_body(name: &str, date: NaiveDate, headcount: usize) -> String {
    let quantity = headcount * QUANTITY_PER_PERSON;
    format!(
        "Hi {name},\n\n\
         Quick reminder: on {date} you are responsible for bringing the bread.\n\
         We have {headcount} people confirmed for that day, so please bring \
         enough for {quantity}.\n\n\
         Thanks!",
        date = format_date(date),
    )
}

/// Body of the day-of broadcast: optional custom message followed by the
/// fixed default body.
pub fn broadcast_body(custom: Option<&str>) -> String {
    match custom {
        Some(msg) if !msg.trim().is_empty() => {
            format!("{}\n\n{}", msg.trim(), BROADCAST_DEFAULT_BODY)
        }
        _ => BROADCAST_DEFAULT_BODY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    #[test]
    fn test_reminder_quantity_doubles_headcount() {
        let body = reminder_body("Ana", date(), 4);
        assert!(body.contains("4 people"));
        assert!(body.contains("enough for 8"));
    }

    #[test]
    fn test_reminder_names_user_and_date() {
        let body = reminder_body("Bruno", date(), 1);
        assert!(body.starts_with("Hi Bruno,"));
        assert!(body.contains("10-06-2025"));
    }

    #[test]
    fn test_broadcast_default_only() {
        assert_eq!(broadcast_body(None), BROADCAST_DEFAULT_BODY);
        assert_eq!(broadcast_body(Some("   ")), BROADCAST_DEFAULT_BODY);
    }

    #[test]
    fn test_broadcast_custom_prefix() {
        let body = broadcast_body(Some("Cake today as well"));
        assert!(body.starts_with("Cake today as well\n\n"));
        assert!(body.ends_with(BROADCAST_DEFAULT_BODY));
    }
}
