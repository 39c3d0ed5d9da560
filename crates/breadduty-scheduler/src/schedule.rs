//! Weekly schedule arithmetic.
//!
//! Finds the next "these weekdays at HH:MM" occurrence by scanning forward
//! minute by minute — at most eight days of minutes, cheap enough that no
//! cron crate is needed.

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Weekday};

/// A fixed weekly firing time on a set of weekdays.
#[derive(Debug, Clone)]
pub struct WeeklySchedule {
    pub weekdays: Vec<Weekday>,
    pub hour: u32,
    pub minute: u32,
}

impl WeeklySchedule {
    pub fn new(weekdays: &[Weekday], hour: u32, minute: u32) -> Self {
        Self {
            weekdays: weekdays.to_vec(),
            hour,
            minute,
        }
    }

    /// Next occurrence strictly after `after`. Returns `None` for an
    /// unsatisfiable schedule (empty weekday set, out-of-range time).
    pub fn next_after<Tz: TimeZone>(&self, after: DateTime<Tz>) -> Option<DateTime<Tz>> {
        if self.weekdays.is_empty() || self.hour > 23 || self.minute > 59 {
            return None;
        }

        let mut candidate = after + Duration::minutes(1);
        candidate = candidate.with_second(0).unwrap_or(candidate);
        candidate = candidate.with_nanosecond(0).unwrap_or(candidate);

        // A full week plus a day covers every case.
        for _ in 0..(8 * 24 * 60) {
            if candidate.hour() == self.hour
                && candidate.minute() == self.minute
                && self.weekdays.contains(&candidate.weekday())
            {
                return Some(candidate);
            }
            candidate += Duration::minutes(1);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sched() -> WeeklySchedule {
        WeeklySchedule::new(&[Weekday::Tue, Weekday::Thu], 9, 15)
    }

    #[test]
    fn test_same_day_before_fire_time() {
        // 2025-06-10 is a Tuesday.
        let after = Utc.with_ymd_and_hms(2025, 6, 10, 7, 0, 0).unwrap();
        let next = sched().next_after(after).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 10, 9, 15, 0).unwrap());
    }

    #[test]
    fn test_after_fire_time_rolls_to_thursday() {
        let after = Utc.with_ymd_and_hms(2025, 6, 10, 9, 15, 0).unwrap();
        let next = sched().next_after(after).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 12, 9, 15, 0).unwrap());
    }

    #[test]
    fn test_weekend_rolls_to_tuesday() {
        // 2025-06-14 is a Saturday.
        let after = Utc.with_ymd_and_hms(2025, 6, 14, 12, 0, 0).unwrap();
        let next = sched().next_after(after).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 17, 9, 15, 0).unwrap());
    }

    #[test]
    fn test_strictly_after() {
        // Exactly at the fire minute: next one is two days later.
        let at = Utc.with_ymd_and_hms(2025, 6, 12, 9, 15, 0).unwrap();
        let next = sched().next_after(at).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 17, 9, 15, 0).unwrap());
    }

    #[test]
    fn test_unsatisfiable() {
        assert!(WeeklySchedule::new(&[], 9, 15).next_after(Utc::now()).is_none());
        assert!(
            WeeklySchedule::new(&[Weekday::Tue], 25, 0)
                .next_after(Utc::now())
                .is_none()
        );
    }
}
