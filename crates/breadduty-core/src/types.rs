//! Domain types — users, duty days, duty dates.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Which weekdays a user can be assigned to. Bread duty only ever happens
/// on Tuesdays and Thursdays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyDays {
    Tuesday,
    Thursday,
    Both,
}

impl Default for DutyDays {
    fn default() -> Self {
        DutyDays::Both
    }
}

impl DutyDays {
    /// Whether this eligibility covers the given weekday.
    pub fn covers(&self, weekday: Weekday) -> bool {
        match self {
            DutyDays::Tuesday => weekday == Weekday::Tue,
            DutyDays::Thursday => weekday == Weekday::Thu,
            DutyDays::Both => weekday == Weekday::Tue || weekday == Weekday::Thu,
        }
    }

    /// All enum values, for the duty-days listing endpoint.
    pub fn all() -> [DutyDays; 3] {
        [DutyDays::Tuesday, DutyDays::Thursday, DutyDays::Both]
    }

    /// Stable string form used for storage and the HTTP API.
    pub fn as_str(&self) -> &'static str {
        match self {
            DutyDays::Tuesday => "tuesday",
            DutyDays::Thursday => "thursday",
            DutyDays::Both => "both",
        }
    }

    /// Parse the storage string form.
    pub fn parse(s: &str) -> Option<DutyDays> {
        match s {
            "tuesday" => Some(DutyDays::Tuesday),
            "thursday" => Some(DutyDays::Thursday),
            "both" => Some(DutyDays::Both),
            _ => None,
        }
    }
}

/// A duty date can only fall on Tuesday or Thursday.
pub fn is_duty_weekday(weekday: Weekday) -> bool {
    weekday == Weekday::Tue || weekday == Weekday::Thu
}

/// A roster member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub duty_days: DutyDays,
}

/// A calendar date with exactly one assigned responsible user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DutyDate {
    pub id: i64,
    pub date: NaiveDate,
    pub user: User,
    /// Whether a reminder send has been attempted. Monotonic: once true it
    /// is never reset automatically.
    pub notified: bool,
}
