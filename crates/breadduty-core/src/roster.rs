//! Balanced roster planning.
//!
//! Pure assignment logic: given the user directory and a date range, produce
//! one assignment per Tuesday/Thursday in the range, spread evenly across
//! eligible users. Persistence is the store's job (`replace_roster` applies
//! a plan in a single transaction).

use chrono::{Datelike, NaiveDate};

use crate::types::{User, is_duty_weekday};

/// One planned duty slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub date: NaiveDate,
    pub user_id: i64,
}

/// Plan duty dates for `[start, end]` inclusive.
///
/// Walks every calendar day; for each Tuesday/Thursday it picks the eligible
/// user with the fewest assignments made *during this run*, ties broken by
/// directory order. Days with no eligible user are skipped. The per-user
/// counter starts at zero on every call — balancing is per generation run,
/// not a historical total.
///
/// Among users with identical eligibility the resulting counts differ by at
/// most one. This is a greedy heuristic: with mixed eligibility sets
/// (e.g. one Tuesday-only user among several Both users) the spread across
/// *all* users can be wider, which is expected behavior.
pub fn plan(users: &[User], start: NaiveDate, end: NaiveDate) -> Vec<Assignment> {
    let mut counts = vec![0u32; users.len()];
    let mut plan = Vec::new();

    let mut day = start;
    while day <= end {
        let weekday = day.weekday();
        if is_duty_weekday(weekday) {
            let mut chosen: Option<usize> = None;
            for (i, user) in users.iter().enumerate() {
                if !user.duty_days.covers(weekday) {
                    continue;
                }
                match chosen {
                    None => chosen = Some(i),
                    Some(c) if counts[i] < counts[c] => chosen = Some(i),
                    _ => {}
                }
            }
            if let Some(i) = chosen {
                plan.push(Assignment {
                    date: day,
                    user_id: users[i].id,
                });
                counts[i] += 1;
            }
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    plan
}
