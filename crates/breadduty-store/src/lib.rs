//! SQLite persistence for the bread-duty roster.
//!
//! One connection behind a mutex; WAL mode for concurrent reads. The two
//! operations the spec requires to be atomic — roster replacement and user
//! deletion with its owned duty dates — run inside explicit transactions so
//! the store is always fully old or fully new.

use std::path::Path;
use std::sync::Mutex;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use rusqlite::{Connection, params};

use breadduty_core::roster::Assignment;
use breadduty_core::types::{DutyDate, DutyDays, User, is_duty_weekday};
use breadduty_core::{Error, Result};

/// Partial user update; `None` fields are left untouched.
#[derive(Debug, Default, Clone)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub duty_days: Option<DutyDays>,
}

/// Roster store — users and duty dates.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| Error::Persistence(format!("DB open error: {e}")))?;

        // WAL for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;").ok();
        conn.execute_batch("PRAGMA foreign_keys=ON;").ok();

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// In-memory database, for tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(Path::new(":memory:"))
    }

    /// Run schema migrations.
    fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                duty_days TEXT NOT NULL DEFAULT 'both'
            );

            CREATE TABLE IF NOT EXISTS duty_dates (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                user_id INTEGER NOT NULL REFERENCES users(id),
                notified INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_duty_dates_date ON duty_dates(date);
            CREATE INDEX IF NOT EXISTS idx_duty_dates_user ON duty_dates(user_id);
            ",
        )
        .map_err(|e| Error::Persistence(format!("Migration error: {e}")))?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::Persistence(format!("Lock: {e}")))
    }

    // ── User CRUD ──────────────────────────────

    /// Create a user. Duplicate email is a conflict.
    pub fn create_user(&self, name: &str, email: &str, duty_days: DutyDays) -> Result<User> {
        if name.trim().is_empty() {
            return Err(Error::Validation("user name must not be empty".into()));
        }
        let conn = self.lock()?;
        let existing: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM users WHERE email=?1",
                params![email],
                |r| r.get(0),
            )
            .map_err(|e| Error::Persistence(format!("Email check: {e}")))?;
        if existing > 0 {
            return Err(Error::Conflict(format!("email already registered: {email}")));
        }

        conn.execute(
            "INSERT INTO users (name, email, duty_days) VALUES (?1, ?2, ?3)",
            params![name, email, duty_days.as_str()],
        )
        .map_err(map_sql)?;
        let id = conn.last_insert_rowid();
        drop(conn);
        self.get_user(id)
    }

    /// Get a single user.
    pub fn get_user(&self, id: i64) -> Result<User> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, name, email, duty_days FROM users WHERE id=?1",
            params![id],
            row_to_user,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound(format!("user {id}")),
            other => Error::Persistence(format!("Get user: {other}")),
        })
    }

    /// List all users in directory order (insertion order).
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, name, email, duty_days FROM users ORDER BY id")
            .map_err(|e| Error::Persistence(format!("Prepare: {e}")))?;
        let users = stmt
            .query_map([], row_to_user)
            .map_err(|e| Error::Persistence(format!("Query: {e}")))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(users)
    }

    /// Users whose eligibility covers the given weekday.
    pub fn eligible_users(&self, weekday: Weekday) -> Result<Vec<User>> {
        let single = match weekday {
            Weekday::Tue => DutyDays::Tuesday,
            Weekday::Thu => DutyDays::Thursday,
            _ => return Ok(Vec::new()),
        };
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, name, email, duty_days FROM users
                 WHERE duty_days IN (?1, ?2) ORDER BY id",
            )
            .map_err(|e| Error::Persistence(format!("Prepare: {e}")))?;
        let users = stmt
            .query_map(params![single.as_str(), DutyDays::Both.as_str()], row_to_user)
            .map_err(|e| Error::Persistence(format!("Query: {e}")))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(users)
    }

    /// Apply a partial update to a user.
    pub fn update_user(&self, id: i64, patch: UserPatch) -> Result<User> {
        // Existence check first, so unknown ids are a 404 and not a no-op.
        let current = self.get_user(id)?;

        let conn = self.lock()?;
        if let Some(email) = &patch.email
            && *email != current.email
        {
            let taken: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM users WHERE email=?1 AND id<>?2",
                    params![email, id],
                    |r| r.get(0),
                )
                .map_err(|e| Error::Persistence(format!("Email check: {e}")))?;
            if taken > 0 {
                return Err(Error::Conflict(format!("email already registered: {email}")));
            }
        }

        let name = patch.name.unwrap_or(current.name);
        let email = patch.email.unwrap_or(current.email);
        let duty_days = patch.duty_days.unwrap_or(current.duty_days);
        conn.execute(
            "UPDATE users SET name=?1, email=?2, duty_days=?3 WHERE id=?4",
            params![name, email, duty_days.as_str(), id],
        )
        .map_err(map_sql)?;
        drop(conn);
        self.get_user(id)
    }

    /// Delete a user and all duty dates they own, in one transaction.
    /// Returns the number of duty dates removed with them.
    pub fn delete_user(&self, id: i64) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| Error::Persistence(format!("Begin: {e}")))?;

        let dates_removed = tx
            .execute("DELETE FROM duty_dates WHERE user_id=?1", params![id])
            .map_err(|e| Error::Persistence(format!("Delete owned dates: {e}")))?;
        let users_removed = tx
            .execute("DELETE FROM users WHERE id=?1", params![id])
            .map_err(|e| Error::Persistence(format!("Delete user: {e}")))?;
        if users_removed == 0 {
            // Roll back the date deletions too.
            return Err(Error::NotFound(format!("user {id}")));
        }
        tx.commit()
            .map_err(|e| Error::Persistence(format!("Commit: {e}")))?;
        Ok(dates_removed)
    }

    // ── Duty dates ──────────────────────────────

    /// Manually assign a duty date. The date must fall on a duty weekday and
    /// the user's eligibility must cover it.
    pub fn create_date(&self, date: NaiveDate, user_id: i64) -> Result<DutyDate> {
        let weekday = date.weekday();
        if !is_duty_weekday(weekday) {
            return Err(Error::Validation(format!(
                "{date} is a {weekday}; duty dates fall on Tuesday or Thursday"
            )));
        }
        let user = self.get_user(user_id)?;
        if !user.duty_days.covers(weekday) {
            return Err(Error::Validation(format!(
                "user {} is not available on {weekday}",
                user.name
            )));
        }

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO duty_dates (date, user_id, notified) VALUES (?1, ?2, 0)",
            params![date, user_id],
        )
        .map_err(map_sql)?;
        let id = conn.last_insert_rowid();
        drop(conn);
        self.get_date(id)
    }

    /// Get a single duty date with its user.
    pub fn get_date(&self, id: i64) -> Result<DutyDate> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT d.id, d.date, d.notified, u.id, u.name, u.email, u.duty_days
             FROM duty_dates d JOIN users u ON u.id = d.user_id
             WHERE d.id=?1",
            params![id],
            row_to_date,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound(format!("duty date {id}")),
            other => Error::Persistence(format!("Get date: {other}")),
        })
    }

    /// All duty dates, ascending, with their users.
    pub fn list_dates(&self) -> Result<Vec<DutyDate>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT d.id, d.date, d.notified, u.id, u.name, u.email, u.duty_days
                 FROM duty_dates d JOIN users u ON u.id = d.user_id
                 ORDER BY d.date, d.id",
            )
            .map_err(|e| Error::Persistence(format!("Prepare: {e}")))?;
        let dates = stmt
            .query_map([], row_to_date)
            .map_err(|e| Error::Persistence(format!("Query: {e}")))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(dates)
    }

    /// Delete one duty date.
    pub fn delete_date(&self, id: i64) -> Result<()> {
        let conn = self.lock()?;
        let removed = conn
            .execute("DELETE FROM duty_dates WHERE id=?1", params![id])
            .map_err(|e| Error::Persistence(format!("Delete date: {e}")))?;
        if removed == 0 {
            return Err(Error::NotFound(format!("duty date {id}")));
        }
        Ok(())
    }

    /// Delete every duty date; returns how many were removed.
    pub fn delete_all_dates(&self) -> Result<usize> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM duty_dates", [])
            .map_err(|e| Error::Persistence(format!("Delete all dates: {e}")))
    }

    /// Replace all duty dates in `[start, end]` with a freshly planned
    /// roster, as a single transaction. Partial application never survives:
    /// on any failure the previous roster stays intact.
    pub fn replace_roster(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        assignments: &[Assignment],
    ) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| Error::Persistence(format!("Begin: {e}")))?;

        tx.execute(
            "DELETE FROM duty_dates WHERE date >= ?1 AND date <= ?2",
            params![start, end],
        )
        .map_err(|e| Error::Persistence(format!("Clear range: {e}")))?;

        for a in assignments {
            tx.execute(
                "INSERT INTO duty_dates (date, user_id, notified) VALUES (?1, ?2, 0)",
                params![a.date, a.user_id],
            )
            .map_err(|e| Error::Persistence(format!("Insert {}: {e}", a.date)))?;
        }

        tx.commit()
            .map_err(|e| Error::Persistence(format!("Commit: {e}")))?;
        tracing::debug!("Roster replaced: {} dates in {start}..{end}", assignments.len());
        Ok(assignments.len())
    }

    /// Duty dates due for a reminder: within `[today, today + lookahead]`
    /// inclusive, not yet notified, ascending.
    pub fn due_dates(&self, today: NaiveDate, lookahead_days: i64) -> Result<Vec<DutyDate>> {
        let until = today
            .checked_add_days(Days::new(lookahead_days.max(0) as u64))
            .unwrap_or(today);
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT d.id, d.date, d.notified, u.id, u.name, u.email, u.duty_days
                 FROM duty_dates d JOIN users u ON u.id = d.user_id
                 WHERE d.date >= ?1 AND d.date <= ?2 AND d.notified = 0
                 ORDER BY d.date, d.id",
            )
            .map_err(|e| Error::Persistence(format!("Prepare: {e}")))?;
        let dates = stmt
            .query_map(params![today, until], row_to_date)
            .map_err(|e| Error::Persistence(format!("Query: {e}")))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(dates)
    }

    /// Mark a duty date as notified. Monotonic — there is no way back.
    pub fn mark_notified(&self, id: i64) -> Result<()> {
        let conn = self.lock()?;
        let updated = conn
            .execute(
                "UPDATE duty_dates SET notified=1 WHERE id=?1",
                params![id],
            )
            .map_err(|e| Error::Persistence(format!("Mark notified: {e}")))?;
        if updated == 0 {
            return Err(Error::NotFound(format!("duty date {id}")));
        }
        Ok(())
    }

    /// Retention cleanup: remove duty dates strictly before `today`.
    pub fn purge_before(&self, today: NaiveDate) -> Result<usize> {
        let conn = self.lock()?;
        let removed = conn
            .execute("DELETE FROM duty_dates WHERE date < ?1", params![today])
            .map_err(|e| Error::Persistence(format!("Purge: {e}")))?;
        if removed > 0 {
            tracing::debug!("Purged {removed} past duty date(s)");
        }
        Ok(removed)
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let duty_days: String = row.get(3)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        duty_days: DutyDays::parse(&duty_days).unwrap_or_default(),
    })
}

fn row_to_date(row: &rusqlite::Row<'_>) -> rusqlite::Result<DutyDate> {
    let duty_days: String = row.get(6)?;
    Ok(DutyDate {
        id: row.get(0)?,
        date: row.get(1)?,
        notified: row.get::<_, i64>(2)? != 0,
        user: User {
            id: row.get(3)?,
            name: row.get(4)?,
            email: row.get(5)?,
            duty_days: DutyDays::parse(&duty_days).unwrap_or_default(),
        },
    })
}

/// Map a rusqlite error, turning uniqueness violations into conflicts.
fn map_sql(e: rusqlite::Error) -> Error {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Error::Conflict(format!("constraint violation: {e}"))
        }
        _ => Error::Persistence(format!("SQL error: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use breadduty_core::roster;

    fn store_with_users() -> Store {
        let store = Store::open_in_memory().unwrap();
        store.create_user("Ana", "ana@office.test", DutyDays::Tuesday).unwrap();
        store.create_user("Bruno", "bruno@office.test", DutyDays::Thursday).unwrap();
        store.create_user("Clara", "clara@office.test", DutyDays::Both).unwrap();
        store
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_user_crud() {
        let store = Store::open_in_memory().unwrap();

        let u = store.create_user("Ana", "ana@office.test", DutyDays::Both).unwrap();
        assert_eq!(u.name, "Ana");
        assert_eq!(u.duty_days, DutyDays::Both);

        let fetched = store.get_user(u.id).unwrap();
        assert_eq!(fetched, u);

        let updated = store
            .update_user(
                u.id,
                UserPatch {
                    duty_days: Some(DutyDays::Tuesday),
                    ..UserPatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.duty_days, DutyDays::Tuesday);
        assert_eq!(updated.name, "Ana");

        store.delete_user(u.id).unwrap();
        assert!(matches!(store.get_user(u.id), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_duplicate_email_is_conflict() {
        let store = Store::open_in_memory().unwrap();
        store.create_user("Ana", "ana@office.test", DutyDays::Both).unwrap();
        let err = store
            .create_user("Other Ana", "ana@office.test", DutyDays::Both)
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_update_to_taken_email_is_conflict() {
        let store = store_with_users();
        let err = store
            .update_user(
                1,
                UserPatch {
                    email: Some("bruno@office.test".into()),
                    ..UserPatch::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_update_unknown_user_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        let err = store.update_user(99, UserPatch::default()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_eligible_users_per_weekday() {
        let store = store_with_users();
        let tue: Vec<_> = store
            .eligible_users(Weekday::Tue)
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(tue, vec!["Ana", "Clara"]);

        let thu: Vec<_> = store
            .eligible_users(Weekday::Thu)
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(thu, vec!["Bruno", "Clara"]);

        assert!(store.eligible_users(Weekday::Mon).unwrap().is_empty());
    }

    #[test]
    fn test_create_date_validations() {
        let store = store_with_users();

        // 2025-06-09 is a Monday.
        let err = store.create_date(d(2025, 6, 9), 3).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        // Ana (Tuesday-only) cannot take a Thursday.
        let err = store.create_date(d(2025, 6, 12), 1).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        // Unknown user.
        let err = store.create_date(d(2025, 6, 10), 42).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        // Valid: Clara (Both) on a Tuesday.
        let date = store.create_date(d(2025, 6, 10), 3).unwrap();
        assert_eq!(date.user.name, "Clara");
        assert!(!date.notified);
    }

    #[test]
    fn test_delete_user_cascades_duty_dates() {
        let store = store_with_users();
        store.create_date(d(2025, 6, 10), 3).unwrap();
        store.create_date(d(2025, 6, 12), 3).unwrap();
        store.create_date(d(2025, 6, 17), 3).unwrap();
        store.create_date(d(2025, 6, 10), 1).unwrap();

        let removed = store.delete_user(3).unwrap();
        assert_eq!(removed, 3);

        let remaining = store.list_dates().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].user.name, "Ana");
    }

    #[test]
    fn test_replace_roster_clears_range() {
        let store = store_with_users();
        let users = store.list_users().unwrap();
        let start = d(2025, 6, 1);
        let end = d(2025, 6, 30);

        let plan = roster::plan(&users, start, end);
        let created = store.replace_roster(start, end, &plan).unwrap();
        assert_eq!(created, plan.len());
        assert_eq!(store.list_dates().unwrap().len(), plan.len());

        // Regenerating the same range yields the same total count.
        let plan2 = roster::plan(&users, start, end);
        store.replace_roster(start, end, &plan2).unwrap();
        assert_eq!(store.list_dates().unwrap().len(), plan.len());
    }

    #[test]
    fn test_replace_roster_aborts_atomically() {
        let store = store_with_users();
        let start = d(2025, 6, 1);
        let end = d(2025, 6, 30);
        let before = store.create_date(d(2025, 6, 10), 3).unwrap();

        // user_id 42 violates the FK constraint mid-transaction; the old
        // roster must survive untouched.
        let bad = vec![
            Assignment { date: d(2025, 6, 12), user_id: 2 },
            Assignment { date: d(2025, 6, 17), user_id: 42 },
        ];
        assert!(store.replace_roster(start, end, &bad).is_err());

        let dates = store.list_dates().unwrap();
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].id, before.id);
    }

    #[test]
    fn test_due_dates_window_and_notified_filter() {
        let store = store_with_users();
        let today = d(2025, 6, 10); // Tuesday

        let due_now = store.create_date(today, 3).unwrap();
        let in_window = store.create_date(d(2025, 6, 12), 2).unwrap(); // Thursday, +2
        let outside = store.create_date(d(2025, 6, 24), 1).unwrap(); // +14

        store.mark_notified(in_window.id).unwrap();

        let due = store.due_dates(today, 7).unwrap();
        let ids: Vec<_> = due.iter().map(|d| d.id).collect();
        assert!(ids.contains(&due_now.id));
        assert!(!ids.contains(&in_window.id), "notified dates never reappear");
        assert!(!ids.contains(&outside.id), "outside the lookahead window");

        // Ascending order.
        let mut sorted = due.clone();
        sorted.sort_by_key(|d| d.date);
        assert_eq!(
            due.iter().map(|d| d.date).collect::<Vec<_>>(),
            sorted.iter().map(|d| d.date).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_mark_notified_unknown_date() {
        let store = Store::open_in_memory().unwrap();
        assert!(matches!(store.mark_notified(5), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_purge_before() {
        let store = store_with_users();
        store.create_date(d(2025, 6, 3), 3).unwrap();
        store.create_date(d(2025, 6, 5), 3).unwrap();
        store.create_date(d(2025, 6, 10), 3).unwrap();

        let removed = store.purge_before(d(2025, 6, 10)).unwrap();
        assert_eq!(removed, 2);
        let left = store.list_dates().unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].date, d(2025, 6, 10));
    }

    #[test]
    fn test_delete_all_dates_counts() {
        let store = store_with_users();
        store.create_date(d(2025, 6, 10), 3).unwrap();
        store.create_date(d(2025, 6, 12), 3).unwrap();
        assert_eq!(store.delete_all_dates().unwrap(), 2);
        assert!(store.list_dates().unwrap().is_empty());
    }
}
