// 📒 Expense Ledger - append-only line items per user
//
// Dates are stored as ISO `YYYY-MM-DD` text, so lexicographic order is
// chronological order and `BETWEEN` works on the raw strings.

use crate::accounts::UserId;
use crate::error::{TrackerError, TrackerResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

/// ISO date format used for storage and range queries
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One row of a ledger query: `(date, item, amount)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRow {
    pub date: String,
    pub item: String,
    pub amount: f64,
}

/// Input collected from a shell before it reaches the ledger
#[derive(Debug, Clone, Deserialize)]
pub struct NewExpense {
    pub date: String,
    pub item: String,
    pub amount: f64,
}

impl NewExpense {
    pub fn new(date: impl Into<String>, item: impl Into<String>, amount: f64) -> Self {
        Self {
            date: date.into(),
            item: item.into(),
            amount,
        }
    }

    /// Enforce what the ledger itself does not: a real ISO date and a
    /// non-negative amount. Returns the date normalised to `YYYY-MM-DD`.
    pub fn validate(&self) -> TrackerResult<String> {
        let date = parse_date(&self.date)?;
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(TrackerError::NegativeAmount);
        }
        Ok(date.format(DATE_FORMAT).to_string())
    }

    /// Validate, then append to the ledger.
    pub fn save(&self, conn: &Connection, user_id: UserId) -> TrackerResult<()> {
        let date = self.validate()?;
        add_expense(conn, user_id, &date, &self.item, self.amount)
    }
}

/// Parse an ISO calendar date
pub fn parse_date(raw: &str) -> TrackerResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| TrackerError::InvalidDate(raw.to_string()))
}

/// Normalise optional report bounds to `YYYY-MM-DD`.
///
/// Blank bounds count as absent. Padding matters because the range query
/// compares the strings: `"2024-1-1"` would sort after `"2024-01-05"`.
pub fn normalize_range(
    start: Option<&str>,
    end: Option<&str>,
) -> TrackerResult<(Option<String>, Option<String>)> {
    let normalize = |raw: Option<&str>| -> TrackerResult<Option<String>> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => Ok(Some(parse_date(value)?.format(DATE_FORMAT).to_string())),
        }
    };
    Ok((normalize(start)?, normalize(end)?))
}

/// Append one expense. No validation happens here.
pub fn add_expense(
    conn: &Connection,
    user_id: UserId,
    date: &str,
    item: &str,
    amount: f64,
) -> TrackerResult<()> {
    conn.execute(
        "INSERT INTO expenses (user_id, date, item, amount) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, date, item, amount],
    )?;
    tracing::info!(user_id, date, amount, "expense saved");
    Ok(())
}

/// All expenses owned by `user_id`, in insertion order.
///
/// The date range applies only when both bounds are given; either bound alone
/// is ignored. Bounds are inclusive.
pub fn get_expenses(
    conn: &Connection,
    user_id: UserId,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> TrackerResult<Vec<ExpenseRow>> {
    let rows = match (start_date, end_date) {
        (Some(start), Some(end)) => {
            let mut stmt = conn.prepare(
                "SELECT date, item, amount FROM expenses
                 WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
                 ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map(params![user_id, start, end], expense_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
        _ => {
            let mut stmt = conn.prepare(
                "SELECT date, item, amount FROM expenses
                 WHERE user_id = ?1
                 ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map(params![user_id], expense_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
    };

    Ok(rows)
}

fn expense_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ExpenseRow> {
    Ok(ExpenseRow {
        date: row.get(0)?,
        item: row.get(1)?,
        amount: row.get(2)?,
    })
}

pub fn count_expenses(conn: &Connection, user_id: UserId) -> TrackerResult<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM expenses WHERE user_id = ?1",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ============================================================================
// TESTS
// ============================================================================
