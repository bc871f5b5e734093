// 🔑 Credential Checker
// Exact match on stored email + password. No lockout, no rate limiting.

use crate::accounts::UserId;
use crate::error::{TrackerError, TrackerResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Id of the user whose email and password both match, if any.
pub fn login(conn: &Connection, email: &str, password: &str) -> TrackerResult<Option<UserId>> {
    let id = conn
        .query_row(
            "SELECT id FROM users WHERE email = ?1 AND password = ?2",
            params![email, password],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

/// Like [`login`], but a mismatch is an `InvalidCredentials` error.
pub fn authenticate(conn: &Connection, email: &str, password: &str) -> TrackerResult<UserId> {
    match login(conn, email, password)? {
        Some(id) => {
            tracing::info!(user_id = id, "login succeeded");
            Ok(id)
        }
        None => {
            tracing::warn!(email, "login failed");
            Err(TrackerError::InvalidCredentials)
        }
    }
}
