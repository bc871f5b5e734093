// 👤 Account Registry - who may use the tracker
//
// Rules for a new account, first failure wins:
// 1. email must pass the syntactic validator
// 2. name must not already exist
// 3. email must not already exist
//
// SECURITY GAP: passwords are stored verbatim and uniqueness is an exact,
// case-sensitive string match ("Bob" and "bob" are different users).
// Changing either is a behaviour change and must be made explicitly.

use crate::email::is_valid_email;
use crate::error::{TrackerError, TrackerResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

/// Row id assigned by SQLite when the user is created
pub type UserId = i64;

// ============================================================================
// USER ENTITY
// ============================================================================

/// A registered account. Never mutated or deleted once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Stored as submitted
    #[serde(skip_serializing)]
    pub password: String,
}

// ============================================================================
// REGISTRATION
// ============================================================================

/// Create a new account and return its id.
pub fn register(
    conn: &Connection,
    name: &str,
    email: &str,
    password: &str,
) -> TrackerResult<UserId> {
    if !is_valid_email(email) {
        tracing::info!(email, "registration rejected: invalid email");
        return Err(TrackerError::InvalidEmail);
    }
    if is_name_taken(conn, name)? {
        tracing::info!(name, "registration rejected: name taken");
        return Err(TrackerError::NameTaken);
    }
    if is_email_registered(conn, email)? {
        tracing::info!(email, "registration rejected: email registered");
        return Err(TrackerError::EmailTaken);
    }

    conn.execute(
        "INSERT INTO users (name, email, password) VALUES (?1, ?2, ?3)",
        params![name, email, password],
    )?;
    let id = conn.last_insert_rowid();

    tracing::info!(user_id = id, name, "user registered");
    Ok(id)
}

/// Is `name` already used by an account? (exact match)
pub fn is_name_taken(conn: &Connection, name: &str) -> TrackerResult<bool> {
    let found: Option<UserId> = conn
        .query_row("SELECT id FROM users WHERE name = ?1", [name], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

/// Is `email` already used by an account? (exact match)
pub fn is_email_registered(conn: &Connection, email: &str) -> TrackerResult<bool> {
    let found: Option<UserId> = conn
        .query_row("SELECT id FROM users WHERE email = ?1", [email], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

// ============================================================================
// LOOKUPS
// ============================================================================

/// Load a user by id
pub fn find_user(conn: &Connection, id: UserId) -> TrackerResult<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, name, email, password FROM users WHERE id = ?1",
            [id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                    password: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

pub fn count_users(conn: &Connection) -> TrackerResult<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(count)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[test]
    fn test_register_returns_new_id() {
        let conn = open_in_memory().unwrap();

        let id = register(&conn, "alice", "alice@example.com", "secret").unwrap();
        let user = find_user(&conn, id).unwrap().unwrap();

        assert_eq!(user.name, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.password, "secret");
        assert_eq!(count_users(&conn).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let conn = open_in_memory().unwrap();
        register(&conn, "alice", "alice@example.com", "pw").unwrap();

        let err = register(&conn, "alice", "other@example.com", "pw").unwrap_err();
        assert!(matches!(err, TrackerError::NameTaken));
        assert_eq!(count_users(&conn).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let conn = open_in_memory().unwrap();
        register(&conn, "alice", "alice@example.com", "pw").unwrap();

        let err = register(&conn, "bob", "alice@example.com", "pw").unwrap_err();
        assert!(matches!(err, TrackerError::EmailTaken));
    }

    #[test]
    fn test_check_order_email_first_then_name() {
        let conn = open_in_memory().unwrap();
        register(&conn, "alice", "alice@example.com", "pw").unwrap();

        // Invalid email beats taken name
        let err = register(&conn, "alice", "not-an-email", "pw").unwrap_err();
        assert!(matches!(err, TrackerError::InvalidEmail));

        // Taken name beats taken email
        let err = register(&conn, "alice", "alice@example.com", "pw").unwrap_err();
        assert!(matches!(err, TrackerError::NameTaken));
    }

    #[test]
    fn test_uniqueness_is_case_sensitive() {
        let conn = open_in_memory().unwrap();
        register(&conn, "alice", "alice@example.com", "pw").unwrap();

        assert!(register(&conn, "Alice", "Alice@example.com", "pw").is_ok());
        assert_eq!(count_users(&conn).unwrap(), 2);
    }

    #[test]
    fn test_find_missing_user() {
        let conn = open_in_memory().unwrap();
        assert!(find_user(&conn, 42).unwrap().is_none());
    }
}
