//! Error handling module
//!
//! One taxonomy for everything the tracker can refuse or fail at.

/// Crate-wide Result type
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Tracker error types
///
/// The first group is user-recoverable and is shown inline next to the form
/// that caused it. `Storage` and `Io` are fatal to the current operation.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    // Registration
    #[error("Invalid email format!")]
    InvalidEmail,

    #[error("Name already taken! Please choose another.")]
    NameTaken,

    #[error("Email already registered!")]
    EmailTaken,

    // Login / session
    #[error("Invalid credentials.")]
    InvalidCredentials,

    #[error("Please log in first.")]
    NotLoggedIn,

    // Expense input
    #[error("Amount must be zero or more.")]
    NegativeAmount,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    // Fatal
    #[error("Database error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrackerError {
    /// True for errors caused by user input, which the shells show as a
    /// message rather than a failure.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, TrackerError::Storage(_) | TrackerError::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(TrackerError::InvalidEmail.to_string(), "Invalid email format!");
        assert_eq!(
            TrackerError::NameTaken.to_string(),
            "Name already taken! Please choose another."
        );
        assert_eq!(TrackerError::EmailTaken.to_string(), "Email already registered!");
        assert_eq!(TrackerError::InvalidCredentials.to_string(), "Invalid credentials.");
    }

    #[test]
    fn test_user_error_classification() {
        assert!(TrackerError::NameTaken.is_user_error());
        assert!(TrackerError::InvalidDate("2024-13-01".to_string()).is_user_error());
        assert!(!TrackerError::Storage(rusqlite::Error::InvalidQuery).is_user_error());
    }
}
