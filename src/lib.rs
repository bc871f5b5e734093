// Expense Tracker - Core Library
// Exposes all modules for use in the CLI, the web server, and tests

pub mod accounts;
pub mod config;
pub mod credentials;
pub mod db;
pub mod email;
pub mod error;
pub mod ledger;
pub mod report;
pub mod session;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use accounts::{register, find_user, User, UserId};
pub use config::{Config, ConfigError};
pub use credentials::{authenticate, login};
pub use db::{open_database, open_in_memory, setup_database};
pub use email::is_valid_email;
pub use error::{TrackerError, TrackerResult};
pub use ledger::{add_expense, get_expenses, ExpenseRow, NewExpense};
pub use report::{render, Report};
pub use session::{Session, SessionStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing/logging for the binaries
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "expense_tracker=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
