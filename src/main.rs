use anyhow::{bail, Result};
use rusqlite::Connection;
use std::env;
use std::path::PathBuf;

use expense_tracker::{
    accounts, authenticate, get_expenses, init_tracing, ledger, open_database, render, report,
    Config, NewExpense, TrackerError,
};

const USAGE: &str = "\
Usage:
  expense-tracker init
  expense-tracker register <name> <email> <password>
  expense-tracker login <email> <password>
  expense-tracker add <email> <password> <date> <item> <amount>
  expense-tracker report <email> <password> [<start> <end>] [--out <file>]

Database file: $EXPENSES_DB (default expenses.db)
Web form:      cargo run --bin expense-server";

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = Config::from_env()?;

    let Some(command) = args.first() else {
        println!("{}", USAGE);
        return Ok(());
    };

    let conn = open_database(&config.database_path)?;

    match (command.as_str(), &args[1..]) {
        ("init", []) => {
            println!(
                "✓ Database ready: {} ({} users)",
                config.database_path.display(),
                accounts::count_users(&conn)?
            );
            Ok(())
        }
        ("register", [name, email, password]) => run_register(&conn, name, email, password),
        ("login", [email, password]) => run_login(&conn, email, password),
        ("add", [email, password, date, item, amount]) => {
            run_add(&conn, email, password, date, item, amount)
        }
        ("report", [email, password, rest @ ..]) => {
            run_report(&conn, &config, email, password, rest)
        }
        _ => {
            eprintln!("{}", USAGE);
            bail!("unrecognised command: {}", args.join(" "))
        }
    }
}

/// User-facing errors come back as their message alone; fatal ones keep their source
fn report_outcome(result: Result<(), TrackerError>) -> Result<()> {
    match result {
        Err(e) if e.is_user_error() => bail!("❌ {}", e),
        other => Ok(other?),
    }
}

fn run_register(conn: &Connection, name: &str, email: &str, password: &str) -> Result<()> {
    report_outcome(accounts::register(conn, name, email, password).map(|id| {
        println!("✅ User registered successfully! (id {})", id);
    }))
}

fn run_login(conn: &Connection, email: &str, password: &str) -> Result<()> {
    report_outcome(authenticate(conn, email, password).map(|id| {
        println!("✅ Login successful! (id {})", id);
    }))
}

fn run_add(
    conn: &Connection,
    email: &str,
    password: &str,
    date: &str,
    item: &str,
    amount: &str,
) -> Result<()> {
    let result = authenticate(conn, email, password).and_then(|user_id| {
        let amount = amount
            .parse::<f64>()
            .map_err(|_| TrackerError::InvalidAmount(amount.to_string()))?;
        NewExpense::new(date, item, amount).save(conn, user_id)
    });
    report_outcome(result.map(|()| println!("✅ Expense saved!")))
}

fn run_report(
    conn: &Connection,
    config: &Config,
    email: &str,
    password: &str,
    rest: &[String],
) -> Result<()> {
    let (out, start, end) = report_args(rest, &config.report_filename)?;

    let result = authenticate(conn, email, password).and_then(|user_id| {
        let rows = get_expenses(conn, user_id, start.as_deref(), end.as_deref())?;
        if rows.is_empty() {
            println!("⚠️  No data found.");
            return Ok(());
        }

        let rendered = render(&rows, &config.currency_prefix);
        println!("{}", rendered.to_text());
        report::write_pdf(&rendered, &out)?;
        println!("\n✓ PDF written to {}", out.display());
        Ok(())
    });
    report_outcome(result)
}

type ReportArgs = (PathBuf, Option<String>, Option<String>);

/// Split `[<start> <end>] [--out <file>]`; bounds come back as `YYYY-MM-DD`
fn report_args(rest: &[String], default_out: &str) -> Result<ReportArgs> {
    let mut out = PathBuf::from(default_out);
    let mut range = Vec::new();

    let mut iter = rest.iter();
    while let Some(arg) = iter.next() {
        if arg == "--out" {
            match iter.next() {
                Some(path) => out = PathBuf::from(path),
                None => bail!("--out needs a file name"),
            }
        } else {
            range.push(arg.as_str());
        }
    }

    let (start, end) = match range.as_slice() {
        [] => (None, None),
        [start, end] => ledger::normalize_range(Some(*start), Some(*end))?,
        _ => bail!("report takes both a start and an end date, or neither"),
    };

    Ok((out, start, end))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_report_args_pad_dates() {
        let (out, start, end) =
            report_args(&args(&["2024-1-5", "2024-1-31"]), "report.pdf").unwrap();

        assert_eq!(out, PathBuf::from("report.pdf"));
        assert_eq!(start.as_deref(), Some("2024-01-05"));
        assert_eq!(end.as_deref(), Some("2024-01-31"));
    }

    #[test]
    fn test_report_args_out_and_errors() {
        let (out, start, end) = report_args(&args(&["--out", "jan.pdf"]), "report.pdf").unwrap();
        assert_eq!(out, PathBuf::from("jan.pdf"));
        assert_eq!((start, end), (None, None));

        assert!(report_args(&args(&["2024-01-01"]), "report.pdf").is_err());
        assert!(report_args(&args(&["--out"]), "report.pdf").is_err());

        let err = report_args(&args(&["2024-13-01", "2024-12-31"]), "report.pdf").unwrap_err();
        assert!(err.to_string().contains("Invalid date"));
    }

    #[test]
    fn test_user_errors_become_plain_messages() {
        assert!(report_outcome(Ok(())).is_ok());

        let err = report_outcome(Err(TrackerError::NameTaken)).unwrap_err();
        assert_eq!(err.to_string(), "❌ Name already taken! Please choose another.");

        let err = report_outcome(Err(TrackerError::Io(std::io::Error::other("disk full"))))
            .unwrap_err();
        assert!(err.downcast_ref::<TrackerError>().is_some());
    }
}
