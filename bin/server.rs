// Expense Tracker - Web Server
// Serves the register/login/expense/report form with Axum

use anyhow::Result;
use expense_tracker::server::{create_router, AppState};
use expense_tracker::{init_tracing, open_database, Config};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;

    // Opened once, held for the life of the process
    let conn = open_database(&config.database_path)?;
    tracing::info!(path = %config.database_path.display(), "database opened");

    let addr = config.bind_address();
    let app = create_router(AppState::new(conn, config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("💸 Expense Tracker running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received Ctrl+C, shutting down...");
}
