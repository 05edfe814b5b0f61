// FUNDEF Registry - Web Server
// REST API + form pages with Axum

use anyhow::{Context, Result};
use fundef_registry::config::AppConfig;
use fundef_registry::web::{router, AppState};
use fundef_registry::{count_teachers, setup_database, telemetry};
use rusqlite::Connection;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    telemetry::init(&config.telemetry).context("failed to initialise logging")?;

    info!(version = fundef_registry::VERSION, "FUNDEF registry web server");

    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("failed to create data directory {:?}", config.data_dir))?;

    let db_path = config.database_path();
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open database at {:?}", db_path))?;
    setup_database(&conn).context("failed to set up database schema")?;
    info!(path = ?db_path, teachers = count_teachers(&conn)?, "database ready");

    let window = config.window;
    info!(start = %window.start, end = %window.end, "FUNDEF eligibility window");

    let app = router(AppState::new(conn, window));

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    info!("server running on http://{}", addr);
    info!("API: http://{}/api/teachers", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
