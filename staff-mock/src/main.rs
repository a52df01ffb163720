use std::net::SocketAddr;
use std::sync::Arc;

use staff_mock::{AppState, Config, logger};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    match config.log_dir.as_deref() {
        Some(dir) => logger::init_logger_with_file(&config.log_level, config.log_json, Some(dir))?,
        None => logger::init_logger(&config.log_level, config.log_json)?,
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr).await?;
    let state = Arc::new(AppState::new(config));

    let users: Vec<&str> = state
        .config
        .seed_users
        .iter()
        .map(|u| u.email.as_str())
        .collect();
    tracing::info!(%addr, ?users, "staff-mock listening");
    staff_mock::serve(listener, state).await?;
    Ok(())
}
