//! Staff Mock - in-memory stand-in for the hosted row and auth APIs
//!
//! Serves the endpoints `staff-client` talks to, with switchable read and
//! write failures. Used by integration tests and local demos.

pub mod api;
pub mod auth;
pub mod config;
pub mod logger;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub use config::Config;
pub use state::AppState;

/// Serves `state` on an already bound listener until the task is dropped
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    axum::serve(listener, api::router(state)).await
}

/// A mock running on an ephemeral local port
#[derive(Debug)]
pub struct RunningMock {
    pub addr: SocketAddr,
    pub state: Arc<AppState>,
    task: JoinHandle<()>,
}

impl RunningMock {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for RunningMock {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Binds `127.0.0.1:0` and serves in the background
pub async fn spawn(config: Config) -> std::io::Result<RunningMock> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = Arc::new(AppState::new(config));
    let task = tokio::spawn({
        let state = state.clone();
        async move {
            if let Err(e) = serve(listener, state).await {
                tracing::error!(error = %e, "Mock server stopped");
            }
        }
    });
    tracing::debug!(%addr, "Mock backend listening");
    Ok(RunningMock { addr, state, task })
}
