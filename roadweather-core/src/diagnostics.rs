//! Logging setup and passive observers of API failures.

use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::ApiError;

/// Install a fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Returns `false` if a global subscriber was already set.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}

/// Log every failure published on an `api_error` channel until it closes.
pub fn spawn_error_logger(mut errors: broadcast::Receiver<ApiError>) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut seen = 0;
        loop {
            match errors.recv().await {
                Ok(e) => {
                    seen += 1;
                    error!(status = ?e.status(), timeout = e.is_timeout(), "API error: {e}");
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("API error logger fell behind, {missed} errors not logged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("API error channel closed after {seen} errors");
                    return seen;
                }
            }
        }
    })
}
