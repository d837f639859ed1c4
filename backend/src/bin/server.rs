//! Results HTTP Server Binary
//!
//! Serves the results JSON API. When a results file is configured it is
//! loaded at startup; otherwise the server starts empty and waits for an
//! upload on `POST /v1/dataset`.
//!
//! # Usage
//!
//! ```bash
//! RESULTS_FILE=resultados.csv cargo run --bin results-server
//! ```
//!
//! # Environment Variables
//!
//! - `RESULTS_FILE`: results file loaded at startup and on reload
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `RESULTS_FALLBACK_ENCODING`: encoding retried when decoding fails (default: windows-1252)
//! - `RESULTS_PODIUM_SIZE`: champions per group (default: 3)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;

use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use swim_results::config::AppConfig;
use swim_results::http::{create_router, AppState};
use swim_results::services::load_path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting results HTTP server");

    let config = AppConfig::load()?;
    let state = AppState::new(config);

    if let Some(path) = state.config.server.results_path.clone() {
        match load_path(&path, &state.config.ingest) {
            Ok(report) => {
                let dropped = report.dropped_rows();
                let snapshot = state.store.load(report.result_set, report.diagnostics);
                info!(
                    "Loaded {} records from {} ({} diagnostics, {} rows dropped)",
                    snapshot.result_set.len(),
                    path.display(),
                    snapshot.diagnostics.len(),
                    dropped
                );
            }
            Err(e) => warn!("Could not load {}: {}", path.display(), e),
        }
    } else {
        info!("No results file configured; waiting for an upload");
    }

    let addr: SocketAddr =
        format!("{}:{}", state.config.server.host, state.config.server.port).parse()?;
    let app = create_router(state);

    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
