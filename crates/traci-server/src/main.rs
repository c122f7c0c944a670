//! TraCI server binary.
//!
//! - Loads `traci.yaml` (or the path given as first argument)
//! - Builds the scenario and registers the domain services
//! - Serves controllers over TCP until one sends `close`

use tracing_subscriber::{fmt, EnvFilter};

use traci_core::error::{Result, TraciError};
use traci_server::{app_state::AppState, config, transport};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("traci-server: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "traci.yaml".to_string());
    let cfg = config::load_from_file(&path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.logging.filter));
    fmt().with_env_filter(filter).init();

    let listen = cfg.server.listen_addr()?;
    let state = AppState::new(cfg)?;
    let mut engine = state.build_engine()?;

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| TraciError::Internal(format!("bind {listen} failed: {e}")))?;
    tracing::info!(%listen, "traci-server starting");

    transport::serve(listener, &mut engine, &state.cfg().server)
        .await
        .map_err(|e| TraciError::Internal(format!("server failed: {e}")))
}
