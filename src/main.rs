//! Host Router
//!
//! Routes inbound HTTP requests to backends by their `Host` header. The
//! routing table is rebuilt from the route store whenever the control
//! plane changes it, and swapped in without restarting the listener.
//!
//! ```text
//!     Client ──▶ listener ──▶ dispatch (Host → Forwarder) ──▶ Backend
//!                                  │ no route
//!                                  ▼
//!                       /api/rpc · /reload-config · static files
//!
//!     /api/rpc ──▶ route store ──▶ build table ──▶ atomic swap
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use host_router::config::load_config_or_default;
use host_router::lifecycle::signals::wait_for_shutdown_signal;
use host_router::observability::logging::init_logging;
use host_router::{Application, Shutdown};

#[derive(Parser)]
#[command(name = "host-router", version)]
#[command(about = "Host-header routing proxy with live reconfiguration", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "router.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config_or_default(&args.config)?;

    init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        bind_address = %config.listener.bind_address,
        store = %config.store.path,
        "host-router starting"
    );

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!(error = %e, "Startup failed");
        e
    })?;
    tracing::info!(address = %app.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        trigger.trigger();
    });

    app.run(&shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
