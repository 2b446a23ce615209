use adminlog_server::{AppState, create_router, interceptor_from_config, load_config};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "adminlog-server", about = "Admin API with request/response audit logging")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "ADMINLOG_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured bind address.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut cfg = load_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        cfg.server.bind = bind;
    }

    let interceptor = Arc::new(interceptor_from_config(&cfg)?);
    let app = create_router(AppState::seeded(), interceptor);

    tracing::info!("adminlog-server listening on {}", cfg.server.bind);

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
