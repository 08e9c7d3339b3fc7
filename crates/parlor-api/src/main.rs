//! Parlor chat hub entry point.
//!
//! Binary name: `parlor`
//!
//! Parses CLI arguments, initializes tracing and application state, then
//! serves the HTTP/WebSocket API until ctrl-c.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need app state or tracing
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "parlor", &mut std::io::stdout());
        return Ok(());
    }

    // Set up tracing based on verbosity; RUST_LOG wins when set.
    let directives = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "info,parlor=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));
    parlor_observe::tracing_setup::init_tracing_with_filter(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = match cli.command {
        Commands::Serve { bind } => serve(bind).await,
        Commands::Completions { .. } => unreachable!("handled above"),
    };

    parlor_observe::tracing_setup::shutdown_tracing();
    result
}

/// Start the hub server and run until ctrl-c.
async fn serve(bind_override: Option<String>) -> anyhow::Result<()> {
    let state = AppState::init().await?;
    let bind_addr = bind_override.unwrap_or_else(|| state.config.bind_addr.clone());

    let router = http::router::build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "parlor hub listening");

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            signal_token.cancel();
        }
    });

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    Ok(())
}
