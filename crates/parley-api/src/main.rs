//! Parley CLI and REST API entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, loads `parley.toml`, initializes tracing and the
//! session store, then dispatches to a command handler or starts the server.

mod cli;
mod http;
mod state;

use clap::Parser;
use parley_infra::config::{load_config, resolve_config_path, resolve_data_dir};
use parley_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
use parley_types::config::ParleyConfig;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = resolve_data_dir();
    let config_path = resolve_config_path(cli.config.as_deref(), &data_dir);
    // Logging settings live in the config, so a load failure is held until
    // the subscriber exists.
    let (config, config_error) = match load_config(&config_path).await {
        Ok(config) => (config, None),
        Err(err) => (ParleyConfig::default(), Some(err)),
    };

    init_tracing(&TracingOptions {
        json: config.logging.json,
        otel: config.logging.otel,
        verbosity: cli.verbose,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    match config_error {
        Some(err) => tracing::warn!(
            config = %config_path.display(),
            error = %format!("{err:#}"),
            "Ignoring config file, using defaults"
        ),
        None => tracing::debug!(
            config = %config_path.display(),
            data_dir = %data_dir.display(),
            "Configuration loaded"
        ),
    }

    let result = run(cli, config, data_dir).await;
    shutdown_tracing();
    result
}

async fn run(
    cli: Cli,
    config: ParleyConfig,
    data_dir: std::path::PathBuf,
) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port, host } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let state = AppState::init(&config, &data_dir).await?;

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Parley API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());
            tracing::info!(%addr, provider = state.chat_service.provider().name(), "Server started");

            let router = http::router::build_router(state.clone());
            let shutdown = state.shutdown.clone();

            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    shutdown_signal().await;
                    shutdown.cancel();
                })
                .await?;

            state.close().await;
            println!("\n  Server stopped.");
        }

        Commands::History { session_id } => {
            let store = state::open_store(&config, &data_dir).await?;
            cli::session::show_history(&store, &session_id, cli.json).await?;
            store.close().await;
        }

        Commands::Sessions => {
            let store = state::open_store(&config, &data_dir).await?;
            cli::session::list_sessions(&store, cli.json).await?;
            store.close().await;
        }

        Commands::Clear { session_id, all } => {
            let store = state::open_store(&config, &data_dir).await?;
            let target = if all { None } else { session_id.as_deref() };
            cli::session::clear(&store, target, cli.json).await?;
            store.close().await;
        }

        Commands::Send {
            session_id,
            message,
        } => {
            let state = AppState::init(&config, &data_dir).await?;
            let result =
                cli::send::send_message(&state, session_id.as_deref(), &message, cli.json).await;
            state.close().await;
            result?;
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
