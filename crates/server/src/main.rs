use std::future::IntoFuture;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::Notify;
use tracing::{info, warn};

use burnbin_server::api::{ApiLimits, AppState};
use burnbin_server::config::BurnbinConfig;

/// Burn-after-read paste server.
#[derive(Parser, Debug)]
#[command(name = "burnbin-server", about = "Standalone HTTP server for burnbin")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "burnbin.toml")]
    config: PathBuf,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Default)]
enum Commands {
    /// Serve the HTTP API (default).
    #[default]
    Serve,
    /// Run one reaper pass, deleting blobs no readable paste refers to, then exit.
    Reap,
    /// Run database migrations for the configured metadata backend, then exit.
    Migrate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (config, found) = BurnbinConfig::load(&cli.config)?;
    burnbin_server::telemetry::init(&config.logging);
    if !found {
        info!(path = %cli.config.display(), "config file not found, using defaults");
    }

    match cli.command.unwrap_or_default() {
        Commands::Serve => serve(config, cli.host, cli.port).await,
        Commands::Reap => run_reap(&config).await,
        Commands::Migrate => run_migrate(&config).await,
    }
}

async fn serve(
    config: BurnbinConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let orchestrator = burnbin_server::factory::build_orchestrator(&config).await?;

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        limits: ApiLimits {
            max_body_bytes: config.server.max_body_bytes,
            max_ttl: config.paste.max_ttl(),
        },
    };
    let app = burnbin_server::api::router(state);

    // CLI overrides take precedence.
    let host = host.unwrap_or(config.server.host);
    let port = port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "burnbin-server listening");

    let stopping = Arc::new(Notify::new());
    let server = axum::serve(listener, app).with_graceful_shutdown({
        let stopping = Arc::clone(&stopping);
        async move {
            shutdown_signal().await;
            stopping.notify_one();
        }
    });

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    let drain_deadline = async {
        stopping.notified().await;
        tokio::time::sleep(shutdown_timeout).await;
    };

    tokio::select! {
        result = server.into_future() => result?,
        () = drain_deadline => {
            warn!(
                timeout_secs = config.server.shutdown_timeout_seconds,
                "shutdown timeout exceeded, dropping in-flight requests"
            );
        }
    }

    info!("burnbin-server shut down");
    Ok(())
}

/// Run the `reap` subcommand: one pass, meant to be scheduled by cron.
async fn run_reap(config: &BurnbinConfig) -> Result<(), Box<dyn std::error::Error>> {
    let reaper = burnbin_server::factory::build_reaper(config).await?;
    let report = reaper.run_once(chrono::Utc::now()).await?;
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

/// Run the `migrate` subcommand: initialize the metadata schema and exit.
async fn run_migrate(config: &BurnbinConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(backend = %config.metadata.backend, "running metadata migrations...");
    let _store = burnbin_server::factory::create_metadata_store(
        &config.metadata,
        config.connect.retry_policy(),
    )
    .await?;
    info!(backend = %config.metadata.backend, "metadata migrations complete");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
