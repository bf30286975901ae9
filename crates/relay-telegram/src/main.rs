//! Telegram update relay binary.
//!
//! Start the relay with:
//! ```bash
//! TELEGRAM_BOT_TOKEN=xxx cargo run -p relay-telegram
//! ```

use clap::Parser;
use relay_telegram::RelayArgs;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env.local or .env before clap reads the environment
    let _ = dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv());

    let args = RelayArgs::parse();

    // Initialize logging based on verbosity
    let filter = match args.verbose {
        0 => "relay_telegram=info,relay_runtime=info",
        1 => "relay_telegram=debug,relay_runtime=debug",
        2 => "relay_telegram=trace,relay_runtime=trace,reqwest=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(filter))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("\n[relay] Telegram update relay");
    println!("   Press Ctrl+C to stop\n");

    // Credential problems stop inside `run`, before any request is made
    match relay_telegram::run(args, shutdown_signal()).await {
        Ok(pump) => {
            tracing::info!(cursor = %pump.cursor(), stats = %pump.stats(), "relay stopped");
            Ok(())
        }
        Err(e) if e.is_fatal() => {
            tracing::error!(error = %e, "relay failed");
            Err(e.into())
        }
        Err(e) => {
            tracing::warn!(error = %e, severity = ?e.severity(), "relay stopped early");
            Ok(())
        }
    }
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
