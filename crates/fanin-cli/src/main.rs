#![doc = include_str!("../README.md")]

mod config;
mod telemetry;

use clap::Parser;
use config::CliArgs;
use fanin::{Orchestrator, RunConfig};
use telemetry::init_telemetry;
use tokio::signal;
use tokio_util::sync::CancellationToken;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = RunConfig::try_from(args)?;

    init_telemetry()?;

    let orchestrator = Orchestrator::new(config)?;
    log_startup_info(&orchestrator);

    let shutdown = tokio::spawn(shutdown_signal(orchestrator.shutdown_token()));
    let result = orchestrator.run(std::io::stdout()).await;
    shutdown.abort();

    let report = result?;
    tracing::info!(
        "All {} workers done: {} messages aggregated in {:?}",
        report.completed,
        report.output.received,
        report.elapsed
    );
    Ok(())
}

fn log_startup_info(orchestrator: &Orchestrator) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting run with full config: {:#?}", orchestrator.config());
    } else {
        tracing::info!("{}", startup_summary(orchestrator));
    }
    for worker in orchestrator.workers() {
        tracing::debug!(
            "Worker [{}]: {} operations, {:?} apart, starting after {:?}",
            worker.id,
            worker.operation_count,
            worker.inter_op_delay,
            worker.startup_delay
        );
    }
}

fn startup_summary(orchestrator: &Orchestrator) -> String {
    let config = orchestrator.config();
    format!(
        "Starting run with {} workers ({}-char {} payloads)",
        orchestrator.workers().len(),
        config.payload_len,
        config.charset
    )
}

/// Cancels the run on Ctrl+C or SIGTERM. The run still joins every task
/// before `main` returns.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Shutdown signal received, cancelling run...");
    shutdown_token.cancel();
}
