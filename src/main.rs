//! # RF Sender - Entry Point
//! src/main.rs
//!
//! Arranca el executor y el servidor HTTP, y espera una señal para
//! apagarse. Si el executor muere antes, el proceso sale con error.

use rf_sender::config::{Backend, Config};
use rf_sender::jobs::{Executor, ExecutorSnapshot, JobIntake, JobQueue};
use rf_sender::rf::{DryRunTransmitter, RfTransmitter, Transmitter};
use rf_sender::server::Server;
use rf_sender::{shutdown, SenderError};
use std::process::ExitCode;
use tokio::task::{JoinError, JoinHandle};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Config::new()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> rf_sender::Result<()> {
    config.validate()?;
    config.log_summary();

    // Antes de levantar threads: una señal temprana no debe matar el proceso
    let mut signals = shutdown::ShutdownSignals::install()?;

    let queue = JobQueue::new(config.queue_capacity, config.backpressure());

    let transmitter: Box<dyn Transmitter + Send> = match config.backend {
        Backend::Sysfs => Box::new(RfTransmitter::new(config.sysfs_backend())),
        Backend::DryRun => Box::new(DryRunTransmitter),
    };

    let executor = Executor::new(queue.clone(), transmitter, config.settle()).spawn()?;
    let intake = JobIntake::new(
        queue.clone(),
        config.pin_range(),
        executor.stats(),
        config.retry_after_secs,
    );

    Server::bind(&config, intake)?.spawn()?;

    let mut executor_done = tokio::task::spawn_blocking(move || executor.join());

    tokio::select! {
        _ = signals.recv() => {}
        result = &mut executor_done => {
            // El loop termina únicamente al cerrarse la cola, y nadie la cerró
            let snapshot = flatten(result)?;
            return Err(SenderError::ExecutorCrashed(format!(
                "executor stopped unexpectedly after {} transmissions",
                snapshot.transmitted
            )));
        }
    }

    let discarded = queue.close();
    tracing::info!(discarded, "Queue closed, waiting for in-flight transmission");

    let snapshot = join(executor_done).await?;
    tracing::info!(
        transmitted = snapshot.transmitted,
        failed = snapshot.failed,
        "Shutdown complete"
    );

    Ok(())
}

async fn join(
    handle: JoinHandle<rf_sender::Result<ExecutorSnapshot>>,
) -> rf_sender::Result<ExecutorSnapshot> {
    flatten(handle.await)
}

fn flatten(
    result: Result<rf_sender::Result<ExecutorSnapshot>, JoinError>,
) -> rf_sender::Result<ExecutorSnapshot> {
    result.map_err(|e| SenderError::ExecutorCrashed(e.to_string()))?
}
