//! # Executor
//! src/jobs/executor.rs
//!
//! Único worker con acceso al hardware. Corre en su propio thread,
//! saca jobs de la cola de a uno y llama al `Transmitter` hasta que
//! termina. Un fallo de transmisión se loguea y el loop sigue.
//!
//! ```text
//!          dequeue()                 transmit() retorna
//!   Idle ────────────▶ Transmitting ────────────────────▶ Idle
//!    │
//!    └── cola cerrada ──▶ Stopped
//! ```

use crate::error::SenderError;
use crate::jobs::job::{Job, TRANSMIT_PARAMS};
use crate::jobs::queue::JobQueue;
use crate::rf::Transmitter;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Estado del executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ExecutorState {
    /// Bloqueado en `dequeue()`
    Idle = 0,

    /// Dentro de `transmit()`
    Transmitting = 1,

    /// La cola se cerró, el loop terminó
    Stopped = 2,
}

impl ExecutorState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ExecutorState::Transmitting,
            2 => ExecutorState::Stopped,
            _ => ExecutorState::Idle,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutorState::Idle => "idle",
            ExecutorState::Transmitting => "transmitting",
            ExecutorState::Stopped => "stopped",
        }
    }
}

/// Contadores compartidos con `/status`
#[derive(Debug, Default)]
pub struct ExecutorStats {
    state: AtomicU8,
    transmitted: AtomicU64,
    failed: AtomicU64,
}

impl ExecutorStats {
    pub fn state(&self) -> ExecutorState {
        ExecutorState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: ExecutorState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Transmisiones que terminaron bien
    pub fn transmitted(&self) -> u64 {
        self.transmitted.load(Ordering::Relaxed)
    }

    /// Transmisiones que fallaron
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> ExecutorSnapshot {
        ExecutorSnapshot {
            state: self.state(),
            transmitted: self.transmitted(),
            failed: self.failed(),
        }
    }
}

/// Foto de los contadores, serializable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExecutorSnapshot {
    pub state: ExecutorState,
    pub transmitted: u64,
    pub failed: u64,
}

/// Worker que consume la cola
pub struct Executor<T> {
    queue: JobQueue,
    transmitter: T,
    settle: Duration,
    stats: Arc<ExecutorStats>,
}

impl<T: Transmitter + Send + 'static> Executor<T> {
    /// `settle`: pausa después de cada transmisión exitosa, para que el
    /// receptor vuelva a escuchar antes del siguiente código
    pub fn new(queue: JobQueue, transmitter: T, settle: Duration) -> Self {
        Self {
            queue,
            transmitter,
            settle,
            stats: Arc::new(ExecutorStats::default()),
        }
    }

    /// Lanza el loop en un thread dedicado llamado `executor`
    pub fn spawn(self) -> std::io::Result<ExecutorHandle> {
        let stats = Arc::clone(&self.stats);
        let thread = thread::Builder::new()
            .name("executor".to_string())
            .spawn(move || self.run())?;

        Ok(ExecutorHandle { thread, stats })
    }

    /// Loop principal. Retorna cuando la cola se cierra.
    pub fn run(mut self) {
        tracing::info!(settle_ms = self.settle.as_millis() as u64, "Executor started");
        self.stats.set_state(ExecutorState::Idle);

        while let Some(job) = self.queue.dequeue() {
            self.execute(job);
        }

        self.stats.set_state(ExecutorState::Stopped);
        tracing::info!(
            transmitted = self.stats.transmitted(),
            failed = self.stats.failed(),
            "Executor stopped"
        );
    }

    /// Ejecuta un job hasta el final; el job se descarta al salir
    fn execute(&mut self, job: Job) {
        self.stats.set_state(ExecutorState::Transmitting);

        let (pin, code) = (job.pin(), job.code());
        let waited_ms = job.waited().as_millis() as u64;
        tracing::debug!(pin, code, waited_ms, "Sending code");

        let start = Instant::now();
        match self.transmitter.transmit(pin, code, &TRANSMIT_PARAMS) {
            Ok(()) => {
                self.stats.transmitted.fetch_add(1, Ordering::Relaxed);
                tracing::info!(
                    pin,
                    code,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Sent code"
                );
                if !self.settle.is_zero() {
                    thread::sleep(self.settle);
                }
            }
            Err(fault) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(pin, code, error = %fault, "Transmission failed, job dropped");
            }
        }

        self.stats.set_state(ExecutorState::Idle);
    }
}

/// Handle del thread del executor
pub struct ExecutorHandle {
    thread: JoinHandle<()>,
    stats: Arc<ExecutorStats>,
}

impl ExecutorHandle {
    pub fn stats(&self) -> Arc<ExecutorStats> {
        Arc::clone(&self.stats)
    }

    pub fn state(&self) -> ExecutorState {
        self.stats.state()
    }

    /// Espera a que el loop termine (la cola debe estar cerrada)
    ///
    /// Si el thread murió por un panic retorna `ExecutorCrashed`.
    pub fn join(self) -> Result<ExecutorSnapshot, SenderError> {
        self.thread.join().map_err(|panic| {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            SenderError::ExecutorCrashed(message)
        })?;

        Ok(self.stats.snapshot())
    }
}
