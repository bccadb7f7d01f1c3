//! # Cola FIFO Acotada para Jobs
//! src/jobs/queue.rs
//!
//! Implementa una cola thread-safe con capacidad máxima.
//! Varios productores (un thread por conexión) y un único consumidor
//! (el executor). El orden de salida es el orden en que los productores
//! toman el lock, sin prioridades.

use crate::error::EnqueueError;
use crate::jobs::job::Job;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Qué hacer cuando la cola está llena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backpressure {
    /// El productor espera a que se libere espacio.
    /// Con `timeout` la espera es acotada y luego falla con `Full`.
    Block { timeout: Option<Duration> },

    /// Falla inmediatamente con `Full`
    Reject,
}

impl Backpressure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backpressure::Block { .. } => "block",
            Backpressure::Reject => "reject",
        }
    }
}

impl Default for Backpressure {
    fn default() -> Self {
        Backpressure::Block {
            timeout: Some(Duration::from_secs(5)),
        }
    }
}

/// Estado protegido por el mutex
struct QueueState {
    jobs: VecDeque<Job>,
    closed: bool,
}

/// Partes compartidas entre todos los clones de la cola
struct Shared {
    state: Mutex<QueueState>,

    /// Se notifica cuando entra un job (o se cierra la cola)
    not_empty: Condvar,

    /// Se notifica cuando sale un job (o se cierra la cola)
    not_full: Condvar,
}

/// Cola FIFO acotada
///
/// Clonarla es barato: todos los clones comparten la misma cola.
#[derive(Clone)]
pub struct JobQueue {
    shared: Arc<Shared>,
    capacity: usize,
    backpressure: Backpressure,
}

impl JobQueue {
    /// Crea una nueva cola con capacidad máxima
    pub fn new(capacity: usize, backpressure: Backpressure) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState {
                    jobs: VecDeque::with_capacity(capacity),
                    closed: false,
                }),
                not_empty: Condvar::new(),
                not_full: Condvar::new(),
            }),
            capacity,
            backpressure,
        }
    }

    /// Un panic en un productor no invalida los jobs ya encolados
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encola un job al final de la cola
    ///
    /// Nunca espera a que el job se ejecute. Si la cola está llena
    /// aplica la política de backpressure configurada.
    pub fn enqueue(&self, job: Job) -> Result<(), EnqueueError> {
        let mut state = self.lock();
        let deadline = match self.backpressure {
            Backpressure::Block { timeout: Some(t) } => Some(Instant::now() + t),
            _ => None,
        };

        loop {
            if state.closed {
                return Err(EnqueueError::Closed);
            }
            if state.jobs.len() < self.capacity {
                break;
            }

            match (self.backpressure, deadline) {
                (Backpressure::Reject, _) => {
                    return Err(EnqueueError::Full {
                        capacity: self.capacity,
                    });
                }
                (Backpressure::Block { .. }, None) => {
                    state = self
                        .shared
                        .not_full
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                (Backpressure::Block { .. }, Some(deadline)) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(EnqueueError::Full {
                            capacity: self.capacity,
                        });
                    }
                    state = self
                        .shared
                        .not_full
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
            }
        }

        state.jobs.push_back(job);
        self.shared.not_empty.notify_one();

        Ok(())
    }

    /// Desencola el job más antiguo
    ///
    /// Bloquea hasta que haya un job disponible. Retorna `None` solo
    /// cuando la cola fue cerrada.
    pub fn dequeue(&self) -> Option<Job> {
        let mut state = self.lock();

        loop {
            if state.closed {
                return None;
            }

            if let Some(job) = state.jobs.pop_front() {
                self.shared.not_full.notify_one();
                return Some(job);
            }

            state = self
                .shared
                .not_empty
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Cierra la cola
    ///
    /// Despierta a todos los threads bloqueados: los productores reciben
    /// `Closed` y el consumidor recibe `None`. Los jobs que seguían en la
    /// cola se descartan; retorna cuántos eran.
    pub fn close(&self) -> usize {
        let discarded = {
            let mut state = self.lock();
            state.closed = true;
            let discarded = state.jobs.len();
            state.jobs.clear();
            discarded
        };

        self.shared.not_empty.notify_all();
        self.shared.not_full.notify_all();

        discarded
    }

    /// Retorna el tamaño actual de la cola
    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    /// Verifica si la cola está vacía
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Obtiene estadísticas de la cola
    pub fn stats(&self) -> QueueStats {
        let state = self.lock();

        QueueStats {
            depth: state.jobs.len(),
            capacity: self.capacity,
            closed: state.closed,
            policy: self.backpressure.as_str(),
        }
    }
}

/// Estadísticas de una cola
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub depth: usize,
    pub capacity: usize,
    pub closed: bool,
    pub policy: &'static str,
}
