//! # Sistema de Jobs
//!
//! El núcleo del servicio: los requests se validan y encolan sin esperar
//! al hardware, y un único executor los transmite en orden.
//!
//! ```text
//! POST /send → Job::from_json → JobQueue::enqueue ┄┄▶ Executor → Transmitter
//! ```

pub mod executor;
pub mod handlers;
pub mod job;
pub mod queue;

pub use executor::{Executor, ExecutorHandle, ExecutorSnapshot, ExecutorState, ExecutorStats};
pub use handlers::JobIntake;
pub use job::{Job, PinRange, TransmitParams, TRANSMIT_PARAMS};
pub use queue::{Backpressure, JobQueue, QueueStats};
