//! # RF Sender
//! src/lib.rs
//!
//! Servicio HTTP que recibe pedidos de transmitir un código RF por un pin
//! GPIO y los ejecuta de a uno, en orden de llegada, sin que los clientes
//! esperen al hardware.
//!
//! ## Arquitectura
//!
//! ```text
//! POST /send → server → router → jobs::handlers ─┐
//!                                                 ▼
//!                                           jobs::JobQueue
//!                                                 │
//!                              jobs::Executor ◀───┘ → rf::Transmitter → GPIO
//! ```
//!
//! - `http`: parsing y construcción de mensajes HTTP/1.0
//! - `server`: accept loop, un thread por conexión
//! - `router`: enrutamiento de peticiones a handlers
//! - `jobs`: validación, cola acotada y executor
//! - `rf`: codificación de frames y acceso a GPIO
//! - `metrics`: métricas de requests
//! - `config`: argumentos CLI y variables de entorno
//! - `shutdown`: espera de señales para el apagado ordenado
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use rf_sender::config::{Backend, Config};
//! use rf_sender::jobs::{Executor, JobIntake, JobQueue};
//! use rf_sender::rf::DryRunTransmitter;
//! use rf_sender::server::Server;
//!
//! let config = Config { backend: Backend::DryRun, ..Config::default() };
//! let queue = JobQueue::new(config.queue_capacity, config.backpressure());
//! let executor = Executor::new(queue.clone(), DryRunTransmitter, config.settle())
//!     .spawn()
//!     .unwrap();
//!
//! let intake = JobIntake::new(queue, config.pin_range(), executor.stats(), config.retry_after_secs);
//! Server::bind(&config, intake).unwrap().run().unwrap();
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod jobs;
pub mod metrics;
pub mod rf;
pub mod router;
pub mod server;
pub mod shutdown;

pub use error::{Result, SenderError};
