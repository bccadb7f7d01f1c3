//! # Errores del Servicio
//! src/error.rs
//!
//! Taxonomía de errores:
//! - `ValidationError`: request malformado, se responde 400 y nunca llega a la cola
//! - `EnqueueError`: backpressure o cola cerrada, se responde 503
//! - `TransmitFault`: fallo de hardware durante una transmisión, solo se loguea
//! - `SenderError`: errores fatales del proceso

use thiserror::Error;

/// Error de validación de un request de `/send`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("body is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("body must be a JSON object")]
    NotAnObject,

    #[error("'{0}' is a required property")]
    MissingField(&'static str),

    #[error("'{0}' must be an integer")]
    NotAnInteger(&'static str),

    #[error("'{field}' is {value}, expected a value between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        value: i128,
        min: i128,
        max: i128,
    },
}

/// Error al encolar un job
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnqueueError {
    #[error("Queue is full (max capacity: {capacity})")]
    Full { capacity: usize },

    #[error("Queue is closed, server is shutting down")]
    Closed,
}

/// Fallo del Transmission Capability
///
/// El executor lo registra y sigue con el siguiente job.
#[derive(Error, Debug)]
pub enum TransmitFault {
    #[error("GPIO {pin}: {action} failed: {source}")]
    Io {
        pin: u8,
        action: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown RF protocol: {0}")]
    UnknownProtocol(u8),

    #[error("Code {code} does not fit in {bits} bits")]
    CodeTooWide { code: u32, bits: u8 },
}

/// Errores fatales del proceso
#[derive(Error, Debug)]
pub enum SenderError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Executor thread crashed: {0}")]
    ExecutorCrashed(String),
}

pub type Result<T> = std::result::Result<T, SenderError>;
