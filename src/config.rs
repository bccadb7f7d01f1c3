//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servicio con argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./rf_sender --port 58080 \
//!   --queue-capacity 64 \
//!   --on-full reject \
//!   --backend dry-run
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! RF_SENDER_PORT=58080 RF_SENDER_BACKEND=sysfs ./rf_sender
//! ```

use crate::error::SenderError;
use crate::jobs::{Backpressure, PinRange};
use crate::rf::sysfs::{SysfsBackend, DEFAULT_GPIO_ROOT};
use clap::{Parser, ValueEnum};
use std::time::Duration;

/// Qué hacer cuando la cola está llena
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnFull {
    /// Esperar espacio (con `--enqueue-timeout-ms`)
    Block,
    /// Responder 503 de inmediato
    Reject,
}

/// Backend de transmisión
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// GPIO real vía `/sys/class/gpio`
    Sysfs,
    /// Solo loguea el frame, no toca hardware
    DryRun,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Sysfs => "sysfs",
            Backend::DryRun => "dry-run",
        }
    }
}

/// Configuración del servicio
#[derive(Debug, Clone, Parser)]
#[command(name = "rf_sender")]
#[command(about = "Servicio HTTP que encola códigos RF y los transmite uno a la vez")]
#[command(version)]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "58080", env = "RF_SENDER_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "RF_SENDER_HOST")]
    pub host: String,

    // === Cola ===
    /// Capacidad máxima de la cola de jobs
    #[arg(long = "queue-capacity", default_value = "64", env = "RF_SENDER_QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    /// Política cuando la cola está llena
    #[arg(long = "on-full", value_enum, default_value = "block", env = "RF_SENDER_ON_FULL")]
    pub on_full: OnFull,

    /// Espera máxima para encolar con `block` (0 = sin límite)
    #[arg(long = "enqueue-timeout-ms", default_value = "5000", env = "RF_SENDER_ENQUEUE_TIMEOUT_MS")]
    pub enqueue_timeout_ms: u64,

    /// Valor de `Retry-After` en los 503 por cola llena
    #[arg(long = "retry-after-secs", default_value = "5", env = "RF_SENDER_RETRY_AFTER_SECS")]
    pub retry_after_secs: u64,

    // === Validación ===
    /// Pin GPIO más bajo aceptado
    #[arg(long = "pin-min", default_value = "2", env = "RF_SENDER_PIN_MIN")]
    pub pin_min: u8,

    /// Pin GPIO más alto aceptado
    #[arg(long = "pin-max", default_value = "27", env = "RF_SENDER_PIN_MAX")]
    pub pin_max: u8,

    // === Transmisión ===
    /// Pausa después de cada transmisión exitosa, en milisegundos
    #[arg(long = "settle-ms", default_value = "500", env = "RF_SENDER_SETTLE_MS")]
    pub settle_ms: u64,

    /// Backend de transmisión
    #[arg(long, value_enum, default_value = "sysfs", env = "RF_SENDER_BACKEND")]
    pub backend: Backend,

    /// Raíz del árbol GPIO de sysfs
    #[arg(long = "gpio-root", default_value = DEFAULT_GPIO_ROOT, env = "RF_SENDER_GPIO_ROOT")]
    pub gpio_root: String,

    /// Base del chip GPIO en sysfs; el número exportado es `base + pin`
    #[arg(long = "gpio-base", default_value = "0", env = "RF_SENDER_GPIO_BASE")]
    pub gpio_base: u32,
}

impl Config {
    /// Parsea argumentos CLI y variables de entorno
    pub fn new() -> Self {
        Config::parse()
    }

    /// Dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```
    /// use rf_sender::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:58080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn backpressure(&self) -> Backpressure {
        match self.on_full {
            OnFull::Reject => Backpressure::Reject,
            OnFull::Block => Backpressure::Block {
                timeout: (self.enqueue_timeout_ms > 0)
                    .then(|| Duration::from_millis(self.enqueue_timeout_ms)),
            },
        }
    }

    pub fn pin_range(&self) -> PinRange {
        PinRange {
            min: self.pin_min,
            max: self.pin_max,
        }
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn sysfs_backend(&self) -> SysfsBackend {
        SysfsBackend::new(&self.gpio_root).with_base(self.gpio_base)
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), SenderError> {
        if self.queue_capacity == 0 {
            return Err(SenderError::Config("Queue capacity must be >= 1".to_string()));
        }
        if self.pin_min > self.pin_max {
            return Err(SenderError::Config(format!(
                "Pin range is empty: pin-min {} > pin-max {}",
                self.pin_min, self.pin_max
            )));
        }
        if self.backend == Backend::Sysfs && self.gpio_root.trim().is_empty() {
            return Err(SenderError::Config("GPIO root must not be empty".to_string()));
        }

        Ok(())
    }

    /// Loguea un resumen de la configuración
    pub fn log_summary(&self) {
        tracing::info!(
            address = %self.address(),
            queue_capacity = self.queue_capacity,
            policy = self.backpressure().as_str(),
            enqueue_timeout_ms = self.enqueue_timeout_ms,
            retry_after_secs = self.retry_after_secs,
            "Server configuration"
        );
        tracing::info!(
            backend = self.backend.as_str(),
            gpio_root = %self.gpio_root,
            gpio_base = self.gpio_base,
            pins = %format!("{}..={}", self.pin_min, self.pin_max),
            settle_ms = self.settle_ms,
            "Transmitter configuration"
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 58080,
            host: "127.0.0.1".to_string(),
            queue_capacity: 64,
            on_full: OnFull::Block,
            enqueue_timeout_ms: 5_000,
            retry_after_secs: 5,
            pin_min: 2,
            pin_max: 27,
            settle_ms: 500,
            backend: Backend::Sysfs,
            gpio_root: DEFAULT_GPIO_ROOT.to_string(),
            gpio_base: 0,
        }
    }
}
