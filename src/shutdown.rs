//! # Apagado Ordenado
//! src/shutdown.rs
//!
//! Escucha SIGINT y SIGTERM. Los handlers se instalan antes de levantar el
//! executor y el servidor, así una señal que llega durante el arranque no
//! mata el proceso con la acción por defecto. Quien recibe la señal cierra
//! la cola: el job en vuelo termina y los que quedaban encolados se
//! descartan.

use tokio::signal::unix::{signal, Signal, SignalKind};

/// Streams de SIGTERM y SIGINT ya registrados
pub struct ShutdownSignals {
    sigterm: Signal,
    sigint: Signal,
}

impl ShutdownSignals {
    /// Registra ambos handlers. Requiere un runtime de tokio activo.
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {
            sigterm: signal(SignalKind::terminate())?,
            sigint: signal(SignalKind::interrupt())?,
        })
    }

    /// Espera la primera señal de apagado y retorna su nombre
    pub async fn recv(&mut self) -> &'static str {
        let name = tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        };

        tracing::info!(signal = name, "Received signal, initiating graceful shutdown");
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use std::time::Duration;

    #[tokio::test]
    async fn test_signal_after_install_is_delivered() {
        let mut signals = ShutdownSignals::install().unwrap();

        let status = Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        let name = tokio::time::timeout(Duration::from_secs(5), signals.recv())
            .await
            .unwrap();
        assert_eq!(name, "SIGTERM");
    }
}
