//! # Transmission Capability
//! src/rf/transmitter.rs
//!
//! Interfaz que usa el executor para emitir un código. Es el único punto
//! del sistema que toca hardware, así que se inyecta en el executor en vez
//! de ser estado global: en los tests se reemplaza por un fake.

use crate::error::TransmitFault;
use crate::jobs::job::TransmitParams;
use crate::rf::protocol::{encode_frame, Protocol};
use std::time::Duration;

/// Emite un código en un pin
///
/// Es síncrono y bloqueante: puede tardar segundos. Solo se llama desde
/// un thread a la vez (el executor es su dueño).
pub trait Transmitter {
    fn transmit(&mut self, pin: u8, code: u32, params: &TransmitParams) -> Result<(), TransmitFault>;
}

impl<T: Transmitter + ?Sized> Transmitter for Box<T> {
    fn transmit(&mut self, pin: u8, code: u32, params: &TransmitParams) -> Result<(), TransmitFault> {
        (**self).transmit(pin, code, params)
    }
}

/// Transmisor sin hardware: codifica el frame y lo loguea
///
/// Útil en máquinas sin GPIO. Falla igual que el real ante un protocolo
/// desconocido o un código demasiado ancho.
#[derive(Debug, Default)]
pub struct DryRunTransmitter;

impl Transmitter for DryRunTransmitter {
    fn transmit(&mut self, pin: u8, code: u32, params: &TransmitParams) -> Result<(), TransmitFault> {
        let protocol = Protocol::by_id(params.protocol)?;
        let frame = encode_frame(protocol, params.pulse_length_us, code, params.code_length)?;
        let frame_time: Duration = frame.iter().map(|p| p.total()).sum();
        let bits = format!("{:0width$b}", code, width = usize::from(params.code_length));

        tracing::info!(
            pin,
            code,
            bits = %bits,
            repetitions = params.repetitions,
            airtime_ms = (frame_time * params.repetitions).as_millis() as u64,
            "Dry run: would transmit code"
        );

        Ok(())
    }
}
