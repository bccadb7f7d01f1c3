//! # Transmisor RF sobre GPIO
//! src/rf/device.rs
//!
//! Reproduce un frame codificado en un pin de salida, bit-banging:
//! sube el pin, espera, lo baja, espera. Los pines se abren la primera vez
//! que se usan y quedan abiertos mientras viva el transmisor.

use crate::error::TransmitFault;
use crate::jobs::job::TransmitParams;
use crate::rf::protocol::{encode_frame, Protocol, Pulse};
use crate::rf::transmitter::Transmitter;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::thread;
use std::time::Duration;

/// Un pin GPIO configurado como salida
pub trait OutputPin {
    fn set_high(&mut self) -> Result<(), TransmitFault>;
    fn set_low(&mut self) -> Result<(), TransmitFault>;
}

/// Fuente de pines de salida (sysfs, fake en tests, ...)
pub trait PinBackend {
    type Pin: OutputPin;

    /// Abre `pin` como salida
    fn open(&mut self, pin: u8) -> Result<Self::Pin, TransmitFault>;
}

/// Transmisor que emite frames RF por un `PinBackend`
pub struct RfTransmitter<B: PinBackend> {
    backend: B,
    pins: HashMap<u8, B::Pin>,
    delay: fn(Duration),
}

impl<B: PinBackend> RfTransmitter<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            pins: HashMap::new(),
            delay: thread::sleep,
        }
    }

    /// Reemplaza la función de espera entre flancos
    pub fn with_delay(mut self, delay: fn(Duration)) -> Self {
        self.delay = delay;
        self
    }

    fn pin(&mut self, pin: u8) -> Result<&mut B::Pin, TransmitFault> {
        match self.pins.entry(pin) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let opened = self.backend.open(pin)?;
                tracing::info!(pin, "GPIO enabled for TX");
                Ok(entry.insert(opened))
            }
        }
    }
}

impl<B: PinBackend> Transmitter for RfTransmitter<B> {
    fn transmit(&mut self, pin: u8, code: u32, params: &TransmitParams) -> Result<(), TransmitFault> {
        let protocol = Protocol::by_id(params.protocol)?;
        let frame = encode_frame(protocol, params.pulse_length_us, code, params.code_length)?;
        let delay = self.delay;
        let output = self.pin(pin)?;

        for _ in 0..params.repetitions {
            play(output, &frame, delay)?;
        }

        Ok(())
    }
}

fn play<P: OutputPin>(output: &mut P, frame: &[Pulse], delay: fn(Duration)) -> Result<(), TransmitFault> {
    for pulse in frame {
        output.set_high()?;
        delay(pulse.high);
        output.set_low()?;
        delay(pulse.low);
    }
    Ok(())
}
