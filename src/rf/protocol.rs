//! # Protocolos RF OOK
//! src/rf/protocol.rs
//!
//! Tabla de protocolos estilo rc-switch y codificación de un código
//! a una secuencia de pulsos alto/bajo.
//!
//! ## Formato de un frame
//!
//! ```text
//! bit 1:  ‾‾‾‾‾‾|__        (one_high, one_low)
//! bit 0:  ‾‾|______        (zero_high, zero_low)
//! sync:   ‾‾|______...___  (sync_high, sync_low)
//! ```
//!
//! Cada bit (MSB primero) es un pulso alto seguido de uno bajo, medidos en
//! múltiplos del largo de pulso. Tras los bits va el pulso de sincronización.

use crate::error::TransmitFault;
use std::time::Duration;

/// Tiempos de un protocolo, en múltiplos del largo de pulso
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Protocol {
    /// Largo de pulso por defecto (µs)
    pub pulse_length_us: u32,
    pub sync_high: u32,
    pub sync_low: u32,
    pub zero_high: u32,
    pub zero_low: u32,
    pub one_high: u32,
    pub one_low: u32,
}

const PROTOCOLS: [Protocol; 6] = [
    Protocol { pulse_length_us: 350, sync_high: 1, sync_low: 31, zero_high: 1, zero_low: 3, one_high: 3, one_low: 1 },
    Protocol { pulse_length_us: 650, sync_high: 1, sync_low: 10, zero_high: 1, zero_low: 2, one_high: 2, one_low: 1 },
    Protocol { pulse_length_us: 100, sync_high: 30, sync_low: 71, zero_high: 4, zero_low: 11, one_high: 9, one_low: 6 },
    Protocol { pulse_length_us: 380, sync_high: 1, sync_low: 6, zero_high: 1, zero_low: 3, one_high: 3, one_low: 1 },
    Protocol { pulse_length_us: 500, sync_high: 6, sync_low: 14, zero_high: 1, zero_low: 2, one_high: 2, one_low: 1 },
    Protocol { pulse_length_us: 200, sync_high: 1, sync_low: 10, zero_high: 1, zero_low: 5, one_high: 1, one_low: 1 },
];

impl Protocol {
    /// Busca un protocolo por id (1-based)
    pub fn by_id(id: u8) -> Result<&'static Protocol, TransmitFault> {
        usize::from(id)
            .checked_sub(1)
            .and_then(|idx| PROTOCOLS.get(idx))
            .ok_or(TransmitFault::UnknownProtocol(id))
    }
}

/// Un pulso: nivel alto durante `high`, luego bajo durante `low`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    pub high: Duration,
    pub low: Duration,
}

impl Pulse {
    fn new(high_units: u32, low_units: u32, pulse_length_us: u32) -> Self {
        Self {
            high: Duration::from_micros(u64::from(high_units) * u64::from(pulse_length_us)),
            low: Duration::from_micros(u64::from(low_units) * u64::from(pulse_length_us)),
        }
    }

    pub fn total(&self) -> Duration {
        self.high + self.low
    }
}

/// Codifica un frame: `bits` pulsos de datos más el pulso de sync
pub fn encode_frame(
    protocol: &Protocol,
    pulse_length_us: u32,
    code: u32,
    bits: u8,
) -> Result<Vec<Pulse>, TransmitFault> {
    if bits == 0 || bits > 32 || (bits < 32 && code >> bits != 0) {
        return Err(TransmitFault::CodeTooWide { code, bits });
    }

    let mut frame = Vec::with_capacity(usize::from(bits) + 1);
    for bit in (0..bits).rev() {
        let pulse = if (code >> bit) & 1 == 1 {
            Pulse::new(protocol.one_high, protocol.one_low, pulse_length_us)
        } else {
            Pulse::new(protocol.zero_high, protocol.zero_low, pulse_length_us)
        };
        frame.push(pulse);
    }
    frame.push(Pulse::new(protocol.sync_high, protocol.sync_low, pulse_length_us));

    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_lookup() {
        assert_eq!(Protocol::by_id(1).unwrap().sync_low, 31);
        assert_eq!(Protocol::by_id(6).unwrap().zero_low, 5);
        assert!(matches!(Protocol::by_id(0), Err(TransmitFault::UnknownProtocol(0))));
        assert!(matches!(Protocol::by_id(7), Err(TransmitFault::UnknownProtocol(7))));
    }

    #[test]
    fn test_encode_frame_protocol_1() {
        let proto = Protocol::by_id(1).unwrap();
        let frame = encode_frame(proto, 216, 0b101, 3).unwrap();

        let us = Duration::from_micros;
        assert_eq!(
            frame,
            vec![
                Pulse { high: us(648), low: us(216) },
                Pulse { high: us(216), low: us(648) },
                Pulse { high: us(648), low: us(216) },
                Pulse { high: us(216), low: us(6696) },
            ]
        );
    }

    #[test]
    fn test_encode_frame_pads_leading_zeros() {
        let proto = Protocol::by_id(1).unwrap();
        let frame = encode_frame(proto, 216, 1, 24).unwrap();

        assert_eq!(frame.len(), 25);
        let zero = Pulse::new(1, 3, 216);
        assert!(frame[..23].iter().all(|p| *p == zero));
        assert_eq!(frame[23], Pulse::new(3, 1, 216));
    }

    #[test]
    fn test_every_bit_takes_four_units() {
        let proto = Protocol::by_id(1).unwrap();
        let frame = encode_frame(proto, 216, 12345678, 24).unwrap();

        for pulse in &frame[..24] {
            assert_eq!(pulse.total(), Duration::from_micros(4 * 216));
        }
    }

    #[test]
    fn test_code_too_wide() {
        let proto = Protocol::by_id(1).unwrap();
        assert!(matches!(
            encode_frame(proto, 216, 1 << 24, 24),
            Err(TransmitFault::CodeTooWide { code: 16777216, bits: 24 })
        ));
        assert!(encode_frame(proto, 216, u32::MAX, 32).is_ok());
    }
}
