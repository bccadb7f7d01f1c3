//! # Transmisión RF
//!
//! El Transmission Capability: todo lo que toca el pin.
//!
//! - `transmitter`: trait `Transmitter` y el transmisor dry-run
//! - `protocol`: tabla de protocolos y codificación de frames
//! - `device`: bit-banging de frames sobre un `OutputPin`
//! - `sysfs`: pines GPIO vía `/sys/class/gpio`

pub mod device;
pub mod protocol;
pub mod sysfs;
pub mod transmitter;

pub use device::{OutputPin, PinBackend, RfTransmitter};
pub use sysfs::SysfsBackend;
pub use transmitter::{DryRunTransmitter, Transmitter};
