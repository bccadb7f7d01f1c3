//! # Estructura de Job
//! src/jobs/job.rs
//!
//! Un job es una petición de transmitir un código en un pin GPIO.
//! Es inmutable: se valida una sola vez al entrar por `/send` y de ahí
//! en adelante solo se mueve (cola → executor → drop).

use crate::error::ValidationError;
use serde_json::{Map, Value};
use std::time::{Duration, Instant};

/// Nombre del campo JSON con el pin
pub const PIN_FIELD: &str = "gpioPin";

/// Nombre del campo JSON con el código
pub const CODE_FIELD: &str = "code";

/// Parámetros fijos de cada transmisión
///
/// No forman parte del job: aplican igual a todas las transmisiones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmitParams {
    /// Veces que se repite el frame completo
    pub repetitions: u32,

    /// Protocolo RF (índice en la tabla de `rf::protocol`)
    pub protocol: u8,

    /// Largo de pulso en microsegundos
    pub pulse_length_us: u32,

    /// Bits del código
    pub code_length: u8,
}

/// Parámetros con los que se transmite cada job.
/// Deben coincidir con los receptores ya instalados.
pub const TRANSMIT_PARAMS: TransmitParams = TransmitParams {
    repetitions: 50,
    protocol: 1,
    pulse_length_us: 216,
    code_length: 24,
};

/// Mayor código representable con `TRANSMIT_PARAMS.code_length` bits
pub const MAX_CODE: u32 = (1 << TRANSMIT_PARAMS.code_length) - 1;

/// Rango de pines GPIO aceptados (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinRange {
    pub min: u8,
    pub max: u8,
}

impl PinRange {
    pub fn contains(&self, pin: u8) -> bool {
        (self.min..=self.max).contains(&pin)
    }
}

impl Default for PinRange {
    /// Pines BCM utilizables del header de una Raspberry Pi
    fn default() -> Self {
        Self { min: 2, max: 27 }
    }
}

/// Un job validado, listo para encolar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pin: u8,
    code: u32,
    received_at: Instant,
}

impl Job {
    /// Crea un job verificando rangos
    pub fn new(pin: u8, code: u32, pins: &PinRange) -> Result<Self, ValidationError> {
        if !pins.contains(pin) {
            return Err(ValidationError::OutOfRange {
                field: PIN_FIELD,
                value: pin.into(),
                min: pins.min.into(),
                max: pins.max.into(),
            });
        }
        if code > MAX_CODE {
            return Err(ValidationError::OutOfRange {
                field: CODE_FIELD,
                value: code.into(),
                min: 0,
                max: MAX_CODE.into(),
            });
        }

        Ok(Self {
            pin,
            code,
            received_at: Instant::now(),
        })
    }

    /// Parsea y valida el body de `/send`
    ///
    /// # Ejemplo
    /// ```
    /// use rf_sender::jobs::{Job, PinRange};
    ///
    /// let job = Job::from_json(br#"{"gpioPin": 10, "code": 12345678}"#, &PinRange::default()).unwrap();
    /// assert_eq!(job.pin(), 10);
    /// assert_eq!(job.code(), 12345678);
    /// ```
    pub fn from_json(body: &[u8], pins: &PinRange) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ValidationError::InvalidJson(e.to_string()))?;

        let object = value.as_object().ok_or(ValidationError::NotAnObject)?;

        let pin = integer_field(object, PIN_FIELD)?;
        let code = integer_field(object, CODE_FIELD)?;

        let pin = u8::try_from(pin).map_err(|_| ValidationError::OutOfRange {
            field: PIN_FIELD,
            value: pin,
            min: pins.min.into(),
            max: pins.max.into(),
        })?;
        let code = u32::try_from(code).map_err(|_| ValidationError::OutOfRange {
            field: CODE_FIELD,
            value: code,
            min: 0,
            max: MAX_CODE.into(),
        })?;

        Self::new(pin, code, pins)
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    /// Tiempo desde que el job fue aceptado
    pub fn waited(&self) -> Duration {
        self.received_at.elapsed()
    }
}

/// Extrae un campo entero
///
/// Igual que el tipo `integer` de JSON Schema, `10.0` cuenta como entero.
fn integer_field(object: &Map<String, Value>, field: &'static str) -> Result<i128, ValidationError> {
    let number = match object.get(field) {
        None => return Err(ValidationError::MissingField(field)),
        Some(Value::Number(n)) => n,
        Some(_) => return Err(ValidationError::NotAnInteger(field)),
    };

    if let Some(i) = number.as_i64() {
        return Ok(i.into());
    }
    if let Some(u) = number.as_u64() {
        return Ok(u.into());
    }

    match number.as_f64() {
        // Fuera de ±2^53 un f64 ya no es un entero exacto
        Some(f) if f.fract() == 0.0 && f.abs() <= 9_007_199_254_740_992.0 => Ok(f as i128),
        _ => Err(ValidationError::NotAnInteger(field)),
    }
}
