//! # Backend GPIO por sysfs
//! src/rf/sysfs.rs
//!
//! Usa la interfaz `/sys/class/gpio` del kernel Linux:
//!
//! ```text
//! echo 17  > /sys/class/gpio/export
//! echo out > /sys/class/gpio/gpio17/direction
//! echo 1   > /sys/class/gpio/gpio17/value
//! ```
//!
//! Los jobs traen números BCM. En kernels recientes de Raspberry Pi el
//! chip GPIO arranca en otra base (p. ej. 512), así que el número en sysfs
//! es `base + pin`.

use crate::error::TransmitFault;
use crate::rf::device::{OutputPin, PinBackend};
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;

/// Ruta por defecto de la interfaz sysfs
pub const DEFAULT_GPIO_ROOT: &str = "/sys/class/gpio";

/// Abre pines escribiendo en los archivos de sysfs
#[derive(Debug, Clone)]
pub struct SysfsBackend {
    root: PathBuf,
    /// Primer número de línea del chip (`/sys/class/gpio/gpiochipN/base`)
    base: u32,
}

impl SysfsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            base: 0,
        }
    }

    pub fn with_base(mut self, base: u32) -> Self {
        self.base = base;
        self
    }

    /// Número de sysfs para un pin BCM
    pub fn line(&self, pin: u8) -> u32 {
        self.base.saturating_add(u32::from(pin))
    }
}

impl Default for SysfsBackend {
    fn default() -> Self {
        Self::new(DEFAULT_GPIO_ROOT)
    }
}

fn io_fault(pin: u8, action: &'static str) -> impl FnOnce(std::io::Error) -> TransmitFault {
    move |source| TransmitFault::Io { pin, action, source }
}

impl PinBackend for SysfsBackend {
    type Pin = SysfsPin;

    fn open(&mut self, pin: u8) -> Result<SysfsPin, TransmitFault> {
        let line = self.line(pin);
        let dir = self.root.join(format!("gpio{}", line));

        let exported_here = if dir.exists() {
            false
        } else {
            fs::write(self.root.join("export"), line.to_string()).map_err(io_fault(pin, "export"))?;
            true
        };

        fs::write(dir.join("direction"), "out").map_err(io_fault(pin, "set direction"))?;

        let value = OpenOptions::new()
            .write(true)
            .open(dir.join("value"))
            .map_err(io_fault(pin, "open value"))?;

        Ok(SysfsPin {
            pin,
            line,
            value,
            unexport: exported_here.then(|| self.root.join("unexport")),
        })
    }
}

/// Pin exportado como salida
///
/// Al hacer drop deja el pin en bajo y, si lo exportamos nosotros,
/// lo libera.
#[derive(Debug)]
pub struct SysfsPin {
    pin: u8,
    line: u32,
    value: File,
    unexport: Option<PathBuf>,
}

impl SysfsPin {
    fn write_level(&mut self, level: &[u8]) -> Result<(), TransmitFault> {
        self.value
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.value.write_all(level))
            .map_err(io_fault(self.pin, "write value"))
    }
}

impl OutputPin for SysfsPin {
    fn set_high(&mut self) -> Result<(), TransmitFault> {
        self.write_level(b"1")
    }

    fn set_low(&mut self) -> Result<(), TransmitFault> {
        self.write_level(b"0")
    }
}

impl Drop for SysfsPin {
    fn drop(&mut self) {
        if let Err(e) = self.set_low() {
            tracing::warn!(pin = self.pin, error = %e, "Could not drive GPIO low on cleanup");
        }
        if let Some(unexport) = &self.unexport {
            if let Err(e) = fs::write(unexport, self.line.to_string()) {
                tracing::warn!(pin = self.pin, error = %e, "Could not unexport GPIO");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    /// Simula un pin ya exportado (el kernel crearía el directorio)
    fn fake_exported(root: &Path, pin: u8) -> PathBuf {
        let dir = root.join(format!("gpio{}", pin));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("direction"), "in").unwrap();
        fs::write(dir.join("value"), "0").unwrap();
        dir
    }

    #[test]
    fn test_open_configures_output() {
        let root = tempfile::tempdir().unwrap();
        let dir = fake_exported(root.path(), 17);

        let mut backend = SysfsBackend::new(root.path());
        let mut pin = backend.open(17).unwrap();

        assert_eq!(fs::read_to_string(dir.join("direction")).unwrap(), "out");

        pin.set_high().unwrap();
        assert_eq!(fs::read_to_string(dir.join("value")).unwrap(), "1");
        pin.set_low().unwrap();
        assert_eq!(fs::read_to_string(dir.join("value")).unwrap(), "0");
    }

    #[test]
    fn test_already_exported_pin_is_not_unexported() {
        let root = tempfile::tempdir().unwrap();
        fake_exported(root.path(), 4);

        let mut backend = SysfsBackend::new(root.path());
        drop(backend.open(4).unwrap());

        assert!(!root.path().join("unexport").exists());
    }

    #[test]
    fn test_export_failure_is_a_fault() {
        let root = tempfile::tempdir().unwrap();
        let mut backend = SysfsBackend::new(root.path().join("missing"));

        let err = backend.open(22).unwrap_err();
        assert!(matches!(err, TransmitFault::Io { pin: 22, action: "export", .. }));
    }

    #[test]
    fn test_export_writes_pin_number() {
        let root = tempfile::tempdir().unwrap();
        let mut backend = SysfsBackend::new(root.path());

        // Sin kernel el directorio gpio5 nunca aparece, así que falla al configurar
        let err = backend.open(5).unwrap_err();
        assert!(matches!(err, TransmitFault::Io { action: "set direction", .. }));
        assert_eq!(fs::read_to_string(root.path().join("export")).unwrap(), "5");
    }

    #[test]
    fn test_base_offset_selects_sysfs_line() {
        let root = tempfile::tempdir().unwrap();
        // Con base 512 el BCM 17 es la línea 529
        let dir = root.path().join("gpio529");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("value"), "0").unwrap();

        let mut backend = SysfsBackend::new(root.path()).with_base(512);
        assert_eq!(backend.line(17), 529);

        let mut pin = backend.open(17).unwrap();
        assert_eq!(fs::read_to_string(dir.join("direction")).unwrap(), "out");
        pin.set_high().unwrap();
        assert_eq!(fs::read_to_string(dir.join("value")).unwrap(), "1");
        assert!(!root.path().join("gpio17").exists());
    }

    #[test]
    fn test_export_uses_offset_line() {
        let root = tempfile::tempdir().unwrap();
        let mut backend = SysfsBackend::new(root.path()).with_base(512);

        assert!(backend.open(5).is_err());
        assert_eq!(fs::read_to_string(root.path().join("export")).unwrap(), "517");
    }
}
