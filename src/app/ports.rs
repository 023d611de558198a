//! Port traits: the hexagonal boundary between control logic and hardware.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (temperature front-end, buttons, actuators, EEPROM, event
//! sinks) implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the control core never touches registers.

use crate::control::context::{ButtonEdges, Direction, LedSet};
use crate::sensors::TemperatureSnapshot;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: ADC front-end → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the oversampling ADC collaborator.
pub trait SensorPort {
    /// Latest filtered reading, its Celsius conversion and sensor status.
    fn read_temperature(&mut self) -> TemperatureSnapshot;
}

// ───────────────────────────────────────────────────────────────
// Button port (driven adapter: debouncer → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the button debouncer.  Called once per coarse cycle;
/// edge sets are consumed by the call.
pub trait ButtonPort {
    fn poll(&mut self) -> ButtonEdges;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.  The tone
/// output is not here; it belongs to the tick handler.
pub trait ActuatorPort {
    /// Drive the roller motor.
    fn set_motor(&mut self, direction: Direction);

    /// Set heater duty (0–100).
    fn set_heater_duty(&mut self, duty: u8);

    /// Mirror the indicator LEDs.
    fn set_leds(&mut self, leds: LedSet);

    /// Heater off, motor stopped, LEDs dark.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ EEPROM)
// ───────────────────────────────────────────────────────────────

/// Byte-addressed non-volatile memory.
///
/// Writes are byte-granular: a power cut mid-write may leave a block half
/// updated, which the CRC byte stored after each block detects.
pub trait StoragePort {
    /// Fill `buf` from `addr`.
    fn read(&self, addr: usize, buf: &mut [u8]) -> Result<(), StorageError>;

    /// Write `data` starting at `addr`.
    fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from parameter load/save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field failed range validation.  The `&'static str` names it.
    ValidationFailed(&'static str),
    /// The storage backend failed.
    Storage(StorageError),
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Access beyond the end of the device.
    OutOfRange,
    /// Generic I/O error.
    IoError,
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::Storage(e) => write!(f, "storage: {}", e),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfRange => write!(f, "address out of range"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
