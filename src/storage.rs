//! CRC-protected parameter blocks in EEPROM.
//!
//! Image layout (byte offsets):
//!
//! ```text
//!   0..8    OperatingParams   (postcard, zero padded)
//!   8       CRC-8 of 0..8
//!   16..32  CalibrationParams (postcard, zero padded)
//!   32      CRC-8 of 16..32
//! ```
//!
//! A block whose CRC does not match, that fails to decode, or that decodes
//! to out-of-range values is replaced by the compiled-in defaults, which are
//! written back together with a fresh CRC.  The caller learns which blocks
//! were replaced through [`DefaultsUsed`]; corruption is never an error.
//!
//! Saves only touch bytes that differ from what is already stored.

use log::{info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::app::ports::{ConfigError, StorageError, StoragePort};
use crate::config::{CalibrationParams, OperatingParams};

/// Dallas/iButton CRC-8 (poly 0x31 reflected, init 0).
const CRC8: crc::Crc<u8> = crc::Crc::<u8>::new(&crc::CRC_8_MAXIM_DOW);

/// Total size of the parameter image.
pub const IMAGE_SIZE: usize = 64;

const MAX_BLOCK_LEN: usize = 16;

/// Which blocks fell back to defaults during [`ParamStore::load`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultsUsed(u8);

impl DefaultsUsed {
    pub const NONE: Self = Self(0);
    pub const OPERATING: Self = Self(1 << 0);
    pub const CALIBRATION: Self = Self(1 << 1);

    pub fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

/// Result of a boot-time load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadedParams {
    pub operating: OperatingParams,
    pub calibration: CalibrationParams,
    pub defaults_used: DefaultsUsed,
}

impl LoadedParams {
    /// Compiled-in defaults for both blocks, used when the storage itself
    /// cannot be read.
    pub fn defaults() -> Self {
        Self {
            operating: OperatingParams::default(),
            calibration: CalibrationParams::default(),
            defaults_used: DefaultsUsed(DefaultsUsed::OPERATING.0 | DefaultsUsed::CALIBRATION.0),
        }
    }
}

/// Per-record placement and validation.
trait Block: Serialize + DeserializeOwned + Default {
    const NAME: &'static str;
    const OFFSET: usize;
    const LEN: usize;
    const CRC_OFFSET: usize;

    fn check(&self) -> Result<(), &'static str>;
}

impl Block for OperatingParams {
    const NAME: &'static str = "operating";
    const OFFSET: usize = 0;
    const LEN: usize = 8;
    const CRC_OFFSET: usize = 8;

    fn check(&self) -> Result<(), &'static str> {
        self.validate()
    }
}

impl Block for CalibrationParams {
    const NAME: &'static str = "calibration";
    const OFFSET: usize = 16;
    const LEN: usize = 16;
    const CRC_OFFSET: usize = 32;

    fn check(&self) -> Result<(), &'static str> {
        self.validate()
    }
}

/// Compute the CRC byte for a raw block.
pub fn block_crc(bytes: &[u8]) -> u8 {
    CRC8.checksum(bytes)
}

/// Parameter persistence over a byte-addressed [`StoragePort`].
pub struct ParamStore<S: StoragePort> {
    storage: S,
}

impl<S: StoragePort> ParamStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Load both blocks, healing any that are corrupt.
    pub fn load(&mut self) -> Result<LoadedParams, ConfigError> {
        let mut defaults_used = DefaultsUsed::NONE;

        let operating = match self.load_block::<OperatingParams>()? {
            Some(p) => p,
            None => {
                defaults_used.insert(DefaultsUsed::OPERATING);
                self.restore_default::<OperatingParams>()?
            }
        };
        let calibration = match self.load_block::<CalibrationParams>()? {
            Some(c) => c,
            None => {
                defaults_used.insert(DefaultsUsed::CALIBRATION);
                self.restore_default::<CalibrationParams>()?
            }
        };

        Ok(LoadedParams {
            operating,
            calibration,
            defaults_used,
        })
    }

    /// Validate and persist the operating block.
    pub fn save_operating(&mut self, params: &OperatingParams) -> Result<(), ConfigError> {
        self.save_block(params)
    }

    /// Validate and persist the calibration block.
    pub fn save_calibration(&mut self, params: &CalibrationParams) -> Result<(), ConfigError> {
        self.save_block(params)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    // ── internals ─────────────────────────────────────────────

    /// `Ok(None)` means the block is untrustworthy.
    fn load_block<T: Block>(&self) -> Result<Option<T>, StorageError> {
        let mut raw = [0u8; MAX_BLOCK_LEN];
        let raw = &mut raw[..T::LEN];
        self.storage.read(T::OFFSET, raw)?;
        let mut stored_crc = [0u8; 1];
        self.storage.read(T::CRC_OFFSET, &mut stored_crc)?;

        if block_crc(raw) != stored_crc[0] {
            warn!("params: {} block CRC mismatch", T::NAME);
            return Ok(None);
        }
        let Ok(value) = postcard::from_bytes::<T>(raw) else {
            warn!("params: {} block undecodable", T::NAME);
            return Ok(None);
        };
        if let Err(msg) = value.check() {
            warn!("params: {} block out of range ({})", T::NAME, msg);
            return Ok(None);
        }
        Ok(Some(value))
    }

    fn restore_default<T: Block>(&mut self) -> Result<T, ConfigError> {
        let value = T::default();
        self.write_block(&value)?;
        info!("params: {} defaults restored", T::NAME);
        Ok(value)
    }

    fn save_block<T: Block>(&mut self, value: &T) -> Result<(), ConfigError> {
        value.check().map_err(ConfigError::ValidationFailed)?;
        self.write_block(value)?;
        Ok(())
    }

    fn write_block<T: Block>(&mut self, value: &T) -> Result<(), ConfigError> {
        let mut raw = [0u8; MAX_BLOCK_LEN];
        let raw = &mut raw[..T::LEN];
        postcard::to_slice(value, raw)
            .map_err(|_| ConfigError::ValidationFailed("record does not fit its block"))?;
        self.update_bytes(T::OFFSET, raw)?;
        self.update_bytes(T::CRC_OFFSET, &[block_crc(raw)])?;
        Ok(())
    }

    /// Write only the bytes that differ from the stored contents.
    fn update_bytes(&mut self, addr: usize, data: &[u8]) -> Result<(), StorageError> {
        let mut current = [0u8; MAX_BLOCK_LEN];
        let current = &mut current[..data.len()];
        self.storage.read(addr, current)?;
        for (i, (&new, &old)) in data.iter().zip(current.iter()).enumerate() {
            if new != old {
                self.storage.write(addr + i, &[new])?;
            }
        }
        Ok(())
    }
}
