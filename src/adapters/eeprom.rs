//! EEPROM image adapter.
//!
//! Implements [`StoragePort`] over a 64-byte RAM shadow of the parameter
//! EEPROM.  Reads are served from the shadow.
//!
//! - On ESP32 the image is persisted as one blob in the `laminator` NVS
//!   namespace; every write commits the whole shadow (NVS commits are
//!   atomic, the CRC bytes still catch a write that never happened).
//! - On host the shadow is the device, which makes it the test double for
//!   [`ParamStore`](crate::storage::ParamStore).

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{StorageError, StoragePort};
use crate::storage::IMAGE_SIZE;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Value of a never-written cell.
pub const ERASED: u8 = 0xFF;

#[cfg(target_os = "espidf")]
const NAMESPACE: &core::ffi::CStr = c"laminator";
#[cfg(target_os = "espidf")]
const IMAGE_KEY: &core::ffi::CStr = c"eeprom";

pub struct EepromImage {
    bytes: [u8; IMAGE_SIZE],
}

impl Default for EepromImage {
    fn default() -> Self {
        Self::erased()
    }
}

impl EepromImage {
    /// A blank device.
    pub fn erased() -> Self {
        Self {
            bytes: [ERASED; IMAGE_SIZE],
        }
    }

    /// A device with the given contents.
    pub fn from_bytes(bytes: [u8; IMAGE_SIZE]) -> Self {
        Self { bytes }
    }

    /// Open the persisted image.
    ///
    /// On first boot, or after an NVS version change, the partition is
    /// erased and the image starts blank; the parameter store then heals
    /// it with defaults.
    #[cfg(target_os = "espidf")]
    pub fn open() -> Result<Self, StorageError> {
        // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
        // single main-task context before any concurrent NVS access.
        let ret = unsafe { nvs_flash_init() };
        if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
            warn!("eeprom: erasing and re-initialising NVS partition");
            if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK {
                return Err(StorageError::IoError);
            }
        } else if ret != ESP_OK {
            return Err(StorageError::IoError);
        }

        let mut image = Self::erased();
        let result = with_nvs_handle(false, |handle| {
            let mut size = IMAGE_SIZE;
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    IMAGE_KEY.as_ptr(),
                    image.bytes.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(size)
        });
        match result {
            Ok(size) => info!("eeprom: loaded {} byte image from NVS", size),
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => info!("eeprom: no stored image, blank device"),
            Err(e) => {
                warn!("eeprom: NVS read error {}, blank device", e);
                image = Self::erased();
            }
        }
        Ok(image)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn open() -> Result<Self, StorageError> {
        info!("eeprom: simulation backend");
        Ok(Self::erased())
    }

    pub fn bytes(&self) -> &[u8; IMAGE_SIZE] {
        &self.bytes
    }

    /// Direct access for fault injection.
    pub fn bytes_mut(&mut self) -> &mut [u8; IMAGE_SIZE] {
        &mut self.bytes
    }

    fn range(addr: usize, len: usize) -> Result<core::ops::Range<usize>, StorageError> {
        let end = addr.checked_add(len).ok_or(StorageError::OutOfRange)?;
        if end > IMAGE_SIZE {
            return Err(StorageError::OutOfRange);
        }
        Ok(addr..end)
    }

    #[cfg(target_os = "espidf")]
    fn commit(&self) -> Result<(), StorageError> {
        with_nvs_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    IMAGE_KEY.as_ptr(),
                    self.bytes.as_ptr() as *const _,
                    IMAGE_SIZE,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        })
        .map_err(|e| {
            warn!("eeprom: NVS write error {}", e);
            StorageError::IoError
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn commit(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

impl StoragePort for EepromImage {
    fn read(&self, addr: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        let range = Self::range(addr, buf.len())?;
        buf.copy_from_slice(&self.bytes[range]);
        Ok(())
    }

    fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), StorageError> {
        let range = Self::range(addr, data.len())?;
        self.bytes[range].copy_from_slice(data);
        self.commit()
    }
}

/// Open the NVS namespace, execute a closure with the handle, then close.
#[cfg(target_os = "espidf")]
fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
where
    F: FnOnce(nvs_handle_t) -> Result<T, i32>,
{
    let mut handle: nvs_handle_t = 0;
    let mode = if write {
        nvs_open_mode_t_NVS_READWRITE
    } else {
        nvs_open_mode_t_NVS_READONLY
    };
    // SAFETY: NAMESPACE is NUL-terminated; handle is closed below.
    let ret = unsafe { nvs_open(NAMESPACE.as_ptr(), mode, &mut handle) };
    if ret != ESP_OK {
        return Err(ret);
    }
    let result = f(handle);
    unsafe {
        nvs_close(handle);
    }
    result
}
