//! Parameter store against the EEPROM image: healing, corruption and
//! wear behaviour across simulated reboots.

use laminator::adapters::eeprom::{ERASED, EepromImage};
use laminator::app::ports::{ConfigError, StorageError};
use laminator::config::{CalibrationParams, CalibrationPoint, OperatingParams};
use laminator::storage::{DefaultsUsed, IMAGE_SIZE, ParamStore, block_crc};

use super::mock_hw::{CountingEeprom, DeadEeprom};

fn custom_operating() -> OperatingParams {
    OperatingParams {
        setpoint_c: 140,
        roll_cycles: 3,
        sound_enabled: false,
        power_off_timeout_min: 15,
    }
}

fn custom_calibration() -> CalibrationParams {
    CalibrationParams {
        low: CalibrationPoint { celsius: 20, raw: 150 },
        high: CalibrationPoint { celsius: 180, raw: 520 },
    }
}

/// A store holding the custom blocks, as left by a previous session.
fn provisioned() -> ParamStore<EepromImage> {
    let mut store = ParamStore::new(EepromImage::erased());
    store.save_operating(&custom_operating()).unwrap();
    store.save_calibration(&custom_calibration()).unwrap();
    store
}

/// Power-cycle: keep only the device contents.
fn reboot(store: ParamStore<EepromImage>) -> ParamStore<EepromImage> {
    ParamStore::new(EepromImage::from_bytes(*store.storage().bytes()))
}

#[test]
fn saved_blocks_survive_reboot() {
    let mut store = reboot(provisioned());
    let loaded = store.load().unwrap();
    assert_eq!(loaded.defaults_used, DefaultsUsed::NONE);
    assert_eq!(loaded.operating, custom_operating());
    assert_eq!(loaded.calibration, custom_calibration());
}

#[test]
fn blank_device_is_healed_with_defaults() {
    let mut store = ParamStore::new(EepromImage::erased());
    let first = store.load().unwrap();
    assert!(first.defaults_used.contains(DefaultsUsed::OPERATING));
    assert!(first.defaults_used.contains(DefaultsUsed::CALIBRATION));
    assert_eq!(first.operating, OperatingParams::default());
    assert_eq!(first.calibration, CalibrationParams::default());

    let mut store = reboot(store);
    let second = store.load().unwrap();
    assert_eq!(second.defaults_used, DefaultsUsed::NONE, "defaults were written back");
}

#[test]
fn corrupt_operating_block_leaves_calibration_intact() {
    let mut store = provisioned();
    store.storage_mut().bytes_mut()[1] ^= 0x40;

    let loaded = store.load().unwrap();
    assert!(loaded.defaults_used.contains(DefaultsUsed::OPERATING));
    assert!(!loaded.defaults_used.contains(DefaultsUsed::CALIBRATION));
    assert_eq!(loaded.operating, OperatingParams::default());
    assert_eq!(loaded.calibration, custom_calibration());

    let mut store = reboot(store);
    assert_eq!(store.load().unwrap().defaults_used, DefaultsUsed::NONE);
}

#[test]
fn corrupt_crc_byte_discards_its_block() {
    let mut store = provisioned();
    store.storage_mut().bytes_mut()[32] ^= 0xFF;

    let loaded = store.load().unwrap();
    assert!(!loaded.defaults_used.contains(DefaultsUsed::OPERATING));
    assert!(loaded.defaults_used.contains(DefaultsUsed::CALIBRATION));
    assert_eq!(loaded.calibration, CalibrationParams::default());
}

#[test]
fn crc_valid_but_out_of_range_block_is_discarded() {
    // A record written by a build with wider limits.
    let mut store = provisioned();
    let bytes = store.storage_mut().bytes_mut();
    bytes[..8].fill(0);
    bytes[0] = 250; // setpoint, above the maximum
    bytes[1] = 1;
    bytes[2] = 5;
    bytes[3] = 1;
    bytes[4] = 10;
    let crc = block_crc(&bytes[..8]);
    bytes[8] = crc;

    let loaded = store.load().unwrap();
    assert!(loaded.defaults_used.contains(DefaultsUsed::OPERATING));
    assert_eq!(loaded.operating, OperatingParams::default());
}

#[test]
fn unreadable_device_reports_storage_error() {
    let mut store = ParamStore::new(DeadEeprom);
    assert_eq!(
        store.load(),
        Err(ConfigError::Storage(StorageError::IoError))
    );
    assert_eq!(
        store.save_operating(&OperatingParams::default()),
        Err(ConfigError::Storage(StorageError::IoError))
    );
}

#[test]
fn invalid_params_are_refused_before_any_write() {
    let mut store = ParamStore::new(CountingEeprom::default());
    let bad = CalibrationParams {
        low: CalibrationPoint { celsius: 100, raw: 300 },
        high: CalibrationPoint { celsius: 50, raw: 400 },
    };
    assert!(matches!(
        store.save_calibration(&bad),
        Err(ConfigError::ValidationFailed(_))
    ));
    assert_eq!(store.storage().bytes_written, 0);
    assert!(store.storage().image.bytes().iter().all(|&b| b == ERASED));
}

#[test]
fn unchanged_save_writes_nothing() {
    let mut store = ParamStore::new(CountingEeprom::default());
    store.save_operating(&custom_operating()).unwrap();
    let first = store.storage().bytes_written;
    assert!(first > 0);

    store.save_operating(&custom_operating()).unwrap();
    assert_eq!(store.storage().bytes_written, first);

    let changed = OperatingParams {
        sound_enabled: true,
        ..custom_operating()
    };
    store.save_operating(&changed).unwrap();
    // One payload byte plus the CRC.
    assert_eq!(store.storage().bytes_written, first + 2);
}

#[test]
fn image_covers_both_blocks() {
    let store = provisioned();
    let bytes = store.storage().bytes();
    assert_eq!(bytes.len(), IMAGE_SIZE);
    // Bytes past the calibration CRC are never touched.
    assert!(bytes[33..].iter().all(|&b| b == ERASED));
}
