//! Fuzz target: parameter store boot path
//!
//! Loads an arbitrary EEPROM image and verifies:
//! - No panics under arbitrary byte inputs
//! - Loaded parameters always pass validation
//! - The healed image loads again without falling back to defaults
//!
//! cargo fuzz run fuzz_param_store

#![no_main]

use laminator::adapters::eeprom::EepromImage;
use laminator::storage::{DefaultsUsed, IMAGE_SIZE, ParamStore};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut image = [0xFFu8; IMAGE_SIZE];
    let n = data.len().min(IMAGE_SIZE);
    image[..n].copy_from_slice(&data[..n]);

    let mut store = ParamStore::new(EepromImage::from_bytes(image));
    let loaded = store.load().expect("in-memory image never fails");
    assert!(loaded.operating.validate().is_ok());
    assert!(loaded.calibration.validate().is_ok());

    let mut healed = ParamStore::new(EepromImage::from_bytes(*store.storage().bytes()));
    let again = healed.load().expect("in-memory image never fails");
    assert_eq!(again.defaults_used, DefaultsUsed::NONE);
    assert_eq!(again.operating, loaded.operating);
    assert_eq!(again.calibration, loaded.calibration);
});
