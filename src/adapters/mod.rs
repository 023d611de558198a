//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements    | Connects to                         |
//! |------------|---------------|-------------------------------------|
//! | `eeprom`   | StoragePort   | NVS blob / in-memory image          |
//! | `hardware` | SensorPort    | Thermistor ADC                      |
//! |            | ButtonPort    | Front-panel GPIO inputs             |
//! |            | ActuatorPort  | H-bridge, heater SSR PWM, LED GPIO  |
//! | `log_sink` | EventSink     | Serial log output                   |

pub mod eeprom;
pub mod hardware;
pub mod log_sink;
