//! GPIO / peripheral pin assignments for the laminator controller board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Roller motor (H-bridge inputs)
// ---------------------------------------------------------------------------

pub const MOTOR_IN1_GPIO: i32 = 1;
pub const MOTOR_IN2_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Heater (zero-cross SSR)
// ---------------------------------------------------------------------------

pub const HEATER_SSR_GPIO: i32 = 3;
/// Slow PWM so the SSR switches whole mains half-waves.
pub const HEATER_PWM_FREQ_HZ: u32 = 10;

// ---------------------------------------------------------------------------
// Buzzer
// ---------------------------------------------------------------------------

pub const BUZZER_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Indicator LEDs
// ---------------------------------------------------------------------------

pub const LED_HEATER_GPIO: i32 = 5;
pub const LED_FORWARD_GPIO: i32 = 6;
pub const LED_REVERSE_GPIO: i32 = 7;

// ---------------------------------------------------------------------------
// Front-panel buttons (active-low with pull-ups)
// ---------------------------------------------------------------------------

pub const BUTTON_FORWARD_GPIO: i32 = 10;
pub const BUTTON_REVERSE_GPIO: i32 = 11;
pub const BUTTON_CYCLE_GPIO: i32 = 12;
pub const BUTTON_MENU_GPIO: i32 = 13;
pub const BUTTON_HEAT_GPIO: i32 = 14;

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// Thermistor divider, ADC1 channel 8.
pub const TEMP_ADC_GPIO: i32 = 9;
/// Mains-present detector.  LOW = mains lost.
pub const MAINS_SENSE_GPIO: i32 = 15;

/// Every pin the firmware drives.  Released to high-impedance on power loss.
pub const OUTPUT_PINS: [i32; 7] = [
    MOTOR_IN1_GPIO,
    MOTOR_IN2_GPIO,
    HEATER_SSR_GPIO,
    BUZZER_GPIO,
    LED_HEATER_GPIO,
    LED_FORWARD_GPIO,
    LED_REVERSE_GPIO,
];

/// Every pin read as a plain input.
pub const INPUT_PINS: [i32; 6] = [
    BUTTON_FORWARD_GPIO,
    BUTTON_REVERSE_GPIO,
    BUTTON_CYCLE_GPIO,
    BUTTON_MENU_GPIO,
    BUTTON_HEAT_GPIO,
    MAINS_SENSE_GPIO,
];
