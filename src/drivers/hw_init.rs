//! One-shot peripheral setup and raw pin helpers for the ESP-IDF target.
//!
//! Configures the buzzer LEDC channel, the indicator LED outputs, the
//! button and mains-sense inputs and the thermistor ADC channel using raw
//! ESP-IDF sys calls.  Motor and heater pins are owned by their
//! embedded-hal drivers and set up in `main`.  On host builds every helper
//! is a no-op.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
    AdcInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc) => write!(f, "LEDC config failed (rc={})", rc),
            Self::AdcInitFailed(rc) => write!(f, "ADC config failed (rc={})", rc),
        }
    }
}

/// LEDC timer and channel reserved for the buzzer.
#[cfg(target_os = "espidf")]
const BUZZER_TIMER: ledc_timer_t = ledc_timer_t_LEDC_TIMER_1;
#[cfg(target_os = "espidf")]
const BUZZER_CHANNEL: ledc_channel_t = ledc_channel_t_LEDC_CHANNEL_2;
/// 50 % of the 8-bit range.
#[cfg(target_os = "espidf")]
const BUZZER_DUTY: u32 = 128;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the tick timer starts.
    unsafe {
        init_led_outputs()?;
        init_inputs()?;
        init_adc()?;
        init_buzzer()?;
    }
    info!("hw_init: buzzer, LEDs, inputs and ADC configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── LED outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_led_outputs() -> Result<(), HwInitError> {
    for pin in [pins::LED_HEATER_GPIO, pins::LED_FORWARD_GPIO, pins::LED_REVERSE_GPIO] {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
        unsafe { gpio_set_level(pin, 0) };
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: writes to a pin configured in init_led_outputs().
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

// ── GPIO inputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_inputs() -> Result<(), HwInitError> {
    let mask = pins::INPUT_PINS
        .iter()
        .fold(0u64, |acc, &pin| acc | (1u64 << pin));
    let cfg = gpio_config_t {
        pin_bit_mask: mask,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: read-only register access on a configured input pin.
    (unsafe { gpio_get_level(pin) }) != 0
}

/// Host builds see every input pulled up: buttons released, mains present.
#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    true
}

// ── ADC (oneshot) ────────────────────────────────────────────

/// Thermistor divider on GPIO9.
#[cfg(target_os = "espidf")]
const TEMP_ADC_CHANNEL: adc_channel_t = adc_channel_t_ADC_CHANNEL_8;

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }
    // 10-bit conversions keep raw readings in the calibration range.
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_10,
    };
    let ret = unsafe { adc_oneshot_config_channel(ADC1_HANDLE, TEMP_ADC_CHANNEL, &chan_cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }
    Ok(())
}

/// One raw thermistor conversion, or `None` if the driver reported an error.
#[cfg(target_os = "espidf")]
pub fn temp_adc_read() -> Option<u16> {
    let mut raw: i32 = 0;
    // SAFETY: ADC1_HANDLE is written once in init_adc() before the main
    // loop starts; only the main loop reads the ADC.
    let ret = unsafe { adc_oneshot_read(ADC1_HANDLE, TEMP_ADC_CHANNEL, &mut raw) };
    (ret == ESP_OK as i32).then(|| raw.max(0) as u16)
}

#[cfg(not(target_os = "espidf"))]
pub fn temp_adc_read() -> Option<u16> {
    None
}

// ── Buzzer ───────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_buzzer() -> Result<(), HwInitError> {
    let timer = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: BUZZER_TIMER,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        freq_hz: 1000,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    let ret = unsafe { ledc_timer_config(&timer) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::LedcInitFailed(ret));
    }
    let ret = unsafe {
        ledc_channel_config(&ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel: BUZZER_CHANNEL,
            timer_sel: BUZZER_TIMER,
            gpio_num: pins::BUZZER_GPIO,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        })
    };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::LedcInitFailed(ret));
    }
    Ok(())
}

/// Sound the buzzer at `freq_hz`, or silence it when 0.
#[cfg(target_os = "espidf")]
pub fn buzzer_set(freq_hz: u32) {
    // SAFETY: channel configured in init_buzzer(); only the tick task
    // calls this after boot.
    unsafe {
        if freq_hz == 0 {
            ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, BUZZER_CHANNEL, 0);
        } else {
            ledc_set_freq(ledc_mode_t_LEDC_LOW_SPEED_MODE, BUZZER_TIMER, freq_hz);
            ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, BUZZER_CHANNEL, BUZZER_DUTY);
        }
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, BUZZER_CHANNEL);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn buzzer_set(_freq_hz: u32) {}

// ── Power loss ───────────────────────────────────────────────

/// Reset every driven pin to its default input state (high impedance).
#[cfg(target_os = "espidf")]
pub fn release_outputs() {
    for pin in crate::pins::OUTPUT_PINS {
        // SAFETY: gpio_reset_pin only reconfigures the pad; safe to call
        // on pins in any state, including unconfigured ones.
        unsafe {
            gpio_reset_pin(pin);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn release_outputs() {}
