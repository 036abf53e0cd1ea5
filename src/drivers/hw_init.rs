//! One-shot peripheral bring-up plus the thin register wrappers the
//! hardware adapter calls every tick.
//!
//! Configures ADC1 for the touch panel and two LEDC timers: one for the
//! fading lights and one at servo frame rate for the switch servos.  GPIO
//! direction is not fixed here; components change it at runtime through
//! [`gpio_set_mode`].  Called once from `main()` before the loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::{debug, info};

#[cfg(target_os = "espidf")]
use crate::app::ports::{AnalogChannel, ANALOG_FULL_SCALE, PinMode};
use crate::app::ports::Pin;
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    LedcTimerFailed(i32),
    LedcChannelFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc)     => write!(f, "ADC1 init failed (rc={})", rc),
            Self::LedcTimerFailed(rc)   => write!(f, "LEDC timer config failed (rc={})", rc),
            Self::LedcChannelFailed(rc) => write!(f, "LEDC channel config failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

// ── LEDC channel plan ─────────────────────────────────────────

pub const LEDC_CH_LIGHT_ROOM: u32 = 0;
pub const LEDC_CH_LIGHT_DESK: u32 = 1;
pub const LEDC_CH_SERVO_BOG: u32 = 2;
pub const LEDC_CH_SERVO_ATTIC: u32 = 3;

/// Standard hobby-servo frame rate.
pub const SERVO_FREQ_HZ: u32 = 50;
/// Light PWM carrier; high enough to avoid visible flicker.
pub const LIGHT_FREQ_HZ: u32 = 1_000;
/// Servo timer duty resolution (14 bit).
const SERVO_DUTY_BITS: u32 = 14;
/// Pulse widths for 0° and 180°.
pub const SERVO_MIN_PULSE_US: u32 = 544;
pub const SERVO_MAX_PULSE_US: u32 = 2_400;

/// LEDC duty for a servo angle at [`SERVO_FREQ_HZ`] and 14-bit resolution.
pub const fn servo_duty(angle: u8) -> u32 {
    let angle = if angle > 180 { 180 } else { angle as u32 };
    let pulse_us = SERVO_MIN_PULSE_US + (SERVO_MAX_PULSE_US - SERVO_MIN_PULSE_US) * angle / 180;
    let period_us = 1_000_000 / SERVO_FREQ_HZ;
    pulse_us * (1 << SERVO_DUTY_BITS) / period_us
}

/// ADC1 channels on the S3 (GPIO1..=10).
pub const ADC1_CHANNELS: u8 = 10;

/// Scale a 12-bit ADC reading to the 10-bit range the touch decoder
/// thresholds are expressed in.
pub const fn adc_to_10bit(raw: u16) -> u16 {
    raw >> 2
}

// ── Bring-up ──────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the loop; single-threaded.
    unsafe {
        init_adc()?;
        init_ledc()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: only the init path writes the handle, and it completes before
/// the loop starts reading.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    for rail in pins::TOUCH_RAILS {
        let channel = adc_channel_t::from(rail.channel);
        let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), channel, &chan_cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }
    }

    info!("hw_init: ADC1 configured (touch panel on GPIO{}-{})",
        pins::TOUCH_Y1.pin, pins::TOUCH_Y2.pin);
    Ok(())
}

/// Read one touch-panel channel, scaled to 0..=1023.  A failed conversion
/// reads as full scale, which the decoder treats as "no contact".
#[cfg(target_os = "espidf")]
pub fn adc_read(channel: AnalogChannel) -> u16 {
    if channel >= ADC1_CHANNELS {
        return ANALOG_FULL_SCALE;
    }
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract; main-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), adc_channel_t::from(channel), &mut raw) };
    if ret != ESP_OK as i32 {
        return ANALOG_FULL_SCALE;
    }
    adc_to_10bit(raw.clamp(0, 4095) as u16)
}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn gpio_set_mode(pin: Pin, mode: PinMode) {
    // A direction write re-routes the pad to the GPIO matrix and would
    // detach the LEDC output bound at init.
    if ledc_owns_pad(pin) {
        debug!("hw_init: pin {} stays on LEDC, mode {:?} ignored", pin, mode);
        return;
    }
    let gpio = i32::from(pin);
    let (direction, pull) = match mode {
        PinMode::Input => (gpio_mode_t_GPIO_MODE_INPUT, gpio_pull_mode_t_GPIO_FLOATING),
        PinMode::InputPullup => (gpio_mode_t_GPIO_MODE_INPUT, gpio_pull_mode_t_GPIO_PULLUP_ONLY),
        PinMode::Output => (gpio_mode_t_GPIO_MODE_INPUT_OUTPUT, gpio_pull_mode_t_GPIO_FLOATING),
    };
    // SAFETY: direction/pull register writes on a valid pad; main-loop only.
    unsafe {
        gpio_set_direction(gpio, direction);
        gpio_set_pull_mode(gpio, pull);
    }
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: Pin) -> bool {
    // SAFETY: read-only register access.
    (unsafe { gpio_get_level(i32::from(pin)) }) != 0
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: Pin, high: bool) {
    // SAFETY: level register write; main-loop only.
    unsafe { gpio_set_level(i32::from(pin), u32::from(high)); }
}

// ── LEDC PWM ─────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    // Timer 0: lights (1 kHz, 8-bit)
    let timer0 = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        freq_hz: LIGHT_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    let ret = unsafe { ledc_timer_config(&timer0) };
    if ret != ESP_OK as i32 { return Err(HwInitError::LedcTimerFailed(ret)); }

    // Timer 1: servos (50 Hz, 14-bit)
    let timer1 = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_1,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_14_BIT,
        freq_hz: SERVO_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    let ret = unsafe { ledc_timer_config(&timer1) };
    if ret != ESP_OK as i32 { return Err(HwInitError::LedcTimerFailed(ret)); }

    for (channel, gpio) in [
        (LEDC_CH_LIGHT_ROOM, pins::LIGHTS_ROOM),
        (LEDC_CH_LIGHT_DESK, pins::LIGHTS_DESK),
    ] {
        unsafe { bind_channel(channel, ledc_timer_t_LEDC_TIMER_0, gpio)? };
    }

    info!("hw_init: LEDC configured (lights=CH0-1 @{}Hz, servos=CH2-3 @{}Hz)",
        LIGHT_FREQ_HZ, SERVO_FREQ_HZ);
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn bind_channel(channel: u32, timer: ledc_timer_t, gpio: Pin) -> Result<(), HwInitError> {
    let ret = unsafe { ledc_channel_config(&ledc_channel_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        channel,
        timer_sel: timer,
        gpio_num: i32::from(gpio),
        duty: 0,
        hpoint: 0,
        ..Default::default()
    }) };
    if ret != ESP_OK as i32 { return Err(HwInitError::LedcChannelFailed(ret)); }
    Ok(())
}

/// LEDC channel a PWM-capable board pin is wired to.
pub const fn ledc_channel_for(pin: Pin) -> Option<u32> {
    match pin {
        pins::LIGHTS_ROOM => Some(LEDC_CH_LIGHT_ROOM),
        pins::LIGHTS_DESK => Some(LEDC_CH_LIGHT_DESK),
        pins::SERVO_BOG => Some(LEDC_CH_SERVO_BOG),
        pins::SERVO_ATTIC => Some(LEDC_CH_SERVO_ATTIC),
        _ => None,
    }
}

/// Pads bound to LEDC once at init and never handed back to GPIO.
/// Servo pads are excluded: they are re-bound on every attach.
pub const fn ledc_owns_pad(pin: Pin) -> bool {
    matches!(pin, pins::LIGHTS_ROOM | pins::LIGHTS_DESK)
}

#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u32) {
    // SAFETY: channel configured at init or attach; main-loop only.
    unsafe {
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, duty);
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
    }
}

/// Route a servo pin to its LEDC channel on the 50 Hz timer.
#[cfg(target_os = "espidf")]
pub fn servo_attach(pin: Pin) -> Result<(), HwInitError> {
    let Some(channel) = ledc_channel_for(pin) else {
        return Ok(());
    };
    // SAFETY: main-loop only.
    unsafe { bind_channel(channel, ledc_timer_t_LEDC_TIMER_1, pin) }
}

/// Stop the pulse train; the pad idles LOW.
#[cfg(target_os = "espidf")]
pub fn servo_detach(pin: Pin) {
    if let Some(channel) = ledc_channel_for(pin) {
        // SAFETY: main-loop only.
        unsafe {
            ledc_stop(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, 0);
            gpio_reset_pin(i32::from(pin));
        }
        gpio_set_mode(pin, PinMode::Output);
    }
}

// ── Timer ─────────────────────────────────────────────────────

/// Microseconds since boot.
#[cfg(target_os = "espidf")]
pub fn uptime_us() -> u64 {
    // SAFETY: RTC counter read.
    (unsafe { esp_timer_get_time() }) as u64
}
