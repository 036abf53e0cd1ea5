//! Hardware adapter: bridges the board's peripherals to the port traits.
//!
//! This is the only module that touches real hardware.  Every call goes
//! through the register wrappers in [`hw_init`](crate::drivers::hw_init);
//! busy-wait delays come from the HAL's `Ets` timer.

use embedded_hal::delay::DelayNs;
use esp_idf_svc::hal::delay::Ets;
use log::warn;

use crate::app::ports::{AnalogChannel, ClockPort, Pin, PinMode, PinPort, ServoPort};
use crate::drivers::hw_init;

/// Concrete [`Hardware`](crate::app::ports::Hardware) for the node board.
pub struct EspHardware;

impl EspHardware {
    /// Peripherals must already be configured by
    /// [`hw_init::init_peripherals`].
    pub fn new() -> Self {
        Self
    }
}

impl Default for EspHardware {
    fn default() -> Self {
        Self::new()
    }
}

// ── PinPort ───────────────────────────────────────────────────

impl PinPort for EspHardware {
    fn set_pin_mode(&mut self, pin: Pin, mode: PinMode) {
        hw_init::gpio_set_mode(pin, mode);
    }

    fn read_digital(&mut self, pin: Pin) -> bool {
        hw_init::gpio_read(pin)
    }

    fn write_digital(&mut self, pin: Pin, high: bool) {
        hw_init::gpio_write(pin, high);
    }

    fn read_analog(&mut self, channel: AnalogChannel) -> u16 {
        hw_init::adc_read(channel)
    }

    fn write_pwm(&mut self, pin: Pin, duty: u8) {
        match hw_init::ledc_channel_for(pin) {
            Some(channel) => hw_init::ledc_set(channel, u32::from(duty)),
            None => warn!("hw: pin {} has no PWM channel", pin),
        }
    }
}

// ── ClockPort ─────────────────────────────────────────────────

impl ClockPort for EspHardware {
    fn now_millis(&self) -> u32 {
        (hw_init::uptime_us() / 1_000) as u32
    }

    fn now_micros(&self) -> u32 {
        hw_init::uptime_us() as u32
    }
}

// ── ServoPort ─────────────────────────────────────────────────

impl ServoPort for EspHardware {
    fn servo_attach(&mut self, pin: Pin) {
        if let Err(e) = hw_init::servo_attach(pin) {
            warn!("hw: servo attach on pin {} failed: {}", pin, e);
        }
    }

    fn servo_write(&mut self, pin: Pin, angle: u8) {
        if let Some(channel) = hw_init::ledc_channel_for(pin) {
            hw_init::ledc_set(channel, hw_init::servo_duty(angle));
        }
    }

    fn servo_detach(&mut self, pin: Pin) {
        hw_init::servo_detach(pin);
    }
}

// ── DelayNs ───────────────────────────────────────────────────

impl DelayNs for EspHardware {
    fn delay_ns(&mut self, ns: u32) {
        Ets::delay_us(ns.div_ceil(1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        Ets::delay_ms(ms);
    }
}
