//! Servo-operated wall light switch.
//!
//! A hobby servo mounted over a rocker switch pushes it to one of two
//! angles.  The servo is only driven for a short window after each
//! command; afterwards the pulse train is stopped and the pin parked LOW
//! so the servo neither hums nor draws holding current.  The rocker keeps
//! the horn in place mechanically.
//!
//! Energising a servo disturbs the ground reference of the stairs PIR,
//! so [`ServoSwitch::set`] also restarts that sensor's refractory period.

use log::{debug, info};

use crate::app::ports::{Hardware, Pin, PinMode};
use crate::config::ServoAngles;
use crate::sensors::motion::MotionDebouncer;

pub struct ServoSwitch {
    pin: Pin,
    angles: ServoAngles,
    powerdown_ms: u32,
    /// Last commanded logical state.
    state: bool,
    /// When the servo was last energised; `None` = detached.
    energised_at: Option<u32>,
}

impl ServoSwitch {
    /// Park the servo pin as a LOW output.  Starts logically off without
    /// moving the servo.
    pub fn new(hw: &mut impl Hardware, pin: Pin, angles: ServoAngles, powerdown_ms: u32) -> Self {
        hw.set_pin_mode(pin, PinMode::Output);
        hw.write_digital(pin, false);
        Self {
            pin,
            angles,
            powerdown_ms,
            state: false,
            energised_at: None,
        }
    }

    /// Drive the servo to the angle for `on` and keep it powered for the
    /// power-down window.
    ///
    /// Side effect: restarts `interfering`'s refractory period, masking the
    /// false trigger the servo current causes on that sensor.
    pub fn set(&mut self, hw: &mut impl Hardware, on: bool, interfering: &mut MotionDebouncer) {
        let now = hw.now_millis();
        hw.servo_attach(self.pin);
        hw.servo_write(self.pin, self.angles.for_state(on));
        self.energised_at = Some(now);
        self.state = on;

        interfering.suppress(now);
        info!(
            "servo: pin {} -> {} ({} deg)",
            self.pin,
            if on { "on" } else { "off" },
            self.angles.for_state(on)
        );
    }

    /// Last commanded logical state (not a position readback).
    pub fn get(&self) -> bool {
        self.state
    }

    /// Power the servo down once its window has elapsed.
    pub fn refresh(&mut self, hw: &mut impl Hardware) {
        let Some(since) = self.energised_at else {
            return;
        };
        if hw.now_millis().wrapping_sub(since) >= self.powerdown_ms {
            hw.servo_detach(self.pin);
            hw.write_digital(self.pin, false);
            self.energised_at = None;
            debug!("servo: pin {} powered down", self.pin);
        }
    }

    /// Timestamp at which the servo will be detached, if it is driven.
    pub fn powerdown_deadline(&self) -> Option<u32> {
        self.energised_at
            .map(|since| since.wrapping_add(self.powerdown_ms))
    }

    pub fn is_energised(&self) -> bool {
        self.energised_at.is_some()
    }

    pub fn pin(&self) -> Pin {
        self.pin
    }
}
