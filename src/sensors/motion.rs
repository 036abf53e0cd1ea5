//! PIR motion detectors.
//!
//! A PIR module holds its output active for as long as it sees movement,
//! often several seconds.  Each [`MotionDebouncer`] turns that level into
//! one "motion" event and then ignores the sensor for a refractory period.
//!
//! The bathroom sensor is open-collector (active-low, needs the pull-up);
//! the others drive their line high on motion.

use log::debug;

use crate::app::ports::{EventHandle, EventSink, Hardware, Pin, PinMode};

/// Which level on the input means "motion present".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    pub const fn is_active(self, high: bool) -> bool {
        match self {
            Self::ActiveHigh => high,
            Self::ActiveLow => !high,
        }
    }

    /// Input mode the sensor line needs.
    const fn pin_mode(self) -> PinMode {
        match self {
            Self::ActiveHigh => PinMode::Input,
            Self::ActiveLow => PinMode::InputPullup,
        }
    }
}

pub struct MotionDebouncer {
    pin: Pin,
    polarity: Polarity,
    event: EventHandle,
    min_period_ms: u32,
    last_fired: u32,
}

impl MotionDebouncer {
    pub fn new(
        hw: &mut impl Hardware,
        pin: Pin,
        polarity: Polarity,
        min_period_ms: u32,
        event: EventHandle,
    ) -> Self {
        hw.set_pin_mode(pin, polarity.pin_mode());
        Self {
            pin,
            polarity,
            event,
            min_period_ms,
            last_fired: 0,
        }
    }

    /// Sample the sensor; fire if it is active and the refractory period
    /// has strictly elapsed since the last fire.
    pub fn refresh(&mut self, hw: &mut impl Hardware, sink: &mut impl EventSink) {
        let now = hw.now_millis();
        if self.polarity.is_active(hw.read_digital(self.pin))
            && now.wrapping_sub(self.last_fired) > self.min_period_ms
        {
            sink.fire(self.event, None);
            self.last_fired = now;
            debug!("motion: pin {} fired at {}", self.pin, now);
        }
    }

    /// Restart the refractory period at `now` without firing.
    ///
    /// Servo switches induce a ground shift that the stairs PIR reads as
    /// motion; they call this whenever they energise.
    pub fn suppress(&mut self, now: u32) {
        self.last_fired = now;
    }

    pub fn pin(&self) -> Pin {
        self.pin
    }

    pub fn last_fired(&self) -> u32 {
        self.last_fired
    }
}
