//! PWM light with linear fading.
//!
//! A new target brightness is not applied at once: [`LightFader::refresh`]
//! walks the PWM output from the level at the time of the change to the
//! target over `duration_ms`, one step per scheduler tick.
//!
//! ```text
//!  level
//!  target ┤            ╭──────────
//!         │        ╭───╯
//!         │    ╭───╯
//!  old    ┼────╯
//!         └────┬───────────┬──────▶ t
//!            start     start+duration
//! ```

use log::debug;

use crate::app::ports::{Hardware, Pin, PinMode};

/// Brightness at `elapsed` ms into a fade from `old` to `target`.
///
/// Returns `None` once the fade is over (`elapsed >= duration_ms`, or a
/// zero duration), in which case the output is exactly `target`.
/// Integer interpolation, truncating toward zero.
pub fn fade_level(old: u8, target: u8, elapsed: u32, duration_ms: u32) -> Option<u8> {
    if duration_ms == 0 || elapsed >= duration_ms {
        return None;
    }
    let delta = i64::from(target) - i64::from(old);
    let step = i64::from(elapsed) * delta / i64::from(duration_ms);
    Some((i64::from(old) + step) as u8)
}

/// Clamp a remotely supplied brightness into the PWM range.
pub fn level_from_remote(value: i32) -> u8 {
    value.clamp(0, i32::from(u8::MAX)) as u8
}

pub struct LightFader {
    pin: Pin,
    /// Brightness the fade is heading to.
    target: u8,
    /// Brightness the current fade started from.
    old: u8,
    /// Timestamp (ms) the current fade started; `None` = not fading.
    fade_started: Option<u32>,
    duration_ms: u32,
    /// Last value written to the PWM pin.
    output: u8,
}

impl LightFader {
    /// Configure `pin` as a PWM output and schedule a fade-in from off to
    /// full brightness starting at the current time.
    pub fn new(hw: &mut impl Hardware, pin: Pin, duration_ms: u32) -> Self {
        hw.set_pin_mode(pin, PinMode::Output);
        debug!("light: pin {} fade-in over {}ms", pin, duration_ms);
        Self {
            pin,
            target: u8::MAX,
            old: 0,
            fade_started: Some(hw.now_millis()),
            duration_ms,
            output: 0,
        }
    }

    /// Start fading from the current output towards `target`.
    pub fn set(&mut self, now: u32, target: u8) {
        self.old = self.output;
        self.target = target;
        self.fade_started = Some(now);
    }

    /// Jump to `value` immediately, cancelling any fade.
    pub fn force(&mut self, hw: &mut impl Hardware, value: u8) {
        self.old = value;
        self.target = value;
        self.fade_started = None;
        self.write(hw, value);
    }

    /// Restart the pending fade from its original starting level at `now`.
    /// Used once the bus is up so the boot fade-in is actually visible.
    pub fn restart_fade(&mut self, now: u32) {
        if self.fade_started.is_some() {
            self.fade_started = Some(now);
        }
    }

    /// Advance the fade.  No-op while not fading.
    pub fn refresh(&mut self, hw: &mut impl Hardware) {
        let Some(start) = self.fade_started else {
            return;
        };
        let elapsed = hw.now_millis().wrapping_sub(start);

        match fade_level(self.old, self.target, elapsed, self.duration_ms) {
            Some(level) => self.write(hw, level),
            None => {
                self.write(hw, self.target);
                self.old = self.target;
                self.fade_started = None;
                debug!("light: pin {} reached {}", self.pin, self.target);
            }
        }
    }

    fn write(&mut self, hw: &mut impl Hardware, level: u8) {
        hw.write_pwm(self.pin, level);
        self.output = level;
    }

    pub fn pin(&self) -> Pin {
        self.pin
    }

    /// Brightness being faded to (what the remote `get` reports).
    pub fn target(&self) -> u8 {
        self.target
    }

    /// Level currently on the pin.
    pub fn output(&self) -> u8 {
        self.output
    }

    pub fn is_fading(&self) -> bool {
        self.fade_started.is_some()
    }

    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    /// Change the fade duration.  Applies to the fade in progress too.
    pub fn set_duration_ms(&mut self, duration_ms: u32) {
        self.duration_ms = duration_ms;
    }
}
