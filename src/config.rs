//! Node configuration parameters
//!
//! Every timing constant and servo angle the control loop uses.  Defaults
//! match the installed hardware; a JSON override can be supplied at build
//! time (see `main.rs`).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Servo horn angles (degrees) for the two switch positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServoAngles {
    pub on: u8,
    pub off: u8,
}

impl ServoAngles {
    /// Angle for a logical state.
    pub const fn for_state(self, on: bool) -> u8 {
        if on { self.on } else { self.off }
    }
}

/// Core node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    // --- Lights ---
    /// Fade duration both lights start with (ms); tunable remotely afterwards
    pub light_fade_ms: u32,

    // --- Motion ---
    /// Minimum gap between two motion events from one PIR (ms)
    pub pir_min_period_ms: u32,

    // --- Touch panel ---
    /// Minimum gap between two "move" events (ms)
    pub touch_resend_ms: u32,
    /// ADC/rail settle time after reconfiguring the panel pins (ms)
    pub touch_settle_ms: u32,

    // --- Servo switches ---
    /// How long a servo stays driven after a command (ms)
    pub servo_powerdown_ms: u32,
    pub servo_bog_angles: ServoAngles,
    pub servo_attic_angles: ServoAngles,

    // --- Door handle ---
    /// EMA weight as a shift: new sample contributes 1/2^n
    pub door_handle_avg_decay: u8,
    /// A sample above `avg * sensitivity` counts as a touch
    pub door_handle_sensitivity: u32,
    /// Minimum gap between two "handle touched" events (ms)
    pub door_handle_min_period_ms: u32,
    /// Upper bound on discharge-probe polling iterations
    pub door_handle_max_iter: u32,
    /// How long the handle line is held low before each probe (ms)
    pub door_handle_discharge_ms: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            light_fade_ms: 1000,

            pir_min_period_ms: 5000,

            touch_resend_ms: 100,
            touch_settle_ms: 10,

            servo_powerdown_ms: 1000,
            servo_bog_angles: ServoAngles { on: 120, off: 90 },
            servo_attic_angles: ServoAngles { on: 105, off: 63 },

            door_handle_avg_decay: 2,
            door_handle_sensitivity: 2,
            door_handle_min_period_ms: 200,
            door_handle_max_iter: 100_000,
            door_handle_discharge_ms: 2,
        }
    }
}

impl NodeConfig {
    /// Parse a (possibly partial) JSON document; missing fields keep
    /// their defaults.  The result is validated.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the control loop cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.touch_resend_ms == 0 {
            return Err(Error::Config("touch_resend_ms must be > 0"));
        }
        // The touch sampler blocks the whole loop for two settle delays.
        if self.touch_settle_ms > 50 {
            return Err(Error::Config("touch_settle_ms must be <= 50"));
        }
        if self.door_handle_discharge_ms > 50 {
            return Err(Error::Config("door_handle_discharge_ms must be <= 50"));
        }
        if self.door_handle_sensitivity == 0 {
            return Err(Error::Config("door_handle_sensitivity must be > 0"));
        }
        if self.door_handle_avg_decay == 0 || self.door_handle_avg_decay >= 16 {
            return Err(Error::Config("door_handle_avg_decay must be in 1..16"));
        }
        if self.door_handle_max_iter == 0 {
            return Err(Error::Config("door_handle_max_iter must be > 0"));
        }
        for angles in [self.servo_bog_angles, self.servo_attic_angles] {
            if angles.on > 180 || angles.off > 180 {
                return Err(Error::Config("servo angles must be <= 180"));
            }
        }
        Ok(())
    }
}
