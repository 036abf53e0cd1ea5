//! Unified error type for node construction and configuration.
//!
//! The per-tick control path is fail-soft and never returns errors; a bad
//! sensor read just skips that tick.  What *can* fail is bring-up: loading
//! a configuration, registering with the bus, initialising peripherals.
//! All of it funnels into [`Error`] so `main` has one thing to report.

use core::fmt;

use crate::app::ports::BusError;
use crate::drivers::hw_init::HwInitError;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Bus registration failed.
    Bus(BusError),
    /// Peripheral initialisation failed.
    Init(HwInitError),
    /// Configuration is invalid or could not be parsed.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Init(e) => write!(f, "init: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_error_converts_and_displays() {
        let e: Error = BusError::RegistryFull.into();
        assert_eq!(e, Error::Bus(BusError::RegistryFull));
        assert_eq!(e.to_string(), "bus: bus registry full");
    }

    #[test]
    fn init_error_keeps_return_code() {
        let e: Error = HwInitError::LedcTimerFailed(259).into();
        assert_eq!(e.to_string(), "init: LEDC timer config failed (rc=259)");
    }

    #[test]
    fn config_error_names_the_field() {
        let e = Error::Config("touch_resend_ms must be > 0");
        assert_eq!(e.to_string(), "config: touch_resend_ms must be > 0");
    }
}
