//! Port traits: the boundary between the control core and the outside world.
//!
//! ```text
//!   Hardware adapter ──▶ PinPort / ClockPort / ServoPort / DelayNs ──▶ components
//!   Bus client       ◀── BusPort / EventSink                        ◀── components
//! ```
//!
//! Components never touch registers or the bus client directly.  They are
//! handed `&mut impl Hardware` and `&mut impl EventSink` on every tick, so
//! the whole core runs on the host against test doubles.
//!
//! ## Timebase
//!
//! Both clocks are free-running `u32` counters that wrap.  Every duration
//! is computed as `now.wrapping_sub(reference)`; never compare two
//! timestamps directly.

use embedded_hal::delay::DelayNs;

use super::commands::BusCommand;

// ───────────────────────────────────────────────────────────────
// Pin identifiers
// ───────────────────────────────────────────────────────────────

/// Digital pin number as wired on the board.
pub type Pin = u8;

/// ADC channel number (0-based).
pub type AnalogChannel = u8;

/// A pad that is sampled through the ADC and also driven as a digital
/// pin: both numbers name the same physical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalogPin {
    pub channel: AnalogChannel,
    pub pin: Pin,
}

/// Full-scale value of [`PinPort::read_analog`] (10-bit ADC).
pub const ANALOG_FULL_SCALE: u16 = 1023;

/// Electrical configuration of a digital pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    /// High-impedance input, no pull.
    Input,
    /// Input with the internal pull-up enabled.
    InputPullup,
    /// Push-pull output.
    Output,
}

// ───────────────────────────────────────────────────────────────
// Hardware ports (driven adapter: domain ↔ hardware)
// ───────────────────────────────────────────────────────────────

/// Raw pin access.
pub trait PinPort {
    fn set_pin_mode(&mut self, pin: Pin, mode: PinMode);

    /// `true` = HIGH.
    fn read_digital(&mut self, pin: Pin) -> bool;

    fn write_digital(&mut self, pin: Pin, high: bool);

    /// Sample an ADC channel.  Returns `0..=ANALOG_FULL_SCALE`.
    fn read_analog(&mut self, channel: AnalogChannel) -> u16;

    /// Set the PWM duty of an output pin (0 = off, 255 = fully on).
    fn write_pwm(&mut self, pin: Pin, duty: u8);
}

/// Monotonic, wrapping clocks.
pub trait ClockPort {
    /// Milliseconds since boot, wrapping at `u32::MAX`.
    fn now_millis(&self) -> u32;

    /// Microseconds since boot, wrapping at `u32::MAX`.
    fn now_micros(&self) -> u32;
}

/// Hobby-servo PWM driver.
pub trait ServoPort {
    /// Start generating servo pulses on `pin`.
    fn servo_attach(&mut self, pin: Pin);

    /// Command an angle in degrees (0–180).  Only meaningful while attached.
    fn servo_write(&mut self, pin: Pin, angle: u8);

    /// Stop generating pulses; the horn holds position mechanically.
    fn servo_detach(&mut self, pin: Pin);
}

/// Everything a component may need from the board in one bound.
///
/// Blocking waits go through [`DelayNs`] so the same code drives a real
/// busy-wait on target and advances a simulated clock in tests.
pub trait Hardware: PinPort + ClockPort + ServoPort + DelayNs {}

impl<T: PinPort + ClockPort + ServoPort + DelayNs> Hardware for T {}

// ───────────────────────────────────────────────────────────────
// Bus ports (driven adapter: domain → remote control bus)
// ───────────────────────────────────────────────────────────────

/// Handle to a registered, fireable event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventHandle(pub u8);

/// Handle to a registered remote property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyId(pub u8);

/// Handle to a registered remote action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId(pub u8);

/// Write side of the bus: components publish events through this.
pub trait EventSink {
    /// Publish `event` with zero or one integer argument.
    fn fire(&mut self, event: EventHandle, arg: Option<i32>);
}

/// Full bus-client capability, used by the scheduler only.
///
/// Registration happens once at construction.  Inbound remote requests
/// are not delivered through callbacks; the scheduler drains them with
/// [`next_command`](Self::next_command) after each [`sync`](Self::sync)
/// and routes them to the owning component.
pub trait BusPort: EventSink {
    /// Register a remotely readable/settable integer property.
    fn expose_property(&mut self, name: &'static str) -> Result<PropertyId, BusError>;

    /// Register a remotely invocable zero/one-argument action.
    fn expose_action(&mut self, name: &'static str) -> Result<ActionId, BusError>;

    /// Register a fireable event.
    fn expose_event(&mut self, name: &'static str) -> Result<EventHandle, BusError>;

    /// Service inbound/outbound traffic.  Called once per scheduler tick.
    fn sync(&mut self);

    /// Next inbound command received by the last [`sync`](Self::sync).
    fn next_command(&mut self) -> Option<BusCommand>;

    /// Answer a command.  `None` for commands with no return value.
    fn respond(&mut self, command: &BusCommand, value: Option<i32>);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`BusPort`] registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The adapter's fixed-capacity registry has no free slot.
    RegistryFull,
    /// A name was registered twice.
    DuplicateName(&'static str),
}

impl core::fmt::Display for BusError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::RegistryFull => write!(f, "bus registry full"),
            Self::DuplicateName(name) => write!(f, "'{}' already registered", name),
        }
    }
}
