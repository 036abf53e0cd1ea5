//! Host-side simulated board.
//!
//! Implements every hardware port in memory so the control loop can run
//! on x86_64.  Time only moves when a test advances it or when a
//! component blocks (delays and discharge-probe polling advance the
//! simulated clock by the time they would take on target).
//!
//! Compiled out on ESP-IDF.

use std::collections::{HashMap, VecDeque};

use embedded_hal::delay::DelayNs;

use crate::app::ports::{
    ANALOG_FULL_SCALE, AnalogChannel, ClockPort, EventHandle, EventSink, Pin, PinMode, PinPort,
    ServoPort,
};

/// Cost of one discharge-probe poll, in microseconds.
const POLL_COST_US: u64 = 1;

/// Servo driver calls, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServoCall {
    Attach(Pin),
    Write(Pin, u8),
    Detach(Pin),
}

/// An RC line that floats back HIGH a fixed time after being released.
#[derive(Debug, Clone, Copy)]
struct RisingLine {
    rise_us: u32,
    released_at_us: Option<u64>,
}

/// In-memory board.
#[derive(Debug, Default)]
pub struct SimHardware {
    clock_us: u64,
    modes: HashMap<Pin, PinMode>,
    inputs: HashMap<Pin, bool>,
    outputs: HashMap<Pin, bool>,
    pwm: HashMap<Pin, u8>,
    pwm_history: Vec<(Pin, u8)>,
    analog: HashMap<AnalogChannel, u16>,
    analog_script: HashMap<AnalogChannel, VecDeque<u16>>,
    rising: HashMap<Pin, RisingLine>,
    servo_calls: Vec<ServoCall>,
    attached: HashMap<Pin, bool>,
    blocked_us: u64,
}

impl SimHardware {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Clock ─────────────────────────────────────────────────

    /// Jump the millisecond clock to `ms` (microsecond clock follows).
    pub fn set_millis(&mut self, ms: u32) {
        self.clock_us = u64::from(ms) * 1000;
    }

    pub fn advance_ms(&mut self, ms: u32) {
        self.clock_us += u64::from(ms) * 1000;
    }

    pub fn advance_us(&mut self, us: u32) {
        self.clock_us += u64::from(us);
    }

    /// Total simulated time spent inside delays and probe polling.
    pub fn blocked_us(&self) -> u64 {
        self.blocked_us
    }

    // ── Digital ───────────────────────────────────────────────

    /// Level an input pin reads.  Unset pins read HIGH (pulled up).
    pub fn set_input(&mut self, pin: Pin, high: bool) {
        self.inputs.insert(pin, high);
    }

    /// Make `pin` behave like an RC line: after it stops being driven it
    /// reads LOW until `rise_us` microseconds have passed.
    pub fn set_rise_time(&mut self, pin: Pin, rise_us: u32) {
        let released_at_us = self.rising.get(&pin).and_then(|l| l.released_at_us);
        self.rising.insert(pin, RisingLine { rise_us, released_at_us });
    }

    pub fn mode(&self, pin: Pin) -> Option<PinMode> {
        self.modes.get(&pin).copied()
    }

    pub fn output(&self, pin: Pin) -> Option<bool> {
        self.outputs.get(&pin).copied()
    }

    // ── PWM ───────────────────────────────────────────────────

    pub fn pwm(&self, pin: Pin) -> Option<u8> {
        self.pwm.get(&pin).copied()
    }

    /// Every PWM write so far, in order.
    pub fn pwm_history(&self) -> &[(Pin, u8)] {
        &self.pwm_history
    }

    pub fn clear_pwm_history(&mut self) {
        self.pwm_history.clear();
    }

    // ── Analog ────────────────────────────────────────────────

    /// Steady value a channel reads once any scripted values run out.
    /// Unset channels read full scale.
    pub fn set_analog(&mut self, channel: AnalogChannel, value: u16) {
        self.analog.insert(channel, value);
    }

    /// Values returned by the next reads of `channel`, in order.
    pub fn script_analog(&mut self, channel: AnalogChannel, values: &[u16]) {
        self.analog_script
            .entry(channel)
            .or_default()
            .extend(values.iter().copied());
    }

    // ── Servo ─────────────────────────────────────────────────

    pub fn servo_calls(&self) -> &[ServoCall] {
        &self.servo_calls
    }

    pub fn servo_attached(&self, pin: Pin) -> bool {
        self.attached.get(&pin).copied().unwrap_or(false)
    }

    fn block_us(&mut self, us: u64) {
        self.clock_us += us;
        self.blocked_us += us;
    }
}

impl ClockPort for SimHardware {
    fn now_millis(&self) -> u32 {
        (self.clock_us / 1000) as u32
    }

    fn now_micros(&self) -> u32 {
        self.clock_us as u32
    }
}

impl PinPort for SimHardware {
    fn set_pin_mode(&mut self, pin: Pin, mode: PinMode) {
        self.modes.insert(pin, mode);
        let now = self.clock_us;
        if let Some(line) = self.rising.get_mut(&pin) {
            line.released_at_us = match mode {
                PinMode::Output => None,
                PinMode::Input | PinMode::InputPullup => Some(now),
            };
        }
    }

    fn read_digital(&mut self, pin: Pin) -> bool {
        if let Some(line) = self.rising.get(&pin).copied() {
            self.block_us(POLL_COST_US);
            return match line.released_at_us {
                Some(at) => self.clock_us.saturating_sub(at) >= u64::from(line.rise_us),
                None => self.outputs.get(&pin).copied().unwrap_or(false),
            };
        }
        self.inputs.get(&pin).copied().unwrap_or(true)
    }

    fn write_digital(&mut self, pin: Pin, high: bool) {
        self.outputs.insert(pin, high);
    }

    fn read_analog(&mut self, channel: AnalogChannel) -> u16 {
        if let Some(v) = self.analog_script.get_mut(&channel).and_then(VecDeque::pop_front) {
            return v;
        }
        self.analog
            .get(&channel)
            .copied()
            .unwrap_or(ANALOG_FULL_SCALE)
    }

    fn write_pwm(&mut self, pin: Pin, duty: u8) {
        self.pwm.insert(pin, duty);
        self.pwm_history.push((pin, duty));
    }
}

impl ServoPort for SimHardware {
    fn servo_attach(&mut self, pin: Pin) {
        self.attached.insert(pin, true);
        self.servo_calls.push(ServoCall::Attach(pin));
    }

    fn servo_write(&mut self, pin: Pin, angle: u8) {
        self.servo_calls.push(ServoCall::Write(pin, angle));
    }

    fn servo_detach(&mut self, pin: Pin) {
        self.attached.insert(pin, false);
        self.servo_calls.push(ServoCall::Detach(pin));
    }
}

impl DelayNs for SimHardware {
    fn delay_ns(&mut self, ns: u32) {
        self.block_us(u64::from(ns.div_ceil(1000)));
    }

    fn delay_us(&mut self, us: u32) {
        self.block_us(u64::from(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.block_us(u64::from(ms) * 1000);
    }
}

/// Event sink that remembers everything fired through it.
#[derive(Debug, Default)]
pub struct EventLog {
    pub fired: Vec<(EventHandle, Option<i32>)>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `event` fired.
    pub fn count(&self, event: EventHandle) -> usize {
        self.fired.iter().filter(|(h, _)| *h == event).count()
    }

    /// Arguments `event` fired with, in order.
    pub fn args(&self, event: EventHandle) -> Vec<Option<i32>> {
        self.fired
            .iter()
            .filter(|(h, _)| *h == event)
            .map(|(_, a)| *a)
            .collect()
    }

    pub fn clear(&mut self) {
        self.fired.clear();
    }
}

impl EventSink for EventLog {
    fn fire(&mut self, event: EventHandle, arg: Option<i32>) {
        self.fired.push((event, arg));
    }
}
