//! 4-wire resistive touch panel.
//!
//! The panel has two resistive sheets, each with a rail at either end
//! (X1/X2, Y1/Y2), all four wired to ADC-capable pins.  To read one axis,
//! one sheet's rails are driven to form a voltage gradient and the other
//! sheet is left as a pulled-up input: a press connects the sheets and
//! the input reads the gradient voltage at the contact point.  With no
//! press the pull-up wins and the input reads near the top rail.
//!
//! ```text
//!            Y role (idle)                  X role (one read per tick)
//!   X1 ── out HIGH   X2 ── out LOW      Y1 ── out LOW    Y2 ── out HIGH
//!   Y1 ── in + pull  Y2 ── in + pull    X1 ── in + pull  X2 ── in + pull
//!   sample Y1                           sample X1
//! ```
//!
//! The panel sits in the Y role between ticks.  After every role change
//! the sensing rail needs [`NodeConfig::touch_settle_ms`] to charge
//! before the ADC value is trustworthy; the loop blocks for that long,
//! twice per tick while the panel is pressed.
//!
//! [`NodeConfig::touch_settle_ms`]: crate::config::NodeConfig::touch_settle_ms

use log::debug;

use crate::app::ports::{AnalogPin, EventHandle, EventSink, Hardware, PinMode};

/// Raw readings at or above this mean the pull-up won: nobody is pressing.
pub const NO_CONTACT_THRESHOLD: u16 = 970;

/// Raw Y reading at the panel's near edge, and its usable span.
const Y_RAW_MIN: i32 = 100;
const Y_RAW_SPAN: i32 = 900;

/// Raw X reading at the panel's near edge, and its usable span.
const X_RAW_MIN: i32 = 150;
const X_RAW_SPAN: i32 = 800;

/// Filter out the no-contact band.
pub fn contact(raw: u16) -> Option<u16> {
    (raw < NO_CONTACT_THRESHOLD).then_some(raw)
}

/// Map a raw Y reading onto 0..=255 (inverted: the low rail is y = 255).
/// Can fall outside that range for readings beyond the calibrated edges.
pub fn scale_y(raw: u16) -> i32 {
    255 - ((i32::from(raw) - Y_RAW_MIN) * 255) / Y_RAW_SPAN
}

/// Map a raw X reading onto 0..=255.
/// Can fall outside that range for readings beyond the calibrated edges.
pub fn scale_x(raw: u16) -> i32 {
    ((i32::from(raw) - X_RAW_MIN) * 255) / X_RAW_SPAN
}

/// A decoded contact point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TouchPosition {
    pub x: u8,
    pub y: u8,
}

impl TouchPosition {
    /// Build from scaled coordinates.  `None` if either is negative
    /// (contact outside the panel); values past 255 saturate at the edge.
    ///
    /// Saturation is deliberate: keeping only the low byte would wrap an
    /// overshoot to the far side of the panel (x = 261 would report 5).
    pub fn from_scaled(x: i32, y: i32) -> Option<Self> {
        if x < 0 || y < 0 {
            return None;
        }
        Some(Self {
            x: x.min(255) as u8,
            y: y.min(255) as u8,
        })
    }

    /// Decode a raw Y/X pair as sampled from the panel.
    pub fn decode(y_raw: u16, x_raw: u16) -> Option<Self> {
        let y = scale_y(contact(y_raw)?);
        let x = scale_x(contact(x_raw)?);
        Self::from_scaled(x, y)
    }

    /// Bus encoding: high byte = x, low byte = y.
    pub fn packed(self) -> u16 {
        (u16::from(self.x) << 8) | u16::from(self.y)
    }
}

/// Which axis the panel pins are currently configured to sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenseRole {
    Y,
    X,
}

/// The four panel rails.  Each is sampled and driven on the same pad.
#[derive(Debug, Clone, Copy)]
pub struct TouchPins {
    pub y1: AnalogPin,
    pub x2: AnalogPin,
    pub x1: AnalogPin,
    pub y2: AnalogPin,
}

/// Handles for the three touch events.
#[derive(Debug, Clone, Copy)]
pub struct TouchEvents {
    pub down: EventHandle,
    pub moved: EventHandle,
    pub up: EventHandle,
}

pub struct TouchSampler {
    pins: TouchPins,
    events: TouchEvents,
    resend_ms: u32,
    settle_ms: u32,
    role: SenseRole,
    down: bool,
    last_position: TouchPosition,
    last_move_sent: u32,
}

impl TouchSampler {
    /// Take ownership of the four panel pins and put them in the Y role.
    pub fn new(
        hw: &mut impl Hardware,
        pins: TouchPins,
        resend_ms: u32,
        settle_ms: u32,
        events: TouchEvents,
    ) -> Self {
        let mut sampler = Self {
            pins,
            events,
            resend_ms,
            settle_ms,
            role: SenseRole::Y,
            down: false,
            last_position: TouchPosition::default(),
            last_move_sent: 0,
        };
        sampler.set_role(hw, SenseRole::Y);
        sampler
    }

    /// Sample the panel once and fire down/move/up as appropriate.
    ///
    /// Out-of-range readings abort the tick without changing any state;
    /// the next tick simply tries again.
    pub fn refresh(&mut self, hw: &mut impl Hardware, sink: &mut impl EventSink) {
        if self.read(hw).is_none() {
            if self.down {
                sink.fire(self.events.up, Some(i32::from(self.last_position.packed())));
                self.down = false;
                debug!("touch: up at {:?}", self.last_position);
            }
            return;
        }

        // Confirm the contact once the rail has settled; edge brushes
        // flicker in and out of the no-contact band.
        hw.delay_ms(self.settle_ms);
        let Some(y_raw) = self.read(hw) else {
            return;
        };

        self.set_role(hw, SenseRole::X);
        hw.delay_ms(self.settle_ms);
        let x_raw = self.read(hw);
        self.set_role(hw, SenseRole::Y);
        let Some(x_raw) = x_raw else {
            return;
        };

        let Some(position) = TouchPosition::from_scaled(scale_x(x_raw), scale_y(y_raw)) else {
            return;
        };
        self.last_position = position;
        let packed = i32::from(position.packed());

        if !self.down {
            self.down = true;
            sink.fire(self.events.down, Some(packed));
            debug!("touch: down at {:?}", position);
        }

        let now = hw.now_millis();
        if now.wrapping_sub(self.last_move_sent) >= self.resend_ms {
            self.last_move_sent = now;
            sink.fire(self.events.moved, Some(packed));
        }
    }

    /// Reconfigure the four rails for `role`.
    fn set_role(&mut self, hw: &mut impl Hardware, role: SenseRole) {
        let p = self.pins;
        let (drive_high, drive_low, sense) = match role {
            SenseRole::Y => (p.x1, p.x2, [p.y1, p.y2]),
            SenseRole::X => (p.y2, p.y1, [p.x1, p.x2]),
        };

        for (rail, high) in [(drive_high, true), (drive_low, false)] {
            hw.set_pin_mode(rail.pin, PinMode::Output);
            hw.write_digital(rail.pin, high);
        }
        for rail in sense {
            hw.set_pin_mode(rail.pin, PinMode::InputPullup);
        }
        self.role = role;
    }

    /// Sample the sensing rail of the current role.
    fn read(&self, hw: &mut impl Hardware) -> Option<u16> {
        let rail = match self.role {
            SenseRole::Y => self.pins.y1,
            SenseRole::X => self.pins.x1,
        };
        contact(hw.read_analog(rail.channel))
    }

    pub fn role(&self) -> SenseRole {
        self.role
    }

    pub fn is_down(&self) -> bool {
        self.down
    }

    pub fn last_position(&self) -> TouchPosition {
        self.last_position
    }
}
