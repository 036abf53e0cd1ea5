//! Pin / channel assignments for the node board (ESP32-S3).
//!
//! Single source of truth: every component is constructed from these
//! constants in [`Scheduler::new`](crate::scheduler::Scheduler::new)
//! rather than hard-coding pin numbers.

use crate::app::ports::{AnalogChannel, AnalogPin, Pin};

// ---------------------------------------------------------------------------
// Servo-operated light switches
// ---------------------------------------------------------------------------

/// PWM output driving the bathroom light-switch servo.
pub const SERVO_BOG: Pin = 10;
/// PWM output driving the attic light-switch servo.
pub const SERVO_ATTIC: Pin = 9;

// ---------------------------------------------------------------------------
// Door
// ---------------------------------------------------------------------------

/// Reed switch input; pulled up, reads LOW while the door is closed.
pub const DOOR_MAGSWITCH: Pin = 13;
/// Capacitive handle sense line (floating input between probes).
pub const DOOR_HANDLE: Pin = 12;

// ---------------------------------------------------------------------------
// PIR motion detectors
// ---------------------------------------------------------------------------

/// Bathroom PIR, open-collector, active-low, needs the internal pull-up.
pub const PIR_BOG: Pin = 8;
/// Stairs PIR, active-high.
pub const PIR_STAIRS: Pin = 7;
/// Room PIR, active-high.
pub const PIR_ROOM: Pin = 11;

// ---------------------------------------------------------------------------
// Fading lights (LEDC PWM)
// ---------------------------------------------------------------------------

pub const LIGHTS_ROOM: Pin = 6;
pub const LIGHTS_DESK: Pin = 5;

// ---------------------------------------------------------------------------
// 4-wire resistive touch panel (ADC1, GPIO1..=4)
// ---------------------------------------------------------------------------

/// ADC1 channel N sits on GPIO N+1.
pub const fn adc1(channel: AnalogChannel) -> AnalogPin {
    AnalogPin { channel, pin: channel + 1 }
}

pub const TOUCH_Y1: AnalogPin = adc1(0);
pub const TOUCH_X2: AnalogPin = adc1(1);
pub const TOUCH_X1: AnalogPin = adc1(2);
pub const TOUCH_Y2: AnalogPin = adc1(3);

pub const TOUCH_RAILS: [AnalogPin; 4] = [TOUCH_Y1, TOUCH_X2, TOUCH_X1, TOUCH_Y2];

/// Every digital pad the components claim, touch rails included.
pub const ALL_PADS: [Pin; 13] = [
    SERVO_BOG,
    SERVO_ATTIC,
    DOOR_MAGSWITCH,
    DOOR_HANDLE,
    PIR_BOG,
    PIR_STAIRS,
    PIR_ROOM,
    LIGHTS_ROOM,
    LIGHTS_DESK,
    TOUCH_Y1.pin,
    TOUCH_X2.pin,
    TOUCH_X1.pin,
    TOUCH_Y2.pin,
];
