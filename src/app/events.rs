//! Outbound events published on the remote control bus.
//!
//! Each [`NodeEvent`] is registered once through
//! [`BusPort::expose_event`](super::ports::BusPort::expose_event); the
//! resulting handles live in an [`EventTable`] and are handed to the
//! component that fires them.

use super::ports::{BusError, BusPort, EventHandle};

/// Every event the node can fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeEvent {
    // ── Motion ────────────────────────────────────────────
    PirBog = 0,
    PirStairs = 1,
    PirRoom = 2,

    // ── Touch panel (argument = packed position) ──────────
    TouchDown = 3,
    TouchMove = 4,
    TouchUp = 5,

    // ── Door ──────────────────────────────────────────────
    DoorOpened = 6,
    DoorClosed = 7,
    DoorHandleTouched = 8,
}

/// Number of [`NodeEvent`] variants.
pub const EVENT_COUNT: usize = 9;

impl NodeEvent {
    /// Every event, in registration order.
    pub const ALL: [Self; EVENT_COUNT] = [
        Self::PirBog,
        Self::PirStairs,
        Self::PirRoom,
        Self::TouchDown,
        Self::TouchMove,
        Self::TouchUp,
        Self::DoorOpened,
        Self::DoorClosed,
        Self::DoorHandleTouched,
    ];

    /// Bus name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::PirBog => "pir_bog",
            Self::PirStairs => "pir_stairs",
            Self::PirRoom => "pir_room",
            Self::TouchDown => "touch_down",
            Self::TouchMove => "touch_move",
            Self::TouchUp => "touch_up",
            Self::DoorOpened => "door_opened",
            Self::DoorClosed => "door_closed",
            Self::DoorHandleTouched => "door_handle_touched",
        }
    }
}

/// Handles for every [`NodeEvent`], indexed by discriminant.
#[derive(Debug, Clone, Copy)]
pub struct EventTable {
    handles: [EventHandle; EVENT_COUNT],
}

impl EventTable {
    /// Register every event with the bus.
    pub fn register(bus: &mut impl BusPort) -> Result<Self, BusError> {
        let mut handles = [EventHandle(0); EVENT_COUNT];
        for event in NodeEvent::ALL {
            handles[event as usize] = bus.expose_event(event.name())?;
        }
        Ok(Self { handles })
    }

    pub fn handle(&self, event: NodeEvent) -> EventHandle {
        self.handles[event as usize]
    }
}
