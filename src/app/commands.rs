//! Inbound commands from the remote control bus.
//!
//! The bus client turns remote get/set/invoke requests into
//! [`BusCommand`]s.  The [`Scheduler`](crate::scheduler::Scheduler) maps
//! each registered id back to a [`PropertyBinding`] or [`ActionBinding`]
//! and applies it to the component that owns the state.

use super::ports::{ActionId, PropertyId};

/// A remote request waiting to be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusCommand {
    /// Read a property's current value.
    GetProperty(PropertyId),
    /// Write a property.
    SetProperty(PropertyId, i32),
    /// Invoke an action with zero or one argument.
    InvokeAction(ActionId, Option<i32>),
}

/// Which fading light a binding addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightId {
    Room,
    Desk,
}

/// Which servo switch a binding addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServoId {
    Bog,
    Attic,
}

/// What a remote property reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyBinding {
    /// Get = target brightness, set = fade to a new target.
    LightLevel(LightId),
    /// Live-tunable fade duration in milliseconds.
    LightFadeDuration(LightId),
    /// Logical on/off state of a servo switch.
    ServoState(ServoId),
}

impl PropertyBinding {
    /// Every property the node exposes, in registration order.
    pub const ALL: [Self; 6] = [
        Self::LightLevel(LightId::Room),
        Self::LightLevel(LightId::Desk),
        Self::LightFadeDuration(LightId::Room),
        Self::LightFadeDuration(LightId::Desk),
        Self::ServoState(ServoId::Bog),
        Self::ServoState(ServoId::Attic),
    ];

    /// Bus name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::LightLevel(LightId::Room) => "light_room",
            Self::LightLevel(LightId::Desk) => "light_desk",
            Self::LightFadeDuration(LightId::Room) => "light_room_fade_duration",
            Self::LightFadeDuration(LightId::Desk) => "light_desk_fade_duration",
            Self::ServoState(ServoId::Bog) => "light_bog",
            Self::ServoState(ServoId::Attic) => "light_attic",
        }
    }
}

/// What a remote action does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionBinding {
    /// Jump a light straight to the argument, skipping the fade.
    LightForce(LightId),
    /// Returns 1 while the door is open, 0 otherwise.
    IsDoorOpen,
}

impl ActionBinding {
    /// Every action the node exposes, in registration order.
    pub const ALL: [Self; 3] = [
        Self::LightForce(LightId::Room),
        Self::LightForce(LightId::Desk),
        Self::IsDoorOpen,
    ];

    /// Bus name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::LightForce(LightId::Room) => "light_room_force",
            Self::LightForce(LightId::Desk) => "light_desk_force",
            Self::IsDoorOpen => "is_door_open",
        }
    }
}
