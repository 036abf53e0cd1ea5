//! Actuator drivers and peripheral bring-up helpers.

pub mod hw_init;
pub mod light;
pub mod servo;
