//! Application boundary: port traits and the messages that cross them.
//!
//! Nothing in here touches hardware.  Components and the scheduler
//! depend only on these definitions, so every adapter (ESP-IDF peripherals,
//! the logging bus, test doubles) is interchangeable.

pub mod commands;
pub mod events;
pub mod ports;
