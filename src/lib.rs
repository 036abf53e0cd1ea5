//! Homenode firmware library.
//!
//! Exposes the control core for integration testing.  All ESP-IDF-specific
//! code is guarded by `#[cfg(target_os = "espidf")]` within each module;
//! on the host the board is replaced by [`adapters::sim::SimHardware`].

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod pins;
pub mod scheduler;

pub mod adapters;
pub mod drivers;
pub mod sensors;
