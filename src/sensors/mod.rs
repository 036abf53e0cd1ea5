//! Sensor subsystem, one component per physical input.
//!
//! Every sensor owns its pins and private state and exposes a `refresh`
//! that the [`Scheduler`](crate::scheduler::Scheduler) calls once per
//! loop iteration.  Events go out through the
//! [`EventSink`](crate::app::ports::EventSink) handed to `refresh`.

pub mod door;
pub mod motion;
pub mod touch;
