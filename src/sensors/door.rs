//! Door reed switch and capacitive door-handle sensor.
//!
//! ## Reed switch
//!
//! A magnet on the door closes the reed switch, pulling the input LOW.
//! Every change of level is reported once as "opened" or "closed".
//!
//! ## Handle
//!
//! The metal handle is wired to a pin through a large resistor.  Each tick
//! the line is pulled to ground, released, and the time it takes to float
//! back HIGH is measured.  A hand on the handle adds capacitance and
//! stretches that time.  There is no absolute threshold: a sample more than
//! `sensitivity` × the running average is a touch.
//!
//! | Sample vs. average       | Average update                    | Candidate touch |
//! |--------------------------|-----------------------------------|-----------------|
//! | `t > avg * sensitivity`  | latched to `t` immediately        | yes             |
//! | otherwise                | `avg += (t - avg) / 2^decay`      | no              |
//!
//! Latching on a spike keeps a long press from firing repeatedly and keeps
//! the spike out of the slow average.  Candidates inside the refractory
//! period are dropped.

use log::{debug, info};

use crate::app::ports::{EventHandle, EventSink, Hardware, Pin, PinMode};
use crate::config::NodeConfig;

/// Running average of handle discharge times with spike latching.
#[derive(Debug, Clone, Copy)]
pub struct HandleFilter {
    avg: u32,
    decay: u8,
    sensitivity: u32,
}

impl HandleFilter {
    pub fn new(seed: u32, decay: u8, sensitivity: u32) -> Self {
        Self {
            avg: seed,
            decay,
            sensitivity,
        }
    }

    /// Feed one discharge time.  Returns `true` if it was a spike.
    pub fn update(&mut self, time: u32) -> bool {
        let avg = u64::from(self.avg);
        let time_wide = u64::from(time);

        if time_wide > avg * u64::from(self.sensitivity) {
            self.avg = time;
            return true;
        }

        let blended = ((avg << self.decay) - avg + time_wide) >> self.decay;
        self.avg = blended.min(u64::from(u32::MAX)) as u32;
        false
    }

    pub fn average(&self) -> u32 {
        self.avg
    }
}

/// Handles for the three door events.
#[derive(Debug, Clone, Copy)]
pub struct DoorEvents {
    pub opened: EventHandle,
    pub closed: EventHandle,
    pub handle_touched: EventHandle,
}

pub struct DoorMonitor {
    magswitch: Pin,
    handle: Pin,
    events: DoorEvents,
    /// Door state as last reported.
    is_open: bool,
    filter: HandleFilter,
    last_handle_touch: u32,
    min_period_ms: u32,
    max_iter: u32,
    discharge_ms: u32,
}

impl DoorMonitor {
    /// Configure both inputs and seed the handle average with one probe.
    ///
    /// The door is assumed closed until the first refresh, so a door that
    /// is open at boot reports "opened" on the first tick.
    pub fn new(
        hw: &mut impl Hardware,
        magswitch: Pin,
        handle: Pin,
        config: &NodeConfig,
        events: DoorEvents,
    ) -> Self {
        hw.set_pin_mode(magswitch, PinMode::InputPullup);
        hw.set_pin_mode(handle, PinMode::Input);
        hw.write_digital(handle, false);

        let mut monitor = Self {
            magswitch,
            handle,
            events,
            is_open: false,
            filter: HandleFilter::new(
                0,
                config.door_handle_avg_decay,
                config.door_handle_sensitivity,
            ),
            last_handle_touch: 0,
            min_period_ms: config.door_handle_min_period_ms,
            max_iter: config.door_handle_max_iter,
            discharge_ms: config.door_handle_discharge_ms,
        };
        let seed = monitor.probe_handle(hw);
        monitor.filter = HandleFilter::new(
            seed,
            config.door_handle_avg_decay,
            config.door_handle_sensitivity,
        );
        info!("door: handle average seeded at {}us", seed);
        monitor
    }

    pub fn refresh(&mut self, hw: &mut impl Hardware, sink: &mut impl EventSink) {
        let open = self.is_open_now(hw);
        if open != self.is_open {
            let event = if open { self.events.opened } else { self.events.closed };
            sink.fire(event, None);
            self.is_open = open;
            info!("door: {}", if open { "opened" } else { "closed" });
        }

        let time = self.probe_handle(hw);
        if self.filter.update(time) {
            let now = hw.now_millis();
            if now.wrapping_sub(self.last_handle_touch) >= self.min_period_ms {
                sink.fire(self.events.handle_touched, None);
                self.last_handle_touch = now;
                debug!("door: handle touched ({}us)", time);
            }
        }
    }

    /// Measure the handle line's discharge time in microseconds.
    ///
    /// Blocks: the line is held low for `discharge_ms`, then polled until it
    /// reads HIGH or `max_iter` polls have been made.  A line that never
    /// rises (disconnected sensor) yields a large time, which the filter
    /// treats as a spike and then adapts to.
    fn probe_handle(&self, hw: &mut impl Hardware) -> u32 {
        hw.set_pin_mode(self.handle, PinMode::Output);
        hw.write_digital(self.handle, false);
        hw.delay_ms(self.discharge_ms);

        hw.set_pin_mode(self.handle, PinMode::Input);
        let start = hw.now_micros();
        let mut polls = 0u32;
        while !hw.read_digital(self.handle) && polls < self.max_iter {
            polls += 1;
        }
        hw.now_micros().wrapping_sub(start)
    }

    /// Read the reed switch directly.  HIGH = magnet away = open.
    pub fn is_open_now(&self, hw: &mut impl Hardware) -> bool {
        hw.read_digital(self.magswitch)
    }

    /// Door state as last reported on the bus.
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn handle_average(&self) -> u32 {
        self.filter.average()
    }
}
