//! Mock bus adapter and board fixture for integration tests.
//!
//! Records every registration, fired event and reply so tests can assert
//! on the full bus history by name rather than by handle.

use std::collections::VecDeque;

use homenode::adapters::sim::SimHardware;
use homenode::app::commands::BusCommand;
use homenode::app::ports::{
    ActionId, BusError, BusPort, ClockPort, EventHandle, EventSink, PropertyId,
};
use homenode::config::NodeConfig;
use homenode::pins;
use homenode::scheduler::Scheduler;

// ── RecordingBus ──────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingBus {
    pub properties: Vec<&'static str>,
    pub actions: Vec<&'static str>,
    pub events: Vec<&'static str>,
    pub fired: Vec<(&'static str, Option<i32>)>,
    pub responses: Vec<(BusCommand, Option<i32>)>,
    pub inbox: VecDeque<BusCommand>,
    pub syncs: u32,
}

#[allow(dead_code)]
impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(&self, name: &str) -> PropertyId {
        let index = self.properties.iter().position(|n| *n == name);
        PropertyId(index.unwrap_or_else(|| panic!("no property '{name}'")) as u8)
    }

    pub fn action(&self, name: &str) -> ActionId {
        let index = self.actions.iter().position(|n| *n == name);
        ActionId(index.unwrap_or_else(|| panic!("no action '{name}'")) as u8)
    }

    /// Queue a property write.
    pub fn set(&mut self, name: &str, value: i32) {
        let id = self.property(name);
        self.inbox.push_back(BusCommand::SetProperty(id, value));
    }

    /// Queue a property read.
    pub fn get(&mut self, name: &str) {
        let id = self.property(name);
        self.inbox.push_back(BusCommand::GetProperty(id));
    }

    /// Queue an action invocation.
    pub fn invoke(&mut self, name: &str, arg: Option<i32>) {
        let id = self.action(name);
        self.inbox.push_back(BusCommand::InvokeAction(id, arg));
    }

    /// Reply to the most recent command.
    pub fn last_response(&self) -> Option<i32> {
        self.responses.last().and_then(|(_, v)| *v)
    }

    pub fn count(&self, event: &str) -> usize {
        self.fired.iter().filter(|(n, _)| *n == event).count()
    }

    pub fn fired_names(&self) -> Vec<&'static str> {
        self.fired.iter().map(|(n, _)| *n).collect()
    }
}

fn register(names: &mut Vec<&'static str>, name: &'static str) -> Result<u8, BusError> {
    if names.contains(&name) {
        return Err(BusError::DuplicateName(name));
    }
    names.push(name);
    Ok((names.len() - 1) as u8)
}

impl EventSink for RecordingBus {
    fn fire(&mut self, event: EventHandle, arg: Option<i32>) {
        let name = self.events.get(usize::from(event.0)).copied().unwrap_or("?");
        self.fired.push((name, arg));
    }
}

impl BusPort for RecordingBus {
    fn expose_property(&mut self, name: &'static str) -> Result<PropertyId, BusError> {
        register(&mut self.properties, name).map(PropertyId)
    }

    fn expose_action(&mut self, name: &'static str) -> Result<ActionId, BusError> {
        register(&mut self.actions, name).map(ActionId)
    }

    fn expose_event(&mut self, name: &'static str) -> Result<EventHandle, BusError> {
        register(&mut self.events, name).map(EventHandle)
    }

    fn sync(&mut self) {
        self.syncs += 1;
    }

    fn next_command(&mut self) -> Option<BusCommand> {
        self.inbox.pop_front()
    }

    fn respond(&mut self, command: &BusCommand, value: Option<i32>) {
        self.responses.push((*command, value));
    }
}

// ── Board fixture ─────────────────────────────────────────────

/// A quiet node: door closed, no motion, panel untouched, handle idle.
pub struct Node {
    pub scheduler: Scheduler,
    pub hw: SimHardware,
    pub bus: RecordingBus,
}

/// Handle line rise time with nobody touching it.
pub const HANDLE_IDLE_US: u32 = 50;

#[allow(dead_code)]
impl Node {
    pub fn new() -> Self {
        Self::with_config(&NodeConfig::default())
    }

    pub fn with_config(config: &NodeConfig) -> Self {
        let mut hw = SimHardware::new();
        hw.set_input(pins::DOOR_MAGSWITCH, false);
        hw.set_input(pins::PIR_BOG, true);
        hw.set_input(pins::PIR_STAIRS, false);
        hw.set_input(pins::PIR_ROOM, false);
        hw.set_rise_time(pins::DOOR_HANDLE, HANDLE_IDLE_US);

        let mut bus = RecordingBus::new();
        let scheduler = Scheduler::new(config, &mut hw, &mut bus).expect("valid node");
        Self { scheduler, hw, bus }
    }

    pub fn tick(&mut self) {
        self.scheduler.tick(&mut self.hw, &mut self.bus);
    }

    pub fn start(&mut self) {
        self.scheduler.start(&mut self.hw, &mut self.bus);
    }

    /// Tick repeatedly, sleeping `step_ms` between ticks, until at least
    /// `duration_ms` of simulated time has passed.
    pub fn run_for(&mut self, duration_ms: u32, step_ms: u32) {
        let start = self.hw.now_millis();
        loop {
            self.tick();
            let now = self.hw.now_millis();
            if now.wrapping_sub(start) >= duration_ms {
                break;
            }
            self.hw.advance_ms(step_ms);
        }
    }

    /// Press the touch panel at the given raw Y/X readings.
    pub fn press(&mut self, y_raw: u16, x_raw: u16) {
        self.hw.set_analog(pins::TOUCH_Y1.channel, y_raw);
        self.hw.set_analog(pins::TOUCH_X1.channel, x_raw);
    }

    pub fn release(&mut self) {
        self.hw.set_analog(pins::TOUCH_Y1.channel, 1023);
        self.hw.set_analog(pins::TOUCH_X1.channel, 1023);
    }
}
