//! Log-backed bus adapter.
//!
//! Implements [`BusPort`] by keeping the registered names in fixed
//! registries and writing every fired event and every reply to the logger
//! (UART / USB-CDC in production).  Inbound commands are whatever was
//! queued with [`LogBus::inject`].  A networked bus client implements the
//! same trait.

use heapless::{Deque, Vec};
use log::{debug, info, warn};

use crate::app::commands::BusCommand;
use crate::app::ports::{ActionId, BusError, BusPort, EventHandle, EventSink, PropertyId};

/// Capacity of each name registry.
pub const MAX_NAMES: usize = 16;
/// Inbound commands held between syncs.
pub const INBOX_DEPTH: usize = 8;

type Registry = Vec<&'static str, MAX_NAMES>;

/// Adapter that logs all outbound bus traffic.
#[derive(Default)]
pub struct LogBus {
    properties: Registry,
    actions: Registry,
    events: Registry,
    inbox: Deque<BusCommand, INBOX_DEPTH>,
    syncs: u32,
}

impl LogBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an inbound command.  Hands the command back if the inbox is
    /// full.
    pub fn inject(&mut self, command: BusCommand) -> Result<(), BusCommand> {
        self.inbox.push_back(command)
    }

    pub fn property_name(&self, id: PropertyId) -> Option<&'static str> {
        self.properties.get(usize::from(id.0)).copied()
    }

    pub fn action_name(&self, id: ActionId) -> Option<&'static str> {
        self.actions.get(usize::from(id.0)).copied()
    }

    pub fn event_name(&self, event: EventHandle) -> Option<&'static str> {
        self.events.get(usize::from(event.0)).copied()
    }

    /// Look up a property id by name.
    pub fn property(&self, name: &str) -> Option<PropertyId> {
        position(&self.properties, name).map(PropertyId)
    }

    /// Look up an action id by name.
    pub fn action(&self, name: &str) -> Option<ActionId> {
        position(&self.actions, name).map(ActionId)
    }

    /// Look up an event handle by name.
    pub fn event(&self, name: &str) -> Option<EventHandle> {
        position(&self.events, name).map(EventHandle)
    }

    /// Number of [`BusPort::sync`] calls so far.
    pub fn sync_count(&self) -> u32 {
        self.syncs
    }

    fn describe(&self, command: &BusCommand) -> &'static str {
        let name = match command {
            BusCommand::GetProperty(id) | BusCommand::SetProperty(id, _) => self.property_name(*id),
            BusCommand::InvokeAction(id, _) => self.action_name(*id),
        };
        name.unwrap_or("?")
    }
}

fn position(registry: &Registry, name: &str) -> Option<u8> {
    registry.iter().position(|n| *n == name).map(|i| i as u8)
}

fn register(registry: &mut Registry, name: &'static str) -> Result<u8, BusError> {
    if registry.contains(&name) {
        return Err(BusError::DuplicateName(name));
    }
    let index = registry.len() as u8;
    registry.push(name).map_err(|_| BusError::RegistryFull)?;
    Ok(index)
}

impl EventSink for LogBus {
    fn fire(&mut self, event: EventHandle, arg: Option<i32>) {
        let name = self.event_name(event).unwrap_or("?");
        match arg {
            Some(value) => info!("EVENT | {} | {}", name, value),
            None => info!("EVENT | {}", name),
        }
    }
}

impl BusPort for LogBus {
    fn expose_property(&mut self, name: &'static str) -> Result<PropertyId, BusError> {
        let id = register(&mut self.properties, name).map(PropertyId)?;
        debug!("bus: property '{}' -> {:?}", name, id);
        Ok(id)
    }

    fn expose_action(&mut self, name: &'static str) -> Result<ActionId, BusError> {
        let id = register(&mut self.actions, name).map(ActionId)?;
        debug!("bus: action '{}' -> {:?}", name, id);
        Ok(id)
    }

    fn expose_event(&mut self, name: &'static str) -> Result<EventHandle, BusError> {
        let handle = register(&mut self.events, name).map(EventHandle)?;
        debug!("bus: event '{}' -> {:?}", name, handle);
        Ok(handle)
    }

    fn sync(&mut self) {
        self.syncs = self.syncs.wrapping_add(1);
        if self.inbox.is_full() {
            warn!("bus: inbox full ({} commands pending)", INBOX_DEPTH);
        }
    }

    fn next_command(&mut self) -> Option<BusCommand> {
        self.inbox.pop_front()
    }

    fn respond(&mut self, command: &BusCommand, value: Option<i32>) {
        let name = self.describe(command);
        match value {
            Some(v) => info!("REPLY | {} | {}", name, v),
            None => info!("REPLY | {} | ok", name),
        }
    }
}
