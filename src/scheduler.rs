//! Cooperative control loop.
//!
//! The [`Scheduler`] owns every component and calls each one's `refresh`
//! once per iteration, in a fixed order:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  tick()                                                      │
//! │                                                              │
//! │  1. bus sync ── drain BusCommands ──▶ property/action routing │
//! │  2. light_room, light_desk          (fade step)              │
//! │  3. pir_bog, pir_stairs, pir_room   (motion events)          │
//! │  4. servo_bog, servo_attic          (power-down)             │
//! │  5. touch                           (≤ 2 × settle delay)     │
//! │  6. door                            (≤ probe cap)            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing runs concurrently, so nothing is locked; the price is that any
//! blocking step stalls the whole loop.  Only the touch settle delays and
//! the handle discharge probe block, both bounded by configuration.
//!
//! Remote setters do not call into components through stored callbacks.
//! The bus adapter queues [`BusCommand`]s and the scheduler routes them
//! by the id it got back at registration.

use heapless::LinearMap;
use log::{info, warn};

use crate::app::commands::{ActionBinding, BusCommand, LightId, PropertyBinding, ServoId};
use crate::app::events::{EventTable, NodeEvent};
use crate::app::ports::{ActionId, BusError, BusPort, Hardware, PropertyId};
use crate::config::NodeConfig;
use crate::drivers::light::{LightFader, level_from_remote};
use crate::drivers::servo::ServoSwitch;
use crate::error::Result;
use crate::pins;
use crate::sensors::door::{DoorEvents, DoorMonitor};
use crate::sensors::motion::{MotionDebouncer, Polarity};
use crate::sensors::touch::{TouchEvents, TouchPins, TouchSampler};

/// Property registry capacity.
const MAX_PROPERTIES: usize = 8;
/// Action registry capacity.
const MAX_ACTIONS: usize = 4;
/// Upper bound on inbound commands applied per tick.
const MAX_COMMANDS_PER_TICK: usize = 8;

/// Owns all components and runs them.
pub struct Scheduler {
    events: EventTable,
    properties: LinearMap<PropertyId, PropertyBinding, MAX_PROPERTIES>,
    actions: LinearMap<ActionId, ActionBinding, MAX_ACTIONS>,

    light_room: LightFader,
    light_desk: LightFader,
    pir_bog: MotionDebouncer,
    pir_stairs: MotionDebouncer,
    pir_room: MotionDebouncer,
    servo_bog: ServoSwitch,
    servo_attic: ServoSwitch,
    touch: TouchSampler,
    door: DoorMonitor,

    tick_count: u64,
}

impl Scheduler {
    /// Validate `config`, register the remote surface with `bus`, and bring
    /// up every component.
    ///
    /// Lights start fading in immediately; call [`start`](Self::start) once
    /// the bus is connected to restart that fade.
    pub fn new(
        config: &NodeConfig,
        hw: &mut impl Hardware,
        bus: &mut impl BusPort,
    ) -> Result<Self> {
        config.validate()?;

        let events = EventTable::register(bus)?;

        let mut properties = LinearMap::new();
        for binding in PropertyBinding::ALL {
            let id = bus.expose_property(binding.name())?;
            properties
                .insert(id, binding)
                .map_err(|_| BusError::RegistryFull)?;
        }
        let mut actions = LinearMap::new();
        for binding in ActionBinding::ALL {
            let id = bus.expose_action(binding.name())?;
            actions
                .insert(id, binding)
                .map_err(|_| BusError::RegistryFull)?;
        }

        let light_room = LightFader::new(hw, pins::LIGHTS_ROOM, config.light_fade_ms);
        let light_desk = LightFader::new(hw, pins::LIGHTS_DESK, config.light_fade_ms);

        let pir_period = config.pir_min_period_ms;
        let pir_bog = MotionDebouncer::new(
            hw,
            pins::PIR_BOG,
            Polarity::ActiveLow,
            pir_period,
            events.handle(NodeEvent::PirBog),
        );
        let pir_stairs = MotionDebouncer::new(
            hw,
            pins::PIR_STAIRS,
            Polarity::ActiveHigh,
            pir_period,
            events.handle(NodeEvent::PirStairs),
        );
        let pir_room = MotionDebouncer::new(
            hw,
            pins::PIR_ROOM,
            Polarity::ActiveHigh,
            pir_period,
            events.handle(NodeEvent::PirRoom),
        );

        let servo_bog = ServoSwitch::new(
            hw,
            pins::SERVO_BOG,
            config.servo_bog_angles,
            config.servo_powerdown_ms,
        );
        let servo_attic = ServoSwitch::new(
            hw,
            pins::SERVO_ATTIC,
            config.servo_attic_angles,
            config.servo_powerdown_ms,
        );

        let touch = TouchSampler::new(
            hw,
            TouchPins {
                y1: pins::TOUCH_Y1,
                x2: pins::TOUCH_X2,
                x1: pins::TOUCH_X1,
                y2: pins::TOUCH_Y2,
            },
            config.touch_resend_ms,
            config.touch_settle_ms,
            TouchEvents {
                down: events.handle(NodeEvent::TouchDown),
                moved: events.handle(NodeEvent::TouchMove),
                up: events.handle(NodeEvent::TouchUp),
            },
        );

        let door = DoorMonitor::new(
            hw,
            pins::DOOR_MAGSWITCH,
            pins::DOOR_HANDLE,
            config,
            DoorEvents {
                opened: events.handle(NodeEvent::DoorOpened),
                closed: events.handle(NodeEvent::DoorClosed),
                handle_touched: events.handle(NodeEvent::DoorHandleTouched),
            },
        );

        info!(
            "Scheduler: {} properties, {} actions, {} events registered",
            properties.len(),
            actions.len(),
            NodeEvent::ALL.len()
        );

        Ok(Self {
            events,
            properties,
            actions,
            light_room,
            light_desk,
            pir_bog,
            pir_stairs,
            pir_room,
            servo_bog,
            servo_attic,
            touch,
            door,
            tick_count: 0,
        })
    }

    /// Post-connect step: service the bus once, then restart the boot
    /// fade-in so it is visible from the moment the node is online.
    pub fn start(&mut self, hw: &mut impl Hardware, bus: &mut impl BusPort) {
        self.service_bus(hw, bus);
        let now = hw.now_millis();
        self.light_room.restart_fade(now);
        self.light_desk.restart_fade(now);
        info!("Scheduler: started at {}ms", now);
    }

    /// One loop iteration.
    pub fn tick(&mut self, hw: &mut impl Hardware, bus: &mut impl BusPort) {
        self.tick_count += 1;

        self.service_bus(hw, bus);

        self.light_room.refresh(hw);
        self.light_desk.refresh(hw);

        self.pir_bog.refresh(hw, bus);
        self.pir_stairs.refresh(hw, bus);
        self.pir_room.refresh(hw, bus);

        self.servo_bog.refresh(hw);
        self.servo_attic.refresh(hw);

        self.touch.refresh(hw, bus);
        self.door.refresh(hw, bus);
    }

    /// Run forever.
    pub fn run(&mut self, hw: &mut impl Hardware, bus: &mut impl BusPort) -> ! {
        loop {
            self.tick(hw, bus);
        }
    }

    fn service_bus(&mut self, hw: &mut impl Hardware, bus: &mut impl BusPort) {
        bus.sync();
        for _ in 0..MAX_COMMANDS_PER_TICK {
            let Some(command) = bus.next_command() else {
                break;
            };
            let reply = self.handle_command(command, hw);
            bus.respond(&command, reply);
        }
    }

    // ── Command routing ───────────────────────────────────────

    /// Apply one remote command.  Returns the value to send back, if any.
    pub fn handle_command(&mut self, command: BusCommand, hw: &mut impl Hardware) -> Option<i32> {
        match command {
            BusCommand::GetProperty(id) => match self.properties.get(&id).copied() {
                Some(binding) => Some(self.get_property(binding)),
                None => {
                    warn!("Bus: get on unknown property {:?}", id);
                    None
                }
            },
            BusCommand::SetProperty(id, value) => {
                match self.properties.get(&id).copied() {
                    Some(binding) => self.set_property(binding, value, hw),
                    None => warn!("Bus: set on unknown property {:?}", id),
                }
                None
            }
            BusCommand::InvokeAction(id, arg) => match self.actions.get(&id).copied() {
                Some(binding) => self.invoke_action(binding, arg, hw),
                None => {
                    warn!("Bus: unknown action {:?}", id);
                    None
                }
            },
        }
    }

    fn get_property(&self, binding: PropertyBinding) -> i32 {
        match binding {
            PropertyBinding::LightLevel(id) => i32::from(self.light(id).target()),
            PropertyBinding::LightFadeDuration(id) => {
                i32::try_from(self.light(id).duration_ms()).unwrap_or(i32::MAX)
            }
            PropertyBinding::ServoState(id) => i32::from(self.servo(id).get()),
        }
    }

    fn set_property(&mut self, binding: PropertyBinding, value: i32, hw: &mut impl Hardware) {
        info!("Bus: {} = {}", binding.name(), value);
        match binding {
            PropertyBinding::LightLevel(id) => {
                let now = hw.now_millis();
                self.light_mut(id).set(now, level_from_remote(value));
            }
            PropertyBinding::LightFadeDuration(id) => {
                self.light_mut(id).set_duration_ms(value.max(0) as u32);
            }
            PropertyBinding::ServoState(id) => {
                let servo = match id {
                    ServoId::Bog => &mut self.servo_bog,
                    ServoId::Attic => &mut self.servo_attic,
                };
                servo.set(hw, value != 0, &mut self.pir_stairs);
            }
        }
    }

    fn invoke_action(
        &mut self,
        binding: ActionBinding,
        arg: Option<i32>,
        hw: &mut impl Hardware,
    ) -> Option<i32> {
        match binding {
            ActionBinding::LightForce(id) => {
                match arg {
                    Some(value) => self.light_mut(id).force(hw, level_from_remote(value)),
                    None => warn!("Bus: {} needs an argument", binding.name()),
                }
                None
            }
            ActionBinding::IsDoorOpen => Some(i32::from(self.door.is_open_now(hw))),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn light(&self, id: LightId) -> &LightFader {
        match id {
            LightId::Room => &self.light_room,
            LightId::Desk => &self.light_desk,
        }
    }

    fn light_mut(&mut self, id: LightId) -> &mut LightFader {
        match id {
            LightId::Room => &mut self.light_room,
            LightId::Desk => &mut self.light_desk,
        }
    }

    pub fn servo(&self, id: ServoId) -> &ServoSwitch {
        match id {
            ServoId::Bog => &self.servo_bog,
            ServoId::Attic => &self.servo_attic,
        }
    }

    pub fn pir_bog(&self) -> &MotionDebouncer {
        &self.pir_bog
    }

    pub fn pir_stairs(&self) -> &MotionDebouncer {
        &self.pir_stairs
    }

    pub fn pir_room(&self) -> &MotionDebouncer {
        &self.pir_room
    }

    pub fn touch(&self) -> &TouchSampler {
        &self.touch
    }

    pub fn door(&self) -> &DoorMonitor {
        &self.door
    }

    pub fn events(&self) -> &EventTable {
        &self.events
    }

    /// Loop iterations run so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
