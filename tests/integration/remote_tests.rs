//! Remote properties and actions routed through the scheduler.

use homenode::app::commands::{BusCommand, LightId, ServoId};
use homenode::app::ports::{ActionId, PropertyId};
use homenode::pins;

use crate::mock_hw::Node;

#[test]
fn light_level_get_reports_target_not_output() {
    let mut node = Node::new();
    node.hw.set_millis(2_000);
    node.tick();

    node.bus.set("light_room", 64);
    node.bus.get("light_room");
    node.tick();

    assert_eq!(node.bus.last_response(), Some(64));
    // The fade towards 64 has only just started.
    assert_eq!(node.hw.pwm(pins::LIGHTS_ROOM), Some(255));

    node.hw.advance_ms(1_000);
    node.tick();
    assert_eq!(node.hw.pwm(pins::LIGHTS_ROOM), Some(64));
}

#[test]
fn light_level_is_clamped() {
    let mut node = Node::new();
    node.bus.set("light_desk", 1_000);
    node.bus.get("light_desk");
    node.bus.set("light_room", -20);
    node.bus.get("light_room");
    node.tick();

    let replies: Vec<_> = node.bus.responses.iter().map(|(_, v)| *v).collect();
    assert_eq!(replies, [None, Some(255), None, Some(0)]);
}

#[test]
fn fade_duration_is_live_tunable() {
    let mut node = Node::new();
    node.hw.set_millis(2_000);
    node.tick();

    node.bus.set("light_desk_fade_duration", 0);
    node.bus.set("light_desk", 10);
    node.tick();
    assert_eq!(node.hw.pwm(pins::LIGHTS_DESK), Some(10));
    assert_eq!(node.hw.pwm(pins::LIGHTS_ROOM), Some(255));

    node.bus.set("light_room_fade_duration", -5);
    node.bus.get("light_room_fade_duration");
    node.tick();
    assert_eq!(node.bus.last_response(), Some(0));
    assert_eq!(node.scheduler.light(LightId::Room).duration_ms(), 0);
}

#[test]
fn force_skips_the_fade() {
    let mut node = Node::new();
    node.bus.invoke("light_desk_force", Some(10));
    node.tick();

    assert_eq!(node.hw.pwm(pins::LIGHTS_DESK), Some(10));
    assert!(!node.scheduler.light(LightId::Desk).is_fading());
    assert_eq!(node.bus.last_response(), None);

    // Missing argument is ignored.
    node.bus.invoke("light_desk_force", None);
    node.tick();
    assert_eq!(node.scheduler.light(LightId::Desk).output(), 10);
}

#[test]
fn is_door_open_reads_switch_directly() {
    let mut node = Node::new();
    node.bus.invoke("is_door_open", None);
    node.tick();
    assert_eq!(node.bus.last_response(), Some(0));

    // Answered from the pin before the door component sees the edge.
    node.hw.set_input(pins::DOOR_MAGSWITCH, true);
    node.bus.invoke("is_door_open", None);
    node.tick();
    assert_eq!(node.bus.responses.last().map(|(_, v)| *v), Some(Some(1)));
    assert_eq!(node.bus.count("door_opened"), 1);
}

#[test]
fn servo_state_round_trips() {
    let mut node = Node::new();
    node.bus.set("light_attic", 1);
    node.bus.get("light_attic");
    node.tick();
    assert_eq!(node.bus.last_response(), Some(1));
    assert!(node.scheduler.servo(ServoId::Attic).get());

    node.bus.set("light_attic", 0);
    node.bus.get("light_attic");
    node.tick();
    assert_eq!(node.bus.last_response(), Some(0));
    assert!(node.hw.servo_calls().contains(&homenode::adapters::sim::ServoCall::Write(
        pins::SERVO_ATTIC,
        63
    )));
}

#[test]
fn unknown_ids_get_empty_replies() {
    let mut node = Node::new();
    node.bus.inbox.push_back(BusCommand::GetProperty(PropertyId(99)));
    node.bus.inbox.push_back(BusCommand::SetProperty(PropertyId(99), 1));
    node.bus.inbox.push_back(BusCommand::InvokeAction(ActionId(99), Some(1)));
    node.tick();

    assert_eq!(node.bus.responses.len(), 3);
    assert!(node.bus.responses.iter().all(|(_, v)| v.is_none()));
}

#[test]
fn commands_beyond_per_tick_budget_wait_for_next_tick() {
    let mut node = Node::new();
    for _ in 0..12 {
        node.bus.get("light_room");
    }
    node.tick();
    assert_eq!(node.bus.responses.len(), 8);
    node.tick();
    assert_eq!(node.bus.responses.len(), 12);
}
