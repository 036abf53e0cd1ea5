//! End-to-end behaviour of the control loop on a simulated board.

use homenode::adapters::sim::ServoCall;
use homenode::app::commands::{LightId, ServoId};
use homenode::app::events::NodeEvent;
use homenode::app::ports::PinMode;
use homenode::config::NodeConfig;
use homenode::error::Error;
use homenode::pins;
use homenode::scheduler::Scheduler;

use crate::mock_hw::{Node, RecordingBus};

// Raw panel readings for a press near the middle, and the packed
// position they decode to (x = 127, y = 142).
const Y_MID: u16 = 500;
const X_MID: u16 = 550;
const MID_PACKED: i32 = (127 << 8) | 142;

// ── Construction ──────────────────────────────────────────────

#[test]
fn registers_full_remote_surface() {
    let node = Node::new();
    assert_eq!(
        node.bus.events,
        [
            "pir_bog",
            "pir_stairs",
            "pir_room",
            "touch_down",
            "touch_move",
            "touch_up",
            "door_opened",
            "door_closed",
            "door_handle_touched",
        ]
    );
    assert_eq!(node.bus.properties.len(), 6);
    assert_eq!(node.bus.actions, ["light_room_force", "light_desk_force", "is_door_open"]);
}

#[test]
fn components_are_wired_to_board_pins_and_bus_handles() {
    let node = Node::new();
    let s = &node.scheduler;
    assert_eq!(s.pir_bog().pin(), pins::PIR_BOG);
    assert_eq!(s.pir_stairs().pin(), pins::PIR_STAIRS);
    assert_eq!(s.pir_room().pin(), pins::PIR_ROOM);

    for event in NodeEvent::ALL {
        let handle = s.events().handle(event);
        assert_eq!(node.bus.events[usize::from(handle.0)], event.name());
    }
}

#[test]
fn touch_panel_idles_in_y_role_on_its_own_pads() {
    let node = Node::new();
    assert_eq!(node.hw.mode(pins::TOUCH_X1.pin), Some(PinMode::Output));
    assert_eq!(node.hw.output(pins::TOUCH_X1.pin), Some(true));
    assert_eq!(node.hw.mode(pins::TOUCH_X2.pin), Some(PinMode::Output));
    assert_eq!(node.hw.output(pins::TOUCH_X2.pin), Some(false));
    assert_eq!(node.hw.mode(pins::TOUCH_Y1.pin), Some(PinMode::InputPullup));
    assert_eq!(node.hw.mode(pins::TOUCH_Y2.pin), Some(PinMode::InputPullup));

    // Role switching leaves the light and PIR pads alone.
    assert_eq!(node.hw.mode(pins::LIGHTS_ROOM), Some(PinMode::Output));
    assert_eq!(node.hw.mode(pins::LIGHTS_DESK), Some(PinMode::Output));
    assert_eq!(node.hw.mode(pins::PIR_STAIRS), Some(PinMode::Input));
}

#[test]
fn invalid_config_is_rejected_before_registration() {
    let mut hw = homenode::adapters::sim::SimHardware::new();
    let mut bus = RecordingBus::new();
    let config = NodeConfig {
        touch_resend_ms: 0,
        ..NodeConfig::default()
    };
    let result = Scheduler::new(&config, &mut hw, &mut bus);
    assert!(matches!(result, Err(Error::Config(_))));
    assert!(bus.events.is_empty());
}

#[test]
fn quiet_board_fires_nothing() {
    let mut node = Node::new();
    node.hw.set_millis(10_000);
    node.run_for(2_000, 20);
    assert!(node.bus.fired.is_empty(), "unexpected: {:?}", node.bus.fired);
    assert!(node.scheduler.tick_count() > 10);
    assert_eq!(u64::from(node.bus.syncs), node.scheduler.tick_count());
}

// ── Ordering ──────────────────────────────────────────────────

#[test]
fn components_run_in_fixed_order() {
    let mut node = Node::new();
    node.hw.set_millis(10_000);
    node.hw.set_input(pins::PIR_BOG, false);
    node.hw.set_input(pins::PIR_STAIRS, true);
    node.hw.set_input(pins::PIR_ROOM, true);
    node.press(Y_MID, X_MID);
    node.hw.set_input(pins::DOOR_MAGSWITCH, true);

    node.tick();

    assert_eq!(
        node.bus.fired_names(),
        ["pir_bog", "pir_stairs", "pir_room", "touch_down", "touch_move", "door_opened"]
    );
}

// ── Lights ────────────────────────────────────────────────────

#[test]
fn boot_fade_restarts_after_connect() {
    let mut node = Node::new();
    node.hw.set_millis(5_000);
    node.start();
    assert!(node.scheduler.light(LightId::Room).is_fading());

    node.hw.set_millis(5_500);
    node.tick();
    assert_eq!(node.hw.pwm(pins::LIGHTS_ROOM), Some(127));
    assert_eq!(node.hw.pwm(pins::LIGHTS_DESK), Some(127));

    node.hw.set_millis(6_000);
    node.tick();
    assert_eq!(node.hw.pwm(pins::LIGHTS_ROOM), Some(255));
    assert!(!node.scheduler.light(LightId::Room).is_fading());
}

#[test]
fn start_services_bus_before_fade() {
    let mut node = Node::new();
    node.bus.get("light_room");
    node.start();
    assert_eq!(node.bus.syncs, 1);
    assert_eq!(node.bus.last_response(), Some(255));
}

// ── Motion ────────────────────────────────────────────────────

#[test]
fn held_motion_fires_once_per_period() {
    let mut node = Node::new();
    node.hw.set_millis(10_000);
    node.hw.set_input(pins::PIR_ROOM, true);
    node.run_for(12_000, 100);
    // Fires at 10s, then strictly after 15s and 20s.
    assert_eq!(node.bus.count("pir_room"), 3);
    assert_eq!(node.bus.count("pir_stairs"), 0);
}

#[test]
fn servo_command_masks_stairs_sensor() {
    let mut node = Node::new();
    node.hw.set_millis(10_000);
    node.bus.set("light_bog", 1);
    node.tick();

    assert!(node.hw.servo_attached(pins::SERVO_BOG));
    assert!(node.hw.servo_calls().contains(&ServoCall::Write(pins::SERVO_BOG, 120)));
    assert_eq!(node.scheduler.pir_stairs().last_fired(), 10_000);

    // The servo current makes the stairs PIR read active.
    node.hw.set_input(pins::PIR_STAIRS, true);
    node.run_for(4_000, 50);
    assert_eq!(node.bus.count("pir_stairs"), 0);

    // Powered down long before, state retained.
    assert!(!node.hw.servo_attached(pins::SERVO_BOG));
    assert_eq!(node.hw.output(pins::SERVO_BOG), Some(false));
    assert!(node.scheduler.servo(ServoId::Bog).get());

    node.run_for(1_200, 50);
    assert_eq!(node.bus.count("pir_stairs"), 1);
}

// ── Touch ─────────────────────────────────────────────────────

#[test]
fn press_drag_release_sequence() {
    let mut node = Node::new();
    node.hw.set_millis(10_000);
    node.press(Y_MID, X_MID);
    node.run_for(1_000, 10);

    assert_eq!(node.bus.count("touch_down"), 1);
    let moves = node.bus.count("touch_move");
    assert!((5..=11).contains(&moves), "{moves} moves in one second");
    assert_eq!(node.bus.fired[0], ("touch_down", Some(MID_PACKED)));

    node.release();
    node.tick();
    assert_eq!(node.bus.fired.last(), Some(&("touch_up", Some(MID_PACKED))));
    assert!(!node.scheduler.touch().is_down());
}

#[test]
fn touch_blocks_loop_only_while_pressed() {
    let mut node = Node::new();
    let idle_start = node.hw.blocked_us();
    node.tick();
    let idle_cost = node.hw.blocked_us() - idle_start;

    node.press(Y_MID, X_MID);
    let pressed_start = node.hw.blocked_us();
    node.tick();
    let pressed_cost = node.hw.blocked_us() - pressed_start;

    // Two settle delays on top of the door probe.
    assert!(pressed_cost >= idle_cost + 20_000);
}

// ── Door ──────────────────────────────────────────────────────

#[test]
fn door_cycle_reports_each_edge_once() {
    let mut node = Node::new();
    node.hw.set_millis(1_000);
    node.tick();

    node.hw.set_input(pins::DOOR_MAGSWITCH, true);
    node.run_for(100, 10);
    assert!(node.scheduler.door().is_open());

    node.hw.set_input(pins::DOOR_MAGSWITCH, false);
    node.run_for(100, 10);

    assert_eq!(node.bus.fired_names(), ["door_opened", "door_closed"]);
}

#[test]
fn held_handle_fires_once_then_again_after_release() {
    let mut node = Node::new();
    node.hw.set_millis(1_000);
    node.run_for(50, 5);

    node.hw.set_rise_time(pins::DOOR_HANDLE, 300);
    node.run_for(500, 5);
    assert_eq!(node.bus.count("door_handle_touched"), 1);

    // Let go long enough for the average to settle back down.
    node.hw.set_rise_time(pins::DOOR_HANDLE, crate::mock_hw::HANDLE_IDLE_US);
    node.run_for(500, 5);
    assert_eq!(node.bus.count("door_handle_touched"), 1);

    node.hw.set_rise_time(pins::DOOR_HANDLE, 300);
    node.run_for(50, 5);
    assert_eq!(node.bus.count("door_handle_touched"), 2);
}
