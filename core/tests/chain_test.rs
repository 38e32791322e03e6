mod common;

use common::{MockBus, minimal_board};
use jvs_core::protocol::Engine;

// ==========================================================================
// Daisy-chain address assignment (broadcast, head-first)
// ==========================================================================

fn assign(engine: &mut Engine, bus: &mut MockBus, address: u8) {
    let checksum = 0xFFu8
        .wrapping_add(0x03)
        .wrapping_add(0xF1)
        .wrapping_add(address);
    bus.feed(&[0xE0, 0xFF, 0x03, 0xF1, address, checksum]);
    engine.process_packet(bus).unwrap();
    bus.take_output();
}

#[test]
fn chain_assignment_is_head_first_and_sense_follows_head() {
    let mut head = minimal_board();
    head.chain(minimal_board());
    head.chain(minimal_board());
    let mut engine = Engine::new(head);
    let mut bus = MockBus::new();

    assign(&mut engine, &mut bus, 0x01);
    // Exactly one board assigned, and it is the head.
    assert_eq!(engine.head().device_id(), Some(0x01));
    assert!(engine.head().next().unwrap().device_id().is_none());
    assert!(bus.sense);

    assign(&mut engine, &mut bus, 0x02);
    assign(&mut engine, &mut bus, 0x03);
    let second = engine.head().next().unwrap();
    let third = second.next().unwrap();
    assert_eq!(second.device_id(), Some(0x02));
    assert_eq!(third.device_id(), Some(0x03));
}

#[test]
fn reset_clears_the_whole_chain_and_drops_sense() {
    let mut head = minimal_board();
    head.chain(minimal_board());
    let mut engine = Engine::new(head);
    let mut bus = MockBus::new();

    assign(&mut engine, &mut bus, 0x01);
    assign(&mut engine, &mut bus, 0x02);
    assert!(bus.sense);

    bus.feed(&[0xE0, 0xFF, 0x03, 0xF0, 0xD9, 0xCB]);
    engine.process_packet(&mut bus).unwrap();
    assert!(!bus.sense);
    assert!(engine.head().device_id().is_none());
    assert!(engine.head().next().unwrap().device_id().is_none());
}

#[test]
fn addressed_commands_reach_the_chained_board() {
    let mut head = minimal_board();
    head.chain(minimal_board());
    let mut engine = Engine::new(head);
    let mut bus = MockBus::new();

    assign(&mut engine, &mut bus, 0x01);
    assign(&mut engine, &mut bus, 0x02);

    // Hold a switch on the second board only.
    let second_state = engine.head().next().unwrap().state();
    second_state.set_switch_word(1, 0x8000);

    // READ_SWITCHES addressed to board 2: 02 + 04 + 20 + 01 + 02 = 0x29.
    bus.feed(&[0xE0, 0x02, 0x04, 0x20, 0x01, 0x02, 0x29]);
    engine.process_packet(&mut bus).unwrap();
    let output = bus.take_output();
    assert_eq!(&output[3..8], &[0x01, 0x01, 0x00, 0x80, 0x00]);

    // The head's switches stay untouched.
    assert_eq!(engine.head().state().switch_word(1), 0x0000);
}
