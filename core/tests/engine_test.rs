mod common;

use common::{MockBus, minimal_board};
use jvs_core::board::state::COIN_MAX;
use jvs_core::protocol::{Engine, JvsError};

// ==========================================================================
// S1: Reset + address assignment
// ==========================================================================

#[test]
fn s1_reset_then_assign_address() {
    let mut bus = MockBus::new();
    let mut engine = Engine::new(minimal_board());

    // Broadcast RESET: no response, addresses cleared, sense deasserted.
    bus.feed(&[0xE0, 0xFF, 0x03, 0xF0, 0xD9, 0xCB]);
    engine.process_packet(&mut bus).unwrap();
    assert!(bus.take_output().is_empty());
    assert!(!bus.sense);
    assert!(engine.head().device_id().is_none());

    // Broadcast ASSIGN_ADDR 0x01.
    bus.feed(&[0xE0, 0xFF, 0x03, 0xF1, 0x01, 0xF4]);
    engine.process_packet(&mut bus).unwrap();
    assert_eq!(bus.take_output(), vec![0xE0, 0x00, 0x03, 0x01, 0x01, 0x05]);
    assert_eq!(engine.head().device_id(), Some(0x01));
    assert!(bus.sense);
}

// ==========================================================================
// S2: Identity query
// ==========================================================================

fn addressed_engine() -> (Engine, MockBus) {
    let mut bus = MockBus::new();
    let mut engine = Engine::new(minimal_board());
    bus.feed(&[0xE0, 0xFF, 0x03, 0xF0, 0xD9, 0xCB]);
    engine.process_packet(&mut bus).unwrap();
    bus.feed(&[0xE0, 0xFF, 0x03, 0xF1, 0x01, 0xF4]);
    engine.process_packet(&mut bus).unwrap();
    bus.take_output();
    (engine, bus)
}

#[test]
fn s2_id_query_returns_nul_terminated_name() {
    let (mut engine, mut bus) = addressed_engine();

    bus.feed(&[0xE0, 0x01, 0x02, 0x10, 0x13]);
    engine.process_packet(&mut bus).unwrap();
    let output = bus.take_output();

    let name = engine.head().capabilities().name.clone();
    let mut expected_data = vec![0x01, 0x01];
    expected_data.extend_from_slice(name.as_bytes());
    expected_data.push(0x00);

    assert_eq!(output[0], 0xE0);
    assert_eq!(output[1], 0x00);
    assert_eq!(output[2] as usize, expected_data.len() + 1);
    assert_eq!(&output[3..3 + expected_data.len()], &expected_data[..]);

    // Nothing in this response needs escaping except the frame marker.
    for &b in &output[1..] {
        assert_ne!(b, 0xE0);
        assert_ne!(b, 0xD0);
    }
}

// ==========================================================================
// S3: Switch read with a button held
// ==========================================================================

#[test]
fn s3_read_switches_packs_msb_first() {
    let (mut engine, mut bus) = addressed_engine();
    let state = engine.head().state();
    state.set_switch_word(0, 0x0080); // test button
    state.set_switch_word(1, 0x8000); // player 1 start

    bus.feed(&[0xE0, 0x01, 0x04, 0x20, 0x01, 0x02, 0x28]);
    engine.process_packet(&mut bus).unwrap();

    // Status, report, system byte, player 1 high byte, player 1 low byte.
    let expected_data = [0x01, 0x01, 0x80, 0x80, 0x00];
    let checksum: u8 = expected_data
        .iter()
        .fold(0x06u8, |sum, &b| sum.wrapping_add(b));
    let mut expected = vec![0xE0, 0x00, 0x06];
    expected.extend_from_slice(&expected_data);
    expected.push(checksum);
    assert_eq!(bus.take_output(), expected);
}

// ==========================================================================
// S4: Analog read, left-aligned
// ==========================================================================

#[test]
fn s4_analog_read_left_aligns_ten_bit_values() {
    let (mut engine, mut bus) = addressed_engine();
    // Raw event value 256 on a 0..1023 axis: a quarter of full scale,
    // stored as 256 and left-aligned by six rest bits to 0x4000.
    engine.head().state().set_analog(0, 256.0 / 1023.0);

    bus.feed(&[0xE0, 0x01, 0x03, 0x22, 0x01, 0x27]);
    engine.process_packet(&mut bus).unwrap();

    let output = bus.take_output();
    assert_eq!(&output[..3], &[0xE0, 0x00, 0x05]);
    assert_eq!(&output[3..7], &[0x01, 0x01, 0x40, 0x00]);
}

// ==========================================================================
// S5: Coin saturation and read-back masking
// ==========================================================================

#[test]
fn s5_write_coins_saturates_at_fourteen_bits() {
    let (mut engine, mut bus) = addressed_engine();
    engine.head().state().set_coin_count(0, 16380);

    // WRITE_COINS slot 1, amount 100: clamps to the 16383 ceiling.
    bus.feed(&[0xE0, 0x01, 0x06, 0x35, 0x01, 0x00, 0x64, 0xA1]);
    engine.process_packet(&mut bus).unwrap();
    bus.take_output();
    assert_eq!(engine.head().state().coin_count(0), COIN_MAX);

    // READ_COINS: high byte masked to the 14-bit data field.
    bus.feed(&[0xE0, 0x01, 0x03, 0x21, 0x01, 0x26]);
    engine.process_packet(&mut bus).unwrap();
    let output = bus.take_output();
    assert_eq!(&output[3..7], &[0x01, 0x01, 0x3F, 0xFF]);
}

// ==========================================================================
// S6: Retransmission
// ==========================================================================

#[test]
fn s6_retransmit_repeats_previous_response_byte_for_byte() {
    let (mut engine, mut bus) = addressed_engine();

    bus.feed(&[0xE0, 0x01, 0x02, 0x10, 0x13]);
    engine.process_packet(&mut bus).unwrap();
    let first = bus.take_output();

    bus.feed(&[0xE0, 0x01, 0x02, 0x2F, 0x32]);
    engine.process_packet(&mut bus).unwrap();
    assert_eq!(bus.take_output(), first);

    // And again: the cache survives repeated retransmission.
    bus.feed(&[0xE0, 0x01, 0x02, 0x2F, 0x32]);
    engine.process_packet(&mut bus).unwrap();
    assert_eq!(bus.take_output(), first);
}

// ==========================================================================
// Error paths
// ==========================================================================

#[test]
fn timeout_with_no_bytes() {
    let mut bus = MockBus::new();
    let mut engine = Engine::new(minimal_board());
    assert_eq!(engine.process_packet(&mut bus), Err(JvsError::Timeout));
}

#[test]
fn checksum_mismatch_is_rejected() {
    let (mut engine, mut bus) = addressed_engine();
    bus.feed(&[0xE0, 0x01, 0x02, 0x10, 0x14]);
    assert_eq!(engine.process_packet(&mut bus), Err(JvsError::Checksum));
    assert!(bus.take_output().is_empty());
}

#[test]
fn packet_for_another_address_is_dropped() {
    let (mut engine, mut bus) = addressed_engine();
    // Destination 0x05; checksum 05 + 02 + 10 = 17.
    bus.feed(&[0xE0, 0x05, 0x02, 0x10, 0x17]);
    assert_eq!(engine.process_packet(&mut bus), Err(JvsError::NotForUs));
    assert!(bus.take_output().is_empty());
}

#[test]
fn oversized_response_aborts_without_reply() {
    let (mut engine, mut bus) = addressed_engine();
    // Two READ_GPI commands asking for 200 bytes each cannot fit one packet.
    let data = [0x26, 200, 0x26, 200];
    let checksum: u8 = data
        .iter()
        .fold(0x01u8.wrapping_add(5), |sum, &b| sum.wrapping_add(b));
    let mut frame = vec![0xE0, 0x01, 0x05];
    frame.extend_from_slice(&data);
    frame.push(checksum);
    bus.feed(&frame);
    assert_eq!(
        engine.process_packet(&mut bus),
        Err(JvsError::BufferOverflow)
    );
    assert!(bus.take_output().is_empty());
}

// ==========================================================================
// Mixed packets
// ==========================================================================

#[test]
fn multiple_commands_answered_in_one_response() {
    let (mut engine, mut bus) = addressed_engine();
    let state = engine.head().state();
    state.set_switch_word(1, 0x8000);
    state.set_coin_count(0, 3);

    // READ_SWITCHES(1 player, 2 bytes) then READ_COINS(1 slot).
    let data = [0x20, 0x01, 0x02, 0x21, 0x01];
    let checksum: u8 = data
        .iter()
        .fold(0x01u8.wrapping_add(6), |sum, &b| sum.wrapping_add(b));
    let mut frame = vec![0xE0, 0x01, 0x06];
    frame.extend_from_slice(&data);
    frame.push(checksum);
    bus.feed(&frame);
    engine.process_packet(&mut bus).unwrap();

    let output = bus.take_output();
    // status, report, system, p1 hi, p1 lo, report, coin hi, coin lo
    assert_eq!(
        &output[3..11],
        &[0x01, 0x01, 0x00, 0x80, 0x00, 0x01, 0x00, 0x03]
    );
}

#[test]
fn unknown_command_is_skipped_but_rest_are_served() {
    let (mut engine, mut bus) = addressed_engine();

    // 0x05 is not a command we implement; the version query after it must
    // still be answered.
    let data = [0x05, 0x11];
    let checksum: u8 = data
        .iter()
        .fold(0x01u8.wrapping_add(3), |sum, &b| sum.wrapping_add(b));
    let mut frame = vec![0xE0, 0x01, 0x03];
    frame.extend_from_slice(&data);
    frame.push(checksum);
    bus.feed(&frame);
    engine.process_packet(&mut bus).unwrap();

    let output = bus.take_output();
    let command_version = engine.head().capabilities().command_version;
    assert_eq!(&output[3..6], &[0x01, 0x01, command_version]);
}
