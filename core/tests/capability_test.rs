mod common;

use common::MockBus;
use jvs_core::board::{Capabilities, IoBoard};
use jvs_core::protocol::Engine;

// ==========================================================================
// Capability report over the wire
// ==========================================================================

fn capability_payload(caps: Capabilities) -> Vec<u8> {
    let mut engine = Engine::new(IoBoard::new(caps));
    let mut bus = MockBus::new();

    // Assign address 1, then ask for capabilities.
    bus.feed(&[0xE0, 0xFF, 0x03, 0xF1, 0x01, 0xF4]);
    engine.process_packet(&mut bus).unwrap();
    bus.take_output();

    bus.feed(&[0xE0, 0x01, 0x02, 0x14, 0x17]);
    engine.process_packet(&mut bus).unwrap();
    let output = bus.take_output();

    // Strip SYNC, destination, length; drop the trailing checksum.
    output[3..output.len() - 1].to_vec()
}

#[test]
fn report_contains_one_record_per_feature_then_terminator() {
    let payload = capability_payload(Capabilities {
        players: 2,
        switches: 12,
        coins: 2,
        analogue_in_channels: 8,
        analogue_in_bits: 10,
        rotary_channels: 4,
        gun_channels: 1,
        gun_x_bits: 16,
        gun_y_bits: 16,
        general_purpose_outputs: 6,
        ..Capabilities::default()
    });

    // status, report, then the records.
    assert_eq!(&payload[..2], &[0x01, 0x01]);
    let records = &payload[2..];

    // Six features, four bytes each, then CAP_END.
    assert_eq!(records.len(), 6 * 4 + 1);
    assert_eq!(records[records.len() - 1], 0x00);

    let records: Vec<&[u8]> = records[..records.len() - 1].chunks(4).collect();
    assert_eq!(records[0], &[0x01, 2, 12, 0]);
    assert_eq!(records[1], &[0x02, 2, 0, 0]);
    assert_eq!(records[2], &[0x03, 8, 10, 0]);
    assert_eq!(records[3], &[0x04, 4, 0, 0]);
    assert_eq!(records[4], &[0x06, 16, 16, 1]);
    assert_eq!(records[5], &[0x12, 6, 0, 0]);

    // Each advertised feature appears exactly once.
    let tags: Vec<u8> = records.iter().map(|r| r[0]).collect();
    let mut deduped = tags.clone();
    deduped.dedup();
    assert_eq!(tags, deduped);
}

#[test]
fn empty_board_reports_only_the_terminator() {
    let payload = capability_payload(Capabilities::default());
    assert_eq!(payload, vec![0x01, 0x01, 0x00]);
}
