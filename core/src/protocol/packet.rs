//! JVS wire packet representation and framing constants.

/// Start-of-frame marker. Unconditionally restarts the receive phase machine.
pub const SYNC: u8 = 0xE0;
/// Escape marker: the following byte is transmitted as (value - 1).
pub const ESCAPE: u8 = 0xD0;

/// Destination address of request packets sent to every board.
pub const BROADCAST: u8 = 0xFF;
/// Source/destination address of the bus master; all responses go here.
pub const BUS_MASTER: u8 = 0x00;

/// Whole-packet status byte prefixed to every response.
pub const STATUS_SUCCESS: u8 = 0x01;
/// Per-command report byte written by each command handler.
pub const REPORT_SUCCESS: u8 = 0x01;

/// Largest frame body. The length byte counts payload plus checksum, so a
/// packet carries at most `MAX_PACKET_SIZE - 1` payload bytes.
pub const MAX_PACKET_SIZE: usize = 255;

/// A JVS packet between un-framing and framing: destination address plus the
/// raw payload bytes. The length byte and checksum are derived, not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub destination: u8,
    pub data: Vec<u8>,
}

impl Packet {
    pub fn new(destination: u8) -> Self {
        Self {
            destination,
            data: Vec::new(),
        }
    }

    pub fn with_data(destination: u8, data: &[u8]) -> Self {
        Self {
            destination,
            data: data.to_vec(),
        }
    }

    /// The on-wire length byte: payload bytes plus the checksum byte.
    pub fn length_byte(&self) -> u8 {
        (self.data.len() + 1) as u8
    }

    /// 8-bit sum of destination, length byte and payload, before escaping.
    pub fn checksum(&self) -> u8 {
        self.data
            .iter()
            .fold(
                self.destination.wrapping_add(self.length_byte()),
                |sum, &b| sum.wrapping_add(b),
            )
    }
}
