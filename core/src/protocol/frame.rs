//! Byte-level framing: escaping, checksums and the receive phase machine.
//!
//! Framing is self-resynchronising: a SYNC byte unconditionally restarts the
//! phase machine, so the reader recovers from any amount of line noise as
//! soon as the next frame starts.

use super::packet::{ESCAPE, MAX_PACKET_SIZE, Packet, SYNC};
use super::JvsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Waiting for the first SYNC; everything else is line noise.
    Idle,
    Destination,
    Length,
    /// Streaming payload bytes, then the checksum byte.
    Payload,
}

/// Incremental frame decoder. Feed it received bytes one at a time; it hands
/// back a [`Packet`] once a complete, checksum-valid frame has been seen.
#[derive(Debug)]
pub struct Deframer {
    phase: Phase,
    escape: bool,
    destination: u8,
    length: u8,
    checksum: u8,
    data: Vec<u8>,
}

impl Deframer {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            escape: false,
            destination: 0,
            length: 0,
            checksum: 0,
            data: Vec::new(),
        }
    }

    /// Process one received byte.
    ///
    /// Returns `Ok(Some(packet))` when the byte completes a valid frame,
    /// `Ok(None)` while a frame is still in progress (or the byte was
    /// pre-SYNC noise), and `Err(JvsError::Checksum)` when the final byte
    /// contradicts the running sum.
    pub fn push(&mut self, byte: u8) -> Result<Option<Packet>, JvsError> {
        // SYNC restarts reception no matter what state we are in.
        if !self.escape && byte == SYNC {
            self.phase = Phase::Destination;
            self.data.clear();
            return Ok(None);
        }

        if self.phase == Phase::Idle {
            // Junk between frames is silently skipped.
            return Ok(None);
        }

        if !self.escape && byte == ESCAPE {
            self.escape = true;
            return Ok(None);
        }

        let byte = if self.escape {
            self.escape = false;
            byte.wrapping_add(1)
        } else {
            byte
        };

        match self.phase {
            Phase::Idle => unreachable!(),
            Phase::Destination => {
                self.destination = byte;
                self.checksum = byte;
                self.phase = Phase::Length;
            }
            Phase::Length => {
                self.length = byte;
                self.checksum = self.checksum.wrapping_add(byte);
                self.phase = Phase::Payload;
            }
            Phase::Payload => {
                if self.length >= 1 && self.data.len() == self.length as usize - 1 {
                    // All payload collected; this byte is the checksum.
                    let expected = self.checksum;
                    self.phase = Phase::Idle;
                    if expected != byte {
                        self.data.clear();
                        return Err(JvsError::Checksum);
                    }
                    let packet = Packet {
                        destination: self.destination,
                        data: std::mem::take(&mut self.data),
                    };
                    return Ok(Some(packet));
                }
                self.data.push(byte);
                self.checksum = self.checksum.wrapping_add(byte);
            }
        }

        Ok(None)
    }
}

impl Default for Deframer {
    fn default() -> Self {
        Self::new()
    }
}

/// Append a byte to `out`, escaping SYNC/ESCAPE values.
fn push_escaped(out: &mut Vec<u8>, byte: u8) {
    if byte == SYNC || byte == ESCAPE {
        out.push(ESCAPE);
        out.push(byte.wrapping_sub(1));
    } else {
        out.push(byte);
    }
}

/// Frame a packet for transmission: SYNC, then destination, length byte,
/// payload and checksum, each escaped. The checksum sums the pre-escape
/// values.
pub fn frame(packet: &Packet) -> Result<Vec<u8>, JvsError> {
    if packet.data.len() + 1 > MAX_PACKET_SIZE {
        return Err(JvsError::BufferOverflow);
    }

    // Worst case every body byte is escaped, plus the SYNC.
    let mut out = Vec::with_capacity(2 * (packet.data.len() + 3) + 1);
    out.push(SYNC);
    push_escaped(&mut out, packet.destination);
    push_escaped(&mut out, packet.length_byte());
    for &byte in &packet.data {
        push_escaped(&mut out, byte);
    }
    push_escaped(&mut out, packet.checksum());

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::packet::{BROADCAST, BUS_MASTER};

    fn deframe_all(bytes: &[u8]) -> Vec<Packet> {
        let mut deframer = Deframer::new();
        let mut packets = Vec::new();
        for &b in bytes {
            if let Ok(Some(p)) = deframer.push(b) {
                packets.push(p);
            }
        }
        packets
    }

    #[test]
    fn decodes_reset_request() {
        let packets = deframe_all(&[0xE0, 0xFF, 0x03, 0xF0, 0xD9, 0xCB]);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].destination, BROADCAST);
        assert_eq!(packets[0].data, vec![0xF0, 0xD9]);
    }

    #[test]
    fn junk_before_sync_is_skipped() {
        let packets = deframe_all(&[0x12, 0x34, 0xD0, 0xE0, 0xFF, 0x03, 0xF0, 0xD9, 0xCB]);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].data, vec![0xF0, 0xD9]);
    }

    #[test]
    fn escaped_bytes_are_restored() {
        // Payload containing 0xE0 and 0xD0 goes out as ESCAPE, value - 1.
        let packet = Packet::with_data(0x01, &[0xE0, 0xD0]);
        let framed = frame(&packet).unwrap();
        assert_eq!(
            framed,
            vec![0xE0, 0x01, 0x03, 0xD0, 0xDF, 0xD0, 0xCF, packet.checksum()]
        );

        let decoded = deframe_all(&framed);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0], packet);
    }

    #[test]
    fn escaped_checksum_round_trips() {
        // Destination 0x00, payload picked so the sum lands on ESCAPE (0xD0):
        // 00 + 02 + CE = D0.
        let packet = Packet::with_data(BUS_MASTER, &[0xCE]);
        assert_eq!(packet.checksum(), 0xD0);
        let framed = frame(&packet).unwrap();
        assert_eq!(framed[framed.len() - 2..], [0xD0, 0xCF]);

        let decoded = deframe_all(&framed);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0], packet);
    }

    #[test]
    fn checksum_mismatch_is_reported() {
        let mut deframer = Deframer::new();
        let mut result = Ok(None);
        for &b in &[0xE0, 0xFF, 0x03, 0xF0, 0xD9, 0xCC] {
            result = deframer.push(b);
        }
        assert_eq!(result, Err(JvsError::Checksum));
    }

    #[test]
    fn sync_mid_frame_restarts_reception() {
        // A truncated frame followed by a complete one: only the second
        // survives.
        let packets = deframe_all(&[0xE0, 0x01, 0x05, 0x20, 0xE0, 0xFF, 0x03, 0xF0, 0xD9, 0xCB]);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].data, vec![0xF0, 0xD9]);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let packet = Packet::with_data(0x01, &[0u8; MAX_PACKET_SIZE]);
        assert_eq!(frame(&packet), Err(JvsError::BufferOverflow));
    }
}
