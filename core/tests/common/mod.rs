#![allow(dead_code)]

use std::collections::VecDeque;

use jvs_core::board::{Capabilities, IoBoard};
use jvs_core::protocol::{JvsError, Transport};

/// In-memory bus: queued request bytes on the read side, captured response
/// bytes on the write side, and a recorded sense-line level.
pub struct MockBus {
    input: VecDeque<u8>,
    pub output: Vec<u8>,
    pub sense: bool,
}

impl MockBus {
    pub fn new() -> Self {
        Self {
            input: VecDeque::new(),
            output: Vec::new(),
            sense: false,
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied());
    }

    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }
}

impl Transport for MockBus {
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, JvsError> {
        if self.input.is_empty() {
            return Err(JvsError::Timeout);
        }
        let mut count = 0;
        while count < buf.len() {
            match self.input.pop_front() {
                Some(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }

    fn write_bytes(&mut self, buf: &[u8]) -> Result<usize, JvsError> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn set_sense(&mut self, asserted: bool) {
        self.sense = asserted;
    }
}

/// The minimal board the end-to-end scenarios run against:
/// 1 player, 8 switches, 1 coin slot, 2 analog channels at 10 bits.
pub fn minimal_board() -> IoBoard {
    IoBoard::new(Capabilities {
        display_name: "Test Board".to_string(),
        name: "JVS EMULATOR;Test I/O;Ver1.00".to_string(),
        players: 1,
        switches: 8,
        coins: 1,
        analogue_in_channels: 2,
        analogue_in_bits: 10,
        ..Capabilities::default()
    })
}
