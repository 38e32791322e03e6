//! The JVS protocol engine: reads one request frame, walks the board chain,
//! dispatches each embedded command and writes the framed response.

use log::{debug, trace, warn};

use super::JvsError;
use super::command::*;
use super::frame::{Deframer, frame};
use super::packet::{
    BROADCAST, BUS_MASTER, MAX_PACKET_SIZE, Packet, REPORT_SUCCESS, STATUS_SUCCESS,
};
use super::transport::Transport;
use crate::board::IoBoard;
use crate::board::capabilities::{CAP_END, Capabilities};

/// Consecutive zero-progress writes tolerated before the send fails.
const WRITE_RETRY_COUNT: u32 = 3;

/// Receiver for general-purpose output bytes decoded from CMD_WRITE_GPO.
/// Wheel driver boards carry their force commands on these lines, so the
/// daemon bridges them into the force-feedback engine.
pub trait OutputSink: Send {
    fn write_gpo(&self, data: &[u8]);
}

/// Protocol engine for one chain of emulated boards.
pub struct Engine {
    head: IoBoard,
    output_sink: Option<Box<dyn OutputSink>>,
    /// Response to the previous request, kept verbatim for CMD_RETRANSMIT.
    last_response: Packet,
    packet_counter: u64,
}

impl Engine {
    pub fn new(head: IoBoard) -> Self {
        Self {
            head,
            output_sink: None,
            last_response: Packet::new(BUS_MASTER),
            packet_counter: 0,
        }
    }

    pub fn set_output_sink(&mut self, sink: Box<dyn OutputSink>) {
        self.output_sink = Some(sink);
    }

    pub fn head(&self) -> &IoBoard {
        &self.head
    }

    /// Read, process and answer a single request packet.
    ///
    /// Transport errors and NOT_FOR_US come back to the caller, which logs
    /// and re-enters the loop; SYNC makes the stream self-resynchronising so
    /// no recovery beyond that is needed.
    pub fn process_packet(&mut self, dev: &mut dyn Transport) -> Result<(), JvsError> {
        let request = read_packet(dev)?;
        self.packet_counter += 1;
        trace!(
            "request #{}: dest 0x{:02X}, {} payload byte(s), first {}",
            self.packet_counter,
            request.destination,
            request.data.len(),
            request
                .data
                .first()
                .map_or("none", |&cmd| command_name(cmd)),
        );

        // Packets for other boards on the bus are silently dropped.
        if request.destination != BROADCAST && self.head.find(request.destination).is_none() {
            return Err(JvsError::NotForUs);
        }

        // Re-emit the cached response without recomputing anything.
        if request.data.first() == Some(&CMD_RETRANSMIT) {
            debug!("CMD_RETRANSMIT - resending previous response");
            return write_packet(dev, &self.last_response);
        }

        let board = if request.destination == BROADCAST {
            &mut self.head
        } else {
            self.head
                .find_mut(request.destination)
                .ok_or(JvsError::NotForUs)?
        };

        let response = dispatch(board, &request, dev, self.output_sink.as_deref())?;
        write_packet(dev, &response)?;
        self.last_response = response;
        Ok(())
    }
}

/// Response under construction. Every append verifies the remaining buffer
/// so an oversized reply aborts the request instead of corrupting it.
struct ResponseWriter {
    packet: Packet,
}

impl ResponseWriter {
    fn new() -> Self {
        let mut packet = Packet::new(BUS_MASTER);
        packet.data.push(STATUS_SUCCESS);
        Self { packet }
    }

    fn remaining(&self) -> usize {
        // The length byte counts payload + checksum, so payload is capped
        // one short of the packet size.
        (MAX_PACKET_SIZE - 1) - self.packet.data.len()
    }

    fn push(&mut self, byte: u8) -> Result<(), JvsError> {
        self.extend(&[byte])
    }

    fn extend(&mut self, bytes: &[u8]) -> Result<(), JvsError> {
        if bytes.len() > self.remaining() {
            warn!("response would overflow the packet buffer, aborting request");
            return Err(JvsError::BufferOverflow);
        }
        self.packet.data.extend_from_slice(bytes);
        Ok(())
    }
}

/// Walk the request payload and serve every embedded command.
fn dispatch(
    board: &mut IoBoard,
    request: &Packet,
    dev: &mut dyn Transport,
    sink: Option<&dyn OutputSink>,
) -> Result<Packet, JvsError> {
    let mut response = ResponseWriter::new();
    let mut index = 0;

    while index < request.data.len() {
        let rest = &request.data[index..];
        let arg = |n: usize| rest.get(n).copied().unwrap_or(0);
        let cmd = rest[0];

        // Command-specific sizing drives the walking index.
        let size: usize = match cmd {
            CMD_RESET => {
                debug!("CMD_RESET - resetting all boards");
                board.reset_chain();
                dev.set_sense(false);
                2
            }

            CMD_ASSIGN_ADDR => {
                let id = arg(1);
                if board.assign_address(id) {
                    debug!("CMD_ASSIGN_ADDR - assigned address 0x{id:02X}");
                } else {
                    warn!("CMD_ASSIGN_ADDR - no unassigned board for 0x{id:02X}");
                }
                response.push(REPORT_SUCCESS)?;
                if board.device_id().is_some() {
                    dev.set_sense(true);
                }
                2
            }

            CMD_REQUEST_ID => {
                let caps = board.capabilities();
                debug!("CMD_REQUEST_ID - returning {:?}", caps.name);
                // Truncate to what still fits alongside the report byte and
                // the NUL terminator.
                let available = response.remaining().saturating_sub(2);
                let name = caps.name.as_bytes();
                let name = &name[..name.len().min(100).min(available)];
                response.push(REPORT_SUCCESS)?;
                response.extend(name)?;
                response.push(0x00)?;
                1
            }

            CMD_COMMAND_VERSION => {
                response.extend(&[REPORT_SUCCESS, board.capabilities().command_version])?;
                1
            }

            CMD_JVS_VERSION => {
                response.extend(&[REPORT_SUCCESS, board.capabilities().jvs_version])?;
                1
            }

            CMD_COMMS_VERSION => {
                response.extend(&[REPORT_SUCCESS, board.capabilities().comms_version])?;
                1
            }

            CMD_CAPABILITIES => {
                debug!("CMD_CAPABILITIES - returning feature records");
                write_features(&mut response, board.capabilities())?;
                1
            }

            CMD_READ_SWITCHES => {
                let players = arg(1) as usize;
                let bytes_per_player = arg(2) as usize;
                let state = board.state();
                response.extend(&[REPORT_SUCCESS, state.switch_word(0) as u8])?;
                for player in 0..players {
                    let word = state.switch_word(player + 1).to_be_bytes();
                    for byte_index in 0..bytes_per_player {
                        response.push(word.get(byte_index).copied().unwrap_or(0))?;
                    }
                }
                3
            }

            CMD_READ_COINS => {
                let slots = arg(1) as usize;
                let state = board.state();
                response.push(REPORT_SUCCESS)?;
                for slot in 0..slots {
                    let count = state.coin_count(slot);
                    // 14 data bits; the top two bits of the high byte are the
                    // condition field, always reported normal.
                    response.extend(&[((count >> 8) & 0x3F) as u8, count as u8])?;
                }
                2
            }

            CMD_READ_ANALOGS => {
                let channels = arg(1) as usize;
                let state = board.state();
                response.push(REPORT_SUCCESS)?;
                for channel in 0..channels {
                    let value =
                        ((state.analog(channel) as u32) << board.analogue_rest_bits()) as u16;
                    response.extend(&value.to_be_bytes())?;
                }
                2
            }

            CMD_READ_ROTARY => {
                let channels = arg(1) as usize;
                let state = board.state();
                response.push(REPORT_SUCCESS)?;
                for channel in 0..channels {
                    response.extend(&state.rotary(channel).to_be_bytes())?;
                }
                2
            }

            CMD_READ_KEYPAD => {
                response.extend(&[REPORT_SUCCESS, 0x00])?;
                1
            }

            CMD_READ_LIGHTGUN => {
                let state = board.state();
                let x = ((state.gun(0) as u32) << board.gun_x_rest_bits()) as u16;
                let y = ((state.gun(1) as u32) << board.gun_y_rest_bits()) as u16;
                response.push(REPORT_SUCCESS)?;
                response.extend(&x.to_be_bytes())?;
                response.extend(&y.to_be_bytes())?;
                2
            }

            CMD_READ_GPI => {
                let count = arg(1) as usize;
                response.push(REPORT_SUCCESS)?;
                for _ in 0..count {
                    response.push(0x00)?;
                }
                2
            }

            CMD_REMAINING_PAYOUT => {
                response.extend(&[REPORT_SUCCESS, 0x00, 0x00, 0x00, 0x00])?;
                2
            }

            CMD_SET_PAYOUT => {
                response.push(REPORT_SUCCESS)?;
                4
            }

            CMD_SUBTRACT_PAYOUT => {
                response.push(REPORT_SUCCESS)?;
                3
            }

            CMD_WRITE_GPO => {
                let count = arg(1) as usize;
                let end = rest.len().min(2 + count);
                if let Some(sink) = sink {
                    sink.write_gpo(&rest[2.min(end)..end]);
                }
                response.push(REPORT_SUCCESS)?;
                2 + count
            }

            CMD_WRITE_GPO_BYTE => {
                response.push(REPORT_SUCCESS)?;
                3
            }

            CMD_WRITE_GPO_BIT => {
                response.push(REPORT_SUCCESS)?;
                3
            }

            CMD_WRITE_ANALOG => {
                let channels = arg(1) as usize;
                response.push(REPORT_SUCCESS)?;
                2 + 2 * channels
            }

            CMD_WRITE_DISPLAY => {
                let length = arg(1) as usize;
                response.push(REPORT_SUCCESS)?;
                2 + 2 * length
            }

            CMD_WRITE_COINS => {
                let amount = u16::from_be_bytes([arg(2), arg(3)]);
                debug!("CMD_WRITE_COINS - slot {}, adding {amount}", arg(1));
                // Slot numbers are 1-indexed on the wire.
                if let Some(slot) = (arg(1) as usize).checked_sub(1) {
                    board.state().add_coins(slot, amount);
                }
                response.push(REPORT_SUCCESS)?;
                4
            }

            CMD_DECREASE_COINS => {
                let amount = u16::from_be_bytes([arg(2), arg(3)]);
                debug!("CMD_DECREASE_COINS - slot {}, removing {amount}", arg(1));
                if let Some(slot) = (arg(1) as usize).checked_sub(1) {
                    board.state().sub_coins(slot, amount);
                }
                response.push(REPORT_SUCCESS)?;
                4
            }

            CMD_CONVEY_ID => {
                response.push(REPORT_SUCCESS)?;
                let id: Vec<u8> = rest[1..]
                    .iter()
                    .copied()
                    .take_while(|&b| b != 0)
                    .collect();
                debug!(
                    "CMD_CONVEY_ID - main board id: {}",
                    String::from_utf8_lossy(&id)
                );
                // Command byte, the id bytes, and the NUL if one was seen.
                let nul_seen = 1 + id.len() < rest.len();
                1 + id.len() + usize::from(nul_seen)
            }

            CMD_NAMCO_SPECIFIC => {
                response.push(REPORT_SUCCESS)?;
                let mut size = 2;
                match arg(1) {
                    // Memory read: eight bytes of empty backup RAM.
                    0x01 => response.extend(&[0xFF; 8])?,
                    // Program date, BCD: 1998 October 26th, 12:00:00.
                    0x02 => {
                        response.extend(&[0x19, 0x98, 0x10, 0x26, 0x12, 0x00, 0x00, 0x00])?
                    }
                    // Dip switch status.
                    0x03 => response.push(0xFF)?,
                    0x04 => response.extend(&[0xFF, 0xFF])?,
                    // ID check; 0xFF is what the Triforce branch expects.
                    0x18 => {
                        size += 4;
                        response.push(0xFF)?;
                    }
                    sub => warn!("CMD_NAMCO_SPECIFIC - unsupported sub-command 0x{sub:02X}"),
                }
                size
            }

            _ => {
                warn!("unsupported command 0x{cmd:02X} ({})", command_name(cmd));
                1
            }
        };

        index += size;
    }

    Ok(response.packet)
}

/// Emit the capability report: REPORT_SUCCESS, one 4-byte record per
/// advertised feature, then the CAP_END terminator.
fn write_features(response: &mut ResponseWriter, caps: &Capabilities) -> Result<(), JvsError> {
    response.push(REPORT_SUCCESS)?;
    for record in caps.feature_records() {
        response.extend(&record)?;
    }
    response.push(CAP_END)
}

/// Pull bytes from the transport until a complete, valid frame arrives.
fn read_packet(dev: &mut dyn Transport) -> Result<Packet, JvsError> {
    let mut deframer = Deframer::new();
    let mut buf = [0u8; MAX_PACKET_SIZE];
    loop {
        let count = dev.read_bytes(&mut buf)?;
        if count == 0 {
            return Err(JvsError::Timeout);
        }
        for &byte in &buf[..count] {
            if let Some(packet) = deframer.push(byte)? {
                return Ok(packet);
            }
        }
    }
}

/// Frame and transmit a response, retrying short writes.
///
/// A response carrying only the packet status byte is not transmitted at
/// all; that is how broadcast RESET stays silent.
fn write_packet(dev: &mut dyn Transport, packet: &Packet) -> Result<(), JvsError> {
    if packet.data.len() < 2 {
        return Ok(());
    }

    let framed = frame(packet)?;
    let mut written = 0;
    let mut stalled = 0;
    while written < framed.len() {
        if stalled > WRITE_RETRY_COUNT {
            return Err(JvsError::WriteFail);
        }
        let count = dev.write_bytes(&framed[written..])?;
        if count == 0 {
            stalled += 1;
        } else {
            stalled = 0;
            written += count;
        }
    }
    Ok(())
}
