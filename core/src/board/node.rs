//! One emulated I/O board and the daisy chain linking it to the next.

use std::sync::Arc;

use super::capabilities::Capabilities;
use super::state::BoardState;

/// A node in the emulated daisy chain. The protocol engine owns the chain;
/// input and force-feedback workers hold only the shared [`BoardState`].
pub struct IoBoard {
    capabilities: Capabilities,
    state: Arc<BoardState>,
    /// Address assigned by the bus master; `None` until CMD_ASSIGN_ADDR.
    device_id: Option<u8>,

    /// Left-alignment shifts precomputed from the advertised bit widths.
    analogue_rest_bits: u32,
    gun_x_rest_bits: u32,
    gun_y_rest_bits: u32,

    /// Next board downstream. The last board has no successor.
    next: Option<Box<IoBoard>>,
}

impl IoBoard {
    pub fn new(capabilities: Capabilities) -> Self {
        let state = Arc::new(BoardState::new(&capabilities));

        // Values are stored at the advertised width and shifted up into the
        // 16-bit wire field, unless the board wants them right-aligned.
        let (analogue_rest_bits, gun_x_rest_bits, gun_y_rest_bits) =
            if capabilities.right_align_bits != 0 {
                (0, 0, 0)
            } else {
                (
                    16 - u32::from(capabilities.analogue_in_bits.min(16)),
                    16 - u32::from(capabilities.gun_x_bits.min(16)),
                    16 - u32::from(capabilities.gun_y_bits.min(16)),
                )
            };

        Self {
            capabilities,
            state,
            device_id: None,
            analogue_rest_bits,
            gun_x_rest_bits,
            gun_y_rest_bits,
            next: None,
        }
    }

    /// Append a board at the tail of the chain.
    pub fn chain(&mut self, board: IoBoard) {
        match self.next.as_deref_mut() {
            Some(tail) => tail.chain(board),
            None => self.next = Some(Box::new(board)),
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn state(&self) -> Arc<BoardState> {
        Arc::clone(&self.state)
    }

    pub fn device_id(&self) -> Option<u8> {
        self.device_id
    }

    pub fn next(&self) -> Option<&IoBoard> {
        self.next.as_deref()
    }

    pub fn analogue_rest_bits(&self) -> u32 {
        self.analogue_rest_bits
    }

    pub fn gun_x_rest_bits(&self) -> u32 {
        self.gun_x_rest_bits
    }

    pub fn gun_y_rest_bits(&self) -> u32 {
        self.gun_y_rest_bits
    }

    /// Find the board holding an assigned address, walking head to tail.
    pub fn find(&self, device_id: u8) -> Option<&IoBoard> {
        let mut board = self;
        loop {
            if board.device_id == Some(device_id) {
                return Some(board);
            }
            board = board.next.as_deref()?;
        }
    }

    pub fn find_mut(&mut self, device_id: u8) -> Option<&mut IoBoard> {
        if self.device_id == Some(device_id) {
            return Some(self);
        }
        self.next.as_deref_mut()?.find_mut(device_id)
    }

    /// Clear every address in the chain, from this board down.
    pub fn reset_chain(&mut self) {
        self.device_id = None;
        if let Some(next) = self.next.as_deref_mut() {
            next.reset_chain();
        }
    }

    /// Assign an address to the first unassigned board, head-first. Returns
    /// true if a board took the address.
    pub fn assign_address(&mut self, device_id: u8) -> bool {
        if self.device_id.is_none() {
            self.device_id = Some(device_id);
            return true;
        }
        match self.next.as_deref_mut() {
            Some(next) => next.assign_address(device_id),
            None => false,
        }
    }

    /// Number of boards from this one to the tail.
    pub fn chain_len(&self) -> usize {
        let mut len = 1;
        let mut board = self;
        while let Some(next) = board.next.as_deref() {
            len += 1;
            board = next;
        }
        len
    }
}
