//! Live board state shared between the input threads and the protocol loop.
//!
//! Every field is a 16-bit atomic so readers can never observe a torn
//! value. Each input thread writes a disjoint subset (its player's switch
//! word, its mapped channels); the one multi-writer field is the coin
//! counter, which both the input threads and the protocol engine update, so
//! it goes through compare-and-swap to keep the saturation bounds intact.

use std::sync::atomic::{AtomicU16, Ordering};

use super::capabilities::Capabilities;
use super::inputs::JvsInput;

/// Coin counters saturate at this 14-bit ceiling. The top two bits of the
/// on-wire high byte are a condition field this emulator always reports as
/// zero.
pub const COIN_MAX: u16 = 16383;

pub struct BoardState {
    /// Switch words: index 0 holds the system byte in its low 8 bits,
    /// indices 1..=players hold the per-player words, MSB-first on the wire.
    switches: Vec<AtomicU16>,
    coins: Vec<AtomicU16>,
    /// Channel values already scaled to the advertised bit width.
    analog: Vec<AtomicU16>,
    /// 16-bit two's-complement accumulators, wrapping.
    rotary: Vec<AtomicU16>,
    /// Gun channels X0, Y0, X1, Y1, ... mirroring the analog scaling.
    gun: Vec<AtomicU16>,

    analogue_bits: u8,
    gun_x_bits: u8,
    gun_y_bits: u8,
}

fn atomics(len: usize) -> Vec<AtomicU16> {
    (0..len).map(|_| AtomicU16::new(0)).collect()
}

impl BoardState {
    pub fn new(caps: &Capabilities) -> Self {
        let analog_len = caps.analogue_in_channels as usize;
        // The lightgun read always reports an X/Y pair, and analog axes
        // mirror into the gun channels one-to-one.
        let gun_len = analog_len.max(2 * caps.gun_channels as usize).max(2);
        Self {
            switches: atomics(caps.players as usize + 1),
            coins: atomics(caps.coins as usize),
            analog: atomics(analog_len),
            rotary: atomics(caps.rotary_channels as usize),
            gun: atomics(gun_len),
            analogue_bits: caps.analogue_in_bits,
            gun_x_bits: caps.gun_x_bits,
            gun_y_bits: caps.gun_y_bits,
        }
    }

    // -- Switches ------------------------------------------------------------

    /// Set or clear one switch. System inputs always land in word 0; player
    /// inputs in the given player's word. Non-switch inputs are ignored.
    pub fn set_switch(&self, player: usize, input: JvsInput, pressed: bool) {
        let Some(mask) = input.switch_mask() else {
            return;
        };
        let index = if input.is_system() { 0 } else { player };
        let Some(word) = self.switches.get(index) else {
            return;
        };
        if pressed {
            word.fetch_or(mask, Ordering::Relaxed);
        } else {
            word.fetch_and(!mask, Ordering::Relaxed);
        }
    }

    /// Raw switch word; index 0 is the system byte. Out-of-range reads as 0.
    pub fn switch_word(&self, index: usize) -> u16 {
        self.switches
            .get(index)
            .map_or(0, |w| w.load(Ordering::Relaxed))
    }

    pub fn set_switch_word(&self, index: usize, word: u16) {
        if let Some(w) = self.switches.get(index) {
            w.store(word, Ordering::Relaxed);
        }
    }

    // -- Coins ---------------------------------------------------------------

    /// Add coins to a slot, saturating at [`COIN_MAX`].
    pub fn add_coins(&self, slot: usize, count: u16) {
        if let Some(counter) = self.coins.get(slot) {
            let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_add(count).min(COIN_MAX))
            });
        }
    }

    /// Remove coins from a slot, clamping at zero.
    pub fn sub_coins(&self, slot: usize, count: u16) {
        if let Some(counter) = self.coins.get(slot) {
            let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_sub(count))
            });
        }
    }

    pub fn coin_count(&self, slot: usize) -> u16 {
        self.coins.get(slot).map_or(0, |c| c.load(Ordering::Relaxed))
    }

    pub fn set_coin_count(&self, slot: usize, count: u16) {
        if let Some(counter) = self.coins.get(slot) {
            counter.store(count.min(COIN_MAX), Ordering::Relaxed);
        }
    }

    // -- Analog / gun / rotary -----------------------------------------------

    /// Store a normalized [0, 1] value into an analog channel, scaled to the
    /// advertised bit width.
    pub fn set_analog(&self, channel: usize, value: f64) {
        if let Some(ch) = self.analog.get(channel) {
            ch.store(scale_to_bits(value, self.analogue_bits), Ordering::Relaxed);
        }
    }

    pub fn analog(&self, channel: usize) -> u16 {
        self.analog.get(channel).map_or(0, |c| c.load(Ordering::Relaxed))
    }

    /// Store a normalized [0, 1] value into a gun channel. Even channels are
    /// X (gun X width), odd channels Y.
    pub fn set_gun(&self, channel: usize, value: f64) {
        if let Some(ch) = self.gun.get(channel) {
            let bits = if channel % 2 == 0 {
                self.gun_x_bits
            } else {
                self.gun_y_bits
            };
            ch.store(scale_to_bits(value, bits), Ordering::Relaxed);
        }
    }

    pub fn gun(&self, channel: usize) -> u16 {
        self.gun.get(channel).map_or(0, |c| c.load(Ordering::Relaxed))
    }

    /// Accumulate a relative movement into a rotary channel, wrapping in 16
    /// bits.
    pub fn add_rotary(&self, channel: usize, delta: i32) {
        if let Some(ch) = self.rotary.get(channel) {
            ch.fetch_add(delta as u16, Ordering::Relaxed);
        }
    }

    pub fn rotary(&self, channel: usize) -> u16 {
        self.rotary.get(channel).map_or(0, |c| c.load(Ordering::Relaxed))
    }
}

/// Scale a normalized [0, 1] value onto the advertised bit width, clamping
/// both ends.
fn scale_to_bits(value: f64, bits: u8) -> u16 {
    if bits == 0 || bits > 16 {
        return 0;
    }
    let max = ((1u32 << bits) - 1) as f64;
    (value.clamp(0.0, 1.0) * max).round() as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps() -> Capabilities {
        Capabilities {
            players: 2,
            switches: 12,
            coins: 2,
            analogue_in_channels: 4,
            analogue_in_bits: 10,
            rotary_channels: 2,
            gun_channels: 1,
            gun_x_bits: 16,
            gun_y_bits: 16,
            ..Capabilities::default()
        }
    }

    #[test]
    fn switch_set_and_clear() {
        let state = BoardState::new(&caps());
        state.set_switch(1, JvsInput::Start, true);
        assert_eq!(state.switch_word(1), 0x8000);
        state.set_switch(1, JvsInput::Button1, true);
        assert_eq!(state.switch_word(1), 0x8200);
        state.set_switch(1, JvsInput::Start, false);
        assert_eq!(state.switch_word(1), 0x0200);
    }

    #[test]
    fn system_inputs_target_word_zero() {
        let state = BoardState::new(&caps());
        state.set_switch(2, JvsInput::Test, true);
        assert_eq!(state.switch_word(0), 0x0080);
        assert_eq!(state.switch_word(2), 0x0000);
    }

    #[test]
    fn coins_saturate_at_both_ends() {
        let state = BoardState::new(&caps());
        state.add_coins(0, COIN_MAX - 3);
        state.add_coins(0, 100);
        assert_eq!(state.coin_count(0), COIN_MAX);
        state.sub_coins(0, COIN_MAX + 500);
        assert_eq!(state.coin_count(0), 0);
    }

    #[test]
    fn analog_scales_to_advertised_bits() {
        let state = BoardState::new(&caps());
        // 256 on a 0..1023 axis at 10 bits: exactly a quarter of full scale.
        state.set_analog(0, 256.0 / 1023.0);
        assert_eq!(state.analog(0), 256);
        state.set_analog(0, 1.0);
        assert_eq!(state.analog(0), 1023);
        state.set_analog(0, 2.0);
        assert_eq!(state.analog(0), 1023);
    }

    #[test]
    fn rotary_wraps_in_sixteen_bits() {
        let state = BoardState::new(&caps());
        state.add_rotary(0, -1);
        assert_eq!(state.rotary(0), 0xFFFF);
        state.add_rotary(0, 3);
        assert_eq!(state.rotary(0), 0x0002);
    }

    #[test]
    fn out_of_range_channels_are_ignored() {
        let state = BoardState::new(&caps());
        state.set_analog(40, 1.0);
        state.add_rotary(40, 5);
        state.add_coins(40, 5);
        assert_eq!(state.analog(40), 0);
        assert_eq!(state.rotary(40), 0);
        assert_eq!(state.coin_count(40), 0);
    }
}
