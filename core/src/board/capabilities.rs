//! Capability descriptor for one emulated I/O board.

/// Everything a board advertises to the bus master: identity strings,
/// protocol versions, and the feature counts reported by CMD_CAPABILITIES.
/// A zero count disables the corresponding feature entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    /// Short name for logs and the config UI.
    pub display_name: String,
    /// Identification string returned by CMD_REQUEST_ID, NUL-terminated on
    /// the wire. At most 100 bytes are sent.
    pub name: String,

    pub command_version: u8,
    pub jvs_version: u8,
    pub comms_version: u8,

    pub players: u8,
    /// Switches per player.
    pub switches: u8,
    pub coins: u8,
    pub analogue_in_channels: u8,
    /// Effective bits per analog channel, in [0, 16].
    pub analogue_in_bits: u8,
    pub rotary_channels: u8,
    pub keypad: u8,
    pub gun_channels: u8,
    pub gun_x_bits: u8,
    pub gun_y_bits: u8,
    pub general_purpose_inputs: u8,

    pub card: u8,
    pub hopper: u8,
    pub general_purpose_outputs: u8,
    pub analogue_out_channels: u8,
    pub display_out_rows: u8,
    pub display_out_columns: u8,
    pub display_out_encodings: u8,

    pub backup: u8,
    /// When nonzero, analog and gun values are sent right-aligned in their
    /// 16-bit field instead of the default left alignment.
    pub right_align_bits: u8,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            display_name: String::new(),
            name: String::new(),
            command_version: 0x13,
            jvs_version: 0x30,
            comms_version: 0x10,
            players: 0,
            switches: 0,
            coins: 0,
            analogue_in_channels: 0,
            analogue_in_bits: 0,
            rotary_channels: 0,
            keypad: 0,
            gun_channels: 0,
            gun_x_bits: 0,
            gun_y_bits: 0,
            general_purpose_inputs: 0,
            card: 0,
            hopper: 0,
            general_purpose_outputs: 0,
            analogue_out_channels: 0,
            display_out_rows: 0,
            display_out_columns: 0,
            display_out_encodings: 0,
            backup: 0,
            right_align_bits: 0,
        }
    }
}

/// Feature tags in the CMD_CAPABILITIES report.
pub const CAP_END: u8 = 0x00;
pub const CAP_PLAYERS: u8 = 0x01;
pub const CAP_COINS: u8 = 0x02;
pub const CAP_ANALOG_IN: u8 = 0x03;
pub const CAP_ROTARY: u8 = 0x04;
pub const CAP_KEYPAD: u8 = 0x05;
pub const CAP_LIGHTGUN: u8 = 0x06;
pub const CAP_GPI: u8 = 0x07;
pub const CAP_CARD: u8 = 0x10;
pub const CAP_HOPPER: u8 = 0x11;
pub const CAP_GPO: u8 = 0x12;
pub const CAP_ANALOG_OUT: u8 = 0x13;
pub const CAP_DISPLAY: u8 = 0x14;
pub const CAP_BACKUP: u8 = 0x20;

impl Capabilities {
    /// The 4-byte feature records advertised by this board, in report order
    /// (input functions, output functions, other). The CAP_END terminator is
    /// not included.
    pub fn feature_records(&self) -> Vec<[u8; 4]> {
        let mut records = Vec::new();

        if self.players != 0 {
            records.push([CAP_PLAYERS, self.players, self.switches, 0x00]);
        }
        if self.coins != 0 {
            records.push([CAP_COINS, self.coins, 0x00, 0x00]);
        }
        if self.analogue_in_channels != 0 {
            records.push([
                CAP_ANALOG_IN,
                self.analogue_in_channels,
                self.analogue_in_bits,
                0x00,
            ]);
        }
        if self.rotary_channels != 0 {
            records.push([CAP_ROTARY, self.rotary_channels, 0x00, 0x00]);
        }
        if self.keypad != 0 {
            records.push([CAP_KEYPAD, 0x00, 0x00, 0x00]);
        }
        if self.gun_channels != 0 {
            records.push([CAP_LIGHTGUN, self.gun_x_bits, self.gun_y_bits, self.gun_channels]);
        }
        if self.general_purpose_inputs != 0 {
            records.push([CAP_GPI, 0x00, self.general_purpose_inputs, 0x00]);
        }

        if self.card != 0 {
            records.push([CAP_CARD, self.card, 0x00, 0x00]);
        }
        if self.hopper != 0 {
            records.push([CAP_HOPPER, self.hopper, 0x00, 0x00]);
        }
        if self.general_purpose_outputs != 0 {
            records.push([CAP_GPO, self.general_purpose_outputs, 0x00, 0x00]);
        }
        if self.analogue_out_channels != 0 {
            records.push([CAP_ANALOG_OUT, self.analogue_out_channels, 0x00, 0x00]);
        }
        if self.display_out_columns != 0 {
            records.push([
                CAP_DISPLAY,
                self.display_out_columns,
                self.display_out_rows,
                self.display_out_encodings,
            ]);
        }

        if self.backup != 0 {
            records.push([CAP_BACKUP, 0x00, 0x00, 0x00]);
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_counts_emit_no_records() {
        let caps = Capabilities::default();
        assert!(caps.feature_records().is_empty());
    }

    #[test]
    fn one_record_per_nonzero_capability() {
        let caps = Capabilities {
            players: 2,
            switches: 12,
            coins: 2,
            analogue_in_channels: 8,
            analogue_in_bits: 10,
            general_purpose_outputs: 3,
            ..Capabilities::default()
        };
        let records = caps.feature_records();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0], [CAP_PLAYERS, 2, 12, 0]);
        assert_eq!(records[1], [CAP_COINS, 2, 0, 0]);
        assert_eq!(records[2], [CAP_ANALOG_IN, 8, 10, 0]);
        assert_eq!(records[3], [CAP_GPO, 3, 0, 0]);
    }

    #[test]
    fn lightgun_record_carries_bit_widths_then_channels() {
        let caps = Capabilities {
            gun_channels: 1,
            gun_x_bits: 16,
            gun_y_bits: 16,
            ..Capabilities::default()
        };
        assert_eq!(caps.feature_records(), vec![[CAP_LIGHTGUN, 16, 16, 1]]);
    }
}
