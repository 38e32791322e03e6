//! Namco TSS-I/O gun extension board.
//!
//! The identification string carries the misspelling the real hardware
//! reports; some titles match on it verbatim.

use jvs_core::board::Capabilities;

use crate::registry::BoardEntry;

pub fn capabilities() -> Capabilities {
    Capabilities {
        display_name: "Namco TSS-I/O".to_string(),
        name: "namco ltd.;TSS-I/O;Ver2.02;JPN,GUN-EXTENTION".to_string(),
        command_version: 0x11,
        jvs_version: 0x20,
        comms_version: 0x10,
        players: 1,
        switches: 12,
        coins: 1,
        gun_channels: 1,
        gun_x_bits: 16,
        gun_y_bits: 16,
        general_purpose_outputs: 3,
        ..Capabilities::default()
    }
}

inventory::submit! {
    BoardEntry::new("namco-tss", "Namco TSS-I/O", capabilities)
}
