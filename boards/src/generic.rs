//! A general-purpose default board covering the common cabinet wiring:
//! two players, two coin slots, analog sticks and a bank of lamp outputs.

use jvs_core::board::Capabilities;

use crate::registry::BoardEntry;

pub fn capabilities() -> Capabilities {
    Capabilities {
        display_name: "Generic I/O".to_string(),
        name: "JVS-EMULATOR;General Purpose I/O;Ver1.00".to_string(),
        command_version: 0x13,
        jvs_version: 0x30,
        comms_version: 0x10,
        players: 2,
        switches: 12,
        coins: 2,
        analogue_in_channels: 8,
        analogue_in_bits: 10,
        rotary_channels: 2,
        general_purpose_outputs: 8,
        ..Capabilities::default()
    }
}

inventory::submit! {
    BoardEntry::new("generic", "Generic I/O", capabilities)
}
