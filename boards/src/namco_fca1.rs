//! Namco FCA-1 multipurpose board with rotary encoder inputs, used by the
//! driving cabinets.

use jvs_core::board::Capabilities;

use crate::registry::BoardEntry;

pub fn capabilities() -> Capabilities {
    Capabilities {
        display_name: "Namco FCA-1".to_string(),
        name: "namco ltd.;FCA-1;Ver1.01;JPN,Multipurpose + Rotary Encoder".to_string(),
        command_version: 0x11,
        jvs_version: 0x20,
        comms_version: 0x10,
        players: 1,
        switches: 24,
        coins: 1,
        analogue_in_channels: 8,
        analogue_in_bits: 10,
        rotary_channels: 4,
        general_purpose_outputs: 6,
        ..Capabilities::default()
    }
}

inventory::submit! {
    BoardEntry::new("namco-fca1", "Namco FCA-1", capabilities)
}
