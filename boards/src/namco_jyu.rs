//! Namco JYU multipurpose board with two light-gun channels.

use jvs_core::board::Capabilities;

use crate::registry::BoardEntry;

pub fn capabilities() -> Capabilities {
    Capabilities {
        display_name: "Namco JYU".to_string(),
        name: "namco ltd.;JYU-PCB;Ver1.00;JPN,Multipurpose".to_string(),
        command_version: 0x11,
        jvs_version: 0x20,
        comms_version: 0x10,
        players: 2,
        switches: 12,
        coins: 2,
        analogue_in_channels: 4,
        analogue_in_bits: 10,
        gun_channels: 2,
        gun_x_bits: 16,
        gun_y_bits: 16,
        general_purpose_outputs: 16,
        ..Capabilities::default()
    }
}

inventory::submit! {
    BoardEntry::new("namco-jyu", "Namco JYU", capabilities)
}
