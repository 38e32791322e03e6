//! SEGA type-3 I/O board (837-13551), the stock JVS board of NAOMI-era
//! cabinets: two players, two coin slots, eight 10-bit analog channels and
//! three general-purpose outputs.

use jvs_core::board::Capabilities;

use crate::registry::BoardEntry;

pub fn capabilities() -> Capabilities {
    Capabilities {
        display_name: "SEGA Type 3 I/O".to_string(),
        name: "SEGA ENTERPRISES,LTD.;I/O BD JVS;837-13551 ;Ver1.00;98/10".to_string(),
        command_version: 0x13,
        jvs_version: 0x30,
        comms_version: 0x10,
        players: 2,
        switches: 14,
        coins: 2,
        analogue_in_channels: 8,
        analogue_in_bits: 10,
        general_purpose_outputs: 3,
        ..Capabilities::default()
    }
}

inventory::submit! {
    BoardEntry::new("sega-type-3", "SEGA Type 3 I/O", capabilities)
}
