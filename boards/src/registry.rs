//! Board profile registry for daemon discovery.
//!
//! Each built-in I/O board profile self-registers via [`inventory::submit!`]
//! with a [`BoardEntry`] containing its config-file name, a human-readable
//! display name, and a factory for its capability descriptor. The daemon
//! resolves EMULATE names against this registry before falling back to a
//! capability file on disk.

use jvs_core::board::Capabilities;

/// Describes one built-in emulated I/O board.
pub struct BoardEntry {
    /// Name used in config files to select this board (e.g. "sega-type-3").
    pub name: &'static str,
    /// Human-readable name for logs and listings.
    pub display_name: &'static str,
    /// Factory: construct the board's capability descriptor.
    pub create: fn() -> Capabilities,
}

impl BoardEntry {
    pub const fn new(
        name: &'static str,
        display_name: &'static str,
        create: fn() -> Capabilities,
    ) -> Self {
        Self {
            name,
            display_name,
            create,
        }
    }
}

inventory::collect!(BoardEntry);

/// Return all registered board profiles, sorted by name.
pub fn all() -> Vec<&'static BoardEntry> {
    let mut entries: Vec<_> = inventory::iter::<BoardEntry>.into_iter().collect();
    entries.sort_by_key(|e| e.name);
    entries
}

/// Look up a board profile by its config-file name.
pub fn find(name: &str) -> Option<&'static BoardEntry> {
    inventory::iter::<BoardEntry>
        .into_iter()
        .find(|e| e.name == name)
}
