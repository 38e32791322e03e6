//! sysfs GPIO: the sense line the bus master watches, and the rotary map
//! selector wired to the DIY HAT.

use std::fs;
use std::io;
use std::path::PathBuf;

use log::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    In,
    Out,
}

fn gpio_dir(pin: u32) -> PathBuf {
    PathBuf::from(format!("/sys/class/gpio/gpio{pin}"))
}

/// Export a pin through sysfs. Exporting an already-exported pin fails with
/// EBUSY; that counts as success.
fn export(pin: u32) -> io::Result<()> {
    if gpio_dir(pin).exists() {
        return Ok(());
    }
    fs::write("/sys/class/gpio/export", pin.to_string())
}

fn set_direction(pin: u32, direction: Direction) -> io::Result<()> {
    let value = match direction {
        Direction::In => "in",
        Direction::Out => "out",
    };
    fs::write(gpio_dir(pin).join("direction"), value)
}

fn write_value(pin: u32, value: bool) -> io::Result<()> {
    fs::write(gpio_dir(pin).join("value"), if value { "1" } else { "0" })
}

fn read_value(pin: u32) -> io::Result<u8> {
    let raw = fs::read_to_string(gpio_dir(pin).join("value"))?;
    Ok(if raw.trim_start().starts_with('1') { 1 } else { 0 })
}

/// How the sense line is wired to the cabinet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenseLineMode {
    /// No sense wiring; every set is a no-op.
    None,
    /// Float style: deasserted leaves the pin floating as an input,
    /// asserted sinks it low as an output.
    Float,
    /// Switch style: the pin directly drives 0 (deasserted) or 1 (asserted).
    Switch,
}

impl SenseLineMode {
    /// Config values: 0 = none, 1 = float, 2 = switch.
    pub fn from_config(value: u8) -> Self {
        match value {
            1 => Self::Float,
            2 => Self::Switch,
            0 => Self::None,
            other => {
                warn!("invalid sense line type {other}, disabling sense line");
                Self::None
            }
        }
    }
}

/// The two-state sense signal. Failures are logged, never fatal: a cabinet
/// without the wiring still works over plain RS-485.
pub struct SenseLine {
    mode: SenseLineMode,
    pin: u32,
}

impl SenseLine {
    pub fn new(mode: SenseLineMode, pin: u32) -> Self {
        if mode != SenseLineMode::None {
            if let Err(e) = export(pin) {
                warn!("sense line pin {pin} not available: {e}");
            }
            let initial = match mode {
                SenseLineMode::Float => set_direction(pin, Direction::In),
                SenseLineMode::Switch => set_direction(pin, Direction::Out),
                SenseLineMode::None => Ok(()),
            };
            if let Err(e) = initial {
                warn!("failed to configure sense line pin {pin}: {e}");
            }
        }

        let line = Self { mode, pin };
        line.set(false);
        line
    }

    pub fn set(&self, asserted: bool) {
        let result = match self.mode {
            SenseLineMode::None => Ok(()),
            SenseLineMode::Float => {
                if asserted {
                    set_direction(self.pin, Direction::Out).and_then(|_| write_value(self.pin, false))
                } else {
                    set_direction(self.pin, Direction::In)
                }
            }
            SenseLineMode::Switch => write_value(self.pin, asserted),
        };

        if let Err(e) = result {
            warn!(
                "failed to {} sense line {}: {e}",
                if asserted { "sink" } else { "float" },
                self.pin
            );
        }
    }
}

/// Pins carrying the 4-bit rotary encoder that selects the active game map.
const ROTARY_PINS: [u32; 4] = [18, 19, 20, 21];

/// The rotary map selector: a 16-position encoder read as an inverted
/// 4-bit value.
pub struct RotarySelector;

impl RotarySelector {
    /// Set the rotary pins up as inputs. Returns `None` when the HAT is not
    /// present.
    pub fn probe() -> Option<Self> {
        for pin in ROTARY_PINS {
            if export(pin).is_err() || set_direction(pin, Direction::In).is_err() {
                debug!("rotary encoder pin {pin} not available");
                return None;
            }
        }
        Some(Self)
    }

    /// Current position 0-15, or `None` if any pin read fails.
    pub fn value(&self) -> Option<u8> {
        let mut value = 0u8;
        for (bit, pin) in ROTARY_PINS.iter().enumerate() {
            match read_value(*pin) {
                Ok(v) => value |= v << bit,
                Err(e) => {
                    warn!("failed to read rotary encoder pin {pin}: {e}");
                    return None;
                }
            }
        }
        Some(!value & 0x0F)
    }
}
