//! The JVS-side input vocabulary: the named switches, analog channels and
//! rotary channels a game mapping can target.

use std::str::FromStr;

/// A named JVS input. Switch inputs resolve to a bit in either the system
/// switch byte or a player's switch word; `Analogue*`/`Rotary*` resolve to a
/// channel index; `Coin` routes to the player's coin slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JvsInput {
    None,

    // System switches (player 0).
    Test,
    Tilt1,
    Tilt2,
    Tilt3,

    // Per-player switches, MSB-first in the 16-bit switch word.
    Start,
    Service,
    Up,
    Down,
    Left,
    Right,
    Button1,
    Button2,
    Button3,
    Button4,
    Button5,
    Button6,
    Button7,
    Button8,

    Coin,

    Analogue0,
    Analogue1,
    Analogue2,
    Analogue3,
    Analogue4,
    Analogue5,
    Analogue6,
    Analogue7,

    Rotary0,
    Rotary1,
    Rotary2,
    Rotary3,
    Rotary4,
    Rotary5,
    Rotary6,
    Rotary7,
}

impl JvsInput {
    /// Bit mask within a switch word. System inputs land in word 0 (whose
    /// low byte is the system switch byte); player inputs in the player's
    /// word. Returns `None` for non-switch inputs.
    pub fn switch_mask(self) -> Option<u16> {
        match self {
            Self::Test => Some(0x0080),
            Self::Tilt1 => Some(0x0040),
            Self::Tilt2 => Some(0x0020),
            Self::Tilt3 => Some(0x0010),

            Self::Start => Some(0x8000),
            Self::Service => Some(0x4000),
            Self::Up => Some(0x2000),
            Self::Down => Some(0x1000),
            Self::Left => Some(0x0800),
            Self::Right => Some(0x0400),
            Self::Button1 => Some(0x0200),
            Self::Button2 => Some(0x0100),
            Self::Button3 => Some(0x0080),
            Self::Button4 => Some(0x0040),
            Self::Button5 => Some(0x0020),
            Self::Button6 => Some(0x0010),
            Self::Button7 => Some(0x0008),
            Self::Button8 => Some(0x0004),

            _ => None,
        }
    }

    /// True for the inputs that live in the system switch byte regardless of
    /// the mapping's player number.
    pub fn is_system(self) -> bool {
        matches!(self, Self::Test | Self::Tilt1 | Self::Tilt2 | Self::Tilt3)
    }

    pub fn analogue_channel(self) -> Option<usize> {
        match self {
            Self::Analogue0 => Some(0),
            Self::Analogue1 => Some(1),
            Self::Analogue2 => Some(2),
            Self::Analogue3 => Some(3),
            Self::Analogue4 => Some(4),
            Self::Analogue5 => Some(5),
            Self::Analogue6 => Some(6),
            Self::Analogue7 => Some(7),
            _ => None,
        }
    }

    pub fn rotary_channel(self) -> Option<usize> {
        match self {
            Self::Rotary0 => Some(0),
            Self::Rotary1 => Some(1),
            Self::Rotary2 => Some(2),
            Self::Rotary3 => Some(3),
            Self::Rotary4 => Some(4),
            Self::Rotary5 => Some(5),
            Self::Rotary6 => Some(6),
            Self::Rotary7 => Some(7),
            _ => None,
        }
    }
}

/// Error from parsing an unknown JVS input name in a game mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownJvsInput(pub String);

impl std::fmt::Display for UnknownJvsInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown JVS input name: {}", self.0)
    }
}

impl std::error::Error for UnknownJvsInput {}

impl FromStr for JvsInput {
    type Err = UnknownJvsInput;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "NONE" => Self::None,
            "TEST" => Self::Test,
            "TILT_1" => Self::Tilt1,
            "TILT_2" => Self::Tilt2,
            "TILT_3" => Self::Tilt3,
            "START" => Self::Start,
            "SERVICE" => Self::Service,
            "UP" => Self::Up,
            "DOWN" => Self::Down,
            "LEFT" => Self::Left,
            "RIGHT" => Self::Right,
            "BUTTON_1" => Self::Button1,
            "BUTTON_2" => Self::Button2,
            "BUTTON_3" => Self::Button3,
            "BUTTON_4" => Self::Button4,
            "BUTTON_5" => Self::Button5,
            "BUTTON_6" => Self::Button6,
            "BUTTON_7" => Self::Button7,
            "BUTTON_8" => Self::Button8,
            "COIN" => Self::Coin,
            "ANALOGUE_0" => Self::Analogue0,
            "ANALOGUE_1" => Self::Analogue1,
            "ANALOGUE_2" => Self::Analogue2,
            "ANALOGUE_3" => Self::Analogue3,
            "ANALOGUE_4" => Self::Analogue4,
            "ANALOGUE_5" => Self::Analogue5,
            "ANALOGUE_6" => Self::Analogue6,
            "ANALOGUE_7" => Self::Analogue7,
            "ROTARY_0" => Self::Rotary0,
            "ROTARY_1" => Self::Rotary1,
            "ROTARY_2" => Self::Rotary2,
            "ROTARY_3" => Self::Rotary3,
            "ROTARY_4" => Self::Rotary4,
            "ROTARY_5" => Self::Rotary5,
            "ROTARY_6" => Self::Rotary6,
            "ROTARY_7" => Self::Rotary7,
            other => return Err(UnknownJvsInput(other.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_is_bit_15() {
        assert_eq!(JvsInput::Start.switch_mask(), Some(0x8000));
    }

    #[test]
    fn test_switch_is_bit_7_of_system_byte() {
        assert_eq!(JvsInput::Test.switch_mask(), Some(0x0080));
        assert!(JvsInput::Test.is_system());
        assert!(!JvsInput::Start.is_system());
    }

    #[test]
    fn analog_names_resolve_to_channels() {
        assert_eq!("ANALOGUE_3".parse(), Ok(JvsInput::Analogue3));
        assert_eq!(JvsInput::Analogue3.analogue_channel(), Some(3));
        assert_eq!(JvsInput::Start.analogue_channel(), None);
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert!("BUTTON_9".parse::<JvsInput>().is_err());
    }
}
