//! The two mapping tables and their cross-resolution.
//!
//! A *device input mapping* (devices/<name>) translates raw kernel event
//! codes into named controller inputs. A *game output mapping*
//! (games/<game>) translates controller inputs per player into JVS inputs.
//! Before a reader thread starts, the two are cross-referenced into one
//! per-event-code table so the hot loop is a plain map lookup.

use std::collections::HashMap;
use std::str::FromStr;

use log::warn;

use jvs_core::board::JvsInput;

use crate::config::{ConfigError, ConfigRoot, for_each_directive};

// ---------------------------------------------------------------------------
// Controller input vocabulary
// ---------------------------------------------------------------------------

/// A named controller input, the middle layer between raw event codes and
/// JVS inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerInput {
    AnalogueX,
    AnalogueY,
    AnalogueZ,
    AnalogueRx,
    AnalogueRy,
    AnalogueRz,
    AnalogueThrottle,
    AnalogueBrake,
    AnalogueGas,

    ButtonA,
    ButtonB,
    ButtonC,
    ButtonX,
    ButtonY,
    ButtonZ,
    ButtonL,
    ButtonR,
    ButtonL2,
    ButtonR2,
    ButtonL3,
    ButtonR3,
    ButtonStart,
    ButtonSelect,
    ButtonUp,
    ButtonDown,
    ButtonLeft,
    ButtonRight,
    ButtonCoin,
    ButtonService,
    ButtonTest,
    ButtonTrigger,
    ButtonOutScreen,
    ButtonInScreen,

    RotaryX,
    RotaryY,
}

impl ControllerInput {
    pub fn is_button(self) -> bool {
        use ControllerInput::*;
        matches!(
            self,
            ButtonA | ButtonB | ButtonC | ButtonX | ButtonY | ButtonZ | ButtonL | ButtonR
                | ButtonL2 | ButtonR2 | ButtonL3 | ButtonR3 | ButtonStart | ButtonSelect
                | ButtonUp | ButtonDown | ButtonLeft | ButtonRight | ButtonCoin | ButtonService
                | ButtonTest | ButtonTrigger | ButtonOutScreen | ButtonInScreen
        )
    }

    pub fn is_rotary(self) -> bool {
        matches!(self, Self::RotaryX | Self::RotaryY)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownControllerInput(pub String);

impl std::fmt::Display for UnknownControllerInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown controller input name: {}", self.0)
    }
}

impl std::error::Error for UnknownControllerInput {}

impl FromStr for ControllerInput {
    type Err = UnknownControllerInput;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "CONTROLLER_ANALOGUE_X" => Self::AnalogueX,
            "CONTROLLER_ANALOGUE_Y" => Self::AnalogueY,
            "CONTROLLER_ANALOGUE_Z" => Self::AnalogueZ,
            "CONTROLLER_ANALOGUE_RX" => Self::AnalogueRx,
            "CONTROLLER_ANALOGUE_RY" => Self::AnalogueRy,
            "CONTROLLER_ANALOGUE_RZ" => Self::AnalogueRz,
            "CONTROLLER_ANALOGUE_THROTTLE" => Self::AnalogueThrottle,
            "CONTROLLER_ANALOGUE_BRAKE" => Self::AnalogueBrake,
            "CONTROLLER_ANALOGUE_GAS" => Self::AnalogueGas,
            "CONTROLLER_BUTTON_A" => Self::ButtonA,
            "CONTROLLER_BUTTON_B" => Self::ButtonB,
            "CONTROLLER_BUTTON_C" => Self::ButtonC,
            "CONTROLLER_BUTTON_X" => Self::ButtonX,
            "CONTROLLER_BUTTON_Y" => Self::ButtonY,
            "CONTROLLER_BUTTON_Z" => Self::ButtonZ,
            "CONTROLLER_BUTTON_L" => Self::ButtonL,
            "CONTROLLER_BUTTON_R" => Self::ButtonR,
            "CONTROLLER_BUTTON_L2" => Self::ButtonL2,
            "CONTROLLER_BUTTON_R2" => Self::ButtonR2,
            "CONTROLLER_BUTTON_L3" => Self::ButtonL3,
            "CONTROLLER_BUTTON_R3" => Self::ButtonR3,
            "CONTROLLER_BUTTON_START" => Self::ButtonStart,
            "CONTROLLER_BUTTON_SELECT" => Self::ButtonSelect,
            "CONTROLLER_BUTTON_UP" => Self::ButtonUp,
            "CONTROLLER_BUTTON_DOWN" => Self::ButtonDown,
            "CONTROLLER_BUTTON_LEFT" => Self::ButtonLeft,
            "CONTROLLER_BUTTON_RIGHT" => Self::ButtonRight,
            "CONTROLLER_BUTTON_COIN" => Self::ButtonCoin,
            "CONTROLLER_BUTTON_SERVICE" => Self::ButtonService,
            "CONTROLLER_BUTTON_TEST" => Self::ButtonTest,
            "CONTROLLER_BUTTON_TRIGGER" => Self::ButtonTrigger,
            "CONTROLLER_BUTTON_OUT_SCREEN" => Self::ButtonOutScreen,
            "CONTROLLER_BUTTON_IN_SCREEN" => Self::ButtonInScreen,
            "CONTROLLER_ROTARY_X" => Self::RotaryX,
            "CONTROLLER_ROTARY_Y" => Self::RotaryY,
            other => return Err(UnknownControllerInput(other.to_string())),
        })
    }
}

// ---------------------------------------------------------------------------
// Kernel event code names
// ---------------------------------------------------------------------------

/// Resolve a kernel event code name (KEY_*, BTN_*, ABS_*, REL_*, MSC_*)
/// to its number. Covers the codes that show up in controller mappings.
pub fn event_code(name: &str) -> Option<u16> {
    let code = match name {
        // Keyboard keys.
        "KEY_ESC" => 1,
        "KEY_1" => 2,
        "KEY_2" => 3,
        "KEY_3" => 4,
        "KEY_4" => 5,
        "KEY_5" => 6,
        "KEY_6" => 7,
        "KEY_7" => 8,
        "KEY_8" => 9,
        "KEY_9" => 10,
        "KEY_0" => 11,
        "KEY_MINUS" => 12,
        "KEY_EQUAL" => 13,
        "KEY_BACKSPACE" => 14,
        "KEY_TAB" => 15,
        "KEY_Q" => 16,
        "KEY_W" => 17,
        "KEY_E" => 18,
        "KEY_R" => 19,
        "KEY_T" => 20,
        "KEY_Y" => 21,
        "KEY_U" => 22,
        "KEY_I" => 23,
        "KEY_O" => 24,
        "KEY_P" => 25,
        "KEY_LEFTBRACE" => 26,
        "KEY_RIGHTBRACE" => 27,
        "KEY_ENTER" => 28,
        "KEY_LEFTCTRL" => 29,
        "KEY_A" => 30,
        "KEY_S" => 31,
        "KEY_D" => 32,
        "KEY_F" => 33,
        "KEY_G" => 34,
        "KEY_H" => 35,
        "KEY_J" => 36,
        "KEY_K" => 37,
        "KEY_L" => 38,
        "KEY_SEMICOLON" => 39,
        "KEY_APOSTROPHE" => 40,
        "KEY_GRAVE" => 41,
        "KEY_LEFTSHIFT" => 42,
        "KEY_BACKSLASH" => 43,
        "KEY_Z" => 44,
        "KEY_X" => 45,
        "KEY_C" => 46,
        "KEY_V" => 47,
        "KEY_B" => 48,
        "KEY_N" => 49,
        "KEY_M" => 50,
        "KEY_COMMA" => 51,
        "KEY_DOT" => 52,
        "KEY_SLASH" => 53,
        "KEY_RIGHTSHIFT" => 54,
        "KEY_KPASTERISK" => 55,
        "KEY_LEFTALT" => 56,
        "KEY_SPACE" => 57,
        "KEY_CAPSLOCK" => 58,
        "KEY_F1" => 59,
        "KEY_F2" => 60,
        "KEY_F3" => 61,
        "KEY_F4" => 62,
        "KEY_F5" => 63,
        "KEY_F6" => 64,
        "KEY_F7" => 65,
        "KEY_F8" => 66,
        "KEY_F9" => 67,
        "KEY_F10" => 68,
        "KEY_F11" => 87,
        "KEY_F12" => 88,
        "KEY_RIGHTCTRL" => 97,
        "KEY_RIGHTALT" => 100,
        "KEY_HOME" => 102,
        "KEY_UP" => 103,
        "KEY_PAGEUP" => 104,
        "KEY_LEFT" => 105,
        "KEY_RIGHT" => 106,
        "KEY_END" => 107,
        "KEY_DOWN" => 108,
        "KEY_PAGEDOWN" => 109,
        "KEY_INSERT" => 110,
        "KEY_DELETE" => 111,
        "KEY_LEFTMETA" => 125,
        "KEY_RIGHTMETA" => 126,

        // Mouse buttons.
        "BTN_LEFT" | "BTN_MOUSE" => 272,
        "BTN_RIGHT" => 273,
        "BTN_MIDDLE" => 274,
        "BTN_SIDE" => 275,
        "BTN_EXTRA" => 276,
        "BTN_FORWARD" => 277,
        "BTN_BACK" => 278,
        "BTN_TASK" => 279,

        // Legacy joystick buttons.
        "BTN_TRIGGER" => 288,
        "BTN_THUMB" => 289,
        "BTN_THUMB2" => 290,
        "BTN_TOP" => 291,
        "BTN_TOP2" => 292,
        "BTN_PINKIE" => 293,
        "BTN_BASE" => 294,
        "BTN_BASE2" => 295,
        "BTN_BASE3" => 296,
        "BTN_BASE4" => 297,
        "BTN_BASE5" => 298,
        "BTN_BASE6" => 299,
        "BTN_DEAD" => 303,

        // Gamepad buttons.
        "BTN_SOUTH" | "BTN_A" => 304,
        "BTN_EAST" | "BTN_B" => 305,
        "BTN_C" => 306,
        "BTN_NORTH" | "BTN_X" => 307,
        "BTN_WEST" | "BTN_Y" => 308,
        "BTN_Z" => 309,
        "BTN_TL" => 310,
        "BTN_TR" => 311,
        "BTN_TL2" => 312,
        "BTN_TR2" => 313,
        "BTN_SELECT" => 314,
        "BTN_START" => 315,
        "BTN_MODE" => 316,
        "BTN_THUMBL" => 317,
        "BTN_THUMBR" => 318,
        "BTN_TOUCH" => 330,

        // Absolute axes.
        "ABS_X" => 0,
        "ABS_Y" => 1,
        "ABS_Z" => 2,
        "ABS_RX" => 3,
        "ABS_RY" => 4,
        "ABS_RZ" => 5,
        "ABS_THROTTLE" => 6,
        "ABS_RUDDER" => 7,
        "ABS_WHEEL" => 8,
        "ABS_GAS" => 9,
        "ABS_BRAKE" => 10,
        "ABS_HAT0X" => 16,
        "ABS_HAT0Y" => 17,
        "ABS_HAT1X" => 18,
        "ABS_HAT1Y" => 19,
        "ABS_HAT2X" => 20,
        "ABS_HAT2Y" => 21,
        "ABS_HAT3X" => 22,
        "ABS_HAT3Y" => 23,
        "ABS_PRESSURE" => 24,

        // Relative axes.
        "REL_X" => 0,
        "REL_Y" => 1,
        "REL_Z" => 2,
        "REL_RX" => 3,
        "REL_RY" => 4,
        "REL_RZ" => 5,
        "REL_HWHEEL" => 6,
        "REL_DIAL" => 7,
        "REL_WHEEL" => 8,
        "REL_MISC" => 9,

        // Miscellaneous events (card readers, coin mechs).
        "MSC_SERIAL" => 0,
        "MSC_PULSELED" => 1,
        "MSC_GESTURE" => 2,
        "MSC_RAW" => 3,
        "MSC_SCAN" => 4,

        _ => return None,
    };
    Some(code)
}

// ---------------------------------------------------------------------------
// Mapping tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingKind {
    Switch,
    Analogue,
    Rotary,
    Hat,
    Card,
}

/// One line of a device input mapping.
#[derive(Debug, Clone)]
pub struct InputMapping {
    pub kind: MappingKind,
    pub code: u16,
    pub input: ControllerInput,
    /// Second logical button for HAT axes.
    pub input_secondary: Option<ControllerInput>,
    pub reverse: bool,
    pub multiplier: f64,
}

/// A parsed device input mapping file.
#[derive(Debug, Clone, Default)]
pub struct InputMappings {
    /// Fixed player slot; `None` assigns the next free slot.
    pub player: Option<u8>,
    pub mappings: Vec<InputMapping>,
}

/// One line of a game output mapping.
#[derive(Debug, Clone)]
pub struct OutputMapping {
    pub kind: MappingKind,
    pub input: ControllerInput,
    pub controller_player: u8,
    pub output: JvsInput,
    pub output_secondary: Option<JvsInput>,
    pub jvs_player: u8,
    pub reverse: bool,
    /// Route this rule to the chained IO board.
    pub secondary_io: bool,
}

/// A parsed game output mapping, plus the board overrides the game may
/// request.
#[derive(Debug, Clone, Default)]
pub struct OutputMappings {
    pub mappings: Vec<OutputMapping>,
    pub emulate_override: Option<String>,
    pub emulate_second_override: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsers
// ---------------------------------------------------------------------------

/// Parse a device input mapping from the `devices/` directory.
pub fn load_input_mapping(root: &ConfigRoot, name: &str) -> Result<InputMappings, ConfigError> {
    let mut mappings = InputMappings::default();
    parse_input_mapping_into(root, name, &mut mappings)?;
    Ok(mappings)
}

fn parse_input_mapping_into(
    root: &ConfigRoot,
    name: &str,
    mappings: &mut InputMappings,
) -> Result<(), ConfigError> {
    let path = root.device_mapping(name);

    for_each_directive(&path, |directive, tokens| {
        match directive {
            "INCLUDE" => {
                if let Some(included) = tokens.next() {
                    // An INCLUDE swaps in the named mapping wholesale;
                    // later lines still append on top of it.
                    let mut included_mappings = InputMappings::default();
                    match parse_input_mapping_into(root, included, &mut included_mappings) {
                        Ok(()) => *mappings = included_mappings,
                        Err(e) => warn!("INCLUDE {included} failed: {e}"),
                    }
                }
            }
            "PLAYER" => {
                mappings.player = tokens.next().and_then(|t| t.parse().ok());
            }
            code_name => {
                let Some(kind_char) = code_name.chars().next() else {
                    return;
                };
                let Some(code) = event_code(code_name) else {
                    warn!("unknown event code name {code_name} in {name}");
                    return;
                };
                let Some(input) = tokens.next().and_then(|t| t.parse::<ControllerInput>().ok())
                else {
                    warn!("missing or unknown controller input for {code_name} in {name}");
                    return;
                };

                match kind_char {
                    // Keys and buttons become switches.
                    'K' | 'B' | 'C' => mappings.mappings.push(InputMapping {
                        kind: MappingKind::Switch,
                        code,
                        input,
                        input_secondary: None,
                        reverse: false,
                        multiplier: 1.0,
                    }),

                    // Absolute axes: a button pair means a HAT, otherwise a
                    // plain analog axis with optional flags.
                    'A' => {
                        if input.is_button() {
                            let Some(secondary) =
                                tokens.next().and_then(|t| t.parse::<ControllerInput>().ok())
                            else {
                                warn!("HAT mapping {code_name} in {name} needs two buttons");
                                return;
                            };
                            mappings.mappings.push(InputMapping {
                                kind: MappingKind::Hat,
                                code,
                                input,
                                input_secondary: Some(secondary),
                                reverse: false,
                                multiplier: 1.0,
                            });
                        } else {
                            let (reverse, multiplier) = parse_flags(tokens);
                            mappings.mappings.push(InputMapping {
                                kind: MappingKind::Analogue,
                                code,
                                input,
                                input_secondary: None,
                                reverse,
                                multiplier,
                            });
                        }
                    }

                    // Relative axes accumulate into rotary channels.
                    'R' => {
                        let (reverse, multiplier) = parse_flags(tokens);
                        mappings.mappings.push(InputMapping {
                            kind: MappingKind::Rotary,
                            code,
                            input,
                            input_secondary: None,
                            reverse,
                            multiplier,
                        });
                    }

                    // Miscellaneous events from card readers and coin mechs.
                    'M' => mappings.mappings.push(InputMapping {
                        kind: MappingKind::Card,
                        code,
                        input,
                        input_secondary: None,
                        reverse: false,
                        multiplier: 1.0,
                    }),

                    other => warn!("unknown mapping directive prefix {other} in {name}"),
                }
            }
        }
    })
}

/// Trailing `[REVERSE] [SENSITIVITY v]` flags on analog and rotary lines.
fn parse_flags(tokens: &mut std::str::SplitWhitespace<'_>) -> (bool, f64) {
    let mut reverse = false;
    let mut multiplier = 1.0;
    while let Some(flag) = tokens.next() {
        match flag {
            "REVERSE" => reverse = true,
            "SENSITIVITY" => {
                if let Some(value) = tokens.next().and_then(|t| t.parse().ok()) {
                    multiplier = value;
                }
            }
            other => warn!("unknown mapping flag {other}"),
        }
    }
    (reverse, multiplier)
}

/// Parse a game output mapping from the `games/` directory.
pub fn load_output_mappings(root: &ConfigRoot, game: &str) -> Result<OutputMappings, ConfigError> {
    let mut mappings = OutputMappings::default();
    parse_output_mappings_into(root, game, &mut mappings)?;
    Ok(mappings)
}

fn parse_output_mappings_into(
    root: &ConfigRoot,
    game: &str,
    mappings: &mut OutputMappings,
) -> Result<(), ConfigError> {
    let path = root.game_mapping(game);

    for_each_directive(&path, |directive, tokens| {
        let mut directive = directive;
        let mut force_digital = false;
        let mut secondary_io = false;

        // Prefix tokens shift the directive along the line.
        loop {
            match directive {
                "DIGITAL" => force_digital = true,
                "SECONDARY" => secondary_io = true,
                _ => break,
            }
            match tokens.next() {
                Some(next) => directive = next,
                None => return,
            }
        }

        match directive {
            "INCLUDE" => {
                if let Some(included) = tokens.next() {
                    let mut included_mappings = OutputMappings::default();
                    match parse_output_mappings_into(root, included, &mut included_mappings) {
                        Ok(()) => *mappings = included_mappings,
                        Err(e) => warn!("INCLUDE {included} failed: {e}"),
                    }
                }
            }
            "EMULATE" => {
                mappings.emulate_override = tokens.next().map(str::to_string);
            }
            "EMULATE_SECOND" => {
                mappings.emulate_second_override = tokens.next().map(str::to_string);
            }
            input_name => {
                let Ok(input) = input_name.parse::<ControllerInput>() else {
                    warn!("unknown controller input {input_name} in game {game}");
                    return;
                };
                let Some(controller_player) = tokens.next().and_then(|t| t.parse().ok()) else {
                    warn!("missing player for {input_name} in game {game}");
                    return;
                };
                let Some(output) = tokens.next().and_then(|t| t.parse::<JvsInput>().ok()) else {
                    warn!("missing or unknown JVS input for {input_name} in game {game}");
                    return;
                };

                if input.is_button() || force_digital {
                    let Some(jvs_player) = tokens.next().and_then(|t| t.parse().ok()) else {
                        warn!("missing JVS player for {input_name} in game {game}");
                        return;
                    };
                    let mut mapping = OutputMapping {
                        kind: MappingKind::Switch,
                        input,
                        controller_player,
                        output,
                        output_secondary: None,
                        jvs_player,
                        reverse: false,
                        secondary_io,
                    };
                    for extra in tokens.by_ref() {
                        if extra == "REVERSE" {
                            mapping.reverse = true;
                        } else if let Ok(secondary) = extra.parse::<JvsInput>() {
                            mapping.output_secondary = Some(secondary);
                        }
                    }
                    mappings.mappings.push(mapping);
                } else {
                    let kind = if input.is_rotary() {
                        MappingKind::Rotary
                    } else {
                        MappingKind::Analogue
                    };
                    let reverse = tokens.next() == Some("REVERSE");
                    mappings.mappings.push(OutputMapping {
                        kind,
                        input,
                        controller_player,
                        output,
                        output_secondary: None,
                        jvs_player: 0,
                        reverse,
                        secondary_io,
                    });
                }
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Fully resolved destination for one event code.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub kind: MappingKind,
    pub output: JvsInput,
    pub output_secondary: Option<JvsInput>,
    pub jvs_player: u8,
    pub reverse: bool,
    pub multiplier: f64,
    pub secondary_io: bool,
}

/// Per-event-code lookup tables for one device's reader thread.
#[derive(Debug, Clone, Default)]
pub struct ResolvedInputs {
    pub key: HashMap<u16, ResolvedTarget>,
    pub rel: HashMap<u16, ResolvedTarget>,
    pub abs: HashMap<u16, ResolvedTarget>,
}

/// Last rule wins: walk the output mapping from the end and use the first
/// match for this controller input and player.
fn find_output<'a>(
    outputs: &'a OutputMappings,
    input: ControllerInput,
    player: u8,
) -> Option<&'a OutputMapping> {
    outputs
        .mappings
        .iter()
        .rev()
        .find(|m| m.input == input && m.controller_player == player)
}

/// Cross-reference a device's input mapping with the game's output mapping
/// for one player.
pub fn resolve(
    inputs: &InputMappings,
    outputs: &OutputMappings,
    player: u8,
) -> ResolvedInputs {
    let mut resolved = ResolvedInputs::default();

    for input_mapping in &inputs.mappings {
        let Some(output) = find_output(outputs, input_mapping.input, player) else {
            warn!(
                "no game mapping for {:?} (player {player})",
                input_mapping.input
            );
            continue;
        };

        let mut target = ResolvedTarget {
            kind: output.kind,
            output: output.output,
            output_secondary: output.output_secondary,
            jvs_player: output.jvs_player,
            reverse: output.reverse ^ input_mapping.reverse,
            multiplier: input_mapping.multiplier,
            secondary_io: output.secondary_io,
        };

        match input_mapping.kind {
            MappingKind::Hat => {
                // The two HAT directions resolve independently; both must
                // map for the axis to be usable.
                let secondary = input_mapping
                    .input_secondary
                    .and_then(|s| find_output(outputs, s, player));
                let Some(secondary) = secondary else {
                    warn!(
                        "no game mapping for HAT partner of {:?} (player {player})",
                        input_mapping.input
                    );
                    continue;
                };
                target.kind = MappingKind::Hat;
                target.output_secondary = Some(secondary.output);
                resolved.abs.insert(input_mapping.code, target);
            }

            MappingKind::Analogue if output.kind == MappingKind::Analogue => {
                resolved.abs.insert(input_mapping.code, target);
            }

            MappingKind::Rotary if output.kind == MappingKind::Rotary => {
                resolved.rel.insert(input_mapping.code, target);
            }

            MappingKind::Card => {
                target.kind = MappingKind::Card;
                resolved.key.insert(input_mapping.code, target);
            }

            _ if input_mapping.kind == MappingKind::Switch
                || output.kind == MappingKind::Switch =>
            {
                // Key events and abs-as-button axes share the same switch
                // target; register the code in both tables.
                target.kind = MappingKind::Switch;
                resolved.key.insert(input_mapping.code, target.clone());
                resolved.abs.insert(input_mapping.code, target);
            }

            _ => warn!(
                "mapping kind mismatch for {:?}: device says {:?}, game says {:?}",
                input_mapping.input, input_mapping.kind, output.kind
            ),
        }
    }

    resolved
}
