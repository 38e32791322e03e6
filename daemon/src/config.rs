//! Line-oriented configuration: the main config file, board capability
//! files and the rotary map.
//!
//! All dialects share the same shape: `#`-prefixed comments, one directive
//! per line, whitespace-separated tokens. Unknown directives are logged and
//! skipped so old configs keep loading.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::warn;

use jvs_core::board::Capabilities;

/// Deadzones are clamped below this so the rescale never divides by zero.
const MAX_ANALOG_DEADZONE: f64 = 0.5;
const DEADZONE_CLAMP_OFFSET: f64 = 0.01;

/// Rotary encoder positions, and therefore lines in the rotary map.
pub const MAX_ROTARY_POSITIONS: usize = 16;

/// Where the config tree lives and how its pieces are named.
#[derive(Debug, Clone)]
pub struct ConfigRoot {
    root: PathBuf,
}

impl ConfigRoot {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn main_config(&self) -> PathBuf {
        self.root.join("config")
    }

    pub fn device_mapping(&self, name: &str) -> PathBuf {
        self.root.join("devices").join(name)
    }

    pub fn game_mapping(&self, name: &str) -> PathBuf {
        self.root.join("games").join(name)
    }

    pub fn io(&self, name: &str) -> PathBuf {
        self.root.join("ios").join(name)
    }

    pub fn rotary(&self) -> PathBuf {
        self.root.join("rotary")
    }
}

/// Errors surfaced while loading the configuration tree at startup.
#[derive(Debug)]
pub enum ConfigError {
    NotFound(PathBuf),
    Io(PathBuf, io::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "config file not found: {}", path.display()),
            Self::Io(path, e) => write!(f, "failed to read {}: {e}", path.display()),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Read a config file and hand each directive line to the callback as a
/// token iterator (the directive itself already consumed).
pub fn for_each_directive<F>(path: &Path, mut handler: F) -> Result<(), ConfigError>
where
    F: FnMut(&str, &mut std::str::SplitWhitespace<'_>),
{
    let text = fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound(path.to_path_buf())
        } else {
            ConfigError::Io(path.to_path_buf(), e)
        }
    })?;

    for line in text.lines() {
        // Comments, blanks and indented lines are skipped.
        if line.is_empty() || line.starts_with('#') || line.starts_with(char::is_whitespace) {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let Some(directive) = tokens.next() else {
            continue;
        };
        handler(directive, &mut tokens);
    }

    Ok(())
}

fn clamp_deadzone(deadzone: f64) -> f64 {
    if deadzone < 0.0 {
        0.0
    } else if deadzone >= MAX_ANALOG_DEADZONE {
        MAX_ANALOG_DEADZONE - DEADZONE_CLAMP_OFFSET
    } else {
        deadzone
    }
}

/// The main daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub sense_line_type: u8,
    pub sense_line_pin: u32,
    pub default_game: String,
    pub device_path: PathBuf,
    pub debug_level: u8,
    /// Board profile or capability-file name for the head node.
    pub capabilities_name: String,
    /// Optional second, chained board.
    pub second_capabilities_name: Option<String>,
    pub auto_controller_detection: bool,
    pub analog_deadzones: [f64; 4],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sense_line_type: 0,
            sense_line_pin: 12,
            default_game: "generic".to_string(),
            device_path: PathBuf::from("/dev/ttyUSB0"),
            debug_level: 1,
            capabilities_name: "generic".to_string(),
            second_capabilities_name: None,
            auto_controller_detection: true,
            analog_deadzones: [0.0; 4],
        }
    }
}

/// Load the main config, following INCLUDE directives recursively. Later
/// directives win over earlier ones.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let mut config = Config::default();
    parse_config_into(path, &mut config)?;
    Ok(config)
}

fn parse_config_into(path: &Path, config: &mut Config) -> Result<(), ConfigError> {
    for_each_directive(path, |directive, tokens| {
        let value = tokens.next();
        match (directive, value) {
            ("INCLUDE", Some(included)) => {
                if let Err(e) = parse_config_into(Path::new(included), config) {
                    warn!("INCLUDE {included} failed: {e}");
                }
            }
            ("SENSE_LINE_TYPE", Some(v)) => {
                config.sense_line_type = v.parse().unwrap_or(config.sense_line_type);
            }
            ("SENSE_LINE_PIN", Some(v)) => {
                config.sense_line_pin = v.parse().unwrap_or(config.sense_line_pin);
            }
            ("EMULATE", Some(v)) => config.capabilities_name = v.to_string(),
            ("EMULATE_SECOND", Some(v)) => {
                config.second_capabilities_name = Some(v.to_string());
            }
            ("DEFAULT_GAME", Some(v)) => config.default_game = v.to_string(),
            ("DEVICE_PATH", Some(v)) => config.device_path = PathBuf::from(v),
            ("DEBUG_MODE", Some(v)) => {
                config.debug_level = v.parse().unwrap_or(config.debug_level);
            }
            ("AUTO_CONTROLLER_DETECTION", Some(v)) => {
                config.auto_controller_detection = v.parse::<u8>().unwrap_or(1) != 0;
            }
            ("ANALOG_DEADZONE_PLAYER_1", Some(v)) => {
                config.analog_deadzones[0] = clamp_deadzone(v.parse().unwrap_or(0.0));
            }
            ("ANALOG_DEADZONE_PLAYER_2", Some(v)) => {
                config.analog_deadzones[1] = clamp_deadzone(v.parse().unwrap_or(0.0));
            }
            ("ANALOG_DEADZONE_PLAYER_3", Some(v)) => {
                config.analog_deadzones[2] = clamp_deadzone(v.parse().unwrap_or(0.0));
            }
            ("ANALOG_DEADZONE_PLAYER_4", Some(v)) => {
                config.analog_deadzones[3] = clamp_deadzone(v.parse().unwrap_or(0.0));
            }
            (other, _) => warn!("unknown configuration directive {other}"),
        }
    })
}

/// Load a board capability file from the `ios/` directory.
pub fn load_capabilities(root: &ConfigRoot, name: &str) -> Result<Capabilities, ConfigError> {
    let mut caps = Capabilities::default();
    let path = root.io(name);

    for_each_directive(&path, |directive, tokens| {
        // NAME and DISPLAY_NAME keep their spaces; everything else is a
        // single numeric token.
        if directive == "NAME" || directive == "DISPLAY_NAME" {
            let rest: Vec<&str> = tokens.collect();
            let value = rest.join(" ");
            if directive == "NAME" {
                caps.name = value;
            } else {
                caps.display_name = value;
            }
            return;
        }

        let Some(value) = tokens.next().and_then(|v| v.parse::<u8>().ok()) else {
            warn!("capability directive {directive} missing numeric value");
            return;
        };

        match directive {
            "COMMAND_VERSION" => caps.command_version = value,
            "JVS_VERSION" => caps.jvs_version = value,
            "COMMS_VERSION" => caps.comms_version = value,
            "PLAYERS" => caps.players = value,
            "SWITCHES" => caps.switches = value,
            "COINS" => caps.coins = value,
            "ANALOGUE_IN_CHANNELS" => caps.analogue_in_channels = value,
            "ANALOGUE_IN_BITS" => caps.analogue_in_bits = value,
            "ROTARY_CHANNELS" => caps.rotary_channels = value,
            "KEYPAD" => caps.keypad = value,
            "GUN_CHANNELS" => caps.gun_channels = value,
            "GUN_X_BITS" => caps.gun_x_bits = value,
            "GUN_Y_BITS" => caps.gun_y_bits = value,
            "GENERAL_PURPOSE_INPUTS" => caps.general_purpose_inputs = value,
            "CARD" => caps.card = value,
            "HOPPER" => caps.hopper = value,
            "GENERAL_PURPOSE_OUTPUTS" => caps.general_purpose_outputs = value,
            "ANALOGUE_OUT_CHANNELS" => caps.analogue_out_channels = value,
            "DISPLAY_OUT_ROWS" => caps.display_out_rows = value,
            "DISPLAY_OUT_COLUMNS" => caps.display_out_columns = value,
            "DISPLAY_OUT_ENCODINGS" => caps.display_out_encodings = value,
            "BACKUP" => caps.backup = value,
            "RIGHT_ALIGN_BITS" => caps.right_align_bits = value,
            other => warn!("unknown capability directive {other}"),
        }
    })?;

    Ok(caps)
}

/// Read the rotary map and return the game name for a position. Missing
/// lines default to "generic".
pub fn load_rotary_map(path: &Path, position: u8) -> Result<String, ConfigError> {
    let position = if (position as usize) < MAX_ROTARY_POSITIONS {
        position as usize
    } else {
        warn!("invalid rotary position {position}, using 0");
        0
    };

    let text = fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound(path.to_path_buf())
        } else {
            ConfigError::Io(path.to_path_buf(), e)
        }
    })?;

    Ok(text
        .lines()
        .nth(position)
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .unwrap_or_else(|| "generic".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("jvsd_config_test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn parses_main_config_directives() {
        let path = write_temp(
            "main",
            "# comment\n\
             SENSE_LINE_TYPE 2\n\
             SENSE_LINE_PIN 7\n\
             EMULATE sega-type-3\n\
             DEFAULT_GAME daytona\n\
             DEVICE_PATH /dev/ttyS1\n\
             DEBUG_MODE 2\n\
             AUTO_CONTROLLER_DETECTION 0\n\
             ANALOG_DEADZONE_PLAYER_1 0.15\n",
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.sense_line_type, 2);
        assert_eq!(config.sense_line_pin, 7);
        assert_eq!(config.capabilities_name, "sega-type-3");
        assert_eq!(config.default_game, "daytona");
        assert_eq!(config.device_path, PathBuf::from("/dev/ttyS1"));
        assert_eq!(config.debug_level, 2);
        assert!(!config.auto_controller_detection);
        assert_eq!(config.analog_deadzones[0], 0.15);
    }

    #[test]
    fn deadzone_is_clamped_below_half() {
        let path = write_temp(
            "deadzone",
            "ANALOG_DEADZONE_PLAYER_1 0.9\nANALOG_DEADZONE_PLAYER_2 -0.3\n",
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.analog_deadzones[0], 0.49);
        assert_eq!(config.analog_deadzones[1], 0.0);
    }

    #[test]
    fn include_pulls_in_another_file() {
        let inner = write_temp("inner", "DEBUG_MODE 3\n");
        let path = write_temp("outer", &format!("INCLUDE {}\nSENSE_LINE_PIN 9\n", inner.display()));
        let config = load_config(&path).unwrap();
        assert_eq!(config.debug_level, 3);
        assert_eq!(config.sense_line_pin, 9);
    }

    #[test]
    fn missing_file_is_not_found() {
        let result = load_config(Path::new("/nonexistent/jvsd/config"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn capability_file_parses_field_set() {
        let dir = std::env::temp_dir().join("jvsd_config_test_ios");
        fs::create_dir_all(dir.join("ios")).unwrap();
        fs::write(
            dir.join("ios").join("custom"),
            "NAME TEST CO.,LTD.;Custom I/O;Ver1.00\n\
             DISPLAY_NAME Custom Board\n\
             PLAYERS 2\n\
             SWITCHES 12\n\
             COINS 2\n\
             ANALOGUE_IN_CHANNELS 4\n\
             ANALOGUE_IN_BITS 12\n\
             RIGHT_ALIGN_BITS 1\n",
        )
        .unwrap();

        let root = ConfigRoot::new(dir);
        let caps = load_capabilities(&root, "custom").unwrap();
        assert_eq!(caps.name, "TEST CO.,LTD.;Custom I/O;Ver1.00");
        assert_eq!(caps.display_name, "Custom Board");
        assert_eq!(caps.players, 2);
        assert_eq!(caps.analogue_in_bits, 12);
        assert_eq!(caps.right_align_bits, 1);
    }

    #[test]
    fn rotary_map_selects_line_and_defaults_to_generic() {
        let path = write_temp("rotary", "daytona\nsega-rally\n\n");
        assert_eq!(load_rotary_map(&path, 0).unwrap(), "daytona");
        assert_eq!(load_rotary_map(&path, 1).unwrap(), "sega-rally");
        assert_eq!(load_rotary_map(&path, 2).unwrap(), "generic");
        assert_eq!(load_rotary_map(&path, 9).unwrap(), "generic");
        // Out-of-range positions clamp to the first line.
        assert_eq!(load_rotary_map(&path, 200).unwrap(), "daytona");
    }
}
