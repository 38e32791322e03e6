//! jvsd: emulates a JVS I/O board on an RS-485 serial link, feeding it
//! from evdev input devices and driving force feedback back out.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use log::{LevelFilter, debug, error, info, trace, warn};

use jvs_boards::registry;
use jvs_core::board::{Capabilities, IoBoard};
use jvs_core::protocol::{Engine, JvsError};

mod config;
mod ffb;
mod gpio;
mod input;
mod mapping;
mod serial;
mod watchdog;

use config::{Config, ConfigError, ConfigRoot};
use ffb::FfbEngine;
use gpio::{RotarySelector, SenseLine, SenseLineMode};
use serial::{DeviceError, SerialDevice};

#[derive(Parser)]
#[command(
    name = "jvsd",
    version,
    about = "Emulate a JVS I/O board over an RS-485 link"
)]
struct Args {
    /// Game output mapping to use, overriding DEFAULT_GAME and the rotary
    /// selector.
    game: Option<String>,

    /// Configuration directory.
    #[arg(long, default_value = "/etc/jvsd")]
    config: PathBuf,
}

#[derive(Debug)]
enum DaemonError {
    Config(ConfigError),
    Device(DeviceError),
}

impl std::fmt::Display for DaemonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{e}"),
            Self::Device(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DaemonError {}

impl From<ConfigError> for DaemonError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<DeviceError> for DaemonError {
    fn from(e: DeviceError) -> Self {
        Self::Device(e)
    }
}

fn main() {
    let args = Args::parse();
    let root = ConfigRoot::new(args.config.clone());

    // The logger level follows DEBUG_MODE unless RUST_LOG overrides it.
    let config = load_config_or_default(&root);
    init_logger(config.debug_level);

    info!("jvsd starting, config root {}", args.config.display());

    // Each session runs until the watchdog notices the rotary selector or
    // the device set changed, then everything is rebuilt from config.
    loop {
        match run_session(&root, args.game.as_deref()) {
            Ok(()) => info!("session ended, reinitialising"),
            Err(e) => {
                error!("{e}");
                std::process::exit(1);
            }
        }
    }
}

fn init_logger(debug_level: u8) {
    let level = match debug_level {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(level);
    }
    builder.init();
}

fn load_config_or_default(root: &ConfigRoot) -> Config {
    match config::load_config(&root.main_config()) {
        Ok(config) => config,
        Err(e) => {
            warn!("{e}, using defaults");
            Config::default()
        }
    }
}

/// Resolve an EMULATE name: built-in board profiles first, then capability
/// files under ios/.
fn resolve_capabilities(root: &ConfigRoot, name: &str) -> Result<Capabilities, ConfigError> {
    if let Some(entry) = registry::find(name) {
        return Ok((entry.create)());
    }
    config::load_capabilities(root, name)
}

fn run_session(root: &ConfigRoot, cli_game: Option<&str>) -> Result<(), DaemonError> {
    let config = load_config_or_default(root);

    let rotary = RotarySelector::probe();
    let game = match cli_game {
        Some(game) => game.to_string(),
        None => match rotary.as_ref().and_then(|r| r.value()) {
            Some(position) => match config::load_rotary_map(&root.rotary(), position) {
                Ok(game) => {
                    info!("rotary position {position} selects game {game}");
                    game
                }
                Err(e) => {
                    debug!("{e}, using {}", config.default_game);
                    config.default_game.clone()
                }
            },
            None => config.default_game.clone(),
        },
    };

    let outputs = mapping::load_output_mappings(root, &game)?;
    info!("game {game}: {} mapping rule(s)", outputs.mappings.len());

    // The game mapping may force specific boards.
    let head_name = outputs
        .emulate_override
        .clone()
        .unwrap_or_else(|| config.capabilities_name.clone());
    let second_name = outputs
        .emulate_second_override
        .clone()
        .or_else(|| config.second_capabilities_name.clone());

    let head_caps = resolve_capabilities(root, &head_name)?;
    info!("emulating {} ({})", head_name, head_caps.name);
    let mut head = IoBoard::new(head_caps);
    if let Some(second) = &second_name {
        let second_caps = resolve_capabilities(root, second)?;
        info!("chaining second board {} ({})", second, second_caps.name);
        head.chain(IoBoard::new(second_caps));
    }

    let primary_state = head.state();
    let secondary_state = head.next().map(|board| board.state());

    let sense = SenseLine::new(
        SenseLineMode::from_config(config.sense_line_type),
        config.sense_line_pin,
    );
    let mut serial = SerialDevice::open(&config.device_path, sense)?;

    let session_running = Arc::new(AtomicBool::new(true));
    let threads_running = Arc::new(AtomicBool::new(true));

    let mut handles = input::start_readers(
        root,
        &outputs,
        &config,
        primary_state,
        secondary_state,
        Arc::clone(&threads_running),
    );

    let ffb_engine = FfbEngine::new();
    let mut engine = Engine::new(head);
    engine.set_output_sink(ffb_engine.bridge());
    handles.push(ffb_engine.spawn_worker(ffb::find_ff_device(), Arc::clone(&threads_running)));

    handles.push(watchdog::spawn(
        Arc::clone(&session_running),
        Arc::clone(&threads_running),
        rotary,
    ));

    // The protocol loop: errors are logged and the loop re-arms; SYNC makes
    // the stream self-resynchronising.
    while session_running.load(Ordering::Relaxed) {
        match engine.process_packet(&mut serial) {
            Ok(()) => {}
            Err(JvsError::Timeout) => {}
            Err(JvsError::NotForUs) => trace!("packet for another device"),
            Err(e) => warn!("packet error: {e}"),
        }
    }

    debug!(
        "wheel status at shutdown: {:02X?}",
        ffb_engine.status_bytes()
    );

    threads_running.store(false, Ordering::Relaxed);
    for handle in handles {
        let _ = handle.join();
    }

    Ok(())
}
