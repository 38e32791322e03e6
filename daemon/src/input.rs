//! The input engine: device discovery, mapping-driven reader threads and
//! the Wii Remote IR light-gun reader.

use std::collections::HashMap;
use std::fs;
use std::os::fd::{AsRawFd, BorrowedFd};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use evdev::{Device, EventType, InputEvent, Key};
use log::{debug, info, warn};
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};

use jvs_core::board::{BoardState, JvsInput};

use crate::config::{Config, ConfigRoot};
use crate::mapping::{
    MappingKind, OutputMappings, ResolvedInputs, ResolvedTarget, load_input_mapping, resolve,
};

const DEV_INPUT_DIR: &str = "/dev/input";

/// Event-device names that are never game controllers.
const FILTERED_DEVICE_PATTERNS: &[&str] = &[
    // Audio/HDMI devices.
    "vc4-hdmi",
    "HDMI",
    "hdmi",
    "headphone",
    "Headphone",
    // Sound devices.
    "snd_bcm2835",
    "snd_hda",
    "snd_usb",
    "pcspkr",
    "PC Speaker",
    // Power management.
    "Power Button",
    "power-button",
    "Sleep Button",
    "Lid Switch",
    // Video pseudo-devices.
    "Video Bus",
];

/// The AimTrak light gun enumerates three event nodes with one shared name;
/// they are told apart by arrival order and share one mapping file.
const AIMTRAK_DEVICE_NAME: &str = "ultimarc-atrak-device";
const AIMTRAK_REMAP_JOYSTICK: &str = "ultimarc-atrak-device-joystick";
const AIMTRAK_REMAP_OUT_SCREEN: &str = "ultimarc-atrak-device-out-screen";
const AIMTRAK_REMAP_IN_SCREEN: &str = "ultimarc-atrak-device-in-screen";

const WIIMOTE_DEVICE_NAME: &str = "nintendo-wii-remote";
const WIIMOTE_DEVICE_NAME_IR: &str = "nintendo-wii-remote-ir";

/// Wii Remote IR camera axes (ABS_HAT0X..ABS_HAT1Y) and its off-screen key.
const IR_X0: u16 = 16;
const IR_Y0: u16 = 17;
const IR_X1: u16 = 18;
const IR_Y1: u16 = 19;
const OFF_SCREEN_KEY: u16 = 24; // KEY_O

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Unknown,
    Joystick,
    Keyboard,
    Mouse,
}

/// One discovered controller candidate.
#[derive(Debug, Clone)]
pub struct InputDevice {
    pub path: PathBuf,
    /// Normalized name: lowercased, with spaces and brackets dashed.
    pub name: String,
    pub display_name: String,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
    pub bus: u16,
    /// Physical location truncated at the first '/', e.g. a USB port path.
    pub physical_location: String,
    pub kind: DeviceKind,
}

pub fn normalize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c.to_ascii_lowercase() {
            ' ' | '/' | '(' | ')' => '-',
            lower => lower,
        })
        .collect()
}

fn is_filtered(display_name: &str) -> bool {
    FILTERED_DEVICE_PATTERNS
        .iter()
        .any(|pattern| display_name.contains(pattern))
}

/// Number of event devices currently present; the watchdog compares this
/// against the count at startup.
pub fn count_event_devices() -> usize {
    fs::read_dir(DEV_INPUT_DIR)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.file_name().to_string_lossy().starts_with("event"))
                .count()
        })
        .unwrap_or(0)
}

/// Infer what kind of controller a device is from its capability bitmaps.
fn infer_kind(device: &Device) -> DeviceKind {
    let supported = device.supported_events();
    let has_abs = supported.contains(EventType::ABSOLUTE);
    let has_rep = supported.contains(EventType::REPEAT);
    let has_key = supported.contains(EventType::KEY);
    let has_rel = supported.contains(EventType::RELATIVE);

    let mut kind = DeviceKind::Unknown;

    // Repeating key events without absolute axes: a keyboard.
    if !has_abs && has_rep && has_key {
        kind = DeviceKind::Keyboard;
    }

    // Relative axes: a mouse.
    if has_rel {
        kind = DeviceKind::Mouse;
    }

    // A start button: a joystick.
    if has_key
        && device
            .supported_keys()
            .is_some_and(|keys| keys.contains(Key::BTN_START))
    {
        kind = DeviceKind::Joystick;
    }

    kind
}

/// Scan /dev/input, drop non-controllers, normalize names, and sort by
/// (bus type, physical location) for stable player-slot assignment.
pub fn enumerate_devices() -> Vec<InputDevice> {
    let mut paths: Vec<PathBuf> = match fs::read_dir(DEV_INPUT_DIR) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with("event"))
            })
            .collect(),
        Err(e) => {
            warn!("failed to scan {DEV_INPUT_DIR}: {e}");
            return Vec::new();
        }
    };
    paths.sort();

    let aimtrak_personas = [
        AIMTRAK_REMAP_JOYSTICK,
        AIMTRAK_REMAP_OUT_SCREEN,
        AIMTRAK_REMAP_IN_SCREEN,
    ];
    let mut aimtrak_count = 0;

    let mut devices = Vec::new();
    for path in paths {
        let Ok(device) = Device::open(&path) else {
            continue;
        };

        let display_name = device.name().unwrap_or("Unknown").to_string();
        if is_filtered(&display_name) {
            continue;
        }

        let id = device.input_id();
        let physical_location = device
            .physical_path()
            .unwrap_or("")
            .split('/')
            .next()
            .unwrap_or("")
            .to_string();

        let mut name = normalize_name(&display_name);
        if name == AIMTRAK_DEVICE_NAME {
            name = aimtrak_personas[aimtrak_count].to_string();
            aimtrak_count = (aimtrak_count + 1) % aimtrak_personas.len();
        }

        devices.push(InputDevice {
            path,
            name,
            display_name,
            vendor: id.vendor(),
            product: id.product(),
            version: id.version(),
            bus: id.bus_type().0,
            physical_location,
            kind: infer_kind(&device),
        });
    }

    // USB before Bluetooth, then port order, so replugging a pad does not
    // shuffle player slots.
    devices.sort_by(|a, b| {
        a.bus
            .cmp(&b.bus)
            .then_with(|| a.physical_location.cmp(&b.physical_location))
    });

    devices
}

// ---------------------------------------------------------------------------
// Reader threads
// ---------------------------------------------------------------------------

/// Everything a reader thread owns; the handle to the board state is shared,
/// the device is exclusive.
pub struct ReaderContext {
    pub path: PathBuf,
    pub display_name: String,
    pub resolved: ResolvedInputs,
    pub deadzone: f64,
    pub kind: DeviceKind,
    pub lightgun: bool,
    pub primary: Arc<BoardState>,
    pub secondary: Option<Arc<BoardState>>,
}

impl ReaderContext {
    /// The board a target writes to, honouring its secondary-IO flag.
    fn state_for<'a>(&'a self, target: &ResolvedTarget) -> &'a BoardState {
        if target.secondary_io {
            if let Some(secondary) = &self.secondary {
                return secondary;
            }
        }
        &self.primary
    }
}

pub fn spawn_reader(ctx: ReaderContext, running: Arc<AtomicBool>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let device = match Device::open(&ctx.path) {
            Ok(device) => device,
            Err(e) => {
                warn!("failed to open {}: {e}", ctx.path.display());
                return;
            }
        };
        if ctx.lightgun {
            lightgun_loop(device, &ctx, &running);
        } else {
            reader_loop(device, &ctx, &running);
        }
    })
}

/// Wait up to ~2 ms for the device to become readable, so the thread can
/// notice the cancellation flag between events.
fn wait_readable(device: &Device) -> bool {
    let fd = unsafe { BorrowedFd::borrow_raw(device.as_raw_fd()) };
    let mut fds = [PollFd::new(fd, PollFlags::POLLIN)];
    matches!(poll(&mut fds, PollTimeout::from(2u8)), Ok(n) if n > 0)
}

/// (min, max) per absolute axis, straight from the driver.
fn axis_ranges(device: &Device) -> HashMap<u16, (f64, f64)> {
    let mut ranges = HashMap::new();
    if let Ok(abs_state) = device.get_abs_state() {
        for (code, info) in abs_state.iter().enumerate() {
            if info.minimum != info.maximum {
                ranges.insert(code as u16, (f64::from(info.minimum), f64::from(info.maximum)));
            }
        }
    }
    ranges
}

/// Radial deadzone: inputs inside the circle collapse to centre, the rest
/// of the range rescales linearly while preserving the stick angle.
fn apply_deadzone(x: f64, y: f64, deadzone: f64) -> (f64, f64) {
    if deadzone >= 1.0 {
        return (0.5, 0.5);
    }
    let deadzone = deadzone.max(0.0);

    let dx = (x - 0.5) * 2.0;
    let dy = (y - 0.5) * 2.0;
    let magnitude = (dx * dx + dy * dy).sqrt();

    if magnitude < deadzone {
        return (0.5, 0.5);
    }

    let scale = ((magnitude - deadzone) / (1.0 - deadzone)).min(1.0);
    let (nx, ny) = if magnitude > 0.0 {
        (dx / magnitude, dy / magnitude)
    } else {
        (0.0, 0.0)
    };

    ((nx * scale + 1.0) * 0.5, (ny * scale + 1.0) * 0.5)
}

/// Tracks the latest scaled position of both sticks so the radial deadzone
/// can be computed pairwise even though axes arrive one event at a time.
struct StickFilter {
    left: (f64, f64),
    right: (f64, f64),
}

impl StickFilter {
    fn new() -> Self {
        Self {
            left: (0.5, 0.5),
            right: (0.5, 0.5),
        }
    }

    /// Feed one axis update; returns the deadzone-filtered value for that
    /// axis. Axes outside the two stick pairs pass through unchanged.
    fn apply(&mut self, code: u16, scaled: f64, deadzone: f64) -> f64 {
        match code {
            0 => {
                self.left.0 = scaled;
                apply_deadzone(self.left.0, self.left.1, deadzone).0
            }
            1 => {
                self.left.1 = scaled;
                apply_deadzone(self.left.0, self.left.1, deadzone).1
            }
            3 => {
                self.right.0 = scaled;
                apply_deadzone(self.right.0, self.right.1, deadzone).0
            }
            4 => {
                self.right.1 = scaled;
                apply_deadzone(self.right.0, self.right.1, deadzone).1
            }
            _ => scaled,
        }
    }
}

fn reader_loop(mut device: Device, ctx: &ReaderContext, running: &AtomicBool) {
    let ranges = axis_ranges(&device);
    let mut sticks = StickFilter::new();

    prime_axes(&device, ctx, &ranges, &mut sticks);

    while running.load(Ordering::Relaxed) {
        if !wait_readable(&device) {
            continue;
        }

        let events: Vec<InputEvent> = match device.fetch_events() {
            Ok(events) => events.collect(),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
            Err(e) => {
                warn!("{}: read failed, stopping reader: {e}", ctx.display_name);
                break;
            }
        };

        for event in events {
            handle_event(&event, ctx, &ranges, &mut sticks);
        }
    }
}

/// Seed the analog channels from the axes' current positions so the first
/// poll after boot reports real values instead of zeroes.
fn prime_axes(
    device: &Device,
    ctx: &ReaderContext,
    ranges: &HashMap<u16, (f64, f64)>,
    sticks: &mut StickFilter,
) {
    let Ok(abs_state) = device.get_abs_state() else {
        return;
    };
    for (&code, target) in &ctx.resolved.abs {
        if target.kind != MappingKind::Analogue {
            continue;
        }
        let Some(info) = abs_state.get(code as usize) else {
            continue;
        };
        write_analog(ctx, ranges, sticks, code, i64::from(info.value), target);
    }
}

fn handle_event(
    event: &InputEvent,
    ctx: &ReaderContext,
    ranges: &HashMap<u16, (f64, f64)>,
    sticks: &mut StickFilter,
) {
    let code = event.code();
    let value = event.value();

    match event.event_type() {
        EventType::KEY => {
            let Some(target) = ctx.resolved.key.get(&code) else {
                return;
            };
            let state = ctx.state_for(target);

            if target.output == JvsInput::Coin {
                if value == 1 {
                    state.add_coins(coin_slot(target.jvs_player), 1);
                }
                return;
            }

            let pressed = value != 0;
            state.set_switch(target.jvs_player as usize, target.output, pressed);
            if let Some(secondary) = target.output_secondary {
                state.set_switch(target.jvs_player as usize, secondary, pressed);
            }
        }

        EventType::RELATIVE => {
            let Some(target) = ctx.resolved.rel.get(&code) else {
                return;
            };
            let Some(channel) = target.output.rotary_channel() else {
                return;
            };
            let state = ctx.state_for(target);
            let delta = if target.reverse { -value } else { value };
            state.add_rotary(channel, delta);
        }

        EventType::ABSOLUTE => {
            let Some(target) = ctx.resolved.abs.get(&code) else {
                return;
            };
            match target.kind {
                MappingKind::Hat => {
                    let Some(&(min, max)) = ranges.get(&code) else {
                        return;
                    };
                    let state = &ctx.primary;
                    let player = target.jvs_player as usize;
                    if f64::from(value) == min {
                        state.set_switch(player, target.output, true);
                    } else if f64::from(value) == max {
                        if let Some(secondary) = target.output_secondary {
                            state.set_switch(player, secondary, true);
                        }
                    } else {
                        state.set_switch(player, target.output, false);
                        if let Some(secondary) = target.output_secondary {
                            state.set_switch(player, secondary, false);
                        }
                    }
                }

                MappingKind::Switch => {
                    let Some(&(min, max)) = ranges.get(&code) else {
                        return;
                    };
                    let state = &ctx.primary;
                    let value = f64::from(value);
                    if target.output == JvsInput::Coin {
                        if value == max {
                            state.add_coins(coin_slot(target.jvs_player), 1);
                        }
                    } else if value == min {
                        state.set_switch(target.jvs_player as usize, target.output, false);
                    } else {
                        state.set_switch(target.jvs_player as usize, target.output, true);
                    }
                }

                MappingKind::Analogue => {
                    write_analog(ctx, ranges, sticks, code, i64::from(value), target);
                }

                _ => {}
            }
        }

        EventType::MISC => {
            let Some(target) = ctx.resolved.key.get(&code) else {
                return;
            };
            // The event value is the batch size, so card readers can insert
            // several credits at once.
            if target.output == JvsInput::Coin && value > 0 {
                let state = ctx.state_for(target);
                state.add_coins(coin_slot(target.jvs_player), value.min(0xFFFF) as u16);
            }
        }

        _ => {}
    }
}

/// Scale, deadzone-filter and reverse one analog sample, then store it in
/// the analog channel and mirror it into the gun channel.
fn write_analog(
    ctx: &ReaderContext,
    ranges: &HashMap<u16, (f64, f64)>,
    sticks: &mut StickFilter,
    code: u16,
    raw: i64,
    target: &ResolvedTarget,
) {
    let Some(&(min, max)) = ranges.get(&code) else {
        return;
    };
    let Some(channel) = target.output.analogue_channel() else {
        return;
    };

    let scaled = ((raw as f64 * target.multiplier) - min) / (max - min);
    let scaled = scaled.clamp(0.0, 1.0);

    // Stick pairs on joysticks get the radial deadzone; triggers, throttle
    // and brake keep full travel.
    let stick_axis = matches!(code, 0 | 1 | 3 | 4);
    let filtered = if ctx.kind == DeviceKind::Joystick && ctx.deadzone > 0.0 && stick_axis {
        sticks.apply(code, scaled, ctx.deadzone)
    } else {
        scaled
    };

    let value = if target.reverse { 1.0 - filtered } else { filtered };
    ctx.primary.set_analog(channel, value);
    ctx.primary.set_gun(channel, value);
}

/// Coin slots are per player, 1-indexed on the JVS side.
fn coin_slot(jvs_player: u8) -> usize {
    (jvs_player.max(1) - 1) as usize
}

// ---------------------------------------------------------------------------
// Wii Remote IR light gun
// ---------------------------------------------------------------------------

/// Dedicated reader for the Wii Remote's IR camera: two tracked IR sources
/// are combined into a rotation-corrected screen position.
fn lightgun_loop(mut device: Device, ctx: &ReaderContext, running: &AtomicBool) {
    // 1023 on any coordinate means the camera lost that source.
    let (mut x0, mut y0, mut x1, mut y1) = (0i32, 0i32, 0i32, 0i32);

    while running.load(Ordering::Relaxed) {
        if !wait_readable(&device) {
            continue;
        }

        let events: Vec<InputEvent> = match device.fetch_events() {
            Ok(events) => events.collect(),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
            Err(e) => {
                warn!("{}: read failed, stopping reader: {e}", ctx.display_name);
                break;
            }
        };

        for event in events {
            if event.event_type() != EventType::ABSOLUTE {
                continue;
            }
            match event.code() {
                IR_X0 => x0 = event.value(),
                IR_Y0 => y0 = event.value(),
                IR_X1 => x1 = event.value(),
                IR_Y1 => y1 = event.value(),
                _ => continue,
            }

            let mut on_screen = false;
            if x0 != 1023 && x1 != 1023 && y0 != 1023 && y1 != 1023 {
                // Sort the two sources so "one" is the rightmost; the gun
                // aims at the midpoint, corrected for the bar's roll angle.
                let (one_x, one_y, two_x, two_y) = if x0 > x1 {
                    (x0, y0, x1, y1)
                } else {
                    (x1, y1, x0, y0)
                };

                let angle = -f64::from(two_y - one_y).atan2(f64::from(two_x - one_x));
                let mid_x = f64::from(one_x - two_x) / 2.0 + f64::from(two_x);
                let mid_y = f64::from(one_y - two_y) / 2.0 + f64::from(two_y);

                let value_x =
                    512.0 + angle.cos() * (mid_x - 512.0) - angle.sin() * (mid_y - 384.0);
                let value_y =
                    384.0 + angle.sin() * (mid_x - 512.0) + angle.cos() * (mid_y - 384.0);

                let final_x = value_x / 1023.0;
                let final_y = 1.0 - value_y / 1023.0;

                if (0.0..=1.0).contains(&final_x) && (0.0..=1.0).contains(&final_y) {
                    on_screen = true;
                    set_gun_axis(ctx, 0, final_x);
                    set_gun_axis(ctx, 1, final_y);
                }
            }

            if let Some(target) = ctx.resolved.key.get(&OFF_SCREEN_KEY) {
                ctx.primary
                    .set_switch(target.jvs_player as usize, target.output, !on_screen);
            }
            if !on_screen {
                zero_gun_axis(ctx, 0);
                zero_gun_axis(ctx, 1);
            }
        }
    }
}

/// Write one screen coordinate through the device's X or Y axis mapping.
fn set_gun_axis(ctx: &ReaderContext, code: u16, value: f64) {
    let Some(target) = ctx.resolved.abs.get(&code) else {
        return;
    };
    let Some(channel) = target.output.analogue_channel() else {
        return;
    };
    let value = if target.reverse { 1.0 - value } else { value };
    ctx.primary.set_analog(channel, value);
    ctx.primary.set_gun(channel, value);
}

fn zero_gun_axis(ctx: &ReaderContext, code: u16) {
    let Some(target) = ctx.resolved.abs.get(&code) else {
        return;
    };
    let Some(channel) = target.output.analogue_channel() else {
        return;
    };
    ctx.primary.set_analog(channel, 0.0);
    ctx.primary.set_gun(channel, 0.0);
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

/// Discover devices, resolve their mappings and start one reader thread
/// each. Enumeration problems shrink the player set; they never abort the
/// protocol engine.
pub fn start_readers(
    root: &ConfigRoot,
    outputs: &OutputMappings,
    config: &Config,
    primary: Arc<BoardState>,
    secondary: Option<Arc<BoardState>>,
    running: Arc<AtomicBool>,
) -> Vec<JoinHandle<()>> {
    let devices = enumerate_devices();
    if devices.is_empty() {
        warn!("no input devices found");
        return Vec::new();
    }

    info!("detected {} input device(s):", devices.len());
    for (index, device) in devices.iter().enumerate() {
        debug!(
            "  [{index}] {} ({:04x}:{:04x} v{:x}, bus 0x{:02X}, {})",
            device.name,
            device.vendor,
            device.product,
            device.version,
            device.bus,
            device.physical_location
        );
    }

    let mut player_number: u8 = 1;
    let mut handles = Vec::new();

    for device in devices {
        let disabled = root.device_mapping(&format!("{}.disabled", device.name));
        if disabled.exists() {
            info!("{}: disabled by {}", device.name, disabled.display());
            continue;
        }

        // Split-persona devices all share one mapping file.
        let mapping_name = match device.name.as_str() {
            WIIMOTE_DEVICE_NAME_IR => WIIMOTE_DEVICE_NAME,
            AIMTRAK_REMAP_JOYSTICK | AIMTRAK_REMAP_OUT_SCREEN | AIMTRAK_REMAP_IN_SCREEN => {
                AIMTRAK_DEVICE_NAME
            }
            name => name,
        };

        let mut special = "";
        let input_mappings = match load_input_mapping(root, mapping_name) {
            Ok(mappings) if !mappings.mappings.is_empty() => mappings,
            _ => {
                if !config.auto_controller_detection {
                    continue;
                }
                let generic = match device.kind {
                    DeviceKind::Joystick => "generic-joystick",
                    DeviceKind::Keyboard => "generic-keyboard",
                    DeviceKind::Mouse => "generic-mouse",
                    DeviceKind::Unknown => continue,
                };
                match load_input_mapping(root, generic) {
                    Ok(mappings) if !mappings.mappings.is_empty() => {
                        special = " (generic map)";
                        mappings
                    }
                    _ => continue,
                }
            }
        };

        let fixed_player = input_mappings.player;
        let player = fixed_player.unwrap_or(player_number).max(1);
        let resolved = resolve(&input_mappings, outputs, player);
        let deadzone = config.analog_deadzones[((player - 1) as usize).min(3)];

        let ctx = ReaderContext {
            path: device.path.clone(),
            display_name: device.display_name.clone(),
            resolved,
            deadzone,
            kind: device.kind,
            lightgun: device.name == WIIMOTE_DEVICE_NAME_IR,
            primary: Arc::clone(&primary),
            secondary: secondary.clone(),
        };
        handles.push(spawn_reader(ctx, Arc::clone(&running)));

        if let Some(fixed) = fixed_player {
            info!("player {fixed} (fixed via config): {}{special}", device.name);
        } else {
            // The extra event nodes of split-persona devices collapse onto
            // the player their main node claimed.
            let advances = !matches!(
                device.name.as_str(),
                AIMTRAK_REMAP_JOYSTICK | AIMTRAK_REMAP_OUT_SCREEN | WIIMOTE_DEVICE_NAME_IR
            );
            if advances {
                info!("player {player}: {}{special}", device.name);
                player_number += 1;
            }
        }
    }

    handles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_normalization_dashes_separators() {
        assert_eq!(
            normalize_name("Nintendo Wii Remote IR"),
            "nintendo-wii-remote-ir"
        );
        assert_eq!(normalize_name("Foo (USB/2)"), "foo--usb-2-");
    }

    #[test]
    fn blacklist_filters_non_controllers() {
        assert!(is_filtered("vc4-hdmi: HDMI CEC"));
        assert!(is_filtered("Sleep Button"));
        assert!(is_filtered("snd_usb audio"));
        assert!(!is_filtered("SEGA Arcade Stick"));
    }

    #[test]
    fn deadzone_centre_collapses_and_edge_is_preserved() {
        // Anywhere inside the circle maps to dead centre.
        let (x, y) = apply_deadzone(0.55, 0.52, 0.2);
        assert_eq!((x, y), (0.5, 0.5));

        // Full deflection stays at full deflection.
        let (x, y) = apply_deadzone(1.0, 0.5, 0.2);
        assert!((x - 1.0).abs() < 1e-9);
        assert!((y - 0.5).abs() < 1e-9);

        // Just past the threshold starts near the centre and scales out.
        let (x, _) = apply_deadzone(0.5 + 0.11, 0.5, 0.2);
        assert!(x > 0.5 && x < 0.52);
    }

    #[test]
    fn deadzone_preserves_stick_angle() {
        let (x, y) = apply_deadzone(0.8, 0.8, 0.2);
        // A diagonal input stays on the diagonal after rescaling.
        assert!((x - y).abs() < 1e-9);
        assert!(x > 0.5);
    }

    #[test]
    fn stick_filter_tracks_pairs_independently() {
        let mut sticks = StickFilter::new();
        // Deflect left stick X fully; Y stays centred.
        let x = sticks.apply(0, 1.0, 0.2);
        assert!(x > 0.9);
        // The right stick is unaffected by the left stick's position.
        let rx = sticks.apply(3, 0.5, 0.2);
        assert_eq!(rx, 0.5);
    }

    #[test]
    fn coin_slots_are_one_indexed() {
        assert_eq!(coin_slot(1), 0);
        assert_eq!(coin_slot(2), 1);
        assert_eq!(coin_slot(0), 0);
    }
}
