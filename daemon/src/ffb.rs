//! The force-feedback engine: one worker per bound controller, fed from a
//! bounded command queue, with a software wheel standing in when the
//! controller cannot generate forces.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use evdev::{
    Device, EventType, FFCondition, FFEffect, FFEffectData, FFEffectKind, FFEffectType,
    FFEnvelope, FFReplay, FFTrigger,
};
use log::{debug, info, trace};

use jvs_core::ffb::{
    CommandQueue, EffectRing, FfbCapabilities, FfbCommand, FfbCommandKind, WheelModel,
};
use jvs_core::protocol::OutputSink;

/// Worker poll period between queue checks.
const QUEUE_POLL: Duration = Duration::from_millis(10);

struct Shared {
    queue: CommandQueue,
    wheel: Mutex<WheelModel>,
    started: Instant,
}

impl Shared {
    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// Force-feedback endpoint for one emulated board.
pub struct FfbEngine {
    shared: Arc<Shared>,
}

impl FfbEngine {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                queue: CommandQueue::new(),
                wheel: Mutex::new(WheelModel::new()),
                started: Instant::now(),
            }),
        }
    }

    /// The five wheel status bytes a driver board reports: report code,
    /// motor busy/ready, 16-bit position, torque.
    pub fn status_bytes(&self) -> [u8; 5] {
        let now = self.shared.now_ms();
        self.shared
            .wheel
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .status(now)
    }

    /// Sink for the protocol engine: general-purpose output writes carry
    /// the wheel drive commands.
    pub fn bridge(&self) -> Box<dyn OutputSink> {
        Box::new(FfbBridge {
            shared: Arc::clone(&self.shared),
        })
    }

    /// Start the worker. `device` is the bound controller, if any; without
    /// one (or without force-feedback support) the worker runs the wheel
    /// emulation only.
    pub fn spawn_worker(&self, device: Option<Device>, running: Arc<AtomicBool>) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        std::thread::spawn(move || worker_loop(shared, device, &running))
    }
}

impl Default for FfbEngine {
    fn default() -> Self {
        Self::new()
    }
}

struct FfbBridge {
    shared: Arc<Shared>,
}

impl OutputSink for FfbBridge {
    fn write_gpo(&self, data: &[u8]) {
        if data.is_empty() {
            return;
        }

        let now = self.shared.now_ms();
        {
            let mut wheel = self.shared.wheel.lock().unwrap_or_else(|e| e.into_inner());
            wheel.track_command(data, now);
        }

        // Mirror the wheel drive onto a real effect for controllers that
        // can render it.
        match data[0] {
            0x30 => self.shared.queue.push(FfbCommand::stop_all()),
            0x31 if data.len() >= 2 => {
                let param = data[1];
                let (strength, direction) = match param {
                    0x00 | 0x80 => (0, 0),
                    p if p < 0x80 => (p * 2, 90),
                    p => ((p - 0x80) * 2, 270),
                };
                self.shared.queue.push(FfbCommand {
                    kind: FfbCommandKind::Constant,
                    direction,
                    strength,
                    duration_ms: 0,
                    left_magnitude: 0,
                    right_magnitude: 0,
                });
            }
            _ => trace!("ignoring output bytes {data:02X?}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Controller binding
// ---------------------------------------------------------------------------

/// Scan /dev/input for the first device advertising force feedback.
pub fn find_ff_device() -> Option<Device> {
    let mut paths: Vec<PathBuf> = fs::read_dir("/dev/input")
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with("event"))
        })
        .collect();
    paths.sort();

    for path in paths {
        let Ok(device) = Device::open(&path) else {
            continue;
        };
        if device.supported_events().contains(EventType::FORCEFEEDBACK) {
            info!(
                "force feedback controller: {} ({})",
                device.name().unwrap_or("unknown"),
                path.display()
            );
            return Some(device);
        }
    }
    None
}

fn probe_capabilities(device: &Device) -> FfbCapabilities {
    let mut caps = FfbCapabilities::default();
    if let Some(effects) = device.supported_ff() {
        caps.constant = effects.contains(FFEffectType::FF_CONSTANT);
        caps.spring = effects.contains(FFEffectType::FF_SPRING);
        caps.damper = effects.contains(FFEffectType::FF_DAMPER);
        caps.rumble = effects.contains(FFEffectType::FF_RUMBLE);
        caps.max_effects = jvs_core::ffb::MAX_EFFECTS;
    }
    caps
}

struct BoundController {
    device: Device,
    caps: FfbCapabilities,
    effects: EffectRing<FFEffect>,
}

fn worker_loop(shared: Arc<Shared>, device: Option<Device>, running: &AtomicBool) {
    let mut bound = device.and_then(|device| {
        let caps = probe_capabilities(&device);
        if caps.any() {
            debug!(
                "controller effects: constant={} spring={} damper={} rumble={}",
                caps.constant, caps.spring, caps.damper, caps.rumble
            );
            Some(BoundController {
                device,
                caps,
                effects: EffectRing::new(),
            })
        } else {
            info!("controller has no force feedback, using wheel emulation");
            None
        }
    });

    while running.load(Ordering::Relaxed) {
        let Some(command) = shared.queue.pop() else {
            std::thread::sleep(QUEUE_POLL);
            continue;
        };

        let Some(bound) = bound.as_mut() else {
            // Emulation mode: the wheel model already consumed the command
            // through the bridge.
            continue;
        };

        if command.kind == FfbCommandKind::StopAll {
            stop_all(bound);
        } else if let Err(e) = play_command(bound, &command) {
            debug!("effect failed: {e}");
        }
    }

    if let Some(bound) = bound.as_mut() {
        stop_all(bound);
    }
}

fn stop_all(bound: &mut BoundController) {
    for effect in bound.effects.iter_mut() {
        if let Err(e) = effect.stop() {
            trace!("failed to stop effect: {e}");
        }
    }
    // Dropping an effect removes it from the device.
    bound.effects.drain().for_each(drop);
}

/// Build, upload and start one effect. Types the controller does not
/// advertise fail quietly.
fn play_command(bound: &mut BoundController, command: &FfbCommand) -> std::io::Result<()> {
    let caps = &bound.caps;

    let no_envelope = FFEnvelope {
        attack_length: 0,
        attack_level: 0,
        fade_length: 0,
        fade_level: 0,
    };

    let kind = match command.kind {
        FfbCommandKind::Constant => {
            if !caps.constant {
                debug!("controller does not support constant force");
                return Ok(());
            }
            FFEffectKind::Constant {
                level: (i32::from(command.strength) * 32767 / 255) as i16,
                envelope: no_envelope,
            }
        }

        FfbCommandKind::Spring => {
            if !caps.spring {
                debug!("controller does not support spring effects");
                return Ok(());
            }
            let coefficient = (i32::from(command.strength) * 0x7FFF / 255) as i16;
            let condition = FFCondition {
                right_saturation: 0x7FFF,
                left_saturation: 0x7FFF,
                right_coefficient: coefficient,
                left_coefficient: coefficient,
                deadband: 0,
                center: 0,
            };
            FFEffectKind::Spring {
                condition: [condition, condition],
            }
        }

        FfbCommandKind::Damper => {
            if !caps.damper {
                debug!("controller does not support damper effects");
                return Ok(());
            }
            // The damper variant carries no condition parameters; the
            // driver's default coefficients apply.
            FFEffectKind::Damper
        }

        FfbCommandKind::Rumble => {
            if !caps.rumble {
                debug!("controller does not support rumble");
                return Ok(());
            }
            FFEffectKind::Rumble {
                strong_magnitude: (u32::from(command.left_magnitude) * 0xFFFF / 255) as u16,
                weak_magnitude: (u32::from(command.right_magnitude) * 0xFFFF / 255) as u16,
            }
        }

        FfbCommandKind::StopAll => return Ok(()),
    };

    let data = FFEffectData {
        direction: (u32::from(command.direction) * 0xFFFF / 360) as u16,
        trigger: FFTrigger {
            button: 0,
            interval: 0,
        },
        replay: FFReplay {
            length: if command.duration_ms > 0 {
                command.duration_ms
            } else {
                1000
            },
            delay: 0,
        },
        kind,
    };

    let mut effect = bound.device.upload_ff_effect(data)?;
    effect.play(1)?;
    // A full ring evicts (and thereby unloads) the oldest effect.
    drop(bound.effects.push(effect));

    Ok(())
}
