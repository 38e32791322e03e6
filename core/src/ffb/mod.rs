//! Force-feedback model: the bounded command queue, effect-id bookkeeping
//! and the software wheel used when a controller cannot generate forces.
//!
//! Everything here is pure bookkeeping driven by explicit millisecond
//! timestamps; the daemon's worker thread owns the actual device I/O.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::protocol::REPORT_SUCCESS;

/// Commands the queue can hold before dropping the oldest.
pub const COMMAND_QUEUE_SIZE: usize = 64;
/// Effects a controller keeps loaded before the oldest is evicted.
pub const MAX_EFFECTS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfbCommandKind {
    Constant,
    Spring,
    Damper,
    Rumble,
    /// Stop and unload every playing effect.
    StopAll,
}

/// One decoded force-feedback command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FfbCommand {
    pub kind: FfbCommandKind,
    /// Direction in degrees, 0-359.
    pub direction: u16,
    /// Strength 0-255.
    pub strength: u8,
    /// Duration in milliseconds; 0 means the 1000 ms default.
    pub duration_ms: u16,
    /// Rumble motor strengths.
    pub left_magnitude: u8,
    pub right_magnitude: u8,
}

impl FfbCommand {
    pub fn stop_all() -> Self {
        Self {
            kind: FfbCommandKind::StopAll,
            direction: 0,
            strength: 0,
            duration_ms: 0,
            left_magnitude: 0,
            right_magnitude: 0,
        }
    }
}

/// Capability bits probed from the underlying controller.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfbCapabilities {
    pub constant: bool,
    pub spring: bool,
    pub damper: bool,
    pub rumble: bool,
    /// Simultaneous effects the device claims to store.
    pub max_effects: usize,
}

impl FfbCapabilities {
    pub fn any(&self) -> bool {
        self.constant || self.spring || self.damper || self.rumble
    }
}

/// Bounded, lock-protected command queue between the protocol side and the
/// worker. When full, the oldest command is dropped.
pub struct CommandQueue {
    commands: Mutex<VecDeque<FfbCommand>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self {
            commands: Mutex::new(VecDeque::with_capacity(COMMAND_QUEUE_SIZE)),
        }
    }

    pub fn push(&self, command: FfbCommand) {
        let mut commands = self.commands.lock().unwrap_or_else(|e| e.into_inner());
        if commands.len() >= COMMAND_QUEUE_SIZE {
            log::trace!("command queue full, dropping oldest command");
            commands.pop_front();
        }
        commands.push_back(command);
    }

    pub fn pop(&self) -> Option<FfbCommand> {
        self.commands
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
    }

    pub fn len(&self) -> usize {
        self.commands.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-size ring of loaded effects, oldest first. Pushing onto a full
/// ring hands back the evicted entry so the caller can unload it from the
/// device.
pub struct EffectRing<T> {
    effects: VecDeque<T>,
}

impl<T> EffectRing<T> {
    pub fn new() -> Self {
        Self {
            effects: VecDeque::with_capacity(MAX_EFFECTS),
        }
    }

    pub fn push(&mut self, effect: T) -> Option<T> {
        let evicted = if self.effects.len() >= MAX_EFFECTS {
            self.effects.pop_front()
        } else {
            None
        };
        self.effects.push_back(effect);
        evicted
    }

    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.effects.drain(..)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.effects.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

impl<T> Default for EffectRing<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Software model of a force-feedback wheel for controllers that cannot
/// generate forces. Position runs in [-100, 100] and chases the target at
/// one unit per millisecond.
pub struct WheelModel {
    current_position: i32,
    target_position: i32,
    last_command_ms: u64,
    last_update_ms: u64,
    last_command: [u8; 16],
    last_command_len: usize,
}

/// The drive command a wheel board sends to recentre the motor.
const WHEEL_CMD_INIT: u8 = 0x30;
/// The drive command carrying a steering force parameter.
const WHEEL_CMD_DRIVE: u8 = 0x31;

/// The motor reports busy only this long after the last command.
const BUSY_WINDOW_MS: u64 = 500;

impl WheelModel {
    pub fn new() -> Self {
        Self {
            current_position: 0,
            target_position: 0,
            last_command_ms: 0,
            last_update_ms: 0,
            last_command: [0; 16],
            last_command_len: 0,
        }
    }

    /// Record a raw drive command and derive the new target position.
    pub fn track_command(&mut self, data: &[u8], now_ms: u64) {
        if data.is_empty() {
            return;
        }

        self.last_command_ms = now_ms;
        self.last_update_ms = now_ms;
        let len = data.len().min(self.last_command.len());
        self.last_command[..len].copy_from_slice(&data[..len]);
        self.last_command_len = len;

        match data[0] {
            WHEEL_CMD_INIT => {
                self.current_position = 0;
                self.target_position = 0;
            }
            WHEEL_CMD_DRIVE if data.len() >= 2 => {
                let param = data[1];
                self.target_position = match param {
                    0x00 | 0x80 => 0,
                    p if p < 0x80 => (-50 - i32::from(p) / 2).max(-100),
                    p => (50 + i32::from(p - 0x80) / 2).min(100),
                };
                log::trace!(
                    "wheel target {} from drive parameter 0x{param:02X}",
                    self.target_position
                );
            }
            _ => {}
        }
    }

    /// Advance the position toward the target: one unit per elapsed
    /// millisecond, clamped.
    pub fn update(&mut self, now_ms: u64) {
        let elapsed = now_ms.saturating_sub(self.last_update_ms) as i32;
        self.last_update_ms = now_ms;
        if elapsed <= 0 {
            return;
        }

        let distance = self.target_position - self.current_position;
        let step = elapsed.min(distance.abs());
        self.current_position += step * distance.signum();
        self.current_position = self.current_position.clamp(-100, 100);
    }

    /// Synthesize the five status bytes a real wheel board would return:
    /// report, motor status, 16-bit position (centre 0x8000) and torque.
    pub fn status(&mut self, now_ms: u64) -> [u8; 5] {
        self.update(now_ms);

        let moving = self.current_position != self.target_position;
        let recent = now_ms.saturating_sub(self.last_command_ms) < BUSY_WINDOW_MS;
        let motor_status = if moving && recent { 0x01 } else { 0x00 };

        let position16 = (0x8000 + self.current_position * 327).clamp(0, 0xFFFF) as u16;
        let [hi, lo] = position16.to_be_bytes();

        [REPORT_SUCCESS, motor_status, hi, lo, 0x40]
    }

    pub fn position(&self) -> i32 {
        self.current_position
    }

    pub fn target(&self) -> i32 {
        self.target_position
    }

    pub fn last_command(&self) -> &[u8] {
        &self.last_command[..self.last_command_len]
    }
}

impl Default for WheelModel {
    fn default() -> Self {
        Self::new()
    }
}
