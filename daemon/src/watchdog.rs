//! Watchdog: trigger a graceful re-init when the rotary map selector moves
//! or the set of connected input devices changes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use log::info;

use crate::gpio::RotarySelector;
use crate::input::count_event_devices;

const POLL_PERIOD: Duration = Duration::from_secs(1);

/// Spawn the watchdog. Clearing `session_running` ends the current packet
/// loop; `threads_running` is the process-wide cancellation flag the
/// watchdog itself obeys.
pub fn spawn(
    session_running: Arc<AtomicBool>,
    threads_running: Arc<AtomicBool>,
    rotary: Option<RotarySelector>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let original_device_count = count_event_devices();
        let original_rotary = rotary.as_ref().and_then(|r| r.value());

        while threads_running.load(Ordering::Relaxed) {
            if let Some(rotary) = &rotary {
                if rotary.value() != original_rotary {
                    info!("rotary position changed, reinitialising");
                    session_running.store(false, Ordering::Relaxed);
                    break;
                }
            }

            let device_count = count_event_devices();
            if device_count != original_device_count {
                info!("input device set changed, reinitialising");
                session_running.store(false, Ordering::Relaxed);
                break;
            }

            std::thread::sleep(POLL_PERIOD);
        }
    })
}
