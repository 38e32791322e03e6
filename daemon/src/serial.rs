//! The RS-485 serial adapter carrying the JVS bus.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::AsFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use log::{debug, warn};
use nix::libc;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use nix::sys::termios::{
    self, BaudRate, ControlFlags, FlushArg, SetArg, SpecialCharacterIndices,
};

use jvs_core::protocol::{JvsError, Transport};

use crate::gpio::SenseLine;

/// How long a read waits for the bus master before reporting a timeout.
const READ_TIMEOUT_MS: u16 = 200;

/// Errors opening or configuring the serial adapter.
#[derive(Debug)]
pub enum DeviceError {
    Open(String, io::Error),
    Configure(nix::Error),
}

impl std::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open(path, e) => write!(f, "failed to open serial device {path}: {e}"),
            Self::Configure(e) => write!(f, "failed to configure serial device: {e}"),
        }
    }
}

impl std::error::Error for DeviceError {}

impl From<nix::Error> for DeviceError {
    fn from(e: nix::Error) -> Self {
        Self::Configure(e)
    }
}

nix::ioctl_read_bad!(tiocmget, libc::TIOCMGET, libc::c_int);
nix::ioctl_write_ptr_bad!(tiocmset, libc::TIOCMSET, libc::c_int);

/// The serial port plus the sense line, together forming the engine's
/// [`Transport`]. The port is owned exclusively by the protocol loop.
pub struct SerialDevice {
    port: File,
    sense: SenseLine,
}

impl SerialDevice {
    /// Open and configure the adapter: raw mode, 115200 baud, 8-N-1,
    /// DTR/RTS raised, queues flushed.
    pub fn open(path: &Path, sense: SenseLine) -> Result<Self, DeviceError> {
        let port = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
            .open(path)
            .map_err(|e| DeviceError::Open(path.display().to_string(), e))?;

        let mut tio = termios::tcgetattr(&port)?;
        termios::cfmakeraw(&mut tio);
        termios::cfsetispeed(&mut tio, BaudRate::B115200)?;
        termios::cfsetospeed(&mut tio, BaudRate::B115200)?;

        tio.control_flags
            .remove(ControlFlags::PARENB | ControlFlags::CSTOPB | ControlFlags::CSIZE);
        tio.control_flags
            .insert(ControlFlags::CS8 | ControlFlags::CLOCAL | ControlFlags::CREAD);
        tio.control_chars[SpecialCharacterIndices::VMIN as usize] = 0;
        tio.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;

        termios::tcsetattr(&port, SetArg::TCSANOW, &tio)?;

        // Raise DTR and RTS; some RS-485 adapters gate their transceiver on
        // these.
        unsafe {
            use std::os::fd::AsRawFd;
            let fd = port.as_raw_fd();
            let mut status: libc::c_int = 0;
            if tiocmget(fd, &mut status).is_ok() {
                status |= libc::TIOCM_DTR | libc::TIOCM_RTS;
                if let Err(e) = tiocmset(fd, &status) {
                    warn!("failed to raise DTR/RTS: {e}");
                }
            }
        }

        termios::tcflush(&port, FlushArg::TCIOFLUSH)?;
        debug!("serial device {} ready at 115200 8-N-1", path.display());

        Ok(Self { port, sense })
    }

    fn wait_readable(&self) -> bool {
        let mut fds = [PollFd::new(self.port.as_fd(), PollFlags::POLLIN)];
        matches!(poll(&mut fds, PollTimeout::from(READ_TIMEOUT_MS)), Ok(n) if n > 0)
    }
}

impl Transport for SerialDevice {
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, JvsError> {
        if !self.wait_readable() {
            return Err(JvsError::Timeout);
        }
        match self.port.read(buf) {
            Ok(count) => Ok(count),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Err(JvsError::Timeout),
            Err(e) => {
                warn!("serial read failed: {e}");
                Err(JvsError::Timeout)
            }
        }
    }

    fn write_bytes(&mut self, buf: &[u8]) -> Result<usize, JvsError> {
        match self.port.write(buf) {
            Ok(count) => Ok(count),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => {
                warn!("serial write failed: {e}");
                Err(JvsError::WriteFail)
            }
        }
    }

    fn set_sense(&mut self, asserted: bool) {
        self.sense.set(asserted);
    }
}
