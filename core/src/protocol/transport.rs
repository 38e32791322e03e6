//! Transport seam between the protocol engine and the physical bus.
//!
//! The engine never touches a file descriptor: it reads, writes and drives
//! the sense line through this trait. The daemon implements it over an
//! RS-485 serial adapter plus a GPIO pin; tests implement it over byte
//! vectors.

use super::JvsError;

pub trait Transport {
    /// Read whatever bytes are available, blocking up to the transport's
    /// deadline (on the order of 200 ms). Returns the number of bytes
    /// stored in `buf`; a deadline with no data is `Err(JvsError::Timeout)`.
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, JvsError>;

    /// Write as many bytes as the transport will take right now and return
    /// the count. Short writes are allowed; the engine retries.
    fn write_bytes(&mut self, buf: &[u8]) -> Result<usize, JvsError>;

    /// Drive the sense line. Asserted tells the bus master the chain head
    /// has been addressed.
    fn set_sense(&mut self, asserted: bool);
}
