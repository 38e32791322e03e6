pub mod command;
pub mod engine;
pub mod frame;
pub mod packet;
pub mod transport;

pub use engine::{Engine, OutputSink};
pub use frame::{Deframer, frame};
pub use packet::{
    BROADCAST, BUS_MASTER, ESCAPE, MAX_PACKET_SIZE, Packet, REPORT_SUCCESS, STATUS_SUCCESS, SYNC,
};
pub use transport::Transport;

/// Errors that can occur while reading, processing or answering a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JvsError {
    /// The transport produced no bytes within its read deadline.
    Timeout,

    /// Frame checksum did not match the received bytes.
    Checksum,

    /// The write retry budget was exhausted before the whole frame went out.
    WriteFail,

    /// The packet addressed a device id no local board holds.
    NotForUs,

    /// A handler would have grown the response past the maximum packet size.
    BufferOverflow,
}

impl std::fmt::Display for JvsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "serial read deadline expired"),
            Self::Checksum => write!(f, "frame checksum mismatch"),
            Self::WriteFail => write!(f, "write retries exhausted"),
            Self::NotForUs => write!(f, "packet addresses no local board"),
            Self::BufferOverflow => write!(f, "response exceeds maximum packet size"),
        }
    }
}

impl std::error::Error for JvsError {}
