pub mod board;
pub mod ffb;
pub mod protocol;

pub mod prelude {
    pub use crate::board::{BoardState, Capabilities, IoBoard, JvsInput};
    pub use crate::ffb::{CommandQueue, FfbCommand, WheelModel};
    pub use crate::protocol::{Engine, JvsError, OutputSink, Packet, Transport};
}
