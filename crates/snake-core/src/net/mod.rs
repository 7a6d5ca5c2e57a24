mod frame;
mod protocol;

pub use frame::{read_frame, write_frame, FrameIoError};
pub use protocol::{FrameError, Message, WireFood, WirePoint, WireSnake, MAX_FRAME_SIZE};
