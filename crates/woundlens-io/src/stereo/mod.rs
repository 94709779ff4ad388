mod frame;
mod pairer;

pub use frame::{CameraRole, FramePair, RawFrame};
pub use pairer::{
    PairingConfig, StereoFramePairer, DEFAULT_CHANNEL_CAPACITY, DEFAULT_MAX_BUFFERED_FRAMES,
    DEFAULT_TOLERANCE_NS,
};
