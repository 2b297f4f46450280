//! Device inputs for AR mode: orientation/motion events and the camera feed.

pub mod orientation;
pub mod video;

pub use orientation::{MotionSample, OrientationDelta, OrientationSample, OrientationSensor, SensorAccess};
pub use video::{CameraFacing, StreamConstraints, VideoSource, acquire_stream};
