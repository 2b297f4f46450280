pub mod animator;
pub mod poses;
pub mod tracks;
pub mod values;

pub use animator::{AnimationStatus, CameraAnimator};
pub use poses::{CameraPoseStore, SavedCameraPose};
pub use tracks::{KeyframeCursor, KeyframeTrack};
pub use values::{CameraKeyframe, EulerDegrees, Interpolatable, lerp_angle_degrees, normalize_degrees};
