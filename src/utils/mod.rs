//! Utility Module
//!
//! - [`OrbitControls`]: default pointer camera controller
//! - [`FpsCounter`]: frame rate measurement over host timestamps
//! - [`FrameClock`]: per-frame delta and elapsed time

pub mod fps_counter;
pub mod orbit_control;
pub mod time;

pub use fps_counter::FpsCounter;
pub use orbit_control::OrbitControls;
pub use time::FrameClock;
