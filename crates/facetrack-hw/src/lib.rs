//! facetrack-hw: Simulated camera hardware.
//!
//! Camera configuration management, a stand-in for stream connection
//! (no protocol is spoken), and the demo roster/camera fixtures.

pub mod camera;
pub mod fixtures;
pub mod stream;

pub use camera::{CameraConfig, CameraError, CameraRegistry, NewCamera};
pub use stream::{StreamError, StreamProbe};
