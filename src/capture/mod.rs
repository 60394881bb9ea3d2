//! Stepped simulation loop that records numbered frames for several cameras.
//!
//! Output layout is `<view output dir>/frame_<i>.<ext>` for `i` in `0..=N`,
//! ready to be assembled into a video at the simulation frame rate.

pub mod driver;
pub mod output;
pub mod view;

pub use driver::{camera_property, CaptureDriver, DriverState, RunSummary};
pub use output::{ensure_output_dir, frame_file_name, frame_path};
pub use view::{CameraView, ViewSummary};
