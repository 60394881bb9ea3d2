//! Offscreen rendering backends.
//!
//! The engine is handed a [`FrameRenderer`] at construction time and asks it for
//! one image per saved frame. Encoding to disk goes through the `image` crate.

pub mod projection;
pub mod software;

use std::path::Path;

use image::RgbImage;

use crate::camera::ProjectionType;
use crate::error::{CaptureError, Result};
use crate::{Point, Vector};

pub use projection::Viewpoint;
pub use software::SoftwareRenderer;

/// Everything a backend needs to know about the camera for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderView {
    pub position: Point,
    pub look_at: Point,
    pub up: Vector,
    pub field_of_view_deg: f64,
    pub z_near: f64,
    pub z_far: f64,
    pub projection: ProjectionType,
    pub width: u32,
    pub height: u32,
    /// Samples per pixel; 0 or 1 disables anti-aliasing. Renderers may round
    /// this up to a square supersampling grid.
    pub samples: u32,
}

/// A cloud of points drawn with one color.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawable {
    pub points: Vec<Point>,
    pub color: [u8; 3],
    /// Side of the square splat in output pixels.
    pub point_size: u32,
}

pub trait FrameRenderer {
    fn render(&mut self, view: &RenderView, drawables: &[Drawable]) -> Result<RgbImage>;
}

impl<R: FrameRenderer + ?Sized> FrameRenderer for Box<R> {
    fn render(&mut self, view: &RenderView, drawables: &[Drawable]) -> Result<RgbImage> {
        (**self).render(view, drawables)
    }
}

/// Image extensions frames can be written as.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Encodes `frame` to `path`, picking the format from the file extension.
pub fn write_frame(frame: &RgbImage, path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(CaptureError::invalid(format!(
            "unsupported frame extension '{ext}' for {}",
            path.display()
        )));
    }
    frame.save(path).map_err(|e| CaptureError::image(path, e))
}
