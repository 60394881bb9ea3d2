use crate::camera::ProjectionType;
use crate::error::{CaptureError, Result};
use crate::{Point, Vector};

use super::RenderView;

/// Camera frame derived from a [`RenderView`].
///
/// The orientation is recomputed from position and look-at on every frame, so a
/// camera that moves while keeping its target stays pointed at it.
#[derive(Debug, Clone)]
pub struct Viewpoint {
    eye: Point,
    right: Vector,
    up: Vector,
    forward: Vector,
    half_height: f64,
    aspect: f64,
    z_near: f64,
    z_far: f64,
    projection: ProjectionType,
}

/// A projected point in pixel coordinates of a `width × height` target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
    pub depth: f64,
}

impl Viewpoint {
    pub fn new(view: &RenderView) -> Result<Self> {
        if view.width == 0 || view.height == 0 {
            return Err(CaptureError::invalid("viewport must be at least 1x1"));
        }
        if !(view.z_near > 0. && view.z_far > view.z_near) {
            return Err(CaptureError::invalid(format!(
                "clip planes must satisfy 0 < zNear < zFar, got {} and {}",
                view.z_near, view.z_far
            )));
        }
        if !(view.field_of_view_deg > 0. && view.field_of_view_deg < 180.) {
            return Err(CaptureError::invalid(format!(
                "field of view must be in (0, 180), got {}",
                view.field_of_view_deg
            )));
        }

        let to_target = view.look_at - view.position;
        let forward = to_target.normalize().ok_or_else(|| {
            CaptureError::invalid(format!(
                "camera position {} coincides with its look-at point",
                view.position
            ))
        })?;
        // Fall back to +z as "up" when looking straight along the up vector
        let right = forward
            .cross(view.up)
            .normalize()
            .or_else(|| forward.cross(Vector::new(0., 0., 1.)).normalize())
            .ok_or_else(|| CaptureError::invalid("degenerate camera orientation"))?;
        let up = right.cross(forward);

        let tan_half = (view.field_of_view_deg.to_radians() / 2.).tan();
        let half_height = match view.projection {
            ProjectionType::Perspective => tan_half,
            ProjectionType::Orthographic => to_target.length() * tan_half,
        };

        Ok(Self {
            eye: view.position,
            right,
            up,
            forward,
            half_height,
            aspect: view.width as f64 / view.height as f64,
            z_near: view.z_near,
            z_far: view.z_far,
            projection: view.projection,
        })
    }

    /// Projects `p` onto a `width × height` target.
    ///
    /// Returns `None` for points outside the clip planes or the view frustum.
    pub fn project(&self, p: Point, width: u32, height: u32) -> Option<ScreenPoint> {
        let d = p - self.eye;
        let depth = d.dot(self.forward);
        if depth < self.z_near || depth > self.z_far {
            return None;
        }

        let scale = match self.projection {
            ProjectionType::Perspective => depth * self.half_height,
            ProjectionType::Orthographic => self.half_height,
        };
        let ndc_x = d.dot(self.right) / (scale * self.aspect);
        let ndc_y = d.dot(self.up) / scale;
        if ndc_x.abs() > 1. || ndc_y.abs() > 1. {
            return None;
        }

        Some(ScreenPoint {
            x: (ndc_x + 1.) / 2. * width as f64,
            y: (1. - ndc_y) / 2. * height as f64,
            depth,
        })
    }
}
