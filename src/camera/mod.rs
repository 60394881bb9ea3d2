//! Offscreen camera component.
//!
//! A camera renders the subtree of the scene node it is attached to and writes
//! the frame to disk. Besides manual `save_frame` calls it can capture on its own,
//! once after visual initialization and then every `n` simulation steps.

use serde::{Deserialize, Serialize};

use crate::error::{CaptureError, Result};
use crate::name::HasName;
use crate::render::RenderView;
use crate::scene::property::{
    expect_array, expect_bool, expect_real, expect_text, expect_uint, unknown, HasProperties,
    PropertyValue,
};
use crate::{Point, Vector};

pub const DEFAULT_FILEPATH: &str = "screenshot_%s_%i.jpg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionType {
    #[default]
    Perspective,
    Orthographic,
}

impl ProjectionType {
    /// Numeric code used by the `projectionType` property.
    pub fn code(self) -> u64 {
        match self {
            ProjectionType::Perspective => 0,
            ProjectionType::Orthographic => 1,
        }
    }
}

impl TryFrom<u64> for ProjectionType {
    type Error = CaptureError;

    fn try_from(code: u64) -> Result<Self> {
        match code {
            0 => Ok(ProjectionType::Perspective),
            1 => Ok(ProjectionType::Orthographic),
            other => Err(CaptureError::scene(format!(
                "projectionType must be 0 (perspective) or 1 (orthographic), got {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OffscreenCamera {
    pub name: String,
    pub position: Point,
    pub look_at: Point,
    pub z_near: f64,
    pub z_far: f64,
    pub field_of_view_deg: f64,
    pub projection: ProjectionType,
    pub width: u32,
    pub height: u32,
    /// Samples per pixel, `None` when multisampling is disabled.
    pub multisampling: Option<u32>,
    /// Output file template. `%s` expands to the camera name, `%i` to the step number.
    pub filepath: String,
    pub save_frame_before_first_step: bool,
    /// Automatic capture period in steps, 0 disables it.
    pub save_frame_after_each_n_steps: u32,
    step_number: u64,
}

impl OffscreenCamera {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            position: Point::new(0., 0., 20.),
            look_at: Point::origin(),
            z_near: 0.01,
            z_far: 100.,
            field_of_view_deg: 45.,
            projection: ProjectionType::Perspective,
            width: 800,
            height: 600,
            multisampling: None,
            filepath: DEFAULT_FILEPATH.to_string(),
            save_frame_before_first_step: false,
            save_frame_after_each_n_steps: 0,
            step_number: 0,
        }
    }

    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    pub fn with_look_at(mut self, look_at: Point) -> Self {
        self.look_at = look_at;
        self
    }

    pub fn with_clip_planes(mut self, z_near: f64, z_far: f64) -> Self {
        self.z_near = z_near;
        self.z_far = z_far;
        self
    }

    pub fn with_projection(mut self, projection: ProjectionType) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_filepath(mut self, template: &str) -> Self {
        self.filepath = template.to_string();
        self
    }

    pub fn with_auto_capture(mut self, before_first_step: bool, every_n_steps: u32) -> Self {
        self.save_frame_before_first_step = before_first_step;
        self.save_frame_after_each_n_steps = every_n_steps;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.name.contains('/') {
            return Err(CaptureError::scene(format!(
                "invalid camera name '{}'",
                self.name
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(CaptureError::scene(format!(
                "camera '{}' viewport must be at least 1x1",
                self.name
            )));
        }
        if !(self.z_near > 0. && self.z_far > self.z_near) {
            return Err(CaptureError::scene(format!(
                "camera '{}' needs 0 < zNear < zFar",
                self.name
            )));
        }
        if !(self.field_of_view_deg > 0. && self.field_of_view_deg < 180.) {
            return Err(CaptureError::scene(format!(
                "camera '{}' field of view must be in (0, 180)",
                self.name
            )));
        }
        if !(self.position.is_finite() && self.look_at.is_finite()) {
            return Err(CaptureError::scene(format!(
                "camera '{}' position and look-at must be finite",
                self.name
            )));
        }
        Ok(())
    }

    /// Number of simulation steps seen since the last reset.
    pub fn step_number(&self) -> u64 {
        self.step_number
    }

    pub fn reset(&mut self) {
        self.step_number = 0;
    }

    /// Counts one finished simulation step.
    ///
    /// Returns true when the automatic capture period is due on this step.
    pub fn end_step(&mut self) -> bool {
        self.step_number += 1;
        let n = self.save_frame_after_each_n_steps as u64;
        n > 0 && self.step_number % n == 0
    }

    /// Output path for the current step, expanded from the `filepath` template.
    pub fn parse_file_path(&self) -> String {
        expand_template(&self.filepath, &self.name, self.step_number)
    }

    pub fn render_view(&self) -> RenderView {
        RenderView {
            position: self.position,
            look_at: self.look_at,
            up: Vector::new(0., 1., 0.),
            field_of_view_deg: self.field_of_view_deg,
            z_near: self.z_near,
            z_far: self.z_far,
            projection: self.projection,
            width: self.width,
            height: self.height,
            samples: self.multisampling.unwrap_or(1),
        }
    }
}

/// Replaces every `%s` with `name` and every `%i` with `step`.
///
/// Substituted text is never rescanned, so a camera name containing `%i` stays as is.
pub fn expand_template(template: &str, name: &str, step: u64) -> String {
    let step = step.to_string();
    let mut out = String::with_capacity(template.len() + name.len() + step.len());
    let mut rest = template;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix("%s") {
            out.push_str(name);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("%i") {
            out.push_str(&step);
            rest = after;
        } else {
            out.push('%');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

impl HasName for OffscreenCamera {
    fn get_name(&self) -> &str {
        &self.name
    }
}

impl HasProperties for OffscreenCamera {
    fn property_names(&self) -> &'static [&'static str] {
        &[
            "position",
            "lookAt",
            "zNear",
            "zFar",
            "fieldOfView",
            "projectionType",
            "widthViewport",
            "heightViewport",
            "multisampling",
            "filepath",
            "save_frame_before_first_step",
            "save_frame_after_each_n_steps",
        ]
    }

    fn get_property(&self, name: &str) -> Option<PropertyValue> {
        let value: PropertyValue = match name {
            "position" => self.position.to_array().into(),
            "lookAt" => self.look_at.to_array().into(),
            "zNear" => self.z_near.into(),
            "zFar" => self.z_far.into(),
            "fieldOfView" => self.field_of_view_deg.into(),
            "projectionType" => self.projection.code().into(),
            "widthViewport" => self.width.into(),
            "heightViewport" => self.height.into(),
            "multisampling" => self.multisampling.unwrap_or(0).into(),
            "filepath" => self.filepath.as_str().into(),
            "save_frame_before_first_step" => self.save_frame_before_first_step.into(),
            "save_frame_after_each_n_steps" => self.save_frame_after_each_n_steps.into(),
            _ => return None,
        };
        Some(value)
    }

    fn set_property(&mut self, name: &str, value: PropertyValue) -> Result<()> {
        let mut next = self.clone();
        match name {
            "position" => next.position = Point::from(xyz(name, value)?),
            "lookAt" => next.look_at = Point::from(xyz(name, value)?),
            "zNear" => next.z_near = expect_real(name, value)?,
            "zFar" => next.z_far = expect_real(name, value)?,
            "fieldOfView" => next.field_of_view_deg = expect_real(name, value)?,
            "projectionType" => {
                next.projection = ProjectionType::try_from(expect_uint(name, value)?)?
            }
            "widthViewport" => next.width = small_uint(name, value)?,
            "heightViewport" => next.height = small_uint(name, value)?,
            "multisampling" => {
                let samples = small_uint(name, value)?;
                next.multisampling = (samples > 0).then_some(samples);
            }
            "filepath" => next.filepath = expect_text(name, value)?,
            "save_frame_before_first_step" => {
                next.save_frame_before_first_step = expect_bool(name, value)?
            }
            "save_frame_after_each_n_steps" => {
                next.save_frame_after_each_n_steps = small_uint(name, value)?
            }
            _ => return Err(unknown("OffscreenCamera", name)),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

fn xyz(name: &str, value: PropertyValue) -> Result<[f64; 3]> {
    let v = expect_array(name, value, Some(3))?;
    Ok([v[0], v[1], v[2]])
}

fn small_uint(name: &str, value: PropertyValue) -> Result<u32> {
    let v = expect_uint(name, value)?;
    u32::try_from(v).map_err(|_| CaptureError::scene(format!("property '{name}' is too large: {v}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::property::with_array_mut;

    #[test]
    fn test_expand_template() {
        assert_eq!(expand_template("%s_%i.png", "cam", 7), "cam_7.png");
        assert_eq!(
            expand_template("out/%s/%s_%i_%i.jpg", "a", 12),
            "out/a/a_12_12.jpg"
        );
        assert_eq!(expand_template("frame.jpg", "cam", 3), "frame.jpg");
        assert_eq!(expand_template("100%_%i", "cam", 1), "100%_1");
        assert_eq!(expand_template("%s-%i", "x%i", 2), "x%i-2");
    }

    #[test]
    fn test_default_file_path() {
        let cam = OffscreenCamera::new("front");
        assert_eq!(cam.parse_file_path(), "screenshot_front_0.jpg");
    }

    #[test]
    fn test_auto_capture_cadence() {
        let mut cam = OffscreenCamera::new("c").with_auto_capture(false, 5);
        let due: Vec<u64> = (0..12)
            .filter_map(|_| cam.end_step().then(|| cam.step_number()))
            .collect();
        assert_eq!(due, vec![5, 10]);
        assert_eq!(cam.parse_file_path(), "screenshot_c_12.jpg");
        cam.reset();
        assert_eq!(cam.step_number(), 0);

        let mut off = OffscreenCamera::new("c");
        assert!((0..20).all(|_| !off.end_step()));
    }

    #[test]
    fn test_properties() {
        let mut cam = OffscreenCamera::new("c");
        cam.set_property("projectionType", 1u64.into()).unwrap();
        assert_eq!(cam.projection, ProjectionType::Orthographic);
        cam.set_property("widthViewport", 320u32.into()).unwrap();
        cam.set_property("multisampling", 4u32.into()).unwrap();
        assert_eq!(cam.multisampling, Some(4));
        cam.set_property("multisampling", 0u32.into()).unwrap();
        assert_eq!(cam.multisampling, None);
        assert_eq!(cam.get_property("widthViewport"), Some(PropertyValue::UInt(320)));

        assert!(cam.set_property("projectionType", 2u64.into()).is_err());
        assert!(cam.set_property("widthViewport", 0u32.into()).is_err());
        assert!(cam.set_property("zNear", 500.0.into()).is_err());
        assert!(cam.set_property("color", 1.0.into()).is_err());
        assert_eq!(cam.width, 320);
    }

    #[test]
    fn test_position_through_writeable_array() {
        let mut cam = OffscreenCamera::new("c");
        with_array_mut(&mut cam, "position", |p| {
            p[0..3].copy_from_slice(&[-40., 0., 0.])
        })
        .unwrap();
        assert_eq!(cam.position, Point::new(-40., 0., 0.));
        assert_eq!(cam.render_view().position, cam.position);
    }
}
