use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::camera::ProjectionType;
use crate::error::{CaptureError, Result};
use crate::render::SUPPORTED_EXTENSIONS;
use crate::scene::demo::{NARROW_CAMERA, TRACTION, WIDE_CAMERA};

/// One camera captured into its own directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Short name used in logs and summaries.
    pub label: String,
    /// Component path of the camera in the scene.
    pub camera: String,
    pub output_dir: PathBuf,
}

impl ViewConfig {
    pub fn new(label: &str, camera: &str, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            label: label.to_string(),
            camera: camera.to_string(),
            output_dir: output_dir.into(),
        }
    }
}

/// Parameters of a capture run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Simulated duration in seconds.
    pub simulation_time: f64,
    /// Frames per simulated second. Also the playback rate of the resulting video.
    pub fps: u32,
    /// Output frame size `[width, height]` in pixels.
    pub resolution: [u32; 2],
    /// Anti-aliasing samples per pixel.
    pub samples: u32,
    /// Camera path radii `[a, b]`: `a` along z, `b` along x.
    pub ellipse: [f64; 2],
    pub projection: ProjectionType,
    /// Frame file extension, without the dot.
    pub image_extension: String,
    /// Component path of the force field the ramp is written into.
    ///
    /// `None` leaves the scene's loads untouched.
    pub force_field: Option<String>,
    /// Ramp peak. Defaults to the last keyframe force already in the field.
    pub peak_force: Option<[f64; 3]>,
    pub views: Vec<ViewConfig>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            simulation_time: 2.,
            fps: 60,
            resolution: [800, 600],
            samples: 4,
            ellipse: [40., 40.],
            projection: ProjectionType::Perspective,
            image_extension: "jpg".to_string(),
            force_field: Some(TRACTION.to_string()),
            peak_force: None,
            views: vec![
                ViewConfig::new("beam_and_ball", WIDE_CAMERA, "beam_and_ball"),
                ViewConfig::new("only_ball", NARROW_CAMERA, "only_ball"),
            ],
        }
    }
}

impl CaptureConfig {
    /// Reads a JSON config. Missing fields take their default values.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("cannot parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.simulation_time.is_finite() && self.simulation_time > 0.) {
            return Err(CaptureError::invalid(format!(
                "simulation time must be positive, got {}",
                self.simulation_time
            )));
        }
        if self.fps == 0 {
            return Err(CaptureError::invalid("fps must be positive"));
        }
        if self.resolution.contains(&0) {
            return Err(CaptureError::invalid(format!(
                "resolution must be positive, got {}x{}",
                self.resolution[0], self.resolution[1]
            )));
        }
        if self.samples == 0 {
            return Err(CaptureError::invalid("sample count must be positive"));
        }
        if self
            .ellipse
            .iter()
            .any(|r| !(r.is_finite() && *r > 0.))
        {
            return Err(CaptureError::invalid(format!(
                "ellipse radii must be positive, got {:?}",
                self.ellipse
            )));
        }
        let ext = self.image_extension.to_ascii_lowercase();
        if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(CaptureError::invalid(format!(
                "unsupported image extension '{}', expected one of {SUPPORTED_EXTENSIONS:?}",
                self.image_extension
            )));
        }
        if let Some(peak) = self.peak_force {
            if peak.iter().any(|c| !c.is_finite()) {
                return Err(CaptureError::invalid(format!(
                    "peak force must be finite, got {peak:?}"
                )));
            }
        }
        if self.views.is_empty() {
            return Err(CaptureError::invalid("at least one view is required"));
        }
        for (i, view) in self.views.iter().enumerate() {
            if self.views[..i].iter().any(|v| v.output_dir == view.output_dir) {
                return Err(CaptureError::invalid(format!(
                    "views share the output directory {}",
                    view.output_dir.display()
                )));
            }
        }
        if self.frame_count() == 0 {
            return Err(CaptureError::invalid(format!(
                "{} s at {} fps gives no frame",
                self.simulation_time, self.fps
            )));
        }
        Ok(())
    }

    /// Number of simulation steps, `round(simulation_time * fps)`.
    pub fn frame_count(&self) -> usize {
        (self.simulation_time * self.fps as f64).round() as usize
    }

    /// Simulated seconds per step.
    pub fn dt(&self) -> f64 {
        1. / self.fps as f64
    }

    /// Places every relative view directory under `root`.
    pub fn set_output_root(&mut self, root: &Path) {
        for view in self.views.iter_mut() {
            if view.output_dir.is_relative() {
                view.output_dir = root.join(&view.output_dir);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CaptureConfig::default();
        config.validate().unwrap();
        assert_eq!(config.frame_count(), 120);
        assert!((config.dt() - 1. / 60.).abs() < 1e-15);
        assert_eq!(config.views.len(), 2);
        assert_eq!(config.views[1].camera, NARROW_CAMERA);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cases: Vec<Box<dyn Fn(&mut CaptureConfig)>> = vec![
            Box::new(|c: &mut CaptureConfig| c.simulation_time = 0.),
            Box::new(|c: &mut CaptureConfig| c.simulation_time = f64::NAN),
            Box::new(|c: &mut CaptureConfig| c.fps = 0),
            Box::new(|c: &mut CaptureConfig| c.resolution = [0, 600]),
            Box::new(|c: &mut CaptureConfig| c.samples = 0),
            Box::new(|c: &mut CaptureConfig| c.ellipse = [40., -1.]),
            Box::new(|c: &mut CaptureConfig| c.image_extension = "bmp".to_string()),
            Box::new(|c: &mut CaptureConfig| c.views.clear()),
            Box::new(|c: &mut CaptureConfig| c.views[1].output_dir = c.views[0].output_dir.clone()),
            Box::new(|c: &mut CaptureConfig| c.simulation_time = 0.001),
        ];
        for (i, mutate) in cases.iter().enumerate() {
            let mut config = CaptureConfig::default();
            mutate(&mut config);
            assert!(
                matches!(config.validate(), Err(CaptureError::InvalidParameter(_))),
                "case {i} should be rejected"
            );
        }
    }

    #[test]
    fn test_from_json_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"simulation_time": 1.5, "fps": 10, "projection": "orthographic"}}"#
        )
        .unwrap();

        let config = CaptureConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.frame_count(), 15);
        assert_eq!(config.projection, ProjectionType::Orthographic);
        assert_eq!(config.resolution, [800, 600]);
        assert_eq!(config.force_field.as_deref(), Some(TRACTION));
    }

    #[test]
    fn test_from_json_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CaptureConfig::from_json_file(&dir.path().join("missing.json")).is_err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(CaptureConfig::from_json_file(file.path()).is_err());
    }

    #[test]
    fn test_set_output_root() {
        let mut config = CaptureConfig::default();
        config.views[1].output_dir = PathBuf::from("/abs/only_ball");
        config.set_output_root(Path::new("/tmp/run"));
        assert_eq!(config.views[0].output_dir, Path::new("/tmp/run/beam_and_ball"));
        assert_eq!(config.views[1].output_dir, Path::new("/abs/only_ball"));
    }
}
