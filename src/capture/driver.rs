use std::fmt;

use crate::config::CaptureConfig;
use crate::error::{CaptureError, Result, RunError, Stage};
use crate::scene::{with_array_mut, HasProperties, PropertyValue, SceneGraph};
use crate::sim::clock::SimulationClock;
use crate::sim::facade::{SceneHandle, SimulationFacade};
use crate::sim::path::CameraPathSchedule;
use crate::sim::ramp::ForceRampSchedule;
use crate::Vector;

use super::output::ensure_output_dir;
use super::view::{CameraView, ViewSummary};

/// Lifecycle of a [`CaptureDriver`]. Each state is entered exactly once, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Uninitialized,
    Built,
    Initialized,
    /// Frame `i` of the run has been stepped to.
    Stepping(usize),
    Done,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverState::Uninitialized => f.write_str("uninitialized"),
            DriverState::Built => f.write_str("built"),
            DriverState::Initialized => f.write_str("initialized"),
            DriverState::Stepping(i) => write!(f, "stepping({i})"),
            DriverState::Done => f.write_str("done"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Simulation steps taken.
    pub frame_count: usize,
    /// Simulated seconds at the end of the run.
    pub simulated_time: f64,
    pub views: Vec<ViewSummary>,
}

impl RunSummary {
    pub fn total_files(&self) -> usize {
        self.views.iter().map(|v| v.frames_written).sum()
    }
}

/// Steps a scene and saves one frame per step for every camera view.
///
/// All views orbit the scene on the same elliptical path. Frame `t` of every
/// view shows the physics state after `t` steps. Any failure aborts the run.
pub struct CaptureDriver<F: SimulationFacade> {
    facade: F,
    config: CaptureConfig,
    path: CameraPathSchedule,
    clock: SimulationClock,
    ramp: Option<ForceRampSchedule>,
    views: Vec<CameraView>,
    state: DriverState,
}

impl<F: SimulationFacade> CaptureDriver<F> {
    pub fn new(facade: F, config: CaptureConfig) -> Result<Self> {
        config.validate()?;
        let frame_count = config.frame_count();
        let path = CameraPathSchedule::ellipse(frame_count, config.ellipse[0], config.ellipse[1])?;
        let clock = SimulationClock::new(frame_count, config.dt())?;
        let views = config
            .views
            .iter()
            .map(|v| CameraView::new(v, &config.image_extension))
            .collect();
        Ok(Self {
            facade,
            config,
            path,
            clock,
            ramp: None,
            views,
            state: DriverState::Uninitialized,
        })
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn facade(&self) -> &F {
        &self.facade
    }

    pub fn into_facade(self) -> F {
        self.facade
    }

    pub fn path(&self) -> &CameraPathSchedule {
        &self.path
    }

    /// Ramp written into the force field, in simulated seconds. Set once built.
    pub fn ramp(&self) -> Option<&ForceRampSchedule> {
        self.ramp.as_ref()
    }

    pub fn views(&self) -> &[CameraView] {
        &self.views
    }

    /// Runs the whole capture. A driver runs at most once.
    pub fn run(&mut self, scene: SceneGraph) -> std::result::Result<RunSummary, RunError> {
        if self.state != DriverState::Uninitialized {
            return Err(RunError::new(
                Stage::Build,
                0,
                CaptureError::integration(format!("driver already ran (state: {})", self.state)),
            ));
        }

        let handle = self
            .build(scene)
            .map_err(|e| RunError::new(Stage::Build, 0, e))?;
        self.transition(DriverState::Built, Stage::Build)?;

        self.facade
            .init(handle)
            .and_then(|()| self.facade.init_visual(handle))
            .map_err(|e| RunError::new(Stage::Init, 0, e))?;
        self.transition(DriverState::Initialized, Stage::Init)?;

        for view in &self.views {
            ensure_output_dir(&view.output_dir).map_err(|e| RunError::new(Stage::Capture, 0, e))?;
            log::info!("'{}' frames go to {}", view.label, view.output_dir.display());
        }
        self.capture(handle, 0)
            .map_err(|e| RunError::new(Stage::Capture, 0, e))?;

        let frame_count = self.clock.frame_count();
        let dt = self.clock.dt();
        log::info!(
            "stepping {frame_count} frames of {dt:.4} s with {} views",
            self.views.len()
        );
        while !self.clock.is_done() {
            let frame = self
                .clock
                .tick()
                .map_err(|e| RunError::new(Stage::Step, self.clock.index(), e))?;
            self.transition(DriverState::Stepping(frame), Stage::Step)?;

            self.facade
                .step(handle, dt)
                .and_then(|()| self.facade.update_visual(handle))
                .map_err(|e| RunError::new(Stage::Step, frame, e))?;
            self.capture(handle, frame)
                .map_err(|e| RunError::new(Stage::Capture, frame, e))?;

            if frame % self.config.fps as usize == 0 {
                log::info!(
                    "simulated {:.2} s ({frame}/{frame_count} frames)",
                    self.clock.elapsed()
                );
            }
        }
        self.transition(DriverState::Done, Stage::Step)?;

        let summary = RunSummary {
            frame_count,
            simulated_time: self.clock.elapsed(),
            views: self.views.iter().map(CameraView::summary).collect(),
        };
        log::info!(
            "wrote {} frames over {:.2} simulated seconds",
            summary.total_files(),
            summary.simulated_time
        );
        Ok(summary)
    }

    /// Loads the scene and applies every structural override before `init`.
    fn build(&mut self, scene: SceneGraph) -> Result<SceneHandle> {
        let handle = self.facade.load(scene)?;
        let graph = self.facade.scene_mut(handle)?;
        graph.dt = self.clock.dt();

        let [width, height] = self.config.resolution;
        for view in &self.views {
            let camera = graph.camera_mut(&view.camera)?;
            camera.set_property("projectionType", self.config.projection.code().into())?;
            camera.set_property("widthViewport", width.into())?;
            camera.set_property("heightViewport", height.into())?;
            camera.set_property("multisampling", self.config.samples.into())?;
        }
        // Frames are saved by the driver only, once per step. This holds for
        // every camera in the scene, captured or not.
        for path in graph.camera_paths() {
            let camera = graph.camera_mut(&path)?;
            camera.set_property("save_frame_before_first_step", false.into())?;
            camera.set_property("save_frame_after_each_n_steps", 0u32.into())?;
        }

        if let Some(field_path) = &self.config.force_field {
            let field = graph.force_field_mut(field_path)?;
            let peak = match self.config.peak_force {
                Some(peak) => Vector::from(peak),
                None => field.last_force().ok_or_else(|| {
                    CaptureError::scene(format!(
                        "force field '{field_path}' has no keyframe to take the peak force from"
                    ))
                })?,
            };
            let ramp = ForceRampSchedule::new(self.clock.frame_count(), peak)?
                .to_simulated_time(self.clock.dt());
            with_array_mut(field, "times", |times| *times = ramp.times())?;
            with_array_mut(field, "forces", |forces| *forces = ramp.flat_forces())?;
            field.validate()?;
            log::debug!("force ramp on '{field_path}' peaks at {peak}");
            self.ramp = Some(ramp);
        }
        Ok(handle)
    }

    /// Moves every camera to `p[frame]` and saves its next frame.
    fn capture(&mut self, handle: SceneHandle, frame: usize) -> Result<()> {
        if !matches!(
            self.state,
            DriverState::Initialized | DriverState::Stepping(_)
        ) {
            return Err(CaptureError::integration(format!(
                "cannot capture while {}",
                self.state
            )));
        }
        let position = self.path.position(frame).ok_or_else(|| {
            CaptureError::integration(format!("camera path has no point for frame {frame}"))
        })?;

        for view in self.views.iter_mut() {
            if view.next_frame() != frame {
                return Err(CaptureError::integration(format!(
                    "view '{}' is at frame {}, expected {frame}",
                    view.label,
                    view.next_frame()
                )));
            }
            let camera = self.facade.scene_mut(handle)?.camera_mut(&view.camera)?;
            with_array_mut(camera, "position", |p| *p = position.to_array().to_vec())?;

            let file = view.next_path();
            self.facade.save_frame(handle, &view.camera, &file)?;
            view.mark_written();
        }
        Ok(())
    }

    fn transition(&mut self, next: DriverState, stage: Stage) -> std::result::Result<(), RunError> {
        use DriverState::*;
        let legal = match (self.state, next) {
            (Uninitialized, Built) | (Built, Initialized) => true,
            (Initialized, Stepping(1)) => true,
            (Stepping(i), Stepping(j)) => j == i + 1,
            (Stepping(i), Done) => i == self.clock.frame_count(),
            _ => false,
        };
        if !legal {
            let frame = match self.state {
                Stepping(i) => i,
                _ => 0,
            };
            return Err(RunError::new(
                stage,
                frame,
                CaptureError::integration(format!(
                    "illegal driver transition {} -> {next}",
                    self.state
                )),
            ));
        }
        log::debug!("driver {} -> {next}", self.state);
        self.state = next;
        Ok(())
    }
}

/// Reads a property back, for callers that inspect the scene after a run.
pub fn camera_property<F: SimulationFacade>(
    facade: &F,
    handle: SceneHandle,
    camera: &str,
    name: &str,
) -> Result<PropertyValue> {
    facade
        .scene(handle)?
        .camera(camera)?
        .get_property(name)
        .ok_or_else(|| CaptureError::scene(format!("camera '{camera}' has no property '{name}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use crate::render::SoftwareRenderer;
    use crate::scene::demo::{beam_and_ball, NARROW_CAMERA, TRACTION, WIDE_CAMERA};
    use crate::sim::engine::Engine;
    use tempfile::tempdir;

    fn small_config(root: &std::path::Path) -> CaptureConfig {
        CaptureConfig {
            simulation_time: 1.,
            fps: 4,
            resolution: [32, 24],
            samples: 1,
            image_extension: "png".to_string(),
            views: vec![
                ViewConfig::new("wide", WIDE_CAMERA, root.join("wide")),
                ViewConfig::new("ball", NARROW_CAMERA, root.join("ball")),
            ],
            ..CaptureConfig::default()
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = CaptureConfig {
            ellipse: [0., 1.],
            ..CaptureConfig::default()
        };
        let res = CaptureDriver::new(Engine::new(SoftwareRenderer::default()), config);
        assert!(matches!(res, Err(CaptureError::InvalidParameter(_))));
    }

    #[test]
    fn test_run_applies_overrides_and_ramp() {
        let dir = tempdir().unwrap();
        let mut driver =
            CaptureDriver::new(Engine::new(SoftwareRenderer::default()), small_config(dir.path()))
                .unwrap();
        assert_eq!(driver.state(), DriverState::Uninitialized);

        let summary = driver.run(beam_and_ball().unwrap()).unwrap();
        assert_eq!(driver.state(), DriverState::Done);
        assert_eq!(summary.frame_count, 4);
        assert_eq!(summary.total_files(), 10);
        assert!((summary.simulated_time - 1.).abs() < 1e-12);

        let engine = driver.facade();
        let h = SceneHandle::new(0);
        let scene = engine.scene(h).unwrap();
        assert!((scene.dt - 0.25).abs() < 1e-15);
        for camera in [WIDE_CAMERA, NARROW_CAMERA] {
            let c = scene.camera(camera).unwrap();
            assert_eq!((c.width, c.height), (32, 24));
            assert!(!c.save_frame_before_first_step);
            assert_eq!(c.save_frame_after_each_n_steps, 0);
            assert_eq!(
                camera_property(engine, h, camera, "projectionType").unwrap(),
                PropertyValue::UInt(0)
            );
            // Last path point closes the loop
            assert!(c.position.is_within(&driver.path().positions()[0], 1e-9));
        }

        // Peak taken from the scene's last keyframe, times in seconds
        let Ok(crate::scene::Component::ForceField(field)) = scene.component(TRACTION) else {
            panic!("traction field missing");
        };
        assert_eq!(field.times, vec![0., 0.5, 1.]);
        assert_eq!(&field.forces[3..6], &[0., -10., 0.]);
        assert!((field.forces[1] - -2.5).abs() < 1e-12);
        assert_eq!(driver.ramp().unwrap().times(), field.times);
    }

    #[test]
    fn test_second_run_is_rejected() {
        let dir = tempdir().unwrap();
        let mut driver =
            CaptureDriver::new(Engine::new(SoftwareRenderer::default()), small_config(dir.path()))
                .unwrap();
        driver.run(beam_and_ball().unwrap()).unwrap();
        let err = driver.run(beam_and_ball().unwrap()).unwrap_err();
        assert_eq!(err.stage, Stage::Build);
        assert_eq!(driver.state(), DriverState::Done);
    }

    #[test]
    fn test_missing_camera_fails_at_build() {
        let dir = tempdir().unwrap();
        let mut config = small_config(dir.path());
        config.views[1].camera = "beam/ball/nothing".to_string();
        let mut driver =
            CaptureDriver::new(Engine::new(SoftwareRenderer::default()), config).unwrap();
        let err = driver.run(beam_and_ball().unwrap()).unwrap_err();
        assert_eq!(err.stage, Stage::Build);
        assert!(matches!(err.source, CaptureError::SceneBuild(_)));
        assert_eq!(driver.state(), DriverState::Uninitialized);
        assert!(!dir.path().join("wide").exists());
    }
}
