//! Reference [`SimulationFacade`] implementation.
//!
//! Physics is the [`TractionModule`] + [`CantileverModule`] pipeline; frames go
//! through whatever [`FrameRenderer`] the engine was built with.

use std::path::{Path, PathBuf};

use crate::error::{CaptureError, Result};
use crate::render::{write_frame, Drawable, FrameRenderer};
use crate::scene::{Component, NodeId, SceneGraph};

use super::facade::{SceneHandle, SimulationFacade};
use super::framework::{Bus, Pipeline, SimContext};
use super::modules::{BeamDeflection, CantileverModule, TractionModule};

const GRID_COLOR: [u8; 3] = [180, 180, 180];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Loaded,
    Initialized,
    VisualReady,
}

struct LoadedScene {
    graph: SceneGraph,
    phase: Phase,
    time: f64,
    pipeline: Pipeline,
    bus: Bus,
    visuals: Vec<(NodeId, Drawable)>,
}

impl LoadedScene {
    fn refresh_visuals(&mut self) {
        self.visuals = build_visuals(&self.graph, &self.bus);
    }
}

pub struct Engine<R: FrameRenderer> {
    renderer: R,
    scenes: Vec<LoadedScene>,
    capture_root: Option<PathBuf>,
    frames_saved: usize,
}

impl<R: FrameRenderer> Engine<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            scenes: vec![],
            capture_root: None,
            frames_saved: 0,
        }
    }

    /// Directory relative auto-capture paths are resolved against.
    ///
    /// Without it they are relative to the working directory.
    pub fn with_capture_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.capture_root = Some(dir.into());
        self
    }

    /// Number of frames written so far, manual and automatic.
    pub fn frames_saved(&self) -> usize {
        self.frames_saved
    }

    /// Simulated time of the scene in seconds.
    pub fn time(&self, handle: SceneHandle) -> Result<f64> {
        Ok(entry(&self.scenes, handle)?.time)
    }

    pub fn deflection(&self, handle: SceneHandle) -> Result<Option<&BeamDeflection>> {
        Ok(entry(&self.scenes, handle)?.bus.get::<BeamDeflection>())
    }

    fn auto_capture(&mut self, handle: SceneHandle, cameras: &[String]) -> Result<()> {
        for camera in cameras {
            let file = entry(&self.scenes, handle)?
                .graph
                .camera(camera)?
                .parse_file_path();
            let path = match &self.capture_root {
                Some(root) => root.join(&file),
                None => PathBuf::from(&file),
            };
            log::debug!("automatic capture of '{camera}'");
            self.save_frame(handle, camera, &path)?;
        }
        Ok(())
    }
}

impl<R: FrameRenderer> SimulationFacade for Engine<R> {
    fn load(&mut self, scene: SceneGraph) -> Result<SceneHandle> {
        scene.validate()?;
        let handle = SceneHandle::new(self.scenes.len());
        log::debug!(
            "loaded scene #{} with {} nodes",
            handle.index(),
            scene.node_count()
        );
        self.scenes.push(LoadedScene {
            graph: scene,
            phase: Phase::Loaded,
            time: 0.,
            pipeline: Pipeline::new()
                .with_module(TractionModule::default())
                .with_module(CantileverModule::default()),
            bus: Bus::new(),
            visuals: vec![],
        });
        Ok(handle)
    }

    fn scene(&self, handle: SceneHandle) -> Result<&SceneGraph> {
        Ok(&entry(&self.scenes, handle)?.graph)
    }

    fn scene_mut(&mut self, handle: SceneHandle) -> Result<&mut SceneGraph> {
        Ok(&mut entry_mut(&mut self.scenes, handle)?.graph)
    }

    fn init(&mut self, handle: SceneHandle) -> Result<()> {
        let scene = entry_mut(&mut self.scenes, handle)?;
        if scene.phase != Phase::Loaded {
            return Err(CaptureError::integration("scene is already initialized"));
        }
        scene.graph.validate()?;

        let ctx = SimContext::new(&scene.graph, scene.time, scene.graph.dt);
        scene
            .pipeline
            .init(&ctx, &mut scene.bus)
            .map_err(|e| from_module_error(e, CaptureError::scene::<String>))?;

        for (_, component) in scene.graph.components_mut() {
            if let Component::Camera(camera) = component {
                camera.reset();
            }
        }
        scene.phase = Phase::Initialized;
        log::info!(
            "initialized scene #{} with modules {:?}",
            handle.index(),
            scene.pipeline.module_names()
        );
        Ok(())
    }

    fn init_visual(&mut self, handle: SceneHandle) -> Result<()> {
        let scene = entry_mut(&mut self.scenes, handle)?;
        match scene.phase {
            Phase::Loaded => {
                return Err(CaptureError::scene("init_visual() called before init()"));
            }
            Phase::VisualReady => {
                return Err(CaptureError::scene("visual state is already initialized"));
            }
            Phase::Initialized => {}
        }
        scene.refresh_visuals();
        scene.phase = Phase::VisualReady;

        let mut eager = vec![];
        for path in scene.graph.camera_paths() {
            if scene.graph.camera(&path)?.save_frame_before_first_step {
                eager.push(path);
            }
        }
        self.auto_capture(handle, &eager)
    }

    fn step(&mut self, handle: SceneHandle, dt: f64) -> Result<()> {
        if !(dt.is_finite() && dt > 0.) {
            return Err(CaptureError::integration(format!(
                "time step must be positive, got {dt}"
            )));
        }
        let scene = entry_mut(&mut self.scenes, handle)?;
        if scene.phase == Phase::Loaded {
            return Err(CaptureError::integration("step() called before init()"));
        }

        let time = scene.time + dt;
        let ctx = SimContext::new(&scene.graph, time, dt);
        scene
            .pipeline
            .step(&ctx, &mut scene.bus)
            .map_err(|e| from_module_error(e, CaptureError::integration::<String>))?;
        scene.time = time;

        let mut due = vec![];
        for path in scene.graph.camera_paths() {
            if scene.graph.camera_mut(&path)?.end_step() {
                due.push(path);
            }
        }
        if due.is_empty() {
            return Ok(());
        }
        if scene.phase != Phase::VisualReady {
            log::warn!("skipping automatic capture of {due:?}: visuals are not initialized");
            return Ok(());
        }
        scene.refresh_visuals();
        self.auto_capture(handle, &due)
    }

    fn update_visual(&mut self, handle: SceneHandle) -> Result<()> {
        let scene = entry_mut(&mut self.scenes, handle)?;
        if scene.phase != Phase::VisualReady {
            return Err(CaptureError::scene(
                "update_visual() called before init_visual()",
            ));
        }
        scene.refresh_visuals();
        Ok(())
    }

    fn save_frame(&mut self, handle: SceneHandle, camera: &str, path: &Path) -> Result<()> {
        let scene = entry(&self.scenes, handle)?;
        if scene.phase != Phase::VisualReady {
            return Err(CaptureError::scene(format!(
                "cannot save '{camera}': visual state of the scene is not initialized, \
                 was init_visual() called?"
            )));
        }
        let view = scene.graph.camera(camera)?.render_view();
        let visible = scene.graph.subtree(scene.graph.owner_of(camera)?);
        let drawables: Vec<Drawable> = scene
            .visuals
            .iter()
            .filter(|(id, _)| visible.contains(id))
            .map(|(_, d)| d.clone())
            .collect();

        let frame = self.renderer.render(&view, &drawables)?;
        write_frame(&frame, path)?;
        self.frames_saved += 1;
        log::debug!("saved '{camera}' to {}", path.display());
        Ok(())
    }
}

fn entry(scenes: &[LoadedScene], handle: SceneHandle) -> Result<&LoadedScene> {
    scenes
        .get(handle.index())
        .ok_or_else(|| CaptureError::scene(format!("unknown scene handle {}", handle.index())))
}

fn entry_mut(scenes: &mut [LoadedScene], handle: SceneHandle) -> Result<&mut LoadedScene> {
    scenes
        .get_mut(handle.index())
        .ok_or_else(|| CaptureError::scene(format!("unknown scene handle {}", handle.index())))
}

/// Keeps the kind of a typed module failure, or falls back to `fallback`.
fn from_module_error(err: anyhow::Error, fallback: fn(String) -> CaptureError) -> CaptureError {
    let msg = format!("{err:#}");
    match err.downcast_ref::<CaptureError>() {
        Some(CaptureError::SolverDivergence(_)) => CaptureError::divergence(msg),
        Some(CaptureError::SceneBuild(_)) => CaptureError::scene(msg),
        Some(CaptureError::InvalidParameter(_)) => CaptureError::invalid(msg),
        _ => fallback(msg),
    }
}

/// Grids become grey point clouds, visual models sphere shells.
///
/// Mapped visual models below the deformed grid follow its displacement.
fn build_visuals(graph: &SceneGraph, bus: &Bus) -> Vec<(NodeId, Drawable)> {
    let deflection = bus.get::<BeamDeflection>();
    let deformed_nodes = deflection
        .map(|d| graph.subtree(d.node))
        .unwrap_or_default();

    graph
        .components()
        .filter_map(|(id, component)| {
            let drawable = match component {
                Component::Grid(grid) => {
                    let points = match deflection {
                        Some(d) if d.node == id => d.positions.clone(),
                        _ => grid.points(),
                    };
                    Drawable {
                        points,
                        color: GRID_COLOR,
                        point_size: 2,
                    }
                }
                Component::Visual(model) => {
                    let mut points = model.surface_points();
                    let follows = deflection.filter(|_| model.mapped && deformed_nodes.contains(&id));
                    if let Some(d) = follows {
                        let u = d.displacement_at(model.translation.z);
                        for p in points.iter_mut() {
                            *p = *p + u;
                        }
                    }
                    Drawable {
                        points,
                        color: model.rgb(),
                        point_size: 3,
                    }
                }
                _ => return None,
            };
            Some((id, drawable))
        })
        .collect()
}
