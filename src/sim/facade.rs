use std::path::Path;

use crate::error::Result;
use crate::scene::SceneGraph;

/// Opaque reference to a scene loaded into a [`SimulationFacade`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneHandle(usize);

impl SceneHandle {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// The simulation engine as seen by the capture driver.
///
/// Call order per scene: `load`, structural edits through `scene_mut`, `init`,
/// `init_visual`, then any number of `step` + `update_visual` pairs. `init` and
/// `init_visual` may each be called once.
pub trait SimulationFacade {
    fn load(&mut self, scene: SceneGraph) -> Result<SceneHandle>;

    fn scene(&self, handle: SceneHandle) -> Result<&SceneGraph>;

    fn scene_mut(&mut self, handle: SceneHandle) -> Result<&mut SceneGraph>;

    fn init(&mut self, handle: SceneHandle) -> Result<()>;

    fn init_visual(&mut self, handle: SceneHandle) -> Result<()>;

    /// Advances physics by `dt` seconds.
    ///
    /// Fails with `SolverDivergence` or `Integration`.
    fn step(&mut self, handle: SceneHandle, dt: f64) -> Result<()>;

    fn update_visual(&mut self, handle: SceneHandle) -> Result<()>;

    /// Renders the camera at component path `camera` and writes the frame to `path`.
    fn save_frame(&mut self, handle: SceneHandle, camera: &str, path: &Path) -> Result<()>;
}
