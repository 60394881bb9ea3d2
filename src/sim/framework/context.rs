use crate::scene::SceneGraph;

/// Read-only view of the scene and the clock passed to simulation modules.
pub struct SimContext<'a> {
    pub scene: &'a SceneGraph,
    /// Simulated time at the end of the current step.
    pub time: f64,
    pub dt: f64,
}

impl<'a> SimContext<'a> {
    pub fn new(scene: &'a SceneGraph, time: f64, dt: f64) -> Self {
        Self { scene, time, dt }
    }
}
