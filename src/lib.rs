pub mod camera;
pub mod capture;
pub mod config;
pub mod error;
pub mod geom;
mod name;
pub mod render;
pub mod scene;
pub mod sim;
mod uid;

// Prelude
pub use camera::{OffscreenCamera, ProjectionType};
pub use capture::{CaptureDriver, RunSummary};
pub use config::{CaptureConfig, ViewConfig};
pub use error::{CaptureError, RunError, Stage};
pub use geom::point::Point;
pub use geom::vector::Vector;
pub use name::{FindByName, HasName};
pub use scene::SceneGraph;
pub use sim::engine::Engine;
pub use sim::facade::{SceneHandle, SimulationFacade};
pub use uid::UID;
