//! Ready-made scenes.

use crate::camera::{OffscreenCamera, ProjectionType};
use crate::error::Result;
use crate::{Point, Vector};

use super::{ElasticMaterial, FixedBox, LinearForceField, RegularGrid, SceneGraph, VisualModel};

pub const WIDE_CAMERA: &str = "beam/beam_and_ball";
pub const NARROW_CAMERA: &str = "beam/ball/only_ball";
pub const TRACTION: &str = "beam/traction";

/// A 20×4×4 beam clamped at `z = -10` and pulled down at `z = 10`, with a ball
/// embedded near the free end.
///
/// Two cameras: `beam_and_ball` on the beam node sees everything, `only_ball` on
/// the ball node sees just the ball. Both capture automatically (once before the
/// first step, then every 5 steps) unless told otherwise.
pub fn beam_and_ball() -> Result<SceneGraph> {
    let mut scene = SceneGraph::new();
    scene.dt = 1.;

    let beam = scene.add_child(scene.root(), "beam")?;
    scene.add_component(beam, camera("beam_and_ball"))?;
    scene.add_component(
        beam,
        RegularGrid::new(
            "grid",
            [5, 5, 21],
            Point::new(-2., -2., -10.),
            Point::new(2., 2., 10.),
        ),
    )?;
    scene.add_component(beam, ElasticMaterial::new("fem", 5000., 0.45))?;
    scene.add_component(beam, FixedBox::new("fixed_face", [-2., -2., -10.1, 2., 2., -9.9]))?;
    scene.add_component(
        beam,
        LinearForceField::new(
            "traction",
            [-2., -2., 9.9, 2., 2., 10.1],
            vec![0., 4.],
            vec![Vector::new(0., -1., 0.), Vector::new(0., -10., 0.)],
        ),
    )?;

    let ball = scene.add_child(beam, "ball")?;
    scene.add_component(
        ball,
        VisualModel::sphere("ball", Point::new(0., 0., 9.), 1.)
            .with_color([1., 0., 0.])
            .mapped(),
    )?;
    scene.add_component(ball, camera("only_ball"))?;

    Ok(scene)
}

fn camera(name: &str) -> OffscreenCamera {
    OffscreenCamera::new(name)
        .with_filepath("%s_%i.png")
        .with_auto_capture(true, 5)
        .with_position(Point::new(-20., 0., 0.))
        .with_look_at(Point::origin())
        .with_clip_planes(0.01, 200.)
        .with_projection(ProjectionType::Orthographic)
}
