//! Physics modules of the reference engine.
//!
//! The body is treated as a quasi-static Euler-Bernoulli cantilever along z:
//! clamped where its [`FixedBox`](crate::scene::FixedBox) selects grid nodes,
//! loaded by the sum of all traction fields acting on it.

use anyhow::{bail, Context, Result};

use crate::error::CaptureError;
use crate::scene::{Component, NodeId, RegularGrid, SceneGraph};
use crate::{Point, Vector};

use super::framework::{Bus, SimContext, SimModule};

/// Total traction on the body at the current time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TractionLoad {
    pub total: Vector,
}

/// Sums every `LinearForceField` over the grid nodes it selects.
#[derive(Debug, Default)]
pub struct TractionModule {
    // (component path, number of grid nodes inside its box)
    fields: Vec<(String, usize)>,
}

impl TractionModule {
    fn total_at(&self, scene: &SceneGraph, time: f64) -> Result<Vector> {
        let mut total = Vector::zero();
        for (path, count) in &self.fields {
            let Component::ForceField(field) = scene.component(path)? else {
                bail!("component '{path}' is no longer a force field");
            };
            total = total + field.force_at(time) * (*count as f64);
        }
        Ok(total)
    }
}

impl SimModule for TractionModule {
    fn name(&self) -> &'static str {
        "traction"
    }

    fn init(&mut self, ctx: &SimContext, bus: &mut Bus) -> Result<()> {
        self.fields.clear();
        for (node, component) in ctx.scene.components() {
            let Component::ForceField(field) = component else {
                continue;
            };
            let path = crate::scene::join_path(&ctx.scene.node_path(node), &field.name);
            let grid = grid_of(ctx.scene, node)?
                .with_context(|| format!("force field '{path}' has no grid to act on"))?;
            let count = grid
                .points()
                .iter()
                .filter(|p| field.region.contains(p))
                .count();
            if count == 0 {
                log::warn!("force field '{path}' selects no grid node");
            }
            self.fields.push((path, count));
        }
        let total = self.total_at(ctx.scene, ctx.time)?;
        bus.put(TractionLoad { total });
        Ok(())
    }

    fn step(&mut self, ctx: &SimContext, bus: &mut Bus) -> Result<()> {
        let total = self.total_at(ctx.scene, ctx.time)?;
        bus.put(TractionLoad { total });
        Ok(())
    }
}

fn grid_of(scene: &SceneGraph, node: NodeId) -> Result<Option<&RegularGrid>> {
    Ok(scene.node(node)?.components().iter().find_map(|c| match c {
        Component::Grid(g) => Some(g),
        _ => None,
    }))
}

/// Bending response of a clamped beam to a transverse tip load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamShape {
    pub z_fixed: f64,
    /// +1 if the beam extends towards +z from its clamped end, -1 otherwise.
    pub direction: f64,
    pub length: f64,
    // 1 / (6 E I) for bending in x and in y
    compliance_x: f64,
    compliance_y: f64,
}

impl BeamShape {
    /// Deflection at axial position `z`: `w(s) = F s² (3L − s) / (6 E I)`.
    ///
    /// The axial component of the load is ignored.
    pub fn displacement_at(&self, z: f64, load: Vector) -> Vector {
        let s = ((z - self.z_fixed) * self.direction).clamp(0., self.length);
        let shape = s * s * (3. * self.length - s);
        Vector::new(
            load.dx * shape * self.compliance_x,
            load.dy * shape * self.compliance_y,
            0.,
        )
    }
}

/// Deformed configuration published on the bus after every step.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamDeflection {
    /// Node owning the deformed grid.
    pub node: NodeId,
    pub positions: Vec<Point>,
    pub load: Vector,
    pub shape: BeamShape,
}

impl BeamDeflection {
    pub fn displacement_at(&self, z: f64) -> Vector {
        self.shape.displacement_at(z, self.load)
    }

    /// Displacement of the free end.
    pub fn tip_displacement(&self) -> Vector {
        let tip = self.shape.z_fixed + self.shape.direction * self.shape.length;
        self.displacement_at(tip)
    }
}

#[derive(Debug, Default)]
pub struct CantileverModule {
    beam: Option<(NodeId, Vec<Point>, BeamShape)>,
}

impl CantileverModule {
    fn setup(scene: &SceneGraph) -> Result<Option<(NodeId, Vec<Point>, BeamShape)>> {
        let Some((node, grid)) = scene.components().find_map(|(id, c)| match c {
            Component::Grid(g) => Some((id, g)),
            _ => None,
        }) else {
            return Ok(None);
        };
        let path = scene.node_path(node);
        let components = scene.node(node)?.components();

        let material = components
            .iter()
            .find_map(|c| match c {
                Component::Material(m) => Some(m),
                _ => None,
            })
            .with_context(|| format!("grid in '{path}' has no material"))?;
        let fixed = components
            .iter()
            .find_map(|c| match c {
                Component::Fixed(f) => Some(f),
                _ => None,
            })
            .with_context(|| format!("grid in '{path}' is not clamped anywhere"))?;

        let rest = grid.points();
        let clamped: Vec<f64> = rest
            .iter()
            .filter(|p| fixed.region.contains(p))
            .map(|p| p.z)
            .collect();
        if clamped.is_empty() {
            bail!("fixed box '{}' selects no grid node", fixed.name);
        }
        let z_fixed = clamped.iter().sum::<f64>() / clamped.len() as f64;
        let z_mid = (grid.min.z + grid.max.z) / 2.;
        let direction = if z_fixed <= z_mid { 1. } else { -1. };
        let length = rest
            .iter()
            .map(|p| (p.z - z_fixed) * direction)
            .fold(0., f64::max);
        if length <= 0. {
            bail!("beam in '{path}' has zero length");
        }

        let size = grid.max - grid.min;
        let e = material.young_modulus;
        let i_bend_y = size.dx * size.dy.powi(3) / 12.;
        let i_bend_x = size.dy * size.dx.powi(3) / 12.;
        let shape = BeamShape {
            z_fixed,
            direction,
            length,
            compliance_x: 1. / (6. * e * i_bend_x),
            compliance_y: 1. / (6. * e * i_bend_y),
        };
        Ok(Some((node, rest, shape)))
    }
}

impl SimModule for CantileverModule {
    fn name(&self) -> &'static str {
        "cantilever"
    }

    fn init(&mut self, ctx: &SimContext, bus: &mut Bus) -> Result<()> {
        self.beam = Self::setup(ctx.scene)?;
        if let Some((node, rest, shape)) = &self.beam {
            bus.put(BeamDeflection {
                node: *node,
                positions: rest.clone(),
                load: Vector::zero(),
                shape: *shape,
            });
        }
        Ok(())
    }

    fn step(&mut self, _ctx: &SimContext, bus: &mut Bus) -> Result<()> {
        let Some((node, rest, shape)) = &self.beam else {
            return Ok(());
        };
        let load = bus.require::<TractionLoad>()?.total;

        let mut positions = Vec::with_capacity(rest.len());
        for p in rest {
            let u = shape.displacement_at(p.z, load);
            if !u.is_finite() || u.length() > shape.length {
                return Err(CaptureError::divergence(format!(
                    "displacement {u} at {p} exceeds the beam length {} under load {load}",
                    shape.length
                ))
                .into());
            }
            positions.push(*p + u);
        }

        bus.put(BeamDeflection {
            node: *node,
            positions,
            load,
            shape: *shape,
        });
        Ok(())
    }
}
