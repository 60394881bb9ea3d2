//! Typed scene components.
//!
//! Each kind is a plain configuration struct validated when it is added to the
//! graph. The [`Component`] enum dispatches names and properties across kinds.

use std::f64::consts::PI;

use crate::camera::OffscreenCamera;
use crate::error::{CaptureError, Result};
use crate::name::HasName;
use crate::scene::property::{
    expect_array, expect_bool, expect_real, unknown, HasProperties, PropertyValue,
};
use crate::{Point, Vector};

/// Axis-aligned box given as `[xmin, ymin, zmin, xmax, ymax, zmax]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxRegion(pub [f64; 6]);

impl BoxRegion {
    pub fn contains(&self, p: &Point) -> bool {
        let b = &self.0;
        p.x >= b[0] && p.x <= b[3] && p.y >= b[1] && p.y <= b[4] && p.z >= b[2] && p.z <= b[5]
    }

    fn validate(&self, owner: &str) -> Result<()> {
        let b = &self.0;
        if b.iter().any(|v| !v.is_finite()) || b[0] > b[3] || b[1] > b[4] || b[2] > b[5] {
            return Err(CaptureError::scene(format!(
                "{owner}: box must be finite with min <= max, got {b:?}"
            )));
        }
        Ok(())
    }

    fn from_property(name: &str, value: PropertyValue) -> Result<Self> {
        let v = expect_array(name, value, Some(6))?;
        Ok(Self([v[0], v[1], v[2], v[3], v[4], v[5]]))
    }
}

/// Regular hexahedral grid of `n[0] × n[1] × n[2]` nodes spanning `min..max`.
#[derive(Debug, Clone, PartialEq)]
pub struct RegularGrid {
    pub name: String,
    pub n: [usize; 3],
    pub min: Point,
    pub max: Point,
}

impl RegularGrid {
    pub fn new(name: &str, n: [usize; 3], min: Point, max: Point) -> Self {
        Self {
            name: name.to_string(),
            n,
            min,
            max,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.n.iter().any(|&k| k < 2) {
            return Err(CaptureError::scene(format!(
                "grid '{}' needs at least 2 nodes per axis, got {:?}",
                self.name, self.n
            )));
        }
        let size = self.max - self.min;
        if !(size.dx > 0. && size.dy > 0. && size.dz > 0.) {
            return Err(CaptureError::scene(format!(
                "grid '{}' has an empty extent {} .. {}",
                self.name, self.min, self.max
            )));
        }
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.n.iter().product()
    }

    /// Rest positions, x varying fastest, then y, then z.
    pub fn points(&self) -> Vec<Point> {
        let step = |axis: usize, lo: f64, hi: f64, i: usize| {
            lo + (hi - lo) * i as f64 / (self.n[axis] - 1) as f64
        };
        let mut pts = Vec::with_capacity(self.node_count());
        for k in 0..self.n[2] {
            for j in 0..self.n[1] {
                for i in 0..self.n[0] {
                    pts.push(Point::new(
                        step(0, self.min.x, self.max.x, i),
                        step(1, self.min.y, self.max.y, j),
                        step(2, self.min.z, self.max.z, k),
                    ));
                }
            }
        }
        pts
    }
}

/// Linear elastic material of the deformable body in the same node.
#[derive(Debug, Clone, PartialEq)]
pub struct ElasticMaterial {
    pub name: String,
    pub young_modulus: f64,
    pub poisson_ratio: f64,
}

impl ElasticMaterial {
    pub fn new(name: &str, young_modulus: f64, poisson_ratio: f64) -> Self {
        Self {
            name: name.to_string(),
            young_modulus,
            poisson_ratio,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.young_modulus.is_finite() && self.young_modulus > 0.) {
            return Err(CaptureError::scene(format!(
                "material '{}': Young's modulus must be positive",
                self.name
            )));
        }
        if !(0. ..0.5).contains(&self.poisson_ratio) {
            return Err(CaptureError::scene(format!(
                "material '{}': Poisson ratio must be in [0, 0.5)",
                self.name
            )));
        }
        Ok(())
    }
}

/// Clamps every grid node inside `region`.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedBox {
    pub name: String,
    pub region: BoxRegion,
}

impl FixedBox {
    pub fn new(name: &str, region: [f64; 6]) -> Self {
        Self {
            name: name.to_string(),
            region: BoxRegion(region),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.region.validate(&self.name)
    }
}

/// Per-node force on the grid nodes inside `region`, interpolated over time.
///
/// `forces` holds three values per entry of `times`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearForceField {
    pub name: String,
    pub region: BoxRegion,
    pub times: Vec<f64>,
    pub forces: Vec<f64>,
}

impl LinearForceField {
    pub fn new(name: &str, region: [f64; 6], times: Vec<f64>, forces: Vec<Vector>) -> Self {
        Self {
            name: name.to_string(),
            region: BoxRegion(region),
            times,
            forces: forces.iter().flat_map(|f| f.to_array()).collect(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.region.validate(&self.name)?;
        if self.times.is_empty() {
            return Err(CaptureError::scene(format!(
                "force field '{}' needs at least one keyframe",
                self.name
            )));
        }
        if self.forces.len() != 3 * self.times.len() {
            return Err(CaptureError::scene(format!(
                "force field '{}' has {} times but {} force values",
                self.name,
                self.times.len(),
                self.forces.len()
            )));
        }
        check_sorted(&self.name, &self.times)
    }

    /// Per-node force at simulated `time`.
    pub fn force_at(&self, time: f64) -> Vector {
        crate::sim::ramp::interpolate(&self.times, &self.forces, time)
    }

    /// Force of the last keyframe, if any.
    pub fn last_force(&self) -> Option<Vector> {
        let n = self.forces.len() / 3;
        n.checked_sub(1)
            .and_then(|last| Vector::from_slice(&self.forces[3 * last..]))
    }
}

fn check_sorted(owner: &str, times: &[f64]) -> Result<()> {
    if times.windows(2).any(|w| w[1] < w[0]) {
        return Err(CaptureError::scene(format!(
            "{owner}: keyframe times must be non-decreasing, got {times:?}"
        )));
    }
    Ok(())
}

/// Sphere drawn as a point cloud.
///
/// A mapped model follows the deformation of the body it is embedded in.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualModel {
    pub name: String,
    pub translation: Point,
    pub radius: f64,
    pub color: [f64; 3],
    pub mapped: bool,
}

impl VisualModel {
    pub fn sphere(name: &str, translation: Point, radius: f64) -> Self {
        Self {
            name: name.to_string(),
            translation,
            radius,
            color: [1., 1., 1.],
            mapped: false,
        }
    }

    pub fn with_color(mut self, color: [f64; 3]) -> Self {
        self.color = color;
        self
    }

    pub fn mapped(mut self) -> Self {
        self.mapped = true;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.radius.is_finite() && self.radius > 0.) {
            return Err(CaptureError::scene(format!(
                "visual model '{}': radius must be positive",
                self.name
            )));
        }
        if self.color.iter().any(|c| !(0. ..=1.).contains(c)) {
            return Err(CaptureError::scene(format!(
                "visual model '{}': color channels must be in [0, 1]",
                self.name
            )));
        }
        if !self.translation.is_finite() {
            return Err(CaptureError::scene(format!(
                "visual model '{}': translation must be finite",
                self.name
            )));
        }
        Ok(())
    }

    pub fn rgb(&self) -> [u8; 3] {
        self.color.map(|c| (c * 255.).round() as u8)
    }

    /// Surface samples on latitude rings, poles included.
    pub fn surface_points(&self) -> Vec<Point> {
        const RINGS: usize = 10;
        const SEGMENTS: usize = 20;
        let c = self.translation;
        let mut pts = vec![
            c + Vector::new(0., self.radius, 0.),
            c + Vector::new(0., -self.radius, 0.),
        ];
        for ring in 1..RINGS {
            let phi = PI * ring as f64 / RINGS as f64;
            for seg in 0..SEGMENTS {
                let theta = 2. * PI * seg as f64 / SEGMENTS as f64;
                let dir = Vector::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                pts.push(c + dir * self.radius);
            }
        }
        pts
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Camera(OffscreenCamera),
    Grid(RegularGrid),
    Material(ElasticMaterial),
    Fixed(FixedBox),
    ForceField(LinearForceField),
    Visual(VisualModel),
}

impl Component {
    pub fn kind(&self) -> &'static str {
        match self {
            Component::Camera(_) => "OffscreenCamera",
            Component::Grid(_) => "RegularGrid",
            Component::Material(_) => "ElasticMaterial",
            Component::Fixed(_) => "FixedBox",
            Component::ForceField(_) => "LinearForceField",
            Component::Visual(_) => "VisualModel",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Component::Camera(c) => c.validate(),
            Component::Grid(c) => c.validate(),
            Component::Material(c) => c.validate(),
            Component::Fixed(c) => c.validate(),
            Component::ForceField(c) => c.validate(),
            Component::Visual(c) => c.validate(),
        }
    }
}

impl HasName for Component {
    fn get_name(&self) -> &str {
        match self {
            Component::Camera(c) => &c.name,
            Component::Grid(c) => &c.name,
            Component::Material(c) => &c.name,
            Component::Fixed(c) => &c.name,
            Component::ForceField(c) => &c.name,
            Component::Visual(c) => &c.name,
        }
    }
}

impl From<OffscreenCamera> for Component {
    fn from(c: OffscreenCamera) -> Self {
        Component::Camera(c)
    }
}

impl From<RegularGrid> for Component {
    fn from(c: RegularGrid) -> Self {
        Component::Grid(c)
    }
}

impl From<ElasticMaterial> for Component {
    fn from(c: ElasticMaterial) -> Self {
        Component::Material(c)
    }
}

impl From<FixedBox> for Component {
    fn from(c: FixedBox) -> Self {
        Component::Fixed(c)
    }
}

impl From<LinearForceField> for Component {
    fn from(c: LinearForceField) -> Self {
        Component::ForceField(c)
    }
}

impl From<VisualModel> for Component {
    fn from(c: VisualModel) -> Self {
        Component::Visual(c)
    }
}

impl HasProperties for LinearForceField {
    fn property_names(&self) -> &'static [&'static str] {
        &["box", "times", "forces"]
    }

    fn get_property(&self, name: &str) -> Option<PropertyValue> {
        match name {
            "box" => Some(self.region.0.to_vec().into()),
            "times" => Some(self.times.clone().into()),
            "forces" => Some(self.forces.clone().into()),
            _ => None,
        }
    }

    // `times` and `forces` are written one at a time, so only their own shape is
    // checked here. Pairing is checked by `validate` when the scene initializes.
    fn set_property(&mut self, name: &str, value: PropertyValue) -> Result<()> {
        match name {
            "box" => {
                let region = BoxRegion::from_property(name, value)?;
                region.validate(&self.name)?;
                self.region = region;
            }
            "times" => {
                let times = expect_array(name, value, None)?;
                check_sorted(&self.name, &times)?;
                self.times = times;
            }
            "forces" => {
                let forces = expect_array(name, value, None)?;
                if forces.len() % 3 != 0 {
                    return Err(CaptureError::scene(format!(
                        "force field '{}': forces must hold 3 values per keyframe, got {}",
                        self.name,
                        forces.len()
                    )));
                }
                self.forces = forces;
            }
            _ => return Err(unknown("LinearForceField", name)),
        }
        Ok(())
    }
}

impl HasProperties for VisualModel {
    fn property_names(&self) -> &'static [&'static str] {
        &["translation", "radius", "color", "mapped"]
    }

    fn get_property(&self, name: &str) -> Option<PropertyValue> {
        match name {
            "translation" => Some(self.translation.to_array().into()),
            "radius" => Some(self.radius.into()),
            "color" => Some(self.color.into()),
            "mapped" => Some(self.mapped.into()),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: PropertyValue) -> Result<()> {
        let mut next = self.clone();
        match name {
            "translation" => {
                next.translation = Point::from_slice(&expect_array(name, value, Some(3))?)
                    .unwrap_or(self.translation)
            }
            "radius" => next.radius = expect_real(name, value)?,
            "color" => {
                let c = expect_array(name, value, Some(3))?;
                next.color = [c[0], c[1], c[2]];
            }
            "mapped" => next.mapped = expect_bool(name, value)?,
            _ => return Err(unknown("VisualModel", name)),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

impl HasProperties for ElasticMaterial {
    fn property_names(&self) -> &'static [&'static str] {
        &["youngModulus", "poissonRatio"]
    }

    fn get_property(&self, name: &str) -> Option<PropertyValue> {
        match name {
            "youngModulus" => Some(self.young_modulus.into()),
            "poissonRatio" => Some(self.poisson_ratio.into()),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: PropertyValue) -> Result<()> {
        let mut next = self.clone();
        match name {
            "youngModulus" => next.young_modulus = expect_real(name, value)?,
            "poissonRatio" => next.poisson_ratio = expect_real(name, value)?,
            _ => return Err(unknown("ElasticMaterial", name)),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

impl HasProperties for FixedBox {
    fn property_names(&self) -> &'static [&'static str] {
        &["box"]
    }

    fn get_property(&self, name: &str) -> Option<PropertyValue> {
        (name == "box").then(|| self.region.0.to_vec().into())
    }

    fn set_property(&mut self, name: &str, value: PropertyValue) -> Result<()> {
        if name != "box" {
            return Err(unknown("FixedBox", name));
        }
        let region = BoxRegion::from_property(name, value)?;
        region.validate(&self.name)?;
        self.region = region;
        Ok(())
    }
}

// Grid topology is fixed once built; its properties are read-only.
impl HasProperties for RegularGrid {
    fn property_names(&self) -> &'static [&'static str] {
        &["n", "min", "max"]
    }

    fn get_property(&self, name: &str) -> Option<PropertyValue> {
        match name {
            "n" => Some(self.n.iter().map(|&k| k as f64).collect::<Vec<f64>>().into()),
            "min" => Some(self.min.to_array().into()),
            "max" => Some(self.max.to_array().into()),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, _value: PropertyValue) -> Result<()> {
        if self.property_names().contains(&name) {
            Err(CaptureError::scene(format!(
                "grid '{}': property '{name}' is read-only",
                self.name
            )))
        } else {
            Err(unknown("RegularGrid", name))
        }
    }
}

impl HasProperties for Component {
    fn property_names(&self) -> &'static [&'static str] {
        match self {
            Component::Camera(c) => c.property_names(),
            Component::Grid(c) => c.property_names(),
            Component::Material(c) => c.property_names(),
            Component::Fixed(c) => c.property_names(),
            Component::ForceField(c) => c.property_names(),
            Component::Visual(c) => c.property_names(),
        }
    }

    fn get_property(&self, name: &str) -> Option<PropertyValue> {
        match self {
            Component::Camera(c) => c.get_property(name),
            Component::Grid(c) => c.get_property(name),
            Component::Material(c) => c.get_property(name),
            Component::Fixed(c) => c.get_property(name),
            Component::ForceField(c) => c.get_property(name),
            Component::Visual(c) => c.get_property(name),
        }
    }

    fn set_property(&mut self, name: &str, value: PropertyValue) -> Result<()> {
        match self {
            Component::Camera(c) => c.set_property(name, value),
            Component::Grid(c) => c.set_property(name, value),
            Component::Material(c) => c.set_property(name, value),
            Component::Fixed(c) => c.set_property(name, value),
            Component::ForceField(c) => c.set_property(name, value),
            Component::Visual(c) => c.set_property(name, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::property::with_array_mut;

    fn traction() -> LinearForceField {
        LinearForceField::new(
            "traction",
            [-2., -2., 9.9, 2., 2., 10.1],
            vec![0., 4.],
            vec![Vector::new(0., -1., 0.), Vector::new(0., -10., 0.)],
        )
    }

    #[test]
    fn test_grid_points() {
        let grid = RegularGrid::new("grid", [5, 5, 21], Point::new(-2., -2., -10.), Point::new(2., 2., 10.));
        grid.validate().unwrap();
        let pts = grid.points();
        assert_eq!(pts.len(), 525);
        assert!(pts[0].is_close(&Point::new(-2., -2., -10.)));
        assert!(pts[1].is_close(&Point::new(-1., -2., -10.)));
        assert!(pts[524].is_close(&Point::new(2., 2., 10.)));

        let tip = BoxRegion([-2., -2., 9.9, 2., 2., 10.1]);
        assert_eq!(pts.iter().filter(|p| tip.contains(p)).count(), 25);
    }

    #[test]
    fn test_invalid_components() {
        assert!(RegularGrid::new("g", [1, 2, 2], Point::origin(), Point::new(1., 1., 1.))
            .validate()
            .is_err());
        assert!(ElasticMaterial::new("m", 5000., 0.5).validate().is_err());
        assert!(FixedBox::new("f", [1., 0., 0., 0., 1., 1.]).validate().is_err());
        assert!(VisualModel::sphere("v", Point::origin(), 0.).validate().is_err());
        let mut ff = traction();
        ff.forces.pop();
        assert!(ff.validate().is_err());
    }

    #[test]
    fn test_force_field_interpolation() {
        let ff = traction();
        ff.validate().unwrap();
        assert!(ff.force_at(2.).is_close(&Vector::new(0., -5.5, 0.)));
        assert!(ff.force_at(10.).is_close(&Vector::new(0., -10., 0.)));
        assert_eq!(ff.last_force(), Some(Vector::new(0., -10., 0.)));
    }

    #[test]
    fn test_force_field_scaled_like_a_script() {
        // First force becomes the second divided by the frame count
        let mut ff = traction();
        with_array_mut(&mut ff, "forces", |wa| {
            for k in 0..3 {
                wa[k] = wa[3 + k] / 120.;
            }
        })
        .unwrap();
        assert!(Vector::from_slice(&ff.forces)
            .unwrap()
            .is_close(&Vector::new(0., -10. / 120., 0.)));

        assert!(ff.set_property("forces", vec![1., 2.].into()).is_err());
        assert!(ff.set_property("times", vec![2., 1.].into()).is_err());
    }

    #[test]
    fn test_component_dispatch() {
        let mut c = Component::from(ElasticMaterial::new("mat", 5000., 0.45));
        assert_eq!(c.kind(), "ElasticMaterial");
        assert_eq!(c.get_name(), "mat");
        c.set_property("youngModulus", 100.0.into()).unwrap();
        assert_eq!(c.get_property("youngModulus"), Some(PropertyValue::Real(100.)));
        assert!(c.set_property("poissonRatio", 0.7.into()).is_err());

        let mut g = Component::from(RegularGrid::new("g", [2, 2, 2], Point::origin(), Point::new(1., 1., 1.)));
        assert!(g.set_property("n", vec![3., 3., 3.].into()).is_err());
    }

    #[test]
    fn test_sphere_points() {
        let v = VisualModel::sphere("ball", Point::new(0., 0., 9.), 1.).with_color([1., 0., 0.]);
        assert_eq!(v.rgb(), [255, 0, 0]);
        for p in v.surface_points() {
            assert!((p.distance(&v.translation) - 1.).abs() < 1e-9);
        }
    }
}
