use std::f64::consts::{FRAC_PI_2, PI};

use crate::error::{CaptureError, Result};
use crate::Point;

/// Camera positions for every frame of a run, indexed by frame number.
///
/// Holds `N + 1` positions: frame 0 plus one per simulation step.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraPathSchedule {
    positions: Vec<Point>,
}

impl CameraPathSchedule {
    /// Samples one full turn of an ellipse in the horizontal (x, z) plane.
    ///
    /// `p[t] = (b·sin θ, 0, a·cos θ)` with `θ(t) = t·(2π/N) − π/2`,
    /// so the path starts at `(-b, 0, 0)` and closes on itself at `t = N`.
    pub fn ellipse(frame_count: usize, a: f64, b: f64) -> Result<Self> {
        if frame_count == 0 {
            return Err(CaptureError::invalid("frame count must be positive"));
        }
        for (name, r) in [("a", a), ("b", b)] {
            if !(r.is_finite() && r > 0.) {
                return Err(CaptureError::invalid(format!(
                    "ellipse radius {name} must be finite and positive, got {r}"
                )));
            }
        }

        let step = 2. * PI / frame_count as f64;
        let positions = (0..=frame_count)
            .map(|t| {
                let theta = t as f64 * step - FRAC_PI_2;
                Point::new(b * theta.sin(), 0., a * theta.cos())
            })
            .collect();

        Ok(Self { positions })
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of simulation steps covered by the path.
    pub fn frame_count(&self) -> usize {
        self.positions.len().saturating_sub(1)
    }

    pub fn position(&self, frame: usize) -> Option<Point> {
        self.positions.get(frame).copied()
    }

    pub fn first(&self) -> Option<Point> {
        self.positions.first().copied()
    }

    pub fn last(&self) -> Option<Point> {
        self.positions.last().copied()
    }

    pub fn positions(&self) -> &[Point] {
        &self.positions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.positions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    #[test]
    fn test_length_and_closure() {
        for n in [1, 2, 7, 60, 121] {
            let path = CameraPathSchedule::ellipse(n, 3., 5.).unwrap();
            assert_eq!(path.len(), n + 1);
            assert_eq!(path.frame_count(), n);
            let first = path.position(0).unwrap();
            let last = path.position(n).unwrap();
            assert!(first.is_within(&last, TOL), "n={n}: {first} vs {last}");
        }
    }

    #[test]
    fn test_points_lie_on_ellipse() {
        let (a, b) = (12., 30.);
        let path = CameraPathSchedule::ellipse(97, a, b).unwrap();
        for p in path.iter() {
            assert_eq!(p.y, 0.);
            let r = p.x.powi(2) / b.powi(2) + p.z.powi(2) / a.powi(2);
            assert!((r - 1.).abs() < TOL);
        }
    }

    #[test]
    fn test_quarter_turn() {
        let path = CameraPathSchedule::ellipse(120, 40., 40.).unwrap();
        assert!(path.position(0).unwrap().is_within(&Point::new(-40., 0., 0.), TOL));
        assert!(path.position(30).unwrap().is_within(&Point::new(0., 0., 40.), TOL));
        assert!(path.position(60).unwrap().is_within(&Point::new(40., 0., 0.), TOL));
        assert!(path.position(121).is_none());
    }

    #[test]
    fn test_deterministic() {
        let p1 = CameraPathSchedule::ellipse(333, 1.5, 2.5).unwrap();
        let p2 = CameraPathSchedule::ellipse(333, 1.5, 2.5).unwrap();
        let bits = |p: &CameraPathSchedule| {
            p.iter()
                .flat_map(|q| q.to_array().map(f64::to_bits))
                .collect::<Vec<u64>>()
        };
        assert_eq!(bits(&p1), bits(&p2));
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(
            CameraPathSchedule::ellipse(0, 1., 1.),
            Err(CaptureError::InvalidParameter(_))
        ));
        assert!(CameraPathSchedule::ellipse(10, 0., 1.).is_err());
        assert!(CameraPathSchedule::ellipse(10, 1., -1.).is_err());
        assert!(CameraPathSchedule::ellipse(10, f64::INFINITY, 1.).is_err());
    }
}
