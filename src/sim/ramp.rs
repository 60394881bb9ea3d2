use crate::error::{CaptureError, Result};
use crate::Vector;

/// One `(time, force)` pair of a piecewise-linear load schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceKeyframe {
    pub time: f64,
    pub force: Vector,
}

/// Traction load that ramps up to a peak at mid-run and back down.
///
/// Keyframes are `(0, F/N)`, `(N/2, F)`, `(N, F/N)` with times in frame units.
/// The start value is the peak divided by the total frame count, not half of it.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceRampSchedule {
    keyframes: Vec<ForceKeyframe>,
}

impl ForceRampSchedule {
    pub fn new(frame_count: usize, peak: Vector) -> Result<Self> {
        if frame_count == 0 {
            return Err(CaptureError::invalid("frame count must be positive"));
        }
        if !peak.is_finite() {
            return Err(CaptureError::invalid(format!("peak force must be finite, got {peak}")));
        }

        let n = frame_count as f64;
        let start = peak * (1. / n);
        let keyframes = vec![
            ForceKeyframe {
                time: 0.,
                force: start,
            },
            ForceKeyframe {
                time: n / 2.,
                force: peak,
            },
            ForceKeyframe {
                time: n,
                force: start,
            },
        ];
        Ok(Self { keyframes })
    }

    pub fn keyframes(&self) -> &[ForceKeyframe] {
        &self.keyframes
    }

    pub fn times(&self) -> Vec<f64> {
        self.keyframes.iter().map(|k| k.time).collect()
    }

    /// Forces flattened to `[fx0, fy0, fz0, fx1, ...]`, the layout force fields store.
    pub fn flat_forces(&self) -> Vec<f64> {
        self.keyframes
            .iter()
            .flat_map(|k| k.force.to_array())
            .collect()
    }

    /// Same schedule with times converted from frame units to simulated seconds.
    pub fn to_simulated_time(&self, dt: f64) -> Self {
        Self {
            keyframes: self
                .keyframes
                .iter()
                .map(|k| ForceKeyframe {
                    time: k.time * dt,
                    force: k.force,
                })
                .collect(),
        }
    }

    /// Linear interpolation between keyframes, clamped outside the keyframe range.
    pub fn value_at(&self, time: f64) -> Vector {
        interpolate(&self.times(), &self.flat_forces(), time)
    }
}

/// Evaluates a piecewise-linear vector schedule.
///
/// `forces` holds three values per entry of `times`. Times are assumed sorted.
/// Returns zero for an empty schedule.
pub fn interpolate(times: &[f64], forces: &[f64], time: f64) -> Vector {
    let n = times.len().min(forces.len() / 3);
    let at = |i: usize| Vector::from_slice(&forces[3 * i..]).unwrap_or(Vector::zero());

    match n {
        0 => Vector::zero(),
        1 => at(0),
        _ if time <= times[0] => at(0),
        _ if time >= times[n - 1] => at(n - 1),
        _ => {
            let i = times[..n]
                .windows(2)
                .position(|w| time >= w[0] && time <= w[1])
                .unwrap_or(n - 2);
            let span = times[i + 1] - times[i];
            let alpha = if span > 0. { (time - times[i]) / span } else { 0. };
            at(i) * (1. - alpha) + at(i + 1) * alpha
        }
    }
}
