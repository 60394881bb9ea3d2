use crate::error::{CaptureError, Result};

/// Discrete simulation time: `frame_count` steps of `dt` each.
///
/// The frame index starts at 0 and advances by exactly one per [`tick`](Self::tick).
/// It is terminal once it reaches `frame_count`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationClock {
    frame_count: usize,
    dt: f64,
    index: usize,
}

impl SimulationClock {
    pub fn new(frame_count: usize, dt: f64) -> Result<Self> {
        if frame_count == 0 {
            return Err(CaptureError::invalid("frame count must be positive"));
        }
        if !(dt.is_finite() && dt > 0.) {
            return Err(CaptureError::invalid(format!(
                "time step must be finite and positive, got {dt}"
            )));
        }
        Ok(Self {
            frame_count,
            dt,
            index: 0,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Simulated time reached at the current frame.
    pub fn elapsed(&self) -> f64 {
        self.index as f64 * self.dt
    }

    pub fn is_done(&self) -> bool {
        self.index == self.frame_count
    }

    /// Advances to the next frame and returns its index.
    pub fn tick(&mut self) -> Result<usize> {
        if self.is_done() {
            return Err(CaptureError::integration(format!(
                "clock already reached its last frame ({})",
                self.frame_count
            )));
        }
        self.index += 1;
        Ok(self.index)
    }
}
