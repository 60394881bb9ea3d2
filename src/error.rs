//! Error taxonomy for scene building, stepping and frame capture.
//!
//! Every variant is fatal to a capture run. The driver wraps them into a
//! [`RunError`] that records where the run stopped.

use std::fmt;
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("scene build error: {0}")]
    SceneBuild(String),

    #[error("solver diverged: {0}")]
    SolverDivergence(String),

    #[error("integration error: {0}")]
    Integration(String),

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl CaptureError {
    pub fn invalid<T: ToString>(msg: T) -> Self {
        CaptureError::InvalidParameter(msg.to_string())
    }

    pub fn scene<T: ToString>(msg: T) -> Self {
        CaptureError::SceneBuild(msg.to_string())
    }

    pub fn divergence<T: ToString>(msg: T) -> Self {
        CaptureError::SolverDivergence(msg.to_string())
    }

    pub fn integration<T: ToString>(msg: T) -> Self {
        CaptureError::Integration(msg.to_string())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        CaptureError::Io {
            context: context.into(),
            source,
        }
    }

    /// Wraps an image encoding failure for `path` as an I/O error.
    pub fn image(path: &Path, err: image::ImageError) -> Self {
        let source = match err {
            image::ImageError::IoError(e) => e,
            other => std::io::Error::other(other),
        };
        Self::io(format!("failed to write frame {}", path.display()), source)
    }
}

pub type Result<T> = std::result::Result<T, CaptureError>;

/// Phase of a capture run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Build,
    Init,
    Step,
    Capture,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Build => "build",
            Stage::Init => "init",
            Stage::Step => "step",
            Stage::Capture => "capture",
        };
        f.write_str(s)
    }
}

/// A fatal capture-run failure, tagged with the stage and frame index.
#[derive(thiserror::Error, Debug)]
#[error("run aborted at {stage} stage, frame {frame}: {source}")]
pub struct RunError {
    pub stage: Stage,
    pub frame: usize,
    #[source]
    pub source: CaptureError,
}

impl RunError {
    pub fn new(stage: Stage, frame: usize, source: CaptureError) -> Self {
        Self {
            stage,
            frame,
            source,
        }
    }
}
