use std::path::{Path, PathBuf};

use crate::error::{CaptureError, Result};

/// Creates `dir` and its parents. Succeeds if it already exists.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| {
        CaptureError::io(
            format!("cannot create output directory {}", dir.display()),
            e,
        )
    })
}

pub fn frame_file_name(index: usize, extension: &str) -> String {
    format!("frame_{index}.{extension}")
}

/// `<dir>/frame_<index>.<extension>`
pub fn frame_path(dir: &Path, index: usize, extension: &str) -> PathBuf {
    dir.join(frame_file_name(index, extension))
}
