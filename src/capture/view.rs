use std::path::PathBuf;

use crate::config::ViewConfig;

use super::output::frame_path;

/// Bookkeeping of one captured camera.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraView {
    pub label: String,
    /// Component path of the camera.
    pub camera: String,
    pub output_dir: PathBuf,
    extension: String,
    next_frame: usize,
}

impl CameraView {
    pub fn new(config: &ViewConfig, extension: &str) -> Self {
        Self {
            label: config.label.clone(),
            camera: config.camera.clone(),
            output_dir: config.output_dir.clone(),
            extension: extension.to_string(),
            next_frame: 0,
        }
    }

    /// Index the next saved frame will get.
    pub fn next_frame(&self) -> usize {
        self.next_frame
    }

    pub fn next_path(&self) -> PathBuf {
        frame_path(&self.output_dir, self.next_frame, &self.extension)
    }

    /// Records that the frame at [`next_path`](Self::next_path) was written.
    pub fn mark_written(&mut self) {
        self.next_frame += 1;
    }

    pub fn summary(&self) -> ViewSummary {
        ViewSummary {
            label: self.label.clone(),
            output_dir: self.output_dir.clone(),
            frames_written: self.next_frame,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewSummary {
    pub label: String,
    pub output_dir: PathBuf,
    pub frames_written: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_counter_only_moves_forward() {
        let mut view = CameraView::new(&ViewConfig::new("wide", "beam/cam", "out/wide"), "png");
        assert_eq!(view.next_path(), Path::new("out/wide/frame_0.png"));
        // Peeking does not advance
        assert_eq!(view.next_path(), Path::new("out/wide/frame_0.png"));
        view.mark_written();
        view.mark_written();
        assert_eq!(view.next_frame(), 2);
        assert_eq!(view.next_path(), Path::new("out/wide/frame_2.png"));
        assert_eq!(view.summary().frames_written, 2);
    }
}
