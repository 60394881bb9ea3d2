use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use crate::error::{CaptureError, Result};

use super::{Drawable, FrameRenderer, RenderView, Viewpoint};

/// CPU point splatter with a depth buffer.
///
/// Draws every drawable point as a square on a black background. With `s > 1`
/// samples per pixel the frame is rendered at `ceil(sqrt(s))` times the
/// resolution, capped at `max_supersampling`, and filtered down.
#[derive(Debug, Clone)]
pub struct SoftwareRenderer {
    pub background: [u8; 3],
    pub max_supersampling: u32,
}

impl Default for SoftwareRenderer {
    fn default() -> Self {
        Self {
            background: [0, 0, 0],
            max_supersampling: 4,
        }
    }
}

impl SoftwareRenderer {
    /// Per-axis scale that gives at least `samples` samples per output pixel.
    fn scale_for(&self, samples: u32) -> u32 {
        if samples <= 1 {
            return 1;
        }
        let scale = (samples as f64).sqrt().ceil() as u32;
        scale.clamp(1, self.max_supersampling.max(1))
    }
}

impl FrameRenderer for SoftwareRenderer {
    fn render(&mut self, view: &RenderView, drawables: &[Drawable]) -> Result<RgbImage> {
        let viewpoint = Viewpoint::new(view)?;
        let scale = self.scale_for(view.samples);
        let (w, h) = match (view.width.checked_mul(scale), view.height.checked_mul(scale)) {
            (Some(w), Some(h)) => (w, h),
            _ => {
                return Err(CaptureError::invalid(format!(
                    "viewport {}x{} is too large for {scale}x supersampling",
                    view.width, view.height
                )))
            }
        };

        let mut canvas = RgbImage::from_pixel(w, h, Rgb(self.background));
        let mut depth = vec![f64::INFINITY; (w as usize) * (h as usize)];

        for drawable in drawables {
            let size = (drawable.point_size.max(1) * scale) as i64;
            let half = size / 2;
            for p in &drawable.points {
                let Some(s) = viewpoint.project(*p, w, h) else {
                    continue;
                };
                let (cx, cy) = (s.x.floor() as i64, s.y.floor() as i64);
                for py in (cy - half)..(cy - half + size) {
                    for px in (cx - half)..(cx - half + size) {
                        if px < 0 || py < 0 || px >= w as i64 || py >= h as i64 {
                            continue;
                        }
                        let idx = py as usize * w as usize + px as usize;
                        if s.depth < depth[idx] {
                            depth[idx] = s.depth;
                            canvas.put_pixel(px as u32, py as u32, Rgb(drawable.color));
                        }
                    }
                }
            }
        }

        if scale > 1 {
            Ok(imageops::resize(&canvas, view.width, view.height, FilterType::Triangle))
        } else {
            Ok(canvas)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::ProjectionType;
    use crate::{Point, Vector};

    fn view(samples: u32) -> RenderView {
        RenderView {
            position: Point::new(0., 0., -10.),
            look_at: Point::origin(),
            up: Vector::new(0., 1., 0.),
            field_of_view_deg: 45.,
            z_near: 0.1,
            z_far: 100.,
            projection: ProjectionType::Perspective,
            width: 40,
            height: 30,
            samples,
        }
    }

    fn dot(at: Point, color: [u8; 3]) -> Drawable {
        Drawable {
            points: vec![at],
            color,
            point_size: 3,
        }
    }

    #[test]
    fn test_output_matches_viewport() {
        let mut r = SoftwareRenderer::default();
        for samples in [0, 1, 4, 9, 16] {
            let img = r.render(&view(samples), &[]).unwrap();
            assert_eq!(img.dimensions(), (40, 30));
        }
    }

    #[test]
    fn test_scale_follows_sample_count() {
        let r = SoftwareRenderer::default();
        assert_eq!(r.scale_for(0), 1);
        assert_eq!(r.scale_for(1), 1);
        assert_eq!(r.scale_for(2), 2);
        assert_eq!(r.scale_for(4), 2);
        assert_eq!(r.scale_for(9), 3);
        assert_eq!(r.scale_for(16), 4);
        assert_eq!(r.scale_for(64), 4);

        let capped = SoftwareRenderer {
            max_supersampling: 0,
            ..SoftwareRenderer::default()
        };
        assert_eq!(capped.scale_for(16), 1);
    }

    #[test]
    fn test_oversized_viewport_is_rejected() {
        let mut r = SoftwareRenderer::default();
        let mut huge = view(16);
        huge.width = u32::MAX / 2;
        assert!(matches!(
            r.render(&huge, &[]),
            Err(CaptureError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_point_lands_in_center() {
        let mut r = SoftwareRenderer::default();
        let img = r.render(&view(1), &[dot(Point::origin(), [255, 0, 0])]).unwrap();
        assert_eq!(img.get_pixel(20, 15), &Rgb([255, 0, 0]));
        assert_eq!(img.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_nearer_point_wins() {
        let mut r = SoftwareRenderer::default();
        let far = dot(Point::new(0., 0., 5.), [0, 0, 255]);
        let near = dot(Point::new(0., 0., 0.), [0, 255, 0]);
        let img = r.render(&view(1), &[near.clone(), far.clone()]).unwrap();
        assert_eq!(img.get_pixel(20, 15), &Rgb([0, 255, 0]));
        let img = r.render(&view(1), &[far, near]).unwrap();
        assert_eq!(img.get_pixel(20, 15), &Rgb([0, 255, 0]));
    }
}
