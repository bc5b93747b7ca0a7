//! Headless frame planning and field snapshots.
//!
//! Both drive the same [`Compositor`] the window uses, with a fixed clock, so
//! no GPU or display is required.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::{ImageFormat, RgbaImage};
use scene::{Clock, Compositor, Frame, SceneSettings};

/// Ticks applied when a pointer is given, so the smoothed pointer has settled
/// onto it.
pub const POINTER_SETTLE_FRAMES: u32 = 180;

#[derive(Debug, Clone, PartialEq)]
pub struct FrameRequest {
    /// Elapsed seconds the frame is evaluated at.
    pub time: f64,
    /// Pointer in normalized device coordinates, treated as resting there.
    pub pointer: Option<(f64, f64)>,
    /// Surface size in pixels.
    pub size: (u32, u32),
}

impl Default for FrameRequest {
    fn default() -> Self {
        Self {
            time: 0.0,
            pointer: None,
            size: (1280, 720),
        }
    }
}

/// Mounts a compositor at the requested size and returns its frame plan.
pub fn plan_frame(settings: &SceneSettings, request: &FrameRequest) -> Result<(Compositor, Frame)> {
    if !request.time.is_finite() {
        anyhow::bail!("frame time must be finite, got {}", request.time);
    }

    let mut compositor = Compositor::new(settings, Clock::fixed(request.time));
    let (width, height) = request.size;
    compositor.mount(f64::from(width), f64::from(height));

    let settle = match request.pointer {
        Some((x, y)) => {
            compositor.on_pointer_move(x, y);
            POINTER_SETTLE_FRAMES
        }
        None => 1,
    };
    let mut frame = None;
    for _ in 0..settle {
        frame = compositor.tick();
    }
    let frame = frame.ok_or_else(|| anyhow!("compositor produced no frame"))?;
    Ok((compositor, frame))
}

/// Rasterises the field layer of one frame.
pub fn render_snapshot(settings: &SceneSettings, request: &FrameRequest) -> Result<RgbaImage> {
    let (compositor, frame) = plan_frame(settings, request)?;
    let (width, height) = request.size;
    let pixels = compositor
        .field()
        .sample_grid(frame.uniforms, width, height);
    RgbaImage::from_raw(width.max(1), height.max(1), pixels)
        .ok_or_else(|| anyhow!("snapshot buffer does not match {width}x{height}"))
}

/// Renders a snapshot and writes it as PNG.
pub fn write_snapshot(path: &Path, settings: &SceneSettings, request: &FrameRequest) -> Result<()> {
    let image = render_snapshot(settings, request)?;
    image
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        time = request.time,
        "snapshot written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use glam::DVec2;

    use super::*;

    #[test]
    fn plans_first_frame_at_requested_time() {
        let request = FrameRequest {
            time: 3.5,
            ..FrameRequest::default()
        };
        let (_, frame) = plan_frame(&SceneSettings::default(), &request).unwrap();
        assert_eq!(frame.index, 0);
        assert_eq!(frame.elapsed, 3.5);
        assert_eq!(frame.transform.rotation_y, 3.5 * 0.25);
        assert!((frame.viewport.aspect() - 1280.0 / 720.0).abs() < 1e-9);
    }

    #[test]
    fn pointer_settles_before_the_planned_frame() {
        let request = FrameRequest {
            pointer: Some((0.5, -0.5)),
            ..FrameRequest::default()
        };
        let (_, frame) = plan_frame(&SceneSettings::default(), &request).unwrap();
        assert!((frame.uniforms.mouse - DVec2::new(0.5, -0.5)).length() < 1e-3);
    }

    #[test]
    fn rejects_non_finite_time() {
        let request = FrameRequest {
            time: f64::NAN,
            ..FrameRequest::default()
        };
        assert!(plan_frame(&SceneSettings::default(), &request).is_err());
    }

    #[test]
    fn snapshot_matches_requested_size() {
        let request = FrameRequest {
            size: (64, 48),
            ..FrameRequest::default()
        };
        let image = render_snapshot(&SceneSettings::default(), &request).unwrap();
        assert_eq!(image.dimensions(), (64, 48));
        assert!(image.pixels().all(|px| px.0[3] == 255));
    }

    #[test]
    fn writes_png_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("field.png");
        let request = FrameRequest {
            size: (32, 16),
            time: 1.0,
            pointer: None,
        };
        write_snapshot(&path, &SceneSettings::default(), &request).unwrap();
        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (32, 16));
        assert_eq!(decoded, render_snapshot(&SceneSettings::default(), &request).unwrap());
    }
}
