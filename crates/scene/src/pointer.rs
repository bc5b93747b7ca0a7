use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Per-frame exponential smoothing coefficient.
pub const DEFAULT_SMOOTHING: f64 = 0.05;

/// Latest observed and smoothed pointer positions in normalized device coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerSample {
    pub raw: DVec2,
    pub smoothed: DVec2,
}

/// Maintains a smoothed 2D pointer position.
///
/// `on_pointer_move` may be called at any rate; `advance` is called exactly
/// once per frame. The filter is frame-rate dependent: the coefficient is
/// applied per frame, not per elapsed millisecond.
#[derive(Debug, Clone)]
pub struct PointerTracker {
    sample: PointerSample,
    smoothing: f64,
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING)
    }
}

impl PointerTracker {
    /// Builds a tracker with the given coefficient, falling back to the
    /// default when it lies outside `(0, 1]`.
    pub fn new(smoothing: f64) -> Self {
        let smoothing = if smoothing.is_finite() && smoothing > 0.0 && smoothing <= 1.0 {
            smoothing
        } else {
            tracing::warn!(smoothing, "pointer smoothing out of range; using default");
            DEFAULT_SMOOTHING
        };
        Self {
            sample: PointerSample::default(),
            smoothing,
        }
    }

    /// Maps window pixel coordinates (origin top-left) to NDC with y pointing up.
    pub fn normalize(x: f64, y: f64, width: f64, height: f64) -> DVec2 {
        let width = width.max(1.0);
        let height = height.max(1.0);
        DVec2::new(x / width * 2.0 - 1.0, -(y / height) * 2.0 + 1.0)
    }

    /// Records the latest pointer position. Non-finite input is dropped.
    pub fn on_pointer_move(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.sample.raw = DVec2::new(x.clamp(-1.0, 1.0), y.clamp(-1.0, 1.0));
    }

    /// Moves the smoothed position one step toward the raw position.
    pub fn advance(&mut self) -> DVec2 {
        let PointerSample { raw, smoothed } = self.sample;
        self.sample.smoothed = smoothed + (raw - smoothed) * self.smoothing;
        self.sample.smoothed
    }

    pub fn sample(&self) -> PointerSample {
        self.sample
    }

    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    pub fn reset(&mut self) {
        self.sample = PointerSample::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_origin() {
        let tracker = PointerTracker::default();
        assert_eq!(tracker.sample().smoothed, DVec2::ZERO);
        assert_eq!(tracker.sample().raw, DVec2::ZERO);
    }

    #[test]
    fn single_step_moves_five_percent() {
        let mut tracker = PointerTracker::default();
        tracker.on_pointer_move(1.0, -1.0);
        let next = tracker.advance();
        assert!((next.x - 0.05).abs() < 1e-12);
        assert!((next.y + 0.05).abs() < 1e-12);
    }

    #[test]
    fn converges_within_ninety_frames() {
        let mut tracker = PointerTracker::default();
        tracker.on_pointer_move(1.0, 1.0);
        let mut smoothed = DVec2::ZERO;
        for _ in 0..90 {
            smoothed = tracker.advance();
        }
        assert!((smoothed - DVec2::ONE).abs().max_element() < 0.01);
    }

    #[test]
    fn smoothing_depends_only_on_frame_count() {
        let mut tracker = PointerTracker::default();
        tracker.on_pointer_move(1.0, 0.0);
        for _ in 0..10 {
            tracker.advance();
        }
        let expected = 1.0 - 0.95_f64.powi(10);
        assert!((tracker.sample().smoothed.x - expected).abs() < 1e-12);
        assert_eq!(tracker.sample().smoothed.y, 0.0);
    }

    #[test]
    fn ignores_non_finite_and_clamps() {
        let mut tracker = PointerTracker::default();
        tracker.on_pointer_move(0.25, 0.5);
        tracker.on_pointer_move(f64::NAN, 0.0);
        assert_eq!(tracker.sample().raw, DVec2::new(0.25, 0.5));
        tracker.on_pointer_move(3.0, -7.0);
        assert_eq!(tracker.sample().raw, DVec2::new(1.0, -1.0));
    }

    #[test]
    fn normalize_maps_corners() {
        assert_eq!(PointerTracker::normalize(0.0, 0.0, 800.0, 600.0), DVec2::new(-1.0, 1.0));
        assert_eq!(
            PointerTracker::normalize(800.0, 600.0, 800.0, 600.0),
            DVec2::new(1.0, -1.0)
        );
        assert_eq!(
            PointerTracker::normalize(400.0, 300.0, 800.0, 600.0),
            DVec2::ZERO
        );
    }

    #[test]
    fn invalid_smoothing_falls_back() {
        assert_eq!(PointerTracker::new(0.0).smoothing(), DEFAULT_SMOOTHING);
        assert_eq!(PointerTracker::new(1.5).smoothing(), DEFAULT_SMOOTHING);
        assert_eq!(PointerTracker::new(0.2).smoothing(), 0.2);
    }
}
