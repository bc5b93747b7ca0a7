use std::time::Duration;

use scene::SceneSettings;

/// Anti-aliasing policy for the render pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format.
    #[default]
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

/// Immutable configuration passed to the renderer at start-up.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Scene construction constants (camera, lights, palette, solid).
    pub settings: SceneSettings,
    /// Optional FPS cap; `None` redraws on every vsync.
    pub target_fps: Option<f32>,
    pub antialiasing: Antialiasing,
    /// Unmount and close after this long.
    pub run_for: Option<Duration>,
    pub show_window: bool,
    pub title: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            settings: SceneSettings::default(),
            target_fps: None,
            antialiasing: Antialiasing::default(),
            run_for: None,
            show_window: true,
            title: "backdrop".into(),
        }
    }
}
