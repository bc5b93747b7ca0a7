use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::field::{FieldUniforms, ProceduralField};
use crate::pointer::{PointerSample, PointerTracker};
use crate::solid::{RotatingSolid, SolidTransform};
use crate::viewport::{Camera, ViewportAdapter, ViewportSize};
use crate::SceneSettings;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientLight {
    pub intensity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub position: DVec3,
    pub intensity: f64,
}

/// The two static light sources the scene is composited with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lights {
    pub ambient: AmbientLight,
    pub point: PointLight,
}

impl Default for Lights {
    fn default() -> Self {
        Self {
            ambient: AmbientLight { intensity: 0.4 },
            point: PointLight {
                position: DVec3::new(50.0, 50.0, 50.0),
                intensity: 3.0,
            },
        }
    }
}

/// One entry of a frame's draw list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    AmbientLight(AmbientLight),
    PointLight(PointLight),
    Field(FieldUniforms),
    Solid(SolidTransform),
}

/// Everything the host needs to draw one frame, back to front.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub index: u64,
    pub elapsed: f64,
    pub pointer: PointerSample,
    pub uniforms: FieldUniforms,
    pub transform: SolidTransform,
    /// World-space size of the field plane this frame was planned for.
    pub viewport: ViewportSize,
    pub draws: [DrawCommand; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Unmounted,
    Mounted,
}

/// Owns the per-frame tick and every piece of mutable scene state.
///
/// ```text
///   Clock ──────────────┬──▶ FieldUniforms ──▶ draw field
///   PointerTracker ─────┤
///   ViewportAdapter ────┘
///   Clock ─────────────────▶ SolidTransform ─▶ draw solid
/// ```
pub struct Compositor {
    clock: Clock,
    pointer: PointerTracker,
    field: ProceduralField,
    solid: RotatingSolid,
    viewport: ViewportAdapter,
    lights: Lights,
    lifecycle: Lifecycle,
}

impl Compositor {
    pub fn new(settings: &SceneSettings, clock: Clock) -> Self {
        Self {
            clock,
            pointer: PointerTracker::new(settings.pointer_smoothing),
            field: ProceduralField::new(settings.palette),
            solid: RotatingSolid::new(settings.solid),
            viewport: ViewportAdapter::new(settings.camera),
            lights: settings.lights,
            lifecycle: Lifecycle::Unmounted,
        }
    }

    /// Starts the loop for a surface of the given pixel size. The clock and
    /// pointer restart from zero.
    pub fn mount(&mut self, pixel_width: f64, pixel_height: f64) -> ViewportSize {
        self.clock.reset();
        self.pointer.reset();
        let size = self.viewport.on_resize(pixel_width, pixel_height);
        self.lifecycle = Lifecycle::Mounted;
        info!(
            pixel_width,
            pixel_height,
            world_width = size.width,
            world_height = size.height,
            "background mounted"
        );
        size
    }

    /// Stops all per-frame work; subsequent ticks return `None`.
    pub fn unmount(&mut self) {
        if self.lifecycle == Lifecycle::Mounted {
            info!(frames = self.clock.frames(), "background unmounted");
        }
        self.lifecycle = Lifecycle::Unmounted;
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_mounted(&self) -> bool {
        self.lifecycle == Lifecycle::Mounted
    }

    /// Records a pointer position in normalized device coordinates.
    pub fn on_pointer_move(&mut self, x: f64, y: f64) {
        self.pointer.on_pointer_move(x, y);
    }

    /// Applies a resize; takes effect on the next tick.
    pub fn on_resize(&mut self, pixel_width: f64, pixel_height: f64) -> ViewportSize {
        let size = self.viewport.on_resize(pixel_width, pixel_height);
        debug!(
            pixel_width,
            pixel_height,
            world_width = size.width,
            world_height = size.height,
            "viewport resized"
        );
        size
    }

    /// Advances every component by one frame and returns the draw plan.
    pub fn tick(&mut self) -> Option<Frame> {
        if !self.is_mounted() {
            return None;
        }

        let elapsed = self.clock.tick();
        let smoothed = self.pointer.advance();
        let uniforms = FieldUniforms {
            time: elapsed,
            mouse: smoothed,
            scale: self.viewport.current(),
        };
        let transform = self.solid.advance(elapsed);

        Some(Frame {
            index: self.clock.frames() - 1,
            elapsed,
            pointer: self.pointer.sample(),
            uniforms,
            transform,
            viewport: uniforms.scale,
            draws: [
                DrawCommand::AmbientLight(self.lights.ambient),
                DrawCommand::PointLight(self.lights.point),
                DrawCommand::Field(uniforms),
                DrawCommand::Solid(transform),
            ],
        })
    }

    pub fn camera(&self) -> &Camera {
        self.viewport.camera()
    }

    pub fn viewport(&self) -> &ViewportAdapter {
        &self.viewport
    }

    pub fn field(&self) -> &ProceduralField {
        &self.field
    }

    pub fn solid(&self) -> &RotatingSolid {
        &self.solid
    }

    pub fn lights(&self) -> &Lights {
        &self.lights
    }
}
