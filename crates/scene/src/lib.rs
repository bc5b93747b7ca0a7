//! Scene core for the animated page background.
//!
//! A full-viewport procedural colour field is composited with a single slowly
//! rotating, continuously deforming solid, lit by one ambient and one point
//! light and framed by a fixed camera. Nothing here touches the GPU: the
//! [`Compositor`] turns time, pointer input and viewport size into a [`Frame`]
//! that a host (the `renderer` crate, the snapshot exporter, tests) draws.
//!
//! ```text
//!   host input ──▶ Compositor::on_pointer_move / on_resize
//!   vsync      ──▶ Compositor::tick() ──▶ Frame { draws: [ambient, point, field, solid] }
//! ```

mod clock;
mod compositor;
mod field;
mod noise;
mod pointer;
mod solid;
mod viewport;

use serde::{Deserialize, Serialize};

pub use clock::{BoxedTimeSource, Clock, FixedTimeSource, SystemTimeSource, TimeSample, TimeSource};
pub use compositor::{AmbientLight, Compositor, DrawCommand, Frame, Lifecycle, Lights, PointLight};
pub use field::{smoothstep, ColorField, FieldPalette, FieldUniforms, ProceduralField, Rgba};
pub use noise::{signed_noise, value_noise};
pub use pointer::{PointerSample, PointerTracker, DEFAULT_SMOOTHING};
pub use solid::{RotatingSolid, SolidMaterial, SolidMesh, SolidParams, SolidTransform, SolidVertex};
pub use viewport::{Camera, ViewportAdapter, ViewportSize, MIN_PIXEL_EXTENT, MIN_WORLD_EXTENT};

/// Construction-time constants for the whole scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneSettings {
    pub camera: Camera,
    pub lights: Lights,
    pub palette: FieldPalette,
    pub pointer_smoothing: f64,
    pub solid: SolidParams,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            camera: Camera::default(),
            lights: Lights::default(),
            palette: FieldPalette::default(),
            pointer_smoothing: DEFAULT_SMOOTHING,
            solid: SolidParams::default(),
        }
    }
}
