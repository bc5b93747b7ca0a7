//! GPU side of the renderer.
//!
//! - `context` owns wgpu instance/device/surface wiring and rebuilds the
//!   swapchain when the window resizes.
//! - `pipeline` compiles the field and solid WGSL into depth-tested pipelines
//!   sharing one uniform bind group layout.
//! - `uniforms` mirrors the WGSL `Scene` block and the solid vertex format.
//! - `state` glues everything together and draws one compositor `Frame`.

mod context;
mod pipeline;
mod state;
mod uniforms;

pub(crate) use state::GpuState;
