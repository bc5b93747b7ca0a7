//! wgpu + winit host for the animated page background.
//!
//! ```text
//!   backdrop CLI
//!          │ RendererConfig
//!          ▼
//!   Renderer::run / BackdropRuntime::spawn ──▶ WindowState ──▶ winit event loop
//!                                                   │
//!        CursorMoved / Resized ──▶ Compositor ──────┤
//!        RedrawRequested ──▶ Compositor::tick() ──▶ GpuState::render(frame)
//! ```
//!
//! `WindowState` owns the surface, device, pipelines and the scene
//! `Compositor`; `Renderer` runs the loop on the calling thread while
//! `BackdropRuntime` runs it on a dedicated thread and forwards host input
//! through the event-loop proxy. The `export` module plans frames and writes
//! field snapshots without touching the GPU.

mod compile;
pub mod export;
mod gpu;
mod runtime;
mod types;
mod window;

pub use export::{plan_frame, render_snapshot, write_snapshot, FrameRequest};
pub use runtime::{FrameScheduler, RunDeadline};
pub use types::{Antialiasing, RendererConfig};
pub use window::{BackdropRuntime, Renderer};
