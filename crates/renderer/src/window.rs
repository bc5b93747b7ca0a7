use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, Sender};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopBuilder, EventLoopProxy};
use winit::window::{Window, WindowBuilder};

use tracing::{error, info, warn};

use scene::{Clock, Compositor, PointerTracker};

use crate::gpu::GpuState;
use crate::runtime::{earliest, FrameScheduler, RunDeadline};
use crate::types::RendererConfig;

/// Window, GPU resources and the compositor driving them.
pub(crate) struct WindowState {
    // Field order matters: the surface must drop before the window.
    gpu: GpuState,
    compositor: Compositor,
    window: Arc<Window>,
}

impl WindowState {
    pub(crate) fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let size = window.inner_size();
        let compositor = Compositor::new(&config.settings, Clock::system());
        let vertex_capacity = compositor.solid().mesh().positions().len();
        let gpu = GpuState::new(
            window.as_ref(),
            size,
            config.antialiasing,
            &config.settings,
            vertex_capacity,
        )?;

        let mut state = Self {
            gpu,
            compositor,
            window,
        };
        let size = state.gpu.size();
        state
            .compositor
            .mount(f64::from(size.width), f64::from(size.height));
        Ok(state)
    }

    pub(crate) fn window(&self) -> &Window {
        self.window.as_ref()
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.gpu.size()
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
        apply_surface_size(&mut self.compositor, new_size);
    }

    pub(crate) fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        let size = self.size();
        let ndc = PointerTracker::normalize(
            position.x,
            position.y,
            f64::from(size.width),
            f64::from(size.height),
        );
        self.compositor.on_pointer_move(ndc.x, ndc.y);
    }

    pub(crate) fn apply(&mut self, command: WindowCommand) -> CommandEffect {
        apply_command(&mut self.compositor, command)
    }

    pub(crate) fn unmount(&mut self) {
        self.compositor.unmount();
    }

    pub(crate) fn render_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        let Some(frame) = self.compositor.tick() else {
            return Ok(());
        };
        let surface = self.compositor.solid().surface(&frame.transform);
        self.gpu.render(&frame, self.compositor.camera(), &surface)
    }
}

/// Host input forwarded to the loop thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum WindowCommand {
    PointerMove { x: f64, y: f64 },
    Resize { width: u32, height: u32 },
    Shutdown,
}

/// What the event loop still has to do after a command reached the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommandEffect {
    Applied,
    RequestSize(PhysicalSize<u32>),
    Exit,
}

/// Applies a forwarded command to the compositor so the next `tick()` sees it.
pub(crate) fn apply_command(compositor: &mut Compositor, command: WindowCommand) -> CommandEffect {
    match command {
        WindowCommand::PointerMove { x, y } => {
            compositor.on_pointer_move(x, y);
            CommandEffect::Applied
        }
        WindowCommand::Resize { width, height } => {
            let size = PhysicalSize::new(width.max(1), height.max(1));
            apply_surface_size(compositor, size);
            CommandEffect::RequestSize(size)
        }
        WindowCommand::Shutdown => CommandEffect::Exit,
    }
}

/// Follows the configured surface; a minimised (zero-sized) window keeps the
/// last viewport, as the swapchain does.
pub(crate) fn apply_surface_size(compositor: &mut Compositor, size: PhysicalSize<u32>) -> bool {
    if size.width == 0 || size.height == 0 {
        return false;
    }
    compositor.on_resize(f64::from(size.width), f64::from(size.height));
    true
}

/// Blocking single-threaded renderer: owns the event loop on the calling thread.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Runs until the window closes or `run_for` elapses.
    pub fn run(&mut self) -> Result<()> {
        let event_loop = EventLoopBuilder::<WindowCommand>::with_user_event()
            .build()
            .map_err(|err| anyhow!("failed to create event loop: {err}"))?;
        let state = create_window_state(&event_loop, &self.config)?;
        run_event_loop(event_loop, state, &self.config)
    }
}

/// Background renderer running its event loop on a dedicated thread.
///
/// Host input is forwarded through the event-loop proxy so every state change
/// is applied on the loop thread between frames.
pub struct BackdropRuntime {
    proxy: EventLoopProxy<WindowCommand>,
    join_handle: Option<JoinHandle<Result<()>>>,
}

impl BackdropRuntime {
    pub fn spawn(config: RendererConfig) -> Result<Self> {
        let (ready_tx, ready_rx) = bounded(1);
        let handle = thread::Builder::new()
            .name("backdrop-window".into())
            .spawn(move || run_window_thread(config, ready_tx))
            .map_err(|err| anyhow!("failed to spawn window thread: {err}"))?;

        let proxy = ready_rx
            .recv()
            .map_err(|err| anyhow!("window thread failed to initialise: {err}"))??;

        Ok(Self {
            proxy,
            join_handle: Some(handle),
        })
    }

    /// Pointer position in normalized device coordinates (y up).
    pub fn pointer_move(&self, x: f64, y: f64) -> Result<()> {
        self.send(WindowCommand::PointerMove { x, y })
    }

    pub fn resize(&self, width: u32, height: u32) -> Result<()> {
        self.send(WindowCommand::Resize { width, height })
    }

    /// Whether the loop has exited on its own (window closed, `run_for` elapsed).
    pub fn is_finished(&self) -> bool {
        self.join_handle
            .as_ref()
            .map_or(true, |handle| handle.is_finished())
    }

    /// Blocks until the loop exits on its own.
    pub fn wait(mut self) -> Result<()> {
        match self.join_handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|err| anyhow!("window thread panicked: {err:?}"))?,
            None => Ok(()),
        }
    }

    pub fn shutdown(mut self) -> Result<()> {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(WindowCommand::Shutdown);
            handle
                .join()
                .map_err(|err| anyhow!("window thread panicked: {err:?}"))??;
        }
        Ok(())
    }

    fn send(&self, command: WindowCommand) -> Result<()> {
        self.proxy
            .send_event(command)
            .map_err(|err| anyhow!("background event loop is gone: {err}"))
    }
}

impl Drop for BackdropRuntime {
    fn drop(&mut self) {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(WindowCommand::Shutdown);
            let _ = handle.join();
        }
    }
}

fn run_window_thread(
    config: RendererConfig,
    ready_tx: Sender<Result<EventLoopProxy<WindowCommand>>>,
) -> Result<()> {
    let mut builder = EventLoopBuilder::<WindowCommand>::with_user_event();
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        use winit::platform::wayland::EventLoopBuilderExtWayland;
        EventLoopBuilderExtWayland::with_any_thread(&mut builder, true);
    }

    #[cfg(any(
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd",
        target_os = "dragonfly"
    ))]
    {
        use winit::platform::x11::EventLoopBuilderExtX11;
        EventLoopBuilderExtX11::with_any_thread(&mut builder, true);
    }

    let setup = builder
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))
        .and_then(|event_loop| {
            let state = create_window_state(&event_loop, &config)?;
            Ok((event_loop, state))
        });
    let (event_loop, state) = match setup {
        Ok(parts) => parts,
        Err(err) => {
            let message = err.to_string();
            let _ = ready_tx.send(Err(anyhow!(message)));
            return Err(err);
        }
    };

    let _ = ready_tx.send(Ok(event_loop.create_proxy()));
    run_event_loop(event_loop, state, &config)
}

fn create_window_state(
    event_loop: &EventLoop<WindowCommand>,
    config: &RendererConfig,
) -> Result<WindowState> {
    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(window_size)
        .with_visible(config.show_window)
        .build(event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;

    WindowState::new(Arc::new(window), config)
        .map_err(|err| anyhow!("failed to initialise window renderer: {err}"))
}

fn run_event_loop(
    event_loop: EventLoop<WindowCommand>,
    mut state: WindowState,
    config: &RendererConfig,
) -> Result<()> {
    let mut scheduler = FrameScheduler::new(config.target_fps);
    let run_deadline = RunDeadline::new(Instant::now(), config.run_for);
    if let Some(interval) = scheduler.interval() {
        info!(fps = config.target_fps, ?interval, "frame rate capped");
    }
    if let Some(limit) = config.run_for {
        info!(?limit, "background will unmount after run limit");
    }
    state.window().request_redraw();

    let run_result = event_loop.run(move |event, elwt| match event {
        Event::UserEvent(command) => match state.apply(command) {
            CommandEffect::Applied => {}
            CommandEffect::RequestSize(requested) => {
                if let Some(applied) = state.window().request_inner_size(requested) {
                    state.resize(applied);
                }
            }
            CommandEffect::Exit => elwt.exit(),
        },
        Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    elwt.exit();
                }
                WindowEvent::CursorMoved { position, .. } => {
                    state.handle_cursor_moved(position);
                }
                WindowEvent::Resized(new_size) => {
                    state.resize(new_size);
                }
                WindowEvent::ScaleFactorChanged {
                    mut inner_size_writer,
                    ..
                } => {
                    let _ = inner_size_writer.request_inner_size(state.size());
                }
                WindowEvent::RedrawRequested => match state.render_frame() {
                    Ok(()) => scheduler.mark_rendered(Instant::now()),
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        state.resize(state.size());
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        error!("surface out of memory; closing background");
                        elwt.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        warn!("surface timeout; retrying next frame");
                    }
                    Err(other) => {
                        warn!("surface error: {other:?}; retrying next frame");
                    }
                },
                _ => {}
            }
        }
        Event::AboutToWait => {
            let now = Instant::now();
            if run_deadline.expired(now) {
                info!("run limit reached");
                elwt.exit();
                return;
            }
            if scheduler.ready_for_frame(now) {
                tracing::trace!("scheduler: issuing redraw now");
                state.window().request_redraw();
                match run_deadline.deadline() {
                    Some(deadline) => elwt.set_control_flow(ControlFlow::WaitUntil(deadline)),
                    None => elwt.set_control_flow(ControlFlow::Wait),
                }
            } else if let Some(deadline) =
                earliest(scheduler.next_deadline(), run_deadline.deadline())
            {
                let ms = deadline.saturating_duration_since(now).as_millis();
                tracing::trace!(deadline_ms = ms, "scheduler: waiting until next frame");
                elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
            } else {
                elwt.set_control_flow(ControlFlow::Wait);
            }
        }
        Event::LoopExiting => {
            state.unmount();
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}

#[cfg(test)]
mod tests {
    use glam::DVec2;
    use scene::SceneSettings;

    use super::*;

    fn mounted() -> Compositor {
        let mut compositor = Compositor::new(&SceneSettings::default(), Clock::fixed(1.0));
        compositor.mount(1280.0, 720.0);
        compositor
    }

    #[test]
    fn forwarded_pointer_reaches_next_tick() {
        let mut compositor = mounted();
        let effect = apply_command(
            &mut compositor,
            WindowCommand::PointerMove { x: 0.5, y: -0.5 },
        );
        assert_eq!(effect, CommandEffect::Applied);

        let frame = compositor.tick().expect("mounted");
        assert_eq!(frame.pointer.raw, DVec2::new(0.5, -0.5));
        assert!(frame.uniforms.mouse.x > 0.0 && frame.uniforms.mouse.y < 0.0);
    }

    #[test]
    fn forwarded_resize_reaches_next_tick() {
        let mut compositor = mounted();
        let effect = apply_command(
            &mut compositor,
            WindowCommand::Resize {
                width: 800,
                height: 600,
            },
        );
        assert_eq!(effect, CommandEffect::RequestSize(PhysicalSize::new(800, 600)));

        let frame = compositor.tick().expect("mounted");
        assert_eq!(compositor.viewport().pixels(), (800.0, 600.0));
        assert!((frame.viewport.aspect() - 800.0 / 600.0).abs() < 1e-9);
    }

    #[test]
    fn shutdown_exits_the_loop() {
        let mut compositor = mounted();
        assert_eq!(
            apply_command(&mut compositor, WindowCommand::Shutdown),
            CommandEffect::Exit
        );
    }

    #[test]
    fn minimised_surface_keeps_the_viewport() {
        let mut compositor = mounted();
        let before = compositor.viewport().current();

        assert!(!apply_surface_size(&mut compositor, PhysicalSize::new(0, 0)));
        assert!(!apply_surface_size(&mut compositor, PhysicalSize::new(1280, 0)));
        assert_eq!(compositor.viewport().current(), before);
        assert_eq!(compositor.viewport().pixels(), (1280.0, 720.0));

        assert!(apply_surface_size(&mut compositor, PhysicalSize::new(640, 360)));
        assert_eq!(compositor.viewport().pixels(), (640.0, 360.0));
    }
}
