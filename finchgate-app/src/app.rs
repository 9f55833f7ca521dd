use crate::display::ScreenState;
use crate::sink::DailyFileSink;
use anyhow::{Result, anyhow};
use finchgate_core::Gate;
use finchgate_experiment::{SessionController, SessionEvent};
use finchgate_render::CueRenderer;
use finchgate_timing::SystemTimer;
use pixels::{Pixels, SurfaceTexture};
use rand::rngs::StdRng;
use std::sync::Arc;
use tracing::{error, info, trace};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

pub type RigSession = SessionController<ScreenState, DailyFileSink, SystemTimer, StdRng>;

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<CueRenderer>,
    session: RigSession,
    timer: SystemTimer,
    debug_keybinds: bool,
    started: bool,
    scale_factor: f64,
    refresh_rate: Option<f64>,
}

impl App {
    pub fn new(session: RigSession, timer: SystemTimer, debug_keybinds: bool) -> Self {
        Self {
            window: None,
            pixels: None,
            renderer: None,
            session,
            timer,
            debug_keybinds,
            started: false,
            scale_factor: 1.0,
            refresh_rate: None,
        }
    }

    pub fn run(mut self, event_loop: EventLoop<SessionEvent>) -> Result<()> {
        info!("Space pauses, C changes the obstacle, Escape exits");
        if self.debug_keybinds {
            info!("Debug keys: Tab next trial, 1 entrance, 2 right, 3 left");
        }
        event_loop.run_app(&mut self)?;
        info!("Session ended after {} passage(s)", self.session.passages());
        Ok(())
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let primary_monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow!("No monitor available"))?;

        self.refresh_rate = primary_monitor
            .refresh_rate_millihertz()
            .map(|rate| rate as f64 / 1000.0);

        let window_attributes = Window::default_attributes()
            .with_title("Finchgate")
            .with_fullscreen(Some(Fullscreen::Borderless(Some(primary_monitor))))
            .with_resizable(false);

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let physical_size = window.inner_size();
        self.scale_factor = window.scale_factor();

        info!(
            "Display {}x{} at scale {:.2}, refresh {}",
            physical_size.width,
            physical_size.height,
            self.scale_factor,
            self.refresh_rate
                .map_or_else(|| "unknown".to_owned(), |hz| format!("{hz:.1} Hz")),
        );

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(Pixels::new(
            physical_size.width,
            physical_size.height,
            surface_texture,
        )?);
        self.renderer = Some(CueRenderer::new(
            physical_size.width,
            physical_size.height,
        )?);

        window.set_cursor_visible(false);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };
        let scene = self.session.display().scene();
        let stats = renderer.render_frame(&scene, pixels.frame_mut())?;
        pixels.render()?;
        if stats.redrawn {
            trace!(
                "Frame redrawn: draw {:.3}ms, copy {:.3}ms, total {:.3}ms",
                stats.draw.as_secs_f64() * 1e3,
                stats.copy.as_secs_f64() * 1e3,
                stats.total.as_secs_f64() * 1e3,
            );
        }
        Ok(())
    }

    fn handle_input(&mut self, key: PhysicalKey, event_loop: &ActiveEventLoop) {
        if let Some(event) = key_event(key, self.debug_keybinds) {
            self.session.handle_event(event);
            if event == SessionEvent::Exit {
                self.cleanup_and_exit(event_loop);
            }
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                error!("Failed to resize surface: {e}");
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                error!("Failed to resize buffer: {e}");
            }
        }
        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.resize(new_size.width, new_size.height) {
                error!("Failed to resize renderer: {e}");
            }
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
        info!("Display resized to {}x{}", new_size.width, new_size.height);
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.session.exit();
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        event_loop.exit();
    }
}

/// Maps a key press to a session event. Gate and trial keys only work with
/// debug keybinds on.
pub fn key_event(key: PhysicalKey, debug_keybinds: bool) -> Option<SessionEvent> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    match code {
        KeyCode::Escape => Some(SessionEvent::Exit),
        KeyCode::Space => Some(SessionEvent::TogglePause),
        KeyCode::KeyC => Some(SessionEvent::ToggleObstacle),
        _ if !debug_keybinds => None,
        KeyCode::Tab => Some(SessionEvent::AdvanceTrial),
        KeyCode::Digit1 => Some(SessionEvent::Gate(Gate::Entrance)),
        KeyCode::Digit2 => Some(SessionEvent::Gate(Gate::Right)),
        KeyCode::Digit3 => Some(SessionEvent::Gate(Gate::Left)),
        _ => None,
    }
}

impl ApplicationHandler<SessionEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!("Failed to create window and surface: {e}");
                self.cleanup_and_exit(event_loop);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render() {
                    error!("Render failed: {e:#}");
                    self.cleanup_and_exit(event_loop);
                }
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state.is_pressed() && !event.repeat =>
            {
                self.handle_input(event.physical_key, event_loop);
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor;
                if let Some(window) = &self.window {
                    self.handle_resize(window.inner_size());
                }
            }
            _ => {}
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: SessionEvent) {
        self.session.handle_event(event);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        for token in self.session.display_mut().pop_expired() {
            self.session.timer_fired(token);
        }

        // Trials only run once the first obstacle is confirmed; an exit
        // requested before that ends the program without running any.
        if !self.started && !self.session.awaiting_setup() {
            if !self.session.begin_run() {
                self.cleanup_and_exit(event_loop);
                return;
            }
            self.started = true;
        }
        if self.session.phase().is_terminal() {
            self.cleanup_and_exit(event_loop);
            return;
        }

        if self.session.display_mut().take_dirty() {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }

        let wake = self
            .session
            .display()
            .next_deadline()
            .and_then(|ts| self.timer.instant_at(ts));
        match wake {
            Some(at) => event_loop.set_control_flow(ControlFlow::WaitUntil(at)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }
}
