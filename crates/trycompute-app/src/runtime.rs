//! winit event loop driving [`TryCompute`] against a real GL context.

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use trycompute_core::inputs::{Key, KeyDown};
use trycompute_core::AppConfig;
use trycompute_glium::GlWindow;
use trycompute_gpu::{GlDevice, GraphicsApi};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use crate::app::{AppControl, TryCompute};
use crate::time::FrameClock;

pub struct Runtime;

impl Runtime {
    /// Open the window, load GPU state, and run until the window closes.
    pub fn run(config: AppConfig) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;

        let window = GlWindow::create(
            &event_loop,
            &config.window.title,
            config.window.width,
            config.window.height,
        )
        .context("failed to create GL window")?;

        // SAFETY: `GlWindow::create` made the context current on this thread
        // and loaded the `gl` function pointers.
        let mut device = unsafe { GlDevice::new() }?;

        let mut app = TryCompute::new(config);
        app.on_load(&mut device)?;
        if let Err(e) = device.check_errors("load") {
            warn!("{e:#}");
        }

        let mut state = AppState {
            window,
            device,
            app,
            clock: FrameClock::new(),
            exit_requested: false,
        };

        event_loop
            .run_app(&mut state)
            .context("event loop terminated with error")?;

        // Covers loops that end without a close event.
        state.app.on_close(&mut state.device);
        Ok(())
    }
}

struct AppState {
    window: GlWindow,
    device: GlDevice,
    app: TryCompute,
    clock: FrameClock,
    exit_requested: bool,
}

impl AppState {
    fn close(&mut self, event_loop: &ActiveEventLoop) {
        if self.app.on_close(&mut self.device) {
            info!("GPU objects released");
        }
        self.exit_requested = true;
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let dt = self.clock.tick();
        self.app.on_update(dt);

        if let Err(e) = self.app.on_render(&mut self.device, dt) {
            error!("render failed: {e:#}");
            self.close(event_loop);
            return;
        }

        if let Err(e) = self.window.swap_buffers() {
            error!("{e:#}");
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {
        self.window.request_redraw();
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);
        // Continuous redraw.
        self.window.request_redraw();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.close(event_loop),

            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    self.window.resize(size.width, size.height);
                    self.device.viewport(size.width, size.height);
                }
                self.window.request_redraw();
            }

            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                let key_down = KeyDown {
                    key: map_key(event.physical_key),
                    repeat: event.repeat,
                };
                if self.app.on_key_down(key_down) == AppControl::Exit {
                    self.close(event_loop);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.app.on_close(&mut self.device);
    }
}

fn map_key(pk: PhysicalKey) -> Key {
    match pk {
        PhysicalKey::Code(KeyCode::Escape) => Key::Escape,
        PhysicalKey::Code(other) => Key::Other(other as u32),
        // NativeKeyCode is not a u32 in winit 0.30.
        PhysicalKey::Unidentified(_) => Key::Other(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::NativeKeyCode;

    #[test]
    fn escape_maps_to_escape() {
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::Escape)), Key::Escape);
    }

    #[test]
    fn other_keys_map_to_other() {
        assert!(matches!(
            map_key(PhysicalKey::Code(KeyCode::KeyQ)),
            Key::Other(_)
        ));
        assert_eq!(
            map_key(PhysicalKey::Unidentified(NativeKeyCode::Unidentified)),
            Key::Other(0)
        );
    }
}
