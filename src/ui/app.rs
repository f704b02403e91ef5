use std::sync::atomic::Ordering;
use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use crate::config::AppConfig;
use crate::engine::EngineBridge;

use super::window::WindowState;

/// Resolved keyboard bindings, looked up once from the config strings.
struct Shortcuts {
    spawn_pair: Option<KeyCode>,
    reset_scene: Option<KeyCode>,
    exit_application: Option<KeyCode>,
}

impl Shortcuts {
    fn resolve(config: &AppConfig) -> Self {
        let table = &config.keyboard_shortcuts;
        Self {
            spawn_pair: table.to_key_code(&table.spawn_pair),
            reset_scene: table.to_key_code(&table.reset_scene),
            exit_application: table.to_key_code(&table.exit_application),
        }
    }
}

struct CanvasApp {
    config: AppConfig,
    shortcuts: Shortcuts,
    bridge: Option<EngineBridge>,
    state: Option<WindowState>,
}

impl CanvasApp {
    fn new(bridge: EngineBridge, config: AppConfig) -> Self {
        let shortcuts = Shortcuts::resolve(&config);
        Self {
            config,
            shortcuts,
            bridge: Some(bridge),
            state: None,
        }
    }
}

impl ApplicationHandler for CanvasApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let Some(bridge) = self.bridge.take() else {
            return;
        };

        let attributes = winit::window::Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = Arc::new(event_loop.create_window(attributes).unwrap());

        let state = WindowState::new(window, bridge, &self.config);
        state.window.request_redraw();
        self.state = Some(state);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                state.quit();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                state.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                if !state.bridge.running.load(Ordering::Relaxed) {
                    event_loop.exit();
                    return;
                }
                state.draw();
            }
            WindowEvent::CursorMoved { position, .. } => {
                state.handle_cursor_moved(position.x, position.y);
            }
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => {
                state.handle_mouse_input(button_state, button);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if Some(code) == self.shortcuts.exit_application {
                    state.quit();
                    event_loop.exit();
                } else if Some(code) == self.shortcuts.spawn_pair {
                    state.spawn_pair();
                } else if Some(code) == self.shortcuts.reset_scene {
                    state.reset_scene();
                }
            }
            _ => {}
        }
    }
}

/// Open the canvas window and run the event loop until the user exits.
pub fn run(bridge: EngineBridge, config: AppConfig) {
    let event_loop = EventLoop::new().unwrap();
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = CanvasApp::new(bridge, config);
    if let Err(e) = event_loop.run_app(&mut app) {
        eprintln!("Event loop error: {:?}", e);
    }
}
