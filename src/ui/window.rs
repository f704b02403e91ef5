use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton};
use winit::window::Window;

use crate::config::AppConfig;
use crate::engine::EngineBridge;
use crate::scene::{Circle, Hit, Scene, SceneMode, SpeechPhase};

use super::circle_renderer::{CircleInstance, CircleRenderer};
use super::event_handler::{DragUpdate, EventHandler};
use super::panel_renderer::{PanelInstance, PanelRenderer};
use super::text_layout::{self, FONT_SIZE, LINE_HEIGHT, PANEL_PADDING, QUOTE_MAX_WIDTH};
use super::text_renderer::{TextRenderer, TextSpan};

/// Canvas clear color.
const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.957,
    g: 0.965,
    b: 0.973,
    a: 1.0,
};

/// Ink for labels and quotes (#1F2937).
const TEXT_COLOR: [f32; 3] = [0.122, 0.161, 0.216];
/// HUD hint gray (#6B7280).
const HINT_COLOR: [f32; 3] = [0.420, 0.447, 0.502];
/// Error red (#EF4444).
const ERROR_COLOR: [f32; 3] = [0.937, 0.267, 0.267];

const HUD_MARGIN: f32 = 16.0;
const OUTLINE_STROKE: f32 = 2.0;
const RIPPLE_COUNT: u32 = 3;

pub struct WindowState {
    pub window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub config: wgpu::SurfaceConfiguration,
    pub circle_renderer: CircleRenderer,
    pub panel_renderer: PanelRenderer,
    pub text_renderer: TextRenderer,
    pub scene: Scene,
    pub bridge: EngineBridge,
    pub event_handler: EventHandler,
    rng: rand::rngs::ThreadRng,
    last_frame: Instant,
    started: Instant,
    shortcut_hint: String,
}

impl WindowState {
    pub fn new(window: Arc<Window>, bridge: EngineBridge, app_config: &AppConfig) -> Self {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone()).unwrap();

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .unwrap();

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        ))
        .unwrap();
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .filter(|f| f.is_srgb())
            .next()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let circle_renderer = CircleRenderer::new(device.clone(), queue.clone(), config.format);
        let panel_renderer = PanelRenderer::new(device.clone(), queue.clone(), config.format);
        let text_renderer = TextRenderer::new(
            device.clone(),
            queue.clone(),
            PhysicalSize::new(width, height),
            config.format,
        );

        let scene = Scene::new(app_config, width as f32, height as f32);
        let shortcut_hint = format!(
            "{}: people appear · click a circle to remove it · click its words to continue",
            app_config.keyboard_shortcuts.spawn_pair
        );

        Self {
            window,
            surface,
            device,
            queue,
            config,
            circle_renderer,
            panel_renderer,
            text_renderer,
            scene,
            bridge,
            event_handler: EventHandler::new(),
            rng: rand::rng(),
            last_frame: Instant::now(),
            started: Instant::now(),
            shortcut_hint,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.text_renderer.resize(PhysicalSize::new(width, height));
            self.scene.set_view(width as f32, height as f32);
        }
    }

    pub fn draw(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(0.1);
        self.last_frame = now;

        // Fold finished rounds into the scene before the frame is built.
        while let Ok(event) = self.bridge.event_rx.try_recv() {
            self.scene.apply_event(event, now, &mut self.rng);
        }
        self.scene.tick(now, dt, &mut self.rng);

        let output = self.surface.get_current_texture().unwrap();
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // Clear pass; everything after loads and blends on top.
        {
            let _clear = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Background Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(BACKGROUND),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }

        let (circles, panels, spans) = self.build_frame(now);
        self.circle_renderer.upload(&circles);
        self.panel_renderer.upload(&panels);
        self.circle_renderer.render(&view, &mut encoder);
        self.panel_renderer.render(&view, &mut encoder);
        self.text_renderer.render_spans(&view, &mut encoder, &spans);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        // Continuous redraw keeps the animation clocks running.
        self.window.request_redraw();
    }

    /// Assemble all draw data for one frame: circle and rain instances,
    /// panel quads, and text spans in screen coordinates.
    fn build_frame(
        &self,
        now: Instant,
    ) -> (Vec<CircleInstance>, Vec<PanelInstance>, Vec<TextSpan>) {
        let screen = (self.config.width as f32, self.config.height as f32);
        let (pan_x, pan_y) = self.scene.pan;
        let t = (now - self.started).as_secs_f32();

        let mut circles = Vec::new();
        let mut panels = Vec::new();
        let mut spans = Vec::new();

        for circle in self.scene.circles() {
            let cx = circle.x + pan_x;
            let cy = circle.y + pan_y;
            let color = [circle.color[0], circle.color[1], circle.color[2], circle.alpha];
            circles.push(CircleInstance::from_pixels(
                cx,
                cy,
                circle.radius,
                OUTLINE_STROKE,
                color,
                screen,
            ));

            // Ripples pulse inside the speaking circle.
            if circle.phase != SpeechPhase::Idle {
                for i in 0..RIPPLE_COUNT {
                    let phase = t * 2.0 + i as f32;
                    let radius = circle.radius * (1.0 - (i + 1) as f32 * 0.2) + phase.sin() * 5.0;
                    if radius <= 2.0 {
                        continue;
                    }
                    let alpha = 0.53 * circle.alpha;
                    circles.push(CircleInstance::from_pixels(
                        cx,
                        cy,
                        radius,
                        1.0,
                        [circle.color[0], circle.color[1], circle.color[2], alpha],
                        screen,
                    ));
                }
            }

            self.push_circle_text(circle, cx, cy, screen, &mut panels, &mut spans);
        }

        for drop in self.scene.rain() {
            circles.push(CircleInstance::from_pixels(
                drop.x + pan_x,
                drop.y + pan_y,
                drop.radius,
                0.0,
                [drop.color[0], drop.color[1], drop.color[2], drop.opacity],
                screen,
            ));
        }

        self.push_hud(screen, &mut spans);
        (circles, panels, spans)
    }

    fn push_circle_text(
        &self,
        circle: &Circle,
        cx: f32,
        cy: f32,
        screen: (f32, f32),
        panels: &mut Vec<PanelInstance>,
        spans: &mut Vec<TextSpan>,
    ) {
        match circle.phase {
            SpeechPhase::Idle => {
                let panel = text_layout::label_panel(cx, cy, circle.radius, &circle.speaker);
                panels.push(PanelInstance::from_panel(
                    &panel,
                    [1.0, 1.0, 1.0, 0.9 * circle.alpha],
                    screen,
                ));
                spans.push(TextSpan {
                    text: circle.speaker.clone(),
                    left: panel.x + PANEL_PADDING,
                    top: panel.y + (panel.height - LINE_HEIGHT) / 2.0,
                    max_width: panel.width,
                    font_size: FONT_SIZE,
                    line_height: LINE_HEIGHT,
                    color: [TEXT_COLOR[0], TEXT_COLOR[1], TEXT_COLOR[2], circle.alpha],
                });
            }
            SpeechPhase::FadingIn | SpeechPhase::Speaking => {
                let lines = text_layout::quote_lines(&circle.speaker, &circle.quote);
                let panel = text_layout::quote_panel(cx, cy, circle.radius, lines.len());
                let alpha = circle.opacity * circle.alpha;
                panels.push(PanelInstance::from_panel(
                    &panel,
                    [1.0, 1.0, 1.0, 0.9 * alpha],
                    screen,
                ));
                spans.push(TextSpan {
                    text: lines.join("\n"),
                    left: panel.x + PANEL_PADDING,
                    top: panel.y + PANEL_PADDING,
                    max_width: QUOTE_MAX_WIDTH + PANEL_PADDING,
                    font_size: FONT_SIZE,
                    line_height: LINE_HEIGHT,
                    color: [TEXT_COLOR[0], TEXT_COLOR[1], TEXT_COLOR[2], alpha],
                });
            }
        }
    }

    fn push_hud(&self, screen: (f32, f32), spans: &mut Vec<TextSpan>) {
        let mut lines: Vec<(String, [f32; 3])> = Vec::new();
        if let Some(error) = &self.scene.last_error {
            lines.push((format!("Error: {}", error), ERROR_COLOR));
        }
        if self.bridge.generating.load(Ordering::Relaxed) {
            lines.push(("People appearing...".to_string(), HINT_COLOR));
        }
        lines.push((self.shortcut_hint.clone(), HINT_COLOR));

        let mut top = screen.1 - HUD_MARGIN - LINE_HEIGHT * lines.len() as f32;
        for (text, color) in lines {
            spans.push(TextSpan {
                text,
                left: HUD_MARGIN,
                top,
                max_width: screen.0 - HUD_MARGIN * 2.0,
                font_size: FONT_SIZE,
                line_height: LINE_HEIGHT,
                color: [color[0], color[1], color[2], 1.0],
            });
            top += LINE_HEIGHT;
        }
    }

    pub fn handle_cursor_moved(&mut self, x: f64, y: f64) {
        if let DragUpdate::Pan { dx, dy } = self.event_handler.cursor_moved(x, y) {
            self.scene.pan_by(dx, dy);
        }
    }

    pub fn handle_mouse_input(&mut self, state: ElementState, button: MouseButton) {
        if button != MouseButton::Left {
            return;
        }
        match state {
            ElementState::Pressed => {
                let (x, y) = self.event_handler.cursor();
                let on_background = self.scene.hit_test(x as f32, y as f32).is_none();
                self.event_handler.press(on_background);
            }
            ElementState::Released => {
                if let Some((x, y)) = self.event_handler.release() {
                    self.handle_click(x as f32, y as f32);
                }
            }
        }
    }

    fn handle_click(&mut self, x: f32, y: f32) {
        match self.scene.hit_test(x, y) {
            Some(Hit::Body(id)) => self.scene.remove_circle(id),
            Some(Hit::Label(id)) => self.request_continuation(id),
            None => {}
        }
    }

    /// Ask the engine for a brand-new pair. Ignored while a round is already
    /// in flight or the scene is dissolving.
    pub fn spawn_pair(&mut self) {
        if self.scene.mode() != SceneMode::Active {
            return;
        }
        if self.bridge.generating.swap(true, Ordering::SeqCst) {
            return;
        }
        match self.scene.begin_new_pair(&mut self.rng) {
            Some(request) => self.send_request(request),
            None => self.bridge.generating.store(false, Ordering::SeqCst),
        }
    }

    fn request_continuation(&mut self, clicked: crate::scene::CircleId) {
        if self.bridge.generating.swap(true, Ordering::SeqCst) {
            return;
        }
        match self.scene.begin_continuation(clicked) {
            Some(request) => self.send_request(request),
            None => self.bridge.generating.store(false, Ordering::SeqCst),
        }
    }

    fn send_request(&mut self, request: crate::engine::RoundRequest) {
        if let Err(err) = self.bridge.request_tx.try_send(request) {
            let request = err.into_inner();
            self.scene.cancel_round(request.round_id);
            self.scene.set_error("Failed to generate conversation");
            self.bridge.generating.store(false, Ordering::SeqCst);
        }
    }

    pub fn reset_scene(&mut self) {
        self.scene.reset();
    }

    pub fn quit(&self) {
        self.bridge.running.store(false, Ordering::SeqCst);
    }
}
