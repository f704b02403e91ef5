use glyphon::{
    Attrs, Buffer, Cache, Color, Family, FontSystem, Metrics, Resolution, Shaping, SwashCache,
    TextArea, TextAtlas, TextBounds, TextRenderer as GlyphonTextRenderer, Viewport,
};
use std::sync::Arc;
use wgpu::{Device, Queue, TextureView};
use winit::dpi::PhysicalSize;

/// One positioned run of text for the current frame.
pub struct TextSpan {
    pub text: String,
    pub left: f32,
    pub top: f32,
    pub max_width: f32,
    pub font_size: f32,
    pub line_height: f32,
    pub color: [f32; 4],
}

/// A text renderer that uses glyphon to render every label, quote, and HUD
/// line of a frame in one prepare/render pass.
pub struct TextRenderer {
    font_system: FontSystem,
    cache: SwashCache,
    atlas: TextAtlas,
    renderer: GlyphonTextRenderer,
    device: Arc<Device>,
    queue: Arc<Queue>,
    size: PhysicalSize<u32>,
    cache_ref: Cache,
    viewport: Viewport,
}

impl TextRenderer {
    pub fn new(
        device: Arc<Device>,
        queue: Arc<Queue>,
        size: PhysicalSize<u32>,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let mut font_system = FontSystem::new();
        let cache = SwashCache::new();

        // Add system fonts - this is critical for text to appear
        font_system.db_mut().load_system_fonts();

        let cache_ref = Cache::new(&device);
        let viewport = Viewport::new(&device, &cache_ref);
        let mut atlas = TextAtlas::new(&device, &queue, &cache_ref, surface_format);
        let renderer =
            GlyphonTextRenderer::new(&mut atlas, &device, wgpu::MultisampleState::default(), None);

        Self {
            font_system,
            cache,
            atlas,
            renderer,
            device,
            queue,
            size,
            cache_ref,
            viewport,
        }
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.size = size;
        self.viewport.update(
            &self.queue,
            Resolution {
                width: size.width,
                height: size.height,
            },
        );
    }

    /// Shape and draw all spans of the frame.
    pub fn render_spans(
        &mut self,
        view: &TextureView,
        encoder: &mut wgpu::CommandEncoder,
        spans: &[TextSpan],
    ) {
        if spans.is_empty() {
            return;
        }

        let mut buffers: Vec<Buffer> = Vec::with_capacity(spans.len());
        for span in spans {
            let metrics = Metrics::new(span.font_size, span.line_height);
            let mut buffer = Buffer::new(&mut self.font_system, metrics);
            buffer.set_size(&mut self.font_system, Some(span.max_width), None);
            let color = Color::rgba(
                (span.color[0] * 255.0) as u8,
                (span.color[1] * 255.0) as u8,
                (span.color[2] * 255.0) as u8,
                (span.color[3] * 255.0) as u8,
            );
            buffer.set_text(
                &mut self.font_system,
                &span.text,
                Attrs::new().family(Family::SansSerif).color(color),
                Shaping::Advanced,
            );
            buffer.shape_until_scroll(&mut self.font_system, false);
            buffers.push(buffer);
        }

        self.viewport.update(
            &self.queue,
            Resolution {
                width: self.size.width,
                height: self.size.height,
            },
        );

        let bounds = TextBounds {
            left: 0,
            top: 0,
            right: self.size.width as i32,
            bottom: self.size.height as i32,
        };
        let areas: Vec<TextArea> = buffers
            .iter()
            .zip(spans)
            .map(|(buffer, span)| TextArea {
                buffer,
                left: span.left,
                top: span.top,
                scale: 1.0,
                bounds,
                default_color: Color::rgba(
                    (span.color[0] * 255.0) as u8,
                    (span.color[1] * 255.0) as u8,
                    (span.color[2] * 255.0) as u8,
                    (span.color[3] * 255.0) as u8,
                ),
                custom_glyphs: &[],
            })
            .collect();

        if self
            .renderer
            .prepare(
                &self.device,
                &self.queue,
                &mut self.font_system,
                &mut self.atlas,
                &self.viewport,
                areas,
                &mut self.cache,
            )
            .is_ok()
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Text Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            let _ = self
                .renderer
                .render(&self.atlas, &self.viewport, &mut render_pass);
        }

        // Trim the atlas to free up memory
        self.atlas.trim();
    }
}
