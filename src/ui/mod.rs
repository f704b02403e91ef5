pub mod app;
pub mod circle_renderer;
pub mod event_handler;
pub mod panel_renderer;
pub mod text_layout;
pub mod text_renderer;
pub mod window;

pub use app::run;
