/// Headless drawing core
///
/// This module handles:
/// - The RGBA drawing surface and its stroke/eraser rasterization (surface.rs)
/// - Pointer-driven stroke state and tool application (editor.rs)
/// - Data URL encoding of images (data_url.rs)

pub mod data_url;
pub mod editor;
pub mod surface;

pub use data_url::DataUrl;
pub use editor::CanvasEditor;
pub use surface::Point;
