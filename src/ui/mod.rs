/// Widgets of the sketch window
///
/// - Pointer input over the drawing surface (canvas.rs)
/// - Result panel with busy indicator and clear/download actions (viewer.rs)

pub mod canvas;
pub mod viewer;
