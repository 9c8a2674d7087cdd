/// Canvas editor: pointer-driven strokes over a [`Surface`]
///
/// Until [`CanvasEditor::initialize`] runs (layout not settled yet) every
/// operation is a no-op rather than an error.
use tracing::{debug, warn};

use super::data_url::DataUrl;
use super::surface::{Point, Surface};
use crate::error::EncodingError;
use crate::state::tool::{Tool, ToolState};

#[derive(Debug, Default)]
pub struct CanvasEditor {
    surface: Option<Surface>,
    tool: ToolState,
    /// Last point of the stroke in progress
    last_point: Option<Point>,
    /// Bumped on every pixel change so views can refresh cached textures
    revision: u64,
}

impl CanvasEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the drawing surface once its size is known
    ///
    /// A zero-sized surface could never be exported, so it stays uninitialized.
    pub fn initialize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            warn!(width, height, "ignoring empty drawing surface size");
            return;
        }

        debug!(width, height, "initializing drawing surface");
        self.surface = Some(Surface::new(width, height));
        self.last_point = None;
        self.touch();
    }

    pub fn is_ready(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn tool(&self) -> ToolState {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool.set_tool(tool);
    }

    pub fn set_width(&mut self, width: u32) {
        self.tool.set_width(width);
    }

    pub fn begin_stroke(&mut self, point: Point) {
        if self.surface.is_none() {
            return;
        }

        self.last_point = Some(point);
        if self.tool.tool == Tool::Eraser {
            self.erase_at(point);
        }
    }

    pub fn extend_stroke(&mut self, point: Point) {
        let Some(last) = self.last_point else {
            return;
        };
        let width = self.tool.width as f32;

        match self.tool.tool {
            Tool::Pen => {
                if let Some(surface) = self.surface.as_mut() {
                    surface.stroke_segment(last, point, width);
                    self.touch();
                }
            }
            Tool::Eraser => self.erase_at(point),
        }

        self.last_point = Some(point);
    }

    pub fn end_stroke(&mut self) {
        self.last_point = None;
    }

    /// Reset to a blank white surface, dropping any reference image
    pub fn clear(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.clear();
            self.last_point = None;
            self.touch();
        }
    }

    /// Draw an external image scaled to fill the surface
    pub fn load_image(&mut self, encoded: &str) -> Result<(), EncodingError> {
        let Some(surface) = self.surface.as_mut() else {
            return Ok(());
        };

        let data = DataUrl::parse(encoded)?;
        let image = image::load_from_memory(&data.bytes)?;
        debug!(
            width = image.width(),
            height = image.height(),
            "loading reference image"
        );

        surface.draw_scaled(&image);
        self.last_point = None;
        self.touch();
        Ok(())
    }

    /// Serialize the surface to a PNG data URL (`None` before initialization)
    pub fn export_png(&self) -> Result<Option<String>, EncodingError> {
        self.surface.as_ref().map(Surface::export_png).transpose()
    }

    fn erase_at(&mut self, point: Point) {
        if let Some(surface) = self.surface.as_mut() {
            surface.erase_square(point, self.tool.width as f32);
            self.touch();
        }
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}
