use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Path, Program, Stroke};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

use crate::raster;
use crate::state::tool::{Tool, ToolState};
use crate::Message;

/// Pointer input mapped to surface coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrokeEvent {
    Begin(raster::Point),
    Extend(raster::Point),
    End,
}

/// Transparent input layer stacked over the surface image
///
/// The surface pixels are shown by an `image` widget underneath, stretched
/// to the same bounds, so widget coordinates scale linearly to surface pixels.
pub struct SketchPad {
    /// Surface size in pixels
    pub surface_size: Size<u32>,
    pub tool: ToolState,
}

impl SketchPad {
    fn scale(&self, bounds: Rectangle) -> (f32, f32) {
        (
            self.surface_size.width as f32 / bounds.width.max(1.0),
            self.surface_size.height as f32 / bounds.height.max(1.0),
        )
    }

    fn to_surface(&self, position: Point, bounds: Rectangle) -> raster::Point {
        let (sx, sy) = self.scale(bounds);
        raster::Point::new(position.x * sx, position.y * sy)
    }
}

impl Program<Message> for SketchPad {
    type State = StrokeState;

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        // Brush outline under the cursor, sized in widget space
        if let Some(position) = cursor.position_in(bounds) {
            let (sx, sy) = self.scale(bounds);
            let size = self.tool.width as f32 / sx.max(sy).max(f32::EPSILON);

            let outline = match self.tool.tool {
                Tool::Pen => Path::circle(position, (size / 2.0).max(1.0)),
                Tool::Eraser => Path::rectangle(
                    Point::new(position.x - size / 2.0, position.y - size / 2.0),
                    Size::new(size, size),
                ),
            };

            frame.stroke(
                &outline,
                Stroke::default()
                    .with_color(Color::from_rgba(0.3, 0.3, 0.3, 0.8))
                    .with_width(1.0),
            );
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match event {
            // Left press inside the pad starts a stroke
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(position) = cursor.position_in(bounds) {
                    state.is_drawing = true;
                    let point = self.to_surface(position, bounds);
                    return (
                        canvas::event::Status::Captured,
                        Some(Message::Stroke(StrokeEvent::Begin(point))),
                    );
                }
            }

            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) if state.is_drawing => {
                // Leaving the pad ends the stroke, like releasing the button
                let message = match cursor.position_in(bounds) {
                    Some(position) => StrokeEvent::Extend(self.to_surface(position, bounds)),
                    None => {
                        state.is_drawing = false;
                        StrokeEvent::End
                    }
                };
                return (canvas::event::Status::Captured, Some(Message::Stroke(message)));
            }

            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left))
            | canvas::Event::Mouse(mouse::Event::CursorLeft)
                if state.is_drawing =>
            {
                state.is_drawing = false;
                return (
                    canvas::event::Status::Captured,
                    Some(Message::Stroke(StrokeEvent::End)),
                );
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        if cursor.is_over(bounds) {
            mouse::Interaction::Crosshair
        } else {
            mouse::Interaction::default()
        }
    }
}

/// Whether a stroke is in progress
#[derive(Debug, Clone, Default)]
pub struct StrokeState {
    pub is_drawing: bool,
}
