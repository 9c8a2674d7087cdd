use image::{imageops, DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

use super::data_url::DataUrl;
use crate::error::EncodingError;

/// Background of a blank surface
pub const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Pixel value left behind by the eraser
pub const ERASED: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// A position in surface pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The raster the user draws on
///
/// Output of [`Surface::to_png`] depends only on the pixel contents.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    /// Create a blank (white) surface
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width, height, BACKGROUND),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Raw RGBA8 pixels, row-major
    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        (x < self.width() && y < self.height()).then(|| *self.pixels.get_pixel(x, y))
    }

    /// Reset to a white background
    pub fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = BACKGROUND;
        }
    }

    /// Draw a black anti-aliased line segment with round caps
    ///
    /// Consecutive segments sharing endpoints form round joins.
    pub fn stroke_segment(&mut self, from: Point, to: Point, width: f32) {
        let radius = width.max(1.0) / 2.0;

        let Some((x0, x1)) = clip_span(from.x.min(to.x) - radius - 1.0, from.x.max(to.x) + radius + 1.0, self.width()) else {
            return;
        };
        let Some((y0, y1)) = clip_span(from.y.min(to.y) - radius - 1.0, from.y.max(to.y) + radius + 1.0, self.height()) else {
            return;
        };

        for y in y0..y1 {
            for x in x0..x1 {
                let center = Point::new(x as f32 + 0.5, y as f32 + 0.5);
                let distance = distance_to_segment(center, from, to);

                // Coverage ramps over one pixel at the edge
                let coverage = (radius + 0.5 - distance).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    blend_ink(self.pixels.get_pixel_mut(x, y), coverage);
                }
            }
        }
    }

    /// Clear a `size` x `size` square centered at `center` to transparent
    pub fn erase_square(&mut self, center: Point, size: f32) {
        let half = size.max(1.0) / 2.0;

        let Some((x0, x1)) = clip_span((center.x - half).round(), (center.x + half).round(), self.width()) else {
            return;
        };
        let Some((y0, y1)) = clip_span((center.y - half).round(), (center.y + half).round(), self.height()) else {
            return;
        };

        for y in y0..y1 {
            for x in x0..x1 {
                self.pixels.put_pixel(x, y, ERASED);
            }
        }
    }

    /// Replace the contents with `image` scaled to fill the surface
    pub fn draw_scaled(&mut self, image: &DynamicImage) {
        let scaled = imageops::resize(
            &image.to_rgba8(),
            self.width(),
            self.height(),
            imageops::FilterType::Triangle,
        );

        self.clear();
        imageops::overlay(&mut self.pixels, &scaled, 0, 0);
    }

    /// Encode the current pixels as PNG
    pub fn to_png(&self) -> Result<Vec<u8>, EncodingError> {
        let mut bytes = Vec::new();
        self.pixels.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// Encode the current pixels as a PNG data URL
    pub fn export_png(&self) -> Result<String, EncodingError> {
        Ok(DataUrl::encode("image/png", &self.to_png()?))
    }
}

/// Clip a floating-point range to `[0, limit)` pixel indices
fn clip_span(start: f32, end: f32, limit: u32) -> Option<(u32, u32)> {
    let start = start.floor().max(0.0);
    let end = end.ceil().min(limit as f32);
    (start < end).then_some((start as u32, end as u32))
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let length_sq = dx * dx + dy * dy;

    let t = if length_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / length_sq).clamp(0.0, 1.0)
    };

    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}

/// Source-over blend of black ink with the given coverage
fn blend_ink(pixel: &mut Rgba<u8>, coverage: f32) {
    let dst_alpha = pixel[3] as f32 / 255.0;
    let out_alpha = coverage + dst_alpha * (1.0 - coverage);
    if out_alpha <= 0.0 {
        return;
    }

    // Ink is black, so only the destination contributes color
    let keep = dst_alpha * (1.0 - coverage) / out_alpha;
    for channel in 0..3 {
        pixel[channel] = (pixel[channel] as f32 * keep).round() as u8;
    }
    pixel[3] = (out_alpha * 255.0).round() as u8;
}
