// THEORY:
// The `PaintSurface` is the engine's only rendering side-effect target: a
// persistent RGBA accumulator that dots are composited onto and never erased
// except on full reset. It starts as a white canvas and only ever gains paint,
// which is what lets finished shapes keep receiving low-weight dots frames or
// minutes after they completed.
//
// The one primitive the emitter needs is a rotated, alpha-blended, filled
// ellipse. It is rasterized by walking the ellipse's bounding box and testing
// each pixel center in the un-rotated ellipse frame; dots here are a few pixels
// across, so the bounding-box walk is cheap and exact enough.

use crate::core_modules::color::{Hsv, hsv_to_rgb};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use std::path::Path;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// A persistent raster accumulator for dot compositing.
pub struct PaintSurface {
    image: RgbaImage,
}

impl PaintSurface {
    /// Creates a white canvas of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, BACKGROUND),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.image.get_pixel(x, y)
    }

    /// Restores the blank white canvas.
    pub fn clear(&mut self) {
        for px in self.image.pixels_mut() {
            *px = BACKGROUND;
        }
    }

    /// Source-over blend of one pixel. `alpha` is in [0, 1].
    fn blend_pixel(&mut self, x: u32, y: u32, r: u8, g: u8, b: u8, alpha: f64) {
        let px = self.image.get_pixel_mut(x, y);
        px[0] = blend_channel(r, px[0], alpha);
        px[1] = blend_channel(g, px[1], alpha);
        px[2] = blend_channel(b, px[2], alpha);
        // The canvas itself stays opaque.
        px[3] = 255;
    }

    /// Composites a filled ellipse centered at (cx, cy) with radii (rx, ry),
    /// rotated by `rotation` radians, at `alpha_pct` opacity (0..100).
    pub fn fill_ellipse(
        &mut self,
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
        rotation: f64,
        color: &Hsv,
        alpha_pct: f64,
    ) {
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let (r, g, b) = hsv_to_rgb(color);
        let alpha = (alpha_pct / 100.0).clamp(0.0, 1.0);
        if alpha == 0.0 {
            return;
        }

        let (sin, cos) = rotation.sin_cos();
        let extent = rx.max(ry);
        let x_min = ((cx - extent).floor().max(0.0)) as u32;
        let y_min = ((cy - extent).floor().max(0.0)) as u32;
        let x_max = ((cx + extent).ceil().min(self.width() as f64 - 1.0)).max(0.0) as u32;
        let y_max = ((cy + extent).ceil().min(self.height() as f64 - 1.0)).max(0.0) as u32;
        if (cx + extent) < 0.0 || (cy + extent) < 0.0 {
            return;
        }

        for y in y_min..=y_max {
            for x in x_min..=x_max {
                let dx = (x as f64 + 0.5) - cx;
                let dy = (y as f64 + 0.5) - cy;
                // Rotate the sample back into the ellipse's own frame.
                let u = dx * cos + dy * sin;
                let w = -dx * sin + dy * cos;
                if (u / rx).powi(2) + (w / ry).powi(2) <= 1.0 {
                    self.blend_pixel(x, y, r, g, b, alpha);
                }
            }
        }
    }

    /// Exports the accumulated canvas as a PNG.
    pub fn save(&self, path: &Path) -> Result<(), image::error::ImageError> {
        let output = std::fs::File::create(path)?;
        let encoder = PngEncoder::new(output);
        encoder.write_image(
            self.image.as_raw(),
            self.width(),
            self.height(),
            ExtendedColorType::Rgba8,
        )?;
        Ok(())
    }
}

fn blend_channel(src: u8, dst: u8, alpha: f64) -> u8 {
    (src as f64 * alpha + dst as f64 * (1.0 - alpha)).round() as u8
}
