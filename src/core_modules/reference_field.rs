// THEORY:
// The `ReferenceField` is the discrete canvas both streams paint onto. It is a
// fixed grid of sampled cells derived from the opaque pixels of the downscaled
// reference image; every emitted dot's position and base coloring originates
// from one randomly chosen cell. Like the palette, it is built once at setup
// and never mutated — the streams own all runtime state, the field owns none.
//
// Key architectural principles:
// 1.  **Opaque-only sampling**: Transparent pixels are the background around the
//     silhouette; skipping them is what makes the dot cloud take the shape of
//     the subject instead of filling the whole rectangle.
// 2.  **Anchor precomputation**: Each cell stores both its raw sampled color and
//     its nearest palette hue. Snapping is done once here rather than per dot,
//     since the field and palette are both immutable.

use crate::core_modules::color::{Hsv, rgb_to_hsv};
use crate::core_modules::palette::Palette;
use image::RgbaImage;
use rand::Rng;

/// One sampled point of the reference image.
#[derive(Debug, Clone, Copy)]
pub struct Cell {
    /// Column of the sample in reference space.
    pub x: u32,
    /// Row of the sample in reference space.
    pub y: u32,
    /// The HSV color sampled from the reference image at (x, y).
    pub base: Hsv,
    /// The nearest palette entry by hue; equals `base` when the palette is empty.
    pub anchor: Hsv,
}

/// The immutable grid of sampled (position, color) cells.
#[derive(Debug, Clone)]
pub struct ReferenceField {
    /// Width of the downscaled reference image in pixels.
    pub width: u32,
    /// Height of the downscaled reference image in pixels.
    pub height: u32,
    /// Stride used for the sample scan.
    pub cell_step: u32,
    /// Sampling radius, used downstream as the Gaussian jitter scale.
    pub sample_radius: f64,
    cells: Vec<Cell>,
}

impl ReferenceField {
    /// Scans the downscaled reference image on a fixed stride and stores a cell
    /// for every opaque pixel.
    pub fn build(image: &RgbaImage, palette: &Palette, cell_step: u32, sample_radius: f64) -> Self {
        let step = cell_step.max(1);
        let mut cells = Vec::new();

        for y in (0..image.height()).step_by(step as usize) {
            for x in (0..image.width()).step_by(step as usize) {
                let px = image.get_pixel(x, y);
                if px[3] == 0 {
                    continue;
                }
                let base = rgb_to_hsv(px[0], px[1], px[2]);
                let anchor = palette.nearest_by_hue(&base).copied().unwrap_or(base);
                cells.push(Cell { x, y, base, anchor });
            }
        }

        Self {
            width: image.width(),
            height: image.height(),
            cell_step: step,
            sample_radius,
            cells,
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Picks a uniformly random cell, or `None` when the field has no cells
    /// (fully transparent source). Callers must never index the cell list
    /// directly, so an empty field can never panic the emitter.
    pub fn random_cell(&self, rng: &mut impl Rng) -> Option<&Cell> {
        if self.cells.is_empty() {
            return None;
        }
        Some(&self.cells[rng.gen_range(0..self.cells.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn only_opaque_pixels_become_cells() {
        let mut img = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 0]));
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(5, 5, Rgba([0, 255, 0, 255]));
        img.put_pixel(6, 6, Rgba([0, 0, 255, 128])); // off-stride for step 5

        let palette = Palette::build(&img, 5);
        let field = ReferenceField::build(&img, &palette, 5, 2.0);
        assert_eq!(field.cells().len(), 2);
        assert_eq!(field.cells()[0].base.h, 0.0);
        assert_eq!(field.cells()[1].base.h, 120.0);
    }

    #[test]
    fn anchor_falls_back_to_base_on_empty_palette() {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        img.put_pixel(0, 0, Rgba([0, 0, 255, 255]));

        let empty_palette = Palette::build(&RgbaImage::new(1, 1), 1);
        assert!(empty_palette.is_empty());
        let field = ReferenceField::build(&img, &empty_palette, 1, 2.0);
        assert_eq!(field.cells().len(), 1);
        assert_eq!(field.cells()[0].anchor, field.cells()[0].base);
    }

    #[test]
    fn random_cell_on_empty_field_is_none() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        let palette = Palette::build(&img, 1);
        let field = ReferenceField::build(&img, &palette, 1, 2.0);
        let mut rng = StdRng::seed_from_u64(7);
        assert!(field.is_empty());
        assert!(field.random_cell(&mut rng).is_none());
    }
}
