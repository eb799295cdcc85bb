// THEORY:
// The `Palette` is the engine's learned summary of the reference image's color
// identity. Rather than painting with the exact pixel colors (which would just
// reproduce the image), the engine snaps every sampled color to a small set of
// representative hues, which is what gives the output its flat, poster-like
// Fauvist quality.
//
// Key architectural principles:
// 1.  **Hue binning**: The hue circle is divided into a fixed number of bins.
//     Every opaque sample contributes its full HSV value to its bin, and each
//     qualifying bin collapses to the mean of its members.
// 2.  **Population filter**: Bins need a minimum number of samples to qualify,
//     so a few stray anti-aliased edge pixels cannot inject a phantom hue into
//     the palette.
// 3.  **Graceful degradation**: A tiny or washed-out reference image may leave
//     no bin above the threshold. The builder then falls back to the most
//     populated non-empty bins so the palette is never silently empty when any
//     opaque pixel exists at all.

use crate::core_modules::color::{Hsv, hue_dist, rgb_to_hsv};
use image::RgbaImage;

/// Number of hue bins the palette builder aggregates samples into.
pub const PALETTE_H_BINS: usize = 18;
/// Minimum samples a bin needs before it qualifies as a palette entry.
pub const PALETTE_MIN_COUNT: u32 = 30;
/// When no bin qualifies, fall back to at most this many of the fullest bins.
const FALLBACK_BIN_LIMIT: usize = 6;

#[derive(Debug, Clone, Copy, Default)]
struct Bin {
    h: f64,
    s: f64,
    v: f64,
    n: u32,
}

impl Bin {
    fn mean(&self) -> Hsv {
        let n = self.n as f64;
        Hsv::new((self.h / n).rem_euclid(360.0), self.s / n, self.v / n)
    }
}

/// An ordered set of hue-bin aggregate colors. Immutable after construction.
#[derive(Debug, Clone)]
pub struct Palette {
    entries: Vec<Hsv>,
}

impl Palette {
    /// Builds a palette from the reference image by scanning it on a fixed
    /// stride and accumulating the HSV of every opaque sample into hue bins.
    pub fn build(image: &RgbaImage, cell_step: u32) -> Self {
        let step = cell_step.max(1);
        let mut bins = [Bin::default(); PALETTE_H_BINS];

        for y in (0..image.height()).step_by(step as usize) {
            for x in (0..image.width()).step_by(step as usize) {
                let px = image.get_pixel(x, y);
                if px[3] == 0 {
                    continue;
                }
                let hsv = rgb_to_hsv(px[0], px[1], px[2]);
                let idx = ((hsv.h / 360.0) * PALETTE_H_BINS as f64) as usize % PALETTE_H_BINS;
                let bin = &mut bins[idx];
                bin.h += hsv.h;
                bin.s += hsv.s;
                bin.v += hsv.v;
                bin.n += 1;
            }
        }

        let mut entries: Vec<Hsv> = bins
            .iter()
            .filter(|b| b.n >= PALETTE_MIN_COUNT)
            .map(Bin::mean)
            .collect();

        if entries.is_empty() {
            // Fallback: take the fullest non-empty bins instead.
            let mut by_population: Vec<&Bin> = bins.iter().filter(|b| b.n > 0).collect();
            by_population.sort_by(|a, b| b.n.cmp(&a.n));
            entries = by_population
                .into_iter()
                .take(FALLBACK_BIN_LIMIT)
                .map(Bin::mean)
                .collect();
        }

        Self { entries }
    }

    /// Returns the palette entry with the smallest circular hue distance to
    /// `color`, or `None` if the palette is empty.
    pub fn nearest_by_hue(&self, color: &Hsv) -> Option<&Hsv> {
        self.entries
            .iter()
            .min_by(|a, b| hue_dist(color.h, a.h).total_cmp(&hue_dist(color.h, b.h)))
    }

    pub fn entries(&self) -> &[Hsv] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid_image(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(rgba))
    }

    #[test]
    fn solid_image_yields_single_entry() {
        let img = solid_image(64, 64, [255, 0, 0, 255]);
        let palette = Palette::build(&img, 1);
        assert_eq!(palette.len(), 1);
        let entry = palette.entries()[0];
        assert_eq!(entry.h, 0.0);
        assert_eq!(entry.s, 100.0);
        assert_eq!(entry.v, 100.0);
    }

    #[test]
    fn transparent_pixels_are_skipped() {
        let img = solid_image(64, 64, [255, 0, 0, 0]);
        let palette = Palette::build(&img, 1);
        assert!(palette.is_empty());
        assert!(palette.nearest_by_hue(&Hsv::new(0.0, 50.0, 50.0)).is_none());
    }

    #[test]
    fn sparse_image_falls_back_to_fullest_bins() {
        // Too few samples for any bin to reach PALETTE_MIN_COUNT, but the
        // fallback should still surface the populated bins.
        let mut img = solid_image(8, 8, [0, 0, 0, 0]);
        for x in 0..4 {
            img.put_pixel(x, 0, Rgba([0, 0, 255, 255]));
        }
        let palette = Palette::build(&img, 1);
        assert_eq!(palette.len(), 1);
        assert_eq!(palette.entries()[0].h, 240.0);
    }

    #[test]
    fn nearest_by_hue_respects_circular_distance() {
        let mut img = solid_image(64, 64, [255, 0, 0, 255]); // hue 0
        for y in 0..64 {
            for x in 0..32 {
                img.put_pixel(x, y, Rgba([0, 255, 0, 255])); // hue 120
            }
        }
        let palette = Palette::build(&img, 1);
        assert_eq!(palette.len(), 2);

        // Hue 350 is 10 degrees from red across the seam, 130 from green.
        let near_red = palette.nearest_by_hue(&Hsv::new(350.0, 80.0, 80.0)).unwrap();
        assert_eq!(near_red.h, 0.0);
        let near_green = palette.nearest_by_hue(&Hsv::new(100.0, 80.0, 80.0)).unwrap();
        assert_eq!(near_green.h, 120.0);
    }
}
