// THEORY:
// The `color` module is the most fundamental unit of the painting engine. It is a
// "dumb" data container for a single HSV color plus the handful of scalar
// transforms every other module builds on. Anything that needs randomness
// (variant generation) or neighboring samples (palette binning) belongs in the
// higher-level modules; everything here is a pure function of its arguments.
//
// Key architectural principles:
// 1.  **One color space**: The entire engine reasons in HSV (hue 0..360,
//     saturation and value 0..100). RGB appears only at the two boundaries:
//     sampling the reference image and compositing onto the paint surface.
// 2.  **Circular hue**: Hue is an angle. `hue_dist` is the only correct way to
//     compare two hues; naive subtraction breaks at the 0/360 seam.
// 3.  **Undefined hue is zero**: When chroma is zero (grays), hue carries no
//     information and is pinned to 0 so downstream binning stays total.

pub type Hue = f64;

/// A color in HSV space: h in [0, 360), s and v in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

impl Hsv {
    pub fn new(h: f64, s: f64, v: f64) -> Self {
        Self { h, s, v }
    }
}

/// Converts 8-bit RGB channels to HSV. Hue is 0 when chroma is zero.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let r = r as f64 / 255.0;
    let g = g as f64 / 255.0;
    let b = b as f64 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let chroma = max - min;

    let mut h = 0.0;
    if chroma != 0.0 {
        h = if max == r {
            ((g - b) / chroma) % 6.0
        } else if max == g {
            (b - r) / chroma + 2.0
        } else {
            (r - g) / chroma + 4.0
        };
        h *= 60.0;
        if h < 0.0 {
            h += 360.0;
        }
    }
    let s = if max == 0.0 { 0.0 } else { chroma / max };
    Hsv::new(h, s * 100.0, max * 100.0)
}

/// Converts an HSV color back to 8-bit RGB channels for compositing.
pub fn hsv_to_rgb(color: &Hsv) -> (u8, u8, u8) {
    let h = color.h.rem_euclid(360.0);
    let s = (color.s / 100.0).clamp(0.0, 1.0);
    let v = (color.v / 100.0).clamp(0.0, 1.0);

    let chroma = v * s;
    let hp = h / 60.0;
    let x = chroma * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = v - chroma;
    (
        ((r1 + m) * 255.0).round() as u8,
        ((g1 + m) * 255.0).round() as u8,
        ((b1 + m) * 255.0).round() as u8,
    )
}

/// Circular distance between two hues in degrees. Always in [0, 180].
pub fn hue_dist(a: Hue, b: Hue) -> f64 {
    let d = (a - b).abs() % 360.0;
    if d > 180.0 { 360.0 - d } else { d }
}

/// Pulls a 0..100 component toward 100 by the fraction `k` in [0, 1].
/// Used to make bright dots vivid (saturation) and glowing (value).
pub fn push_to_100(v: f64, k: f64) -> f64 {
    v + (100.0 - v) * k
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hue_dist_is_symmetric_and_bounded() {
        let hues = [0.0, 1.0, 45.0, 90.0, 179.0, 180.0, 181.0, 270.0, 359.0];
        for &a in &hues {
            for &b in &hues {
                let d = hue_dist(a, b);
                assert_eq!(d, hue_dist(b, a), "symmetry failed for ({a}, {b})");
                assert!((0.0..=180.0).contains(&d), "out of range for ({a}, {b}): {d}");
            }
        }
    }

    #[test]
    fn hue_dist_wraps_around_the_seam() {
        assert_eq!(hue_dist(359.0, 1.0), 2.0);
        assert_eq!(hue_dist(0.0, 180.0), 180.0);
        assert_eq!(hue_dist(10.0, 350.0), 20.0);
    }

    #[test]
    fn rgb_to_hsv_fixed_points() {
        let red = rgb_to_hsv(255, 0, 0);
        assert_eq!(red.h, 0.0);
        assert_eq!(red.s, 100.0);
        assert_eq!(red.v, 100.0);

        let black = rgb_to_hsv(0, 0, 0);
        assert_eq!(black.s, 0.0);
        assert_eq!(black.v, 0.0);
        assert_eq!(black.h, 0.0); // hue is undefined, pinned to 0

        let white = rgb_to_hsv(255, 255, 255);
        assert_eq!(white.s, 0.0);
        assert_eq!(white.v, 100.0);

        let green = rgb_to_hsv(0, 255, 0);
        assert_eq!(green.h, 120.0);
        let blue = rgb_to_hsv(0, 0, 255);
        assert_eq!(blue.h, 240.0);
    }

    #[test]
    fn hsv_to_rgb_round_trips_primaries() {
        for (r, g, b) in [(255, 0, 0), (0, 255, 0), (0, 0, 255), (255, 255, 255), (0, 0, 0)] {
            let hsv = rgb_to_hsv(r, g, b);
            assert_eq!(hsv_to_rgb(&hsv), (r, g, b));
        }
    }

    #[test]
    fn push_to_100_moves_toward_the_ceiling() {
        assert_eq!(push_to_100(100.0, 0.5), 100.0);
        assert_eq!(push_to_100(0.0, 1.0), 100.0);
        let pushed = push_to_100(85.0, 0.25);
        assert!(pushed > 85.0 && pushed < 100.0);
    }
}
