// THEORY:
// The `variants` module turns a cell's anchor color into the color actually
// painted, one dot at a time. The two streams use entirely different strategies:
//
// - The BRIGHT path stays close to the reference palette. It jitters the anchor
//   either monochromatically (same hue) or analogously (small hue shift), then
//   pushes saturation and value toward their ceilings so every dot reads as
//   vivid and glowing regardless of how muted the source pixel was.
// - The DARK path ignores the reference entirely. It draws from a fixed,
//   weighted family of menacing colors (strong reds, blacks, grays, deep
//   greens), each with its own disjoint saturation/value ranges.
//
// Both generators take the RNG by `&mut impl Rng` so tests can seed them and
// assert on the output distributions deterministically.

use crate::core_modules::color::{Hsv, push_to_100};
use rand::Rng;

// --- Bright color rules ---
const PROB_MONO: f64 = 0.6;
const HUE_SHIFT: f64 = 18.0;
const MONO_S_VARIATION: f64 = 10.0;
const MONO_V_VARIATION: f64 = 18.0;
/// Saturation floor before the vividness push.
const SAT_MIN: f64 = 85.0;
/// Value floor before the glow push.
const BRIGHT_MIN: f64 = 85.0;
/// Fraction of the remaining distance to 100 applied to saturation.
const VIBRANCY: f64 = 0.25;
/// Fraction of the remaining distance to 100 applied to value.
const GLOW: f64 = 0.22;

// --- Dark color rules ---
const DARK_RED_H: f64 = 0.0;
const DARK_GREEN_H: f64 = 120.0;
const DARK_ANALOG_SHIFT: f64 = 14.0;
const DARK_S_LOW: (f64, f64) = (0.0, 12.0);
const DARK_S_RED: (f64, f64) = (70.0, 100.0);
const DARK_S_GREEN: (f64, f64) = (60.0, 100.0);
const DARK_S_GRAY: (f64, f64) = (0.0, 12.0);
const DARK_V_VERYLOW: (f64, f64) = (5.0, 20.0);
const DARK_V_LOW: (f64, f64) = (20.0, 45.0);
const DARK_V_MID: (f64, f64) = (25.0, 55.0);

/// The dark stream's color families, ordered for cumulative-weight sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DarkFamily {
    Red,
    Black,
    Gray,
    Green,
}

const DARK_FAMILY_WEIGHTS: [(DarkFamily, f64); 4] = [
    (DarkFamily::Red, 0.55),
    (DarkFamily::Black, 0.20),
    (DarkFamily::Gray, 0.15),
    (DarkFamily::Green, 0.10),
];

/// Same hue as the anchor, saturation and value jittered within fixed bounds.
fn monochrome(anchor: &Hsv, rng: &mut impl Rng) -> Hsv {
    Hsv::new(
        anchor.h,
        (anchor.s + rng.gen_range(-MONO_S_VARIATION..MONO_S_VARIATION)).clamp(0.0, 100.0),
        (anchor.v + rng.gen_range(-MONO_V_VARIATION..MONO_V_VARIATION)).clamp(0.0, 100.0),
    )
}

/// Hue shifted by a random amount within the analogous band, signed randomly.
fn analogous(anchor: &Hsv, rng: &mut impl Rng) -> Hsv {
    let dir = if rng.gen_bool(0.5) { -1.0 } else { 1.0 };
    let h = (anchor.h + dir * rng.gen_range(6.0..HUE_SHIFT)).rem_euclid(360.0);
    Hsv::new(
        h,
        (anchor.s + rng.gen_range(-8.0..8.0)).clamp(0.0, 100.0),
        (anchor.v + rng.gen_range(-6.0..6.0)).clamp(0.0, 100.0),
    )
}

/// Produces a vivid, glowing variant of the anchor color for the bright stream.
pub fn bright_variant(anchor: &Hsv, rng: &mut impl Rng) -> Hsv {
    let mut col = if rng.gen_bool(PROB_MONO) {
        monochrome(anchor, rng)
    } else {
        analogous(anchor, rng)
    };
    col.s = (push_to_100(col.s.max(SAT_MIN), VIBRANCY) + rng.gen_range(0.0..6.0)).clamp(0.0, 100.0);
    col.v = (push_to_100(col.v.max(BRIGHT_MIN), GLOW) + rng.gen_range(0.0..8.0)).clamp(0.0, 100.0);
    col
}

fn pick_dark_family(rng: &mut impl Rng) -> DarkFamily {
    let r: f64 = rng.gen_range(0.0..1.0);
    let mut acc = 0.0;
    for (family, w) in DARK_FAMILY_WEIGHTS {
        acc += w;
        if r <= acc {
            return family;
        }
    }
    DarkFamily::Red
}

/// Produces a dark-stream color: red, black, gray, or deep green, with red
/// weighted heaviest.
pub fn dark_variant(rng: &mut impl Rng) -> Hsv {
    match pick_dark_family(rng) {
        DarkFamily::Black => Hsv::new(
            0.0,
            rng.gen_range(DARK_S_LOW.0..DARK_S_LOW.1),
            rng.gen_range(DARK_V_VERYLOW.0..DARK_V_VERYLOW.1),
        ),
        DarkFamily::Gray => Hsv::new(
            0.0,
            rng.gen_range(DARK_S_GRAY.0..DARK_S_GRAY.1),
            rng.gen_range(DARK_V_MID.0..DARK_V_MID.1),
        ),
        DarkFamily::Red => Hsv::new(
            (DARK_RED_H + rng.gen_range(-DARK_ANALOG_SHIFT..DARK_ANALOG_SHIFT)).rem_euclid(360.0),
            rng.gen_range(DARK_S_RED.0..DARK_S_RED.1),
            rng.gen_range(DARK_V_MID.0..DARK_V_MID.1),
        ),
        DarkFamily::Green => Hsv::new(
            (DARK_GREEN_H + rng.gen_range(-DARK_ANALOG_SHIFT..DARK_ANALOG_SHIFT)).rem_euclid(360.0),
            rng.gen_range(DARK_S_GREEN.0..DARK_S_GREEN.1),
            rng.gen_range(DARK_V_LOW.0..DARK_V_LOW.1),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::color::hue_dist;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn bright_variants_are_vivid_and_glowing() {
        let mut rng = StdRng::seed_from_u64(42);
        let anchor = Hsv::new(210.0, 20.0, 30.0); // a muted, dim blue
        for _ in 0..500 {
            let col = bright_variant(&anchor, &mut rng);
            // The floor-then-push guarantees both components end well above the
            // anchor's muted levels.
            assert!(col.s >= push_to_100(SAT_MIN, VIBRANCY), "s = {}", col.s);
            assert!(col.v >= push_to_100(BRIGHT_MIN, GLOW), "v = {}", col.v);
            assert!(col.s <= 100.0 && col.v <= 100.0);
        }
    }

    #[test]
    fn bright_variants_stay_near_the_anchor_hue() {
        let mut rng = StdRng::seed_from_u64(43);
        let anchor = Hsv::new(5.0, 90.0, 90.0); // near the hue seam
        for _ in 0..500 {
            let col = bright_variant(&anchor, &mut rng);
            assert!(hue_dist(col.h, anchor.h) < HUE_SHIFT);
            assert!((0.0..360.0).contains(&col.h));
        }
    }

    #[test]
    fn dark_variants_fall_in_their_family_ranges() {
        let mut rng = StdRng::seed_from_u64(44);
        let mut saw_unsaturated = false;
        let mut saw_red = false;
        let mut saw_green = false;
        for _ in 0..2000 {
            let col = dark_variant(&mut rng);
            assert!(col.v < 55.0, "dark variant too bright: {}", col.v);
            if col.s < 12.0 {
                saw_unsaturated = true; // black or gray
            } else if hue_dist(col.h, DARK_RED_H) <= DARK_ANALOG_SHIFT {
                saw_red = true;
                assert!(col.s >= DARK_S_RED.0);
            } else {
                saw_green = true;
                assert!(hue_dist(col.h, DARK_GREEN_H) <= DARK_ANALOG_SHIFT);
                assert!(col.s >= DARK_S_GREEN.0);
                assert!(col.v < DARK_V_LOW.1);
            }
        }
        assert!(saw_unsaturated && saw_red && saw_green);
    }

    #[test]
    fn dark_family_weights_favor_red() {
        let mut rng = StdRng::seed_from_u64(45);
        let mut red = 0u32;
        let n = 4000;
        for _ in 0..n {
            if pick_dark_family(&mut rng) == DarkFamily::Red {
                red += 1;
            }
        }
        let share = red as f64 / n as f64;
        assert!((0.50..0.60).contains(&share), "red share {share}");
    }
}
