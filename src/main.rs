// Headless runner for the painting engine: loads the reference image, drives
// the simulation at a fixed 60 Hz timestep for the requested duration, and
// exports the accumulated canvas as a PNG. An interactive front end would
// instead forward key events to `Sketch::handle_key` and blit the surface
// every tick; the engine itself is identical either way.

use anyhow::{Context, Result};
use fauvist_cats::{Sketch, SketchConfig};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::env;
use std::path::PathBuf;

const TICK_RATE_HZ: f64 = 60.0;

fn main() -> Result<()> {
    env_logger::init();

    // --- 1. Argument parsing ---
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Usage: fauvist-cats <reference_image> [output.png] [seconds] [seed]");
        return Ok(());
    }
    let reference_path = &args[1];
    let output_path = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("fauvist-cats.png"));
    let seconds: f64 = args
        .get(3)
        .map(|s| s.parse())
        .transpose()
        .context("duration must be a number of seconds")?
        .unwrap_or(60.0);
    let seed: Option<u64> = args
        .get(4)
        .map(|s| s.parse())
        .transpose()
        .context("seed must be an integer")?;

    // --- 2. Reference image: fatal when missing, nothing can be sampled ---
    let reference = image::open(reference_path)
        .with_context(|| format!("failed to load reference image '{reference_path}'"))?
        .to_rgba8();

    // --- 3. Engine setup ---
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let mut sketch = Sketch::new(SketchConfig::default(), &reference, &mut rng);

    // --- 4. Fixed-timestep simulation ---
    let dt = 1.0 / TICK_RATE_HZ;
    let ticks = (seconds * TICK_RATE_HZ).ceil() as u64;
    for _ in 0..ticks {
        sketch.tick(dt, &mut rng);
    }

    // --- 5. Export ---
    sketch
        .surface()
        .save(&output_path)
        .with_context(|| format!("failed to export '{}'", output_path.display()))?;
    log::info!(
        "rendered {seconds:.1}s of painting: {} bright / {} dark shapes finished -> {}",
        sketch.bright().completed,
        sketch.dark().completed,
        output_path.display()
    );
    Ok(())
}
