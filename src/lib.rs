// THEORY:
// This file is the main entry point for the `fauvist-cats` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers (like the headless runner binary
// or an interactive front end).
//
// The primary goal is to export the `Sketch` and its associated data structures
// (`SketchConfig`, `Stream`, `FinishedShape`) as the clean, high-level interface
// for the entire painting engine. The internal building blocks (`core_modules`)
// are kept public as well, since the palette builder, reference field, and paint
// surface are useful on their own for tooling and tests.

pub mod core_modules;
pub mod pipeline;

pub use pipeline::{Sketch, SketchConfig};
