// The leaf components of the painting engine, ordered roughly by dependency:
// color math first, then the sampled palette and reference field built from it,
// then the per-dot color variant generators, and finally the two side-effect
// surfaces (the persistent paint accumulator and the placement helper that keeps
// shape centers inside the canvas).

pub mod color;
pub mod palette;
pub mod paint_surface;
pub mod placement;
pub mod reference_field;
pub mod variants;
