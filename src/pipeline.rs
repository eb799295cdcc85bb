// THEORY:
// The `pipeline` module is the final, top-level API for the painting engine. It
// encapsulates the full stack — sampled palette, reference field, placement,
// paint surface — behind a single `Sketch` that is advanced by an injected
// delta-time, one tick at a time.
//
// Key architectural principles:
// 1.  **One generic stream, instantiated twice**: The bright and dark sequences
//     share one `Stream` state machine parameterized by a ramp policy, a
//     completion-bonus policy, and a color strategy (its `StreamKind`). The
//     only asymmetries — dark's delayed activation and the penalty it applies
//     to bright — live in the completion handlers, where the cross-stream
//     coupling stays explicit and testable.
// 2.  **Time budgets, not dot counts**: Each active stream accrues a fractional
//     dot allowance (`rate * dt`) per tick and emits its integer part, capped
//     per tick so a stall can never freeze the redraw loop. Leftover budget
//     carries over instead of being discarded.
// 3.  **Engineered dominance**: Dark's ramp grows with its own completion
//     count, its per-completion bonus escalates, and every Nth dark completion
//     slows bright. Bright wins early, dark wins eventually; that arc is the
//     piece.
// 4.  **Deterministic under test**: Every stochastic choice draws from an
//     injected `Rng`, so a seeded generator makes a whole run reproducible.

use crate::core_modules::paint_surface::PaintSurface;
use crate::core_modules::palette::Palette;
use crate::core_modules::placement::Placement;
use crate::core_modules::reference_field::ReferenceField;
use crate::core_modules::variants::{bright_variant, dark_variant};
use image::RgbaImage;
use image::imageops::{self, FilterType};
use rand::Rng;
use rand_distr::StandardNormal;
use std::f64::consts::TAU;
use std::path::Path;

/// Step applied to both stream rates by the `[` / `]` debug keys.
const RATE_NUDGE: f64 = 20.0;
/// Where the `s` debug key exports the current canvas.
const SNAPSHOT_PATH: &str = "fauvist-cats.png";

/// Every tunable of the engine. Immutable for the lifetime of a `Sketch`;
/// the defaults are the reference configuration.
#[derive(Debug, Clone)]
pub struct SketchConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Downscale factor from canvas to reference space.
    pub scale: f64,

    // --- Emission rates (dots/second) ---
    pub bright_rate: f64,
    pub dark_rate: f64,
    pub emit_min: f64,
    pub emit_max: f64,
    /// Upper bound on dots emitted per stream per tick; a latency safeguard,
    /// not a rate limit — excess budget carries over.
    pub frame_cap_per_stream: u32,

    // --- Tempo ramps ---
    pub bright_ramp_per_sec: f64,
    pub dark_ramp_per_sec: f64,
    /// Extra dark ramp per already-finished dark shape.
    pub dark_dominance_per_dark: f64,

    // --- Completion bonuses and the cross-stream penalty ---
    pub bright_completion_bonus: f64,
    pub dark_bonus_start: f64,
    pub dark_bonus_step: f64,
    pub bright_penalty_every_dark: u32,
    pub bright_penalty_factor: f64,

    // --- Lifecycle ---
    pub dark_start_after_bright: u32,
    /// Dark activation distance from bright, as a fraction of the hop radius.
    pub dark_separation_factor: f64,
    pub target_dots_per_cell: f64,

    // --- Per-dot allocation and geometry ---
    /// Share of dots aimed at the in-progress shape (the rest go to finished
    /// shapes of the same stream).
    pub new_weight: f64,
    pub circle_prob: f64,
    pub ellipse_ratio: (f64, f64),
    pub fill_alpha: f64,

    // --- Growth of finished shapes ---
    pub old_scale_start: f64,
    pub old_scale_growth_per_sec: f64,
    pub old_scale_max: f64,

    // --- Sampling geometry (pre-scale base values) ---
    pub cell_base: f64,
    pub dot_size_base: (f64, f64),
    pub radius_base: f64,
    pub hop_radius_factor: f64,
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1920,
            canvas_height: 1080,
            scale: 0.25,
            bright_rate: 220.0,
            dark_rate: 220.0,
            emit_min: 180.0,
            emit_max: 20_000.0,
            frame_cap_per_stream: 700,
            bright_ramp_per_sec: 0.035,
            dark_ramp_per_sec: 0.1,
            dark_dominance_per_dark: 0.04,
            bright_completion_bonus: 80.0,
            dark_bonus_start: 160.0,
            dark_bonus_step: 80.0,
            bright_penalty_every_dark: 20,
            bright_penalty_factor: 0.7,
            dark_start_after_bright: 5,
            dark_separation_factor: 0.6,
            target_dots_per_cell: 0.5,
            new_weight: 0.85,
            circle_prob: 0.15,
            ellipse_ratio: (2.0, 5.0),
            fill_alpha: 75.0,
            old_scale_start: 1.10,
            old_scale_growth_per_sec: 0.02,
            old_scale_max: 1.50,
            cell_base: 10.0,
            dot_size_base: (6.0, 22.0),
            radius_base: 8.0,
            hop_radius_factor: 1.9,
        }
    }
}

impl SketchConfig {
    /// Width of the downscaled reference image. Never zero.
    pub fn ref_width(&self) -> u32 {
        ((self.canvas_width as f64 * self.scale).floor() as u32).max(1)
    }

    /// Height of the downscaled reference image. Never zero.
    pub fn ref_height(&self) -> u32 {
        ((self.canvas_height as f64 * self.scale).floor() as u32).max(1)
    }

    /// Sampling stride in reference space.
    pub fn cell_step(&self) -> u32 {
        ((self.cell_base * self.scale).round() as u32).max(3)
    }

    /// Sampling radius, which doubles as the dot jitter scale.
    pub fn sample_radius(&self) -> f64 {
        (self.radius_base * self.scale).round().max(2.0)
    }

    /// Dot size range after downscaling.
    pub fn dot_size(&self) -> (f64, f64) {
        (
            (self.dot_size_base.0 * self.scale * 1.25).max(1.5),
            (self.dot_size_base.1 * self.scale * 1.25).max(3.0),
        )
    }

    /// Nominal hop distance between consecutive shape centers.
    pub fn hop_radius(&self) -> f64 {
        self.ref_width().max(self.ref_height()) as f64 * self.hop_radius_factor
    }
}

/// Which color strategy a stream paints with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Bright,
    Dark,
}

/// How a stream's rate jumps when a shape completes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BonusPolicy {
    /// The same flat increment on every completion.
    Flat(f64),
    /// An increment that grows by `step` after each use (160, 240, 320, ...).
    Escalating { next: f64, step: f64 },
}

impl BonusPolicy {
    fn next_bonus(&mut self) -> f64 {
        match self {
            BonusPolicy::Flat(bonus) => *bonus,
            BonusPolicy::Escalating { next, step } => {
                let bonus = *next;
                *next += *step;
                bonus
            }
        }
    }
}

/// Multiplicative per-second rate growth, optionally compounding with the
/// stream's own completion count.
#[derive(Debug, Clone, Copy)]
pub struct RampPolicy {
    pub base_per_sec: f64,
    pub dominance_per_completion: f64,
}

/// A completed shape, retained for continued low-weight emission and growth.
#[derive(Debug, Clone, Copy)]
pub struct FinishedShape {
    pub cx: f64,
    pub cy: f64,
    /// Monotonically grows from `old_scale_start` to `old_scale_max`.
    pub scale: f64,
}

/// One independent shape-building sequence. Two are instantiated per sketch.
#[derive(Debug, Clone)]
pub struct Stream {
    pub kind: StreamKind,
    pub active: bool,
    /// Canvas-space center of the in-progress shape.
    pub center: (f64, f64),
    /// Dots that targeted the in-progress shape since its last reset.
    pub dots_toward_current: u64,
    pub goal: u64,
    pub completed: u32,
    /// Current emission rate in dots/second.
    pub rate: f64,
    /// Accumulated fractional dot allowance, carried across ticks.
    pub budget: f64,
    pub ramp: RampPolicy,
    pub bonus: BonusPolicy,
    /// Completed shapes, append-only until reset.
    pub finished: Vec<FinishedShape>,
}

impl Stream {
    fn bright(config: &SketchConfig, center: (f64, f64), goal: u64) -> Self {
        Self {
            kind: StreamKind::Bright,
            active: true,
            center,
            dots_toward_current: 0,
            goal,
            completed: 0,
            rate: config.bright_rate,
            budget: 0.0,
            ramp: RampPolicy {
                base_per_sec: config.bright_ramp_per_sec,
                dominance_per_completion: 0.0,
            },
            bonus: BonusPolicy::Flat(config.bright_completion_bonus),
            finished: Vec::new(),
        }
    }

    fn dark(config: &SketchConfig) -> Self {
        Self {
            kind: StreamKind::Dark,
            active: false,
            center: (0.0, 0.0),
            dots_toward_current: 0,
            goal: 1,
            completed: 0,
            rate: config.dark_rate,
            budget: 0.0,
            ramp: RampPolicy {
                base_per_sec: config.dark_ramp_per_sec,
                dominance_per_completion: config.dark_dominance_per_dark,
            },
            bonus: BonusPolicy::Escalating {
                next: config.dark_bonus_start,
                step: config.dark_bonus_step,
            },
            finished: Vec::new(),
        }
    }

    /// Applies the multiplicative tempo ramp for an elapsed `dt` seconds.
    fn ramp_tick(&mut self, dt: f64, min: f64, max: f64) {
        if !self.active {
            return;
        }
        let ramp_now = self.ramp.base_per_sec + self.ramp.dominance_per_completion * self.completed as f64;
        self.rate = (self.rate * (1.0 + ramp_now * dt)).clamp(min, max);
    }

    fn accrue(&mut self, dt: f64) {
        if self.active {
            self.budget += self.rate * dt;
        }
    }

    /// Takes this tick's emission count: the integer part of the budget, capped.
    /// The taken amount is subtracted; the fractional remainder carries over.
    fn drain(&mut self, frame_cap: u32) -> u32 {
        if !self.active {
            return 0;
        }
        let n = (self.budget.floor() as u64).min(frame_cap as u64) as u32;
        self.budget -= n as f64;
        n
    }
}

/// The painting engine: all mutable simulation state plus the immutable
/// sampled basis it draws from.
pub struct Sketch {
    config: SketchConfig,
    palette: Palette,
    field: ReferenceField,
    placement: Placement,
    surface: PaintSurface,
    bright: Stream,
    dark: Stream,
    running: bool,
}

impl Sketch {
    /// Builds the palette and reference field from `reference` (downscaled to
    /// the configured reference size) and starts the bright stream at a random
    /// valid center. The dark stream starts inactive.
    pub fn new(config: SketchConfig, reference: &RgbaImage, rng: &mut impl Rng) -> Self {
        let scaled = imageops::resize(
            reference,
            config.ref_width(),
            config.ref_height(),
            FilterType::Nearest,
        );
        let palette = Palette::build(&scaled, config.cell_step());
        let field = ReferenceField::build(&scaled, &palette, config.cell_step(), config.sample_radius());
        let placement = Placement::new(
            config.canvas_width as f64,
            config.canvas_height as f64,
            field.width as f64,
            field.height as f64,
            config.hop_radius(),
        );
        let surface = PaintSurface::new(config.canvas_width, config.canvas_height);

        let goal = goal_for(&field, &config);
        let bright = Stream::bright(&config, placement.random_valid_center(rng), goal);
        let dark = Stream::dark(&config);
        log::info!(
            "bright #1 started: goal {} dots over {} cells, palette of {} hues",
            goal,
            field.cells().len(),
            palette.len()
        );

        Self {
            config,
            palette,
            field,
            placement,
            surface,
            bright,
            dark,
            running: true,
        }
    }

    pub fn surface(&self) -> &PaintSurface {
        &self.surface
    }

    pub fn bright(&self) -> &Stream {
        &self.bright
    }

    pub fn dark(&self) -> &Stream {
        &self.dark
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advances the simulation by `dt` seconds: ramp rates, grow finished
    /// shapes, accrue budgets, emit capped dot batches, and handle any
    /// completions. A no-op while paused.
    pub fn tick(&mut self, dt: f64, rng: &mut impl Rng) {
        if !self.running {
            return;
        }

        let (min, max) = (self.config.emit_min, self.config.emit_max);
        self.bright.ramp_tick(dt, min, max);
        self.dark.ramp_tick(dt, min, max);

        let growth = self.config.old_scale_growth_per_sec * dt;
        for shape in self.bright.finished.iter_mut().chain(self.dark.finished.iter_mut()) {
            shape.scale = (shape.scale + growth).min(self.config.old_scale_max);
        }

        self.bright.accrue(dt);
        self.dark.accrue(dt);

        let cap = self.config.frame_cap_per_stream;

        let n = self.bright.drain(cap);
        if n > 0 {
            let to_current =
                emit_dots(&mut self.surface, &self.field, &self.config, &self.bright, n, rng);
            self.bright.dots_toward_current += to_current;
            if self.bright.dots_toward_current >= self.bright.goal {
                self.on_bright_complete(rng);
            }
        }

        let n = self.dark.drain(cap);
        if n > 0 {
            let to_current =
                emit_dots(&mut self.surface, &self.field, &self.config, &self.dark, n, rng);
            self.dark.dots_toward_current += to_current;
            if self.dark.dots_toward_current >= self.dark.goal {
                self.on_dark_complete(rng);
            }
        }
    }

    fn on_bright_complete(&mut self, rng: &mut impl Rng) {
        let center = self.bright.center;
        self.bright.finished.push(FinishedShape {
            cx: center.0,
            cy: center.1,
            scale: self.config.old_scale_start,
        });
        let bonus = self.bright.bonus.next_bonus();
        self.bright.rate = (self.bright.rate + bonus).min(self.config.emit_max);
        self.bright.completed += 1;
        log::info!(
            "bright #{} done; rate -> {:.0} dots/s",
            self.bright.completed,
            self.bright.rate
        );

        if !self.dark.active && self.bright.completed >= self.config.dark_start_after_bright {
            let min_dist = self.config.hop_radius() * self.config.dark_separation_factor;
            let spawn =
                self.placement
                    .random_valid_center_separated(center.0, center.1, min_dist, rng);
            self.activate_dark(spawn);
        }

        self.bright.center = self.placement.hop_from(center.0, center.1, rng);
        self.bright.dots_toward_current = 0;
        self.bright.goal = goal_for(&self.field, &self.config);
    }

    fn activate_dark(&mut self, center: (f64, f64)) {
        self.dark.active = true;
        self.dark.center = center;
        self.dark.dots_toward_current = 0;
        self.dark.goal = goal_for(&self.field, &self.config);
        self.dark.bonus = BonusPolicy::Escalating {
            next: self.config.dark_bonus_start,
            step: self.config.dark_bonus_step,
        };
        // Dropped so the budget accrued while inactive cannot burst out now.
        self.dark.budget = 0.0;
        log::info!(
            "dark stream activated at ({:.0}, {:.0}); goal {}",
            center.0,
            center.1,
            self.dark.goal
        );
    }

    fn on_dark_complete(&mut self, rng: &mut impl Rng) {
        let center = self.dark.center;
        self.dark.finished.push(FinishedShape {
            cx: center.0,
            cy: center.1,
            scale: self.config.old_scale_start,
        });
        let bonus = self.dark.bonus.next_bonus();
        self.dark.rate = (self.dark.rate + bonus).min(self.config.emit_max);
        self.dark.completed += 1;
        log::info!(
            "dark #{} done; rate -> {:.0} dots/s (+{:.0})",
            self.dark.completed,
            self.dark.rate,
            bonus
        );

        if self.config.bright_penalty_every_dark != 0
            && self.dark.completed % self.config.bright_penalty_every_dark == 0
        {
            self.bright.rate =
                (self.bright.rate * self.config.bright_penalty_factor).max(self.config.emit_min);
            log::info!(
                "bright penalized after {} dark shapes; rate -> {:.0} dots/s",
                self.dark.completed,
                self.bright.rate
            );
        }

        self.dark.center = self.placement.hop_from(center.0, center.1, rng);
        self.dark.dots_toward_current = 0;
        self.dark.goal = goal_for(&self.field, &self.config);
    }

    /// Reinitializes all mutable state: clears the canvas and restarts both
    /// streams from the initial configuration.
    pub fn reset(&mut self, rng: &mut impl Rng) {
        self.surface.clear();
        let goal = goal_for(&self.field, &self.config);
        self.bright = Stream::bright(&self.config, self.placement.random_valid_center(rng), goal);
        self.dark = Stream::dark(&self.config);
        log::info!("reset; bright #1 started with goal {goal}");
    }

    /// The debug control surface: space pauses/resumes, `s` exports a
    /// snapshot, `r` resets, `[` / `]` nudge both stream rates.
    pub fn handle_key(
        &mut self,
        key: char,
        rng: &mut impl Rng,
    ) -> Result<(), image::error::ImageError> {
        match key {
            ' ' => self.running = !self.running,
            's' | 'S' => self.surface.save(Path::new(SNAPSHOT_PATH))?,
            'r' | 'R' => self.reset(rng),
            '[' => {
                self.bright.rate = (self.bright.rate - RATE_NUDGE).max(self.config.emit_min);
                self.dark.rate = (self.dark.rate - RATE_NUDGE).max(self.config.emit_min);
            }
            ']' => {
                self.bright.rate = (self.bright.rate + RATE_NUDGE).min(self.config.emit_max);
                self.dark.rate = (self.dark.rate + RATE_NUDGE).min(self.config.emit_max);
            }
            _ => {}
        }
        Ok(())
    }
}

/// Dots required to complete a shape. Floored at 1 so a degenerate field can
/// never produce an unreachable goal.
fn goal_for(field: &ReferenceField, config: &SketchConfig) -> u64 {
    ((field.cells().len() as f64 * config.target_dots_per_cell).ceil() as u64).max(1)
}

/// Emits `count` dots for one stream onto the paint surface and returns how
/// many of them targeted the in-progress shape (only those advance the goal).
fn emit_dots(
    surface: &mut PaintSurface,
    field: &ReferenceField,
    config: &SketchConfig,
    stream: &Stream,
    count: u32,
    rng: &mut impl Rng,
) -> u64 {
    let (dot_lo, dot_hi) = config.dot_size();
    let mut to_current = 0u64;

    for _ in 0..count {
        // Allocation within the stream: the in-progress shape by weight, or a
        // uniformly random finished shape. With nothing finished yet, always
        // the in-progress shape.
        let use_current = stream.finished.is_empty() || rng.gen_bool(config.new_weight);
        let (cx, cy, scale) = if use_current {
            (stream.center.0, stream.center.1, 1.0)
        } else {
            let shape = &stream.finished[rng.gen_range(0..stream.finished.len())];
            (shape.cx, shape.cy, shape.scale)
        };

        let Some(cell) = field.random_cell(rng) else {
            // A field with no opaque samples has nothing to paint, but the
            // allocation still advances the goal so the lifecycle cannot stall.
            if use_current {
                to_current += 1;
            }
            continue;
        };

        let color = match stream.kind {
            StreamKind::Dark => dark_variant(rng),
            StreamKind::Bright => bright_variant(&cell.anchor, rng),
        };

        // Reference space -> canvas space, centered on the draw target.
        let sigma = field.sample_radius * 0.5;
        let jitter_x: f64 = rng.sample::<f64, _>(StandardNormal) * sigma * scale;
        let jitter_y: f64 = rng.sample::<f64, _>(StandardNormal) * sigma * scale;
        let x = cx - (field.width as f64 * scale) / 2.0 + cell.x as f64 * scale + jitter_x;
        let y = cy - (field.height as f64 * scale) / 2.0 + cell.y as f64 * scale + jitter_y;

        // Darker reference pixels get larger dots (0.9x..1.35x).
        let darkness = (100.0 - cell.base.v) / 100.0;
        let size = rng.gen_range(dot_lo..dot_hi) * (0.9 + darkness * 0.45) * scale;

        let ratio = if rng.gen_bool(config.circle_prob) {
            1.0
        } else {
            rng.gen_range(config.ellipse_ratio.0..config.ellipse_ratio.1)
        };
        let rotation = rng.gen_range(0.0..TAU);
        surface.fill_ellipse(
            x,
            y,
            size * ratio / 2.0,
            size / 2.0,
            rotation,
            &color,
            config.fill_alpha,
        );

        if use_current {
            to_current += 1;
        }
    }

    to_current
}
