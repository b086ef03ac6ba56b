use std::f64::consts::TAU;

use image::GrayImage;
use rand::{Rng, seq::SliceRandom};

use crate::{
    foundation::core::{Canvas, PixelRect},
    foundation::error::{MmnistError, MmnistResult},
    motion::bounce::BounceGate,
    source::sprite::{Sprite, bright_bounds},
};

/// Discrete parameter sets a [`Digit`] draws its motion from.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DigitConfig {
    /// Candidate base edge lengths in pixels.
    pub sizes: Vec<u32>,
    /// Candidate oscillation period factors (period = `fps * factor` ticks).
    pub oscillations: Vec<f64>,
    /// Candidate oscillation amplitudes, as a fraction of the base size.
    pub oscillation_variances: Vec<f64>,
    /// Ticks per second; one tick advances the position by `velocity / fps`.
    pub fps: f64,
    /// Scale applied to the velocity drawn from `[-1, 1]`.
    pub velocity: f64,
}

impl Default for DigitConfig {
    fn default() -> Self {
        Self {
            sizes: vec![24, 40, 72],
            oscillations: vec![1.0, 1.5, 2.0],
            oscillation_variances: vec![0.0, 0.1, 0.2, 0.3],
            fps: 10.0,
            velocity: 1.0,
        }
    }
}

impl DigitConfig {
    pub fn validate(&self) -> MmnistResult<()> {
        if self.sizes.is_empty() || self.sizes.contains(&0) {
            return Err(MmnistError::validation(
                "digit sizes must be non-empty and non-zero",
            ));
        }
        if self.oscillations.is_empty()
            || self
                .oscillations
                .iter()
                .any(|f| !f.is_finite() || *f <= 0.0)
        {
            return Err(MmnistError::validation(
                "oscillation period factors must be non-empty and > 0",
            ));
        }
        if self.oscillation_variances.is_empty()
            || self
                .oscillation_variances
                .iter()
                .any(|v| !(0.0..1.0).contains(v))
        {
            return Err(MmnistError::validation(
                "oscillation variances must be non-empty and within [0, 1)",
            ));
        }
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(MmnistError::validation("fps must be > 0"));
        }
        if !self.velocity.is_finite() || self.velocity < 0.0 {
            return Err(MmnistError::validation("velocity scale must be >= 0"));
        }
        Ok(())
    }
}

/// Size oscillation parameters, fixed for the lifetime of a digit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Oscillation {
    pub size_base: u32,
    pub period_factor: f64,
    pub variance: f64,
}

/// One animated digit sprite.
///
/// Position is the sprite center in canvas-normalized coordinates and is allowed to leave
/// `[0, 1]`; rendering simply places the sprite wherever it is. Size is derived from the tick
/// count on every access and never cached.
#[derive(Clone, Debug)]
pub struct Digit {
    sprite: Sprite,
    canvas: Canvas,
    fps: f64,
    osc: Oscillation,
    x: f64,
    y: f64,
    vel_x: f64,
    vel_y: f64,
    t: u64,
    gate_x: BounceGate,
    gate_y: BounceGate,
}

impl Digit {
    /// Draw size, oscillation, position and velocity from `cfg` using `rng`.
    ///
    /// Fails with [`MmnistError::EmptySprite`] when the source has no bright pixel.
    pub fn random<R: Rng + ?Sized>(
        sprite: Sprite,
        canvas: Canvas,
        cfg: &DigitConfig,
        rng: &mut R,
    ) -> MmnistResult<Self> {
        let size_base = *cfg
            .sizes
            .choose(rng)
            .ok_or_else(|| MmnistError::validation("digit sizes must be non-empty"))?;
        let period_factor = *cfg
            .oscillations
            .choose(rng)
            .ok_or_else(|| MmnistError::validation("oscillations must be non-empty"))?;
        let variance = *cfg
            .oscillation_variances
            .choose(rng)
            .ok_or_else(|| MmnistError::validation("oscillation variances must be non-empty"))?;

        let x = sample_within_margin(rng, margin(size_base, canvas.width));
        let y = sample_within_margin(rng, margin(size_base, canvas.height));
        let vel_x = rng.gen_range(-1.0..=1.0) * cfg.velocity;
        let vel_y = rng.gen_range(-1.0..=1.0) * cfg.velocity;

        Self::with_state(
            sprite,
            canvas,
            Oscillation {
                size_base,
                period_factor,
                variance,
            },
            cfg.fps,
            [x, y],
            [vel_x, vel_y],
        )
    }

    /// Build a digit with an explicit initial state at tick 0.
    pub fn with_state(
        sprite: Sprite,
        canvas: Canvas,
        osc: Oscillation,
        fps: f64,
        position: [f64; 2],
        velocity: [f64; 2],
    ) -> MmnistResult<Self> {
        if !sprite.has_content() {
            return Err(MmnistError::EmptySprite {
                label: sprite.label(),
            });
        }
        if osc.size_base == 0 {
            return Err(MmnistError::validation("digit base size must be non-zero"));
        }
        if !fps.is_finite() || fps <= 0.0 {
            return Err(MmnistError::validation("fps must be > 0"));
        }
        Ok(Self {
            sprite,
            canvas,
            fps,
            osc,
            x: position[0],
            y: position[1],
            vel_x: velocity[0],
            vel_y: velocity[1],
            t: 0,
            gate_x: BounceGate::default(),
            gate_y: BounceGate::default(),
        })
    }

    pub fn label(&self) -> u8 {
        self.sprite.label()
    }

    pub fn sprite(&self) -> &Sprite {
        &self.sprite
    }

    pub fn oscillation(&self) -> Oscillation {
        self.osc
    }

    pub fn tick(&self) -> u64 {
        self.t
    }

    pub fn position(&self) -> [f64; 2] {
        [self.x, self.y]
    }

    pub fn velocity(&self) -> [f64; 2] {
        [self.vel_x, self.vel_y]
    }

    /// Out-of-bounds checks counted in the current debounce window, per axis.
    pub fn bounce_checks(&self) -> [u32; 2] {
        [self.gate_x.checks(), self.gate_y.checks()]
    }

    /// Oscillation period in ticks.
    pub fn period_ticks(&self) -> f64 {
        self.fps * self.osc.period_factor
    }

    /// `size_base * (1 + sin(2*pi*t / period) * variance)`, rounded, at least 1 pixel.
    pub fn current_size(&self) -> u32 {
        let period = self.period_ticks();
        // Reduce the tick modulo the period first so t and t + period yield identical phases.
        let phase = (self.t as f64 % period) / period;
        let scale = 1.0 + (TAU * phase).sin() * self.osc.variance;
        (f64::from(self.osc.size_base) * scale).round().max(1.0) as u32
    }

    pub fn margin_x(&self) -> f64 {
        margin(self.current_size(), self.canvas.width)
    }

    pub fn margin_y(&self) -> f64 {
        margin(self.current_size(), self.canvas.height)
    }

    pub fn out_of_bounds_x(&self) -> bool {
        let m = self.margin_x();
        self.x < m || self.x > 1.0 - m
    }

    pub fn out_of_bounds_y(&self) -> bool {
        let m = self.margin_y();
        self.y < m || self.y > 1.0 - m
    }

    /// Out of bounds horizontally and the x-axis counter sits at a multiple of the threshold.
    pub fn shall_bounce_horizontal(&self) -> bool {
        self.out_of_bounds_x() && self.gate_x.ready()
    }

    /// Out of bounds vertically and the y-axis counter sits at a multiple of the threshold.
    pub fn shall_bounce_vertical(&self) -> bool {
        self.out_of_bounds_y() && self.gate_y.ready()
    }

    /// Source sprite resampled to `current_size x current_size`.
    pub fn rendered_sprite(&self) -> GrayImage {
        self.sprite.resampled(self.current_size())
    }

    /// Canvas pixel of the rendered sprite's top-left corner (may be negative).
    pub fn top_left(&self) -> (i64, i64) {
        let size = f64::from(self.current_size());
        let x1 = self.x * f64::from(self.canvas.width) - size / 2.0;
        let y1 = self.y * f64::from(self.canvas.height) - size / 2.0;
        (x1.trunc() as i64, y1.trunc() as i64)
    }

    /// Tight bbox of the rendered sprite in sprite-local pixels.
    pub fn tight_bbox(&self) -> MmnistResult<PixelRect> {
        self.tight_bbox_of(&self.rendered_sprite())
    }

    pub(crate) fn tight_bbox_of(&self, rendered: &GrayImage) -> MmnistResult<PixelRect> {
        bright_bounds(rendered).ok_or(MmnistError::EmptySprite {
            label: self.label(),
        })
    }

    /// Advance one tick: flip velocity on bounce, move, then bump the tick count.
    ///
    /// Bounces are decided on the pre-move position, so a flip affects this tick's move.
    pub fn update(&mut self) -> &mut Self {
        let out_x = self.out_of_bounds_x();
        let out_y = self.out_of_bounds_y();
        if self.gate_x.step(out_x) {
            self.vel_x = -self.vel_x;
        }
        if self.gate_y.step(out_y) {
            self.vel_y = -self.vel_y;
        }

        self.x += self.vel_x / self.fps;
        self.y += self.vel_y / self.fps;
        self.t += 1;
        self
    }
}

fn margin(size: u32, canvas_dim: u32) -> f64 {
    f64::from(size) / (4.0 * f64::from(canvas_dim))
}

fn sample_within_margin<R: Rng + ?Sized>(rng: &mut R, margin: f64) -> f64 {
    let (lo, hi) = (margin, 1.0 - margin);
    if lo >= hi {
        return 0.5;
    }
    rng.gen_range(lo..=hi)
}

#[cfg(test)]
#[path = "../../tests/unit/motion/digit.rs"]
mod tests;
