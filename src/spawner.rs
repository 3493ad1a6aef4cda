//! Obstacle pairs and the timer that spawns them.

use crate::collision::Rect;
use crate::config::GameConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Hangs from the top of the field down to the gap.
    Upper,
    /// Rises from below the gap to the bottom of the field.
    Lower,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Set once the obstacle's right edge is behind the bird.
    pub passed: bool,
    /// Both members of a pair carry the same id.
    pub pair: u64,
    pub side: Side,
}

impl Obstacle {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

pub struct Spawner {
    rng: StdRng,
    timer: f64,
    next_pair: u64,
    field_width: f64,
    field_height: f64,
    width: f64,
    margin: f64,
}

impl Spawner {
    pub fn new(cfg: &GameConfig) -> Self {
        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            timer: 0.0,
            next_pair: 0,
            field_width: cfg.field.width,
            field_height: cfg.field.height,
            width: cfg.pipes.width,
            margin: cfg.pipes.margin,
        }
    }

    pub fn timer(&self) -> f64 {
        self.timer
    }

    pub fn reset(&mut self) {
        self.timer = 0.0;
    }

    /// Accumulates `dt` and spawns a pair into `out` once `interval` has elapsed.
    /// The timer restarts from zero, so any overshoot is dropped.
    pub fn tick(&mut self, dt: f64, interval: f64, gap: f64, out: &mut Vec<Obstacle>) -> bool {
        self.timer += dt;
        if self.timer < interval {
            return false;
        }
        self.timer = 0.0;
        let [upper, lower] = self.spawn_pair(gap);
        out.push(upper);
        out.push(lower);
        true
    }

    /// Random gap top in `[margin, height - gap - margin]`.
    pub fn gap_top(&mut self, gap: f64) -> f64 {
        let lo = self.margin;
        let hi = self.field_height - gap - self.margin;
        if hi <= lo {
            return lo;
        }
        self.rng.gen_range(lo..hi)
    }

    pub fn spawn_pair(&mut self, gap: f64) -> [Obstacle; 2] {
        let gap_y = self.gap_top(gap);
        let pair = self.next_pair;
        self.next_pair += 1;
        debug!(pair, gap_y, gap, "spawning obstacle pair");

        let x = self.field_width;
        let lower_y = gap_y + gap;
        [
            Obstacle {
                x,
                y: 0.0,
                width: self.width,
                height: gap_y,
                passed: false,
                pair,
                side: Side::Upper,
            },
            Obstacle {
                x,
                y: lower_y,
                width: self.width,
                height: self.field_height - lower_y,
                passed: false,
                pair,
                side: Side::Lower,
            },
        ]
    }
}

/// Moves every obstacle left and drops the ones whose right edge passed `despawn_x`.
pub fn advance(obstacles: &mut Vec<Obstacle>, speed: f64, dt: f64, despawn_x: f64) {
    for o in obstacles.iter_mut() {
        o.x -= speed * dt;
    }
    obstacles.retain(|o| o.right() > despawn_x);
}
