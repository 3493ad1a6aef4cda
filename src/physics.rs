//! Vertical motion of the bird.
//!
//! Everything here is a plain transformation of a [`Bird`]; the game loop
//! decides when to call what.

use crate::collision::Rect;

/// The player-controlled flying object. `x` is a fixed lane, only `y` moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bird {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Vertical velocity, positive is downwards.
    pub velocity: f64,
    /// Display-only pitch in radians.
    pub rotation: f64,
}

impl Bird {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            velocity: 0.0,
            rotation: 0.0,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Semi-implicit Euler: velocity is updated first, then position uses the new velocity.
pub fn apply_gravity(bird: &mut Bird, gravity: f64, dt: f64) {
    bird.velocity += gravity * dt;
    bird.y += bird.velocity * dt;
}

/// A jump replaces the current velocity, however fast the bird is falling.
pub fn apply_jump(bird: &mut Bird, jump_force: f64) {
    bird.velocity = -jump_force;
}

/// Caps the downward velocity only.
pub fn clamp_velocity(bird: &mut Bird, max_velocity: f64) {
    if bird.velocity > max_velocity {
        bird.velocity = max_velocity;
    }
}

/// Clamps `y` into `[min_y, max_y - height]`. Returns `true` if it had to.
pub fn check_bounds(bird: &mut Bird, min_y: f64, max_y: f64) -> bool {
    if bird.y < min_y {
        bird.y = min_y;
        return true;
    }
    if bird.bottom() > max_y {
        bird.y = max_y - bird.height;
        return true;
    }
    false
}
