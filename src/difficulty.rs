//! Progressive difficulty: every `points_per_level` points the pipes get
//! faster, the gap narrower, gravity stronger and spawns more frequent.

use crate::config::{DifficultyConfig, GameConfig};

/// Level-independent starting values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseTuning {
    pub pipe_speed: f64,
    pub pipe_gap: f64,
    pub gravity: f64,
    pub spawn_interval: f64,
}

impl BaseTuning {
    pub fn from_config(cfg: &GameConfig) -> Self {
        Self {
            pipe_speed: cfg.pipes.speed,
            pipe_gap: cfg.pipes.gap,
            gravity: cfg.physics.gravity,
            spawn_interval: cfg.pipes.spawn_interval,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Difficulty {
    base: BaseTuning,
    steps: DifficultyConfig,
    level: u32,
    pub pipe_speed: f64,
    pub pipe_gap: f64,
    pub gravity: f64,
    pub spawn_interval: f64,
}

impl Difficulty {
    pub fn new(base: BaseTuning, steps: DifficultyConfig) -> Self {
        let mut d = Self {
            base,
            steps,
            level: 0,
            pipe_speed: base.pipe_speed,
            pipe_gap: base.pipe_gap,
            gravity: base.gravity,
            spawn_interval: base.spawn_interval,
        };
        d.recompute();
        d
    }

    pub fn from_config(cfg: &GameConfig) -> Self {
        Self::new(BaseTuning::from_config(cfg), cfg.difficulty.clone())
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Back to level 0 and the base values.
    pub fn reset(&mut self) {
        self.level = 0;
        self.recompute();
    }

    pub fn level_for_score(&self, score: u32) -> u32 {
        score / self.steps.points_per_level.max(1)
    }

    /// Advances the level if `score` warrants it. Returns the new level when it changed.
    pub fn on_score(&mut self, score: u32) -> Option<u32> {
        let level = self.level_for_score(score);
        if level <= self.level {
            return None;
        }
        self.level = level;
        self.recompute();
        Some(level)
    }

    fn recompute(&mut self) {
        if self.level == 0 {
            self.pipe_speed = self.base.pipe_speed;
            self.pipe_gap = self.base.pipe_gap;
            self.gravity = self.base.gravity;
            self.spawn_interval = self.base.spawn_interval;
            return;
        }
        let l = f64::from(self.level);
        let s = &self.steps;
        self.pipe_speed = self.base.pipe_speed + l * s.speed_step;
        self.pipe_gap = (self.base.pipe_gap - l * s.gap_step).max(s.min_gap);
        self.gravity = self.base.gravity + l * s.gravity_step;
        self.spawn_interval = (self.base.spawn_interval - l * s.interval_step).max(s.min_interval);
    }
}

/// Banner shown when `level` is reached.
pub fn level_up_message(level: u32) -> String {
    const MESSAGES: [&str; 5] = [
        "SPEED UP!",
        "EXTREME DIFFICULTY!",
        "INFERNAL MODE ON!",
        "TOP SPEED!",
        "EPIC CHALLENGE!",
    ];
    match level {
        0 => format!("LEVEL {level} REACHED!"),
        n => MESSAGES[(n as usize - 1).min(MESSAGES.len() - 1)].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn difficulty() -> Difficulty {
        Difficulty::from_config(&GameConfig::default())
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_starts_at_base() {
        let d = difficulty();
        assert_eq!(d.level(), 0);
        assert_eq!(d.pipe_speed, 150.0);
        assert_eq!(d.pipe_gap, 150.0);
        assert_eq!(d.gravity, 1000.0);
        assert_eq!(d.spawn_interval, 1.5);
    }

    #[test]
    fn test_level_one_at_25() {
        let mut d = difficulty();
        assert_eq!(d.on_score(24), None);
        assert_eq!(d.on_score(25), Some(1));
        assert_eq!(d.level(), 1);
        assert!(approx(d.pipe_speed, 180.0));
        assert!(approx(d.pipe_gap, 140.0));
        assert!(approx(d.gravity, 1050.0));
        assert!(approx(d.spawn_interval, 1.4));
    }

    #[test]
    fn test_same_level_does_not_retrigger() {
        let mut d = difficulty();
        assert_eq!(d.on_score(25), Some(1));
        assert_eq!(d.on_score(26), None);
        assert_eq!(d.on_score(49), None);
        assert_eq!(d.on_score(50), Some(2));
    }

    #[test]
    fn test_floors_hold_at_high_levels() {
        let mut d = difficulty();
        d.on_score(25 * 20);
        assert_eq!(d.level(), 20);
        assert!(approx(d.pipe_gap, 100.0));
        assert!(approx(d.spawn_interval, 0.8));
        assert!(approx(d.pipe_speed, 150.0 + 600.0));
        assert!(approx(d.gravity, 2000.0));
    }

    #[test]
    fn test_tuning_is_monotonic() {
        let mut d = difficulty();
        let mut prev = d.clone();
        for level in 1..30 {
            d.on_score(level * 25);
            assert!(d.pipe_speed >= prev.pipe_speed);
            assert!(d.gravity >= prev.gravity);
            assert!(d.pipe_gap <= prev.pipe_gap);
            assert!(d.spawn_interval <= prev.spawn_interval);
            prev = d.clone();
        }
    }

    #[test]
    fn test_reset_restores_base() {
        let mut d = difficulty();
        d.on_score(100);
        d.reset();
        assert_eq!(d, difficulty());
    }

    #[test]
    fn test_messages() {
        assert_eq!(level_up_message(1), "SPEED UP!");
        assert_eq!(level_up_message(5), "EPIC CHALLENGE!");
        assert_eq!(level_up_message(12), "EPIC CHALLENGE!");
        assert_eq!(level_up_message(0), "LEVEL 0 REACHED!");
    }
}
