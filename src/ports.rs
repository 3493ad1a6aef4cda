//! Seams between the simulation core and whatever hosts it.

use crate::config::AssetPaths;
use crate::physics::Bird;
use crate::spawner::Obstacle;

/// UI effects the game loop triggers. Implementations decide what a screen is.
pub trait Presenter {
    /// Hide the start screen, the game-over screen and any notification.
    fn hide_screens(&mut self);
    fn set_score(&mut self, score: u32);
    fn set_high_score(&mut self, high_score: u32);
    fn show_game_over(&mut self, final_score: u32);
    /// Transient banner; the presenter hides it on its own after a while.
    fn show_notification(&mut self, text: &str);
}

/// Single-key persistence for the best score.
pub trait ScoreStore {
    /// A missing key reads as 0.
    fn get(&self) -> anyhow::Result<u32>;
    fn set(&mut self, score: u32) -> anyhow::Result<()>;
}

/// Which sprites were actually loaded; anything else is drawn procedurally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetReport {
    pub bird: bool,
    pub pipe: bool,
    pub background: bool,
}

pub trait Renderer {
    /// Must run before the first frame. Never fails: missing assets degrade to shapes.
    fn load_assets(&mut self, paths: &AssetPaths) -> AssetReport;
    fn clear(&mut self);
    fn draw_background(&mut self);
    fn draw_bird(&mut self, bird: &Bird);
    fn draw_pipes(&mut self, pipes: &[Obstacle]);
}

/// Frame scheduler. Each call blocks until the next frame is due.
pub trait FrameDriver {
    /// Timestamp of the next frame in seconds, `None` when no more frames will come.
    fn next_frame(&mut self) -> Option<f64>;
}
