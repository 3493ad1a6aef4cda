//! The run state machine and the per-frame update.

use crate::collision::check_collision;
use crate::config::GameConfig;
use crate::difficulty::{Difficulty, level_up_message};
use crate::frame::FrameClock;
use crate::input::{InputController, InputEvent, Response};
use crate::physics::{self, Bird};
use crate::ports::{Presenter, Renderer, ScoreStore};
use crate::spawner::{self, Obstacle, Spawner};
use std::f64::consts::FRAC_PI_2;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Waiting for the first action.
    Start,
    Playing,
    GameOver,
}

pub struct Game<P: Presenter, S: ScoreStore> {
    cfg: GameConfig,
    state: RunState,
    score: u32,
    high_score: u32,
    bird: Bird,
    obstacles: Vec<Obstacle>,
    spawner: Spawner,
    difficulty: Difficulty,
    input: InputController,
    clock: FrameClock,
    presenter: P,
    store: S,
}

impl<P: Presenter, S: ScoreStore> Game<P, S> {
    pub fn new(cfg: GameConfig, mut presenter: P, store: S) -> Self {
        let high_score = store.get().unwrap_or_else(|e| {
            warn!("could not read high score: {e:#}");
            0
        });
        presenter.set_high_score(high_score);
        presenter.set_score(0);

        let b = &cfg.bird;
        Self {
            state: RunState::Start,
            score: 0,
            high_score,
            bird: Bird::new(b.x, b.y, b.width, b.height),
            obstacles: Vec::new(),
            spawner: Spawner::new(&cfg),
            difficulty: Difficulty::from_config(&cfg),
            input: InputController::new(),
            clock: FrameClock::new(cfg.physics.max_frame_delta),
            presenter,
            store,
            cfg,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn bird(&self) -> &Bird {
        &self.bird
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn difficulty(&self) -> &Difficulty {
        &self.difficulty
    }

    pub fn config(&self) -> &GameConfig {
        &self.cfg
    }

    pub fn input(&self) -> &InputController {
        &self.input
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Routes a raw input event. From the start screen any press starts a run;
    /// otherwise the event only feeds the jump latch.
    pub fn on_input(&mut self, event: InputEvent) -> Response {
        if self.state == RunState::Start && event.is_press() {
            self.start_run();
            return Response::Suppress;
        }
        self.input.handle(event)
    }

    /// Fresh run: used from the start screen and to restart after a game over.
    pub fn start_run(&mut self) {
        self.state = RunState::Playing;
        self.score = 0;
        self.obstacles.clear();
        self.spawner.reset();
        self.difficulty.reset();

        let b = &self.cfg.bird;
        self.bird = Bird::new(b.x, b.y, b.width, b.height);

        self.input.reset();
        self.input.set_enabled(true);

        self.presenter.hide_screens();
        self.presenter.set_score(0);
        info!(high_score = self.high_score, "run started");
    }

    /// Ends the run. Calling it again, or outside a run, does nothing.
    pub fn game_over(&mut self) {
        if self.state != RunState::Playing {
            return;
        }
        self.state = RunState::GameOver;
        self.input.set_enabled(false);

        if self.score > self.high_score {
            self.high_score = self.score;
            if let Err(e) = self.store.set(self.high_score) {
                warn!("could not persist high score {}: {e:#}", self.high_score);
            }
            self.presenter.set_high_score(self.high_score);
            info!(score = self.score, "new high score");
        }
        self.presenter.show_game_over(self.score);
        info!(score = self.score, level = self.difficulty.level(), "game over");
    }

    /// Advances the simulation to the frame stamped `now` (seconds).
    pub fn frame(&mut self, now: f64) {
        let dt = self.clock.delta(now);
        self.update(dt);
    }

    pub fn update(&mut self, dt: f64) {
        if self.state != RunState::Playing {
            return;
        }

        let jump = self.input.consume_jump();
        if self.update_bird(dt, jump) {
            self.game_over();
            return;
        }

        spawner::advance(
            &mut self.obstacles,
            self.difficulty.pipe_speed,
            dt,
            self.cfg.pipes.despawn_x,
        );
        self.spawner.tick(
            dt,
            self.difficulty.spawn_interval,
            self.difficulty.pipe_gap,
            &mut self.obstacles,
        );

        if self.hits_obstacle() {
            self.game_over();
            return;
        }

        self.update_score();
    }

    /// Returns `true` when the bird touched the floor. Gravity is integrated
    /// before the jump is applied, so the bird still moves down by one step of
    /// its old velocity on the frame a jump lands and starts rising on the next.
    fn update_bird(&mut self, dt: f64, jump: bool) -> bool {
        let bird = &mut self.bird;
        physics::apply_gravity(bird, self.difficulty.gravity, dt);
        if jump {
            physics::apply_jump(bird, self.cfg.bird.jump_force);
        }
        physics::clamp_velocity(bird, self.cfg.bird.max_velocity);
        bird.rotation = (bird.velocity * self.cfg.bird.rotation_factor).min(FRAC_PI_2);

        // The ceiling only stops the bird, the floor ends the run.
        if bird.y < 0.0 {
            bird.y = 0.0;
            bird.velocity = 0.0;
        }
        let floor = self.cfg.field.height;
        if bird.bottom() > floor {
            bird.y = floor - bird.height;
            return true;
        }
        false
    }

    fn hits_obstacle(&self) -> bool {
        let bird = self.bird.rect();
        self.obstacles
            .iter()
            .any(|o| check_collision(&bird, &o.rect()))
    }

    /// A pair is worth one point, awarded when its second member gets behind the bird.
    fn update_score(&mut self) {
        let bird_x = self.bird.x;
        for i in 0..self.obstacles.len() {
            let o = &mut self.obstacles[i];
            if o.passed || o.right() >= bird_x {
                continue;
            }
            o.passed = true;
            let pair = o.pair;
            let passed = self
                .obstacles
                .iter()
                .filter(|p| p.pair == pair && p.passed)
                .count();
            if passed == 2 {
                self.award_point();
            }
        }
    }

    fn award_point(&mut self) {
        self.score += 1;
        self.presenter.set_score(self.score);
        debug!(score = self.score, "point");

        if let Some(level) = self.difficulty.on_score(self.score) {
            info!(
                level,
                speed = self.difficulty.pipe_speed,
                gap = self.difficulty.pipe_gap,
                gravity = self.difficulty.gravity,
                interval = self.difficulty.spawn_interval,
                "difficulty increased"
            );
            self.presenter.show_notification(&level_up_message(level));
        }
    }

    /// Draws the current state. Nothing but the background before the first run.
    pub fn render<R: Renderer + ?Sized>(&self, r: &mut R) {
        r.clear();
        r.draw_background();
        if self.state != RunState::Start {
            r.draw_pipes(&self.obstacles);
            r.draw_bird(&self.bird);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssetPaths;
    use crate::input::{InputKind, Target};
    use crate::ports::AssetReport;
    use crate::spawner::Side;
    use crate::store::MemoryScoreStore;

    #[derive(Debug, Clone, PartialEq)]
    enum Ui {
        Hide,
        Score(u32),
        High(u32),
        GameOver(u32),
        Note(String),
    }

    #[derive(Default)]
    struct Recorder(Vec<Ui>);

    impl Presenter for Recorder {
        fn hide_screens(&mut self) {
            self.0.push(Ui::Hide);
        }
        fn set_score(&mut self, score: u32) {
            self.0.push(Ui::Score(score));
        }
        fn set_high_score(&mut self, high_score: u32) {
            self.0.push(Ui::High(high_score));
        }
        fn show_game_over(&mut self, final_score: u32) {
            self.0.push(Ui::GameOver(final_score));
        }
        fn show_notification(&mut self, text: &str) {
            self.0.push(Ui::Note(text.to_string()));
        }
    }

    impl Recorder {
        fn count(&self, f: impl Fn(&Ui) -> bool) -> usize {
            self.0.iter().filter(|u| f(u)).count()
        }
    }

    struct BrokenStore;

    impl ScoreStore for BrokenStore {
        fn get(&self) -> anyhow::Result<u32> {
            anyhow::bail!("disk on fire")
        }
        fn set(&mut self, _score: u32) -> anyhow::Result<()> {
            anyhow::bail!("disk on fire")
        }
    }

    fn config() -> GameConfig {
        GameConfig {
            seed: Some(1),
            ..GameConfig::default()
        }
    }

    fn game() -> Game<Recorder, MemoryScoreStore> {
        Game::new(config(), Recorder::default(), MemoryScoreStore::default())
    }

    fn playing() -> Game<Recorder, MemoryScoreStore> {
        let mut g = game();
        g.start_run();
        g
    }

    /// A pair already behind the bird's x, clear of the bird vertically and horizontally.
    fn pair_behind(g: &Game<Recorder, MemoryScoreStore>, pair: u64) -> [Obstacle; 2] {
        let x = g.bird.x - 60.0 - 1.0;
        [
            Obstacle {
                x,
                y: 0.0,
                width: 60.0,
                height: 100.0,
                passed: false,
                pair,
                side: Side::Upper,
            },
            Obstacle {
                x,
                y: 250.0,
                width: 60.0,
                height: 350.0,
                passed: false,
                pair,
                side: Side::Lower,
            },
        ]
    }

    #[test]
    fn test_new_game_waits_on_start() {
        let g = game();
        assert_eq!(g.state(), RunState::Start);
        assert_eq!(g.score(), 0);
        assert!(!g.input().is_enabled());
        assert_eq!(g.presenter().0, vec![Ui::High(0), Ui::Score(0)]);
    }

    #[test]
    fn test_high_score_loaded_from_store() {
        let g = Game::new(config(), Recorder::default(), MemoryScoreStore::with(12));
        assert_eq!(g.high_score(), 12);
    }

    #[test]
    fn test_unreadable_store_reads_as_zero() {
        let mut g = Game::new(config(), Recorder::default(), BrokenStore);
        assert_eq!(g.high_score(), 0);
        g.start_run();
        g.score = 3;
        g.game_over();
        // Still recorded in memory even though persisting failed.
        assert_eq!(g.high_score(), 3);
        assert_eq!(g.state(), RunState::GameOver);
    }

    #[test]
    fn test_update_is_noop_outside_playing() {
        let mut g = game();
        let before = *g.bird();
        g.update(0.05);
        assert_eq!(*g.bird(), before);
    }

    #[test]
    fn test_press_on_start_begins_run_without_jumping() {
        let mut g = game();
        assert_eq!(g.on_input(InputEvent::jump_key()), Response::Suppress);
        assert_eq!(g.state(), RunState::Playing);
        assert!(g.input().is_enabled());

        g.update(0.016);
        // No jump was latched by the starting press, so the bird falls.
        assert!(g.bird().velocity > 0.0);
    }

    #[test]
    fn test_chrome_press_on_start_is_ignored() {
        let mut g = game();
        g.on_input(InputEvent::pointer_down(Target::Chrome));
        assert_eq!(g.state(), RunState::Start);
    }

    #[test]
    fn test_free_fall_ends_on_floor() {
        let mut g = playing();
        let mut prev_y = g.bird().y;
        let mut frames = 0;
        while g.state() == RunState::Playing {
            g.update(0.016);
            frames += 1;
            assert!(g.bird().y > prev_y, "bird must keep falling");
            assert!(g.bird().velocity <= 400.0);
            prev_y = g.bird().y;
            assert!(frames < 500, "never reached the floor");
        }
        assert!(frames > 50);
        assert_eq!(g.state(), RunState::GameOver);
        assert_eq!(g.bird().y, 600.0 - 30.0);
        assert!(!g.input().is_enabled());
    }

    #[test]
    fn test_fifty_frames_of_free_fall_keep_descending() {
        let mut g = playing();
        let mut prev_y = g.bird().y;
        for _ in 0..50 {
            g.update(0.016);
            assert!(g.bird().y > prev_y);
            prev_y = g.bird().y;
        }
        assert_eq!(g.state(), RunState::Playing);
    }

    #[test]
    fn test_jump_sets_upward_velocity() {
        let mut g = playing();
        g.update(0.016);
        g.on_input(InputEvent::jump_key());
        g.update(0.016);
        assert_eq!(g.bird().velocity, -250.0);
        assert!(g.bird().rotation < 0.0);

        let y = g.bird().y;
        g.update(0.016);
        assert!(g.bird().y < y);
    }

    #[test]
    fn test_one_jump_per_input_burst() {
        let mut g = playing();
        for _ in 0..5 {
            g.on_input(InputEvent::jump_key());
        }
        g.update(0.016);
        assert_eq!(g.bird().velocity, -250.0);
        g.update(0.016);
        assert!(g.bird().velocity > -250.0);
    }

    #[test]
    fn test_rotation_caps_at_quarter_turn() {
        let mut g = playing();
        for _ in 0..30 {
            g.update(0.016);
        }
        assert!(g.bird().rotation <= FRAC_PI_2);
        assert!((g.bird().rotation - (400.0_f64 * 0.003).min(FRAC_PI_2)).abs() < 1e-9);
    }

    #[test]
    fn test_ceiling_clamps_without_ending_run() {
        let mut g = playing();
        g.bird.y = 1.0;
        g.bird.velocity = -300.0;
        g.update(0.016);
        assert_eq!(g.bird().y, 0.0);
        assert_eq!(g.bird().velocity, 0.0);
        assert_eq!(g.state(), RunState::Playing);
    }

    #[test]
    fn test_collision_ends_run() {
        let mut g = playing();
        let mut pair = pair_behind(&g, 99);
        pair[0].x = g.bird.x;
        pair[0].height = 400.0;
        g.obstacles.extend(pair);
        g.update(0.0);
        assert_eq!(g.state(), RunState::GameOver);
    }

    #[test]
    fn test_pair_scores_once() {
        let mut g = playing();
        let pair = pair_behind(&g, 7);
        g.obstacles.extend(pair);
        g.update(0.0);
        assert_eq!(g.score(), 1);
        assert!(g.obstacles().iter().all(|o| o.passed));

        g.update(0.0);
        assert_eq!(g.score(), 1);
    }

    #[test]
    fn test_half_a_pair_does_not_score() {
        let mut g = playing();
        let [upper, mut lower] = pair_behind(&g, 3);
        lower.x = g.bird.x + 200.0;
        g.obstacles.push(upper);
        g.obstacles.push(lower);
        g.update(0.0);
        assert_eq!(g.score(), 0);
        assert!(g.obstacles()[0].passed);
        assert!(!g.obstacles()[1].passed);
    }

    #[test]
    fn test_neighbouring_pairs_score_separately() {
        let mut g = playing();
        let a = pair_behind(&g, 1);
        let mut b = pair_behind(&g, 2);
        // Within 10 units of each other; still two distinct pairs.
        b[0].x -= 5.0;
        b[1].x -= 5.0;
        g.obstacles.extend(a);
        g.obstacles.extend(b);
        g.update(0.0);
        assert_eq!(g.score(), 2);
    }

    #[test]
    fn test_level_up_at_25() {
        let mut g = playing();
        g.score = 24;
        let pair = pair_behind(&g, 1);
        g.obstacles.extend(pair);
        g.update(0.0);

        assert_eq!(g.score(), 25);
        let d = g.difficulty();
        assert_eq!(d.level(), 1);
        assert!((d.pipe_speed - 180.0).abs() < 1e-9);
        assert!((d.pipe_gap - 140.0).abs() < 1e-9);
        assert!((d.gravity - 1050.0).abs() < 1e-9);
        assert!((d.spawn_interval - 1.4).abs() < 1e-9);
        assert_eq!(
            g.presenter().count(|u| matches!(u, Ui::Note(t) if t == "SPEED UP!")),
            1
        );
    }

    #[test]
    fn test_spawns_after_interval() {
        let mut cfg = config();
        cfg.physics.gravity = 0.0;
        let mut g = Game::new(cfg, Recorder::default(), MemoryScoreStore::default());
        g.start_run();
        for _ in 0..14 {
            g.update(0.1);
        }
        assert!(g.obstacles().is_empty());
        g.update(0.1);
        g.update(0.1);
        assert_eq!(g.obstacles().len(), 2);
        let o = &g.obstacles()[0];
        assert!(o.x <= 400.0 && o.x > 380.0);
    }

    #[test]
    fn test_game_over_is_idempotent() {
        let mut g = playing();
        g.score = 5;
        g.game_over();
        let snapshot = (g.state(), g.score(), g.high_score());
        let ui_len = g.presenter().0.len();

        g.game_over();
        assert_eq!((g.state(), g.score(), g.high_score()), snapshot);
        assert_eq!(g.presenter().0.len(), ui_len);
        assert_eq!(g.store().writes(), 1);
        assert_eq!(g.store().get().unwrap(), 5);
    }

    #[test]
    fn test_lower_score_keeps_high_score() {
        let mut g = Game::new(config(), Recorder::default(), MemoryScoreStore::with(10));
        g.start_run();
        g.score = 4;
        g.game_over();
        assert_eq!(g.high_score(), 10);
        assert_eq!(g.store().writes(), 0);
        assert_eq!(g.presenter().count(|u| *u == Ui::GameOver(4)), 1);
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut g = playing();
        g.score = 60;
        g.difficulty.on_score(60);
        let pair = pair_behind(&g, 1);
        g.obstacles.extend(pair);
        g.bird.velocity = 123.0;
        g.bird.y = 10.0;
        g.game_over();

        // Input is off until the restart.
        g.on_input(InputEvent::jump_key());
        assert!(!g.input().is_enabled());

        g.start_run();
        assert_eq!(g.state(), RunState::Playing);
        assert_eq!(g.score(), 0);
        assert_eq!(g.high_score(), 60);
        assert!(g.obstacles().is_empty());
        assert_eq!(g.difficulty().level(), 0);
        assert_eq!(g.difficulty().pipe_speed, 150.0);
        assert_eq!(g.bird().y, 250.0);
        assert_eq!(g.bird().velocity, 0.0);
        assert_eq!(g.bird().rotation, 0.0);
        assert!(g.input().is_enabled());
        assert_eq!(g.presenter().count(|u| *u == Ui::Hide), 2);
    }

    #[test]
    fn test_frame_delta_is_clamped() {
        let mut g = playing();
        // Five seconds since the last frame behave like one 0.1 s step.
        g.frame(5.0);
        assert!((g.bird().velocity - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_jump_frame_still_drifts_down() {
        let mut g = playing();
        g.on_input(InputEvent::jump_key());
        g.update(0.1);
        assert_eq!(g.bird().velocity, -250.0);
        assert!((g.bird().y - 260.0).abs() < 1e-9);

        g.update(0.1);
        assert!((g.bird().y - 245.0).abs() < 1e-9);
    }

    #[test]
    fn test_negative_frame_cap_in_config_still_runs() {
        let cfg = GameConfig::from_toml_str("seed = 1\n[physics]\nmax_frame_delta = -0.1").unwrap();
        assert!(!cfg.validate().is_empty());
        let mut g = Game::new(cfg, Recorder::default(), MemoryScoreStore::default());
        g.start_run();
        g.frame(0.016);
        assert!((g.bird().velocity - 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_touch_move_is_suppressed_while_playing() {
        let mut g = playing();
        let mv = InputEvent::new(InputKind::TouchMove, Target::Field);
        assert_eq!(g.on_input(mv), Response::Suppress);
    }

    #[derive(Default)]
    struct CallLog(Vec<&'static str>);

    impl Renderer for CallLog {
        fn load_assets(&mut self, _paths: &AssetPaths) -> AssetReport {
            AssetReport::default()
        }
        fn clear(&mut self) {
            self.0.push("clear");
        }
        fn draw_background(&mut self) {
            self.0.push("background");
        }
        fn draw_bird(&mut self, _bird: &Bird) {
            self.0.push("bird");
        }
        fn draw_pipes(&mut self, _pipes: &[Obstacle]) {
            self.0.push("pipes");
        }
    }

    #[test]
    fn test_render_order() {
        let mut g = game();
        let mut log = CallLog::default();
        g.render(&mut log);
        assert_eq!(log.0, vec!["clear", "background"]);

        g.start_run();
        let mut log = CallLog::default();
        g.render(&mut log);
        assert_eq!(log.0, vec!["clear", "background", "pipes", "bird"]);
    }
}
