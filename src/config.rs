use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, fs};
use tracing::{info, warn};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "PAJARITO_CONFIG";

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FieldConfig {
    pub width: f64,
    pub height: f64,
}
impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 600.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BirdConfig {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub max_velocity: f64,
    pub jump_force: f64,
    /// Radians of pitch per unit of velocity.
    pub rotation_factor: f64,
}
impl Default for BirdConfig {
    fn default() -> Self {
        Self {
            x: 100.0,
            y: 250.0,
            width: 40.0,
            height: 30.0,
            max_velocity: 400.0,
            jump_force: 250.0,
            rotation_factor: 0.003,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PipeConfig {
    pub width: f64,
    pub gap: f64,
    /// World units per second.
    pub speed: f64,
    /// Seconds between two spawned pairs.
    pub spawn_interval: f64,
    /// Minimum distance between the gap and the top or bottom of the field.
    pub margin: f64,
    /// Obstacles whose right edge is left of this are dropped.
    pub despawn_x: f64,
}
impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            width: 60.0,
            gap: 150.0,
            speed: 150.0,
            spawn_interval: 1.5,
            margin: 100.0,
            despawn_x: -100.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f64,
    /// Upper bound for a single frame step, in seconds.
    pub max_frame_delta: f64,
}
impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 1000.0,
            max_frame_delta: 0.1,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DifficultyConfig {
    pub points_per_level: u32,
    pub speed_step: f64,
    pub gap_step: f64,
    pub min_gap: f64,
    pub gravity_step: f64,
    pub interval_step: f64,
    pub min_interval: f64,
}
impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            points_per_level: 25,
            speed_step: 30.0,
            gap_step: 10.0,
            min_gap: 100.0,
            gravity_step: 50.0,
            interval_step: 0.1,
            min_interval: 0.8,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    /// How long the level-up notification stays on screen.
    pub notification_ms: u64,
    pub fps: u32,
    pub sound: bool,
}
impl Default for UiConfig {
    fn default() -> Self {
        Self {
            notification_ms: 2000,
            fps: 60,
            sound: true,
        }
    }
}

/// Sprite locations. Relative paths resolve against the config file's directory.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AssetPaths {
    pub bird: PathBuf,
    pub pipe: PathBuf,
    pub background: PathBuf,
}
impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            bird: PathBuf::from("assets/bird.png"),
            pipe: PathBuf::from("assets/pipe.png"),
            background: PathBuf::from("assets/background.png"),
        }
    }
}

impl AssetPaths {
    pub fn resolved(&self, base: &Path) -> Self {
        let join = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                base.join(p)
            }
        };
        Self {
            bird: join(&self.bird),
            pipe: join(&self.pipe),
            background: join(&self.background),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct GameConfig {
    pub field: FieldConfig,
    pub bird: BirdConfig,
    pub pipes: PipeConfig,
    pub physics: PhysicsConfig,
    pub difficulty: DifficultyConfig,
    pub ui: UiConfig,
    pub assets: AssetPaths,
    /// Fixed RNG seed for a reproducible obstacle stream.
    pub seed: Option<u64>,
}

impl GameConfig {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("parsing game config")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    /// Loads `path`, falling back to defaults when it is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }
        match Self::load(path) {
            Ok(cfg) => {
                info!(path = %path.display(), "loaded config");
                for w in cfg.validate() {
                    warn!("config: {w}");
                }
                cfg
            }
            Err(e) => {
                warn!("{e:#}; using defaults");
                Self::default()
            }
        }
    }

    /// `$PAJARITO_CONFIG`, else `config.toml` in the platform config dir.
    pub fn default_path(dirs: Option<&directories::ProjectDirs>) -> PathBuf {
        if let Some(p) = env::var_os(CONFIG_ENV) {
            return PathBuf::from(p);
        }
        match dirs {
            Some(d) => d.config_dir().join("config.toml"),
            None => PathBuf::from("config.toml"),
        }
    }

    /// Human readable problems; the game still runs with them.
    pub fn validate(&self) -> Vec<String> {
        let mut w = Vec::new();
        if self.field.width <= 0.0 || self.field.height <= 0.0 {
            w.push("field.width and field.height must be > 0".to_string());
        }
        if self.bird.width <= 0.0 || self.bird.height <= 0.0 {
            w.push("bird.width and bird.height must be > 0".to_string());
        }
        if self.bird.max_velocity <= 0.0 {
            w.push("bird.max_velocity must be > 0".to_string());
        }
        if self.pipes.gap + 2.0 * self.pipes.margin > self.field.height {
            w.push(format!(
                "pipes.gap ({}) plus margins ({}) exceed field.height ({}); gaps will pin to the top margin",
                self.pipes.gap,
                2.0 * self.pipes.margin,
                self.field.height
            ));
        }
        if self.pipes.spawn_interval <= 0.0 {
            w.push("pipes.spawn_interval must be > 0".to_string());
        }
        if self.difficulty.points_per_level == 0 {
            w.push("difficulty.points_per_level must be > 0".to_string());
        }
        if !(self.physics.max_frame_delta > 0.0) {
            w.push("physics.max_frame_delta must be > 0".to_string());
        }
        w
    }
}
