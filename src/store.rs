use crate::ports::ScoreStore;
use anyhow::Context;
use directories::ProjectDirs;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the single persisted key.
pub const HIGH_SCORE_KEY: &str = "pajaritoHighScore";

/// Keeps the best score as a decimal string in a file named after the key.
#[derive(Debug, Clone)]
pub struct FileScoreStore {
    path: PathBuf,
}

impl FileScoreStore {
    /// Store inside `dir`, which is created on first write.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(HIGH_SCORE_KEY),
        }
    }

    /// Store in the platform data directory.
    pub fn from_project_dirs(dirs: &ProjectDirs) -> Self {
        Self::in_dir(dirs.data_dir())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parse_score(raw: &str) -> anyhow::Result<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse()
        .with_context(|| format!("invalid high score value {trimmed:?}"))
}

impl ScoreStore for FileScoreStore {
    fn get(&self) -> anyhow::Result<u32> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => parse_score(&raw),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    fn set(&mut self, score: u32) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        fs::write(&self.path, score.to_string())
            .with_context(|| format!("writing {}", self.path.display()))
    }
}

/// In-memory store for tests and for hosts without a writable disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    value: Option<String>,
    writes: usize,
}

impl MemoryScoreStore {
    pub fn with(score: u32) -> Self {
        Self {
            value: Some(score.to_string()),
            writes: 0,
        }
    }

    /// Number of successful `set` calls.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ScoreStore for MemoryScoreStore {
    fn get(&self) -> anyhow::Result<u32> {
        self.value.as_deref().map_or(Ok(0), parse_score)
    }

    fn set(&mut self, score: u32) -> anyhow::Result<()> {
        self.value = Some(score.to_string());
        self.writes += 1;
        Ok(())
    }
}
