//! Optional PNG sprites. Anything that fails to load is drawn procedurally instead.

use crate::config::AssetPaths;
use crate::ports::AssetReport;
use crate::render::Rgb;
use anyhow::Context;
use std::path::Path;
use tracing::{info, warn};

/// Decoded image; transparent pixels are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    w: usize,
    h: usize,
    px: Vec<Option<Rgb>>,
}

impl Sprite {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let img = image::open(path)
            .with_context(|| format!("loading sprite {}", path.display()))?
            .to_rgba8();
        let (w, h) = img.dimensions();
        let px = img
            .pixels()
            .map(|p| {
                let [r, g, b, a] = p.0;
                (a >= 128).then_some(Rgb(r, g, b))
            })
            .collect();
        Ok(Self {
            w: w as usize,
            h: h as usize,
            px,
        })
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.w || y >= self.h {
            return None;
        }
        self.px[y * self.w + x]
    }
}

#[derive(Debug, Clone, Default)]
pub struct Sprites {
    pub bird: Option<Sprite>,
    pub pipe: Option<Sprite>,
    pub background: Option<Sprite>,
}

fn load_or_fallback(name: &str, path: &Path) -> Option<Sprite> {
    if !path.exists() {
        info!(asset = name, path = %path.display(), "sprite not found, drawing shapes");
        return None;
    }
    match Sprite::load(path) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!(asset = name, "{e:#}; drawing shapes");
            None
        }
    }
}

impl Sprites {
    pub fn load(paths: &AssetPaths) -> (Self, AssetReport) {
        let sprites = Self {
            bird: load_or_fallback("bird", &paths.bird),
            pipe: load_or_fallback("pipe", &paths.pipe),
            background: load_or_fallback("background", &paths.background),
        };
        let report = AssetReport {
            bird: sprites.bird.is_some(),
            pipe: sprites.pipe.is_some(),
            background: sprites.background.is_some(),
        };
        (sprites, report)
    }
}
