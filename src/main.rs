use anyhow::Context;
use directories::ProjectDirs;
use pajarito::config::GameConfig;
use pajarito::store::FileScoreStore;
use pajarito::{app, logging};
use std::path::PathBuf;
use tracing::info;

fn main() -> anyhow::Result<()> {
    let dirs = ProjectDirs::from("", "", "pajarito");
    let data_dir = dirs
        .as_ref()
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    logging::init(&logging::log_path(&data_dir));
    info!(version = env!("CARGO_PKG_VERSION"), "starting");

    let config_path = GameConfig::default_path(dirs.as_ref());
    let cfg = GameConfig::load_or_default(&config_path);

    // Relative asset paths are taken from the config file's directory when there is one.
    let asset_base = match config_path.parent() {
        Some(p) if config_path.exists() && !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::env::current_dir().context("resolving working directory")?,
    };

    let store = match dirs.as_ref() {
        Some(d) => FileScoreStore::from_project_dirs(d),
        None => FileScoreStore::in_dir(&data_dir),
    };
    info!(path = %store.path().display(), "high score store");

    app::run(cfg, store, &asset_base)
}
