//! Pajarito: a side-scrolling one-button flyer for the terminal.
//!
//! The simulation (`physics`, `collision`, `input`, `spawner`, `difficulty`,
//! `game`) knows nothing about terminals. It talks to the outside world through
//! the traits in [`ports`], which the terminal host (`render`, `hud`, `store`,
//! `app`) implements.

pub mod app;
pub mod assets;
pub mod audio;
pub mod collision;
pub mod config;
pub mod difficulty;
pub mod frame;
pub mod game;
pub mod hud;
pub mod input;
pub mod logging;
pub mod physics;
pub mod ports;
pub mod render;
pub mod spawner;
pub mod store;
