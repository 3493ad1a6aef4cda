//! Terminal host: crossterm input and output around a [`Game`].

use crate::audio::Audio;
use crate::config::GameConfig;
use crate::frame::{self, Paced};
use crate::game::{Game, RunState};
use crate::hud::Hud;
use crate::input::{InputEvent, Target};
use crate::ports::{Renderer, ScoreStore};
use crate::render::TerminalRenderer;
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEventKind,
    },
    execute, terminal,
};
use std::io::{self, Write, stdout};
use std::ops::ControlFlow;
use std::panic;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Letterbox bars around the field are chrome, not play area.
fn on_field<S: ScoreStore>(game: &Game<Hud, S>, renderer: &TerminalRenderer, col: u16, row: u16) -> bool {
    let field = &game.config().field;
    let (x, y) = renderer.viewport().to_world(i32::from(col), i32::from(row) * 2);
    (0.0..field.width).contains(&x) && (0.0..field.height).contains(&y)
}

/// Maps one terminal event onto the game. Pointer presses on buttons restart,
/// presses anywhere on the start screen start, everything else feeds the input latch.
fn handle_event<S: ScoreStore>(
    event: Event,
    game: &mut Game<Hud, S>,
    renderer: &mut TerminalRenderer,
) -> Flow {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Flow::Quit,
            KeyCode::Char(' ') | KeyCode::Up => {
                game.on_input(InputEvent::jump_key());
            }
            KeyCode::Enter | KeyCode::Char('r') => {
                if game.state() != RunState::Playing {
                    game.start_run();
                }
            }
            _ => {}
        },
        Event::Mouse(m) if m.kind == MouseEventKind::Down(MouseButton::Left) => {
            let hud = game.presenter();
            let on_button =
                game.state() != RunState::Playing && hud.hit_test(m.column, m.row).is_some();
            if on_button || game.state() == RunState::Start {
                game.start_run();
            } else {
                let target = match hud.target_at(m.column, m.row) {
                    Target::Field if !on_field(game, renderer, m.column, m.row) => Target::Chrome,
                    t => t,
                };
                game.on_input(InputEvent::pointer_down(target));
            }
        }
        Event::Resize(cols, rows) => {
            debug!(cols, rows, "resize");
            renderer.resize(cols, rows);
        }
        _ => {}
    }
    Flow::Continue
}

fn pump_events<S: ScoreStore>(
    game: &mut Game<Hud, S>,
    renderer: &mut TerminalRenderer,
) -> io::Result<Flow> {
    while event::poll(Duration::ZERO)? {
        if handle_event(event::read()?, game, renderer) == Flow::Quit {
            return Ok(Flow::Quit);
        }
    }
    Ok(Flow::Continue)
}

fn run_loop<S: ScoreStore>(
    out: &mut impl Write,
    cfg: GameConfig,
    store: S,
    asset_base: &Path,
) -> anyhow::Result<()> {
    let (cols, rows) = terminal::size()?;
    let mut renderer = TerminalRenderer::new(cols, rows, cfg.field.clone());
    let report = renderer.load_assets(&cfg.assets.resolved(asset_base));
    info!(?report, "assets ready");

    let audio = Audio::open_or_silent(cfg.ui.sound);
    let hud = Hud::new(Duration::from_millis(cfg.ui.notification_ms), audio);
    let mut driver = Paced::new(cfg.ui.fps);
    let mut game = Game::new(cfg, hud, store);

    let outcome = frame::run(&mut driver, |now| {
        match pump_events(&mut game, &mut renderer) {
            Ok(Flow::Quit) => return ControlFlow::Break(Ok(())),
            Err(e) => return ControlFlow::Break(Err(e)),
            Ok(Flow::Continue) => {}
        }

        game.frame(now);
        game.presenter_mut().tick(Instant::now());

        game.render(&mut renderer);
        let text = game.presenter_mut().draw(renderer.buf_mut());
        match renderer.present(out, &text) {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => ControlFlow::Break(Err(e)),
        }
    });
    info!(high_score = game.high_score(), "quitting");
    Ok(outcome.unwrap_or(Ok(()))?)
}

fn leave_screen(out: &mut impl Write) -> io::Result<()> {
    execute!(
        out,
        DisableMouseCapture,
        terminal::LeaveAlternateScreen,
        cursor::Show,
        terminal::EnableLineWrap,
    )
}

fn cleanup(out: &mut impl Write) -> io::Result<()> {
    leave_screen(out)?;
    terminal::disable_raw_mode()
}

/// Puts the terminal back before the previous hook prints the panic.
fn restore_on_panic() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = cleanup(&mut stdout());
        previous(info);
    }));
}

/// Takes over the terminal until the player quits. The terminal is restored on
/// every path, panics included.
pub fn run<S: ScoreStore>(cfg: GameConfig, store: S, asset_base: &Path) -> anyhow::Result<()> {
    restore_on_panic();
    terminal::enable_raw_mode()?;
    let mut out = stdout();
    execute!(
        out,
        terminal::EnterAlternateScreen,
        cursor::Hide,
        terminal::DisableLineWrap,
        EnableMouseCapture,
    )?;

    let result = run_loop(&mut out, cfg, store, asset_base);
    cleanup(&mut out)?;
    result
}
