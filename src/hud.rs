//! Score, overlays and the level-up banner drawn on top of the field.

use crate::audio::{Audio, Cue};
use crate::input::Target;
use crate::ports::Presenter;
use crate::render::{
    BIRD_Y, DIRT, PANEL, PixelBuf, SHADOW, TextLine, WHITE, draw_number,
};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Start,
    /// No overlay, the run is on.
    Hidden,
    GameOver { score: u32 },
}

/// Clickable chrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Start,
    Restart,
}

#[derive(Debug, Clone)]
struct Notification {
    text: String,
    shown_at: Instant,
}

pub struct Hud {
    screen: Screen,
    score: u32,
    high_score: u32,
    notification: Option<Notification>,
    notification_for: Duration,
    audio: Option<Audio>,
    /// Where the buttons ended up on the last draw.
    buttons: Vec<(Button, TextLine)>,
}

impl Hud {
    pub fn new(notification_for: Duration, audio: Option<Audio>) -> Self {
        Self {
            screen: Screen::Start,
            score: 0,
            high_score: 0,
            notification: None,
            notification_for,
            audio,
            buttons: Vec::new(),
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn notification(&self) -> Option<&str> {
        self.notification.as_ref().map(|n| n.text.as_str())
    }

    fn cue(&self, cue: Cue) {
        if let Some(audio) = &self.audio {
            audio.play(cue);
        }
    }

    /// Hides the banner once it has been up long enough.
    pub fn tick(&mut self, now: Instant) {
        if let Some(n) = &self.notification {
            if now.saturating_duration_since(n.shown_at) >= self.notification_for {
                self.notification = None;
            }
        }
    }

    pub fn hit_test(&self, col: u16, row: u16) -> Option<Button> {
        self.buttons
            .iter()
            .find(|(_, line)| line.contains(col, row))
            .map(|(b, _)| *b)
    }

    /// Start and game-over screens cover the whole field, so every press lands on chrome.
    pub fn target_at(&self, col: u16, row: u16) -> Target {
        if self.screen != Screen::Hidden || self.hit_test(col, row).is_some() {
            Target::Chrome
        } else {
            Target::Field
        }
    }

    /// Paints pixel-level overlays into `buf` and returns the text to print over them.
    pub fn draw(&mut self, buf: &mut PixelBuf) -> Vec<TextLine> {
        buf.set_clip(None);
        let cols = buf.width() as u16;
        let rows = (buf.height() / 2) as u16;
        let cx = cols / 2;
        let mut text = Vec::new();
        self.buttons.clear();

        if self.screen == Screen::Hidden {
            draw_number(buf, cx as i32, 2, self.score, WHITE);
        }
        text.push(TextLine {
            col: 1,
            row: 0,
            text: format!("BEST {}", self.high_score),
            fg: WHITE,
            bg: SHADOW,
        });

        match self.screen {
            Screen::Hidden => {}
            Screen::Start => {
                let top = panel(buf, 8);
                text.push(TextLine::centered(cx, top + 1, "PAJARITO", BIRD_Y, PANEL));
                text.push(TextLine::centered(cx, top + 3, "SPACE / CLICK TO FLY", SHADOW, PANEL));
                let start = TextLine::centered(cx, top + 5, "[ START ]", WHITE, SHADOW);
                self.buttons.push((Button::Start, start.clone()));
                text.push(start);
            }
            Screen::GameOver { score } => {
                let top = panel(buf, 10);
                text.push(TextLine::centered(cx, top + 1, "GAME OVER", SHADOW, PANEL));
                text.push(TextLine::centered(cx, top + 3, format!("SCORE {score}"), SHADOW, PANEL));
                text.push(TextLine::centered(cx, top + 4, format!("BEST {}", self.high_score), SHADOW, PANEL));
                let restart = TextLine::centered(cx, top + 6, "[ RESTART ]", WHITE, SHADOW);
                self.buttons.push((Button::Restart, restart.clone()));
                text.push(restart);
                text.push(TextLine::centered(cx, top + 8, "ENTER TO RETRY", SHADOW, PANEL));
            }
        }

        if let Some(n) = &self.notification {
            text.push(TextLine::centered(cx, rows / 4, n.text.as_str(), SHADOW, BIRD_Y));
        }
        if rows > 1 {
            text.push(TextLine {
                col: 1,
                row: rows - 1,
                text: "Q QUIT".to_string(),
                fg: WHITE,
                bg: SHADOW,
            });
        }
        text
    }
}

/// Dims the screen and draws a centred panel `rows_tall` cells high. Returns its top row.
fn panel(buf: &mut PixelBuf, rows_tall: u16) -> u16 {
    let (w, h) = (buf.width() as i32, buf.height() as i32);
    buf.dim_rect(0, 0, w, h);

    let panel_w = (w - 4).clamp(1, 40);
    let panel_h = (rows_tall as i32 * 2).min(h - 2).max(2);
    let px = (w - panel_w) / 2;
    // Even pixel row so the panel starts on a cell boundary.
    let py = ((h - panel_h) / 2) & !1;
    buf.fill_rect(px - 1, py - 1, panel_w + 2, panel_h + 2, SHADOW);
    buf.fill_rect(px, py, panel_w, panel_h, DIRT);
    buf.fill_rect(px + 1, py + 1, panel_w - 2, panel_h - 2, PANEL);
    (py / 2) as u16
}

impl Presenter for Hud {
    fn hide_screens(&mut self) {
        self.screen = Screen::Hidden;
        self.notification = None;
        self.buttons.clear();
    }

    fn set_score(&mut self, score: u32) {
        if score > self.score {
            self.cue(Cue::Point);
        }
        self.score = score;
    }

    fn set_high_score(&mut self, high_score: u32) {
        self.high_score = high_score;
    }

    fn show_game_over(&mut self, final_score: u32) {
        self.screen = Screen::GameOver { score: final_score };
        self.cue(Cue::Crash);
    }

    fn show_notification(&mut self, text: &str) {
        self.notification = Some(Notification {
            text: text.to_string(),
            shown_at: Instant::now(),
        });
        self.cue(Cue::LevelUp);
    }
}
