use crate::assets::{Sprite, Sprites};
use crate::config::{AssetPaths, FieldConfig};
use crate::physics::Bird;
use crate::ports::{AssetReport, Renderer};
use crate::spawner::{Obstacle, Side};
use crossterm::{
    cursor, queue,
    style::{self, Color as CColor},
};
use std::f64::consts::FRAC_PI_2;
use std::io::{self, Write};

// ── Colors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn lerp(a: Rgb, b: Rgb, t_256: u16) -> Rgb {
        let t = t_256 as i32;
        Rgb(
            (a.0 as i32 + (b.0 as i32 - a.0 as i32) * t / 256) as u8,
            (a.1 as i32 + (b.1 as i32 - a.1 as i32) * t / 256) as u8,
            (a.2 as i32 + (b.2 as i32 - a.2 as i32) * t / 256) as u8,
        )
    }

    pub const fn dim(self) -> Rgb {
        Rgb(self.0 / 2, self.1 / 2, self.2 / 2)
    }

    fn term(self) -> CColor {
        CColor::Rgb {
            r: self.0,
            g: self.1,
            b: self.2,
        }
    }
}

pub const SKY_TOP: Rgb = Rgb(135, 206, 235);
pub const SKY_BOT: Rgb = Rgb(176, 224, 230);
pub const CLOUD: Rgb = Rgb(232, 244, 248);
pub const LETTERBOX: Rgb = Rgb(24, 28, 36);
pub const DIRT: Rgb = Rgb(210, 185, 110);
pub const PANEL: Rgb = Rgb(220, 195, 120);
const PIPE_L: Rgb = Rgb(74, 122, 26);
const PIPE_M: Rgb = Rgb(100, 170, 40);
const PIPE_R: Rgb = Rgb(115, 191, 46);
const PIPE_HI: Rgb = Rgb(145, 215, 62);
const CAP_DARK: Rgb = Rgb(60, 100, 20);
pub const BIRD_Y: Rgb = Rgb(245, 200, 66);
const BIRD_HI: Rgb = Rgb(255, 225, 100);
const BIRD_WING: Rgb = Rgb(215, 165, 35);
const BIRD_EYE: Rgb = Rgb(255, 255, 255);
const BIRD_PUPIL: Rgb = Rgb(20, 20, 20);
const BIRD_BEAK: Rgb = Rgb(225, 75, 35);
pub const WHITE: Rgb = Rgb(255, 255, 255);
pub const SHADOW: Rgb = Rgb(30, 30, 30);

// ── Pixel buffer with half-block rendering ──────────────────────────────────

pub struct PixelBuf {
    w: usize,
    h: usize, // pixel height = terminal rows * 2
    px: Vec<Rgb>,
    /// Drawing is limited to `[x0, x1) × [y0, y1)` when set.
    clip: Option<(i32, i32, i32, i32)>,
}

impl PixelBuf {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            px: vec![LETTERBOX; w * h],
            clip: None,
        }
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.px.resize(w * h, LETTERBOX);
    }

    pub fn set_clip(&mut self, clip: Option<(i32, i32, i32, i32)>) {
        self.clip = clip;
    }

    pub fn set(&mut self, x: i32, y: i32, c: Rgb) {
        if let Some((x0, y0, x1, y1)) = self.clip {
            if x < x0 || y < y0 || x >= x1 || y >= y1 {
                return;
            }
        }
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.px[y as usize * self.w + x as usize] = c;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Rgb {
        self.px[y * self.w + x]
    }

    pub fn fill(&mut self, c: Rgb) {
        self.px.fill(c);
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, c: Rgb) {
        for dy in 0..h {
            for dx in 0..w {
                self.set(x + dx, y + dy, c);
            }
        }
    }

    /// Halves the brightness of a rectangle (overlay backdrop).
    pub fn dim_rect(&mut self, x: i32, y: i32, w: i32, h: i32) {
        for py in y.max(0)..(y + h).min(self.h as i32) {
            for px in x.max(0)..(x + w).min(self.w as i32) {
                let c = self.get(px as usize, py as usize);
                self.set(px, py, c.dim());
            }
        }
    }

    fn fill_circle(&mut self, cx: i32, cy: i32, r: i32, c: Rgb) {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.set(cx + dx, cy + dy, c);
                }
            }
        }
    }

    /// Nearest-neighbour stretch of `sprite` onto the given rectangle.
    pub fn blit(&mut self, sprite: &Sprite, x: i32, y: i32, w: i32, h: i32) {
        if w <= 0 || h <= 0 || sprite.width() == 0 || sprite.height() == 0 {
            return;
        }
        for dy in 0..h {
            let sy = dy as usize * sprite.height() / h as usize;
            for dx in 0..w {
                let sx = dx as usize * sprite.width() / w as usize;
                if let Some(c) = sprite.pixel(sx, sy) {
                    self.set(x + dx, y + dy, c);
                }
            }
        }
    }

    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        queue!(out, cursor::MoveTo(0, 0))?;
        let rows = self.h / 2;
        let mut prev_fg = Rgb(0, 0, 0);
        let mut prev_bg = Rgb(0, 0, 0);
        let mut need_fg = true;
        let mut need_bg = true;

        for row in 0..rows {
            for col in 0..self.w {
                let top = self.get(col, row * 2);
                let bot = self.get(col, row * 2 + 1);

                if top == bot {
                    if need_bg || prev_bg != top {
                        queue!(out, style::SetBackgroundColor(top.term()))?;
                        prev_bg = top;
                        need_bg = false;
                    }
                    queue!(out, style::Print(' '))?;
                } else {
                    if need_fg || prev_fg != top {
                        queue!(out, style::SetForegroundColor(top.term()))?;
                        prev_fg = top;
                        need_fg = false;
                    }
                    if need_bg || prev_bg != bot {
                        queue!(out, style::SetBackgroundColor(bot.term()))?;
                        prev_bg = bot;
                        need_bg = false;
                    }
                    queue!(out, style::Print('\u{2580}'))?; // ▀
                }
            }
            if row + 1 < rows {
                queue!(out, style::ResetColor, style::Print("\r\n"))?;
                need_fg = true;
                need_bg = true;
            }
        }
        queue!(out, style::ResetColor)?;
        Ok(())
    }
}

/// A run of text printed over the pixels, in terminal cells.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub col: u16,
    pub row: u16,
    pub text: String,
    pub fg: Rgb,
    pub bg: Rgb,
}

impl TextLine {
    /// Horizontally centred on `center_col`.
    pub fn centered(center_col: u16, row: u16, text: impl Into<String>, fg: Rgb, bg: Rgb) -> Self {
        let text = text.into();
        let half = (text.chars().count() / 2) as u16;
        Self {
            col: center_col.saturating_sub(half),
            row,
            text,
            fg,
            bg,
        }
    }

    pub fn contains(&self, col: u16, row: u16) -> bool {
        row == self.row && col >= self.col && col < self.col + self.text.chars().count() as u16
    }
}

pub fn print_text(out: &mut impl Write, lines: &[TextLine]) -> io::Result<()> {
    for line in lines {
        queue!(
            out,
            cursor::MoveTo(line.col, line.row),
            style::SetForegroundColor(line.fg.term()),
            style::SetBackgroundColor(line.bg.term()),
            style::Print(&line.text),
        )?;
    }
    queue!(out, style::ResetColor)?;
    out.flush()
}

// ── 3x5 bitmap digits ──────────────────────────────────────────────────────

#[rustfmt::skip]
const DIGITS: [[u8; 15]; 10] = [
    [1,1,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1], // 0
    [0,1,0, 1,1,0, 0,1,0, 0,1,0, 1,1,1], // 1
    [1,1,1, 0,0,1, 1,1,1, 1,0,0, 1,1,1], // 2
    [1,1,1, 0,0,1, 0,1,1, 0,0,1, 1,1,1], // 3
    [1,0,1, 1,0,1, 1,1,1, 0,0,1, 0,0,1], // 4
    [1,1,1, 1,0,0, 1,1,1, 0,0,1, 1,1,1], // 5
    [1,1,1, 1,0,0, 1,1,1, 1,0,1, 1,1,1], // 6
    [1,1,1, 0,0,1, 0,1,0, 0,1,0, 0,1,0], // 7
    [1,1,1, 1,0,1, 1,1,1, 1,0,1, 1,1,1], // 8
    [1,1,1, 1,0,1, 1,1,1, 0,0,1, 1,1,1], // 9
];

fn draw_digit(buf: &mut PixelBuf, x: i32, y: i32, d: u8, fg: Rgb) {
    let glyph = &DIGITS[d as usize];
    for row in 0..5 {
        for col in 0..3 {
            if glyph[row * 3 + col] == 1 {
                let px = x + col as i32;
                let py = y + row as i32;
                buf.set(px + 1, py + 1, SHADOW);
                buf.set(px, py, fg);
            }
        }
    }
}

/// Draws `n` in the 3x5 font, centred on `cx`.
pub fn draw_number(buf: &mut PixelBuf, cx: i32, y: i32, n: u32, fg: Rgb) {
    let s = n.to_string();
    let total_w = s.len() as i32 * 4 - 1; // 3px per digit + 1px spacing
    let start_x = cx - total_w / 2;
    for (i, ch) in s.bytes().enumerate() {
        draw_digit(buf, start_x + i as i32 * 4, y, ch - b'0', fg);
    }
}

// ── World to pixels ─────────────────────────────────────────────────────────

/// Smallest world-to-pixel scale; below this the field would vanish.
const MIN_SCALE: f64 = 0.05;

/// Uniform scale plus letterboxing of the fixed-size field into the pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub field_w: f64,
    pub field_h: f64,
}

impl Viewport {
    pub fn fit(px_w: usize, px_h: usize, field: &FieldConfig) -> Self {
        let scale = (px_w as f64 / field.width)
            .min(px_h as f64 / field.height)
            .max(MIN_SCALE);
        Self {
            scale,
            offset_x: ((px_w as f64 - field.width * scale) / 2.0).max(0.0),
            offset_y: ((px_h as f64 - field.height * scale) / 2.0).max(0.0),
            field_w: field.width,
            field_h: field.height,
        }
    }

    pub fn to_px(&self, x: f64, y: f64) -> (i32, i32) {
        (
            (self.offset_x + x * self.scale).round() as i32,
            (self.offset_y + y * self.scale).round() as i32,
        )
    }

    /// Pixel rectangle `(x, y, w, h)` covering a world rectangle; never thinner than one pixel.
    pub fn rect_px(&self, x: f64, y: f64, w: f64, h: f64) -> (i32, i32, i32, i32) {
        let (x0, y0) = self.to_px(x, y);
        let (x1, y1) = self.to_px(x + w, y + h);
        (x0, y0, (x1 - x0).max(1), (y1 - y0).max(1))
    }

    /// The field as a clip rectangle `(x0, y0, x1, y1)`.
    pub fn field_clip(&self) -> (i32, i32, i32, i32) {
        let (x0, y0) = self.to_px(0.0, 0.0);
        let (x1, y1) = self.to_px(self.field_w, self.field_h);
        (x0, y0, x1, y1)
    }

    /// World coordinates of a pixel.
    pub fn to_world(&self, px: i32, py: i32) -> (f64, f64) {
        (
            (px as f64 - self.offset_x) / self.scale,
            (py as f64 - self.offset_y) / self.scale,
        )
    }
}

fn pipe_shade(x: i32, total_w: i32) -> Rgb {
    if total_w <= 1 {
        return PIPE_M;
    }
    let t = (x as f64 / (total_w - 1) as f64 * 256.0) as u16;
    if t < 64 {
        Rgb::lerp(PIPE_L, PIPE_M, (t * 4).min(256))
    } else if t < 100 {
        Rgb::lerp(PIPE_M, PIPE_HI, ((t - 64) * 7).min(256))
    } else if t < 160 {
        Rgb::lerp(PIPE_HI, PIPE_R, ((t - 100) * 4).min(256))
    } else {
        Rgb::lerp(PIPE_R, PIPE_L, ((t - 160) * 3).min(256))
    }
}

// ── Terminal renderer ───────────────────────────────────────────────────────

pub struct TerminalRenderer {
    buf: PixelBuf,
    view: Viewport,
    field: FieldConfig,
    sprites: Sprites,
}

impl TerminalRenderer {
    /// `cols × rows` terminal cells; every cell holds two vertical pixels.
    pub fn new(cols: u16, rows: u16, field: FieldConfig) -> Self {
        let (pw, ph) = (cols as usize, rows as usize * 2);
        Self {
            buf: PixelBuf::new(pw, ph),
            view: Viewport::fit(pw, ph, &field),
            field,
            sprites: Sprites::default(),
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        let (pw, ph) = (cols as usize, rows as usize * 2);
        self.buf.resize(pw, ph);
        self.view = Viewport::fit(pw, ph, &self.field);
    }

    pub fn viewport(&self) -> &Viewport {
        &self.view
    }

    pub fn buf(&self) -> &PixelBuf {
        &self.buf
    }

    pub fn buf_mut(&mut self) -> &mut PixelBuf {
        &mut self.buf
    }

    pub fn present(&self, out: &mut impl Write, text: &[TextLine]) -> io::Result<()> {
        self.buf.render(out)?;
        print_text(out, text)
    }

    fn draw_cloud(&mut self, x: f64, y: f64) {
        let s = self.view.scale;
        for (dx, r) in [(0.0, 20.0), (25.0, 25.0), (50.0, 20.0)] {
            let (cx, cy) = self.view.to_px(x + dx, y);
            self.buf.fill_circle(cx, cy, ((r * s).round() as i32).max(1), CLOUD);
        }
    }

    fn draw_pipe(&mut self, pipe: &Obstacle) {
        let (px, py, pw, ph) = self.view.rect_px(pipe.x, pipe.y, pipe.width, pipe.height);
        if let Some(sprite) = &self.sprites.pipe {
            self.buf.blit(sprite, px, py, pw, ph);
            return;
        }

        for x in 0..pw {
            let c = pipe_shade(x, pw);
            for y in py..py + ph {
                self.buf.set(px + x, y, c);
            }
        }

        // Cap on the gap side.
        let cap_extra = (4.0 * self.view.scale).round().max(1.0) as i32;
        let cap_h = ((24.0 * self.view.scale).round() as i32).clamp(1, ph);
        let cap_y = match pipe.side {
            Side::Upper => py + ph - cap_h,
            Side::Lower => py,
        };
        for x in -cap_extra..(pw + cap_extra) {
            let c = pipe_shade(x + cap_extra, pw + cap_extra * 2);
            for y in cap_y..cap_y + cap_h {
                self.buf.set(px + x, y, c);
            }
            cap_edges(&mut self.buf, px + x, cap_y, cap_h);
        }
    }

    fn draw_procedural_bird(&mut self, bird: &Bird) {
        let (x, y, w, h) = self.view.rect_px(bird.x, bird.y, bird.width, bird.height);
        // Pitch shifts wing and beak by up to a third of the height.
        let tilt = ((bird.rotation / FRAC_PI_2).clamp(-1.0, 1.0) * (h as f64 / 3.0)).round() as i32;

        let body_w = ((w as f64 * 0.8).round() as i32).max(1);
        self.buf.fill_rect(x, y, body_w, h, BIRD_Y);
        self.buf.fill_rect(x + 1, y, (body_w - 2).max(1), 1, BIRD_HI);

        let wing_w = ((w as f64 * 0.4).round() as i32).max(1);
        let wing_h = (h / 3).max(1);
        self.buf.fill_rect(x, y + h / 2 + tilt, wing_w, wing_h, BIRD_WING);

        let eye = (w / 8).max(1);
        let ex = x + body_w - eye - 1;
        let ey = y + (h / 4).max(1) - 1;
        self.buf.fill_rect(ex, ey, eye + 1, eye + 1, BIRD_EYE);
        self.buf.set(ex + eye, ey + eye, BIRD_PUPIL);

        let beak_w = (w - body_w).max(1);
        let beak_h = (h / 3).max(1);
        self.buf
            .fill_rect(x + body_w, y + h / 2 - beak_h / 2 + tilt, beak_w, beak_h, BIRD_BEAK);
    }
}

fn cap_edges(buf: &mut PixelBuf, x: i32, cap_y: i32, cap_h: i32) {
    buf.set(x, cap_y, CAP_DARK);
    buf.set(x, cap_y + cap_h - 1, CAP_DARK);
}

impl Renderer for TerminalRenderer {
    fn load_assets(&mut self, paths: &AssetPaths) -> AssetReport {
        let (sprites, report) = Sprites::load(paths);
        self.sprites = sprites;
        report
    }

    fn clear(&mut self) {
        self.buf.set_clip(None);
        self.buf.fill(LETTERBOX);
        self.buf.set_clip(Some(self.view.field_clip()));
    }

    fn draw_background(&mut self) {
        let (x0, y0, x1, y1) = self.view.field_clip();
        if let Some(sprite) = &self.sprites.background {
            self.buf.blit(sprite, x0, y0, x1 - x0, y1 - y0);
            return;
        }
        let span = (y1 - y0).max(1);
        for y in y0..y1 {
            let t = ((y - y0) * 256 / span) as u16;
            let c = Rgb::lerp(SKY_TOP, SKY_BOT, t);
            for x in x0..x1 {
                self.buf.set(x, y, c);
            }
        }
        for (cx, cy) in [(80.0, 100.0), (250.0, 150.0), (150.0, 250.0)] {
            self.draw_cloud(cx, cy);
        }
    }

    fn draw_bird(&mut self, bird: &Bird) {
        if let Some(sprite) = &self.sprites.bird {
            let (x, y, w, h) = self.view.rect_px(bird.x, bird.y, bird.width, bird.height);
            self.buf.blit(sprite, x, y, w, h);
        } else {
            self.draw_procedural_bird(bird);
        }
    }

    fn draw_pipes(&mut self, pipes: &[Obstacle]) {
        for pipe in pipes {
            self.draw_pipe(pipe);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> FieldConfig {
        FieldConfig::default()
    }

    #[test]
    fn test_viewport_letterboxes_wide_terminal() {
        // 200 x 60 pixels: height limits the scale.
        let v = Viewport::fit(200, 60, &field());
        assert!((v.scale - 0.1).abs() < 1e-12);
        assert!((v.offset_x - 80.0).abs() < 1e-12);
        assert_eq!(v.offset_y, 0.0);
        assert_eq!(v.field_clip(), (80, 0, 120, 60));
    }

    #[test]
    fn test_viewport_round_trip() {
        let v = Viewport::fit(120, 120, &field());
        let (px, py) = v.to_px(200.0, 300.0);
        let (wx, wy) = v.to_world(px, py);
        assert!((wx - 200.0).abs() <= 1.0 / v.scale);
        assert!((wy - 300.0).abs() <= 1.0 / v.scale);
    }

    #[test]
    fn test_rect_never_vanishes() {
        let v = Viewport::fit(40, 40, &field());
        let (_, _, w, h) = v.rect_px(0.0, 0.0, 1.0, 1.0);
        assert_eq!((w, h), (1, 1));
    }

    #[test]
    fn test_clip_limits_drawing() {
        let mut buf = PixelBuf::new(10, 10);
        buf.set_clip(Some((2, 2, 4, 4)));
        buf.fill_rect(0, 0, 10, 10, WHITE);
        assert_eq!(buf.get(0, 0), LETTERBOX);
        assert_eq!(buf.get(2, 2), WHITE);
        assert_eq!(buf.get(3, 3), WHITE);
        assert_eq!(buf.get(4, 4), LETTERBOX);
    }

    #[test]
    fn test_render_writes_half_blocks() {
        let mut buf = PixelBuf::new(2, 2);
        buf.set(0, 0, WHITE);
        let mut out = Vec::new();
        buf.render(&mut out).unwrap();
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains('\u{2580}'));
    }

    #[test]
    fn test_text_hit_box() {
        let line = TextLine::centered(20, 5, "[ START ]", WHITE, SHADOW);
        assert_eq!(line.col, 16);
        assert!(line.contains(16, 5));
        assert!(line.contains(24, 5));
        assert!(!line.contains(25, 5));
        assert!(!line.contains(20, 6));
    }

    #[test]
    fn test_draws_stay_inside_field() {
        let mut r = TerminalRenderer::new(100, 30, field());
        r.clear();
        r.draw_background();
        let bird = Bird::new(100.0, 250.0, 40.0, 30.0);
        r.draw_bird(&bird);
        let pipe = Obstacle {
            x: 380.0,
            y: 0.0,
            width: 60.0,
            height: 200.0,
            passed: false,
            pair: 0,
            side: Side::Upper,
        };
        r.draw_pipes(&[pipe]);

        let (x0, _, x1, _) = r.viewport().field_clip();
        for y in 0..r.buf().height() {
            for x in 0..r.buf().width() {
                let inside = (x as i32) >= x0 && (x as i32) < x1;
                if !inside {
                    assert_eq!(r.buf().get(x, y), LETTERBOX);
                }
            }
        }
        let (bx, by) = r.viewport().to_px(110.0, 265.0);
        assert_ne!(r.buf().get(bx as usize, by as usize), SKY_TOP);
    }
}
