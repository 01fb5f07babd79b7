//! Software-rendered overlay window using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  CHORD: G                              HAND 1  01110  G  │
//! │  SOUNDING: D                           HAND 2  00000  -  │
//! │                                                          │
//! │            [landmark skeleton of each hand]              │
//! │                                                          │
//! │  key legend                                              │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! In simulator mode the window also owns the keyboard: key presses are
//! forwarded as [`SimInput`] events.

use std::sync::mpsc::Sender;
use std::time::Duration;

use finger_pattern::{hand, Finger, FingerPattern, Landmark, LandmarkSet};
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::app::FrameReport;
use crate::error::AppError;
use crate::overlay::{curled_color, finger_color, ChordBanner, Overlay};
use crate::source::{SimInput, SimKey};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:       usize = 640;
pub const WIN_H:       usize = 480;
const MARGIN:          usize = 12;
const HANDS_X:         usize = WIN_W - 196;
const LEGEND_Y:        usize = WIN_H - 18;
const BG_COLOR:        u32   = 0xFF1A1A2E;
const TEXT_BG:         u32   = 0xFF0F3460;
const CHORD_COLOR:     u32   = 0xFFFFD700;  // gold
const FLASH_COLOR:     u32   = 0xFFFFFFFF;
const JOINT_COLOR:     u32   = 0xFFEEEEEE;
const DIM_TEXT:        u32   = 0xFF888888;

const SIM_LEGEND:    &str = "1-5=FINGERS  TAB=HAND  H=SHOW/HIDE  SPACE=FIST  Q=QUIT";
const STREAM_LEGEND: &str = "Q=QUIT";

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf:    Vec<u32>,
    sim_tx: Option<Sender<SimInput>>,
    banner: ChordBanner,
    quit:   bool,
}

impl Visualizer {
    /// Open the window.  Pass the simulator's sender to drive it from the
    /// keyboard; `None` for a view-only window.
    pub fn new(sim_tx: Option<Sender<SimInput>>) -> Result<Self, AppError> {
        let mut window = Window::new(
            "Finger Chords — Q to quit",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| AppError::Window(e.to_string()))?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
            banner: ChordBanner::default(),
            quit:   false,
        })
    }

    /// Poll keyboard inputs and translate to SimInput events.
    fn poll_input(&mut self) {
        if self.window.is_key_pressed(Key::Q, KeyRepeat::No)
            || self.window.is_key_pressed(Key::Escape, KeyRepeat::No)
        {
            self.quit = true;
            self.send(SimKey::Quit);
            return;
        }
        if self.sim_tx.is_none() { return; }

        const FINGER_KEYS: [Key; 5] = [Key::Key1, Key::Key2, Key::Key3, Key::Key4, Key::Key5];
        for (key, finger) in FINGER_KEYS.iter().zip(Finger::ALL) {
            if self.window.is_key_pressed(*key, KeyRepeat::No) {
                self.send(SimKey::Finger(finger));
            }
        }
        if self.window.is_key_pressed(Key::Tab, KeyRepeat::No)   { self.send(SimKey::SwitchHand); }
        if self.window.is_key_pressed(Key::H, KeyRepeat::No)     { self.send(SimKey::ToggleHand); }
        if self.window.is_key_pressed(Key::Space, KeyRepeat::No) { self.send(SimKey::Clear); }
    }

    fn send(&self, key: SimKey) {
        if let Some(tx) = &self.sim_tx {
            let _ = tx.send(SimInput::KeyDown(key));
        }
    }

    /// Render one frame.
    fn render(&mut self, report: &FrameReport) {
        self.buf.fill(BG_COLOR);

        // ── Hands ─────────────────────────────────────────────────────────
        for h in &report.hands {
            self.draw_skeleton(&h.landmarks, h.pattern);
        }

        // ── Recognised / sounding chord ───────────────────────────────────
        self.banner.observe(report.sounding.as_ref());
        let chord_text = match &report.recognised {
            Some(c) => format!("CHORD: {}", c),
            None    => "CHORD: -".to_string(),
        };
        self.fill_rect(0, 0, HANDS_X - MARGIN, 74, TEXT_BG);
        self.draw_text(&chord_text, MARGIN, MARGIN, 4, CHORD_COLOR);

        let sounding_text = match self.banner.chord() {
            Some(c) => format!("SOUNDING: {}", c),
            None    => "SOUNDING: -".to_string(),
        };
        let glow = blend(DIM_TEXT, FLASH_COLOR, self.banner.glow());
        self.draw_text(&sounding_text, MARGIN, MARGIN + 34, 2, glow);

        // ── Per-hand patterns ─────────────────────────────────────────────
        let mut y = MARGIN;
        for (i, h) in report.hands.iter().enumerate() {
            let pattern = h.pattern.map_or_else(|| "?????".to_string(), |p| p.to_string());
            let chord   = h.chord.as_ref().map_or("-", |c| c.as_str());
            let line    = format!("HAND {}  {}  {}", i + 1, pattern, chord);
            self.draw_text(&line, HANDS_X, y, 2, JOINT_COLOR);
            y += 16;
        }
        if report.dropped > 0 {
            self.draw_text(&format!("{} IGNORED", report.dropped), HANDS_X, y, 2, DIM_TEXT);
        }

        // ── Key legend ────────────────────────────────────────────────────
        let legend = if self.sim_tx.is_some() { SIM_LEGEND } else { STREAM_LEGEND };
        self.draw_text(legend, MARGIN, LEGEND_Y, 2, DIM_TEXT);

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Skeleton ──────────────────────────────────────────────────────────

    fn draw_skeleton(&mut self, set: &LandmarkSet, pattern: Option<FingerPattern>) {
        let to_px = |i: usize| set.get(i).and_then(to_pixel);

        for &(a, b) in hand::CONNECTIONS.iter() {
            let (Some(pa), Some(pb)) = (to_px(a), to_px(b)) else { continue };
            let color = match finger_of(b) {
                Some(f) if pattern.map_or(false, |p| p.is_extended(f)) => finger_color(f),
                Some(f) => curled_color(f),
                None    => JOINT_COLOR,
            };
            self.draw_line(pa, pb, color);
        }
        for i in 0..set.len() {
            if let Some((x, y)) = to_px(i) {
                self.fill_dot(x, y, 2, JOINT_COLOR);
            }
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y+h).min(WIN_H) {
            for col in x..(x+w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn set_pixel(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < WIN_W && (y as usize) < WIN_H {
            self.buf[y as usize * WIN_W + x as usize] = color;
        }
    }

    fn fill_dot(&mut self, cx: isize, cy: isize, r: isize, color: u32) {
        for dy in -r..=r {
            for dx in -r..=r {
                self.set_pixel(cx + dx, cy + dy, color);
            }
        }
    }

    /// Bresenham, two pixels thick.
    fn draw_line(&mut self, (x0, y0): (isize, isize), (x1, y1): (isize, isize), color: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            self.set_pixel(x,     y,     color);
            self.set_pixel(x + 1, y,     color);
            self.set_pixel(x,     y + 1, color);
            if x == x1 && y == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    /// Minimal bitmap font — 3×5 glyphs, each pixel drawn `scale`×`scale`.
    fn draw_text(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx + 4 * scale > WIN_W { break; }
        }
    }
}

impl Overlay for Visualizer {
    fn present(&mut self, report: &FrameReport) {
        self.render(report);
        self.poll_input();
    }

    fn quit_requested(&self) -> bool { self.quit || !self.window.is_open() }
}

/// Window pixel for a normalised landmark.  Points far off screen are pulled
/// into a band one window wide around it, so lines stay short.
fn to_pixel(l: &Landmark) -> Option<(isize, isize)> {
    if !(l.x.is_finite() && l.y.is_finite()) { return None; }
    let (w, h) = (WIN_W as f32, WIN_H as f32);
    let x = (l.x * w).clamp(-w, 2.0 * w);
    let y = (l.y * h).clamp(-h, 2.0 * h);
    Some((x as isize, y as isize))
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0 - t) + cb as f32 * t) as u32;
    let channel = |c: u32, shift: u32| (c >> shift) & 0xFF;
    [16, 8, 0].iter().fold(0xFF000000, |acc, &shift| {
        acc | lerp(channel(a, shift), channel(b, shift)) << shift
    })
}

/// Which finger a landmark belongs to; `None` for the wrist.
fn finger_of(index: usize) -> Option<Finger> {
    match index {
        hand::THUMB_CMC..=hand::THUMB_TIP => Some(Finger::Thumb),
        hand::INDEX_MCP..=hand::INDEX_TIP => Some(Finger::Index),
        hand::MIDDLE_MCP..=hand::MIDDLE_TIP => Some(Finger::Middle),
        hand::RING_MCP..=hand::RING_TIP => Some(Finger::Ring),
        hand::PINKY_MCP..=hand::PINKY_TIP => Some(Finger::Pinky),
        _ => None,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '#' => [0b101, 0b111, 0b101, 0b111, 0b101],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '?' => [0b111, 0b001, 0b010, 0b000, 0b010],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn far_off_landmarks_stay_near_the_window() {
        let (x, y) = to_pixel(&Landmark::xy(1e9, -1e9)).unwrap();
        assert_eq!(x, 2 * WIN_W as isize);
        assert_eq!(y, -(WIN_H as isize));
        assert_eq!(to_pixel(&Landmark::xy(0.5, 0.5)), Some((320, 240)));
        assert_eq!(to_pixel(&Landmark::xy(f32::NAN, 0.5)), None);
        assert_eq!(to_pixel(&Landmark::xy(0.5, f32::INFINITY)), None);
    }

    #[test]
    fn blend_endpoints_and_midpoint() {
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 0.0), 0xFF000000);
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 1.0), 0xFFFFFFFF);
        assert_eq!(blend(0xFF000000, 0xFF00C800, 0.5), 0xFF006400);
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 7.0), 0xFFFFFFFF);
    }

    #[test]
    fn every_landmark_but_the_wrist_has_a_finger() {
        assert_eq!(finger_of(hand::WRIST), None);
        assert_eq!(finger_of(hand::THUMB_TIP), Some(Finger::Thumb));
        assert_eq!(finger_of(hand::INDEX_MCP), Some(Finger::Index));
        assert_eq!(finger_of(hand::PINKY_TIP), Some(Finger::Pinky));
        for f in Finger::ALL {
            assert_eq!(finger_of(f.tip()), Some(f));
        }
    }

    #[test]
    fn legend_text_has_glyphs() {
        let fallback = char_glyph('\u{1}');
        for ch in SIM_LEGEND.chars().chain("CHORD: SOUNDING: HAND ? IGNORED".chars()) {
            if ch == '.' { continue; }
            assert!(ch == ' ' || char_glyph(ch) != fallback, "no glyph for {:?}", ch);
        }
    }
}
