//! Display side of the loop.
//!
//! [`Overlay`] receives a [`FrameReport`] after every processed frame and
//! is asked once per iteration whether the user wants out.  The windowed
//! implementation lives in [`crate::visualizer`]; [`ConsoleOverlay`] is the
//! headless one.  The finger palette and the chord-banner animation are shared here.

use chord_table::ChordName;
use finger_pattern::Finger;
use log::info;

use crate::app::FrameReport;

// ════════════════════════════════════════════════════════════════════════════
// Overlay trait
// ════════════════════════════════════════════════════════════════════════════

pub trait Overlay {
    /// Show the outcome of one frame.
    fn present(&mut self, report: &FrameReport);

    /// True once the user asked to stop (key or window close).
    fn quit_requested(&self) -> bool;
}

impl<O: Overlay + ?Sized> Overlay for Box<O> {
    fn present(&mut self, report: &FrameReport) { (**self).present(report) }
    fn quit_requested(&self) -> bool { (**self).quit_requested() }
}

// ════════════════════════════════════════════════════════════════════════════
// ConsoleOverlay
// ════════════════════════════════════════════════════════════════════════════

/// Logs each change of the recognised chord.  Never asks to quit; headless
/// runs end with their input.
#[derive(Debug, Default)]
pub struct ConsoleOverlay {
    last:   Option<ChordName>,
    frames: usize,
}

impl ConsoleOverlay {
    pub fn new() -> Self { ConsoleOverlay::default() }
    pub fn frames(&self) -> usize { self.frames }
}

impl Overlay for ConsoleOverlay {
    fn present(&mut self, report: &FrameReport) {
        self.frames += 1;
        if report.recognised != self.last {
            match &report.recognised {
                Some(chord) => info!("Chord: {}", chord),
                None        => info!("Chord: -"),
            }
            self.last = report.recognised.clone();
        }
    }

    fn quit_requested(&self) -> bool { false }
}

// ════════════════════════════════════════════════════════════════════════════
// Color palette
// ════════════════════════════════════════════════════════════════════════════

/// One hue per finger, thumb first, spread around the wheel.
pub fn finger_color(finger: Finger) -> u32 {
    let hue = finger.slot() as f32 / Finger::ALL.len() as f32 * 360.0;
    hsv_to_argb(hue, 0.75, 0.95)
}

/// Dimmed version of [`finger_color`] for curled fingers.
pub fn curled_color(finger: Finger) -> u32 {
    let hue = finger.slot() as f32 / Finger::ALL.len() as f32 * 360.0;
    hsv_to_argb(hue, 0.35, 0.45)
}

/// Convert HSV → packed ARGB (0xAARRGGBB, A=0xFF).
fn hsv_to_argb(h: f32, s: f32, v: f32) -> u32 {
    let h  = h.rem_euclid(360.0);
    let hi = (h / 60.0) as u32;
    let f  = h / 60.0 - hi as f32;
    let p  = v * (1.0 - s);
    let q  = v * (1.0 - s * f);
    let t  = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match hi {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    let ri = (r * 255.0) as u32;
    let gi = (g * 255.0) as u32;
    let bi = (b * 255.0) as u32;
    0xFF000000 | (ri << 16) | (gi << 8) | bi
}

// ════════════════════════════════════════════════════════════════════════════
// ChordBanner — flash when the sounding chord changes
// ════════════════════════════════════════════════════════════════════════════

/// Tracks the sounding chord and a glow that starts at 1.0 on every change
/// and fades a little each frame.
#[derive(Clone, Debug, Default)]
pub struct ChordBanner {
    chord: Option<ChordName>,
    glow:  f32,
}

impl ChordBanner {
    pub fn chord(&self) -> Option<&ChordName> { self.chord.as_ref() }
    pub fn glow(&self)  -> f32                { self.glow }

    /// Feed this frame's sounding chord, then advance the fade.
    pub fn observe(&mut self, sounding: Option<&ChordName>) {
        if sounding != self.chord.as_ref() {
            self.chord = sounding.cloned();
            self.glow  = 1.0;
        } else {
            self.glow *= 0.9;
            if self.glow < 0.01 { self.glow = 0.0; }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
