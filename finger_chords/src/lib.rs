//! # finger_chords
//!
//! Hand-gesture chord controller: a camera-style poll loop that classifies
//! the extended fingers of each detected hand, looks the pattern up in the
//! chord book and plays the chord on a MIDI synthesizer, holding each
//! chord for a cooldown so a flickering detection cannot thrash the synth.
//!
//! ## Gesture → Chord mapping
//!
//! | Fingers up (thumb → pinky) | Chord | Notes |
//! |---|---|---|
//! | `01000` index | C | C4 E4 G4 |
//! | `01100` index + middle | D | D4 F#4 A4 |
//! | `01110` index + middle + ring | G | G4 B4 D5 |
//! | `01001` index + pinky | A | A4 C#5 E5 |
//!
//! Any other pattern, or no hand, releases the sounding chord once the
//! cooldown has passed.
//!
//! ## Inputs
//!
//! * (default) — **Simulation mode**: a window where the keyboard poses up
//!   to two hands.
//! * `--landmarks <file|->` — **Stream mode**: JSON-lines landmarks from an
//!   external hand detector (see [`stream`]).
//!
//! ### Simulation keyboard shortcuts
//!
//! | Key | Action |
//! |---|---|
//! | `1`–`5` | Toggle thumb … pinky of the selected hand |
//! | `Tab` | Select the other hand (brings it into view) |
//! | `H` | Show / hide the selected hand |
//! | `Space` | Curl every finger of the selected hand |
//! | `Q` | Quit |

pub mod source;
pub mod stream;
pub mod sink;
pub mod overlay;
pub mod visualizer;
pub mod app;
pub mod config;
pub mod error;

pub use app::{drive, perform, run, AppConfig, FrameReport, HandReport, Session};
pub use error::AppError;
