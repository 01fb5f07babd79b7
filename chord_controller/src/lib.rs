//! # chord_controller
//!
//! The chord transition state machine.  Each poll-loop iteration hands the
//! controller the finger pattern it saw (or none) plus the frame time; the
//! controller answers with the MIDI actions to perform.
//!
//! ## Policy
//!
//! * A recognised chord that is already sounding is sustained.
//! * A different recognised chord replaces the sounding one only once the
//!   cooldown since the last transition has passed (`NoteOff` old, then
//!   `NoteOn` new).  With nothing sounding it starts immediately.
//! * No recognised chord releases the sounding one, again only after the
//!   cooldown, so a briefly lost hand does not cut the chord.
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use chord_controller::{Action, ChordController};
//! use finger_pattern::FingerPattern;
//!
//! let mut ctl = ChordController::reference();
//! let t0 = Instant::now();
//!
//! let actions = ctl.update(Some(FingerPattern::from_bits([0, 1, 0, 0, 0])), t0);
//! assert_eq!(actions.len(), 1);
//! assert!(actions[0].is_note_on());
//! assert_eq!(actions[0].notes(), &[60, 64, 67]);
//!
//! // Hand lost half a second later: still inside the cooldown.
//! assert!(ctl.update(None, t0 + Duration::from_millis(500)).is_empty());
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use chord_table::{ChordBook, ChordName};
use finger_pattern::FingerPattern;
use log::{debug, info};
use thiserror::Error;

/// Minimum time between chord transitions in the stock setup.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(2);

// ════════════════════════════════════════════════════════════════════════════
// Action
// ════════════════════════════════════════════════════════════════════════════

/// A MIDI side effect requested by the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Start sounding every note of `chord`.
    NoteOn  { chord: ChordName, notes: Vec<u8> },
    /// Stop every note of `chord`.
    NoteOff { chord: ChordName, notes: Vec<u8> },
}

impl Action {
    pub fn chord(&self) -> &ChordName {
        match self {
            Action::NoteOn { chord, .. } | Action::NoteOff { chord, .. } => chord,
        }
    }

    pub fn notes(&self) -> &[u8] {
        match self {
            Action::NoteOn { notes, .. } | Action::NoteOff { notes, .. } => notes,
        }
    }

    pub fn is_note_on(&self) -> bool { matches!(self, Action::NoteOn { .. }) }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::NoteOn  { chord, notes } => write!(f, "note-on  {} {:?}", chord, notes),
            Action::NoteOff { chord, notes } => write!(f, "note-off {} {:?}", chord, notes),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PlaybackState
// ════════════════════════════════════════════════════════════════════════════

/// What is sounding right now.
///
/// Invariant: when `active_chord` is set its notes have been switched on
/// and not yet off.  At most one chord is active.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlaybackState {
    active_chord:    Option<ChordName>,
    last_transition: Option<Instant>,
}

impl PlaybackState {
    pub fn active_chord(&self) -> Option<&ChordName> { self.active_chord.as_ref() }

    /// When the active chord last changed; `None` before the first chord.
    pub fn last_transition(&self) -> Option<Instant> { self.last_transition }

    pub fn is_silent(&self) -> bool { self.active_chord.is_none() }
}

// ════════════════════════════════════════════════════════════════════════════
// HandPrecedence
// ════════════════════════════════════════════════════════════════════════════

/// How several hands in one frame share the single chord voice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HandPrecedence {
    /// The first hand (detector order) showing a known chord decides the
    /// frame; later hands are ignored.
    #[default]
    FirstRecognized,
    /// Every hand updates the controller in turn, so a later hand can
    /// override an earlier one within the same frame.
    Sequential,
}

impl HandPrecedence {
    pub fn name(self) -> &'static str {
        match self {
            HandPrecedence::FirstRecognized => "first",
            HandPrecedence::Sequential      => "sequential",
        }
    }
}

impl fmt::Display for HandPrecedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown hand precedence {0:?} (expected \"first\" or \"sequential\")")]
pub struct PrecedenceParseError(pub String);

impl FromStr for HandPrecedence {
    type Err = PrecedenceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" | "first-recognized" => Ok(HandPrecedence::FirstRecognized),
            "sequential" | "last"        => Ok(HandPrecedence::Sequential),
            _ => Err(PrecedenceParseError(s.to_string())),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ChordController
// ════════════════════════════════════════════════════════════════════════════

/// Owns the [`PlaybackState`] and applies the transition policy to it.
#[derive(Clone, Debug)]
pub struct ChordController {
    book:     ChordBook,
    cooldown: Duration,
    state:    PlaybackState,
}

impl ChordController {
    pub fn new(book: ChordBook, cooldown: Duration) -> Self {
        ChordController { book, cooldown, state: PlaybackState::default() }
    }

    /// Stock chord book with the 2 s cooldown.
    pub fn reference() -> Self {
        ChordController::new(ChordBook::reference(), DEFAULT_COOLDOWN)
    }

    pub fn book(&self)     -> &ChordBook       { &self.book }
    pub fn cooldown(&self) -> Duration         { self.cooldown }
    pub fn state(&self)    -> &PlaybackState   { &self.state }

    pub fn active_chord(&self) -> Option<&ChordName> { self.state.active_chord.as_ref() }

    /// Feed one observation.  `pattern` is `None` when no hand was seen.
    pub fn update(&mut self, pattern: Option<FingerPattern>, now: Instant) -> Vec<Action> {
        let recognised = pattern.and_then(|p| self.book.chord_for(p)).cloned();

        match recognised {
            Some(chord) => {
                if self.state.active_chord.as_ref() == Some(&chord) {
                    return Vec::new();
                }
                if self.state.active_chord.is_some() && !self.cooled_down(now) {
                    debug!("{} recognised inside cooldown, holding {}",
                           chord, self.state.active_chord.as_ref().map_or("-", |c| c.as_str()));
                    return Vec::new();
                }

                let mut actions = Vec::with_capacity(2);
                if let Some(previous) = self.state.active_chord.take() {
                    actions.push(self.note_off(previous));
                }
                info!("chord {} on", chord);
                actions.push(Action::NoteOn { notes: self.notes_of(&chord), chord: chord.clone() });
                self.state.active_chord    = Some(chord);
                self.state.last_transition = Some(now);
                actions
            }
            None => {
                if self.state.active_chord.is_some() && self.cooled_down(now) {
                    let previous = self.state.active_chord.take();
                    previous.map(|c| vec![self.note_off(c)]).unwrap_or_default()
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Feed every hand classified in one frame, resolved by `precedence`.
    ///
    /// An empty slice counts as "no hand".
    pub fn update_frame(
        &mut self,
        patterns:   &[FingerPattern],
        now:        Instant,
        precedence: HandPrecedence,
    ) -> Vec<Action> {
        match precedence {
            HandPrecedence::FirstRecognized => {
                let chosen = patterns.iter().copied()
                    .find(|p| self.book.chord_for(*p).is_some());
                self.update(chosen, now)
            }
            HandPrecedence::Sequential => {
                if patterns.is_empty() {
                    return self.update(None, now);
                }
                patterns.iter()
                    .flat_map(|&p| self.update(Some(p), now))
                    .collect()
            }
        }
    }

    /// Stop whatever is sounding, ignoring the cooldown.  Used on shutdown.
    pub fn release_all(&mut self) -> Vec<Action> {
        match self.state.active_chord.take() {
            Some(chord) => vec![self.note_off(chord)],
            None        => Vec::new(),
        }
    }

    // ── internals ─────────────────────────────────────────────────────────

    fn cooled_down(&self, now: Instant) -> bool {
        match self.state.last_transition {
            Some(t) => now.saturating_duration_since(t) > self.cooldown,
            None    => true,
        }
    }

    fn note_off(&self, chord: ChordName) -> Action {
        info!("chord {} off", chord);
        Action::NoteOff { notes: self.notes_of(&chord), chord }
    }

    fn notes_of(&self, chord: &ChordName) -> Vec<u8> {
        self.book.notes_of(chord).map(<[u8]>::to_vec).unwrap_or_default()
    }
}

impl Default for ChordController {
    fn default() -> Self { ChordController::reference() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
