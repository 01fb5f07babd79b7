//! # chord_table
//!
//! The two lookup tables behind gesture playback:
//!
//! * **Chord table** — [`FingerPattern`] → [`ChordName`]
//! * **Note table**  — [`ChordName`] → MIDI note numbers
//!
//! Both are fixed once a [`ChordBook`] is built and never change while
//! playing.  [`ChordBook::reference`] is the stock four-chord layout:
//!
//! | Pattern (thumb…pinky) | Chord | Notes |
//! |---|---|---|
//! | `01000` | C | 60 64 67 |
//! | `01100` | D | 62 66 69 |
//! | `01110` | G | 67 71 74 |
//! | `01001` | A | 69 73 76 |
//!
//! ## Custom books
//!
//! ```rust
//! use chord_table::{ChordBook, Quality, triad};
//! use finger_pattern::FingerPattern;
//!
//! let book = ChordBook::builder()
//!     .chord(FingerPattern::from_bits([0, 1, 0, 0, 0]), "Am", &triad(57, Quality::Minor).unwrap())
//!     .chord(FingerPattern::from_bits([1, 1, 0, 0, 0]), "E",  &triad(52, Quality::Major).unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(book.notes_of(&"Am".into()), Some(&[57, 60, 64][..]));
//! ```

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use finger_pattern::FingerPattern;
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// General MIDI programs
// ════════════════════════════════════════════════════════════════════════════

/// A General MIDI program number (0–127, as sent in Program Change).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GmProgram(u8);

impl GmProgram {
    pub const ACOUSTIC_GRAND_PIANO: GmProgram = GmProgram(0);
    pub const ELECTRIC_PIANO_1:     GmProgram = GmProgram(4);
    pub const VIBRAPHONE:           GmProgram = GmProgram(11);
    pub const DRAWBAR_ORGAN:        GmProgram = GmProgram(16);
    pub const ACOUSTIC_GUITAR:      GmProgram = GmProgram(24);
    pub const STRING_ENSEMBLE:      GmProgram = GmProgram(48);
    pub const PAD_WARM:             GmProgram = GmProgram(89);

    /// Values above 127 are clamped.
    pub fn new(program: u8) -> Self { GmProgram(program.min(127)) }

    /// Raw MIDI program number.
    pub fn program(self) -> u8 { self.0 }

    /// The GM instrument family (eight programs each).
    pub fn family(self) -> &'static str {
        const FAMILIES: [&str; 16] = [
            "Piano", "Chromatic Percussion", "Organ", "Guitar",
            "Bass", "Strings", "Ensemble", "Brass",
            "Reed", "Pipe", "Synth Lead", "Synth Pad",
            "Synth Effects", "Ethnic", "Percussive", "Sound Effects",
        ];
        FAMILIES[(self.0 / 8) as usize]
    }

    /// Instrument name for the common programs, family name otherwise.
    pub fn name(self) -> &'static str {
        match self.0 {
            0  => "Acoustic Grand Piano",
            1  => "Bright Acoustic Piano",
            4  => "Electric Piano 1",
            11 => "Vibraphone",
            16 => "Drawbar Organ",
            19 => "Church Organ",
            24 => "Acoustic Guitar (nylon)",
            25 => "Acoustic Guitar (steel)",
            32 => "Acoustic Bass",
            40 => "Violin",
            48 => "String Ensemble 1",
            52 => "Choir Aahs",
            56 => "Trumpet",
            73 => "Flute",
            80 => "Lead 1 (Square)",
            88 => "Pad 1 (New Age)",
            89 => "Pad 2 (Warm)",
            _  => self.family(),
        }
    }
}

impl Default for GmProgram {
    fn default() -> Self { GmProgram::ACOUSTIC_GRAND_PIANO }
}

impl fmt::Display for GmProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.name())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Note names and triads
// ════════════════════════════════════════════════════════════════════════════

/// Scientific pitch name of a MIDI note, e.g. `60` → `"C4"`.
pub fn note_name(note: u8) -> String {
    const NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
    let octave = (note / 12) as i32 - 1;
    format!("{}{}", NAMES[(note % 12) as usize], octave)
}

/// Triad quality, as semitone offsets above the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Sus2,
    Sus4,
}

impl Quality {
    pub fn intervals(self) -> [u8; 3] {
        match self {
            Quality::Major      => [0, 4, 7],
            Quality::Minor      => [0, 3, 7],
            Quality::Diminished => [0, 3, 6],
            Quality::Augmented  => [0, 4, 8],
            Quality::Sus2       => [0, 2, 7],
            Quality::Sus4       => [0, 5, 7],
        }
    }
}

/// Root-position triad on `root`, or `None` if any note would pass 127.
pub fn triad(root: u8, quality: Quality) -> Option<[u8; 3]> {
    let [a, b, c] = quality.intervals();
    Some([
        root.checked_add(a).filter(|&n| n <= 127)?,
        root.checked_add(b).filter(|&n| n <= 127)?,
        root.checked_add(c).filter(|&n| n <= 127)?,
    ])
}

// ════════════════════════════════════════════════════════════════════════════
// ChordName
// ════════════════════════════════════════════════════════════════════════════

/// Identifier of a chord, e.g. `"C"` or `"Am"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChordName(String);

impl ChordName {
    pub fn new(name: impl Into<String>) -> Self { ChordName(name.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ChordName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for ChordName {
    fn from(s: &str) -> Self { ChordName(s.to_string()) }
}

impl From<String> for ChordName {
    fn from(s: String) -> Self { ChordName(s) }
}

impl Borrow<str> for ChordName {
    fn borrow(&self) -> &str { &self.0 }
}

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChordTableError {
    #[error("pattern {0} is mapped to more than one chord")]
    DuplicatePattern(FingerPattern),

    #[error("chord {0} has no entry in the note table")]
    MissingNotes(ChordName),

    #[error("chord {0} has an empty note list")]
    EmptyChord(ChordName),

    #[error("chord {chord} has note {note}, outside MIDI range 0–127")]
    NoteOutOfRange { chord: ChordName, note: u8 },

    #[error("chord {0} is given two different note lists")]
    ConflictingNotes(ChordName),
}

// ════════════════════════════════════════════════════════════════════════════
// ChordTable / NoteTable
// ════════════════════════════════════════════════════════════════════════════

/// Finger pattern → chord name.  Patterns absent from the table mean
/// "no chord".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChordTable {
    entries: BTreeMap<FingerPattern, ChordName>,
}

impl ChordTable {
    pub fn get(&self, pattern: FingerPattern) -> Option<&ChordName> {
        self.entries.get(&pattern)
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Entries in pattern order.
    pub fn iter(&self) -> impl Iterator<Item = (FingerPattern, &ChordName)> {
        self.entries.iter().map(|(p, c)| (*p, c))
    }
}

/// Chord name → MIDI notes, sounded together.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NoteTable {
    entries: BTreeMap<ChordName, Vec<u8>>,
}

impl NoteTable {
    pub fn get(&self, chord: &str) -> Option<&[u8]> {
        self.entries.get(chord).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

// ════════════════════════════════════════════════════════════════════════════
// ChordBook
// ════════════════════════════════════════════════════════════════════════════

/// A validated chord table + note table pair.
///
/// Every chord reachable from a pattern has at least one note, and every
/// note is a valid MIDI number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChordBook {
    chords: ChordTable,
    notes:  NoteTable,
}

impl ChordBook {
    /// Validate and combine two tables.
    pub fn new(chords: ChordTable, notes: NoteTable) -> Result<Self, ChordTableError> {
        for (_, name) in chords.iter() {
            let list = notes.get(name.as_str())
                .ok_or_else(|| ChordTableError::MissingNotes(name.clone()))?;
            if list.is_empty() {
                return Err(ChordTableError::EmptyChord(name.clone()));
            }
            if let Some(&note) = list.iter().find(|&&n| n > 127) {
                return Err(ChordTableError::NoteOutOfRange { chord: name.clone(), note });
            }
        }
        Ok(ChordBook { chords, notes })
    }

    pub fn builder() -> ChordBookBuilder { ChordBookBuilder::default() }

    /// Four major triads: C, D, G and A.
    pub fn reference() -> Self {
        let rows: [(u8, &str, u8); 4] = [
            (0b01000, "C", 60),
            (0b01100, "D", 62),
            (0b01110, "G", 67),
            (0b01001, "A", 69),
        ];
        let mut chords = BTreeMap::new();
        let mut notes  = BTreeMap::new();
        for (mask, name, root) in rows {
            let pattern = FingerPattern::from_bits([
                (mask >> 4) & 1, (mask >> 3) & 1, (mask >> 2) & 1, (mask >> 1) & 1, mask & 1,
            ]);
            let [a, b, c] = Quality::Major.intervals();
            chords.insert(pattern, ChordName::from(name));
            notes.insert(ChordName::from(name), vec![root + a, root + b, root + c]);
        }
        ChordBook {
            chords: ChordTable { entries: chords },
            notes:  NoteTable  { entries: notes  },
        }
    }

    /// Chord recognised for `pattern`, if any.
    pub fn chord_for(&self, pattern: FingerPattern) -> Option<&ChordName> {
        self.chords.get(pattern)
    }

    /// Notes sounded for `chord`, if the book knows it.
    pub fn notes_of(&self, chord: &ChordName) -> Option<&[u8]> {
        self.notes.get(chord.as_str())
    }

    /// Chord and notes for `pattern` in one step.
    pub fn lookup(&self, pattern: FingerPattern) -> Option<(&ChordName, &[u8])> {
        let name = self.chord_for(pattern)?;
        Some((name, self.notes_of(name)?))
    }

    pub fn chords(&self) -> &ChordTable { &self.chords }
    pub fn notes(&self) -> &NoteTable { &self.notes }

    /// `(pattern, chord, notes)` rows in pattern order.
    pub fn rows(&self) -> impl Iterator<Item = (FingerPattern, &ChordName, &[u8])> {
        self.chords.iter().filter_map(move |(p, name)| {
            self.notes_of(name).map(|notes| (p, name, notes))
        })
    }
}

impl Default for ChordBook {
    fn default() -> Self { ChordBook::reference() }
}

// ════════════════════════════════════════════════════════════════════════════
// ChordBookBuilder
// ════════════════════════════════════════════════════════════════════════════

/// Collects `(pattern, chord, notes)` rows and validates them in
/// [`build`](ChordBookBuilder::build).
///
/// Several patterns may share one chord as long as they give the same
/// notes.
#[derive(Debug, Default)]
pub struct ChordBookBuilder {
    rows: Vec<(FingerPattern, ChordName, Vec<u8>)>,
}

impl ChordBookBuilder {
    pub fn chord(mut self, pattern: FingerPattern, name: impl Into<ChordName>, notes: &[u8]) -> Self {
        self.rows.push((pattern, name.into(), notes.to_vec()));
        self
    }

    pub fn build(self) -> Result<ChordBook, ChordTableError> {
        let mut chords = BTreeMap::new();
        let mut notes: BTreeMap<ChordName, Vec<u8>> = BTreeMap::new();

        for (pattern, name, list) in self.rows {
            if chords.insert(pattern, name.clone()).is_some() {
                return Err(ChordTableError::DuplicatePattern(pattern));
            }
            match notes.get(&name) {
                Some(existing) if *existing != list => {
                    return Err(ChordTableError::ConflictingNotes(name));
                }
                Some(_) => {}
                None    => { notes.insert(name, list); }
            }
        }

        ChordBook::new(ChordTable { entries: chords }, NoteTable { entries: notes })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn p(bits: [u8; 5]) -> FingerPattern { FingerPattern::from_bits(bits) }

    // ── reference book ───────────────────────────────────────────────────
    #[test]
    fn reference_patterns() {
        let book = ChordBook::reference();
        assert_eq!(book.chord_for(p([0, 1, 0, 0, 0])).map(ChordName::as_str), Some("C"));
        assert_eq!(book.chord_for(p([0, 1, 1, 0, 0])).map(ChordName::as_str), Some("D"));
        assert_eq!(book.chord_for(p([0, 1, 1, 1, 0])).map(ChordName::as_str), Some("G"));
        assert_eq!(book.chord_for(p([0, 1, 0, 0, 1])).map(ChordName::as_str), Some("A"));
        assert_eq!(book.chords().len(), 4);
    }

    #[test]
    fn reference_notes() {
        let book = ChordBook::reference();
        assert_eq!(book.notes_of(&"C".into()), Some(&[60, 64, 67][..]));
        assert_eq!(book.notes_of(&"D".into()), Some(&[62, 66, 69][..]));
        assert_eq!(book.notes_of(&"G".into()), Some(&[67, 71, 74][..]));
        assert_eq!(book.notes_of(&"A".into()), Some(&[69, 73, 76][..]));
    }

    #[test]
    fn unknown_patterns_have_no_chord() {
        let book = ChordBook::reference();
        assert!(book.chord_for(FingerPattern::OPEN).is_none());
        assert!(book.chord_for(FingerPattern::FIST).is_none());
        assert!(book.lookup(p([1, 1, 0, 0, 0])).is_none());
    }

    #[test]
    fn reference_passes_validation() {
        let book = ChordBook::reference();
        let rebuilt = ChordBook::new(book.chords().clone(), book.notes().clone()).unwrap();
        assert_eq!(rebuilt, book);
    }

    #[test]
    fn rows_in_pattern_order() {
        let book = ChordBook::reference();
        let names: Vec<_> = book.rows().map(|(_, n, _)| n.as_str()).collect();
        // 01000 < 01001 < 01100 < 01110
        assert_eq!(names, ["C", "A", "D", "G"]);
    }

    // ── builder validation ───────────────────────────────────────────────
    #[test]
    fn builder_rejects_duplicate_pattern() {
        let err = ChordBook::builder()
            .chord(p([0, 1, 0, 0, 0]), "C", &[60, 64, 67])
            .chord(p([0, 1, 0, 0, 0]), "D", &[62, 66, 69])
            .build().unwrap_err();
        assert_eq!(err, ChordTableError::DuplicatePattern(p([0, 1, 0, 0, 0])));
    }

    #[test]
    fn builder_rejects_empty_and_out_of_range() {
        let err = ChordBook::builder()
            .chord(p([0, 1, 0, 0, 0]), "X", &[])
            .build().unwrap_err();
        assert_eq!(err, ChordTableError::EmptyChord("X".into()));

        let err = ChordBook::builder()
            .chord(p([0, 1, 0, 0, 0]), "Hi", &[120, 130])
            .build().unwrap_err();
        assert_eq!(err, ChordTableError::NoteOutOfRange { chord: "Hi".into(), note: 130 });
    }

    #[test]
    fn builder_allows_shared_chord_with_same_notes() {
        let book = ChordBook::builder()
            .chord(p([0, 1, 0, 0, 0]), "C", &[60, 64, 67])
            .chord(p([1, 1, 0, 0, 0]), "C", &[60, 64, 67])
            .build().unwrap();
        assert_eq!(book.chords().len(), 2);
        assert_eq!(book.notes().len(), 1);

        let err = ChordBook::builder()
            .chord(p([0, 1, 0, 0, 0]), "C", &[60, 64, 67])
            .chord(p([1, 1, 0, 0, 0]), "C", &[48, 52, 55])
            .build().unwrap_err();
        assert_eq!(err, ChordTableError::ConflictingNotes("C".into()));
    }

    #[test]
    fn new_rejects_missing_notes() {
        let mut chords = ChordTable::default();
        chords.entries.insert(p([0, 0, 0, 0, 1]), "Ghost".into());
        let err = ChordBook::new(chords, NoteTable::default()).unwrap_err();
        assert_eq!(err, ChordTableError::MissingNotes("Ghost".into()));
    }

    // ── triads / names ───────────────────────────────────────────────────
    #[test]
    fn triad_qualities() {
        assert_eq!(triad(60, Quality::Major), Some([60, 64, 67]));
        assert_eq!(triad(57, Quality::Minor), Some([57, 60, 64]));
        assert_eq!(triad(59, Quality::Diminished), Some([59, 62, 65]));
        assert_eq!(triad(125, Quality::Major), None);
    }

    #[test]
    fn note_names() {
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(66), "F#4");
        assert_eq!(note_name(21), "A0");
        assert_eq!(note_name(0), "C-1");
    }

    #[test]
    fn gm_program_names() {
        assert_eq!(GmProgram::default().program(), 0);
        assert_eq!(GmProgram::default().name(), "Acoustic Grand Piano");
        assert_eq!(GmProgram::new(200).program(), 127);
        assert_eq!(GmProgram::new(100).family(), "Synth Effects");
        assert_eq!(GmProgram::new(33).name(), "Bass");
    }
}
