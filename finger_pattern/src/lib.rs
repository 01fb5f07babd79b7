//! # finger_pattern
//!
//! Reduce one detected hand (21 normalised landmark positions in the
//! MediaPipe hand-model order) to a five-finger extension pattern
//! `(thumb, index, middle, ring, pinky)`.
//!
//! ## Quick start
//!
//! ```rust
//! use finger_pattern::{Classifier, FingerPattern, LandmarkSet, ViewOrientation};
//!
//! let peace = FingerPattern::from_bits([0, 1, 1, 0, 0]);
//! let hand  = LandmarkSet::posed(peace, ViewOrientation::Mirrored);
//!
//! let classifier = Classifier::new(ViewOrientation::Mirrored);
//! assert_eq!(classifier.classify(&hand).unwrap(), peace);
//! assert_eq!(peace.to_string(), "01100");
//! ```
//!
//! ## Rules
//!
//! * **Thumb** — compared horizontally, tip (4) against the IP joint (3).
//!   Which side counts as "open" depends on [`ViewOrientation`]: in a
//!   mirrored (selfie) view the opening thumb moves toward smaller x.
//!   Only one hand/orientation pairing is correct at a time; this is a
//!   known limitation of the rule.
//! * **Index … pinky** — extended when the tip sits above (smaller y than)
//!   the PIP joint two landmarks back along the same finger.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices (MediaPipe hand model)
// ════════════════════════════════════════════════════════════════════════════

/// Landmark indices of the 21-point hand model.
pub mod hand {
    pub const WRIST:      usize = 0;
    pub const THUMB_CMC:  usize = 1;
    pub const THUMB_MCP:  usize = 2;
    pub const THUMB_IP:   usize = 3;
    pub const THUMB_TIP:  usize = 4;
    pub const INDEX_MCP:  usize = 5;
    pub const INDEX_PIP:  usize = 6;
    pub const INDEX_DIP:  usize = 7;
    pub const INDEX_TIP:  usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP:   usize = 13;
    pub const RING_PIP:   usize = 14;
    pub const RING_DIP:   usize = 15;
    pub const RING_TIP:   usize = 16;
    pub const PINKY_MCP:  usize = 17;
    pub const PINKY_PIP:  usize = 18;
    pub const PINKY_DIP:  usize = 19;
    pub const PINKY_TIP:  usize = 20;

    /// Number of landmarks in a complete set.
    pub const LANDMARK_COUNT: usize = 21;

    /// Bone segments, for drawing a hand skeleton.
    pub const CONNECTIONS: [(usize, usize); 21] = [
        (WRIST, THUMB_CMC), (THUMB_CMC, THUMB_MCP), (THUMB_MCP, THUMB_IP), (THUMB_IP, THUMB_TIP),
        (WRIST, INDEX_MCP), (INDEX_MCP, INDEX_PIP), (INDEX_PIP, INDEX_DIP), (INDEX_DIP, INDEX_TIP),
        (MIDDLE_MCP, MIDDLE_PIP), (MIDDLE_PIP, MIDDLE_DIP), (MIDDLE_DIP, MIDDLE_TIP),
        (RING_MCP, RING_PIP), (RING_PIP, RING_DIP), (RING_DIP, RING_TIP),
        (WRIST, PINKY_MCP), (PINKY_MCP, PINKY_PIP), (PINKY_PIP, PINKY_DIP), (PINKY_DIP, PINKY_TIP),
        (INDEX_MCP, MIDDLE_MCP), (MIDDLE_MCP, RING_MCP), (RING_MCP, PINKY_MCP),
    ];
}

// ════════════════════════════════════════════════════════════════════════════
// Finger
// ════════════════════════════════════════════════════════════════════════════

/// One of the five fingers, in pattern order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    /// All five fingers, thumb first.
    pub const ALL: [Finger; 5] = [
        Finger::Thumb, Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky,
    ];

    /// Position of this finger inside a [`FingerPattern`].
    pub fn slot(self) -> usize { self as usize }

    /// Landmark index of the fingertip.
    pub fn tip(self) -> usize {
        match self {
            Finger::Thumb  => hand::THUMB_TIP,
            Finger::Index  => hand::INDEX_TIP,
            Finger::Middle => hand::MIDDLE_TIP,
            Finger::Ring   => hand::RING_TIP,
            Finger::Pinky  => hand::PINKY_TIP,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Finger::Thumb  => "thumb",
            Finger::Index  => "index",
            Finger::Middle => "middle",
            Finger::Ring   => "ring",
            Finger::Pinky  => "pinky",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FingerPattern
// ════════════════════════════════════════════════════════════════════════════

/// Which of the five fingers are extended, thumb first.
///
/// Used as the lookup key of a chord table; equality is exact per finger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FingerPattern([bool; 5]);

impl FingerPattern {
    /// Closed fist.
    pub const FIST: FingerPattern = FingerPattern([false; 5]);
    /// Open hand.
    pub const OPEN: FingerPattern = FingerPattern([true; 5]);

    pub const fn new(thumb: bool, index: bool, middle: bool, ring: bool, pinky: bool) -> Self {
        FingerPattern([thumb, index, middle, ring, pinky])
    }

    /// Build from `0`/`1` values; any non-zero value counts as extended.
    pub const fn from_bits(bits: [u8; 5]) -> Self {
        FingerPattern([bits[0] != 0, bits[1] != 0, bits[2] != 0, bits[3] != 0, bits[4] != 0])
    }

    /// The pattern as five `0`/`1` values, thumb first.
    pub fn bits(self) -> [u8; 5] { self.0.map(u8::from) }

    pub fn is_extended(self, finger: Finger) -> bool { self.0[finger.slot()] }

    /// Copy with one finger set.
    pub fn with(mut self, finger: Finger, extended: bool) -> Self {
        self.0[finger.slot()] = extended;
        self
    }

    /// Copy with one finger flipped.
    pub fn toggled(self, finger: Finger) -> Self {
        self.with(finger, !self.is_extended(finger))
    }

    pub fn extended_count(self) -> usize { self.0.iter().filter(|&&e| e).count() }

    /// Extended fingers, thumb first.
    pub fn extended(self) -> impl Iterator<Item = Finger> {
        Finger::ALL.into_iter().filter(move |&f| self.is_extended(f))
    }
}

impl fmt::Display for FingerPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.bits() {
            write!(f, "{}", bit)?;
        }
        Ok(())
    }
}

/// Error returned when parsing a [`FingerPattern`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("finger pattern must be five 0/1 digits (thumb first), got {0:?}")]
pub struct PatternParseError(pub String);

impl FromStr for FingerPattern {
    type Err = PatternParseError;

    /// Accepts `"01100"` as well as `"0,1,1,0,0"` / `"(0, 1, 1, 0, 0)"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: Vec<char> = s.chars()
            .filter(|c| !matches!(c, ' ' | ',' | '(' | ')'))
            .collect();
        if digits.len() != 5 {
            return Err(PatternParseError(s.to_string()));
        }
        let mut bits = [0u8; 5];
        for (slot, c) in digits.iter().enumerate() {
            bits[slot] = match c {
                '0' => 0,
                '1' => 1,
                _   => return Err(PatternParseError(s.to_string())),
            };
        }
        Ok(FingerPattern::from_bits(bits))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Landmark / LandmarkSet
// ════════════════════════════════════════════════════════════════════════════

/// A single hand keypoint in normalised image coordinates.
///
/// `x` grows rightward and `y` grows downward, both 0.0–1.0 over the frame.
/// `z` is relative depth and is not used by the classifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawLandmark")]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self { Landmark { x, y, z } }
    pub const fn xy(x: f32, y: f32) -> Self { Landmark { x, y, z: 0.0 } }
}

/// Accepted wire shapes: `[x, y]`, `[x, y, z]`, or `{"x":…, "y":…, "z":…}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawLandmark {
    Xyz([f32; 3]),
    Xy([f32; 2]),
    Object { x: f32, y: f32, #[serde(default)] z: f32 },
}

impl From<RawLandmark> for Landmark {
    fn from(raw: RawLandmark) -> Self {
        match raw {
            RawLandmark::Xyz([x, y, z])     => Landmark::new(x, y, z),
            RawLandmark::Xy([x, y])         => Landmark::xy(x, y),
            RawLandmark::Object { x, y, z } => Landmark::new(x, y, z),
        }
    }
}

/// All landmarks reported for one detected hand.
///
/// No length check happens on construction.  Detectors hand over whatever
/// they produced; [`Classifier::classify`] rejects short sets.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawHand")]
pub struct LandmarkSet {
    pub landmarks: Vec<Landmark>,
    /// Detection confidence 0.0–1.0, when the detector reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    /// `"Left"` / `"Right"`, when the detector reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handedness: Option<String>,
}

/// A hand on the wire is either a bare landmark array or an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawHand {
    Bare(Vec<Landmark>),
    Full {
        landmarks: Vec<Landmark>,
        #[serde(default)]
        score: Option<f32>,
        #[serde(default)]
        handedness: Option<String>,
    },
}

impl From<RawHand> for LandmarkSet {
    fn from(raw: RawHand) -> Self {
        match raw {
            RawHand::Bare(landmarks) => LandmarkSet::new(landmarks),
            RawHand::Full { landmarks, score, handedness } =>
                LandmarkSet { landmarks, score, handedness },
        }
    }
}

impl LandmarkSet {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        LandmarkSet { landmarks, score: None, handedness: None }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    pub fn len(&self) -> usize { self.landmarks.len() }
    pub fn is_empty(&self) -> bool { self.landmarks.is_empty() }

    /// True when every index the classifier reads is present.
    pub fn is_complete(&self) -> bool { self.landmarks.len() >= hand::LANDMARK_COUNT }

    pub fn get(&self, index: usize) -> Option<&Landmark> { self.landmarks.get(index) }

    /// Synthesise a plausible hand whose classification under
    /// `orientation` is exactly `pattern`.
    ///
    /// The hand is laid out palm-facing in the middle of the frame; curled
    /// fingers fold their tip back below the PIP joint.
    pub fn posed(pattern: FingerPattern, orientation: ViewOrientation) -> Self {
        let mut points = vec![Landmark::default(); hand::LANDMARK_COUNT];
        points[hand::WRIST] = Landmark::xy(0.50, 0.82);

        // Thumb sweeps out toward smaller x in the mirrored layout.
        points[hand::THUMB_CMC] = Landmark::xy(0.42, 0.76);
        points[hand::THUMB_MCP] = Landmark::xy(0.37, 0.70);
        points[hand::THUMB_IP]  = Landmark::xy(0.33, 0.64);
        points[hand::THUMB_TIP] = if pattern.is_extended(Finger::Thumb) {
            Landmark::xy(0.27, 0.60)
        } else {
            Landmark::xy(0.39, 0.66)
        };

        const COLUMNS: [(Finger, f32); 4] = [
            (Finger::Index, 0.42), (Finger::Middle, 0.50),
            (Finger::Ring,  0.58), (Finger::Pinky,  0.65),
        ];
        for (finger, x) in COLUMNS {
            let tip = finger.tip();
            points[tip - 3] = Landmark::xy(x, 0.60);
            points[tip - 2] = Landmark::xy(x, 0.50);
            if pattern.is_extended(finger) {
                points[tip - 1] = Landmark::xy(x, 0.42);
                points[tip]     = Landmark::xy(x, 0.35);
            } else {
                points[tip - 1] = Landmark::xy(x, 0.55);
                points[tip]     = Landmark::xy(x, 0.58);
            }
        }

        if orientation == ViewOrientation::Direct {
            for p in &mut points {
                p.x = 1.0 - p.x;
            }
        }
        LandmarkSet::new(points).with_score(1.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ViewOrientation
// ════════════════════════════════════════════════════════════════════════════

/// Whether the camera image reaching the detector was flipped horizontally.
///
/// Decides which horizontal direction counts as an open thumb.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ViewOrientation {
    /// Selfie view (frame flipped left↔right): open thumb has smaller x
    /// than its IP joint.
    #[default]
    Mirrored,
    /// Unflipped camera view: open thumb has larger x than its IP joint.
    Direct,
}

impl ViewOrientation {
    pub fn name(self) -> &'static str {
        match self {
            ViewOrientation::Mirrored => "mirrored",
            ViewOrientation::Direct   => "direct",
        }
    }
}

impl fmt::Display for ViewOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown view orientation {0:?} (expected \"mirrored\" or \"direct\")")]
pub struct OrientationParseError(pub String);

impl FromStr for ViewOrientation {
    type Err = OrientationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mirrored" | "mirror" | "selfie" => Ok(ViewOrientation::Mirrored),
            "direct"   | "unmirrored"        => Ok(ViewOrientation::Direct),
            _ => Err(OrientationParseError(s.to_string())),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Classifier
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifyError {
    /// The set is missing landmark indices the rules read.
    #[error("malformed landmark set: {found} landmarks, at least {} required", hand::LANDMARK_COUNT)]
    MalformedLandmarkSet { found: usize },
}

/// Turns a [`LandmarkSet`] into a [`FingerPattern`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Classifier {
    pub orientation: ViewOrientation,
}

impl Classifier {
    pub fn new(orientation: ViewOrientation) -> Self { Classifier { orientation } }

    /// Classify one hand.  Pure: the same landmarks always give the same
    /// pattern.
    pub fn classify(&self, set: &LandmarkSet) -> Result<FingerPattern, ClassifyError> {
        if !set.is_complete() {
            return Err(ClassifyError::MalformedLandmarkSet { found: set.len() });
        }
        let p = &set.landmarks;

        let tip = p[hand::THUMB_TIP].x;
        let ip  = p[hand::THUMB_IP].x;
        let thumb = match self.orientation {
            ViewOrientation::Mirrored => tip < ip,
            ViewOrientation::Direct   => tip > ip,
        };

        let mut pattern = FingerPattern::FIST.with(Finger::Thumb, thumb);
        for finger in &Finger::ALL[1..] {
            let t = finger.tip();
            pattern = pattern.with(*finger, p[t].y < p[t - 2].y);
        }
        Ok(pattern)
    }
}

/// Shorthand for `Classifier::new(orientation).classify(set)`.
pub fn classify(set: &LandmarkSet, orientation: ViewOrientation) -> Result<FingerPattern, ClassifyError> {
    Classifier::new(orientation).classify(set)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
