//! Landmarks produced by an external detector, one JSON line per frame.
//!
//! ```text
//! {"t": 0.50, "hands": [{"landmarks": [[0.5, 0.8, 0.0], …], "score": 0.93, "handedness": "Right"}]}
//! [[[0.5, 0.8, 0.0], …]]
//! ```
//!
//! The first form carries an optional timestamp `t` (seconds since the
//! stream started); the second is just the array of hands and is stamped
//! with the time the line was read.  Lines that do not parse are logged
//! and skipped.  A read error ends the stream.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::time::{Duration, Instant};

use finger_pattern::LandmarkSet;
use log::{debug, warn};
use serde::Deserialize;

use crate::source::{Frame, FrameSource, LandmarkDetector};

#[derive(Deserialize)]
#[serde(untagged)]
enum StreamLine {
    Bare(Vec<LandmarkSet>),
    Framed {
        #[serde(default)]
        t:     Option<f64>,
        #[serde(default)]
        hands: Vec<LandmarkSet>,
    },
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkStream
// ════════════════════════════════════════════════════════════════════════════

pub struct LandmarkStream<R> {
    reader:  R,
    origin:  Instant,
    line_no: usize,
    skipped: usize,
}

impl<R: BufRead> LandmarkStream<R> {
    pub fn new(reader: R) -> Self {
        LandmarkStream::with_origin(reader, Instant::now())
    }

    /// `t` values are measured from `origin`.
    pub fn with_origin(reader: R, origin: Instant) -> Self {
        LandmarkStream { reader, origin, line_no: 0, skipped: 0 }
    }

    pub fn origin(&self)  -> Instant { self.origin }

    /// Lines rejected so far.
    pub fn skipped(&self) -> usize { self.skipped }

    fn stamp(&self, t: Option<f64>) -> Instant {
        let Some(secs) = t else { return Instant::now() };
        let at = Duration::try_from_secs_f64(secs).ok()
            .and_then(|d| self.origin.checked_add(d));
        at.unwrap_or_else(|| {
            warn!("landmark stream line {}: bad timestamp {}, using read time", self.line_no, secs);
            Instant::now()
        })
    }
}

impl<R: BufRead> FrameSource for LandmarkStream<R> {
    type Image = Vec<LandmarkSet>;

    fn next_frame(&mut self) -> Option<Frame<Vec<LandmarkSet>>> {
        let mut line = Vec::new();
        loop {
            line.clear();
            match self.reader.read_until(b'\n', &mut line) {
                Ok(0) => {
                    debug!("landmark stream: end after {} lines", self.line_no);
                    return None;
                }
                Ok(_) => self.line_no += 1,
                Err(e) => {
                    warn!("landmark stream: read error after line {}: {}", self.line_no, e);
                    return None;
                }
            }

            if line.iter().all(u8::is_ascii_whitespace) { continue; }

            match serde_json::from_slice::<StreamLine>(&line) {
                Ok(StreamLine::Bare(hands)) =>
                    return Some(Frame::new(Instant::now(), hands)),
                Ok(StreamLine::Framed { t, hands }) =>
                    return Some(Frame::new(self.stamp(t), hands)),
                Err(e) => {
                    self.skipped += 1;
                    warn!("landmark stream line {}: skipped ({})", self.line_no, e);
                }
            }
        }
    }
}

/// Open `path` as a landmark stream; `-` reads standard input.
pub fn open(path: &str) -> io::Result<LandmarkStream<Box<dyn BufRead>>> {
    let reader: Box<dyn BufRead> = if path == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        Box::new(BufReader::new(File::open(path)?))
    };
    Ok(LandmarkStream::new(reader))
}

// ════════════════════════════════════════════════════════════════════════════
// Prelabelled
// ════════════════════════════════════════════════════════════════════════════

/// Detector for frames that already are landmark sets.
#[derive(Clone, Copy, Debug, Default)]
pub struct Prelabelled;

impl LandmarkDetector<Vec<LandmarkSet>> for Prelabelled {
    fn detect(&mut self, image: &Vec<LandmarkSet>) -> Vec<LandmarkSet> { image.clone() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use finger_pattern::{FingerPattern, ViewOrientation};
    use std::io::{Cursor, Read, Write};

    fn hand_json(bits: [u8; 5]) -> String {
        let set = LandmarkSet::posed(FingerPattern::from_bits(bits), ViewOrientation::Mirrored);
        serde_json::to_string(&set).unwrap()
    }

    fn stream(text: String) -> LandmarkStream<Cursor<Vec<u8>>> {
        LandmarkStream::new(Cursor::new(text.into_bytes()))
    }

    #[test]
    fn framed_line_uses_timestamp() {
        let text = format!("{{\"t\": 1.5, \"hands\": [{}]}}\n", hand_json([0, 1, 0, 0, 0]));
        let mut s = stream(text);
        let frame = s.next_frame().unwrap();
        assert_eq!(frame.image.len(), 1);
        assert_eq!(frame.captured_at - s.origin(), Duration::from_millis(1500));
        assert_eq!(frame.image[0].score, Some(1.0));
        assert!(s.next_frame().is_none());
    }

    #[test]
    fn bare_array_of_hands() {
        let raw: Vec<[f32; 3]> = LandmarkSet::posed(FingerPattern::OPEN, ViewOrientation::Mirrored)
            .landmarks.iter().map(|l| [l.x, l.y, l.z]).collect();
        let text = format!("[{}, {}]\n", serde_json::to_string(&raw).unwrap(), hand_json([0; 5]));
        let mut s = stream(text);
        let frame = s.next_frame().unwrap();
        assert_eq!(frame.image.len(), 2);
        assert_eq!(frame.image[0].len(), 21);
        assert_eq!(frame.image[0].score, None);
    }

    #[test]
    fn empty_frames_and_blank_lines() {
        let mut s = stream("\n[]\n{\"t\": 0.1}\n\n".to_string());
        assert!(s.next_frame().unwrap().image.is_empty());
        assert!(s.next_frame().unwrap().image.is_empty());
        assert!(s.next_frame().is_none());
    }

    #[test]
    fn bad_lines_are_skipped() {
        let text = format!(
            "not json\n{{\"hands\": 3}}\n{{\"t\": 0.2, \"hands\": [{}]}}\n",
            hand_json([0, 1, 1, 0, 0]),
        );
        let mut s = stream(text);
        let frame = s.next_frame().unwrap();
        assert_eq!(frame.image.len(), 1);
        assert_eq!(s.skipped(), 2);
    }

    #[test]
    fn negative_timestamp_falls_back_to_read_time() {
        let mut s = stream("{\"t\": -4.0, \"hands\": []}\n".to_string());
        let frame = s.next_frame().unwrap();
        assert!(frame.captured_at >= s.origin());
    }

    #[test]
    fn oversized_timestamp_falls_back_to_read_time() {
        let text = format!(
            "{{\"t\": 1e300, \"hands\": []}}\n{{\"t\": 1e19, \"hands\": [{}]}}\n",
            hand_json([0, 1, 0, 0, 0]),
        );
        let mut s = stream(text);
        let before = Instant::now();
        let first  = s.next_frame().unwrap();
        let second = s.next_frame().unwrap();
        assert!(first.captured_at >= before);
        assert!(second.captured_at >= before);
        assert_eq!(second.image.len(), 1);
        assert_eq!(s.skipped(), 0);
    }

    #[test]
    fn invalid_utf8_line_is_skipped() {
        let mut bytes = b"\xff\xfe garbage\n".to_vec();
        bytes.extend_from_slice(b"{\"t\": 0.1, \"hands\": []}\n");
        let mut s = LandmarkStream::new(Cursor::new(bytes));
        let frame = s.next_frame().unwrap();
        assert!(frame.image.is_empty());
        assert_eq!(frame.captured_at - s.origin(), Duration::from_millis(100));
        assert_eq!(s.skipped(), 1);
        assert!(s.next_frame().is_none());
    }

    struct Broken;
    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "camera unplugged"))
        }
    }

    #[test]
    fn read_error_ends_stream() {
        let mut s = LandmarkStream::new(BufReader::new(Broken));
        assert!(s.next_frame().is_none());
    }

    #[test]
    fn open_reads_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"t\": 0.0, \"hands\": [{}]}}", hand_json([0, 1, 0, 0, 1])).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let mut s = open(&path).unwrap();
        let frame = s.next_frame().unwrap();
        let mut detector = Prelabelled;
        assert_eq!(detector.detect(&frame.image), frame.image);
        assert!(s.next_frame().is_none());
    }

    #[test]
    fn open_missing_file_fails() {
        assert!(open("/definitely/not/here.jsonl").is_err());
    }
}
