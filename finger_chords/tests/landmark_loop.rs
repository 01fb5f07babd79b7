//! Whole-loop runs: scripted landmark lines in, MIDI events out.

use std::io::{Cursor, Write};
use std::time::Instant;

use chord_controller::HandPrecedence;
use chord_table::ChordBook;
use finger_chords::overlay::ConsoleOverlay;
use finger_chords::sink::{MidiEvent, RecordingSink};
use finger_chords::stream::{self, LandmarkStream, Prelabelled};
use finger_chords::{drive, AppConfig, Session};
use finger_pattern::{FingerPattern, Landmark, LandmarkSet, ViewOrientation};

fn posed(bits: [u8; 5]) -> LandmarkSet {
    LandmarkSet::posed(FingerPattern::from_bits(bits), ViewOrientation::Mirrored)
}

fn line(t: f64, hands: &[LandmarkSet]) -> String {
    format!("{{\"t\": {}, \"hands\": {}}}\n", t, serde_json::to_string(hands).unwrap())
}

fn headless() -> AppConfig {
    AppConfig { landmarks: Some("-".into()), window: false, ..AppConfig::default() }
}

fn play(cfg: &AppConfig, script: String) -> (Vec<MidiEvent>, usize) {
    let rec = RecordingSink::new();
    let mut session = Session::new(cfg, ChordBook::reference(), rec.clone());
    let mut source  = LandmarkStream::with_origin(Cursor::new(script.into_bytes()), Instant::now());
    let frames = drive(&mut source, &mut Prelabelled, &mut session, &mut ConsoleOverlay::new());
    drop(session);
    (rec.events(), frames)
}

fn notes(events: &[MidiEvent]) -> Vec<(bool, u8)> {
    events.iter().filter_map(|e| match *e {
        MidiEvent::NoteOn  { note, .. } => Some((true, note)),
        MidiEvent::NoteOff { note, .. } => Some((false, note)),
        MidiEvent::ProgramChange { .. } => None,
    }).collect()
}

#[test]
fn reference_performance() {
    let script = [
        line(0.0, &[posed([0, 1, 0, 0, 0])]),
        line(0.5, &[posed([0, 1, 1, 0, 0])]),
        line(2.1, &[posed([0, 1, 1, 0, 0])]),
        line(2.2, &[]),
        line(4.2, &[]),
        line(5.0, &[posed([1, 1, 1, 1, 1])]),
    ].concat();

    let (events, frames) = play(&headless(), script);
    assert_eq!(frames, 6);
    assert_eq!(events[0], MidiEvent::ProgramChange { channel: 0, program: 0 });
    assert_eq!(notes(&events), vec![
        (true, 60), (true, 64), (true, 67),
        (false, 60), (false, 64), (false, 67),
        (true, 62), (true, 66), (true, 69),
        (false, 62), (false, 66), (false, 69),
    ]);
}

#[test]
fn bad_lines_and_malformed_hands_do_not_stop_the_loop() {
    let short = LandmarkSet::new(vec![Landmark::xy(0.5, 0.5); 12]);
    let script = [
        "garbage\n".to_string(),
        line(0.0, &[short.clone()]),
        "{\"t\": 0.1, \"hands\": [[[1, 2]]]}\n".to_string(), // one landmark
        line(0.2, &[short, posed([0, 1, 1, 1, 0])]),
    ].concat();

    let (events, frames) = play(&headless(), script);
    assert_eq!(frames, 4);
    // G sounded, then released at shutdown.
    assert_eq!(notes(&events), vec![
        (true, 67), (true, 71), (true, 74),
        (false, 67), (false, 71), (false, 74),
    ]);
}

#[test]
fn shutdown_releases_chord_still_sounding_at_end_of_stream() {
    let script = line(0.0, &[posed([0, 1, 0, 0, 1])]);
    let (events, _) = play(&headless(), script);
    let n = notes(&events);
    assert_eq!(n.iter().filter(|(on, _)| *on).count(), 3);
    assert_eq!(n.iter().filter(|(on, _)| !*on).count(), 3);
    assert_eq!(n.last(), Some(&(false, 76)));
}

#[test]
fn precedence_decides_between_two_hands() {
    let both = |t| line(t, &[posed([0, 1, 0, 0, 0]), posed([0, 1, 1, 0, 0])]);
    let script = [both(0.0), both(3.0)].concat();

    let (first, _) = play(&headless(), script.clone());
    // The first hand's C holds for the whole run.
    assert_eq!(notes(&first)[..3], [(true, 60), (true, 64), (true, 67)]);
    assert_eq!(notes(&first).len(), 6);

    let sequential = AppConfig { precedence: HandPrecedence::Sequential, ..headless() };
    let (seq, _) = play(&sequential, script);
    // Second hand takes over once the cooldown from the first chord passes.
    assert!(notes(&seq).contains(&(true, 62)));
}

#[test]
fn low_confidence_detections_are_ignored() {
    let weak = posed([0, 1, 0, 0, 0]).with_score(0.3);
    let script = [line(0.0, &[weak.clone()]), line(0.1, &[weak])].concat();
    let (events, _) = play(&headless(), script);
    assert!(notes(&events).is_empty());
}

#[test]
fn stream_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(line(0.0, &[posed([0, 1, 1, 1, 0])]).as_bytes()).unwrap();
    file.write_all(b"[]\n").unwrap();
    file.flush().unwrap();

    let rec = RecordingSink::new();
    let cfg = AppConfig { velocity: 100, channel: 2, ..headless() };
    let mut session = Session::new(&cfg, ChordBook::reference(), rec.clone());
    let mut source  = stream::open(file.path().to_str().unwrap()).unwrap();
    let frames = drive(&mut source, &mut Prelabelled, &mut session, &mut ConsoleOverlay::new());
    session.shutdown();

    assert_eq!(frames, 2);
    assert!(rec.events().contains(&MidiEvent::NoteOn { channel: 2, note: 67, velocity: 100 }));
    assert!(rec.sounding().is_empty());
}
