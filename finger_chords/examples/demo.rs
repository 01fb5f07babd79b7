//! Plays a scripted performance through a full session without a camera,
//! window or synthesizer, then prints the MIDI traffic.

use std::io::Cursor;
use std::time::Instant;

use chord_table::{note_name, ChordBook};
use finger_chords::overlay::ConsoleOverlay;
use finger_chords::sink::{MidiEvent, RecordingSink};
use finger_chords::stream::{LandmarkStream, Prelabelled};
use finger_chords::{drive, AppConfig, Session};
use finger_pattern::{FingerPattern, LandmarkSet, ViewOrientation};

fn line(t: f64, hands: &[[u8; 5]]) -> String {
    let sets: Vec<LandmarkSet> = hands.iter()
        .map(|&b| LandmarkSet::posed(FingerPattern::from_bits(b), ViewOrientation::Mirrored))
        .collect();
    format!("{{\"t\": {}, \"hands\": {}}}\n", t, serde_json::to_string(&sets).unwrap_or_default())
}

fn main() {
    println!("\n=== Finger Chords Demo ===\n");

    let script = [
        line(0.0, &[[0, 1, 0, 0, 0]]),
        line(0.5, &[[0, 1, 1, 0, 0]]),
        line(2.1, &[[0, 1, 1, 0, 0]]),
        line(2.2, &[]),
        line(4.2, &[]),
        line(4.5, &[[1, 1, 1, 1, 1], [0, 1, 0, 0, 1]]),
    ].concat();

    let rec = RecordingSink::new();
    let cfg = AppConfig { dry_run: true, landmarks: Some("demo".into()), window: false, ..AppConfig::default() };
    let mut session = Session::new(&cfg, ChordBook::reference(), rec.clone());

    let mut source  = LandmarkStream::with_origin(Cursor::new(script.into_bytes()), Instant::now());
    let mut overlay = ConsoleOverlay::new();
    let frames = drive(&mut source, &mut Prelabelled, &mut session, &mut overlay);
    session.shutdown();

    println!("  {} frames\n", frames);
    for event in rec.events() {
        match event {
            MidiEvent::ProgramChange { program, .. } => println!("  program   {}", program),
            MidiEvent::NoteOn  { note, .. }          => println!("  note-on   {}", note_name(note)),
            MidiEvent::NoteOff { note, .. }          => println!("  note-off  {}", note_name(note)),
        }
    }
    println!();
}
