//! Builds a custom minor-key chord book next to the stock one.

use chord_table::{note_name, triad, ChordBook, Quality};
use finger_pattern::FingerPattern;

fn show(title: &str, book: &ChordBook) {
    println!("{}", title);
    for (pattern, chord, notes) in book.rows() {
        let names: Vec<_> = notes.iter().map(|&n| note_name(n)).collect();
        println!("   {}  {:<4} {}", pattern, chord, names.join(" "));
    }
    println!();
}

fn main() {
    println!("\n=== Chord Book Demo ===\n");

    show("1. Stock book", &ChordBook::reference());

    let rows = [
        ([0, 1, 0, 0, 0], "Am", 57, Quality::Minor),
        ([0, 1, 1, 0, 0], "Dm", 62, Quality::Minor),
        ([0, 1, 1, 1, 0], "E",  64, Quality::Major),
        ([0, 1, 0, 0, 1], "Bdim", 59, Quality::Diminished),
        ([1, 1, 0, 0, 0], "Gsus4", 55, Quality::Sus4),
    ];
    let mut builder = ChordBook::builder();
    for (bits, name, root, quality) in rows {
        let notes = triad(root, quality).expect("roots are well inside MIDI range");
        builder = builder.chord(FingerPattern::from_bits(bits), name, &notes);
    }
    match builder.build() {
        Ok(book) => show("2. A-minor book", &book),
        Err(e)   => println!("2. A-minor book rejected: {}", e),
    }

    // Validation catches a clash.
    let clash = ChordBook::builder()
        .chord(FingerPattern::from_bits([0, 1, 0, 0, 0]), "C", &[60, 64, 67])
        .chord(FingerPattern::from_bits([0, 1, 0, 0, 0]), "F", &[65, 69, 72])
        .build();
    if let Err(e) = clash {
        println!("3. Rejected: {}\n", e);
    }
}
