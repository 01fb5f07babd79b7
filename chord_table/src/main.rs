//! chord_chart — print the stock finger-pattern chord chart.

use chord_table::{note_name, ChordBook, GmProgram};
use finger_pattern::Finger;

fn main() {
    let book = ChordBook::reference();

    println!();
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              Finger Chord Chart                      ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
    println!("  Instrument: {}", GmProgram::default());
    println!();
    println!("  {:<8} {:<28} {:<6} {}", "pattern", "fingers up", "chord", "notes");
    println!("  {}", "─".repeat(60));

    for (pattern, chord, notes) in book.rows() {
        let fingers: Vec<_> = pattern.extended().map(Finger::name).collect();
        let names: Vec<_> = notes.iter()
            .map(|&n| format!("{} ({})", note_name(n), n))
            .collect();
        println!("  {:<8} {:<28} {:<6} {}", pattern, fingers.join(" + "), chord, names.join("  "));
    }

    println!();
    println!("  Any other pattern releases the chord once the cooldown has passed.");
    println!();
}
