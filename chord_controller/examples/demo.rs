//! Walks the controller through a short performance and prints what a MIDI
//! device would receive.

use std::time::{Duration, Instant};

use chord_controller::{ChordController, HandPrecedence};
use finger_pattern::FingerPattern;

fn main() {
    println!("\n=== Chord Controller Demo ===\n");

    let mut ctl = ChordController::reference();
    let t0 = Instant::now();
    let ms = |n: u64| t0 + Duration::from_millis(n);

    let timeline: [(u64, Option<[u8; 5]>, &str); 8] = [
        (   0, Some([0, 1, 0, 0, 0]), "index up: C"),
        ( 500, Some([0, 1, 1, 0, 0]), "switch to D too early"),
        (2100, Some([0, 1, 1, 0, 0]), "D again, cooldown passed"),
        (2200, None,                  "hand leaves the frame"),
        (3000, Some([1, 1, 1, 1, 1]), "open palm: no chord"),
        (4200, None,                  "still nothing"),
        (4300, Some([0, 1, 1, 1, 0]), "three fingers: G"),
        (4400, Some([0, 1, 1, 1, 0]), "held"),
    ];

    for (at, bits, what) in timeline {
        let pattern = bits.map(FingerPattern::from_bits);
        let actions = ctl.update(pattern, ms(at));
        println!("  {:>5} ms  {:<28} → {}", at, what,
            if actions.is_empty() { "(nothing)".to_string() }
            else { actions.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ") });
    }

    println!("\n  Two hands, first-recognized precedence:");
    let hands = [FingerPattern::from_bits([0, 1, 0, 0, 1]), FingerPattern::from_bits([0, 1, 0, 0, 0])];
    for action in ctl.update_frame(&hands, ms(7000), HandPrecedence::FirstRecognized) {
        println!("            {}", action);
    }

    println!("\n  Shutdown:");
    for action in ctl.release_all() {
        println!("            {}", action);
    }
    println!();
}
