//! pattern_probe — classify landmark sets read from stdin, one JSON value
//! per line.
//!
//! Each line is either one hand (`[[x,y,z], …]` or `{"landmarks": …}`) or
//! an array of hands.  Pass `--view direct` for an unmirrored camera view.

use clap::Parser;
use finger_pattern::{Classifier, LandmarkSet, ViewOrientation};
use std::io::{self, BufRead};

/// Classify hand landmark sets read from stdin.
#[derive(Parser, Debug)]
#[command(name = "pattern_probe")]
struct Args {
    /// Camera view: `mirrored` (selfie) or `direct`
    #[arg(long, default_value = "mirrored")]
    view: ViewOrientation,
}

fn main() {
    let orientation = Args::parse().view;
    let classifier  = Classifier::new(orientation);

    eprintln!("pattern_probe: {} view, reading landmark lines from stdin", orientation);

    for (n, line) in io::stdin().lock().lines().enumerate() {
        let line = match line {
            Ok(l)  => l,
            Err(e) => { eprintln!("read error: {}", e); break; }
        };
        if line.trim().is_empty() { continue; }

        let hands = match parse_hands(&line) {
            Ok(h)  => h,
            Err(e) => { println!("{:>5}  ⚠  {}", n + 1, e); continue; }
        };
        for (i, set) in hands.iter().enumerate() {
            match classifier.classify(set) {
                Ok(p)  => println!("{:>5}  hand {}  {}  {:?}", n + 1, i, p, p.bits()),
                Err(e) => println!("{:>5}  hand {}  ⚠  {}", n + 1, i, e),
            }
        }
    }
}

/// A line holds a single hand or a list of hands.
fn parse_hands(line: &str) -> Result<Vec<LandmarkSet>, serde_json::Error> {
    match serde_json::from_str::<LandmarkSet>(line) {
        Ok(set) => Ok(vec![set]),
        Err(_)  => serde_json::from_str::<Vec<LandmarkSet>>(line),
    }
}
