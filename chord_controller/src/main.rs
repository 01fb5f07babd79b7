//! chord_replay — run the chord state machine over a scripted timeline.
//!
//! Reads lines of the form `<seconds> <pattern|->` from stdin, where the
//! pattern is five 0/1 digits (`01100`) and `-` means no hand.  Prints the
//! actions each line triggers.
//!
//! ```text
//! $ printf '0 01000\n0.5 01100\n2.1 01100\n4.2 -\n' | chord_replay --cooldown 2
//! ```

use std::io::{self, BufRead};
use std::time::{Duration, Instant};

use chord_controller::ChordController;
use chord_table::ChordBook;
use clap::Parser;
use finger_pattern::FingerPattern;

/// Replay a scripted finger-pattern timeline through the chord state machine.
#[derive(Parser, Debug)]
#[command(name = "chord_replay")]
struct Args {
    /// Seconds a chord is held before another change is accepted
    #[arg(long, default_value = "2", value_parser = parse_seconds)]
    cooldown: Duration,
}

fn main() {
    let args    = Args::parse();
    let mut ctl = ChordController::new(ChordBook::reference(), args.cooldown);
    let start   = Instant::now();

    eprintln!("chord_replay: cooldown {:.2}s, reading \"<secs> <pattern|->\" lines", args.cooldown.as_secs_f64());

    for (n, line) in io::stdin().lock().lines().enumerate() {
        let line = match line {
            Ok(l)  => l,
            Err(e) => { eprintln!("read error: {}", e); break; }
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue; }

        let (secs, pattern, at) = match parse_line(line).and_then(|(secs, pattern)| {
            let at = start.checked_add(secs).ok_or_else(|| format!("time {:?} out of range", secs))?;
            Ok((secs, pattern, at))
        }) {
            Ok(v)  => v,
            Err(e) => { println!("{:>4}  ⚠  {}", n + 1, e); continue; }
        };

        let actions = ctl.update(pattern, at);
        let shown   = pattern.map_or_else(|| "-----".to_string(), |p| p.to_string());
        if actions.is_empty() {
            println!("{:>7.2}s  {}  ·", secs.as_secs_f64(), shown);
        }
        for action in actions {
            println!("{:>7.2}s  {}  {}", secs.as_secs_f64(), shown, action);
        }
    }

    for action in ctl.release_all() {
        println!("    end           {}", action);
    }
}

fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|e| format!("bad time: {}", e))?;
    Duration::try_from_secs_f64(secs).map_err(|_| format!("bad time: {}", s))
}

fn parse_line(line: &str) -> Result<(Duration, Option<FingerPattern>), String> {
    let mut parts = line.split_whitespace();
    let secs = parse_seconds(parts.next().ok_or("empty line")?)?;
    let pattern = match parts.next() {
        None | Some("-") => None,
        Some(text)       => Some(text.parse::<FingerPattern>().map_err(|e| e.to_string())?),
    };
    Ok((secs, pattern))
}
