//! finger_chords — entry point.

use anyhow::Context;
use clap::Parser;
use finger_chords::config::Args;
use finger_chords::sink::list_ports;
use finger_chords::{run, AppConfig};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.list_ports {
        let ports = list_ports().context("listing MIDI output ports")?;
        if ports.is_empty() {
            println!("No MIDI output ports.");
        }
        for (i, name) in ports.iter().enumerate() {
            println!("{:>3}  {}", i, name);
        }
        return Ok(());
    }

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Finger Chords — hand-gesture MIDI chords            ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let cfg = AppConfig::from(args);
    match &cfg.landmarks {
        Some(path) => println!("  Mode: landmark stream ({})", path),
        None       => println!("  Mode: keyboard simulation  (1–5 fingers, Tab hand, Q quit)"),
    }
    println!();

    run(cfg).context("finger_chords stopped")
}
