//! Command-line flags.

use std::time::Duration;

use chord_controller::HandPrecedence;
use chord_table::GmProgram;
use clap::Parser;
use finger_pattern::ViewOrientation;

use crate::app::AppConfig;

/// Play chords on a MIDI synthesizer by holding up fingers.
#[derive(Parser, Debug, Clone)]
#[command(name = "finger_chords")]
#[command(about = "Hand-gesture chord controller")]
pub struct Args {
    /// Seconds a chord is held before another change is accepted
    #[arg(long, default_value = "2", value_parser = parse_seconds)]
    pub cooldown: Duration,

    /// Note-on / note-off velocity
    #[arg(long, default_value_t = 127, value_parser = clap::value_parser!(u8).range(0..=127))]
    pub velocity: u8,

    /// General MIDI program (instrument), 0 = Acoustic Grand Piano
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=127))]
    pub program: u8,

    /// MIDI channel
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=15))]
    pub channel: u8,

    /// MIDI output port: index or case-insensitive name fragment
    #[arg(long)]
    pub port: Option<String>,

    /// List MIDI output ports and exit
    #[arg(long)]
    pub list_ports: bool,

    /// Log MIDI messages instead of opening a port
    #[arg(long)]
    pub dry_run: bool,

    /// Camera view: `mirrored` (selfie) or `direct`
    #[arg(long, default_value = "mirrored")]
    pub view: ViewOrientation,

    /// Maximum hands considered per frame
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..))]
    pub hands: u8,

    /// Ignore detections scoring below this (0–1)
    #[arg(long, default_value_t = 0.7, value_parser = parse_score)]
    pub min_score: f32,

    /// Which hand wins when several show chords: `first` or `sequential`
    #[arg(long, default_value = "first")]
    pub precedence: HandPrecedence,

    /// Read JSON-lines landmarks from a file (`-` for stdin) instead of
    /// running the keyboard simulator
    #[arg(long)]
    pub landmarks: Option<String>,

    /// Run without a window (needs --landmarks)
    #[arg(long)]
    pub no_window: bool,
}

/// Non-negative seconds, fractional allowed.
fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|e| format!("invalid seconds: {}", e))?;
    Duration::try_from_secs_f64(secs).map_err(|_| format!("{} is not a duration", s))
}

fn parse_score(s: &str) -> Result<f32, String> {
    let score: f32 = s.parse().map_err(|e| format!("invalid score: {}", e))?;
    if (0.0..=1.0).contains(&score) { Ok(score) } else { Err(format!("{} is outside 0–1", s)) }
}

impl From<Args> for AppConfig {
    fn from(args: Args) -> Self {
        AppConfig {
            cooldown:    args.cooldown,
            velocity:    args.velocity,
            program:     GmProgram::new(args.program),
            channel:     args.channel,
            port:        args.port,
            dry_run:     args.dry_run,
            orientation: args.view,
            max_hands:   args.hands as usize,
            min_score:   args.min_score,
            precedence:  args.precedence,
            landmarks:   args.landmarks,
            window:      !args.no_window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<AppConfig, clap::Error> {
        let argv = std::iter::once("finger_chords").chain(args.iter().copied());
        Args::try_parse_from(argv).map(AppConfig::from)
    }

    #[test]
    fn no_flags_is_the_default_config() {
        assert_eq!(parse(&[]).unwrap(), AppConfig::default());
    }

    #[test]
    fn flags_override() {
        let cfg = parse(&[
            "--cooldown", "0.5", "--velocity", "90", "--program", "48", "--channel", "9",
            "--port", "fluid", "--view", "direct", "--hands", "1", "--min-score", "0.5",
            "--precedence", "sequential", "--landmarks", "-", "--no-window", "--dry-run",
        ]).unwrap();
        assert_eq!(cfg.cooldown, Duration::from_millis(500));
        assert_eq!(cfg.velocity, 90);
        assert_eq!(cfg.program, GmProgram::STRING_ENSEMBLE);
        assert_eq!(cfg.channel, 9);
        assert_eq!(cfg.port.as_deref(), Some("fluid"));
        assert_eq!(cfg.orientation, ViewOrientation::Direct);
        assert_eq!(cfg.max_hands, 1);
        assert_eq!(cfg.precedence, HandPrecedence::Sequential);
        assert_eq!(cfg.landmarks.as_deref(), Some("-"));
        assert!(!cfg.window);
        assert!(cfg.dry_run);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(parse(&["--channel", "16"]).is_err());
        assert!(parse(&["--velocity", "128"]).is_err());
        assert!(parse(&["--min-score", "2"]).is_err());
        assert!(parse(&["--cooldown", "-1"]).is_err());
        assert!(parse(&["--cooldown", "1e20"]).is_err());
        assert!(parse(&["--cooldown", "inf"]).is_err());
        assert!(parse(&["--cooldown", "soon"]).is_err());
        assert!(parse(&["--hands", "0"]).is_err());
        assert!(parse(&["--view", "sideways"]).is_err());
        assert!(parse(&["--precedence", "both"]).is_err());
    }
}
