//! Top-level application loop.
//!
//! [`Session`] owns the classifier, the [`ChordController`] and the MIDI
//! sink, and turns the hands of one frame into MIDI traffic.  [`drive`] is
//! the poll loop; [`run`] wires it to the chosen source, sink and overlay.

use std::sync::mpsc;
use std::time::{Duration, Instant};

use chord_controller::{Action, ChordController, HandPrecedence, DEFAULT_COOLDOWN};
use chord_table::{ChordBook, ChordName, GmProgram};
use finger_pattern::{Classifier, FingerPattern, LandmarkSet, ViewOrientation};
use log::{debug, info, warn};

use crate::error::AppError;
use crate::overlay::{ConsoleOverlay, Overlay};
use crate::sink::{LogSink, MidiSink, MidirSink};
use crate::source::{FrameSource, LandmarkDetector, PoseDetector, SimulatedCamera};
use crate::stream::{self, Prelabelled};
use crate::visualizer::Visualizer;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub cooldown:    Duration,
    pub velocity:    u8,
    pub program:     GmProgram,
    pub channel:     u8,
    /// Output port index or name fragment; `None` picks automatically.
    pub port:        Option<String>,
    /// Log MIDI instead of opening a port.
    pub dry_run:     bool,
    pub orientation: ViewOrientation,
    /// Hands considered per frame, in detector order.
    pub max_hands:   usize,
    /// Detections scoring below this are ignored.
    pub min_score:   f32,
    pub precedence:  HandPrecedence,
    /// Landmark stream path (`-` for stdin); `None` runs the simulator.
    pub landmarks:   Option<String>,
    pub window:      bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            cooldown:    DEFAULT_COOLDOWN,
            velocity:    127,
            program:     GmProgram::ACOUSTIC_GRAND_PIANO,
            channel:     0,
            port:        None,
            dry_run:     false,
            orientation: ViewOrientation::Mirrored,
            max_hands:   2,
            min_score:   0.7,
            precedence:  HandPrecedence::FirstRecognized,
            landmarks:   None,
            window:      true,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.velocity > 127 {
            return Err(AppError::Config(format!("velocity {} is outside 0–127", self.velocity)));
        }
        if self.channel > 15 {
            return Err(AppError::Config(format!("channel {} is outside 0–15", self.channel)));
        }
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(AppError::Config(format!("min score {} is outside 0–1", self.min_score)));
        }
        if self.max_hands == 0 {
            return Err(AppError::Config("at least one hand must be allowed".into()));
        }
        if !self.window && self.landmarks.is_none() {
            return Err(AppError::Config("the hand simulator needs the window; pass --landmarks to run headless".into()));
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FrameReport — what one frame did
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct HandReport {
    pub landmarks: LandmarkSet,
    /// `None` when the landmark set was malformed.
    pub pattern:   Option<FingerPattern>,
    pub chord:     Option<ChordName>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    pub captured_at: Instant,
    /// Hands that passed the score filter and hand limit, detector order.
    pub hands:       Vec<HandReport>,
    /// Hands dropped by the score filter or hand limit.
    pub dropped:     usize,
    /// The chord the frame's gesture maps to, as chosen by the hand
    /// precedence (not necessarily sounding yet).
    pub recognised:  Option<ChordName>,
    pub actions:     Vec<Action>,
    /// Chord sounding after the frame.
    pub sounding:    Option<ChordName>,
}

impl FrameReport {
    pub fn empty(captured_at: Instant) -> Self {
        FrameReport {
            captured_at,
            hands:      Vec::new(),
            dropped:    0,
            recognised: None,
            actions:    Vec::new(),
            sounding:   None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Session
// ════════════════════════════════════════════════════════════════════════════

/// One run of the controller against one MIDI sink.
///
/// Dropping the session switches off whatever is still sounding.
pub struct Session<S: MidiSink> {
    controller: ChordController,
    classifier: Classifier,
    sink:       S,
    channel:    u8,
    velocity:   u8,
    max_hands:  usize,
    min_score:  f32,
    precedence: HandPrecedence,
    closed:     bool,
}

impl<S: MidiSink> Session<S> {
    /// Build the session and select the instrument.
    pub fn new(cfg: &AppConfig, book: ChordBook, mut sink: S) -> Self {
        info!("instrument {} on channel {}", cfg.program, cfg.channel);
        if let Err(e) = sink.program_change(cfg.channel, cfg.program.program()) {
            warn!("program change failed: {}", e);
        }
        Session {
            controller: ChordController::new(book, cfg.cooldown),
            classifier: Classifier::new(cfg.orientation),
            sink,
            channel:    cfg.channel,
            velocity:   cfg.velocity,
            max_hands:  cfg.max_hands,
            min_score:  cfg.min_score,
            precedence: cfg.precedence,
            closed:     false,
        }
    }

    pub fn controller(&self) -> &ChordController { &self.controller }
    pub fn sink(&self)       -> &S               { &self.sink }

    /// Classify the detected hands, update the controller and send the
    /// resulting notes.
    pub fn process_frame(&mut self, captured_at: Instant, detected: Vec<LandmarkSet>) -> FrameReport {
        let total = detected.len();
        let min_score = self.min_score;
        let kept: Vec<LandmarkSet> = detected.into_iter()
            .filter(|set| match set.score {
                Some(score) if score < min_score => {
                    debug!("hand dropped: score {:.2} below {:.2}", score, min_score);
                    false
                }
                _ => true,
            })
            .take(self.max_hands)
            .collect();
        let dropped = total - kept.len();

        let mut hands    = Vec::with_capacity(kept.len());
        let mut patterns = Vec::with_capacity(kept.len());
        for (i, landmarks) in kept.into_iter().enumerate() {
            let pattern = match self.classifier.classify(&landmarks) {
                Ok(p)  => Some(p),
                Err(e) => { warn!("hand {} skipped: {}", i + 1, e); None }
            };
            let chord = pattern.and_then(|p| self.controller.book().chord_for(p)).cloned();
            if let Some(p) = pattern { patterns.push(p); }
            hands.push(HandReport { landmarks, pattern, chord });
        }

        let recognised = match self.precedence {
            HandPrecedence::FirstRecognized => hands.iter().find_map(|h| h.chord.clone()),
            HandPrecedence::Sequential      => hands.iter().rev().find_map(|h| h.chord.clone()),
        };

        let actions = self.controller.update_frame(&patterns, captured_at, self.precedence);
        self.apply(&actions);

        FrameReport {
            captured_at,
            hands,
            dropped,
            recognised,
            actions,
            sounding: self.controller.active_chord().cloned(),
        }
    }

    /// Switch off every sounding note.  Safe to call more than once.
    pub fn shutdown(&mut self) -> Vec<Action> {
        let actions = self.controller.release_all();
        self.apply(&actions);
        if !self.closed {
            info!("session closed");
            self.closed = true;
        }
        actions
    }

    fn apply(&mut self, actions: &[Action]) {
        for action in actions {
            for &note in action.notes() {
                let sent = match action {
                    Action::NoteOn  { .. } => self.sink.note_on(self.channel, note, self.velocity),
                    Action::NoteOff { .. } => self.sink.note_off(self.channel, note, self.velocity),
                };
                if let Err(e) = sent {
                    warn!("{} note {}: {}", action.chord(), note, e);
                }
            }
        }
    }
}

impl<S: MidiSink> Drop for Session<S> {
    fn drop(&mut self) {
        if self.controller.active_chord().is_some() || !self.closed {
            self.shutdown();
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// drive() — the poll loop
// ════════════════════════════════════════════════════════════════════════════

/// Run frames through `session` until the overlay asks to quit or the
/// source runs dry.  Returns the number of frames processed.
pub fn drive<F, D, S, O>(
    source:   &mut F,
    detector: &mut D,
    session:  &mut Session<S>,
    overlay:  &mut O,
) -> usize
where
    F: FrameSource,
    D: LandmarkDetector<F::Image>,
    S: MidiSink,
    O: Overlay + ?Sized,
{
    let mut frames = 0;
    loop {
        if overlay.quit_requested() {
            info!("quit requested after {} frames", frames);
            break;
        }
        let Some(frame) = source.next_frame() else {
            info!("end of input after {} frames", frames);
            break;
        };
        let hands  = detector.detect(&frame.image);
        let report = session.process_frame(frame.captured_at, hands);
        overlay.present(&report);
        frames += 1;
    }
    frames
}

/// [`drive`] to the end, then silence the session while the frame source
/// and overlay are still open.  Both are released last.
pub fn perform<F, D, S, O>(mut source: F, mut detector: D, session: &mut Session<S>, mut overlay: O) -> usize
where
    F: FrameSource,
    D: LandmarkDetector<F::Image>,
    S: MidiSink,
    O: Overlay,
{
    let frames = drive(&mut source, &mut detector, session, &mut overlay);
    session.shutdown();
    drop(overlay);
    drop(source);
    frames
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// Opens the MIDI sink first so a missing synthesizer fails before any
/// window appears, then runs the simulator (default) or a landmark stream.
pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    cfg.validate()?;

    let sink: Box<dyn MidiSink> = if cfg.dry_run {
        info!("dry run: MIDI is logged, not sent");
        Box::new(LogSink::new())
    } else {
        let sink = MidirSink::open(cfg.port.as_deref())?;
        info!("MIDI out: {}", sink.port_name());
        Box::new(sink)
    };

    let mut session = Session::new(&cfg, ChordBook::reference(), sink);
    info!("cooldown {:.2}s, {} view, up to {} hand(s), {} precedence",
          cfg.cooldown.as_secs_f64(), cfg.orientation, cfg.max_hands, cfg.precedence);

    match &cfg.landmarks {
        Some(path) => {
            let source = stream::open(path)
                .map_err(|source| AppError::Stream { path: path.clone(), source })?;
            let overlay: Box<dyn Overlay> = if cfg.window {
                Box::new(Visualizer::new(None)?)
            } else {
                Box::new(ConsoleOverlay::new())
            };
            perform(source, Prelabelled, &mut session, overlay);
        }
        None => {
            let (sim_tx, sim_rx) = mpsc::channel();
            let camera = SimulatedCamera::new(sim_rx);
            let vis    = Visualizer::new(Some(sim_tx))?;
            perform(camera, PoseDetector::new(cfg.orientation), &mut session, vis);
        }
    }
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
