//! MIDI output.
//!
//! [`MidiSink`] is the narrow interface the session plays chords through.
//! [`MidirSink`] talks to a real port; [`LogSink`] and [`RecordingSink`]
//! stand in for it in dry runs and tests.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info};
use thiserror::Error;

const CLIENT_NAME: &str = "finger_chords";

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("MIDI backend unavailable: {0}")]
    Backend(String),

    #[error("no MIDI output ports found (start a synthesizer such as `fluidsynth` or `timidity -iA`)")]
    NoPorts,

    #[error("no MIDI output port matches {0:?}")]
    PortNotFound(String),

    #[error("could not connect to MIDI port {port:?}: {reason}")]
    Connect { port: String, reason: String },

    #[error("MIDI send failed: {0}")]
    Send(String),
}

// ════════════════════════════════════════════════════════════════════════════
// MidiEvent — one channel message
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MidiEvent {
    ProgramChange { channel: u8, program: u8 },
    NoteOn        { channel: u8, note: u8, velocity: u8 },
    NoteOff       { channel: u8, note: u8, velocity: u8 },
}

impl MidiEvent {
    /// Raw status + data bytes.
    pub fn bytes(&self) -> Vec<u8> {
        match *self {
            MidiEvent::ProgramChange { channel, program } =>
                vec![0xC0 | (channel & 0x0F), program & 0x7F],
            MidiEvent::NoteOn { channel, note, velocity } =>
                vec![0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
            MidiEvent::NoteOff { channel, note, velocity } =>
                vec![0x80 | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MidiSink
// ════════════════════════════════════════════════════════════════════════════

pub trait MidiSink {
    fn send(&mut self, event: MidiEvent) -> Result<(), SinkError>;

    fn program_change(&mut self, channel: u8, program: u8) -> Result<(), SinkError> {
        self.send(MidiEvent::ProgramChange { channel, program })
    }
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) -> Result<(), SinkError> {
        self.send(MidiEvent::NoteOn { channel, note, velocity })
    }
    fn note_off(&mut self, channel: u8, note: u8, velocity: u8) -> Result<(), SinkError> {
        self.send(MidiEvent::NoteOff { channel, note, velocity })
    }
}

impl<S: MidiSink + ?Sized> MidiSink for Box<S> {
    fn send(&mut self, event: MidiEvent) -> Result<(), SinkError> { (**self).send(event) }
}

// ── midir backend ─────────────────────────────────────────────────────────

pub struct MidirSink {
    conn:      midir::MidiOutputConnection,
    port_name: String,
}

impl MidirSink {
    /// Connect to an output port.
    ///
    /// `selector` is a port index or a case-insensitive name fragment.
    /// Without one, a software synthesizer is preferred if visible,
    /// otherwise the first port is used.
    pub fn open(selector: Option<&str>) -> Result<Self, SinkError> {
        let midi_out = midir::MidiOutput::new(CLIENT_NAME)
            .map_err(|e| SinkError::Backend(e.to_string()))?;

        let ports = midi_out.ports();
        let names: Vec<String> = ports.iter()
            .map(|p| midi_out.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
            .collect();

        let idx  = select_port(&names, selector)?;
        let name = names[idx].clone();
        info!("opening MIDI port {}: {}", idx, name);

        let conn = midi_out.connect(&ports[idx], "finger-chords-out")
            .map_err(|e| SinkError::Connect { port: name.clone(), reason: e.to_string() })?;
        Ok(MidirSink { conn, port_name: name })
    }

    pub fn port_name(&self) -> &str { &self.port_name }
}

impl MidiSink for MidirSink {
    fn send(&mut self, event: MidiEvent) -> Result<(), SinkError> {
        debug!("midi {:?}", event);
        self.conn.send(&event.bytes()).map_err(|e| SinkError::Send(e.to_string()))
    }
}

/// Names of every MIDI output port, in index order.
pub fn list_ports() -> Result<Vec<String>, SinkError> {
    let midi_out = midir::MidiOutput::new(CLIENT_NAME)
        .map_err(|e| SinkError::Backend(e.to_string()))?;
    Ok(midi_out.ports().iter()
        .map(|p| midi_out.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
        .collect())
}

/// Pick a port index from `names`.
pub fn select_port(names: &[String], selector: Option<&str>) -> Result<usize, SinkError> {
    if names.is_empty() {
        return Err(SinkError::NoPorts);
    }

    match selector {
        Some(sel) => {
            if let Ok(idx) = sel.trim().parse::<usize>() {
                return if idx < names.len() { Ok(idx) }
                       else { Err(SinkError::PortNotFound(sel.to_string())) };
            }
            let wanted = sel.to_lowercase();
            names.iter()
                .position(|n| n.to_lowercase().contains(&wanted))
                .ok_or_else(|| SinkError::PortNotFound(sel.to_string()))
        }
        // Prefer a softsynth if visible
        None => Ok(names.iter()
            .position(|n| {
                let n = n.to_lowercase();
                n.contains("fluid") || n.contains("timidity") ||
                n.contains("microsoft") || n.contains("gs wavetable") ||
                n.contains("synth")
            })
            .unwrap_or(0)),
    }
}

// ── log backend (--dry-run) ───────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct LogSink {
    sent: usize,
}

impl LogSink {
    pub fn new() -> Self { LogSink::default() }
    pub fn sent(&self) -> usize { self.sent }
}

impl MidiSink for LogSink {
    fn send(&mut self, event: MidiEvent) -> Result<(), SinkError> {
        self.sent += 1;
        match event {
            MidiEvent::ProgramChange { channel, program } =>
                info!("[dry-run] ch{} program {}", channel, program),
            MidiEvent::NoteOn { channel, note, velocity } =>
                info!("[dry-run] ch{} note-on  {:>3} vel {}", channel, note, velocity),
            MidiEvent::NoteOff { channel, note, velocity } =>
                info!("[dry-run] ch{} note-off {:>3} vel {}", channel, note, velocity),
        }
        Ok(())
    }
}

// ── in-memory backend ─────────────────────────────────────────────────────

/// Records every event.  Clones share one log, so a test can keep a handle
/// while the session owns the sink.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    events: Rc<RefCell<Vec<MidiEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self { RecordingSink::default() }

    pub fn events(&self) -> Vec<MidiEvent> { self.events.borrow().clone() }

    /// Notes currently on, in the order they were switched on.
    pub fn sounding(&self) -> Vec<u8> {
        let mut on: Vec<u8> = Vec::new();
        for event in self.events.borrow().iter() {
            match *event {
                MidiEvent::NoteOn  { note, .. } => on.push(note),
                MidiEvent::NoteOff { note, .. } => on.retain(|&n| n != note),
                MidiEvent::ProgramChange { .. } => {}
            }
        }
        on
    }

    pub fn clear(&self) { self.events.borrow_mut().clear(); }
}

impl MidiSink for RecordingSink {
    fn send(&mut self, event: MidiEvent) -> Result<(), SinkError> {
        self.events.borrow_mut().push(event);
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> { list.iter().map(|s| s.to_string()).collect() }

    #[test]
    fn message_bytes() {
        assert_eq!(MidiEvent::NoteOn  { channel: 0, note: 60, velocity: 127 }.bytes(), vec![0x90, 60, 127]);
        assert_eq!(MidiEvent::NoteOff { channel: 3, note: 64, velocity: 127 }.bytes(), vec![0x83, 64, 127]);
        assert_eq!(MidiEvent::ProgramChange { channel: 0, program: 0 }.bytes(), vec![0xC0, 0]);
    }

    #[test]
    fn channel_is_masked() {
        assert_eq!(MidiEvent::NoteOn { channel: 0x1F, note: 60, velocity: 1 }.bytes()[0], 0x9F);
    }

    #[test]
    fn default_port_prefers_softsynth() {
        let ports = names(&["Midi Through:Midi Through Port-0 14:0", "FLUID Synth (4312):Synth input port 128:0"]);
        assert_eq!(select_port(&ports, None).unwrap(), 1);
        assert_eq!(select_port(&names(&["IAC Driver Bus 1"]), None).unwrap(), 0);
    }

    #[test]
    fn port_by_index_or_name() {
        let ports = names(&["Midi Through", "TiMidity port 0", "TiMidity port 1"]);
        assert_eq!(select_port(&ports, Some("2")).unwrap(), 2);
        assert_eq!(select_port(&ports, Some("timidity")).unwrap(), 1);
        assert_eq!(select_port(&ports, Some("THROUGH")).unwrap(), 0);
    }

    #[test]
    fn missing_ports_are_errors() {
        assert_eq!(select_port(&[], None), Err(SinkError::NoPorts));
        let ports = names(&["Midi Through"]);
        assert_eq!(select_port(&ports, Some("7")), Err(SinkError::PortNotFound("7".into())));
        assert_eq!(select_port(&ports, Some("loopMIDI")), Err(SinkError::PortNotFound("loopMIDI".into())));
    }

    #[test]
    fn recording_sink_shares_log_between_clones() {
        let rec = RecordingSink::new();
        let mut sink: Box<dyn MidiSink> = Box::new(rec.clone());
        sink.program_change(0, 0).unwrap();
        sink.note_on(0, 60, 127).unwrap();
        sink.note_on(0, 64, 127).unwrap();
        sink.note_off(0, 60, 127).unwrap();
        assert_eq!(rec.events().len(), 4);
        assert_eq!(rec.sounding(), vec![64]);
        rec.clear();
        assert!(rec.events().is_empty());
    }

    #[test]
    fn log_sink_counts() {
        let mut sink = LogSink::new();
        sink.note_on(0, 60, 100).unwrap();
        sink.note_off(0, 60, 100).unwrap();
        assert_eq!(sink.sent(), 2);
    }
}
