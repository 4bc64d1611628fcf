//! Note model and export options
//!
//! `Note` is the atomic entity shared by the transcription client, the
//! quantizer, the MIDI encoder, and the piano roll. Times are seconds from
//! the start of the recording. Serde names follow the transcription
//! service's wire format (camelCase fields, lowercase kind tags).

use serde::{Deserialize, Serialize};

/// Shortest note the model will represent, in seconds. Quantization and
/// resize drags floor degenerate durations to this.
pub const MIN_NOTE_SECS: f32 = 0.01;

/// Classification tag from the transcription service. Presentation only;
/// has no effect on encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    Melody,
    Harmony,
}

impl NoteKind {
    pub fn toggled(self) -> Self {
        match self {
            NoteKind::Melody => NoteKind::Harmony,
            NoteKind::Harmony => NoteKind::Melody,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NoteKind::Melody => "melody",
            NoteKind::Harmony => "harmony",
        }
    }
}

/// A timed musical event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// MIDI semitone number, 0-127 (practically the 88-key range 21-108).
    pub pitch: u8,
    /// Seconds from recording start.
    pub start_time: f32,
    /// Seconds; always > 0.
    pub duration: f32,
    /// Loudness, 0-127.
    pub velocity: u8,
    /// General MIDI program, 1-128. Absent means "use the track default".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<u8>,
    #[serde(rename = "type")]
    pub kind: NoteKind,
}

impl Note {
    /// End of the note in seconds.
    pub fn end_time(&self) -> f32 {
        self.start_time + self.duration
    }

    /// The program this note plays with, given the session default.
    pub fn effective_instrument(&self, default: u8) -> u8 {
        self.instrument.unwrap_or(default)
    }
}

/// Order a note set by ascending start time. Insertion order carries no
/// meaning; callers sort before encoding or drawing bar-relative content.
pub fn sort_by_start(notes: &mut [Note]) {
    notes.sort_by(|a, b| {
        a.start_time
            .partial_cmp(&b.start_time)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Quantization settings inside [`MidiExportOptions`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuantizeOptions {
    pub enabled: bool,
    /// Subdivision: 4, 8, 16, or 32 meaning a 1/grid note.
    pub grid: u32,
    /// 0 = no snap, 1 = full snap, in between = partial correction.
    pub strength: f32,
}

impl Default for QuantizeOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            grid: 16,
            strength: 1.0,
        }
    }
}

/// Everything the encoder needs besides the notes themselves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MidiExportOptions {
    pub bpm: u32,
    /// (numerator, denominator); denominator one of 2, 4, 8, 16.
    pub time_signature: (u8, u8),
    /// Default General MIDI program for notes without one, 1-128.
    pub instrument: u8,
    pub quantize: QuantizeOptions,
}

impl Default for MidiExportOptions {
    fn default() -> Self {
        Self {
            bpm: 120,
            time_signature: (4, 4),
            instrument: 1,
            quantize: QuantizeOptions::default(),
        }
    }
}

/// A named, persisted snapshot of export options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub options: MidiExportOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(pitch: u8, start: f32) -> Note {
        Note {
            pitch,
            start_time: start,
            duration: 0.5,
            velocity: 80,
            instrument: None,
            kind: NoteKind::Melody,
        }
    }

    #[test]
    fn effective_instrument_falls_back_to_default() {
        let mut n = note(60, 0.0);
        assert_eq!(n.effective_instrument(1), 1);
        n.instrument = Some(25);
        assert_eq!(n.effective_instrument(1), 25);
    }

    #[test]
    fn sort_orders_by_start_time() {
        let mut notes = vec![note(60, 2.0), note(62, 0.5), note(64, 1.0)];
        sort_by_start(&mut notes);
        let starts: Vec<f32> = notes.iter().map(|n| n.start_time).collect();
        assert_eq!(starts, vec![0.5, 1.0, 2.0]);
    }

    #[test]
    fn kind_toggles_both_ways() {
        assert_eq!(NoteKind::Melody.toggled(), NoteKind::Harmony);
        assert_eq!(NoteKind::Harmony.toggled(), NoteKind::Melody);
    }

    #[test]
    fn wire_format_is_camel_case() {
        let n = note(60, 1.25);
        let json = serde_json::to_string(&n).unwrap();
        assert!(json.contains("\"startTime\":1.25"));
        assert!(json.contains("\"type\":\"melody\""));
        // Absent instrument is omitted, not null.
        assert!(!json.contains("instrument"));

        let parsed: Note = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, n);
    }
}
