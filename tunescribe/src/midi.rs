//! MIDI encoding - note set to a Standard MIDI File (format 1)
//!
//! One track per distinct instrument. Every note's tick position is
//! computed from its absolute time in seconds, so float rounding error is
//! per-note and never accumulates along the track.
//!
//! The encoder does not clamp pitch, velocity, or instrument: producers
//! (the transcription boundary and the piano roll) own range validation.

use std::collections::BTreeMap;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Track, TrackEvent, TrackEventKind};

use crate::model::{sort_by_start, MidiExportOptions, Note};
use crate::quantize::quantize_notes;

/// Tick resolution: pulses per quarter note.
pub const PPQ: u16 = 128;

/// MIDI clocks per metronome tick (time signature meta event).
const CLOCKS_PER_CLICK: u8 = 24;
/// Notated 32nd notes per quarter (time signature meta event).
const THIRTY_SECONDS_PER_QUARTER: u8 = 8;

/// Absolute tick for a time in seconds at the given tempo.
pub fn seconds_to_ticks(seconds: f32, bpm: u32) -> u32 {
    let ticks_per_second = (bpm as f32 / 60.0) * PPQ as f32;
    (seconds * ticks_per_second).round() as u32
}

/// Encode a note set into Standard MIDI File bytes.
///
/// An empty set produces a valid, silent file with a single meta-only
/// track; the encoder itself never fails. Deciding that zero notes is a
/// user-facing error is the caller's concern.
pub fn encode(notes: &[Note], options: &MidiExportOptions) -> Vec<u8> {
    let mut notes = notes.to_vec();
    quantize_notes(&mut notes, options);

    // Group by effective instrument. BTreeMap keeps the track order
    // deterministic so re-encoding the same input is byte-identical.
    let mut groups: BTreeMap<u8, Vec<Note>> = BTreeMap::new();
    for note in notes {
        groups
            .entry(note.effective_instrument(options.instrument))
            .or_default()
            .push(note);
    }
    if groups.is_empty() {
        groups.insert(options.instrument, Vec::new());
    }

    let mut tracks: Vec<Track> = Vec::new();
    for (track_idx, (instrument, mut group)) in groups.into_iter().enumerate() {
        sort_by_start(&mut group);
        tracks.push(encode_track(track_idx, instrument, &group, options));
    }

    let smf = Smf {
        header: Header {
            format: Format::Parallel,
            timing: midly::Timing::Metrical(u15::new(PPQ)),
        },
        tracks,
    };

    let mut buffer = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = smf.write(&mut buffer);
    buffer
}

/// Build one track: tempo, time signature, program change, then the
/// note on/off stream delta-encoded from absolute ticks.
fn encode_track(
    track_idx: usize,
    instrument: u8,
    notes: &[Note],
    options: &MidiExportOptions,
) -> Track<'static> {
    let channel = u4::new((track_idx % 16) as u8);
    let (ts_num, ts_den) = options.time_signature;

    let mut events: Vec<(u32, TrackEventKind)> = Vec::new();

    let tempo_us = 60_000_000 / options.bpm;
    events.push((0, TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_us)))));
    events.push((
        0,
        TrackEventKind::Meta(MetaMessage::TimeSignature(
            ts_num,
            // Wire form is the power of two: 4/4 -> denominator exponent 2.
            ts_den.trailing_zeros() as u8,
            CLOCKS_PER_CLICK,
            THIRTY_SECONDS_PER_QUARTER,
        )),
    ));
    // Programs are 1-based in the model, 0-based on the wire.
    events.push((
        0,
        TrackEventKind::Midi {
            channel,
            message: MidiMessage::ProgramChange {
                program: u7::new(instrument - 1),
            },
        },
    ));

    for note in notes {
        let start_tick = seconds_to_ticks(note.start_time, options.bpm);
        let end_tick = seconds_to_ticks(note.end_time(), options.bpm);
        events.push((
            start_tick,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn {
                    key: u7::new(note.pitch),
                    vel: u7::new(note.velocity),
                },
            },
        ));
        events.push((
            end_tick,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff {
                    key: u7::new(note.pitch),
                    vel: u7::new(0),
                },
            },
        ));
    }

    // Stable sort: a NoteOff sharing a tick with the next NoteOn lands first.
    events.sort_by_key(|(tick, _)| *tick);

    let mut track: Track = Vec::new();
    let mut last_tick: u32 = 0;
    for (tick, kind) in events {
        track.push(TrackEvent {
            delta: u28::new(tick - last_tick),
            kind,
        });
        last_tick = tick;
    }
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    track
}

/// The artifact as a data URI usable directly as a download href.
pub fn to_data_uri(midi_bytes: &[u8]) -> String {
    format!("data:audio/midi;base64,{}", BASE64.encode(midi_bytes))
}

/// Export filename: source audio base name with a `.mid` extension.
pub fn export_file_name(audio_path: &Path) -> String {
    let stem = audio_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("transcription");
    format!("{stem}.mid")
}
