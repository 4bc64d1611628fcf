//! Time quantization - snap note times toward a rhythmic grid
//!
//! Strength interpolates between the raw value and the grid target, so a
//! partial strength gives "humanized" correction rather than hard snap.

use crate::model::{MidiExportOptions, Note, MIN_NOTE_SECS};

/// Snap `value` toward the nearest multiple of `grid_secs` by `strength`.
/// Identity when the grid is zero (quantization disabled) or strength is 0.
pub fn quantize(value: f32, grid_secs: f32, strength: f32) -> f32 {
    if grid_secs <= 0.0 {
        return value;
    }
    let target = (value / grid_secs).round() * grid_secs;
    value + (target - value) * strength
}

/// Seconds per grid cell for a tempo and subdivision.
/// A grid of 16 means sixteenth notes: (60/bpm) * (4/16).
pub fn grid_seconds(bpm: u32, grid: u32) -> f32 {
    (60.0 / bpm as f32) * (4.0 / grid as f32)
}

/// Grid cell width in seconds for the given options; 0 when disabled,
/// which makes [`quantize`] the identity.
pub fn effective_grid_seconds(options: &MidiExportOptions) -> f32 {
    if options.quantize.enabled {
        grid_seconds(options.bpm, options.quantize.grid)
    } else {
        0.0
    }
}

/// Quantize a note's start and end independently, then derive the new
/// duration, flooring it to stay audible.
///
/// The endpoints-then-derive order is deliberate: quantizing start and
/// duration separately can collapse a short note to zero or negative
/// length when both round toward each other.
pub fn quantize_note(note: &mut Note, grid_secs: f32, strength: f32) {
    let start = quantize(note.start_time, grid_secs, strength);
    let end = quantize(note.end_time(), grid_secs, strength);
    note.start_time = start;
    note.duration = (end - start).max(MIN_NOTE_SECS);
}

/// Quantize every note in place when enabled; no-op otherwise.
pub fn quantize_notes(notes: &mut [Note], options: &MidiExportOptions) {
    let grid = effective_grid_seconds(options);
    if grid <= 0.0 {
        return;
    }
    for note in notes {
        quantize_note(note, grid, options.quantize.strength);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NoteKind, QuantizeOptions};

    #[test]
    fn strength_zero_is_identity() {
        for value in [0.0_f32, 0.13, 1.2, 7.77] {
            assert_eq!(quantize(value, 0.25, 0.0), value);
        }
    }

    #[test]
    fn strength_one_is_idempotent() {
        for value in [0.0_f32, 0.13, 1.2, 7.77] {
            let once = quantize(value, 0.25, 1.0);
            let twice = quantize(once, 0.25, 1.0);
            assert!((once - twice).abs() < 1e-6);
        }
    }

    #[test]
    fn zero_grid_is_identity() {
        assert_eq!(quantize(1.23, 0.0, 1.0), 1.23);
    }

    #[test]
    fn partial_strength_moves_halfway() {
        // 1.2 with grid 0.25 targets 1.25; strength 0.5 lands between.
        let v = quantize(1.2, 0.25, 0.5);
        assert!((v - 1.225).abs() < 1e-6);
    }

    #[test]
    fn grid_seconds_formula() {
        // 120 BPM eighth notes: (60/120) * (4/8) = 0.25s
        assert!((grid_seconds(120, 8) - 0.25).abs() < 1e-6);
        // 120 BPM sixteenths: 0.125s
        assert!((grid_seconds(120, 16) - 0.125).abs() < 1e-6);
    }

    fn short_note(start: f32, duration: f32) -> Note {
        Note {
            pitch: 60,
            start_time: start,
            duration,
            velocity: 80,
            instrument: None,
            kind: NoteKind::Melody,
        }
    }

    #[test]
    fn degenerate_duration_stays_positive() {
        // Both endpoints round to the same grid line; duration must floor
        // to MIN_NOTE_SECS rather than collapse to zero.
        let mut n = short_note(0.49, 0.02);
        quantize_note(&mut n, 0.25, 1.0);
        assert!((n.start_time - 0.5).abs() < 1e-6);
        assert_eq!(n.duration, MIN_NOTE_SECS);
    }

    #[test]
    fn grid_aligned_note_is_untouched_at_full_strength() {
        // 0.5s note at 0 with a 1/8 grid at 120 BPM is already aligned.
        let mut n = short_note(0.0, 0.5);
        quantize_note(&mut n, grid_seconds(120, 8), 1.0);
        assert_eq!(n.start_time, 0.0);
        assert_eq!(n.duration, 0.5);
    }

    #[test]
    fn disabled_options_leave_notes_alone() {
        let options = crate::model::MidiExportOptions {
            quantize: QuantizeOptions {
                enabled: false,
                grid: 16,
                strength: 1.0,
            },
            ..Default::default()
        };
        let mut notes = vec![short_note(0.13, 0.37)];
        quantize_notes(&mut notes, &options);
        assert_eq!(notes[0].start_time, 0.13);
        assert_eq!(notes[0].duration, 0.37);
    }
}
