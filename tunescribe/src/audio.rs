//! Sine-wave note preview
//!
//! Short enveloped beeps when a note is created or selected. Audio
//! output is best-effort: on machines without a device the preview is
//! silently disabled and editing carries on.

use std::time::Duration;

use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

const SAMPLE_RATE: u32 = 44100;
const PREVIEW_MS: u32 = 180;

/// A single enveloped sine tone.
struct SineWave {
    freq: f32,
    num_samples: usize,
    current_sample: usize,
}

impl SineWave {
    fn new(freq: f32, duration_ms: u32) -> Self {
        Self {
            freq,
            num_samples: (SAMPLE_RATE * duration_ms / 1000) as usize,
            current_sample: 0,
        }
    }
}

impl Source for SineWave {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_millis(
            (self.num_samples as u64 * 1000) / SAMPLE_RATE as u64,
        ))
    }
}

impl Iterator for SineWave {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_sample >= self.num_samples {
            return None;
        }

        let t = self.current_sample as f32 / SAMPLE_RATE as f32;
        self.current_sample += 1;

        // Short attack/decay ramps to avoid clicks.
        let envelope = if self.current_sample < 500 {
            self.current_sample as f32 / 500.0
        } else if self.current_sample > self.num_samples.saturating_sub(500) {
            (self.num_samples - self.current_sample) as f32 / 500.0
        } else {
            1.0
        };

        let sample = (t * self.freq * 2.0 * std::f32::consts::PI).sin() * 0.25 * envelope;
        // Soft limiter to protect speakers.
        Some(sample.tanh())
    }
}

fn midi_to_freq(pitch: u8) -> f32 {
    440.0 * 2.0_f32.powf((pitch as f32 - 69.0) / 12.0)
}

pub struct NotePreview {
    _stream: Option<OutputStream>,
    handle: Option<OutputStreamHandle>,
}

impl NotePreview {
    pub fn new() -> Self {
        let (stream, handle) = OutputStream::try_default().ok().unzip();
        if handle.is_none() {
            log::warn!("no audio output device, note preview disabled");
        }
        Self {
            _stream: stream,
            handle,
        }
    }

    pub fn play(&self, pitch: u8) {
        if let Some(ref handle) = self.handle {
            let source = SineWave::new(midi_to_freq(pitch), PREVIEW_MS);
            if let Ok(sink) = Sink::try_new(handle) {
                sink.set_volume(0.3);
                sink.append(source);
                sink.detach();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concert_a_is_440() {
        assert!((midi_to_freq(69) - 440.0).abs() < 1e-3);
        assert!((midi_to_freq(81) - 880.0).abs() < 1e-2);
    }

    #[test]
    fn source_ends_after_its_duration() {
        let samples: Vec<f32> = SineWave::new(440.0, 10).collect();
        assert_eq!(samples.len(), (SAMPLE_RATE / 100) as usize);
        assert!(samples.iter().all(|s| s.abs() <= 1.0));
    }
}
