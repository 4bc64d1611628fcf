//! Transcription client - the external audio-to-notes service
//!
//! The service is a black box: it consumes raw audio bytes plus a MIME
//! type and returns note records in the wire format of [`crate::model`].
//! The call is blocking and runs on a worker thread; the app polls the
//! returned channel once per frame. One outstanding request per
//! conversion action - the caller disables re-entry while pending.
//!
//! This boundary is also where note validation lives: everything past it
//! (quantizer, encoder, history) assumes in-range values.

use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Note, MIN_NOTE_SECS};

/// Environment variable naming the service endpoint.
const ENDPOINT_VAR: &str = "TUNESCRIBE_API_URL";
/// Optional bearer token for the service.
const API_KEY_VAR: &str = "TUNESCRIBE_API_KEY";

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8642/v1/transcribe";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("transcription request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("transcription service error ({status}): {message}")]
    Service { status: u16, message: String },
}

/// Where and how to reach the service. Read from the environment once at
/// startup.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self {
            endpoint: std::env::var(ENDPOINT_VAR).unwrap_or_else(|_| DEFAULT_ENDPOINT.into()),
            api_key: std::env::var(API_KEY_VAR).ok(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TranscriptionRequest {
    audio: String,
    mime_type: String,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    notes: Vec<Note>,
}

/// Blocking call to the service. An empty note list is a successful
/// response; the app layer decides it means "no notes detected".
pub fn transcribe(
    config: &ServiceConfig,
    audio: &[u8],
    mime_type: &str,
) -> Result<Vec<Note>, TranscribeError> {
    info!(
        "transcribing {} bytes of {mime_type} via {}",
        audio.len(),
        config.endpoint
    );

    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    let body = TranscriptionRequest {
        audio: BASE64.encode(audio),
        mime_type: mime_type.to_string(),
    };

    let mut request = client.post(&config.endpoint).json(&body);
    if let Some(key) = &config.api_key {
        request = request.bearer_auth(key);
    }

    let response = request.send()?;
    let status = response.status();
    if !status.is_success() {
        let message = response.text().unwrap_or_default();
        warn!("service returned {status}: {message}");
        return Err(TranscribeError::Service {
            status: status.as_u16(),
            message,
        });
    }

    let parsed: TranscriptionResponse = response.json()?;
    debug!("service returned {} notes", parsed.notes.len());
    Ok(sanitize(parsed.notes))
}

/// Run [`transcribe`] on a worker thread; the single result arrives on
/// the returned channel. The receiver half is polled from the UI loop.
pub fn spawn_transcription(
    config: ServiceConfig,
    audio: Vec<u8>,
    mime_type: String,
) -> mpsc::Receiver<Result<Vec<Note>, TranscribeError>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let result = transcribe(&config, &audio, &mime_type);
        // The app may have exited; a dead receiver is fine.
        let _ = tx.send(result);
    });
    rx
}

/// Clamp service output into model domain. The encoder downstream trusts
/// its input, so the producer boundary owns this.
fn sanitize(mut notes: Vec<Note>) -> Vec<Note> {
    for note in &mut notes {
        note.pitch = note.pitch.min(127);
        note.velocity = note.velocity.min(127);
        note.instrument = note.instrument.map(|i| i.clamp(1, 128));
        note.start_time = note.start_time.max(0.0);
        note.duration = note.duration.max(MIN_NOTE_SECS);
    }
    notes
}

/// MIME type for a recording, by extension. `None` means the file is not
/// an audio format the service accepts.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())?
        .as_str()
    {
        "wav" => Some("audio/wav"),
        "mp3" => Some("audio/mpeg"),
        "ogg" => Some("audio/ogg"),
        "flac" => Some("audio/flac"),
        "m4a" => Some("audio/mp4"),
        "aiff" | "aif" => Some("audio/aiff"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NoteKind;
    use std::path::PathBuf;

    #[test]
    fn response_parses_wire_format() {
        let json = r#"{
            "notes": [
                {"pitch": 60, "startTime": 0.0, "duration": 0.5,
                 "velocity": 80, "instrument": 1, "type": "melody"},
                {"pitch": 64, "startTime": 0.25, "duration": 0.25,
                 "velocity": 70, "type": "harmony"}
            ]
        }"#;
        let parsed: TranscriptionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.notes.len(), 2);
        assert_eq!(parsed.notes[0].instrument, Some(1));
        assert_eq!(parsed.notes[1].instrument, None);
        assert_eq!(parsed.notes[1].kind, NoteKind::Harmony);
    }

    #[test]
    fn empty_note_list_is_a_successful_parse() {
        let parsed: TranscriptionResponse = serde_json::from_str(r#"{"notes": []}"#).unwrap();
        assert!(parsed.notes.is_empty());
    }

    #[test]
    fn sanitize_clamps_out_of_domain_values() {
        let notes = vec![Note {
            pitch: 200,
            start_time: -1.0,
            duration: 0.0,
            velocity: 180,
            instrument: Some(0),
            kind: NoteKind::Melody,
        }];
        let clean = sanitize(notes);
        assert_eq!(clean[0].pitch, 127);
        assert_eq!(clean[0].velocity, 127);
        assert_eq!(clean[0].instrument, Some(1));
        assert_eq!(clean[0].start_time, 0.0);
        assert!(clean[0].duration > 0.0);
    }

    #[test]
    fn mime_mapping_covers_accepted_formats() {
        assert_eq!(mime_for_path(&PathBuf::from("a.WAV")), Some("audio/wav"));
        assert_eq!(mime_for_path(&PathBuf::from("a.mp3")), Some("audio/mpeg"));
        assert_eq!(mime_for_path(&PathBuf::from("a.m4a")), Some("audio/mp4"));
        assert_eq!(mime_for_path(&PathBuf::from("a.txt")), None);
        assert_eq!(mime_for_path(&PathBuf::from("noext")), None);
    }
}
