//! Preset store - named export-option snapshots persisted as JSON
//!
//! Loaded once at startup; the whole file is rewritten on every add or
//! remove. Missing or unparseable data falls back to the built-in
//! defaults silently (logged, never surfaced to the user).

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, warn};

use crate::model::{MidiExportOptions, Preset, QuantizeOptions};

pub struct PresetStore {
    path: PathBuf,
    pub presets: Vec<Preset>,
}

impl PresetStore {
    /// Standard location under the user config directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tunescribe")
            .join("presets.json")
    }

    /// Load presets from `path`, seeding the built-in defaults when the
    /// file is absent, empty, or corrupt.
    pub fn load(path: PathBuf) -> Self {
        let presets = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Vec<Preset>>(&content) {
                Ok(presets) if !presets.is_empty() => {
                    presets.into_iter().map(sanitize).collect()
                }
                Ok(_) => {
                    debug!("preset store at {} is empty, seeding defaults", path.display());
                    default_presets()
                }
                Err(err) => {
                    warn!(
                        "preset store at {} is unreadable ({err}), seeding defaults",
                        path.display()
                    );
                    default_presets()
                }
            },
            Err(_) => default_presets(),
        };
        Self { path, presets }
    }

    /// Append a preset and rewrite the file. Returns the new id.
    pub fn add(&mut self, name: &str, options: MidiExportOptions) -> String {
        let preset = Preset {
            id: generate_id(),
            name: name.to_string(),
            options,
        };
        let id = preset.id.clone();
        self.presets.push(preset);
        self.persist();
        id
    }

    pub fn remove(&mut self, id: &str) {
        self.presets.retain(|p| p.id != id);
        self.persist();
    }

    fn persist(&self) {
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(&self.presets) {
            Ok(json) => {
                if let Err(err) = std::fs::write(&self.path, json) {
                    warn!("failed to write preset store {}: {err}", self.path.display());
                }
            }
            Err(err) => warn!("failed to serialize presets: {err}"),
        }
    }
}

/// Clamp persisted options into the ranges the editor offers. The file
/// is hand-editable, and an out-of-range bpm or grid must not reach the
/// encoder.
fn sanitize(mut preset: Preset) -> Preset {
    let options = &mut preset.options;
    options.bpm = options.bpm.clamp(40, 240);
    options.instrument = options.instrument.clamp(1, 128);
    let (num, den) = options.time_signature;
    options.time_signature = (
        num.clamp(2, 12),
        if matches!(den, 2 | 4 | 8 | 16) { den } else { 4 },
    );
    if !matches!(options.quantize.grid, 4 | 8 | 16 | 32) {
        options.quantize.grid = 16;
    }
    options.quantize.strength = options.quantize.strength.clamp(0.0, 1.0);
    preset
}

/// The two built-ins seeded on first run or after corruption.
fn default_presets() -> Vec<Preset> {
    vec![
        Preset {
            id: "builtin-default-piano".into(),
            name: "Default Piano".into(),
            options: MidiExportOptions {
                bpm: 120,
                time_signature: (4, 4),
                instrument: 1, // acoustic grand
                quantize: QuantizeOptions {
                    enabled: false,
                    grid: 16,
                    strength: 1.0,
                },
            },
        },
        Preset {
            id: "builtin-lofi-beats".into(),
            name: "Lo-Fi Beats".into(),
            options: MidiExportOptions {
                bpm: 85,
                time_signature: (4, 4),
                instrument: 5, // electric piano 1
                quantize: QuantizeOptions {
                    enabled: true,
                    grid: 8,
                    strength: 0.6,
                },
            },
        },
    ]
}

fn generate_id() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    // Counter disambiguates ids minted within one clock tick.
    format!("preset-{nanos}-{}", COUNTER.fetch_add(1, Ordering::Relaxed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tunescribe_presets_{name}.json"))
    }

    #[test]
    fn missing_file_seeds_defaults() {
        let path = temp_path("missing");
        let _ = std::fs::remove_file(&path);
        let store = PresetStore::load(path);
        let names: Vec<&str> = store.presets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Default Piano", "Lo-Fi Beats"]);
    }

    #[test]
    fn corrupt_file_seeds_defaults() {
        let path = temp_path("corrupt");
        std::fs::write(&path, "{not json!").unwrap();
        let store = PresetStore::load(path.clone());
        assert_eq!(store.presets.len(), 2);
        assert!(store.presets[1].options.quantize.enabled);
        assert_eq!(store.presets[1].options.bpm, 85);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn add_and_remove_rewrite_the_file() {
        let path = temp_path("roundtrip");
        let _ = std::fs::remove_file(&path);

        let mut store = PresetStore::load(path.clone());
        let custom = MidiExportOptions {
            bpm: 96,
            ..Default::default()
        };
        let id = store.add("My Groove", custom);

        let reloaded = PresetStore::load(path.clone());
        assert!(reloaded.presets.iter().any(|p| p.id == id && p.name == "My Groove"));

        store.remove(&id);
        let reloaded = PresetStore::load(path.clone());
        assert!(!reloaded.presets.iter().any(|p| p.id == id));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn out_of_range_options_are_clamped_on_load() {
        let path = temp_path("ranges");
        // A hand-edited file with values no editor control would produce.
        std::fs::write(
            &path,
            r#"[{"id":"x","name":"Broken","options":{
                "bpm":0,"time_signature":[0,3],"instrument":0,
                "quantize":{"enabled":true,"grid":0,"strength":2.5}}}]"#,
        )
        .unwrap();

        let store = PresetStore::load(path.clone());
        let options = &store.presets[0].options;
        assert_eq!(options.bpm, 40);
        assert_eq!(options.time_signature, (2, 4));
        assert_eq!(options.instrument, 1);
        assert_eq!(options.quantize.grid, 16);
        assert_eq!(options.quantize.strength, 1.0);

        // The loaded options must be safe to hand straight to the encoder.
        let bytes = crate::midi::encode(&[], options);
        assert!(!bytes.is_empty());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn duplicate_names_are_allowed() {
        let path = temp_path("dupes");
        let _ = std::fs::remove_file(&path);
        let mut store = PresetStore::load(path.clone());
        let a = store.add("Same", MidiExportOptions::default());
        let b = store.add("Same", MidiExportOptions::default());
        assert_ne!(a, b);
        let _ = std::fs::remove_file(&path);
    }
}
