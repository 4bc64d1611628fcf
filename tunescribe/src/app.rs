//! Application shell: menu bar, toolbar, piano roll, dialogs
//!
//! Owns the editing session, the export options, and the in-flight
//! transcription. The MIDI artifact is regenerated after every history
//! checkpoint and option change, never per frame.

use std::path::PathBuf;
use std::sync::mpsc;

use egui::{Context, Key};
use scribecore::hatch;
use scribecore::storage::{default_audio_dir, FileBrowser};
use scribecore::theme::{menu_bar, ScribeColors};
use scribecore::widgets::{status_bar, toolbar_separator, FileListItem};
use scribecore::RepaintController;

use crate::audio::NotePreview;
use crate::history::Session;
use crate::midi;
use crate::model::{MidiExportOptions, Note};
use crate::piano_roll::PianoRoll;
use crate::presets::PresetStore;
use crate::transcribe::{self, ServiceConfig, TranscribeError};

const GRID_CHOICES: [u32; 4] = [4, 8, 16, 32];
const DENOMINATOR_CHOICES: [u8; 4] = [2, 4, 8, 16];

type TranscriptionReceiver = mpsc::Receiver<Result<Vec<Note>, TranscribeError>>;

pub struct TunescribeApp {
    session: Session,
    options: MidiExportOptions,
    piano_roll: PianoRoll,
    presets: PresetStore,
    preview: NotePreview,
    repaint: RepaintController,

    service: ServiceConfig,
    pending: Option<TranscriptionReceiver>,
    audio_path: Option<PathBuf>,

    // Current SMF bytes for the session, rebuilt when stale.
    midi_bytes: Vec<u8>,
    midi_dirty: bool,

    status: String,
    error: Option<String>,

    show_file_browser: bool,
    is_saving: bool,
    file_browser: FileBrowser,
    save_filename: String,

    show_save_preset: bool,
    preset_name: String,
    show_about: bool,
}

const AUDIO_EXTENSIONS: [&str; 7] = ["wav", "mp3", "ogg", "flac", "m4a", "aiff", "aif"];

fn audio_filter() -> Vec<String> {
    AUDIO_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

impl TunescribeApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        scribecore::ScribeTheme::default().apply(&cc.egui_ctx);

        let options = MidiExportOptions::default();
        let mut app = Self {
            session: Session::new(),
            options,
            piano_roll: PianoRoll::new(),
            presets: PresetStore::load(PresetStore::default_path()),
            preview: NotePreview::new(),
            repaint: RepaintController::new(),
            service: ServiceConfig::from_env(),
            pending: None,
            audio_path: None,
            midi_bytes: Vec::new(),
            midi_dirty: false,
            status: "drop an audio file to transcribe".to_string(),
            error: None,
            show_file_browser: false,
            is_saving: false,
            file_browser: FileBrowser::new(default_audio_dir()).with_filter(audio_filter()),
            save_filename: String::new(),
            show_save_preset: false,
            preset_name: String::new(),
            show_about: false,
        };
        app.refresh_midi();
        app
    }

    fn refresh_midi(&mut self) {
        self.midi_bytes = midi::encode(self.session.notes(), &self.options);
        self.midi_dirty = false;
    }

    fn mark_edited(&mut self) {
        self.midi_dirty = true;
        self.repaint.mark_needs_repaint();
    }

    fn undo(&mut self) {
        self.session.undo();
        self.piano_roll.selected = None;
        self.mark_edited();
    }

    fn redo(&mut self) {
        self.session.redo();
        self.piano_roll.selected = None;
        self.mark_edited();
    }

    // -- transcription --------------------------------------------------

    fn begin_transcription(&mut self, path: PathBuf) {
        if self.pending.is_some() {
            return;
        }
        let Some(mime) = transcribe::mime_for_path(&path) else {
            self.error = Some(format!("not an audio file: {}", path.display()));
            return;
        };
        let audio = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.error = Some(format!("could not read {}: {}", path.display(), err));
                return;
            }
        };
        log::info!("transcribing {} ({} bytes)", path.display(), audio.len());
        self.status = format!(
            "transcribing {}...",
            path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
        );
        self.pending = Some(transcribe::spawn_transcription(
            self.service.clone(),
            audio,
            mime.to_string(),
        ));
        self.audio_path = Some(path);
    }

    fn poll_transcription(&mut self) {
        let Some(rx) = &self.pending else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(notes)) => {
                self.pending = None;
                // An empty result is a domain failure: surface it and
                // leave the previous session untouched.
                if notes.is_empty() {
                    self.status = "transcription returned nothing".to_string();
                    self.error = Some("no notes detected in this recording".to_string());
                    return;
                }
                self.status = format!("transcribed {} notes", notes.len());
                log::info!("transcription finished: {} notes", notes.len());
                self.session.replace_all(notes);
                self.piano_roll.request_scroll_to_content();
                self.mark_edited();
            }
            Ok(Err(err)) => {
                self.pending = None;
                self.status = "transcription failed".to_string();
                log::error!("transcription failed: {err}");
                self.error = Some(err.to_string());
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => {
                self.pending = None;
                self.error = Some("transcription worker stopped unexpectedly".to_string());
            }
        }
    }

    // -- dialogs --------------------------------------------------------

    fn show_open_dialog(&mut self) {
        self.file_browser = FileBrowser::new(default_audio_dir()).with_filter(audio_filter());
        self.is_saving = false;
        self.show_file_browser = true;
    }

    fn show_export_dialog(&mut self) {
        self.file_browser = FileBrowser::new(default_audio_dir());
        self.save_filename = self
            .audio_path
            .as_deref()
            .map(midi::export_file_name)
            .unwrap_or_else(|| "untitled.mid".to_string());
        self.is_saving = true;
        self.show_file_browser = true;
    }

    fn export_to_path(&mut self, path: PathBuf) {
        if self.midi_dirty {
            self.refresh_midi();
        }
        match std::fs::write(&path, &self.midi_bytes) {
            Ok(()) => {
                log::info!("exported {} bytes to {}", self.midi_bytes.len(), path.display());
                self.status = format!("exported {}", path.display());
            }
            Err(err) => {
                log::error!("export to {} failed: {err}", path.display());
                self.error = Some(format!("export failed: {err}"));
            }
        }
    }

    fn copy_data_uri(&mut self, ctx: &Context) {
        if self.midi_dirty {
            self.refresh_midi();
        }
        ctx.output_mut(|o| o.copied_text = midi::to_data_uri(&self.midi_bytes));
        self.status = "MIDI data URI copied".to_string();
    }

    // -- input ----------------------------------------------------------

    fn handle_keys(&mut self, ctx: &Context) {
        scribecore::theme::consume_special_keys(ctx);

        // Dropped audio files start a transcription.
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .filter(|p| transcribe::mime_for_path(p).is_some())
                .collect()
        });
        if let Some(path) = dropped.into_iter().next() {
            self.begin_transcription(path);
        }

        let actions = read_key_actions(ctx);
        if actions.open {
            self.show_file_browser = false;
            self.show_open_dialog();
        }
        if actions.export {
            self.show_export_dialog();
        }
        if actions.undo {
            self.undo();
        }
        if actions.redo {
            self.redo();
        }
        if actions.delete && self.piano_roll.delete_selected(&mut self.session) {
            self.mark_edited();
        }
        if actions.toggle_kind && self.piano_roll.toggle_selected_kind(&mut self.session) {
            self.mark_edited();
        }
        if actions.zoom_in {
            self.piano_roll.zoom_time(1.25);
        }
        if actions.zoom_out {
            self.piano_roll.zoom_time(0.8);
        }
    }

    // -- chrome ---------------------------------------------------------

    fn render_menu(&mut self, ctx: &Context, ui: &mut egui::Ui) {
        menu_bar(ui, |ui| {
            ui.menu_button("file", |ui| {
                let idle = self.pending.is_none();
                if ui
                    .add_enabled(idle, egui::Button::new("open audio...  ⌘O"))
                    .clicked()
                {
                    self.show_open_dialog();
                    ui.close_menu();
                }
                if ui.button("export midi... ⌘E").clicked() {
                    self.show_export_dialog();
                    ui.close_menu();
                }
                if ui.button("copy data uri").clicked() {
                    self.copy_data_uri(ctx);
                    ui.close_menu();
                }
            });
            ui.menu_button("edit", |ui| {
                if ui
                    .add_enabled(self.session.can_undo(), egui::Button::new("undo        ⌘Z"))
                    .clicked()
                {
                    self.undo();
                    ui.close_menu();
                }
                if ui
                    .add_enabled(self.session.can_redo(), egui::Button::new("redo        ⇧⌘Z"))
                    .clicked()
                {
                    self.redo();
                    ui.close_menu();
                }
                ui.separator();
                let has_selection = self.piano_roll.selected.is_some();
                if ui
                    .add_enabled(has_selection, egui::Button::new("delete      ⌫"))
                    .clicked()
                {
                    if self.piano_roll.delete_selected(&mut self.session) {
                        self.mark_edited();
                    }
                    ui.close_menu();
                }
                if ui
                    .add_enabled(has_selection, egui::Button::new("melody/harmony  m"))
                    .clicked()
                {
                    if self.piano_roll.toggle_selected_kind(&mut self.session) {
                        self.mark_edited();
                    }
                    ui.close_menu();
                }
            });
            ui.menu_button("presets", |ui| {
                let mut apply = None;
                let mut remove = None;
                for preset in &self.presets.presets {
                    ui.horizontal(|ui| {
                        if ui.button(&preset.name).clicked() {
                            apply = Some(preset.options.clone());
                            ui.close_menu();
                        }
                        if ui.small_button("×").clicked() {
                            remove = Some(preset.id.clone());
                        }
                    });
                }
                if let Some(options) = apply {
                    self.options = options;
                    self.status = "preset applied".to_string();
                }
                if let Some(id) = remove {
                    self.presets.remove(&id);
                }
                ui.separator();
                if ui.button("save current...").clicked() {
                    self.preset_name.clear();
                    self.show_save_preset = true;
                    ui.close_menu();
                }
            });
            ui.menu_button("help", |ui| {
                if ui.button("about").clicked() {
                    self.show_about = true;
                    ui.close_menu();
                }
            });
        });
    }

    fn render_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("bpm");
            ui.add(
                egui::DragValue::new(&mut self.options.bpm)
                    .clamp_range(40..=240)
                    .speed(1),
            );

            toolbar_separator(ui);

            let (num, den) = self.options.time_signature;
            ui.menu_button(format!("{}/{}", num, den), |ui| {
                ui.label("beats per bar");
                let mut num = num;
                ui.add(egui::DragValue::new(&mut num).clamp_range(2..=12));
                ui.label("beat unit");
                let mut den = den;
                ui.horizontal(|ui| {
                    for d in DENOMINATOR_CHOICES {
                        if ui.selectable_label(den == d, d.to_string()).clicked() {
                            den = d;
                        }
                    }
                });
                self.options.time_signature = (num, den);
            });

            toolbar_separator(ui);

            ui.label("program");
            ui.add(
                egui::DragValue::new(&mut self.options.instrument)
                    .clamp_range(1..=128)
                    .speed(1),
            );

            toolbar_separator(ui);

            ui.checkbox(&mut self.options.quantize.enabled, "quantize");
            if self.options.quantize.enabled {
                ui.menu_button(format!("1/{}", self.options.quantize.grid), |ui| {
                    for grid in GRID_CHOICES {
                        if ui.button(format!("1/{grid}")).clicked() {
                            self.options.quantize.grid = grid;
                            ui.close_menu();
                        }
                    }
                });
                ui.add(
                    egui::Slider::new(&mut self.options.quantize.strength, 0.0..=1.0)
                        .text("strength"),
                );
            }

            toolbar_separator(ui);

            if ui.button("-").on_hover_text("zoom out").clicked() {
                self.piano_roll.zoom_time(0.8);
            }
            if ui.button("+").on_hover_text("zoom in").clicked() {
                self.piano_roll.zoom_time(1.25);
            }
        });
    }

    fn render_file_browser(&mut self, ctx: &Context) {
        let title = if self.is_saving {
            "export midi"
        } else {
            "open audio"
        };

        let resp = egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .default_width(380.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("location:");
                    ui.label(self.file_browser.current_dir.to_string_lossy().to_string());
                });
                ui.separator();

                egui::ScrollArea::vertical().max_height(220.0).show(ui, |ui| {
                    let mut clicked_idx = None;
                    let mut nav_path = None;
                    let mut open_path = None;
                    for (idx, entry) in self.file_browser.entries.iter().enumerate() {
                        let selected = self.file_browser.selected_index == Some(idx);
                        let response = ui
                            .add(FileListItem::new(&entry.name, entry.is_directory).selected(selected));
                        if response.clicked() {
                            clicked_idx = Some(idx);
                        }
                        if response.double_clicked() {
                            if entry.is_directory {
                                nav_path = Some(entry.path.clone());
                            } else if !self.is_saving {
                                open_path = Some(entry.path.clone());
                            }
                        }
                    }
                    if let Some(idx) = clicked_idx {
                        self.file_browser.selected_index = Some(idx);
                    }
                    if let Some(path) = nav_path {
                        self.file_browser.navigate_to(path);
                    }
                    if let Some(path) = open_path {
                        self.begin_transcription(path);
                        self.show_file_browser = false;
                    }
                });

                if self.is_saving {
                    ui.separator();
                    ui.horizontal(|ui| {
                        ui.label("filename:");
                        ui.text_edit_singleline(&mut self.save_filename);
                    });
                }

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("cancel").clicked() {
                        self.show_file_browser = false;
                    }
                    let action = if self.is_saving { "export" } else { "open" };
                    if ui.button(action).clicked() {
                        if self.is_saving {
                            if !self.save_filename.is_empty() {
                                let path =
                                    self.file_browser.save_directory().join(&self.save_filename);
                                let path = if path.extension().is_none() {
                                    path.with_extension("mid")
                                } else {
                                    path
                                };
                                self.export_to_path(path);
                                self.show_file_browser = false;
                            }
                        } else if let Some(entry) = self.file_browser.selected_entry() {
                            if !entry.is_directory {
                                let path = entry.path.clone();
                                self.begin_transcription(path);
                                self.show_file_browser = false;
                            }
                        }
                    }
                });
            });
        if let Some(r) = &resp {
            hatch::draw_window_shadow(ctx, r.response.rect);
        }
    }

    fn render_save_preset(&mut self, ctx: &Context) {
        let resp = egui::Window::new("save preset")
            .collapsible(false)
            .resizable(false)
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("name:");
                    ui.text_edit_singleline(&mut self.preset_name);
                });
                ui.add_space(4.0);
                ui.horizontal(|ui| {
                    if ui.button("cancel").clicked() {
                        self.show_save_preset = false;
                    }
                    let valid = !self.preset_name.trim().is_empty();
                    if ui.add_enabled(valid, egui::Button::new("save")).clicked() {
                        let name = self.preset_name.trim().to_string();
                        self.presets.add(&name, self.options.clone());
                        self.status = format!("saved preset '{name}'");
                        self.show_save_preset = false;
                    }
                });
            });
        if let Some(r) = &resp {
            hatch::draw_window_shadow(ctx, r.response.rect);
        }
    }

    fn render_error(&mut self, ctx: &Context) {
        let Some(message) = self.error.clone() else {
            return;
        };
        let resp = egui::Window::new("error")
            .collapsible(false)
            .resizable(false)
            .default_width(320.0)
            .show(ctx, |ui| {
                ui.label(message);
                ui.add_space(4.0);
                ui.vertical_centered(|ui| {
                    if ui.button("ok").clicked() {
                        self.error = None;
                    }
                });
            });
        if let Some(r) = &resp {
            hatch::draw_window_shadow(ctx, r.response.rect);
        }
    }

    fn render_about(&mut self, ctx: &Context) {
        let resp = egui::Window::new("about tunescribe")
            .collapsible(false)
            .resizable(false)
            .default_width(300.0)
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.heading("tunescribe");
                    ui.label(format!("version {}", env!("CARGO_PKG_VERSION")));
                    ui.add_space(8.0);
                    ui.label("audio to MIDI transcription studio");
                });
                ui.add_space(8.0);
                ui.separator();
                ui.add_space(4.0);
                ui.label("workflow:");
                ui.label("  drop an audio file, edit the notes,");
                ui.label("  export a standard MIDI file");
                ui.add_space(4.0);
                ui.label("frameworks:");
                ui.label("  egui/eframe (MIT), midly (MIT)");
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    if ui.button("ok").clicked() {
                        self.show_about = false;
                    }
                });
            });
        if let Some(r) = &resp {
            hatch::draw_window_shadow(ctx, r.response.rect);
        }
    }
}

#[derive(Default)]
struct KeyActions {
    undo: bool,
    redo: bool,
    delete: bool,
    toggle_kind: bool,
    open: bool,
    export: bool,
    zoom_in: bool,
    zoom_out: bool,
}

/// Editing keys are suspended while a text field owns the keyboard, so
/// backspacing in a filename never deletes the selected note. The file
/// dialogs stay reachable either way.
fn read_key_actions(ctx: &Context) -> KeyActions {
    let typing = ctx.wants_keyboard_input();
    ctx.input(|i| {
        let mut actions = KeyActions::default();
        let cmd = i.modifiers.command;

        if cmd && i.key_pressed(Key::O) {
            actions.open = true;
        }
        if cmd && i.key_pressed(Key::E) {
            actions.export = true;
        }
        if typing {
            return actions;
        }

        if cmd && i.key_pressed(Key::Z) {
            if i.modifiers.shift {
                actions.redo = true;
            } else {
                actions.undo = true;
            }
        }
        if cmd && i.key_pressed(Key::Y) {
            actions.redo = true;
        }
        if i.key_pressed(Key::Backspace) || i.key_pressed(Key::Delete) {
            actions.delete = true;
        }
        if i.key_pressed(Key::M) {
            actions.toggle_kind = true;
        }

        // Zoom (+ / = in, - out)
        if !cmd {
            if i.key_pressed(Key::Plus) || i.key_pressed(Key::Equals) {
                actions.zoom_in = true;
            }
            if i.key_pressed(Key::Minus) {
                actions.zoom_out = true;
            }
        }
        actions
    })
}

impl eframe::App for TunescribeApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.repaint.begin_frame(ctx);

        let options_before = self.options.clone();

        self.handle_keys(ctx);
        self.poll_transcription();
        self.repaint.set_continuous(self.pending.is_some());

        egui::TopBottomPanel::top("menu").show(ctx, |ui| {
            self.render_menu(ctx, ui);
        });

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.render_toolbar(ui);
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            let quantize = if self.options.quantize.enabled {
                format!(
                    "grid 1/{} @ {:.0}%",
                    self.options.quantize.grid,
                    self.options.quantize.strength * 100.0
                )
            } else {
                "quantize off".to_string()
            };
            let selection = self
                .piano_roll
                .selected_note(&self.session)
                .map(|n| {
                    format!(
                        " | {} {} @ {:.2}s",
                        crate::piano_roll::note_name(n.pitch),
                        n.kind.label(),
                        n.start_time
                    )
                })
                .unwrap_or_default();
            let line = format!(
                "{} notes | {} BPM {}/{} | {} | {}{}",
                self.session.notes().len(),
                self.options.bpm,
                self.options.time_signature.0,
                self.options.time_signature.1,
                quantize,
                self.status,
                selection
            );
            status_bar(ui, &line);
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(ScribeColors::PAPER))
            .show(ctx, |ui| {
                let output = self.piano_roll.show(ui, &mut self.session, &self.options);
                if output.committed {
                    self.mark_edited();
                }
                if let Some(pitch) = output.preview_pitch {
                    self.preview.play(pitch);
                }
            });

        if self.show_file_browser {
            self.render_file_browser(ctx);
        }
        if self.show_save_preset {
            self.render_save_preset(ctx);
        }
        if self.show_about {
            self.render_about(ctx);
        }
        self.render_error(ctx);

        if self.options != options_before {
            self.midi_dirty = true;
        }
        if self.midi_dirty {
            self.refresh_midi();
        }

        self.repaint.end_frame(ctx);
    }
}
