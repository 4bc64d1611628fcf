//! Piano-roll editor - pointer-driven note editing on a time/pitch grid
//!
//! Horizontal axis is seconds scaled by the time zoom, vertical axis is
//! semitone rows scaled by the pitch zoom. The pointer state machine is
//! `Idle` or `Dragging { Move | Resize }`:
//!
//! - click or press on empty grid: create a snapped note, commit
//!   immediately; click on a note: select it.
//! - drag from a note body: start a move drag; near the right edge
//!   (fixed pixel width, zoom independent): start a resize drag.
//! - while dragging, the note is recomputed from the captured origin and
//!   the absolute pointer delta (never incrementally from the previous
//!   frame) and written as a live preview only.
//! - release commits once, so each drag is a single undo step.
//!
//! Zoom affects rendering and hit-testing scale only; the underlying
//! times and pitches never change with zoom.

use egui::{Pos2, Rect, Sense, Stroke, Vec2};
use scribecore::hatch;
use scribecore::theme::ScribeColors;

use crate::history::Session;
use crate::model::{MidiExportOptions, Note, NoteKind, MIN_NOTE_SECS};
use crate::quantize::{effective_grid_seconds, quantize};

const ROW_HEIGHT: f32 = 12.0;
const PX_PER_SECOND: f32 = 100.0;
const KEY_GUTTER_WIDTH: f32 = 60.0;
/// Resize hit region at a note's trailing edge, in screen pixels.
const RESIZE_HANDLE_PX: f32 = 6.0;
/// Duration for notes created while quantization is off.
const FALLBACK_NOTE_SECS: f32 = 0.25;
const DEFAULT_VELOCITY: u8 = 100;

pub const TIME_ZOOM_RANGE: std::ops::RangeInclusive<f32> = 0.25..=4.0;
pub const PITCH_ZOOM_RANGE: std::ops::RangeInclusive<f32> = 0.5..=2.0;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

#[derive(Clone, Copy, PartialEq, Eq)]
enum DragKind {
    Move,
    Resize,
}

struct DragState {
    kind: DragKind,
    index: usize,
    origin: Pos2,
    original: Note,
    /// Pre-drag note set, pushed to history when the drag commits.
    snapshot: Vec<Note>,
}

/// What a pointer position landed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HitZone {
    Body,
    TrailingEdge,
}

/// Per-frame results the app shell reacts to.
#[derive(Default)]
pub struct PianoRollOutput {
    /// A history checkpoint was made; the MIDI artifact is stale.
    pub committed: bool,
    /// A note was created or selected; the shell may sound a preview.
    pub preview_pitch: Option<u8>,
}

/// Screen-space mapping for one frame of the grid area.
struct Geometry {
    grid_left: f32,
    top: f32,
    scroll_x: f32,
    scroll_y: f32,
    px_per_sec: f32,
    row_height: f32,
}

impl Geometry {
    fn x(&self, seconds: f32) -> f32 {
        self.grid_left + seconds * self.px_per_sec - self.scroll_x
    }

    fn time_at(&self, x: f32) -> f32 {
        ((x - self.grid_left + self.scroll_x) / self.px_per_sec).max(0.0)
    }

    fn y(&self, pitch: u8) -> f32 {
        self.top + (127 - pitch) as f32 * self.row_height - self.scroll_y
    }

    fn pitch_at(&self, y: f32) -> u8 {
        let row = ((y - self.top + self.scroll_y) / self.row_height).floor() as i32;
        (127 - row).clamp(0, 127) as u8
    }

    fn note_rect(&self, note: &Note) -> Rect {
        Rect::from_min_size(
            Pos2::new(self.x(note.start_time), self.y(note.pitch)),
            Vec2::new(note.duration * self.px_per_sec, self.row_height),
        )
    }
}

/// Topmost (last-drawn) note under `pos`, with the zone hit.
fn hit_test(notes: &[Note], geo: &Geometry, pos: Pos2) -> Option<(usize, HitZone)> {
    for (idx, note) in notes.iter().enumerate().rev() {
        let rect = geo.note_rect(note);
        if rect.contains(pos) {
            // Narrow notes keep a draggable body; the handle never takes
            // more than the trailing part of the rect.
            let handle = RESIZE_HANDLE_PX.min(rect.width() * 0.4);
            let zone = if pos.x >= rect.max.x - handle {
                HitZone::TrailingEdge
            } else {
                HitZone::Body
            };
            return Some((idx, zone));
        }
    }
    None
}

/// Snap a time to the grid at full strength; identity when the grid is 0.
fn snap_time(seconds: f32, grid_secs: f32) -> f32 {
    quantize(seconds, grid_secs, 1.0)
}

/// Synthesize the note a grid click creates: snapped start, one grid unit
/// long (or the fixed fallback when quantization is off), default
/// velocity, inheriting the first existing note's instrument.
fn plan_created_note(
    time: f32,
    pitch: u8,
    grid_secs: f32,
    instrument_hint: Option<u8>,
) -> Note {
    let duration = if grid_secs > 0.0 {
        grid_secs
    } else {
        FALLBACK_NOTE_SECS
    };
    Note {
        pitch,
        start_time: snap_time(time, grid_secs).max(0.0),
        duration,
        velocity: DEFAULT_VELOCITY,
        instrument: instrument_hint,
        kind: NoteKind::Melody,
    }
}

/// Move preview: start follows the horizontal delta snapped to the grid,
/// pitch follows the row delta, both clamped to domain.
fn moved_note(original: &Note, delta: Vec2, geo: &Geometry, grid_secs: f32) -> Note {
    let dx_secs = delta.x / geo.px_per_sec;
    let dy_rows = (delta.y / geo.row_height).round() as i32;
    let mut note = original.clone();
    note.start_time = snap_time(original.start_time + dx_secs, grid_secs).max(0.0);
    note.pitch = (original.pitch as i32 - dy_rows).clamp(0, 127) as u8;
    note
}

/// Resize preview: duration follows the horizontal delta, snapped, and
/// floored so the note stays audible.
fn resized_note(original: &Note, delta: Vec2, geo: &Geometry, grid_secs: f32) -> Note {
    let dx_secs = delta.x / geo.px_per_sec;
    let min_dur = if grid_secs > 0.0 {
        grid_secs
    } else {
        MIN_NOTE_SECS
    };
    let mut note = original.clone();
    note.duration = snap_time(original.duration + dx_secs, grid_secs).max(min_dur);
    note
}

pub struct PianoRoll {
    pub scroll_x: f32,
    pub scroll_y: f32,
    pub time_zoom: f32,
    pub pitch_zoom: f32,
    pub selected: Option<usize>,
    drag: Option<DragState>,
    scroll_to_content: bool,
}

impl Default for PianoRoll {
    fn default() -> Self {
        Self::new()
    }
}

impl PianoRoll {
    pub fn new() -> Self {
        Self {
            scroll_x: 0.0,
            // Open around middle C rather than the top of the range.
            scroll_y: 55.0 * ROW_HEIGHT,
            time_zoom: 1.0,
            pitch_zoom: 1.0,
            selected: None,
            drag: None,
            scroll_to_content: false,
        }
    }

    /// Center the viewport on the occupied pitch range next frame. Called
    /// whenever the note set is replaced (fresh transcription).
    pub fn request_scroll_to_content(&mut self) {
        self.scroll_to_content = true;
        self.selected = None;
        self.drag = None;
    }

    pub fn zoom_time(&mut self, factor: f32) {
        self.time_zoom =
            (self.time_zoom * factor).clamp(*TIME_ZOOM_RANGE.start(), *TIME_ZOOM_RANGE.end());
    }

    pub fn zoom_pitch(&mut self, factor: f32) {
        self.pitch_zoom =
            (self.pitch_zoom * factor).clamp(*PITCH_ZOOM_RANGE.start(), *PITCH_ZOOM_RANGE.end());
    }

    /// Remove the selected note. One commit, selection cleared.
    pub fn delete_selected(&mut self, session: &mut Session) -> bool {
        let Some(idx) = self.selected else {
            return false;
        };
        if idx >= session.notes().len() {
            self.selected = None;
            return false;
        }
        let mut edited = session.notes().to_vec();
        edited.remove(idx);
        session.commit(edited);
        self.selected = None;
        true
    }

    /// Flip the selected note between melody and harmony. One commit.
    pub fn toggle_selected_kind(&mut self, session: &mut Session) -> bool {
        let Some(idx) = self.selected else {
            return false;
        };
        let Some(note) = session.notes().get(idx) else {
            return false;
        };
        let mut edited = session.notes().to_vec();
        edited[idx].kind = note.kind.toggled();
        session.commit(edited);
        true
    }

    pub fn selected_note<'a>(&self, session: &'a Session) -> Option<&'a Note> {
        self.selected.and_then(|i| session.notes().get(i))
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        session: &mut Session,
        options: &MidiExportOptions,
    ) -> PianoRollOutput {
        let mut output = PianoRollOutput::default();

        self.time_zoom = self
            .time_zoom
            .clamp(*TIME_ZOOM_RANGE.start(), *TIME_ZOOM_RANGE.end());
        self.pitch_zoom = self
            .pitch_zoom
            .clamp(*PITCH_ZOOM_RANGE.start(), *PITCH_ZOOM_RANGE.end());

        let available = ui.available_size();
        let (response, painter) = ui.allocate_painter(available, Sense::click_and_drag());
        let rect = response.rect;

        if self.scroll_to_content {
            self.apply_scroll_to_content(session.notes(), rect.height());
            self.scroll_to_content = false;
        }

        let geo = Geometry {
            grid_left: rect.min.x + KEY_GUTTER_WIDTH,
            top: rect.min.y,
            scroll_x: self.scroll_x,
            scroll_y: self.scroll_y,
            px_per_sec: PX_PER_SECOND * self.time_zoom,
            row_height: ROW_HEIGHT * self.pitch_zoom,
        };
        let grid_rect = Rect::from_min_max(Pos2::new(geo.grid_left, rect.min.y), rect.max);
        let grid_secs = effective_grid_seconds(options);

        painter.rect_filled(rect, 0.0, ScribeColors::PAPER);
        self.draw_grid(&painter, grid_rect, &geo, options, grid_secs);
        self.draw_notes(&painter, grid_rect, &geo, session.notes());
        self.draw_key_gutter(&painter, rect, &geo);

        self.handle_pointer(&response, grid_rect, &geo, session, grid_secs, &mut output);
        self.handle_scroll(ui, &response);

        painter.rect_stroke(rect, 0.0, Stroke::new(1.0, ScribeColors::INK));
        output
    }

    fn apply_scroll_to_content(&mut self, notes: &[Note], view_height: f32) {
        if notes.is_empty() {
            return;
        }
        let first_start = notes
            .iter()
            .map(|n| n.start_time)
            .fold(f32::INFINITY, f32::min);
        let (lo, hi) = notes.iter().fold((127u8, 0u8), |(lo, hi), n| {
            (lo.min(n.pitch), hi.max(n.pitch))
        });
        let mid = (lo as f32 + hi as f32) / 2.0;
        let row_height = ROW_HEIGHT * self.pitch_zoom;
        self.scroll_x = (first_start * PX_PER_SECOND * self.time_zoom - 40.0).max(0.0);
        self.scroll_y = ((127.0 - mid) * row_height - view_height / 2.0).max(0.0);
    }

    fn draw_grid(
        &self,
        painter: &egui::Painter,
        grid_rect: Rect,
        geo: &Geometry,
        options: &MidiExportOptions,
        grid_secs: f32,
    ) {
        let painter = painter.with_clip_rect(grid_rect);

        // Pitch rows.
        let visible_rows = (grid_rect.height() / geo.row_height) as i32 + 2;
        for i in 0..visible_rows {
            let y = grid_rect.min.y + i as f32 * geo.row_height - (self.scroll_y % geo.row_height);
            painter.hline(
                grid_rect.x_range(),
                y,
                Stroke::new(0.5, ScribeColors::FAINT),
            );
        }

        // Time lines: beats from the tempo, heavier at bar boundaries,
        // light subdivision lines at the snap grid when it is active.
        let secs_per_beat = 60.0 / options.bpm as f32;
        let (ts_num, ts_den) = options.time_signature;
        let secs_per_bar = secs_per_beat * ts_num as f32 * (4.0 / ts_den as f32);

        let step = if grid_secs > 0.0 {
            grid_secs.min(secs_per_beat)
        } else {
            secs_per_beat
        };
        let first = (self.scroll_x / (step * geo.px_per_sec)).floor() * step;
        let visible_secs = grid_rect.width() / geo.px_per_sec;
        let mut t = first;
        while t < first + visible_secs + step {
            let x = geo.x(t);
            let on_bar = (t % secs_per_bar).abs() < 1e-3 || (secs_per_bar - t % secs_per_bar) < 1e-3;
            let on_beat = (t % secs_per_beat).abs() < 1e-3 || (secs_per_beat - t % secs_per_beat) < 1e-3;
            let stroke = if on_bar {
                Stroke::new(1.5, ScribeColors::INK)
            } else if on_beat {
                Stroke::new(1.0, ScribeColors::FAINT)
            } else {
                Stroke::new(0.5, ScribeColors::FAINT)
            };
            painter.vline(x, grid_rect.y_range(), stroke);
            t += step;
        }
    }

    fn draw_notes(&self, painter: &egui::Painter, grid_rect: Rect, geo: &Geometry, notes: &[Note]) {
        let painter = painter.with_clip_rect(grid_rect);
        for (idx, note) in notes.iter().enumerate() {
            let rect = geo.note_rect(note);
            if !rect.intersects(grid_rect) {
                continue;
            }

            if self.selected == Some(idx) {
                painter.rect_filled(rect, 0.0, ScribeColors::PAPER);
                hatch::draw_hatch_selection(&painter, rect);
                // Resize affordance on the trailing edge.
                painter.vline(
                    rect.max.x - RESIZE_HANDLE_PX.min(rect.width() * 0.4),
                    rect.y_range(),
                    Stroke::new(1.0, ScribeColors::ACCENT),
                );
                continue;
            }

            match note.kind {
                NoteKind::Melody => {
                    painter.rect_filled(rect, 0.0, ScribeColors::INK);
                }
                NoteKind::Harmony => {
                    painter.rect_filled(rect, 0.0, ScribeColors::PAPER);
                    hatch::draw_hatch_fill(&painter, rect);
                }
            }
            painter.rect_stroke(rect, 0.0, Stroke::new(1.0, ScribeColors::INK));
        }
    }

    fn draw_key_gutter(&self, painter: &egui::Painter, rect: Rect, geo: &Geometry) {
        let gutter = Rect::from_min_size(rect.min, Vec2::new(KEY_GUTTER_WIDTH, rect.height()));
        let painter = painter.with_clip_rect(gutter);
        painter.rect_filled(gutter, 0.0, ScribeColors::PAPER);

        let visible_rows = (rect.height() / geo.row_height) as i32 + 2;
        let first_row = (self.scroll_y / geo.row_height) as i32;
        for i in 0..visible_rows {
            let row = first_row + i;
            if !(0..=127).contains(&(127 - row)) {
                continue;
            }
            let pitch = (127 - row) as u8;
            let y = rect.min.y + i as f32 * geo.row_height - (self.scroll_y % geo.row_height);
            let key_rect = Rect::from_min_size(
                Pos2::new(rect.min.x, y),
                Vec2::new(KEY_GUTTER_WIDTH, geo.row_height),
            );

            let black = matches!(pitch % 12, 1 | 3 | 6 | 8 | 10);
            let fill = if black {
                ScribeColors::INK
            } else {
                ScribeColors::PAPER
            };
            painter.rect_filled(key_rect, 0.0, fill);
            painter.rect_stroke(key_rect, 0.0, Stroke::new(0.5, ScribeColors::FAINT));

            // Label octave boundaries only.
            if pitch % 12 == 0 {
                painter.text(
                    key_rect.left_center() + Vec2::new(4.0, 0.0),
                    egui::Align2::LEFT_CENTER,
                    note_name(pitch),
                    egui::FontId::proportional(9.0),
                    ScribeColors::INK,
                );
            }
        }
        painter.vline(
            gutter.max.x,
            gutter.y_range(),
            Stroke::new(1.0, ScribeColors::INK),
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_pointer(
        &mut self,
        response: &egui::Response,
        grid_rect: Rect,
        geo: &Geometry,
        session: &mut Session,
        grid_secs: f32,
        output: &mut PianoRollOutput,
    ) {
        let pointer = response.interact_pointer_pos();

        // Stationary click: select the note under the cursor, or create
        // one on an empty cell. egui reports a click only when the
        // pointer stayed within the click threshold, so this and the
        // drag path below never both fire for one gesture.
        if response.clicked() {
            if let Some(pos) = pointer {
                if grid_rect.contains(pos) {
                    match hit_test(session.notes(), geo, pos) {
                        Some((idx, _)) => {
                            self.selected = Some(idx);
                            output.preview_pitch = Some(session.notes()[idx].pitch);
                        }
                        None => self.create_note_at(pos, geo, grid_secs, session, output),
                    }
                }
            }
        }

        if response.drag_started_by(egui::PointerButton::Primary) {
            if let Some(pos) = pointer {
                if grid_rect.contains(pos) {
                    match hit_test(session.notes(), geo, pos) {
                        Some((idx, zone)) => {
                            self.selected = Some(idx);
                            output.preview_pitch = Some(session.notes()[idx].pitch);
                            self.drag = Some(DragState {
                                kind: match zone {
                                    HitZone::Body => DragKind::Move,
                                    HitZone::TrailingEdge => DragKind::Resize,
                                },
                                index: idx,
                                origin: pos,
                                original: session.notes()[idx].clone(),
                                snapshot: session.notes().to_vec(),
                            });
                        }
                        None => self.create_note_at(pos, geo, grid_secs, session, output),
                    }
                }
            }
        }

        // Live preview: recompute from the captured origin each frame.
        if let (Some(drag), Some(pos)) = (&self.drag, pointer) {
            if response.dragged_by(egui::PointerButton::Primary) {
                let delta = pos - drag.origin;
                let updated = match drag.kind {
                    DragKind::Move => moved_note(&drag.original, delta, geo, grid_secs),
                    DragKind::Resize => resized_note(&drag.original, delta, geo, grid_secs),
                };
                if let Some(slot) = session.notes_mut().get_mut(drag.index) {
                    *slot = updated;
                }
            }
        }

        // Release (or the pointer leaving the surface) ends the drag with
        // a single commit, and only when the note actually changed.
        let primary_released = response.ctx.input(|i| i.pointer.primary_released());
        let drag_ended = self.drag.is_some() && (primary_released || pointer.is_none());
        if drag_ended {
            if let Some(drag) = self.drag.take() {
                let changed = session.notes().get(drag.index) != Some(&drag.original);
                if changed {
                    session.commit_snapshot(drag.snapshot);
                    output.committed = true;
                }
            }
        }
    }

    /// Create on press: atomic, committed, selected.
    fn create_note_at(
        &mut self,
        pos: Pos2,
        geo: &Geometry,
        grid_secs: f32,
        session: &mut Session,
        output: &mut PianoRollOutput,
    ) {
        let instrument_hint = session.notes().first().and_then(|n| n.instrument);
        let note = plan_created_note(
            geo.time_at(pos.x),
            geo.pitch_at(pos.y),
            grid_secs,
            instrument_hint,
        );
        output.preview_pitch = Some(note.pitch);
        let mut edited = session.notes().to_vec();
        edited.push(note);
        session.commit(edited);
        self.selected = Some(session.notes().len() - 1);
        output.committed = true;
    }

    fn handle_scroll(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary) {
            let delta = response.drag_delta();
            self.scroll_x = (self.scroll_x - delta.x).max(0.0);
            self.scroll_y = (self.scroll_y - delta.y).max(0.0);
        }
        if response.hovered() {
            ui.input(|i| {
                let scroll = i.raw_scroll_delta;
                if scroll != Vec2::ZERO {
                    self.scroll_x = (self.scroll_x - scroll.x * 2.0).max(0.0);
                    self.scroll_y = (self.scroll_y - scroll.y * 2.0).max(0.0);
                }
            });
        }
        let max_y = 128.0 * ROW_HEIGHT * self.pitch_zoom;
        self.scroll_y = self.scroll_y.min(max_y);
    }
}

/// Scientific pitch name, octave -1 through 9 ("C4" = MIDI 60).
pub fn note_name(pitch: u8) -> String {
    let octave = (pitch as i32 / 12) - 1;
    format!("{}{}", NOTE_NAMES[(pitch % 12) as usize], octave)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> Geometry {
        Geometry {
            grid_left: 60.0,
            top: 0.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
            px_per_sec: 100.0,
            row_height: 12.0,
        }
    }

    fn note(pitch: u8, start: f32, duration: f32) -> Note {
        Note {
            pitch,
            start_time: start,
            duration,
            velocity: 100,
            instrument: None,
            kind: NoteKind::Melody,
        }
    }

    #[test]
    fn time_and_pitch_mapping_round_trips() {
        let geo = geometry();
        let x = geo.x(1.5);
        assert!((geo.time_at(x) - 1.5).abs() < 1e-4);
        let y = geo.y(60);
        assert_eq!(geo.pitch_at(y + 1.0), 60);
    }

    #[test]
    fn negative_times_clamp_to_zero() {
        let geo = geometry();
        assert_eq!(geo.time_at(0.0), 0.0);
    }

    #[test]
    fn hit_test_distinguishes_body_and_edge() {
        let geo = geometry();
        let notes = vec![note(60, 1.0, 0.5)]; // rect x 160..210, y of pitch 60
        let rect = geo.note_rect(&notes[0]);

        let body = hit_test(&notes, &geo, Pos2::new(rect.min.x + 2.0, rect.center().y));
        assert_eq!(body, Some((0, HitZone::Body)));

        let edge = hit_test(&notes, &geo, Pos2::new(rect.max.x - 2.0, rect.center().y));
        assert_eq!(edge, Some((0, HitZone::TrailingEdge)));

        let miss = hit_test(&notes, &geo, Pos2::new(rect.max.x + 20.0, rect.center().y));
        assert_eq!(miss, None);
    }

    #[test]
    fn overlapping_notes_hit_topmost_last() {
        let geo = geometry();
        let notes = vec![note(60, 1.0, 1.0), note(60, 1.2, 0.5)];
        let pos = Pos2::new(geo.x(1.3), geo.y(60) + 4.0);
        let hit = hit_test(&notes, &geo, pos);
        assert_eq!(hit.map(|(i, _)| i), Some(1));
    }

    #[test]
    fn created_note_snaps_to_grid() {
        // A click at 1.2s with a 0.25s full-strength grid lands on
        // 1.25 with a one-grid-unit duration.
        let n = plan_created_note(1.2, 64, 0.25, None);
        assert!((n.start_time - 1.25).abs() < 1e-6);
        assert_eq!(n.duration, 0.25);
        assert_eq!(n.pitch, 64);
        assert_eq!(n.velocity, DEFAULT_VELOCITY);
    }

    #[test]
    fn created_note_without_grid_uses_fallback() {
        let n = plan_created_note(1.2, 64, 0.0, Some(25));
        assert_eq!(n.start_time, 1.2);
        assert_eq!(n.duration, FALLBACK_NOTE_SECS);
        assert_eq!(n.instrument, Some(25));
    }

    #[test]
    fn move_preview_snaps_and_clamps() {
        let geo = geometry();
        let original = note(1, 0.1, 0.5);
        // Drag 50px right (0.5s) and 10 rows down.
        let moved = moved_note(&original, Vec2::new(50.0, 120.0), &geo, 0.25);
        assert!((moved.start_time - 0.5).abs() < 1e-6);
        assert_eq!(moved.pitch, 0); // 1 - 10 clamps at 0

        // Far left drag clamps start at zero.
        let moved = moved_note(&original, Vec2::new(-500.0, 0.0), &geo, 0.25);
        assert_eq!(moved.start_time, 0.0);
    }

    #[test]
    fn resize_preview_floors_at_one_grid_unit() {
        let geo = geometry();
        let original = note(60, 0.0, 0.5);
        let resized = resized_note(&original, Vec2::new(-100.0, 0.0), &geo, 0.25);
        assert_eq!(resized.duration, 0.25);

        // Without a grid the floor is the model minimum.
        let resized = resized_note(&original, Vec2::new(-100.0, 0.0), &geo, 0.0);
        assert_eq!(resized.duration, MIN_NOTE_SECS);
    }

    #[test]
    fn resize_preview_snaps_growth() {
        let geo = geometry();
        let original = note(60, 0.0, 0.5);
        // +30px = +0.3s -> 0.8s snapped to 0.75 on a 0.25 grid.
        let resized = resized_note(&original, Vec2::new(30.0, 0.0), &geo, 0.25);
        assert!((resized.duration - 0.75).abs() < 1e-6);
    }

    #[test]
    fn delete_selected_commits_and_clears_selection() {
        let mut roll = PianoRoll::new();
        let mut session = Session::new();
        session.replace_all(vec![note(60, 0.0, 0.5)]);
        roll.selected = Some(0);

        assert!(roll.delete_selected(&mut session));
        assert!(session.notes().is_empty());
        assert_eq!(roll.selected, None);

        session.undo();
        assert_eq!(session.notes().len(), 1);
    }

    #[test]
    fn toggle_kind_flips_and_commits() {
        let mut roll = PianoRoll::new();
        let mut session = Session::new();
        session.replace_all(vec![note(60, 0.0, 0.5)]);
        roll.selected = Some(0);

        assert!(roll.toggle_selected_kind(&mut session));
        assert_eq!(session.notes()[0].kind, NoteKind::Harmony);
        session.undo();
        assert_eq!(session.notes()[0].kind, NoteKind::Melody);
    }

    #[test]
    fn delete_without_selection_is_noop() {
        let mut roll = PianoRoll::new();
        let mut session = Session::new();
        session.replace_all(vec![note(60, 0.0, 0.5)]);
        assert!(!roll.delete_selected(&mut session));
        assert_eq!(session.notes().len(), 1);
    }

    #[test]
    fn zoom_factors_are_clamped() {
        let mut roll = PianoRoll::new();
        for _ in 0..50 {
            roll.zoom_time(1.5);
            roll.zoom_pitch(1.5);
        }
        assert_eq!(roll.time_zoom, *TIME_ZOOM_RANGE.end());
        assert_eq!(roll.pitch_zoom, *PITCH_ZOOM_RANGE.end());
        for _ in 0..50 {
            roll.zoom_time(0.5);
            roll.zoom_pitch(0.5);
        }
        assert_eq!(roll.time_zoom, *TIME_ZOOM_RANGE.start());
        assert_eq!(roll.pitch_zoom, *PITCH_ZOOM_RANGE.start());
    }

    #[test]
    fn pitch_names_follow_scientific_notation() {
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(69), "A4");
        assert_eq!(note_name(0), "C-1");
        assert_eq!(note_name(127), "G9");
    }

    #[test]
    fn narrow_note_keeps_a_movable_body() {
        let geo = geometry();
        // 5px wide, narrower than the full resize handle.
        let notes = vec![note(60, 1.0, 0.05)];
        let rect = geo.note_rect(&notes[0]);

        let body = hit_test(&notes, &geo, Pos2::new(rect.center().x, rect.center().y));
        assert_eq!(body, Some((0, HitZone::Body)));

        let edge = hit_test(&notes, &geo, Pos2::new(rect.max.x - 0.5, rect.center().y));
        assert_eq!(edge, Some((0, HitZone::TrailingEdge)));
    }

    fn run_roll_frame(
        ctx: &egui::Context,
        events: Vec<egui::Event>,
        roll: &mut PianoRoll,
        session: &mut Session,
        options: &MidiExportOptions,
    ) {
        let input = egui::RawInput {
            screen_rect: Some(Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0))),
            events,
            ..Default::default()
        };
        let _ = ctx.run(input, |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                roll.show(ui, session, options);
            });
        });
    }

    fn button_event(pos: Pos2, pressed: bool) -> egui::Event {
        egui::Event::PointerButton {
            pos,
            button: egui::PointerButton::Primary,
            pressed,
            modifiers: egui::Modifiers::default(),
        }
    }

    #[test]
    fn stationary_press_release_on_empty_cell_creates_a_note() {
        let ctx = egui::Context::default();
        let mut roll = PianoRoll::new();
        let mut session = Session::new();
        let options = MidiExportOptions::default();
        let pos = Pos2::new(200.0, 100.0);

        run_roll_frame(&ctx, vec![], &mut roll, &mut session, &options);
        run_roll_frame(&ctx, vec![button_event(pos, true)], &mut roll, &mut session, &options);
        run_roll_frame(&ctx, vec![button_event(pos, false)], &mut roll, &mut session, &options);

        assert_eq!(session.notes().len(), 1);
        assert_eq!(roll.selected, Some(0));
        assert!(session.can_undo());
    }

    #[test]
    fn stationary_press_release_on_a_note_selects_it() {
        let ctx = egui::Context::default();
        let mut roll = PianoRoll::new();
        let mut session = Session::new();
        let options = MidiExportOptions::default();
        let pos = Pos2::new(200.0, 100.0);

        run_roll_frame(&ctx, vec![], &mut roll, &mut session, &options);
        run_roll_frame(&ctx, vec![button_event(pos, true)], &mut roll, &mut session, &options);
        run_roll_frame(&ctx, vec![button_event(pos, false)], &mut roll, &mut session, &options);
        assert_eq!(session.notes().len(), 1);

        // A second click on the same cell lands on the note's body.
        roll.selected = None;
        run_roll_frame(&ctx, vec![button_event(pos, true)], &mut roll, &mut session, &options);
        run_roll_frame(&ctx, vec![button_event(pos, false)], &mut roll, &mut session, &options);

        assert_eq!(session.notes().len(), 1);
        assert_eq!(roll.selected, Some(0));
    }

    #[test]
    fn scroll_to_content_centers_pitch_range() {
        let mut roll = PianoRoll::new();
        let notes = vec![note(58, 2.0, 0.5), note(62, 2.5, 0.5)];
        roll.request_scroll_to_content();
        roll.apply_scroll_to_content(&notes, 480.0);
        // Midpoint pitch 60 -> row 67; centered in a 480px view.
        let expected = (127.0 - 60.0) * ROW_HEIGHT - 240.0;
        assert!((roll.scroll_y - expected.max(0.0)).abs() < 1.0);
        // Horizontal lead-in before the first note.
        assert!((roll.scroll_x - (2.0 * PX_PER_SECOND - 40.0)).abs() < 1.0);
    }
}
