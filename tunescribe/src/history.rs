//! Editing session - the live note set plus linear undo/redo
//!
//! `Session` is the only mutation entry point for the note set. A commit
//! is a checkpoint: one per completed user action (a finished drag, a
//! deletion), never per mouse-move frame. Drag previews mutate the live
//! notes directly via [`Session::notes_mut`] and only the drag's
//! completion commits, so undo granularity matches user intent.

use crate::model::Note;

/// Maximum retained checkpoints. Oldest snapshots are evicted first.
const MAX_HISTORY: usize = 100;

#[derive(Default)]
pub struct Session {
    notes: Vec<Note>,
    past: Vec<Vec<Note>>,
    future: Vec<Vec<Note>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// The live note set.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Mutable access for live previews (drag-in-progress). Does not
    /// touch the history stacks; pair with [`Session::commit_snapshot`].
    pub fn notes_mut(&mut self) -> &mut Vec<Note> {
        &mut self.notes
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Checkpoint: push the current set onto `past`, discard the redo
    /// branch, install `new_notes` as current.
    pub fn commit(&mut self, new_notes: Vec<Note>) {
        let previous = std::mem::replace(&mut self.notes, new_notes);
        self.push_past(previous);
        self.future.clear();
    }

    /// Checkpoint a mutation that already happened in place: `snapshot`
    /// is the pre-edit state captured before the live preview began.
    pub fn commit_snapshot(&mut self, snapshot: Vec<Note>) {
        self.push_past(snapshot);
        self.future.clear();
    }

    /// Wholesale replacement (fresh transcription): a new document, so
    /// both stacks are cleared.
    pub fn replace_all(&mut self, notes: Vec<Note>) {
        self.notes = notes;
        self.past.clear();
        self.future.clear();
    }

    /// Step back one checkpoint. No-op when there is nothing to undo.
    pub fn undo(&mut self) {
        if let Some(previous) = self.past.pop() {
            let current = std::mem::replace(&mut self.notes, previous);
            self.future.push(current);
        }
    }

    /// Step forward one undone checkpoint. No-op when `future` is empty.
    pub fn redo(&mut self) {
        if let Some(next) = self.future.pop() {
            let current = std::mem::replace(&mut self.notes, next);
            self.past.push(current);
        }
    }

    fn push_past(&mut self, snapshot: Vec<Note>) {
        self.past.push(snapshot);
        if self.past.len() > MAX_HISTORY {
            self.past.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NoteKind;

    fn note(pitch: u8) -> Note {
        Note {
            pitch,
            start_time: 0.0,
            duration: 0.5,
            velocity: 80,
            instrument: None,
            kind: NoteKind::Melody,
        }
    }

    #[test]
    fn undo_redo_round_trip() {
        let mut session = Session::new();
        session.commit(vec![note(60)]);
        session.commit(vec![note(60), note(64)]);

        let before = session.notes().to_vec();
        session.undo();
        assert_eq!(session.notes().len(), 1);
        session.redo();
        assert_eq!(session.notes(), before.as_slice());
    }

    #[test]
    fn undo_with_empty_past_is_noop() {
        let mut session = Session::new();
        session.undo();
        assert!(session.notes().is_empty());
        assert!(!session.can_redo());
    }

    #[test]
    fn redo_with_empty_future_is_noop() {
        let mut session = Session::new();
        session.commit(vec![note(60)]);
        session.redo();
        assert_eq!(session.notes().len(), 1);
    }

    #[test]
    fn commit_clears_redo_branch() {
        let mut session = Session::new();
        session.commit(vec![note(60)]);
        session.commit(vec![note(60), note(64)]);
        session.undo();
        assert!(session.can_redo());

        session.commit(vec![note(72)]);
        assert!(!session.can_redo());
        assert_eq!(session.notes()[0].pitch, 72);
    }

    #[test]
    fn snapshot_commit_matches_in_place_edit() {
        let mut session = Session::new();
        session.commit(vec![note(60)]);

        // Simulate a drag: capture, preview-mutate, commit on release.
        let snapshot = session.notes().to_vec();
        session.notes_mut()[0].pitch = 62;
        session.commit_snapshot(snapshot);

        assert_eq!(session.notes()[0].pitch, 62);
        session.undo();
        assert_eq!(session.notes()[0].pitch, 60);
        session.redo();
        assert_eq!(session.notes()[0].pitch, 62);
    }

    #[test]
    fn delete_only_note_then_undo_restores_it() {
        let mut session = Session::new();
        session.replace_all(vec![note(60)]);

        let mut edited = session.notes().to_vec();
        edited.remove(0);
        session.commit(edited);
        assert!(session.notes().is_empty());

        session.undo();
        assert_eq!(session.notes().len(), 1);
        assert_eq!(session.notes()[0].pitch, 60);
    }

    #[test]
    fn replace_all_discards_history() {
        let mut session = Session::new();
        session.commit(vec![note(60)]);
        session.replace_all(vec![note(64)]);
        assert!(!session.can_undo());
        assert!(!session.can_redo());
        assert_eq!(session.notes()[0].pitch, 64);
    }
}
