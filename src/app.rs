use crate::{Note, NoteBackend, NoteDraft, NoteId, Result, StoreError};
use log::{debug, error, info, trace, warn};
use std::collections::HashSet;

/// Owns the note collection for the lifetime of the process.
///
/// The in-memory collection is the source of truth. Every mutation is followed by a full
/// save through the backend; a failed save is logged and marks the store dirty, but never
/// rolls back the change.
pub struct NoteStore {
    backend: Box<dyn NoteBackend>,
    notes: Vec<Note>,
    dirty: bool,
}

impl NoteStore {
    /// Loads the collection once from `backend`.
    ///
    /// A missing or unreadable collection is not fatal: the store starts empty and the
    /// problem is logged as a warning.
    #[must_use]
    pub fn load(backend: Box<dyn NoteBackend>) -> Self {
        let notes = match backend.load() {
            Ok(notes) => {
                info!("Loaded {} notes from {}", notes.len(), backend.location());
                notes
            }
            Err(e) => {
                warn!("Starting without notes. {e}");
                Vec::new()
            }
        };

        Self {
            backend,
            notes,
            dirty: false,
        }
    }

    // Current collection in insertion order
    #[must_use]
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    #[must_use]
    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// True when the most recent save failed, so the last change may not survive a restart
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Creates a note from user input with a fresh ID, appends it and saves
    pub fn create(&mut self, draft: NoteDraft) -> NoteId {
        let note = Note::from_draft(draft);
        let id = note.id;
        trace!("Minted note ID: {id}");
        self.notes.push(note);
        self.persist();
        id
    }

    /// Appends `note` to the end of the collection and saves
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateId` if a note with the same ID is already stored.
    /// The collection is left unchanged in that case.
    pub fn add(&mut self, note: Note) -> Result<()> {
        if self.get(note.id).is_some() {
            return Err(StoreError::DuplicateId(note.id).into());
        }

        self.notes.push(note);
        self.persist();
        Ok(())
    }

    /// Removes the note with `id` and saves. Returns false, without saving, if there is none
    pub fn delete(&mut self, id: NoteId) -> bool {
        let Some(index) = self.notes.iter().position(|note| note.id == id) else {
            debug!("No note with ID {id}. Nothing to delete");
            return false;
        };

        self.notes.remove(index);
        self.persist();
        true
    }

    /// Removes the note at `index` and saves
    ///
    /// # Errors
    ///
    /// Returns `StoreError::IndexOutOfRange` if there is no note at `index`
    pub fn delete_at(&mut self, index: usize) -> Result<Note> {
        let len = self.notes.len();
        if index >= len {
            return Err(StoreError::IndexOutOfRange { index, len }.into());
        }

        let removed = self.notes.remove(index);
        self.persist();
        Ok(removed)
    }

    /// Removes the notes at all `indices` (positions before any removal) and saves once
    ///
    /// Duplicate indices are treated as one. Returns the removed notes in collection order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::IndexOutOfRange` if any index is out of range. Nothing is
    /// removed in that case.
    pub fn delete_at_offsets(&mut self, indices: &[usize]) -> Result<Vec<Note>> {
        let len = self.notes.len();
        if let Some(&index) = indices.iter().find(|&&index| index >= len) {
            return Err(StoreError::IndexOutOfRange { index, len }.into());
        }
        if indices.is_empty() {
            return Ok(Vec::new());
        }

        let doomed: HashSet<usize> = indices.iter().copied().collect();
        let (removed, kept): (Vec<(usize, Note)>, Vec<(usize, Note)>) = self
            .notes
            .drain(..)
            .enumerate()
            .partition(|(index, _)| doomed.contains(index));

        self.notes = kept.into_iter().map(|(_, note)| note).collect();
        self.persist();
        Ok(removed.into_iter().map(|(_, note)| note).collect())
    }

    /// Writes the whole collection through the backend
    ///
    /// # Errors
    ///
    /// Returns the backend error if the collection could not be written. The in-memory
    /// collection is kept either way.
    pub fn save(&mut self) -> Result<()> {
        match self.backend.save(&self.notes) {
            Ok(()) => {
                self.dirty = false;
                debug!(
                    "Saved {} notes to {}",
                    self.notes.len(),
                    self.backend.location()
                );
                Ok(())
            }
            Err(e) => {
                self.dirty = true;
                Err(e)
            }
        }
    }

    // Save after a mutation. Failure is reported here and not passed on
    fn persist(&mut self) {
        if let Err(e) = self.save() {
            error!("Latest change was not saved. {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AudioFileName, BackendError, NoteError};
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    // Records every save and can be told to fail
    #[derive(Default)]
    struct MemoryBackendState {
        stored: Option<Vec<Note>>,
        saves: usize,
        fail_saves: bool,
    }

    struct MemoryBackend {
        state: Rc<RefCell<MemoryBackendState>>,
    }

    impl NoteBackend for MemoryBackend {
        fn load(&self) -> Result<Vec<Note>> {
            self.state
                .borrow()
                .stored
                .clone()
                .ok_or_else(|| BackendError::DocumentMissing(PathBuf::from("memory")).into())
        }

        fn save(&self, notes: &[Note]) -> Result<()> {
            let mut state = self.state.borrow_mut();
            if state.fail_saves {
                return Err(BackendError::PermissionDenied.into());
            }
            state.stored = Some(notes.to_vec());
            state.saves += 1;
            Ok(())
        }

        fn location(&self) -> String {
            "memory".to_string()
        }
    }

    fn store_with(stored: Option<Vec<Note>>) -> (NoteStore, Rc<RefCell<MemoryBackendState>>) {
        let state = Rc::new(RefCell::new(MemoryBackendState {
            stored,
            ..MemoryBackendState::default()
        }));
        let backend = MemoryBackend {
            state: Rc::clone(&state),
        };
        (NoteStore::load(Box::new(backend)), state)
    }

    fn draft(title: &str) -> NoteDraft {
        NoteDraft {
            title: title.to_string(),
            content: format!("{title} content"),
            category: "General".to_string(),
            ..NoteDraft::default()
        }
    }

    fn titles(store: &NoteStore) -> Vec<&str> {
        store.notes().iter().map(|note| note.title.as_str()).collect()
    }

    #[test]
    fn given_missing_collection_when_loading_then_starts_empty() {
        let (store, state) = store_with(None);

        assert!(store.is_empty());
        assert!(!store.is_dirty());
        assert_eq!(state.borrow().saves, 0);
    }

    #[test]
    fn given_stored_collection_when_loading_then_keeps_order() {
        let notes = vec![
            Note::from_draft(draft("a")),
            Note::from_draft(draft("b")),
        ];
        let (store, _) = store_with(Some(notes.clone()));

        assert_eq!(store.notes(), notes.as_slice());
    }

    #[test]
    fn given_drafts_when_creating_then_appends_and_saves_each_time() {
        let (mut store, state) = store_with(None);

        let first = store.create(draft("first"));
        let second = store.create(draft("second"));

        assert_ne!(first, second);
        assert_eq!(titles(&store), ["first", "second"]);
        assert_eq!(state.borrow().saves, 2);
        assert_eq!(state.borrow().stored.as_deref(), Some(store.notes()));
    }

    #[test]
    fn given_existing_id_when_adding_then_rejects_and_leaves_store_unchanged() {
        let (mut store, state) = store_with(None);
        let note = Note::from_draft(draft("original"));
        store.add(note.clone()).unwrap();

        let mut clash = note.clone();
        clash.title = "impostor".to_string();
        let result = store.add(clash);

        assert!(matches!(
            result,
            Err(NoteError::Store(StoreError::DuplicateId(id))) if id == note.id
        ));
        assert_eq!(titles(&store), ["original"]);
        assert_eq!(state.borrow().saves, 1);
    }

    #[test]
    fn given_unknown_id_when_deleting_then_nothing_changes() {
        let (mut store, state) = store_with(None);
        store.create(draft("keep"));

        let deleted = store.delete(NoteId::new());

        assert!(!deleted);
        assert_eq!(titles(&store), ["keep"]);
        assert_eq!(state.borrow().saves, 1);
    }

    #[test]
    fn given_known_id_when_deleting_then_removes_only_that_note() {
        let (mut store, state) = store_with(None);
        store.create(draft("a"));
        let b = store.create(draft("b"));
        store.create(draft("c"));

        assert!(store.delete(b));

        assert_eq!(titles(&store), ["a", "c"]);
        assert_eq!(state.borrow().saves, 4);
    }

    #[test]
    fn given_three_notes_when_deleting_position_one_then_first_and_third_remain() {
        let (mut store, _) = store_with(None);
        store.create(draft("first"));
        store.create(draft("second"));
        store.create(draft("third"));

        let removed = store.delete_at(1).unwrap();

        assert_eq!(removed.title, "second");
        assert_eq!(titles(&store), ["first", "third"]);
    }

    #[test]
    fn given_bad_position_when_deleting_then_fails_and_leaves_store_unchanged() {
        let (mut store, state) = store_with(None);
        store.create(draft("only"));

        let result = store.delete_at(1);

        assert!(matches!(
            result,
            Err(NoteError::Store(StoreError::IndexOutOfRange { index: 1, len: 1 }))
        ));
        assert_eq!(titles(&store), ["only"]);
        assert_eq!(state.borrow().saves, 1);
    }

    #[test]
    fn given_several_positions_when_bulk_deleting_then_saves_once() {
        let (mut store, state) = store_with(None);
        for title in ["a", "b", "c", "d", "e"] {
            store.create(draft(title));
        }

        let removed = store.delete_at_offsets(&[3, 0, 3]).unwrap();

        let removed_titles: Vec<&str> = removed.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(removed_titles, ["a", "d"]);
        assert_eq!(titles(&store), ["b", "c", "e"]);
        assert_eq!(state.borrow().saves, 6);
    }

    #[test]
    fn given_one_bad_position_when_bulk_deleting_then_removes_nothing() {
        let (mut store, _) = store_with(None);
        store.create(draft("a"));
        store.create(draft("b"));

        let result = store.delete_at_offsets(&[0, 7]);

        assert!(matches!(
            result,
            Err(NoteError::Store(StoreError::IndexOutOfRange { index: 7, len: 2 }))
        ));
        assert_eq!(titles(&store), ["a", "b"]);
    }

    #[test]
    fn given_failing_backend_when_mutating_then_keeps_change_and_marks_dirty() {
        let (mut store, state) = store_with(None);
        state.borrow_mut().fail_saves = true;

        let id = store.create(NoteDraft {
            audio_file_name: Some(AudioFileName::new("memo.m4a")),
            ..draft("unsaved")
        });

        assert!(store.is_dirty());
        assert!(store.get(id).is_some());
        assert!(store.save().is_err());

        state.borrow_mut().fail_saves = false;
        store.save().unwrap();
        assert!(!store.is_dirty());
        assert_eq!(state.borrow().stored.as_deref(), Some(store.notes()));
    }
}
