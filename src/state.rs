//! In-memory note collection: the source of truth for rendering.
//!
//! Edits land here synchronously; the repository catches up later.

use std::collections::HashMap;

use uuid::Uuid;

use crate::clock::Clock;
use crate::content::Document;
use crate::entity::{Note, NoteSummary};

#[derive(Debug, Default, Clone)]
pub struct NoteCollection {
    notes: HashMap<Uuid, Note>,
    active: Option<Uuid>,
}

impl NoteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with notes read from the store. Clears selection.
    pub fn hydrate(&mut self, notes: HashMap<Uuid, Note>) {
        self.notes = notes;
        self.active = None;
    }

    /// Add a fresh note and select it.
    pub fn create(&mut self, clock: &dyn Clock, default_title: &str) -> Note {
        let note = Note::new(default_title, clock.now());
        self.insert(note.clone());
        self.active = Some(note.id);
        note
    }

    /// Add or replace a note without touching the selection.
    pub fn insert(&mut self, note: Note) {
        self.notes.insert(note.id, note);
    }

    /// Select `id`. Unknown ids are accepted; `active_note` then yields `None`.
    pub fn select(&mut self, id: Uuid) {
        self.active = Some(id);
    }

    pub fn clear_selection(&mut self) {
        self.active = None;
    }

    /// Apply an editor change to one note. Other notes are left untouched.
    /// Returns the updated note, or `None` if `id` is unknown.
    pub fn update_content(
        &mut self,
        id: &Uuid,
        content: Document,
        clock: &dyn Clock,
        default_title: &str,
    ) -> Option<Note> {
        let note = self.notes.get_mut(id)?;
        note.apply_content(content, default_title, clock.now());
        Some(note.clone())
    }

    pub fn remove(&mut self, id: &Uuid) -> Option<Note> {
        if self.active.as_ref() == Some(id) {
            self.active = None;
        }
        self.notes.remove(id)
    }

    pub fn get(&self, id: &Uuid) -> Option<&Note> {
        self.notes.get(id)
    }

    pub fn active_id(&self) -> Option<Uuid> {
        self.active
    }

    pub fn active_note(&self) -> Option<&Note> {
        self.active.as_ref().and_then(|id| self.notes.get(id))
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Notes in presentation order: most recently updated first.
    ///
    /// Ties on `updated_at` fall back to id order so the list is stable
    /// across renders even though the backing map is unordered.
    pub fn sorted(&self) -> Vec<&Note> {
        let mut list: Vec<&Note> = self.notes.values().collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        list
    }

    /// Sidebar rows in presentation order.
    pub fn summaries(&self) -> Vec<NoteSummary> {
        self.sorted()
            .into_iter()
            .map(|note| NoteSummary {
                id: note.id,
                title: note.title.clone(),
                updated_at: note.updated_at,
                is_active: self.active == Some(note.id),
            })
            .collect()
    }
}
