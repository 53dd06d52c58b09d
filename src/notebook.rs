//! The application-facing notebook session.
//!
//! A [`Notebook`] owns the in-memory [`NoteCollection`] and the
//! [`NoteRepository`] behind it. The UI calls `create`, `select` and
//! `update_content`, reads `collection()` to render, and gives the notebook
//! a chance to run due writes, either by calling [`Notebook::tick`] from its
//! own loop or by awaiting [`Notebook::run_timers`].

use std::rc::Rc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::NotebookConfig;
use crate::content::Document;
use crate::entity::Note;
use crate::error::Result;
use crate::repository::{NoteRepository, PersistFailure};
use crate::state::NoteCollection;
use crate::storage::KvStore;

pub struct Notebook<S: KvStore + 'static> {
    notes: NoteCollection,
    repo: NoteRepository<S>,
    clock: Rc<dyn Clock>,
}

impl<S: KvStore + 'static> Notebook<S> {
    /// Load the store and hydrate the collection from it.
    pub fn open(store: Rc<S>, clock: Rc<dyn Clock>, config: NotebookConfig) -> Result<Self> {
        config.validate()?;
        let repo = NoteRepository::new(store, Rc::clone(&clock), config);

        let mut notes = NoteCollection::new();
        notes.hydrate(repo.load_all()?);
        info!(count = notes.len(), "opened notebook");

        Ok(Self { notes, repo, clock })
    }

    pub fn collection(&self) -> &NoteCollection {
        &self.notes
    }

    pub fn repository(&self) -> &NoteRepository<S> {
        &self.repo
    }

    pub fn active_note(&self) -> Option<&Note> {
        self.notes.active_note()
    }

    /// Persist a new note immediately, then add and select it.
    /// A failed write leaves the collection untouched.
    pub fn create(&mut self) -> Result<Note> {
        let note = Note::new(&self.repo.config().default_title, self.clock.now());
        self.repo.create(&note)?;
        self.notes.insert(note.clone());
        self.notes.select(note.id);
        Ok(note)
    }

    pub fn select(&mut self, id: Uuid) {
        debug!(note_id = %id, "selected note");
        self.notes.select(id);
    }

    /// Apply an editor change. The collection is updated now; the write is
    /// debounced. Unknown ids are ignored and return `None`.
    pub fn update_content(&mut self, id: &Uuid, content: Document) -> Option<Note> {
        let note = self.notes.update_content(
            id,
            content,
            self.clock.as_ref(),
            &self.repo.config().default_title,
        )?;
        self.repo.save(note.clone());
        Some(note)
    }

    /// Remove a note from memory and from the store.
    pub fn delete(&mut self, id: &Uuid) -> Result<bool> {
        let removed = self.notes.remove(id).is_some();
        let was_indexed = self.repo.delete(id)?;
        Ok(removed || was_indexed)
    }

    /// Run writes whose debounce window has elapsed.
    pub fn tick(&mut self) -> usize {
        self.repo.fire_due()
    }

    /// When the earliest queued write becomes due.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.repo.next_deadline()
    }

    pub fn has_pending_writes(&self) -> bool {
        self.repo.pending_writes() > 0
    }

    pub fn errors(&mut self) -> Option<UnboundedReceiver<PersistFailure>> {
        self.repo.subscribe_errors()
    }

    /// Sleep until each pending deadline and fire it, until nothing is queued.
    ///
    /// Sleeps use tokio's timer, so this needs a clock that follows real time
    /// such as [`SystemClock`](crate::clock::SystemClock).
    pub async fn run_timers(&mut self) -> usize {
        let mut fired = 0;
        while let Some(wait) = self.repo.time_until_next() {
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
            fired += self.repo.fire_due();
        }
        fired
    }

    /// Write everything still queued. Call before dropping the notebook.
    pub fn close(mut self) -> usize {
        let flushed = self.repo.flush();
        info!(flushed, "closed notebook");
        flushed
    }
}
