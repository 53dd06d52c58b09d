//! Persisted view of the note collection.
//!
//! Layout in the store:
//!
//! ```text
//! notes        -> ["<id>", "<id>", ...]            # index, first-save order
//! notes:<id>   -> {"id", "title", "content", "updatedAt"}
//! ```
//!
//! `create` writes through immediately. `save` goes through a per-note
//! debouncer, so a burst of edits to one note produces a single write of the
//! last state once the note has been quiet for the configured delay. Failures
//! of those deferred writes have no caller to return to, so they are sent on
//! an error channel instead.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::NotebookConfig;
use crate::debounce::Debouncer;
use crate::entity::Note;
use crate::error::{JotterError, Result};
use crate::storage::{KvStore, KvStoreExt};

/// A deferred write that failed.
#[derive(Debug)]
pub struct PersistFailure {
    pub note_id: Uuid,
    pub error: JotterError,
}

pub struct NoteRepository<S: KvStore + 'static> {
    store: Rc<S>,
    config: Rc<NotebookConfig>,
    writer: Debouncer<Uuid, Note, Result<()>>,
    errors_tx: UnboundedSender<PersistFailure>,
    errors_rx: Option<UnboundedReceiver<PersistFailure>>,
}

impl<S: KvStore + 'static> NoteRepository<S> {
    pub fn new(store: Rc<S>, clock: Rc<dyn Clock>, config: NotebookConfig) -> Self {
        let config = Rc::new(config);
        let writer = {
            let store = Rc::clone(&store);
            let config = Rc::clone(&config);
            Debouncer::new(config.debounce_delay(), clock, move |_id, note: Note| {
                write_note(&*store, &config, &note)
            })
        };
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();

        Self {
            store,
            config,
            writer,
            errors_tx,
            errors_rx: Some(errors_rx),
        }
    }

    pub fn config(&self) -> &NotebookConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read every indexed note.
    ///
    /// An absent index means an empty notebook. An indexed id without a
    /// record is an [`JotterError::IndexRecordMismatch`]; it is never skipped.
    pub fn load_all(&self) -> Result<HashMap<Uuid, Note>> {
        let index = self.read_index()?;
        let mut notes = HashMap::with_capacity(index.len());

        for id in index {
            let key = self.config.record_key(&id);
            match self.store.get::<Note>(&key)? {
                Some(note) => {
                    notes.insert(id, note);
                }
                None => {
                    error!(note_id = %id, "indexed note has no stored record");
                    return Err(JotterError::IndexRecordMismatch(id));
                }
            }
        }

        info!(count = notes.len(), "loaded notes");
        Ok(notes)
    }

    /// Persist a new note right away, bypassing the debouncer.
    pub fn create(&mut self, note: &Note) -> Result<()> {
        // Anything queued for this id is older than what we are writing now.
        self.writer.cancel(&note.id);
        write_note(&*self.store, &self.config, note)?;
        info!(note_id = %note.id, "created note");
        Ok(())
    }

    /// Schedule a debounced write of `note`, keyed by its id.
    pub fn save(&mut self, note: Note) {
        debug!(note_id = %note.id, "scheduled save");
        self.writer.call(note.id, note);
    }

    /// Remove a note's index entry and record, dropping any queued write.
    /// Returns whether the id was indexed.
    pub fn delete(&mut self, id: &Uuid) -> Result<bool> {
        self.writer.cancel(id);

        let mut index = self.read_index()?;
        let before = index.len();
        index.retain(|existing| existing != id);
        let was_indexed = index.len() != before;

        // Index first: a crash in between leaves an unlisted record, which
        // loads cleanly, rather than a listed id with no record.
        if was_indexed {
            self.store.set(&self.config.index_key, &index)?;
        }
        self.store.remove(&self.config.record_key(id))?;

        info!(note_id = %id, was_indexed, "deleted note");
        Ok(was_indexed)
    }

    /// Run the writes whose debounce window has elapsed.
    /// Returns how many writes were attempted.
    pub fn fire_due(&mut self) -> usize {
        let results = self.writer.fire_due();
        self.report(results)
    }

    /// Run every queued write now.
    pub fn flush(&mut self) -> usize {
        let results = self.writer.flush();
        self.report(results)
    }

    /// Take the receiving end of the deferred-write error channel.
    /// Only the first call gets it.
    pub fn subscribe_errors(&mut self) -> Option<UnboundedReceiver<PersistFailure>> {
        self.errors_rx.take()
    }

    /// Collect failures queued so far, if nobody has subscribed to the channel.
    pub fn drain_errors(&mut self) -> Vec<PersistFailure> {
        let mut out = Vec::new();
        if let Some(rx) = self.errors_rx.as_mut() {
            while let Ok(failure) = rx.try_recv() {
                out.push(failure);
            }
        }
        out
    }

    pub fn has_pending(&self, id: &Uuid) -> bool {
        self.writer.is_pending(id)
    }

    pub fn pending_writes(&self) -> usize {
        self.writer.pending_len()
    }

    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.writer.next_deadline()
    }

    pub fn time_until_next(&self) -> Option<Duration> {
        self.writer.time_until_next()
    }

    fn read_index(&self) -> Result<Vec<Uuid>> {
        self.store.get_or(&self.config.index_key, Vec::new())
    }

    fn report(&mut self, results: Vec<(Uuid, Result<()>)>) -> usize {
        let attempted = results.len();
        for (note_id, result) in results {
            match result {
                Ok(()) => debug!(note_id = %note_id, "saved note"),
                Err(error) => {
                    warn!(note_id = %note_id, %error, "deferred save failed");
                    if self
                        .errors_tx
                        .send(PersistFailure { note_id, error })
                        .is_err()
                    {
                        warn!(note_id = %note_id, "error channel closed, failure dropped");
                    }
                }
            }
        }
        attempted
    }
}

/// Write the record, then make sure the index lists it.
///
/// Record first so an interrupted write never leaves an indexed id without
/// a record. The index is only rewritten when the id is new to it.
fn write_note<S: KvStore + ?Sized>(store: &S, config: &NotebookConfig, note: &Note) -> Result<()> {
    store.set(&config.record_key(&note.id), note)?;

    let mut index: Vec<Uuid> = store.get_or(&config.index_key, Vec::new())?;
    if !index.contains(&note.id) {
        index.push(note.id);
        store.set(&config.index_key, &index)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::content::{Document, Node};
    use crate::storage::MemoryStore;

    fn setup() -> (Rc<ManualClock>, Rc<MemoryStore>, NoteRepository<MemoryStore>) {
        let clock = Rc::new(ManualClock::default());
        let store = Rc::new(MemoryStore::new());
        let repo = NoteRepository::new(
            Rc::clone(&store),
            clock.clone(),
            NotebookConfig::default(),
        );
        (clock, store, repo)
    }

    fn index_of(store: &MemoryStore) -> Vec<Uuid> {
        store.get_or("notes", Vec::new()).unwrap()
    }

    fn edited(note: &Note, text: &str, clock: &ManualClock) -> Note {
        let mut next = note.clone();
        next.apply_content(Document::from_text(text), "New Note", clock.now());
        next
    }

    #[test]
    fn test_load_all_without_index_is_empty() {
        let (_clock, _store, repo) = setup();
        assert!(repo.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_create_writes_immediately() {
        let (clock, store, mut repo) = setup();
        let note = Note::new("New Note", clock.now());

        repo.create(&note).unwrap();

        assert_eq!(index_of(&store), vec![note.id]);
        let stored: Note = store.get_required(&format!("notes:{}", note.id)).unwrap();
        assert_eq!(stored.title, "New Note");
        assert_eq!(repo.pending_writes(), 0);
    }

    #[test]
    fn test_save_is_deferred_until_window_elapses() {
        let (clock, store, mut repo) = setup();
        let note = Note::new("New Note", clock.now());

        repo.save(note.clone());
        assert!(store.is_empty());
        assert!(repo.has_pending(&note.id));

        clock.advance_ms(299);
        assert_eq!(repo.fire_due(), 0);
        assert!(store.is_empty());

        clock.advance_ms(1);
        assert_eq!(repo.fire_due(), 1);
        assert_eq!(repo.load_all().unwrap().get(&note.id), Some(&note));
    }

    #[test]
    fn test_index_never_duplicates() {
        let (clock, store, mut repo) = setup();
        let note = Note::new("New Note", clock.now());
        repo.create(&note).unwrap();

        for i in 0..5 {
            repo.save(edited(&note, &format!("edit {}", i), &clock));
            clock.advance_ms(400);
            repo.fire_due();
        }

        assert_eq!(index_of(&store), vec![note.id]);
        let loaded = repo.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[&note.id].title, "edit 4");
    }

    #[test]
    fn test_round_trip_preserves_note() {
        let (clock, _store, mut repo) = setup();
        clock.advance_ms(1_234);
        let mut note = Note::new("New Note", clock.now());
        note.apply_content(
            Document::new(vec![Node::heading(1, "Trip"), Node::bullet_list(["passport"])]),
            "New Note",
            clock.now(),
        );

        repo.save(note.clone());
        clock.advance_ms(300);
        repo.fire_due();

        let loaded = repo.load_all().unwrap();
        assert_eq!(loaded[&note.id], note);
    }

    #[test]
    fn test_missing_record_is_fatal() {
        let (_clock, store, repo) = setup();
        let ghost = Uuid::new_v4();
        store.set("notes", &vec![ghost]).unwrap();

        let result = repo.load_all();
        assert!(matches!(result, Err(JotterError::IndexRecordMismatch(id)) if id == ghost));
    }

    #[test]
    fn test_unindexed_record_is_not_loaded() {
        let (clock, store, repo) = setup();
        let stray = Note::new("New Note", clock.now());
        store.set(&format!("notes:{}", stray.id), &stray).unwrap();

        assert!(repo.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_deferred_failure_goes_to_error_channel() {
        let clock = Rc::new(ManualClock::default());
        let store = Rc::new(MemoryStore::with_quota(64));
        let mut repo = NoteRepository::new(store, clock.clone(), NotebookConfig::default());
        let mut errors = repo.subscribe_errors().unwrap();

        let note = Note::new("New Note", clock.now());
        repo.save(note.clone());
        clock.advance_ms(300);
        assert_eq!(repo.fire_due(), 1);

        let failure = errors.try_recv().unwrap();
        assert_eq!(failure.note_id, note.id);
        assert!(matches!(failure.error, JotterError::StoreWrite { .. }));
        assert!(errors.try_recv().is_err());
    }

    #[test]
    fn test_create_failure_propagates() {
        let clock = Rc::new(ManualClock::default());
        let store = Rc::new(MemoryStore::with_quota(16));
        let mut repo = NoteRepository::new(store, clock.clone(), NotebookConfig::default());

        let result = repo.create(&Note::new("New Note", clock.now()));
        assert!(matches!(result, Err(JotterError::StoreWrite { .. })));
    }

    #[test]
    fn test_drain_errors_without_subscriber() {
        let clock = Rc::new(ManualClock::default());
        let store = Rc::new(MemoryStore::with_quota(8));
        let mut repo = NoteRepository::new(store, clock.clone(), NotebookConfig::default());

        repo.save(Note::new("New Note", clock.now()));
        repo.flush();

        assert_eq!(repo.drain_errors().len(), 1);
        assert!(repo.drain_errors().is_empty());
    }

    #[test]
    fn test_delete_removes_index_entry_and_record() {
        let (clock, store, mut repo) = setup();
        let keep = Note::new("New Note", clock.now());
        let gone = Note::new("New Note", clock.now());
        repo.create(&keep).unwrap();
        repo.create(&gone).unwrap();
        repo.save(edited(&gone, "pending", &clock));

        assert!(repo.delete(&gone.id).unwrap());

        assert_eq!(index_of(&store), vec![keep.id]);
        assert_eq!(store.get_raw(&format!("notes:{}", gone.id)).unwrap(), None);
        assert!(!repo.has_pending(&gone.id));

        clock.advance_ms(1_000);
        assert_eq!(repo.fire_due(), 0);
        assert!(!repo.delete(&gone.id).unwrap());
    }

    #[test]
    fn test_create_supersedes_queued_save() {
        let (clock, _store, mut repo) = setup();
        let note = Note::new("New Note", clock.now());
        repo.save(edited(&note, "stale", &clock));

        repo.create(&note).unwrap();
        clock.advance_ms(300);
        assert_eq!(repo.fire_due(), 0);
        assert_eq!(repo.load_all().unwrap()[&note.id].title, "New Note");
    }
}
