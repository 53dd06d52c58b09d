//! Local-first note collection with debounced persistence.
//!
//! Edits are applied to an in-memory [`NoteCollection`] immediately and
//! written to a [`KvStore`] once the note has been quiet for a short delay.
//! [`Notebook`] ties the two together.

pub mod clock;
pub mod config;
pub mod content;
pub mod debounce;
pub mod entity;
pub mod error;
pub mod logging;
pub mod notebook;
pub mod repository;
pub mod state;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::NotebookConfig;
pub use content::{Document, Mark, Node};
pub use debounce::Debouncer;
pub use entity::{Note, NoteSummary};
pub use error::{JotterError, Result};
pub use notebook::Notebook;
pub use repository::{NoteRepository, PersistFailure};
pub use state::NoteCollection;
pub use storage::{KvStore, KvStoreExt, MemoryStore, SqliteStore};
