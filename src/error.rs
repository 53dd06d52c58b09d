use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum JotterError {
    #[error("Failed to read '{key}' from store: {reason}")]
    StoreRead { key: String, reason: String },

    #[error("Failed to write '{key}' to store: {reason}")]
    StoreWrite { key: String, reason: String },

    #[error("Key not found in store: {0}")]
    MissingKey(String),

    /// An id is listed in the note index but its record is gone.
    #[error("Note {0} is listed in the index but has no stored record")]
    IndexRecordMismatch(Uuid),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl JotterError {
    pub(crate) fn read(key: &str, reason: impl ToString) -> Self {
        JotterError::StoreRead {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn write(key: &str, reason: impl ToString) -> Self {
        JotterError::StoreWrite {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for failures that mean the persisted data is inconsistent,
    /// as opposed to a transient store error the user can retry.
    pub fn is_fatal(&self) -> bool {
        matches!(self, JotterError::IndexRecordMismatch(_))
    }
}

pub type Result<T> = std::result::Result<T, JotterError>;
