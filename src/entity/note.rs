// src/entity/note.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content::Document;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: Document,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// A fresh note with a random id, the default title and blank content.
    pub fn new(default_title: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: default_title.to_string(),
            content: Document::new_note_template(),
            updated_at: now,
        }
    }

    /// Replace the content, re-derive the title and stamp the edit time.
    pub fn apply_content(&mut self, content: Document, default_title: &str, now: DateTime<Utc>) {
        self.title = derive_title(&content, default_title);
        self.content = content;
        self.updated_at = now;
    }
}

/// Title for a document: the trimmed text of its first block, or
/// `default_title` when that text is missing or blank.
pub fn derive_title(content: &Document, default_title: &str) -> String {
    content
        .first_block_plain_text()
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| default_title.to_string())
}

/// Sidebar entry for one note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteSummary {
    pub id: Uuid,
    pub title: String,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Node;

    #[test]
    fn test_new_note_defaults() {
        let now = Utc::now();
        let note = Note::new("New Note", now);
        assert_eq!(note.title, "New Note");
        assert_eq!(note.updated_at, now);
        assert_eq!(note.content, Document::new_note_template());
        assert_ne!(note.id, Note::new("New Note", now).id);
    }

    #[test]
    fn test_title_from_first_block() {
        let doc = Document::new(vec![Node::paragraph("Hello"), Node::paragraph("World")]);
        assert_eq!(derive_title(&doc, "New Note"), "Hello");
    }

    #[test]
    fn test_title_falls_back_on_empty_content() {
        assert_eq!(derive_title(&Document::default(), "New Note"), "New Note");
        assert_eq!(
            derive_title(&Document::from_text("   "), "New Note"),
            "New Note"
        );
    }

    #[test]
    fn test_apply_content_keeps_id() {
        let start = Utc::now();
        let mut note = Note::new("New Note", start);
        let id = note.id;
        let later = start + chrono::Duration::seconds(5);

        note.apply_content(Document::new(vec![Node::heading(1, "Groceries")]), "New Note", later);

        assert_eq!(note.id, id);
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.updated_at, later);
    }

    #[test]
    fn test_record_uses_camel_case_timestamp() {
        let note = Note::new("New Note", Utc::now());
        let value = serde_json::to_value(&note).unwrap();
        assert!(value.get("updatedAt").and_then(|v| v.as_str()).is_some());
        assert_eq!(value["id"], note.id.to_string());

        let parsed: Note = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, note);
    }
}
