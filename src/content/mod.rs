//! Rich-text document model.
//!
//! Documents use the editor's JSON shape: a `doc` root whose `content` is a
//! list of block nodes. The persistence core only needs two things from it:
//! an empty value and the plain text of the first block.

mod node;

pub use node::{HeadingAttrs, Mark, Node, OrderedListAttrs};

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
enum DocKind {
    #[default]
    #[serde(rename = "doc")]
    Doc,
}

/// A rich-text document tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "type", default)]
    kind: DocKind,
    #[serde(default)]
    content: Vec<Node>,
}

impl Document {
    pub fn new(content: Vec<Node>) -> Self {
        Self {
            kind: DocKind::Doc,
            content,
        }
    }

    /// Content given to a freshly created note: a single empty top-level heading.
    pub fn new_note_template() -> Self {
        Self::new(vec![Node::heading(1, "")])
    }

    /// Single-paragraph document.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(vec![Node::paragraph(text)])
    }

    pub fn blocks(&self) -> &[Node] {
        &self.content
    }

    pub fn push(&mut self, block: Node) {
        self.content.push(block);
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Plain text of the first block, or `None` when the document has no blocks.
    pub fn first_block_plain_text(&self) -> Option<String> {
        self.content.first().map(Node::plain_text)
    }

    pub fn plain_text(&self) -> String {
        node::join_text(&self.content)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
