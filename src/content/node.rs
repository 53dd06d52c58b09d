// src/content/node.rs
use serde::{Deserialize, Serialize};

/// Inline formatting applied to a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mark {
    Bold,
    Italic,
    Strike,
    Code,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingAttrs {
    pub level: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedListAttrs {
    pub start: u32,
}

impl Default for OrderedListAttrs {
    fn default() -> Self {
        Self { start: 1 }
    }
}

/// A block or inline node of a rich-text document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Paragraph {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },
    Heading {
        attrs: HeadingAttrs,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },
    Blockquote {
        #[serde(default)]
        content: Vec<Node>,
    },
    CodeBlock {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },
    BulletList {
        #[serde(default)]
        content: Vec<Node>,
    },
    OrderedList {
        #[serde(default)]
        attrs: OrderedListAttrs,
        #[serde(default)]
        content: Vec<Node>,
    },
    ListItem {
        #[serde(default)]
        content: Vec<Node>,
    },
    HorizontalRule,
    HardBreak,
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        marks: Vec<Mark>,
    },
}

/// Separator placed between the text of sibling blocks.
const BLOCK_SEPARATOR: &str = "\n\n";

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text {
            text: text.into(),
            marks: Vec::new(),
        }
    }

    pub fn styled(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        Node::Text {
            text: text.into(),
            marks,
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Node::Paragraph {
            content: inline_run(text.into()),
        }
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Node::Heading {
            attrs: HeadingAttrs { level },
            content: inline_run(text.into()),
        }
    }

    pub fn bullet_list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Node::BulletList {
            content: items.into_iter().map(list_item).collect(),
        }
    }

    pub fn ordered_list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Node::OrderedList {
            attrs: OrderedListAttrs::default(),
            content: items.into_iter().map(list_item).collect(),
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Node::Text { .. } | Node::HardBreak)
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Paragraph { content }
            | Node::Heading { content, .. }
            | Node::Blockquote { content }
            | Node::CodeBlock { content }
            | Node::BulletList { content }
            | Node::OrderedList { content, .. }
            | Node::ListItem { content } => content,
            Node::HorizontalRule | Node::HardBreak | Node::Text { .. } => &[],
        }
    }

    /// Plain text of this node with formatting dropped.
    pub fn plain_text(&self) -> String {
        match self {
            Node::Text { text, .. } => text.clone(),
            Node::HardBreak => "\n".to_string(),
            Node::HorizontalRule => String::new(),
            _ => join_text(self.children()),
        }
    }
}

/// Concatenate inline nodes and join block nodes with a blank line,
/// skipping blocks that carry no text.
pub(crate) fn join_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        if node.is_inline() {
            out.push_str(&node.plain_text());
            continue;
        }
        let text = node.plain_text();
        if text.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push_str(BLOCK_SEPARATOR);
        }
        out.push_str(&text);
    }
    out
}

fn inline_run(text: String) -> Vec<Node> {
    if text.is_empty() {
        Vec::new()
    } else {
        vec![Node::text(text)]
    }
}

fn list_item<T: Into<String>>(text: T) -> Node {
    Node::ListItem {
        content: vec![Node::paragraph(text)],
    }
}
