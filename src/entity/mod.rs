mod note;

pub use note::{derive_title, Note, NoteSummary};
