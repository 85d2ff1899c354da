//! Live-editing support for Razor documents.
//!
//! An [`EditorParser`] keeps a syntax tree in step with a document as it is
//! typed. Small edits are applied to the tree in place when the owning span
//! can absorb them; everything else is reparsed on a background thread.

pub mod acceptor;
pub mod classify;
pub mod editor;
pub mod equivalence;
mod error;
pub mod patch;
pub mod scheduler;
pub mod text;

pub use acceptor::ParseResult;
pub use editor::{EditorParser, EditorParserBuilder};
pub use error::EditorError;
pub use scheduler::{DocumentParseComplete, StaticTagHelpers, TagHelperResolver};
pub use text::{DocumentSnapshot, TextChange};
