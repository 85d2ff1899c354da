//! # Parser Events
//!
//! The parser does not build the tree directly. It emits a flat sequence of
//! events that the [`Sink`](super::sink::Sink) turns into the arena tree:
//!
//! ```text
//! Start(Expression)
//!   Span(Transition, 1 token)      "@"
//!   Span(Code, 3 tokens)           "DateTime.Now"
//! Finish
//! ```
//!
//! A `Span` event covers every raw token the grammar accepted since the
//! previous span, which may be zero tokens: Razor trees contain empty spans
//! around transitions and those are real owners of edits.
//!
//! ## Forward Parent Links
//!
//! `forward_parent` on `Start` lets the grammar wrap an already-parsed node,
//! e.g. a start tag that turns out to belong to a tag helper element. The
//! Sink follows the chain and opens the outermost node first.

use crate::tree::{AcceptedCharacters, BlockKind, EditHandler, SpanKind};

/// Everything a span carries besides its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanMeta {
    pub kind: SpanKind,
    pub accepts: AcceptedCharacters,
    pub edit_handler: EditHandler,
    pub auto_complete: Option<String>,
}

impl SpanMeta {
    pub fn new(kind: SpanKind, accepts: AcceptedCharacters, edit_handler: EditHandler) -> Self {
        Self {
            kind,
            accepts,
            edit_handler,
            auto_complete: None,
        }
    }
}

/// An event emitted by the parser during tree construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Begin a new block.
    Start {
        kind: BlockKind,
        name: Option<String>,
        forward_parent: Option<usize>,
    },

    /// A leaf made of the next `n_raw_tokens` lexer tokens.
    Span { meta: SpanMeta, n_raw_tokens: usize },

    /// Finish the current block.
    Finish,

    /// Reserved slot for a block whose kind is not known yet.
    ///
    /// `marker.complete()` replaces it with a `Start`. The Sink also turns
    /// resolved forward parents back into placeholders and skips them.
    Placeholder,
}

impl Event {
    /// Create a start event with no forward parent.
    pub fn start(kind: BlockKind) -> Self {
        Event::Start {
            kind,
            name: None,
            forward_parent: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_start_creation() {
        assert_eq!(
            Event::start(BlockKind::Statement),
            Event::Start {
                kind: BlockKind::Statement,
                name: None,
                forward_parent: None
            }
        );
    }

    #[test]
    fn span_meta_has_no_auto_complete_by_default() {
        let meta = SpanMeta::new(
            SpanKind::Code,
            AcceptedCharacters::NonWhiteSpace,
            EditHandler::ImplicitExpression {
                accept_trailing_dot: false,
            },
        );
        assert_eq!(meta.auto_complete, None);
    }
}
