//! # Parser - Event-Based Tree Construction
//!
//! Transforms the token stream into a [`SyntaxTree`] using the event-based
//! architecture from rust-analyzer.
//!
//! ## The Event Model
//!
//! Grammar rules never touch the tree. They push [`Event`]s:
//!
//! ```text
//! Start(Statement)
//!   Span(Transition)   "@"
//!   Span(MetaCode)     "{"
//!   Span(Code)         " var x = 1; "
//!   Span(MetaCode)     "}"
//! Finish
//! ```
//!
//! ## Spans Are Flushed, Not Bumped
//!
//! Razor spans are runs of many tokens. [`Parser::bump`] only advances; the
//! accepted tokens stay *pending* until [`Parser::output`] turns them into one
//! span with the metadata the grammar chose (kind, accepted characters, edit
//! handler). Output with nothing pending produces a zero-length span, which is
//! how the empty markup/code spans around transitions are made.
//!
//! Blocks must not start or finish with tokens pending; the grammar always
//! outputs first. Debug builds assert this.
//!
//! ## The Marker System
//!
//! `parser.start()` returns a [`Marker`] that must be completed. Dropping it
//! unfinished panics, which catches grammar bugs at runtime rather
//! than producing corrupt trees. [`CompletedMarker::precede`] wraps an already
//! parsed block in a new parent.

pub mod event;
pub mod sink;

mod grammar;

use crate::lexer::{Token, lex};
use crate::syntax_kind::SyntaxKind;
use crate::tag_helpers::{self, TagHelperDescriptor};
use crate::tree::{BlockKind, Diagnostic, SyntaxTree};
use event::{Event, SpanMeta};
use sink::Sink;

/// The parser state machine.
///
/// Grammar functions receive `&mut Parser` and use its methods to:
///
/// - Inspect tokens: `current()`, `nth()`, `at()`, `at_end()`
/// - Consume tokens: `bump()`, `eat()`
/// - Emit spans: `output()`
/// - Build structure: `start()` → `Marker` → `complete()`
pub struct Parser<'t, 'input> {
    tokens: &'t [Token<'input>],
    pos: usize,
    offset: usize,
    pending: usize,
    events: Vec<Event>,
    diagnostics: Vec<Diagnostic>,
    tag_helpers: &'t [TagHelperDescriptor],
}

impl<'t, 'input> Parser<'t, 'input> {
    /// Create a new parser from a slice of tokens.
    pub fn new(tokens: &'t [Token<'input>], tag_helpers: &'t [TagHelperDescriptor]) -> Self {
        Self {
            tokens,
            pos: 0,
            offset: 0,
            pending: 0,
            events: Vec::new(),
            diagnostics: Vec::new(),
            tag_helpers,
        }
    }

    /// Parse the tokens and return a syntax tree.
    pub fn parse(mut self) -> SyntaxTree {
        grammar::document(&mut self);
        let sink = Sink::new(self.tokens, self.events);
        sink.finish(self.diagnostics)
    }

    /// Start a new block and return a marker.
    pub fn start(&mut self) -> Marker {
        debug_assert_eq!(self.pending, 0, "tokens pending when a block starts");
        let pos = self.events.len();
        self.events.push(Event::Placeholder);
        Marker {
            pos,
            completed: false,
        }
    }

    /// Current token kind, or EOF if past end.
    pub fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    /// Look ahead n tokens.
    pub fn nth(&self, n: usize) -> SyntaxKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(SyntaxKind::EOF)
    }

    /// Check if at end of input.
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Check if current token is of given kind.
    pub fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Accept the current token into the pending span.
    pub fn bump(&mut self) {
        if let Some(token) = self.tokens.get(self.pos) {
            self.offset += token.text.len();
            self.pos += 1;
            self.pending += 1;
        }
    }

    /// Get the text of the current token.
    pub fn current_text(&self) -> &'input str {
        self.nth_text(0)
    }

    /// Text of the token n positions ahead.
    pub fn nth_text(&self, n: usize) -> &'input str {
        self.tokens.get(self.pos + n).map(|t| t.text).unwrap_or("")
    }

    /// Text of the token just before the current one.
    pub fn prev_text(&self) -> &'input str {
        self.pos
            .checked_sub(1)
            .and_then(|p| self.tokens.get(p))
            .map(|t| t.text)
            .unwrap_or("")
    }

    /// Number of tokens accepted since the last span.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Flush pending tokens into a span. Returns the event index so the
    /// grammar can amend the span later (auto-complete of unclosed blocks).
    pub fn output(&mut self, meta: SpanMeta) -> usize {
        let index = self.events.len();
        self.events.push(Event::Span {
            meta,
            n_raw_tokens: self.pending,
        });
        self.pending = 0;
        index
    }

    /// Attach an auto-complete string to a span emitted earlier.
    pub fn set_auto_complete(&mut self, span_event: usize, text: &str) {
        if let Some(Event::Span { meta, .. }) = self.events.get_mut(span_event) {
            meta.auto_complete = Some(text.to_string());
        }
    }

    /// Record a recoverable problem at the current position.
    pub fn error(&mut self, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            offset: self.offset,
            message: message.into(),
        });
    }

    /// Whether a tag helper claims this element name.
    pub fn is_tag_helper(&self, tag_name: &str) -> bool {
        tag_helpers::is_tag_helper(self.tag_helpers, tag_name)
    }
}

/// A marker for a block being constructed.
///
/// `complete()` must be called; dropping an unfinished marker panics.
#[must_use = "Markers must be completed, dropping them is a bug"]
pub struct Marker {
    /// Position in the events vector where our Placeholder lives
    pos: usize,
    /// Tracks whether complete() was called
    completed: bool,
}

impl Marker {
    /// Complete this marker, creating a block of the given kind.
    pub fn complete(self, p: &mut Parser<'_, '_>, kind: BlockKind) -> CompletedMarker {
        self.finish(p, kind, None)
    }

    /// Complete this marker, creating a named block (tag, keyword, directive).
    pub fn complete_named(
        self,
        p: &mut Parser<'_, '_>,
        kind: BlockKind,
        name: impl Into<String>,
    ) -> CompletedMarker {
        self.finish(p, kind, Some(name.into()))
    }

    fn finish(
        mut self,
        p: &mut Parser<'_, '_>,
        kind: BlockKind,
        name: Option<String>,
    ) -> CompletedMarker {
        debug_assert_eq!(p.pending, 0, "tokens pending when a block finishes");
        self.completed = true;
        let event_at_pos = &mut p.events[self.pos];
        assert!(matches!(event_at_pos, Event::Placeholder));
        *event_at_pos = Event::Start {
            kind,
            name,
            forward_parent: None,
        };
        p.events.push(Event::Finish);
        CompletedMarker { pos: self.pos }
    }
}

impl Drop for Marker {
    fn drop(&mut self) {
        if !self.completed && !std::thread::panicking() {
            panic!("Marker must be completed");
        }
    }
}

/// A marker for a block that has been completed.
///
/// The only thing you can do with it is `precede()`: wrap the completed
/// block in a new parent, e.g. a start tag that turns out to open a tag
/// helper element.
#[derive(Debug, Clone, Copy)]
pub struct CompletedMarker {
    /// Position of the Start event for this completed block
    pos: usize,
}

impl CompletedMarker {
    /// Create a new parent block that will contain this block.
    pub fn precede(self, p: &mut Parser<'_, '_>) -> Marker {
        let new_pos = p.events.len();
        p.events.push(Event::Placeholder);

        if let Event::Start { forward_parent, .. } = &mut p.events[self.pos] {
            *forward_parent = Some(new_pos);
        }

        Marker {
            pos: new_pos,
            completed: false,
        }
    }
}

/// Parse a Razor template with no tag helpers in scope.
pub fn parse(source: &str) -> SyntaxTree {
    parse_with_tag_helpers(source, &[])
}

/// Parse a Razor template, classifying elements claimed by `tag_helpers`.
pub fn parse_with_tag_helpers(source: &str, tag_helpers: &[TagHelperDescriptor]) -> SyntaxTree {
    let tokens = lex(source);
    let parser = Parser::new(&tokens, tag_helpers);
    parser.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{AcceptedCharacters, EditHandler, SpanKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_empty_input_has_one_empty_span() {
        let tree = parse("");
        assert_eq!(tree.leaves().len(), 1);
        assert_eq!(tree.text(), "");
    }

    #[test]
    fn parse_preserves_all_text() {
        let input = "Hello, world!";
        assert_eq!(parse(input).text(), input);
    }

    #[test]
    fn output_without_pending_tokens_makes_empty_span() {
        let tokens = lex("x");
        let mut parser = Parser::new(&tokens, &[]);
        let m = parser.start();
        parser.output(SpanMeta::new(
            SpanKind::Markup,
            AcceptedCharacters::Any,
            EditHandler::Markup,
        ));
        parser.bump();
        parser.output(SpanMeta::new(
            SpanKind::Markup,
            AcceptedCharacters::Any,
            EditHandler::Markup,
        ));
        m.complete(&mut parser, BlockKind::Markup);
        let tree = Sink::new(&tokens, parser.events).finish(Vec::new());
        let lengths: Vec<_> = tree.spans().map(|(_, s)| s.len()).collect();
        assert_eq!(lengths, vec![0, 1]);
    }

    #[test]
    fn marker_must_be_completed() {
        let result = std::panic::catch_unwind(|| {
            let tokens = lex("test");
            let mut parser = Parser::new(&tokens, &[]);
            let _marker = parser.start();
        });
        assert!(result.is_err());
    }
}
