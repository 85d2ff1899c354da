//! # Grammar Rules
//!
//! Razor interleaves two languages. Parsing starts in markup and switches to
//! code at every `@` transition; code switches back to markup at a tag in
//! statement position.
//!
//! - [`markup`] - text, tags, tag helper elements, section bodies
//! - [`code`] - expressions, statement blocks, keywords, directives, comments
//!
//! ## Span Metadata
//!
//! The grammar decides, span by span, how the editor may treat the text
//! later. The helpers below are the only places span metadata is built, so
//! the classification scheme is visible in one screen:
//!
//! | Helper | Kind | Accepts | Edit handler |
//! |--------|------|---------|--------------|
//! | [`markup_text`] | Markup | Any | Markup |
//! | [`fixed_markup`] | Markup | Any | Default |
//! | [`transition`] | Transition | None | Default |
//! | [`meta_code`] | MetaCode | None | Default |
//! | [`implicit_code`] | Code | NonWhiteSpace / AnyExceptNewline | ImplicitExpression |
//! | [`statement_code`] | Code | Any | Statement |
//! | [`code`] | Code | caller's choice | Default |
//! | [`comment`] | Comment | Any | Default |
//!
//! ## Error Recovery
//!
//! The grammar is total. Unterminated constructs run to end of input and
//! record a diagnostic; nothing ever fails to parse.

mod code;
mod markup;

use crate::parser::Parser;
use crate::parser::event::SpanMeta;
use crate::tree::{AcceptedCharacters, BlockKind, EditHandler, SpanKind};

/// Parse the root document: one Markup block holding everything.
pub fn document(p: &mut Parser<'_, '_>) {
    let m = p.start();
    markup::markup_content(p, markup::MarkupEnd::Eof);
    m.complete(p, BlockKind::Markup);
}

fn markup_text() -> SpanMeta {
    SpanMeta::new(SpanKind::Markup, AcceptedCharacters::Any, EditHandler::Markup)
}

fn fixed_markup() -> SpanMeta {
    SpanMeta::new(SpanKind::Markup, AcceptedCharacters::Any, EditHandler::Default)
}

fn transition() -> SpanMeta {
    SpanMeta::new(SpanKind::Transition, AcceptedCharacters::None, EditHandler::Default)
}

fn meta_code() -> SpanMeta {
    SpanMeta::new(SpanKind::MetaCode, AcceptedCharacters::None, EditHandler::Default)
}

fn implicit_code(accept_trailing_dot: bool, accepts: AcceptedCharacters) -> SpanMeta {
    SpanMeta::new(
        SpanKind::Code,
        accepts,
        EditHandler::ImplicitExpression { accept_trailing_dot },
    )
}

fn statement_code() -> SpanMeta {
    SpanMeta::new(SpanKind::Code, AcceptedCharacters::Any, EditHandler::Statement)
}

fn code(accepts: AcceptedCharacters) -> SpanMeta {
    SpanMeta::new(SpanKind::Code, accepts, EditHandler::Default)
}

fn comment() -> SpanMeta {
    SpanMeta::new(SpanKind::Comment, AcceptedCharacters::Any, EditHandler::Default)
}
