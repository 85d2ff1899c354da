//! # Partial-Parse Acceptor
//!
//! Decides whether an edit can be absorbed by the span that owns it without
//! changing the shape of the tree. Each span carries an [`EditHandler`] tag
//! chosen by the grammar; the tag selects the rule set here.
//!
//! | Handler | Typical span | Local edits |
//! |---------|--------------|-------------|
//! | `Default` | transitions, meta code, tags, keyword statements | never |
//! | `Markup` | text between tags and code | most, away from `@`/`<` |
//! | `ImplicitExpression` | `@foo.bar` code | identifier growth, dots, parens |
//! | `Statement` | code inside `@{ }` | edits that leave block structure alone |
//!
//! ## Provisional Results
//!
//! A trailing `.` on an expression in markup is ambiguous: `@foo.` might be
//! the start of `@foo.bar` or `@foo` followed by a full stop. The edit is
//! accepted but flagged provisional; the editor then refuses to accept edits
//! anywhere else until the ambiguity is settled.
//!
//! ## Keyword Guard
//!
//! An expression whose text starts with a keyword would parse as a different
//! block (`@if`, `@section`). Every accepting path checks the edited content
//! and answers `Rejected | SpanContextChanged` instead.

use std::fmt;

use log::trace;
use razor_editor_syntax::keywords::{
    AWAIT_KEYWORD, is_identifier, is_identifier_part, is_keyword, leading_identifier,
};
use razor_editor_syntax::lexer::lex;
use razor_editor_syntax::{
    AcceptedCharacters, BlockKind, EditHandler, NodeId, Span, SpanKind, SyntaxKind, SyntaxTree,
};

use crate::classify::{EditFacts, Located};
use crate::text::TextChange;

/// Outcome of offering an edit to the partial parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseResult {
    /// The span absorbed the edit. Provisional results may still be wrong
    /// and hold back edits elsewhere until confirmed.
    Accepted { provisional: bool },
    /// A full reparse is needed.
    Rejected {
        /// The edit would change the kind of block around the span
        span_context_changed: bool,
        /// The edit should trigger the span's auto-complete string
        auto_complete_block: bool,
    },
}

impl ParseResult {
    pub const fn accepted() -> Self {
        ParseResult::Accepted { provisional: false }
    }

    pub const fn provisional() -> Self {
        ParseResult::Accepted { provisional: true }
    }

    pub const fn rejected() -> Self {
        ParseResult::Rejected {
            span_context_changed: false,
            auto_complete_block: false,
        }
    }

    pub const fn span_context_changed() -> Self {
        ParseResult::Rejected {
            span_context_changed: true,
            auto_complete_block: false,
        }
    }

    pub const fn auto_complete_block() -> Self {
        ParseResult::Rejected {
            span_context_changed: false,
            auto_complete_block: true,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, ParseResult::Accepted { .. })
    }

    pub fn is_rejected(&self) -> bool {
        !self.is_accepted()
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, ParseResult::Accepted { provisional: true })
    }

    pub fn is_span_context_changed(&self) -> bool {
        matches!(
            self,
            ParseResult::Rejected {
                span_context_changed: true,
                ..
            }
        )
    }

    pub fn is_auto_complete_block(&self) -> bool {
        matches!(
            self,
            ParseResult::Rejected {
                auto_complete_block: true,
                ..
            }
        )
    }
}

impl fmt::Display for ParseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ParseResult::Accepted { provisional } => {
                f.write_str("Accepted")?;
                if provisional {
                    f.write_str(" | Provisional")?;
                }
            }
            ParseResult::Rejected {
                span_context_changed,
                auto_complete_block,
            } => {
                f.write_str("Rejected")?;
                if span_context_changed {
                    f.write_str(" | SpanContextChanged")?;
                }
                if auto_complete_block {
                    f.write_str(" | AutoCompleteBlock")?;
                }
            }
        }
        Ok(())
    }
}

/// Characters that start or end constructs in markup.
const MARKUP_DELIMITERS: &[char] = &['<', '>', '@', '{', '}'];

/// Characters that change block structure, strings or comments in code.
const STATEMENT_DELIMITERS: &[char] = &[
    '{', '}', '(', ')', '[', ']', ';', '<', '>', '@', '"', '\'', '/', '*', '\\',
];

/// Statement spans containing these are left to the full parser.
const STATEMENT_FRAGILE_CONTENT: &[char] = &['<', '"', '\'', '/'];

/// Brackets and quotes an expression may only gain through the explicit
/// parenthesis rules.
const EXPRESSION_BRACKETS: &[char] = &['(', ')', '[', ']', '"', '\''];

/// Decide whether the span `located` names can absorb `change`.
pub fn try_accept(tree: &SyntaxTree, located: &Located, change: &TextChange) -> ParseResult {
    let Some(span) = tree.span(located.node) else {
        return ParseResult::rejected();
    };
    let facts = located.shape.facts();
    let result = match span.edit_handler {
        EditHandler::Default => ParseResult::rejected(),
        EditHandler::Markup => markup(tree, located.node, span, change),
        EditHandler::ImplicitExpression {
            accept_trailing_dot,
        } => implicit_expression(span, change, facts, accept_trailing_dot),
        EditHandler::Statement => statement(tree, located.node, span, change, facts),
    };
    trace!(
        "{:?} span {:?} with {:?} handler: {change} -> {result}",
        span.kind, span.content, span.edit_handler
    );
    result
}

fn markup(tree: &SyntaxTree, node: NodeId, span: &Span, change: &TextChange) -> ParseResult {
    let relative = change.absolute_index - span.start;
    let removed = change.removed_text(&span.content, relative).unwrap_or("");

    let in_tag = tree.ancestors(node).any(|id| {
        tree.block(id)
            .is_some_and(|b| matches!(b.kind, BlockKind::Tag | BlockKind::TagHelper))
    });
    if in_tag {
        return ParseResult::rejected();
    }
    // A reparse drops empty text runs between tags
    if change.removed_length == span.len() && change.inserted_text.is_empty() {
        return ParseResult::rejected();
    }
    if continues_expression(tree, node, &span.content[..relative]) {
        return ParseResult::rejected();
    }
    if change.inserted_text.contains(MARKUP_DELIMITERS) || removed.contains(MARKUP_DELIMITERS) {
        return ParseResult::rejected();
    }
    // Escaped transitions, email addresses and text that could become a tag
    if span.content.contains(['@', '<']) {
        return ParseResult::rejected();
    }
    if change.old_end() == span.end() && next_leaf_kind(tree, node) == Some(SpanKind::Transition)
    {
        return ParseResult::rejected();
    }
    if relative == 0 && prev_leaf_kind(tree, node) == Some(SpanKind::Code) {
        return ParseResult::rejected();
    }
    let after_statement = tree.prev_sibling(node).and_then(|id| tree.block(id)).is_some_and(|b| {
        matches!(b.kind, BlockKind::Statement | BlockKind::Directive)
    });
    if after_statement {
        return ParseResult::rejected();
    }

    ParseResult::accepted()
}

fn implicit_expression(
    span: &Span,
    change: &TextChange,
    facts: &EditFacts,
    accept_trailing_dot: bool,
) -> ParseResult {
    if span.accepts == AcceptedCharacters::Any {
        return ParseResult::rejected();
    }
    let relative = change.absolute_index - span.start;
    let (Some(removed), Some(edited)) = (
        change.removed_text(&span.content, relative),
        change.edited_content(&span.content, relative),
    ) else {
        return ParseResult::rejected();
    };

    let Some(forced_provisional) = expression_rule(span, change, facts, relative, removed) else {
        return ParseResult::rejected();
    };

    if is_keyword(leading_identifier(&edited))
        || has_await_prefix(&span.content) != has_await_prefix(&edited)
    {
        return ParseResult::span_context_changed();
    }

    ParseResult::Accepted {
        provisional: forced_provisional || (!accept_trailing_dot && edited.ends_with('.')),
    }
}

/// The first expression rule that accepts the edit. `Some(true)` means the
/// rule itself makes the result provisional.
fn expression_rule(
    span: &Span,
    change: &TextChange,
    facts: &EditFacts,
    relative: usize,
    removed: &str,
) -> Option<bool> {
    let content = span.content.as_str();
    let inserted = change.inserted_text.as_str();
    let at_end = facts.at_trailing_edge;

    if removed.contains(EXPRESSION_BRACKETS) {
        return None;
    }
    if is_dotless_commit(content, change, relative, removed) {
        return Some(false);
    }
    if is_identifier_replacement(content, change, relative) {
        return Some(false);
    }
    if change.is_replace() && at_end && ends_with_dot(removed) && ends_with_dot(inserted) {
        return Some(false);
    }

    // Nothing before the edit point: the edit decides what follows `@`
    let prev = content[..relative].chars().next_back()?;
    let next = content[relative + change.removed_length..].chars().next();
    let inner_ok = is_identifier_part(prev) || prev == '.';
    let next_ok = next.is_none_or(|c| is_identifier_part(c) || c == '.');

    if change.is_insert() && (at_end || (inner_ok && next_ok)) {
        return insertion_after(prev, inserted, at_end);
    }
    let between_parens = prev == '(' && next == Some(')');
    if change.is_delete() && (at_end || (inner_ok && next_ok) || between_parens) {
        return deletion_after(prev, next);
    }
    None
}

fn insertion_after(prev: char, inserted: &str, at_end: bool) -> Option<bool> {
    match prev {
        '.' => (is_identifier(inserted, true) || inserted == ".").then_some(false),
        ')' | ']' => {
            if inserted == "." {
                Some(false)
            } else if at_end && matches!(inserted, "(" | "()") {
                Some(true)
            } else {
                None
            }
        }
        '(' => (at_end && inserted == ")").then_some(false),
        c if is_identifier_part(c) => {
            if is_identifier(inserted, false) {
                Some(false)
            } else if at_end && matches!(inserted, "(" | "()") {
                Some(true)
            } else if ends_with_dot(inserted) {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn deletion_after(prev: char, next: Option<char>) -> Option<bool> {
    match prev {
        '.' => Some(false),
        '(' if next == Some(')') => Some(true),
        c if is_identifier_part(c) => Some(false),
        _ => None,
    }
}

/// Committing a completion by typing `.`: `@DateT.` becomes `@DateTime.`
/// (identifier typed before the trailing dot) or `@DateTime..` (second dot).
fn is_dotless_commit(content: &str, change: &TextChange, relative: usize, removed: &str) -> bool {
    if !content.ends_with('.') {
        return false;
    }
    let inserted = change.inserted_text.as_str();
    let before_trailing_dot =
        relative > 0 && relative + change.removed_length + 1 == content.len();
    let new_commit = before_trailing_dot
        && !inserted.is_empty()
        && is_identifier(inserted, false)
        && (removed.is_empty() || is_identifier(removed, false));
    let second_dot = change.is_insert() && inserted == "." && relative == content.len();
    new_commit || second_dot
}

/// Replacing text inside a single identifier token with text that keeps it a
/// single identifier.
fn is_identifier_replacement(content: &str, change: &TextChange, relative: usize) -> bool {
    if !change.is_replace() {
        return false;
    }
    let mut token_start = 0;
    for token in lex(content) {
        let token_end = token_start + token.text.len();
        if token_end > relative {
            if token_end < relative + change.removed_length || token.kind != SyntaxKind::IDENT {
                return false;
            }
            let Some(replaced) = change.edited_content(token.text, relative - token_start) else {
                return false;
            };
            let tokens = lex(&replaced);
            return tokens.len() == 1 && tokens[0].kind == SyntaxKind::IDENT;
        }
        token_start = token_end;
    }
    false
}

/// `.` alone, or identifier characters followed by one `.`.
fn ends_with_dot(text: &str) -> bool {
    text.strip_suffix('.')
        .is_some_and(|head| head.chars().all(is_identifier_part))
}

fn has_await_prefix(content: &str) -> bool {
    content
        .strip_prefix(AWAIT_KEYWORD)
        .is_some_and(|rest| rest.starts_with(char::is_whitespace))
}

fn statement(
    tree: &SyntaxTree,
    node: NodeId,
    span: &Span,
    change: &TextChange,
    facts: &EditFacts,
) -> ParseResult {
    let relative = change.absolute_index - span.start;
    let removed = change.removed_text(&span.content, relative).unwrap_or("");
    let at_end = facts.at_trailing_edge;

    if span.auto_complete.is_some()
        && change.is_insert()
        && is_newline(&change.inserted_text)
        && (at_end || Some(relative) == first_line_end(&span.content))
    {
        return ParseResult::auto_complete_block();
    }
    if at_end {
        return ParseResult::rejected();
    }
    if change.inserted_text.contains(STATEMENT_DELIMITERS)
        || removed.contains(STATEMENT_DELIMITERS)
    {
        return ParseResult::rejected();
    }
    if span.content.contains(STATEMENT_FRAGILE_CONTENT) {
        return ParseResult::rejected();
    }
    if next_leaf_kind(tree, node) == Some(SpanKind::Markup) {
        return ParseResult::rejected();
    }
    if relative == 0
        && matches!(
            prev_leaf_kind(tree, node),
            Some(SpanKind::Code | SpanKind::Transition)
        )
    {
        return ParseResult::rejected();
    }
    if continues_expression(tree, node, &span.content[..relative]) {
        return ParseResult::rejected();
    }
    // `else`, `catch` and friends attach to the statement before them
    let after_statement = tree
        .prev_sibling(node)
        .and_then(|id| tree.block(id))
        .is_some_and(|b| b.kind == BlockKind::Statement);
    if after_statement {
        return ParseResult::rejected();
    }

    ParseResult::accepted()
}

/// Whether text at the start of a span could still be read as part of the
/// implicit expression just before it: `@foo` then `.bar`, or `@await` then
/// ` x`.
fn continues_expression(tree: &SyntaxTree, node: NodeId, before: &str) -> bool {
    let Some(prev) = tree.prev_leaf(node).and_then(|id| tree.span(id)) else {
        return false;
    };
    if !matches!(prev.edit_handler, EditHandler::ImplicitExpression { .. }) {
        return false;
    }
    before.chars().all(|c| c == '.' || is_identifier_part(c))
        || (prev.content == AWAIT_KEYWORD && before.chars().all(|c| matches!(c, ' ' | '\t')))
}

fn is_newline(text: &str) -> bool {
    matches!(text, "\n" | "\r\n" | "\r")
}

fn first_line_end(content: &str) -> Option<usize> {
    content.find(['\r', '\n'])
}

fn next_leaf_kind(tree: &SyntaxTree, node: NodeId) -> Option<SpanKind> {
    tree.next_leaf(node)
        .and_then(|id| tree.span(id))
        .map(|span| span.kind)
}

fn prev_leaf_kind(tree: &SyntaxTree, node: NodeId) -> Option<SpanKind> {
    tree.prev_leaf(node)
        .and_then(|id| tree.span(id))
        .map(|span| span.kind)
}
