//! # Code Grammar
//!
//! Everything that starts at an `@`:
//!
//! | Input | Block |
//! |-------|-------|
//! | `@name.member(args)[i]` | Expression (implicit) |
//! | `@(expr)` | Expression (explicit) |
//! | `@{ ... }` | Statement |
//! | `@if (...) { ... } else { ... }` | Statement named by the keyword |
//! | `@class`, `@namespace` | Statement holding only the reserved word |
//! | `@section Name { ... }` and friends | Directive |
//! | `@* ... *@` | Comment |
//! | `@: text` (inside code) | Markup line |
//!
//! C# itself is not parsed. Code is scanned for the few things that decide
//! where a construct ends: nesting of brackets, string literals, comments,
//! statement boundaries and nested transitions.

use crate::keywords::{
    AWAIT_KEYWORD, CONTINUATION_KEYWORDS, is_directive, is_reserved_word, is_statement_keyword,
};
use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;
use crate::tree::{AcceptedCharacters, BlockKind};

use super::markup::{self, MarkupEnd};
use super::{
    code, comment as comment_span, fixed_markup, implicit_code, meta_code, statement_code,
    transition as transition_span,
};

/// Which language the `@` was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Context {
    Markup,
    Code,
}

/// Parse the construct introduced by the `@` at the current position.
pub(super) fn transition(p: &mut Parser<'_, '_>, ctx: Context) {
    match p.nth(1) {
        SyntaxKind::STAR => comment(p),
        SyntaxKind::L_BRACE => statement_block(p),
        SyntaxKind::L_PAREN => explicit_expression(p),
        SyntaxKind::COLON if ctx == Context::Code => markup_line(p),
        SyntaxKind::IDENT => {
            let word = p.nth_text(1);
            if ctx == Context::Markup && is_directive(word) {
                directive(p);
            } else if is_statement_keyword(word) {
                keyword_statement(p);
            } else if is_reserved_word(word) {
                reserved_word(p);
            } else {
                implicit_expression(p, ctx);
            }
        }
        _ => implicit_expression(p, ctx),
    }
}

/// `@name.member(args)[index]`, or `@await name...`.
fn implicit_expression(p: &mut Parser<'_, '_>, ctx: Context) {
    let m = p.start();
    p.bump();
    p.output(transition_span());

    let accept_trailing_dot = ctx == Context::Code;
    let accepts = if p.current_text() == AWAIT_KEYWORD
        && p.nth(1) == SyntaxKind::WHITESPACE
        && p.nth(2) == SyntaxKind::IDENT
    {
        p.bump();
        p.bump();
        p.bump();
        AcceptedCharacters::AnyExceptNewline
    } else {
        p.eat(SyntaxKind::IDENT);
        AcceptedCharacters::NonWhiteSpace
    };

    if p.pending() == 0 {
        p.error("expected an expression after '@'");
    } else {
        loop {
            match p.current() {
                SyntaxKind::DOT if p.nth(1) == SyntaxKind::IDENT => {
                    p.bump();
                    p.bump();
                }
                SyntaxKind::DOT => {
                    if accept_trailing_dot {
                        p.bump();
                    }
                    break;
                }
                SyntaxKind::L_PAREN => balanced(p, SyntaxKind::L_PAREN, SyntaxKind::R_PAREN),
                SyntaxKind::L_BRACKET => {
                    balanced(p, SyntaxKind::L_BRACKET, SyntaxKind::R_BRACKET)
                }
                _ => break,
            }
        }
    }

    p.output(implicit_code(accept_trailing_dot, accepts));
    m.complete(p, BlockKind::Expression);
}

/// `@( ... )`
fn explicit_expression(p: &mut Parser<'_, '_>) {
    let m = p.start();
    p.bump();
    p.output(transition_span());
    p.bump();
    p.output(meta_code());

    let closed = code_until(p, SyntaxKind::L_PAREN, SyntaxKind::R_PAREN);
    p.output(code(AcceptedCharacters::Any));
    if closed {
        p.bump();
        p.output(meta_code());
    } else {
        p.error("explicit expression is missing a closing ')'");
    }

    m.complete(p, BlockKind::Expression);
}

/// `@* ... *@`
fn comment(p: &mut Parser<'_, '_>) {
    let m = p.start();
    p.bump();
    p.output(transition_span());
    p.bump();
    p.output(meta_code());

    while !p.at_end() && !(p.at(SyntaxKind::STAR) && p.nth(1) == SyntaxKind::AT) {
        p.bump();
    }
    p.output(comment_span());

    if p.at(SyntaxKind::STAR) {
        p.bump();
        p.output(meta_code());
        p.bump();
        p.output(transition_span());
    } else {
        p.error("comment is missing a closing '*@'");
    }

    m.complete(p, BlockKind::Comment);
}

/// `@{ ... }`
fn statement_block(p: &mut Parser<'_, '_>) {
    let m = p.start();
    p.bump();
    p.output(transition_span());
    p.bump();
    p.output(meta_code());

    let (closed, first_span) = code_body(p);
    if closed {
        p.bump();
        p.output(meta_code());
    } else {
        p.set_auto_complete(first_span, "}");
        p.error("code block is missing a closing '}'");
    }

    m.complete(p, BlockKind::Statement);
}

/// Statement code up to the `}` that closes the block. Returns whether that
/// brace was found, and the event index of the first code span.
fn code_body(p: &mut Parser<'_, '_>) -> (bool, usize) {
    let mut depth = 0usize;
    let mut statement_start = true;
    let mut first_span = None;

    let closed = loop {
        match p.current() {
            SyntaxKind::EOF => break false,
            SyntaxKind::R_BRACE if depth == 0 => break true,
            SyntaxKind::L_BRACE => {
                depth += 1;
                p.bump();
                statement_start = true;
            }
            SyntaxKind::R_BRACE => {
                depth -= 1;
                p.bump();
                statement_start = true;
            }
            SyntaxKind::SEMICOLON => {
                p.bump();
                statement_start = true;
            }
            SyntaxKind::DOUBLE_QUOTE | SyntaxKind::SINGLE_QUOTE => {
                string_literal(p);
                statement_start = false;
            }
            SyntaxKind::SLASH if starts_comment(p) => skip_comment(p),
            SyntaxKind::AT if p.nth(1) == SyntaxKind::DOUBLE_QUOTE => {
                p.bump();
                verbatim_string(p);
                statement_start = false;
            }
            SyntaxKind::AT => {
                let span = p.output(statement_code());
                first_span.get_or_insert(span);
                transition(p, Context::Code);
                statement_start = false;
            }
            SyntaxKind::LT if statement_start && p.nth(1) == SyntaxKind::IDENT => {
                let span = p.output(statement_code());
                first_span.get_or_insert(span);
                markup::markup_section(p);
                statement_start = true;
            }
            kind if kind.is_trivia() => p.bump(),
            _ => {
                p.bump();
                statement_start = false;
            }
        }
    };

    let last = p.output(statement_code());
    (closed, first_span.unwrap_or(last))
}

/// `@if (...) { ... } else { ... }`, `@do { ... } while (...);`,
/// `@using (...) { ... }` and `@using Namespace`.
fn keyword_statement(p: &mut Parser<'_, '_>) {
    let keyword = p.nth_text(1);
    let m = p.start();
    p.bump();
    p.output(transition_span());
    p.bump();

    if keyword == "using" && next_significant(p, 0) != SyntaxKind::L_PAREN {
        while !matches!(p.current(), SyntaxKind::NEWLINE | SyntaxKind::EOF) {
            p.bump();
        }
        p.output(code(AcceptedCharacters::AnyExceptNewline));
        m.complete_named(p, BlockKind::Statement, keyword);
        return;
    }

    let mut depth = 0usize;
    let mut parens = 0usize;
    let mut statement_start = false;
    let mut expect_while = keyword == "do";

    loop {
        match p.current() {
            SyntaxKind::EOF => {
                if depth > 0 {
                    p.error(format!("'{keyword}' block is missing a closing '}}'"));
                }
                break;
            }
            SyntaxKind::L_PAREN => {
                parens += 1;
                p.bump();
            }
            SyntaxKind::R_PAREN => {
                parens = parens.saturating_sub(1);
                p.bump();
            }
            SyntaxKind::L_BRACE => {
                depth += 1;
                p.bump();
                statement_start = true;
            }
            // Belongs to an enclosing block
            SyntaxKind::R_BRACE if depth == 0 => break,
            SyntaxKind::R_BRACE => {
                depth -= 1;
                p.bump();
                statement_start = true;
                if depth == 0 && parens == 0 && !continues(p, expect_while) {
                    break;
                }
            }
            SyntaxKind::SEMICOLON => {
                p.bump();
                statement_start = true;
                if depth == 0 && parens == 0 && !continues(p, expect_while) {
                    break;
                }
            }
            SyntaxKind::IDENT if depth == 0 && expect_while && p.current_text() == "while" => {
                expect_while = false;
                p.bump();
            }
            SyntaxKind::DOUBLE_QUOTE | SyntaxKind::SINGLE_QUOTE => {
                string_literal(p);
                statement_start = false;
            }
            SyntaxKind::SLASH if starts_comment(p) => skip_comment(p),
            SyntaxKind::AT if depth > 0 => {
                p.output(code(AcceptedCharacters::Any));
                transition(p, Context::Code);
                statement_start = false;
            }
            SyntaxKind::LT if depth > 0 && statement_start && p.nth(1) == SyntaxKind::IDENT => {
                p.output(code(AcceptedCharacters::Any));
                markup::markup_section(p);
                statement_start = true;
            }
            kind if kind.is_trivia() => p.bump(),
            _ => {
                p.bump();
                statement_start = false;
            }
        }
    }

    p.output(code(AcceptedCharacters::Any));
    m.complete_named(p, BlockKind::Statement, keyword);
}

/// Whether the statement chain goes on past the current position:
/// `else`, `catch`, `finally`, or the `while` tail of a `do`.
fn continues(p: &Parser<'_, '_>, expect_while: bool) -> bool {
    let mut n = 0;
    while p.nth(n).is_trivia() {
        n += 1;
    }
    if p.nth(n) != SyntaxKind::IDENT {
        return false;
    }
    let word = p.nth_text(n);
    CONTINUATION_KEYWORDS.contains(&word) || (expect_while && word == "while")
}

fn next_significant(p: &Parser<'_, '_>, from: usize) -> SyntaxKind {
    let mut n = from;
    while p.nth(n).is_trivia() {
        n += 1;
    }
    p.nth(n)
}

/// `@class`, `@namespace`: not allowed in a template.
fn reserved_word(p: &mut Parser<'_, '_>) {
    let word = p.nth_text(1);
    let m = p.start();
    p.bump();
    p.output(transition_span());
    p.bump();
    p.output(meta_code());
    p.error(format!("'{word}' is a reserved word"));
    m.complete_named(p, BlockKind::Statement, word);
}

/// `@section Name { markup }`, `@functions { code }`, and the single line
/// directives (`@inherits`, `@addTagHelper`, ...).
fn directive(p: &mut Parser<'_, '_>) {
    let name = p.nth_text(1);
    let m = p.start();
    p.bump();
    p.output(transition_span());
    p.bump();
    p.output(meta_code());

    match name {
        "section" | "functions" => {
            while !matches!(
                p.current(),
                SyntaxKind::L_BRACE | SyntaxKind::NEWLINE | SyntaxKind::EOF
            ) {
                p.bump();
            }
            p.output(code(AcceptedCharacters::AnyExceptNewline));

            if p.at(SyntaxKind::L_BRACE) {
                p.bump();
                p.output(meta_code());
                let closed = if name == "section" {
                    let body = p.start();
                    markup::markup_content(p, MarkupEnd::CloseBrace);
                    body.complete(p, BlockKind::Markup);
                    p.at(SyntaxKind::R_BRACE)
                } else {
                    let closed = code_until(p, SyntaxKind::L_BRACE, SyntaxKind::R_BRACE);
                    p.output(code(AcceptedCharacters::Any));
                    closed
                };
                if closed {
                    p.bump();
                    p.output(meta_code());
                } else {
                    p.error(format!("'{name}' is missing a closing '}}'"));
                }
            } else {
                p.error(format!("'{name}' requires a body"));
            }
        }
        _ => {
            while !matches!(p.current(), SyntaxKind::NEWLINE | SyntaxKind::EOF) {
                p.bump();
            }
            p.output(code(AcceptedCharacters::AnyExceptNewline));
        }
    }

    m.complete_named(p, BlockKind::Directive, name);
}

/// `@: text` inside code: the rest of the line is markup.
fn markup_line(p: &mut Parser<'_, '_>) {
    let m = p.start();
    p.bump();
    p.output(transition_span());
    p.bump();
    p.output(meta_code());

    loop {
        match p.current() {
            SyntaxKind::EOF => break,
            SyntaxKind::NEWLINE => {
                p.bump();
                break;
            }
            SyntaxKind::AT if p.nth(1) == SyntaxKind::AT => {
                p.bump();
                p.bump();
            }
            SyntaxKind::AT => {
                p.output(fixed_markup());
                transition(p, Context::Markup);
            }
            _ => p.bump(),
        }
    }
    p.output(fixed_markup());

    m.complete(p, BlockKind::Markup);
}

/// Consume `open ... close` including both brackets.
fn balanced(p: &mut Parser<'_, '_>, open: SyntaxKind, close: SyntaxKind) {
    p.bump();
    if code_until(p, open, close) {
        p.bump();
    } else {
        p.error("unbalanced brackets in expression");
    }
}

/// Consume code up to the first unmatched `close`, leaving it current.
/// Returns false if input ran out first.
fn code_until(p: &mut Parser<'_, '_>, open: SyntaxKind, close: SyntaxKind) -> bool {
    let mut depth = 0usize;
    loop {
        match p.current() {
            SyntaxKind::EOF => return false,
            kind if kind == close => {
                if depth == 0 {
                    return true;
                }
                depth -= 1;
                p.bump();
            }
            kind if kind == open => {
                depth += 1;
                p.bump();
            }
            SyntaxKind::DOUBLE_QUOTE | SyntaxKind::SINGLE_QUOTE => string_literal(p),
            SyntaxKind::SLASH if starts_comment(p) => skip_comment(p),
            _ => p.bump(),
        }
    }
}

/// `"..."` or `'...'` with backslash escapes. Strings do not span lines.
fn string_literal(p: &mut Parser<'_, '_>) {
    let quote = p.current();
    p.bump();
    loop {
        match p.current() {
            SyntaxKind::EOF | SyntaxKind::NEWLINE => {
                p.error("string literal is not terminated");
                return;
            }
            SyntaxKind::BACKSLASH => {
                p.bump();
                if !matches!(p.current(), SyntaxKind::EOF | SyntaxKind::NEWLINE) {
                    p.bump();
                }
            }
            kind if kind == quote => {
                p.bump();
                return;
            }
            _ => p.bump(),
        }
    }
}

/// `@"..."`, positioned after the `@`. Doubled quotes are escapes.
fn verbatim_string(p: &mut Parser<'_, '_>) {
    p.bump();
    loop {
        match p.current() {
            SyntaxKind::EOF => {
                p.error("string literal is not terminated");
                return;
            }
            SyntaxKind::DOUBLE_QUOTE if p.nth(1) == SyntaxKind::DOUBLE_QUOTE => {
                p.bump();
                p.bump();
            }
            SyntaxKind::DOUBLE_QUOTE => {
                p.bump();
                return;
            }
            _ => p.bump(),
        }
    }
}

fn starts_comment(p: &Parser<'_, '_>) -> bool {
    p.at(SyntaxKind::SLASH) && matches!(p.nth(1), SyntaxKind::SLASH | SyntaxKind::STAR)
}

/// `// ...` or `/* ... */` at the current `/`.
fn skip_comment(p: &mut Parser<'_, '_>) {
    if p.nth(1) == SyntaxKind::SLASH {
        while !matches!(p.current(), SyntaxKind::NEWLINE | SyntaxKind::EOF) {
            p.bump();
        }
        return;
    }

    p.bump();
    p.bump();
    loop {
        match p.current() {
            SyntaxKind::EOF => {
                p.error("block comment is not terminated");
                break;
            }
            SyntaxKind::STAR if p.nth(1) == SyntaxKind::SLASH => {
                p.bump();
                p.bump();
                break;
            }
            _ => p.bump(),
        }
    }
}
