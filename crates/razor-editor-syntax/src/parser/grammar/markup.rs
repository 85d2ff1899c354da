//! # Markup Grammar
//!
//! Markup is mostly opaque text. The grammar only cares about:
//!
//! | Input | Result |
//! |-------|--------|
//! | `@` | transition into code (unless `@@` or an email address) |
//! | `<name ...>`, `</name>`, `<!...>` | a Tag block |
//! | `<name>` claimed by a tag helper | a TagHelper block with its children |
//! | `}` inside a section body | end of the section |
//!
//! Every run of markup produces at least one span, so an empty section body
//! or element still has a place for typing to land.
//!
//! Tags are flat at the document level: `<div><p></p></div>` is four Tag
//! blocks in a row. Elements only nest when something needs their extent:
//! tag helper elements and markup sections inside code blocks.

use crate::parser::{CompletedMarker, Parser};
use crate::syntax_kind::SyntaxKind;
use crate::tree::BlockKind;

use super::code::{self, Context};
use super::{fixed_markup, markup_text};

/// Elements that never have an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Where a run of markup stops.
#[derive(Clone, Copy)]
pub(super) enum MarkupEnd<'a> {
    Eof,
    /// Before the `</name>` matching the enclosing element
    CloseTag(&'a str),
    /// Before the `}` closing a section body
    CloseBrace,
}

/// What [`tag`] found.
pub(super) struct TagInfo {
    pub name: String,
    pub closing: bool,
    pub self_closing: bool,
    pub tag_helper: bool,
}

/// Parse markup until `end`, emitting text spans, tags and code blocks.
pub(super) fn markup_content(p: &mut Parser<'_, '_>, end: MarkupEnd<'_>) {
    // Set after a code block so the markup that follows gets a span even if empty
    let mut after_code = false;
    let mut emitted = false;
    let mut depth = 0usize;

    loop {
        match p.current() {
            SyntaxKind::EOF => break,
            SyntaxKind::AT if p.nth(1) == SyntaxKind::AT => {
                p.bump();
                p.bump();
            }
            SyntaxKind::AT if is_email_at(p) => p.bump(),
            SyntaxKind::AT => {
                p.output(markup_text());
                code::transition(p, Context::Markup);
                after_code = true;
                emitted = true;
            }
            SyntaxKind::LT if starts_tag(p) => {
                if let MarkupEnd::CloseTag(name) = end
                    && is_close_tag_for(p, name)
                {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                flush(p, &mut after_code);
                let info = element(p, false);
                emitted = true;
                if let MarkupEnd::CloseTag(name) = end
                    && opens_scope(&info, name)
                {
                    depth += 1;
                }
            }
            SyntaxKind::L_BRACE if matches!(end, MarkupEnd::CloseBrace) => {
                depth += 1;
                p.bump();
            }
            SyntaxKind::R_BRACE if matches!(end, MarkupEnd::CloseBrace) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                p.bump();
            }
            _ => p.bump(),
        }
    }

    if !flush(p, &mut after_code) && !emitted {
        p.output(markup_text());
    }
}

/// A tag in statement position inside code, with its children.
pub(super) fn markup_section(p: &mut Parser<'_, '_>) {
    let m = p.start();
    element(p, true);
    m.complete(p, BlockKind::Markup);
}

/// Parse one tag. Tag helper elements also take their children and end tag;
/// other elements do so only when `with_children` is set.
pub(super) fn element(p: &mut Parser<'_, '_>, with_children: bool) -> TagInfo {
    let (start_tag, mut info) = tag(p);

    if !info.closing && p.is_tag_helper(&info.name) {
        info.tag_helper = true;
        let m = start_tag.precede(p);
        if !info.self_closing {
            children(p, &info.name);
        }
        m.complete_named(p, BlockKind::TagHelper, info.name.as_str());
    } else if with_children
        && !info.closing
        && !info.self_closing
        && !is_void_element(&info.name)
    {
        children(p, &info.name);
    }

    info
}

fn children(p: &mut Parser<'_, '_>, name: &str) {
    markup_content(p, MarkupEnd::CloseTag(name));
    if starts_tag(p) && is_close_tag_for(p, name) {
        tag(p);
    } else {
        p.error(format!("element <{name}> is missing an end tag"));
    }
}

/// Parse a single `<...>` into a Tag block.
fn tag(p: &mut Parser<'_, '_>) -> (CompletedMarker, TagInfo) {
    let m = p.start();
    p.bump();

    if p.at(SyntaxKind::BANG) {
        bang_tag(p);
        if p.pending() > 0 {
            p.output(fixed_markup());
        }
        let completed = m.complete_named(p, BlockKind::Tag, "!");
        return (
            completed,
            TagInfo {
                name: "!".to_string(),
                closing: false,
                self_closing: true,
                tag_helper: false,
            },
        );
    }

    let closing = p.eat(SyntaxKind::SLASH);
    let name = tag_name(p);
    let mut self_closing = false;
    let mut quote: Option<SyntaxKind> = None;

    loop {
        match p.current() {
            SyntaxKind::EOF => {
                p.error(format!("tag <{name}> is not terminated"));
                break;
            }
            SyntaxKind::AT if p.nth(1) == SyntaxKind::AT => {
                p.bump();
                p.bump();
            }
            SyntaxKind::AT if is_email_at(p) => p.bump(),
            SyntaxKind::AT => {
                if p.pending() > 0 {
                    p.output(fixed_markup());
                }
                code::transition(p, Context::Markup);
            }
            kind @ (SyntaxKind::DOUBLE_QUOTE | SyntaxKind::SINGLE_QUOTE) => {
                quote = match quote {
                    None => Some(kind),
                    Some(open) if open == kind => None,
                    other => other,
                };
                p.bump();
            }
            SyntaxKind::GT if quote.is_none() => {
                p.bump();
                break;
            }
            SyntaxKind::SLASH if quote.is_none() && p.nth(1) == SyntaxKind::GT => {
                p.bump();
                p.bump();
                self_closing = true;
                break;
            }
            SyntaxKind::LT if quote.is_none() => {
                p.error(format!("tag <{name}> is not terminated"));
                break;
            }
            _ => p.bump(),
        }
    }

    if p.pending() > 0 {
        p.output(fixed_markup());
    }
    let completed = m.complete_named(p, BlockKind::Tag, name.as_str());
    (
        completed,
        TagInfo {
            name,
            closing,
            self_closing,
            tag_helper: false,
        },
    )
}

/// `<!-- ... -->` or `<!DOCTYPE ...>`, positioned after `<`.
fn bang_tag(p: &mut Parser<'_, '_>) {
    p.bump();
    let html_comment = p.current_text().starts_with("--");
    if html_comment {
        p.bump();
    }
    loop {
        match p.current() {
            SyntaxKind::EOF => {
                p.error("markup comment is not terminated");
                break;
            }
            SyntaxKind::GT if !html_comment || p.prev_text().ends_with("--") => {
                p.bump();
                break;
            }
            _ => p.bump(),
        }
    }
}

/// Element names: `p`, `my-widget`, `th:row`, `h1`.
fn tag_name(p: &mut Parser<'_, '_>) -> String {
    let mut name = String::new();
    loop {
        let continues = match p.current() {
            SyntaxKind::IDENT | SyntaxKind::NUMBER | SyntaxKind::COLON => true,
            SyntaxKind::TEXT => !name.is_empty() && p.current_text().chars().all(|c| c == '-'),
            _ => false,
        };
        if !continues {
            break;
        }
        name.push_str(p.current_text());
        p.bump();
    }
    name
}

/// `<` followed by something that can only be a tag.
pub(super) fn starts_tag(p: &Parser<'_, '_>) -> bool {
    p.at(SyntaxKind::LT)
        && match p.nth(1) {
            SyntaxKind::IDENT | SyntaxKind::BANG => true,
            SyntaxKind::SLASH => p.nth(2) == SyntaxKind::IDENT,
            _ => false,
        }
}

fn is_close_tag_for(p: &Parser<'_, '_>, name: &str) -> bool {
    if p.nth(1) != SyntaxKind::SLASH {
        return false;
    }
    let mut candidate = String::new();
    let mut n = 2;
    loop {
        let kind = p.nth(n);
        let text = p.nth_text(n);
        let continues = match kind {
            SyntaxKind::IDENT | SyntaxKind::NUMBER | SyntaxKind::COLON => true,
            SyntaxKind::TEXT => !candidate.is_empty() && text.chars().all(|c| c == '-'),
            _ => false,
        };
        if !continues {
            break;
        }
        candidate.push_str(text);
        n += 1;
    }
    candidate.eq_ignore_ascii_case(name)
}

/// Whether an element just parsed nests another level of `name`.
fn opens_scope(info: &TagInfo, name: &str) -> bool {
    !info.closing
        && !info.self_closing
        && !info.tag_helper
        && !is_void_element(&info.name)
        && info.name.eq_ignore_ascii_case(name)
}

fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// `user@example.com`: an `@` between two word characters is text.
fn is_email_at(p: &Parser<'_, '_>) -> bool {
    let after_word = p
        .prev_text()
        .chars()
        .next_back()
        .is_some_and(|c| c.is_alphanumeric());
    after_word && matches!(p.nth(1), SyntaxKind::IDENT | SyntaxKind::NUMBER)
}

/// Output pending markup text. Returns whether a span was made.
fn flush(p: &mut Parser<'_, '_>, after_code: &mut bool) -> bool {
    let output = p.pending() > 0 || *after_code;
    if output {
        p.output(markup_text());
    }
    *after_code = false;
    output
}
