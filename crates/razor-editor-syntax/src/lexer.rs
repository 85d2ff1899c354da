//! # Lexer - Tokenizing Razor Source
//!
//! The first stage of parsing breaks a template into tokens using the
//! [Logos] lexer generator.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Lossless Guarantee
//!
//! Every byte in the input appears in exactly one token. Spans in the final
//! tree are built by concatenating token texts, so this is what makes the
//! well-formedness invariant (leaf text == document text) hold:
//!
//! ```
//! use razor_editor_syntax::lexer::lex;
//!
//! let input = "<p>@DateTime.Now</p>\n";
//! let tokens = lex(input);
//!
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Token Design
//!
//! Tokens are context-free. The lexer does not know whether `@` starts an
//! expression or sits inside an email address, or whether `<` opens a tag or
//! compares two numbers inside a code block; the grammar decides.
//!
//! Characters with meaning to either the markup or the code side get their own
//! token. Identifier-shaped words are a single [`SyntaxKind::IDENT`] token so
//! keyword detection is a string compare. Everything else is grouped into
//! `TEXT` runs.

use logos::Logos;

use crate::syntax_kind::SyntaxKind;

/// Token kinds produced by the Logos lexer.
///
/// Separate from [`SyntaxKind`] because Logos needs to derive on it.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Horizontal whitespace (spaces, tabs)
    #[regex(r"[ \t]+")]
    Whitespace,

    /// Line ending (LF, CRLF or a lone CR)
    #[regex(r"\r\n|\n|\r")]
    Newline,

    /// Identifier-shaped word, using the same classes as `char::is_alphanumeric`
    #[regex(r"[\p{Alphabetic}_][\p{Alphabetic}\p{N}_]*")]
    Ident,

    #[regex(r"[0-9]+")]
    Number,

    #[token("@")]
    At,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    #[token("/")]
    Slash,

    #[token(".")]
    Dot,

    #[token("*")]
    Star,

    #[token("\"")]
    DoubleQuote,

    #[token("'")]
    SingleQuote,

    #[token(";")]
    Semicolon,

    #[token("=")]
    Eq,

    #[token("!")]
    Bang,

    #[token(":")]
    Colon,

    #[token("\\")]
    Backslash,

    /// Plain text - anything not matched by other rules
    #[regex(r#"[^\s\p{Alphabetic}\p{N}_@{}()\[\]<>/.*"';=!:\\]+"#)]
    Text,
}

impl TokenKind {
    /// Convert to SyntaxKind.
    pub fn to_syntax_kind(self) -> SyntaxKind {
        match self {
            TokenKind::Whitespace => SyntaxKind::WHITESPACE,
            TokenKind::Newline => SyntaxKind::NEWLINE,
            TokenKind::Ident => SyntaxKind::IDENT,
            TokenKind::Number => SyntaxKind::NUMBER,
            TokenKind::At => SyntaxKind::AT,
            TokenKind::LBrace => SyntaxKind::L_BRACE,
            TokenKind::RBrace => SyntaxKind::R_BRACE,
            TokenKind::LParen => SyntaxKind::L_PAREN,
            TokenKind::RParen => SyntaxKind::R_PAREN,
            TokenKind::LBracket => SyntaxKind::L_BRACKET,
            TokenKind::RBracket => SyntaxKind::R_BRACKET,
            TokenKind::Lt => SyntaxKind::LT,
            TokenKind::Gt => SyntaxKind::GT,
            TokenKind::Slash => SyntaxKind::SLASH,
            TokenKind::Dot => SyntaxKind::DOT,
            TokenKind::Star => SyntaxKind::STAR,
            TokenKind::DoubleQuote => SyntaxKind::DOUBLE_QUOTE,
            TokenKind::SingleQuote => SyntaxKind::SINGLE_QUOTE,
            TokenKind::Semicolon => SyntaxKind::SEMICOLON,
            TokenKind::Eq => SyntaxKind::EQ,
            TokenKind::Bang => SyntaxKind::BANG,
            TokenKind::Colon => SyntaxKind::COLON,
            TokenKind::Backslash => SyntaxKind::BACKSLASH,
            TokenKind::Text => SyntaxKind::TEXT,
        }
    }
}

/// A lexed token with its kind and text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
}

/// Lex the input into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(input);

    while let Some(result) = lexer.next() {
        let text = lexer.slice();
        let kind = match result {
            Ok(token_kind) => token_kind.to_syntax_kind(),
            // Unrecognised characters (lone exotic whitespace, non-ASCII digits) are text
            Err(()) => SyntaxKind::TEXT,
        };
        tokens.push(Token { kind, text });
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn token(kind: SyntaxKind, text: &str) -> Token<'_> {
        Token { kind, text }
    }

    #[test]
    fn lex_empty_input() {
        assert_eq!(lex(""), vec![]);
    }

    #[test]
    fn lex_implicit_expression() {
        assert_eq!(
            lex("foo @DateTime.Now"),
            vec![
                token(SyntaxKind::IDENT, "foo"),
                token(SyntaxKind::WHITESPACE, " "),
                token(SyntaxKind::AT, "@"),
                token(SyntaxKind::IDENT, "DateTime"),
                token(SyntaxKind::DOT, "."),
                token(SyntaxKind::IDENT, "Now"),
            ]
        );
    }

    #[test]
    fn lex_tag_with_attribute() {
        assert_eq!(
            lex("<p class='a-b'>"),
            vec![
                token(SyntaxKind::LT, "<"),
                token(SyntaxKind::IDENT, "p"),
                token(SyntaxKind::WHITESPACE, " "),
                token(SyntaxKind::IDENT, "class"),
                token(SyntaxKind::EQ, "="),
                token(SyntaxKind::SINGLE_QUOTE, "'"),
                token(SyntaxKind::IDENT, "a"),
                token(SyntaxKind::TEXT, "-"),
                token(SyntaxKind::IDENT, "b"),
                token(SyntaxKind::SINGLE_QUOTE, "'"),
                token(SyntaxKind::GT, ">"),
            ]
        );
    }

    #[test]
    fn lex_newlines() {
        assert_eq!(
            lex("\r\n\n\r"),
            vec![
                token(SyntaxKind::NEWLINE, "\r\n"),
                token(SyntaxKind::NEWLINE, "\n"),
                token(SyntaxKind::NEWLINE, "\r"),
            ]
        );
    }

    #[test]
    fn lex_identifier_with_digits_and_underscore() {
        assert_eq!(
            lex("_x1 42"),
            vec![
                token(SyntaxKind::IDENT, "_x1"),
                token(SyntaxKind::WHITESPACE, " "),
                token(SyntaxKind::NUMBER, "42"),
            ]
        );
    }

    #[test]
    fn lex_unicode_identifier() {
        assert_eq!(lex("@café"), vec![token(SyntaxKind::AT, "@"), token(SyntaxKind::IDENT, "café")]);
    }

    #[test]
    fn all_bytes_preserved() {
        let input = "@{\r\n    var x = \"a<b\"; // c\n}\n<p a=\"@x\">&nbsp;€ \u{a0}</p>@* c *@";
        let reconstructed: String = lex(input).iter().map(|t| t.text).collect();
        assert_eq!(reconstructed, input);
    }
}
