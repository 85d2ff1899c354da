//! SyntaxKind enum for the raw tokens the Razor parser consumes.
//!
//! The tree itself is made of blocks and spans (see [`crate::tree`]); token
//! kinds only exist between the lexer and the grammar.

/// All token kinds seen by the grammar.
///
/// We use SCREAMING_CASE following the rust-analyzer convention for SyntaxKind.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    /// Horizontal whitespace (spaces, tabs)
    WHITESPACE,
    /// Line ending
    NEWLINE,
    /// Identifier-shaped word (`DateTime`, `_x1`, `if`)
    IDENT,
    /// Run of ASCII digits
    NUMBER,
    /// `@` transition character
    AT,
    /// `{`
    L_BRACE,
    /// `}`
    R_BRACE,
    /// `(`
    L_PAREN,
    /// `)`
    R_PAREN,
    /// `[`
    L_BRACKET,
    /// `]`
    R_BRACKET,
    /// `<`
    LT,
    /// `>`
    GT,
    /// `/`
    SLASH,
    /// `.`
    DOT,
    /// `*`
    STAR,
    /// `"`
    DOUBLE_QUOTE,
    /// `'`
    SINGLE_QUOTE,
    /// `;`
    SEMICOLON,
    /// `=`
    EQ,
    /// `!`
    BANG,
    /// `:`
    COLON,
    /// `\`
    BACKSLASH,
    /// Anything else
    TEXT,
    /// End of file marker
    EOF,
}

impl SyntaxKind {
    /// Whether the token is whitespace or a line ending.
    pub fn is_trivia(self) -> bool {
        matches!(self, SyntaxKind::WHITESPACE | SyntaxKind::NEWLINE)
    }
}
