//! Static keyword and directive tables plus identifier character classes.
//!
//! The grammar and the partial-parse keyword guard read the same tables: an
//! identifier the grammar would not parse as an implicit expression must be
//! listed in [`KEYWORDS`], otherwise a local edit could silently produce a
//! tree a full reparse disagrees with.

/// Keywords that start a statement block when they follow `@`.
pub const STATEMENT_KEYWORDS: &[&str] = &[
    "if", "do", "try", "for", "foreach", "while", "switch", "lock", "using",
];

/// Words that may continue a statement block after its closing brace.
pub const CONTINUATION_KEYWORDS: &[&str] = &["else", "catch", "finally"];

/// Reserved words that are never valid after `@`.
pub const RESERVED_WORDS: &[&str] = &["namespace", "class"];

/// Directive names.
pub const DIRECTIVES: &[&str] = &[
    "section",
    "inherits",
    "functions",
    "addTagHelper",
    "removeTagHelper",
    "tagHelperPrefix",
];

/// Every word that changes the block kind when it follows `@`.
pub const KEYWORDS: &[&str] = &[
    "if",
    "do",
    "try",
    "for",
    "foreach",
    "while",
    "switch",
    "lock",
    "using",
    "namespace",
    "class",
    "section",
    "inherits",
    "functions",
    "addTagHelper",
    "removeTagHelper",
    "tagHelperPrefix",
];

/// Prefix that widens an implicit expression to `await <expr>`.
pub const AWAIT_KEYWORD: &str = "await";

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

pub fn is_statement_keyword(word: &str) -> bool {
    STATEMENT_KEYWORDS.contains(&word)
}

pub fn is_directive(word: &str) -> bool {
    DIRECTIVES.contains(&word)
}

pub fn is_reserved_word(word: &str) -> bool {
    RESERVED_WORDS.contains(&word)
}

pub fn is_identifier_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

pub fn is_identifier_part(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Whether `text` is one identifier. With `require_start` the first character
/// must be a valid identifier start; otherwise any run of identifier parts
/// qualifies (used for text appended to an existing identifier).
pub fn is_identifier(text: &str, require_start: bool) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let first_ok = if require_start {
        is_identifier_start(first)
    } else {
        is_identifier_part(first)
    };
    first_ok && chars.all(is_identifier_part)
}

/// The leading run of identifier characters in `text`.
pub fn leading_identifier(text: &str) -> &str {
    let end = text
        .char_indices()
        .find(|&(_, c)| !is_identifier_part(c))
        .map_or(text.len(), |(i, _)| i);
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn combined_table_covers_every_special_word() {
        for word in STATEMENT_KEYWORDS
            .iter()
            .chain(RESERVED_WORDS)
            .chain(DIRECTIVES)
        {
            assert!(is_keyword(word), "{word} missing from KEYWORDS");
        }
        assert_eq!(
            KEYWORDS.len(),
            STATEMENT_KEYWORDS.len() + RESERVED_WORDS.len() + DIRECTIVES.len()
        );
    }

    #[rstest]
    #[case("DateTime", true, true)]
    #[case("_x1", true, true)]
    #[case("1x", true, false)]
    #[case("1x", false, true)]
    #[case("foo.bar", true, false)]
    #[case("", false, false)]
    #[case("ünï", true, true)]
    fn identifier_classification(
        #[case] text: &str,
        #[case] require_start: bool,
        #[case] expected: bool,
    ) {
        assert_eq!(is_identifier(text, require_start), expected);
    }

    #[rstest]
    #[case("foreach (var x", "foreach")]
    #[case("if", "if")]
    #[case("User.Name", "User")]
    #[case(".x", "")]
    fn leading_identifier_stops_at_first_non_identifier(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(leading_identifier(text), expected);
    }
}
