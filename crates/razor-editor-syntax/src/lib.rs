//! # razor-editor-syntax
//!
//! Lossless parsing of Razor-lite templates into a mutable span tree.
//!
//! ## Architecture
//!
//! ```text
//! Source → Lexer (logos) → Tokens → Parser (events) → Sink → SyntaxTree
//! ```
//!
//! - **Lexer**: splits the source into tokens; every byte lands in one token.
//! - **Parser**: grammar rules emit start/span/finish events through markers.
//! - **Sink**: turns the events into an arena tree of blocks and spans.
//! - **Tree**: spans carry the metadata the editor needs to decide whether an
//!   edit can be applied in place: kind, accepted characters, edit handler and
//!   an optional auto-complete string.
//!
//! ## Usage
//!
//! ```
//! use razor_editor_syntax::parse;
//!
//! let tree = parse("Hello @name!");
//! assert_eq!(tree.text(), "Hello @name!");
//! ```

pub mod keywords;
pub mod lexer;
pub mod parser;
pub mod syntax_kind;
pub mod tag_helpers;
pub mod tree;

pub use parser::{parse, parse_with_tag_helpers};
pub use syntax_kind::SyntaxKind;
pub use tag_helpers::{TagHelperAttributeDescriptor, TagHelperDescriptor};
pub use tree::{
    AcceptedCharacters, Block, BlockKind, Diagnostic, EditHandler, Node, NodeData, NodeId, Span,
    SpanKind, SpanRef, SyntaxTree, TreeId,
};

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn implicit_expression_between_markup() {
        assert_snapshot!(parse("foo @date baz").dump(), @r#"
        Markup@0..13
          Markup@0..4 "foo " Any
          Expression@4..9
            Transition@4..5 "@" None
            Code@5..9 "date" NonWhiteSpace
          Markup@9..13 " baz" Any
        "#);
    }

    #[test]
    fn trailing_dot_stays_in_markup() {
        assert_snapshot!(parse("@a.b. x").dump(), @r#"
        Markup@0..7
          Markup@0..0 "" Any
          Expression@0..4
            Transition@0..1 "@" None
            Code@1..4 "a.b" NonWhiteSpace
          Markup@4..7 ". x" Any
        "#);
    }

    #[test]
    fn await_expression_accepts_spaces() {
        assert_snapshot!(parse("@await Foo.Bar()").dump(), @r#"
        Markup@0..16
          Markup@0..0 "" Any
          Expression@0..16
            Transition@0..1 "@" None
            Code@1..16 "await Foo.Bar()" AnyExceptNewline
          Markup@16..16 "" Any
        "#);
    }

    #[test]
    fn explicit_expression() {
        assert_snapshot!(parse("@(a + b)").dump(), @r#"
        Markup@0..8
          Markup@0..0 "" Any
          Expression@0..8
            Transition@0..1 "@" None
            MetaCode@1..2 "(" None
            Code@2..7 "a + b" Any
            MetaCode@7..8 ")" None
          Markup@8..8 "" Any
        "#);
    }

    #[test]
    fn unterminated_code_block_gets_auto_complete() {
        let tree = parse("@{ var x = 1;");
        assert_snapshot!(tree.dump(), @r#"
        Markup@0..13
          Markup@0..0 "" Any
          Statement@0..13
            Transition@0..1 "@" None
            MetaCode@1..2 "{" None
            Code@2..13 " var x = 1;" Any auto_complete="}"
          Markup@13..13 "" Any
        "#);
        assert_eq!(tree.diagnostics().len(), 1);
    }

    #[test]
    fn keyword_statement_with_markup_section() {
        assert_snapshot!(parse("@if (a) { <b>@x</b> }").dump(), @r#"
        Markup@0..21
          Markup@0..0 "" Any
          Statement(if)@0..21
            Transition@0..1 "@" None
            Code@1..10 "if (a) { " Any
            Markup@10..19
              Tag(b)@10..13
                Markup@10..13 "<b>" Any
              Markup@13..13 "" Any
              Expression@13..15
                Transition@13..14 "@" None
                Code@14..15 "x" NonWhiteSpace
              Markup@15..15 "" Any
              Tag(b)@15..19
                Markup@15..19 "</b>" Any
            Code@19..21 " }" Any
          Markup@21..21 "" Any
        "#);
    }

    #[test]
    fn tag_helper_takes_its_children() {
        let helpers = [TagHelperDescriptor::new("person", "PersonTagHelper")];
        let tree = parse_with_tag_helpers("<person>hi</person>", &helpers);
        assert_snapshot!(tree.dump(), @r#"
        Markup@0..19
          TagHelper(person)@0..19
            Tag(person)@0..8
              Markup@0..8 "<person>" Any
            Markup@8..10 "hi" Any
            Tag(person)@10..19
              Markup@10..19 "</person>" Any
        "#);
    }

    #[test]
    fn comment_block() {
        assert_snapshot!(parse("@* hi *@").dump(), @r#"
        Markup@0..8
          Markup@0..0 "" Any
          Comment@0..8
            Transition@0..1 "@" None
            MetaCode@1..2 "*" None
            Comment@2..6 " hi " Any
            MetaCode@6..7 "*" None
            Transition@7..8 "@" None
          Markup@8..8 "" Any
        "#);
    }

    #[test]
    fn single_line_directive() {
        assert_snapshot!(parse("@inherits Base\n").dump(), @r#"
        Markup@0..15
          Markup@0..0 "" Any
          Directive(inherits)@0..14
            Transition@0..1 "@" None
            MetaCode@1..9 "inherits" None
            Code@9..14 " Base" AnyExceptNewline
          Markup@14..15 "\n" Any
        "#);
    }

    #[test]
    fn reserved_word_is_an_error() {
        let tree = parse("@class");
        let kinds: Vec<_> = tree
            .children(tree.root())
            .iter()
            .filter_map(|&id| tree.block(id).map(|b| (b.kind, b.name.clone())))
            .collect();
        assert_eq!(kinds, vec![(BlockKind::Statement, Some("class".to_string()))]);
        assert_eq!(tree.diagnostics().len(), 1);
    }

    #[rstest]
    #[case::email("user@example.com")]
    #[case::escaped("@@name")]
    fn at_that_stays_markup(#[case] input: &str) {
        let tree = parse(input);
        assert_eq!(tree.leaves().len(), 1);
        assert_eq!(tree.span(tree.leaves()[0]).map(|s| s.kind), Some(SpanKind::Markup));
    }

    #[rstest]
    #[case::empty("")]
    #[case::plain("just text\r\nand more")]
    #[case::expressions("<p>@Model.Name[0].Trim()</p>")]
    #[case::code_block("@{ var s = \"}\"; <p>@s</p> }")]
    #[case::if_else("@if (x) { a(); } else { <i>no</i> }")]
    #[case::do_while("@do { i++; } while (i < 3);")]
    #[case::using_namespace("@using System.Text\n<p></p>")]
    #[case::section("@section Scripts { <script>@x</script> }")]
    #[case::functions("@functions { int Add(int a) { return a; } }")]
    #[case::markup_line("@{ @: hello @name\n }")]
    #[case::html_comment("<!-- @x -->")]
    #[case::unterminated_tag("<p class=\"a")]
    #[case::unterminated_comment("@* never closed")]
    #[case::unicode("<p>héllo @naïve wörld</p>")]
    #[case::attribute_expression("<a href=\"@url\">x</a>")]
    fn parse_is_lossless(#[case] input: &str) {
        let tree = parse(input);
        assert_eq!(tree.text(), input);

        let mut offset = 0;
        for (_, span) in tree.spans() {
            assert_eq!(span.start, offset);
            offset += span.len();
        }
        assert_eq!(offset, input.len());
    }
}
