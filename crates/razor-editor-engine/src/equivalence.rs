//! Structural comparison of syntax trees.
//!
//! The background parser uses this to tell subscribers whether a fresh parse
//! changed the tree's shape, or merely the text inside existing spans.

use razor_editor_syntax::{NodeData, NodeId, SyntaxTree};

use crate::classify::find_owner;
use crate::patch::apply_local_edit;
use crate::text::TextChange;

/// Whether `modified` differs in structure from `original` with `changes`
/// applied span by span.
///
/// A change that no single span of the original owns cannot be applied
/// locally, so the trees count as different.
pub fn trees_are_different(
    original: &SyntaxTree,
    modified: &SyntaxTree,
    changes: &[TextChange],
) -> bool {
    let mut patched = original.clone();
    for change in changes {
        let Some(owner) = find_owner(&patched, change) else {
            return true;
        };
        let applied = patched
            .span_ref(owner)
            .is_some_and(|span| apply_local_edit(&mut patched, span, change).is_ok());
        if !applied {
            return true;
        }
    }
    !equivalent(&patched, modified)
}

/// Same blocks, same spans, same span metadata.
pub fn equivalent(left: &SyntaxTree, right: &SyntaxTree) -> bool {
    nodes_equivalent(left, left.root(), right, right.root())
}

fn nodes_equivalent(left: &SyntaxTree, l: NodeId, right: &SyntaxTree, r: NodeId) -> bool {
    match (&left.node(l).data, &right.node(r).data) {
        (NodeData::Block(a), NodeData::Block(b)) => {
            a.kind == b.kind
                && a.name == b.name
                && a.children.len() == b.children.len()
                && a.children
                    .iter()
                    .zip(&b.children)
                    .all(|(&ca, &cb)| nodes_equivalent(left, ca, right, cb))
        }
        (NodeData::Span(a), NodeData::Span(b)) => {
            a.kind == b.kind
                && a.start == b.start
                && a.content == b.content
                && a.accepts == b.accepts
                && a.edit_handler == b.edit_handler
                && a.auto_complete == b.auto_complete
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use razor_editor_syntax::{TagHelperDescriptor, parse, parse_with_tag_helpers};
    use rstest::rstest;

    #[test]
    fn same_source_is_equivalent() {
        assert!(equivalent(&parse("foo @bar baz"), &parse("foo @bar baz")));
        assert!(!equivalent(&parse("foo @bar baz"), &parse("foo @bar  baz")));
    }

    #[test]
    fn typing_a_keyword_changes_structure() {
        let original = parse("<p>@</p>");
        let modified = parse("<p>@if</p>");
        let changes = [TextChange::insertion(4, "if")];
        assert!(trees_are_different(&original, &modified, &changes));
    }

    #[test]
    fn growing_an_identifier_keeps_structure() {
        let original = parse("<p>@f</p>");
        let modified = parse("<p>@foo</p>");
        let changes = [TextChange::insertion(5, "oo")];
        assert!(!trees_are_different(&original, &modified, &changes));
    }

    #[test]
    fn several_changes_are_applied_in_order() {
        let original = parse("foo @b baz");
        let modified = parse("foo @bar baz");
        let changes = [TextChange::insertion(6, "a"), TextChange::insertion(7, "r")];
        assert!(!trees_are_different(&original, &modified, &changes));
    }

    #[test]
    fn change_without_an_owner_is_different() {
        let original = parse("Foo @bar Baz");
        let modified = parse("Foo @bap Daz");
        let changes = [TextChange::replacement(7, 3, "p D")];
        assert!(trees_are_different(&original, &modified, &changes));
    }

    #[rstest]
    #[case::space(" ")]
    #[case::crlf("\r\n")]
    #[case::word("abcdefg")]
    #[case::mixed("\u{c}\r\n abcd   \t")]
    fn text_added_inside_tag_helper_keeps_structure(#[case] inserted: &str) {
        let helpers = [TagHelperDescriptor::new("div", "DivTagHelper")];
        let source = "<p><div>\n\n</div></p>";
        let original = parse_with_tag_helpers(source, &helpers);
        let mut edited = source.to_string();
        edited.insert_str(9, inserted);
        let modified = parse_with_tag_helpers(&edited, &helpers);
        let changes = [TextChange::insertion(9, inserted)];
        assert!(!trees_are_different(&original, &modified, &changes));
    }
}
