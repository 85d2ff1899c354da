//! Applying an accepted edit to the tree in place.
//!
//! Only the owning span's content changes; every later span shifts by the
//! length delta. No nodes are created or removed, so node ids and
//! [`SpanRef`] handles stay valid.

use razor_editor_syntax::{SpanRef, SyntaxTree};

use crate::text::TextChange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    #[error("span handle does not belong to this tree")]
    StaleSpan,
    #[error("change does not fit inside the span")]
    OutOfRange,
}

/// Apply `change` to the span `span` refers to and shift the spans after it.
pub fn apply_local_edit(
    tree: &mut SyntaxTree,
    span: SpanRef,
    change: &TextChange,
) -> Result<(), PatchError> {
    let node = tree.resolve(span).ok_or(PatchError::StaleSpan)?;
    let position = tree.leaf_position(node).ok_or(PatchError::StaleSpan)?;
    let target = tree.span_mut(node).ok_or(PatchError::StaleSpan)?;

    let relative = change
        .absolute_index
        .checked_sub(target.start)
        .ok_or(PatchError::OutOfRange)?;
    let removed_end = relative + change.removed_length;
    if removed_end > target.content.len()
        || !target.content.is_char_boundary(relative)
        || !target.content.is_char_boundary(removed_end)
    {
        return Err(PatchError::OutOfRange);
    }
    target
        .content
        .replace_range(relative..removed_end, &change.inserted_text);
    if target.auto_complete.as_deref() == Some(change.inserted_text.as_str()) {
        target.auto_complete = None;
    }

    let delta = change.length_delta();
    if delta != 0 {
        for i in position + 1..tree.leaves().len() {
            let id = tree.leaves()[i];
            if let Some(later) = tree.span_mut(id) {
                later.start = later
                    .start
                    .checked_add_signed(delta)
                    .ok_or(PatchError::OutOfRange)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::find_owner;
    use pretty_assertions::assert_eq;
    use razor_editor_syntax::parse;

    fn patched(source: &str, change: TextChange) -> SyntaxTree {
        let mut tree = parse(source);
        let owner = find_owner(&tree, &change).unwrap();
        let span = tree.span_ref(owner).unwrap();
        apply_local_edit(&mut tree, span, &change).unwrap();
        tree
    }

    fn starts(tree: &SyntaxTree) -> Vec<(usize, String)> {
        tree.spans()
            .map(|(_, span)| (span.start, span.content.clone()))
            .collect()
    }

    #[test]
    fn insertion_shifts_following_spans() {
        let tree = patched("foo @foo bar", TextChange::insertion(8, "."));
        assert_eq!(tree.text(), "foo @foo. bar");
        assert_eq!(
            starts(&tree),
            vec![
                (0, "foo ".to_string()),
                (4, "@".to_string()),
                (5, "foo.".to_string()),
                (9, " bar".to_string()),
            ]
        );
    }

    #[test]
    fn deletion_shifts_back() {
        let tree = patched("foo @User.Name baz", TextChange::deletion(10, 4));
        assert_eq!(tree.text(), "foo @User. baz");
        let last = tree.spans().last().map(|(_, s)| s.start);
        assert_eq!(last, Some(10));
    }

    #[test]
    fn handles_from_other_trees_are_stale() {
        let other = parse("foo @bar");
        let mut tree = parse("foo @bar");
        let span = other.span_ref(other.leaves()[2]).unwrap();
        let result = apply_local_edit(&mut tree, span, &TextChange::insertion(8, "x"));
        assert_eq!(result, Err(PatchError::StaleSpan));
    }

    #[test]
    fn change_outside_span_is_refused() {
        let mut tree = parse("foo @bar baz");
        let span = tree.span_ref(tree.leaves()[2]).unwrap();
        let result = apply_local_edit(&mut tree, span, &TextChange::deletion(7, 3));
        assert_eq!(result, Err(PatchError::OutOfRange));
        assert_eq!(tree.text(), "foo @bar baz");
    }

    #[test]
    fn typing_the_auto_complete_text_clears_it() {
        let mut tree = parse("@{ var x = 1;");
        let (id, _) = tree
            .spans()
            .find(|(_, s)| s.auto_complete.is_some())
            .unwrap();
        let span = tree.span_ref(id).unwrap();
        apply_local_edit(&mut tree, span, &TextChange::insertion(13, "}")).unwrap();
        assert_eq!(tree.span(id).unwrap().auto_complete, None);
    }
}
