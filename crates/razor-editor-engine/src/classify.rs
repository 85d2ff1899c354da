//! # Change Classifier
//!
//! Finds the one span that owns an edit and describes the edit's shape.
//!
//! ## Ownership
//!
//! A span owns a change when the change starts inside it and ends before its
//! end. A change ending exactly at the span's end is owned only if the span
//! accepts characters at all, so typing right after `@` lands in the
//! following code span rather than in the transition:
//!
//! ```text
//! foo @|bar        insertion at 5
//!     ^ Transition 4..5 accepts None, does not own
//!      ^^^ Code 5..8 owns
//! ```
//!
//! Zero-length spans own insertions at their position. When several spans
//! qualify the first one in document order wins.

use log::trace;
use razor_editor_syntax::keywords::is_identifier;
use razor_editor_syntax::{AcceptedCharacters, NodeId, Span, SpanRef, SyntaxTree};

use crate::text::TextChange;

/// Facts about an edit relative to its owning span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditFacts {
    /// The edit ends at the span's end
    pub at_trailing_edge: bool,
    /// Exactly one character is inserted
    pub single_char: bool,
    pub inserted_is_identifier: bool,
    pub removed_is_identifier: bool,
    pub inserted_is_dot: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditShape {
    PureInsertion(EditFacts),
    PureDeletion(EditFacts),
    Replacement(EditFacts),
}

impl EditShape {
    pub fn facts(&self) -> &EditFacts {
        match self {
            EditShape::PureInsertion(facts)
            | EditShape::PureDeletion(facts)
            | EditShape::Replacement(facts) => facts,
        }
    }
}

/// The owner of a change and the change's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located {
    pub span: SpanRef,
    pub node: NodeId,
    pub shape: EditShape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    #[error("change crosses a span boundary")]
    SpansOverlap,
    #[error("no span owns the change")]
    NoOwner,
    #[error("change neither removes nor inserts text")]
    EmptyChange,
}

pub fn owns_change(span: &Span, change: &TextChange) -> bool {
    let old_end = change.old_end();
    change.absolute_index >= span.start
        && (old_end < span.end()
            || (old_end == span.end() && span.accepts != AcceptedCharacters::None))
}

/// The first leaf, in document order, that owns `change`.
pub fn find_owner(tree: &SyntaxTree, change: &TextChange) -> Option<NodeId> {
    let leaves = tree.leaves();
    // Spans ending before the change cannot own it
    let first = leaves.partition_point(|&id| {
        tree.span(id)
            .is_some_and(|span| span.end() < change.absolute_index)
    });
    leaves[first..]
        .iter()
        .copied()
        .take_while(|&id| {
            tree.span(id)
                .is_some_and(|span| span.start <= change.absolute_index)
        })
        .find(|&id| tree.span(id).is_some_and(|span| owns_change(span, change)))
}

/// Locate the owner of `change` anywhere in the tree.
pub fn classify(tree: &SyntaxTree, change: &TextChange) -> Result<Located, ClassifyError> {
    if change.is_empty() {
        return Err(ClassifyError::EmptyChange);
    }
    match find_owner(tree, change) {
        Some(node) => classify_for(tree, node, change),
        None if change.old_end() <= tree.len() => {
            trace!("change {change} crosses a span boundary");
            Err(ClassifyError::SpansOverlap)
        }
        None => Err(ClassifyError::NoOwner),
    }
}

/// Classify `change` against a specific span, failing if that span does not
/// own it.
pub fn classify_for(
    tree: &SyntaxTree,
    node: NodeId,
    change: &TextChange,
) -> Result<Located, ClassifyError> {
    if change.is_empty() {
        return Err(ClassifyError::EmptyChange);
    }
    let (Some(span), Some(span_ref)) = (tree.span(node), tree.span_ref(node)) else {
        return Err(ClassifyError::NoOwner);
    };
    if !owns_change(span, change) {
        trace!("{node:?} does not own change {change}");
        return Err(ClassifyError::NoOwner);
    }

    let relative = change.absolute_index - span.start;
    let removed = change.removed_text(&span.content, relative).unwrap_or("");
    let inserted = change.inserted_text.as_str();
    let facts = EditFacts {
        at_trailing_edge: change.old_end() == span.end(),
        single_char: inserted.chars().count() == 1,
        inserted_is_identifier: is_identifier(inserted, false),
        removed_is_identifier: is_identifier(removed, false),
        inserted_is_dot: inserted == ".",
    };
    let shape = if change.is_insert() {
        EditShape::PureInsertion(facts)
    } else if change.is_delete() {
        EditShape::PureDeletion(facts)
    } else {
        EditShape::Replacement(facts)
    };

    trace!("{node:?} owns change {change} as {shape:?}");
    Ok(Located {
        span: span_ref,
        node,
        shape,
    })
}
