//! # Span Tree
//!
//! The parser produces a tree of [`Block`]s (interior nodes) and [`Span`]s
//! (leaves). Unlike a rowan green tree this one is **mutable**: the editor
//! patches span contents in place when an edit can be absorbed locally, so
//! the tree is an arena rather than a persistent structure.
//!
//! ## Arena Layout
//!
//! ```text
//! nodes: [Markup, Markup span "foo ", Expression, Transition "@", Code "bar"]
//!          ^0       ^1                  ^2          ^3               ^4
//! leaves: [1, 3, 4]
//! ```
//!
//! - Nodes are created in pre-order, so leaf ids increase in document order
//!   and the cached leaf list can be binary searched.
//! - Children are owned `Vec<NodeId>` fields on the parent block.
//! - Parent links are plain indices used only for navigation.
//!
//! ## Handles Across Reparses
//!
//! Every tree gets a process-unique [`TreeId`]. A [`SpanRef`] remembers the
//! tree it came from, so a handle taken before a background reparse replaced
//! the tree resolves to `None` instead of to an unrelated span.
//!
//! ## Well-Formedness
//!
//! Concatenating every leaf's content (zero-length spans included) gives back
//! the document text exactly. Span starts are absolute byte offsets and are
//! kept in sync with the contents by whoever mutates the tree.

use std::fmt::Write;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one parse result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeId(u64);

impl TreeId {
    fn next() -> Self {
        TreeId(NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Index of a node inside its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        NodeId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A span handle that is only valid for the tree that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanRef {
    tree: TreeId,
    node: NodeId,
}

impl SpanRef {
    pub fn tree(&self) -> TreeId {
        self.tree
    }

    pub fn node(&self) -> NodeId {
        self.node
    }
}

/// Semantic kind of an interior node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Document root, markup sections inside code, section bodies
    Markup,
    /// A single HTML start or end tag
    Tag,
    /// An element claimed by a tag helper: start tag, children, end tag
    TagHelper,
    /// `@expr` or `@(expr)`
    Expression,
    /// `@{ }` or a keyword statement such as `@if (...) { }`
    Statement,
    /// `@section`, `@inherits`, `@functions`, `@addTagHelper`, ...
    Directive,
    /// `@* ... *@`
    Comment,
}

/// Content classification of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    Markup,
    Code,
    /// The `@` that switches between markup and code
    Transition,
    /// Razor punctuation and keywords: `{`, `}`, `(`, `)`, directive names
    MetaCode,
    Comment,
}

/// Which characters a span may absorb without a reparse.
///
/// Also decides whether a span owns an edit that touches its trailing edge:
/// `None` spans never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcceptedCharacters {
    None,
    WhiteSpace,
    NonWhiteSpace,
    AnyExceptNewline,
    Any,
}

/// Which partial-parse rule set applies to a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditHandler {
    /// Never locally editable
    Default,
    /// Plain markup text
    Markup,
    /// Code span of an implicit expression
    ImplicitExpression { accept_trailing_dot: bool },
    /// Code inside a `@{ }` statement block
    Statement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    /// Tag name, keyword or directive name where the kind has one.
    pub name: Option<String>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub kind: SpanKind,
    /// Absolute byte offset of the first byte of `content`.
    pub start: usize,
    pub content: String,
    pub accepts: AcceptedCharacters,
    pub edit_handler: EditHandler,
    /// Text an editor should insert to close the construct (e.g. `}`).
    pub auto_complete: Option<String>,
}

impl Span {
    pub fn end(&self) -> usize {
        self.start + self.content.len()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Block(Block),
    Span(Span),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub data: NodeData,
}

/// A recoverable problem found while parsing, e.g. an unterminated block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub offset: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct SyntaxTree {
    id: TreeId,
    nodes: Vec<Node>,
    root: NodeId,
    leaves: Vec<NodeId>,
    diagnostics: Vec<Diagnostic>,
}

impl SyntaxTree {
    pub(crate) fn from_parts(nodes: Vec<Node>, root: NodeId, diagnostics: Vec<Diagnostic>) -> Self {
        let leaves = nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| matches!(node.data, NodeData::Span(_)))
            .map(|(index, _)| NodeId::new(index))
            .collect();
        Self {
            id: TreeId::next(),
            nodes,
            root,
            leaves,
            diagnostics,
        }
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn block(&self, id: NodeId) -> Option<&Block> {
        match &self.nodes.get(id.index())?.data {
            NodeData::Block(block) => Some(block),
            NodeData::Span(_) => None,
        }
    }

    pub fn span(&self, id: NodeId) -> Option<&Span> {
        match &self.nodes.get(id.index())?.data {
            NodeData::Span(span) => Some(span),
            NodeData::Block(_) => None,
        }
    }

    pub fn span_mut(&mut self, id: NodeId) -> Option<&mut Span> {
        match &mut self.nodes.get_mut(id.index())?.data {
            NodeData::Span(span) => Some(span),
            NodeData::Block(_) => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.index())?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.block(id).map_or(&[], |block| block.children.as_slice())
    }

    /// Every span in document order.
    pub fn leaves(&self) -> &[NodeId] {
        &self.leaves
    }

    pub fn spans(&self) -> impl Iterator<Item = (NodeId, &Span)> + '_ {
        self.leaves
            .iter()
            .filter_map(|&id| self.span(id).map(|span| (id, span)))
    }

    /// Position of a span in the leaf list.
    pub fn leaf_position(&self, id: NodeId) -> Option<usize> {
        self.leaves.binary_search(&id).ok()
    }

    pub fn next_leaf(&self, id: NodeId) -> Option<NodeId> {
        let position = self.leaf_position(id)?;
        self.leaves.get(position + 1).copied()
    }

    pub fn prev_leaf(&self, id: NodeId) -> Option<NodeId> {
        let position = self.leaf_position(id)?;
        position
            .checked_sub(1)
            .and_then(|p| self.leaves.get(p).copied())
    }

    /// The node just before `id` under the same parent.
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let position = siblings.iter().position(|&child| child == id)?;
        position.checked_sub(1).map(|p| siblings[p])
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&current| self.parent(current))
    }

    pub fn span_ref(&self, id: NodeId) -> Option<SpanRef> {
        self.span(id).map(|_| SpanRef {
            tree: self.id,
            node: id,
        })
    }

    /// Resolve a handle taken from this tree; handles from other trees yield `None`.
    pub fn resolve(&self, span: SpanRef) -> Option<NodeId> {
        (span.tree == self.id && self.span(span.node).is_some()).then_some(span.node)
    }

    /// Byte range covered by a node.
    pub fn range(&self, id: NodeId) -> Range<usize> {
        match &self.node(id).data {
            NodeData::Span(span) => span.start..span.end(),
            NodeData::Block(block) => {
                let start = block.children.first().map(|&c| self.range(c).start);
                let end = block.children.last().map(|&c| self.range(c).end);
                match (start, end) {
                    (Some(start), Some(end)) => start..end,
                    _ => 0..0,
                }
            }
        }
    }

    /// The document text this tree describes.
    pub fn text(&self) -> String {
        self.spans().map(|(_, span)| span.content.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.spans().map(|(_, span)| span.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Indented debug rendering, one node per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_node(self.root, 0, &mut out);
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        let range = self.range(id);
        match &self.node(id).data {
            NodeData::Block(block) => {
                let _ = write!(out, "{indent}{:?}", block.kind);
                if let Some(name) = &block.name {
                    let _ = write!(out, "({name})");
                }
                let _ = writeln!(out, "@{}..{}", range.start, range.end);
                for &child in &block.children {
                    self.dump_node(child, depth + 1, out);
                }
            }
            NodeData::Span(span) => {
                let _ = write!(
                    out,
                    "{indent}{:?}@{}..{} {:?} {:?}",
                    span.kind, range.start, range.end, span.content, span.accepts
                );
                if let Some(auto_complete) = &span.auto_complete {
                    let _ = write!(out, " auto_complete={auto_complete:?}");
                }
                out.push('\n');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn span(kind: SpanKind, start: usize, content: &str) -> NodeData {
        NodeData::Span(Span {
            kind,
            start,
            content: content.to_string(),
            accepts: AcceptedCharacters::Any,
            edit_handler: EditHandler::Default,
            auto_complete: None,
        })
    }

    fn block(kind: BlockKind, children: &[usize]) -> NodeData {
        NodeData::Block(Block {
            kind,
            name: None,
            children: children.iter().map(|&i| NodeId::new(i)).collect(),
        })
    }

    fn sample() -> SyntaxTree {
        let root = NodeId::new(0);
        let expr = NodeId::new(2);
        let nodes = vec![
            Node {
                parent: None,
                data: block(BlockKind::Markup, &[1, 2]),
            },
            Node {
                parent: Some(root),
                data: span(SpanKind::Markup, 0, "foo "),
            },
            Node {
                parent: Some(root),
                data: block(BlockKind::Expression, &[3, 4]),
            },
            Node {
                parent: Some(expr),
                data: span(SpanKind::Transition, 4, "@"),
            },
            Node {
                parent: Some(expr),
                data: span(SpanKind::Code, 5, "bar"),
            },
        ];
        SyntaxTree::from_parts(nodes, root, Vec::new())
    }

    #[test]
    fn leaves_are_in_document_order() {
        let tree = sample();
        assert_eq!(tree.leaves(), &[NodeId::new(1), NodeId::new(3), NodeId::new(4)]);
        assert_eq!(tree.text(), "foo @bar");
        assert_eq!(tree.len(), 8);
    }

    #[test]
    fn navigation_between_leaves() {
        let tree = sample();
        assert_eq!(tree.next_leaf(NodeId::new(1)), Some(NodeId::new(3)));
        assert_eq!(tree.prev_leaf(NodeId::new(1)), None);
        assert_eq!(tree.prev_sibling(NodeId::new(2)), Some(NodeId::new(1)));
        let ancestors: Vec<_> = tree.ancestors(NodeId::new(4)).collect();
        assert_eq!(ancestors, vec![NodeId::new(2), NodeId::new(0)]);
        assert_eq!(tree.range(NodeId::new(2)), 4..8);
    }

    #[test]
    fn span_refs_do_not_resolve_against_other_trees() {
        let first = sample();
        let second = sample();
        let handle = first.span_ref(NodeId::new(4)).unwrap();
        assert_eq!(first.resolve(handle), Some(NodeId::new(4)));
        assert_eq!(second.resolve(handle), None);
        assert!(first.span_ref(NodeId::new(2)).is_none());
    }

    #[test]
    fn dump_renders_blocks_and_spans() {
        let tree = sample();
        insta::assert_snapshot!(tree.dump(), @r#"
        Markup@0..8
          Markup@0..4 "foo " Any
          Expression@4..8
            Transition@4..5 "@" Any
            Code@5..8 "bar" Any
        "#);
    }
}
