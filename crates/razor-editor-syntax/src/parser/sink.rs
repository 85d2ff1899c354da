//! Sink for converting parser events into the arena [`SyntaxTree`].

use crate::lexer::Token;
use crate::parser::event::Event;
use crate::tree::{Block, Diagnostic, Node, NodeData, NodeId, Span, SyntaxTree};

/// Converts parser events and tokens into a [`SyntaxTree`].
pub struct Sink<'t, 'input> {
    tokens: &'t [Token<'input>],
    cursor: usize,
    offset: usize,
    events: Vec<Event>,
    nodes: Vec<Node>,
    stack: Vec<NodeId>,
}

impl<'t, 'input> Sink<'t, 'input> {
    /// Create a new sink.
    pub fn new(tokens: &'t [Token<'input>], events: Vec<Event>) -> Self {
        Self {
            tokens,
            cursor: 0,
            offset: 0,
            events,
            nodes: Vec::new(),
            stack: Vec::new(),
        }
    }

    /// Consume the sink and build the tree.
    pub fn finish(mut self, diagnostics: Vec<Diagnostic>) -> SyntaxTree {
        let mut forward_parents = Vec::new();

        for i in 0..self.events.len() {
            match std::mem::replace(&mut self.events[i], Event::Placeholder) {
                Event::Start {
                    kind,
                    name,
                    forward_parent,
                } => {
                    forward_parents.push((kind, name));
                    let mut fp = forward_parent;

                    while let Some(parent_idx) = fp {
                        match std::mem::replace(&mut self.events[parent_idx], Event::Placeholder) {
                            Event::Start {
                                kind,
                                name,
                                forward_parent,
                            } => {
                                fp = forward_parent;
                                forward_parents.push((kind, name));
                            }
                            _ => unreachable!(),
                        }
                    }

                    // Open outermost first
                    for (kind, name) in forward_parents.drain(..).rev() {
                        let id = self.push(NodeData::Block(Block {
                            kind,
                            name,
                            children: Vec::new(),
                        }));
                        self.stack.push(id);
                    }
                }
                Event::Span { meta, n_raw_tokens } => {
                    let start = self.cursor;
                    self.cursor += n_raw_tokens;
                    let content: String = self.tokens[start..self.cursor]
                        .iter()
                        .map(|t| t.text)
                        .collect();
                    let span_start = self.offset;
                    self.offset += content.len();
                    self.push(NodeData::Span(Span {
                        kind: meta.kind,
                        start: span_start,
                        content,
                        accepts: meta.accepts,
                        edit_handler: meta.edit_handler,
                        auto_complete: meta.auto_complete,
                    }));
                }
                Event::Finish => {
                    self.stack.pop();
                }
                Event::Placeholder => {}
            }
        }

        SyntaxTree::from_parts(self.nodes, NodeId::new(0), diagnostics)
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        let parent = self.stack.last().copied();
        if let Some(parent) = parent
            && let NodeData::Block(block) = &mut self.nodes[parent.index()].data
        {
            block.children.push(id);
        }
        self.nodes.push(Node { parent, data });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::event::SpanMeta;
    use crate::tree::{AcceptedCharacters, BlockKind, EditHandler, SpanKind};
    use pretty_assertions::assert_eq;

    fn span(kind: SpanKind, n_raw_tokens: usize) -> Event {
        Event::Span {
            meta: SpanMeta::new(kind, AcceptedCharacters::Any, EditHandler::Default),
            n_raw_tokens,
        }
    }

    #[test]
    fn sink_builds_nested_blocks_with_offsets() {
        let tokens = lex("a @b");
        let events = vec![
            Event::start(BlockKind::Markup),
            span(SpanKind::Markup, 2),
            Event::start(BlockKind::Expression),
            span(SpanKind::Transition, 1),
            span(SpanKind::Code, 1),
            Event::Finish,
            Event::Finish,
        ];

        let tree = Sink::new(&tokens, events).finish(Vec::new());

        assert_eq!(tree.text(), "a @b");
        let root = tree.root();
        assert_eq!(tree.children(root).len(), 2);
        let code = tree.leaves()[2];
        assert_eq!(tree.span(code).map(|s| s.start), Some(3));
        assert_eq!(tree.parent(code), Some(tree.children(root)[1]));
    }

    #[test]
    fn sink_keeps_zero_length_spans() {
        let tokens = lex("@x");
        let events = vec![
            Event::start(BlockKind::Markup),
            span(SpanKind::Markup, 0),
            span(SpanKind::Transition, 1),
            span(SpanKind::Markup, 1),
            Event::Finish,
        ];

        let tree = Sink::new(&tokens, events).finish(Vec::new());

        assert_eq!(tree.leaves().len(), 3);
        assert_eq!(tree.span(tree.leaves()[0]).map(|s| s.is_empty()), Some(true));
    }
}
