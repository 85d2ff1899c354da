//! # Editor Parser
//!
//! The entry point an editor talks to. Every keystroke arrives as a
//! [`TextChange`] plus the snapshot it produced:
//!
//! 1. If no background parse is pending, the change is offered to the span
//!    that owns it. An accepted change patches the current tree in place and
//!    the caller gets an answer immediately.
//! 2. Anything else is queued for a full parse on the worker thread. The new
//!    tree arrives later through [`EditorParser::subscribe`].
//!
//! ```no_run
//! use razor_editor_engine::{DocumentSnapshot, EditorParser, TextChange};
//!
//! let mut parser = EditorParser::builder("Views/Index.cshtml").build()?;
//! let updates = parser.subscribe()?;
//!
//! let change = TextChange::insertion(0, "foo @bar");
//! parser.check_for_structure_changes(&change, DocumentSnapshot::new(1, "foo @bar"))?;
//! let first = updates.recv()?;
//!
//! let change = TextChange::insertion(8, "b");
//! let result = parser.check_for_structure_changes(&change, DocumentSnapshot::new(2, "foo @barb"))?;
//! assert!(result.is_accepted());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Provisional Edits
//!
//! After a provisional result only the span that produced it may accept
//! further edits. An edit elsewhere clears the flag and goes to the full
//! parser, so an ambiguous `@foo.` is settled before anything else is patched.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use log::{debug, trace};
use parking_lot::Mutex;
use razor_editor_syntax::SyntaxTree;

use crate::acceptor::{ParseResult, try_accept};
use crate::classify::{Located, classify, classify_for};
use crate::error::EditorError;
use crate::patch::apply_local_edit;
use crate::scheduler::{
    BackgroundParser, DocumentParseComplete, ParserState, StaticTagHelpers, TagHelperResolver,
};
use crate::text::{DocumentSnapshot, TextChange, validate_change};

/// Quiet period before a queued full parse starts.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

pub struct EditorParserBuilder {
    file_path: PathBuf,
    debounce: Duration,
    resolver: Arc<dyn TagHelperResolver>,
}

impl EditorParserBuilder {
    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn tag_helpers(mut self, resolver: Arc<dyn TagHelperResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn build(self) -> Result<EditorParser, EditorError> {
        if self.file_path.as_os_str().is_empty() {
            return Err(EditorError::EmptyFilePath);
        }
        let state = Arc::new(Mutex::new(ParserState::default()));
        let name = self
            .file_path
            .file_name()
            .map_or_else(|| self.file_path.to_string_lossy(), |n| n.to_string_lossy());
        let background =
            BackgroundParser::spawn(&name, Arc::clone(&state), self.resolver, self.debounce)?;
        debug!("editor parser started for {}", self.file_path.display());
        Ok(EditorParser {
            file_path: self.file_path,
            state,
            background,
            snapshot: None,
            disposed: false,
        })
    }
}

/// Incremental parser for one open document.
pub struct EditorParser {
    file_path: PathBuf,
    state: Arc<Mutex<ParserState>>,
    background: BackgroundParser,
    /// Snapshot the last change produced.
    snapshot: Option<DocumentSnapshot>,
    disposed: bool,
}

impl EditorParser {
    pub fn builder(file_path: impl Into<PathBuf>) -> EditorParserBuilder {
        EditorParserBuilder {
            file_path: file_path.into(),
            debounce: DEFAULT_DEBOUNCE,
            resolver: Arc::new(StaticTagHelpers::empty()),
        }
    }

    /// Offer an edit. Accepted edits are already applied to
    /// [`current_tree`](Self::current_tree) when this returns; rejected edits
    /// have been queued for a full parse.
    pub fn check_for_structure_changes(
        &mut self,
        change: &TextChange,
        snapshot: DocumentSnapshot,
    ) -> Result<ParseResult, EditorError> {
        if self.disposed {
            return Err(EditorError::Disposed);
        }
        validate_change(change, self.snapshot.as_ref(), &snapshot)?;
        let change = match &self.snapshot {
            Some(previous) => change.normalize(&previous.text),
            None => change.clone(),
        };

        let idle = self.background.is_idle();
        let (result, base) = if idle {
            let mut state = self.state.lock();
            let result = try_partial_parse(&mut state, &change);
            let base = if result.is_rejected() {
                state.tree.clone()
            } else {
                None
            };
            (result, base)
        } else {
            (ParseResult::rejected(), None)
        };

        if result.is_rejected() {
            self.background.submit(snapshot.clone(), change.clone(), base);
        }
        debug!("{} {change}: {result}", self.file_path.display());
        self.snapshot = Some(snapshot);
        Ok(result)
    }

    /// A channel that receives every completed background parse.
    pub fn subscribe(&self) -> Result<Receiver<DocumentParseComplete>, EditorError> {
        if self.disposed {
            return Err(EditorError::Disposed);
        }
        Ok(self.background.subscribe())
    }

    /// Whether the last accepted edit was provisional.
    pub fn last_result_provisional(&self) -> bool {
        self.state.lock().last_result_provisional
    }

    /// Text to insert for the last edit that asked for auto-completion.
    pub fn auto_complete_string(&self) -> Option<String> {
        self.state.lock().last_auto_complete.clone()
    }

    /// The latest tree, including locally applied edits.
    pub fn current_tree(&self) -> Option<SyntaxTree> {
        self.state.lock().tree.clone()
    }

    pub fn parse_count(&self) -> u64 {
        self.background.parse_count()
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Stop the background parser. Later edits and subscriptions fail with
    /// [`EditorError::Disposed`].
    pub fn dispose(&mut self) -> Result<(), EditorError> {
        if self.disposed {
            return Err(EditorError::AlreadyDisposed);
        }
        self.disposed = true;
        self.background.shutdown();
        debug!("editor parser for {} disposed", self.file_path.display());
        Ok(())
    }
}

impl Drop for EditorParser {
    fn drop(&mut self) {
        if !self.disposed {
            let _ = self.dispose();
        }
    }
}

/// Offer `change` to the current tree. Called with the parser state locked
/// and no background parse pending.
fn try_partial_parse(state: &mut ParserState, change: &TextChange) -> ParseResult {
    let Some(tree) = state.tree.as_mut() else {
        return ParseResult::rejected();
    };

    let previous_owner = state.last_change_owner.and_then(|span| tree.resolve(span));
    let located = match previous_owner.map(|node| classify_for(tree, node, change)) {
        Some(Ok(located)) => located,
        _ if state.last_result_provisional => {
            trace!("edit {change} outside the provisional span");
            state.last_result_provisional = false;
            return ParseResult::rejected();
        }
        _ => match classify(tree, change) {
            Ok(located) => located,
            Err(error) => {
                trace!("edit {change} not classified: {error}");
                state.last_result_provisional = false;
                return ParseResult::rejected();
            }
        },
    };

    let mut result = try_accept(tree, &located, change);
    if result.is_accepted() && apply_local_edit(tree, located.span, change).is_err() {
        result = ParseResult::rejected();
    }
    state.last_auto_complete = auto_complete_for(tree, &located, result);
    state.last_change_owner = Some(located.span);
    state.last_result_provisional = result.is_provisional();
    result
}

fn auto_complete_for(tree: &SyntaxTree, located: &Located, result: ParseResult) -> Option<String> {
    if !result.is_auto_complete_block() {
        return None;
    }
    tree.span(located.node)
        .and_then(|span| span.auto_complete.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_path_is_refused() {
        let result = EditorParser::builder("").build();
        assert!(matches!(result, Err(EditorError::EmptyFilePath)));
    }

    #[test]
    fn first_edit_always_goes_to_the_background_parser() {
        let mut parser = EditorParser::builder("a.cshtml").build().unwrap();
        let change = TextChange::insertion(0, "foo");
        let result = parser
            .check_for_structure_changes(&change, DocumentSnapshot::new(1, "foo"))
            .unwrap();
        assert_eq!(result, ParseResult::rejected());
    }

    #[test]
    fn change_that_does_not_match_the_snapshot_is_an_error() {
        let mut parser = EditorParser::builder("a.cshtml").build().unwrap();
        let change = TextChange::insertion(0, "foo");
        let result = parser.check_for_structure_changes(&change, DocumentSnapshot::new(1, "bar"));
        assert!(matches!(result, Err(EditorError::SnapshotMismatch { .. })));
    }

    #[test]
    fn disposal_is_one_shot() {
        let mut parser = EditorParser::builder("a.cshtml").build().unwrap();
        parser.dispose().unwrap();
        assert!(matches!(parser.dispose(), Err(EditorError::AlreadyDisposed)));
        assert!(matches!(parser.subscribe(), Err(EditorError::Disposed)));
        let change = TextChange::insertion(0, "x");
        let result = parser.check_for_structure_changes(&change, DocumentSnapshot::new(1, "x"));
        assert!(matches!(result, Err(EditorError::Disposed)));
        assert_eq!(parser.file_path(), Path::new("a.cshtml"));
        assert!(!parser.last_result_provisional());
    }
}
