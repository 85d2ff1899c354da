//! # Background Parser
//!
//! Full reparses run on a dedicated worker thread. Edits the acceptor rejects
//! are queued here; the worker waits until no new edit has arrived for the
//! debounce interval, parses the latest snapshot once, and publishes the tree.
//!
//! ```text
//!   submit ──► Scheduled ──(debounce elapsed)──► Running ──► Idle
//!                  ▲                                │
//!                  └──────── submit while running ──┘
//! ```
//!
//! Edits that arrive while a parse is running are coalesced into the next
//! job. Only the newest snapshot is ever parsed; intermediate snapshots are
//! dropped.
//!
//! The worker shares one lock with the editor, [`ParserState`], which holds
//! the current tree. It never holds that lock and its own scheduling lock at
//! the same time.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use parking_lot::{Condvar, Mutex};
use razor_editor_syntax::{SpanRef, SyntaxTree, TagHelperDescriptor, parse_with_tag_helpers};

use crate::equivalence::trees_are_different;
use crate::error::EditorError;
use crate::text::{DocumentSnapshot, TextChange};

/// Supplies the tag helpers in scope for a document.
pub trait TagHelperResolver: Send + Sync {
    fn tag_helpers(&self, snapshot: &DocumentSnapshot) -> Arc<[TagHelperDescriptor]>;
}

/// A fixed descriptor set, independent of the document.
#[derive(Debug, Clone)]
pub struct StaticTagHelpers {
    descriptors: Arc<[TagHelperDescriptor]>,
}

impl StaticTagHelpers {
    pub fn new(descriptors: impl Into<Arc<[TagHelperDescriptor]>>) -> Self {
        Self {
            descriptors: descriptors.into(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl TagHelperResolver for StaticTagHelpers {
    fn tag_helpers(&self, _snapshot: &DocumentSnapshot) -> Arc<[TagHelperDescriptor]> {
        Arc::clone(&self.descriptors)
    }
}

/// Published after every background parse.
#[derive(Debug, Clone)]
pub struct DocumentParseComplete {
    pub tree: Arc<SyntaxTree>,
    /// Version of the snapshot that was parsed.
    pub snapshot_version: u64,
    /// The most recent edit folded into this parse.
    pub change: TextChange,
    /// False when the new tree only differs from the previous one by span
    /// text, i.e. the edits could have been applied in place.
    pub tree_structure_changed: bool,
}

/// Tree and partial-parse bookkeeping shared by the editor and the worker.
#[derive(Debug, Default)]
pub struct ParserState {
    pub tree: Option<SyntaxTree>,
    pub last_result_provisional: bool,
    /// Span that owned the last locally handled edit.
    pub last_change_owner: Option<SpanRef>,
    pub last_auto_complete: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Idle,
    Scheduled,
    Running,
}

struct PendingParse {
    snapshot: DocumentSnapshot,
    changes: Vec<TextChange>,
    /// Tree the changes were made against, when it was current at submit time.
    base: Option<SyntaxTree>,
    deadline: Instant,
}

struct SchedulerState {
    status: Status,
    pending: Option<PendingParse>,
    subscribers: Vec<mpsc::Sender<DocumentParseComplete>>,
    parse_count: u64,
    shutdown: bool,
}

struct Shared {
    state: Mutex<SchedulerState>,
    wake: Condvar,
    parser_state: Arc<Mutex<ParserState>>,
    resolver: Arc<dyn TagHelperResolver>,
    debounce: Duration,
}

/// Owner of the background parse thread.
pub struct BackgroundParser {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl BackgroundParser {
    pub fn spawn(
        name: &str,
        parser_state: Arc<Mutex<ParserState>>,
        resolver: Arc<dyn TagHelperResolver>,
        debounce: Duration,
    ) -> Result<Self, EditorError> {
        let shared = Arc::new(Shared {
            state: Mutex::new(SchedulerState {
                status: Status::Idle,
                pending: None,
                subscribers: Vec::new(),
                parse_count: 0,
                shutdown: false,
            }),
            wake: Condvar::new(),
            parser_state,
            resolver,
            debounce,
        });
        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::Builder::new()
            .name(format!("razor-parse:{name}"))
            .spawn(move || run(&worker_shared))?;
        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    /// Queue a full parse of `snapshot`. `base` is the tree `change` was
    /// made against; it is only kept when nothing is queued or running.
    pub fn submit(&self, snapshot: DocumentSnapshot, change: TextChange, base: Option<SyntaxTree>) {
        let mut state = self.shared.state.lock();
        let deadline = Instant::now() + self.shared.debounce;
        match state.pending.as_mut() {
            Some(pending) => {
                pending.snapshot = snapshot;
                pending.changes.push(change);
                pending.deadline = deadline;
            }
            None => {
                let base = if state.status == Status::Idle { base } else { None };
                state.pending = Some(PendingParse {
                    snapshot,
                    changes: vec![change],
                    base,
                    deadline,
                });
            }
        }
        if state.status == Status::Idle {
            state.status = Status::Scheduled;
        }
        debug!("background parse scheduled ({:?})", state.status);
        self.shared.wake.notify_all();
    }

    /// No parse queued or running.
    pub fn is_idle(&self) -> bool {
        self.shared.state.lock().status == Status::Idle
    }

    pub fn subscribe(&self) -> mpsc::Receiver<DocumentParseComplete> {
        let (tx, rx) = mpsc::channel();
        self.shared.state.lock().subscribers.push(tx);
        rx
    }

    /// Full parses completed so far.
    pub fn parse_count(&self) -> u64 {
        self.shared.state.lock().parse_count
    }

    /// Stop the worker and wait for it. Queued work is dropped and no
    /// further notifications are sent.
    pub fn shutdown(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            state.pending = None;
            state.subscribers.clear();
        }
        self.shared.wake.notify_all();
        let Some(worker) = self.worker.take() else {
            return;
        };
        if worker.join().is_err() {
            warn!("background parser thread panicked");
        }
    }
}

impl Drop for BackgroundParser {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(shared: &Shared) {
    while let Some(job) = next_job(shared) {
        let started = Instant::now();
        let descriptors = shared.resolver.tag_helpers(&job.snapshot);
        let tree = parse_with_tag_helpers(&job.snapshot.contents(), &descriptors);

        let changed = match &job.base {
            Some(base) => trees_are_different(base, &tree, &job.changes),
            None => true,
        };
        let tree = Arc::new(tree);

        {
            let mut parser_state = shared.parser_state.lock();
            parser_state.tree = Some(SyntaxTree::clone(&tree));
            parser_state.last_result_provisional = false;
            parser_state.last_change_owner = None;
        }

        let mut state = shared.state.lock();
        state.parse_count += 1;
        state.status = if state.pending.is_some() {
            Status::Scheduled
        } else {
            Status::Idle
        };
        info!(
            "parsed version {} in {:?} ({} edits, structure changed: {changed})",
            job.snapshot.version,
            started.elapsed(),
            job.changes.len()
        );
        if state.shutdown {
            return;
        }
        let Some(change) = job.changes.last().cloned() else {
            continue;
        };
        let event = DocumentParseComplete {
            tree,
            snapshot_version: job.snapshot.version,
            change,
            tree_structure_changed: changed,
        };
        state
            .subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
    debug!("background parser stopped");
}

/// Block until a job's debounce deadline passes. `None` on shutdown.
fn next_job(shared: &Shared) -> Option<PendingParse> {
    let mut state = shared.state.lock();
    loop {
        if state.shutdown {
            return None;
        }
        match state.pending.as_ref().map(|pending| pending.deadline) {
            None => shared.wake.wait(&mut state),
            Some(deadline) if Instant::now() >= deadline => {
                state.status = Status::Running;
                return state.pending.take();
            }
            Some(deadline) => {
                shared.wake.wait_until(&mut state, deadline);
            }
        }
    }
}
