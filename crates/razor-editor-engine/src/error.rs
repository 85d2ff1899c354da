use std::io;

/// Precondition failures of the editor parser.
///
/// Rejected edits are not errors: they are a [`crate::ParseResult`]. These
/// variants describe callers breaking the contract.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("file path must not be empty")]
    EmptyFilePath,
    #[error("change {index}+{removed} is outside a document of length {len}")]
    ChangeOutOfRange {
        index: usize,
        removed: usize,
        len: usize,
    },
    #[error("snapshot does not match the change: expected {expected}, found {actual}")]
    SnapshotMismatch { expected: String, actual: String },
    #[error("offset {0} is not on a character boundary")]
    NotCharBoundary(usize),
    #[error("editor parser has been disposed")]
    Disposed,
    #[error("editor parser was already disposed")]
    AlreadyDisposed,
    #[error("failed to start the background parser: {0}")]
    Spawn(#[from] io::Error),
}
