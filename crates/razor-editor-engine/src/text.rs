//! Text edits and the immutable document snapshots they connect.
//!
//! Offsets are UTF-8 byte offsets into the document. A [`TextChange`] is
//! described against the *old* snapshot; applying it yields the new one.

use std::borrow::Cow;
use std::fmt;

use xi_rope::delta::Builder;
use xi_rope::{Delta, Rope, RopeInfo};

use crate::EditorError;

/// A single edit: remove `removed_length` bytes at `absolute_index`, then
/// insert `inserted_text` there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    pub absolute_index: usize,
    pub removed_length: usize,
    pub inserted_text: String,
}

impl TextChange {
    pub fn new(absolute_index: usize, removed_length: usize, inserted_text: impl Into<String>) -> Self {
        Self {
            absolute_index,
            removed_length,
            inserted_text: inserted_text.into(),
        }
    }

    pub fn insertion(at: usize, text: impl Into<String>) -> Self {
        Self::new(at, 0, text)
    }

    pub fn deletion(at: usize, length: usize) -> Self {
        Self::new(at, length, "")
    }

    pub fn replacement(at: usize, length: usize, text: impl Into<String>) -> Self {
        Self::new(at, length, text)
    }

    pub fn is_insert(&self) -> bool {
        self.removed_length == 0 && !self.inserted_text.is_empty()
    }

    pub fn is_delete(&self) -> bool {
        self.removed_length > 0 && self.inserted_text.is_empty()
    }

    pub fn is_replace(&self) -> bool {
        self.removed_length > 0 && !self.inserted_text.is_empty()
    }

    /// Neither removes nor inserts anything.
    pub fn is_empty(&self) -> bool {
        self.removed_length == 0 && self.inserted_text.is_empty()
    }

    /// End of the removed range in the old text.
    pub fn old_end(&self) -> usize {
        self.absolute_index + self.removed_length
    }

    /// End of the inserted text in the new text.
    pub fn new_end(&self) -> usize {
        self.absolute_index + self.inserted_text.len()
    }

    /// Change in document length.
    pub fn length_delta(&self) -> isize {
        self.inserted_text.len() as isize - self.removed_length as isize
    }

    /// The removed text, read from `content` where the change starts at
    /// byte `relative`.
    pub fn removed_text<'a>(&self, content: &'a str, relative: usize) -> Option<&'a str> {
        content.get(relative..relative + self.removed_length)
    }

    /// `content` with this change applied at byte `relative`.
    ///
    /// Returns `None` if the change does not fit inside `content` or splits a
    /// character.
    pub fn edited_content(&self, content: &str, relative: usize) -> Option<String> {
        let before = content.get(..relative)?;
        let after = content.get(relative + self.removed_length..)?;
        let mut edited =
            String::with_capacity(before.len() + self.inserted_text.len() + after.len());
        edited.push_str(before);
        edited.push_str(&self.inserted_text);
        edited.push_str(after);
        Some(edited)
    }

    /// Turn a replacement that only appends to the removed text into an
    /// insertion of the new suffix: replacing `Date` with `DateTime` becomes
    /// inserting `Time`.
    pub fn normalize(&self, old: &Rope) -> TextChange {
        if !self.is_replace() || self.inserted_text.len() <= self.removed_length {
            return self.clone();
        }
        if self.old_end() > old.len() {
            return self.clone();
        }
        let removed = old.slice_to_cow(self.absolute_index..self.old_end());
        match self.inserted_text.strip_prefix(removed.as_ref()) {
            Some(suffix) => TextChange::insertion(self.old_end(), suffix),
            None => self.clone(),
        }
    }

    /// The change as an xi-rope delta over a document of `base_len` bytes.
    pub fn to_delta(&self, base_len: usize) -> Delta<RopeInfo> {
        let mut builder = Builder::new(base_len);
        builder.replace(
            self.absolute_index..self.old_end(),
            Rope::from(self.inserted_text.as_str()),
        );
        builder.build()
    }
}

impl fmt::Display for TextChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}:{}) {:?}",
            self.absolute_index, self.removed_length, self.inserted_text
        )
    }
}

/// An immutable, versioned document buffer.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    pub version: u64,
    pub text: Rope,
}

impl DocumentSnapshot {
    pub fn new(version: u64, text: impl Into<Rope>) -> Self {
        Self {
            version,
            text: text.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.len() == 0
    }

    /// The next version of this document. The change must already be valid
    /// for this snapshot.
    pub fn apply(&self, change: &TextChange) -> DocumentSnapshot {
        let delta = change.to_delta(self.text.len());
        DocumentSnapshot {
            version: self.version + 1,
            text: delta.apply(&self.text),
        }
    }

    pub fn slice(&self, range: std::ops::Range<usize>) -> Cow<'_, str> {
        self.text.slice_to_cow(range)
    }

    /// The whole document as one string.
    pub fn contents(&self) -> Cow<'_, str> {
        self.text.slice_to_cow(..)
    }
}

/// Check that `change` turns `old` into `new`.
///
/// Without an old snapshot (the first change a parser sees) only the new
/// side can be checked.
pub(crate) fn validate_change(
    change: &TextChange,
    old: Option<&DocumentSnapshot>,
    new: &DocumentSnapshot,
) -> Result<(), EditorError> {
    if let Some(old) = old {
        if change.old_end() > old.len() {
            return Err(EditorError::ChangeOutOfRange {
                index: change.absolute_index,
                removed: change.removed_length,
                len: old.len(),
            });
        }
        for offset in [change.absolute_index, change.old_end()] {
            if !old.text.is_codepoint_boundary(offset) {
                return Err(EditorError::NotCharBoundary(offset));
            }
        }
        let expected_len = old.len() - change.removed_length + change.inserted_text.len();
        if expected_len != new.len() {
            return Err(EditorError::SnapshotMismatch {
                expected: format!("{expected_len} bytes"),
                actual: format!("{} bytes", new.len()),
            });
        }
    }

    if change.new_end() > new.len() {
        return Err(EditorError::ChangeOutOfRange {
            index: change.absolute_index,
            removed: change.removed_length,
            len: new.len(),
        });
    }
    for offset in [change.absolute_index, change.new_end()] {
        if !new.text.is_codepoint_boundary(offset) {
            return Err(EditorError::NotCharBoundary(offset));
        }
    }
    let inserted = new.slice(change.absolute_index..change.new_end());
    if inserted != change.inserted_text.as_str() {
        return Err(EditorError::SnapshotMismatch {
            expected: format!("{:?}", change.inserted_text),
            actual: format!("{inserted:?}"),
        });
    }

    Ok(())
}
