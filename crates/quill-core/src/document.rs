//! Versioned document with atomic batch editing.
//!
//! A [`Document`] owns the text (via [`LineIndex`]) and a monotonically
//! increasing version. Every mutation produces [`ChangeRecord`]s that carry
//! enough context (pre-edit range, inserted text, cause) for integrations to
//! mirror the change elsewhere, e.g. as LSP `didChange` notifications.
//!
//! Batches are atomic: either every edit in the batch is applicable (in-bounds
//! and non-overlapping) or nothing is touched. Edits within a batch are
//! applied in descending start-offset order so earlier offsets stay valid
//! while later text shifts.

use crate::line_index::LineIndex;
use std::fmt;

/// A `(line, column)` position in the document, in Unicode scalar values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Line number (0-based).
    pub line: usize,
    /// Column within the line (0-based, `char` offset).
    pub column: usize,
}

impl Position {
    /// Create a new position.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Why a change happened. Downstream consumers use this to decide whether a
/// change should drive interactive behavior (e.g. signature-help triggers
/// ignore undo/redo replays).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
    /// The user typed or deleted text.
    Typing,
    /// An undo/redo replay.
    UndoRedo,
    /// A programmatic mutation (applied edits, snippet expansion, etc.).
    Remote,
}

/// A single text replacement in pre-edit character offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEditSpec {
    /// Start offset (inclusive).
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
    /// Replacement text.
    pub text: String,
}

/// A change that was applied to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    /// Replaced range start, in pre-edit character offsets.
    pub start: usize,
    /// Replaced range end (exclusive), in pre-edit character offsets.
    pub end: usize,
    /// The text that replaced the range (empty for deletions).
    pub inserted_text: String,
    /// The text that was removed (empty for pure insertions).
    pub removed_text: String,
    /// Start position of the change, computed before the edit.
    pub start_position: Position,
    /// Why the change happened.
    pub cause: ChangeCause,
}

impl ChangeRecord {
    /// Returns `true` if this change inserted text without removing any.
    pub fn is_insert(&self) -> bool {
        self.start == self.end && !self.inserted_text.is_empty()
    }
}

/// Errors produced by document mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// An edit range exceeds the document length.
    OutOfBounds {
        /// Offending range start.
        start: usize,
        /// Offending range end.
        end: usize,
        /// Document length in characters at validation time.
        len: usize,
    },
    /// An edit range is inverted (`start > end`).
    InvertedRange {
        /// Offending range start.
        start: usize,
        /// Offending range end.
        end: usize,
    },
    /// Two edits in one batch overlap.
    OverlappingEdits {
        /// End of the earlier edit.
        first_end: usize,
        /// Start of the later edit.
        second_start: usize,
    },
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::OutOfBounds { start, end, len } => {
                write!(f, "Edit range {}..{} exceeds document length {}", start, end, len)
            }
            DocumentError::InvertedRange { start, end } => {
                write!(f, "Edit range is inverted: {}..{}", start, end)
            }
            DocumentError::OverlappingEdits {
                first_end,
                second_start,
            } => write!(
                f,
                "Edits overlap: one ends at {} after another starts at {}",
                first_end, second_start
            ),
        }
    }
}

impl std::error::Error for DocumentError {}

/// A versioned text buffer.
pub struct Document {
    index: LineIndex,
    version: u64,
}

impl Document {
    /// Create a document from initial text.
    pub fn new(text: &str) -> Self {
        Self {
            index: LineIndex::from_text(text),
            version: 0,
        }
    }

    /// Create an empty document.
    pub fn empty() -> Self {
        Self::new("")
    }

    /// Current document version. Bumped once per successful mutation batch.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The line index for position/offset conversion and line access.
    pub fn line_index(&self) -> &LineIndex {
        &self.index
    }

    /// Full document text.
    pub fn text(&self) -> String {
        self.index.get_text()
    }

    /// Document length in characters.
    pub fn char_count(&self) -> usize {
        self.index.char_count()
    }

    /// Text of the character range `start..end`.
    pub fn slice(&self, start: usize, end: usize) -> String {
        self.index.slice(start, end)
    }

    /// Convert a position into a flat character offset.
    pub fn position_to_offset(&self, position: Position) -> usize {
        self.index.position_to_char_offset(position.line, position.column)
    }

    /// Convert a flat character offset into a position.
    pub fn offset_to_position(&self, offset: usize) -> Position {
        let (line, column) = self.index.char_offset_to_position(offset);
        Position::new(line, column)
    }

    /// Replace `start..end` with `text`.
    pub fn replace(
        &mut self,
        start: usize,
        end: usize,
        text: &str,
        cause: ChangeCause,
    ) -> Result<ChangeRecord, DocumentError> {
        self.validate_range(start, end)?;

        let removed_text = self.index.slice(start, end);
        let (line, column) = self.index.char_offset_to_position(start);

        self.index.remove(start, end);
        self.index.insert(start, text);
        self.version += 1;

        Ok(ChangeRecord {
            start,
            end,
            inserted_text: text.to_string(),
            removed_text,
            start_position: Position::new(line, column),
            cause,
        })
    }

    /// Apply a batch of non-overlapping edits as one atomic mutation.
    ///
    /// Edits are validated up front (bounds, inversion, overlap) and then
    /// applied in descending start-offset order, so the outcome is independent
    /// of the order the caller listed them in. Returns the change records in
    /// application order.
    pub fn apply_edits(
        &mut self,
        edits: Vec<TextEditSpec>,
        cause: ChangeCause,
    ) -> Result<Vec<ChangeRecord>, DocumentError> {
        if edits.is_empty() {
            return Ok(Vec::new());
        }

        let mut ordered = edits;
        ordered.sort_by_key(|edit| edit.start);

        for edit in &ordered {
            self.validate_range(edit.start, edit.end)?;
        }
        for pair in ordered.windows(2) {
            if pair[0].end > pair[1].start {
                return Err(DocumentError::OverlappingEdits {
                    first_end: pair[0].end,
                    second_start: pair[1].start,
                });
            }
        }

        let mut records = Vec::with_capacity(ordered.len());
        for edit in ordered.into_iter().rev() {
            let removed_text = self.index.slice(edit.start, edit.end);
            let (line, column) = self.index.char_offset_to_position(edit.start);

            self.index.remove(edit.start, edit.end);
            self.index.insert(edit.start, &edit.text);

            records.push(ChangeRecord {
                start: edit.start,
                end: edit.end,
                inserted_text: edit.text,
                removed_text,
                start_position: Position::new(line, column),
                cause,
            });
        }

        self.version += 1;
        Ok(records)
    }

    fn validate_range(&self, start: usize, end: usize) -> Result<(), DocumentError> {
        if start > end {
            return Err(DocumentError::InvertedRange { start, end });
        }
        let len = self.index.char_count();
        if end > len {
            return Err(DocumentError::OutOfBounds { start, end, len });
        }
        Ok(())
    }
}
