#![warn(missing_docs)]
//! `quill-core` - Headless Document Kernel
//!
//! # Overview
//!
//! `quill-core` is the toolkit-independent document layer underneath an editor
//! surface. It owns text storage, the authoritative line/column ↔ character
//! offset mapping, versioned batch editing, and the structured diagnostics
//! model that higher layers (notably `quill-lsp`) decorate with quick fixes.
//!
//! It knows nothing about views, popups, or rendering. Frontends own all of
//! that; this crate only guarantees that text mutation is atomic, offsets stay
//! consistent, and every change is observable as a [`ChangeRecord`].
//!
//! # Core pieces
//!
//! - [`LineIndex`] - rope-backed line index, O(log n) line access
//! - [`Document`] - versioned text buffer with atomic multi-edit batches
//! - [`Diagnostic`] - structured problem report with an opaque protocol payload
//!
//! # Unicode
//!
//! All offsets and columns are in Unicode scalar values (`char`). UTF-16
//! conversions for wire protocols live in integration crates, not here.

pub mod diagnostics;
pub mod document;
pub mod line_index;

pub use diagnostics::{Diagnostic, DiagnosticRange, DiagnosticSeverity};
pub use document::{
    ChangeCause, ChangeRecord, Document, DocumentError, Position, TextEditSpec,
};
pub use line_index::LineIndex;
