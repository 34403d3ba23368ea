//! Workspace-edit application.
//!
//! A code action resolves to a [`WorkspaceEdit`]: per-document edit lists,
//! possibly containing interactive snippet templates. Two application paths
//! exist because they have incompatible shapes:
//!
//! - plain edits are forwarded as one atomic batch on the apply-edits
//!   channel, where the document owner performs a multi-edit replace whose
//!   outcome is independent of edit order;
//! - edit lists containing the snippet marker are processed one by one in
//!   descending start-offset order (so offsets of not-yet-processed edits
//!   stay valid), each starting a cursor-tracking [`SnippetSession`].
//!
//! Edits for documents other than the open one are handed to the host's
//! opener, which applies them once the target document is available.

use crate::events::{EditBatch, SessionEvents};
use crate::lsp_data::{TextEdit, WorkspaceEdit};
use crate::lsp_sync::char_offsets_for_lsp_range;
use crate::snippet::{SnippetSession, SnippetTemplate};
use quill_core::{Document, DocumentError, TextEditSpec};
use std::fmt;

/// The character whose presence in replacement text selects the interactive
/// snippet path.
pub const SNIPPET_MARKER: char = '$';

/// Host hook for edits that target a document other than the open one.
///
/// Implementations open (or focus) the document asynchronously and apply the
/// edits once it is available, typically by calling
/// [`EditApplier::apply_edits`] against the freshly opened document.
pub trait DocumentOpener {
    /// Request that `uri` be opened and `edits` applied afterwards.
    fn open_document(&mut self, uri: &str, edits: Vec<TextEdit>);
}

impl<F: FnMut(&str, Vec<TextEdit>)> DocumentOpener for F {
    fn open_document(&mut self, uri: &str, edits: Vec<TextEdit>) {
        self(uri, edits)
    }
}

/// Errors produced while applying edits.
#[derive(Debug)]
pub enum ApplyError {
    /// The underlying document rejected a mutation.
    Document(DocumentError),
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyError::Document(err) => write!(f, "failed to apply edit: {}", err),
        }
    }
}

impl std::error::Error for ApplyError {}

impl From<DocumentError> for ApplyError {
    fn from(err: DocumentError) -> Self {
        ApplyError::Document(err)
    }
}

/// How a call to [`EditApplier::apply_edits`] was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditDisposition {
    /// Edits were forwarded as one atomic batch event.
    Batched,
    /// This many snippet sessions were started and pushed on the snippet
    /// channel, in application order. The most recently pushed session is
    /// the one the editor should drive.
    SnippetSessions(usize),
}

/// Result of applying a full workspace edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Edit lists applied (or batched) against the open document.
    pub applied_local: usize,
    /// URIs handed to the host opener.
    pub deferred_uris: Vec<String>,
}

/// Applies workspace edits against the open document, deferring foreign
/// documents to the host.
pub struct EditApplier {
    opener: Box<dyn DocumentOpener>,
}

impl EditApplier {
    /// Create an applier with the host's document opener.
    pub fn new(opener: Box<dyn DocumentOpener>) -> Self {
        Self { opener }
    }

    /// Create an applier that drops edits for foreign documents.
    ///
    /// Useful for single-document hosts and tests; deferred URIs are still
    /// reported in the [`ApplyOutcome`].
    pub fn without_opener() -> Self {
        Self::new(Box::new(|uri: &str, _edits: Vec<TextEdit>| {
            tracing::warn!(uri, "no document opener configured, dropping edits");
        }))
    }

    /// Apply a [`WorkspaceEdit`].
    ///
    /// Both the `changes` map and `documentChanges` entries are routed by
    /// URI: lists for `document_uri` apply in place, everything else goes to
    /// the opener.
    pub fn apply_workspace_edit(
        &mut self,
        edit: &WorkspaceEdit,
        document_uri: &str,
        document: &mut Document,
        events: &mut SessionEvents,
    ) -> Result<ApplyOutcome, ApplyError> {
        let mut outcome = ApplyOutcome::default();

        let local_lists = edit
            .changes
            .iter()
            .map(|(uri, edits)| (uri.as_str(), edits))
            .chain(
                edit.document_changes
                    .iter()
                    .map(|change| (change.uri.as_str(), &change.edits)),
            );

        for (uri, edits) in local_lists {
            if edits.is_empty() {
                continue;
            }
            if uri == document_uri {
                self.apply_edits(edits, document, events)?;
                outcome.applied_local += 1;
            } else {
                self.opener.open_document(uri, edits.clone());
                outcome.deferred_uris.push(uri.to_string());
            }
        }

        Ok(outcome)
    }

    /// Apply one document's edit list to the open document.
    ///
    /// Selects the batch path or the snippet path depending on whether any
    /// replacement text contains [`SNIPPET_MARKER`].
    pub fn apply_edits(
        &mut self,
        edits: &[TextEdit],
        document: &mut Document,
        events: &mut SessionEvents,
    ) -> Result<EditDisposition, ApplyError> {
        if edits.is_empty() {
            return Ok(EditDisposition::Batched);
        }

        let has_snippet = edits.iter().any(|e| e.new_text.contains(SNIPPET_MARKER));
        if has_snippet {
            self.apply_snippet_edits(edits, document, events)
        } else {
            let line_index = document.line_index();
            let specs = edits
                .iter()
                .map(|edit| {
                    let (start, end) = char_offsets_for_lsp_range(line_index, &edit.range);
                    TextEditSpec {
                        start,
                        end,
                        text: edit.new_text.clone(),
                    }
                })
                .collect();
            events.apply_edits.push(EditBatch { edits: specs });
            Ok(EditDisposition::Batched)
        }
    }

    /// The snippet path: strictly descending start offsets, so every edit's
    /// pre-computed offsets stay valid while later (larger-offset) edits
    /// mutate the document.
    fn apply_snippet_edits(
        &mut self,
        edits: &[TextEdit],
        document: &mut Document,
        events: &mut SessionEvents,
    ) -> Result<EditDisposition, ApplyError> {
        let line_index = document.line_index();
        let mut resolved: Vec<(usize, usize, &TextEdit)> = edits
            .iter()
            .map(|edit| {
                let (start, end) = char_offsets_for_lsp_range(line_index, &edit.range);
                (start, end, edit)
            })
            .collect();
        resolved.sort_by_key(|(start, _, _)| std::cmp::Reverse(*start));

        let mut started = 0usize;
        for (start, end, edit) in resolved {
            let replaced = document.slice(start, end);
            document.replace(start, end, "", quill_core::ChangeCause::Remote)?;

            let template = SnippetTemplate::parse(&edit.new_text);
            if template.has_stops() {
                let session = SnippetSession::start(document, start, &template, &replaced)?;
                events.snippets.push(session);
                started += 1;
            } else {
                // Marker-bearing lists may still contain plain members (or
                // variable-only templates); expand those in place.
                let rendered = template.render(&replaced);
                document.replace(start, start, &rendered.text, quill_core::ChangeCause::Remote)?;
            }
        }

        Ok(EditDisposition::SnippetSessions(started))
    }
}

/// Drain the apply-edits channel into the document.
///
/// Hosts that keep the document on the same thread as the session can call
/// this after polling; each batch is applied atomically.
pub fn apply_pending_batches(
    events: &mut SessionEvents,
    document: &mut Document,
) -> Result<usize, DocumentError> {
    let batches = events.apply_edits.drain();
    let count = batches.len();
    for batch in batches {
        document.apply_edits(batch.edits, quill_core::ChangeCause::Remote)?;
    }
    Ok(count)
}
