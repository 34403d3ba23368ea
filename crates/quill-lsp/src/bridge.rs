//! Content-change bridging.
//!
//! Every document mutation flows through here exactly once. The change is
//! forwarded to the document-sync channel first (so the server's view of the
//! document never lags behind a request made against it), then trigger policy
//! runs: retrigger characters hide signature help, trigger characters request
//! it right after themselves, everything else re-requests at the change
//! start.

use crate::events::{DocumentSyncChange, SessionEvents};
use crate::lsp_sync::{LspRange, lsp_end_for_removed, position_to_lsp};
use crate::session::{LspRequests, SyncTracker};
use crate::signature::SignatureHelpController;
use quill_core::{ChangeCause, ChangeRecord, Document, Position};

/// Forward one applied change to the server and run signature-help trigger
/// policy on it.
///
/// `document` is the post-edit document; the pre-edit range is reconstructed
/// from the change record (the text before the change start is untouched by
/// the edit, so the start position converts safely).
pub fn forward_content_change<R: LspRequests + ?Sized>(
    change: &ChangeRecord,
    document: &Document,
    sync: &SyncTracker,
    requests: &mut R,
    signature: &mut SignatureHelpController,
    events: &mut SessionEvents,
) {
    // Server sync comes first, unconditionally.
    let start = position_to_lsp(document.line_index(), change.start_position);
    let end = lsp_end_for_removed(start, &change.removed_text);
    let ticket = sync.begin();
    events.document_sync.push(DocumentSyncChange {
        range: LspRange::new(start, end),
        text: change.inserted_text.clone(),
        ticket,
    });

    // Retrigger characters dismiss signature help, even when a trigger
    // character is also present in the same insertion.
    let retriggered = change
        .inserted_text
        .chars()
        .any(|c| signature.config().retrigger_chars.contains(&c));
    if retriggered {
        signature.hide(events);
        return;
    }

    // An insertion (not replayed by undo/redo) containing a trigger
    // character requests help immediately after that character; any other
    // change re-requests at the change start.
    let trigger_index = if change.is_insert() && change.cause != ChangeCause::UndoRedo {
        change
            .inserted_text
            .chars()
            .position(|c| signature.config().trigger_chars.contains(&c))
    } else {
        None
    };

    let position = match trigger_index {
        // The trigger position stays on the change-start line; multi-line
        // insertions ahead of the trigger are not re-split here, matching
        // how the change start column is reported.
        Some(index) => Position::new(
            change.start_position.line,
            change.start_position.column + index + 1,
        ),
        None => change.start_position,
    };

    signature.request_at(position, document, requests);
}
