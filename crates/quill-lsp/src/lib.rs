#![warn(missing_docs)]
//! `quill-lsp` - LSP client-side orchestration for `quill-core`.
//!
//! This crate is the editor-side half of an LSP integration: it turns
//! protocol payloads into popup state and document mutations, without knowing
//! anything about the UI toolkit that eventually draws them.
//!
//! # What lives here
//!
//! - [`DiagnosticsController`] - the diagnostic tooltip and its
//!   asynchronously populated quick fixes (code action request/resolve with
//!   bounded timeouts and stale-response filtering)
//! - [`EditApplier`] - workspace-edit application, including the interactive
//!   snippet path ([`SnippetSession`])
//! - [`SignatureHelpController`] - trigger/retrigger policy, signature
//!   rendering to styled spans, markdown documentation with highlighted code
//!   blocks
//! - [`forward_content_change`] - the single entry point for document
//!   changes: server sync first, then trigger policy
//! - [`SessionEvents`] - the per-session typed channel set frontends drain
//!
//! # Threading model
//!
//! One thread (the UI thread) owns the controllers, the document, and the
//! event queues. The protocol runtime implements [`LspRequests`], does its
//! I/O wherever it likes, and completes [`Reply`] handles; the controllers
//! poll those with deadlines. There are no locks: correctness comes from
//! single-threaded state mutation plus generation-counter filtering of
//! responses that arrive for superseded state.
//!
//! # Rendering model
//!
//! Controllers emit [`StyledText`] (spans tagged with [`StyleRole`]s) and
//! pure [`popup`] placements. Frontends map roles to colors and rectangles to
//! windows; nothing here depends on how.

pub mod bridge;
pub mod code_action;
pub mod diagnostics;
pub mod events;
pub mod highlight;
pub mod lsp_data;
pub mod lsp_sync;
pub mod markdown;
pub mod popup;
pub mod session;
pub mod signature;
pub mod snippet;
pub mod styled;

pub use bridge::forward_content_change;
pub use code_action::{
    ApplyError, ApplyOutcome, DocumentOpener, EditApplier, EditDisposition, SNIPPET_MARKER,
    apply_pending_batches,
};
pub use diagnostics::{
    DiagnosticsController, DisplayedDiagnostic, Quickfix, QuickfixAction,
};
pub use events::{
    DocumentSyncChange, EditBatch, EventKind, EventQueue, Notice, NoticeLevel, PopupEvent,
    PopupKind, SessionEvents,
};
pub use highlight::{RegexHighlighter, RegexRule};
pub use lsp_data::{
    CodeAction, DocumentEdit, Documentation, LspDiagnostic, LspDiagnosticSeverity,
    ParameterInformation, ParameterLabel, SignatureHelp, SignatureInformation, TextEdit,
    WorkspaceEdit, code_actions_from_value, text_edits_from_value,
};
pub use lsp_sync::{
    LspPosition, LspRange, char_offset_for_lsp_position, char_offsets_for_lsp_range,
    char_to_utf16, lsp_end_for_removed, lsp_range_for_char_offsets, position_to_lsp,
    utf16_to_char,
};
pub use markdown::MarkdownRenderer;
pub use popup::{
    AnchorEdge, PlacementError, PopupAnchor, PopupPlacement, PopupSize, Viewport, place,
};
pub use session::{
    CODE_ACTION_KIND_QUICKFIX, CODE_ACTION_TRIGGER_AUTOMATIC, CodeActionParams, LspRequests,
    Reply, ReplyState, Responder, RequestKind, RequestTimeouts, SyncTracker, reply_pair,
};
pub use signature::{
    RenderedSignatureHelp, SignatureHelpController, SignatureTriggerConfig,
    render_signature_help,
};
pub use snippet::{
    RenderedSnippet, SnippetElement, SnippetSession, SnippetStep, SnippetTemplate, TabStop,
};
pub use styled::{SpanStyle, StyleRole, StyledLine, StyledSpan, StyledText};
