//! The host-facing protocol seam.
//!
//! The protocol runtime (process management, JSON-RPC framing, reader/writer
//! threads) is owned by the host and exposed to the controllers as
//! [`LspRequests`]. Requests return [`Reply`] handles: the runtime completes
//! them from its own threads, the controllers poll them from the UI thread
//! with per-request-kind deadlines. Nothing in this crate blocks.

use crate::lsp_data::{CodeAction, SignatureHelp};
use crate::lsp_sync::{LspPosition, LspRange};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

/// The request kinds this integration issues, used to key timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Waiting for an outstanding `didChange` acknowledgment.
    DocumentSync,
    /// `textDocument/codeAction`.
    CodeAction,
    /// `codeAction/resolve`.
    CodeActionResolve,
    /// `textDocument/signatureHelp`.
    SignatureHelp,
}

/// Per-request-kind deadlines.
///
/// The document-sync wait is host-tunable; code-action and resolve round-trips
/// default to a short fixed bound so a slow server can never wedge the
/// quick-fix pipeline behind an invisible request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTimeouts {
    /// Bound on waiting for the document-sync tracker to go idle.
    pub document_sync: Duration,
    /// Bound on `textDocument/codeAction`.
    pub code_action: Duration,
    /// Bound on `codeAction/resolve`.
    pub code_action_resolve: Duration,
    /// Bound on `textDocument/signatureHelp`.
    pub signature_help: Duration,
}

impl RequestTimeouts {
    /// Look up the timeout for a request kind.
    pub fn for_kind(&self, kind: RequestKind) -> Duration {
        match kind {
            RequestKind::DocumentSync => self.document_sync,
            RequestKind::CodeAction => self.code_action,
            RequestKind::CodeActionResolve => self.code_action_resolve,
            RequestKind::SignatureHelp => self.signature_help,
        }
    }
}

impl Default for RequestTimeouts {
    fn default() -> Self {
        Self {
            document_sync: Duration::from_millis(1000),
            code_action: Duration::from_secs(2),
            code_action_resolve: Duration::from_secs(2),
            signature_help: Duration::from_secs(2),
        }
    }
}

/// Result of polling a [`Reply`].
#[derive(Debug)]
pub enum ReplyState<T> {
    /// No response yet.
    Pending,
    /// The runtime delivered a successful response.
    Ready(T),
    /// The request failed (transport error, server error, or the runtime
    /// dropped the responder).
    Failed(String),
}

/// A poll-style handle for one in-flight request.
///
/// Backed by a plain mpsc channel so runtimes can complete it from any
/// thread.
#[derive(Debug)]
pub struct Reply<T> {
    rx: Receiver<Result<T, String>>,
}

/// The runtime's half of a [`Reply`].
#[derive(Debug)]
pub struct Responder<T> {
    tx: Sender<Result<T, String>>,
}

impl<T> Responder<T> {
    /// Complete the request successfully.
    pub fn resolve(self, value: T) {
        let _ = self.tx.send(Ok(value));
    }

    /// Complete the request with an error.
    pub fn reject(self, error: impl Into<String>) {
        let _ = self.tx.send(Err(error.into()));
    }
}

/// Create a connected `(Reply, Responder)` pair.
pub fn reply_pair<T>() -> (Reply<T>, Responder<T>) {
    let (tx, rx) = mpsc::channel();
    (Reply { rx }, Responder { tx })
}

impl<T> Reply<T> {
    /// A reply that is already resolved. Useful for synchronous runtimes and
    /// tests.
    pub fn ready(value: T) -> Self {
        let (reply, responder) = reply_pair();
        responder.resolve(value);
        reply
    }

    /// Non-blocking poll for the response.
    pub fn poll(&self) -> ReplyState<T> {
        match self.rx.try_recv() {
            Ok(Ok(value)) => ReplyState::Ready(value),
            Ok(Err(error)) => ReplyState::Failed(error),
            Err(TryRecvError::Empty) => ReplyState::Pending,
            Err(TryRecvError::Disconnected) => {
                ReplyState::Failed("response channel disconnected".to_string())
            }
        }
    }
}

/// `CodeActionTriggerKind.Automatic` - the request was not user-invoked.
pub const CODE_ACTION_TRIGGER_AUTOMATIC: i64 = 2;

/// The quick-fix action kind requested from servers.
pub const CODE_ACTION_KIND_QUICKFIX: &str = "quickfix";

#[derive(Debug, Clone)]
/// Parameters for `textDocument/codeAction`.
pub struct CodeActionParams {
    /// Range the actions should apply to (the diagnostic's range).
    pub range: LspRange,
    /// Raw protocol diagnostics for the request context.
    pub diagnostics: Vec<Value>,
    /// Requested action kinds (e.g. [`CODE_ACTION_KIND_QUICKFIX`]).
    pub only: Vec<String>,
    /// `CodeActionTriggerKind` value.
    pub trigger_kind: i64,
}

/// The protocol requests the controllers issue.
///
/// Implementations send the request from wherever they like (typically a
/// writer thread feeding a server's stdin) and complete the returned
/// [`Reply`] when the matching response arrives. An `Err` return means the
/// request could not even be issued (e.g. the server process died).
pub trait LspRequests {
    /// Issue `textDocument/codeAction`.
    fn code_action(&mut self, params: CodeActionParams) -> Result<Reply<Vec<CodeAction>>, String>;

    /// Issue `codeAction/resolve` for an action without an edit.
    fn resolve_code_action(&mut self, action: &CodeAction) -> Result<Reply<CodeAction>, String>;

    /// Issue `textDocument/signatureHelp` at a position.
    fn signature_help(
        &mut self,
        position: LspPosition,
    ) -> Result<Reply<Option<SignatureHelp>>, String>;
}

#[derive(Debug, Default)]
struct SyncTrackerInner {
    issued: AtomicU64,
    acked: AtomicU64,
}

/// Tracks outstanding document-sync notifications.
///
/// Every forwarded content change takes a ticket via [`SyncTracker::begin`];
/// the protocol runtime acknowledges tickets once the server has seen the
/// change. The quick-fix pipeline consults [`SyncTracker::is_idle`] before
/// requesting code actions so the server computes them against the document
/// version the user is looking at.
#[derive(Debug, Clone, Default)]
pub struct SyncTracker {
    inner: Arc<SyncTrackerInner>,
}

impl SyncTracker {
    /// Create an idle tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an outgoing change and return its ticket.
    pub fn begin(&self) -> u64 {
        self.inner.issued.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Acknowledge every ticket up to and including `ticket`.
    pub fn acknowledge(&self, ticket: u64) {
        self.inner.acked.fetch_max(ticket, Ordering::AcqRel);
    }

    /// Returns `true` when every issued ticket has been acknowledged.
    pub fn is_idle(&self) -> bool {
        self.inner.acked.load(Ordering::Acquire) >= self.inner.issued.load(Ordering::Acquire)
    }
}
