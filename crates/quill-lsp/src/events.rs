//! Per-session typed event channels.
//!
//! Controllers never call into a frontend; they emit typed events that the
//! frontend drains on its own thread. Each channel is keyed by a closed
//! [`EventKind`] and carries one payload type, so there is no stringly-typed
//! dispatch anywhere: a consumer that handles every kind handles every event.
//!
//! Queues are bounded; when a frontend stops draining, the oldest entries are
//! dropped rather than growing without limit.

use crate::lsp_sync::LspRange;
use crate::snippet::SnippetSession;
use quill_core::TextEditSpec;
use std::collections::VecDeque;

/// The closed set of event channels a session exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Outgoing document-sync changes for the protocol runtime.
    DocumentSync,
    /// Atomic multi-edit batches for the document owner.
    ApplyEdits,
    /// Interactive snippet sessions to install in the editor.
    Snippet,
    /// Short user-facing notices (toasts).
    Notice,
    /// Popup visibility transitions.
    Popup,
}

/// A content change to forward to the language server as `didChange`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSyncChange {
    /// Changed range in protocol coordinates (pre-edit).
    pub range: LspRange,
    /// Replacement text.
    pub text: String,
    /// Sync ticket from [`crate::session::SyncTracker::begin`]; the runtime
    /// acknowledges it once the server has seen the change.
    pub ticket: u64,
}

/// An atomic batch of plain text edits for the open document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBatch {
    /// Edits in pre-edit character offsets, non-overlapping.
    pub edits: Vec<TextEditSpec>,
}

/// Notice severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Informational notice.
    Info,
    /// Something failed but the session continues.
    Warning,
}

/// A short user-facing notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Notice severity.
    pub level: NoticeLevel,
    /// Message text.
    pub message: String,
}

impl Notice {
    /// Create a warning notice.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

/// The popups this session coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupKind {
    /// Signature-help window.
    SignatureHelp,
    /// Diagnostic tooltip.
    Diagnostic,
    /// Completion list.
    Completion,
}

/// A popup visibility transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupEvent {
    /// Which popup changed.
    pub kind: PopupKind,
    /// Whether it should now be visible.
    pub visible: bool,
}

/// A bounded FIFO of pending events.
#[derive(Debug)]
pub struct EventQueue<T> {
    kind: EventKind,
    queue: VecDeque<T>,
    capacity: usize,
}

impl<T> EventQueue<T> {
    fn new(kind: EventKind, capacity: usize) -> Self {
        Self {
            kind,
            queue: VecDeque::new(),
            capacity,
        }
    }

    /// The channel this queue belongs to.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Enqueue an event, dropping the oldest entry when full.
    pub fn push(&mut self, event: T) {
        if self.capacity == 0 {
            return;
        }
        if self.queue.len() == self.capacity {
            self.queue.pop_front();
            tracing::debug!(kind = ?self.kind, "event queue full, dropped oldest entry");
        }
        self.queue.push_back(event);
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Take all queued events in FIFO order.
    pub fn drain(&mut self) -> Vec<T> {
        self.queue.drain(..).collect()
    }
}

const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// The session's channel set, one queue per [`EventKind`].
#[derive(Debug)]
pub struct SessionEvents {
    /// Outgoing `didChange` payloads.
    pub document_sync: EventQueue<DocumentSyncChange>,
    /// Atomic edit batches for the document owner.
    pub apply_edits: EventQueue<EditBatch>,
    /// Started snippet sessions for the editor to drive.
    pub snippets: EventQueue<SnippetSession>,
    /// User-facing notices.
    pub notices: EventQueue<Notice>,
    /// Popup visibility transitions.
    pub popups: EventQueue<PopupEvent>,
}

impl SessionEvents {
    /// Create a channel set with the default per-queue capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Create a channel set with an explicit per-queue capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            document_sync: EventQueue::new(EventKind::DocumentSync, capacity),
            apply_edits: EventQueue::new(EventKind::ApplyEdits, capacity),
            snippets: EventQueue::new(EventKind::Snippet, capacity),
            notices: EventQueue::new(EventKind::Notice, capacity),
            popups: EventQueue::new(EventKind::Popup, capacity),
        }
    }

    /// Emit a popup visibility transition.
    pub fn emit_popup(&mut self, kind: PopupKind, visible: bool) {
        self.popups.push(PopupEvent { kind, visible });
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}
