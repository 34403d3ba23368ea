//! Diagnostic tooltip controller with asynchronous quick fixes.
//!
//! The controller owns the lifecycle of "the diagnostic currently shown at
//! the cursor" and its quick-fix list, which arrives later: showing a
//! diagnostic kicks off a pipeline that waits for document sync to settle,
//! requests code actions scoped to the diagnostic, and attaches the results -
//! but only if the same diagnostic is still on screen.
//!
//! Staleness is a generation counter: every show bumps it, every pipeline
//! completion compares against it. A slow response for a superseded
//! diagnostic is dropped, never rendered. Requests are bounded by the
//! configured timeouts and every failure degrades (log line, optional
//! notice), so nothing here can wedge or crash the editor surface.
//!
//! State machine: Hidden -> Shown (no fixes) -> Shown (with fixes) -> Hidden.

use crate::code_action::EditApplier;
use crate::events::{Notice, PopupKind, SessionEvents};
use crate::lsp_data::{CodeAction, LspDiagnostic, WorkspaceEdit};
use crate::popup::{self, PopupAnchor, PopupPlacement, PopupSize, Viewport};
use crate::session::{
    CODE_ACTION_KIND_QUICKFIX, CODE_ACTION_TRIGGER_AUTOMATIC, CodeActionParams, LspRequests,
    Reply, ReplyState, RequestTimeouts, SyncTracker,
};
use quill_core::{Diagnostic, Document, Position};
use serde_json::Value;
use std::time::Instant;

/// A quick fix attached to the displayed diagnostic.
#[derive(Debug, Clone)]
pub struct Quickfix {
    /// Display title, straight from the server.
    pub title: String,
    /// What invoking the fix does.
    pub action: QuickfixAction,
}

/// The two shapes a server-suggested fix can take.
#[derive(Debug, Clone)]
pub enum QuickfixAction {
    /// The action shipped its edit up front; invoking applies it directly.
    ApplyEdit(WorkspaceEdit),
    /// The edit is lazy; invoking issues `codeAction/resolve` first and
    /// applies the edit from the resolved action.
    ResolveThenApply(CodeAction),
}

/// The diagnostic currently anchoring the tooltip.
#[derive(Debug, Clone)]
pub struct DisplayedDiagnostic {
    /// The diagnostic being shown.
    pub diagnostic: Diagnostic,
    /// Cursor position the tooltip is anchored to.
    pub anchor: Position,
    /// Quick fixes, populated asynchronously after display.
    pub quickfixes: Vec<Quickfix>,
}

#[derive(Debug)]
enum FixPipeline {
    Idle,
    /// Waiting for outstanding document sync so the server sees the document
    /// version the diagnostic was reported against.
    AwaitSync {
        generation: u64,
        diagnostic: LspDiagnostic,
        deadline: Instant,
    },
    /// Code-action request in flight.
    AwaitActions {
        generation: u64,
        reply: Reply<Vec<CodeAction>>,
        deadline: Instant,
    },
}

#[derive(Debug)]
struct PendingResolve {
    reply: Reply<CodeAction>,
    deadline: Instant,
}

const APPLY_FAILED_NOTICE: &str = "Failed to apply code action.";

/// Controller for the diagnostic tooltip and its quick-fix pipeline.
pub struct DiagnosticsController {
    enabled: bool,
    visible: bool,
    generation: u64,
    current: Option<DisplayedDiagnostic>,
    pipeline: FixPipeline,
    pending_resolves: Vec<PendingResolve>,
    timeouts: RequestTimeouts,
}

impl DiagnosticsController {
    /// Create an enabled controller.
    pub fn new(timeouts: RequestTimeouts) -> Self {
        Self {
            enabled: true,
            visible: false,
            generation: 0,
            current: None,
            pipeline: FixPipeline::Idle,
            pending_resolves: Vec::new(),
            timeouts,
        }
    }

    /// Returns `true` while the controller reacts to updates.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the controller. Disabling dismisses the tooltip.
    pub fn set_enabled(&mut self, enabled: bool, events: &mut SessionEvents) {
        self.enabled = enabled;
        if !enabled {
            self.dismiss(events);
        }
    }

    /// Returns `true` while the tooltip is on screen.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// The diagnostic currently shown, if any.
    pub fn current(&self) -> Option<&DisplayedDiagnostic> {
        self.current.as_ref()
    }

    /// Hide the tooltip. The displayed diagnostic is forgotten; its pipeline
    /// results (if any are still in flight) will be dropped as stale.
    pub fn dismiss(&mut self, events: &mut SessionEvents) {
        if self.visible {
            events.emit_popup(PopupKind::Diagnostic, false);
        }
        self.visible = false;
        self.current = None;
    }

    /// Show a diagnostic at `position`, or clear the tooltip with `None`.
    ///
    /// When the diagnostic carries a protocol payload, the quick-fix pipeline
    /// starts: it waits (bounded) for document sync to go idle, then issues a
    /// quick-fix-scoped code-action request. Results attach on a later
    /// [`DiagnosticsController::poll`] if this diagnostic is still current.
    ///
    /// `signature_visible` keeps the tooltip out of the signature popup's
    /// screen space: the diagnostic stays hidden while signature help is up.
    pub fn update_diagnostic(
        &mut self,
        diagnostic: Option<Diagnostic>,
        position: Position,
        signature_visible: bool,
        events: &mut SessionEvents,
    ) {
        if !self.enabled {
            return;
        }

        // Just in case a previous tooltip is still up.
        if self.visible {
            self.dismiss(events);
        }

        self.generation += 1;
        self.pipeline = FixPipeline::Idle;

        let Some(diagnostic) = diagnostic else {
            self.current = None;
            return;
        };

        let payload = match diagnostic.payload_json.as_deref() {
            Some(json) => {
                let parsed = serde_json::from_str::<Value>(json)
                    .ok()
                    .and_then(|value| LspDiagnostic::from_value(&value));
                if parsed.is_none() {
                    tracing::debug!("diagnostic payload did not parse, skipping quick fixes");
                }
                parsed
            }
            None => None,
        };

        self.current = Some(DisplayedDiagnostic {
            diagnostic,
            anchor: position,
            quickfixes: Vec::new(),
        });

        if signature_visible {
            // The signature popup owns the screen space; stay hidden. The
            // pipeline still runs so fixes are ready if we get re-shown.
            self.visible = false;
        } else {
            self.visible = true;
            events.emit_popup(PopupKind::Diagnostic, true);
        }

        if let Some(protocol_diagnostic) = payload {
            self.pipeline = FixPipeline::AwaitSync {
                generation: self.generation,
                diagnostic: protocol_diagnostic,
                deadline: Instant::now() + self.timeouts.document_sync,
            };
        }
    }

    /// Re-anchor the tooltip to a new cursor position.
    pub fn update_diagnostics(&mut self, position: Position) {
        if let Some(current) = self.current.as_mut() {
            current.anchor = position;
        }
    }

    /// Compute a tooltip placement, dismissing on geometry faults.
    ///
    /// Returns `None` when the tooltip is not visible, had to yield to the
    /// signature popup, or cannot be placed; in the latter cases it is
    /// dismissed rather than drawn somewhere wrong.
    pub fn reposition(
        &mut self,
        anchor: PopupAnchor,
        viewport: Viewport,
        size: PopupSize,
        signature_visible: bool,
        events: &mut SessionEvents,
    ) -> Option<PopupPlacement> {
        if !self.visible {
            return None;
        }
        if signature_visible {
            self.dismiss(events);
            return None;
        }

        match popup::place(anchor, viewport, size) {
            Ok(placement) => Some(placement),
            Err(err) => {
                tracing::debug!(error = %err, "diagnostic tooltip placement failed, dismissing");
                self.dismiss(events);
                None
            }
        }
    }

    /// Advance the quick-fix pipeline and any in-flight resolves.
    ///
    /// Call this from the UI loop. Stale completions (generation mismatch,
    /// tooltip no longer visible) are dropped without touching state.
    pub fn poll<R: LspRequests + ?Sized>(
        &mut self,
        requests: &mut R,
        sync: &SyncTracker,
        applier: &mut EditApplier,
        document_uri: &str,
        document: &mut Document,
        events: &mut SessionEvents,
    ) {
        self.advance_pipeline(requests, sync);
        self.drain_resolves(applier, document_uri, document, events);
    }

    /// Run the fix for `quickfixes[index]` of the displayed diagnostic.
    pub fn invoke_quickfix<R: LspRequests + ?Sized>(
        &mut self,
        index: usize,
        requests: &mut R,
        applier: &mut EditApplier,
        document_uri: &str,
        document: &mut Document,
        events: &mut SessionEvents,
    ) {
        let Some(fix) = self
            .current
            .as_ref()
            .and_then(|c| c.quickfixes.get(index))
            .cloned()
        else {
            tracing::debug!(index, "quick fix index out of range");
            return;
        };

        match fix.action {
            QuickfixAction::ApplyEdit(edit) => {
                if let Err(err) =
                    applier.apply_workspace_edit(&edit, document_uri, document, events)
                {
                    tracing::warn!(error = %err, "quick-fix edit failed");
                    events.notices.push(Notice::warning(APPLY_FAILED_NOTICE));
                }
            }
            QuickfixAction::ResolveThenApply(action) => {
                match requests.resolve_code_action(&action) {
                    Ok(reply) => self.pending_resolves.push(PendingResolve {
                        reply,
                        deadline: Instant::now() + self.timeouts.code_action_resolve,
                    }),
                    Err(err) => {
                        tracing::warn!(error = %err, "codeAction/resolve could not be issued");
                        events.notices.push(Notice::warning(APPLY_FAILED_NOTICE));
                    }
                }
            }
        }
    }

    fn advance_pipeline<R: LspRequests + ?Sized>(&mut self, requests: &mut R, sync: &SyncTracker) {
        match std::mem::replace(&mut self.pipeline, FixPipeline::Idle) {
            FixPipeline::Idle => {}
            FixPipeline::AwaitSync {
                generation,
                diagnostic,
                deadline,
            } => {
                if generation != self.generation {
                    return;
                }
                if !sync.is_idle() && Instant::now() < deadline {
                    self.pipeline = FixPipeline::AwaitSync {
                        generation,
                        diagnostic,
                        deadline,
                    };
                    return;
                }
                // Sync settled (or we stopped waiting); ask for quick fixes.
                let params = CodeActionParams {
                    range: diagnostic.range,
                    diagnostics: vec![diagnostic.raw.clone()],
                    only: vec![CODE_ACTION_KIND_QUICKFIX.to_string()],
                    trigger_kind: CODE_ACTION_TRIGGER_AUTOMATIC,
                };
                match requests.code_action(params) {
                    Ok(reply) => {
                        self.pipeline = FixPipeline::AwaitActions {
                            generation,
                            reply,
                            deadline: Instant::now() + self.timeouts.code_action,
                        };
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "codeAction request could not be issued");
                    }
                }
            }
            FixPipeline::AwaitActions {
                generation,
                reply,
                deadline,
            } => match reply.poll() {
                ReplyState::Ready(actions) => {
                    self.attach_quickfixes(generation, actions);
                }
                ReplyState::Failed(err) => {
                    tracing::warn!(error = %err, "codeAction request failed");
                }
                ReplyState::Pending => {
                    if Instant::now() >= deadline {
                        tracing::warn!("codeAction request timed out");
                    } else {
                        self.pipeline = FixPipeline::AwaitActions {
                            generation,
                            reply,
                            deadline,
                        };
                    }
                }
            },
        }
    }

    fn attach_quickfixes(&mut self, generation: u64, actions: Vec<CodeAction>) {
        if generation != self.generation || !self.visible {
            tracing::debug!("dropping quick fixes for a superseded diagnostic");
            return;
        }
        let Some(current) = self.current.as_mut() else {
            return;
        };

        let quickfixes: Vec<Quickfix> = actions
            .into_iter()
            .map(|action| {
                let direct = action.edit.as_ref().filter(|e| !e.is_empty()).cloned();
                Quickfix {
                    title: action.title.clone(),
                    action: match direct {
                        Some(edit) => QuickfixAction::ApplyEdit(edit),
                        None => QuickfixAction::ResolveThenApply(action),
                    },
                }
            })
            .collect();

        if !quickfixes.is_empty() {
            current.quickfixes = quickfixes;
        }
    }

    fn drain_resolves(
        &mut self,
        applier: &mut EditApplier,
        document_uri: &str,
        document: &mut Document,
        events: &mut SessionEvents,
    ) {
        let mut remaining = Vec::new();
        for pending in self.pending_resolves.drain(..) {
            match pending.reply.poll() {
                ReplyState::Ready(action) => match action.edit {
                    Some(edit) => {
                        if let Err(err) =
                            applier.apply_workspace_edit(&edit, document_uri, document, events)
                        {
                            tracing::warn!(error = %err, "resolved quick-fix edit failed");
                            events.notices.push(Notice::warning(APPLY_FAILED_NOTICE));
                        }
                    }
                    None => {
                        tracing::warn!("resolved code action carried no edit");
                        events.notices.push(Notice::warning(APPLY_FAILED_NOTICE));
                    }
                },
                ReplyState::Failed(err) => {
                    tracing::warn!(error = %err, "codeAction/resolve failed");
                    events.notices.push(Notice::warning(APPLY_FAILED_NOTICE));
                }
                ReplyState::Pending => {
                    if Instant::now() >= pending.deadline {
                        tracing::warn!("codeAction/resolve timed out");
                        events.notices.push(Notice::warning(APPLY_FAILED_NOTICE));
                    } else {
                        remaining.push(pending);
                    }
                }
            }
        }
        self.pending_resolves = remaining;
    }
}
