//! Signature-help controller and renderer.
//!
//! Typing inside an argument list drives a request/render loop: bracket
//! characters (re)issue `textDocument/signatureHelp`, retrigger characters
//! hide it, and a successful response renders to styled spans - overloads up
//! to the active one for context, the active parameter highlighted, the
//! active signature's documentation appended (markdown-aware).
//!
//! Exactly one rendered signature help is current at a time. Showing a new
//! one replaces the old and pushes the completion list and diagnostic
//! tooltip off screen; screen space near the cursor is exclusive.

use crate::diagnostics::DiagnosticsController;
use crate::events::{PopupKind, SessionEvents};
use crate::lsp_data::{
    Documentation, ParameterLabel, SignatureHelp, SignatureInformation,
};
use crate::lsp_sync::{position_to_lsp, utf16_to_char};
use crate::markdown::MarkdownRenderer;
use crate::popup::{self, PopupAnchor, PopupPlacement, PopupSize, Viewport};
use crate::session::{LspRequests, Reply, ReplyState, RequestTimeouts};
use crate::styled::{SpanStyle, StyleRole, StyledLine, StyledText};
use quill_core::{Document, Position};
use std::time::Instant;

/// Trigger behavior configuration.
///
/// Trigger characters start or move a request when typed; retrigger
/// characters (usually the server's `retriggerCharacters`, e.g. `)`) hide the
/// popup.
#[derive(Debug, Clone)]
pub struct SignatureTriggerConfig {
    /// Characters that request signature help right after them.
    pub trigger_chars: Vec<char>,
    /// Characters that dismiss signature help when typed.
    pub retrigger_chars: Vec<char>,
}

impl Default for SignatureTriggerConfig {
    fn default() -> Self {
        Self {
            trigger_chars: vec!['(', '<'],
            retrigger_chars: Vec::new(),
        }
    }
}

#[derive(Debug)]
struct PendingRequest {
    generation: u64,
    reply: Reply<Option<SignatureHelp>>,
    deadline: Instant,
}

/// A signature help result together with its rendered form.
#[derive(Debug, Clone)]
pub struct RenderedSignatureHelp {
    /// The protocol payload that was rendered.
    pub help: SignatureHelp,
    /// The styled popup content.
    pub text: StyledText,
}

/// Controller for the signature-help popup.
pub struct SignatureHelpController {
    enabled: bool,
    visible: bool,
    generation: u64,
    pending: Option<PendingRequest>,
    current: Option<RenderedSignatureHelp>,
    config: SignatureTriggerConfig,
    timeouts: RequestTimeouts,
    markdown: MarkdownRenderer,
}

impl SignatureHelpController {
    /// Create an enabled controller with Rust code-block highlighting for
    /// markdown documentation.
    pub fn new(config: SignatureTriggerConfig, timeouts: RequestTimeouts) -> Self {
        Self {
            enabled: true,
            visible: false,
            generation: 0,
            pending: None,
            current: None,
            config,
            timeouts,
            markdown: MarkdownRenderer::with_rust_highlighting(),
        }
    }

    /// The trigger configuration.
    pub fn config(&self) -> &SignatureTriggerConfig {
        &self.config
    }

    /// Returns `true` while the controller reacts to triggers.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the controller. Disabling dismisses the popup.
    pub fn set_enabled(&mut self, enabled: bool, events: &mut SessionEvents) {
        self.enabled = enabled;
        if !enabled {
            self.hide(events);
        }
    }

    /// Returns `true` while the popup is on screen.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// The currently rendered signature help, if any.
    pub fn current(&self) -> Option<&RenderedSignatureHelp> {
        self.current.as_ref()
    }

    /// Hide the popup and drop any pending request.
    pub fn hide(&mut self, events: &mut SessionEvents) {
        if self.visible {
            events.emit_popup(PopupKind::SignatureHelp, false);
        }
        self.visible = false;
        self.current = None;
        self.pending = None;
    }

    /// Issue a signature-help request at an editor position.
    ///
    /// At most one request is outstanding; a newer request replaces the old
    /// one, whose response will be ignored.
    pub fn request_at<R: LspRequests + ?Sized>(
        &mut self,
        position: Position,
        document: &Document,
        requests: &mut R,
    ) {
        if !self.enabled {
            return;
        }

        let lsp_position = position_to_lsp(document.line_index(), position);
        match requests.signature_help(lsp_position) {
            Ok(reply) => {
                self.generation += 1;
                self.pending = Some(PendingRequest {
                    generation: self.generation,
                    reply,
                    deadline: Instant::now() + self.timeouts.signature_help,
                });
            }
            Err(err) => {
                tracing::warn!(error = %err, "signatureHelp request could not be issued");
            }
        }
    }

    /// Check the pending request and show its result when it arrives.
    pub fn poll(&mut self, events: &mut SessionEvents, diagnostics: &mut DiagnosticsController) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        match pending.reply.poll() {
            ReplyState::Ready(result) => {
                if pending.generation == self.generation {
                    self.show(result, events, diagnostics);
                }
            }
            ReplyState::Failed(err) => {
                tracing::warn!(error = %err, "signatureHelp request failed");
                self.hide(events);
            }
            ReplyState::Pending => {
                if Instant::now() >= pending.deadline {
                    // Keep whatever is currently shown; a timed-out request
                    // just evaporates.
                    tracing::debug!("signatureHelp request timed out");
                } else {
                    self.pending = Some(pending);
                }
            }
        }
    }

    /// Show a signature help result, or hide with `None`.
    ///
    /// Rendering that produces no visible text dismisses instead of showing
    /// an empty window. Showing evicts the completion list and the diagnostic
    /// tooltip.
    pub fn show(
        &mut self,
        help: Option<SignatureHelp>,
        events: &mut SessionEvents,
        diagnostics: &mut DiagnosticsController,
    ) {
        let Some(help) = help else {
            self.hide(events);
            return;
        };

        let Some(text) = render_signature_help(&help, &self.markdown) else {
            self.hide(events);
            return;
        };

        events.emit_popup(PopupKind::Completion, false);
        diagnostics.dismiss(events);

        self.current = Some(RenderedSignatureHelp { help, text });
        if !self.visible {
            self.visible = true;
            events.emit_popup(PopupKind::SignatureHelp, true);
        }
    }

    /// Compute a popup placement, dismissing on geometry faults.
    pub fn reposition(
        &mut self,
        anchor: PopupAnchor,
        viewport: Viewport,
        size: PopupSize,
        events: &mut SessionEvents,
    ) -> Option<PopupPlacement> {
        if !self.visible {
            return None;
        }
        match popup::place(anchor, viewport, size) {
            Ok(placement) => Some(placement),
            Err(err) => {
                tracing::debug!(error = %err, "signature popup placement failed, dismissing");
                self.hide(events);
                None
            }
        }
    }
}

/// Render a signature help payload to styled text.
///
/// Returns `None` (popup should not be shown) when the active indices are
/// negative or out of range, or when nothing visible would be rendered.
pub fn render_signature_help(
    help: &SignatureHelp,
    markdown: &MarkdownRenderer,
) -> Option<StyledText> {
    if help.active_signature < 0 || help.active_parameter < 0 {
        tracing::debug!(
            active_signature = help.active_signature,
            active_parameter = help.active_parameter,
            "negative active signature/parameter index"
        );
        return None;
    }
    let active_signature = help.active_signature as usize;
    if active_signature >= help.signatures.len() {
        tracing::debug!(
            active_signature,
            count = help.signatures.len(),
            "active signature out of range"
        );
        return None;
    }
    let active_parameter = help.active_parameter as usize;

    let mut text = StyledText::new();

    // Every overload up to and including the active one, so the reader can
    // see where the active candidate sits.
    for (i, signature) in help.signatures[..=active_signature].iter().enumerate() {
        let is_current = i == active_signature;
        let Some(line) = format_signature(signature, active_parameter, is_current) else {
            continue;
        };
        text.push_line(if is_current { line.bolded() } else { line });
    }

    if let Some(doc) = &help.signatures[active_signature].documentation {
        text.push_blank();
        match doc {
            Documentation::PlainText(plain) => {
                for part in plain.split('\n') {
                    let mut line = StyledLine::new();
                    line.push(part, SpanStyle::DEFAULT);
                    text.push_line(line);
                }
            }
            Documentation::Markdown(source) => {
                for line in markdown.render(source) {
                    text.push_line(line);
                }
            }
        }
    }

    if text.is_blank() {
        return None;
    }
    Some(text)
}

fn format_signature(
    signature: &SignatureInformation,
    active_parameter: usize,
    is_current: bool,
) -> Option<StyledLine> {
    let label = &signature.label;
    let (bracket_byte, bracket) = label.char_indices().find(|(_, c)| *c == '(' || *c == '<')?;

    let mut line = StyledLine::new();
    line.push(&label[..bracket_byte], SpanStyle::DEFAULT);
    line.push(bracket.to_string(), SpanStyle::DEFAULT);

    let highlight = SpanStyle::new(StyleRole::HighlightedParameter);
    let parameter_count = signature.parameters.len();

    for (i, parameter) in signature.parameters.iter().enumerate() {
        let text = match &parameter.label {
            ParameterLabel::Text(text) => text.clone(),
            ParameterLabel::Span(start, end) => {
                let start_char = utf16_to_char(label, *start);
                let end_char = utf16_to_char(label, *end);
                label
                    .chars()
                    .skip(start_char)
                    .take(end_char.saturating_sub(start_char))
                    .collect()
            }
        };

        let is_active = is_current && i == active_parameter;
        if is_active {
            line.push(text, highlight.bold());
            if i + 1 != parameter_count {
                line.push(", ", highlight);
            }
        } else {
            line.push(text, SpanStyle::DEFAULT);
            if i + 1 != parameter_count {
                line.push(", ", SpanStyle::DEFAULT);
            }
        }
    }

    let closing = match bracket {
        '(' => ")",
        '<' => ">",
        _ => "",
    };
    line.push(closing, SpanStyle::DEFAULT);

    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn renderer() -> MarkdownRenderer {
        MarkdownRenderer::with_rust_highlighting()
    }

    fn help_from_json(value: serde_json::Value) -> SignatureHelp {
        SignatureHelp::from_value(&value).expect("signature help")
    }

    #[test]
    fn test_negative_indices_render_nothing() {
        let help = help_from_json(json!({
            "signatures": [{ "label": "foo(a)", "parameters": [{ "label": "a" }] }],
            "activeSignature": -1,
            "activeParameter": 0,
        }));
        assert!(render_signature_help(&help, &renderer()).is_none());

        let help = help_from_json(json!({
            "signatures": [{ "label": "foo(a)", "parameters": [{ "label": "a" }] }],
            "activeSignature": 0,
            "activeParameter": -1,
        }));
        assert!(render_signature_help(&help, &renderer()).is_none());
    }

    #[test]
    fn test_out_of_range_signature_renders_nothing() {
        let help = help_from_json(json!({
            "signatures": [{ "label": "foo(a)", "parameters": [{ "label": "a" }] }],
            "activeSignature": 3,
            "activeParameter": 0,
        }));
        assert!(render_signature_help(&help, &renderer()).is_none());
    }

    #[test]
    fn test_active_parameter_highlighting() {
        let help = help_from_json(json!({
            "signatures": [{
                "label": "foo(a, b, c)",
                "parameters": [{ "label": "a" }, { "label": "b" }, { "label": "c" }],
            }],
            "activeSignature": 0,
            "activeParameter": 1,
        }));

        let text = render_signature_help(&help, &renderer()).expect("rendered");
        let line = &text.lines[0];
        assert_eq!(line.text(), "foo(a, b, c)");

        let b_span = line.spans.iter().find(|s| s.text == "b").expect("b span");
        assert_eq!(b_span.style.role, StyleRole::HighlightedParameter);
        assert!(b_span.style.bold);

        let a_span = line.spans.iter().find(|s| s.text.contains('a')).unwrap();
        assert_eq!(a_span.style.role, StyleRole::Default);

        // The whole active signature is bold.
        assert!(line.spans.iter().all(|s| s.style.bold));
    }

    #[test]
    fn test_active_parameter_separator_is_highlighted() {
        let help = help_from_json(json!({
            "signatures": [{
                "label": "foo(a, b, c)",
                "parameters": [{ "label": "a" }, { "label": "b" }, { "label": "c" }],
            }],
            "activeSignature": 0,
            "activeParameter": 1,
        }));

        let text = render_signature_help(&help, &renderer()).unwrap();
        let spans = &text.lines[0].spans;
        // "b" and its trailing ", " share the highlight role; they may merge
        // only if styles are identical, which they are not (bold differs).
        let b_index = spans.iter().position(|s| s.text == "b").unwrap();
        assert_eq!(spans[b_index + 1].text, ", ");
        assert_eq!(spans[b_index + 1].style.role, StyleRole::HighlightedParameter);
    }

    #[test]
    fn test_overloads_render_up_to_active() {
        let help = help_from_json(json!({
            "signatures": [
                { "label": "get(i)", "parameters": [{ "label": "i" }] },
                { "label": "get(i, default)",
                  "parameters": [{ "label": "i" }, { "label": "default" }] },
                { "label": "get(i, default, extra)",
                  "parameters": [{ "label": "i" }, { "label": "default" }, { "label": "extra" }] },
            ],
            "activeSignature": 1,
            "activeParameter": 0,
        }));

        let text = render_signature_help(&help, &renderer()).unwrap();
        // Signatures 0 and 1 render; signature 2 does not.
        assert_eq!(text.lines.len(), 2);
        assert_eq!(text.lines[0].text(), "get(i)");
        assert_eq!(text.lines[1].text(), "get(i, default)");
        // Only the active line is bold.
        assert!(text.lines[0].spans.iter().all(|s| !s.style.bold));
        assert!(text.lines[1].spans.iter().all(|s| s.style.bold));
    }

    #[test]
    fn test_generic_brackets_close_with_angle() {
        let help = help_from_json(json!({
            "signatures": [{
                "label": "Vec<T>",
                "parameters": [{ "label": "T" }],
            }],
            "activeSignature": 0,
            "activeParameter": 0,
        }));

        let text = render_signature_help(&help, &renderer()).unwrap();
        assert_eq!(text.lines[0].text(), "Vec<T>");
    }

    #[test]
    fn test_label_span_parameters_slice_utf16() {
        // "foo(α, b)" - α is one UTF-16 unit; spans index into the label.
        let help = help_from_json(json!({
            "signatures": [{
                "label": "foo(α, b)",
                "parameters": [{ "label": [4, 5] }, { "label": [7, 8] }],
            }],
            "activeSignature": 0,
            "activeParameter": 0,
        }));

        let text = render_signature_help(&help, &renderer()).unwrap();
        assert_eq!(text.lines[0].text(), "foo(α, b)");
        let alpha = text.lines[0]
            .spans
            .iter()
            .find(|s| s.text == "α")
            .expect("alpha span");
        assert_eq!(alpha.style.role, StyleRole::HighlightedParameter);
    }

    #[test]
    fn test_signature_without_brackets_is_skipped() {
        let help = help_from_json(json!({
            "signatures": [{ "label": "no brackets here", "parameters": [] }],
            "activeSignature": 0,
            "activeParameter": 0,
        }));
        assert!(render_signature_help(&help, &renderer()).is_none());
    }

    #[test]
    fn test_plain_documentation_appends_after_blank_line() {
        let help = help_from_json(json!({
            "signatures": [{
                "label": "foo(a)",
                "parameters": [{ "label": "a" }],
                "documentation": "Does a thing.",
            }],
            "activeSignature": 0,
            "activeParameter": 0,
        }));

        let text = render_signature_help(&help, &renderer()).unwrap();
        assert_eq!(text.lines.len(), 3);
        assert!(text.lines[1].is_blank());
        assert_eq!(text.lines[2].text(), "Does a thing.");
    }

    #[test]
    fn test_markdown_documentation_is_rendered() {
        let help = help_from_json(json!({
            "signatures": [{
                "label": "foo(a)",
                "parameters": [{ "label": "a" }],
                "documentation": { "kind": "markdown", "value": "Use `foo` **carefully**." },
            }],
            "activeSignature": 0,
            "activeParameter": 0,
        }));

        let text = render_signature_help(&help, &renderer()).unwrap();
        let doc_line = text.lines.last().unwrap();
        let code = doc_line.spans.iter().find(|s| s.text == "foo").unwrap();
        assert_eq!(code.style.role, StyleRole::InlineCode);
        let bold = doc_line.spans.iter().find(|s| s.text == "carefully").unwrap();
        assert!(bold.style.bold);
    }

    #[test]
    fn test_out_of_range_active_parameter_highlights_nothing() {
        let help = help_from_json(json!({
            "signatures": [{
                "label": "foo(a)",
                "parameters": [{ "label": "a" }],
            }],
            "activeSignature": 0,
            "activeParameter": 9,
        }));

        let text = render_signature_help(&help, &renderer()).unwrap();
        assert!(text.lines[0]
            .spans
            .iter()
            .all(|s| s.style.role == StyleRole::Default));
    }
}
