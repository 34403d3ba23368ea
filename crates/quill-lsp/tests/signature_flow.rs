use quill_core::{ChangeCause, Diagnostic, DiagnosticRange, Document, Position};
use quill_lsp::{
    CodeAction, CodeActionParams, DiagnosticsController, LspPosition, LspRequests, PopupKind,
    Reply, Responder, RequestTimeouts, SessionEvents, SignatureHelp, SignatureHelpController,
    SignatureTriggerConfig, StyleRole, SyncTracker, forward_content_change, reply_pair,
};
use serde_json::json;

#[derive(Default)]
struct FakeRequests {
    signature_positions: Vec<LspPosition>,
    signature_responders: Vec<Responder<Option<SignatureHelp>>>,
}

impl LspRequests for FakeRequests {
    fn code_action(&mut self, _params: CodeActionParams) -> Result<Reply<Vec<CodeAction>>, String> {
        Ok(Reply::ready(Vec::new()))
    }

    fn resolve_code_action(&mut self, action: &CodeAction) -> Result<Reply<CodeAction>, String> {
        Ok(Reply::ready(action.clone()))
    }

    fn signature_help(
        &mut self,
        position: LspPosition,
    ) -> Result<Reply<Option<SignatureHelp>>, String> {
        self.signature_positions.push(position);
        let (reply, responder) = reply_pair();
        self.signature_responders.push(responder);
        Ok(reply)
    }
}

fn sample_help() -> SignatureHelp {
    SignatureHelp::from_value(&json!({
        "signatures": [{
            "label": "foo(a, b, c)",
            "parameters": [{ "label": "a" }, { "label": "b" }, { "label": "c" }],
        }],
        "activeSignature": 0,
        "activeParameter": 1,
    }))
    .unwrap()
}

struct Fixture {
    document: Document,
    sync: SyncTracker,
    requests: FakeRequests,
    signature: SignatureHelpController,
    diagnostics: DiagnosticsController,
    events: SessionEvents,
}

impl Fixture {
    fn new(config: SignatureTriggerConfig) -> Self {
        Self {
            document: Document::new("fn main() {\n    foo\n}\n"),
            sync: SyncTracker::new(),
            requests: FakeRequests::default(),
            signature: SignatureHelpController::new(config, RequestTimeouts::default()),
            diagnostics: DiagnosticsController::new(RequestTimeouts::default()),
            events: SessionEvents::new(),
        }
    }

    /// Type `text` at `(line, column)` and run it through the bridge.
    fn type_text(&mut self, line: usize, column: usize, text: &str, cause: ChangeCause) {
        let offset = self.document.position_to_offset(Position::new(line, column));
        let record = self
            .document
            .replace(offset, offset, text, cause)
            .unwrap();
        forward_content_change(
            &record,
            &self.document,
            &self.sync,
            &mut self.requests,
            &mut self.signature,
            &mut self.events,
        );
    }

    fn respond(&mut self, help: Option<SignatureHelp>) {
        self.requests
            .signature_responders
            .remove(0)
            .resolve(help);
        self.signature.poll(&mut self.events, &mut self.diagnostics);
    }
}

#[test]
fn test_change_is_forwarded_to_document_sync_first() {
    let mut fx = Fixture::new(SignatureTriggerConfig::default());
    fx.type_text(1, 7, "(", ChangeCause::Typing);

    let synced = fx.events.document_sync.drain();
    assert_eq!(synced.len(), 1);
    assert_eq!(synced[0].text, "(");
    // Insertion: zero-width pre-edit range at the change start.
    assert_eq!(synced[0].range.start, LspPosition::new(1, 7));
    assert_eq!(synced[0].range.end, LspPosition::new(1, 7));

    // The runtime has not acknowledged the ticket yet.
    assert!(!fx.sync.is_idle());
    fx.sync.acknowledge(synced[0].ticket);
    assert!(fx.sync.is_idle());
}

#[test]
fn test_trigger_character_requests_right_after_itself() {
    let mut fx = Fixture::new(SignatureTriggerConfig::default());
    fx.type_text(1, 7, "(", ChangeCause::Typing);

    assert_eq!(fx.requests.signature_positions.len(), 1);
    assert_eq!(fx.requests.signature_positions[0], LspPosition::new(1, 8));
}

#[test]
fn test_non_trigger_insertion_requests_at_change_start() {
    let mut fx = Fixture::new(SignatureTriggerConfig::default());
    fx.type_text(1, 7, "x", ChangeCause::Typing);

    assert_eq!(fx.requests.signature_positions.len(), 1);
    assert_eq!(fx.requests.signature_positions[0], LspPosition::new(1, 7));
}

#[test]
fn test_undo_replay_does_not_scan_for_triggers() {
    let mut fx = Fixture::new(SignatureTriggerConfig::default());
    fx.type_text(1, 7, "(", ChangeCause::UndoRedo);

    // Requested at the raw change start, not after the bracket.
    assert_eq!(fx.requests.signature_positions[0], LspPosition::new(1, 7));
}

#[test]
fn test_retrigger_hides_even_with_trigger_present() {
    let config = SignatureTriggerConfig {
        retrigger_chars: vec![')'],
        ..SignatureTriggerConfig::default()
    };
    let mut fx = Fixture::new(config);

    // Get signature help on screen first.
    fx.type_text(1, 7, "(", ChangeCause::Typing);
    fx.respond(Some(sample_help()));
    assert!(fx.signature.is_visible());

    // The insertion contains both a trigger and a retrigger character; the
    // retrigger wins unconditionally.
    fx.type_text(1, 8, "()", ChangeCause::Typing);
    assert!(!fx.signature.is_visible());
    // No second request went out.
    assert_eq!(fx.requests.signature_positions.len(), 1);
}

#[test]
fn test_successful_response_renders_and_shows() {
    let mut fx = Fixture::new(SignatureTriggerConfig::default());
    fx.type_text(1, 7, "(", ChangeCause::Typing);
    fx.respond(Some(sample_help()));

    assert!(fx.signature.is_visible());
    let rendered = fx.signature.current().unwrap();
    assert_eq!(rendered.text.lines[0].text(), "foo(a, b, c)");

    let b_span = rendered.text.lines[0]
        .spans
        .iter()
        .find(|s| s.text == "b")
        .unwrap();
    assert_eq!(b_span.style.role, StyleRole::HighlightedParameter);
    assert!(b_span.style.bold);
}

#[test]
fn test_null_response_hides() {
    let mut fx = Fixture::new(SignatureTriggerConfig::default());
    fx.type_text(1, 7, "(", ChangeCause::Typing);
    fx.respond(Some(sample_help()));
    assert!(fx.signature.is_visible());

    fx.type_text(1, 8, "x", ChangeCause::Typing);
    fx.respond(None);
    assert!(!fx.signature.is_visible());
    assert!(fx.signature.current().is_none());
}

#[test]
fn test_invalid_indices_do_not_show_a_popup() {
    let mut fx = Fixture::new(SignatureTriggerConfig::default());
    fx.type_text(1, 7, "(", ChangeCause::Typing);

    let help = SignatureHelp::from_value(&json!({
        "signatures": [{ "label": "foo(a)", "parameters": [{ "label": "a" }] }],
        "activeSignature": -1,
        "activeParameter": 0,
    }))
    .unwrap();
    fx.respond(Some(help));
    assert!(!fx.signature.is_visible());
}

#[test]
fn test_new_result_replaces_the_previous_one() {
    let mut fx = Fixture::new(SignatureTriggerConfig::default());
    fx.type_text(1, 7, "(", ChangeCause::Typing);
    fx.respond(Some(sample_help()));

    let other = SignatureHelp::from_value(&json!({
        "signatures": [{
            "label": "bar(x)",
            "parameters": [{ "label": "x" }],
        }],
        "activeSignature": 0,
        "activeParameter": 0,
    }))
    .unwrap();

    fx.type_text(1, 8, "x", ChangeCause::Typing);
    fx.respond(Some(other));

    let rendered = fx.signature.current().unwrap();
    assert_eq!(rendered.text.lines[0].text(), "bar(x)");
}

#[test]
fn test_showing_signature_help_evicts_other_popups() {
    let mut fx = Fixture::new(SignatureTriggerConfig::default());

    // A diagnostic tooltip is up.
    fx.diagnostics.update_diagnostic(
        Some(Diagnostic {
            range: DiagnosticRange::new(16, 19),
            severity: None,
            code: None,
            source: None,
            brief_message: "whoops".to_string(),
            detailed_message: "whoops".to_string(),
            payload_json: None,
        }),
        Position::new(1, 4),
        false,
        &mut fx.events,
    );
    assert!(fx.diagnostics.is_visible());
    let _ = fx.events.popups.drain();

    fx.type_text(1, 7, "(", ChangeCause::Typing);
    fx.respond(Some(sample_help()));

    assert!(fx.signature.is_visible());
    assert!(!fx.diagnostics.is_visible());

    let popups = fx.events.popups.drain();
    // Eviction order: completion out, diagnostic out, signature in.
    assert!(popups
        .iter()
        .any(|p| p.kind == PopupKind::Completion && !p.visible));
    assert!(popups
        .iter()
        .any(|p| p.kind == PopupKind::Diagnostic && !p.visible));
    assert!(popups
        .iter()
        .any(|p| p.kind == PopupKind::SignatureHelp && p.visible));
}

#[test]
fn test_stale_signature_response_is_ignored() {
    let mut fx = Fixture::new(SignatureTriggerConfig::default());
    fx.type_text(1, 7, "(", ChangeCause::Typing);
    // A newer request supersedes the first before it answered.
    fx.type_text(1, 8, "x", ChangeCause::Typing);
    assert_eq!(fx.requests.signature_responders.len(), 2);

    // The stale responder answers; the pending request is the newer one, so
    // nothing shows from the old payload.
    fx.requests
        .signature_responders
        .remove(0)
        .resolve(Some(sample_help()));
    fx.signature.poll(&mut fx.events, &mut fx.diagnostics);
    assert!(!fx.signature.is_visible());

    // The newer responder answers and wins.
    fx.requests
        .signature_responders
        .remove(0)
        .resolve(Some(sample_help()));
    fx.signature.poll(&mut fx.events, &mut fx.diagnostics);
    assert!(fx.signature.is_visible());
}
