use quill_core::Document;
use quill_lsp::{
    EditApplier, EditDisposition, SessionEvents, TextEdit, WorkspaceEdit, apply_pending_batches,
    text_edits_from_value,
};
use serde_json::json;

fn edits(value: serde_json::Value) -> Vec<TextEdit> {
    text_edits_from_value(&value)
}

#[test]
fn test_plain_edits_are_forwarded_as_one_atomic_batch() {
    let mut doc = Document::new("let a = 1;\nlet b = 2;\n");
    let mut events = SessionEvents::new();
    let mut applier = EditApplier::without_opener();

    let edit_list = edits(json!([
        { "range": { "start": { "line": 0, "character": 4 },
                     "end": { "line": 0, "character": 5 } },
          "newText": "x" },
        { "range": { "start": { "line": 1, "character": 4 },
                     "end": { "line": 1, "character": 5 } },
          "newText": "y" },
    ]));

    let disposition = applier.apply_edits(&edit_list, &mut doc, &mut events).unwrap();
    assert_eq!(disposition, EditDisposition::Batched);

    // Nothing touched the document yet; the mutation happens on the channel
    // consumer side, atomically.
    assert_eq!(doc.text(), "let a = 1;\nlet b = 2;\n");
    assert_eq!(apply_pending_batches(&mut events, &mut doc).unwrap(), 1);
    assert_eq!(doc.text(), "let x = 1;\nlet y = 2;\n");
}

#[test]
fn test_batch_result_is_independent_of_edit_order() {
    let payload = json!([
        { "range": { "start": { "line": 0, "character": 0 },
                     "end": { "line": 0, "character": 3 } },
          "newText": "one" },
        { "range": { "start": { "line": 0, "character": 8 },
                     "end": { "line": 0, "character": 11 } },
          "newText": "two" },
    ]);

    let mut forward_list = edits(payload.clone());
    let mut doc_a = Document::new("aaa bbb ccc");
    let mut events_a = SessionEvents::new();
    let mut applier = EditApplier::without_opener();
    applier
        .apply_edits(&forward_list, &mut doc_a, &mut events_a)
        .unwrap();
    apply_pending_batches(&mut events_a, &mut doc_a).unwrap();

    forward_list.reverse();
    let mut doc_b = Document::new("aaa bbb ccc");
    let mut events_b = SessionEvents::new();
    applier
        .apply_edits(&forward_list, &mut doc_b, &mut events_b)
        .unwrap();
    apply_pending_batches(&mut events_b, &mut doc_b).unwrap();

    assert_eq!(doc_a.text(), "one bbb two");
    assert_eq!(doc_a.text(), doc_b.text());
}

#[test]
fn test_snippet_edits_apply_in_reverse_document_order() {
    let mut doc = Document::new("alpha beta");
    let mut events = SessionEvents::new();
    let mut applier = EditApplier::without_opener();

    // Listed in ascending order; the applier must process them descending so
    // the first edit's offsets stay valid while the second mutates the tail.
    let edit_list = edits(json!([
        { "range": { "start": { "line": 0, "character": 0 },
                     "end": { "line": 0, "character": 5 } },
          "newText": "${1:first}" },
        { "range": { "start": { "line": 0, "character": 6 },
                     "end": { "line": 0, "character": 10 } },
          "newText": "${2:second}($0)" },
    ]));

    let disposition = applier.apply_edits(&edit_list, &mut doc, &mut events).unwrap();
    assert_eq!(disposition, EditDisposition::SnippetSessions(2));
    assert_eq!(doc.text(), "first second()");

    let sessions = events.snippets.drain();
    assert_eq!(sessions.len(), 2);
    // The higher-offset edit was processed (and its session started) first.
    assert_eq!(sessions[0].active_range(), Some((6, 12)));
    assert_eq!(doc.slice(6, 12), "second");
    assert_eq!(sessions[1].active_range(), Some((0, 5)));
    assert_eq!(doc.slice(0, 5), "first");
}

#[test]
fn test_snippet_path_expands_plain_members_in_place() {
    let mut doc = Document::new("value");
    let mut events = SessionEvents::new();
    let mut applier = EditApplier::without_opener();

    // Marker present in the list, but this member has no tab stops: the
    // captured text feeds the selection variable and no session starts.
    let edit_list = edits(json!([
        { "range": { "start": { "line": 0, "character": 0 },
                     "end": { "line": 0, "character": 5 } },
          "newText": "Some(${TM_SELECTED_TEXT})" },
    ]));

    let disposition = applier.apply_edits(&edit_list, &mut doc, &mut events).unwrap();
    assert_eq!(disposition, EditDisposition::SnippetSessions(0));
    assert_eq!(doc.text(), "Some(value)");
    assert!(events.snippets.is_empty());
}

#[test]
fn test_workspace_edit_routes_foreign_uris_to_the_opener() {
    let mut doc = Document::new("fn main() {}\n");
    let mut events = SessionEvents::new();

    let opened: std::rc::Rc<std::cell::RefCell<Vec<(String, usize)>>> = Default::default();
    let opened_log = opened.clone();
    let mut applier = EditApplier::new(Box::new(move |uri: &str, edits: Vec<TextEdit>| {
        opened_log.borrow_mut().push((uri.to_string(), edits.len()));
    }));

    let edit = WorkspaceEdit::from_value(&json!({
        "changes": {
            "file:///open.rs": [
                { "range": { "start": { "line": 0, "character": 3 },
                             "end": { "line": 0, "character": 7 } },
                  "newText": "start" }
            ]
        },
        "documentChanges": [
            {
                "textDocument": { "uri": "file:///other.rs", "version": 3 },
                "edits": [
                    { "range": { "start": { "line": 0, "character": 0 },
                                 "end": { "line": 0, "character": 0 } },
                      "newText": "use std::fmt;\n" }
                ]
            }
        ]
    }));

    let outcome = applier
        .apply_workspace_edit(&edit, "file:///open.rs", &mut doc, &mut events)
        .unwrap();

    assert_eq!(outcome.applied_local, 1);
    assert_eq!(outcome.deferred_uris, vec!["file:///other.rs".to_string()]);
    assert_eq!(opened.borrow().as_slice(), &[("file:///other.rs".to_string(), 1)]);

    apply_pending_batches(&mut events, &mut doc).unwrap();
    assert_eq!(doc.text(), "fn start() {}\n");
}

#[test]
fn test_overlapping_batch_leaves_document_untouched() {
    let mut doc = Document::new("abcdef");
    let mut events = SessionEvents::new();
    let mut applier = EditApplier::without_opener();

    let edit_list = edits(json!([
        { "range": { "start": { "line": 0, "character": 0 },
                     "end": { "line": 0, "character": 4 } },
          "newText": "x" },
        { "range": { "start": { "line": 0, "character": 2 },
                     "end": { "line": 0, "character": 6 } },
          "newText": "y" },
    ]));

    applier.apply_edits(&edit_list, &mut doc, &mut events).unwrap();
    assert!(apply_pending_batches(&mut events, &mut doc).is_err());
    assert_eq!(doc.text(), "abcdef");
}
