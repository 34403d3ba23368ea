//! Typed protocol payloads.
//!
//! This crate intentionally avoids a full `lsp-types` dependency. It parses
//! the small protocol subset the controllers need out of `serde_json::Value`,
//! keeping raw payloads around where a later round-trip (code action resolve)
//! must hand the server back exactly what it sent.

use crate::lsp_sync::{LspPosition, LspRange, char_offsets_for_lsp_range};
use quill_core::{Diagnostic, DiagnosticRange, DiagnosticSeverity, LineIndex};
use serde_json::Value;

fn lsp_position_from_value(value: &Value) -> Option<LspPosition> {
    let line = value.get("line")?.as_u64()? as u32;
    let character = value.get("character")?.as_u64()? as u32;
    Some(LspPosition { line, character })
}

/// Parse a `Range`-shaped JSON value.
pub fn lsp_range_from_value(value: &Value) -> Option<LspRange> {
    let start = lsp_position_from_value(value.get("start")?)?;
    let end = lsp_position_from_value(value.get("end")?)?;
    Some(LspRange { start, end })
}

/// Serialize an [`LspRange`] back into protocol JSON.
pub fn lsp_range_to_value(range: &LspRange) -> Value {
    serde_json::json!({
        "start": { "line": range.start.line, "character": range.start.character },
        "end": { "line": range.end.line, "character": range.end.character },
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A minimal representation of an LSP `TextEdit`.
pub struct TextEdit {
    /// The range to replace (UTF-16 based positions).
    pub range: LspRange,
    /// Replacement text (may contain newlines).
    pub new_text: String,
}

impl TextEdit {
    /// Parse a `TextEdit`-shaped JSON value.
    pub fn from_value(value: &Value) -> Option<Self> {
        let range = lsp_range_from_value(value.get("range")?)?;
        let new_text = value
            .get("newText")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        Some(Self { range, new_text })
    }
}

/// Parse a JSON array of `TextEdit` values.
pub fn text_edits_from_value(value: &Value) -> Vec<TextEdit> {
    value
        .as_array()
        .map(|arr| arr.iter().filter_map(TextEdit::from_value).collect())
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Edits for one document out of a `WorkspaceEdit.documentChanges` entry.
pub struct DocumentEdit {
    /// Target document URI.
    pub uri: String,
    /// Ordered edit list for that document.
    pub edits: Vec<TextEdit>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// A parsed LSP `WorkspaceEdit`.
///
/// Both protocol variants are preserved: the flat `changes` map and the
/// richer `documentChanges` list (only `TextDocumentEdit` entries; resource
/// operations like file create/rename are not part of this integration).
pub struct WorkspaceEdit {
    /// `changes[uri]` entries in document order.
    pub changes: Vec<(String, Vec<TextEdit>)>,
    /// `documentChanges` entries in protocol order.
    pub document_changes: Vec<DocumentEdit>,
}

impl WorkspaceEdit {
    /// Parse a `WorkspaceEdit`-shaped JSON value.
    pub fn from_value(value: &Value) -> Self {
        let mut changes = Vec::new();
        if let Some(map) = value.get("changes").and_then(Value::as_object) {
            for (uri, edits) in map {
                changes.push((uri.clone(), text_edits_from_value(edits)));
            }
        }

        let mut document_changes = Vec::new();
        if let Some(entries) = value.get("documentChanges").and_then(Value::as_array) {
            for entry in entries {
                // TextDocumentEdit: { textDocument: { uri, version? }, edits: [...] }
                let Some(uri) = entry
                    .get("textDocument")
                    .and_then(|d| d.get("uri"))
                    .and_then(Value::as_str)
                else {
                    continue;
                };
                let edits = entry
                    .get("edits")
                    .map(text_edits_from_value)
                    .unwrap_or_default();
                document_changes.push(DocumentEdit {
                    uri: uri.to_string(),
                    edits,
                });
            }
        }

        Self {
            changes,
            document_changes,
        }
    }

    /// Returns `true` if the edit carries no text edits at all.
    pub fn is_empty(&self) -> bool {
        self.changes.iter().all(|(_, edits)| edits.is_empty())
            && self.document_changes.iter().all(|d| d.edits.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Severity levels of protocol diagnostics.
pub enum LspDiagnosticSeverity {
    /// Error diagnostics.
    Error,
    /// Warning diagnostics.
    Warning,
    /// Informational diagnostics.
    Information,
    /// Hint diagnostics.
    Hint,
}

impl LspDiagnosticSeverity {
    /// Convert the numeric LSP `DiagnosticSeverity` into an enum.
    pub fn from_u64(value: u64) -> Option<Self> {
        match value {
            1 => Some(Self::Error),
            2 => Some(Self::Warning),
            3 => Some(Self::Information),
            4 => Some(Self::Hint),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A protocol diagnostic, with its raw payload retained.
pub struct LspDiagnostic {
    /// Diagnostic range (UTF-16 positions).
    pub range: LspRange,
    /// Optional severity.
    pub severity: Option<LspDiagnosticSeverity>,
    /// Optional diagnostic code (number or string).
    pub code: Option<Value>,
    /// Optional source (e.g. `"rust-analyzer"`).
    pub source: Option<String>,
    /// Diagnostic message.
    pub message: String,
    /// The raw protocol value, handed back verbatim in code-action requests.
    pub raw: Value,
}

impl LspDiagnostic {
    /// Parse a `Diagnostic`-shaped JSON value.
    pub fn from_value(value: &Value) -> Option<Self> {
        let range = lsp_range_from_value(value.get("range")?)?;
        let severity = value
            .get("severity")
            .and_then(Value::as_u64)
            .and_then(LspDiagnosticSeverity::from_u64);
        let code = value.get("code").cloned();
        let source = value
            .get("source")
            .and_then(Value::as_str)
            .map(|s| s.to_string());
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        Some(Self {
            range,
            severity,
            code,
            source,
            message,
            raw: value.clone(),
        })
    }

    /// Convert into the kernel diagnostic model, resolving the protocol range
    /// against the current document.
    ///
    /// The brief message is the first line of the protocol message; the
    /// detailed message is the full text, prefixed with `source(code)` when
    /// the producer identified itself.
    pub fn to_document_diagnostic(&self, line_index: &LineIndex) -> Diagnostic {
        let (start, end) = char_offsets_for_lsp_range(line_index, &self.range);

        let brief = self
            .message
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();

        let code = match self.code.as_ref() {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        let detailed = match (&self.source, &code) {
            (Some(source), Some(code)) => format!("{}({}): {}", source, code, self.message),
            (Some(source), None) => format!("{}: {}", source, self.message),
            _ => self.message.clone(),
        };

        Diagnostic {
            range: DiagnosticRange::new(start, end),
            severity: match self.severity {
                Some(LspDiagnosticSeverity::Error) => Some(DiagnosticSeverity::Error),
                Some(LspDiagnosticSeverity::Warning) => Some(DiagnosticSeverity::Warning),
                Some(LspDiagnosticSeverity::Information) => Some(DiagnosticSeverity::Information),
                Some(LspDiagnosticSeverity::Hint) => Some(DiagnosticSeverity::Hint),
                None => None,
            },
            code,
            source: self.source.clone(),
            brief_message: brief,
            detailed_message: detailed,
            payload_json: Some(self.raw.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A server-suggested code action.
pub struct CodeAction {
    /// Display title.
    pub title: String,
    /// Optional action kind (e.g. `"quickfix"`).
    pub kind: Option<String>,
    /// Direct workspace edit, when the server sent one up front.
    pub edit: Option<WorkspaceEdit>,
    /// The raw protocol value, required by `codeAction/resolve`.
    pub raw: Value,
}

impl CodeAction {
    /// Parse a `CodeAction`-shaped JSON value.
    ///
    /// Bare `Command` entries (the left arm of the protocol's
    /// `Command | CodeAction` union, recognizable by a string `command`
    /// field) are not applicable client-side and yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        if value.get("command").is_some_and(Value::is_string) {
            return None;
        }

        let title = value.get("title")?.as_str()?.to_string();
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .map(|s| s.to_string());
        let edit = value.get("edit").map(WorkspaceEdit::from_value);

        Some(Self {
            title,
            kind,
            edit,
            raw: value.clone(),
        })
    }
}

/// Parse a `textDocument/codeAction` result (array of `Command | CodeAction`).
pub fn code_actions_from_value(value: &Value) -> Vec<CodeAction> {
    value
        .as_array()
        .map(|arr| arr.iter().filter_map(CodeAction::from_value).collect())
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A parameter label: either literal text or a UTF-16 slice of the signature
/// label.
pub enum ParameterLabel {
    /// Literal parameter text.
    Text(String),
    /// `[start, end)` offsets into the signature label, in UTF-16 code units.
    Span(usize, usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Signature documentation, plain or markdown.
pub enum Documentation {
    /// Verbatim plain text.
    PlainText(String),
    /// Markdown source to be rendered.
    Markdown(String),
}

impl Documentation {
    fn from_value(value: &Value) -> Option<Self> {
        if let Some(text) = value.as_str() {
            return Some(Self::PlainText(text.to_string()));
        }
        let text = value.get("value")?.as_str()?.to_string();
        match value.get("kind").and_then(Value::as_str) {
            Some("markdown") => Some(Self::Markdown(text)),
            _ => Some(Self::PlainText(text)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One parameter of a signature.
pub struct ParameterInformation {
    /// Parameter label.
    pub label: ParameterLabel,
}

impl ParameterInformation {
    fn from_value(value: &Value) -> Option<Self> {
        let label = value.get("label")?;
        if let Some(text) = label.as_str() {
            return Some(Self {
                label: ParameterLabel::Text(text.to_string()),
            });
        }
        let arr = label.as_array()?;
        let start = arr.first()?.as_u64()? as usize;
        let end = arr.get(1)?.as_u64()? as usize;
        Some(Self {
            label: ParameterLabel::Span(start, end),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One callable signature (an overload candidate).
pub struct SignatureInformation {
    /// Full signature label, e.g. `"fn foo(a: u32, b: &str)"`.
    pub label: String,
    /// Parameters in declaration order.
    pub parameters: Vec<ParameterInformation>,
    /// Optional documentation.
    pub documentation: Option<Documentation>,
}

impl SignatureInformation {
    fn from_value(value: &Value) -> Option<Self> {
        let label = value.get("label")?.as_str()?.to_string();
        let parameters = value
            .get("parameters")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(ParameterInformation::from_value)
                    .collect()
            })
            .unwrap_or_default();
        let documentation = value.get("documentation").and_then(Documentation::from_value);

        Some(Self {
            label,
            parameters,
            documentation,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A `textDocument/signatureHelp` result.
///
/// The active indices are kept signed: servers have been observed to send
/// `-1`, and rendering must treat that as "nothing to show" rather than
/// panic or wrap.
pub struct SignatureHelp {
    /// Overload candidates.
    pub signatures: Vec<SignatureInformation>,
    /// Index of the active signature.
    pub active_signature: i64,
    /// Index of the active parameter within the active signature.
    pub active_parameter: i64,
}

impl SignatureHelp {
    /// Parse a `SignatureHelp`-shaped JSON value. Returns `None` for `null`
    /// results (no signature help at this position).
    pub fn from_value(value: &Value) -> Option<Self> {
        if value.is_null() {
            return None;
        }
        let signatures = value
            .get("signatures")?
            .as_array()?
            .iter()
            .filter_map(SignatureInformation::from_value)
            .collect();
        // Missing indices default to 0 per the protocol.
        let active_signature = value
            .get("activeSignature")
            .and_then(Value::as_i64)
            .unwrap_or(0);
        let active_parameter = value
            .get("activeParameter")
            .and_then(Value::as_i64)
            .unwrap_or(0);

        Some(Self {
            signatures,
            active_signature,
            active_parameter,
        })
    }
}
