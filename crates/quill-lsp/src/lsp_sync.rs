//! Protocol coordinate conversion.
//!
//! LSP positions count UTF-16 code units; the kernel counts Unicode scalar
//! values. All conversion between the two worlds is concentrated here so
//! every protocol range entering or leaving the document goes through one
//! authoritative mapping.

use quill_core::{LineIndex, Position};

/// LSP position (UTF-16 code units, 0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LspPosition {
    /// Line number (0-based).
    pub line: u32,
    /// Character offset in UTF-16 code units (0-based).
    pub character: u32,
}

impl LspPosition {
    /// Create a new protocol position.
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// LSP range (`start` inclusive, `end` exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LspRange {
    /// Range start.
    pub start: LspPosition,
    /// Range end.
    pub end: LspPosition,
}

impl LspRange {
    /// Create a new protocol range.
    pub fn new(start: LspPosition, end: LspPosition) -> Self {
        Self { start, end }
    }
}

/// Convert a `char` offset within `text` to a UTF-16 code-unit offset.
pub fn char_to_utf16(text: &str, char_offset: usize) -> usize {
    text.chars().take(char_offset).map(|c| c.len_utf16()).sum()
}

/// Convert a UTF-16 code-unit offset within `text` to a `char` offset.
///
/// Offsets landing inside a surrogate pair round down to the character start;
/// offsets past the end clamp to the character count.
pub fn utf16_to_char(text: &str, utf16_offset: usize) -> usize {
    let mut utf16 = 0;
    let mut chars = 0;
    for c in text.chars() {
        if utf16 >= utf16_offset {
            break;
        }
        utf16 += c.len_utf16();
        chars += 1;
    }
    chars
}

/// Convert an editor position (char column) to a protocol position.
pub fn position_to_lsp(line_index: &LineIndex, position: Position) -> LspPosition {
    let line_text = line_index.get_line_text(position.line).unwrap_or_default();
    let utf16 = char_to_utf16(&line_text, position.column);
    LspPosition::new(position.line as u32, utf16 as u32)
}

/// Convert a protocol position to a flat character offset.
pub fn char_offset_for_lsp_position(line_index: &LineIndex, pos: LspPosition) -> usize {
    let line = pos.line as usize;
    let line_text = line_index.get_line_text(line).unwrap_or_default();
    let column = utf16_to_char(&line_text, pos.character as usize);
    line_index.position_to_char_offset(line, column)
}

/// Convert a protocol range to `(start, end)` character offsets, normalized
/// so `start <= end`.
pub fn char_offsets_for_lsp_range(line_index: &LineIndex, range: &LspRange) -> (usize, usize) {
    let a = char_offset_for_lsp_position(line_index, range.start);
    let b = char_offset_for_lsp_position(line_index, range.end);
    (a.min(b), a.max(b))
}

/// Compute the pre-edit end position of a change from its start position and
/// the text it removed.
///
/// Needed when a change is observed after the document already mutated: the
/// start position is still valid (the text before it is untouched), and the
/// removed text determines how far the replaced range extended.
pub fn lsp_end_for_removed(start: LspPosition, removed: &str) -> LspPosition {
    if removed.is_empty() {
        return start;
    }

    let newline_count = removed.matches('\n').count();
    if newline_count == 0 {
        let len: usize = removed.chars().map(|c| c.len_utf16()).sum();
        return LspPosition::new(start.line, start.character + len as u32);
    }

    let last_line = removed.rsplit('\n').next().unwrap_or("");
    let len: usize = last_line.chars().map(|c| c.len_utf16()).sum();
    LspPosition::new(start.line + newline_count as u32, len as u32)
}

/// Convert a `(start, end)` character-offset range to a protocol range.
pub fn lsp_range_for_char_offsets(line_index: &LineIndex, start: usize, end: usize) -> LspRange {
    let (sl, sc) = line_index.char_offset_to_position(start);
    let (el, ec) = line_index.char_offset_to_position(end);
    LspRange::new(
        position_to_lsp(line_index, Position::new(sl, sc)),
        position_to_lsp(line_index, Position::new(el, ec)),
    )
}
