//! Rope-backed line index.
//!
//! Provides line access and the authoritative conversion between `(line,
//! column)` positions and flat character offsets. Every protocol range that
//! reaches the document goes through this mapping.

use ropey::Rope;

/// Line index over the document text.
///
/// Backed by a rope, so line lookup, insertion and deletion are O(log n) and
/// large documents stay cheap to edit.
pub struct LineIndex {
    rope: Rope,
}

impl LineIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Build an index from text.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Total line count. An empty document has one (empty) line.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Total character count.
    pub fn char_count(&self) -> usize {
        self.rope.len_chars()
    }

    /// Convert a character offset into `(line, column)`.
    ///
    /// Offsets past the end of the document clamp to the last position.
    pub fn char_offset_to_position(&self, char_offset: usize) -> (usize, usize) {
        let char_offset = char_offset.min(self.rope.len_chars());
        let line = self.rope.char_to_line(char_offset);
        let line_start = self.rope.line_to_char(line);
        (line, char_offset - line_start)
    }

    /// Convert `(line, column)` into a character offset.
    ///
    /// Out-of-range lines clamp to the end of the document; out-of-range
    /// columns clamp to the end of the line (excluding its newline).
    pub fn position_to_char_offset(&self, line: usize, column: usize) -> usize {
        if line >= self.rope.len_lines() {
            return self.rope.len_chars();
        }

        let line_start = self.rope.line_to_char(line);
        let line_len = if line + 1 < self.rope.len_lines() {
            // -1 for the newline separating this line from the next.
            self.rope.line_to_char(line + 1) - line_start - 1
        } else {
            self.rope.len_chars() - line_start
        };

        line_start + column.min(line_len)
    }

    /// Text of the given line, without its trailing newline.
    pub fn get_line_text(&self, line: usize) -> Option<String> {
        if line >= self.rope.len_lines() {
            return None;
        }

        let mut text = self.rope.line(line).to_string();
        if text.ends_with('\n') {
            text.pop();
            if text.ends_with('\r') {
                text.pop();
            }
        }
        Some(text)
    }

    /// Text of the character range `start..end`.
    pub fn slice(&self, start: usize, end: usize) -> String {
        let start = start.min(self.rope.len_chars());
        let end = end.clamp(start, self.rope.len_chars());
        self.rope.slice(start..end).to_string()
    }

    /// Insert text at a character offset (clamped to the document end).
    pub fn insert(&mut self, char_offset: usize, text: &str) {
        let char_offset = char_offset.min(self.rope.len_chars());
        self.rope.insert(char_offset, text);
    }

    /// Remove the character range `start..end` (clamped to the document).
    pub fn remove(&mut self, start: usize, end: usize) {
        let start = start.min(self.rope.len_chars());
        let end = end.clamp(start, self.rope.len_chars());
        if start < end {
            self.rope.remove(start..end);
        }
    }

    /// Full document text.
    pub fn get_text(&self) -> String {
        self.rope.to_string()
    }
}

impl Default for LineIndex {
    fn default() -> Self {
        Self::new()
    }
}
