//! View-agnostic styled text.
//!
//! Controllers in this crate never produce colors; they produce spans tagged
//! with a closed set of [`StyleRole`]s plus font attributes. Frontends map
//! roles to their theme, the same way style-layer ids are mapped to colors by
//! a renderer rather than by the kernel.

use unicode_width::UnicodeWidthStr;

/// Semantic style roles for rendered spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleRole {
    /// Regular popup text.
    Default,
    /// The active parameter of the active signature.
    HighlightedParameter,
    /// Markdown heading text.
    Heading,
    /// Markdown link text.
    Link,
    /// Inline code (backticks).
    InlineCode,
    /// Code-block text with no more specific token class.
    CodeBlock,
    /// Code-block keyword.
    CodeKeyword,
    /// Code-block string or character literal.
    CodeString,
    /// Code-block number literal.
    CodeNumber,
    /// Code-block comment.
    CodeComment,
    /// Code-block type or constant name.
    CodeType,
    /// Code-block function or macro name.
    CodeFunction,
    /// Code-block attribute or lifetime.
    CodeMeta,
}

/// Font attributes layered on top of a [`StyleRole`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanStyle {
    /// Color role.
    pub role: StyleRole,
    /// Bold text.
    pub bold: bool,
    /// Italic text.
    pub italic: bool,
    /// Underlined text (links).
    pub underline: bool,
    /// Struck-through text.
    pub strikethrough: bool,
}

impl SpanStyle {
    /// Plain default-role style.
    pub const DEFAULT: SpanStyle = SpanStyle::new(StyleRole::Default);

    /// Create a plain style with the given role.
    pub const fn new(role: StyleRole) -> Self {
        Self {
            role,
            bold: false,
            italic: false,
            underline: false,
            strikethrough: false,
        }
    }

    /// Copy of this style with bold set.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Copy of this style with italic set.
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Copy of this style with underline set.
    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    /// Copy of this style with strikethrough set.
    pub fn strikethrough(mut self) -> Self {
        self.strikethrough = true;
        self
    }
}

impl Default for SpanStyle {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A run of text with one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    /// Span text (never contains newlines).
    pub text: String,
    /// Span style.
    pub style: SpanStyle,
}

/// One rendered line of styled spans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledLine {
    /// Spans in display order.
    pub spans: Vec<StyledSpan>,
}

impl StyledLine {
    /// Create an empty line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text with a style, merging into the previous span when the
    /// style is identical.
    pub fn push(&mut self, text: impl Into<String>, style: SpanStyle) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        if let Some(last) = self.spans.last_mut()
            && last.style == style
        {
            last.text.push_str(&text);
            return;
        }
        self.spans.push(StyledSpan { text, style });
    }

    /// Concatenated plain text of the line.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Returns `true` if the line has no visible (non-whitespace) content.
    pub fn is_blank(&self) -> bool {
        self.spans.iter().all(|s| s.text.trim().is_empty())
    }

    /// Display width of the line in terminal cells.
    pub fn display_width(&self) -> usize {
        self.spans
            .iter()
            .map(|s| UnicodeWidthStr::width(s.text.as_str()))
            .sum()
    }

    /// Copy of this line with bold applied to every span.
    pub fn bolded(&self) -> StyledLine {
        StyledLine {
            spans: self
                .spans
                .iter()
                .map(|s| StyledSpan {
                    text: s.text.clone(),
                    style: s.style.bold(),
                })
                .collect(),
        }
    }
}

/// A block of rendered lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledText {
    /// Lines in display order.
    pub lines: Vec<StyledLine>,
}

impl StyledText {
    /// Create an empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line.
    pub fn push_line(&mut self, line: StyledLine) {
        self.lines.push(line);
    }

    /// Append an empty line.
    pub fn push_blank(&mut self) {
        self.lines.push(StyledLine::new());
    }

    /// Returns `true` if every line is blank.
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(StyledLine::is_blank)
    }

    /// `(width, height)` in terminal cells / lines.
    pub fn measure(&self) -> (usize, usize) {
        let width = self
            .lines
            .iter()
            .map(StyledLine::display_width)
            .max()
            .unwrap_or(0);
        (width, self.lines.len())
    }

    /// Plain text of the block, lines joined with `\n`.
    pub fn plain_text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
