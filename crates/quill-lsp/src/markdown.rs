//! Markdown rendering to styled lines.
//!
//! Documentation payloads are markdown more often than not. The renderer
//! folds the pulldown-cmark event stream into [`StyledLine`]s with a style
//! stack for nested emphasis, and dispatches fenced code blocks to a
//! per-language [`RegexHighlighter`], falling back to a uniform code style
//! for languages it has no grammar for.

use crate::highlight::RegexHighlighter;
use crate::styled::{SpanStyle, StyleRole, StyledLine};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

/// Markdown-to-styled-text renderer with pluggable code-block grammars.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    highlighters: Vec<(String, RegexHighlighter)>,
}

impl MarkdownRenderer {
    /// Renderer without any code-block grammars; code blocks get a uniform
    /// style.
    pub fn plain() -> Self {
        Self {
            highlighters: Vec::new(),
        }
    }

    /// Renderer with the built-in Rust grammar registered.
    pub fn with_rust_highlighting() -> Self {
        Self::plain().with_highlighter("rust", RegexHighlighter::rust_default())
    }

    /// Register a grammar for a fenced-code language tag.
    pub fn with_highlighter(mut self, language: impl Into<String>, highlighter: RegexHighlighter) -> Self {
        self.highlighters.push((language.into(), highlighter));
        self
    }

    fn highlighter_for(&self, language: &str) -> Option<&RegexHighlighter> {
        // Fence info strings can carry attributes ("rust,no_run").
        let language = language
            .split([',', ' '])
            .next()
            .unwrap_or_default()
            .trim();
        if language.is_empty() {
            return None;
        }
        self.highlighters
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(language))
            .map(|(_, h)| h)
    }

    /// Render markdown source into styled lines.
    pub fn render(&self, source: &str) -> Vec<StyledLine> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        let parser = Parser::new_ext(source, options);

        let mut lines: Vec<StyledLine> = vec![StyledLine::new()];
        let mut style_stack: Vec<SpanStyle> = vec![SpanStyle::DEFAULT];
        let mut in_code_block = false;
        let mut code_language = String::new();

        let current = |stack: &[SpanStyle]| *stack.last().unwrap_or(&SpanStyle::DEFAULT);

        for event in parser {
            match event {
                Event::Start(tag) => match tag {
                    Tag::Strong => style_stack.push(current(&style_stack).bold()),
                    Tag::Emphasis => style_stack.push(current(&style_stack).italic()),
                    Tag::Strikethrough => {
                        style_stack.push(current(&style_stack).strikethrough())
                    }
                    Tag::Heading { .. } => {
                        start_block(&mut lines);
                        style_stack.push(SpanStyle::new(StyleRole::Heading).bold());
                    }
                    Tag::Link { .. } => {
                        style_stack.push(SpanStyle::new(StyleRole::Link).underline())
                    }
                    Tag::CodeBlock(kind) => {
                        in_code_block = true;
                        code_language = match kind {
                            CodeBlockKind::Fenced(lang) => lang.to_string(),
                            CodeBlockKind::Indented => String::new(),
                        };
                        start_block(&mut lines);
                    }
                    Tag::Paragraph => {
                        let has_content = lines.iter().any(|l| !l.spans.is_empty());
                        if has_content {
                            lines.push(StyledLine::new());
                        }
                    }
                    Tag::Item => {
                        start_block(&mut lines);
                        if let Some(line) = lines.last_mut() {
                            line.push("- ", SpanStyle::DEFAULT);
                        }
                    }
                    _ => {}
                },
                Event::End(tag_end) => match tag_end {
                    TagEnd::Strong
                    | TagEnd::Emphasis
                    | TagEnd::Strikethrough
                    | TagEnd::Link => {
                        style_stack.pop();
                    }
                    TagEnd::Heading(_) => {
                        style_stack.pop();
                        lines.push(StyledLine::new());
                    }
                    TagEnd::CodeBlock => {
                        in_code_block = false;
                        code_language.clear();
                        lines.push(StyledLine::new());
                    }
                    TagEnd::Paragraph => lines.push(StyledLine::new()),
                    _ => {}
                },
                Event::Text(text) => {
                    if in_code_block {
                        self.push_code_text(&mut lines, &text, &code_language);
                    } else {
                        push_text(&mut lines, &text, current(&style_stack));
                    }
                }
                Event::Code(code) => {
                    if let Some(line) = lines.last_mut() {
                        line.push(code.as_ref(), SpanStyle::new(StyleRole::InlineCode));
                    }
                }
                Event::SoftBreak => {
                    if let Some(line) = lines.last_mut() {
                        line.push(" ", current(&style_stack));
                    }
                }
                Event::HardBreak => lines.push(StyledLine::new()),
                Event::Rule => {
                    start_block(&mut lines);
                    let mut line = StyledLine::new();
                    line.push("---", SpanStyle::DEFAULT);
                    lines.push(line);
                    lines.push(StyledLine::new());
                }
                _ => {}
            }
        }

        while lines.last().is_some_and(StyledLine::is_blank) && lines.len() > 1 {
            lines.pop();
        }
        lines
    }

    fn push_code_text(&self, lines: &mut Vec<StyledLine>, text: &str, language: &str) {
        let highlighter = self.highlighter_for(language);

        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                lines.push(StyledLine::new());
            }
            if part.is_empty() {
                continue;
            }
            match highlighter {
                Some(h) => {
                    let highlighted = h.highlight_line(part);
                    if let Some(line) = lines.last_mut() {
                        for span in highlighted.spans {
                            line.push(span.text, span.style);
                        }
                    }
                }
                None => {
                    if let Some(line) = lines.last_mut() {
                        line.push(part, SpanStyle::new(StyleRole::CodeBlock));
                    }
                }
            }
        }
    }
}

fn start_block(lines: &mut Vec<StyledLine>) {
    if lines.last().is_some_and(|l| !l.spans.is_empty()) {
        lines.push(StyledLine::new());
    }
}

fn push_text(lines: &mut Vec<StyledLine>, text: &str, style: SpanStyle) {
    for (i, part) in text.split('\n').enumerate() {
        if i > 0 {
            lines.push(StyledLine::new());
        }
        if !part.is_empty()
            && let Some(line) = lines.last_mut()
        {
            line.push(part, style);
        }
    }
}
