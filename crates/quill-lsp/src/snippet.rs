//! Snippet templates and interactive insertion sessions.
//!
//! Code-action edits may carry `${}`-style templates instead of plain text.
//! Parsing understands tab stops (`$1`, `${2}`), placeholders (`${1:name}`),
//! choices (`${1|a,b|}` - first option wins), escapes (`\$`) and variables
//! (`$VAR` / `${VAR:default}`; `TM_SELECTED_TEXT` and `SELECTION` resolve to
//! the text the edit replaced, anything else falls back to its default).
//!
//! An insertion is not a one-shot mutation: it is a cursor-tracking
//! micro-session. [`SnippetSession`] models it as an explicit state object -
//! ordered tab stops (`$0` last), the active stop, and range bookkeeping as
//! the user types into placeholders.

use quill_core::{ChangeCause, Document, DocumentError};

/// One parsed element of a snippet template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnippetElement {
    /// Literal text.
    Text(String),
    /// A tab stop, optionally with placeholder text.
    TabStop {
        /// Stop index; `0` is the final cursor position.
        index: u32,
        /// Placeholder text inserted until the user overwrites it.
        placeholder: String,
    },
    /// A variable reference.
    Variable {
        /// Variable name.
        name: String,
        /// Fallback text when the variable has no value.
        default: String,
    },
}

/// A parsed snippet template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetTemplate {
    elements: Vec<SnippetElement>,
}

/// A tab stop rendered into the document, with the char range(s) it occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabStop {
    /// Stop index; `0` is the final cursor position.
    pub index: u32,
    /// Occupied ranges in document char offsets. More than one range means
    /// the stop is mirrored.
    pub ranges: Vec<(usize, usize)>,
}

/// Rendered template text plus stop offsets relative to the insertion point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSnippet {
    /// The text to insert.
    pub text: String,
    /// `(index, start, len)` per stop occurrence, in char offsets into
    /// [`RenderedSnippet::text`].
    pub stops: Vec<(u32, usize, usize)>,
}

impl SnippetTemplate {
    /// Parse a template string.
    ///
    /// Parsing never fails: malformed constructs degrade to literal text,
    /// matching how servers in the wild emit sloppy snippets.
    pub fn parse(template: &str) -> Self {
        let mut elements = Vec::new();
        let mut text = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(next) = chars.next() {
                        text.push(next);
                    }
                }
                '$' => match chars.peek().copied() {
                    Some('{') => {
                        chars.next();
                        let mut content = String::new();
                        let mut depth = 1usize;
                        for ch in chars.by_ref() {
                            match ch {
                                '{' => depth += 1,
                                '}' => {
                                    depth -= 1;
                                    if depth == 0 {
                                        break;
                                    }
                                }
                                _ => {}
                            }
                            content.push(ch);
                        }
                        flush_text(&mut elements, &mut text);
                        elements.push(parse_braced(&content));
                    }
                    Some(d) if d.is_ascii_digit() => {
                        let mut number = String::new();
                        while let Some(ch) = chars.peek().copied() {
                            if ch.is_ascii_digit() {
                                number.push(ch);
                                chars.next();
                            } else {
                                break;
                            }
                        }
                        flush_text(&mut elements, &mut text);
                        elements.push(SnippetElement::TabStop {
                            index: number.parse().unwrap_or(0),
                            placeholder: String::new(),
                        });
                    }
                    Some(ch) if ch == '_' || ch.is_ascii_alphabetic() => {
                        let mut name = String::new();
                        while let Some(next) = chars.peek().copied() {
                            if next == '_' || next.is_ascii_alphanumeric() {
                                name.push(next);
                                chars.next();
                            } else {
                                break;
                            }
                        }
                        flush_text(&mut elements, &mut text);
                        elements.push(SnippetElement::Variable {
                            name,
                            default: String::new(),
                        });
                    }
                    _ => text.push('$'),
                },
                other => text.push(other),
            }
        }

        flush_text(&mut elements, &mut text);
        Self { elements }
    }

    /// The parsed elements.
    pub fn elements(&self) -> &[SnippetElement] {
        &self.elements
    }

    /// Returns `true` if the template has at least one tab stop.
    pub fn has_stops(&self) -> bool {
        self.elements
            .iter()
            .any(|e| matches!(e, SnippetElement::TabStop { .. }))
    }

    /// Render the template to insertable text, resolving variables against
    /// `selected_text` and recording stop offsets.
    pub fn render(&self, selected_text: &str) -> RenderedSnippet {
        let mut text = String::new();
        let mut len = 0usize;
        let mut stops = Vec::new();

        for element in &self.elements {
            match element {
                SnippetElement::Text(t) => {
                    text.push_str(t);
                    len += t.chars().count();
                }
                SnippetElement::TabStop { index, placeholder } => {
                    let placeholder_len = placeholder.chars().count();
                    stops.push((*index, len, placeholder_len));
                    text.push_str(placeholder);
                    len += placeholder_len;
                }
                SnippetElement::Variable { name, default } => {
                    let value = match name.as_str() {
                        "TM_SELECTED_TEXT" | "SELECTION" => selected_text,
                        _ => default.as_str(),
                    };
                    text.push_str(value);
                    len += value.chars().count();
                }
            }
        }

        RenderedSnippet { text, stops }
    }
}

fn flush_text(elements: &mut Vec<SnippetElement>, text: &mut String) {
    if !text.is_empty() {
        elements.push(SnippetElement::Text(std::mem::take(text)));
    }
}

fn parse_braced(content: &str) -> SnippetElement {
    let mut chars = content.chars().peekable();
    let mut number = String::new();
    while let Some(c) = chars.peek().copied() {
        if c.is_ascii_digit() {
            number.push(c);
            chars.next();
        } else {
            break;
        }
    }

    if number.is_empty() {
        // `${NAME}` / `${NAME:default}`
        let mut name = String::new();
        while let Some(c) = chars.peek().copied() {
            if c == '_' || c.is_ascii_alphanumeric() {
                name.push(c);
                chars.next();
            } else {
                break;
            }
        }
        let default = match chars.next() {
            Some(':') => flatten(&chars.collect::<String>()),
            _ => String::new(),
        };
        return SnippetElement::Variable { name, default };
    }

    let index: u32 = number.parse().unwrap_or(0);
    match chars.next() {
        None => SnippetElement::TabStop {
            index,
            placeholder: String::new(),
        },
        Some(':') => SnippetElement::TabStop {
            index,
            placeholder: flatten(&chars.collect::<String>()),
        },
        Some('|') => {
            // `${1|a,b,c|}`: first choice becomes the placeholder.
            let rest: String = chars.collect();
            let trimmed = rest.strip_suffix('|').unwrap_or(rest.as_str());
            SnippetElement::TabStop {
                index,
                placeholder: trimmed.split(',').next().unwrap_or("").to_string(),
            }
        }
        _ => SnippetElement::TabStop {
            index,
            placeholder: String::new(),
        },
    }
}

/// Render nested template content to its default text (placeholders collapse
/// to their own defaults, stops to their placeholders).
fn flatten(content: &str) -> String {
    SnippetTemplate::parse(content).render("").text
}

/// Where a session traversal landed after [`SnippetSession::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnippetStep {
    /// Moved to the stop with this index; the editor should select `range`.
    MovedTo {
        /// Stop index.
        index: u32,
        /// Range to select, in char offsets.
        range: (usize, usize),
    },
    /// The session ended.
    Ended,
}

/// An in-progress interactive snippet insertion.
///
/// The session inserts the rendered template on start and then tracks the
/// active tab stop while the user types. Overlapping or nested stops are not
/// tracked; servers emit flat stop lists in practice.
#[derive(Debug)]
pub struct SnippetSession {
    stops: Vec<TabStop>,
    current: usize,
    active: bool,
}

impl SnippetSession {
    /// Insert `template` at `offset` and begin the session.
    ///
    /// `selected_text` is the text the triggering edit replaced; it seeds the
    /// selection variables.
    pub fn start(
        document: &mut Document,
        offset: usize,
        template: &SnippetTemplate,
        selected_text: &str,
    ) -> Result<Self, DocumentError> {
        let rendered = template.render(selected_text);
        document.replace(offset, offset, &rendered.text, ChangeCause::Remote)?;

        // Group occurrences by stop index; `$0` traverses last.
        let mut stops: Vec<TabStop> = Vec::new();
        for (index, start, len) in rendered.stops {
            let range = (offset + start, offset + start + len);
            if let Some(stop) = stops.iter_mut().find(|s| s.index == index) {
                stop.ranges.push(range);
            } else {
                stops.push(TabStop {
                    index,
                    ranges: vec![range],
                });
            }
        }
        stops.sort_by_key(|s| if s.index == 0 { u32::MAX } else { s.index });

        let active = !stops.is_empty();
        Ok(Self {
            stops,
            current: 0,
            active,
        })
    }

    /// Returns `true` while the session is live.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// All stops in traversal order.
    pub fn stops(&self) -> &[TabStop] {
        &self.stops
    }

    /// The currently active stop.
    pub fn current_stop(&self) -> Option<&TabStop> {
        if !self.active {
            return None;
        }
        self.stops.get(self.current)
    }

    /// The primary range of the active stop (what the editor should select).
    pub fn active_range(&self) -> Option<(usize, usize)> {
        self.current_stop().and_then(|s| s.ranges.first().copied())
    }

    /// Replace the active stop's text with `text`, mirroring to every
    /// occurrence and shifting later stop ranges to stay valid.
    pub fn replace_active(
        &mut self,
        document: &mut Document,
        text: &str,
    ) -> Result<(), DocumentError> {
        let Some(stop) = self.current_stop() else {
            return Ok(());
        };

        let new_len = text.chars().count();
        let mut targets = stop.ranges.clone();
        targets.sort_by_key(|(start, _)| std::cmp::Reverse(*start));

        for (start, end) in targets {
            document.replace(start, end, text, ChangeCause::Remote)?;
            let old_len = end - start;

            for tracked in &mut self.stops {
                for range in &mut tracked.ranges {
                    if (range.0, range.1) == (start, end) {
                        *range = (start, start + new_len);
                    } else if range.0 >= end {
                        range.0 = range.0 + new_len - old_len;
                        range.1 = range.1 + new_len - old_len;
                    }
                }
            }
        }

        Ok(())
    }

    /// Move to the next stop, ending the session past the last one.
    pub fn advance(&mut self) -> SnippetStep {
        if !self.active {
            return SnippetStep::Ended;
        }
        if self.current + 1 >= self.stops.len() {
            self.active = false;
            return SnippetStep::Ended;
        }
        self.current += 1;
        let stop = &self.stops[self.current];
        SnippetStep::MovedTo {
            index: stop.index,
            range: stop.ranges.first().copied().unwrap_or((0, 0)),
        }
    }

    /// Abort the session, leaving the document as-is.
    pub fn cancel(&mut self) {
        self.active = false;
    }
}
