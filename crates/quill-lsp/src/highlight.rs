//! Regex-rule highlighting for documentation code blocks.
//!
//! Signature documentation frequently embeds fenced code. A full parser or a
//! second language-server round-trip would be out of proportion for tooltip
//! text, so code blocks are colored by a small ordered rule set: earlier
//! rules win where matches overlap.

use crate::styled::{SpanStyle, StyleRole, StyledLine};
use regex::Regex;

/// A single highlighting rule.
#[derive(Debug, Clone)]
pub struct RegexRule {
    regex: Regex,
    role: StyleRole,
    capture_group: Option<usize>,
}

impl RegexRule {
    /// Create a rule from a pattern and the role its matches get.
    pub fn new(pattern: &str, role: StyleRole) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            role,
            capture_group: None,
        })
    }

    /// Color only a capture group of each match instead of the whole match.
    pub fn with_capture_group(mut self, group: usize) -> Self {
        self.capture_group = Some(group);
        self
    }
}

/// An ordered set of [`RegexRule`]s applied line by line.
#[derive(Debug, Clone)]
pub struct RegexHighlighter {
    rules: Vec<RegexRule>,
}

impl RegexHighlighter {
    /// Create a highlighter from an ordered rule list.
    pub fn new(rules: Vec<RegexRule>) -> Self {
        Self { rules }
    }

    /// The built-in Rust grammar.
    ///
    /// Covers what tooltip-sized code actually contains: comments, string and
    /// char literals, attributes, lifetimes, keywords, literals, type and
    /// function names. Raw strings with `#` guards are out of scope.
    pub fn rust_default() -> Self {
        let rule = |pattern: &str, role: StyleRole| {
            RegexRule::new(pattern, role).expect("built-in grammar pattern")
        };

        Self::new(vec![
            rule(r"//.*", StyleRole::CodeComment),
            rule(r"/\*.*?\*/", StyleRole::CodeComment),
            rule(r#"b?"(?:\\.|[^"\\])*""#, StyleRole::CodeString),
            rule(r"b?'(?:\\.|[^\\'])'", StyleRole::CodeString),
            rule(r"#!?\[[^\]]*\]", StyleRole::CodeMeta),
            rule(r"'[A-Za-z_][A-Za-z0-9_]*", StyleRole::CodeMeta),
            rule(
                r"\b(?:Self|abstract|as|async|await|become|box|break|const|continue|crate|do|dyn|else|enum|extern|final|fn|for|if|impl|in|let|loop|macro|match|mod|move|mut|override|priv|pub|ref|return|self|static|struct|super|trait|try|type|typeof|union|unsafe|unsized|use|virtual|where|while|yield)\b",
                StyleRole::CodeKeyword,
            ),
            rule(
                r"\b(?:bool|char|f32|f64|i8|i16|i32|i64|i128|isize|u8|u16|u32|u64|u128|usize|str)\b",
                StyleRole::CodeKeyword,
            ),
            rule(r"\b(?:true|false)\b", StyleRole::CodeKeyword),
            rule(
                r"\b(?:0x[0-9A-Fa-f](?:_?[0-9A-Fa-f])*|0o[0-7](?:_?[0-7])*|0b[01](?:_?[01])*|(?:(?:\d(?:_?\d)*)?\.)?\d(?:_?\d)*(?:[Ee][+-]?\d+)?)(?:_?(?:f32|f64|[iu](?:8|16|32|64|128|size)?))?\b",
                StyleRole::CodeNumber,
            ),
            rule(r"\b[A-Za-z_][A-Za-z0-9_]*!", StyleRole::CodeFunction),
            RegexRule::new(r"\b([a-z_][A-Za-z0-9_]*)\s*\(", StyleRole::CodeFunction)
                .expect("built-in grammar pattern")
                .with_capture_group(1),
            rule(r"\b[A-Z_][A-Z_0-9]{2,}\b", StyleRole::CodeType),
            rule(r"\b[A-Z][A-Za-z0-9_]*\b", StyleRole::CodeType),
        ])
    }

    /// Collect `(start, end, role)` byte spans for one line, resolved so
    /// earlier rules win on overlap.
    fn spans(&self, line: &str) -> Vec<(usize, usize, StyleRole)> {
        let mut candidates: Vec<(usize, usize, usize, StyleRole)> = Vec::new();

        for (priority, rule) in self.rules.iter().enumerate() {
            if let Some(group) = rule.capture_group {
                for caps in rule.regex.captures_iter(line) {
                    if let Some(m) = caps.get(group)
                        && m.start() < m.end()
                    {
                        candidates.push((m.start(), m.end(), priority, rule.role));
                    }
                }
            } else {
                for m in rule.regex.find_iter(line) {
                    if m.start() < m.end() {
                        candidates.push((m.start(), m.end(), priority, rule.role));
                    }
                }
            }
        }

        candidates.sort_by_key(|(start, _, priority, _)| (*start, *priority));

        let mut resolved = Vec::new();
        let mut covered_to = 0usize;
        for (start, end, _, role) in candidates {
            if start < covered_to {
                continue;
            }
            resolved.push((start, end, role));
            covered_to = end;
        }
        resolved
    }

    /// Highlight one line of code into a styled line. Unmatched text gets the
    /// plain code-block role.
    pub fn highlight_line(&self, line: &str) -> StyledLine {
        let mut out = StyledLine::new();
        let mut cursor = 0usize;

        for (start, end, role) in self.spans(line) {
            if cursor < start {
                out.push(&line[cursor..start], SpanStyle::new(StyleRole::CodeBlock));
            }
            out.push(&line[start..end], SpanStyle::new(role));
            cursor = end;
        }
        if cursor < line.len() {
            out.push(&line[cursor..], SpanStyle::new(StyleRole::CodeBlock));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles_of(line: &StyledLine) -> Vec<(String, StyleRole)> {
        line.spans
            .iter()
            .map(|s| (s.text.clone(), s.style.role))
            .collect()
    }

    #[test]
    fn test_keywords_and_functions() {
        let highlighter = RegexHighlighter::rust_default();
        let line = highlighter.highlight_line("fn main() {");
        let roles = roles_of(&line);

        assert_eq!(roles[0], ("fn".to_string(), StyleRole::CodeKeyword));
        assert!(roles.contains(&("main".to_string(), StyleRole::CodeFunction)));
    }

    #[test]
    fn test_comment_swallows_keywords() {
        let highlighter = RegexHighlighter::rust_default();
        let line = highlighter.highlight_line("// let x = 1;");
        assert_eq!(
            roles_of(&line),
            vec![("// let x = 1;".to_string(), StyleRole::CodeComment)]
        );
    }

    #[test]
    fn test_string_contents_are_not_tokenized() {
        let highlighter = RegexHighlighter::rust_default();
        let line = highlighter.highlight_line(r#"let s = "fn inside";"#);
        let roles = roles_of(&line);
        assert!(roles.contains(&("\"fn inside\"".to_string(), StyleRole::CodeString)));
    }

    #[test]
    fn test_lifetime_vs_char_literal() {
        let highlighter = RegexHighlighter::rust_default();

        let lifetime = highlighter.highlight_line("&'a str");
        assert!(roles_of(&lifetime).contains(&("'a".to_string(), StyleRole::CodeMeta)));

        let ch = highlighter.highlight_line("let c = 'x';");
        assert!(roles_of(&ch).contains(&("'x'".to_string(), StyleRole::CodeString)));
    }

    #[test]
    fn test_types_numbers_macros() {
        let highlighter = RegexHighlighter::rust_default();
        let line = highlighter.highlight_line("let v: Vec<u32> = vec![0x1F];");
        let roles = roles_of(&line);

        assert!(roles.contains(&("Vec".to_string(), StyleRole::CodeType)));
        assert!(roles.contains(&("u32".to_string(), StyleRole::CodeKeyword)));
        assert!(roles.contains(&("vec!".to_string(), StyleRole::CodeFunction)));
        assert!(roles.contains(&("0x1F".to_string(), StyleRole::CodeNumber)));
    }
}
