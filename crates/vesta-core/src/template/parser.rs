//! Parser for the body of a template cell.
//!
//! A template cell is the inside of a JavaScript template literal with no
//! surrounding backticks: literal text interleaved with `${expression}`
//! holes. Backticks in the literal text are plain characters, and the end of
//! the input closes the template.

use std::ops::Range;

use tracing::trace;

use crate::error::{Error, Result};
use crate::parse::expression_end;

/// Scans literal text from `start` and returns where it stops.
///
/// The returned offset is either the end of the input or the `$` of a
/// `${` that opens a hole.
pub type LiteralReader = fn(&str, usize) -> usize;

/// One literal span of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateElement {
    pub range: Range<usize>,
    /// Whether this is the last span.
    pub tail: bool,
}

/// Parsed template: literal spans and the expressions between them.
///
/// There is always exactly one more quasi than there are expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateNode {
    pub range: Range<usize>,
    pub quasis: Vec<TemplateElement>,
    /// Source ranges of the hole expressions, without `${` and `}`.
    pub expressions: Vec<Range<usize>>,
}

/// Default literal scanner for cell templates.
///
/// A backslash consumes the character after it (so `\${` stays literal) and
/// a backtick is ordinary text.
pub fn read_cell_literal(input: &str, start: usize) -> usize {
    let bytes = input.as_bytes();
    let mut pos = start;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' if pos + 1 < bytes.len() => pos += 1,
            b'$' if bytes.get(pos + 1) == Some(&b'{') => return pos,
            _ => {}
        }
        pos += 1;
    }
    bytes.len()
}

/// Template parser with a pluggable literal scanner.
#[derive(Debug, Clone, Copy)]
pub struct TemplateParser<'a> {
    input: &'a str,
    read_literal: LiteralReader,
}

impl<'a> TemplateParser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            read_literal: read_cell_literal,
        }
    }

    /// Use `reader` to scan literal spans.
    pub fn with_literal_reader(mut self, reader: LiteralReader) -> Self {
        self.read_literal = reader;
        self
    }

    pub fn parse(&self) -> Result<TemplateNode> {
        let input = self.input;
        let mut quasis = Vec::new();
        let mut expressions = Vec::new();
        let mut pos = 0;
        loop {
            let end = (self.read_literal)(input, pos).clamp(pos, input.len());
            if end == input.len() {
                quasis.push(TemplateElement {
                    range: pos..end,
                    tail: true,
                });
                break;
            }
            quasis.push(TemplateElement {
                range: pos..end,
                tail: false,
            });
            let (expression, next) = self.parse_hole(end)?;
            trace!(start = expression.start, end = expression.end, "template hole");
            expressions.push(expression);
            pos = next;
        }
        Ok(TemplateNode {
            range: 0..input.len(),
            quasis,
            expressions,
        })
    }

    /// Parse the hole opening at `open` and return its expression range
    /// and the offset just past its closing brace.
    fn parse_hole(&self, open: usize) -> Result<(Range<usize>, usize)> {
        let input = self.input;
        if !input[open..].starts_with("${") {
            return Err(Error::Structural(format!(
                "literal reader stopped at offset {open}, which does not open a hole"
            )));
        }
        let start = open + 2;
        let end = expression_end(input, start)?;
        let close = skip_trivia(input, end);
        match input[close..].chars().next() {
            Some('}') => Ok((start..end, close + 1)),
            Some(found) => Err(Error::parse(
                "Expected `}` to close template hole",
                close..close + found.len_utf8(),
                input,
            )),
            None => Err(Error::parse("Unterminated template hole", open..input.len(), input)),
        }
    }
}

/// Skip whitespace and comments starting at `pos`.
fn skip_trivia(input: &str, mut pos: usize) -> usize {
    loop {
        let rest = &input[pos..];
        let trimmed = rest.trim_start();
        pos += rest.len() - trimmed.len();
        if let Some(comment) = trimmed.strip_prefix("//") {
            pos += 2 + comment.find('\n').unwrap_or(comment.len());
        } else if let Some(comment) = trimmed.strip_prefix("/*") {
            match comment.find("*/") {
                Some(end) => pos += 2 + end + 2,
                None => return input.len(),
            }
        } else {
            return pos;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(input: &str) -> (Vec<&str>, Vec<&str>) {
        let node = TemplateParser::new(input).parse().unwrap();
        let quasis = node.quasis.iter().map(|q| &input[q.range.clone()]).collect();
        let expressions = node.expressions.iter().map(|e| &input[e.clone()]).collect();
        (quasis, expressions)
    }

    #[test]
    fn test_plain_text() {
        let node = TemplateParser::new("# Hello").parse().unwrap();
        assert_eq!(node.quasis.len(), 1);
        assert!(node.quasis[0].tail);
        assert!(node.expressions.is_empty());
    }

    #[test]
    fn test_holes() {
        let (quasis, expressions) = parts("Hello, ${name}! You have ${count + 1} items.");
        assert_eq!(quasis, vec!["Hello, ", "! You have ", " items."]);
        assert_eq!(expressions, vec!["name", "count + 1"]);
    }

    #[test]
    fn test_adjacent_holes() {
        let (quasis, expressions) = parts("${a}${b}");
        assert_eq!(quasis, vec!["", "", ""]);
        assert_eq!(expressions, vec!["a", "b"]);
    }

    #[test]
    fn test_hole_with_braces_and_nested_template() {
        let (_, expressions) = parts("x ${f({y: `${z}`})} done");
        assert_eq!(expressions, vec!["f({y: `${z}`})"]);
    }

    #[test]
    fn test_hole_with_trailing_comment() {
        let (quasis, expressions) = parts("${a /* note */ } b");
        assert_eq!(expressions, vec!["a"]);
        assert_eq!(quasis[1], " b");
    }

    #[test]
    fn test_backtick_is_literal() {
        let (quasis, _) = parts("use `code` here");
        assert_eq!(quasis, vec!["use `code` here"]);
    }

    #[test]
    fn test_escaped_dollar_brace_is_literal() {
        let (quasis, expressions) = parts(r"cost \${price}");
        assert_eq!(quasis, vec![r"cost \${price}"]);
        assert!(expressions.is_empty());
    }

    #[test]
    fn test_trailing_backslash_is_literal() {
        let (quasis, _) = parts("path\\");
        assert_eq!(quasis, vec!["path\\"]);
    }

    #[test]
    fn test_unterminated_hole() {
        let err = TemplateParser::new("a ${b").parse().unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("Unterminated template hole"));
    }

    #[test]
    fn test_unclosed_hole_with_extra_tokens() {
        let err = TemplateParser::new("${a b}").parse().unwrap_err();
        assert!(err.to_string().contains("Expected `}`"));
    }

    #[test]
    fn test_custom_literal_reader() {
        fn no_holes(input: &str, _: usize) -> usize {
            input.len()
        }
        let node = TemplateParser::new("${a}")
            .with_literal_reader(no_holes)
            .parse()
            .unwrap();
        assert!(node.expressions.is_empty());
        assert_eq!(node.quasis[0].range, 0..4);
    }
}
