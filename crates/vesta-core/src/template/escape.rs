//! Escaping of template literal spans.
//!
//! Wrapping a template cell in backticks must not change what its literal
//! text means. Backticks always need a backslash. Backslashes need one too
//! when the tag reads cooked strings. A tag that reads raw strings sees the
//! backslashes as written, except that a raw string cannot end in an odd
//! run of backslashes, so a trailing one is emitted through a hole.

use super::parser::{TemplateElement, TemplateNode};
use crate::edit::EditBuffer;
use crate::error::Result;

/// How the tag of a template cell reads its literal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeMode {
    /// The tag reads processed strings, so escape sequences are decoded.
    Cooked,
    /// The tag reads `strings.raw`.
    Raw,
}

/// Register the edits that keep every literal span of `node` intact once
/// the input is wrapped in backticks.
pub fn escape_template(
    output: &mut EditBuffer<'_>,
    node: &TemplateNode,
    mode: EscapeMode,
) -> Result<()> {
    for quasi in &node.quasis {
        escape_backticks(output, quasi)?;
        if mode == EscapeMode::Cooked {
            escape_backslashes(output, quasi)?;
        }
    }
    if mode == EscapeMode::Raw {
        interpolate_terminal_backslash(output)?;
    }
    Ok(())
}

fn escape_backticks(output: &mut EditBuffer<'_>, quasi: &TemplateElement) -> Result<()> {
    let input = output.original();
    for (i, _) in input[quasi.range.clone()].match_indices('`') {
        output.insert_right(quasi.range.start + i, "\\")?;
    }
    Ok(())
}

/// Double every backslash except those that escape a hole opener, which
/// must stay single so the hole remains literal text.
fn escape_backslashes(output: &mut EditBuffer<'_>, quasi: &TemplateElement) -> Result<()> {
    let bytes = output.original().as_bytes();
    let at = |i: usize| bytes.get(i).copied();
    let mut after_dollar = false;
    let mut odd_backslashes = false;
    for i in quasi.range.clone() {
        match bytes[i] {
            b'$' => {
                after_dollar = true;
                odd_backslashes = false;
            }
            b'\\' => {
                odd_backslashes = !odd_backslashes;
                if after_dollar && at(i + 1) == Some(b'{') {
                    continue;
                }
                if odd_backslashes && at(i + 1) == Some(b'$') && at(i + 2) == Some(b'{') {
                    continue;
                }
                output.insert_right(i, "\\")?;
            }
            _ => {
                after_dollar = false;
                odd_backslashes = false;
            }
        }
    }
    Ok(())
}

fn interpolate_terminal_backslash(output: &mut EditBuffer<'_>) -> Result<()> {
    let input = output.original();
    let run = input.bytes().rev().take_while(|&b| b == b'\\').count();
    if run % 2 == 1 {
        output.replace_right(input.len() - 1, input.len(), r"${'\\'}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateParser;

    fn escape(input: &str, mode: EscapeMode) -> String {
        let node = TemplateParser::new(input).parse().unwrap();
        let mut output = EditBuffer::new(input);
        escape_template(&mut output, &node, mode).unwrap();
        output.to_string()
    }

    #[test]
    fn test_backticks_escaped_in_both_modes() {
        assert_eq!(escape("a `b` c", EscapeMode::Raw), r"a \`b\` c");
        assert_eq!(escape("a `b` c", EscapeMode::Cooked), r"a \`b\` c");
    }

    #[test]
    fn test_holes_untouched() {
        assert_eq!(escape("${`x`}", EscapeMode::Cooked), "${`x`}");
    }

    #[test]
    fn test_cooked_doubles_backslashes() {
        assert_eq!(escape(r"\alpha + \beta", EscapeMode::Cooked), r"\\alpha + \\beta");
    }

    #[test]
    fn test_cooked_keeps_escaped_hole_opener() {
        assert_eq!(escape(r"cost \${price}", EscapeMode::Cooked), r"cost \${price}");
        assert_eq!(escape(r"\\${x}", EscapeMode::Cooked), r"\\\\${x}");
    }

    #[test]
    fn test_cooked_dollar_backslash_brace() {
        assert_eq!(escape(r"$\{x}", EscapeMode::Cooked), r"$\{x}");
    }

    #[test]
    fn test_raw_leaves_backslashes() {
        assert_eq!(escape(r"\frac{1}{2}", EscapeMode::Raw), r"\frac{1}{2}");
    }

    #[test]
    fn test_raw_terminal_backslash() {
        assert_eq!(escape("a\\", EscapeMode::Raw), r"a${'\\'}");
        assert_eq!(escape("a\\\\", EscapeMode::Raw), "a\\\\");
        assert_eq!(escape("a\\\\\\", EscapeMode::Raw), r"a\\${'\\'}");
    }
}
