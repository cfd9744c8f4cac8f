//! Template cells.
//!
//! Markdown, HTML, TeX, SQL and DOT cells are written as the inside of a
//! tagged template literal. [`transpile_template`] turns such a cell into a
//! JavaScript expression by escaping its literal text and wrapping it in
//! backticks behind the renderer tag.

mod escape;
mod parser;

pub use escape::{EscapeMode, escape_template};
pub use parser::{LiteralReader, TemplateElement, TemplateNode, TemplateParser, read_cell_literal};

use tracing::debug;

use crate::edit::EditBuffer;
use crate::error::Result;

/// Turn a template cell into a tagged template expression.
///
/// Empty input is returned unchanged.
///
/// # Example
///
/// ```
/// use vesta_core::template::{EscapeMode, transpile_template};
///
/// let source = transpile_template("Hello, ${name}!", "md", EscapeMode::Raw).unwrap();
/// assert_eq!(source, "md`Hello, ${name}!`");
/// ```
pub fn transpile_template(input: &str, tag: &str, mode: EscapeMode) -> Result<String> {
    if input.is_empty() {
        return Ok(String::new());
    }
    let node = TemplateParser::new(input).parse()?;
    let mut output = EditBuffer::new(input);
    escape_template(&mut output, &node, mode)?;
    output.insert_left(node.range.start, tag)?;
    output.insert_left(node.range.start, "`")?;
    output.insert_right(node.range.end, "`")?;
    debug!(
        tag,
        ?mode,
        holes = node.expressions.len(),
        "transpiled template cell"
    );
    Ok(output.to_string())
}
