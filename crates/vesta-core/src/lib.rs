//! Cell transpiler for the Vesta reactive notebook format.
//!
//! This crate provides:
//! - JavaScript cell analysis (free references, declarations, awaits)
//! - Assignment checks that keep cells from mutating bindings they do not own
//! - Template cells (Markdown, HTML, TeX, SQL, DOT) compiled to tagged templates
//! - Import and file attachment rewriting
//! - An offset-preserving edit buffer that produces the generated source

pub mod analysis;
pub mod cell;
pub mod edit;
pub mod error;
pub mod parse;
pub mod rewrite;
pub mod template;
pub mod transpile;

pub use analysis::{Reference, check_assignments, find_awaits, find_declarations, find_references};
pub use cell::{CellMode, Renderer, TranspileOptions, TranspiledCell};
pub use edit::EditBuffer;
pub use error::{Error, Result, SourcePosition};
pub use parse::{CellNode, ParsedCell, SpanMap, parse_javascript};
pub use template::{EscapeMode, TemplateNode, TemplateParser, transpile_template};
pub use transpile::{ReactiveDialect, Transpiler, transpile, transpile_javascript};
