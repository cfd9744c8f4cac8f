//! Cell transpiler.
//!
//! # Architecture
//!
//! ```text
//! cell source + mode
//!     │
//!     ├── md/html/tex/sql/dot ──► transpile_template ──► tagged template ─┐
//!     │                                                                   │
//!     ├── js ◄────────────────────────────────────────────────────────────┘
//!     │    └── parse ──► references ──► assignment check ──► declarations
//!     │                                                        │
//!     │         EditBuffer: signature, imports, files, return ◄┘
//!     │
//!     └── ojs ──► ReactiveDialect
//! ```

use tracing::debug;

use crate::analysis::unique_names;
use crate::cell::{CellMode, TranspileOptions, TranspiledCell};
use crate::edit::EditBuffer;
use crate::error::{Error, Result};
use crate::parse::{CellNode, parse_javascript};
use crate::rewrite::{
    has_import_declaration, rewrite_file_expressions, rewrite_import_declarations,
    rewrite_import_expressions,
};
use crate::template::transpile_template;

/// Transpiler for the reactive JavaScript dialect (`ojs` cells).
///
/// The dialect has its own grammar for named cells, `viewof` and `mutable`,
/// so it is compiled by an external implementation.
pub trait ReactiveDialect: Send + Sync {
    fn transpile(&self, input: &str, options: &TranspileOptions) -> Result<TranspiledCell>;
}

/// Cell transpiler with fixed options and an optional reactive dialect.
#[derive(Clone, Copy, Default)]
pub struct Transpiler<'d> {
    options: TranspileOptions,
    dialect: Option<&'d dyn ReactiveDialect>,
}

impl<'d> Transpiler<'d> {
    pub fn new(options: TranspileOptions) -> Self {
        Self {
            options,
            dialect: None,
        }
    }

    /// Delegate `ojs` cells to `dialect`.
    pub fn with_dialect(mut self, dialect: &'d dyn ReactiveDialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Transpile one cell.
    pub fn transpile(&self, input: &str, mode: CellMode) -> Result<TranspiledCell> {
        if mode == CellMode::Ojs {
            let dialect = self.dialect.ok_or_else(|| {
                Error::Structural("ojs cells need a reactive dialect transpiler".to_string())
            })?;
            return dialect.transpile(input, &self.options);
        }
        match mode.renderer() {
            Some(renderer) => {
                let source = transpile_template(input, renderer.tag, renderer.escape)?;
                debug!(%mode, tag = renderer.tag, "transpiling template cell");
                transpile_javascript(&source, &self.options)
            }
            None => transpile_javascript(input, &self.options),
        }
    }
}

/// Transpile one cell of the given mode without a reactive dialect.
pub fn transpile(
    input: &str,
    mode: CellMode,
    options: &TranspileOptions,
) -> Result<TranspiledCell> {
    Transpiler::new(*options).transpile(input, mode)
}

/// Compile a JavaScript cell into a function of its free variables.
///
/// # Example
///
/// ```
/// use vesta_core::{TranspileOptions, transpile_javascript};
///
/// let cell = transpile_javascript("x + y", &TranspileOptions::default()).unwrap();
/// assert_eq!(cell.body, "(x,y) => {\nreturn (\nx + y\n)\n}");
/// assert_eq!(cell.inputs, ["x", "y"]);
/// assert!(cell.autodisplay);
/// ```
pub fn transpile_javascript(input: &str, options: &TranspileOptions) -> Result<TranspiledCell> {
    let cell = parse_javascript(input)?;
    let inputs = unique_names(&cell.references);
    let outputs = unique_names(&cell.declarations);
    let is_expression = cell.is_expression();
    let is_async = cell.is_async || has_import_declaration(&cell.node);

    let mut output = EditBuffer::new(input);
    output.trim()?;
    output.insert_left(
        0,
        format!(
            "{}({}) => {{\n",
            if is_async { "async " } else { "" },
            inputs.join(",")
        ),
    )?;
    if let CellNode::Program(module) = &cell.node {
        rewrite_import_declarations(&mut output, module, cell.spans, options)?;
    }
    rewrite_import_expressions(&mut output, &cell.node, cell.spans, options)?;
    if options.resolve_files {
        rewrite_file_expressions(&mut output, &cell.node, cell.spans)?;
    }

    let end = input.len();
    if is_expression {
        output.insert_left(0, "return (\n")?;
        output.insert_right(end, "\n)")?;
    }
    if !outputs.is_empty() {
        output.insert_right(end, format!("\nreturn {{{}}};", outputs.join(",")))?;
    }
    output.insert_right(end, "\n}")?;

    let autodisplay =
        is_expression && !inputs.iter().any(|name| name == "display" || name == "view");
    debug!(
        inputs = inputs.len(),
        outputs = outputs.len(),
        is_async,
        is_expression,
        "transpiled javascript cell"
    );
    Ok(TranspiledCell {
        body: output.to_string(),
        inputs,
        outputs,
        output: None,
        autodisplay,
        autoview: false,
        automutable: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn js(input: &str) -> TranspiledCell {
        transpile_javascript(input, &TranspileOptions::default()).unwrap()
    }

    #[test]
    fn test_expression_cell() {
        let cell = js("x + y");
        assert_eq!(cell.body, "(x,y) => {\nreturn (\nx + y\n)\n}");
        assert_eq!(cell.inputs, vec!["x", "y"]);
        assert!(cell.outputs.is_empty());
        assert!(cell.autodisplay);
    }

    #[test]
    fn test_program_cell() {
        let cell = js("let z = x + 1;");
        assert_eq!(cell.body, "(x) => {\nlet z = x + 1;\nreturn {z};\n}");
        assert_eq!(cell.inputs, vec!["x"]);
        assert_eq!(cell.outputs, vec!["z"]);
        assert!(!cell.autodisplay);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let cell = js("\n\n  42  \n");
        assert_eq!(cell.body, "() => {\nreturn (\n42\n)\n}");
    }

    #[test]
    fn test_async_expression() {
        let cell = js("await load(url)");
        assert_eq!(cell.body, "async (load,url) => {\nreturn (\nawait load(url)\n)\n}");
    }

    #[test]
    fn test_imports_make_cell_async() {
        let cell = js("import {max} from \"npm:d3\";\nconst top = max(values);");
        assert_eq!(
            cell.body,
            "async (values) => {\n\
             const {max} = await import(\"https://cdn.jsdelivr.net/npm/d3/+esm\");\n\
             const top = max(values);\nreturn {max,top};\n}"
        );
        assert_eq!(cell.outputs, vec!["max", "top"]);
    }

    #[test]
    fn test_display_suppresses_autodisplay() {
        assert!(!js("display(chart)").autodisplay);
        assert!(!js("view(Inputs.range())").autodisplay);
    }

    #[test]
    fn test_empty_cell() {
        let cell = js("");
        assert_eq!(cell.body, "() => {\n\n}");
        assert!(cell.inputs.is_empty());
        assert!(!cell.autodisplay);
    }

    #[test]
    fn test_resolve_files() {
        let options = TranspileOptions {
            resolve_files: true,
            ..Default::default()
        };
        let cell = transpile_javascript("FileAttachment(\"a.csv\")", &options).unwrap();
        assert_eq!(
            cell.body,
            "(FileAttachment) => {\nreturn (\n\
             FileAttachment(new URL(\"a.csv\", import.meta.url).href)\n)\n}"
        );
    }

    #[test]
    fn test_template_modes() {
        let options = TranspileOptions::default();
        let cell = transpile("# Hello ${name}", CellMode::Md, &options).unwrap();
        assert_eq!(cell.body, "(md,name) => {\nreturn (\nmd`# Hello ${name}`\n)\n}");
        assert_eq!(cell.inputs, vec!["md", "name"]);

        let cell = transpile(r"x^2", CellMode::Tex, &options).unwrap();
        assert_eq!(cell.body, "(tex) => {\nreturn (\ntex.block`x^2`\n)\n}");

        let cell = transpile("SELECT 1", CellMode::Sql, &options).unwrap();
        assert_eq!(cell.inputs, vec!["__sql", "db", "Inputs"]);
    }

    #[test]
    fn test_ojs_without_dialect() {
        let err =
            transpile("viewof x = 1", CellMode::Ojs, &TranspileOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Structural(_)));
    }

    #[test]
    fn test_ojs_with_dialect() {
        struct Echo;
        impl ReactiveDialect for Echo {
            fn transpile(&self, input: &str, _: &TranspileOptions) -> Result<TranspiledCell> {
                Ok(TranspiledCell {
                    body: format!("() => {{\n{input}\n}}"),
                    inputs: vec![],
                    outputs: vec![],
                    output: Some("x".into()),
                    autodisplay: true,
                    autoview: true,
                    automutable: false,
                })
            }
        }
        let cell = Transpiler::default()
            .with_dialect(&Echo)
            .transpile("viewof x = 1", CellMode::Ojs)
            .unwrap();
        assert_eq!(cell.output.as_deref(), Some("x"));
        assert!(cell.autoview);
    }
}
