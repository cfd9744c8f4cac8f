//! JavaScript front end for cell sources.
//!
//! Cells are parsed with swc's ECMAScript parser in module mode so that
//! top-level `await` and `import` declarations are accepted. A cell whose
//! whole source is one expression is kept as an expression; everything else
//! is a program whose top-level declarations become the cell's outputs.

use std::ops::Range;

use swc_core::common::{BytePos, Span, Spanned};
use swc_core::ecma::ast::{EsVersion, Expr, Module, ModuleDecl, ModuleItem, Stmt};
use swc_core::ecma::parser::error::Error as SyntaxError;
use swc_core::ecma::parser::{EsSyntax, Parser, StringInput, Syntax, lexer::Lexer};
use swc_core::ecma::visit::{Visit, VisitWith};

use crate::analysis::{self, Reference};
use crate::error::{Error, Result};

/// Position handed to swc for the first byte of a parsed text.
///
/// `BytePos(0)` is reserved by swc for dummy spans.
const ORIGIN: u32 = 1;

/// Maps swc byte positions back to byte offsets in the cell source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanMap {
    origin: u32,
}

impl SpanMap {
    fn new(origin: u32) -> Self {
        Self { origin }
    }

    /// Offset in the cell source of `pos`.
    pub fn offset(&self, pos: BytePos) -> usize {
        pos.0.saturating_sub(self.origin) as usize
    }

    /// Source range covered by `span`.
    pub fn range(&self, span: Span) -> Range<usize> {
        self.offset(span.lo)..self.offset(span.hi)
    }
}

/// Syntax tree of a cell.
#[derive(Debug, Clone)]
pub enum CellNode {
    /// The whole cell is a single expression.
    Expression(Box<Expr>),
    /// The cell is a sequence of statements and declarations.
    Program(Module),
}

impl CellNode {
    /// Walk the tree with `visitor`.
    pub fn visit<V: Visit>(&self, visitor: &mut V) {
        match self {
            Self::Expression(expr) => expr.visit_with(visitor),
            Self::Program(module) => module.visit_with(visitor),
        }
    }

    /// The program, if the cell is not a single expression.
    pub fn as_program(&self) -> Option<&Module> {
        match self {
            Self::Program(module) => Some(module),
            Self::Expression(_) => None,
        }
    }
}

/// A parsed and analyzed JavaScript cell.
#[derive(Debug, Clone)]
pub struct ParsedCell {
    pub node: CellNode,
    pub spans: SpanMap,
    /// Identifiers the cell uses but does not declare, in source order.
    pub references: Vec<Reference>,
    /// Names declared at the top level of the cell, in source order.
    pub declarations: Vec<Reference>,
    /// Whether the cell suspends outside of nested functions.
    pub is_async: bool,
}

impl ParsedCell {
    /// Whether the cell is a single expression.
    pub fn is_expression(&self) -> bool {
        matches!(self.node, CellNode::Expression(_))
    }
}

/// Parse a cell and run the static checks every cell must pass.
pub fn parse_javascript(input: &str) -> Result<ParsedCell> {
    let (node, spans) = parse_node(input)?;
    let references = analysis::find_references(&node, spans, None);
    analysis::check_assignments(&node, &references, spans, input)?;
    let declarations = match &node {
        CellNode::Program(module) => analysis::find_declarations(module, spans, input)?,
        CellNode::Expression(_) => Vec::new(),
    };
    let is_async = !analysis::find_awaits(&node, spans).is_empty();
    Ok(ParsedCell {
        node,
        spans,
        references,
        declarations,
        is_async,
    })
}

/// Parse a cell into its syntax tree without analyzing it.
pub fn parse_node(input: &str) -> Result<(CellNode, SpanMap)> {
    check_size(input)?;
    if let Some(expr) = parse_expression_cell(input) {
        return Ok((CellNode::Expression(expr), SpanMap::new(ORIGIN + 1)));
    }

    let spans = SpanMap::new(ORIGIN);
    let module = parse_module(input).map_err(|err| syntax_error(&err, spans, input))?;
    for item in &module.body {
        if let ModuleItem::ModuleDecl(decl) = item {
            if !matches!(decl, ModuleDecl::Import(_)) {
                return Err(Error::parse(
                    "Unexpected export in cell",
                    spans.range(decl.span()),
                    input,
                ));
            }
        }
    }
    Ok((CellNode::Program(module), spans))
}

/// Parse one expression starting at `start` and return where it ends.
///
/// Only a hard parse failure is reported here. Text after the expression is
/// left to the caller, and diagnostics the parser recovers from are checked
/// when the generated cell is parsed as a whole.
pub(crate) fn expression_end(input: &str, start: usize) -> Result<usize> {
    check_size(input)?;
    let spans = SpanMap::new(ORIGIN);
    let rest = input.get(start..).ok_or_else(|| {
        Error::Structural(format!("expression offset {start} is not within the input"))
    })?;
    let lo = BytePos(ORIGIN + start as u32);
    let hi = BytePos(ORIGIN + input.len() as u32);
    let lexer = Lexer::new(syntax(), EsVersion::latest(), StringInput::new(rest, lo, hi), None);
    let mut parser = Parser::new_from(lexer);
    let expr = parser
        .parse_expr()
        .map_err(|err| syntax_error(&err, spans, input))?;
    Ok(spans.range(expr.span()).end)
}

/// Try the whole cell as one parenthesized expression.
///
/// The closing parenthesis goes on its own line so a trailing line comment
/// cannot swallow it. Named function and class expressions are treated as
/// declarations instead.
fn parse_expression_cell(input: &str) -> Option<Box<Expr>> {
    let wrapped = format!("({input}\n)");
    let module = parse_module(&wrapped).ok()?;
    let [ModuleItem::Stmt(Stmt::Expr(stmt))] = <[ModuleItem; 1]>::try_from(module.body).ok()?
    else {
        return None;
    };
    let Expr::Paren(paren) = *stmt.expr else {
        return None;
    };
    let whole = BytePos(ORIGIN)..BytePos(ORIGIN + wrapped.len() as u32);
    if paren.span.lo != whole.start || paren.span.hi != whole.end {
        return None;
    }
    let named = match &*paren.expr {
        Expr::Fn(function) => function.ident.is_some(),
        Expr::Class(class) => class.ident.is_some(),
        _ => false,
    };
    (!named).then_some(paren.expr)
}

fn parse_module(text: &str) -> std::result::Result<Module, SyntaxError> {
    let lo = BytePos(ORIGIN);
    let hi = BytePos(ORIGIN + text.len() as u32);
    let lexer = Lexer::new(syntax(), EsVersion::latest(), StringInput::new(text, lo, hi), None);
    let mut parser = Parser::new_from(lexer);
    let module = parser.parse_module()?;
    match parser.take_errors().into_iter().next() {
        Some(err) => Err(err),
        None => Ok(module),
    }
}

fn syntax() -> Syntax {
    Syntax::Es(EsSyntax::default())
}

fn syntax_error(err: &SyntaxError, spans: SpanMap, input: &str) -> Error {
    Error::parse(err.kind().msg(), spans.range(err.span()), input)
}

fn check_size(input: &str) -> Result<()> {
    // Leave room for the expression wrapper and the origin offset.
    if input.len() >= (u32::MAX / 2) as usize {
        return Err(Error::Structural(format!(
            "cell source of {} bytes is too large to parse",
            input.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(refs: &[Reference]) -> Vec<&str> {
        refs.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_single_expression() {
        let cell = parse_javascript("x + y").unwrap();
        assert!(cell.is_expression());
        assert_eq!(names(&cell.references), vec!["x", "y"]);
        assert!(cell.declarations.is_empty());
    }

    #[test]
    fn test_expression_offsets_match_source() {
        let cell = parse_javascript("  foo(bar)").unwrap();
        assert_eq!(cell.references[0].range, 2..5);
        assert_eq!(cell.references[1].range, 6..9);
    }

    #[test]
    fn test_object_literal_is_expression() {
        let cell = parse_javascript("{a: 1, b}").unwrap();
        assert!(cell.is_expression());
        assert_eq!(names(&cell.references), vec!["b"]);
    }

    #[test]
    fn test_trailing_line_comment_is_expression() {
        let cell = parse_javascript("x // the answer").unwrap();
        assert!(cell.is_expression());
    }

    #[test]
    fn test_trailing_semicolon_is_program() {
        let cell = parse_javascript("x;").unwrap();
        assert!(!cell.is_expression());
        assert_eq!(names(&cell.references), vec!["x"]);
    }

    #[test]
    fn test_unbalanced_wrapper_is_not_expression() {
        // Would parse as `(a) + (b\n)` if the wrapper were not checked.
        let err = parse_javascript("a) + (b").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_named_function_is_declaration() {
        let cell = parse_javascript("function f() { return 1; }").unwrap();
        assert!(!cell.is_expression());
        assert_eq!(names(&cell.declarations), vec!["f"]);
    }

    #[test]
    fn test_anonymous_function_is_expression() {
        let cell = parse_javascript("function () { return 1; }").unwrap();
        assert!(cell.is_expression());
    }

    #[test]
    fn test_top_level_await_program() {
        let cell = parse_javascript("const data = await load();").unwrap();
        assert!(cell.is_async);
        assert_eq!(names(&cell.declarations), vec!["data"]);
        assert_eq!(names(&cell.references), vec!["load"]);
    }

    #[test]
    fn test_await_expression_cell() {
        let cell = parse_javascript("await fetchJson(url)").unwrap();
        assert!(cell.is_expression());
        assert!(cell.is_async);
    }

    #[test]
    fn test_export_rejected() {
        let err = parse_javascript("export const x = 1;").unwrap_err();
        assert!(err.to_string().contains("Unexpected export"));
    }

    #[test]
    fn test_syntax_error_is_positioned() {
        let err = parse_javascript("let x = ;").unwrap_err();
        match err {
            Error::Parse { position, .. } => assert_eq!(position.line, 1),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_expression_end_stops_before_brace() {
        let input = "a ${x + f({y: 1})} b";
        let end = expression_end(input, 4).unwrap();
        assert_eq!(&input[4..end], "x + f({y: 1})");
    }

    #[test]
    fn test_empty_cell_is_empty_program() {
        let cell = parse_javascript("").unwrap();
        assert!(!cell.is_expression());
        assert!(cell.references.is_empty());
        assert!(cell.declarations.is_empty());
    }
}
