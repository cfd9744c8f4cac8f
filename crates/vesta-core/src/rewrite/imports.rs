//! Import rewriting.
//!
//! Cell bodies run inside a function, where static `import` declarations are
//! not allowed. Declarations are replaced by a dynamic `import()` awaited at
//! the top of the body, and module specifiers are resolved to URLs the
//! browser can load.

use std::ops::Range;

use swc_core::ecma::ast::{
    CallExpr, Callee, Expr, ImportDecl, ImportSpecifier, Lit, Module, ModuleDecl, ModuleExportName,
    ModuleItem,
};
use swc_core::ecma::visit::{Visit, VisitWith};
use tracing::trace;

use crate::cell::TranspileOptions;
use crate::edit::EditBuffer;
use crate::error::{Error, Result};
use crate::parse::{CellNode, SpanMap};

const NPM_PREFIX: &str = "npm:";
const NPM_CDN: &str = "https://cdn.jsdelivr.net/npm/";

/// Whether the cell has at least one static `import` declaration.
pub fn has_import_declaration(node: &CellNode) -> bool {
    node.as_program().is_some_and(|module| imports(module).next().is_some())
}

fn imports(module: &Module) -> impl Iterator<Item = &ImportDecl> {
    module.body.iter().filter_map(|item| match item {
        ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => Some(import),
        _ => None,
    })
}

/// Replace the static imports of `module` with one awaited dynamic import.
///
/// The import statement is registered as a left insert at offset 0, so it
/// lands after any function signature registered there before it.
pub fn rewrite_import_declarations(
    output: &mut EditBuffer<'_>,
    module: &Module,
    spans: SpanMap,
    options: &TranspileOptions,
) -> Result<()> {
    let input = output.original();
    let body_end = input.trim_end().len();
    let mut patterns = Vec::new();
    let mut sources = Vec::new();
    let mut extra = Vec::new();

    for import in imports(module) {
        let range = spans.range(import.span);
        // Take the line break with the declaration unless it belongs to the
        // trailing whitespace removed by trim.
        let end = if range.end < body_end && input[range.end..].starts_with('\n') {
            range.end + 1
        } else {
            range.end
        };
        output.delete(range.start, end)?;

        patterns.push(import_pattern(import, spans, input, &mut extra));
        let source = resolve_import_source(&input[spans.range(import.src.span)], options)?;
        sources.push(match &import.with {
            Some(with) => format!("import({source}, {{with: {}}})", &input[spans.range(with.span)]),
            None => format!("import({source})"),
        });
    }

    if patterns.is_empty() {
        return Ok(());
    }
    trace!(count = patterns.len(), "rewriting import declarations");
    let statement = if let ([pattern], [source]) = (patterns.as_slice(), sources.as_slice()) {
        format!("const {pattern} = await {source};\n")
    } else {
        format!(
            "const [{}] = await Promise.all([{}]);\n",
            patterns.join(", "),
            sources.join(", ")
        )
    };
    output.insert_left(0, statement)?;
    for line in extra {
        output.insert_left(0, format!("{line}\n"))?;
    }
    Ok(())
}

/// Binding pattern receiving the module object of `import`.
fn import_pattern(
    import: &ImportDecl,
    spans: SpanMap,
    input: &str,
    extra: &mut Vec<String>,
) -> String {
    let namespace = import.specifiers.iter().find_map(|specifier| match specifier {
        ImportSpecifier::Namespace(namespace) => Some(&namespace.local.sym),
        _ => None,
    });
    if let Some(namespace) = namespace {
        for specifier in &import.specifiers {
            if let ImportSpecifier::Default(default) = specifier {
                extra.push(format!("const {{default: {}}} = {namespace};", default.local.sym));
            }
        }
        return namespace.to_string();
    }

    let fields: Vec<String> = import
        .specifiers
        .iter()
        .filter_map(|specifier| match specifier {
            ImportSpecifier::Default(default) => Some(format!("default: {}", default.local.sym)),
            ImportSpecifier::Named(named) => Some(match &named.imported {
                Some(ModuleExportName::Ident(imported)) if imported.sym != named.local.sym => {
                    format!("{}: {}", imported.sym, named.local.sym)
                }
                Some(ModuleExportName::Str(imported)) => {
                    format!("{}: {}", &input[spans.range(imported.span)], named.local.sym)
                }
                _ => named.local.sym.to_string(),
            }),
            ImportSpecifier::Namespace(_) => None,
        })
        .collect();
    format!("{{{}}}", fields.join(", "))
}

/// Rewrite the string literal sources of dynamic `import()` calls.
pub fn rewrite_import_expressions(
    output: &mut EditBuffer<'_>,
    node: &CellNode,
    spans: SpanMap,
    options: &TranspileOptions,
) -> Result<()> {
    let mut finder = DynamicImports {
        spans,
        sources: Vec::new(),
    };
    node.visit(&mut finder);
    let input = output.original();
    for range in finder.sources {
        let raw = &input[range.clone()];
        let resolved = resolve_import_source(raw, options)?;
        if resolved != raw {
            trace!(from = raw, to = %resolved, "rewriting dynamic import");
            output.replace_right(range.start, range.end, resolved)?;
        }
    }
    Ok(())
}

struct DynamicImports {
    spans: SpanMap,
    sources: Vec<Range<usize>>,
}

impl Visit for DynamicImports {
    fn visit_call_expr(&mut self, node: &CallExpr) {
        if let Callee::Import(_) = node.callee {
            if let Some(arg) = node.args.first() {
                if let (None, Expr::Lit(Lit::Str(source))) = (&arg.spread, &*arg.expr) {
                    self.sources.push(self.spans.range(source.span));
                }
            }
        }
        node.visit_children_with(self);
    }
}

/// Resolve a quoted module specifier to the JavaScript expression that
/// loads it. Specifiers that need no resolution are returned as written.
pub fn resolve_import_source(raw: &str, options: &TranspileOptions) -> Result<String> {
    let value = unquote(raw);
    if let Some(name) = value.strip_prefix(NPM_PREFIX) {
        let url = format!("{NPM_CDN}{name}/+esm");
        return serde_json::to_string(&url)
            .map_err(|err| Error::Structural(format!("cannot quote import source: {err}")));
    }
    if options.resolve_local_imports && is_local_specifier(value) {
        return Ok(format!("new URL({raw}, document.baseURI).href"));
    }
    Ok(raw.to_string())
}

fn is_local_specifier(specifier: &str) -> bool {
    ["./", "../", "/"]
        .iter()
        .any(|prefix| specifier.starts_with(prefix))
}

fn unquote(raw: &str) -> &str {
    let mut chars = raw.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open @ ('"' | '\'')), Some(close)) if open == close => chars.as_str(),
        _ => raw,
    }
}
