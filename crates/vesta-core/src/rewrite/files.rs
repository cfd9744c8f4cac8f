//! `FileAttachment` path resolution.

use std::ops::Range;

use rustc_hash::FxHashSet;
use swc_core::common::Spanned;
use swc_core::ecma::ast::{CallExpr, Callee, Expr};
use swc_core::ecma::visit::{Visit, VisitWith};
use tracing::trace;

use crate::analysis::find_references;
use crate::edit::EditBuffer;
use crate::error::{Error, Result};
use crate::parse::{CellNode, SpanMap};

const FILE_ATTACHMENT: &str = "FileAttachment";

/// Resolve the path argument of every `FileAttachment(path)` call against
/// the module URL.
///
/// Only calls to the free `FileAttachment` are rewritten; a local binding
/// with the same name is left alone.
pub fn rewrite_file_expressions(
    output: &mut EditBuffer<'_>,
    node: &CellNode,
    spans: SpanMap,
) -> Result<()> {
    let is_file_attachment = |name: &str| name == FILE_ATTACHMENT;
    let callees: FxHashSet<usize> = find_references(node, spans, Some(&is_file_attachment))
        .into_iter()
        .map(|reference| reference.range.start)
        .collect();
    if callees.is_empty() {
        return Ok(());
    }

    let mut finder = FileCalls {
        spans,
        callees,
        paths: Vec::new(),
        spread: None,
    };
    node.visit(&mut finder);
    if let Some(offset) = finder.spread {
        return Err(Error::Structural(format!(
            "{FILE_ATTACHMENT} at offset {offset} takes a spread argument, which cannot be resolved"
        )));
    }
    for path in finder.paths {
        trace!(start = path.start, end = path.end, "resolving file attachment path");
        output.insert_left(path.start, "new URL(")?;
        output.insert_right(path.end, ", import.meta.url).href")?;
    }
    Ok(())
}

struct FileCalls {
    spans: SpanMap,
    callees: FxHashSet<usize>,
    paths: Vec<Range<usize>>,
    spread: Option<usize>,
}

impl Visit for FileCalls {
    fn visit_call_expr(&mut self, node: &CallExpr) {
        if let Callee::Expr(callee) = &node.callee {
            if let Expr::Ident(ident) = &**callee {
                let start = self.spans.offset(ident.span.lo);
                if self.callees.contains(&start) {
                    match node.args.first() {
                        Some(arg) if arg.spread.is_some() => {
                            self.spread.get_or_insert(start);
                        }
                        Some(arg) => self.paths.push(self.spans.range(arg.expr.span())),
                        None => {}
                    }
                }
            }
        }
        node.visit_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_node;

    fn rewrite(input: &str) -> Result<String> {
        let (node, spans) = parse_node(input)?;
        let mut output = EditBuffer::new(input);
        rewrite_file_expressions(&mut output, &node, spans)?;
        Ok(output.to_string())
    }

    #[test]
    fn test_wraps_path_argument() {
        assert_eq!(
            rewrite("FileAttachment(\"data.csv\").csv()").unwrap(),
            "FileAttachment(new URL(\"data.csv\", import.meta.url).href).csv()"
        );
    }

    #[test]
    fn test_local_binding_untouched() {
        let input = "const FileAttachment = (x) => x; FileAttachment(\"a\");";
        assert_eq!(rewrite(input).unwrap(), input);
    }

    #[test]
    fn test_no_argument_untouched() {
        assert_eq!(rewrite("FileAttachment()").unwrap(), "FileAttachment()");
    }

    #[test]
    fn test_spread_argument_rejected() {
        let err = rewrite("FileAttachment(...paths)").unwrap_err();
        assert!(matches!(err, Error::Structural(_)));
    }
}
