//! Suspend points of a cell.

use std::ops::Range;

use swc_core::ecma::ast::{
    ArrowExpr, AwaitExpr, Constructor, ForOfStmt, Function, GetterProp, SetterProp,
};
use swc_core::ecma::visit::{Visit, VisitWith};

use crate::parse::{CellNode, SpanMap};

/// Find the points where a cell suspends outside any nested function.
///
/// Reports every `await` expression and every `for await` loop. An await
/// nested inside another await is covered by the outer one and not reported
/// separately.
pub fn find_awaits(node: &CellNode, spans: SpanMap) -> Vec<Range<usize>> {
    let mut finder = AwaitFinder {
        spans,
        found: Vec::new(),
    };
    node.visit(&mut finder);
    finder.found
}

struct AwaitFinder {
    spans: SpanMap,
    found: Vec<Range<usize>>,
}

impl Visit for AwaitFinder {
    fn visit_await_expr(&mut self, node: &AwaitExpr) {
        self.found.push(self.spans.range(node.span));
    }

    fn visit_for_of_stmt(&mut self, node: &ForOfStmt) {
        if node.is_await {
            self.found.push(self.spans.range(node.span));
        }
        node.visit_children_with(self);
    }

    fn visit_function(&mut self, _: &Function) {}
    fn visit_arrow_expr(&mut self, _: &ArrowExpr) {}
    fn visit_constructor(&mut self, _: &Constructor) {}
    fn visit_getter_prop(&mut self, _: &GetterProp) {}
    fn visit_setter_prop(&mut self, _: &SetterProp) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_node;

    fn awaits(input: &str) -> Vec<&str> {
        let (node, spans) = parse_node(input).unwrap();
        find_awaits(&node, spans)
            .into_iter()
            .map(|range| &input[range])
            .collect()
    }

    #[test]
    fn test_top_level_await() {
        assert_eq!(awaits("const x = await f();"), vec!["await f()"]);
    }

    #[test]
    fn test_nested_await_reported_once() {
        assert_eq!(awaits("await g(await f())"), vec!["await g(await f())"]);
    }

    #[test]
    fn test_for_await() {
        let found = awaits("for await (const chunk of stream) { await save(chunk); }");
        assert_eq!(found.len(), 2);
        assert!(found[0].starts_with("for await"));
        assert_eq!(found[1], "await save(chunk)");
    }

    #[test]
    fn test_functions_are_opaque() {
        assert!(awaits("async function f() { await g(); }").is_empty());
        assert!(awaits("const h = async () => await g();").is_empty());
        assert!(awaits("({ async m() { await g(); } })").is_empty());
    }

    #[test]
    fn test_no_awaits() {
        assert!(awaits("1 + 2").is_empty());
    }
}
