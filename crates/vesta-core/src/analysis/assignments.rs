//! Mutation checks.
//!
//! A cell may only write to bindings it declares itself. Writing to one of
//! its inputs or to a host global is rejected at the first violation.

use rustc_hash::FxHashSet;
use swc_core::ecma::ast::{
    AssignExpr, AssignPat, AssignTarget, AssignTargetPat, Expr, ForHead, ForInStmt, ForOfStmt,
    Ident, ObjectPat, ObjectPatProp, Pat, SimpleAssignTarget, UpdateExpr,
};
use swc_core::ecma::visit::{Visit, VisitWith};

use super::{Reference, is_default_global};
use crate::error::{Error, Result};
use crate::parse::{CellNode, SpanMap};

/// Reject writes to free references and host globals.
///
/// `references` must come from [`super::find_references`] on the same tree;
/// identifiers are matched by their start offset.
pub fn check_assignments(
    node: &CellNode,
    references: &[Reference],
    spans: SpanMap,
    input: &str,
) -> Result<()> {
    let mut checker = AssignmentChecker {
        free: references.iter().map(|r| r.range.start).collect(),
        spans,
        input,
        error: None,
    };
    node.visit(&mut checker);
    match checker.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct AssignmentChecker<'a> {
    free: FxHashSet<usize>,
    spans: SpanMap,
    input: &'a str,
    error: Option<Error>,
}

impl AssignmentChecker<'_> {
    fn check_ident(&mut self, ident: &Ident) {
        if self.error.is_some() {
            return;
        }
        let offset = self.spans.offset(ident.span.lo);
        let message = if self.free.contains(&offset) {
            format!("Assignment to external variable '{}'", ident.sym)
        } else if is_default_global(&ident.sym) {
            format!("Assignment to global '{}'", ident.sym)
        } else {
            return;
        };
        self.error = Some(Error::assignment(message, offset, self.input));
    }

    fn check_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(ident) => self.check_ident(ident),
            Expr::Paren(paren) => self.check_expr(&paren.expr),
            _ => {}
        }
    }

    fn check_pat(&mut self, pat: &Pat) {
        match pat {
            Pat::Ident(binding) => self.check_ident(&binding.id),
            Pat::Array(array) => {
                for elem in array.elems.iter().flatten() {
                    self.check_pat(elem);
                }
            }
            Pat::Object(object) => self.check_object(object),
            Pat::Rest(rest) => self.check_pat(&rest.arg),
            Pat::Assign(assign) => self.check_pat(&assign.left),
            Pat::Expr(expr) => self.check_expr(expr),
            _ => {}
        }
    }

    fn check_object(&mut self, object: &ObjectPat) {
        for prop in &object.props {
            match prop {
                ObjectPatProp::KeyValue(kv) => self.check_pat(&kv.value),
                ObjectPatProp::Assign(assign) => self.check_ident(&assign.key.id),
                ObjectPatProp::Rest(rest) => self.check_pat(&rest.arg),
            }
        }
    }

    fn check_head(&mut self, head: &ForHead) {
        if let ForHead::Pat(pat) = head {
            self.check_pat(pat);
        }
    }
}

impl Visit for AssignmentChecker<'_> {
    fn visit_assign_expr(&mut self, node: &AssignExpr) {
        match &node.left {
            AssignTarget::Simple(SimpleAssignTarget::Ident(binding)) => {
                self.check_ident(&binding.id);
            }
            AssignTarget::Simple(SimpleAssignTarget::Paren(paren)) => self.check_expr(&paren.expr),
            AssignTarget::Pat(AssignTargetPat::Array(array)) => {
                for elem in array.elems.iter().flatten() {
                    self.check_pat(elem);
                }
            }
            AssignTarget::Pat(AssignTargetPat::Object(object)) => self.check_object(object),
            _ => {}
        }
        node.visit_children_with(self);
    }

    fn visit_assign_pat(&mut self, node: &AssignPat) {
        self.check_pat(&node.left);
        node.visit_children_with(self);
    }

    fn visit_update_expr(&mut self, node: &UpdateExpr) {
        self.check_expr(&node.arg);
        node.visit_children_with(self);
    }

    fn visit_for_in_stmt(&mut self, node: &ForInStmt) {
        self.check_head(&node.left);
        node.visit_children_with(self);
    }

    fn visit_for_of_stmt(&mut self, node: &ForOfStmt) {
        self.check_head(&node.left);
        node.visit_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::find_references;
    use crate::parse::parse_node;

    fn check(input: &str) -> Result<()> {
        let (node, spans) = parse_node(input)?;
        let references = find_references(&node, spans, None);
        check_assignments(&node, &references, spans, input)
    }

    fn message(input: &str) -> String {
        check(input).unwrap_err().to_string()
    }

    #[test]
    fn test_local_assignment_allowed() {
        assert!(check("let x = 1; x = 2; x++;").is_ok());
        assert!(check("let a, b; [a, b] = [b, a];").is_ok());
        assert!(check("function f(x) { x = 2; }").is_ok());
        assert!(check("obj.prop = 1;").is_ok());
    }

    #[test]
    fn test_external_assignment_rejected() {
        assert_eq!(message("x = 1;"), "Assignment to external variable 'x' (1:0)");
        assert_eq!(message("count++;"), "Assignment to external variable 'count' (1:0)");
    }

    #[test]
    fn test_destructuring_assignment_rejected() {
        assert_eq!(
            message("let a; [a, ...rest] = list;"),
            "Assignment to external variable 'rest' (1:14)"
        );
        assert_eq!(
            message("({key: value} = obj);"),
            "Assignment to external variable 'value' (1:7)"
        );
    }

    #[test]
    fn test_loop_target_rejected() {
        assert_eq!(
            message("for (item of items) {}"),
            "Assignment to external variable 'item' (1:5)"
        );
    }

    #[test]
    fn test_global_assignment_rejected() {
        // A shadowed global is a local binding, but the name stays reserved.
        assert_eq!(
            message("function f(undefined) { undefined = 1; }"),
            "Assignment to global 'undefined' (1:24)"
        );
    }

    #[test]
    fn test_first_violation_wins() {
        assert_eq!(message("a = 1; b = 2;"), "Assignment to external variable 'a' (1:0)");
    }

    #[test]
    fn test_nested_function_assignment_rejected() {
        assert!(check("() => { total += 1; }").is_err());
    }
}
