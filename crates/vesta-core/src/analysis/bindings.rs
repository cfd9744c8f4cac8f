//! Binding collection shared by the analysis passes.

use rustc_hash::FxHashSet;
use swc_core::ecma::ast::{
    ArrowExpr, Class, Constructor, Decl, ForHead, Function, GetterProp, Ident, ImportSpecifier,
    ObjectPatProp, Pat, SetterProp, Stmt, VarDecl, VarDeclKind,
};
use swc_core::ecma::visit::{Visit, VisitWith};

/// Push every identifier bound by `pat`, in source order.
pub(crate) fn pattern_idents<'a>(pat: &'a Pat, out: &mut Vec<&'a Ident>) {
    match pat {
        Pat::Ident(binding) => out.push(&binding.id),
        Pat::Array(array) => {
            for elem in array.elems.iter().flatten() {
                pattern_idents(elem, out);
            }
        }
        Pat::Object(object) => {
            for prop in &object.props {
                match prop {
                    ObjectPatProp::KeyValue(kv) => pattern_idents(&kv.value, out),
                    ObjectPatProp::Assign(assign) => out.push(&assign.key.id),
                    ObjectPatProp::Rest(rest) => pattern_idents(&rest.arg, out),
                }
            }
        }
        Pat::Rest(rest) => pattern_idents(&rest.arg, out),
        Pat::Assign(assign) => pattern_idents(&assign.left, out),
        _ => {}
    }
}

pub(crate) fn insert_pattern_names(pat: &Pat, names: &mut FxHashSet<String>) {
    let mut idents = Vec::new();
    pattern_idents(pat, &mut idents);
    names.extend(idents.into_iter().map(|ident| ident.sym.to_string()));
}

/// Names declared with `let`, `const`, `using`, `function` or `class`
/// directly in `stmts`.
pub(crate) fn lexical_names<'a>(stmts: impl IntoIterator<Item = &'a Stmt>) -> FxHashSet<String> {
    let mut names = FxHashSet::default();
    for stmt in stmts {
        if let Stmt::Decl(decl) = stmt {
            insert_lexical(decl, &mut names);
        }
    }
    names
}

fn insert_lexical(decl: &Decl, names: &mut FxHashSet<String>) {
    match decl {
        Decl::Var(var) if var.kind != VarDeclKind::Var => {
            for declarator in &var.decls {
                insert_pattern_names(&declarator.name, names);
            }
        }
        Decl::Using(using) => {
            for declarator in &using.decls {
                insert_pattern_names(&declarator.name, names);
            }
        }
        Decl::Fn(function) => {
            names.insert(function.ident.sym.to_string());
        }
        Decl::Class(class) => {
            names.insert(class.ident.sym.to_string());
        }
        _ => {}
    }
}

/// Names bound by a `for` loop head that are scoped to the loop.
pub(crate) fn loop_head_names(head: &ForHead) -> FxHashSet<String> {
    let mut names = FxHashSet::default();
    match head {
        ForHead::VarDecl(var) if var.kind != VarDeclKind::Var => {
            for declarator in &var.decls {
                insert_pattern_names(&declarator.name, &mut names);
            }
        }
        ForHead::UsingDecl(using) => {
            for declarator in &using.decls {
                insert_pattern_names(&declarator.name, &mut names);
            }
        }
        _ => {}
    }
    names
}

pub(crate) fn loop_init_names(var: &VarDecl) -> FxHashSet<String> {
    let mut names = FxHashSet::default();
    if var.kind != VarDeclKind::Var {
        for declarator in &var.decls {
            insert_pattern_names(&declarator.name, &mut names);
        }
    }
    names
}

pub(crate) fn specifier_local(specifier: &ImportSpecifier) -> &Ident {
    match specifier {
        ImportSpecifier::Named(named) => &named.local,
        ImportSpecifier::Default(default) => &default.local,
        ImportSpecifier::Namespace(namespace) => &namespace.local,
    }
}

/// Collect `var` names hoisted to the function or module containing `node`.
///
/// `node` must be a function body or a module; nested functions are skipped.
pub(crate) fn hoisted_vars<N>(node: &N, names: &mut FxHashSet<String>)
where
    N: for<'n> VisitWith<HoistedVars<'n>>,
{
    node.visit_with(&mut HoistedVars { names });
}

pub(crate) struct HoistedVars<'n> {
    names: &'n mut FxHashSet<String>,
}

impl Visit for HoistedVars<'_> {
    fn visit_var_decl(&mut self, node: &VarDecl) {
        if node.kind == VarDeclKind::Var {
            for declarator in &node.decls {
                insert_pattern_names(&declarator.name, self.names);
            }
        }
    }

    fn visit_function(&mut self, _: &Function) {}
    fn visit_arrow_expr(&mut self, _: &ArrowExpr) {}
    fn visit_constructor(&mut self, _: &Constructor) {}
    fn visit_getter_prop(&mut self, _: &GetterProp) {}
    fn visit_setter_prop(&mut self, _: &SetterProp) {}
    fn visit_class(&mut self, _: &Class) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{CellNode, parse_node};

    fn module_vars(input: &str) -> Vec<String> {
        let (node, _) = parse_node(input).unwrap();
        let CellNode::Program(module) = node else {
            panic!("expected a program");
        };
        let mut names = FxHashSet::default();
        hoisted_vars(&module, &mut names);
        let mut names: Vec<_> = names.into_iter().collect();
        names.sort();
        names
    }

    #[test]
    fn test_hoisted_vars_reach_through_blocks() {
        let names =
            module_vars("if (a) { var x = 1; } for (var i = 0; ;) { var {y, z: [w]} = o; }");
        assert_eq!(names, vec!["i", "w", "x", "y"]);
    }

    #[test]
    fn test_hoisted_vars_skip_functions() {
        let names = module_vars("function f() { var inner; } const g = () => { var arrow; };");
        assert!(names.is_empty());
    }

    #[test]
    fn test_hoisted_vars_ignore_lexical() {
        let names = module_vars("let a; const b = 1; { var c; }");
        assert_eq!(names, vec!["c"]);
    }
}
