//! Free identifier resolution.
//!
//! Walks the tree with a stack of lexical scopes. An identifier in reference
//! position that no enclosing scope declares, and that is not a host global,
//! is a free reference of the cell.

use rustc_hash::FxHashSet;
use swc_core::ecma::ast::{
    ArrowExpr, AssignPat, AssignPatProp, BindingIdent, BlockStmt, BlockStmtOrExpr, BreakStmt,
    CatchClause, Class, ClassDecl, ClassExpr, Constructor, ContinueStmt, DoWhileStmt, FnDecl,
    FnExpr, ForInStmt, ForOfStmt, ForStmt, Function, GetterProp, Ident, ImportDecl,
    KeyValuePatProp, LabeledStmt, Module, ModuleDecl, ModuleItem, Param, ParamOrTsParamProp,
    SetterProp, StaticBlock, SwitchStmt, VarDeclOrExpr, VarDeclarator,
};
use swc_core::ecma::visit::{Visit, VisitWith};

use super::bindings::{
    hoisted_vars, insert_pattern_names, lexical_names, loop_head_names, loop_init_names,
    specifier_local,
};
use super::{Reference, is_default_global};
use crate::parse::{CellNode, SpanMap};

/// Find the free identifiers of a cell, in source order.
///
/// Every occurrence is reported, so a name can appear more than once. When
/// `filter` is given only names it accepts are reported.
pub fn find_references(
    node: &CellNode,
    spans: SpanMap,
    filter: Option<&dyn Fn(&str) -> bool>,
) -> Vec<Reference> {
    let mut finder = ReferenceFinder {
        spans,
        filter,
        scopes: Vec::new(),
        declaring: false,
        references: Vec::new(),
    };
    node.visit(&mut finder);
    finder.references
}

struct ReferenceFinder<'f> {
    spans: SpanMap,
    filter: Option<&'f dyn Fn(&str) -> bool>,
    scopes: Vec<FxHashSet<String>>,
    /// Set while visiting binding patterns of a declaration.
    declaring: bool,
    references: Vec<Reference>,
}

impl ReferenceFinder<'_> {
    fn with_scope(&mut self, names: FxHashSet<String>, f: impl FnOnce(&mut Self)) {
        let declaring = std::mem::replace(&mut self.declaring, false);
        self.scopes.push(names);
        f(self);
        self.scopes.pop();
        self.declaring = declaring;
    }

    fn with_declaring(&mut self, declaring: bool, f: impl FnOnce(&mut Self)) {
        let previous = std::mem::replace(&mut self.declaring, declaring);
        f(self);
        self.declaring = previous;
    }

    fn is_declared(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains(name))
    }

    fn reference(&mut self, ident: &Ident) {
        let name: &str = &ident.sym;
        if self.is_declared(name) || is_default_global(name) {
            return;
        }
        if let Some(filter) = self.filter {
            if !filter(name) {
                return;
            }
        }
        self.references.push(Reference {
            name: name.to_string(),
            range: self.spans.range(ident.span),
        });
    }

    fn declare_params<T: VisitWith<Self>>(&mut self, params: &[T]) {
        self.with_declaring(true, |this| params.iter().for_each(|param| param.visit_with(this)));
    }

    fn enter_body(
        &mut self,
        mut names: FxHashSet<String>,
        body: Option<&BlockStmt>,
        f: impl FnOnce(&mut Self),
    ) {
        if let Some(body) = body {
            hoisted_vars(body, &mut names);
        }
        self.with_scope(names, |this| {
            f(this);
            if let Some(body) = body {
                this.visit_block_stmt(body);
            }
        });
    }
}

fn arguments_scope() -> FxHashSet<String> {
    let mut names = FxHashSet::default();
    names.insert("arguments".to_string());
    names
}

impl Visit for ReferenceFinder<'_> {
    fn visit_module(&mut self, node: &Module) {
        let stmts = node.body.iter().filter_map(|item| match item {
            ModuleItem::Stmt(stmt) => Some(stmt),
            ModuleItem::ModuleDecl(_) => None,
        });
        let mut names = lexical_names(stmts);
        hoisted_vars(node, &mut names);
        for item in &node.body {
            if let ModuleItem::ModuleDecl(ModuleDecl::Import(import)) = item {
                for specifier in &import.specifiers {
                    names.insert(specifier_local(specifier).sym.to_string());
                }
            }
        }
        self.with_scope(names, |this| node.visit_children_with(this));
    }

    fn visit_function(&mut self, node: &Function) {
        let mut names = arguments_scope();
        for param in &node.params {
            insert_pattern_names(&param.pat, &mut names);
        }
        self.enter_body(names, node.body.as_ref(), |this| {
            this.declare_params(&node.params);
        });
    }

    fn visit_arrow_expr(&mut self, node: &ArrowExpr) {
        let mut names = FxHashSet::default();
        for param in &node.params {
            insert_pattern_names(param, &mut names);
        }
        match &*node.body {
            BlockStmtOrExpr::BlockStmt(body) => {
                self.enter_body(names, Some(body), |this| this.declare_params(&node.params));
            }
            BlockStmtOrExpr::Expr(expr) => {
                self.with_scope(names, |this| {
                    this.declare_params(&node.params);
                    expr.visit_with(this);
                });
            }
            _ => {}
        }
    }

    fn visit_constructor(&mut self, node: &Constructor) {
        node.key.visit_with(self);
        let params: Vec<&Param> = node
            .params
            .iter()
            .filter_map(|param| match param {
                ParamOrTsParamProp::Param(param) => Some(param),
                _ => None,
            })
            .collect();
        let mut names = arguments_scope();
        for param in &params {
            insert_pattern_names(&param.pat, &mut names);
        }
        self.enter_body(names, node.body.as_ref(), |this| {
            this.with_declaring(true, |this| {
                params.iter().for_each(|param| this.visit_param(param));
            });
        });
    }

    fn visit_getter_prop(&mut self, node: &GetterProp) {
        node.key.visit_with(self);
        self.enter_body(arguments_scope(), node.body.as_ref(), |_| {});
    }

    fn visit_setter_prop(&mut self, node: &SetterProp) {
        node.key.visit_with(self);
        let mut names = arguments_scope();
        insert_pattern_names(&node.param, &mut names);
        self.enter_body(names, node.body.as_ref(), |this| {
            this.declare_params(std::slice::from_ref(&*node.param));
        });
    }

    fn visit_fn_decl(&mut self, node: &FnDecl) {
        self.visit_function(&node.function);
    }

    fn visit_fn_expr(&mut self, node: &FnExpr) {
        let mut names = FxHashSet::default();
        if let Some(ident) = &node.ident {
            names.insert(ident.sym.to_string());
        }
        self.with_scope(names, |this| this.visit_function(&node.function));
    }

    fn visit_class(&mut self, node: &Class) {
        node.decorators.visit_with(self);
        node.super_class.visit_with(self);
        node.body.visit_with(self);
    }

    fn visit_class_decl(&mut self, node: &ClassDecl) {
        node.class.visit_with(self);
    }

    fn visit_class_expr(&mut self, node: &ClassExpr) {
        let mut names = FxHashSet::default();
        if let Some(ident) = &node.ident {
            names.insert(ident.sym.to_string());
        }
        self.with_scope(names, |this| node.class.visit_with(this));
    }

    fn visit_static_block(&mut self, node: &StaticBlock) {
        self.enter_body(FxHashSet::default(), Some(&node.body), |_| {});
    }

    fn visit_block_stmt(&mut self, node: &BlockStmt) {
        let names = lexical_names(&node.stmts);
        self.with_scope(names, |this| node.visit_children_with(this));
    }

    fn visit_switch_stmt(&mut self, node: &SwitchStmt) {
        node.discriminant.visit_with(self);
        let names = lexical_names(node.cases.iter().flat_map(|case| case.cons.iter()));
        self.with_scope(names, |this| node.cases.visit_with(this));
    }

    fn visit_do_while_stmt(&mut self, node: &DoWhileStmt) {
        node.body.visit_with(self);
        node.test.visit_with(self);
    }

    fn visit_for_stmt(&mut self, node: &ForStmt) {
        let names = match &node.init {
            Some(VarDeclOrExpr::VarDecl(var)) => loop_init_names(var),
            _ => FxHashSet::default(),
        };
        self.with_scope(names, |this| node.visit_children_with(this));
    }

    fn visit_for_in_stmt(&mut self, node: &ForInStmt) {
        let names = loop_head_names(&node.left);
        self.with_scope(names, |this| node.visit_children_with(this));
    }

    fn visit_for_of_stmt(&mut self, node: &ForOfStmt) {
        let names = loop_head_names(&node.left);
        self.with_scope(names, |this| node.visit_children_with(this));
    }

    fn visit_catch_clause(&mut self, node: &CatchClause) {
        let mut names = FxHashSet::default();
        if let Some(param) = &node.param {
            insert_pattern_names(param, &mut names);
        }
        self.with_scope(names, |this| {
            if let Some(param) = &node.param {
                this.with_declaring(true, |this| param.visit_with(this));
            }
            this.visit_block_stmt(&node.body);
        });
    }

    fn visit_var_declarator(&mut self, node: &VarDeclarator) {
        self.with_declaring(true, |this| node.name.visit_with(this));
        if let Some(init) = &node.init {
            self.with_declaring(false, |this| init.visit_with(this));
        }
    }

    fn visit_assign_pat(&mut self, node: &AssignPat) {
        node.left.visit_with(self);
        self.with_declaring(false, |this| node.right.visit_with(this));
    }

    fn visit_assign_pat_prop(&mut self, node: &AssignPatProp) {
        if !self.declaring {
            self.reference(&node.key.id);
        }
        if let Some(value) = &node.value {
            self.with_declaring(false, |this| value.visit_with(this));
        }
    }

    fn visit_key_value_pat_prop(&mut self, node: &KeyValuePatProp) {
        self.with_declaring(false, |this| node.key.visit_with(this));
        node.value.visit_with(self);
    }

    fn visit_binding_ident(&mut self, node: &BindingIdent) {
        if !self.declaring {
            self.reference(&node.id);
        }
    }

    fn visit_ident(&mut self, node: &Ident) {
        self.reference(node);
    }

    fn visit_labeled_stmt(&mut self, node: &LabeledStmt) {
        node.body.visit_with(self);
    }

    fn visit_break_stmt(&mut self, _: &BreakStmt) {}

    fn visit_continue_stmt(&mut self, _: &ContinueStmt) {}

    fn visit_import_decl(&mut self, _: &ImportDecl) {}
}
