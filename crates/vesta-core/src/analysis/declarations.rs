//! Top-level declarations of a program cell.

use swc_core::ecma::ast::{Decl, Ident, Module, ModuleDecl, ModuleItem, Stmt};

use super::bindings::{pattern_idents, specifier_local};
use super::{Reference, is_default_global};
use crate::error::{Error, Result};
use crate::parse::SpanMap;

/// Collect the names a program declares at its top level, in source order.
///
/// Redeclaring a host global (or `arguments`) is rejected.
pub fn find_declarations(module: &Module, spans: SpanMap, input: &str) -> Result<Vec<Reference>> {
    let mut idents: Vec<&Ident> = Vec::new();
    for item in &module.body {
        match item {
            ModuleItem::Stmt(Stmt::Decl(decl)) => match decl {
                Decl::Var(var) => {
                    for declarator in &var.decls {
                        pattern_idents(&declarator.name, &mut idents);
                    }
                }
                Decl::Using(using) => {
                    for declarator in &using.decls {
                        pattern_idents(&declarator.name, &mut idents);
                    }
                }
                Decl::Fn(function) => idents.push(&function.ident),
                Decl::Class(class) => idents.push(&class.ident),
                _ => {}
            },
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
                idents.extend(import.specifiers.iter().map(specifier_local));
            }
            _ => {}
        }
    }

    idents
        .into_iter()
        .map(|ident| {
            let name: &str = &ident.sym;
            if name == "arguments" || is_default_global(name) {
                return Err(Error::assignment(
                    format!("Global '{name}' cannot be redefined"),
                    spans.offset(ident.span.lo),
                    input,
                ));
            }
            Ok(Reference {
                name: name.to_string(),
                range: spans.range(ident.span),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{CellNode, parse_node};

    fn declarations(input: &str) -> Result<Vec<String>> {
        let (node, spans) = parse_node(input)?;
        let CellNode::Program(module) = node else {
            return Ok(Vec::new());
        };
        Ok(find_declarations(&module, spans, input)?
            .into_iter()
            .map(|r| r.name)
            .collect())
    }

    #[test]
    fn test_top_level_bindings() {
        let names = declarations(
            "import * as d3 from \"d3\";\nconst {a, b: [c]} = o;\n\
             function f() { let hidden; }\nclass K {}\nvar v;",
        )
        .unwrap();
        assert_eq!(names, vec!["d3", "a", "c", "f", "K", "v"]);
    }

    #[test]
    fn test_nested_declarations_excluded() {
        let names = declarations("{ const inner = 1; }\nif (x) { var hoisted = 2; }").unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn test_global_redefinition_rejected() {
        let err = declarations("let Math = 1;").unwrap_err();
        assert_eq!(err.to_string(), "Global 'Math' cannot be redefined (1:4)");
    }

    #[test]
    fn test_arguments_redefinition_rejected() {
        assert!(declarations("const arguments = [];").is_err());
    }
}
