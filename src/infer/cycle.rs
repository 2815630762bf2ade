//! Static detection of self-returning functions.
//!
//! `var loop = function () { return loop; }` has no base case: its return
//! type would be a function returning a function returning ... forever. Such
//! closures are found before the walk and answered with `Unknown` instead of
//! being handed to the fixed-point solver.

use crate::ast::visit::{hoisted_declarations, walk_stmt, Visit};
use crate::ast::{Expr, Function, Stmt, StmtKind};

struct Returns<'a> {
    values: Vec<Option<&'a Expr>>,
}

impl<'a> Visit<'a> for Returns<'a> {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        if let StmtKind::Return(arg) = &stmt.kind {
            self.values.push(arg.as_ref());
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, _expr: &'a Expr) {}

    // Returns of nested functions belong to them.
    fn visit_function(&mut self, _function: &'a Function) {}
}

/// Whether every `return` in `function` yields the binding `name` itself,
/// with `name` not shadowed inside the body.
pub fn returns_only_itself(function: &Function, name: &str) -> bool {
    if function.params.iter().any(|p| p == name) {
        return false;
    }
    let hoisted = hoisted_declarations(&function.body);
    let shadowed = hoisted.vars.contains(&name)
        || hoisted
            .functions
            .iter()
            .any(|f| f.name.as_deref() == Some(name));
    if shadowed {
        return false;
    }

    let mut returns = Returns { values: Vec::new() };
    for stmt in &function.body {
        returns.visit_stmt(stmt);
    }
    !returns.values.is_empty()
        && returns
            .values
            .iter()
            .all(|v| v.and_then(Expr::as_ident) == Some(name))
}
