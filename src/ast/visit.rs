//! Read-only traversal over the AST.
//!
//! Implementors override the hooks they care about and call the matching
//! `walk_*` function to keep descending. Function bodies are entered only
//! through [`Visit::visit_function`], so a visitor can stop at function
//! boundaries by not walking there.

use super::node::*;

pub trait Visit<'a> {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &'a Expr) {
        walk_expr(self, expr);
    }

    fn visit_function(&mut self, function: &'a Function) {
        walk_function(self, function);
    }
}

pub fn walk_function<'a, V: Visit<'a> + ?Sized>(v: &mut V, function: &'a Function) {
    for stmt in &function.body {
        v.visit_stmt(stmt);
    }
}

pub fn walk_stmt<'a, V: Visit<'a> + ?Sized>(v: &mut V, stmt: &'a Stmt) {
    match &stmt.kind {
        StmtKind::Block(body) => {
            for s in body {
                v.visit_stmt(s);
            }
        }
        StmtKind::Empty | StmtKind::Break | StmtKind::Continue => {}
        StmtKind::Expr(e) | StmtKind::Throw(e) => v.visit_expr(e),
        StmtKind::Var(decls) => {
            for decl in decls {
                if let Some(init) = &decl.init {
                    v.visit_expr(init);
                }
            }
        }
        StmtKind::FunctionDecl(function) => v.visit_function(function),
        StmtKind::Return(arg) => {
            if let Some(e) = arg {
                v.visit_expr(e);
            }
        }
        StmtKind::If {
            test,
            consequent,
            alternate,
        } => {
            v.visit_expr(test);
            v.visit_stmt(consequent);
            if let Some(alt) = alternate {
                v.visit_stmt(alt);
            }
        }
        StmtKind::While { test, body } | StmtKind::DoWhile { body, test } => {
            v.visit_expr(test);
            v.visit_stmt(body);
        }
        StmtKind::For {
            init,
            test,
            update,
            body,
        } => {
            match init {
                Some(ForInit::VarDecl(decls)) => {
                    for decl in decls {
                        if let Some(e) = &decl.init {
                            v.visit_expr(e);
                        }
                    }
                }
                Some(ForInit::Expr(e)) => v.visit_expr(e),
                None => {}
            }
            if let Some(e) = test {
                v.visit_expr(e);
            }
            if let Some(e) = update {
                v.visit_expr(e);
            }
            v.visit_stmt(body);
        }
        StmtKind::ForIn { left, right, body } => {
            if let ForInLhs::Expr(e) = left {
                v.visit_expr(e);
            }
            v.visit_expr(right);
            v.visit_stmt(body);
        }
        StmtKind::Switch {
            discriminant,
            cases,
        } => {
            v.visit_expr(discriminant);
            for case in cases {
                if let Some(t) = &case.test {
                    v.visit_expr(t);
                }
                for s in &case.consequent {
                    v.visit_stmt(s);
                }
            }
        }
        StmtKind::Try {
            block,
            handler,
            finalizer,
        } => {
            for s in block {
                v.visit_stmt(s);
            }
            if let Some(h) = handler {
                for s in &h.body {
                    v.visit_stmt(s);
                }
            }
            for s in finalizer.iter().flatten() {
                v.visit_stmt(s);
            }
        }
    }
}

pub fn walk_expr<'a, V: Visit<'a> + ?Sized>(v: &mut V, expr: &'a Expr) {
    match &expr.kind {
        ExprKind::Lit(_) | ExprKind::Ident(_) | ExprKind::This => {}
        ExprKind::Array(elements) | ExprKind::Sequence(elements) => {
            for e in elements {
                v.visit_expr(e);
            }
        }
        ExprKind::Object(props) => {
            for p in props {
                v.visit_expr(&p.value);
            }
        }
        ExprKind::Function(function) => v.visit_function(function),
        ExprKind::Member { object, .. } => v.visit_expr(object),
        ExprKind::ComputedMember { object, property } => {
            v.visit_expr(object);
            v.visit_expr(property);
        }
        ExprKind::Call { callee, arguments } => {
            if let Some(c) = callee {
                v.visit_expr(c);
            }
            for a in arguments {
                v.visit_expr(a);
            }
        }
        ExprKind::New { callee, arguments } => {
            v.visit_expr(callee);
            for a in arguments {
                v.visit_expr(a);
            }
        }
        ExprKind::Unary { argument, .. } => v.visit_expr(argument),
        ExprKind::Binary { left, right, .. } | ExprKind::Assign { left, right, .. } => {
            v.visit_expr(left);
            v.visit_expr(right);
        }
        ExprKind::Conditional {
            test,
            consequent,
            alternate,
        } => {
            v.visit_expr(test);
            v.visit_expr(consequent);
            v.visit_expr(alternate);
        }
    }
}

/// Declarations hoisted to the top of a function body or program.
#[derive(Debug, Default)]
pub struct Hoisted<'a> {
    pub vars: Vec<&'a str>,
    pub functions: Vec<&'a Function>,
}

struct HoistCollector<'a> {
    hoisted: Hoisted<'a>,
}

impl<'a> Visit<'a> for HoistCollector<'a> {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        match &stmt.kind {
            StmtKind::Var(decls) | StmtKind::For {
                init: Some(ForInit::VarDecl(decls)),
                ..
            } => {
                self.hoisted
                    .vars
                    .extend(decls.iter().map(|d| d.name.as_str()));
            }
            StmtKind::ForIn {
                left: ForInLhs::VarDecl(name),
                ..
            } => self.hoisted.vars.push(name),
            StmtKind::FunctionDecl(function) => {
                self.hoisted.functions.push(function);
                // Nested bodies hoist into their own scope.
                return;
            }
            _ => {}
        }
        walk_stmt(self, stmt);
    }

    // Expressions cannot contain declarations of this scope.
    fn visit_expr(&mut self, _expr: &'a Expr) {}
}

/// Collect `var` names and function declarations of `body`, without
/// entering nested functions.
pub fn hoisted_declarations(body: &[Stmt]) -> Hoisted<'_> {
    let mut collector = HoistCollector {
        hoisted: Hoisted::default(),
    };
    for stmt in body {
        collector.visit_stmt(stmt);
    }
    collector.hoisted
}
