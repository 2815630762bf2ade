//! Construction helpers for AST nodes.
//!
//! The inferencer keys its results by [`NodeId`], so every node in a program
//! must have a distinct id. `AstBuilder` hands them out sequentially; parsers
//! feeding the engine use it to build trees, and so do the tests.

use super::node::*;

/// Allocates node ids and assembles AST nodes.
#[derive(Debug, Default)]
pub struct AstBuilder {
    next_id: u32,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh node id.
    pub fn fresh_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        NodeId(id)
    }

    fn expr(&mut self, kind: ExprKind) -> Expr {
        Expr {
            id: self.fresh_id(),
            span: Span::default(),
            kind,
        }
    }

    fn stmt(&mut self, kind: StmtKind) -> Stmt {
        Stmt {
            id: self.fresh_id(),
            span: Span::default(),
            kind,
        }
    }

    // === Expressions ===

    pub fn num(&mut self, value: f64) -> Expr {
        self.expr(ExprKind::Lit(Literal::Number(value)))
    }

    pub fn str(&mut self, value: &str) -> Expr {
        self.expr(ExprKind::Lit(Literal::String(value.to_string())))
    }

    pub fn bool(&mut self, value: bool) -> Expr {
        self.expr(ExprKind::Lit(Literal::Boolean(value)))
    }

    pub fn null(&mut self) -> Expr {
        self.expr(ExprKind::Lit(Literal::Null))
    }

    pub fn undefined(&mut self) -> Expr {
        self.expr(ExprKind::Lit(Literal::Undefined))
    }

    pub fn ident(&mut self, name: &str) -> Expr {
        self.expr(ExprKind::Ident(name.to_string()))
    }

    pub fn this(&mut self) -> Expr {
        self.expr(ExprKind::This)
    }

    pub fn object(&mut self, properties: Vec<(&str, Expr)>) -> Expr {
        let properties = properties
            .into_iter()
            .map(|(key, value)| Property {
                key: key.to_string(),
                span: value.span,
                value,
            })
            .collect();
        self.expr(ExprKind::Object(properties))
    }

    pub fn array(&mut self, elements: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Array(elements))
    }

    /// Build a function literal (used by both declarations and expressions).
    pub fn function(&mut self, name: Option<&str>, params: &[&str], body: Vec<Stmt>) -> Function {
        Function {
            id: self.fresh_id(),
            name: name.map(str::to_string),
            params: params.iter().map(|p| p.to_string()).collect(),
            body,
            span: Span::default(),
        }
    }

    pub fn func_expr(&mut self, name: Option<&str>, params: &[&str], body: Vec<Stmt>) -> Expr {
        let function = self.function(name, params, body);
        self.expr(ExprKind::Function(Box::new(function)))
    }

    pub fn member(&mut self, object: Expr, property: &str) -> Expr {
        self.expr(ExprKind::Member {
            object: Box::new(object),
            property: property.to_string(),
        })
    }

    pub fn index(&mut self, object: Expr, property: Expr) -> Expr {
        self.expr(ExprKind::ComputedMember {
            object: Box::new(object),
            property: Box::new(property),
        })
    }

    pub fn call(&mut self, callee: Expr, arguments: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Call {
            callee: Some(Box::new(callee)),
            arguments,
        })
    }

    /// A call node with its callee missing, as a broken parser might emit.
    pub fn call_without_callee(&mut self, arguments: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Call {
            callee: None,
            arguments,
        })
    }

    /// `object.method(arguments)`
    pub fn method_call(&mut self, object: Expr, method: &str, arguments: Vec<Expr>) -> Expr {
        let callee = self.member(object, method);
        self.call(callee, arguments)
    }

    pub fn new_expr(&mut self, callee: Expr, arguments: Vec<Expr>) -> Expr {
        self.expr(ExprKind::New {
            callee: Box::new(callee),
            arguments,
        })
    }

    pub fn unary(&mut self, op: UnaryOp, argument: Expr) -> Expr {
        self.expr(ExprKind::Unary {
            op,
            argument: Box::new(argument),
        })
    }

    pub fn binary(&mut self, op: BinOp, left: Expr, right: Expr) -> Expr {
        self.expr(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn assign(&mut self, left: Expr, right: Expr) -> Expr {
        self.assign_op(AssignOp::Assign, left, right)
    }

    pub fn assign_op(&mut self, op: AssignOp, left: Expr, right: Expr) -> Expr {
        self.expr(ExprKind::Assign {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn conditional(&mut self, test: Expr, consequent: Expr, alternate: Expr) -> Expr {
        self.expr(ExprKind::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    pub fn sequence(&mut self, expressions: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Sequence(expressions))
    }

    // === Statements ===

    pub fn expr_stmt(&mut self, expression: Expr) -> Stmt {
        self.stmt(StmtKind::Expr(expression))
    }

    /// `var name = init;`
    pub fn var(&mut self, name: &str, init: Expr) -> Stmt {
        self.var_decl(name, Some(init))
    }

    pub fn var_decl(&mut self, name: &str, init: Option<Expr>) -> Stmt {
        let span = init.as_ref().map(|e| e.span).unwrap_or_default();
        self.stmt(StmtKind::Var(vec![VarDeclarator {
            name: name.to_string(),
            init,
            span,
        }]))
    }

    pub fn function_decl(&mut self, name: &str, params: &[&str], body: Vec<Stmt>) -> Stmt {
        let function = self.function(Some(name), params, body);
        self.stmt(StmtKind::FunctionDecl(Box::new(function)))
    }

    pub fn ret(&mut self, argument: Expr) -> Stmt {
        self.stmt(StmtKind::Return(Some(argument)))
    }

    pub fn ret_void(&mut self) -> Stmt {
        self.stmt(StmtKind::Return(None))
    }

    pub fn block(&mut self, body: Vec<Stmt>) -> Stmt {
        self.stmt(StmtKind::Block(body))
    }

    pub fn empty(&mut self) -> Stmt {
        self.stmt(StmtKind::Empty)
    }

    pub fn if_stmt(
        &mut self,
        test: Expr,
        consequent: Vec<Stmt>,
        alternate: Option<Vec<Stmt>>,
    ) -> Stmt {
        let consequent = Box::new(self.block(consequent));
        let alternate = alternate.map(|alt| Box::new(self.block(alt)));
        self.stmt(StmtKind::If {
            test,
            consequent,
            alternate,
        })
    }

    pub fn while_stmt(&mut self, test: Expr, body: Vec<Stmt>) -> Stmt {
        let body = Box::new(self.block(body));
        self.stmt(StmtKind::While { test, body })
    }

    pub fn for_stmt(
        &mut self,
        init: Option<ForInit>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Vec<Stmt>,
    ) -> Stmt {
        let body = Box::new(self.block(body));
        self.stmt(StmtKind::For {
            init,
            test,
            update,
            body,
        })
    }

    /// `for (var name in right) { body }`
    pub fn for_in(&mut self, name: &str, right: Expr, body: Vec<Stmt>) -> Stmt {
        let body = Box::new(self.block(body));
        self.stmt(StmtKind::ForIn {
            left: ForInLhs::VarDecl(name.to_string()),
            right,
            body,
        })
    }

    pub fn throw(&mut self, argument: Expr) -> Stmt {
        self.stmt(StmtKind::Throw(argument))
    }

    pub fn try_catch(&mut self, block: Vec<Stmt>, param: &str, handler: Vec<Stmt>) -> Stmt {
        self.stmt(StmtKind::Try {
            block,
            handler: Some(CatchClause {
                param: param.to_string(),
                body: handler,
                span: Span::default(),
            }),
            finalizer: None,
        })
    }

    pub fn program(&mut self, statements: Vec<Stmt>) -> Program {
        let span = statements
            .iter()
            .map(|s| s.span)
            .reduce(Span::merge)
            .unwrap_or_default();
        Program { statements, span }
    }
}

impl Expr {
    /// Attach a source span, for trees built from real source text.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl Stmt {
    /// Attach a source span, for trees built from real source text.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}
