//! Core inference walk.
//!
//! Interprets statements and expressions abstractly: every expression is
//! evaluated to a [`Type`] and recorded under its node id, bindings and
//! fields are widened as assignments are seen, and calls are resolved by
//! interpreting the callee's body (see `call.rs`). The walk is flow
//! insensitive: both branches of a conditional run and loop bodies run once.

use std::collections::HashSet;

use tracing::{debug, debug_span};

use crate::ast::visit::{hoisted_declarations, walk_expr, walk_function, walk_stmt, Visit};
use crate::ast::{
    AssignOp, BinOp, Expr, ExprKind, ForInLhs, ForInit, Function, Literal, NodeId, Program,
    Property, Span, Stmt, StmtKind, UnaryOp, VarDeclarator,
};
use crate::error::MalformedAst;
use crate::types::{join, widen_in_place, ClosureId, CtorId, Primitive, Type};

use super::cycle::returns_only_itself;
use super::env::ScopeId;
use super::objects::AllocSite;
use super::state::InferState;

/// Result type for inference operations.
pub type InferResult<T> = crate::error::Result<T>;

/// An assignment target with its object part already evaluated.
enum Target<'e> {
    Variable(&'e str),
    Member {
        object: Type,
        property: &'e str,
        through_this: bool,
    },
    Computed,
}

impl<'a> InferState<'a> {
    /// Infer every top-level statement of `program`.
    ///
    /// A malformed statement is skipped and its error recorded; the rest of
    /// the program is still inferred.
    pub fn infer_program(&mut self, program: &'a Program) {
        let _span = debug_span!("infer_program", statements = program.statements.len()).entered();

        let global = self.env.global();
        let mut malformed = duplicate_ids(program);

        for (i, stmt) in program.statements.iter().enumerate() {
            if !malformed.iter().any(|(j, _)| *j == i) {
                self.hoist(global, std::slice::from_ref(stmt));
            }
        }

        for (i, stmt) in program.statements.iter().enumerate() {
            if let Some(pos) = malformed.iter().position(|(j, _)| *j == i) {
                let (_, err) = malformed.swap_remove(pos);
                debug!(statement = %stmt.id, error = %err, "skipping top-level statement");
                self.errors.push(err.into());
                continue;
            }
            if let Err(err) = self.infer_stmt(global, stmt) {
                debug!(statement = %stmt.id, error = %err, "abandoning top-level statement");
                self.errors.push(err);
            }
        }
    }

    /// Bind the `var` names and function declarations of `body` in `scope`.
    pub(crate) fn hoist(&mut self, scope: ScopeId, body: &'a [Stmt]) {
        let hoisted = hoisted_declarations(body);
        for name in hoisted.vars {
            self.env.bind(scope, name, &Type::Bottom);
        }
        for function in hoisted.functions {
            let value = self.capture(scope, function, None);
            if let Some(name) = &function.name {
                self.env.bind(scope, name, &value);
            }
        }
    }

    /// Capture a function literal in `scope`. `binding` is the name the value
    /// is about to be stored under, if any; a function that only returns that
    /// name (or its own name) is flagged as self-referential.
    pub(crate) fn capture(
        &mut self,
        scope: ScopeId,
        function: &'a Function,
        binding: Option<&str>,
    ) -> Type {
        let id = self.closures.capture_id(scope, function);
        let self_referential = function
            .name
            .as_deref()
            .into_iter()
            .chain(binding)
            .any(|name| returns_only_itself(function, name));
        if self_referential {
            self.closures.get_mut(id).self_referential = true;
        }
        Type::closure(id, function.params.len())
    }

    pub(crate) fn infer_block(&mut self, scope: ScopeId, body: &'a [Stmt]) -> InferResult<()> {
        for stmt in body {
            self.infer_stmt(scope, stmt)?;
        }
        Ok(())
    }

    pub(crate) fn infer_stmt(&mut self, scope: ScopeId, stmt: &'a Stmt) -> InferResult<()> {
        match &stmt.kind {
            StmtKind::Block(body) => self.infer_block(scope, body),

            StmtKind::Empty | StmtKind::Break | StmtKind::Continue => Ok(()),

            StmtKind::Expr(e) | StmtKind::Throw(e) => {
                self.infer_expr(scope, e)?;
                Ok(())
            }

            StmtKind::Var(decls) => self.infer_var_decls(scope, decls),

            StmtKind::FunctionDecl(function) => {
                // Bound during hoisting; capture is interned.
                let value = self.capture(scope, function, None);
                self.record(function.id, &value);
                Ok(())
            }

            StmtKind::Return(argument) => {
                let ty = match argument {
                    Some(e) => self.infer_expr(scope, e)?,
                    None => Type::undefined(),
                };
                match self.activations.last_mut() {
                    Some(activation) => {
                        widen_in_place(&mut activation.returns, &ty);
                        Ok(())
                    }
                    None => Err(MalformedAst::ReturnOutsideFunction {
                        node: stmt.id,
                        span: stmt.span,
                    }
                    .into()),
                }
            }

            StmtKind::If {
                test,
                consequent,
                alternate,
            } => {
                self.infer_expr(scope, test)?;
                self.infer_stmt(scope, consequent)?;
                if let Some(alt) = alternate {
                    self.infer_stmt(scope, alt)?;
                }
                Ok(())
            }

            StmtKind::While { test, body } | StmtKind::DoWhile { body, test } => {
                self.infer_expr(scope, test)?;
                self.infer_stmt(scope, body)
            }

            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                match init {
                    Some(ForInit::VarDecl(decls)) => self.infer_var_decls(scope, decls)?,
                    Some(ForInit::Expr(e)) => {
                        self.infer_expr(scope, e)?;
                    }
                    None => {}
                }
                if let Some(test) = test {
                    self.infer_expr(scope, test)?;
                }
                self.infer_stmt(scope, body)?;
                if let Some(update) = update {
                    self.infer_expr(scope, update)?;
                }
                Ok(())
            }

            StmtKind::ForIn { left, right, body } => {
                self.infer_expr(scope, right)?;
                match left {
                    ForInLhs::VarDecl(name) => {
                        self.env.bind(scope, name, &Type::string());
                    }
                    ForInLhs::Expr(target) => {
                        let target_ref = self.eval_target(scope, target)?;
                        self.write_target(scope, &target_ref, &Type::string());
                        self.record(target.id, &Type::string());
                    }
                }
                self.infer_stmt(scope, body)
            }

            StmtKind::Switch {
                discriminant,
                cases,
            } => {
                self.infer_expr(scope, discriminant)?;
                for case in cases {
                    if let Some(test) = &case.test {
                        self.infer_expr(scope, test)?;
                    }
                    self.infer_block(scope, &case.consequent)?;
                }
                Ok(())
            }

            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => {
                self.infer_block(scope, block)?;
                if let Some(handler) = handler {
                    // Anything can be thrown.
                    self.env.bind(scope, &handler.param, &Type::Unknown);
                    self.infer_block(scope, &handler.body)?;
                }
                if let Some(finalizer) = finalizer {
                    self.infer_block(scope, finalizer)?;
                }
                Ok(())
            }
        }
    }

    fn infer_var_decls(&mut self, scope: ScopeId, decls: &'a [VarDeclarator]) -> InferResult<()> {
        for decl in decls {
            if let Some(init) = &decl.init {
                let ty = self.infer_initializer(scope, init, &decl.name)?;
                self.env.bind(scope, &decl.name, &ty);
            }
        }
        Ok(())
    }

    /// Evaluate a value about to be stored under `name`.
    fn infer_initializer(&mut self, scope: ScopeId, init: &'a Expr, name: &str) -> InferResult<Type> {
        match &init.kind {
            ExprKind::Function(function) => {
                let value = self.capture(scope, function, Some(name));
                self.record(init.id, &value);
                Ok(value)
            }
            _ => self.infer_expr(scope, init),
        }
    }

    /// Infer an expression and record its type under its node id.
    pub(crate) fn infer_expr(&mut self, scope: ScopeId, expr: &'a Expr) -> InferResult<Type> {
        let ty = self.infer_expr_kind(scope, expr)?;
        if matches!(
            expr.kind,
            ExprKind::Member { .. } | ExprKind::Call { .. } | ExprKind::New { .. }
        ) {
            self.access_sites.insert(expr.id);
        }
        self.record(expr.id, &ty);
        Ok(ty)
    }

    fn infer_expr_kind(&mut self, scope: ScopeId, expr: &'a Expr) -> InferResult<Type> {
        match &expr.kind {
            ExprKind::Lit(lit) => Ok(literal_type(lit)),

            ExprKind::Ident(name) => Ok(self.read_variable(scope, name)),

            ExprKind::This => Ok(self.this_type()),

            ExprKind::Array(elements) => {
                for element in elements {
                    self.infer_expr(scope, element)?;
                }
                Ok(Type::Unknown)
            }

            ExprKind::Object(properties) => self.infer_object(scope, expr, properties),

            ExprKind::Function(function) => Ok(self.capture(scope, function, None)),

            ExprKind::Member { object, property } => {
                check_property(expr, property)?;
                let obj = self.infer_expr(scope, object)?;
                Ok(self.read_member(&obj, property))
            }

            ExprKind::ComputedMember { object, property } => {
                self.infer_expr(scope, object)?;
                self.infer_expr(scope, property)?;
                Ok(Type::Unknown)
            }

            ExprKind::Call { callee, arguments } => {
                self.infer_call(scope, expr, callee.as_deref(), arguments)
            }

            ExprKind::New { callee, arguments } => self.infer_new(scope, expr, callee, arguments),

            ExprKind::Unary { op, argument } => self.infer_unary(scope, *op, argument),

            ExprKind::Binary { op, left, right } => self.infer_binary(scope, *op, left, right),

            ExprKind::Assign { op, left, right } => self.infer_assign(scope, *op, left, right),

            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.infer_expr(scope, test)?;
                let a = self.infer_expr(scope, consequent)?;
                let b = self.infer_expr(scope, alternate)?;
                Ok(join(&a, &b))
            }

            ExprKind::Sequence(expressions) => {
                let mut last = Type::undefined();
                for e in expressions {
                    last = self.infer_expr(scope, e)?;
                }
                Ok(last)
            }
        }
    }

    fn read_variable(&mut self, scope: ScopeId, name: &str) -> Type {
        match self.env.get(scope, name) {
            Some(ty) => ty.clone(),
            None => {
                if self.options.strict_unbound {
                    self.unbound.insert(name.to_string());
                }
                Type::Unknown
            }
        }
    }

    fn infer_object(
        &mut self,
        scope: ScopeId,
        expr: &'a Expr,
        properties: &'a [Property],
    ) -> InferResult<Type> {
        let mut fields = Vec::with_capacity(properties.len());
        for prop in properties {
            let ty = self.infer_expr(scope, &prop.value)?;
            fields.push((prop.key.clone(), ty));
        }
        let id = self
            .objects
            .create_object(AllocSite::literal(expr.id, scope), fields);
        Ok(Type::object_ref(id))
    }

    fn infer_unary(&mut self, scope: ScopeId, op: UnaryOp, argument: &'a Expr) -> InferResult<Type> {
        match op {
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
                let target = self.eval_target(scope, argument)?;
                let current = self.read_target(scope, &target);
                self.record(argument.id, &current);
                self.write_target(scope, &target, &Type::number());
                Ok(Type::number())
            }
            _ => {
                self.infer_expr(scope, argument)?;
                Ok(match op {
                    UnaryOp::Not | UnaryOp::Delete => Type::boolean(),
                    UnaryOp::Typeof => Type::string(),
                    UnaryOp::Void => Type::undefined(),
                    _ => Type::number(),
                })
            }
        }
    }

    fn infer_binary(
        &mut self,
        scope: ScopeId,
        op: BinOp,
        left: &'a Expr,
        right: &'a Expr,
    ) -> InferResult<Type> {
        let l = self.infer_expr(scope, left)?;
        let r = self.infer_expr(scope, right)?;
        Ok(binary_result(op, &l, &r))
    }

    fn infer_assign(
        &mut self,
        scope: ScopeId,
        op: AssignOp,
        left: &'a Expr,
        right: &'a Expr,
    ) -> InferResult<Type> {
        let target = self.eval_target(scope, left)?;
        let value = match op.binary_op() {
            None => match &target {
                Target::Variable(name) => self.infer_initializer(scope, right, name)?,
                _ => self.infer_expr(scope, right)?,
            },
            Some(bin) => {
                let current = self.read_target(scope, &target);
                let rhs = self.infer_expr(scope, right)?;
                binary_result(bin, &current, &rhs)
            }
        };
        self.write_target(scope, &target, &value);
        self.record(left.id, &value);
        Ok(value)
    }

    /// Evaluate the object part of an assignment target.
    fn eval_target(&mut self, scope: ScopeId, target: &'a Expr) -> InferResult<Target<'a>> {
        match &target.kind {
            ExprKind::Ident(name) => Ok(Target::Variable(name)),
            ExprKind::Member { object, property } => {
                check_property(target, property)?;
                let obj = self.infer_expr(scope, object)?;
                Ok(Target::Member {
                    object: obj,
                    property,
                    through_this: matches!(object.kind, ExprKind::This),
                })
            }
            ExprKind::ComputedMember { object, property } => {
                self.infer_expr(scope, object)?;
                self.infer_expr(scope, property)?;
                Ok(Target::Computed)
            }
            _ => Err(MalformedAst::InvalidAssignmentTarget {
                node: target.id,
                span: target.span,
            }
            .into()),
        }
    }

    fn read_target(&mut self, scope: ScopeId, target: &Target<'_>) -> Type {
        match target {
            Target::Variable(name) => self.read_variable(scope, name),
            Target::Member {
                object, property, ..
            } => self.read_member(object, property),
            Target::Computed => Type::Unknown,
        }
    }

    fn write_target(&mut self, scope: ScopeId, target: &Target<'_>, value: &Type) {
        match target {
            Target::Variable(name) => {
                if self.env.assign(scope, name, value).is_none() {
                    // Assigning an undeclared name creates a global.
                    let global = self.env.global();
                    self.env.bind(global, name, value);
                }
            }
            Target::Member {
                object,
                property,
                through_this,
            } => self.write_member(object, property, value, *through_this),
            Target::Computed => {}
        }
    }

    /// Read `property` from a value of type `obj`.
    ///
    /// Own fields win over the prototype chain. Members of a union that
    /// cannot carry the property are skipped; if none can, the result is
    /// `Unknown`.
    pub(crate) fn read_member(&mut self, obj: &Type, property: &str) -> Type {
        match obj {
            Type::Bottom => Type::Bottom,
            Type::Union(union) => {
                let mut found: Option<Type> = None;
                for member in union.members() {
                    if let Some(ty) = self.member_of(member, property) {
                        found = Some(match found {
                            Some(prev) => join(&prev, &ty),
                            None => ty,
                        });
                    }
                }
                found.unwrap_or(Type::Unknown)
            }
            _ => self.member_of(obj, property).unwrap_or(Type::Unknown),
        }
    }

    fn member_of(&mut self, obj: &Type, property: &str) -> Option<Type> {
        match obj {
            Type::Object(o) => self
                .objects
                .lookup_field(o, property)
                .or_else(|| self.protos.find_method(obj, property)),
            Type::Function(f) => match property {
                "prototype" if !f.closures.is_empty() => {
                    let mut protos = Type::Bottom;
                    for closure in &f.closures {
                        let ctor = self.constructor_of(*closure);
                        protos = join(&protos, &Type::prototype_of(ctor));
                    }
                    Some(protos)
                }
                "call" | "apply" => Some(obj.clone()),
                "length" => Some(Type::number()),
                "name" => Some(Type::string()),
                _ => None,
            },
            Type::Primitive(Primitive::String) if property == "length" => Some(Type::number()),
            _ => None,
        }
    }

    /// Write `property` on every value `obj` may be.
    ///
    /// Writes to a prototype object land in its constructor's method table;
    /// assigning a function's `prototype` links constructors; writes through
    /// `this` inside a constructor also become the constructor's own fields.
    pub(crate) fn write_member(
        &mut self,
        obj: &Type,
        property: &str,
        value: &Type,
        through_this: bool,
    ) {
        if let Some(o) = obj.object_part() {
            self.objects.write_field(o, property, value);
            for ctor in &o.proto_of {
                self.protos.define_method(*ctor, property, value);
            }
        }

        if property == "prototype" {
            if let Some(f) = obj.function_part() {
                for closure in &f.closures {
                    let ctor = self.constructor_of(*closure);
                    self.link_prototype(ctor, value);
                }
            }
        }

        if through_this {
            if let Some(ctor) = self.current().and_then(|a| a.constructing) {
                self.protos.record_own_field(ctor, property, value);
            }
        }
    }

    fn link_prototype(&mut self, ctor: CtorId, value: &Type) {
        let Some(o) = value.object_part() else {
            return;
        };
        for parent in &o.ctors {
            self.protos.set_parent(ctor, *parent);
        }
        for shared in &o.proto_of {
            self.protos.share_prototype(ctor, *shared);
        }
        // A plain object literal as prototype: its fields are the methods.
        if o.ctors.is_empty() {
            let mut methods: Vec<(String, Type)> =
                o.fields.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            for id in &o.cells {
                methods.extend(
                    self.objects
                        .cell(*id)
                        .fields()
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone())),
                );
            }
            for (name, ty) in methods {
                self.protos.define_method(ctor, &name, &ty);
            }
        }
    }

    /// The constructor entry of a closure, created on first use.
    pub(crate) fn constructor_of(&mut self, closure: ClosureId) -> CtorId {
        let name = self.closures.get(closure).function.name.as_deref();
        self.protos.constructor_for(closure, name)
    }
}

pub(super) fn check_property(expr: &Expr, property: &str) -> InferResult<()> {
    if property.is_empty() {
        return Err(MalformedAst::EmptyPropertyName {
            node: expr.id,
            span: expr.span,
        }
        .into());
    }
    Ok(())
}

fn literal_type(lit: &Literal) -> Type {
    match lit {
        Literal::Null => Type::null(),
        Literal::Undefined => Type::undefined(),
        Literal::Boolean(_) => Type::boolean(),
        Literal::Number(_) => Type::number(),
        Literal::String(_) => Type::string(),
    }
}

/// Result type of a binary operator applied to operands of the given types.
pub(crate) fn binary_result(op: BinOp, left: &Type, right: &Type) -> Type {
    match op {
        BinOp::Add => add_result(left, right),
        BinOp::And => {
            if left.definitely_falsy() {
                left.clone()
            } else if left.definitely_truthy() {
                right.clone()
            } else {
                join(left, right)
            }
        }
        BinOp::Or => {
            if left.definitely_truthy() {
                left.clone()
            } else if left.definitely_falsy() {
                right.clone()
            } else {
                join(left, right)
            }
        }
        op if op.is_numeric() => Type::number(),
        _ => Type::boolean(),
    }
}

fn add_result(left: &Type, right: &Type) -> Type {
    if left.definitely_string() || right.definitely_string() {
        return Type::string();
    }
    if left.is_unknown() || right.is_unknown() {
        return Type::Unknown;
    }
    if left.is_bottom() || right.is_bottom() {
        return Type::Bottom;
    }
    if numeric_like(left) && numeric_like(right) {
        Type::number()
    } else {
        Type::union_of([Type::number(), Type::string()])
    }
}

/// Values that `+` converts to a number.
fn numeric_like(ty: &Type) -> bool {
    match ty {
        Type::Primitive(p) => !matches!(p, Primitive::String),
        Type::Union(u) => u.members().all(numeric_like),
        _ => false,
    }
}

/// Collects node ids and remembers the first one seen twice.
struct IdCollector<'s> {
    seen: &'s mut HashSet<NodeId>,
    duplicate: Option<(NodeId, Span)>,
}

impl IdCollector<'_> {
    fn note(&mut self, id: NodeId, span: Span) {
        if !self.seen.insert(id) && self.duplicate.is_none() {
            self.duplicate = Some((id, span));
        }
    }
}

impl<'a> Visit<'a> for IdCollector<'_> {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        self.note(stmt.id, stmt.span);
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &'a Expr) {
        self.note(expr.id, expr.span);
        walk_expr(self, expr);
    }

    fn visit_function(&mut self, function: &'a Function) {
        self.note(function.id, function.span);
        walk_function(self, function);
    }
}

/// Top-level statements containing a node id already used earlier in the
/// program, by statement index.
fn duplicate_ids(program: &Program) -> Vec<(usize, MalformedAst)> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for (i, stmt) in program.statements.iter().enumerate() {
        let mut collector = IdCollector {
            seen: &mut seen,
            duplicate: None,
        };
        collector.visit_stmt(stmt);
        if let Some((node, span)) = collector.duplicate {
            found.push((i, MalformedAst::DuplicateNodeId { node, span }));
        }
    }
    found
}
