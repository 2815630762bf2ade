//! Calls, construction, and the fixed-point solver for recursion.
//!
//! A call is resolved by interpreting the callee's body in an activation
//! scope whose parameters are bound to the argument types. Each call site
//! (within a given caller scope) gets its own activation scope, so a
//! function called from two sites is typed independently at each.
//!
//! When a closure is re-entered while its outermost activation is still
//! running, the inner call answers with the current seed instead of
//! descending again. The outermost activation then re-runs the body with the
//! joined result as the new seed until nothing changes.

use tracing::{debug, debug_span, trace};

use crate::ast::{Expr, ExprKind, Function, NodeId, Stmt};
use crate::error::MalformedAst;
use crate::types::{join, ClosureId, CtorId, Type};

use super::env::{ActivationKey, ScopeId, ScopeOwner};
use super::infer::{check_property, InferResult};
use super::objects::AllocSite;
use super::state::{Activation, InferState, Solve};

impl<'a> InferState<'a> {
    pub(crate) fn infer_call(
        &mut self,
        scope: ScopeId,
        expr: &'a Expr,
        callee: Option<&'a Expr>,
        arguments: &'a [Expr],
    ) -> InferResult<Type> {
        let callee = callee.ok_or(MalformedAst::MissingCallee {
            node: expr.id,
            span: expr.span,
        })?;

        // Method calls bind `this` to the receiver.
        let (function, this, method) = match &callee.kind {
            ExprKind::Member { object, property } => {
                check_property(callee, property)?;
                let receiver = self.infer_expr(scope, object)?;
                let function = self.read_member(&receiver, property);
                self.access_sites.insert(callee.id);
                self.record(callee.id, &function);
                (function, receiver, Some(property.as_str()))
            }
            _ => (self.infer_expr(scope, callee)?, Type::undefined(), None),
        };
        let args = self.infer_args(scope, arguments)?;

        match method {
            // f.call(thisArg, a, b)
            Some("call") if this.is_func() => {
                let bound_this = args.first().cloned().unwrap_or_else(Type::undefined);
                let rest = args.get(1..).unwrap_or(&[]);
                self.call_value(&this, bound_this, rest, expr.id, scope)
            }
            // f.apply(thisArg, args): the argument array is not tracked.
            Some("apply") if this.is_func() => {
                let bound_this = args.first().cloned().unwrap_or_else(Type::undefined);
                let arity = this.as_func().map_or(0, |f| f.arity());
                let rest = vec![Type::Unknown; arity];
                self.call_value(&this, bound_this, &rest, expr.id, scope)
            }
            _ => self.call_value(&function, this, &args, expr.id, scope),
        }
    }

    pub(crate) fn infer_new(
        &mut self,
        scope: ScopeId,
        expr: &'a Expr,
        callee: &'a Expr,
        arguments: &'a [Expr],
    ) -> InferResult<Type> {
        let constructor = self.infer_expr(scope, callee)?;
        let args = self.infer_args(scope, arguments)?;

        let Some(function) = constructor.function_part() else {
            return Ok(if constructor.is_bottom() {
                Type::Bottom
            } else {
                Type::Unknown
            });
        };
        if function.closures.is_empty() {
            // Built-in constructors such as `new String(x)`.
            return Ok((*function.ret).clone());
        }

        let mut result = Type::Bottom;
        for closure in &function.closures {
            let instance = self.instantiate(*closure, &args, expr.id, scope)?;
            result = join(&result, &instance);
        }
        Ok(result)
    }

    fn infer_args(&mut self, scope: ScopeId, arguments: &'a [Expr]) -> InferResult<Vec<Type>> {
        arguments
            .iter()
            .map(|arg| self.infer_expr(scope, arg))
            .collect()
    }

    /// Call a value of type `callee`.
    ///
    /// Every closure the value may be is interpreted and the results joined,
    /// together with the declared return type of built-in signatures.
    /// Calling something that is not a function yields `Unknown`.
    pub(crate) fn call_value(
        &mut self,
        callee: &Type,
        this: Type,
        args: &[Type],
        site: NodeId,
        caller: ScopeId,
    ) -> InferResult<Type> {
        let Some(function) = callee.function_part() else {
            return Ok(if callee.is_bottom() {
                Type::Bottom
            } else {
                Type::Unknown
            });
        };

        let mut result = (*function.ret).clone();
        for closure in &function.closures {
            let ret = self.invoke(*closure, this.clone(), args, site, caller, None)?;
            result = join(&result, &ret);
        }
        Ok(result)
    }

    /// Run `new` on one closure: allocate the instance, run the constructor
    /// with `this` bound to it, then add the own fields of ancestors it does
    /// not define itself, nearest ancestor first.
    pub(crate) fn instantiate(
        &mut self,
        closure: ClosureId,
        args: &[Type],
        site: NodeId,
        caller: ScopeId,
    ) -> InferResult<Type> {
        let ctor = self.constructor_of(closure);
        let cell = self
            .objects
            .create_object(AllocSite::instance(site, caller, ctor), []);
        let instance = Type::instance(cell, ctor);
        self.invoke(closure, instance.clone(), args, site, caller, Some(ctor))?;

        // Ancestors never constructed directly still contribute own fields.
        for ancestor in self.protos.ancestors(ctor) {
            let entry = self.protos.get(ancestor);
            if entry.analysed {
                continue;
            }
            let Some(ancestor_closure) = entry.closure else {
                continue;
            };
            let scratch = self
                .objects
                .create_object(AllocSite::instance(site, caller, ancestor), []);
            self.invoke(
                ancestor_closure,
                Type::instance(scratch, ancestor),
                args,
                site,
                caller,
                Some(ancestor),
            )?;
        }

        for (name, ty) in self.protos.instance_fields(ctor) {
            if !self.objects.cell(cell).fields().contains_key(&name) {
                self.objects.write_cell(cell, &name, &ty);
            }
        }
        Ok(instance)
    }

    /// Interpret one call of a closure and return its result type.
    pub(crate) fn invoke(
        &mut self,
        id: ClosureId,
        this: Type,
        args: &[Type],
        site: NodeId,
        caller: ScopeId,
        constructing: Option<CtorId>,
    ) -> InferResult<Type> {
        let closure = self.closures.get(id);
        let function = closure.function;
        let defining = closure.scope;

        if closure.self_referential {
            debug!(function = %function.id, "self-referential function answered with Unknown");
            self.closures.record_call(id, args, &Type::Unknown);
            return Ok(Type::Unknown);
        }
        if let Some(solve) = self.solving.get_mut(&id) {
            solve.recursed = true;
            return Ok(solve.seed.clone());
        }
        if self.activations.len() >= self.options.max_call_depth {
            debug!(
                function = %function.id,
                depth = self.activations.len(),
                "call depth bound reached"
            );
            return Ok(Type::Unknown);
        }

        let key = ActivationKey {
            closure: id,
            site,
            caller,
        };
        let (scope, fresh) = self
            .env
            .enter(key, defining, ScopeOwner::Function(function.id));
        if fresh {
            self.function_scopes
                .entry(function.id)
                .or_default()
                .push(scope);
        }
        self.bind_parameters(scope, id, function, args);
        self.hoist(scope, &function.body);
        if let Some(ctor) = constructing {
            self.protos.mark_analysed(ctor);
        }

        self.solving.insert(
            id,
            Solve {
                seed: Type::Bottom,
                recursed: false,
            },
        );
        let result = self.solve(id, function, scope, this, constructing);
        self.solving.remove(&id);

        let ret = result?;
        self.closures.record_call(id, args, &ret);
        Ok(ret)
    }

    fn bind_parameters(&mut self, scope: ScopeId, id: ClosureId, function: &'a Function, args: &[Type]) {
        for (i, param) in function.params.iter().enumerate() {
            let arg = args.get(i).cloned().unwrap_or_else(Type::undefined);
            self.env.bind(scope, param, &arg);
        }
        // A named function sees itself under its own name.
        if let Some(name) = &function.name {
            if !function.params.contains(name) {
                self.env
                    .bind(scope, name, &Type::closure(id, function.params.len()));
            }
        }
    }

    /// Run the body until the return type and the store are stable.
    fn solve(
        &mut self,
        id: ClosureId,
        function: &'a Function,
        scope: ScopeId,
        this: Type,
        constructing: Option<CtorId>,
    ) -> InferResult<Type> {
        let _span = debug_span!("solve", function = %function.id).entered();

        let mut iteration = 0;
        loop {
            let version = self.version();
            let ret = self.run_body(id, function, scope, this.clone(), constructing)?;
            let unchanged = self.version() == version;

            let Some(solve) = self.solving.get_mut(&id) else {
                return Ok(ret);
            };
            if !solve.recursed {
                return Ok(ret);
            }

            iteration += 1;
            let next = join(&solve.seed, &ret);
            trace!(iteration, seed = %solve.seed, ret = %ret, unchanged, "fixed-point round");
            if next == solve.seed && unchanged {
                return Ok(next);
            }
            if iteration >= self.options.max_fixpoint_iterations {
                debug!(
                    function = %function.id,
                    iterations = iteration,
                    "no fixed point within bound; return type frozen at Unknown"
                );
                return Ok(Type::Unknown);
            }
            solve.seed = next;
            solve.recursed = false;
        }
    }

    /// One pass over a function body. Returns the join of the `return`s
    /// reached, plus `undefined` if the body can complete normally.
    fn run_body(
        &mut self,
        id: ClosureId,
        function: &'a Function,
        scope: ScopeId,
        this: Type,
        constructing: Option<CtorId>,
    ) -> InferResult<Type> {
        self.activations.push(Activation {
            closure: id,
            scope,
            this,
            returns: Type::Bottom,
            constructing,
        });
        let result = self.infer_block(scope, &function.body);
        let activation = self.activations.pop();
        result?;

        let mut returns = activation.map_or(Type::Bottom, |a| a.returns);
        if !function.body.iter().any(Stmt::always_exits) {
            returns = join(&returns, &Type::undefined());
        }
        Ok(returns)
    }
}
