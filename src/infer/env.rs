//! Lexical environments and closure capture.
//!
//! Scopes live in an arena and refer to their parent by [`ScopeId`]. A
//! closure holds the id of its defining scope, so every closure created in
//! the same scope instance reads and widens the same cells. Each invocation
//! gets its own parameter scope. Activation scopes are keyed by
//! (closure, call site, caller scope), so re-running an activation during a
//! fixed-point solve reuses its frame instead of piling up fresh ones.

use std::collections::{BTreeMap, HashMap};

use crate::ast::{Function, NodeId};
use crate::types::{widen_in_place, ClosureId, Type};

/// Index of a scope in the [`Environment`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(pub u32);

/// What created a scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeOwner {
    /// The program's outermost scope.
    Global,
    /// An activation of the function literal with this node id.
    Function(NodeId),
}

/// One frame of bindings.
#[derive(Clone, Debug)]
pub struct Scope {
    parent: Option<ScopeId>,
    owner: ScopeOwner,
    bindings: BTreeMap<String, Type>,
}

impl Scope {
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn owner(&self) -> ScopeOwner {
        self.owner
    }

    pub fn bindings(&self) -> &BTreeMap<String, Type> {
        &self.bindings
    }
}

/// Identifies one activation of a closure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActivationKey {
    pub closure: ClosureId,
    pub site: NodeId,
    pub caller: ScopeId,
}

/// Arena of scopes with a change counter.
#[derive(Debug)]
pub struct Environment {
    scopes: Vec<Scope>,
    activations: HashMap<ActivationKey, ScopeId>,
    changes: u64,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// Create an environment holding only the global scope.
    pub fn new() -> Self {
        Environment {
            scopes: vec![Scope {
                parent: None,
                owner: ScopeOwner::Global,
                bindings: BTreeMap::new(),
            }],
            activations: HashMap::new(),
            changes: 0,
        }
    }

    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Push a fresh, empty scope under `parent`.
    pub fn new_scope(&mut self, parent: ScopeId, owner: ScopeOwner) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent: Some(parent),
            owner,
            bindings: BTreeMap::new(),
        });
        id
    }

    /// The scope for an activation, creating it on first use.
    ///
    /// Returns the scope and whether it was freshly created.
    pub fn enter(
        &mut self,
        key: ActivationKey,
        parent: ScopeId,
        owner: ScopeOwner,
    ) -> (ScopeId, bool) {
        if let Some(&scope) = self.activations.get(&key) {
            return (scope, false);
        }
        let scope = self.new_scope(parent, owner);
        self.activations.insert(key, scope);
        (scope, true)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn scopes(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes
            .iter()
            .enumerate()
            .map(|(i, s)| (ScopeId(i as u32), s))
    }

    /// Number of effective binding changes so far.
    pub fn changes(&self) -> u64 {
        self.changes
    }

    /// Bind `name` in `scope`'s own frame, replacing any previous type.
    pub fn declare(&mut self, scope: ScopeId, name: &str, ty: Type) {
        let frame = &mut self.scopes[scope.0 as usize].bindings;
        if frame.get(name) != Some(&ty) {
            frame.insert(name.to_string(), ty);
            self.changes += 1;
        }
    }

    /// Widen `name` in `scope`'s own frame, inserting it if absent.
    pub fn bind(&mut self, scope: ScopeId, name: &str, ty: &Type) -> bool {
        let frame = &mut self.scopes[scope.0 as usize].bindings;
        let changed = match frame.get_mut(name) {
            Some(slot) => widen_in_place(slot, ty),
            None => {
                frame.insert(name.to_string(), ty.clone());
                true
            }
        };
        if changed {
            self.changes += 1;
        }
        changed
    }

    /// Find the frame that owns `name`, walking outward from `scope`.
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let frame = self.scope(id);
            if frame.bindings.contains_key(name) {
                return Some(id);
            }
            current = frame.parent;
        }
        None
    }

    /// Widen the binding of `name` in its owning frame.
    ///
    /// Assignment never narrows. Returns the owning scope, or `None` if the
    /// name is unbound anywhere on the chain.
    pub fn assign(&mut self, scope: ScopeId, name: &str, ty: &Type) -> Option<ScopeId> {
        let owner = self.resolve(scope, name)?;
        self.bind(owner, name, ty);
        Some(owner)
    }

    /// The type of `name` as seen from `scope`, `None` if unbound.
    pub fn get(&self, scope: ScopeId, name: &str) -> Option<&Type> {
        self.resolve(scope, name)
            .and_then(|owner| self.scope(owner).bindings.get(name))
    }

    /// The type of `name` as seen from `scope`; `Unknown` if unbound.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Type {
        self.get(scope, name).cloned().unwrap_or(Type::Unknown)
    }
}

/// A function literal captured in a particular scope instance.
#[derive(Clone, Debug)]
pub struct Closure<'a> {
    pub function: &'a Function,
    /// Defining scope, shared with every other holder.
    pub scope: ScopeId,
    /// Join of the argument types observed at every call.
    pub params: Vec<Type>,
    /// Join of the return types observed at every call.
    pub ret: Type,
    pub calls: usize,
    /// The body only ever returns the closure itself.
    pub self_referential: bool,
}

/// Table of closures, interned by (function node, defining scope).
#[derive(Debug, Default)]
pub struct Closures<'a> {
    list: Vec<Closure<'a>>,
    by_site: HashMap<(NodeId, ScopeId), ClosureId>,
}

impl<'a> Closures<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture `function` in `defining` and return the function value.
    pub fn capture(&mut self, defining: ScopeId, function: &'a Function) -> Type {
        let id = self.capture_id(defining, function);
        Type::closure(id, function.params.len())
    }

    pub fn capture_id(&mut self, defining: ScopeId, function: &'a Function) -> ClosureId {
        if let Some(&id) = self.by_site.get(&(function.id, defining)) {
            return id;
        }
        let id = ClosureId(self.list.len() as u32);
        self.list.push(Closure {
            function,
            scope: defining,
            params: vec![Type::Bottom; function.params.len()],
            ret: Type::Bottom,
            calls: 0,
            self_referential: false,
        });
        self.by_site.insert((function.id, defining), id);
        id
    }

    pub fn get(&self, id: ClosureId) -> &Closure<'a> {
        &self.list[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: ClosureId) -> &mut Closure<'a> {
        &mut self.list[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClosureId, &Closure<'a>)> {
        self.list
            .iter()
            .enumerate()
            .map(|(i, c)| (ClosureId(i as u32), c))
    }

    /// Fold one call's argument and return types into the declared signature.
    pub fn record_call(&mut self, id: ClosureId, args: &[Type], ret: &Type) {
        let closure = self.get_mut(id);
        for (i, slot) in closure.params.iter_mut().enumerate() {
            let arg = args.get(i).cloned().unwrap_or_else(Type::undefined);
            widen_in_place(slot, &arg);
        }
        widen_in_place(&mut closure.ret, ret);
        closure.calls += 1;
    }
}
