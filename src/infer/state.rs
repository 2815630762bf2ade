//! Inference state management.
//!
//! This module provides the `InferState` struct which tracks:
//! - The scope arena and closure table
//! - The object store and the constructor graph
//! - The stack of running activations and in-progress fixed-point solves
//! - Per-node types and the failures collected so far

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::ast::NodeId;
use crate::builtins::Globals;
use crate::error::InferError;
use crate::types::{widen_in_place, ClosureId, CtorId, Type};

use super::env::{Closures, Environment, ScopeId};
use super::objects::ObjectStore;
use super::options::InferOptions;
use super::protos::Prototypes;

/// One running invocation of a closure.
#[derive(Debug, Clone)]
pub struct Activation {
    pub closure: ClosureId,
    pub scope: ScopeId,
    pub this: Type,
    /// Join of the `return` statements reached so far.
    pub returns: Type,
    /// Set while running a constructor under `new`.
    pub constructing: Option<CtorId>,
}

/// Fixed-point bookkeeping for a closure whose outermost activation is
/// running.
#[derive(Debug, Clone)]
pub struct Solve {
    /// Return type handed to recursive calls.
    pub seed: Type,
    /// Whether the current round re-entered the closure.
    pub recursed: bool,
}

/// Inference state for one run.
pub struct InferState<'a> {
    pub options: InferOptions,
    pub env: Environment,
    pub closures: Closures<'a>,
    pub objects: ObjectStore,
    pub protos: Prototypes,

    /// Activation stack, innermost last.
    pub activations: Vec<Activation>,

    /// Closures whose outermost activation is on the stack.
    pub solving: HashMap<ClosureId, Solve>,

    /// Join of every evaluation of each node.
    pub node_types: HashMap<NodeId, Type>,

    /// Activation scopes created for each function node.
    pub function_scopes: BTreeMap<NodeId, Vec<ScopeId>>,

    /// Member reads, calls and `new` expressions. Their results pass
    /// `Bottom` through while a solve is in flight; one still `Bottom` at
    /// the end never saw a value and is reported as `Unknown`.
    pub access_sites: HashSet<NodeId>,

    /// Global names seeded before the walk.
    pub seeded: BTreeSet<String>,

    pub unbound: BTreeSet<String>,
    pub errors: Vec<InferError>,
}

impl<'a> InferState<'a> {
    /// Create a state with the global scope seeded from `globals`, and from
    /// the built-ins when the options ask for them.
    pub fn new(options: InferOptions, globals: Option<&Globals>) -> Self {
        let mut state = InferState {
            options,
            env: Environment::new(),
            closures: Closures::new(),
            objects: ObjectStore::new(),
            protos: Prototypes::new(),
            activations: Vec::new(),
            solving: HashMap::new(),
            node_types: HashMap::new(),
            function_scopes: BTreeMap::new(),
            access_sites: HashSet::new(),
            seeded: BTreeSet::new(),
            unbound: BTreeSet::new(),
            errors: Vec::new(),
        };

        let global = state.env.global();
        let builtins = state.options.seed_builtins.then(Globals::builtins);
        for seed in builtins.iter().chain(globals) {
            for (name, ty) in seed.iter() {
                state.env.declare(global, name, ty.clone());
                state.seeded.insert(name.to_string());
            }
        }
        state
    }

    /// A counter that moves whenever a binding, field, method or prototype
    /// link changes. Equal versions mean nothing observable was widened.
    pub fn version(&self) -> u64 {
        self.env.changes() + self.objects.changes() + self.protos.changes()
    }

    /// Join `ty` into the recorded type of `node`.
    pub fn record(&mut self, node: NodeId, ty: &Type) {
        match self.node_types.get_mut(&node) {
            Some(slot) => {
                widen_in_place(slot, ty);
            }
            None => {
                self.node_types.insert(node, ty.clone());
            }
        }
    }

    pub fn current(&self) -> Option<&Activation> {
        self.activations.last()
    }

    /// `this` in the running activation; `undefined` at the top level.
    pub fn this_type(&self) -> Type {
        self.current()
            .map(|a| a.this.clone())
            .unwrap_or_else(Type::undefined)
    }
}
