//! Results of an inference run.
//!
//! A [`TypeMap`] holds only structural types: every closure, object cell and
//! prototype handle has been resolved away, so it outlives the program it
//! was computed from and can be compared between runs.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::ast::NodeId;
use crate::error::InferError;
use crate::types::{join, CtorId, Type};

use super::env::{ScopeId, ScopeOwner};

/// One scope instance and its final bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeInfo {
    pub parent: Option<ScopeId>,
    pub owner: ScopeOwner,
    pub bindings: BTreeMap<String, Type>,
}

/// The declared signature of a function literal: the join over every
/// closure of it and every call seen.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInfo {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub signature: Type,
}

/// A recovered constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorInfo {
    pub name: Option<String>,
    /// The function literal the constructor runs.
    pub function: Option<NodeId>,
    pub parent: Option<CtorId>,
    /// Methods defined on this constructor's own prototype.
    pub methods: BTreeMap<String, Type>,
    /// Fields every instance carries, own first then inherited.
    pub fields: BTreeMap<String, Type>,
}

/// A program-defined global.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalBinding {
    pub name: String,
    pub ty: Type,
    /// The function literal bound here, when the value is exactly one.
    pub function: Option<NodeId>,
    /// Set when the bound function is used as a constructor.
    pub class: Option<CtorId>,
}

/// Per-node and per-binding types computed by one run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeMap {
    pub(crate) node_types: HashMap<NodeId, Type>,
    pub(crate) scopes: Vec<ScopeInfo>,
    pub(crate) function_scopes: BTreeMap<NodeId, Vec<ScopeId>>,
    pub(crate) functions: BTreeMap<NodeId, FunctionInfo>,
    pub(crate) constructors: Vec<ConstructorInfo>,
    pub(crate) globals: Vec<GlobalBinding>,
    pub(crate) errors: Vec<InferError>,
    pub(crate) unbound: BTreeSet<String>,
}

impl TypeMap {
    /// Type of an expression: the join over every evaluation of the node.
    /// `Unknown` for nodes never evaluated.
    pub fn type_of(&self, node: NodeId) -> Type {
        self.node_types.get(&node).cloned().unwrap_or(Type::Unknown)
    }

    /// Final type of `name` as seen from `scope`.
    pub fn type_of_binding(&self, scope: ScopeId, name: &str) -> Type {
        let mut current = Some(scope);
        while let Some(id) = current {
            let Some(info) = self.scopes.get(id.0 as usize) else {
                break;
            };
            if let Some(ty) = info.bindings.get(name) {
                return ty.clone();
            }
            current = info.parent;
        }
        Type::Unknown
    }

    pub fn global_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn scope(&self, id: ScopeId) -> Option<&ScopeInfo> {
        self.scopes.get(id.0 as usize)
    }

    /// Activation scopes created for a function literal, in creation order.
    pub fn scopes_of(&self, function: NodeId) -> &[ScopeId] {
        self.function_scopes
            .get(&function)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Join of `name` across every activation of `function`.
    pub fn binding_in(&self, function: NodeId, name: &str) -> Type {
        let scopes = self.scopes_of(function);
        if scopes.is_empty() {
            return Type::Unknown;
        }
        scopes
            .iter()
            .map(|scope| self.type_of_binding(*scope, name))
            .fold(Type::Bottom, |acc, ty| join(&acc, &ty))
    }

    /// Program-defined globals in name order.
    pub fn globals(&self) -> impl Iterator<Item = &GlobalBinding> {
        self.globals.iter()
    }

    pub fn function(&self, node: NodeId) -> Option<&FunctionInfo> {
        self.functions.get(&node)
    }

    /// Declared signature of a function literal.
    pub fn signature_of(&self, node: NodeId) -> Type {
        self.functions
            .get(&node)
            .map(|f| f.signature.clone())
            .unwrap_or(Type::Unknown)
    }

    /// Failures that made whole top-level statements be skipped.
    pub fn errors(&self) -> &[InferError] {
        &self.errors
    }

    pub fn constructor(&self, id: CtorId) -> Option<&ConstructorInfo> {
        self.constructors.get(id.0 as usize)
    }

    pub fn constructor_name(&self, id: CtorId) -> Option<&str> {
        self.constructor(id).and_then(|c| c.name.as_deref())
    }

    pub fn constructors(&self) -> impl Iterator<Item = (CtorId, &ConstructorInfo)> {
        self.constructors
            .iter()
            .enumerate()
            .map(|(i, c)| (CtorId(i as u32), c))
    }

    /// Unbound names that were read, when `strict_unbound` is set.
    pub fn unbound_names(&self) -> impl Iterator<Item = &str> {
        self.unbound.iter().map(String::as_str)
    }
}
