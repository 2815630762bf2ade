//! Type inference module for jsinfer.
//!
//! This module provides the inference engine:
//! - `env`: Scope arena and closure table
//! - `objects`: Object cells keyed by allocation site
//! - `protos`: Constructors, prototype links and method lookup
//! - `state`: Inference state shared by the walk
//! - `infer`: Abstract interpretation of statements and expressions
//! - `call`: Calls, `new`, and the fixed-point solver for recursion
//! - `cycle`: Static detection of self-returning functions
//! - `finalize`: Resolution of in-flight handles into a `TypeMap`
//! - `type_map`: The query API over a finished run
//! - `options`: Tunables

mod call;
mod cycle;
mod env;
mod finalize;
mod infer;
mod objects;
mod options;
mod protos;
mod state;
mod type_map;

#[cfg(test)]
mod scenarios;

pub use cycle::returns_only_itself;
pub use env::{ActivationKey, Closure, Closures, Environment, Scope, ScopeId, ScopeOwner};
pub use infer::InferResult;
pub use objects::{AllocSite, ObjectCell, ObjectStore};
pub use options::InferOptions;
pub use protos::{Constructor, Prototypes};
pub use state::{Activation, InferState, Solve};
pub use type_map::{ConstructorInfo, FunctionInfo, GlobalBinding, ScopeInfo, TypeMap};

use crate::ast::Program;
use crate::builtins::Globals;

/// Infer types for a whole program with default options.
pub fn infer_program(program: &Program) -> TypeMap {
    infer_program_with(program, &InferOptions::default(), None)
}

/// Infer types for a whole program, seeding the global scope with `globals`.
pub fn infer_program_with(
    program: &Program,
    options: &InferOptions,
    globals: Option<&Globals>,
) -> TypeMap {
    let mut state = InferState::new(options.clone(), globals);
    state.infer_program(program);
    state.finish()
}
