//! jsinfer: static type inference for unannotated JavaScript.
//!
//! Given the AST of a whole program, the engine computes a type for every
//! expression and binding by abstract interpretation over a small lattice:
//!
//! - **Call-site specific** function types: a body is interpreted per call
//!   with the argument types of that call
//! - **Shared scopes and object cells**, so closures and aliases observe
//!   each other's writes
//! - **Static prototype dispatch** for constructor functions, including the
//!   `__extends` pattern emitted by TypeScript
//! - **Fixed-point iteration** for recursive functions, bounded so a run
//!   always terminates
//!
//! Results come back as a [`TypeMap`], which [`declarations`] can render as
//! a TypeScript declaration file.

pub mod ast;
pub mod builtins;
pub mod declarations;
pub mod diagnostics;
pub mod error;
pub mod infer;
pub mod types;

pub use builtins::Globals;
pub use declarations::{print_declarations, Declarations};
pub use error::{InferError, MalformedAst};
pub use infer::{infer_program, infer_program_with, InferOptions, TypeMap};
