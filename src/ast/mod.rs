//! AST consumed by the inference engine.
//!
//! Parsing is left to an external front end; this module only fixes the
//! shape of the tree it must hand over.

mod build;
mod node;
pub mod visit;

pub use build::AstBuilder;
pub use node::*;
