//! Type system module.
//!
//! This module provides the type lattice: the type representation, the join
//! operation and subtype check over it, and pretty-printing.

mod lattice;
mod pretty;
mod ty;

#[cfg(test)]
mod proptests;

pub use lattice::{is_subtype, join, join_functions, join_objects, widen_in_place};
pub use pretty::{is_plain_identifier, property_name, PrettyContext};
pub use ty::{
    ClosureId, CtorId, FunctionType, ObjectId, ObjectType, Primitive, Type, UnionType,
};
