//! Core type definitions for the inference lattice.
//!
//! Types are plain values compared structurally. While a run is in progress,
//! function and object types may also carry handles into the engine's
//! closure table, object store and constructor graph. These are the shared
//! references through which aliases observe each other's writes. The
//! finalizer strips them before results are handed out.

use std::collections::{BTreeMap, BTreeSet};

/// Handle of a closure: one function literal captured in one scope instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClosureId(pub u32);

/// Handle of a mutable object cell in the object store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub u32);

/// Handle of a constructor in the prototype graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CtorId(pub u32);

/// Primitive JavaScript types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Primitive {
    Boolean,
    String,
    Number,
    Null,
    Undefined,
}

/// Function type: parameter types and return type.
///
/// `closures` names the function literals this value may evaluate to. It is
/// empty for built-in signatures and for resolved results.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionType {
    pub params: Vec<Type>,
    pub ret: Box<Type>,
    pub closures: BTreeSet<ClosureId>,
}

impl FunctionType {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Structural object type: a field map plus optional nominal links.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectType {
    /// Fields known by value (literal snapshots and resolved results).
    pub fields: BTreeMap<String, Type>,
    /// Live cells in the object store this value may alias.
    pub cells: BTreeSet<ObjectId>,
    /// Constructors this value is an instance of.
    pub ctors: BTreeSet<CtorId>,
    /// Constructors whose `prototype` object this value is.
    pub proto_of: BTreeSet<CtorId>,
}

impl ObjectType {
    pub fn from_fields(fields: BTreeMap<String, Type>) -> Self {
        ObjectType {
            fields,
            ..ObjectType::default()
        }
    }

    pub fn field(&self, name: &str) -> Option<&Type> {
        self.fields.get(name)
    }

    /// True if the value carries no shared handles.
    pub fn is_detached(&self) -> bool {
        self.cells.is_empty() && self.proto_of.is_empty()
    }
}

/// Union of at least two types, kept flat and deduplicated.
///
/// Built only through [`Type::union_of`] and the lattice join, which also
/// guarantee at most one object member and at most one function member.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnionType {
    members: BTreeSet<Type>,
}

impl UnionType {
    pub(crate) fn from_members(members: BTreeSet<Type>) -> Self {
        debug_assert!(members.len() >= 2);
        debug_assert!(members.iter().all(|m| !matches!(m, Type::Union(_))));
        UnionType { members }
    }

    pub fn members(&self) -> impl Iterator<Item = &Type> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, ty: &Type) -> bool {
        self.members.contains(ty)
    }
}

/// Core type representation.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Type {
    /// No information yet. Identity element of join.
    Bottom,
    /// No precise type derivable. Absorbs everything under join.
    Unknown,
    Primitive(Primitive),
    Function(FunctionType),
    Object(ObjectType),
    Union(UnionType),
}

impl Type {
    // === Constructors ===

    pub fn number() -> Self {
        Type::Primitive(Primitive::Number)
    }

    pub fn string() -> Self {
        Type::Primitive(Primitive::String)
    }

    pub fn boolean() -> Self {
        Type::Primitive(Primitive::Boolean)
    }

    pub fn null() -> Self {
        Type::Primitive(Primitive::Null)
    }

    pub fn undefined() -> Self {
        Type::Primitive(Primitive::Undefined)
    }

    /// Create a function type with no closure handles.
    pub fn func(params: Vec<Type>, ret: Type) -> Self {
        Type::Function(FunctionType {
            params,
            ret: Box::new(ret),
            closures: BTreeSet::new(),
        })
    }

    /// Function value referring to a single closure.
    pub fn closure(id: ClosureId, arity: usize) -> Self {
        Type::Function(FunctionType {
            params: vec![Type::Bottom; arity],
            ret: Box::new(Type::Bottom),
            closures: BTreeSet::from([id]),
        })
    }

    /// Create an object type with the given fields.
    pub fn object(fields: impl IntoIterator<Item = (impl Into<String>, Type)>) -> Self {
        let fields = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Type::Object(ObjectType::from_fields(fields))
    }

    /// Object value referring to a cell in the object store.
    pub fn object_ref(id: ObjectId) -> Self {
        Type::Object(ObjectType {
            cells: BTreeSet::from([id]),
            ..ObjectType::default()
        })
    }

    /// Instance of a constructor, backed by a cell.
    pub fn instance(id: ObjectId, ctor: CtorId) -> Self {
        Type::Object(ObjectType {
            cells: BTreeSet::from([id]),
            ctors: BTreeSet::from([ctor]),
            ..ObjectType::default()
        })
    }

    /// The `prototype` object of a constructor.
    pub fn prototype_of(ctor: CtorId) -> Self {
        Type::Object(ObjectType {
            proto_of: BTreeSet::from([ctor]),
            ..ObjectType::default()
        })
    }

    /// Join all given types.
    pub fn union_of(types: impl IntoIterator<Item = Type>) -> Self {
        types
            .into_iter()
            .fold(Type::Bottom, |acc, ty| super::lattice::join(&acc, &ty))
    }

    // === Predicates ===

    pub fn is_bottom(&self) -> bool {
        matches!(self, Type::Bottom)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    pub fn is_func(&self) -> bool {
        matches!(self, Type::Function(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Type::Object(_))
    }

    pub fn is_union(&self) -> bool {
        matches!(self, Type::Union(_))
    }

    /// Every value of this type is truthy.
    pub fn definitely_truthy(&self) -> bool {
        match self {
            Type::Function(_) | Type::Object(_) => true,
            Type::Union(u) => u.members().all(Type::definitely_truthy),
            _ => false,
        }
    }

    /// Every value of this type is falsy.
    pub fn definitely_falsy(&self) -> bool {
        match self {
            Type::Primitive(Primitive::Null | Primitive::Undefined) => true,
            Type::Union(u) => u.members().all(Type::definitely_falsy),
            _ => false,
        }
    }

    /// Every value of this type is a string.
    pub fn definitely_string(&self) -> bool {
        match self {
            Type::Primitive(Primitive::String) => true,
            Type::Union(u) => u.members().all(Type::definitely_string),
            _ => false,
        }
    }

    /// The type may hold a string.
    pub fn maybe_string(&self) -> bool {
        match self {
            Type::Primitive(Primitive::String) => true,
            Type::Union(u) => u.members().any(Type::maybe_string),
            _ => false,
        }
    }

    // === Accessors ===

    pub fn as_func(&self) -> Option<&FunctionType> {
        match self {
            Type::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectType> {
        match self {
            Type::Object(o) => Some(o),
            _ => None,
        }
    }

    /// The function part of this type, looking through unions.
    pub fn function_part(&self) -> Option<&FunctionType> {
        match self {
            Type::Function(f) => Some(f),
            Type::Union(u) => u.members().find_map(Type::as_func),
            _ => None,
        }
    }

    /// The object part of this type, looking through unions.
    pub fn object_part(&self) -> Option<&ObjectType> {
        match self {
            Type::Object(o) => Some(o),
            Type::Union(u) => u.members().find_map(Type::as_object),
            _ => None,
        }
    }

    /// True if no function or object in this type carries engine handles.
    pub fn is_detached(&self) -> bool {
        match self {
            Type::Bottom | Type::Unknown | Type::Primitive(_) => true,
            Type::Function(f) => {
                f.closures.is_empty()
                    && f.params.iter().all(Type::is_detached)
                    && f.ret.is_detached()
            }
            Type::Object(o) => o.is_detached() && o.fields.values().all(Type::is_detached),
            Type::Union(u) => u.members().all(Type::is_detached),
        }
    }
}
