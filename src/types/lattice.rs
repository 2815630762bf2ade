//! Join and ordering over [`Type`].
//!
//! `join` is the least upper bound used whenever two observations of the same
//! binding, field, node or return value have to be merged. It is total:
//! anything that cannot be merged precisely goes to `Unknown`.

use std::collections::{BTreeMap, BTreeSet};

use super::ty::{FunctionType, ObjectType, Primitive, Type, UnionType};

/// Least upper bound of two types.
pub fn join(a: &Type, b: &Type) -> Type {
    match (a, b) {
        (Type::Bottom, other) | (other, Type::Bottom) => other.clone(),
        (Type::Unknown, _) | (_, Type::Unknown) => Type::Unknown,
        _ if a == b => a.clone(),
        _ => {
            let mut members = Members::default();
            members.add(a);
            members.add(b);
            members.finish()
        }
    }
}

/// `a` is at least as precise as `b`: joining `a` into `b` changes nothing.
pub fn is_subtype(a: &Type, b: &Type) -> bool {
    join(a, b) == *b
}

/// Join `update` into `slot`, returning whether `slot` changed.
pub fn widen_in_place(slot: &mut Type, update: &Type) -> bool {
    let joined = join(slot, update);
    if joined == *slot {
        false
    } else {
        *slot = joined;
        true
    }
}

/// Merge two object types field-wise. A field known on one side only keeps
/// its type.
pub fn join_objects(a: &ObjectType, b: &ObjectType) -> ObjectType {
    let mut fields: BTreeMap<String, Type> = a.fields.clone();
    for (name, ty) in &b.fields {
        fields
            .entry(name.clone())
            .and_modify(|existing| *existing = join(existing, ty))
            .or_insert_with(|| ty.clone());
    }

    ObjectType {
        fields,
        cells: a.cells.union(&b.cells).copied().collect(),
        ctors: a.ctors.union(&b.ctors).copied().collect(),
        proto_of: a.proto_of.union(&b.proto_of).copied().collect(),
    }
}

/// Merge two function types of equal arity; `None` when the arities differ.
pub fn join_functions(a: &FunctionType, b: &FunctionType) -> Option<FunctionType> {
    if a.arity() != b.arity() {
        return None;
    }

    Some(FunctionType {
        params: a
            .params
            .iter()
            .zip(&b.params)
            .map(|(x, y)| join(x, y))
            .collect(),
        ret: Box::new(join(&a.ret, &b.ret)),
        closures: a.closures.union(&b.closures).copied().collect(),
    })
}

/// Accumulates the members of a union while keeping it normalized.
#[derive(Default)]
struct Members {
    primitives: BTreeSet<Primitive>,
    object: Option<ObjectType>,
    function: Option<FunctionType>,
    unknown: bool,
}

impl Members {
    fn add(&mut self, ty: &Type) {
        match ty {
            Type::Bottom => {}
            Type::Unknown => self.unknown = true,
            Type::Primitive(p) => {
                self.primitives.insert(*p);
            }
            Type::Object(obj) => {
                self.object = Some(match self.object.take() {
                    Some(existing) => join_objects(&existing, obj),
                    None => obj.clone(),
                });
            }
            Type::Function(func) => match self.function.take() {
                Some(existing) => match join_functions(&existing, func) {
                    Some(joined) => self.function = Some(joined),
                    None => self.unknown = true,
                },
                None => self.function = Some(func.clone()),
            },
            Type::Union(union) => {
                for member in union.members() {
                    self.add(member);
                }
            }
        }
    }

    fn finish(self) -> Type {
        if self.unknown {
            return Type::Unknown;
        }

        let mut members: BTreeSet<Type> = self
            .primitives
            .into_iter()
            .map(Type::Primitive)
            .collect();
        members.extend(self.object.map(Type::Object));
        members.extend(self.function.map(Type::Function));

        match members.len() {
            0 => Type::Bottom,
            1 => members.into_iter().next().unwrap_or(Type::Bottom),
            _ => Type::Union(UnionType::from_members(members)),
        }
    }
}
