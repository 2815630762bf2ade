//! Constructors and prototype chains.
//!
//! Every closure used with `new` or whose `prototype` is touched gets a
//! constructor entry. Method tables live on the constructor rather than on a
//! prototype object: writes to `F.prototype.m` land in F's table, and
//! `F.prototype = new G()` records G as a parent of F. `F.prototype =
//! G.prototype` makes F share G's table, which is how the `__extends`
//! helper's intermediate constructor works. Chains may contain cycles, so
//! every walk carries a visited set.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::types::{join, widen_in_place, ClosureId, CtorId, Type};

#[derive(Clone, Debug, Default)]
pub struct Constructor {
    pub name: Option<String>,
    pub closure: Option<ClosureId>,
    /// Constructors whose instances serve as this one's prototype.
    pub parents: BTreeSet<CtorId>,
    /// Constructors whose prototype object this one's prototype is.
    pub shares: BTreeSet<CtorId>,
    pub methods: BTreeMap<String, Type>,
    /// Fields the constructor body writes on `this`.
    pub own_fields: BTreeMap<String, Type>,
    /// Whether a constructing activation of the body has run.
    pub analysed: bool,
}

#[derive(Debug, Default)]
pub struct Prototypes {
    ctors: Vec<Constructor>,
    by_closure: HashMap<ClosureId, CtorId>,
    changes: u64,
}

impl Prototypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor not tied to any closure.
    pub fn define_constructor(
        &mut self,
        name: Option<&str>,
        parent: Option<CtorId>,
        own_fields: BTreeMap<String, Type>,
    ) -> CtorId {
        let id = CtorId(self.ctors.len() as u32);
        self.ctors.push(Constructor {
            name: name.map(str::to_string),
            parents: parent.into_iter().collect(),
            own_fields,
            ..Constructor::default()
        });
        self.changes += 1;
        id
    }

    /// The constructor for a closure, created on first use.
    pub fn constructor_for(&mut self, closure: ClosureId, name: Option<&str>) -> CtorId {
        if let Some(&id) = self.by_closure.get(&closure) {
            return id;
        }
        let id = self.define_constructor(name, None, BTreeMap::new());
        self.ctors[id.0 as usize].closure = Some(closure);
        self.by_closure.insert(closure, id);
        id
    }

    pub fn find(&self, closure: ClosureId) -> Option<CtorId> {
        self.by_closure.get(&closure).copied()
    }

    pub fn get(&self, id: CtorId) -> &Constructor {
        &self.ctors[id.0 as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (CtorId, &Constructor)> {
        self.ctors
            .iter()
            .enumerate()
            .map(|(i, c)| (CtorId(i as u32), c))
    }

    pub fn len(&self) -> usize {
        self.ctors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ctors.is_empty()
    }

    pub fn changes(&self) -> u64 {
        self.changes
    }

    fn get_mut(&mut self, id: CtorId) -> &mut Constructor {
        &mut self.ctors[id.0 as usize]
    }

    fn bump(&mut self, changed: bool) -> bool {
        if changed {
            self.changes += 1;
        }
        changed
    }

    pub fn mark_analysed(&mut self, id: CtorId) {
        self.get_mut(id).analysed = true;
    }

    /// Add or widen a method on the constructor's own table.
    pub fn define_method(&mut self, ctor: CtorId, name: &str, ty: &Type) -> bool {
        let methods = &mut self.get_mut(ctor).methods;
        let changed = match methods.get_mut(name) {
            Some(slot) => widen_in_place(slot, ty),
            None => {
                methods.insert(name.to_string(), ty.clone());
                true
            }
        };
        self.bump(changed)
    }

    pub fn set_parent(&mut self, ctor: CtorId, parent: CtorId) -> bool {
        let changed = self.get_mut(ctor).parents.insert(parent);
        self.bump(changed)
    }

    pub fn share_prototype(&mut self, ctor: CtorId, with: CtorId) -> bool {
        if ctor == with {
            return false;
        }
        let changed = self.get_mut(ctor).shares.insert(with);
        self.bump(changed)
    }

    pub fn record_own_field(&mut self, ctor: CtorId, name: &str, ty: &Type) -> bool {
        let fields = &mut self.get_mut(ctor).own_fields;
        let changed = match fields.get_mut(name) {
            Some(slot) => widen_in_place(slot, ty),
            None => {
                fields.insert(name.to_string(), ty.clone());
                true
            }
        };
        self.bump(changed)
    }

    /// Look `name` up on the prototype of `ctor`: its own table, the tables
    /// it shares, then its parents' prototypes, nearest first.
    pub fn lookup_method(&self, ctor: CtorId, name: &str) -> Option<Type> {
        let mut visited = HashSet::new();
        self.lookup_in(ctor, name, &mut visited)
    }

    fn lookup_in(&self, ctor: CtorId, name: &str, visited: &mut HashSet<CtorId>) -> Option<Type> {
        if !visited.insert(ctor) {
            return None;
        }
        let entry = self.get(ctor);
        if let Some(ty) = entry.methods.get(name) {
            return Some(ty.clone());
        }
        for shared in &entry.shares {
            if let Some(ty) = self.lookup_in(*shared, name, visited) {
                return Some(ty);
            }
        }
        // A parent's instance is the prototype: its own fields count too.
        for parent in &entry.parents {
            if let Some(ty) = self.get(*parent).own_fields.get(name) {
                return Some(ty.clone());
            }
            if let Some(ty) = self.lookup_in(*parent, name, visited) {
                return Some(ty);
            }
        }
        None
    }

    /// Method lookup for a receiver value: joins over every constructor the
    /// receiver is an instance of, and every constructor whose prototype
    /// object it is. `Unknown` if nothing is found.
    pub fn resolve_method(&self, receiver: &Type, name: &str) -> Type {
        self.find_method(receiver, name).unwrap_or(Type::Unknown)
    }

    /// Like [`Prototypes::resolve_method`], `None` when no chain has `name`.
    pub fn find_method(&self, receiver: &Type, name: &str) -> Option<Type> {
        let obj = receiver.object_part()?;
        let mut found: Option<Type> = None;
        let chains = obj.ctors.iter().chain(&obj.proto_of);
        for ty in chains.filter_map(|c| self.lookup_method(*c, name)) {
            found = Some(match found {
                Some(prev) => join(&prev, &ty),
                None => ty,
            });
        }
        found
    }

    /// Every constructor reachable through parents and shared tables,
    /// nearest first, excluding `ctor` itself.
    pub fn ancestors(&self, ctor: CtorId) -> Vec<CtorId> {
        let mut visited = HashSet::from([ctor]);
        let mut order = Vec::new();
        let mut frontier = vec![ctor];
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for id in frontier {
                let entry = self.get(id);
                for link in entry.shares.iter().chain(&entry.parents) {
                    if visited.insert(*link) {
                        order.push(*link);
                        next.push(*link);
                    }
                }
            }
            frontier = next;
        }
        order
    }

    /// Every member visible on the prototype object of `ctor`, nearest
    /// definition winning.
    pub fn prototype_members(&self, ctor: CtorId) -> BTreeMap<String, Type> {
        let mut members = self.get(ctor).methods.clone();
        for ancestor in self.ancestors(ctor) {
            let entry = self.get(ancestor);
            for (name, ty) in entry.methods.iter().chain(&entry.own_fields) {
                members.entry(name.clone()).or_insert_with(|| ty.clone());
            }
        }
        members
    }

    /// Own fields of `ctor` followed by those of its ancestors that it does
    /// not already define.
    pub fn instance_fields(&self, ctor: CtorId) -> BTreeMap<String, Type> {
        let mut fields = self.get(ctor).own_fields.clone();
        for ancestor in self.ancestors(ctor) {
            for (name, ty) in &self.get(ancestor).own_fields {
                fields.entry(name.clone()).or_insert_with(|| ty.clone());
            }
        }
        fields
    }

    /// The constructor this one's prototype was built from, looking through
    /// intermediate constructors that only share another's table. Their
    /// own fields (such as `constructor`) are ignored.
    pub fn effective_parent(&self, ctor: CtorId) -> Option<CtorId> {
        let parent = *self.get(ctor).parents.iter().next()?;
        let entry = self.get(parent);
        if entry.closure.is_some() && entry.methods.is_empty() {
            if let Some(shared) = entry.shares.iter().next() {
                return Some(*shared);
            }
        }
        Some(parent)
    }
}
