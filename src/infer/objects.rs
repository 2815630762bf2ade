//! The object store.
//!
//! Every object literal and every `new` expression allocates a cell, keyed by
//! its allocation site: the node that created it plus the scope instance it
//! was evaluated in (and, for instances, the constructor). Re-evaluating the
//! same site in the same scope reuses the cell. All values referring to a
//! cell see each other's writes.

use std::collections::{BTreeMap, HashMap};

use crate::ast::NodeId;
use crate::types::{join, widen_in_place, CtorId, ObjectId, ObjectType, Type};

use super::env::ScopeId;

/// Where a cell was allocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AllocSite {
    pub node: NodeId,
    pub scope: ScopeId,
    pub ctor: Option<CtorId>,
}

impl AllocSite {
    pub fn literal(node: NodeId, scope: ScopeId) -> Self {
        AllocSite {
            node,
            scope,
            ctor: None,
        }
    }

    pub fn instance(node: NodeId, scope: ScopeId, ctor: CtorId) -> Self {
        AllocSite {
            node,
            scope,
            ctor: Some(ctor),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ObjectCell {
    pub site: AllocSite,
    fields: BTreeMap<String, Type>,
}

impl ObjectCell {
    pub fn fields(&self) -> &BTreeMap<String, Type> {
        &self.fields
    }
}

#[derive(Debug, Default)]
pub struct ObjectStore {
    cells: Vec<ObjectCell>,
    by_site: HashMap<AllocSite, ObjectId>,
    changes: u64,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate (or reuse) the cell for `site`, writing `initial` into it.
    pub fn create_object(
        &mut self,
        site: AllocSite,
        initial: impl IntoIterator<Item = (String, Type)>,
    ) -> ObjectId {
        let id = match self.by_site.get(&site) {
            Some(&id) => id,
            None => {
                let id = ObjectId(self.cells.len() as u32);
                self.cells.push(ObjectCell {
                    site,
                    fields: BTreeMap::new(),
                });
                self.by_site.insert(site, id);
                self.changes += 1;
                id
            }
        };
        for (name, ty) in initial {
            self.write_cell(id, &name, &ty);
        }
        id
    }

    pub fn cell(&self, id: ObjectId) -> &ObjectCell {
        &self.cells[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn changes(&self) -> u64 {
        self.changes
    }

    /// Widen one field of one cell. A field's first write is taken exactly.
    pub fn write_cell(&mut self, id: ObjectId, name: &str, ty: &Type) -> bool {
        let fields = &mut self.cells[id.0 as usize].fields;
        let changed = match fields.get_mut(name) {
            Some(slot) => widen_in_place(slot, ty),
            None => {
                fields.insert(name.to_string(), ty.clone());
                true
            }
        };
        if changed {
            self.changes += 1;
        }
        changed
    }

    /// The field type as seen through `obj`, or `None` if no cell or
    /// snapshot of it has the field.
    pub fn lookup_field(&self, obj: &ObjectType, name: &str) -> Option<Type> {
        let mut found: Option<Type> = obj.fields.get(name).cloned();
        for id in &obj.cells {
            if let Some(ty) = self.cell(*id).fields.get(name) {
                found = Some(match found {
                    Some(prev) => join(&prev, ty),
                    None => ty.clone(),
                });
            }
        }
        found
    }

    /// Read a field; `Unknown` if absent.
    pub fn read_field(&self, obj: &ObjectType, name: &str) -> Type {
        self.lookup_field(obj, name).unwrap_or(Type::Unknown)
    }

    /// Write a field through every cell `obj` may alias.
    ///
    /// Returns whether any cell changed.
    pub fn write_field(&mut self, obj: &ObjectType, name: &str, ty: &Type) -> bool {
        let mut changed = false;
        for id in &obj.cells {
            changed |= self.write_cell(*id, name, ty);
        }
        changed
    }
}
