//! Turning a finished run into a [`TypeMap`].
//!
//! Two steps. First every closure the walk never called is analysed once
//! with `Unknown` arguments, so that each function literal ends up with a
//! declared signature; analysing one may capture closures of other
//! literals, which are picked up on the next sweep. Then every in-flight type is resolved:
//! closure handles become the closure's declared signature, object cells and
//! prototype handles become their current field maps. Handles that lead
//! back into themselves resolve to `Unknown`.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, debug_span};

use crate::ast::NodeId;
use crate::types::{join, ClosureId, CtorId, FunctionType, ObjectId, ObjectType, Type};

use super::state::InferState;
use super::type_map::{ConstructorInfo, FunctionInfo, GlobalBinding, ScopeInfo, TypeMap};

impl<'a> InferState<'a> {
    /// Finish the run and resolve everything into a [`TypeMap`].
    pub fn finish(mut self) -> TypeMap {
        let _span = debug_span!("finish", closures = self.closures.len()).entered();
        self.analyse_uncalled();

        let mut resolver = Resolver::new(&self);
        let node_types = self
            .node_types
            .iter()
            .map(|(node, ty)| {
                let ty = resolver.resolve(ty);
                if ty.is_bottom() && self.access_sites.contains(node) {
                    (*node, Type::Unknown)
                } else {
                    (*node, ty)
                }
            })
            .collect();

        let scopes = self
            .env
            .scopes()
            .map(|(_, scope)| ScopeInfo {
                parent: scope.parent(),
                owner: scope.owner(),
                bindings: resolver.resolve_fields(scope.bindings()),
            })
            .collect();

        let mut functions: BTreeMap<_, FunctionInfo> = BTreeMap::new();
        for (id, closure) in self.closures.iter() {
            let function = closure.function;
            let signature = resolver.resolve(&Type::closure(id, function.params.len()));
            match functions.get_mut(&function.id) {
                Some(info) => info.signature = join(&info.signature, &signature),
                None => {
                    functions.insert(
                        function.id,
                        FunctionInfo {
                            name: function.name.clone(),
                            params: function.params.clone(),
                            signature,
                        },
                    );
                }
            }
        }

        let global = self.env.global();
        let global_bindings = self.env.scope(global).bindings();
        let mut globals = Vec::new();
        for (name, ty) in global_bindings {
            if self.seeded.contains(name) {
                continue;
            }
            let closure = single_closure(ty);
            let function = closure.map(|c| self.closures.get(c).function.id);
            let class = closure
                .and_then(|c| self.protos.find(c))
                .filter(|ctor| {
                    let entry = self.protos.get(*ctor);
                    entry.analysed || !entry.methods.is_empty() || !entry.parents.is_empty()
                });
            globals.push(GlobalBinding {
                name: name.clone(),
                ty: resolver.resolve(ty),
                function,
                class,
            });
        }

        let constructors = self
            .protos
            .iter()
            .map(|(id, ctor)| {
                // Anonymous constructors take the global name they are bound to.
                let name = ctor.name.clone().or_else(|| {
                    let closure = ctor.closure?;
                    global_bindings
                        .iter()
                        .find(|(_, ty)| single_closure(ty) == Some(closure))
                        .map(|(name, _)| name.clone())
                });
                ConstructorInfo {
                    name,
                    function: ctor.closure.map(|c| self.closures.get(c).function.id),
                    parent: self.protos.effective_parent(id),
                    methods: resolver.resolve_fields(&ctor.methods),
                    fields: resolver.resolve_fields(&self.protos.instance_fields(id)),
                }
            })
            .collect();

        TypeMap {
            node_types,
            scopes,
            function_scopes: self.function_scopes.clone(),
            functions,
            constructors,
            globals,
            errors: self.errors.clone(),
            unbound: self.unbound.clone(),
        }
    }

    /// Analyse closures that were captured but never called.
    ///
    /// Each function literal is analysed at most once here. Analysing one
    /// can call back into a function whose fresh activation captures a new
    /// closure of the same literal; those are not swept again.
    fn analyse_uncalled(&mut self) {
        let mut visited: HashSet<NodeId> = HashSet::new();
        loop {
            let pending: Vec<ClosureId> = self
                .closures
                .iter()
                .filter(|(_, c)| c.calls == 0 && !visited.contains(&c.function.id))
                .map(|(id, _)| id)
                .collect();
            if pending.is_empty() {
                break;
            }

            for id in pending {
                let function = self.closures.get(id).function;
                let site = function.id;
                if !visited.insert(site) {
                    continue;
                }
                let args = vec![Type::Unknown; function.params.len()];
                let global = self.env.global();
                debug!(function = %site, "analysing uncalled function");

                let result = match self.protos.find(id) {
                    Some(_) => self.instantiate(id, &args, site, global).map(drop),
                    None => self
                        .invoke(id, Type::Unknown, &args, site, global, None)
                        .map(drop),
                };
                if let Err(err) = result {
                    if !self.errors.contains(&err) {
                        self.errors.push(err);
                    }
                }
            }
        }
    }
}

/// The closure a value refers to, when it refers to exactly one.
fn single_closure(ty: &Type) -> Option<ClosureId> {
    let f = ty.as_func()?;
    let mut closures = f.closures.iter();
    match (closures.next(), closures.next()) {
        (Some(id), None) => Some(*id),
        _ => None,
    }
}

/// Resolves handles into structural types, cutting cycles at `Unknown`.
struct Resolver<'s, 'a> {
    state: &'s InferState<'a>,
    closures: Vec<ClosureId>,
    cells: Vec<ObjectId>,
    protos: Vec<CtorId>,
    /// Number of cycle cuts so far. A result computed without a cut does
    /// not depend on the path and can be memoized.
    cuts: usize,
    memo: HashMap<Type, Type>,
}

impl<'s, 'a> Resolver<'s, 'a> {
    fn new(state: &'s InferState<'a>) -> Self {
        Resolver {
            state,
            closures: Vec::new(),
            cells: Vec::new(),
            protos: Vec::new(),
            cuts: 0,
            memo: HashMap::new(),
        }
    }

    fn resolve(&mut self, ty: &Type) -> Type {
        match ty {
            Type::Bottom | Type::Unknown | Type::Primitive(_) => ty.clone(),
            _ => {
                if let Some(done) = self.memo.get(ty) {
                    return done.clone();
                }
                let cuts = self.cuts;
                let resolved = match ty {
                    Type::Function(f) => self.resolve_function(f),
                    Type::Object(o) => self.resolve_object(o),
                    Type::Union(u) => u
                        .members()
                        .map(|m| self.resolve(m))
                        .fold(Type::Bottom, |acc, m| join(&acc, &m)),
                    _ => ty.clone(),
                };
                if self.cuts == cuts {
                    self.memo.insert(ty.clone(), resolved.clone());
                }
                resolved
            }
        }
    }

    fn resolve_fields(&mut self, fields: &BTreeMap<String, Type>) -> BTreeMap<String, Type> {
        fields
            .iter()
            .map(|(name, ty)| (name.clone(), self.resolve(ty)))
            .collect()
    }

    fn resolve_function(&mut self, f: &FunctionType) -> Type {
        if f.closures.iter().any(|c| self.closures.contains(c)) {
            self.cuts += 1;
            return Type::Unknown;
        }

        let mut result = Type::Function(FunctionType {
            params: f.params.iter().map(|p| self.resolve(p)).collect(),
            ret: Box::new(self.resolve(&f.ret)),
            closures: Default::default(),
        });

        self.closures.extend(f.closures.iter().copied());
        let state = self.state;
        for id in &f.closures {
            let closure = state.closures.get(*id);
            let ret = if closure.self_referential {
                Type::Unknown
            } else {
                self.resolve(&closure.ret)
            };
            let params = closure.params.iter().map(|p| self.resolve(p)).collect();
            result = join(&result, &Type::func(params, ret));
        }
        self.closures.truncate(self.closures.len() - f.closures.len());
        result
    }

    fn resolve_object(&mut self, o: &ObjectType) -> Type {
        let cyclic = o.cells.iter().any(|c| self.cells.contains(c))
            || o.proto_of.iter().any(|c| self.protos.contains(c));
        if cyclic {
            self.cuts += 1;
            return Type::Unknown;
        }

        self.cells.extend(o.cells.iter().copied());
        self.protos.extend(o.proto_of.iter().copied());

        let state = self.state;
        let mut fields = self.resolve_fields(&o.fields);
        for id in &o.cells {
            let cell = self.resolve_fields(state.objects.cell(*id).fields());
            merge_fields(&mut fields, cell);
        }
        for ctor in &o.proto_of {
            let members = self.resolve_fields(&state.protos.prototype_members(*ctor));
            merge_fields(&mut fields, members);
        }

        self.cells.truncate(self.cells.len() - o.cells.len());
        self.protos.truncate(self.protos.len() - o.proto_of.len());

        Type::Object(ObjectType {
            fields,
            ctors: o.ctors.clone(),
            ..ObjectType::default()
        })
    }
}

fn merge_fields(into: &mut BTreeMap<String, Type>, from: BTreeMap<String, Type>) {
    for (name, ty) in from {
        into.entry(name)
            .and_modify(|existing| *existing = join(existing, &ty))
            .or_insert(ty);
    }
}
