//! TypeScript declaration output.
//!
//! Prints one `declare` item per program-defined global, in name order:
//! functions as `declare function`, functions used as constructors as
//! `declare class`, and everything else as `declare var`.

use std::fmt::{self, Write};

use crate::infer::{GlobalBinding, TypeMap};
use crate::types::{property_name, FunctionType, ObjectType, PrettyContext, Type};

const INDENT: &str = "    ";

/// Render declarations for every global of `map`.
pub fn print_declarations(map: &TypeMap) -> String {
    Declarations(map).to_string()
}

/// The declaration file of a [`TypeMap`], rendered through `Display`.
pub struct Declarations<'m>(pub &'m TypeMap);

impl fmt::Display for Declarations<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for global in self.0.globals() {
            write_global(f, self.0, global)?;
        }
        Ok(())
    }
}

fn write_global(out: &mut impl Write, map: &TypeMap, global: &GlobalBinding) -> fmt::Result {
    let name = property_name(&global.name);
    let ty = erase_bottom(&global.ty);

    if let Some(ctor) = global.class.and_then(|c| map.constructor(c)) {
        write!(out, "declare class {}", name)?;
        if let Some(parent) = ctor.parent.and_then(|p| map.constructor_name(p)) {
            write!(out, " extends {}", property_name(parent))?;
        }
        writeln!(out, " {{")?;

        let info = global.function.and_then(|f| map.function(f));
        let params = match ty.as_func() {
            Some(f) => f.params.clone(),
            None => Vec::new(),
        };
        let mut ctx = param_context(info.map(|i| i.params.clone()));
        writeln!(out, "{}constructor{};", INDENT, ctx.format_params(&params))?;

        for (field, field_ty) in &ctor.fields {
            if field == "constructor" {
                continue;
            }
            let mut ctx = PrettyContext::new();
            writeln!(
                out,
                "{}{}: {};",
                INDENT,
                property_name(field),
                ctx.format_type(&erase_bottom(field_ty))
            )?;
        }
        for (method, method_ty) in &ctor.methods {
            let method_ty = erase_bottom(method_ty);
            match method_ty.as_func() {
                Some(f) => writeln!(out, "{}{};", INDENT, signature(&property_name(method), f, None))?,
                None => {
                    let mut ctx = PrettyContext::new();
                    writeln!(
                        out,
                        "{}{}: {};",
                        INDENT,
                        property_name(method),
                        ctx.format_type(&method_ty)
                    )?
                }
            }
        }
        return writeln!(out, "}}");
    }

    if let (Some(f), Some(node)) = (ty.as_func(), global.function) {
        let names = map.function(node).map(|info| info.params.clone());
        return writeln!(out, "declare function {};", signature(&name, f, names));
    }

    writeln!(out, "declare var {}: {};", name, format_value(map, &ty))
}

/// `name(a: T, b: U): R`
fn signature(name: &str, f: &FunctionType, names: Option<Vec<String>>) -> String {
    let mut ctx = param_context(names);
    let params = ctx.format_params(&f.params);
    let ret = PrettyContext::new().format_type(&f.ret);
    format!("{}{}: {}", name, params, ret)
}

fn param_context(names: Option<Vec<String>>) -> PrettyContext {
    match names {
        Some(names) => PrettyContext::with_param_names(names),
        None => PrettyContext::new(),
    }
}

/// Instances of a single named constructor print as the class name.
fn format_value(map: &TypeMap, ty: &Type) -> String {
    if let Some(obj) = ty.as_object() {
        let mut ctors = obj.ctors.iter();
        if let (Some(ctor), None) = (ctors.next(), ctors.next()) {
            if let Some(name) = map.constructor_name(*ctor) {
                return property_name(name);
            }
        }
    }
    PrettyContext::new().format_type(ty)
}

/// Replace `never` by `any` everywhere in `ty`: a binding that was never
/// assigned still has to be declared with some type.
fn erase_bottom(ty: &Type) -> Type {
    match ty {
        Type::Bottom => Type::Unknown,
        Type::Unknown | Type::Primitive(_) => ty.clone(),
        Type::Function(f) => Type::Function(FunctionType {
            params: f.params.iter().map(erase_bottom).collect(),
            ret: Box::new(erase_bottom(&f.ret)),
            closures: f.closures.clone(),
        }),
        Type::Object(o) => Type::Object(ObjectType {
            fields: o
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), erase_bottom(v)))
                .collect(),
            ..o.clone()
        }),
        Type::Union(u) => Type::union_of(u.members().map(erase_bottom)),
    }
}
