//! Built-in global bindings.
//!
//! This module provides the optional pre-seeded global environment: a few
//! well-known library objects and functions, typed with detached signatures
//! so calls through them return their declared result without analysis.

use std::collections::BTreeMap;

use crate::types::Type;

/// A set of global bindings to seed a run with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Globals {
    bindings: BTreeMap<String, Type>,
}

impl Globals {
    /// No bindings.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add (or replace) a binding.
    pub fn with(mut self, name: &str, ty: Type) -> Self {
        self.bindings.insert(name.to_string(), ty);
        self
    }

    pub fn insert(&mut self, name: &str, ty: Type) {
        self.bindings.insert(name.to_string(), ty);
    }

    pub fn get(&self, name: &str) -> Option<&Type> {
        self.bindings.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Type)> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// The standard library subset every run starts with by default.
    pub fn builtins() -> Self {
        let unary_number = || Type::func(vec![Type::number()], Type::number());
        let binary_number = || Type::func(vec![Type::number(), Type::number()], Type::number());

        // console object with log method
        let console = Type::object([
            ("log", Type::func(vec![Type::Unknown], Type::undefined())),
            ("error", Type::func(vec![Type::Unknown], Type::undefined())),
            ("warn", Type::func(vec![Type::Unknown], Type::undefined())),
        ]);

        let math = Type::object([
            ("PI", Type::number()),
            ("E", Type::number()),
            ("abs", unary_number()),
            ("floor", unary_number()),
            ("ceil", unary_number()),
            ("round", unary_number()),
            ("sqrt", unary_number()),
            ("pow", binary_number()),
            ("min", binary_number()),
            ("max", binary_number()),
            ("random", Type::func(vec![], Type::number())),
        ]);

        let json = Type::object([
            ("parse", Type::func(vec![Type::string()], Type::Unknown)),
            ("stringify", Type::func(vec![Type::Unknown], Type::string())),
        ]);

        Globals::empty()
            .with("console", console)
            .with("Math", math)
            .with("JSON", json)
            .with("parseInt", Type::func(vec![Type::string()], Type::number()))
            .with("parseFloat", Type::func(vec![Type::string()], Type::number()))
            .with("isNaN", Type::func(vec![Type::Unknown], Type::boolean()))
            .with("String", Type::func(vec![Type::Unknown], Type::string()))
            .with("Number", Type::func(vec![Type::Unknown], Type::number()))
            .with("undefined", Type::undefined())
            .with("NaN", Type::number())
            .with("Infinity", Type::number())
    }
}
