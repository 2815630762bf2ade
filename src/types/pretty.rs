//! Pretty-printing for types.
//!
//! Types are rendered in TypeScript declaration syntax, which is what the
//! declaration printer emits and what reads most naturally in test output.

use std::fmt::{self, Display, Write};

use super::ty::{FunctionType, ObjectType, Primitive, Type};

/// Context for pretty-printing.
pub struct PrettyContext {
    /// Names used for function parameters, when the caller knows them.
    param_names: Option<Vec<String>>,
}

impl Default for PrettyContext {
    fn default() -> Self {
        Self::new()
    }
}

impl PrettyContext {
    /// Create a new pretty-printing context.
    pub fn new() -> Self {
        PrettyContext { param_names: None }
    }

    /// Use the given names for the parameters of the outermost function type.
    pub fn with_param_names(names: Vec<String>) -> Self {
        PrettyContext {
            param_names: Some(names),
        }
    }

    /// Format a type to a string.
    pub fn format_type(&mut self, ty: &Type) -> String {
        let mut s = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_type(&mut s, ty, false);
        s
    }

    /// Format a parameter list with its surrounding parentheses: `(a: T, b: U)`.
    pub fn format_params(&mut self, params: &[Type]) -> String {
        let mut s = String::new();
        let _ = self.write_params(&mut s, params);
        s
    }

    /// Write a type to the given writer.
    fn write_type<W: Write>(&mut self, w: &mut W, ty: &Type, in_union: bool) -> fmt::Result {
        match ty {
            Type::Bottom => write!(w, "never"),
            Type::Unknown => write!(w, "any"),
            Type::Primitive(p) => write!(w, "{}", p),

            Type::Function(func) => {
                if in_union {
                    write!(w, "(")?;
                }
                self.write_function(w, func)?;
                if in_union {
                    write!(w, ")")?;
                }
                Ok(())
            }

            Type::Object(obj) => self.write_object(w, obj),

            Type::Union(union) => {
                for (i, member) in union.members().enumerate() {
                    if i > 0 {
                        write!(w, " | ")?;
                    }
                    self.write_type(w, member, true)?;
                }
                Ok(())
            }
        }
    }

    fn write_function<W: Write>(&mut self, w: &mut W, func: &FunctionType) -> fmt::Result {
        self.write_params(w, &func.params)?;
        write!(w, " => ")?;
        self.write_type(w, &func.ret, false)
    }

    fn write_params<W: Write>(&mut self, w: &mut W, params: &[Type]) -> fmt::Result {
        // Names apply to the outermost signature only.
        let names = self.param_names.take();

        write!(w, "(")?;
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                write!(w, ", ")?;
            }
            match names.as_ref().and_then(|n| n.get(i)) {
                Some(name) => write!(w, "{}: ", name)?,
                None => write!(w, "p{}: ", i)?,
            }
            self.write_type(w, param, false)?;
        }
        write!(w, ")")
    }

    fn write_object<W: Write>(&mut self, w: &mut W, obj: &ObjectType) -> fmt::Result {
        if obj.fields.is_empty() {
            return write!(w, "{{}}");
        }

        write!(w, "{{ ")?;
        for (i, (name, ty)) in obj.fields.iter().enumerate() {
            if i > 0 {
                write!(w, "; ")?;
            }
            write!(w, "{}: ", property_name(name))?;
            self.write_type(w, ty, false)?;
        }
        write!(w, " }}")
    }
}

const RESERVED: &[&str] = &[
    "abstract", "arguments", "boolean", "break", "byte", "case", "catch", "char", "class",
    "const", "continue", "debugger", "default", "delete", "do", "double", "else", "enum", "eval",
    "export", "extends", "false", "final", "finally", "float", "for", "function", "get", "goto",
    "if", "implements", "import", "in", "instanceof", "int", "interface", "let", "long", "native",
    "new", "null", "package", "private", "protected", "public", "return", "set", "short",
    "static", "super", "switch", "synchronized", "this", "throw", "throws", "transient", "true",
    "try", "typeof", "var", "void", "volatile", "while", "with", "yield",
];

/// Whether `name` can be written bare as a property or binding name.
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_' || c == '$');
    head_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !RESERVED.contains(&name)
}

/// Quote a property name unless it is a plain identifier.
pub fn property_name(name: &str) -> String {
    if is_plain_identifier(name) {
        name.to_string()
    } else {
        format!("{:?}", name)
    }
}

impl Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Primitive::Boolean => "boolean",
            Primitive::String => "string",
            Primitive::Number => "number",
            Primitive::Null => "null",
            Primitive::Undefined => "undefined",
        };
        f.write_str(name)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        PrettyContext::new().write_type(f, self, false)
    }
}
