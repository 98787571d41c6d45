use core::fmt;

use super::*;

/// Types display in the textual IR's type syntax.
impl<'c> fmt::Display for Type<'c> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = self.name {
            return f.write_str(name);
        }

        match &self.fields {
            Fields::Array(element) =>
                write!(f, "(array {} {})", element, self.length),
            Fields::Struct(fields) => {
                f.write_str("(struct (")?;
                for (i, field) in fields.iter().enumerate() {
                    if i != 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "({} {})", field.ty, field.name)?;
                }
                f.write_str("))")
            },
            Fields::Function(types) => {
                write!(f, "(function {} (", types[0])?;
                for (i, param) in types[1..].iter().enumerate() {
                    if i != 0 {
                        f.write_str(" ")?;
                    }
                    fmt::Display::fmt(param, f)?;
                }
                f.write_str("))")
            },
            Fields::None => f.write_str("error"),
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uint => "uint",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Sampler => "sampler",
            Self::Struct => "struct",
            Self::Array => "array",
            Self::Function => "function",
            Self::Void => "void",
            Self::Error => "error",
        })
    }
}
