use core::fmt;

use super::Node;

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol(s) => f.write_str(s),
            Self::Int(x) => write!(f, "{}", x),
            // Debug formatting always keeps a decimal point or exponent.
            Self::Float(x) => write!(f, "{:?}", x),
            Self::List(list) => {
                f.write_str("(")?;
                for (i, node) in list.iter().enumerate() {
                    if i != 0 {
                        f.write_str(" ")?;
                    }
                    fmt::Display::fmt(node, f)?;
                }
                f.write_str(")")
            },
        }
    }
}
