//! Expression operators.

use core::fmt;

macro_rules! def_operators {
    ($($id:ident = $name:literal, $arity:literal;)*) => {
        /// An expression operator.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Operator {
            $($id,)*
        }

        impl Operator {
            /// Every operator, in table order.
            pub const ALL: &'static [Operator] = &[$(Self::$id,)*];

            /// The name of the operator in the textual IR.
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$id => $name,)*
                }
            }

            /// The number of operands the operator takes.
            pub fn arity(self) -> usize {
                match self {
                    $(Self::$id => $arity,)*
                }
            }
        }
    };
}

def_operators! {
    BitNot = "~", 1;
    LogicNot = "!", 1;
    Neg = "neg", 1;
    Abs = "abs", 1;
    Sign = "sign", 1;
    Rcp = "rcp", 1;
    Rsq = "rsq", 1;
    Sqrt = "sqrt", 1;
    Exp = "exp", 1;
    Log = "log", 1;
    Exp2 = "exp2", 1;
    Log2 = "log2", 1;
    F2I = "f2i", 1;
    I2F = "i2f", 1;
    F2B = "f2b", 1;
    B2F = "b2f", 1;
    I2B = "i2b", 1;
    B2I = "b2i", 1;
    U2F = "u2f", 1;
    Any = "any", 1;
    Trunc = "trunc", 1;
    Ceil = "ceil", 1;
    Floor = "floor", 1;
    Fract = "fract", 1;
    Sin = "sin", 1;
    Cos = "cos", 1;
    DFdx = "dFdx", 1;
    DFdy = "dFdy", 1;

    Add = "+", 2;
    Sub = "-", 2;
    Mul = "*", 2;
    Div = "/", 2;
    Mod = "%", 2;
    Less = "<", 2;
    Greater = ">", 2;
    LEqual = "<=", 2;
    GEqual = ">=", 2;
    Equal = "==", 2;
    NEqual = "!=", 2;
    LShift = "<<", 2;
    RShift = ">>", 2;
    BitAnd = "&", 2;
    BitXor = "^", 2;
    BitOr = "|", 2;
    LogicAnd = "&&", 2;
    LogicXor = "^^", 2;
    LogicOr = "||", 2;
    Dot = "dot", 2;
    Cross = "cross", 2;
    Min = "min", 2;
    Max = "max", 2;
    Pow = "pow", 2;
}

impl Operator {
    /// Look up an operator by its name in the textual IR.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.name() == name)
    }

    /// Whether this is one of the six comparison operators.
    pub fn is_comparison(self) -> bool {
        matches!(self,
            Self::Less | Self::Greater | Self::LEqual | Self::GEqual
            | Self::Equal | Self::NEqual)
    }

    /// The comparison that holds exactly when this one does not.
    pub fn negate_comparison(self) -> Option<Self> {
        Some(match self {
            Self::Less => Self::GEqual,
            Self::GEqual => Self::Less,
            Self::Greater => Self::LEqual,
            Self::LEqual => Self::Greater,
            Self::Equal => Self::NEqual,
            Self::NEqual => Self::Equal,
            _ => return None,
        })
    }

    /// The operator's symbol, if it is written infix in source code.
    pub fn infix_symbol(self) -> Option<&'static str> {
        Some(match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LEqual => "<=",
            Self::GEqual => ">=",
            Self::Equal => "==",
            Self::NEqual => "!=",
            Self::LShift => "<<",
            Self::RShift => ">>",
            Self::BitAnd => "&",
            Self::BitXor => "^",
            Self::BitOr => "|",
            Self::LogicAnd => "&&",
            Self::LogicXor => "^^",
            Self::LogicOr => "||",
            _ => return None,
        })
    }

    /// The operator's symbol, if it is written prefix in source code.
    pub fn prefix_symbol(self) -> Option<&'static str> {
        Some(match self {
            Self::BitNot => "~",
            Self::LogicNot => "!",
            Self::Neg => "-",
            _ => return None,
        })
    }

    /// Whether this operator converts between base types.
    ///
    /// In source code, conversions are written as constructors of the result
    /// type.
    pub fn is_conversion(self) -> bool {
        matches!(self,
            Self::F2I | Self::I2F | Self::F2B | Self::B2F
            | Self::I2B | Self::B2I | Self::U2F)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
