//! The intermediate representation.
//!
//! IR is a tree of owned nodes, except for [`Variable`]s, which live in the
//! compilation unit's [`Storage`](crate::storage::Storage) and are referred
//! to by [`VarRef`] from their declaration and every use.  Types are borrowed
//! for the same lifetime `'c`.
//!
//! The constructors on the node types check the structural invariants that
//! every consumer relies on; the fields are public for traversal and
//! rewriting.

use core::fmt;

use crate::tys::{self, BaseType, TypeRef};
use crate::tys::builtin::FLOAT;
use crate::util::arena::Ref;

pub mod glsl;
pub mod print;
pub mod read;
pub mod syms;
pub mod visit;

mod clone;
mod err;
mod ops;

pub use clone::Cloner;
pub use err::Error;
pub use ops::Operator;
pub use syms::SymbolTable;

/// A construction result.
pub type Result<T> = core::result::Result<T, Error>;

/// A reference to a variable.
pub type VarRef<'c> = Ref<'c, Variable<'c>>;

/// The identity of a loop.
///
/// Loop IDs are issued by [`Storage::loop_id`](crate::storage::Storage::loop_id)
/// and are unique within a compilation unit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoopId(pub(crate) u32);

/// An instruction.
#[derive(Clone, Debug)]
pub enum Instruction<'c> {
    /// The declaration of a variable.
    Variable(VarRef<'c>),
    Function(Function<'c>),
    Assignment(Assignment<'c>),
    Return(Return<'c>),
    If(If<'c>),
    Loop(Loop<'c>),
    LoopJump(LoopJump),
    /// An rvalue evaluated for its effects, such as a call.
    Rvalue(Rvalue<'c>),
}

/// A variable.
#[derive(Clone, Debug)]
pub struct Variable<'c> {
    pub name: &'c str,
    pub ty: TypeRef<'c>,
    pub centroid: bool,
    pub invariant: bool,
    pub mode: Mode,
    pub interpolation: Interpolation,
}

impl<'c> Variable<'c> {
    /// Construct an unqualified variable.
    pub fn new(name: &'c str, ty: TypeRef<'c>) -> Self {
        Self {
            name,
            ty,
            centroid: false,
            invariant: false,
            mode: Mode::default(),
            interpolation: Interpolation::default(),
        }
    }
}

/// The storage mode of a variable.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// An ordinary variable.
    #[default]
    Auto,
    Uniform,
    In,
    Out,
    InOut,
    /// A compiler-generated temporary.
    Temporary,
}

impl Mode {
    /// The qualifier naming this mode, if it is not the default.
    pub fn qualifier(self) -> Option<&'static str> {
        Some(match self {
            Self::Auto => return None,
            Self::Uniform => "uniform",
            Self::In => "in",
            Self::Out => "out",
            Self::InOut => "inout",
            Self::Temporary => "temporary",
        })
    }
}

/// The interpolation of a shader input or output.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Interpolation {
    #[default]
    Smooth,
    Flat,
    NoPerspective,
}

impl Interpolation {
    /// The qualifier naming this interpolation, if it is not the default.
    pub fn qualifier(self) -> Option<&'static str> {
        match self {
            Self::Smooth => None,
            Self::Flat => Some("flat"),
            Self::NoPerspective => Some("noperspective"),
        }
    }
}

/// A function: a set of overloaded signatures sharing one name.
#[derive(Clone, Debug)]
pub struct Function<'c> {
    pub name: &'c str,
    pub signatures: Vec<Signature<'c>>,
}

impl<'c> Function<'c> {
    /// Construct a function with no signatures.
    pub fn new(name: &'c str) -> Self {
        Self { name, signatures: Vec::new() }
    }

    /// Find the signature whose parameters have exactly the given types.
    pub fn matching_signature(&self, types: &[TypeRef<'c>]) -> Option<usize> {
        self.signatures.iter()
            .position(|sig| sig.parameters.iter()
                .map(|p| p.ty)
                .eq(types.iter().copied()))
    }
}

/// A single signature of a function.
#[derive(Clone, Debug)]
pub struct Signature<'c> {
    pub return_type: TypeRef<'c>,
    pub parameters: Vec<VarRef<'c>>,
    pub body: Vec<Instruction<'c>>,
    /// Whether a body has been provided; a signature without one is a
    /// prototype.
    pub is_defined: bool,
}

impl<'c> Signature<'c> {
    /// Construct a prototype.
    pub fn new(return_type: TypeRef<'c>, parameters: Vec<VarRef<'c>>) -> Self {
        Self { return_type, parameters, body: Vec::new(), is_defined: false }
    }
}

/// A value-producing node.
#[derive(Clone, Debug)]
pub enum Rvalue<'c> {
    Expression(Box<Expression<'c>>),
    Swizzle(Box<Swizzle<'c>>),
    Dereference(Dereference<'c>),
    Constant(Box<Constant<'c>>),
    Call(Box<Call<'c>>),
    Texture(Box<Texture<'c>>),
}

impl<'c> Rvalue<'c> {
    /// The type of the value produced.
    pub fn ty(&self) -> TypeRef<'c> {
        match self {
            Self::Expression(x) => x.ty,
            Self::Swizzle(x) => x.ty,
            Self::Dereference(x) => x.ty(),
            Self::Constant(x) => x.ty,
            Self::Call(x) => x.ty,
            Self::Texture(x) => x.ty,
        }
    }
}

impl<'c> From<Expression<'c>> for Rvalue<'c> {
    fn from(value: Expression<'c>) -> Self {
        Self::Expression(Box::new(value))
    }
}

impl<'c> From<Swizzle<'c>> for Rvalue<'c> {
    fn from(value: Swizzle<'c>) -> Self {
        Self::Swizzle(Box::new(value))
    }
}

impl<'c> From<Dereference<'c>> for Rvalue<'c> {
    fn from(value: Dereference<'c>) -> Self {
        Self::Dereference(value)
    }
}

impl<'c> From<Constant<'c>> for Rvalue<'c> {
    fn from(value: Constant<'c>) -> Self {
        Self::Constant(Box::new(value))
    }
}

impl<'c> From<Call<'c>> for Rvalue<'c> {
    fn from(value: Call<'c>) -> Self {
        Self::Call(Box::new(value))
    }
}

impl<'c> From<Texture<'c>> for Rvalue<'c> {
    fn from(value: Texture<'c>) -> Self {
        Self::Texture(Box::new(value))
    }
}

/// An operator applied to one or two operands.
#[derive(Clone, Debug)]
pub struct Expression<'c> {
    pub op: Operator,
    pub ty: TypeRef<'c>,
    pub operands: Vec<Rvalue<'c>>,
}

impl<'c> Expression<'c> {
    /// Construct an expression, checking the operand count.
    pub fn new(
        op: Operator,
        ty: TypeRef<'c>,
        operands: Vec<Rvalue<'c>>,
    ) -> Result<Self> {
        if operands.len() != op.arity() {
            return Err(Error::OperandCount {
                op,
                expected: op.arity(),
                found: operands.len(),
            });
        }

        Ok(Self { op, ty, operands })
    }
}

/// The components selected by a swizzle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SwizzleMask {
    components: [u8; 4],
    len: u8,
}

impl SwizzleMask {
    /// The component letters, in component order.
    pub const LETTERS: [char; 4] = ['x', 'y', 'z', 'w'];

    /// Parse a mask of one to four letters from `xyzw`.
    pub fn parse(mask: &str) -> Result<Self> {
        let invalid = || Error::InvalidSwizzle(mask.to_owned());
        let mut components = [0; 4];
        let mut len = 0;
        for c in mask.chars() {
            let index = Self::LETTERS.iter().position(|&l| l == c)
                .ok_or_else(invalid)?;
            let slot = components.get_mut(len).ok_or_else(invalid)?;
            *slot = index as u8;
            len += 1;
        }

        if len == 0 {
            return Err(invalid());
        }

        Ok(Self { components, len: len as u8 })
    }

    /// The selected component indices.
    pub fn components(&self) -> &[u8] {
        &self.components[.. usize::from(self.len)]
    }

    pub fn len(&self) -> u32 {
        u32::from(self.len)
    }

    /// Whether this selects exactly the first component.
    pub fn is_identity_scalar(&self) -> bool {
        self.components() == [0]
    }
}

impl fmt::Display for SwizzleMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.components().iter()
            .try_for_each(|&c| fmt::Write::write_char(f, Self::LETTERS[usize::from(c)]))
    }
}

/// A selection of components from a scalar or vector.
#[derive(Clone, Debug)]
pub struct Swizzle<'c> {
    pub value: Rvalue<'c>,
    pub mask: SwizzleMask,
    pub ty: TypeRef<'c>,
}

impl<'c> Swizzle<'c> {
    /// Construct a swizzle, checking each component against the value.
    pub fn new(value: Rvalue<'c>, mask: SwizzleMask) -> Result<Self> {
        let vty = value.ty();
        if !vty.is_scalar() && !vty.is_vector() {
            return Err(Error::NotSwizzlable(vty.to_string()));
        }

        if let Some(&c) = mask.components().iter()
            .find(|&&c| u32::from(c) >= vty.rows()) {
            return Err(Error::SwizzleRange {
                component: SwizzleMask::LETTERS[usize::from(c)],
                ty: vty.to_string(),
            });
        }

        let ty = tys::get_instance(vty.base_type, mask.len(), 1);
        Ok(Self { value, mask, ty })
    }
}

/// A reference to a storage location.
#[derive(Clone, Debug)]
pub enum Dereference<'c> {
    /// A whole variable.
    Variable(VarRef<'c>),

    /// An element of an array, or a column of a matrix, or a component of a
    /// vector.
    Array {
        array: Box<Rvalue<'c>>,
        index: Box<Rvalue<'c>>,
        ty: TypeRef<'c>,
    },

    /// A field of a struct.
    Record {
        record: Box<Rvalue<'c>>,
        field: &'c str,
        ty: TypeRef<'c>,
    },
}

impl<'c> Dereference<'c> {
    /// Reference a whole variable.
    pub fn variable(var: VarRef<'c>) -> Result<Self> {
        if var.ty.is_void() || var.ty.is_function() {
            return Err(Error::NotDereferenceable(var.ty.to_string()));
        }

        Ok(Self::Variable(var))
    }

    /// Index into an array, matrix or vector.
    pub fn array(array: Rvalue<'c>, index: Rvalue<'c>) -> Result<Self> {
        let aty = array.ty();
        let ty = if let Some(element) = aty.element_type() {
            element
        } else if aty.is_matrix() {
            aty.column_type()
        } else if aty.is_vector() {
            aty.scalar_type()
        } else {
            return Err(Error::NotIndexable(aty.to_string()));
        };

        let ity = index.ty();
        if !ity.is_scalar() || !ity.is_integer() {
            return Err(Error::BadIndex(ity.to_string()));
        }

        Ok(Self::Array { array: Box::new(array), index: Box::new(index), ty })
    }

    /// Select a field of a struct.
    pub fn record(record: Rvalue<'c>, field: &'c str) -> Result<Self> {
        let rty = record.ty();
        let ty = rty.field_type(field).ok_or_else(|| Error::NoSuchField {
            ty: rty.to_string(),
            field: field.to_owned(),
        })?;

        Ok(Self::Record { record: Box::new(record), field, ty })
    }

    /// The type of the referenced location.
    pub fn ty(&self) -> TypeRef<'c> {
        match self {
            Self::Variable(var) => var.get().ty,
            Self::Array { ty, .. } | Self::Record { ty, .. } => *ty,
        }
    }

    /// The variable ultimately referenced, if the chain ends in one.
    pub fn root_variable(&self) -> Option<VarRef<'c>> {
        match self {
            Self::Variable(var) => Some(*var),
            Self::Array { array: base, .. } | Self::Record { record: base, .. } =>
                match &**base {
                    Rvalue::Dereference(d) => d.root_variable(),
                    _ => None,
                },
        }
    }
}

/// A compile-time constant.
#[derive(Clone, Debug, PartialEq)]
pub struct Constant<'c> {
    pub ty: TypeRef<'c>,
    pub value: ConstantValue<'c>,
}

/// The components of a constant, by base type.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstantValue<'c> {
    Float([f32; 16]),
    Int([i32; 16]),
    Uint([u32; 16]),
    Bool([bool; 16]),
    /// One constant per array element.
    Array(Vec<Constant<'c>>),
}

impl<'c> Constant<'c> {
    /// The most components a constant can hold.
    pub const MAX_COMPONENTS: usize = 16;

    pub fn float(ty: TypeRef<'c>, values: &[f32]) -> Result<Self> {
        let data = fill(ty, BaseType::Float, values)?;
        Ok(Self { ty, value: ConstantValue::Float(data) })
    }

    pub fn int(ty: TypeRef<'c>, values: &[i32]) -> Result<Self> {
        let data = fill(ty, BaseType::Int, values)?;
        Ok(Self { ty, value: ConstantValue::Int(data) })
    }

    pub fn uint(ty: TypeRef<'c>, values: &[u32]) -> Result<Self> {
        let data = fill(ty, BaseType::Uint, values)?;
        Ok(Self { ty, value: ConstantValue::Uint(data) })
    }

    pub fn bool(ty: TypeRef<'c>, values: &[bool]) -> Result<Self> {
        let data = fill(ty, BaseType::Bool, values)?;
        Ok(Self { ty, value: ConstantValue::Bool(data) })
    }

    /// Construct an array constant from exactly one constant per element.
    pub fn array(ty: TypeRef<'c>, elements: Vec<Constant<'c>>) -> Result<Self> {
        let shape_error = || Error::ConstantShape {
            ty: ty.to_string(),
            found: elements.len(),
        };

        let element = ty.element_type().ok_or_else(shape_error)?;
        if elements.len() != ty.length as usize
        || elements.iter().any(|e| e.ty != element) {
            return Err(shape_error());
        }

        Ok(Self { ty, value: ConstantValue::Array(elements) })
    }

    /// The scalar components of a non-array constant.
    pub fn components(&self) -> impl Iterator<Item = Scalar> + '_ {
        let n = self.ty.components() as usize;
        (0 .. n).filter_map(move |i| match &self.value {
            ConstantValue::Float(v) => Some(Scalar::Float(v[i])),
            ConstantValue::Int(v) => Some(Scalar::Int(v[i])),
            ConstantValue::Uint(v) => Some(Scalar::Uint(v[i])),
            ConstantValue::Bool(v) => Some(Scalar::Bool(v[i])),
            ConstantValue::Array(_) => None,
        })
    }
}

/// A single component of a constant.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Scalar {
    Float(f32),
    Int(i32),
    Uint(u32),
    Bool(bool),
}

/// Fill a 16-component buffer from the given values, zero-extending.
fn fill<T: Copy + Default>(
    ty: TypeRef<'_>,
    base: BaseType,
    values: &[T],
) -> Result<[T; 16]> {
    if ty.base_type != base
    || !ty.base_type.is_shaped()
    || values.len() > ty.components() as usize {
        return Err(Error::ConstantShape {
            ty: ty.to_string(),
            found: values.len(),
        });
    }

    let mut data = [T::default(); 16];
    data[.. values.len()].copy_from_slice(values);
    Ok(data)
}

/// A call to a function.
#[derive(Clone, Debug)]
pub struct Call<'c> {
    pub callee: &'c str,
    /// The index of the called signature within the callee.
    pub signature: usize,
    pub ty: TypeRef<'c>,
    pub args: Vec<Rvalue<'c>>,
}

/// A texture lookup through a sampler.
#[derive(Clone, Debug)]
pub struct Texture<'c> {
    pub op: TextureOp<'c>,
    /// The type of the texel produced: `float` for shadow samplers, or a
    /// four-component vector of the sampled base type.
    pub ty: TypeRef<'c>,
    pub sampler: Dereference<'c>,
    pub coordinate: Rvalue<'c>,
    /// Constant texel offsets.
    pub offsets: [i8; 3],
    /// The value the coordinate is divided by, for projective lookups.
    pub projector: Option<Rvalue<'c>>,
    /// The depth reference compared against, for shadow lookups.
    pub shadow_comparator: Option<Rvalue<'c>>,
}

/// The kind of a texture lookup, with its level-of-detail operands.
#[derive(Clone, Debug)]
pub enum TextureOp<'c> {
    /// An implicit level of detail.
    Tex,
    /// An implicit level of detail, biased.
    Txb { bias: Rvalue<'c> },
    /// An explicit level of detail.
    Txl { lod: Rvalue<'c> },
    /// Explicit derivatives of the coordinate.
    Txd { dpdx: Rvalue<'c>, dpdy: Rvalue<'c> },
    /// A single texel, by integer coordinate and level.
    Txf { lod: Rvalue<'c> },
}

impl<'c> TextureOp<'c> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tex => "tex",
            Self::Txb { .. } => "txb",
            Self::Txl { .. } => "txl",
            Self::Txd { .. } => "txd",
            Self::Txf { .. } => "txf",
        }
    }
}

impl<'c> Texture<'c> {
    /// Construct a lookup with no offsets, projector or comparator.
    ///
    /// The result type follows from the sampler.
    pub fn new(
        op: TextureOp<'c>,
        sampler: Dereference<'c>,
        coordinate: Rvalue<'c>,
    ) -> Result<Self> {
        let sty = sampler.ty();
        let properties = sty.sampler
            .ok_or_else(|| Error::NotSampler(sty.to_string()))?;
        let ty = if properties.shadow {
            &FLOAT
        } else {
            tys::get_instance(properties.result, 4, 1)
        };

        Ok(Self {
            op,
            ty,
            sampler,
            coordinate,
            offsets: [0; 3],
            projector: None,
            shadow_comparator: None,
        })
    }
}

/// An assignment to (some components of) a storage location.
#[derive(Clone, Debug)]
pub struct Assignment<'c> {
    /// The assignment only happens when this evaluates to true.
    pub condition: Option<Rvalue<'c>>,
    pub lhs: Dereference<'c>,
    pub rhs: Rvalue<'c>,
    /// Bit `i` is set iff component `i` of the lhs is written.
    pub write_mask: u8,
}

impl<'c> Assignment<'c> {
    /// Construct an assignment writing every component of the lhs.
    pub fn new(
        lhs: Dereference<'c>,
        rhs: Rvalue<'c>,
        condition: Option<Rvalue<'c>>,
    ) -> Self {
        let write_mask = Self::full_mask(lhs.ty());
        Self { condition, lhs, rhs, write_mask }
    }

    /// Restrict the written components to those named in `mask`.
    ///
    /// An empty mask keeps the full mask of the lhs.
    pub fn with_write_mask(mut self, mask: &str) -> Result<Self> {
        if mask.is_empty() {
            return Ok(self);
        }

        let invalid = || Error::InvalidWriteMask(mask.to_owned());
        let ty = self.lhs.ty();
        if mask.len() > 4 || !(ty.is_scalar() || ty.is_vector()) {
            return Err(invalid());
        }

        let mut bits = 0u8;
        for c in mask.chars() {
            let index = SwizzleMask::LETTERS.iter().position(|&l| l == c)
                .filter(|&i| (i as u32) < ty.rows())
                .ok_or_else(invalid)?;
            bits |= 1 << index;
        }

        self.write_mask = bits;
        Ok(self)
    }

    /// The mask writing every component of a value of the given type.
    pub fn full_mask(ty: TypeRef<'_>) -> u8 {
        if ty.is_scalar() || ty.is_vector() {
            (1u8 << ty.rows()) - 1
        } else {
            0
        }
    }

    /// The written components, as letters from `xyzw`.
    pub fn write_mask_letters(&self) -> String {
        SwizzleMask::LETTERS.iter()
            .enumerate()
            .filter(|&(i, _)| self.write_mask & (1 << i) != 0)
            .map(|(_, &c)| c)
            .collect()
    }
}

/// A return from the enclosing function.
#[derive(Clone, Debug)]
pub struct Return<'c> {
    pub value: Option<Rvalue<'c>>,
}

/// A conditional.
#[derive(Clone, Debug)]
pub struct If<'c> {
    pub condition: Rvalue<'c>,
    pub then_instructions: Vec<Instruction<'c>>,
    pub else_instructions: Vec<Instruction<'c>>,
}

/// A loop.
///
/// The loop controls are either all absent (the body repeats until a jump
/// leaves it) or describe a canonical counted loop: `counter` starts at
/// `from`, is advanced by `increment` after each iteration, and the loop
/// terminates once `counter <cmp> to` holds.
#[derive(Clone, Debug)]
pub struct Loop<'c> {
    pub id: LoopId,
    pub counter: Option<VarRef<'c>>,
    pub from: Option<Rvalue<'c>>,
    pub to: Option<Rvalue<'c>>,
    pub increment: Option<Rvalue<'c>>,
    /// The terminating comparison; present whenever `to` is.
    pub cmp: Option<Operator>,
    pub body: Vec<Instruction<'c>>,
}

impl<'c> Loop<'c> {
    /// Construct a loop without controls.
    pub fn new(id: LoopId, body: Vec<Instruction<'c>>) -> Self {
        Self {
            id,
            counter: None,
            from: None,
            to: None,
            increment: None,
            cmp: None,
            body,
        }
    }

    /// Set the terminating condition.
    pub fn with_terminator(mut self, cmp: Operator, to: Rvalue<'c>) -> Result<Self> {
        if !cmp.is_comparison() {
            return Err(Error::NotComparison(cmp));
        }

        self.cmp = Some(cmp);
        self.to = Some(to);
        Ok(self)
    }

    /// Whether every loop control is present.
    pub fn is_canonical(&self) -> bool {
        self.counter.is_some()
            && self.from.is_some()
            && self.to.is_some()
            && self.increment.is_some()
            && self.cmp.is_some()
    }

    /// Whether every loop control is absent.
    pub fn is_bare(&self) -> bool {
        self.counter.is_none()
            && self.from.is_none()
            && self.to.is_none()
            && self.increment.is_none()
    }
}

/// A `break` or `continue`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LoopJump {
    pub mode: JumpMode,
    /// The innermost loop enclosing the jump.
    pub target: LoopId,
}

impl LoopJump {
    /// Construct a jump out of the innermost enclosing loop, if there is one.
    pub fn new(mode: JumpMode, enclosing: Option<LoopId>) -> Result<Self> {
        let target = enclosing.ok_or(Error::NoEnclosingLoop(mode))?;
        Ok(Self { mode, target })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum JumpMode {
    Break,
    Continue,
}

impl JumpMode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Break => "break",
            Self::Continue => "continue",
        }
    }
}

impl fmt::Display for JumpMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::Storage;
    use crate::tys::builtin::*;

    use super::*;

    #[test]
    fn swizzle_masks_are_validated() {
        assert!(SwizzleMask::parse("xyzw").is_ok());
        assert!(SwizzleMask::parse("wzyx").is_ok());
        assert!(matches!(SwizzleMask::parse("xyzwx"), Err(Error::InvalidSwizzle(_))));
        assert!(matches!(SwizzleMask::parse("xq"), Err(Error::InvalidSwizzle(_))));
        assert!(matches!(SwizzleMask::parse(""), Err(Error::InvalidSwizzle(_))));
        assert_eq!(SwizzleMask::parse("zyx").unwrap().to_string(), "zyx");
    }

    #[test]
    fn swizzles_check_their_value() {
        let storage = Storage::new();
        let v = storage.variable(Variable::new(storage.intern("v"), &VEC2));
        let m = storage.variable(Variable::new(storage.intern("m"), &MAT2));
        let v = || Rvalue::from(Dereference::variable(v).unwrap());

        let s = Swizzle::new(v(), SwizzleMask::parse("yxy").unwrap()).unwrap();
        assert!(ptr_eq(s.ty, &VEC3));

        let err = Swizzle::new(v(), SwizzleMask::parse("xz").unwrap());
        assert!(matches!(err, Err(Error::SwizzleRange { component: 'z', .. })));

        let m = Rvalue::from(Dereference::variable(m).unwrap());
        let err = Swizzle::new(m, SwizzleMask::parse("x").unwrap());
        assert!(matches!(err, Err(Error::NotSwizzlable(_))));
    }

    #[test]
    fn dereferences_check_their_subject() {
        let storage = Storage::new();
        let f = storage.variable(Variable::new(storage.intern("f"), &VOID));
        assert!(matches!(Dereference::variable(f), Err(Error::NotDereferenceable(_))));

        let ty = storage.get_array_instance(&VEC4, 3);
        let a = storage.variable(Variable::new(storage.intern("a"), ty));
        let a = Rvalue::from(Dereference::variable(a).unwrap());
        let i = Rvalue::from(Constant::int(&INT, &[1]).unwrap());
        let elem = Dereference::array(a.clone(), i).unwrap();
        assert!(ptr_eq(elem.ty(), &VEC4));

        let x = Rvalue::from(Constant::float(&FLOAT, &[1.0]).unwrap());
        assert!(matches!(Dereference::array(a, x.clone()), Err(Error::BadIndex(_))));
        assert!(matches!(Dereference::record(x, "y"), Err(Error::NoSuchField { .. })));
    }

    #[test]
    fn expressions_check_arity() {
        let one = || Rvalue::from(Constant::float(&FLOAT, &[1.0]).unwrap());
        assert!(Expression::new(Operator::Add, &FLOAT, vec![one(), one()]).is_ok());
        assert!(matches!(
            Expression::new(Operator::Add, &FLOAT, vec![one()]),
            Err(Error::OperandCount { expected: 2, found: 1, .. })));
        assert!(Expression::new(Operator::Neg, &FLOAT, vec![one(), one()]).is_err());
    }

    #[test]
    fn constants_are_bounded_by_their_type() {
        let c = Constant::float(&VEC3, &[1.0]).unwrap();
        let values: Vec<_> = c.components().collect();
        assert_eq!(values, [Scalar::Float(1.0), Scalar::Float(0.0), Scalar::Float(0.0)]);

        assert!(Constant::float(&VEC2, &[1.0, 2.0, 3.0]).is_err());
        assert!(Constant::int(&FLOAT, &[1]).is_err());
        assert!(Constant::float(&MAT4, &[0.0; 16]).is_ok());
    }

    #[test]
    fn constants_compare_by_value() {
        let storage = Storage::new();
        let ty = storage.get_array_instance(&VEC2, 2);
        let pair = |y| Constant::array(ty, vec![
            Constant::float(&VEC2, &[1.0, 2.0]).unwrap(),
            Constant::float(&VEC2, &[3.0, y]).unwrap(),
        ]).unwrap();

        assert_eq!(pair(4.0), pair(4.0));
        assert_ne!(pair(4.0), pair(5.0));
        assert_ne!(Constant::int(&INT, &[1]).unwrap(), Constant::uint(&UINT, &[1]).unwrap());
    }

    #[test]
    fn textures_need_a_sampler() {
        let storage = Storage::new();
        let s = storage.variable(Variable::new(storage.intern("s"), &SAMPLER2D));
        let uv = storage.variable(Variable::new(storage.intern("uv"), &VEC2));
        let coordinate = || Rvalue::from(Dereference::variable(uv).unwrap());

        let t = Texture::new(TextureOp::Tex, Dereference::variable(s).unwrap(), coordinate())
            .unwrap();
        assert!(ptr_eq(Rvalue::from(t).ty(), &VEC4));

        let err = Texture::new(TextureOp::Tex, Dereference::variable(uv).unwrap(), coordinate());
        assert!(matches!(err, Err(Error::NotSampler(_))));
    }

    #[test]
    fn write_masks_are_derived_and_checked() {
        let storage = Storage::new();
        let v = storage.variable(Variable::new(storage.intern("v"), &VEC3));
        let lhs = || Dereference::variable(v).unwrap();
        let rhs = || Rvalue::from(Constant::float(&VEC3, &[]).unwrap());

        let full = Assignment::new(lhs(), rhs(), None);
        assert_eq!(full.write_mask, 0b111);
        assert_eq!(full.write_mask_letters(), "xyz");

        let part = Assignment::new(lhs(), rhs(), None).with_write_mask("zx").unwrap();
        assert_eq!(part.write_mask_letters(), "xz");

        assert!(Assignment::new(lhs(), rhs(), None).with_write_mask("w").is_err());
        assert!(Assignment::new(lhs(), rhs(), None).with_write_mask("xyzwx").is_err());
    }

    #[test]
    fn jumps_need_a_loop() {
        let storage = Storage::new();
        assert!(matches!(
            LoopJump::new(JumpMode::Break, None),
            Err(Error::NoEnclosingLoop(JumpMode::Break))));

        let id = storage.loop_id();
        let jump = LoopJump::new(JumpMode::Continue, Some(id)).unwrap();
        assert_eq!(jump.target, id);
    }

    fn ptr_eq(a: TypeRef<'_>, b: TypeRef<'_>) -> bool {
        core::ptr::eq(a, b)
    }
}
