//! Types of shading-language values.
//!
//! Built-in scalar, vector, matrix and sampler types are process-wide
//! singletons (see [`builtin`]); comparing two [`Type`]s compares identity.
//! Array, struct and function types are allocated in a compilation unit's
//! [`Storage`](crate::storage::Storage) and live as long as it does.

use core::hash::{Hash, Hasher};
use core::ptr;

pub mod builtin;
pub use builtin::{get_instance, sampler_instance};

mod fmt;

/// A reference to a type.
pub type TypeRef<'c> = &'c Type<'c>;

/// The fundamental kind of a type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BaseType {
    Uint,
    Int,
    Float,
    Bool,
    Sampler,
    Struct,
    Array,
    Function,
    Void,
    Error,
}

impl BaseType {
    /// Whether this is `uint`, `int` or `float`.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Uint | Self::Int | Self::Float)
    }

    /// Whether values of this kind have scalar, vector or matrix shape.
    pub fn is_shaped(self) -> bool {
        self.is_numeric() || self == Self::Bool
    }
}

/// The dimensionality of a sampler.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SamplerDim {
    D1,
    D2,
    D3,
    Cube,
    Rect,
    Buffer,
}

/// The properties of a sampler type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Sampler {
    /// The dimensionality of the sampled texture.
    pub dim: SamplerDim,
    /// Whether this is a shadow (depth-comparison) sampler.
    pub shadow: bool,
    /// Whether this samples an array texture.
    pub array: bool,
    /// The type of sampled texels; one of `uint`, `int` or `float`.
    pub result: BaseType,
}

/// A shading-language type.
#[derive(Debug)]
pub struct Type<'c> {
    /// The fundamental kind of the type.
    pub base_type: BaseType,

    /// The number of rows; 0 for scalars and non-numeric types.
    pub vector_elements: u8,

    /// The number of columns; 0 for everything but matrices.
    pub matrix_columns: u8,

    /// Sampler properties, for sampler types.
    pub sampler: Option<Sampler>,

    /// The display name, absent for anonymous types.
    pub name: Option<&'c str>,

    /// Array element count, struct field count or function parameter count.
    pub length: u32,

    /// The composite payload.
    pub fields: Fields<'c>,
}

/// The composite payload of a type.
#[derive(Debug)]
pub enum Fields<'c> {
    /// Scalars, vectors, matrices, samplers, `void` and the error type.
    None,

    /// The element type of an array.
    Array(TypeRef<'c>),

    /// The return type followed by every parameter type.
    Function(Vec<TypeRef<'c>>),

    /// The ordered fields of a struct.
    Struct(Vec<StructField<'c>>),
}

/// A field of a struct type.
#[derive(Copy, Clone, Debug)]
pub struct StructField<'c> {
    /// The field's type.
    pub ty: TypeRef<'c>,
    /// The field's name.
    pub name: &'c str,
}

impl<'c> Type<'c> {
    /// Construct a built-in scalar, vector or matrix type.
    pub(crate) const fn shaped(
        name: &'c str,
        base_type: BaseType,
        vector_elements: u8,
        matrix_columns: u8,
    ) -> Self {
        Self {
            base_type,
            vector_elements,
            matrix_columns,
            sampler: None,
            name: Some(name),
            length: 0,
            fields: Fields::None,
        }
    }

    /// Construct a built-in sampler type.
    pub(crate) const fn sampler(name: &'c str, sampler: Sampler) -> Self {
        Self {
            base_type: BaseType::Sampler,
            vector_elements: 0,
            matrix_columns: 0,
            sampler: Some(sampler),
            name: Some(name),
            length: 0,
            fields: Fields::None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.base_type.is_shaped()
            && self.vector_elements == 0
            && self.matrix_columns == 0
    }

    pub fn is_vector(&self) -> bool {
        self.base_type.is_shaped()
            && self.vector_elements > 0
            && self.matrix_columns == 0
    }

    pub fn is_matrix(&self) -> bool {
        self.base_type == BaseType::Float && self.matrix_columns > 0
    }

    pub fn is_numeric(&self) -> bool {
        self.base_type.is_numeric()
    }

    /// Whether this is `int` or `uint` (of any shape).
    pub fn is_integer(&self) -> bool {
        matches!(self.base_type, BaseType::Int | BaseType::Uint)
    }

    pub fn is_boolean(&self) -> bool {
        self.base_type == BaseType::Bool
    }

    pub fn is_sampler(&self) -> bool {
        self.base_type == BaseType::Sampler
    }

    pub fn is_array(&self) -> bool {
        self.base_type == BaseType::Array
    }

    pub fn is_struct(&self) -> bool {
        self.base_type == BaseType::Struct
    }

    pub fn is_function(&self) -> bool {
        self.base_type == BaseType::Function
    }

    pub fn is_void(&self) -> bool {
        self.base_type == BaseType::Void
    }

    pub fn is_error(&self) -> bool {
        self.base_type == BaseType::Error
    }

    /// The number of rows of a scalar, vector or matrix (1 for scalars).
    pub fn rows(&self) -> u32 {
        if self.base_type.is_shaped() {
            u32::from(self.vector_elements.max(1))
        } else {
            0
        }
    }

    /// The number of columns of a scalar, vector or matrix (1 for non-matrices).
    pub fn columns(&self) -> u32 {
        if self.base_type.is_shaped() {
            u32::from(self.matrix_columns.max(1))
        } else {
            0
        }
    }

    /// The number of scalar components in a value of this type.
    ///
    /// This is 0 for anything other than scalars, vectors and matrices.
    pub fn components(&self) -> u32 {
        self.rows() * self.columns()
    }

    /// The vector type of a single row of a matrix.
    ///
    /// The error type is returned for non-matrices.
    pub fn row_type(&self) -> TypeRef<'static> {
        if self.is_matrix() {
            get_instance(self.base_type, self.columns(), 1)
        } else {
            &builtin::ERROR
        }
    }

    /// The vector type of a single column of a matrix.
    ///
    /// The error type is returned for non-matrices.
    pub fn column_type(&self) -> TypeRef<'static> {
        if self.is_matrix() {
            get_instance(self.base_type, self.rows(), 1)
        } else {
            &builtin::ERROR
        }
    }

    /// The scalar type underlying a scalar, vector or matrix.
    ///
    /// The error type is returned for other types.
    pub fn scalar_type(&self) -> TypeRef<'static> {
        if self.base_type.is_shaped() {
            get_instance(self.base_type, 1, 1)
        } else {
            &builtin::ERROR
        }
    }

    /// The element type of an array.
    pub fn element_type(&self) -> Option<TypeRef<'c>> {
        match self.fields {
            Fields::Array(element) => Some(element),
            _ => None,
        }
    }

    /// The type of a struct field.
    pub fn field_type(&self, name: &str) -> Option<TypeRef<'c>> {
        match &self.fields {
            Fields::Struct(fields) => fields.iter()
                .find(|f| f.name == name)
                .map(|f| f.ty),
            _ => None,
        }
    }

    /// The fields of a struct.
    pub fn struct_fields(&self) -> &[StructField<'c>] {
        match &self.fields {
            Fields::Struct(fields) => fields,
            _ => &[],
        }
    }

    /// The return type of a function type.
    pub fn return_type(&self) -> Option<TypeRef<'c>> {
        match &self.fields {
            Fields::Function(types) => types.first().copied(),
            _ => None,
        }
    }

    /// The parameter types of a function type.
    pub fn parameter_types(&self) -> &[TypeRef<'c>] {
        match &self.fields {
            Fields::Function(types) => &types[1..],
            _ => &[],
        }
    }
}

/// Types compare by identity.
impl<'c> PartialEq for Type<'c> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

impl<'c> Eq for Type<'c> {}

impl<'c> Hash for Type<'c> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        ptr::hash(self, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::builtin::*;

    const BASES: [BaseType; 4] =
        [BaseType::Uint, BaseType::Int, BaseType::Float, BaseType::Bool];

    #[test]
    fn instances_are_singletons() {
        for base in BASES {
            for rows in 1 ..= 4 {
                for cols in 1 ..= 4 {
                    let a = get_instance(base, rows, cols);
                    let b = get_instance(base, rows, cols);
                    assert!(ptr::eq(a, b));
                }
            }
        }
    }

    #[test]
    fn shapes_are_classified() {
        assert!(FLOAT.is_scalar() && !FLOAT.is_vector());
        assert!(VEC3.is_vector() && !VEC3.is_matrix());
        assert!(MAT2X3.is_matrix() && !MAT2X3.is_vector());
        assert!(BVEC2.is_boolean() && !BVEC2.is_numeric());
        assert!(SAMPLER2D.is_sampler() && !SAMPLER2D.is_scalar());
        assert!(VOID.is_void() && ERROR.is_error());
        assert_eq!(MAT4.components(), 16);
        assert_eq!(IVEC3.components(), 3);
        assert_eq!(INT.components(), 1);
    }

    #[test]
    fn matrix_rows_and_columns() {
        for cols in 2 ..= 4 {
            for rows in 2 ..= 4 {
                let m = get_instance(BaseType::Float, rows, cols);
                assert!(m.is_matrix());
                assert_eq!(m.rows(), rows);
                assert_eq!(m.columns(), cols);
                assert!(ptr::eq(m.row_type(), get_instance(BaseType::Float, cols, 1)));
                assert!(ptr::eq(m.column_type(), get_instance(BaseType::Float, rows, 1)));
            }
        }

        assert!(VEC4.row_type().is_error());
        assert!(FLOAT.column_type().is_error());
    }

    #[test]
    fn integer_matrices_do_not_exist() {
        assert!(get_instance(BaseType::Int, 3, 3).is_error());
        assert!(get_instance(BaseType::Float, 1, 3).is_error());
    }

    #[test]
    #[should_panic]
    fn oversized_shapes_are_rejected() {
        get_instance(BaseType::Float, 5, 1);
    }
}
