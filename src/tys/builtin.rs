//! Built-in type singletons.
//!
//! Every built-in type exists exactly once for the whole process, so two
//! requests for the same shape always return the same reference.

use super::*;

macro_rules! def_shaped {
    ($($id:ident = $name:literal: $base:ident, $rows:literal, $cols:literal;)*) => {
        $(
            pub static $id: Type<'static> =
                Type::shaped($name, BaseType::$base, $rows, $cols);
        )*

        /// Every built-in scalar, vector, matrix and special type.
        pub static SHAPED: &[&Type<'static>] = &[$(&$id),*];
    };
}

macro_rules! def_samplers {
    ($($id:ident = $name:literal: $dim:ident, $shadow:literal, $array:literal, $result:ident;)*) => {
        $(
            pub static $id: Type<'static> = Type::sampler($name, Sampler {
                dim: SamplerDim::$dim,
                shadow: $shadow,
                array: $array,
                result: BaseType::$result,
            });
        )*

        /// Every built-in sampler type.
        pub static SAMPLERS: &[&Type<'static>] = &[$(&$id),*];
    };
}

def_shaped! {
    VOID = "void": Void, 0, 0;
    ERROR = "error": Error, 0, 0;

    BOOL = "bool": Bool, 0, 0;
    BVEC2 = "bvec2": Bool, 2, 0;
    BVEC3 = "bvec3": Bool, 3, 0;
    BVEC4 = "bvec4": Bool, 4, 0;

    INT = "int": Int, 0, 0;
    IVEC2 = "ivec2": Int, 2, 0;
    IVEC3 = "ivec3": Int, 3, 0;
    IVEC4 = "ivec4": Int, 4, 0;

    UINT = "uint": Uint, 0, 0;
    UVEC2 = "uvec2": Uint, 2, 0;
    UVEC3 = "uvec3": Uint, 3, 0;
    UVEC4 = "uvec4": Uint, 4, 0;

    FLOAT = "float": Float, 0, 0;
    VEC2 = "vec2": Float, 2, 0;
    VEC3 = "vec3": Float, 3, 0;
    VEC4 = "vec4": Float, 4, 0;

    MAT2 = "mat2": Float, 2, 2;
    MAT2X3 = "mat2x3": Float, 3, 2;
    MAT2X4 = "mat2x4": Float, 4, 2;
    MAT3X2 = "mat3x2": Float, 2, 3;
    MAT3 = "mat3": Float, 3, 3;
    MAT3X4 = "mat3x4": Float, 4, 3;
    MAT4X2 = "mat4x2": Float, 2, 4;
    MAT4X3 = "mat4x3": Float, 3, 4;
    MAT4 = "mat4": Float, 4, 4;
}

def_samplers! {
    SAMPLER1D = "sampler1D": D1, false, false, Float;
    SAMPLER2D = "sampler2D": D2, false, false, Float;
    SAMPLER3D = "sampler3D": D3, false, false, Float;
    SAMPLERCUBE = "samplerCube": Cube, false, false, Float;
    SAMPLER2DRECT = "sampler2DRect": Rect, false, false, Float;
    SAMPLERBUFFER = "samplerBuffer": Buffer, false, false, Float;
    SAMPLER1DARRAY = "sampler1DArray": D1, false, true, Float;
    SAMPLER2DARRAY = "sampler2DArray": D2, false, true, Float;
    SAMPLER1DSHADOW = "sampler1DShadow": D1, true, false, Float;
    SAMPLER2DSHADOW = "sampler2DShadow": D2, true, false, Float;
    SAMPLERCUBESHADOW = "samplerCubeShadow": Cube, true, false, Float;
    SAMPLER2DRECTSHADOW = "sampler2DRectShadow": Rect, true, false, Float;
    SAMPLER1DARRAYSHADOW = "sampler1DArrayShadow": D1, true, true, Float;
    SAMPLER2DARRAYSHADOW = "sampler2DArrayShadow": D2, true, true, Float;

    ISAMPLER1D = "isampler1D": D1, false, false, Int;
    ISAMPLER2D = "isampler2D": D2, false, false, Int;
    ISAMPLER3D = "isampler3D": D3, false, false, Int;
    ISAMPLERCUBE = "isamplerCube": Cube, false, false, Int;
    ISAMPLER2DRECT = "isampler2DRect": Rect, false, false, Int;
    ISAMPLERBUFFER = "isamplerBuffer": Buffer, false, false, Int;
    ISAMPLER1DARRAY = "isampler1DArray": D1, false, true, Int;
    ISAMPLER2DARRAY = "isampler2DArray": D2, false, true, Int;

    USAMPLER1D = "usampler1D": D1, false, false, Uint;
    USAMPLER2D = "usampler2D": D2, false, false, Uint;
    USAMPLER3D = "usampler3D": D3, false, false, Uint;
    USAMPLERCUBE = "usamplerCube": Cube, false, false, Uint;
    USAMPLER2DRECT = "usampler2DRect": Rect, false, false, Uint;
    USAMPLERBUFFER = "usamplerBuffer": Buffer, false, false, Uint;
    USAMPLER1DARRAY = "usampler1DArray": D1, false, true, Uint;
    USAMPLER2DARRAY = "usampler2DArray": D2, false, true, Uint;
}

/// Get the built-in scalar, vector or matrix type of the given shape.
///
/// `rows` is the number of vector elements and `columns` the number of matrix
/// columns; 1 means the dimension is absent.  Shapes that do not exist in the
/// language (integer or boolean matrices, single-row matrices) yield the error
/// type.
///
/// # Panics
///
/// Panics if `rows` or `columns` is outside `1 ..= 4`.
pub fn get_instance(
    base: BaseType,
    rows: u32,
    columns: u32,
) -> &'static Type<'static> {
    assert!((1 ..= 4).contains(&rows), "invalid vector size {}", rows);
    assert!((1 ..= 4).contains(&columns), "invalid matrix size {}", columns);

    if columns == 1 {
        return match (base, rows) {
            (BaseType::Bool, 1) => &BOOL,
            (BaseType::Bool, 2) => &BVEC2,
            (BaseType::Bool, 3) => &BVEC3,
            (BaseType::Bool, 4) => &BVEC4,
            (BaseType::Int, 1) => &INT,
            (BaseType::Int, 2) => &IVEC2,
            (BaseType::Int, 3) => &IVEC3,
            (BaseType::Int, 4) => &IVEC4,
            (BaseType::Uint, 1) => &UINT,
            (BaseType::Uint, 2) => &UVEC2,
            (BaseType::Uint, 3) => &UVEC3,
            (BaseType::Uint, 4) => &UVEC4,
            (BaseType::Float, 1) => &FLOAT,
            (BaseType::Float, 2) => &VEC2,
            (BaseType::Float, 3) => &VEC3,
            (BaseType::Float, 4) => &VEC4,
            _ => &ERROR,
        };
    }

    if base != BaseType::Float {
        return &ERROR;
    }

    match (columns, rows) {
        (2, 2) => &MAT2,
        (2, 3) => &MAT2X3,
        (2, 4) => &MAT2X4,
        (3, 2) => &MAT3X2,
        (3, 3) => &MAT3,
        (3, 4) => &MAT3X4,
        (4, 2) => &MAT4X2,
        (4, 3) => &MAT4X3,
        (4, 4) => &MAT4,
        _ => &ERROR,
    }
}

/// Get the built-in sampler type with the given properties, if one exists.
pub fn sampler_instance(sampler: Sampler) -> Option<&'static Type<'static>> {
    SAMPLERS.iter()
        .copied()
        .find(|t| t.sampler == Some(sampler))
}

/// Every named built-in type.
pub fn all() -> impl Iterator<Item = &'static Type<'static>> {
    SHAPED.iter().chain(SAMPLERS.iter()).copied()
}
