//! An intermediate representation for shading languages.
//!
//! IR is read from an S-expression text format ([`ir::read`]), printed back
//! in that format ([`ir::print`]) or as shader source ([`ir::glsl`]), and
//! transformed by optimization passes ([`opt`]).  Everything allocated for a
//! compilation unit lives in its [`storage::Storage`].

pub mod util;
pub mod storage;

pub mod tys;
pub mod sexp;
pub mod ir;
pub mod opt;
