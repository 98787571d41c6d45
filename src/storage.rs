//! Storage for a compilation unit.
//!
//! A [`Storage`] owns everything the IR of one compilation unit refers to
//! without owning: interned names, array/struct/function types, and variables.
//! IR nodes borrow from it for `'c`, so it must outlive every node built
//! against it.  Separate compilation units use separate storages; the only
//! state they share is the immutable set of built-in types.

use core::cell::{Cell, RefCell};

use rustc_hash::FxHashMap;
use symbol_table::SymbolTable;

use crate::ir::{LoopId, VarRef, Variable};
use crate::tys::{BaseType, Fields, StructField, Type, TypeRef};
use crate::util::arena::Arena;

/// Storage for the IR of a compilation unit.
pub struct Storage<'c> {
    /// Interned names.
    names: SymbolTable,

    /// Array, struct and function types.
    types: typed_arena::Arena<Type<'c>>,

    /// Memoized array types, by element type address and length.
    ///
    /// Types never move once allocated, so their address is their identity.
    arrays: RefCell<FxHashMap<(usize, u32), TypeRef<'c>>>,

    /// Every declared variable.
    variables: Arena<Variable<'c>>,

    /// The ID of the next loop to be constructed.
    loops: Cell<u32>,
}

impl<'c> Storage<'c> {
    /// Construct a new, empty [`Storage`].
    pub fn new() -> Self {
        Self {
            names: SymbolTable::new(),
            types: typed_arena::Arena::new(),
            arrays: RefCell::default(),
            variables: Arena::new(),
            loops: Cell::new(0),
        }
    }

    /// Intern a name.
    pub fn intern(&'c self, name: &str) -> &'c str {
        let symbol = self.names.intern(name);
        self.names.resolve(symbol)
    }

    /// Get the array type with the given element type and length.
    ///
    /// Repeated requests for the same pair return the same type.
    pub fn get_array_instance(
        &'c self,
        element: TypeRef<'c>,
        length: u32,
    ) -> TypeRef<'c> {
        let key = (element as *const Type<'c> as usize, length);
        if let Some(ty) = self.arrays.borrow().get(&key).copied() {
            return ty;
        }

        let ty = &*self.types.alloc(Type {
            base_type: BaseType::Array,
            vector_elements: 0,
            matrix_columns: 0,
            sampler: None,
            name: None,
            length,
            fields: Fields::Array(element),
        });
        self.arrays.borrow_mut().insert(key, ty);
        ty
    }

    /// Construct a new struct type.
    ///
    /// Every call creates a distinct type, even for identical fields.
    pub fn struct_type<'a, I>(
        &'c self,
        name: Option<&str>,
        fields: I,
    ) -> TypeRef<'c>
    where I: IntoIterator<Item = (TypeRef<'c>, &'a str)> {
        let fields = fields.into_iter()
            .map(|(ty, name)| StructField { ty, name: self.intern(name) })
            .collect::<Vec<_>>();

        &*self.types.alloc(Type {
            base_type: BaseType::Struct,
            vector_elements: 0,
            matrix_columns: 0,
            sampler: None,
            name: name.map(|n| self.intern(n)),
            length: fields.len() as u32,
            fields: Fields::Struct(fields),
        })
    }

    /// Construct a new function type.
    pub fn function_type<I>(
        &'c self,
        return_type: TypeRef<'c>,
        parameters: I,
    ) -> TypeRef<'c>
    where I: IntoIterator<Item = TypeRef<'c>> {
        let types = core::iter::once(return_type)
            .chain(parameters)
            .collect::<Vec<_>>();

        &*self.types.alloc(Type {
            base_type: BaseType::Function,
            vector_elements: 0,
            matrix_columns: 0,
            sampler: None,
            name: None,
            length: types.len() as u32 - 1,
            fields: Fields::Function(types),
        })
    }

    /// Allocate a variable.
    pub fn variable(&'c self, variable: Variable<'c>) -> VarRef<'c> {
        self.variables.alloc(variable)
    }

    /// Issue the identity of a new loop.
    pub fn loop_id(&self) -> LoopId {
        let id = self.loops.get();
        self.loops.set(id + 1);
        LoopId(id)
    }
}

impl<'c> Default for Storage<'c> {
    fn default() -> Self {
        Self::new()
    }
}
