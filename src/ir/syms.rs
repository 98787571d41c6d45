//! Scoped name resolution.

use rustc_hash::FxHashMap;

use crate::tys::{builtin, TypeRef};

use super::VarRef;

/// A stack of lexical scopes binding type, variable and function names.
///
/// Lookups walk from the innermost scope outwards.  Each kind of name has
/// its own namespace.
#[derive(Debug, Default)]
pub struct SymbolTable<'c> {
    scopes: Vec<Scope<'c>>,
}

#[derive(Debug, Default)]
struct Scope<'c> {
    types: FxHashMap<&'c str, TypeRef<'c>>,
    variables: FxHashMap<&'c str, VarRef<'c>>,
    functions: FxHashMap<&'c str, Prototype<'c>>,
}

/// The signatures of a function known to the symbol table.
#[derive(Clone, Debug)]
pub struct Prototype<'c> {
    pub name: &'c str,
    pub signatures: Vec<SignatureProto<'c>>,
}

/// A single signature of a function, without its body.
///
/// Signatures are listed in the order they were declared in, which is also
/// the order of the [`Function`](super::Function) read alongside them.
#[derive(Clone, Debug)]
pub struct SignatureProto<'c> {
    pub return_type: TypeRef<'c>,
    pub parameters: Vec<VarRef<'c>>,
    /// Whether a body has been read for this signature.
    pub is_defined: bool,
}

impl<'c> Prototype<'c> {
    /// Find the signature taking exactly the given parameter types.
    pub fn matching_signature(&self, types: &[TypeRef<'c>]) -> Option<usize> {
        self.signatures.iter()
            .position(|s| s.parameters.iter().map(|p| p.ty).eq(types.iter().copied()))
    }
}

impl<'c> SignatureProto<'c> {
    /// A bodiless [`Signature`](super::Signature) of this shape.
    pub fn to_signature(&self) -> super::Signature<'c> {
        let mut sig = super::Signature::new(self.return_type, self.parameters.clone());
        sig.is_defined = self.is_defined;
        sig
    }
}

impl<'c> SymbolTable<'c> {
    /// Construct a symbol table with a single, empty scope.
    pub fn new() -> Self {
        let mut this = Self::default();
        this.push_scope();
        this
    }

    /// Construct a symbol table whose outermost scope binds every built-in
    /// type by name.
    pub fn with_builtins() -> Self {
        let mut this = Self::new();
        for ty in builtin::all() {
            if let Some(name) = ty.name {
                this.add_type(name, ty);
            }
        }
        this
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Leave the innermost scope, forgetting everything bound in it.
    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// The number of open scopes.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Bind a type name in the innermost scope.
    ///
    /// Returns false if the name is already bound in that scope.
    pub fn add_type(&mut self, name: &'c str, ty: TypeRef<'c>) -> bool {
        insert_new(&mut self.innermost().types, name, ty)
    }

    /// Bind a variable name in the innermost scope.
    ///
    /// A later declaration of the same name in the same scope replaces the
    /// earlier one, which is returned.
    pub fn add_variable(&mut self, var: VarRef<'c>) -> Option<VarRef<'c>> {
        let name = var.get().name;
        self.innermost().variables.insert(name, var)
    }

    /// Bind a function name in the innermost scope.
    ///
    /// Returns false if the name is already bound in that scope.
    pub fn add_function(&mut self, function: Prototype<'c>) -> bool {
        insert_new(&mut self.innermost().functions, function.name, function)
    }

    /// Bind a function name in the scope at the given depth, counting the
    /// outermost scope as 1.
    ///
    /// Depths beyond the innermost scope bind in the innermost scope.
    /// Returns false if the name is already bound in that scope.
    pub fn add_function_at(&mut self, depth: usize, function: Prototype<'c>) -> bool {
        self.innermost();
        let index = depth.clamp(1, self.scopes.len()) - 1;
        insert_new(&mut self.scopes[index].functions, function.name, function)
    }

    pub fn get_type(&self, name: &str) -> Option<TypeRef<'c>> {
        self.scopes.iter().rev()
            .find_map(|s| s.types.get(name).copied())
    }

    pub fn get_variable(&self, name: &str) -> Option<VarRef<'c>> {
        self.scopes.iter().rev()
            .find_map(|s| s.variables.get(name).copied())
    }

    pub fn get_function(&self, name: &str) -> Option<&Prototype<'c>> {
        self.scopes.iter().rev()
            .find_map(|s| s.functions.get(name))
    }

    pub fn get_function_mut(&mut self, name: &str) -> Option<&mut Prototype<'c>> {
        self.scopes.iter_mut().rev()
            .find_map(|s| s.functions.get_mut(name))
    }

    fn innermost(&mut self) -> &mut Scope<'c> {
        if self.scopes.is_empty() {
            self.push_scope();
        }
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }
}

fn insert_new<'c, T>(map: &mut FxHashMap<&'c str, T>, name: &'c str, value: T) -> bool {
    if map.contains_key(name) {
        return false;
    }
    map.insert(name, value);
    true
}
