//! An ID-providing arena allocator.
//!
//! This is a wrapper around [`typed_arena`] which annotates each object with a
//! [`u32`] identifier.  IR nodes refer to arena objects through [`Ref`], whose
//! identity is the identifier rather than the object's address; this makes it
//! suitable as a key in side tables (e.g. for naming temporaries).

use core::cell::Cell;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops::Deref;

use typed_arena;

/// An ID-providing arena allocator.
pub struct Arena<T> {
    /// The underlying arena.
    inner: typed_arena::Arena<T>,
    /// The ID of the next-allocated object.
    counter: Cell<u32>,
}

impl<T> Arena<T> {
    /// Construct a new [`Arena`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new object.
    pub fn alloc(&self, object: T) -> Ref<'_, T> {
        let inner = self.inner.alloc(object);
        let id = self.counter.get();
        self.counter.set(id
            .checked_add(1)
            .expect("Arena IDs overflowed!"));
        Ref { inner, id }
    }

    /// The number of objects allocated so far.
    pub fn len(&self) -> usize {
        self.counter.get() as usize
    }

    /// Whether no objects have been allocated.
    pub fn is_empty(&self) -> bool {
        self.counter.get() == 0
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            inner: typed_arena::Arena::new(),
            counter: Cell::new(0),
        }
    }
}

/// A reference to an object in an arena.
///
/// Two references are equal iff they refer to the same allocation.
pub struct Ref<'a, T> {
    /// The objects location in the arena.
    inner: &'a T,
    /// The ID of the object.
    id: u32,
}

impl<'a, T> Ref<'a, T> {
    /// Get the ID of the referenced object.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Get the referenced object with the arena's lifetime.
    pub fn get(&self) -> &'a T {
        self.inner
    }
}

impl<'a, T> Clone for Ref<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for Ref<'a, T> {}

impl<'a, T> PartialEq for Ref<'a, T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<'a, T> Eq for Ref<'a, T> {}

impl<'a, T> Hash for Ref<'a, T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl<'a, T: fmt::Debug> fmt::Debug for Ref<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ", self.id)?;
        fmt::Debug::fmt(self.inner, f)
    }
}

impl<'a, T> Deref for Ref<'a, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.inner
    }
}
