//! RAII scope acquisition
//!
//! A [`ScopeGuard`] enters a scope on creation and exits it when dropped, so
//! a `?` early return out of a block still leaves the stack balanced.

use crate::error::ScopeError;
use crate::scope::ScopeStack;
use std::ops::{Deref, DerefMut};

/// Anything that maintains a stack of lexical scopes
pub trait ScopeOwner {
    /// Enter a new innermost scope
    fn push_scope(&mut self);

    /// Exit the innermost scope
    ///
    /// # Errors
    ///
    /// Returns `ScopeError::Underflow` when only the global scope is left.
    fn pop_scope(&mut self) -> Result<(), ScopeError>;
}

impl<V> ScopeOwner for ScopeStack<V> {
    fn push_scope(&mut self) {
        self.enter();
    }

    fn pop_scope(&mut self) -> Result<(), ScopeError> {
        self.exit().map(drop)
    }
}

/// Exclusive borrow of a [`ScopeOwner`] with one extra scope pushed
///
/// Dereferences to the owner so the scoped work runs through the guard.
pub struct ScopeGuard<'owner, T: ScopeOwner> {
    owner: &'owner mut T,
}

impl<'owner, T: ScopeOwner> ScopeGuard<'owner, T> {
    /// Enter a scope on `owner`
    pub fn new(owner: &'owner mut T) -> Self {
        owner.push_scope();
        Self { owner }
    }
}

impl<T: ScopeOwner> Deref for ScopeGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.owner
    }
}

impl<T: ScopeOwner> DerefMut for ScopeGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.owner
    }
}

impl<T: ScopeOwner> Drop for ScopeGuard<'_, T> {
    fn drop(&mut self) {
        let popped = self.owner.pop_scope();
        // Guards nest strictly, so the scope pushed in `new` is still there
        debug_assert!(popped.is_ok(), "scope guard found an unbalanced stack");
    }
}
