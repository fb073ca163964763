//! Lexical scope stacks
//!
//! [`ScopeStack`] is the frame storage shared by the symbol table and the
//! lowering environment. Frame 0 is the global scope; it is created with the
//! stack and can never be exited.

use crate::error::ScopeError;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

/// One lexical scope: names in declaration order
pub type Frame<V> = IndexMap<String, V, FxBuildHasher>;

/// Stack of lexical scopes, innermost last
#[derive(Debug, Clone)]
pub struct ScopeStack<V> {
    frames: Vec<Frame<V>>,
}

impl<V> Default for ScopeStack<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ScopeStack<V> {
    /// Create a stack holding only the global scope
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    /// Push an empty innermost scope
    pub fn enter(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Pop the innermost scope, returning its bindings
    ///
    /// # Errors
    ///
    /// Returns `ScopeError::Underflow` if only the global scope remains.
    pub fn exit(&mut self) -> Result<Frame<V>, ScopeError> {
        if self.frames.len() <= 1 {
            return Err(ScopeError::Underflow);
        }
        self.frames.pop().ok_or(ScopeError::Underflow)
    }

    /// Bind `name` in the innermost scope
    ///
    /// # Errors
    ///
    /// Returns `ScopeError::Redeclaration` if the innermost scope already
    /// binds `name`; the existing binding is left untouched. Names bound in
    /// outer scopes may be shadowed freely.
    pub fn declare(&mut self, name: impl Into<String>, value: V) -> Result<(), ScopeError> {
        let name = name.into();
        let frame = self.innermost_mut();
        if frame.contains_key(&name) {
            return Err(ScopeError::Redeclaration { name });
        }
        frame.insert(name, value);
        Ok(())
    }

    /// Nearest binding of `name`
    pub fn lookup(&self, name: &str) -> Option<&V> {
        self.lookup_with_depth(name).map(|(_, value)| value)
    }

    /// Nearest binding of `name` together with the index of its frame
    pub fn lookup_with_depth(&self, name: &str) -> Option<(usize, &V)> {
        self.frames
            .iter()
            .enumerate()
            .rev()
            .find_map(|(depth, frame)| frame.get(name).map(|value| (depth, value)))
    }

    /// Whether `name` is bound in any visible scope
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Rebind `name` in the scope that declared it
    ///
    /// Returns `false` when the name is not bound anywhere.
    pub fn assign(&mut self, name: &str, value: V) -> bool {
        let Some(depth) = self.lookup_with_depth(name).map(|(depth, _)| depth) else {
            return false;
        };
        self.set_at(depth, name, value)
    }

    /// Binding of `name` in frame `depth` exactly
    pub fn get_at(&self, depth: usize, name: &str) -> Option<&V> {
        self.frames.get(depth)?.get(name)
    }

    /// Overwrite an existing binding in frame `depth`
    pub fn set_at(&mut self, depth: usize, name: &str, value: V) -> bool {
        match self.frames.get_mut(depth).and_then(|frame| frame.get_mut(name)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Number of frames, counting the global scope
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Every binding as `(depth, name, value)`, outermost frame first
    pub fn bindings(&self) -> impl Iterator<Item = (usize, &str, &V)> {
        self.frames.iter().enumerate().flat_map(|(depth, frame)| {
            frame
                .iter()
                .map(move |(name, value)| (depth, name.as_str(), value))
        })
    }

    /// Names visible from the innermost scope; shadowed names repeat
    pub fn visible_names(&self) -> impl Iterator<Item = &str> {
        self.bindings().map(|(_, name, _)| name)
    }

    fn innermost_mut(&mut self) -> &mut Frame<V> {
        if self.frames.is_empty() {
            self.frames.push(Frame::default());
        }
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }
}
