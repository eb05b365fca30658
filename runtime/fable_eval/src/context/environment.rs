//! Variable scoping.
//!
//! A scope stack of shared scopes: pushing creates a child of the current
//! scope, popping never removes the outermost (global) scope. Closures keep a
//! handle to the scope they were defined in and later build a fresh
//! environment on top of it.

use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::value::Value;

/// Single-threaded shared scope handle (`Rc<RefCell<T>>`).
///
/// All scope allocations go through [`LocalScope::new`].
#[repr(transparent)]
pub struct LocalScope<T>(Rc<RefCell<T>>);

impl<T> LocalScope<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        LocalScope(Rc::new(RefCell::new(value)))
    }

    #[inline]
    pub fn borrow(&self) -> std::cell::Ref<'_, T> {
        self.0.borrow()
    }

    #[inline]
    pub fn borrow_mut(&self) -> std::cell::RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Whether both handles point at the same scope.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for LocalScope<T> {
    #[inline]
    fn clone(&self) -> Self {
        LocalScope(Rc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for LocalScope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LocalScope").field(&self.0).finish()
    }
}

impl<T: Default> Default for LocalScope<T> {
    fn default() -> Self {
        LocalScope::new(T::default())
    }
}

impl<T> Deref for LocalScope<T> {
    type Target = RefCell<T>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A single scope: name bindings plus an optional enclosing scope.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    bindings: FxHashMap<String, Value>,
    parent: Option<LocalScope<Scope>>,
}

impl Scope {
    pub fn new() -> Self {
        Scope::default()
    }

    pub fn with_parent(parent: LocalScope<Scope>) -> Self {
        Scope {
            bindings: FxHashMap::default(),
            parent: Some(parent),
        }
    }

    /// Bind `name` in this scope, replacing any binding of the same name here.
    #[inline]
    pub fn define(&mut self, name: &str, value: Value) {
        self.bindings.insert(name.to_string(), value);
    }

    /// Resolve `name` through this scope and its ancestors.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.get(name) {
            return Some(value.clone());
        }
        if let Some(parent) = &self.parent {
            return parent.borrow().lookup(name);
        }
        None
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
            || self
                .parent
                .as_ref()
                .is_some_and(|parent| parent.borrow().contains(name))
    }

    /// Update the nearest existing binding of `name`.
    ///
    /// Returns `false` if no scope in the chain binds it.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.bindings.get_mut(name) {
            *slot = value;
            return true;
        }
        if let Some(parent) = &self.parent {
            return parent.borrow_mut().assign(name, value);
        }
        false
    }
}

/// Scope stack for one execution context.
pub struct Environment {
    /// Active scopes, innermost last. Never empty.
    scopes: Vec<LocalScope<Scope>>,
    global: LocalScope<Scope>,
}

impl Environment {
    pub fn new() -> Self {
        let global = LocalScope::new(Scope::new());
        Environment {
            scopes: vec![global.clone()],
            global,
        }
    }

    /// Environment whose base is a captured scope rather than the global
    /// scope. Used to run a closure body against its defining scope chain.
    pub fn from_captured(base: LocalScope<Scope>, global: LocalScope<Scope>) -> Self {
        Environment {
            scopes: vec![base],
            global,
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    #[inline]
    pub fn push_scope(&mut self) {
        let parent = self.current_scope();
        self.scopes.push(LocalScope::new(Scope::with_parent(parent)));
    }

    /// Pop the innermost scope. The base scope is never removed.
    #[inline]
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    #[inline]
    fn innermost(&self) -> &LocalScope<Scope> {
        self.scopes.last().unwrap_or(&self.global)
    }

    pub fn current_scope(&self) -> LocalScope<Scope> {
        self.innermost().clone()
    }

    pub fn global(&self) -> LocalScope<Scope> {
        self.global.clone()
    }

    #[inline]
    pub fn define(&mut self, name: &str, value: Value) {
        self.innermost().borrow_mut().define(name, value);
    }

    #[inline]
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.innermost().borrow().lookup(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.innermost().borrow().contains(name)
    }

    #[inline]
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        self.innermost().borrow_mut().assign(name, value)
    }

    pub fn define_global(&mut self, name: &str, value: Value) {
        self.global.borrow_mut().define(name, value);
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("depth", &self.depth())
            .finish_non_exhaustive()
    }
}
