//! RAII scope guards for the interpreter.
//!
//! [`ScopedInterpreter`] pushes a scope on creation and pops it on drop, so
//! every exit path (normal completion, `?` propagation, a `return` flow, or a
//! panic unwinding through) leaves the scope stack as it found it.
//!
//! The guard holds `&mut Interpreter` and derefs to it:
//!
//! ```text
//! interpreter.with_binding("item", value, |scoped| {
//!     scoped.eval_statements(&body.statements)
//! })
//! ```

use std::ops::{Deref, DerefMut};

use super::Interpreter;
use crate::value::Value;

/// Interpreter with one extra scope that is popped on drop.
pub struct ScopedInterpreter<'guard, 'interp> {
    interpreter: &'guard mut Interpreter<'interp>,
}

impl Drop for ScopedInterpreter<'_, '_> {
    fn drop(&mut self) {
        self.interpreter.ctx.pop_scope();
    }
}

impl<'interp> Deref for ScopedInterpreter<'_, 'interp> {
    type Target = Interpreter<'interp>;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for ScopedInterpreter<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

impl<'a> Interpreter<'a> {
    /// Push a scope, returning a guard that pops it.
    pub fn scoped(&mut self) -> ScopedInterpreter<'_, 'a> {
        self.ctx.push_scope();
        ScopedInterpreter { interpreter: self }
    }

    /// Run `f` inside a new scope.
    pub fn with_env_scope<T, F>(&mut self, f: F) -> T
    where
        F: FnOnce(&mut ScopedInterpreter<'_, 'a>) -> T,
    {
        let mut scoped = self.scoped();
        f(&mut scoped)
    }

    /// Run `f` inside a new scope that starts with `bindings`.
    pub fn with_bindings<'n, T, F, I>(&mut self, bindings: I, f: F) -> T
    where
        F: FnOnce(&mut ScopedInterpreter<'_, 'a>) -> T,
        I: IntoIterator<Item = (&'n str, Value)>,
    {
        self.with_env_scope(|scoped| {
            for (name, value) in bindings {
                scoped.ctx.define_variable(name, value);
            }
            f(scoped)
        })
    }

    /// Run `f` inside a new scope with one binding, e.g. a loop variable.
    pub fn with_binding<T, F>(&mut self, name: &str, value: Value, f: F) -> T
    where
        F: FnOnce(&mut ScopedInterpreter<'_, 'a>) -> T,
    {
        self.with_env_scope(|scoped| {
            scoped.ctx.define_variable(name, value);
            f(scoped)
        })
    }
}
