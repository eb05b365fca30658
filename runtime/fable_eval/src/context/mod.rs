//! Per-script execution state.
//!
//! An [`ExecutionContext`] owns the scope stack and the call stack of one
//! script instance. It outlives individual runs: globals bound by the main
//! program stay visible to event handlers and timer callbacks that run later
//! on the same context.

mod call_stack;
mod environment;

use std::fmt;
use std::sync::Arc;

pub use call_stack::{CallFrame, CallStack};
pub use environment::{Environment, LocalScope, Scope};

use crate::errors::{undefined_variable, EvalError};
use crate::value::Value;

/// Identifier of a script instance. Cheap to clone, shareable across threads.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScriptId(Arc<str>);

impl ScriptId {
    pub fn new(id: impl AsRef<str>) -> Self {
        ScriptId(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScriptId({:?})", &*self.0)
    }
}

impl From<&str> for ScriptId {
    fn from(id: &str) -> Self {
        ScriptId::new(id)
    }
}

impl From<String> for ScriptId {
    fn from(id: String) -> Self {
        ScriptId(Arc::from(id))
    }
}

/// Scope stack, call stack and identity of one script instance.
#[derive(Debug)]
pub struct ExecutionContext {
    script_id: ScriptId,
    env: Environment,
    call_stack: CallStack,
}

impl ExecutionContext {
    pub fn new(script_id: impl Into<ScriptId>) -> Self {
        ExecutionContext {
            script_id: script_id.into(),
            env: Environment::new(),
            call_stack: CallStack::default(),
        }
    }

    /// Context with host-provided globals already bound.
    pub fn with_globals<K: AsRef<str>>(
        script_id: impl Into<ScriptId>,
        globals: impl IntoIterator<Item = (K, Value)>,
    ) -> Self {
        let mut ctx = ExecutionContext::new(script_id);
        for (name, value) in globals {
            ctx.define_global(name.as_ref(), value);
        }
        ctx
    }

    pub fn script_id(&self) -> &ScriptId {
        &self.script_id
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    pub fn call_stack_mut(&mut self) -> &mut CallStack {
        &mut self.call_stack
    }

    /// Number of active scopes; 1 means only the global scope.
    pub fn depth(&self) -> usize {
        self.env.depth()
    }

    pub fn push_scope(&mut self) {
        self.env.push_scope();
        tracing::trace!(depth = self.env.depth(), "push scope");
    }

    /// Pop the innermost scope. The global scope is never popped.
    pub fn pop_scope(&mut self) {
        self.env.pop_scope();
        tracing::trace!(depth = self.env.depth(), "pop scope");
    }

    /// Bind `name` in the innermost scope, shadowing outer bindings.
    pub fn define_variable(&mut self, name: &str, value: Value) {
        self.env.define(name, value);
    }

    /// Update the nearest existing binding of `name`.
    pub fn set_variable(&mut self, name: &str, value: Value) -> Result<(), EvalError> {
        if self.env.assign(name, value) {
            Ok(())
        } else {
            Err(undefined_variable(name))
        }
    }

    pub fn get_variable(&self, name: &str) -> Option<Value> {
        self.env.lookup(name)
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.env.contains(name)
    }

    pub fn define_global(&mut self, name: &str, value: Value) {
        self.env.define_global(name, value);
    }

    /// Replace the active environment, returning the previous one.
    pub(crate) fn swap_env(&mut self, env: Environment) -> Environment {
        std::mem::replace(&mut self.env, env)
    }

    pub(crate) fn attach_backtrace(&self, err: EvalError) -> EvalError {
        self.call_stack.attach_backtrace(err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
