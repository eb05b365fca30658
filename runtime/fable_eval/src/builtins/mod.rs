//! Built-in dispatch table.
//!
//! Maps a name to a native function `(args, context) -> Value`. This table is
//! the only way script code reaches host operations: the interpreter resolves
//! a call against it first and knows nothing about what an entry does.
//!
//! Entries validate their own arguments with the `expect_*` helpers and fail
//! with a [`BuiltinError`]. [`BuiltinRegistry::dispatch`] turns that into an
//! [`EvalError`] carrying the entry's name, keeping host failures as the
//! error source.

mod print_handler;
mod stdlib;

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::context::ExecutionContext;
use crate::errors::{undefined_function, BuiltinError, EvalError};
use crate::value::Value;

pub use print_handler::{
    buffer_handler, forward_handler, stdout_handler, PrintHandler, SharedPrintHandler,
};

/// Native implementation of a built-in.
pub type BuiltinFn = Rc<dyn Fn(&[Value], &mut ExecutionContext) -> Result<Value, BuiltinError>>;

#[derive(Clone, Default)]
pub struct BuiltinRegistry {
    entries: FxHashMap<String, BuiltinFn>,
}

impl BuiltinRegistry {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table pre-populated with the standard library, printing through
    /// `print`.
    pub fn with_stdlib(print: SharedPrintHandler) -> Self {
        let mut registry = Self::new();
        stdlib::register(&mut registry, print);
        registry
    }

    /// Add or replace an entry.
    pub fn register<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&[Value], &mut ExecutionContext) -> Result<Value, BuiltinError> + 'static,
    {
        self.entries.insert(name.into(), Rc::new(f));
        self
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<BuiltinFn> {
        self.entries.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Invoke `name` with already-evaluated arguments.
    pub fn dispatch(
        &self,
        name: &str,
        args: &[Value],
        ctx: &mut ExecutionContext,
    ) -> Result<Value, EvalError> {
        let f = self
            .entries
            .get(name)
            .ok_or_else(|| undefined_function(name))?;
        tracing::debug!(builtin = name, argc = args.len(), "dispatch built-in");
        f(args, ctx).map_err(|e| e.into_eval(name))
    }
}

impl fmt::Debug for BuiltinRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinRegistry")
            .field("names", &self.names())
            .finish()
    }
}

// Argument helpers

pub fn expect_arity(args: &[Value], expected: usize) -> Result<(), BuiltinError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(BuiltinError::Arity {
            expected: expected.to_string(),
            got: args.len(),
        })
    }
}

/// Inclusive range; `max = None` means variadic.
pub fn expect_arity_range(
    args: &[Value],
    min: usize,
    max: Option<usize>,
) -> Result<(), BuiltinError> {
    let ok = args.len() >= min && max.is_none_or(|max| args.len() <= max);
    if ok {
        return Ok(());
    }
    let expected = match max {
        Some(max) if max == min => min.to_string(),
        Some(max) => format!("{min} to {max}"),
        None => format!("at least {min}"),
    };
    Err(BuiltinError::Arity {
        expected,
        got: args.len(),
    })
}

pub fn arg(args: &[Value], index: usize) -> Result<&Value, BuiltinError> {
    args.get(index).ok_or_else(|| BuiltinError::Arity {
        expected: format!("at least {}", index + 1),
        got: args.len(),
    })
}

pub fn expect_int(args: &[Value], index: usize) -> Result<i64, BuiltinError> {
    match arg(args, index)? {
        Value::Int(n) => Ok(*n),
        other => Err(BuiltinError::arg_type(index, "an int", other)),
    }
}

pub fn expect_number(args: &[Value], index: usize) -> Result<f64, BuiltinError> {
    let value = arg(args, index)?;
    value
        .as_number()
        .ok_or_else(|| BuiltinError::arg_type(index, "a number", value))
}

pub fn expect_str(args: &[Value], index: usize) -> Result<&str, BuiltinError> {
    match arg(args, index)? {
        Value::Str(s) => Ok(s),
        other => Err(BuiltinError::arg_type(index, "a string", other)),
    }
}

pub fn expect_list(args: &[Value], index: usize) -> Result<&[Value], BuiltinError> {
    match arg(args, index)? {
        Value::List(items) => Ok(items),
        other => Err(BuiltinError::arg_type(index, "a list", other)),
    }
}
