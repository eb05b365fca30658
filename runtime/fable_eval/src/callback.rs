//! Deferred invocation of script and host functions.
//!
//! Hosts keep a [`Callback`] (from a script value or a native closure) and
//! later run it with bound arguments through a fresh interpreter on the
//! owning script's context, usually via
//! [`ScriptExecutor::run_deferred`](crate::executor::ScriptExecutor::run_deferred).

use std::fmt;
use std::rc::Rc;

use crate::errors::{BuiltinError, EvalResult};
use crate::interpreter::Interpreter;
use crate::value::{Callable, UserFunction, Value};

/// Host closure usable as a callback. It does not see the script context.
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Value, BuiltinError>>;

#[derive(Clone)]
pub enum Callback {
    /// Host closure; `name` is used in errors.
    Native { name: Rc<str>, func: NativeFn },
    /// Entry of the built-in dispatch table, resolved when invoked.
    Builtin(String),
    /// Script function with its captured scope.
    Closure(UserFunction),
}

impl Callback {
    pub fn native<F>(name: &str, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, BuiltinError> + 'static,
    {
        Callback::Native {
            name: Rc::from(name),
            func: Rc::new(func),
        }
    }

    /// Callback named by a script value: a function value, or a string
    /// naming a built-in.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Callable(Callable::Builtin(name)) | Value::Str(name) => {
                Some(Callback::Builtin(name.to_string()))
            }
            Value::Callable(Callable::User(func)) => Some(Callback::Closure(func.clone())),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Callback::Native { name, .. } => name.as_ref(),
            Callback::Builtin(name) => name.as_str(),
            Callback::Closure(func) => func.name(),
        }
    }

    /// Fix the arguments for a later call.
    pub fn bind(self, args: Vec<Value>) -> DeferredCall {
        DeferredCall {
            callback: self,
            args,
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::Native { name, .. } => write!(f, "Native({name})"),
            Callback::Builtin(name) => write!(f, "Builtin({name})"),
            Callback::Closure(func) => write!(f, "Closure({func:?})"),
        }
    }
}

/// A callback with its bound arguments.
#[derive(Clone, Debug)]
pub struct DeferredCall {
    callback: Callback,
    args: Vec<Value>,
}

impl DeferredCall {
    pub fn callback(&self) -> &Callback {
        &self.callback
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn invoke(&self, interpreter: &mut Interpreter<'_>) -> EvalResult {
        self.invoke_with(interpreter, Vec::new())
    }

    /// Invoke with `extra` appended after the bound arguments.
    pub fn invoke_with(&self, interpreter: &mut Interpreter<'_>, extra: Vec<Value>) -> EvalResult {
        let mut args = self.args.clone();
        args.extend(extra);
        tracing::debug!(callback = self.callback.name(), argc = args.len(), "invoke deferred call");
        match &self.callback {
            Callback::Native { name, func } => func(&args).map_err(|e| e.into_eval(name)),
            Callback::Builtin(name) => interpreter.call_builtin(name, &args, None),
            Callback::Closure(func) => interpreter.call_function(func, args, None),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests {
    use super::*;
    use crate::builtins::{buffer_handler, BuiltinRegistry};
    use crate::context::ExecutionContext;
    use crate::errors::EvalErrorKind;
    use fable_ir::build::{binary, func, ident, program, ret};
    use fable_ir::BinaryOp;
    use pretty_assertions::assert_eq;

    #[test]
    fn from_value_accepts_functions_and_builtin_names() {
        assert!(matches!(
            Callback::from_value(&Value::builtin("print")),
            Some(Callback::Builtin(ref n)) if n == "print"
        ));
        assert!(matches!(
            Callback::from_value(&Value::string("len")),
            Some(Callback::Builtin(ref n)) if n == "len"
        ));
        assert!(Callback::from_value(&Value::Int(1)).is_none());
    }

    #[test]
    fn closure_runs_with_bound_and_extra_args() {
        let builtins = BuiltinRegistry::new();
        let mut ctx = ExecutionContext::new("cb");
        let add = program(vec![func(
            "add",
            &["a", "b"],
            vec![ret(binary(BinaryOp::Add, ident("a"), ident("b")))],
        )]);
        let mut interp = Interpreter::new(&mut ctx, &builtins);
        interp.eval_program(&add).unwrap();

        let value = interp.context().get_variable("add").unwrap();
        let call = Callback::from_value(&value).unwrap().bind(vec![Value::Int(2)]);
        // `b` binds null when only the bound argument is supplied.
        assert!(matches!(
            call.invoke(&mut interp).unwrap_err().kind,
            EvalErrorKind::TypeMismatch { .. }
        ));
        assert_eq!(
            call.invoke_with(&mut interp, vec![Value::Int(40)]).unwrap(),
            Value::Int(42)
        );
    }

    #[test]
    fn builtin_callback_dispatches() {
        let out = buffer_handler();
        let builtins = BuiltinRegistry::with_stdlib(out.clone());
        let mut ctx = ExecutionContext::new("cb");
        let mut interp = Interpreter::new(&mut ctx, &builtins);

        Callback::Builtin("print".into())
            .bind(vec![Value::string("ding")])
            .invoke(&mut interp)
            .unwrap();
        assert_eq!(out.output(), "ding\n");
    }

    #[test]
    fn native_failure_names_the_callback() {
        let builtins = BuiltinRegistry::new();
        let mut ctx = ExecutionContext::new("cb");
        let mut interp = Interpreter::new(&mut ctx, &builtins);

        let call =
            Callback::native("on_loot", |_| Err(BuiltinError::invalid("bag full"))).bind(vec![]);
        let err = call.invoke(&mut interp).unwrap_err();
        match err.kind() {
            EvalErrorKind::ArgumentError { builtin, message } => {
                assert_eq!(builtin, "on_loot");
                assert_eq!(message, "bag full");
            }
            other => panic!("expected argument error, got {other:?}"),
        }
    }
}
