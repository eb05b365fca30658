//! Call resolution and the call protocol.
//!
//! A call pushes a frame on the context's call stack and, for user
//! functions, swaps the active environment for a fresh one layered on the
//! function's captured scope. [`CallGuard`] undoes both on drop, so an error
//! or panic inside the callee leaves the caller's environment intact.

use std::ops::{Deref, DerefMut};

use fable_ir::{EventHandlerDecl, Span};

use super::Interpreter;
use crate::context::{CallFrame, Environment};
use crate::errors::{not_callable, undefined_function, EvalResult};
use crate::value::{Callable, UserFunction, Value};

/// Active call: one frame pushed, and possibly a swapped environment.
struct CallGuard<'guard, 'interp> {
    interpreter: &'guard mut Interpreter<'interp>,
    saved_env: Option<Environment>,
}

impl Drop for CallGuard<'_, '_> {
    fn drop(&mut self) {
        if let Some(env) = self.saved_env.take() {
            self.interpreter.ctx.swap_env(env);
        }
        self.interpreter.ctx.call_stack_mut().pop();
    }
}

impl<'interp> Deref for CallGuard<'_, 'interp> {
    type Target = Interpreter<'interp>;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for CallGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

impl<'a> Interpreter<'a> {
    /// Check the budget, push a frame and optionally enter `env`.
    fn enter_call(
        &mut self,
        name: &str,
        call_span: Option<Span>,
        env: Option<Environment>,
    ) -> EvalResult<CallGuard<'_, 'a>> {
        self.budget.check_call(&self.limits)?;
        self.ctx
            .call_stack_mut()
            .push(CallFrame::new(name, call_span))?;
        let saved_env = env.map(|env| self.ctx.swap_env(env));
        Ok(CallGuard {
            interpreter: self,
            saved_env,
        })
    }

    /// Resolve a call by name: built-ins first, then a callable binding in
    /// scope.
    pub(super) fn call_named(&mut self, name: &str, args: Vec<Value>, span: Span) -> EvalResult {
        if self.builtins.contains(name) {
            return self.call_builtin(name, &args, Some(span));
        }
        match self.ctx.get_variable(name) {
            Some(Value::Callable(callable)) => self.call_callable(&callable, args, Some(span)),
            _ => Err(undefined_function(name)),
        }
    }

    /// Invoke a value. Fails with `NotCallable` for anything but a function.
    pub fn call_value(&mut self, callee: &Value, args: Vec<Value>) -> EvalResult {
        match callee {
            Value::Callable(callable) => self.call_callable(callable, args, None),
            other => Err(not_callable(other)),
        }
    }

    pub fn call_callable(
        &mut self,
        callable: &Callable,
        args: Vec<Value>,
        call_span: Option<Span>,
    ) -> EvalResult {
        match callable {
            Callable::Builtin(name) => self.call_builtin(name, &args, call_span),
            Callable::User(func) => self.call_function(func, args, call_span),
        }
    }

    pub fn call_builtin(
        &mut self,
        name: &str,
        args: &[Value],
        call_span: Option<Span>,
    ) -> EvalResult {
        let mut guard = self.enter_call(name, call_span, None)?;
        let builtins = guard.builtins;
        builtins
            .dispatch(name, args, &mut *guard.ctx)
            .map_err(|err| guard.ctx.attach_backtrace(err))
    }

    /// Call a user function. Missing arguments bind `Null`; extra arguments
    /// are ignored.
    #[tracing::instrument(level = "debug", skip_all, fields(function = %func.name()))]
    pub fn call_function(
        &mut self,
        func: &UserFunction,
        args: Vec<Value>,
        call_span: Option<Span>,
    ) -> EvalResult {
        let mut guard = self.enter_call(func.name(), call_span, Some(func.call_environment()))?;
        let mut args = args.into_iter();
        for param in func.params() {
            guard
                .ctx
                .define_variable(param, args.next().unwrap_or(Value::Null));
        }
        match guard.eval_statements(&func.decl().body.statements) {
            Ok(flow) => Ok(flow.into_call_result()),
            Err(err) => Err(guard.ctx.attach_backtrace(err)),
        }
    }

    /// Run an event handler body on the current environment with its
    /// parameters bound like a call.
    pub fn run_event_handler(&mut self, handler: &EventHandlerDecl, args: Vec<Value>) -> EvalResult {
        let frame = format!("on {}", handler.event);
        let mut guard = self.enter_call(&frame, None, None)?;
        let bindings = handler
            .params
            .iter()
            .map(String::as_str)
            .zip(args.into_iter().chain(std::iter::repeat(Value::Null)));
        let result = guard.with_bindings(bindings, |scoped| {
            scoped.eval_statements(&handler.body.statements)
        });
        match result {
            Ok(flow) => Ok(flow.into_call_result()),
            Err(err) => Err(guard.ctx.attach_backtrace(err)),
        }
    }
}
