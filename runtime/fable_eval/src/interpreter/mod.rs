//! Tree-walking interpreter.
//!
//! One `Interpreter` evaluates one run against a borrowed
//! [`ExecutionContext`]. It holds no state that survives the run other than
//! what it writes into that context, so event handlers and timer callbacks
//! re-enter with a fresh interpreter on the same context.
//!
//! Statements produce a [`Flow`]; a `return` travels up as `Flow::Return`
//! until the enclosing call (or the program) consumes it. Errors travel as
//! `Err(EvalError)` and pick up the span of the innermost node that had one.
//!
//! # Module layout
//!
//! - `builder`: `InterpreterBuilder`
//! - `scope_guard`: RAII scope push/pop
//! - `control`: statement evaluation and loops
//! - `expr`: expression evaluation
//! - `function_call`: call resolution and the call protocol

mod builder;
mod control;
mod expr;
mod function_call;
mod scope_guard;

pub use builder::InterpreterBuilder;
pub use scope_guard::ScopedInterpreter;

use fable_ir::{Expr, Program, Stmt};

use crate::builtins::BuiltinRegistry;
use crate::context::ExecutionContext;
use crate::declarations::DeclarationSink;
use crate::errors::EvalResult;
use crate::limits::{BudgetState, EvalLimits};
use crate::stack::ensure_sufficient_stack;
use crate::value::Value;

/// Outcome of evaluating a statement.
#[derive(Clone, Debug, PartialEq)]
pub enum Flow {
    /// Completed; carries the statement's value (`Null` for most statements).
    Normal(Value),
    /// A `return` is unwinding to the enclosing call.
    Return(Value),
}

impl Flow {
    #[inline]
    pub fn normal() -> Self {
        Flow::Normal(Value::Null)
    }

    #[inline]
    pub fn is_return(&self) -> bool {
        matches!(self, Flow::Return(_))
    }

    /// The carried value, whichever way the sequence ended.
    pub fn into_value(self) -> Value {
        match self {
            Flow::Normal(v) | Flow::Return(v) => v,
        }
    }

    /// Result of a call body: the returned value, or `Null` if the body
    /// finished without `return`.
    pub fn into_call_result(self) -> Value {
        match self {
            Flow::Return(v) => v,
            Flow::Normal(_) => Value::Null,
        }
    }
}

/// Evaluator for one run.
pub struct Interpreter<'a> {
    pub(crate) ctx: &'a mut ExecutionContext,
    pub(crate) builtins: &'a BuiltinRegistry,
    pub(crate) declarations: &'a dyn DeclarationSink,
    pub(crate) limits: EvalLimits,
    pub(crate) budget: BudgetState,
}

impl<'a> Interpreter<'a> {
    /// Interpreter with default limits and no declaration sink.
    pub fn new(ctx: &'a mut ExecutionContext, builtins: &'a BuiltinRegistry) -> Self {
        InterpreterBuilder::new(ctx, builtins).build()
    }

    pub fn builder(
        ctx: &'a mut ExecutionContext,
        builtins: &'a BuiltinRegistry,
    ) -> InterpreterBuilder<'a> {
        InterpreterBuilder::new(ctx, builtins)
    }

    pub fn context(&self) -> &ExecutionContext {
        &*self.ctx
    }

    pub fn context_mut(&mut self) -> &mut ExecutionContext {
        &mut *self.ctx
    }

    pub fn limits(&self) -> &EvalLimits {
        &self.limits
    }

    /// Evaluate a whole program in the context's current scope, so top-level
    /// bindings become script globals.
    ///
    /// The result is the value of a top-level `return`, else the value of the
    /// last statement, else `Null`.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(script = %self.ctx.script_id(), statements = program.statements.len())
    )]
    pub fn eval_program(&mut self, program: &Program) -> EvalResult {
        self.eval_statements(&program.statements).map(Flow::into_value)
    }

    /// Evaluate a block in a fresh scope.
    pub fn eval_block(&mut self, block: &fable_ir::Block) -> EvalResult<Flow> {
        let mut scoped = self.scoped();
        scoped.eval_statements(&block.statements)
    }

    /// Evaluate statements in order in the current scope, stopping at the
    /// first `return`.
    pub fn eval_statements(&mut self, statements: &[Stmt]) -> EvalResult<Flow> {
        let mut last = Value::Null;
        for stmt in statements {
            match self.eval_stmt(stmt)? {
                Flow::Normal(value) => last = value,
                ret @ Flow::Return(_) => return Ok(ret),
            }
        }
        Ok(Flow::Normal(last))
    }

    pub fn eval_stmt(&mut self, stmt: &Stmt) -> EvalResult<Flow> {
        ensure_sufficient_stack(|| self.exec_stmt(stmt)).map_err(|e| e.or_span(stmt.span))
    }

    pub fn eval_expr(&mut self, expr: &Expr) -> EvalResult {
        ensure_sufficient_stack(|| self.exec_expr(expr)).map_err(|e| e.or_span(expr.span))
    }

    /// Count one loop iteration against the budget and poll for a stop.
    #[inline]
    pub(crate) fn tick(&mut self) -> EvalResult<()> {
        self.budget.check_iteration(&self.limits)
    }
}
