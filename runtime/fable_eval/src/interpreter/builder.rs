//! Builder for `Interpreter`.

use super::Interpreter;
use crate::builtins::BuiltinRegistry;
use crate::context::ExecutionContext;
use crate::declarations::{DeclarationSink, NullSink};
use crate::limits::{BudgetState, EvalLimits, InterruptFlag};

/// Builder for one interpreter run.
///
/// ```text
/// let mut interp = InterpreterBuilder::new(&mut ctx, &builtins)
///     .declarations(&registry)
///     .limits(EvalLimits::default().with_max_loop_iterations(Some(10_000)))
///     .build();
/// ```
pub struct InterpreterBuilder<'a> {
    ctx: &'a mut ExecutionContext,
    builtins: &'a BuiltinRegistry,
    declarations: Option<&'a dyn DeclarationSink>,
    limits: EvalLimits,
    interrupt: Option<InterruptFlag>,
}

impl<'a> InterpreterBuilder<'a> {
    pub fn new(ctx: &'a mut ExecutionContext, builtins: &'a BuiltinRegistry) -> Self {
        InterpreterBuilder {
            ctx,
            builtins,
            declarations: None,
            limits: EvalLimits::default(),
            interrupt: None,
        }
    }

    /// Receiver for dialogue, quest, node and event-handler declarations.
    /// Defaults to [`NullSink`].
    #[must_use]
    pub fn declarations(mut self, sink: &'a dyn DeclarationSink) -> Self {
        self.declarations = Some(sink);
        self
    }

    #[must_use]
    pub fn limits(mut self, limits: EvalLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Flag polled at every loop iteration and every call.
    #[must_use]
    pub fn interrupt(mut self, flag: InterruptFlag) -> Self {
        self.interrupt = Some(flag);
        self
    }

    pub fn build(self) -> Interpreter<'a> {
        self.ctx
            .call_stack_mut()
            .set_max_depth(self.limits.max_call_depth);
        Interpreter {
            ctx: self.ctx,
            builtins: self.builtins,
            declarations: self.declarations.unwrap_or(&NullSink),
            limits: self.limits,
            budget: BudgetState::new(self.interrupt),
        }
    }
}
