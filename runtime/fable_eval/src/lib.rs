//! Fable Eval - tree-walking interpreter for the Fable scripting runtime.
//!
//! Game hosts hand this crate an already-parsed [`fable_ir::Program`] and an
//! [`ExecutionContext`] per script instance, and get back an
//! [`ExecutionResult`]. Script code reaches the host only through the
//! [`BuiltinRegistry`]; dialogue, quest, node and event-handler declarations
//! are handed to a [`DeclarationSink`] instead of being evaluated.
//!
//! # Architecture
//!
//! - `value`: dynamically typed runtime values and coercion rules
//! - `context`: scope stack, call stack and script identity
//! - `operators` / `unary_operators`: enum-dispatched operator semantics
//! - `interpreter`: statement and expression evaluation, the call protocol
//! - `builtins`: the dispatch table and the standard library
//! - `callback` / `timers`: deferred calls scheduled by scripts or hosts
//! - `declarations`: hand-off of host-interpreted declarations
//! - `executor`: guarded runs, stop requests and result reporting
//!
//! # Threading
//!
//! Contexts, values and interpreters are single-threaded (`Rc`-based).
//! Stop requests are the exception: [`StopHandle`] is `Send + Sync` so a
//! watchdog thread can interrupt a runaway script.

pub mod builtins;
pub mod callback;
pub mod context;
pub mod declarations;
pub mod errors;
pub mod executor;
pub mod interpreter;
pub mod limits;
mod operators;
mod stack;
pub mod timers;
mod unary_operators;
pub mod value;

pub use builtins::{
    buffer_handler, expect_arity, expect_arity_range, expect_int, expect_list, expect_number,
    expect_str, forward_handler, stdout_handler, BuiltinFn, BuiltinRegistry, PrintHandler, SharedPrintHandler,
};
pub use callback::{Callback, DeferredCall, NativeFn};
pub use context::{CallFrame, CallStack, Environment, ExecutionContext, ScriptId};
pub use declarations::{DeclarationRegistry, DeclarationSink, NullSink};
pub use errors::{BuiltinError, EvalBacktrace, EvalError, EvalErrorKind, EvalResult};
pub use executor::{ConfigError, ExecutionResult, ExecutorConfig, ScriptExecutor, StopHandle};
pub use interpreter::{Flow, Interpreter, InterpreterBuilder};
pub use limits::{EvalLimits, InterruptFlag};
pub use operators::evaluate_binary;
pub use timers::{register_timer_builtins, ScheduledCall, SharedTimerQueue, TimerQueue};
pub use unary_operators::evaluate_unary;
pub use value::{Callable, UserFunction, Value, ValueMap};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing when `RUST_LOG` is unset, and only the first call has any
/// effect, so hosts and tests can call it freely.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
