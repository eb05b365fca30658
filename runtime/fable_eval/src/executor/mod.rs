//! Script executor: the host-facing entry point.
//!
//! Every run (a whole program, an event handler, or a deferred callback)
//! goes through the same guarded path:
//!
//! 1. validate the target (non-empty script id, not already running)
//! 2. register the script as running with a fresh [`InterruptFlag`]
//! 3. evaluate with a new interpreter on the caller's context
//! 4. unregister, measure, and fold any failure into an [`ExecutionResult`]
//!
//! Nothing escapes: errors become failed results. Side effects performed
//! before a failure are not rolled back.

mod config;

use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use fable_ir::{EventHandlerDecl, Program};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

pub use config::{
    ConfigError, ExecutorConfig, ENV_DEADLINE_MS, ENV_MAX_CALL_DEPTH, ENV_MAX_LOOP_ITERATIONS,
    ENV_SLOW_SCRIPT_MS,
};

use crate::builtins::BuiltinRegistry;
use crate::callback::DeferredCall;
use crate::context::{ExecutionContext, ScriptId};
use crate::declarations::DeclarationSink;
use crate::errors::{invalid_script, script_already_running, EvalError, EvalResult};
use crate::interpreter::Interpreter;
use crate::limits::InterruptFlag;
use crate::value::Value;

/// Scripts currently running, with the flag that stops each.
type RunningScripts = Arc<Mutex<FxHashMap<ScriptId, InterruptFlag>>>;

/// Outcome of one guarded run.
#[derive(Clone, Debug)]
pub struct ExecutionResult {
    pub success: bool,
    /// Result value on success.
    pub value: Option<Value>,
    /// Failure, with span and backtrace where available.
    pub error: Option<EvalError>,
    pub elapsed_ms: u64,
}

impl ExecutionResult {
    fn from_outcome(outcome: EvalResult, elapsed_ms: u64) -> Self {
        match outcome {
            Ok(value) => ExecutionResult {
                success: true,
                value: Some(value),
                error: None,
                elapsed_ms,
            },
            Err(error) => ExecutionResult {
                success: false,
                value: None,
                error: Some(error),
                elapsed_ms,
            },
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn error(&self) -> Option<&EvalError> {
        self.error.as_ref()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Back into a `Result`. A success without a value yields `Null`.
    pub fn into_result(self) -> EvalResult {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.value.unwrap_or(Value::Null)),
        }
    }
}

/// Thread-safe handle for stopping scripts while they run.
#[derive(Clone, Debug)]
pub struct StopHandle {
    running: RunningScripts,
}

impl StopHandle {
    /// Request `script` to stop. Returns `false` if it is not running.
    ///
    /// The script fails with `Interrupted` at its next loop iteration or
    /// call.
    pub fn stop(&self, script: &ScriptId) -> bool {
        match self.running.lock().get(script) {
            Some(flag) => {
                flag.request();
                tracing::warn!(%script, "stop requested");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, script: &ScriptId) -> bool {
        self.running.lock().contains_key(script)
    }
}

/// Removes a script from the running set when the run ends, however it
/// ends.
struct RunningEntry<'a> {
    running: &'a RunningScripts,
    script: ScriptId,
}

impl Drop for RunningEntry<'_> {
    fn drop(&mut self) {
        self.running.lock().remove(&self.script);
    }
}

pub struct ScriptExecutor {
    builtins: BuiltinRegistry,
    declarations: Rc<dyn DeclarationSink>,
    config: ExecutorConfig,
    running: RunningScripts,
}

impl ScriptExecutor {
    pub fn new(builtins: BuiltinRegistry, declarations: Rc<dyn DeclarationSink>) -> Self {
        ScriptExecutor {
            builtins,
            declarations,
            config: ExecutorConfig::default(),
            running: RunningScripts::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub fn builtins(&self) -> &BuiltinRegistry {
        &self.builtins
    }

    /// For registering host built-ins after construction.
    pub fn builtins_mut(&mut self) -> &mut BuiltinRegistry {
        &mut self.builtins
    }

    /// Run a whole program on `ctx`.
    ///
    /// The value is the program's top-level `return`, else the value of its
    /// last statement, else `Null`.
    #[tracing::instrument(level = "debug", skip_all, fields(script = %ctx.script_id()))]
    pub fn execute(&self, program: &Program, ctx: &mut ExecutionContext) -> ExecutionResult {
        self.run_guarded(ctx, |interp| interp.eval_program(program))
    }

    /// Run an event handler on the context of the script that declared it.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(script = %ctx.script_id(), event = %handler.event)
    )]
    pub fn fire_event(
        &self,
        handler: &EventHandlerDecl,
        args: Vec<Value>,
        ctx: &mut ExecutionContext,
    ) -> ExecutionResult {
        self.run_guarded(ctx, |interp| interp.run_event_handler(handler, args))
    }

    /// Run a callback, e.g. a due timer, on `ctx`.
    pub fn run_deferred(&self, call: &DeferredCall, ctx: &mut ExecutionContext) -> ExecutionResult {
        self.run_guarded(ctx, |interp| call.invoke(interp))
    }

    /// Request `script` to stop. Returns `false` if it is not running.
    pub fn stop(&self, script: &ScriptId) -> bool {
        self.stop_handle().stop(script)
    }

    pub fn is_running(&self, script: &ScriptId) -> bool {
        self.running.lock().contains_key(script)
    }

    /// Ids of running scripts, sorted.
    pub fn running_scripts(&self) -> Vec<ScriptId> {
        let mut scripts: Vec<_> = self.running.lock().keys().cloned().collect();
        scripts.sort();
        scripts
    }

    /// Handle for stopping scripts from other threads or from built-ins.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: Arc::clone(&self.running),
        }
    }

    fn register_running(&self, script: &ScriptId) -> EvalResult<(RunningEntry<'_>, InterruptFlag)> {
        if script.is_empty() {
            return Err(invalid_script("script id must not be empty"));
        }
        let flag = InterruptFlag::new();
        {
            let mut running = self.running.lock();
            if running.contains_key(script) {
                return Err(script_already_running(script.as_str()));
            }
            running.insert(script.clone(), flag.clone());
        }
        let entry = RunningEntry {
            running: &self.running,
            script: script.clone(),
        };
        Ok((entry, flag))
    }

    fn run_guarded<F>(&self, ctx: &mut ExecutionContext, run: F) -> ExecutionResult
    where
        F: FnOnce(&mut Interpreter<'_>) -> EvalResult,
    {
        let started = Instant::now();
        let script = ctx.script_id().clone();

        let outcome = self.register_running(&script).and_then(|(_entry, flag)| {
            let mut interp = Interpreter::builder(ctx, &self.builtins)
                .declarations(&*self.declarations)
                .limits(self.config.limits.clone())
                .interrupt(flag)
                .build();
            run(&mut interp)
        });

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match &outcome {
            Ok(_) => tracing::debug!(%script, elapsed_ms, "run finished"),
            Err(err) if err.is_interrupt() => {
                tracing::info!(%script, elapsed_ms, error = %err, "run interrupted");
            }
            Err(err) => tracing::debug!(%script, elapsed_ms, error = %err, "run failed"),
        }
        if self
            .config
            .slow_script_warn_ms
            .is_some_and(|limit| elapsed_ms >= limit)
        {
            tracing::warn!(%script, elapsed_ms, "slow script");
        }
        ExecutionResult::from_outcome(outcome, elapsed_ms)
    }
}
