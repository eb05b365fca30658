//! Host-driven timers.
//!
//! Scripts schedule callbacks with `after(delay_ms, callback, ...args)`. The
//! interpreter never waits: calls sit in a [`TimerQueue`] until the host
//! advances time with [`TimerQueue::take_due`] and runs each one, typically
//! with [`ScriptExecutor::run_deferred`](crate::executor::ScriptExecutor::run_deferred)
//! on the context of the script that scheduled it.

use std::cell::RefCell;
use std::rc::Rc;

use crate::builtins::{arg, expect_arity, expect_arity_range, expect_int, BuiltinRegistry};
use crate::callback::{Callback, DeferredCall};
use crate::context::ScriptId;
use crate::errors::BuiltinError;
use crate::value::Value;

pub type TimerId = u64;

/// A callback waiting for its due time.
#[derive(Clone, Debug)]
pub struct ScheduledCall {
    pub id: TimerId,
    pub due_ms: u64,
    pub script_id: ScriptId,
    pub call: DeferredCall,
}

/// Pending timer callbacks ordered by due time, then scheduling order.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now_ms: u64,
    next_id: TimerId,
    pending: Vec<ScheduledCall>,
}

pub type SharedTimerQueue = Rc<RefCell<TimerQueue>>;

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedTimerQueue {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Host clock as last reported through `set_time` or `take_due`.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Advance the clock. Time never moves backwards.
    pub fn set_time(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    /// Schedule `call` to run `delay_ms` after the current time.
    pub fn schedule(&mut self, delay_ms: u64, script_id: ScriptId, call: DeferredCall) -> TimerId {
        self.next_id += 1;
        let id = self.next_id;
        let due_ms = self.now_ms.saturating_add(delay_ms);
        tracing::debug!(id, due_ms, script = %script_id, "timer scheduled");
        self.pending.push(ScheduledCall {
            id,
            due_ms,
            script_id,
            call,
        });
        id
    }

    /// Drop a pending timer. Returns whether it was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|c| c.id != id);
        self.pending.len() != before
    }

    /// Advance to `now_ms` and remove every call due by then, earliest
    /// first. Ids increase with scheduling order, so they break ties.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<ScheduledCall> {
        self.set_time(now_ms);
        let now = self.now_ms;
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|c| c.due_ms <= now);
        self.pending = pending;
        due.sort_by_key(|c| (c.due_ms, c.id));
        due
    }

    /// Earliest pending due time.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.pending.iter().map(|c| c.due_ms).min()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop every timer scheduled by `script`.
    pub fn cancel_script(&mut self, script: &ScriptId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|c| &c.script_id != script);
        before - self.pending.len()
    }
}

/// Install `after(delay_ms, callback, ...args)` and `cancel_timer(id)`.
///
/// `after` returns the timer id; `cancel_timer` returns whether the timer
/// was still pending.
pub fn register_timer_builtins(registry: &mut BuiltinRegistry, queue: &SharedTimerQueue) {
    let scheduler = Rc::clone(queue);
    registry.register("after", move |args, ctx| {
        expect_arity_range(args, 2, None)?;
        let delay = u64::try_from(expect_int(args, 0)?)
            .map_err(|_| BuiltinError::invalid("delay must not be negative"))?;
        let target = arg(args, 1)?;
        let callback = Callback::from_value(target)
            .ok_or_else(|| BuiltinError::arg_type(1, "a function", target))?;
        let call = callback.bind(args[2..].to_vec());
        let id = scheduler
            .borrow_mut()
            .schedule(delay, ctx.script_id().clone(), call);
        i64::try_from(id)
            .map(Value::Int)
            .map_err(|_| BuiltinError::invalid("timer ids exhausted"))
    });

    let canceller = Rc::clone(queue);
    registry.register("cancel_timer", move |args, _| {
        expect_arity(args, 1)?;
        let cancelled = u64::try_from(expect_int(args, 0)?)
            .is_ok_and(|id| canceller.borrow_mut().cancel(id));
        Ok(Value::Bool(cancelled))
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests {
    use super::*;
    use crate::context::ExecutionContext;
    use pretty_assertions::assert_eq;

    fn noop(name: &str) -> DeferredCall {
        Callback::Builtin(name.to_string()).bind(vec![])
    }

    fn names(calls: &[ScheduledCall]) -> Vec<&str> {
        calls.iter().map(|c| c.call.callback().name()).collect()
    }

    #[test]
    fn due_calls_come_out_in_time_then_schedule_order() {
        let mut queue = TimerQueue::new();
        let script = ScriptId::new("s");
        queue.schedule(50, script.clone(), noop("late"));
        queue.schedule(10, script.clone(), noop("first"));
        queue.schedule(10, script.clone(), noop("second"));
        queue.schedule(500, script, noop("later"));

        assert!(queue.take_due(5).is_empty());
        assert_eq!(names(&queue.take_due(60)), vec!["first", "second", "late"]);
        assert_eq!(queue.pending_len(), 1);
        assert_eq!(queue.next_due_ms(), Some(500));
    }

    #[test]
    fn delays_are_relative_to_current_time() {
        let mut queue = TimerQueue::new();
        queue.set_time(1_000);
        queue.set_time(10);
        assert_eq!(queue.now_ms(), 1_000);

        queue.schedule(20, ScriptId::new("s"), noop("tick"));
        assert_eq!(queue.next_due_ms(), Some(1_020));
    }

    #[test]
    fn cancel_and_cancel_script() {
        let mut queue = TimerQueue::new();
        let a = queue.schedule(1, ScriptId::new("a"), noop("x"));
        queue.schedule(1, ScriptId::new("b"), noop("y"));
        queue.schedule(2, ScriptId::new("b"), noop("z"));

        assert!(queue.cancel(a));
        assert!(!queue.cancel(a));
        assert_eq!(queue.cancel_script(&ScriptId::new("b")), 2);
        assert_eq!(queue.pending_len(), 0);
    }

    #[test]
    fn after_builtin_schedules_with_script_id() {
        let queue = TimerQueue::shared();
        let mut registry = BuiltinRegistry::new();
        register_timer_builtins(&mut registry, &queue);
        let mut ctx = ExecutionContext::new("bell");

        let id = registry
            .dispatch(
                "after",
                &[Value::Int(100), Value::builtin("print"), Value::string("dong")],
                &mut ctx,
            )
            .unwrap();
        assert_eq!(id, Value::Int(1));

        let due = queue.borrow_mut().take_due(100);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].script_id.as_str(), "bell");
        assert_eq!(due[0].call.args(), &[Value::string("dong")]);
    }

    #[test]
    fn after_rejects_bad_arguments() {
        let queue = TimerQueue::shared();
        let mut registry = BuiltinRegistry::new();
        register_timer_builtins(&mut registry, &queue);
        let mut ctx = ExecutionContext::new("bell");

        let err = registry
            .dispatch("after", &[Value::Int(-1), Value::builtin("print")], &mut ctx)
            .unwrap_err();
        assert_eq!(err.kind().to_string(), "`after`: delay must not be negative");

        let err = registry
            .dispatch("after", &[Value::Int(1), Value::Int(2)], &mut ctx)
            .unwrap_err();
        assert_eq!(
            err.kind().to_string(),
            "`after`: argument 2 must be a function, got `int`"
        );
    }

    #[test]
    fn cancel_timer_builtin() {
        let queue = TimerQueue::shared();
        let mut registry = BuiltinRegistry::new();
        register_timer_builtins(&mut registry, &queue);
        let mut ctx = ExecutionContext::new("bell");

        let id = registry
            .dispatch("after", &[Value::Int(5), Value::builtin("print")], &mut ctx)
            .unwrap();
        assert_eq!(
            registry.dispatch("cancel_timer", &[id.clone()], &mut ctx).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            registry.dispatch("cancel_timer", &[id], &mut ctx).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(queue.borrow().pending_len(), 0);
    }
}
