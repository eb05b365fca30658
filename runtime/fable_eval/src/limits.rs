//! Resource limits and cooperative interruption.
//!
//! [`EvalLimits`] is the policy; [`BudgetState`] is the per-run counter the
//! interpreter checks at every loop iteration and every call. A host stops a
//! running script by raising its [`InterruptFlag`] from any thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::{interrupted, EvalError};

/// Resource policy for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalLimits {
    /// Maximum nesting of calls, `None` for unlimited.
    pub max_call_depth: Option<usize>,
    /// Maximum loop iterations across the whole run.
    pub max_loop_iterations: Option<u64>,
    /// Wall-clock budget for the whole run.
    pub deadline: Option<Duration>,
}

impl EvalLimits {
    pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

    /// No limits at all. Runaway scripts can only be stopped through the
    /// interrupt flag.
    pub fn unlimited() -> Self {
        EvalLimits {
            max_call_depth: None,
            max_loop_iterations: None,
            deadline: None,
        }
    }

    #[must_use]
    pub fn with_max_call_depth(mut self, depth: Option<usize>) -> Self {
        self.max_call_depth = depth;
        self
    }

    #[must_use]
    pub fn with_max_loop_iterations(mut self, iterations: Option<u64>) -> Self {
        self.max_loop_iterations = iterations;
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }
}

impl Default for EvalLimits {
    fn default() -> Self {
        EvalLimits {
            max_call_depth: Some(Self::DEFAULT_MAX_CALL_DEPTH),
            max_loop_iterations: None,
            deadline: None,
        }
    }
}

/// Stop request shared between a running script and the host.
#[derive(Clone, Debug, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Per-run counters checked against [`EvalLimits`].
#[derive(Debug)]
pub struct BudgetState {
    started: Instant,
    iterations: u64,
    interrupt: Option<InterruptFlag>,
}

impl BudgetState {
    pub fn new(interrupt: Option<InterruptFlag>) -> Self {
        BudgetState {
            started: Instant::now(),
            iterations: 0,
            interrupt,
        }
    }

    /// Checked before every user-function and built-in call.
    #[inline]
    pub fn check_call(&self, limits: &EvalLimits) -> Result<(), EvalError> {
        if self
            .interrupt
            .as_ref()
            .is_some_and(InterruptFlag::is_requested)
        {
            return Err(interrupted("stop requested"));
        }
        if let Some(deadline) = limits.deadline {
            if self.started.elapsed() > deadline {
                return Err(interrupted(format!(
                    "deadline of {} ms exceeded",
                    deadline.as_millis()
                )));
            }
        }
        Ok(())
    }

    /// Checked once per loop iteration, before the body runs.
    #[inline]
    pub fn check_iteration(&mut self, limits: &EvalLimits) -> Result<(), EvalError> {
        self.iterations = self.iterations.saturating_add(1);
        if let Some(max) = limits.max_loop_iterations {
            if self.iterations > max {
                return Err(interrupted(format!(
                    "loop iteration limit of {max} exceeded"
                )));
            }
        }
        self.check_call(limits)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests {
    use super::*;
    use crate::errors::EvalErrorKind;
    use pretty_assertions::assert_eq;

    fn reason(err: &EvalError) -> &str {
        match &err.kind {
            EvalErrorKind::Interrupted { reason } => reason,
            other => panic!("expected interrupt, got {other:?}"),
        }
    }

    #[test]
    fn iteration_budget() {
        let limits = EvalLimits::unlimited().with_max_loop_iterations(Some(3));
        let mut state = BudgetState::new(None);
        for _ in 0..3 {
            assert!(state.check_iteration(&limits).is_ok());
        }
        let err = state.check_iteration(&limits).unwrap_err();
        assert_eq!(reason(&err), "loop iteration limit of 3 exceeded");
    }

    #[test]
    fn interrupt_flag_is_polled() {
        let flag = InterruptFlag::new();
        let state = BudgetState::new(Some(flag.clone()));
        let limits = EvalLimits::default();
        assert!(state.check_call(&limits).is_ok());

        flag.request();
        let err = state.check_call(&limits).unwrap_err();
        assert_eq!(reason(&err), "stop requested");

        flag.clear();
        assert!(state.check_call(&limits).is_ok());
    }

    #[test]
    fn zero_deadline_expires() {
        let limits = EvalLimits::unlimited().with_deadline(Some(Duration::ZERO));
        let state = BudgetState::new(None);
        std::thread::sleep(Duration::from_millis(2));
        assert!(state.check_call(&limits).is_err());
    }

    #[test]
    fn default_limits_bound_call_depth_only() {
        let limits = EvalLimits::default();
        assert_eq!(
            limits.max_call_depth,
            Some(EvalLimits::DEFAULT_MAX_CALL_DEPTH)
        );
        assert_eq!(limits.max_loop_iterations, None);
        assert_eq!(limits.deadline, None);
    }
}
