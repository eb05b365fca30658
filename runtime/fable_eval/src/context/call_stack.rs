//! Live call stack.
//!
//! Every user-function and built-in invocation pushes a frame; the depth
//! limit is checked on push. When an error leaves a call, the interpreter
//! snapshots the frames into an [`EvalBacktrace`] before they unwind.

use fable_ir::Span;

use crate::errors::{recursion_limit_exceeded, BacktraceFrame, EvalBacktrace, EvalError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallFrame {
    pub name: String,
    /// Where the call was made, not where the callee is defined.
    pub call_span: Option<Span>,
}

impl CallFrame {
    pub fn new(name: &str, call_span: Option<Span>) -> Self {
        CallFrame {
            name: name.to_string(),
            call_span,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: Option<usize>,
}

impl CallStack {
    /// `None` means unlimited.
    pub fn new(max_depth: Option<usize>) -> Self {
        CallStack {
            frames: Vec::new(),
            max_depth,
        }
    }

    pub fn set_max_depth(&mut self, max_depth: Option<usize>) {
        self.max_depth = max_depth;
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Push a frame. Fails with `StackOverflow` when the limit is reached;
    /// the frame is not pushed in that case.
    pub fn push(&mut self, frame: CallFrame) -> Result<(), EvalError> {
        if let Some(max) = self.max_depth {
            if self.frames.len() >= max {
                return Err(recursion_limit_exceeded(max));
            }
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) {
        debug_assert!(
            !self.frames.is_empty(),
            "CallStack::pop() called on empty stack"
        );
        self.frames.pop();
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[CallFrame] {
        &self.frames
    }

    pub fn capture(&self) -> EvalBacktrace {
        EvalBacktrace::new(
            self.frames
                .iter()
                .rev()
                .map(|f| BacktraceFrame {
                    name: f.name.clone(),
                    span: f.call_span,
                })
                .collect(),
        )
    }

    /// Attach a backtrace unless the error already carries one from a
    /// deeper frame.
    pub fn attach_backtrace(&self, err: EvalError) -> EvalError {
        if err.backtrace.is_some() || self.frames.is_empty() {
            err
        } else {
            err.with_backtrace(self.capture())
        }
    }
}
