//! Error types for script evaluation.
//!
//! `EvalErrorKind` is the typed category; `EvalError` wraps it with the source
//! span and the call-stack backtrace captured at the failure site. Construct
//! errors through the `#[cold]` factory functions below, not by hand.
//!
//! Built-ins report failures with the smaller [`BuiltinError`], which the
//! dispatch layer converts into an `EvalError` that names the built-in.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use fable_ir::Span;

use crate::value::Value;

/// Result of evaluation.
pub type EvalResult<T = Value> = Result<T, EvalError>;

/// Failure raised by host code behind a built-in.
pub type HostError = Arc<dyn StdError + Send + Sync + 'static>;

/// Typed error category.
#[derive(Clone, Debug, thiserror::Error)]
pub enum EvalErrorKind {
    // Names
    #[error("undefined variable `{name}`")]
    UndefinedVariable { name: String },
    #[error("undefined function `{name}`")]
    UndefinedFunction { name: String },

    // Types
    #[error("type mismatch: {message}")]
    TypeMismatch { message: String },
    #[error("cannot {action} on null")]
    NullAccess { action: String },
    #[error("`{type_name}` value is not callable")]
    NotCallable { type_name: String },

    // Indexing
    #[error("index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("list index must be a number, got `{got}`")]
    InvalidIndexType { got: String },

    // Arithmetic
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow in {operation}")]
    IntegerOverflow { operation: String },

    // Built-ins
    #[error("`{builtin}`: {message}")]
    ArgumentError { builtin: String, message: String },
    #[error("`{builtin}` failed: {source}")]
    HostInteropFailure {
        builtin: String,
        #[source]
        source: HostError,
    },

    // Resources and lifecycle
    #[error("maximum call depth exceeded (limit: {depth})")]
    StackOverflow { depth: usize },
    #[error("script interrupted: {reason}")]
    Interrupted { reason: String },
    #[error("invalid script: {reason}")]
    InvalidScript { reason: String },
    #[error("script `{script}` is already running")]
    ScriptAlreadyRunning { script: String },
}

/// One frame of a captured backtrace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacktraceFrame {
    pub name: String,
    pub span: Option<Span>,
}

/// Snapshot of the call stack at an error site, most recent call first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalBacktrace {
    frames: Vec<BacktraceFrame>,
}

impl EvalBacktrace {
    pub fn new(frames: Vec<BacktraceFrame>) -> Self {
        EvalBacktrace { frames }
    }

    pub fn frames(&self) -> &[BacktraceFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

impl fmt::Display for EvalBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return Ok(());
        }
        writeln!(f, "stack backtrace:")?;
        for (i, frame) in self.frames.iter().enumerate() {
            write!(f, "  {i}: {}", frame.name)?;
            if let Some(span) = frame.span.filter(|s| !s.is_dummy()) {
                write!(f, " at {span}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Evaluation error.
#[derive(Clone, Debug)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Innermost source location that could be attributed to the failure.
    pub span: Option<Span>,
    /// Call chain leading to the error, captured at the deepest call.
    pub backtrace: Option<EvalBacktrace>,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind) -> Self {
        EvalError {
            kind,
            span: None,
            backtrace: None,
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Attach `span` unless a more precise one is already present.
    /// Dummy spans are ignored.
    #[must_use]
    pub fn or_span(mut self, span: Span) -> Self {
        if self.span.is_none() && !span.is_dummy() {
            self.span = Some(span);
        }
        self
    }

    #[must_use]
    pub fn with_backtrace(mut self, backtrace: EvalBacktrace) -> Self {
        self.backtrace = Some(backtrace);
        self
    }

    #[inline]
    pub fn kind(&self) -> &EvalErrorKind {
        &self.kind
    }

    /// Whether evaluation stopped because of an interrupt or a budget.
    pub fn is_interrupt(&self) -> bool {
        matches!(self.kind, EvalErrorKind::Interrupted { .. })
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(span) = self.span {
            write!(f, " at {span}")?;
        }
        Ok(())
    }
}

impl StdError for EvalError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.kind.source()
    }
}

impl From<EvalErrorKind> for EvalError {
    fn from(kind: EvalErrorKind) -> Self {
        EvalError::new(kind)
    }
}

// Factory functions

#[cold]
pub fn undefined_variable(name: &str) -> EvalError {
    EvalError::new(EvalErrorKind::UndefinedVariable {
        name: name.to_string(),
    })
}

#[cold]
pub fn undefined_function(name: &str) -> EvalError {
    EvalError::new(EvalErrorKind::UndefinedFunction {
        name: name.to_string(),
    })
}

#[cold]
pub fn type_mismatch(message: impl Into<String>) -> EvalError {
    EvalError::new(EvalErrorKind::TypeMismatch {
        message: message.into(),
    })
}

/// Operator applied to operand types it does not support.
#[cold]
pub fn invalid_operands(op: &str, left: &Value, right: &Value) -> EvalError {
    type_mismatch(format!(
        "operator `{op}` cannot be applied to `{}` and `{}`",
        left.type_name(),
        right.type_name()
    ))
}

#[cold]
pub fn invalid_operand(op: &str, operand: &Value) -> EvalError {
    type_mismatch(format!(
        "operator `{op}` cannot be applied to `{}`",
        operand.type_name()
    ))
}

#[cold]
pub fn null_access(action: impl Into<String>) -> EvalError {
    EvalError::new(EvalErrorKind::NullAccess {
        action: action.into(),
    })
}

#[cold]
pub fn not_callable(value: &Value) -> EvalError {
    EvalError::new(EvalErrorKind::NotCallable {
        type_name: value.type_name().to_string(),
    })
}

#[cold]
pub fn index_out_of_range(index: i64, len: usize) -> EvalError {
    EvalError::new(EvalErrorKind::IndexOutOfRange { index, len })
}

#[cold]
pub fn invalid_index_type(got: &Value) -> EvalError {
    EvalError::new(EvalErrorKind::InvalidIndexType {
        got: got.type_name().to_string(),
    })
}

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::new(EvalErrorKind::DivisionByZero)
}

#[cold]
pub fn integer_overflow(operation: &str) -> EvalError {
    EvalError::new(EvalErrorKind::IntegerOverflow {
        operation: operation.to_string(),
    })
}

#[cold]
pub fn recursion_limit_exceeded(limit: usize) -> EvalError {
    EvalError::new(EvalErrorKind::StackOverflow { depth: limit })
}

#[cold]
pub fn interrupted(reason: impl Into<String>) -> EvalError {
    EvalError::new(EvalErrorKind::Interrupted {
        reason: reason.into(),
    })
}

#[cold]
pub fn invalid_script(reason: impl Into<String>) -> EvalError {
    EvalError::new(EvalErrorKind::InvalidScript {
        reason: reason.into(),
    })
}

#[cold]
pub fn script_already_running(script: &str) -> EvalError {
    EvalError::new(EvalErrorKind::ScriptAlreadyRunning {
        script: script.to_string(),
    })
}

/// Failure reported by a built-in implementation.
///
/// Converted into an [`EvalError`] by [`BuiltinError::into_eval`] once the
/// dispatcher knows which built-in raised it.
#[derive(Clone, Debug, thiserror::Error)]
pub enum BuiltinError {
    #[error("expected {expected} argument(s), got {got}")]
    Arity { expected: String, got: usize },
    #[error("argument {position} must be {expected}, got `{got}`")]
    ArgType {
        position: usize,
        expected: &'static str,
        got: &'static str,
    },
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Host(HostError),
}

impl BuiltinError {
    /// Wrap a host-side failure, keeping it as the error source.
    pub fn host(err: impl StdError + Send + Sync + 'static) -> Self {
        BuiltinError::Host(Arc::new(err))
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        BuiltinError::Invalid(message.into())
    }

    /// Argument at `index` had the wrong type. Positions are 1-based in the
    /// message.
    #[cold]
    pub fn arg_type(index: usize, expected: &'static str, got: &Value) -> Self {
        BuiltinError::ArgType {
            position: index + 1,
            expected,
            got: got.type_name(),
        }
    }

    /// Convert into an evaluation error attributed to `builtin`.
    pub fn into_eval(self, builtin: &str) -> EvalError {
        let kind = match self {
            BuiltinError::Host(source) => EvalErrorKind::HostInteropFailure {
                builtin: builtin.to_string(),
                source,
            },
            other => EvalErrorKind::ArgumentError {
                builtin: builtin.to_string(),
                message: other.to_string(),
            },
        };
        EvalError::new(kind)
    }
}
