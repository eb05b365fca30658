//! Runtime values for the Fable interpreter.
//!
//! Every evaluation produces a [`Value`]. Heap payloads are shared immutably
//! through `Rc`; collections have value semantics, so "mutating" a list means
//! building a new one and rebinding the variable.
//!
//! Always construct heap values through the factory methods:
//!
//! ```text
//! let s = Value::string("hello");
//! let list = Value::list(vec![Value::Int(1)]);
//! ```
//!
//! Coercion and equality rules live here so the interpreter and the
//! built-ins never hand-roll their own type tests.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::context::{Environment, LocalScope, Scope};
use fable_ir::FunctionDecl;

/// Insertion-ordered map payload of [`Value::Map`].
pub type ValueMap = IndexMap<String, Value>;

/// Runtime value.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Rc<Vec<Value>>),
    Map(Rc<ValueMap>),
    Callable(Callable),
}

/// Something a script can call.
#[derive(Clone)]
pub enum Callable {
    /// Entry of the built-in dispatch table, by name.
    Builtin(Rc<str>),
    /// Script-defined function closed over its defining scope.
    User(UserFunction),
}

impl Callable {
    pub fn name(&self) -> &str {
        match self {
            Callable::Builtin(name) => name,
            Callable::User(func) => func.name(),
        }
    }

    /// Identity comparison: same built-in name, or same declaration
    /// captured in the same scope.
    pub fn same_as(&self, other: &Callable) -> bool {
        match (self, other) {
            (Callable::Builtin(a), Callable::Builtin(b)) => a == b,
            (Callable::User(a), Callable::User(b)) => a.same_as(b),
            _ => false,
        }
    }
}

/// A function declaration paired with the scope it was defined in.
///
/// The captured scope is live: later bindings in the defining scope (including
/// the function's own name, which enables recursion) are visible to the body.
#[derive(Clone)]
pub struct UserFunction {
    decl: Rc<FunctionDecl>,
    scope: LocalScope<Scope>,
    global: LocalScope<Scope>,
}

impl UserFunction {
    pub(crate) fn new(
        decl: Rc<FunctionDecl>,
        scope: LocalScope<Scope>,
        global: LocalScope<Scope>,
    ) -> Self {
        UserFunction {
            decl,
            scope,
            global,
        }
    }

    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn params(&self) -> &[String] {
        &self.decl.params
    }

    pub fn decl(&self) -> &Rc<FunctionDecl> {
        &self.decl
    }

    /// Fresh environment for one invocation: a new scope on top of the
    /// defining scope chain.
    pub(crate) fn call_environment(&self) -> Environment {
        let mut env = Environment::from_captured(self.scope.clone(), self.global.clone());
        env.push_scope();
        env
    }

    pub fn same_as(&self, other: &UserFunction) -> bool {
        Rc::ptr_eq(&self.decl, &other.decl) && self.scope.ptr_eq(&other.scope)
    }
}

impl fmt::Debug for UserFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

impl Value {
    // Factory methods

    pub fn string(s: impl AsRef<str>) -> Self {
        Value::Str(Rc::from(s.as_ref()))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(items))
    }

    pub fn map(entries: ValueMap) -> Self {
        Value::Map(Rc::new(entries))
    }

    /// Build a map from `(key, value)` pairs, keeping their order.
    pub fn map_from<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn builtin(name: &str) -> Self {
        Value::Callable(Callable::Builtin(Rc::from(name)))
    }

    // Classification

    /// Script-facing type name, used in error messages and `type_of`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Callable(_) => "function",
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Numeric value widened to `f64`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            #[expect(clippy::cast_precision_loss, reason = "scripts mix int and float freely")]
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Truthiness coercion used by `if`, `while`, `!`, `&&` and `||`.
    ///
    /// `null`, `false`, zero, `""`, `[]` and `{}` are falsy; everything else
    /// (including functions) is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
            Value::Callable(_) => true,
        }
    }

    /// Equality as seen by the script `==` operator.
    ///
    /// `null` equals only `null`; `int` and `float` compare by numeric value;
    /// lists and maps compare element-wise with the same rule.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => {
                int_equals_float(*i, *f)
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.loose_eq(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .all(|(k, v)| b.get(k).is_some_and(|w| v.loose_eq(w)))
            }
            (Value::Callable(a), Value::Callable(b)) => a.same_as(b),
            _ => false,
        }
    }
}

/// Exact mixed comparison: the float must be integral and inside `i64`
/// range, so large ints never match a float that merely rounds to them.
fn int_equals_float(i: i64, f: f64) -> bool {
    // 2^63, exactly representable.
    const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
    #[allow(
        clippy::cast_possible_truncation,
        reason = "integral and range-checked above"
    )]
    let exact = f.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&f) && f as i64 == i;
    exact
}

/// Strict equality: `Int(5) != Float(5.0)`, map order matters.
///
/// Used by hosts and tests to check exact results; scripts use
/// [`Value::loose_eq`].
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (Value::Callable(a), Value::Callable(b)) => a.same_as(b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

/// Formats a float so integral values keep a trailing `.0`.
fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 {
        write!(f, "{x:.1}")
    } else {
        write!(f, "{x}")
    }
}

/// Textual form, used by string concatenation, `str()` and `print`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write_float(f, *x),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.fmt_nested(f)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: ")?;
                    value.fmt_nested(f)?;
                }
                write!(f, "}}")
            }
            Value::Callable(c) => write!(f, "<fn {}>", c.name()),
        }
    }
}

impl Value {
    /// Strings inside collections are quoted so `["a"]` and `[a]` differ.
    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s:?}"),
            other => fmt::Display::fmt(other, f),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(x) => write!(f, "Float({x:?})"),
            Value::Str(s) => write!(f, "Str({:?})", &**s),
            Value::List(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Map(entries) => f.debug_map().entries(entries.iter()).finish(),
            Value::Callable(c) => write!(f, "<fn {}>", c.name()),
        }
    }
}
