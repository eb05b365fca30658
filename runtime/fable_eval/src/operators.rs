//! Binary operator implementations for the evaluator.
//!
//! Direct enum dispatch over `(op, operand kinds)`. Both operands are already
//! evaluated when these functions run; `&&` and `||` are eager.

use fable_ir::BinaryOp;

use crate::errors::{division_by_zero, integer_overflow, invalid_operands, EvalResult};
use crate::value::Value;

/// Numeric view of an operand.
#[derive(Clone, Copy, Debug)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn of(value: &Value) -> Option<Num> {
        match value {
            Value::Int(n) => Some(Num::Int(*n)),
            Value::Float(x) => Some(Num::Float(*x)),
            _ => None,
        }
    }

    #[expect(clippy::cast_precision_loss, reason = "mixed int/float arithmetic widens")]
    fn to_f64(self) -> f64 {
        match self {
            Num::Int(n) => n as f64,
            Num::Float(x) => x,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Num::Int(n) => n == 0,
            Num::Float(x) => x == 0.0,
        }
    }
}

/// Evaluate a binary operation.
pub fn evaluate_binary(left: &Value, right: &Value, op: BinaryOp) -> EvalResult {
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Mod => arithmetic(left, right, op),
        BinaryOp::Div => divide(left, right),
        BinaryOp::Eq => Ok(Value::Bool(left.loose_eq(right))),
        BinaryOp::NotEq => Ok(Value::Bool(!left.loose_eq(right))),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            compare(left, right, op)
        }
        BinaryOp::And => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
        BinaryOp::Or => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
    }
}

fn operands(left: &Value, right: &Value, op: BinaryOp) -> EvalResult<(Num, Num)> {
    match (Num::of(left), Num::of(right)) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(invalid_operands(op.as_symbol(), left, right)),
    }
}

/// `+`: string concatenation if either side is a string, numeric sum otherwise.
fn add(left: &Value, right: &Value) -> EvalResult {
    if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) {
        return Ok(Value::string(format!("{left}{right}")));
    }
    arithmetic(left, right, BinaryOp::Add)
}

/// `+ - * %` on numbers. Stays `Int` only when both operands are `Int`.
fn arithmetic(left: &Value, right: &Value, op: BinaryOp) -> EvalResult {
    let (a, b) = operands(left, right, op)?;
    match (a, b) {
        (Num::Int(a), Num::Int(b)) => int_arithmetic(a, b, op),
        _ => {
            let (a, b) = (a.to_f64(), b.to_f64());
            match op {
                BinaryOp::Add => Ok(Value::Float(a + b)),
                BinaryOp::Sub => Ok(Value::Float(a - b)),
                BinaryOp::Mul => Ok(Value::Float(a * b)),
                _ if b == 0.0 => Err(division_by_zero()),
                _ => Ok(Value::Float(a % b)),
            }
        }
    }
}

fn int_arithmetic(a: i64, b: i64, op: BinaryOp) -> EvalResult {
    let (result, name) = match op {
        BinaryOp::Add => (a.checked_add(b), "addition"),
        BinaryOp::Sub => (a.checked_sub(b), "subtraction"),
        BinaryOp::Mul => (a.checked_mul(b), "multiplication"),
        _ if b == 0 => return Err(division_by_zero()),
        _ => (a.checked_rem(b), "remainder"),
    };
    result.map(Value::Int).ok_or_else(|| integer_overflow(name))
}

/// `/` always produces a `Float`.
fn divide(left: &Value, right: &Value) -> EvalResult {
    let (a, b) = operands(left, right, BinaryOp::Div)?;
    if b.is_zero() {
        return Err(division_by_zero());
    }
    Ok(Value::Float(a.to_f64() / b.to_f64()))
}

fn compare(left: &Value, right: &Value, op: BinaryOp) -> EvalResult {
    let (a, b) = operands(left, right, op)?;
    let ordering = match (a, b) {
        (Num::Int(a), Num::Int(b)) => Some(a.cmp(&b)),
        _ => a.to_f64().partial_cmp(&b.to_f64()),
    };
    // NaN compares false against everything.
    let result = ordering.is_some_and(|ord| match op {
        BinaryOp::Lt => ord.is_lt(),
        BinaryOp::LtEq => ord.is_le(),
        BinaryOp::Gt => ord.is_gt(),
        _ => ord.is_ge(),
    });
    Ok(Value::Bool(result))
}
