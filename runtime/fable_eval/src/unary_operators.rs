//! Unary operator implementations for the evaluator.

use fable_ir::UnaryOp;

use crate::errors::{integer_overflow, invalid_operand, EvalResult};
use crate::value::Value;

/// Evaluate a unary operation. `-` keeps the `Int`/`Float` kind.
pub fn evaluate_unary(operand: &Value, op: UnaryOp) -> EvalResult {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
        UnaryOp::Neg => match operand {
            Value::Int(n) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| integer_overflow("negation")),
            Value::Float(x) => Ok(Value::Float(-x)),
            other => Err(invalid_operand(op.as_symbol(), other)),
        },
    }
}
