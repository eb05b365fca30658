//! Expression evaluation.

use fable_ir::{Expr, ExprKind, Literal};

use super::Interpreter;
use crate::errors::{
    index_out_of_range, invalid_index_type, null_access, type_mismatch, undefined_variable,
    EvalResult,
};
use crate::operators::evaluate_binary;
use crate::unary_operators::evaluate_unary;
use crate::value::{Value, ValueMap};

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(n) => Value::Int(*n),
        Literal::Float(x) => Value::Float(*x),
        Literal::Str(s) => Value::string(s),
    }
}

/// Element lookup for `target[index]`.
///
/// Float indices are floored, so any negative float is out of range;
/// non-finite ones are rejected.
fn index_list(target: &Value, index: &Value) -> EvalResult {
    let items = match target {
        Value::List(items) => items,
        Value::Null => return Err(null_access("index")),
        other => {
            return Err(type_mismatch(format!(
                "cannot index into `{}`",
                other.type_name()
            )))
        }
    };
    #[allow(
        clippy::cast_possible_truncation,
        reason = "script floats index by flooring"
    )]
    let i = match index {
        Value::Int(n) => *n,
        Value::Float(x) if x.is_finite() => x.floor() as i64,
        other => return Err(invalid_index_type(other)),
    };
    usize::try_from(i)
        .ok()
        .and_then(|u| items.get(u))
        .cloned()
        .ok_or_else(|| index_out_of_range(i, items.len()))
}

impl Interpreter<'_> {
    pub(super) fn exec_expr(&mut self, expr: &Expr) -> EvalResult {
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(literal_value(lit)),
            ExprKind::Identifier(name) => self.lookup_identifier(name),
            ExprKind::Binary { op, left, right } => {
                // Both sides are always evaluated; `&&` and `||` do not
                // short-circuit.
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                evaluate_binary(&left, &right, *op)
            }
            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(operand)?;
                evaluate_unary(&value, *op)
            }
            ExprKind::Call { callee, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval_expr(arg))
                    .collect::<EvalResult<Vec<_>>>()?;
                self.call_named(callee, args, expr.span)
            }
            ExprKind::Member { target, member } => {
                match self.eval_expr(target)? {
                    Value::Map(map) => Ok(map.get(member).cloned().unwrap_or(Value::Null)),
                    Value::Null => Err(null_access(format!("access member `{member}`"))),
                    other => Err(type_mismatch(format!(
                        "cannot access member `{member}` on `{}`",
                        other.type_name()
                    ))),
                }
            }
            ExprKind::Index { target, index } => {
                let target = self.eval_expr(target)?;
                let index = self.eval_expr(index)?;
                index_list(&target, &index)
            }
            ExprKind::Assign { name, value } => {
                let value = self.eval_expr(value)?;
                self.ctx.set_variable(name, value.clone())?;
                Ok(value)
            }
            ExprKind::List(items) => {
                let items = items
                    .iter()
                    .map(|item| self.eval_expr(item))
                    .collect::<EvalResult<Vec<_>>>()?;
                Ok(Value::list(items))
            }
            ExprKind::Map(entries) => {
                let mut map = ValueMap::with_capacity(entries.len());
                for (key, value) in entries {
                    let value = self.eval_expr(value)?;
                    map.insert(key.clone(), value);
                }
                Ok(Value::map(map))
            }
        }
    }

    /// Variables shadow built-ins; a bare built-in name evaluates to a
    /// callable value so it can be passed around.
    fn lookup_identifier(&self, name: &str) -> EvalResult {
        if let Some(value) = self.ctx.get_variable(name) {
            return Ok(value);
        }
        if self.builtins.contains(name) {
            return Ok(Value::builtin(name));
        }
        Err(undefined_variable(name))
    }
}
