//! Standard built-ins available to every script.

use std::rc::Rc;

use super::{
    arg, expect_arity, expect_arity_range, expect_int, expect_list, expect_number,
    BuiltinRegistry, SharedPrintHandler,
};
use crate::errors::BuiltinError;
use crate::value::Value;

/// Upper bound on the length of a list produced by `range`.
const MAX_RANGE_LEN: i64 = 1_000_000;

pub(super) fn register(registry: &mut BuiltinRegistry, print: SharedPrintHandler) {
    registry
        .register("print", move |args, _| {
            let line = args
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            print.println(&line);
            Ok(Value::Null)
        })
        .register("len", |args, _| {
            expect_arity(args, 1)?;
            let len = match &args[0] {
                Value::Str(s) => s.chars().count(),
                Value::List(items) => items.len(),
                Value::Map(entries) => entries.len(),
                other => return Err(BuiltinError::arg_type(0, "a string, list or map", other)),
            };
            Ok(Value::Int(i64::try_from(len).unwrap_or(i64::MAX)))
        })
        .register("str", |args, _| {
            expect_arity(args, 1)?;
            Ok(Value::string(args[0].to_string()))
        })
        .register("int", |args, _| {
            expect_arity(args, 1)?;
            to_int(&args[0]).map(Value::Int)
        })
        .register("float", |args, _| {
            expect_arity(args, 1)?;
            to_float(&args[0]).map(Value::Float)
        })
        .register("type_of", |args, _| {
            expect_arity(args, 1)?;
            Ok(Value::string(args[0].type_name()))
        })
        .register("push", |args, _| {
            expect_arity(args, 2)?;
            let mut items = expect_list(args, 0)?.to_vec();
            items.push(args[1].clone());
            Ok(Value::list(items))
        })
        .register("keys", |args, _| {
            expect_arity(args, 1)?;
            match &args[0] {
                Value::Map(entries) => Ok(Value::list(
                    entries.keys().map(Value::string).collect(),
                )),
                other => Err(BuiltinError::arg_type(0, "a map", other)),
            }
        })
        .register("contains", |args, _| {
            expect_arity(args, 2)?;
            let needle = &args[1];
            let found = match &args[0] {
                Value::List(items) => items.iter().any(|item| item.loose_eq(needle)),
                Value::Map(entries) => match needle {
                    Value::Str(key) => entries.contains_key(&**key),
                    other => return Err(BuiltinError::arg_type(1, "a string key", other)),
                },
                Value::Str(hay) => match needle {
                    Value::Str(sub) => hay.contains(&**sub),
                    other => return Err(BuiltinError::arg_type(1, "a string", other)),
                },
                other => return Err(BuiltinError::arg_type(0, "a list, map or string", other)),
            };
            Ok(Value::Bool(found))
        })
        .register("range", |args, _| {
            expect_arity_range(args, 1, Some(2))?;
            let (start, end) = if args.len() == 1 {
                (0, expect_int(args, 0)?)
            } else {
                (expect_int(args, 0)?, expect_int(args, 1)?)
            };
            if end.saturating_sub(start) > MAX_RANGE_LEN {
                return Err(BuiltinError::invalid(format!(
                    "range of more than {MAX_RANGE_LEN} elements"
                )));
            }
            Ok(Value::list((start..end).map(Value::Int).collect()))
        })
        .register("abs", |args, _| {
            expect_arity(args, 1)?;
            match &args[0] {
                Value::Int(n) => n
                    .checked_abs()
                    .map(Value::Int)
                    .ok_or_else(|| BuiltinError::invalid("integer overflow")),
                Value::Float(x) => Ok(Value::Float(x.abs())),
                other => Err(BuiltinError::arg_type(0, "a number", other)),
            }
        })
        .register("min", |args, _| extremum(args, |candidate, best| candidate < best))
        .register("max", |args, _| extremum(args, |candidate, best| candidate > best));
}

/// Pick the argument `better` prefers, keeping its original `Int`/`Float`
/// kind. Earlier arguments win ties.
fn extremum(args: &[Value], better: fn(f64, f64) -> bool) -> Result<Value, BuiltinError> {
    expect_arity_range(args, 1, None)?;
    let mut best = arg(args, 0)?;
    let mut best_n = expect_number(args, 0)?;
    for (index, candidate) in args.iter().enumerate().skip(1) {
        let n = expect_number(args, index)?;
        if better(n, best_n) {
            best = candidate;
            best_n = n;
        }
    }
    Ok(best.clone())
}

#[expect(clippy::cast_possible_truncation, reason = "int() truncates toward zero")]
fn to_int(value: &Value) -> Result<i64, BuiltinError> {
    match value {
        Value::Int(n) => Ok(*n),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Float(x) if x.is_finite() => Ok(x.trunc() as i64),
        Value::Float(x) => Err(BuiltinError::invalid(format!(
            "cannot convert {x} to int"
        ))),
        Value::Str(s) => parse_number(s).and_then(|v| to_int(&v)),
        other => Err(BuiltinError::arg_type(0, "a number, bool or string", other)),
    }
}

fn to_float(value: &Value) -> Result<f64, BuiltinError> {
    match value {
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Str(s) => parse_number(s).and_then(|v| to_float(&v)),
        other => other
            .as_number()
            .ok_or_else(|| BuiltinError::arg_type(0, "a number, bool or string", other)),
    }
}

fn parse_number(text: &Rc<str>) -> Result<Value, BuiltinError> {
    let trimmed = text.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(Value::Int(n));
    }
    trimmed
        .parse::<f64>()
        .map(Value::Float)
        .map_err(|_| BuiltinError::invalid(format!("cannot parse {trimmed:?} as a number")))
}
