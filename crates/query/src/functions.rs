// Built-in filter functions (defined, count, length, lower).

use serde_json::Value;

use crate::eval::EvalError;

/// Names accepted by [`call_builtin`]; backends that compile filters use
/// this to reject unknown calls up front.
pub const BUILTINS: &[&str] = &["count", "defined", "length", "lower"];

/// Evaluate a built-in function by name.
pub fn call_builtin(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    match name {
        "count" => builtin_count(args),
        "defined" => builtin_defined(args),
        "length" => builtin_length(args),
        "lower" => builtin_lower(args),
        _ => Err(EvalError::TypeError(format!("unknown function: {name}"))),
    }
}

fn builtin_count(args: &[Value]) -> Result<Value, EvalError> {
    match args.first() {
        Some(Value::Array(arr)) => Ok(Value::Number(arr.len().into())),
        Some(Value::Null) => Ok(Value::Number(0.into())),
        _ => Err(EvalError::TypeError("count() expects an array".into())),
    }
}

fn builtin_defined(args: &[Value]) -> Result<Value, EvalError> {
    match args.first() {
        Some(Value::Null) | None => Ok(Value::Bool(false)),
        _ => Ok(Value::Bool(true)),
    }
}

fn builtin_length(args: &[Value]) -> Result<Value, EvalError> {
    match args.first() {
        Some(Value::String(s)) => Ok(Value::Number(s.chars().count().into())),
        Some(Value::Array(a)) => Ok(Value::Number(a.len().into())),
        _ => Ok(Value::Null),
    }
}

fn builtin_lower(args: &[Value]) -> Result<Value, EvalError> {
    match args.first() {
        Some(Value::String(s)) => Ok(Value::String(s.to_lowercase())),
        _ => Ok(Value::Null),
    }
}
