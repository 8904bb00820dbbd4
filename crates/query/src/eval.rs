// In-memory evaluation of filter expressions against JSON documents.

use std::cmp::Ordering;

use serde_json::Value;

use crate::ast::Expr;
use crate::functions::call_builtin;

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("type error: {0}")]
    TypeError(String),
    #[error("missing parameter: ${0}")]
    MissingParam(String),
}

/// Evaluate `expr` as a predicate. Anything other than `true` rejects the document.
pub fn eval_filter(expr: &Expr, doc: &Value, params: &Value) -> Result<bool, EvalError> {
    match eval_expr(expr, doc, params)? {
        Value::Bool(b) => Ok(b),
        _ => Ok(false),
    }
}

pub fn eval_expr(expr: &Expr, doc: &Value, params: &Value) -> Result<Value, EvalError> {
    match expr {
        Expr::Everything => Ok(Value::Bool(true)),
        Expr::BoolLiteral(b) => Ok(Value::Bool(*b)),
        Expr::IntLiteral(n) => Ok(Value::Number((*n).into())),
        Expr::FloatLiteral(n) => Ok(serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or(Value::Null)),
        Expr::StringLiteral(s) => Ok(Value::String(s.clone())),
        Expr::Null => Ok(Value::Null),
        Expr::Array(items) => items
            .iter()
            .map(|item| eval_expr(item, doc, params))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expr::Ident(name) => Ok(doc.get(name).cloned().unwrap_or(Value::Null)),
        Expr::DotAccess(base, field) => {
            let v = eval_expr(base, doc, params)?;
            Ok(v.get(field).cloned().unwrap_or(Value::Null))
        }
        Expr::Param(name) => params
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::MissingParam(name.clone())),
        Expr::This => Ok(doc.clone()),
        Expr::Eq(l, r) => {
            let lv = eval_expr(l, doc, params)?;
            let rv = eval_expr(r, doc, params)?;
            Ok(Value::Bool(values_equal(&lv, &rv)))
        }
        Expr::Neq(l, r) => {
            let lv = eval_expr(l, doc, params)?;
            let rv = eval_expr(r, doc, params)?;
            Ok(Value::Bool(!values_equal(&lv, &rv)))
        }
        Expr::Lt(l, r) => compare(l, r, doc, params, |o| o == Ordering::Less),
        Expr::Gt(l, r) => compare(l, r, doc, params, |o| o == Ordering::Greater),
        Expr::Lte(l, r) => compare(l, r, doc, params, |o| o != Ordering::Greater),
        Expr::Gte(l, r) => compare(l, r, doc, params, |o| o != Ordering::Less),
        Expr::In(needle, haystack) => {
            let needle = eval_expr(needle, doc, params)?;
            match eval_expr(haystack, doc, params)? {
                Value::Array(items) => Ok(Value::Bool(
                    items.iter().any(|item| values_equal(item, &needle)),
                )),
                _ => Ok(Value::Bool(false)),
            }
        }
        Expr::And(l, r) => Ok(Value::Bool(
            eval_filter(l, doc, params)? && eval_filter(r, doc, params)?,
        )),
        Expr::Or(l, r) => Ok(Value::Bool(
            eval_filter(l, doc, params)? || eval_filter(r, doc, params)?,
        )),
        Expr::Not(inner) => match eval_expr(inner, doc, params)? {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            _ => Ok(Value::Null),
        },
        Expr::FuncCall(name, args) => {
            let args = args
                .iter()
                .map(|arg| eval_expr(arg, doc, params))
                .collect::<Result<Vec<_>, _>>()?;
            call_builtin(name, &args)
        }
    }
}

fn compare(
    l: &Expr,
    r: &Expr,
    doc: &Value,
    params: &Value,
    accept: impl Fn(Ordering) -> bool,
) -> Result<Value, EvalError> {
    let lv = eval_expr(l, doc, params)?;
    let rv = eval_expr(r, doc, params)?;
    Ok(match compare_values(&lv, &rv) {
        Some(ordering) => Value::Bool(accept(ordering)),
        None => Value::Null,
    })
}

/// Equality with numbers compared by value, so `1 == 1.0`.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Ordering between two values of the same scalar kind. Mixed kinds,
/// nulls, arrays and objects are unordered.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
