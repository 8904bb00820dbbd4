//! Compile filter expressions into PostgreSQL over the `documents` table.
//!
//! Every value is handled as `jsonb`: document fields come from
//! `content -> 'field'`, literals and parameters are bound as JSON. Field
//! names are always bound, never interpolated.

use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};
use vbc_blog_query::functions::BUILTINS;
use vbc_blog_query::{Direction, Expr, OrderBy};

use super::StoreError;
use crate::document::model::{CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD};

/// Push a boolean SQL condition for `expr`.
pub fn push_predicate(
    qb: &mut QueryBuilder<'_, Postgres>,
    expr: &Expr,
    params: &Map<String, Value>,
) -> Result<(), StoreError> {
    match expr {
        Expr::Everything => {
            qb.push("TRUE");
        }
        Expr::BoolLiteral(b) => {
            qb.push(if *b { "TRUE" } else { "FALSE" });
        }
        Expr::And(l, r) | Expr::Or(l, r) => {
            let op = if matches!(expr, Expr::And(..)) { " AND " } else { " OR " };
            qb.push("(");
            push_predicate(qb, l, params)?;
            qb.push(op);
            push_predicate(qb, r, params)?;
            qb.push(")");
        }
        Expr::Not(inner) => {
            qb.push("NOT COALESCE(");
            push_predicate(qb, inner, params)?;
            qb.push(", FALSE)");
        }
        Expr::Eq(l, r) => push_binary(qb, l, " = ", r, params)?,
        Expr::Neq(l, r) => push_binary(qb, l, " IS DISTINCT FROM ", r, params)?,
        Expr::Lt(l, r) => push_ordered(qb, l, " < ", r, params)?,
        Expr::Gt(l, r) => push_ordered(qb, l, " > ", r, params)?,
        Expr::Lte(l, r) => push_ordered(qb, l, " <= ", r, params)?,
        Expr::Gte(l, r) => push_ordered(qb, l, " >= ", r, params)?,
        Expr::In(needle, haystack) => {
            qb.push("COALESCE(jsonb_typeof(");
            push_value(qb, haystack, params)?;
            qb.push(") = 'array' AND ");
            push_value(qb, haystack, params)?;
            qb.push(" @> jsonb_build_array(");
            push_value(qb, needle, params)?;
            qb.push("), FALSE)");
        }
        Expr::FuncCall(name, args) if name == "defined" => {
            let arg = single_arg(name, args)?;
            qb.push("(");
            push_value(qb, arg, params)?;
            qb.push(" IS NOT NULL AND ");
            push_value(qb, arg, params)?;
            qb.push(" <> 'null'::jsonb)");
        }
        other => {
            qb.push("COALESCE(");
            push_value(qb, other, params)?;
            qb.push(" = 'true'::jsonb, FALSE)");
        }
    }
    Ok(())
}

/// Push a `jsonb`-typed SQL expression for `expr`.
pub fn push_value(
    qb: &mut QueryBuilder<'_, Postgres>,
    expr: &Expr,
    params: &Map<String, Value>,
) -> Result<(), StoreError> {
    match expr {
        Expr::StringLiteral(s) => bind_json(qb, Value::String(s.clone())),
        Expr::IntLiteral(n) => bind_json(qb, Value::Number((*n).into())),
        Expr::FloatLiteral(n) => bind_json(
            qb,
            serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        ),
        Expr::BoolLiteral(b) => bind_json(qb, Value::Bool(*b)),
        Expr::Null => {
            qb.push("'null'::jsonb");
        }
        Expr::Param(name) => {
            let value = params
                .get(name)
                .cloned()
                .ok_or_else(|| StoreError::Query(format!("missing parameter: ${name}")))?;
            bind_json(qb, value);
        }
        Expr::Array(items) => {
            qb.push("jsonb_build_array(");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    qb.push(", ");
                }
                push_value(qb, item, params)?;
            }
            qb.push(")");
        }
        Expr::Ident(name) => match name.as_str() {
            ID_FIELD => {
                qb.push("to_jsonb(document_id)");
            }
            CREATED_AT_FIELD => {
                qb.push("to_jsonb(created_at)");
            }
            UPDATED_AT_FIELD => {
                qb.push("to_jsonb(updated_at)");
            }
            _ => {
                qb.push("(content -> ");
                qb.push_bind(name.clone());
                qb.push(")");
            }
        },
        Expr::DotAccess(base, field) => {
            qb.push("(");
            push_value(qb, base, params)?;
            qb.push(" -> ");
            qb.push_bind(field.clone());
            qb.push(")");
        }
        Expr::FuncCall(name, args) => push_function(qb, name, args, params)?,
        Expr::Eq(..)
        | Expr::Neq(..)
        | Expr::Lt(..)
        | Expr::Gt(..)
        | Expr::Lte(..)
        | Expr::Gte(..)
        | Expr::In(..)
        | Expr::And(..)
        | Expr::Or(..)
        | Expr::Not(..) => {
            qb.push("to_jsonb(");
            push_predicate(qb, expr, params)?;
            qb.push(")");
        }
        Expr::This | Expr::Everything => {
            return Err(StoreError::Query(
                "`@` and `*` cannot be used as values in stored queries".to_string(),
            ))
        }
    }
    Ok(())
}

/// Push `ORDER BY ...` for the requested keys, falling back to creation order.
pub fn push_order(qb: &mut QueryBuilder<'_, Postgres>, order: &[OrderBy]) {
    qb.push(" ORDER BY ");
    for key in order {
        match key.field.as_str() {
            ID_FIELD => {
                qb.push("document_id");
            }
            CREATED_AT_FIELD => {
                qb.push("created_at");
            }
            UPDATED_AT_FIELD => {
                qb.push("updated_at");
            }
            path => {
                qb.push("content");
                for segment in path.split('.') {
                    qb.push(" -> ");
                    qb.push_bind(segment.to_string());
                }
            }
        }
        qb.push(match key.direction {
            Direction::Asc => " ASC NULLS LAST, ",
            Direction::Desc => " DESC NULLS LAST, ",
        });
    }
    qb.push("created_at ASC, document_id ASC");
}

fn push_binary(
    qb: &mut QueryBuilder<'_, Postgres>,
    l: &Expr,
    op: &str,
    r: &Expr,
    params: &Map<String, Value>,
) -> Result<(), StoreError> {
    qb.push("(");
    push_value(qb, l, params)?;
    qb.push(op);
    push_value(qb, r, params)?;
    qb.push(")");
    Ok(())
}

// jsonb orders across types; only compare values of the same type.
fn push_ordered(
    qb: &mut QueryBuilder<'_, Postgres>,
    l: &Expr,
    op: &str,
    r: &Expr,
    params: &Map<String, Value>,
) -> Result<(), StoreError> {
    qb.push("(jsonb_typeof(");
    push_value(qb, l, params)?;
    qb.push(") IN ('number', 'string', 'boolean') AND jsonb_typeof(");
    push_value(qb, l, params)?;
    qb.push(") = jsonb_typeof(");
    push_value(qb, r, params)?;
    qb.push(") AND ");
    push_binary(qb, l, op, r, params)?;
    qb.push(")");
    Ok(())
}

fn push_function(
    qb: &mut QueryBuilder<'_, Postgres>,
    name: &str,
    args: &[Expr],
    params: &Map<String, Value>,
) -> Result<(), StoreError> {
    if !BUILTINS.contains(&name) {
        return Err(StoreError::Query(format!("unknown function: {name}")));
    }
    let arg = single_arg(name, args)?;
    match name {
        "count" => {
            qb.push("to_jsonb(CASE WHEN jsonb_typeof(");
            push_value(qb, arg, params)?;
            qb.push(") = 'array' THEN jsonb_array_length(");
            push_value(qb, arg, params)?;
            qb.push(") ELSE 0 END)");
        }
        "length" => {
            qb.push("to_jsonb(CASE jsonb_typeof(");
            push_value(qb, arg, params)?;
            qb.push(") WHEN 'array' THEN jsonb_array_length(");
            push_value(qb, arg, params)?;
            qb.push(") WHEN 'string' THEN char_length(");
            push_value(qb, arg, params)?;
            qb.push(" #>> '{}') END)");
        }
        "lower" => {
            qb.push("to_jsonb(CASE WHEN jsonb_typeof(");
            push_value(qb, arg, params)?;
            qb.push(") = 'string' THEN lower(");
            push_value(qb, arg, params)?;
            qb.push(" #>> '{}') END)");
        }
        _ => {
            // defined()
            qb.push("to_jsonb(");
            push_predicate(qb, &Expr::FuncCall(name.to_string(), args.to_vec()), params)?;
            qb.push(")");
        }
    }
    Ok(())
}

fn single_arg<'e>(name: &str, args: &'e [Expr]) -> Result<&'e Expr, StoreError> {
    match args {
        [arg] => Ok(arg),
        _ => Err(StoreError::Query(format!(
            "{name}() expects exactly one argument"
        ))),
    }
}

fn bind_json(qb: &mut QueryBuilder<'_, Postgres>, value: Value) {
    qb.push_bind(Json(value));
    qb.push("::jsonb");
}

#[cfg(test)]
mod tests {
    use super::*;
    use vbc_blog_query::parse;

    fn compile(filter: &str, params: Value) -> Result<String, StoreError> {
        let params = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 WHERE ");
        push_predicate(&mut qb, &parse(filter).unwrap(), &params)?;
        Ok(qb.sql().to_string())
    }

    #[test]
    fn equality_and_id_exclusion() {
        let sql = compile(
            "category == $category && _id != $id",
            serde_json::json!({"category": "A", "id": "x"}),
        )
        .unwrap();
        assert_eq!(
            sql,
            "SELECT 1 WHERE (((content -> $1) = $2::jsonb) AND (to_jsonb(document_id) IS DISTINCT FROM $3::jsonb))"
        );
    }

    #[test]
    fn membership_uses_containment() {
        let sql = compile("$tag in tags", serde_json::json!({"tag": "x"})).unwrap();
        assert!(sql.contains("@> jsonb_build_array($3::jsonb)"), "{sql}");
        assert!(sql.starts_with("SELECT 1 WHERE COALESCE(jsonb_typeof((content -> $1)) = 'array'"));
    }

    #[test]
    fn missing_params_and_unknown_functions_fail() {
        assert!(matches!(
            compile("_id == $id", serde_json::json!({})),
            Err(StoreError::Query(_))
        ));
        assert!(matches!(
            compile("references(author) == true", serde_json::json!({})),
            Err(StoreError::Query(_))
        ));
    }

    #[test]
    fn order_binds_field_segments() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1");
        push_order(
            &mut qb,
            &[OrderBy::desc("createdAt"), OrderBy::asc("author.name")],
        );
        assert_eq!(
            qb.sql(),
            "SELECT 1 ORDER BY created_at DESC NULLS LAST, content -> $1 -> $2 ASC NULLS LAST, created_at ASC, document_id ASC"
        );
    }
}
