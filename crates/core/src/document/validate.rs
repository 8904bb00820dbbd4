//! Validation of caller-supplied payloads before they reach the store.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid content-type: expected application/json, got {0}")]
    ContentType(String),
    #[error("malformed JSON body: {0}")]
    MalformedJson(String),
    #[error("request body must be a JSON object")]
    NotAnObject,
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },
}

/// Accept `application/json`, with or without parameters such as charset.
pub fn require_json_content_type(content_type: Option<&str>) -> Result<(), ValidationError> {
    let raw = content_type.unwrap_or("");
    let essence = raw.split(';').next().unwrap_or("").trim();
    if essence.eq_ignore_ascii_case("application/json") {
        Ok(())
    } else if raw.is_empty() {
        Err(ValidationError::ContentType("none".to_string()))
    } else {
        Err(ValidationError::ContentType(raw.to_string()))
    }
}

/// Parse a request body into a JSON object.
pub fn parse_object(body: &[u8]) -> Result<Map<String, Value>, ValidationError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ValidationError::NotAnObject),
        Err(e) => Err(ValidationError::MalformedJson(e.to_string())),
    }
}

/// Check that every field in `required` is present and non-blank.
///
/// Strings must contain non-whitespace; objects count as present when they
/// carry a non-blank `name`. All missing fields are reported together.
pub fn require_fields(object: &Map<String, Value>, required: &[&str]) -> Result<(), ValidationError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|field| !is_present(object.get(**field)))
        .map(|field| field.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFields(missing))
    }
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Object(map)) => is_present(map.get("name")),
        Some(_) => true,
    }
}

/// Loose email shape check: `local@domain.tld` with no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_type_accepts_json_with_charset() {
        assert!(require_json_content_type(Some("application/json")).is_ok());
        assert!(require_json_content_type(Some("application/json; charset=utf-8")).is_ok());
        assert_eq!(
            require_json_content_type(Some("text/plain")),
            Err(ValidationError::ContentType("text/plain".into()))
        );
        assert_eq!(
            require_json_content_type(None),
            Err(ValidationError::ContentType("none".into()))
        );
    }

    #[test]
    fn parse_object_rejects_non_objects() {
        assert!(parse_object(b"{\"a\":1}").is_ok());
        assert_eq!(parse_object(b"[1]"), Err(ValidationError::NotAnObject));
        assert!(matches!(
            parse_object(b"{oops"),
            Err(ValidationError::MalformedJson(_))
        ));
    }

    #[test]
    fn require_fields_reports_all_missing() {
        let object = match json!({"title": "T", "content": "  ", "author": {"name": ""}}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let err = require_fields(&object, &["title", "content", "author", "slug"]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields(vec![
                "content".into(),
                "author".into(),
                "slug".into()
            ])
        );
        assert_eq!(err.to_string(), "missing required fields: content, author, slug");
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("dana@vbcai.org"));
        assert!(!is_valid_email("dana@vbcai"));
        assert!(!is_valid_email("dana vbcai.org"));
        assert!(!is_valid_email("@vbcai.org"));
        assert!(!is_valid_email("dana@@vbcai.org"));
        assert!(!is_valid_email("dana@.org"));
    }
}
