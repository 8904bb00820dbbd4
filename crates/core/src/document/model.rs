use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::id::DocumentId;
use super::validate::ValidationError;

/// Field name of the document ID as seen by filters.
pub const ID_FIELD: &str = "_id";
/// Field name of the creation timestamp as seen by filters.
pub const CREATED_AT_FIELD: &str = "createdAt";
/// Field name of the last-update timestamp as seen by filters.
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// A document stored in one collection of the document store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    /// Arbitrary document fields.
    #[serde(flatten)]
    pub content: Map<String, Value>,
}

impl Document {
    /// Build a new document from caller-supplied content.
    ///
    /// `_id` and `createdAt` may be supplied to import existing records;
    /// otherwise a fresh ID and `now` are used. System fields are stripped
    /// from the stored content.
    pub fn new(mut content: Map<String, Value>, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let id = match content.remove(ID_FIELD) {
            None | Some(Value::Null) => DocumentId::generate(),
            Some(Value::String(raw)) => DocumentId::parse(&raw).map_err(|e| {
                ValidationError::InvalidField {
                    field: ID_FIELD.to_string(),
                    reason: e.to_string(),
                }
            })?,
            Some(_) => {
                return Err(ValidationError::InvalidField {
                    field: ID_FIELD.to_string(),
                    reason: "must be a string".to_string(),
                })
            }
        };

        let created_at = match content.remove(CREATED_AT_FIELD) {
            None | Some(Value::Null) => now,
            Some(Value::String(raw)) => DateTime::parse_from_rfc3339(&raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| ValidationError::InvalidField {
                    field: CREATED_AT_FIELD.to_string(),
                    reason: e.to_string(),
                })?,
            Some(_) => {
                return Err(ValidationError::InvalidField {
                    field: CREATED_AT_FIELD.to_string(),
                    reason: "must be an RFC 3339 timestamp".to_string(),
                })
            }
        };
        content.remove(UPDATED_AT_FIELD);

        Ok(Self {
            id,
            created_at,
            updated_at: now,
            content,
        })
    }

    /// The document as a single JSON object, system fields included, in the
    /// shape filters are evaluated against. Timestamps use a fixed-width
    /// RFC 3339 form so they order correctly as strings.
    pub fn to_value(&self) -> Value {
        let mut map = self.content.clone();
        map.insert(ID_FIELD.to_string(), Value::String(self.id.to_string()));
        map.insert(
            CREATED_AT_FIELD.to_string(),
            Value::String(timestamp_string(&self.created_at)),
        );
        map.insert(
            UPDATED_AT_FIELD.to_string(),
            Value::String(timestamp_string(&self.updated_at)),
        );
        Value::Object(map)
    }
}

pub fn timestamp_string(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Database row representation of a document.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentRow {
    pub document_id: String,
    pub content: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DocumentRow> for Document {
    type Error = String;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        let id = DocumentId::parse(&row.document_id).map_err(|e| e.to_string())?;
        let content = match row.content {
            Value::Object(map) => map,
            other => return Err(format!("document {id} content is not an object: {other}")),
        };
        Ok(Self {
            id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn new_assigns_id_and_timestamps() {
        let now = Utc.with_ymd_and_hms(2025, 3, 4, 12, 0, 0).unwrap();
        let doc = Document::new(object(json!({"title": "Hello"})), now).unwrap();
        assert_eq!(doc.created_at, now);
        assert_eq!(doc.updated_at, now);
        assert_eq!(doc.id.as_str().len(), 32);
        assert_eq!(doc.content.get("title"), Some(&json!("Hello")));
    }

    #[test]
    fn new_honours_imported_id_and_created_at() {
        let now = Utc.with_ymd_and_hms(2025, 3, 4, 12, 0, 0).unwrap();
        let doc = Document::new(
            object(json!({
                "_id": "legacy-1",
                "createdAt": "2024-01-02T03:04:05Z",
                "updatedAt": "ignored",
                "title": "Hello",
            })),
            now,
        )
        .unwrap();
        assert_eq!(doc.id.as_str(), "legacy-1");
        assert_eq!(
            doc.created_at,
            Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
        );
        assert!(!doc.content.contains_key("_id"));
        assert!(!doc.content.contains_key("updatedAt"));
    }

    #[test]
    fn new_rejects_malformed_system_fields() {
        let now = Utc::now();
        assert!(matches!(
            Document::new(object(json!({"_id": 7})), now),
            Err(ValidationError::InvalidField { field, .. }) if field == "_id"
        ));
        assert!(matches!(
            Document::new(object(json!({"createdAt": "yesterday"})), now),
            Err(ValidationError::InvalidField { field, .. }) if field == "createdAt"
        ));
    }

    #[test]
    fn to_value_exposes_system_fields() {
        let now = Utc.with_ymd_and_hms(2025, 3, 4, 12, 0, 0).unwrap();
        let doc = Document::new(object(json!({"_id": "abc", "title": "Hello"})), now).unwrap();
        let value = doc.to_value();
        assert_eq!(value["_id"], json!("abc"));
        assert_eq!(value["createdAt"], json!("2025-03-04T12:00:00.000000Z"));
        assert_eq!(value["title"], json!("Hello"));
    }
}
