//! Document ID utilities.
//!
//! IDs assigned by the store are UUID v4 in simple form (32 lowercase hex
//! characters). IDs arriving from outside (URL paths, imports) are accepted
//! when they are 1..=128 characters of `[A-Za-z0-9_.-]`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

const MAX_ID_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("document id cannot be empty")]
    Empty,
    #[error("document id exceeds 128 characters")]
    TooLong,
    #[error("document id contains invalid character '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    /// Generate a fresh store-assigned ID.
    pub fn generate() -> Self {
        DocumentId(Uuid::new_v4().simple().to_string())
    }

    /// Parse an externally supplied ID.
    pub fn parse(id: &str) -> Result<Self, IdError> {
        if id.is_empty() {
            return Err(IdError::Empty);
        }
        if id.chars().count() > MAX_ID_LEN {
            return Err(IdError::TooLong);
        }
        if let Some(bad) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
        {
            return Err(IdError::InvalidChar(bad));
        }
        Ok(DocumentId(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DocumentId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DocumentId::parse(&value)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_simple_uuids() {
        let id = DocumentId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(DocumentId::parse(id.as_str()).unwrap(), id);
        assert_ne!(DocumentId::generate(), id);
    }

    #[test]
    fn parse_accepts_firestore_style_ids() {
        let id = DocumentId::parse("Xk3pQ9-a_b.c").unwrap();
        assert_eq!(id.to_string(), "Xk3pQ9-a_b.c");
    }

    #[test]
    fn parse_rejects_bad_ids() {
        assert_eq!(DocumentId::parse(""), Err(IdError::Empty));
        assert_eq!(DocumentId::parse("a/b"), Err(IdError::InvalidChar('/')));
        assert_eq!(
            DocumentId::parse(&"a".repeat(MAX_ID_LEN + 1)),
            Err(IdError::TooLong)
        );
    }

    #[test]
    fn serde_round_trips_through_string() {
        let id: DocumentId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
        assert!(serde_json::from_str::<DocumentId>("\"a b\"").is_err());
    }
}
