//! Document store abstraction.
//!
//! Collections of schemaless JSON documents, queried with the filter
//! language from `vbc-blog-query`. Backends: [`memory::MemoryStore`] for
//! tests and local development, [`postgres::PgStore`] for production.
//! [`timeout::TimeoutStore`] bounds every call made through it.

pub mod memory;
pub mod postgres;
pub mod sql;
pub mod timeout;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use vbc_blog_query::{parse, parse_pipeline, EvalError, Expr, OrderBy, ParseError};

use crate::document::{Document, DocumentId, ValidationError};

pub use vbc_blog_query::Direction;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid query: {0}")]
    Query(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ParseError> for StoreError {
    fn from(err: ParseError) -> Self {
        StoreError::Query(err.to_string())
    }
}

impl From<EvalError> for StoreError {
    fn from(err: EvalError) -> Self {
        StoreError::Query(err.to_string())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// A query against one collection: optional filter, parameters, ordering, limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Expr>,
    pub params: Map<String, Value>,
    pub order: Vec<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    /// Every document, in store order.
    pub fn all() -> Self {
        Self::default()
    }

    /// Build from a full pipeline such as `*[status == "published"] | order(createdAt desc)`.
    pub fn parse(source: &str) -> Result<Self, StoreError> {
        let pipeline = parse_pipeline(source)?;
        Ok(Self {
            filter: pipeline.filter,
            order: pipeline.order,
            ..Self::default()
        })
    }

    /// Build from a bare filter expression such as `category == $category`.
    pub fn filter(source: &str) -> Result<Self, StoreError> {
        Ok(Self {
            filter: Some(parse(source)?),
            ..Self::default()
        })
    }

    pub fn param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn params_value(&self) -> Value {
        Value::Object(self.params.clone())
    }
}

/// Storage backend for document collections.
///
/// `find` returns documents in the order requested by the query; when the
/// query has no ordering the backend's own order is used, which is stable
/// but otherwise unspecified.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;

    async fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError>;

    /// Insert a new document, assigning `_id` and `createdAt` unless supplied.
    async fn insert(
        &self,
        collection: &str,
        content: Map<String, Value>,
    ) -> Result<Document, StoreError>;

    /// Returns `false` when no document with `id` existed.
    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<bool, StoreError>;

    /// Cheap connectivity check for health endpoints.
    async fn ping(&self) -> Result<(), StoreError>;
}
