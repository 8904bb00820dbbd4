use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::sql::{push_order, push_predicate};
use super::{DocumentStore, Query, StoreError};
use crate::document::model::DocumentRow;
use crate::document::{Document, DocumentId};

const SELECT_COLUMNS: &str = "SELECT document_id, content, created_at, updated_at FROM documents";

/// PostgreSQL-backed document store. All collections share the `documents`
/// table; content is JSONB.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_documents(rows: Vec<DocumentRow>) -> Result<Vec<Document>, StoreError> {
    rows.into_iter()
        .map(|row| Document::try_from(row).map_err(StoreError::Backend))
        .collect()
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_COLUMNS);
        qb.push(" WHERE collection = ");
        qb.push_bind(collection.to_string());
        if let Some(filter) = &query.filter {
            qb.push(" AND ");
            push_predicate(&mut qb, filter, &query.params)?;
        }
        push_order(&mut qb, &query.order);
        if let Some(limit) = query.limit {
            qb.push(" LIMIT ");
            qb.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        tracing::debug!(collection, sql = qb.sql(), "document query");

        let rows: Vec<DocumentRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        into_documents(rows)
    }

    async fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError> {
        let row: Option<DocumentRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE collection = $1 AND document_id = $2"
        ))
        .bind(collection)
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| Document::try_from(row).map_err(StoreError::Backend))
            .transpose()
    }

    async fn insert(
        &self,
        collection: &str,
        content: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let doc = Document::new(content, Utc::now())?;
        sqlx::query(
            "INSERT INTO documents (collection, document_id, content, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(collection)
        .bind(doc.id.as_str())
        .bind(Json(doc.content.clone()))
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(doc)
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND document_id = $2")
            .bind(collection)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
