use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use vbc_blog_query::{compare_values, eval_filter, Direction, OrderBy};

use super::{DocumentStore, Query, StoreError};
use crate::document::{Document, DocumentId};
use crate::post::POSTS_COLLECTION;

/// In-process document store. Store order is insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let params = query.params_value();
        let mut matched = Vec::new();
        for doc in docs {
            let value = doc.to_value();
            let keep = match &query.filter {
                Some(filter) => eval_filter(filter, &value, &params)?,
                None => true,
            };
            if keep {
                matched.push((value, doc));
            }
        }

        if !query.order.is_empty() {
            matched.sort_by(|(a, _), (b, _)| compare_by(&query.order, a, b));
        }

        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(matched
            .into_iter()
            .take(limit)
            .map(|(_, doc)| doc.clone())
            .collect())
    }

    async fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| &doc.id == id))
            .cloned())
    }

    async fn insert(
        &self,
        collection: &str,
        content: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let doc = Document::new(content, Utc::now())?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.iter().any(|existing| existing.id == doc.id) {
            return Err(StoreError::Conflict(format!(
                "document {} already exists in {collection}",
                doc.id
            )));
        }
        // Same rule as the partial unique index on posts in PostgreSQL.
        if collection == POSTS_COLLECTION {
            if let Some(slug) = slug_of(&doc) {
                if docs.iter().any(|existing| slug_of(existing) == Some(slug)) {
                    return Err(StoreError::Conflict(format!(
                        "slug `{slug}` is already in use"
                    )));
                }
            }
        }
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|doc| &doc.id != id);
        Ok(docs.len() != before)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

fn slug_of(doc: &Document) -> Option<&str> {
    doc.content.get("slug").and_then(Value::as_str)
}

fn compare_by(order: &[OrderBy], a: &Value, b: &Value) -> Ordering {
    for key in order {
        let ordering = compare_field(field(a, &key.field), field(b, &key.field));
        let ordering = match key.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

// Missing and null values sort after present ones.
fn compare_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (Some(a), Some(b)) => compare_values(a, b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn field<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| current.get(segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for (id, category, created) in [
            ("a", "Analytics", "2025-01-01T00:00:00Z"),
            ("b", "Care Management", "2025-03-01T00:00:00Z"),
            ("c", "Analytics", "2025-02-01T00:00:00Z"),
        ] {
            store
                .insert(
                    "blogs",
                    object(json!({"_id": id, "category": category, "createdAt": created})),
                )
                .await
                .unwrap();
        }
        store
    }

    fn ids(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.id.as_str()).collect()
    }

    #[tokio::test]
    async fn find_without_order_keeps_insertion_order() {
        let store = seeded().await;
        let docs = store.find("blogs", &Query::all()).await.unwrap();
        assert_eq!(ids(&docs), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn find_filters_orders_and_limits() {
        let store = seeded().await;
        let query = Query::parse("*[category == $category] | order(createdAt desc)")
            .unwrap()
            .param("category", "Analytics");
        let docs = store.find("blogs", &query).await.unwrap();
        assert_eq!(ids(&docs), vec!["c", "a"]);

        let docs = store.find("blogs", &query.limit(1)).await.unwrap();
        assert_eq!(ids(&docs), vec!["c"]);
    }

    #[tokio::test]
    async fn missing_order_field_sorts_last() {
        let store = MemoryStore::new();
        store.insert("blogs", object(json!({"_id": "x"}))).await.unwrap();
        store
            .insert("blogs", object(json!({"_id": "y", "rank": 2})))
            .await
            .unwrap();
        store
            .insert("blogs", object(json!({"_id": "z", "rank": 1})))
            .await
            .unwrap();

        let asc = store
            .find("blogs", &Query::parse("* | order(rank asc)").unwrap())
            .await
            .unwrap();
        assert_eq!(ids(&asc), vec!["z", "y", "x"]);
    }

    #[tokio::test]
    async fn get_and_delete() {
        let store = seeded().await;
        let id = DocumentId::parse("b").unwrap();
        assert!(store.get("blogs", &id).await.unwrap().is_some());
        assert!(store.delete("blogs", &id).await.unwrap());
        assert!(!store.delete("blogs", &id).await.unwrap());
        assert!(store.get("blogs", &id).await.unwrap().is_none());
        assert!(store.get("other", &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_ids_conflict() {
        let store = seeded().await;
        let err = store
            .insert("blogs", object(json!({"_id": "a"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn post_slugs_are_unique_under_concurrent_inserts() {
        let store = MemoryStore::new();
        let first = store.insert(POSTS_COLLECTION, object(json!({"slug": "care-gaps"})));
        let second = store.insert(POSTS_COLLECTION, object(json!({"slug": "care-gaps"})));
        let (first, second) = tokio::join!(first, second);

        let conflicts = [&first, &second]
            .iter()
            .filter(|result| matches!(result, Err(StoreError::Conflict(_))))
            .count();
        assert_eq!(conflicts, 1);
        assert!(first.is_ok() || second.is_ok());

        // Other collections and slug-less posts are unconstrained.
        store.insert("subscribe", object(json!({"slug": "care-gaps"}))).await.unwrap();
        store.insert(POSTS_COLLECTION, object(json!({"title": "a"}))).await.unwrap();
        store.insert(POSTS_COLLECTION, object(json!({"title": "b"}))).await.unwrap();
    }

    #[tokio::test]
    async fn bad_filter_parameters_surface_as_query_errors() {
        let store = seeded().await;
        let query = Query::filter("category == $category").unwrap();
        let err = store.find("blogs", &query).await.unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));
    }
}
