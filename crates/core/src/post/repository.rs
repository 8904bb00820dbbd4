use std::sync::Arc;

use super::ingest::NewPost;
use super::model::{Post, POSTS_COLLECTION};
use crate::document::{Document, DocumentId};
use crate::store::{DocumentStore, Query, StoreError};

const PUBLISHED_NEWEST_FIRST: &str = "*[status == \"published\" || !defined(status)] | order(createdAt desc)";
const NEWEST_FIRST: &str = "* | order(createdAt desc)";

/// Typed access to the posts collection.
#[derive(Clone)]
pub struct PostRepository {
    store: Arc<dyn DocumentStore>,
}

impl PostRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Run `query` against the posts collection. Documents that do not
    /// decode as posts are skipped with a warning.
    pub async fn find(&self, query: &Query) -> Result<Vec<Post>, StoreError> {
        Ok(self.find_counted(query).await?.0)
    }

    /// Like [`find`](Self::find), also returning how many documents the
    /// store matched before malformed ones were dropped.
    pub async fn find_counted(&self, query: &Query) -> Result<(Vec<Post>, usize), StoreError> {
        let docs = self.store.find(POSTS_COLLECTION, query).await?;
        let posts = docs.iter().filter_map(decode_lenient).collect();
        Ok((posts, docs.len()))
    }

    /// Published posts, newest first.
    pub async fn list_published(&self) -> Result<Vec<Post>, StoreError> {
        self.find(&Query::parse(PUBLISHED_NEWEST_FIRST)?).await
    }

    /// Every post including drafts, newest first.
    pub async fn list_all(&self) -> Result<Vec<Post>, StoreError> {
        self.find(&Query::parse(NEWEST_FIRST)?).await
    }

    pub async fn get(&self, id: &DocumentId) -> Result<Option<Post>, StoreError> {
        match self.store.get(POSTS_COLLECTION, id).await? {
            Some(doc) => Ok(Some(Post::from_document(&doc)?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, StoreError> {
        let query = Query::filter("slug == $slug")?.param("slug", slug).limit(1);
        Ok(self.find(&query).await?.into_iter().next())
    }

    pub async fn slug_exists(&self, slug: &str) -> Result<bool, StoreError> {
        let query = Query::filter("slug == $slug")?.param("slug", slug).limit(1);
        Ok(!self.store.find(POSTS_COLLECTION, &query).await?.is_empty())
    }

    /// Insert a validated post. Slugs must be unique across the collection.
    pub async fn insert(&self, new_post: NewPost) -> Result<Post, StoreError> {
        if self.slug_exists(&new_post.slug).await? {
            return Err(StoreError::Conflict(format!(
                "slug `{}` is already in use",
                new_post.slug
            )));
        }
        let slug = new_post.slug.clone();
        let doc = self
            .store
            .insert(POSTS_COLLECTION, new_post.into_content()?)
            .await?;
        tracing::info!(id = %doc.id, slug = %slug, "post stored");
        Ok(Post::from_document(&doc)?)
    }

    /// Returns `false` when the post did not exist.
    pub async fn delete(&self, id: &DocumentId) -> Result<bool, StoreError> {
        let deleted = self.store.delete(POSTS_COLLECTION, id).await?;
        if deleted {
            tracing::info!(id = %id, "post deleted");
        }
        Ok(deleted)
    }
}

fn decode_lenient(doc: &Document) -> Option<Post> {
    match Post::from_document(doc) {
        Ok(post) => Some(post),
        Err(err) => {
            tracing::warn!(id = %doc.id, error = %err, "skipping malformed post document");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::ingest::validate_ingest;
    use crate::store::memory::MemoryStore;
    use serde_json::{json, Value};

    fn object(value: Value) -> serde_json::Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn new_post(slug: &str, status: &str) -> NewPost {
        let payload = json!({
            "title": format!("Post {slug}"),
            "content": "Body text",
            "author": "Dana",
            "timestamp": "2025-03-04T09:30:00Z",
            "slug": slug,
            "status": status,
        });
        validate_ingest(Some("application/json"), &serde_json::to_vec(&payload).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn insert_then_lookup_by_slug_and_id() {
        let repo = PostRepository::new(Arc::new(MemoryStore::new()));
        let post = repo.insert(new_post("care-gaps", "published")).await.unwrap();

        let by_slug = repo.find_by_slug("care-gaps").await.unwrap().unwrap();
        assert_eq!(by_slug.id, post.id);
        let by_id = repo.get(&post.id).await.unwrap().unwrap();
        assert_eq!(by_id.slug, "care-gaps");
        assert!(repo.find_by_slug("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_conflict() {
        let repo = PostRepository::new(Arc::new(MemoryStore::new()));
        repo.insert(new_post("care-gaps", "published")).await.unwrap();
        let err = repo
            .insert(new_post("care-gaps", "draft"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn published_listing_excludes_drafts_and_orders_newest_first() {
        let store = Arc::new(MemoryStore::new());
        for (id, status, created) in [
            ("old", Some("published"), "2024-01-01T00:00:00Z"),
            ("draft", Some("draft"), "2025-01-01T00:00:00Z"),
            ("legacy", None, "2024-06-01T00:00:00Z"),
            ("new", Some("published"), "2025-02-01T00:00:00Z"),
        ] {
            let mut content = json!({"_id": id, "title": id, "createdAt": created});
            if let Some(status) = status {
                content["status"] = json!(status);
            }
            store.insert(POSTS_COLLECTION, object(content)).await.unwrap();
        }
        let repo = PostRepository::new(store);

        let published: Vec<String> = repo
            .list_published()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id.to_string())
            .collect();
        assert_eq!(published, vec!["new", "legacy", "old"]);
        assert_eq!(repo.list_all().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn malformed_documents_are_skipped() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert(POSTS_COLLECTION, object(json!({"_id": "bad", "tags": "oops"})))
            .await
            .unwrap();
        store
            .insert(POSTS_COLLECTION, object(json!({"_id": "good"})))
            .await
            .unwrap();
        let repo = PostRepository::new(store);
        let posts = repo.list_all().await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id.as_str(), "good");
    }

    #[tokio::test]
    async fn delete_reports_missing() {
        let repo = PostRepository::new(Arc::new(MemoryStore::new()));
        let post = repo.insert(new_post("care-gaps", "published")).await.unwrap();
        assert!(repo.delete(&post.id).await.unwrap());
        assert!(!repo.delete(&post.id).await.unwrap());
    }
}
