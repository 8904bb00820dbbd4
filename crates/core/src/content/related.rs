//! Related posts shown under an article.
//!
//! Two lookups against the store: posts in the same category first, then a
//! backfill from one randomly chosen tag of the current post. The current
//! post is never returned and ids never repeat.

use std::collections::HashSet;
use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::post::{Post, PostRepository};
use crate::store::{Query, StoreError};

pub const DEFAULT_RELATED_LIMIT: usize = 3;

const SAME_CATEGORY: &str = "category == $category && _id != $id";
const SHARES_TAG: &str = "$tag in tags && _id != $id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupPhase {
    Category,
    Tag,
}

impl fmt::Display for LookupPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LookupPhase::Category => "category",
            LookupPhase::Tag => "tag",
        })
    }
}

#[derive(Debug, Error)]
#[error("related post lookup failed in {phase} phase")]
pub struct LookupError {
    pub phase: LookupPhase,
    #[source]
    pub source: StoreError,
}

impl LookupError {
    fn at(phase: LookupPhase) -> impl FnOnce(StoreError) -> Self {
        move |source| Self { phase, source }
    }
}

/// Chooses the tag used for the backfill lookup.
pub trait TagPicker {
    fn pick<'t>(&mut self, tags: &'t [String]) -> Option<&'t str>;
}

/// Uniform choice over the tags.
#[derive(Debug, Clone)]
pub struct RandomTagPicker {
    rng: StdRng,
}

impl RandomTagPicker {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible picks, for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl TagPicker for RandomTagPicker {
    fn pick<'t>(&mut self, tags: &'t [String]) -> Option<&'t str> {
        if tags.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..tags.len());
        Some(tags[index].as_str())
    }
}

pub struct ContentSelector<'r> {
    posts: &'r PostRepository,
    limit: usize,
}

impl<'r> ContentSelector<'r> {
    pub fn new(posts: &'r PostRepository) -> Self {
        Self {
            posts,
            limit: DEFAULT_RELATED_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Up to `limit` posts related to `current`: same-category posts in store
    /// order, then posts sharing one picked tag. The tag lookup only runs
    /// when the store matched fewer than `limit` same-category documents and
    /// `current` has tags.
    pub async fn select(
        &self,
        current: &Post,
        picker: &mut (impl TagPicker + Send),
    ) -> Result<Vec<Post>, LookupError> {
        if self.limit == 0 {
            return Ok(Vec::new());
        }
        let id = current.id.as_str();

        let query = Query::filter(SAME_CATEGORY)
            .map_err(LookupError::at(LookupPhase::Category))?
            .param("category", current.category.as_str())
            .param("id", id)
            .limit(self.limit);
        let (mut related, matched) = self
            .posts
            .find_counted(&query)
            .await
            .map_err(LookupError::at(LookupPhase::Category))?;
        related.retain(|post| post.id != current.id);
        related.truncate(self.limit);

        // A full category lookup ends the selection even when some of its
        // documents were malformed and dropped.
        if matched >= self.limit {
            return Ok(related);
        }
        let remaining = self.limit - related.len();
        let Some(tag) = picker.pick(&current.tags) else {
            return Ok(related);
        };
        tracing::debug!(post = id, tag, remaining, "backfilling related posts by tag");

        let query = Query::filter(SHARES_TAG)
            .map_err(LookupError::at(LookupPhase::Tag))?
            .param("tag", tag)
            .param("id", id)
            .limit(remaining);
        let backfill = self
            .posts
            .find(&query)
            .await
            .map_err(LookupError::at(LookupPhase::Tag))?;

        let mut seen: HashSet<String> = related.iter().map(|p| p.id.to_string()).collect();
        seen.insert(id.to_string());
        for post in backfill {
            if seen.insert(post.id.to_string()) {
                related.push(post);
            }
        }
        related.truncate(self.limit);
        Ok(related)
    }

    /// Like [`select`](Self::select), but a failed lookup yields no related
    /// posts instead of an error.
    pub async fn select_or_empty(
        &self,
        current: &Post,
        picker: &mut (impl TagPicker + Send),
    ) -> Vec<Post> {
        match self.select(current, picker).await {
            Ok(related) => related,
            Err(err) => {
                tracing::warn!(
                    post = current.id.as_str(),
                    phase = %err.phase,
                    error = %err.source,
                    "related posts unavailable"
                );
                Vec::new()
            }
        }
    }
}
