//! Validation for posts pushed through the publishing webhook.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::model::{Author, PostStatus, Seo, DEFAULT_CATEGORY};
use crate::document::validate::{parse_object, require_fields, require_json_content_type};
use crate::document::ValidationError;

pub const REQUIRED_FIELDS: [&str; 6] = ["title", "content", "author", "timestamp", "slug", "status"];

const EXCERPT_CHARS: usize = 160;
const WORDS_PER_MINUTE: usize = 225;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IngestPayload {
    title: String,
    content: String,
    author: Author,
    timestamp: Value,
    slug: String,
    status: String,
    #[serde(default)]
    images: Option<Vec<String>>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    read_time: Option<String>,
    #[serde(default)]
    comments_enabled: Option<bool>,
    #[serde(default)]
    seo: Option<Seo>,
}

/// A validated post ready to be inserted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub author: Author,
    pub status: PostStatus,
    pub slug: String,
    pub images: Vec<String>,
    pub read_time: String,
    pub comments_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo: Option<Seo>,
    pub timestamp: String,
}

impl NewPost {
    pub fn into_content(self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

/// Validate a webhook request: content type, JSON shape, required fields,
/// then normalise optional fields and fill defaults.
pub fn validate_ingest(content_type: Option<&str>, body: &[u8]) -> Result<NewPost, ValidationError> {
    require_json_content_type(content_type)?;
    let object = parse_object(body)?;
    require_fields(&object, &REQUIRED_FIELDS)?;

    let payload: IngestPayload =
        serde_json::from_value(Value::Object(object)).map_err(|e| ValidationError::InvalidField {
            field: "payload".to_string(),
            reason: e.to_string(),
        })?;

    let status = payload
        .status
        .parse::<PostStatus>()
        .map_err(|reason| ValidationError::InvalidField {
            field: "status".to_string(),
            reason,
        })?;

    let slug = payload.slug.trim().to_string();
    if let Some(bad) = slug
        .chars()
        .find(|c| !(c.is_alphanumeric() || matches!(c, '-' | '_')))
    {
        return Err(ValidationError::InvalidField {
            field: "slug".to_string(),
            reason: format!("character '{bad}' is not allowed in a slug"),
        });
    }

    let content = payload.content;
    let excerpt = match payload.excerpt.as_deref().map(str::trim) {
        Some(excerpt) if !excerpt.is_empty() => excerpt.to_string(),
        _ => derive_excerpt(&content, EXCERPT_CHARS),
    };
    let read_time = match payload.read_time.as_deref().map(str::trim) {
        Some(rt) if !rt.is_empty() => rt.to_string(),
        _ => format!("{} min read", estimate_read_minutes(&content)),
    };
    let category = match payload.category.as_deref().map(str::trim) {
        Some(category) if !category.is_empty() => category.to_string(),
        _ => DEFAULT_CATEGORY.to_string(),
    };
    let timestamp = match payload.timestamp {
        Value::String(s) => s,
        other => other.to_string(),
    };

    Ok(NewPost {
        title: payload.title.trim().to_string(),
        excerpt,
        content,
        category,
        tags: normalize_tags(payload.tags.unwrap_or_default()),
        author: payload.author,
        status,
        slug,
        images: payload.images.unwrap_or_default(),
        read_time,
        comments_enabled: payload.comments_enabled.unwrap_or(true),
        seo: payload.seo,
        timestamp,
    })
}

/// Trim tags, dropping blanks and repeats while keeping first-seen order.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|seen| seen == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// First words of `content` fitting in `max_chars`, with an ellipsis when cut.
pub fn derive_excerpt(content: &str, max_chars: usize) -> String {
    let mut excerpt = String::new();
    let mut truncated = false;
    for word in content.split_whitespace() {
        let extra = if excerpt.is_empty() { 0 } else { 1 };
        if excerpt.chars().count() + extra + word.chars().count() > max_chars {
            truncated = true;
            break;
        }
        if extra == 1 {
            excerpt.push(' ');
        }
        excerpt.push_str(word);
    }
    if truncated {
        excerpt.push('…');
    }
    excerpt
}

pub fn estimate_read_minutes(content: &str) -> usize {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}
