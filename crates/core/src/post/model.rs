use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::document::model::{timestamp_string, CREATED_AT_FIELD, UPDATED_AT_FIELD};
use crate::document::{Document, DocumentId};

/// Collection holding blog posts.
pub const POSTS_COLLECTION: &str = "blogs";
pub const DEFAULT_CATEGORY: &str = "Uncategorized";
pub const DEFAULT_READ_TIME: &str = "5 min read";
const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    /// Records published before statuses existed carry no status and are live.
    #[default]
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(format!("expected `draft` or `published`, got `{other}`")),
        }
    }
}

/// Post author: a bare display name, or a profile record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Author {
    Plain(String),
    Rich {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        company: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bio: Option<String>,
    },
}

impl Default for Author {
    fn default() -> Self {
        Author::Plain(String::new())
    }
}

impl Author {
    /// Name shown on cards and bylines; blank names read as "Anonymous".
    pub fn display_name(&self) -> &str {
        let name = match self {
            Author::Plain(name) => name,
            Author::Rich { name, .. } => name,
        };
        let name = name.trim();
        if name.is_empty() {
            ANONYMOUS
        } else {
            name
        }
    }

    /// Avatar initial.
    pub fn initial(&self) -> char {
        self.display_name()
            .chars()
            .next()
            .map(|c| c.to_uppercase().next().unwrap_or(c))
            .unwrap_or('A')
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
}

/// A blog post as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: DocumentId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub excerpt: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: Author,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_time: Option<String>,
    #[serde(default = "default_true")]
    pub comments_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<Seo>,
    /// Publisher-supplied timestamp, kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Post {
    pub fn from_document(doc: &Document) -> Result<Self, serde_json::Error> {
        let mut map = doc.content.clone();
        map.insert("id".to_string(), Value::String(doc.id.to_string()));
        map.insert(
            CREATED_AT_FIELD.to_string(),
            Value::String(timestamp_string(&doc.created_at)),
        );
        map.insert(
            UPDATED_AT_FIELD.to_string(),
            Value::String(timestamp_string(&doc.updated_at)),
        );
        serde_json::from_value(Value::Object(map))
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    /// Byline date, e.g. `Mar 4, 2025`.
    pub fn formatted_date(&self) -> String {
        self.created_at.format("%b %-d, %Y").to_string()
    }

    pub fn read_time_or_default(&self) -> &str {
        match self.read_time.as_deref().map(str::trim) {
            Some(rt) if !rt.is_empty() => rt,
            _ => DEFAULT_READ_TIME,
        }
    }

    /// When the post last changed, for sitemaps.
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_true() -> bool {
    true
}

/// Treat an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
