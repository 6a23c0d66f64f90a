use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::language::DEFAULT_LANGUAGE;
use crate::media::Media;
use crate::translation::Translation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "content_type_enum", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Article,
    Lesson,
    Video,
    Resource,
    Story,
    Update,
    Testimonial,
    PrayerRequest,
    BlogPost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "content_status_enum", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Draft,
    Review,
    Published,
    Archived,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Review => "review",
            ContentStatus::Published => "published",
            ContentStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A content item. Maps to the `content` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Content {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub content_type: ContentType,
    pub status: ContentStatus,
    pub author_id: Uuid,
    pub language: String,
    pub featured_image_url: Option<String>,
    pub tags: Vec<String>,
    pub metadata: Value,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Content {
    pub fn is_published(&self) -> bool {
        self.status == ContentStatus::Published
    }
}

/// Content with its translations and media.
#[derive(Debug, Clone, Serialize)]
pub struct ContentFull {
    #[serde(flatten)]
    pub content: Content,
    pub translations: Vec<Translation>,
    pub media: Vec<Media>,
}

/// Content rendered in a requested language, falling back to the original.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalizedContent {
    pub content_id: Uuid,
    pub requested_language: String,
    /// The language actually served.
    pub language: String,
    pub fallback: bool,
    pub translation_id: Option<Uuid>,
    pub title: String,
    pub body: String,
    pub slug: String,
    pub content_type: ContentType,
    pub status: ContentStatus,
    pub tags: Vec<String>,
    pub featured_image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

#[allow(clippy::ptr_arg)]
pub(crate) fn validate_tags(tags: &Vec<String>) -> Result<(), ValidationError> {
    if tags.iter().any(|t| t.trim().is_empty() || t.chars().count() > 100) {
        return Err(ValidationError::new("tag_length"));
    }
    Ok(())
}

pub(crate) fn validate_metadata(metadata: &Value) -> Result<(), ValidationError> {
    if metadata.is_object() {
        Ok(())
    } else {
        Err(ValidationError::new("metadata_not_object"))
    }
}

/// Payload for creating content.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewContent {
    #[validate(length(min = 1, max = 500))]
    pub title: String,
    #[validate(length(min = 1, max = 500))]
    pub slug: String,
    #[validate(length(min = 1))]
    pub body: String,
    pub content_type: ContentType,
    #[serde(default = "default_language")]
    #[validate(length(min = 2, max = 10))]
    pub language: String,
    #[validate(length(max = 1000))]
    pub featured_image_url: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Vec<String>,
    #[serde(default = "empty_object")]
    #[validate(custom(function = "validate_metadata"))]
    pub metadata: Value,
    #[serde(default)]
    pub status: Option<ContentStatus>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ContentUpdate {
    #[validate(length(min = 1, max = 500))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub slug: Option<String>,
    #[validate(length(min = 1))]
    pub body: Option<String>,
    pub content_type: Option<ContentType>,
    pub status: Option<ContentStatus>,
    #[validate(length(min = 2, max = 10))]
    pub language: Option<String>,
    #[validate(length(max = 1000))]
    pub featured_image_url: Option<String>,
    #[validate(custom(function = "validate_tags"))]
    pub tags: Option<Vec<String>>,
    #[validate(custom(function = "validate_metadata"))]
    pub metadata: Option<Value>,
}

/// Which statuses a listing may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Published content only.
    Public,
    /// Published content plus everything authored by this user.
    Author(Uuid),
    /// Every status (superusers).
    All,
}

#[derive(Debug, Clone)]
pub struct ContentFilter {
    pub content_type: Option<ContentType>,
    pub status: Option<ContentStatus>,
    pub language: Option<String>,
    /// Matches content carrying any of these tags.
    pub tags: Vec<String>,
    pub author_id: Option<Uuid>,
    /// Case-insensitive substring match on title or body.
    pub search: Option<String>,
    pub visibility: Visibility,
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self {
            content_type: None,
            status: None,
            language: None,
            tags: Vec::new(),
            author_id: None,
            search: None,
            visibility: Visibility::Public,
        }
    }
}

impl ContentFilter {
    /// In-memory evaluation of the filter, mirroring the SQL WHERE clause.
    pub fn matches(&self, content: &Content) -> bool {
        let visible = match self.visibility {
            Visibility::Public => content.is_published(),
            Visibility::Author(user) => content.is_published() || content.author_id == user,
            Visibility::All => true,
        };
        let search = self.search.as_deref().map(str::to_lowercase);
        visible
            && self.content_type.map_or(true, |t| t == content.content_type)
            && self.status.map_or(true, |s| s == content.status)
            && self.language.as_deref().map_or(true, |l| l == content.language)
            && self.author_id.map_or(true, |a| a == content.author_id)
            && (self.tags.is_empty() || self.tags.iter().any(|t| content.tags.contains(t)))
            && search.map_or(true, |q| {
                content.title.to_lowercase().contains(&q) || content.body.to_lowercase().contains(&q)
            })
    }
}
