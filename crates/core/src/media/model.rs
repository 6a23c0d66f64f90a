use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::content::model::validate_metadata;
use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Audio,
    Document,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Audio => "audio",
            MediaType::Document => "document",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "image" => Ok(MediaType::Image),
            "video" => Ok(MediaType::Video),
            "audio" => Ok(MediaType::Audio),
            "document" => Ok(MediaType::Document),
            other => Err(CoreError::BadRequest(format!(
                "unknown media type '{other}'; expected image, video, audio or document"
            ))),
        }
    }
}

/// An uploaded file. Maps to the `media` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Media {
    pub id: Uuid,
    pub content_id: Option<Uuid>,
    pub media_type: MediaType,
    pub filename: String,
    pub url: String,
    pub storage_path: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub duration: Option<i32>,
    pub metadata: Value,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Media {
    /// Storage path of the generated thumbnail, if one was written.
    pub fn thumbnail_path(&self) -> Option<&str> {
        self.metadata.get("thumbnail_path").and_then(Value::as_str)
    }
}

/// A file received from a client, before validation.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    /// Content type declared by the client, if any.
    pub declared_mime: Option<String>,
    pub data: Bytes,
    pub media_type: MediaType,
    pub content_id: Option<Uuid>,
    pub metadata: Option<Value>,
}

/// Editable media fields. Anything derived from the stored file is
/// immutable; unknown fields are rejected.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct MediaUpdate {
    pub content_id: Option<Uuid>,
    #[validate(length(min = 1, max = 500))]
    pub filename: Option<String>,
    #[validate(custom(function = "validate_metadata"))]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct MediaFilter {
    pub media_type: Option<MediaType>,
    pub uploaded_by: Option<Uuid>,
    pub content_id: Option<Uuid>,
}

impl MediaFilter {
    pub fn matches(&self, media: &Media) -> bool {
        self.media_type.map_or(true, |t| t == media.media_type)
            && self.uploaded_by.map_or(true, |u| u == media.uploaded_by)
            && self.content_id.map_or(true, |c| Some(c) == media.content_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_media_types() {
        assert_eq!("Image".parse::<MediaType>().unwrap(), MediaType::Image);
        assert_eq!(" document ".parse::<MediaType>().unwrap(), MediaType::Document);
        assert!("spreadsheet".parse::<MediaType>().is_err());
    }

    #[test]
    fn update_accepts_only_editable_fields() {
        let update: MediaUpdate = serde_json::from_value(serde_json::json!({
            "filename": "cover.png",
            "metadata": {"alt": "Cover"}
        }))
        .unwrap();
        assert!(update.validate().is_ok());

        for locked in ["width", "height", "duration", "url", "storage_path"] {
            let body = serde_json::json!({ locked: 10 });
            assert!(
                serde_json::from_value::<MediaUpdate>(body).is_err(),
                "{locked} should not be editable"
            );
        }

        let blank = MediaUpdate {
            filename: Some(String::new()),
            ..Default::default()
        };
        assert!(blank.validate().is_err());
    }
}
