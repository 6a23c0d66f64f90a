use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "translation_status_enum", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TranslationStatus {
    Pending,
    InProgress,
    Completed,
    Reviewed,
}

impl TranslationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranslationStatus::Pending => "pending",
            TranslationStatus::InProgress => "in_progress",
            TranslationStatus::Completed => "completed",
            TranslationStatus::Reviewed => "reviewed",
        }
    }

    /// Completed and reviewed translations are visible to anonymous readers.
    pub fn is_public(&self) -> bool {
        matches!(self, TranslationStatus::Completed | TranslationStatus::Reviewed)
    }
}

impl fmt::Display for TranslationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A translation of a content item. Maps to the `translations` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Translation {
    pub id: Uuid,
    pub content_id: Uuid,
    pub language: String,
    pub translated_title: String,
    pub translated_body: String,
    pub translated_slug: String,
    pub translator_id: Option<Uuid>,
    pub translation_status: TranslationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTranslation {
    #[validate(length(min = 2, max = 10))]
    pub language: String,
    #[validate(length(min = 1, max = 500))]
    pub translated_title: String,
    #[validate(length(min = 1))]
    pub translated_body: String,
    #[validate(length(min = 1, max = 500))]
    pub translated_slug: String,
    #[serde(default)]
    pub translation_status: Option<TranslationStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TranslationUpdate {
    #[validate(length(min = 2, max = 10))]
    pub language: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub translated_title: Option<String>,
    #[validate(length(min = 1))]
    pub translated_body: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub translated_slug: Option<String>,
    pub translation_status: Option<TranslationStatus>,
    /// Reassigns the translation. Superusers only.
    pub translator_id: Option<Uuid>,
}

/// Languages a content item can be read in, and those still missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableLanguages {
    pub available: Vec<String>,
    pub missing: Vec<String>,
}
