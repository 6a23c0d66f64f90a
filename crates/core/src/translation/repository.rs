use async_trait::async_trait;
use uuid::Uuid;

use super::model::{Translation, TranslationStatus};
use crate::error::CoreResult;

/// Persistence for translation rows.
#[async_trait]
pub trait TranslationRepository: Send + Sync {
    /// Insert one row. A second translation for the same (content, language)
    /// is a `Conflict`.
    async fn insert(&self, translation: &Translation) -> CoreResult<Translation>;

    /// Insert several rows atomically; either all are stored or none.
    async fn insert_many(&self, translations: &[Translation]) -> CoreResult<Vec<Translation>>;

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Translation>>;

    async fn find_by_language(
        &self,
        content_id: Uuid,
        language: &str,
    ) -> CoreResult<Option<Translation>>;

    /// Translations of one content item ordered by language.
    async fn list_for_content(
        &self,
        content_id: Uuid,
        status: Option<TranslationStatus>,
    ) -> CoreResult<Vec<Translation>>;

    async fn update(&self, translation: &Translation) -> CoreResult<Translation>;

    /// Returns false when no row had that id.
    async fn delete(&self, id: Uuid) -> CoreResult<bool>;
}
