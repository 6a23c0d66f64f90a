use async_trait::async_trait;
use uuid::Uuid;

use super::model::{Media, MediaFilter, MediaType};
use crate::error::CoreResult;
use crate::pagination::{Page, PageRequest};

/// Persistence for media rows.
#[async_trait]
pub trait MediaRepository: Send + Sync {
    async fn insert(&self, media: &Media) -> CoreResult<Media>;

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Media>>;

    /// Filtered listing, newest first.
    async fn list(&self, filter: &MediaFilter, page: PageRequest) -> CoreResult<Page<Media>>;

    /// Media attached to one content item, newest first.
    async fn list_for_content(
        &self,
        content_id: Uuid,
        media_type: Option<MediaType>,
    ) -> CoreResult<Vec<Media>>;

    async fn update(&self, media: &Media) -> CoreResult<Media>;

    /// Returns false when no row had that id.
    async fn delete(&self, id: Uuid) -> CoreResult<bool>;
}
