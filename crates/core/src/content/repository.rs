use async_trait::async_trait;
use uuid::Uuid;

use super::model::{Content, ContentFilter};
use crate::error::CoreResult;
use crate::pagination::{Page, PageRequest};

/// Persistence for content rows.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Cheap connectivity check used by the health endpoint.
    async fn ping(&self) -> CoreResult<()>;

    /// Insert a new row. A duplicate slug is a `Conflict`.
    async fn insert(&self, content: &Content) -> CoreResult<Content>;

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Content>>;

    async fn find_by_slug(&self, slug: &str, language: &str) -> CoreResult<Option<Content>>;

    /// Whether `slug` is used by any row other than `excluding`.
    async fn slug_taken(&self, slug: &str, excluding: Option<Uuid>) -> CoreResult<bool>;

    /// Filtered listing, newest published first, then most recently updated.
    async fn list(&self, filter: &ContentFilter, page: PageRequest) -> CoreResult<Page<Content>>;

    /// Write every mutable column of `content`, bumping `updated_at`.
    async fn update(&self, content: &Content) -> CoreResult<Content>;
}
