//! In-memory repositories for tests.
//!
//! They enforce the same uniqueness and ordering rules as the PostgreSQL
//! implementations so services behave identically against either.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::content::{Content, ContentFilter, ContentRepository};
use crate::error::{CoreError, CoreResult};
use crate::media::{Media, MediaFilter, MediaRepository, MediaType};
use crate::pagination::{slice_page, Page, PageRequest};
use crate::translation::{Translation, TranslationRepository, TranslationStatus};

#[derive(Debug, Default)]
pub struct MemoryContentRepository {
    rows: RwLock<HashMap<Uuid, Content>>,
}

impl MemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn slug_conflict(slug: &str) -> CoreError {
    CoreError::Conflict(format!("Content with slug '{slug}' already exists"))
}

#[async_trait]
impl ContentRepository for MemoryContentRepository {
    async fn ping(&self) -> CoreResult<()> {
        Ok(())
    }

    async fn insert(&self, content: &Content) -> CoreResult<Content> {
        let mut rows = self.rows.write().await;
        if rows.values().any(|c| c.slug == content.slug) {
            return Err(slug_conflict(&content.slug));
        }
        rows.insert(content.id, content.clone());
        Ok(content.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Content>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str, language: &str) -> CoreResult<Option<Content>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|c| c.slug == slug && c.language == language)
            .cloned())
    }

    async fn slug_taken(&self, slug: &str, excluding: Option<Uuid>) -> CoreResult<bool> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .any(|c| c.slug == slug && Some(c.id) != excluding))
    }

    async fn list(&self, filter: &ContentFilter, page: PageRequest) -> CoreResult<Page<Content>> {
        let rows = self.rows.read().await;
        let mut matched: Vec<Content> = rows
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        // published_at DESC NULLS LAST, updated_at DESC
        matched.sort_by_key(|c| {
            (
                c.published_at.is_none(),
                Reverse(c.published_at),
                Reverse(c.updated_at),
            )
        });
        Ok(slice_page(&matched, page))
    }

    async fn update(&self, content: &Content) -> CoreResult<Content> {
        let mut rows = self.rows.write().await;
        if !rows.contains_key(&content.id) {
            return Err(CoreError::not_found(format!("Content {} not found", content.id)));
        }
        if rows.values().any(|c| c.slug == content.slug && c.id != content.id) {
            return Err(slug_conflict(&content.slug));
        }
        let mut stored = content.clone();
        stored.updated_at = Utc::now();
        rows.insert(stored.id, stored.clone());
        Ok(stored)
    }
}

#[derive(Debug, Default)]
pub struct MemoryTranslationRepository {
    rows: RwLock<HashMap<Uuid, Translation>>,
}

impl MemoryTranslationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn duplicate_translation(language: &str) -> CoreError {
    CoreError::Conflict(format!(
        "Translation for language '{language}' already exists for this content"
    ))
}

fn has_language(rows: &HashMap<Uuid, Translation>, t: &Translation) -> bool {
    rows.values()
        .any(|o| o.id != t.id && o.content_id == t.content_id && o.language == t.language)
}

#[async_trait]
impl TranslationRepository for MemoryTranslationRepository {
    async fn insert(&self, translation: &Translation) -> CoreResult<Translation> {
        let mut rows = self.rows.write().await;
        if has_language(&rows, translation) {
            return Err(duplicate_translation(&translation.language));
        }
        rows.insert(translation.id, translation.clone());
        Ok(translation.clone())
    }

    async fn insert_many(&self, translations: &[Translation]) -> CoreResult<Vec<Translation>> {
        let mut rows = self.rows.write().await;
        for (i, t) in translations.iter().enumerate() {
            let repeated = translations[..i]
                .iter()
                .any(|o| o.content_id == t.content_id && o.language == t.language);
            if repeated || has_language(&rows, t) {
                return Err(duplicate_translation(&t.language));
            }
        }
        for t in translations {
            rows.insert(t.id, t.clone());
        }
        Ok(translations.to_vec())
    }

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Translation>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn find_by_language(
        &self,
        content_id: Uuid,
        language: &str,
    ) -> CoreResult<Option<Translation>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|t| t.content_id == content_id && t.language == language)
            .cloned())
    }

    async fn list_for_content(
        &self,
        content_id: Uuid,
        status: Option<TranslationStatus>,
    ) -> CoreResult<Vec<Translation>> {
        let mut found: Vec<Translation> = self
            .rows
            .read()
            .await
            .values()
            .filter(|t| t.content_id == content_id)
            .filter(|t| status.map_or(true, |s| s == t.translation_status))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.language.cmp(&b.language));
        Ok(found)
    }

    async fn update(&self, translation: &Translation) -> CoreResult<Translation> {
        let mut rows = self.rows.write().await;
        if !rows.contains_key(&translation.id) {
            return Err(CoreError::not_found(format!(
                "Translation {} not found",
                translation.id
            )));
        }
        if has_language(&rows, translation) {
            return Err(duplicate_translation(&translation.language));
        }
        let mut stored = translation.clone();
        stored.updated_at = Utc::now();
        rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: Uuid) -> CoreResult<bool> {
        Ok(self.rows.write().await.remove(&id).is_some())
    }
}

#[derive(Debug, Default)]
pub struct MemoryMediaRepository {
    rows: RwLock<HashMap<Uuid, Media>>,
}

impl MemoryMediaRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MediaRepository for MemoryMediaRepository {
    async fn insert(&self, media: &Media) -> CoreResult<Media> {
        self.rows.write().await.insert(media.id, media.clone());
        Ok(media.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Media>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: &MediaFilter, page: PageRequest) -> CoreResult<Page<Media>> {
        let rows = self.rows.read().await;
        let mut matched: Vec<Media> = rows
            .values()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        matched.sort_by_key(|m| (Reverse(m.created_at), Reverse(m.id)));
        Ok(slice_page(&matched, page))
    }

    async fn list_for_content(
        &self,
        content_id: Uuid,
        media_type: Option<MediaType>,
    ) -> CoreResult<Vec<Media>> {
        let mut found: Vec<Media> = self
            .rows
            .read()
            .await
            .values()
            .filter(|m| m.content_id == Some(content_id))
            .filter(|m| media_type.map_or(true, |t| t == m.media_type))
            .cloned()
            .collect();
        found.sort_by_key(|m| (Reverse(m.created_at), Reverse(m.id)));
        Ok(found)
    }

    async fn update(&self, media: &Media) -> CoreResult<Media> {
        let mut rows = self.rows.write().await;
        if !rows.contains_key(&media.id) {
            return Err(CoreError::not_found(format!("Media {} not found", media.id)));
        }
        let mut stored = media.clone();
        stored.updated_at = Utc::now();
        rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: Uuid) -> CoreResult<bool> {
        Ok(self.rows.write().await.remove(&id).is_some())
    }
}

/// A fresh, empty set of repositories.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepositories {
    pub content: Arc<MemoryContentRepository>,
    pub translations: Arc<MemoryTranslationRepository>,
    pub media: Arc<MemoryMediaRepository>,
}

impl MemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }
}

/// An active, non-superuser caller with a fresh id.
pub fn test_user() -> CurrentUser {
    CurrentUser {
        user_id: Uuid::new_v4(),
        email: "editor@example.org".into(),
        roles: vec!["editor".into()],
        is_active: true,
        is_superuser: false,
    }
}

pub fn test_superuser() -> CurrentUser {
    CurrentUser {
        is_superuser: true,
        roles: vec!["admin".into()],
        ..test_user()
    }
}
