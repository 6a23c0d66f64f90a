use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::model::{
    Content, ContentFilter, ContentFull, ContentStatus, ContentUpdate, LocalizedContent,
    NewContent, Visibility,
};
use super::repository::ContentRepository;
use crate::auth::CurrentUser;
use crate::error::{CoreError, CoreResult};
use crate::language::{normalize_language, validate_language};
use crate::media::MediaRepository;
use crate::pagination::{Page, PageRequest};
use crate::translation::TranslationRepository;

#[derive(Clone)]
pub struct ContentService {
    content: Arc<dyn ContentRepository>,
    translations: Arc<dyn TranslationRepository>,
    media: Arc<dyn MediaRepository>,
}

fn not_found(id: Uuid) -> CoreError {
    CoreError::not_found(format!("Content {id} not found"))
}

/// Unpublished content is hidden from anonymous readers and forbidden to
/// authenticated users who neither wrote it nor are superusers.
pub(crate) fn ensure_readable(viewer: Option<&CurrentUser>, content: &Content) -> CoreResult<()> {
    if content.is_published() {
        return Ok(());
    }
    match viewer {
        None => Err(not_found(content.id)),
        Some(user) if user.can_manage(Some(content.author_id)) => Ok(()),
        Some(_) => Err(CoreError::Forbidden(
            "Not authorized to view this content".into(),
        )),
    }
}

fn ensure_manageable(user: &CurrentUser, content: &Content) -> CoreResult<()> {
    if user.can_manage(Some(content.author_id)) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Not authorized to modify this content".into(),
        ))
    }
}

fn apply_status(content: &mut Content, next: ContentStatus) -> CoreResult<()> {
    content.status = content.status.transition_to(next)?;
    if next == ContentStatus::Published && content.published_at.is_none() {
        content.published_at = Some(Utc::now());
    }
    Ok(())
}

impl ContentService {
    pub fn new(
        content: Arc<dyn ContentRepository>,
        translations: Arc<dyn TranslationRepository>,
        media: Arc<dyn MediaRepository>,
    ) -> Self {
        Self {
            content,
            translations,
            media,
        }
    }

    pub async fn ping(&self) -> CoreResult<()> {
        self.content.ping().await
    }

    pub async fn create(&self, author: &CurrentUser, input: NewContent) -> CoreResult<Content> {
        input.validate()?;
        let language = validate_language(&input.language)?;
        if self.content.slug_taken(&input.slug, None).await? {
            return Err(CoreError::Conflict(format!(
                "Content with slug '{}' already exists",
                input.slug
            )));
        }

        let now = Utc::now();
        let status = input.status.unwrap_or(ContentStatus::Draft);
        let content = Content {
            id: Uuid::now_v7(),
            title: input.title,
            slug: input.slug,
            body: input.body,
            content_type: input.content_type,
            status,
            author_id: author.user_id,
            language,
            featured_image_url: input.featured_image_url,
            tags: input.tags,
            metadata: input.metadata,
            published_at: (status == ContentStatus::Published).then_some(now),
            created_at: now,
            updated_at: now,
        };
        let created = self.content.insert(&content).await?;
        info!(content_id = %created.id, user_id = %author.user_id, slug = %created.slug, "content created");
        Ok(created)
    }

    async fn find(&self, id: Uuid) -> CoreResult<Content> {
        self.content.find_by_id(id).await?.ok_or_else(|| not_found(id))
    }

    pub async fn get(&self, viewer: Option<&CurrentUser>, id: Uuid) -> CoreResult<Content> {
        let content = self.find(id).await?;
        ensure_readable(viewer, &content)?;
        Ok(content)
    }

    /// Content with its translations and attached media. Anonymous readers
    /// only see completed or reviewed translations.
    pub async fn get_full(&self, viewer: Option<&CurrentUser>, id: Uuid) -> CoreResult<ContentFull> {
        let content = self.get(viewer, id).await?;
        let mut translations = self.translations.list_for_content(id, None).await?;
        if viewer.is_none() {
            translations.retain(|t| t.translation_status.is_public());
        }
        let media = self.media.list_for_content(id, None).await?;
        Ok(ContentFull {
            content,
            translations,
            media,
        })
    }

    pub async fn get_by_slug(
        &self,
        viewer: Option<&CurrentUser>,
        slug: &str,
        language: &str,
    ) -> CoreResult<Content> {
        let language = validate_language(language)?;
        let content = self
            .content
            .find_by_slug(slug, &language)
            .await?
            .ok_or_else(|| {
                CoreError::not_found(format!("Content with slug '{slug}' not found"))
            })?;
        ensure_readable(viewer, &content)?;
        Ok(content)
    }

    /// List content visible to `viewer`. The filter's visibility is derived
    /// from the caller and any value passed in is replaced.
    pub async fn list(
        &self,
        viewer: Option<&CurrentUser>,
        mut filter: ContentFilter,
        page: PageRequest,
    ) -> CoreResult<Page<Content>> {
        filter.visibility = match viewer {
            None => Visibility::Public,
            Some(user) if user.is_superuser => Visibility::All,
            Some(user) => Visibility::Author(user.user_id),
        };
        if let Some(language) = filter.language.as_deref() {
            filter.language = Some(validate_language(language)?);
        }
        filter.search = filter
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self.content.list(&filter, page).await
    }

    pub async fn update(
        &self,
        user: &CurrentUser,
        id: Uuid,
        input: ContentUpdate,
    ) -> CoreResult<Content> {
        input.validate()?;
        let mut content = self.find(id).await?;
        ensure_manageable(user, &content)?;

        if let Some(slug) = input.slug {
            if slug != content.slug && self.content.slug_taken(&slug, Some(id)).await? {
                return Err(CoreError::Conflict(format!(
                    "Content with slug '{slug}' already exists"
                )));
            }
            content.slug = slug;
        }
        if let Some(language) = input.language {
            content.language = validate_language(&language)?;
        }
        if let Some(status) = input.status {
            if status != content.status {
                apply_status(&mut content, status)?;
            }
        }
        if let Some(title) = input.title {
            content.title = title;
        }
        if let Some(body) = input.body {
            content.body = body;
        }
        if let Some(content_type) = input.content_type {
            content.content_type = content_type;
        }
        if let Some(url) = input.featured_image_url {
            content.featured_image_url = Some(url);
        }
        if let Some(tags) = input.tags {
            content.tags = tags;
        }
        if let Some(metadata) = input.metadata {
            content.metadata = metadata;
        }

        let updated = self.content.update(&content).await?;
        info!(content_id = %id, user_id = %user.user_id, "content updated");
        Ok(updated)
    }

    /// Soft delete: the row stays, with status `archived`.
    pub async fn archive(&self, user: &CurrentUser, id: Uuid) -> CoreResult<Content> {
        let mut content = self.find(id).await?;
        ensure_manageable(user, &content)?;
        if content.status == ContentStatus::Archived {
            return Ok(content);
        }
        content.status = ContentStatus::Archived;
        let archived = self.content.update(&content).await?;
        info!(content_id = %id, user_id = %user.user_id, "content archived");
        Ok(archived)
    }

    pub async fn change_status(
        &self,
        user: &CurrentUser,
        id: Uuid,
        status: ContentStatus,
    ) -> CoreResult<Content> {
        let mut content = self.find(id).await?;
        ensure_manageable(user, &content)?;
        let from = content.status;
        apply_status(&mut content, status)?;
        let updated = self.content.update(&content).await?;
        info!(content_id = %id, user_id = %user.user_id, %from, to = %status, "content status changed");
        Ok(updated)
    }

    pub async fn publish(&self, user: &CurrentUser, id: Uuid) -> CoreResult<Content> {
        self.change_status(user, id, ContentStatus::Published).await
    }

    /// Render content in `language`, falling back to its original language
    /// when no completed or reviewed translation exists.
    pub async fn localized(
        &self,
        viewer: Option<&CurrentUser>,
        id: Uuid,
        language: &str,
    ) -> CoreResult<LocalizedContent> {
        let requested = match normalize_language(language) {
            Some(code) => code.to_string(),
            None => validate_language(language)?,
        };
        let content = self.get(viewer, id).await?;

        let translation = if requested == content.language {
            None
        } else {
            self.translations
                .find_by_language(id, &requested)
                .await?
                .filter(|t| t.translation_status.is_public())
        };

        let localized = match translation {
            Some(t) => LocalizedContent {
                content_id: content.id,
                requested_language: requested,
                language: t.language,
                fallback: false,
                translation_id: Some(t.id),
                title: t.translated_title,
                body: t.translated_body,
                slug: t.translated_slug,
                content_type: content.content_type,
                status: content.status,
                tags: content.tags,
                featured_image_url: content.featured_image_url,
                published_at: content.published_at,
            },
            None => LocalizedContent {
                content_id: content.id,
                fallback: requested != content.language,
                requested_language: requested,
                language: content.language,
                translation_id: None,
                title: content.title,
                body: content.body,
                slug: content.slug,
                content_type: content.content_type,
                status: content.status,
                tags: content.tags,
                featured_image_url: content.featured_image_url,
                published_at: content.published_at,
            },
        };
        Ok(localized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentType;
    use crate::memory::{test_superuser, test_user, MemoryRepositories};
    use crate::translation::{Translation, TranslationStatus};
    use serde_json::json;

    fn service(repos: &MemoryRepositories) -> ContentService {
        ContentService::new(
            repos.content.clone(),
            repos.translations.clone(),
            repos.media.clone(),
        )
    }

    fn new_content(slug: &str) -> NewContent {
        serde_json::from_value(json!({
            "title": "Weekly Update",
            "slug": slug,
            "body": "News from the field.",
            "content_type": "update",
            "tags": ["news"]
        }))
        .unwrap()
    }

    fn page() -> PageRequest {
        PageRequest::new(None, None, 10).unwrap()
    }

    #[tokio::test]
    async fn create_defaults_to_draft_and_records_author() {
        let repos = MemoryRepositories::new();
        let svc = service(&repos);
        let author = test_user();

        let created = svc.create(&author, new_content("weekly")).await.unwrap();
        assert_eq!(created.status, ContentStatus::Draft);
        assert_eq!(created.author_id, author.user_id);
        assert_eq!(created.language, "en");
        assert!(created.published_at.is_none());
    }

    #[tokio::test]
    async fn create_published_stamps_published_at() {
        let repos = MemoryRepositories::new();
        let mut input = new_content("live");
        input.status = Some(ContentStatus::Published);
        let created = service(&repos).create(&test_user(), input).await.unwrap();
        assert!(created.published_at.is_some());
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_conflict() {
        let repos = MemoryRepositories::new();
        let svc = service(&repos);
        svc.create(&test_user(), new_content("same")).await.unwrap();
        let err = svc.create(&test_user(), new_content("same")).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn create_rejects_unsupported_language() {
        let repos = MemoryRepositories::new();
        let mut input = new_content("deutsch");
        input.language = "de".into();
        let err = service(&repos).create(&test_user(), input).await.unwrap_err();
        assert!(matches!(err, CoreError::BadRequest(_)));
    }

    #[tokio::test]
    async fn drafts_are_hidden_from_strangers() {
        let repos = MemoryRepositories::new();
        let svc = service(&repos);
        let author = test_user();
        let draft = svc.create(&author, new_content("hidden")).await.unwrap();

        assert!(matches!(
            svc.get(None, draft.id).await,
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            svc.get(Some(&test_user()), draft.id).await,
            Err(CoreError::Forbidden(_))
        ));
        assert!(svc.get(Some(&author), draft.id).await.is_ok());
        assert!(svc.get(Some(&test_superuser()), draft.id).await.is_ok());
    }

    #[tokio::test]
    async fn listing_scopes_by_caller() {
        let repos = MemoryRepositories::new();
        let svc = service(&repos);
        let alice = test_user();
        let bob = test_user();

        let published = svc.create(&alice, new_content("a")).await.unwrap();
        svc.publish(&alice, published.id).await.unwrap();
        svc.create(&alice, new_content("b")).await.unwrap();
        svc.create(&bob, new_content("c")).await.unwrap();

        let anon = svc.list(None, ContentFilter::default(), page()).await.unwrap();
        assert_eq!(anon.total, 1);

        let own = svc.list(Some(&alice), ContentFilter::default(), page()).await.unwrap();
        assert_eq!(own.total, 2);

        let all = svc
            .list(Some(&test_superuser()), ContentFilter::default(), page())
            .await
            .unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(all.items[0].id, published.id);
    }

    #[tokio::test]
    async fn update_is_limited_to_author() {
        let repos = MemoryRepositories::new();
        let svc = service(&repos);
        let author = test_user();
        let item = svc.create(&author, new_content("mine")).await.unwrap();

        let change = ContentUpdate {
            title: Some("Renamed".into()),
            ..Default::default()
        };
        assert!(matches!(
            svc.update(&test_user(), item.id, change.clone()).await,
            Err(CoreError::Forbidden(_))
        ));
        let updated = svc.update(&author, item.id, change).await.unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.slug, "mine");
    }

    #[tokio::test]
    async fn update_checks_slug_and_workflow() {
        let repos = MemoryRepositories::new();
        let svc = service(&repos);
        let author = test_user();
        svc.create(&author, new_content("taken")).await.unwrap();
        let item = svc.create(&author, new_content("free")).await.unwrap();

        let clash = ContentUpdate {
            slug: Some("taken".into()),
            ..Default::default()
        };
        assert!(matches!(
            svc.update(&author, item.id, clash).await,
            Err(CoreError::Conflict(_))
        ));

        let bad_jump = ContentUpdate {
            status: Some(ContentStatus::Archived),
            ..Default::default()
        };
        assert!(matches!(
            svc.update(&author, item.id, bad_jump).await,
            Err(CoreError::InvalidTransition { .. })
        ));

        let same = ContentUpdate {
            status: Some(ContentStatus::Draft),
            slug: Some("free".into()),
            ..Default::default()
        };
        assert!(svc.update(&author, item.id, same).await.is_ok());
    }

    #[tokio::test]
    async fn publish_then_archive_then_back_to_draft() {
        let repos = MemoryRepositories::new();
        let svc = service(&repos);
        let author = test_user();
        let item = svc.create(&author, new_content("flow")).await.unwrap();

        let published = svc.publish(&author, item.id).await.unwrap();
        let stamped = published.published_at.unwrap();

        let err = svc
            .change_status(&author, item.id, ContentStatus::Draft)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));

        svc.change_status(&author, item.id, ContentStatus::Archived)
            .await
            .unwrap();
        svc.change_status(&author, item.id, ContentStatus::Draft)
            .await
            .unwrap();
        let again = svc.publish(&author, item.id).await.unwrap();
        assert_eq!(again.published_at, Some(stamped));
    }

    #[tokio::test]
    async fn archive_is_a_soft_delete_from_any_state() {
        let repos = MemoryRepositories::new();
        let svc = service(&repos);
        let author = test_user();
        let item = svc.create(&author, new_content("gone")).await.unwrap();

        let archived = svc.archive(&author, item.id).await.unwrap();
        assert_eq!(archived.status, ContentStatus::Archived);
        assert!(svc.get(Some(&author), item.id).await.is_ok());
        assert!(svc.archive(&author, item.id).await.is_ok());
        assert!(matches!(
            svc.archive(&author, Uuid::new_v4()).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn slug_lookup_is_per_language() {
        let repos = MemoryRepositories::new();
        let svc = service(&repos);
        let author = test_user();
        let item = svc.create(&author, new_content("hola")).await.unwrap();
        svc.publish(&author, item.id).await.unwrap();

        assert_eq!(svc.get_by_slug(None, "hola", "EN").await.unwrap().id, item.id);
        assert!(matches!(
            svc.get_by_slug(None, "hola", "es").await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn localized_falls_back_until_translation_is_public() {
        let repos = MemoryRepositories::new();
        let svc = service(&repos);
        let author = test_user();
        let item = svc.create(&author, new_content("story")).await.unwrap();
        svc.publish(&author, item.id).await.unwrap();

        let now = Utc::now();
        let mut translation = Translation {
            id: Uuid::now_v7(),
            content_id: item.id,
            language: "es".into(),
            translated_title: "Actualización semanal".into(),
            translated_body: "Noticias del campo.".into(),
            translated_slug: "story-es".into(),
            translator_id: None,
            translation_status: TranslationStatus::InProgress,
            created_at: now,
            updated_at: now,
        };
        repos.translations.insert(&translation).await.unwrap();

        let fallback = svc.localized(None, item.id, "spanish").await.unwrap();
        assert!(fallback.fallback);
        assert_eq!(fallback.requested_language, "es");
        assert_eq!(fallback.language, "en");
        assert_eq!(fallback.title, "Weekly Update");

        translation.translation_status = TranslationStatus::Completed;
        repos.translations.update(&translation).await.unwrap();

        let translated = svc.localized(None, item.id, "es").await.unwrap();
        assert!(!translated.fallback);
        assert_eq!(translated.language, "es");
        assert_eq!(translated.title, "Actualización semanal");
        assert_eq!(translated.translation_id, Some(translation.id));

        let original = svc.localized(None, item.id, "en").await.unwrap();
        assert!(!original.fallback);
        assert_eq!(original.content_type, ContentType::Update);

        assert!(matches!(
            svc.localized(None, item.id, "de").await,
            Err(CoreError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn full_view_hides_unfinished_translations_from_anonymous() {
        let repos = MemoryRepositories::new();
        let svc = service(&repos);
        let author = test_user();
        let item = svc.create(&author, new_content("full")).await.unwrap();
        svc.publish(&author, item.id).await.unwrap();

        let now = Utc::now();
        for (language, status) in [
            ("es", TranslationStatus::Pending),
            ("fr", TranslationStatus::Reviewed),
        ] {
            repos
                .translations
                .insert(&Translation {
                    id: Uuid::now_v7(),
                    content_id: item.id,
                    language: language.into(),
                    translated_title: "t".into(),
                    translated_body: "b".into(),
                    translated_slug: format!("full-{language}"),
                    translator_id: None,
                    translation_status: status,
                    created_at: now,
                    updated_at: now,
                })
                .await
                .unwrap();
        }

        let anon = svc.get_full(None, item.id).await.unwrap();
        assert_eq!(anon.translations.len(), 1);
        assert_eq!(anon.translations[0].language, "fr");
        assert!(anon.media.is_empty());

        let owner = svc.get_full(Some(&author), item.id).await.unwrap();
        assert_eq!(owner.translations.len(), 2);
    }
}
