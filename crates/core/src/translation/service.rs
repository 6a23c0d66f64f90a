use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::model::{
    AvailableLanguages, NewTranslation, Translation, TranslationStatus, TranslationUpdate,
};
use super::repository::TranslationRepository;
use crate::auth::CurrentUser;
use crate::content::{Content, ContentRepository};
use crate::error::{CoreError, CoreResult};
use crate::language::{missing_languages, validate_language};

#[derive(Clone)]
pub struct TranslationService {
    content: Arc<dyn ContentRepository>,
    translations: Arc<dyn TranslationRepository>,
}

fn not_found(id: Uuid) -> CoreError {
    CoreError::not_found(format!("Translation {id} not found"))
}

fn already_exists(language: &str) -> CoreError {
    CoreError::Conflict(format!(
        "Translation for language '{language}' already exists for this content"
    ))
}

fn ensure_manageable(user: &CurrentUser, translation: &Translation) -> CoreResult<()> {
    if user.can_manage(translation.translator_id) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Not authorized to modify this translation".into(),
        ))
    }
}

/// Placeholder row queued by a bulk request.
fn placeholder(content: &Content, language: &str, translator_id: Uuid) -> Translation {
    let now = Utc::now();
    Translation {
        id: Uuid::now_v7(),
        content_id: content.id,
        language: language.to_string(),
        translated_title: format!("[{}] {}", language.to_uppercase(), content.title),
        translated_body: format!("Translation pending for {language}"),
        translated_slug: format!("{}-{language}", content.slug),
        translator_id: Some(translator_id),
        translation_status: TranslationStatus::Pending,
        created_at: now,
        updated_at: now,
    }
}

impl TranslationService {
    pub fn new(
        content: Arc<dyn ContentRepository>,
        translations: Arc<dyn TranslationRepository>,
    ) -> Self {
        Self {
            content,
            translations,
        }
    }

    async fn content(&self, id: Uuid) -> CoreResult<Content> {
        self.content
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("Content {id} not found")))
    }

    async fn find(&self, id: Uuid) -> CoreResult<Translation> {
        self.translations
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn create(
        &self,
        user: &CurrentUser,
        content_id: Uuid,
        input: NewTranslation,
    ) -> CoreResult<Translation> {
        input.validate()?;
        self.content(content_id).await?;
        let language = validate_language(&input.language)?;
        if self
            .translations
            .find_by_language(content_id, &language)
            .await?
            .is_some()
        {
            return Err(already_exists(&language));
        }

        let now = Utc::now();
        let translation = Translation {
            id: Uuid::now_v7(),
            content_id,
            language,
            translated_title: input.translated_title,
            translated_body: input.translated_body,
            translated_slug: input.translated_slug,
            translator_id: Some(user.user_id),
            translation_status: input
                .translation_status
                .unwrap_or(TranslationStatus::Pending),
            created_at: now,
            updated_at: now,
        };
        let created = self.translations.insert(&translation).await?;
        info!(
            translation_id = %created.id,
            content_id = %content_id,
            language = %created.language,
            user_id = %user.user_id,
            "translation created"
        );
        Ok(created)
    }

    /// Anonymous readers only see completed or reviewed translations.
    pub async fn get(&self, viewer: Option<&CurrentUser>, id: Uuid) -> CoreResult<Translation> {
        let translation = self.find(id).await?;
        if viewer.is_none() && !translation.translation_status.is_public() {
            return Err(not_found(id));
        }
        Ok(translation)
    }

    pub async fn get_by_language(
        &self,
        viewer: Option<&CurrentUser>,
        content_id: Uuid,
        language: &str,
    ) -> CoreResult<Translation> {
        let language = validate_language(language)?;
        self.translations
            .find_by_language(content_id, &language)
            .await?
            .filter(|t| viewer.is_some() || t.translation_status.is_public())
            .ok_or_else(|| {
                CoreError::not_found(format!(
                    "Translation for language '{language}' not found"
                ))
            })
    }

    /// Translations of a content item ordered by language.
    ///
    /// Without a caller and without a status filter this returns reviewed
    /// translations, or completed ones when nothing has been reviewed yet.
    pub async fn list_for_content(
        &self,
        viewer: Option<&CurrentUser>,
        content_id: Uuid,
        status: Option<TranslationStatus>,
    ) -> CoreResult<Vec<Translation>> {
        self.content(content_id).await?;
        if viewer.is_some() {
            return self.translations.list_for_content(content_id, status).await;
        }
        match status {
            Some(s) if s.is_public() => self.translations.list_for_content(content_id, Some(s)).await,
            Some(_) => Ok(Vec::new()),
            None => {
                let reviewed = self
                    .translations
                    .list_for_content(content_id, Some(TranslationStatus::Reviewed))
                    .await?;
                if !reviewed.is_empty() {
                    return Ok(reviewed);
                }
                self.translations
                    .list_for_content(content_id, Some(TranslationStatus::Completed))
                    .await
            }
        }
    }

    pub async fn update(
        &self,
        user: &CurrentUser,
        id: Uuid,
        input: TranslationUpdate,
    ) -> CoreResult<Translation> {
        input.validate()?;
        let mut translation = self.find(id).await?;
        ensure_manageable(user, &translation)?;
        if input.translator_id.is_some() && !user.is_superuser {
            return Err(CoreError::Forbidden(
                "Only a superuser can reassign a translation".into(),
            ));
        }

        if let Some(language) = input.language {
            let language = validate_language(&language)?;
            if language != translation.language {
                let taken = self
                    .translations
                    .find_by_language(translation.content_id, &language)
                    .await?
                    .is_some();
                if taken {
                    return Err(already_exists(&language));
                }
                translation.language = language;
            }
        }
        if let Some(status) = input.translation_status {
            translation.translation_status =
                translation.translation_status.transition_to(status)?;
        }
        if let Some(title) = input.translated_title {
            translation.translated_title = title;
        }
        if let Some(body) = input.translated_body {
            translation.translated_body = body;
        }
        if let Some(slug) = input.translated_slug {
            translation.translated_slug = slug;
        }
        if let Some(translator) = input.translator_id {
            translation.translator_id = Some(translator);
        }

        let updated = self.translations.update(&translation).await?;
        info!(translation_id = %id, user_id = %user.user_id, "translation updated");
        Ok(updated)
    }

    pub async fn delete(&self, user: &CurrentUser, id: Uuid) -> CoreResult<()> {
        let translation = self.find(id).await?;
        ensure_manageable(user, &translation)?;
        if !self.translations.delete(id).await? {
            return Err(not_found(id));
        }
        info!(translation_id = %id, user_id = %user.user_id, "translation deleted");
        Ok(())
    }

    pub async fn change_status(
        &self,
        user: &CurrentUser,
        id: Uuid,
        status: TranslationStatus,
    ) -> CoreResult<Translation> {
        let mut translation = self.find(id).await?;
        ensure_manageable(user, &translation)?;
        let from = translation.translation_status;
        translation.translation_status = from.transition_to(status)?;
        let updated = self.translations.update(&translation).await?;
        info!(translation_id = %id, user_id = %user.user_id, %from, to = %status, "translation status changed");
        Ok(updated)
    }

    /// Languages the content can be read in: its own language plus the
    /// reviewed translations, else the completed ones, else any.
    pub async fn available_languages(&self, content_id: Uuid) -> CoreResult<AvailableLanguages> {
        let content = self.content(content_id).await?;
        let all = self.translations.list_for_content(content_id, None).await?;

        let with_status = |status: TranslationStatus| -> Vec<&Translation> {
            all.iter()
                .filter(|t| t.translation_status == status)
                .collect()
        };
        let mut chosen = with_status(TranslationStatus::Reviewed);
        if chosen.is_empty() {
            chosen = with_status(TranslationStatus::Completed);
        }
        if chosen.is_empty() {
            chosen = all.iter().collect();
        }

        let mut available: BTreeSet<String> =
            chosen.into_iter().map(|t| t.language.clone()).collect();
        available.insert(content.language);
        let available: Vec<String> = available.into_iter().collect();
        let missing = missing_languages(&available);
        Ok(AvailableLanguages { available, missing })
    }

    /// Queue `pending` placeholders for every requested language that has
    /// no translation yet. Every language is validated before anything is
    /// written.
    pub async fn bulk_create(
        &self,
        user: &CurrentUser,
        content_id: Uuid,
        languages: &[String],
    ) -> CoreResult<Vec<Translation>> {
        let content = self.content(content_id).await?;
        if languages.is_empty() {
            return Err(CoreError::BadRequest(
                "at least one language is required".into(),
            ));
        }
        let requested = languages
            .iter()
            .map(|l| validate_language(l))
            .collect::<CoreResult<BTreeSet<String>>>()?;

        let existing: BTreeSet<String> = self
            .translations
            .list_for_content(content_id, None)
            .await?
            .into_iter()
            .map(|t| t.language)
            .collect();

        let queued: Vec<Translation> = requested
            .iter()
            .filter(|l| **l != content.language && !existing.contains(*l))
            .map(|l| placeholder(&content, l, user.user_id))
            .collect();
        if queued.is_empty() {
            return Ok(Vec::new());
        }

        let created = self.translations.insert_many(&queued).await?;
        info!(
            content_id = %content_id,
            user_id = %user.user_id,
            count = created.len(),
            "translations queued"
        );
        Ok(created)
    }
}
