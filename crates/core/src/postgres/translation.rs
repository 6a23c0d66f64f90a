use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::translation::{Translation, TranslationRepository, TranslationStatus};

const COLUMNS: &str = "id, content_id, language, translated_title, translated_body, \
     translated_slug, translator_id, translation_status, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PgTranslationRepository {
    pool: PgPool,
}

impl PgTranslationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn duplicate(err: sqlx::Error, language: &str) -> CoreError {
    CoreError::from_unique_violation(
        err,
        format!("Translation for language '{language}' already exists for this content"),
    )
}

async fn insert_one<'e>(
    executor: impl PgExecutor<'e>,
    translation: &Translation,
) -> CoreResult<Translation> {
    let sql = format!(
        "INSERT INTO translations ({COLUMNS})
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, Translation>(&sql)
        .bind(translation.id)
        .bind(translation.content_id)
        .bind(&translation.language)
        .bind(&translation.translated_title)
        .bind(&translation.translated_body)
        .bind(&translation.translated_slug)
        .bind(translation.translator_id)
        .bind(translation.translation_status)
        .bind(translation.created_at)
        .bind(translation.updated_at)
        .fetch_one(executor)
        .await
        .map_err(|e| duplicate(e, &translation.language))
}

#[async_trait]
impl TranslationRepository for PgTranslationRepository {
    async fn insert(&self, translation: &Translation) -> CoreResult<Translation> {
        insert_one(&self.pool, translation).await
    }

    async fn insert_many(&self, translations: &[Translation]) -> CoreResult<Vec<Translation>> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(translations.len());
        for translation in translations {
            created.push(insert_one(&mut *tx, translation).await?);
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Translation>> {
        let sql = format!("SELECT {COLUMNS} FROM translations WHERE id = $1");
        Ok(sqlx::query_as::<_, Translation>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_language(
        &self,
        content_id: Uuid,
        language: &str,
    ) -> CoreResult<Option<Translation>> {
        let sql =
            format!("SELECT {COLUMNS} FROM translations WHERE content_id = $1 AND language = $2");
        Ok(sqlx::query_as::<_, Translation>(&sql)
            .bind(content_id)
            .bind(language)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_for_content(
        &self,
        content_id: Uuid,
        status: Option<TranslationStatus>,
    ) -> CoreResult<Vec<Translation>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM translations
             WHERE content_id = $1
               AND ($2::translation_status_enum IS NULL OR translation_status = $2)
             ORDER BY language"
        );
        Ok(sqlx::query_as::<_, Translation>(&sql)
            .bind(content_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update(&self, translation: &Translation) -> CoreResult<Translation> {
        let sql = format!(
            "UPDATE translations
             SET language = $2, translated_title = $3, translated_body = $4,
                 translated_slug = $5, translator_id = $6, translation_status = $7,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Translation>(&sql)
            .bind(translation.id)
            .bind(&translation.language)
            .bind(&translation.translated_title)
            .bind(&translation.translated_body)
            .bind(&translation.translated_slug)
            .bind(translation.translator_id)
            .bind(translation.translation_status)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| duplicate(e, &translation.language))?
            .ok_or_else(|| {
                CoreError::not_found(format!("Translation {} not found", translation.id))
            })
    }

    async fn delete(&self, id: Uuid) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM translations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
