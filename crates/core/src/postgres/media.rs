use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::media::{Media, MediaFilter, MediaRepository, MediaType};
use crate::pagination::{Page, PageRequest};

const COLUMNS: &str = "id, content_id, media_type, filename, url, storage_path, file_size, \
     mime_type, width, height, duration, metadata, uploaded_by, created_at, updated_at";

const LIST_WHERE: &str = "
    WHERE ($1::varchar IS NULL OR media_type = $1)
      AND ($2::uuid IS NULL OR uploaded_by = $2)
      AND ($3::uuid IS NULL OR content_id = $3)";

#[derive(Debug, Clone)]
pub struct PgMediaRepository {
    pool: PgPool,
}

impl PgMediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MediaRepository for PgMediaRepository {
    async fn insert(&self, media: &Media) -> CoreResult<Media> {
        let sql = format!(
            "INSERT INTO media ({COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Media>(&sql)
            .bind(media.id)
            .bind(media.content_id)
            .bind(media.media_type)
            .bind(&media.filename)
            .bind(&media.url)
            .bind(&media.storage_path)
            .bind(media.file_size)
            .bind(&media.mime_type)
            .bind(media.width)
            .bind(media.height)
            .bind(media.duration)
            .bind(&media.metadata)
            .bind(media.uploaded_by)
            .bind(media.created_at)
            .bind(media.updated_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Media>> {
        let sql = format!("SELECT {COLUMNS} FROM media WHERE id = $1");
        Ok(sqlx::query_as::<_, Media>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list(&self, filter: &MediaFilter, page: PageRequest) -> CoreResult<Page<Media>> {
        let count_sql = format!("SELECT COUNT(*) FROM media {LIST_WHERE}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(filter.media_type)
            .bind(filter.uploaded_by)
            .bind(filter.content_id)
            .fetch_one(&self.pool)
            .await?;

        let list_sql = format!(
            "SELECT {COLUMNS} FROM media {LIST_WHERE}
             ORDER BY created_at DESC, id DESC
             LIMIT $4 OFFSET $5"
        );
        let items = sqlx::query_as::<_, Media>(&list_sql)
            .bind(filter.media_type)
            .bind(filter.uploaded_by)
            .bind(filter.content_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(items, total, page))
    }

    async fn list_for_content(
        &self,
        content_id: Uuid,
        media_type: Option<MediaType>,
    ) -> CoreResult<Vec<Media>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM media
             WHERE content_id = $1 AND ($2::varchar IS NULL OR media_type = $2)
             ORDER BY created_at DESC, id DESC"
        );
        Ok(sqlx::query_as::<_, Media>(&sql)
            .bind(content_id)
            .bind(media_type)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update(&self, media: &Media) -> CoreResult<Media> {
        let sql = format!(
            "UPDATE media
             SET content_id = $2, filename = $3, metadata = $4, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Media>(&sql)
            .bind(media.id)
            .bind(media.content_id)
            .bind(&media.filename)
            .bind(&media.metadata)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("Media {} not found", media.id)))
    }

    async fn delete(&self, id: Uuid) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM media WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
