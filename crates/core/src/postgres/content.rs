use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::like_pattern;
use crate::content::{Content, ContentFilter, ContentRepository, Visibility};
use crate::error::{CoreError, CoreResult};
use crate::pagination::{Page, PageRequest};

const COLUMNS: &str = "id, title, slug, body, content_type, status, author_id, language, \
     featured_image_url, tags, metadata, published_at, created_at, updated_at";

/// Shared by the listing and its count. `$8` restricts to published rows
/// unless the row belongs to `$9`.
const LIST_WHERE: &str = "
    WHERE ($1::content_type_enum IS NULL OR content_type = $1)
      AND ($2::content_status_enum IS NULL OR status = $2)
      AND ($3::text IS NULL OR language = $3)
      AND (cardinality($4::text[]) = 0 OR tags && $4)
      AND ($5::uuid IS NULL OR author_id = $5)
      AND ($6::text IS NULL OR title ILIKE $6 OR body ILIKE $6)
      AND ($7::bool = FALSE OR status = 'published' OR author_id = $8)";

#[derive(Debug, Clone)]
pub struct PgContentRepository {
    pool: PgPool,
}

impl PgContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn slug_conflict(err: sqlx::Error, slug: &str) -> CoreError {
    CoreError::from_unique_violation(err, format!("Content with slug '{slug}' already exists"))
}

#[async_trait]
impl ContentRepository for PgContentRepository {
    async fn ping(&self) -> CoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert(&self, content: &Content) -> CoreResult<Content> {
        let sql = format!(
            "INSERT INTO content ({COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Content>(&sql)
            .bind(content.id)
            .bind(&content.title)
            .bind(&content.slug)
            .bind(&content.body)
            .bind(content.content_type)
            .bind(content.status)
            .bind(content.author_id)
            .bind(&content.language)
            .bind(&content.featured_image_url)
            .bind(&content.tags)
            .bind(&content.metadata)
            .bind(content.published_at)
            .bind(content.created_at)
            .bind(content.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| slug_conflict(e, &content.slug))
    }

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Content>> {
        let sql = format!("SELECT {COLUMNS} FROM content WHERE id = $1");
        Ok(sqlx::query_as::<_, Content>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_slug(&self, slug: &str, language: &str) -> CoreResult<Option<Content>> {
        let sql = format!("SELECT {COLUMNS} FROM content WHERE slug = $1 AND language = $2");
        Ok(sqlx::query_as::<_, Content>(&sql)
            .bind(slug)
            .bind(language)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn slug_taken(&self, slug: &str, excluding: Option<Uuid>) -> CoreResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM content WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(excluding)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn list(&self, filter: &ContentFilter, page: PageRequest) -> CoreResult<Page<Content>> {
        let (restricted, viewer) = match filter.visibility {
            Visibility::Public => (true, None),
            Visibility::Author(user) => (true, Some(user)),
            Visibility::All => (false, None),
        };
        let search = filter.search.as_deref().map(like_pattern);

        let count_sql = format!("SELECT COUNT(*) FROM content {LIST_WHERE}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(filter.content_type)
            .bind(filter.status)
            .bind(&filter.language)
            .bind(&filter.tags)
            .bind(filter.author_id)
            .bind(&search)
            .bind(restricted)
            .bind(viewer)
            .fetch_one(&self.pool)
            .await?;

        let list_sql = format!(
            "SELECT {COLUMNS} FROM content {LIST_WHERE}
             ORDER BY published_at DESC NULLS LAST, updated_at DESC
             LIMIT $9 OFFSET $10"
        );
        let items = sqlx::query_as::<_, Content>(&list_sql)
            .bind(filter.content_type)
            .bind(filter.status)
            .bind(&filter.language)
            .bind(&filter.tags)
            .bind(filter.author_id)
            .bind(&search)
            .bind(restricted)
            .bind(viewer)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(items, total, page))
    }

    async fn update(&self, content: &Content) -> CoreResult<Content> {
        let sql = format!(
            "UPDATE content
             SET title = $2, slug = $3, body = $4, content_type = $5, status = $6,
                 language = $7, featured_image_url = $8, tags = $9, metadata = $10,
                 published_at = $11, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Content>(&sql)
            .bind(content.id)
            .bind(&content.title)
            .bind(&content.slug)
            .bind(&content.body)
            .bind(content.content_type)
            .bind(content.status)
            .bind(&content.language)
            .bind(&content.featured_image_url)
            .bind(&content.tags)
            .bind(&content.metadata)
            .bind(content.published_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| slug_conflict(e, &content.slug))?
            .ok_or_else(|| CoreError::not_found(format!("Content {} not found", content.id)))
    }
}
