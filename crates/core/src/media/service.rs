use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::model::{Media, MediaFilter, MediaType, MediaUpdate, Upload};
use super::processing::ImageProcessor;
use super::repository::MediaRepository;
use super::rules::{mime_for_extension, resolve_mime, validate_upload};
use super::storage::LocalStorage;
use crate::auth::CurrentUser;
use crate::content::ContentRepository;
use crate::error::{CoreError, CoreResult};
use crate::pagination::{Page, PageRequest};

/// A stored file ready to be sent to a client.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub data: Bytes,
    pub filename: String,
    pub mime_type: String,
}

#[derive(Clone)]
pub struct MediaService {
    media: Arc<dyn MediaRepository>,
    content: Arc<dyn ContentRepository>,
    storage: LocalStorage,
    images: ImageProcessor,
}

fn not_found(id: Uuid) -> CoreError {
    CoreError::not_found(format!("Media {id} not found"))
}

fn ensure_manageable(user: &CurrentUser, media: &Media) -> CoreResult<()> {
    if user.can_manage(Some(media.uploaded_by)) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Not authorized to modify this media".into(),
        ))
    }
}

/// The bytes that end up in storage, plus what image processing learned.
struct Prepared {
    data: Bytes,
    width: Option<i32>,
    height: Option<i32>,
    thumbnail: Option<Bytes>,
    metadata: Map<String, Value>,
}

impl MediaService {
    pub fn new(
        media: Arc<dyn MediaRepository>,
        content: Arc<dyn ContentRepository>,
        storage: LocalStorage,
    ) -> Self {
        Self {
            media,
            content,
            storage,
            images: ImageProcessor::default(),
        }
    }

    pub fn with_image_processor(mut self, images: ImageProcessor) -> Self {
        self.images = images;
        self
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    async fn ensure_content(&self, content_id: Uuid) -> CoreResult<()> {
        match self.content.find_by_id(content_id).await? {
            Some(_) => Ok(()),
            None => Err(CoreError::not_found(format!("Content {content_id} not found"))),
        }
    }

    async fn find(&self, id: Uuid) -> CoreResult<Media> {
        self.media.find_by_id(id).await?.ok_or_else(|| not_found(id))
    }

    async fn prepare(&self, upload: &Upload) -> Prepared {
        let mut prepared = Prepared {
            data: upload.data.clone(),
            width: None,
            height: None,
            thumbnail: None,
            metadata: match &upload.metadata {
                Some(Value::Object(map)) => map.clone(),
                _ => Map::new(),
            },
        };
        if upload.media_type != MediaType::Image {
            return prepared;
        }
        match self.images.process_async(upload.data.clone()).await {
            Ok(Some(image)) => {
                prepared.metadata.insert("format".into(), image.format_name().into());
                if image.resized {
                    prepared
                        .metadata
                        .insert("original_size".into(), upload.data.len().into());
                }
                prepared.width = i32::try_from(image.width).ok();
                prepared.height = i32::try_from(image.height).ok();
                prepared.data = image.data;
                prepared.thumbnail = Some(image.thumbnail);
            }
            Ok(None) => {}
            Err(err) => {
                warn!(filename = %upload.filename, error = %err, "image processing failed; storing original");
            }
        }
        prepared
    }

    /// Remove stored files, logging instead of failing.
    async fn discard(&self, paths: &[&str]) {
        for path in paths {
            if let Err(err) = self.storage.delete(path).await {
                warn!(storage_path = %path, error = %err, "failed to remove stored file");
            }
        }
    }

    /// Validate, process and store an upload, then record it.
    pub async fn upload(&self, user: &CurrentUser, upload: Upload) -> CoreResult<Media> {
        let mime_type = resolve_mime(upload.declared_mime.as_deref(), &upload.filename);
        validate_upload(upload.media_type, &mime_type, upload.data.len() as u64)?;
        if let Some(content_id) = upload.content_id {
            self.ensure_content(content_id).await?;
        }
        if matches!(&upload.metadata, Some(v) if !v.is_object()) {
            return Err(CoreError::BadRequest("metadata must be a JSON object".into()));
        }

        let mut prepared = self.prepare(&upload).await;
        let storage_path = self.storage.new_storage_path(&upload.filename);
        self.storage.save(&storage_path, &prepared.data).await?;

        let mut thumbnail_path = None;
        if let Some(thumb) = prepared.thumbnail.take() {
            let path = LocalStorage::thumbnail_path(&storage_path);
            match self.storage.save(&path, &thumb).await {
                Ok(()) => {
                    prepared
                        .metadata
                        .insert("thumbnail_path".into(), path.clone().into());
                    thumbnail_path = Some(path);
                }
                Err(err) => warn!(storage_path = %path, error = %err, "failed to store thumbnail"),
            }
        }

        let now = Utc::now();
        let media = Media {
            id: Uuid::now_v7(),
            content_id: upload.content_id,
            media_type: upload.media_type,
            filename: upload.filename,
            url: self.storage.url_for(&storage_path),
            storage_path: Some(storage_path.clone()),
            file_size: Some(prepared.data.len() as i64),
            mime_type: Some(mime_type),
            width: prepared.width,
            height: prepared.height,
            duration: None,
            metadata: Value::Object(prepared.metadata),
            uploaded_by: user.user_id,
            created_at: now,
            updated_at: now,
        };

        match self.media.insert(&media).await {
            Ok(created) => {
                info!(
                    media_id = %created.id,
                    user_id = %user.user_id,
                    media_type = %created.media_type,
                    bytes = prepared.data.len(),
                    "media uploaded"
                );
                Ok(created)
            }
            Err(err) => {
                let mut stored = vec![storage_path.as_str()];
                stored.extend(thumbnail_path.as_deref());
                self.discard(&stored).await;
                Err(err)
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<Media> {
        self.find(id).await
    }

    pub async fn list(&self, filter: &MediaFilter, page: PageRequest) -> CoreResult<Page<Media>> {
        self.media.list(filter, page).await
    }

    pub async fn list_for_content(
        &self,
        content_id: Uuid,
        media_type: Option<MediaType>,
    ) -> CoreResult<Vec<Media>> {
        self.ensure_content(content_id).await?;
        self.media.list_for_content(content_id, media_type).await
    }

    pub async fn update(
        &self,
        user: &CurrentUser,
        id: Uuid,
        input: MediaUpdate,
    ) -> CoreResult<Media> {
        input.validate()?;
        let mut media = self.find(id).await?;
        ensure_manageable(user, &media)?;

        if let Some(content_id) = input.content_id {
            self.ensure_content(content_id).await?;
            media.content_id = Some(content_id);
        }
        if let Some(filename) = input.filename {
            media.filename = filename;
        }
        if let Some(Value::Object(extra)) = input.metadata {
            // Merge so that recorded thumbnail and format keys survive.
            if let Value::Object(existing) = &mut media.metadata {
                existing.extend(extra);
            } else {
                media.metadata = Value::Object(extra);
            }
        }

        let updated = self.media.update(&media).await?;
        info!(media_id = %id, user_id = %user.user_id, "media updated");
        Ok(updated)
    }

    /// Delete the stored file, its thumbnail and the row.
    pub async fn delete(&self, user: &CurrentUser, id: Uuid) -> CoreResult<()> {
        let media = self.find(id).await?;
        ensure_manageable(user, &media)?;

        let mut stored: Vec<&str> = media.storage_path.as_deref().into_iter().collect();
        stored.extend(media.thumbnail_path());
        self.discard(&stored).await;

        if !self.media.delete(id).await? {
            return Err(not_found(id));
        }
        info!(media_id = %id, user_id = %user.user_id, "media deleted");
        Ok(())
    }

    /// The stored file of a media row, for download.
    pub async fn open(&self, id: Uuid) -> CoreResult<MediaFile> {
        let media = self.find(id).await?;
        let path = media
            .storage_path
            .as_deref()
            .ok_or_else(|| CoreError::not_found("File not found in storage"))?;
        let data = self
            .storage
            .read(path)
            .await?
            .ok_or_else(|| CoreError::not_found("File not found in storage"))?;
        Ok(MediaFile {
            data,
            mime_type: media
                .mime_type
                .clone()
                .unwrap_or_else(|| "application/octet-stream".into()),
            filename: media.filename,
        })
    }

    /// Serve a file straight from storage by its storage path.
    pub async fn serve_file(&self, storage_path: &str) -> CoreResult<MediaFile> {
        let data = self
            .storage
            .read(storage_path)
            .await?
            .ok_or_else(|| CoreError::not_found("File not found"))?;
        let filename = storage_path
            .rsplit('/')
            .next()
            .unwrap_or(storage_path)
            .to_string();
        Ok(MediaFile {
            data,
            mime_type: mime_for_extension(&filename)
                .unwrap_or("application/octet-stream")
                .to_string(),
            filename,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::content::{ContentService, NewContent};
    use crate::memory::{test_superuser, test_user, MemoryRepositories};
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use serde_json::json;

    struct Fixture {
        _dir: tempfile::TempDir,
        repos: MemoryRepositories,
        media: MediaService,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let repos = MemoryRepositories::new();
        let storage = LocalStorage::new(dir.path(), "http://cdn.test");
        let media = MediaService::new(repos.media.clone(), repos.content.clone(), storage);
        Fixture {
            _dir: dir,
            repos,
            media,
        }
    }

    fn png(width: u32, height: u32) -> Bytes {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([9, 9, 9, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        Bytes::from(buf)
    }

    fn upload(filename: &str, mime: &str, data: Bytes, media_type: MediaType) -> Upload {
        Upload {
            filename: filename.into(),
            declared_mime: Some(mime.into()),
            data,
            media_type,
            content_id: None,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn image_upload_is_resized_with_thumbnail() {
        let fx = fixture();
        let user = test_user();
        let media = fx
            .media
            .upload(&user, upload("banner.png", "image/png", png(3000, 1500), MediaType::Image))
            .await
            .unwrap();

        assert_eq!((media.width, media.height), (Some(2048), Some(1024)));
        assert_eq!(media.mime_type.as_deref(), Some("image/png"));
        assert_eq!(media.metadata["format"], "png");
        assert_eq!(media.uploaded_by, user.user_id);

        let path = media.storage_path.clone().unwrap();
        assert!(media.url.starts_with("http://cdn.test/api/v1/media/files/uploads/"));
        assert!(media.url.ends_with(&path));
        let thumb = media.thumbnail_path().unwrap();
        assert_eq!(thumb, LocalStorage::thumbnail_path(&path));
        assert!(fx.media.storage().exists(thumb).await.unwrap());

        let stored = fx.media.open(media.id).await.unwrap();
        assert_eq!(stored.data.len() as i64, media.file_size.unwrap());
        assert_eq!(stored.filename, "banner.png");
    }

    #[tokio::test]
    async fn undecodable_image_is_stored_as_received() {
        let fx = fixture();
        let data = Bytes::from_static(b"\x89PNG\r\n\x1a\nbroken");
        let media = fx
            .media
            .upload(&test_user(), upload("broken.png", "image/png", data.clone(), MediaType::Image))
            .await
            .unwrap();
        assert!(media.width.is_none());
        assert!(media.thumbnail_path().is_none());
        assert_eq!(fx.media.open(media.id).await.unwrap().data, data);
    }

    #[tokio::test]
    async fn rejects_wrong_type_and_oversize() {
        let fx = fixture();
        let user = test_user();
        let err = fx
            .media
            .upload(&user, upload("a.pdf", "application/pdf", Bytes::from_static(b"%PDF"), MediaType::Image))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedMediaType { .. }));

        let big = Bytes::from(vec![0u8; (20 * 1024 * 1024) + 1]);
        let err = fx
            .media
            .upload(&user, upload("big.pdf", "application/pdf", big, MediaType::Document))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::PayloadTooLarge { .. }));
    }

    #[tokio::test]
    async fn mime_is_guessed_from_extension_when_generic() {
        let fx = fixture();
        let media = fx
            .media
            .upload(
                &test_user(),
                upload(
                    "notes.txt",
                    "application/octet-stream",
                    Bytes::from_static(b"hello"),
                    MediaType::Document,
                ),
            )
            .await
            .unwrap();
        assert_eq!(media.mime_type.as_deref(), Some("text/plain"));
        assert_eq!(media.file_size, Some(5));
    }

    #[tokio::test]
    async fn upload_to_missing_content_is_not_found() {
        let fx = fixture();
        let mut up = upload("a.txt", "text/plain", Bytes::from_static(b"x"), MediaType::Document);
        up.content_id = Some(Uuid::new_v4());
        assert!(matches!(
            fx.media.upload(&test_user(), up).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn content_media_listing_requires_content() {
        let fx = fixture();
        let user = test_user();
        let content = ContentService::new(
            fx.repos.content.clone(),
            fx.repos.translations.clone(),
            fx.repos.media.clone(),
        );
        let input: NewContent = serde_json::from_value(json!({
            "title": "Gallery",
            "slug": "gallery",
            "body": "Photos",
            "content_type": "resource"
        }))
        .unwrap();
        let item = content.create(&user, input).await.unwrap();

        let mut up = upload("a.png", "image/png", png(10, 10), MediaType::Image);
        up.content_id = Some(item.id);
        fx.media.upload(&user, up).await.unwrap();
        let mut doc = upload("b.txt", "text/plain", Bytes::from_static(b"b"), MediaType::Document);
        doc.content_id = Some(item.id);
        fx.media.upload(&user, doc).await.unwrap();

        let newest_first: Vec<String> = fx
            .media
            .list_for_content(item.id, None)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.filename)
            .collect();
        assert_eq!(newest_first, vec!["b.txt", "a.png"]);
        assert_eq!(
            fx.media
                .list_for_content(item.id, Some(MediaType::Image))
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(matches!(
            fx.media.list_for_content(Uuid::new_v4(), None).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_merges_metadata_and_checks_owner() {
        let fx = fixture();
        let owner = test_user();
        let media = fx
            .media
            .upload(&owner, upload("p.png", "image/png", png(8, 8), MediaType::Image))
            .await
            .unwrap();

        let change = MediaUpdate {
            filename: Some("portrait.png".into()),
            metadata: Some(json!({"alt": "A portrait"})),
            ..Default::default()
        };
        assert!(matches!(
            fx.media.update(&test_user(), media.id, change.clone()).await,
            Err(CoreError::Forbidden(_))
        ));
        let updated = fx.media.update(&owner, media.id, change).await.unwrap();
        assert_eq!(updated.filename, "portrait.png");
        assert_eq!(updated.metadata["alt"], "A portrait");
        assert!(updated.thumbnail_path().is_some());
        assert_eq!(updated.url, media.url);
    }

    #[tokio::test]
    async fn delete_removes_files_and_row() {
        let fx = fixture();
        let owner = test_user();
        let media = fx
            .media
            .upload(&owner, upload("d.png", "image/png", png(8, 8), MediaType::Image))
            .await
            .unwrap();
        let path = media.storage_path.clone().unwrap();
        let thumb = media.thumbnail_path().unwrap().to_string();

        assert!(matches!(
            fx.media.delete(&test_user(), media.id).await,
            Err(CoreError::Forbidden(_))
        ));
        fx.media.delete(&test_superuser(), media.id).await.unwrap();

        assert!(!fx.media.storage().exists(&path).await.unwrap());
        assert!(!fx.media.storage().exists(&thumb).await.unwrap());
        assert!(matches!(fx.media.get(media.id).await, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn missing_file_cannot_be_opened() {
        let fx = fixture();
        let media = fx
            .media
            .upload(&test_user(), upload("x.txt", "text/plain", Bytes::from_static(b"x"), MediaType::Document))
            .await
            .unwrap();
        fx.media
            .storage()
            .delete(media.storage_path.as_deref().unwrap())
            .await
            .unwrap();
        assert!(matches!(fx.media.open(media.id).await, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn serves_files_by_path() {
        let fx = fixture();
        let media = fx
            .media
            .upload(&test_user(), upload("s.txt", "text/plain", Bytes::from_static(b"served"), MediaType::Document))
            .await
            .unwrap();
        let file = fx
            .media
            .serve_file(media.storage_path.as_deref().unwrap())
            .await
            .unwrap();
        assert_eq!(file.data, Bytes::from_static(b"served"));
        assert_eq!(file.mime_type, "text/plain");

        assert!(matches!(
            fx.media.serve_file("../secret").await,
            Err(CoreError::BadRequest(_))
        ));
        assert!(matches!(
            fx.media.serve_file("uploads/none.txt").await,
            Err(CoreError::NotFound(_))
        ));
    }

    /// Accepts nothing: every insert fails as if the database went away.
    struct FailingMediaRepository;

    #[async_trait::async_trait]
    impl MediaRepository for FailingMediaRepository {
        async fn insert(&self, _media: &Media) -> CoreResult<Media> {
            Err(CoreError::Database(sqlx::Error::RowNotFound))
        }

        async fn find_by_id(&self, _id: Uuid) -> CoreResult<Option<Media>> {
            Ok(None)
        }

        async fn list(&self, _filter: &MediaFilter, page: PageRequest) -> CoreResult<Page<Media>> {
            Ok(Page::new(Vec::new(), 0, page))
        }

        async fn list_for_content(
            &self,
            _content_id: Uuid,
            _media_type: Option<MediaType>,
        ) -> CoreResult<Vec<Media>> {
            Ok(Vec::new())
        }

        async fn update(&self, media: &Media) -> CoreResult<Media> {
            Ok(media.clone())
        }

        async fn delete(&self, _id: Uuid) -> CoreResult<bool> {
            Ok(false)
        }
    }

    fn stored_files(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                files.extend(stored_files(&path));
            } else {
                files.push(path);
            }
        }
        files
    }

    #[tokio::test]
    async fn failed_insert_removes_stored_files() {
        let dir = tempfile::tempdir().unwrap();
        let repos = MemoryRepositories::new();
        let media = MediaService::new(
            Arc::new(FailingMediaRepository),
            repos.content.clone(),
            LocalStorage::new(dir.path(), "http://cdn.test"),
        );

        let result = media
            .upload(
                &test_user(),
                upload("poster.png", "image/png", png(400, 400), MediaType::Image),
            )
            .await;
        assert!(matches!(result, Err(CoreError::Database(_))));
        assert!(stored_files(dir.path()).is_empty());
    }
}
