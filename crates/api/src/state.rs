use std::sync::Arc;

use content_hub_core::auth::TokenVerifier;
use content_hub_core::content::{ContentRepository, ContentService};
use content_hub_core::media::{LocalStorage, MediaRepository, MediaService};
use content_hub_core::translation::{TranslationRepository, TranslationService};

use crate::config::AppConfig;

/// Shared application state, passed to all handlers via Axum's `State` extractor.
/// Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    config: AppConfig,
    tokens: TokenVerifier,
    content: ContentService,
    translations: TranslationService,
    media: MediaService,
}

/// The three repositories every service is built from.
pub struct Repositories {
    pub content: Arc<dyn ContentRepository>,
    pub translations: Arc<dyn TranslationRepository>,
    pub media: Arc<dyn MediaRepository>,
}

impl AppState {
    pub fn new(config: AppConfig, repos: Repositories) -> Self {
        let storage = LocalStorage::new(&config.upload_dir, &config.base_url);
        let content = ContentService::new(
            repos.content.clone(),
            repos.translations.clone(),
            repos.media.clone(),
        );
        let translations = TranslationService::new(repos.content.clone(), repos.translations);
        let media = MediaService::new(repos.media, repos.content, storage);
        Self {
            inner: Arc::new(InnerState {
                tokens: TokenVerifier::new(&config.jwt_secret),
                config,
                content,
                translations,
                media,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn tokens(&self) -> &TokenVerifier {
        &self.inner.tokens
    }

    pub fn content(&self) -> &ContentService {
        &self.inner.content
    }

    pub fn translations(&self) -> &TranslationService {
        &self.inner.translations
    }

    pub fn media(&self) -> &MediaService {
        &self.inner.media
    }
}
