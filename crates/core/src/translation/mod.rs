//! Per-language variants of content items.

pub mod model;
pub mod repository;
pub mod service;
pub mod workflow;

pub use model::{
    AvailableLanguages, NewTranslation, Translation, TranslationStatus, TranslationUpdate,
};
pub use repository::TranslationRepository;
pub use service::TranslationService;
