//! Content items: model, publication workflow, persistence and service.

pub mod model;
pub mod repository;
pub mod service;
pub mod workflow;

pub use model::{
    Content, ContentFilter, ContentFull, ContentStatus, ContentType, ContentUpdate,
    LocalizedContent, NewContent, Visibility,
};
pub use repository::ContentRepository;
pub use service::ContentService;
