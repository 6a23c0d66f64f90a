//! Uploaded media: validation rules, image processing, file storage,
//! persistence and the upload service.

pub mod model;
pub mod processing;
pub mod repository;
pub mod rules;
pub mod service;
pub mod storage;

pub use model::{Media, MediaFilter, MediaType, MediaUpdate, Upload};
pub use repository::MediaRepository;
pub use service::{MediaFile, MediaService};
pub use storage::LocalStorage;
