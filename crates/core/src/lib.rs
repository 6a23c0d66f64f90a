//! Domain layer for the content hub: content items, their translations and
//! uploaded media, plus the repositories and services that operate on them.

pub mod auth;
pub mod content;
pub mod error;
pub mod language;
pub mod media;
pub mod pagination;
pub mod postgres;
pub mod translation;

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use error::{CoreError, CoreResult};
