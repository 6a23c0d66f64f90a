//! Accepted file types and size ceilings per media type.

use super::model::MediaType;
use crate::error::{CoreError, CoreResult};

const MIB: u64 = 1024 * 1024;

pub const MAX_IMAGE_SIZE: u64 = 10 * MIB;
pub const MAX_VIDEO_SIZE: u64 = 100 * MIB;
pub const MAX_AUDIO_SIZE: u64 = 50 * MIB;
pub const MAX_DOCUMENT_SIZE: u64 = 20 * MIB;

const OCTET_STREAM: &str = "application/octet-stream";

const IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
];

const VIDEO_TYPES: &[&str] = &[
    "video/mp4",
    "video/mpeg",
    "video/quicktime",
    "video/x-msvideo",
    "video/webm",
];

const AUDIO_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/ogg",
    "audio/aac",
    "audio/webm",
];

const DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/plain",
];

const EXTENSIONS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("mp4", "video/mp4"),
    ("mpeg", "video/mpeg"),
    ("mpg", "video/mpeg"),
    ("mov", "video/quicktime"),
    ("avi", "video/x-msvideo"),
    ("webm", "video/webm"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("aac", "audio/aac"),
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("txt", "text/plain"),
];

pub fn allowed_mime_types(media_type: MediaType) -> &'static [&'static str] {
    match media_type {
        MediaType::Image => IMAGE_TYPES,
        MediaType::Video => VIDEO_TYPES,
        MediaType::Audio => AUDIO_TYPES,
        MediaType::Document => DOCUMENT_TYPES,
    }
}

pub fn max_size(media_type: MediaType) -> u64 {
    match media_type {
        MediaType::Image => MAX_IMAGE_SIZE,
        MediaType::Video => MAX_VIDEO_SIZE,
        MediaType::Audio => MAX_AUDIO_SIZE,
        MediaType::Document => MAX_DOCUMENT_SIZE,
    }
}

/// The largest file any media type accepts.
pub fn max_upload_size() -> u64 {
    [
        MediaType::Image,
        MediaType::Video,
        MediaType::Audio,
        MediaType::Document,
    ]
    .into_iter()
    .map(max_size)
    .max()
    .unwrap_or(MAX_VIDEO_SIZE)
}

pub fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

pub fn mime_for_extension(filename: &str) -> Option<&'static str> {
    let ext = extension(filename)?;
    EXTENSIONS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

/// The MIME type of an upload: the declared type when it is specific,
/// otherwise a guess from the file extension.
pub fn resolve_mime(declared: Option<&str>, filename: &str) -> String {
    let declared = declared
        .map(|m| {
            m.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_lowercase()
        })
        .filter(|m| !m.is_empty() && m != OCTET_STREAM);
    declared
        .or_else(|| mime_for_extension(filename).map(str::to_string))
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}

/// Check an upload's type and size against the rules for `media_type`.
pub fn validate_upload(media_type: MediaType, mime_type: &str, size: u64) -> CoreResult<()> {
    if size == 0 {
        return Err(CoreError::BadRequest("uploaded file is empty".into()));
    }
    if !allowed_mime_types(media_type).contains(&mime_type) {
        return Err(CoreError::UnsupportedMediaType {
            media_type: media_type.to_string(),
            mime_type: mime_type.to_string(),
        });
    }
    let limit = max_size(media_type);
    if size > limit {
        return Err(CoreError::PayloadTooLarge {
            media_type: media_type.to_string(),
            size,
            limit,
        });
    }
    Ok(())
}
