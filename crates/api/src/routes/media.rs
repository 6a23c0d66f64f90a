use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use content_hub_core::media::{Media, MediaFile, MediaFilter, MediaType, MediaUpdate, Upload};
use content_hub_core::pagination::{Page, PageRequest};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, AuthUser};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u32 = 20;

/// Media routes. Upload routes accept bodies up to `max_upload_bytes`.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    let uploads = Router::new()
        .route("/api/v1/media/upload", post(upload_media))
        .route(
            "/api/v1/media/content/{id}/upload",
            post(upload_media_for_content),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes));

    Router::new()
        .merge(uploads)
        .route("/api/v1/media", get(list_media))
        .route("/api/v1/media/content/{id}/media", get(list_content_media))
        .route(
            "/api/v1/media/{id}",
            get(get_media).put(update_media).delete(delete_media),
        )
        .route("/api/v1/media/{id}/download", get(download_media))
        .route("/api/v1/media/files/{*path}", get(serve_file))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    media_type: Option<MediaType>,
    uploaded_by: Option<Uuid>,
    content_id: Option<Uuid>,
    page: Option<u32>,
    page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct MediaTypeParam {
    media_type: Option<MediaType>,
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

/// Collect the `file`, `media_type`, `content_id` and `metadata` fields.
async fn read_upload(mut multipart: Multipart, content_id: Option<Uuid>) -> ApiResult<Upload> {
    let mut file: Option<(String, Option<String>, Bytes)> = None;
    let mut media_type = None;
    let mut form_content_id = None;
    let mut metadata = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let declared = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some((filename, declared, data));
            }
            "media_type" => {
                let text = field.text().await.map_err(multipart_error)?;
                media_type = Some(text.parse::<MediaType>()?);
            }
            "content_id" => {
                let text = field.text().await.map_err(multipart_error)?;
                if !text.trim().is_empty() {
                    form_content_id = Some(Uuid::parse_str(text.trim()).map_err(|_| {
                        ApiError::BadRequest("Invalid content_id format".into())
                    })?);
                }
            }
            "metadata" => {
                let text = field.text().await.map_err(multipart_error)?;
                if !text.trim().is_empty() {
                    let value: Value = serde_json::from_str(&text).map_err(|_| {
                        ApiError::BadRequest("Invalid metadata JSON format".into())
                    })?;
                    metadata = Some(value);
                }
            }
            _ => {}
        }
    }

    let (filename, declared_mime, data) =
        file.ok_or_else(|| ApiError::Unprocessable("missing 'file' field".into()))?;
    let media_type =
        media_type.ok_or_else(|| ApiError::Unprocessable("missing 'media_type' field".into()))?;

    Ok(Upload {
        filename,
        declared_mime,
        data,
        media_type,
        content_id: content_id.or(form_content_id),
        metadata,
    })
}

async fn upload_media(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Media>)> {
    let upload = read_upload(multipart, None).await?;
    let media = state.media().upload(&user, upload).await?;
    Ok((StatusCode::CREATED, Json(media)))
}

async fn upload_media_for_content(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(content_id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Media>)> {
    let upload = read_upload(multipart, Some(content_id)).await?;
    let media = state.media().upload(&user, upload).await?;
    Ok((StatusCode::CREATED, Json(media)))
}

async fn list_media(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<Media>>> {
    let page = PageRequest::new(params.page, params.page_size, DEFAULT_PAGE_SIZE)?;
    let filter = MediaFilter {
        media_type: params.media_type,
        uploaded_by: params.uploaded_by,
        content_id: params.content_id,
    };
    Ok(Json(state.media().list(&filter, page).await?))
}

async fn list_content_media(
    State(state): State<AppState>,
    Path(content_id): Path<Uuid>,
    Query(params): Query<MediaTypeParam>,
) -> ApiResult<Json<Vec<Media>>> {
    Ok(Json(
        state
            .media()
            .list_for_content(content_id, params.media_type)
            .await?,
    ))
}

async fn get_media(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Media>> {
    Ok(Json(state.media().get(id).await?))
}

async fn update_media(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(input): ApiJson<MediaUpdate>,
) -> ApiResult<Json<Media>> {
    Ok(Json(state.media().update(&user, id, input).await?))
}

async fn delete_media(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.media().delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn file_response(file: MediaFile, disposition: &str) -> Response {
    let content_type = HeaderValue::from_str(&file.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let safe_name: String = file
        .filename
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .filter(|c| *c != '"' && *c != '\\')
        .collect();
    let disposition = HeaderValue::from_str(&format!("{disposition}; filename=\"{safe_name}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.data,
    )
        .into_response()
}

async fn download_media(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let file = state.media().open(id).await?;
    Ok(file_response(file, "attachment"))
}

async fn serve_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResult<Response> {
    let file = state.media().serve_file(&path).await?;
    Ok(file_response(file, "inline"))
}
