use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use content_hub_core::content::{
    Content, ContentFilter, ContentFull, ContentStatus, ContentType, ContentUpdate,
    LocalizedContent, NewContent,
};
use content_hub_core::language::DEFAULT_LANGUAGE;
use content_hub_core::pagination::{Page, PageRequest};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{ApiJson, AuthUser, MaybeUser};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u32 = 10;

/// Content routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/content", post(create_content).get(list_content))
        .route("/api/v1/content/slug/{slug}", get(get_content_by_slug))
        .route(
            "/api/v1/content/{id}",
            get(get_content).put(update_content).delete(delete_content),
        )
        .route("/api/v1/content/{id}/localized", get(get_localized))
        .route("/api/v1/content/{id}/publish", post(publish_content))
        .route("/api/v1/content/{id}/status", post(change_status))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    content_type: Option<ContentType>,
    status: Option<ContentStatus>,
    language: Option<String>,
    /// Comma-separated.
    tags: Option<String>,
    author_id: Option<Uuid>,
    search: Option<String>,
    page: Option<u32>,
    page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct LanguageParam {
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusParam {
    new_status: ContentStatus,
}

async fn create_content(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(input): ApiJson<NewContent>,
) -> ApiResult<(StatusCode, Json<Content>)> {
    let content = state.content().create(&user, input).await?;
    Ok((StatusCode::CREATED, Json(content)))
}

async fn list_content(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<Content>>> {
    let page = PageRequest::new(params.page, params.page_size, DEFAULT_PAGE_SIZE)?;
    let filter = ContentFilter {
        content_type: params.content_type,
        status: params.status,
        language: params.language,
        tags: params
            .tags
            .map(|t| {
                t.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        author_id: params.author_id,
        search: params.search,
        ..Default::default()
    };
    Ok(Json(state.content().list(viewer.user(), filter, page).await?))
}

async fn get_content(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ContentFull>> {
    Ok(Json(state.content().get_full(viewer.user(), id).await?))
}

async fn get_content_by_slug(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(slug): Path<String>,
    Query(params): Query<LanguageParam>,
) -> ApiResult<Json<ContentFull>> {
    let language = params.language.as_deref().unwrap_or(DEFAULT_LANGUAGE);
    let content = state
        .content()
        .get_by_slug(viewer.user(), &slug, language)
        .await?;
    Ok(Json(state.content().get_full(viewer.user(), content.id).await?))
}

async fn get_localized(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<Uuid>,
    Query(params): Query<LanguageParam>,
) -> ApiResult<Json<LocalizedContent>> {
    let language = params.language.as_deref().unwrap_or(DEFAULT_LANGUAGE);
    Ok(Json(
        state.content().localized(viewer.user(), id, language).await?,
    ))
}

async fn update_content(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(input): ApiJson<ContentUpdate>,
) -> ApiResult<Json<Content>> {
    Ok(Json(state.content().update(&user, id, input).await?))
}

/// Soft delete: the item is archived.
async fn delete_content(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.content().archive(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn publish_content(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Content>> {
    Ok(Json(state.content().publish(&user, id).await?))
}

async fn change_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Query(params): Query<StatusParam>,
) -> ApiResult<Json<Content>> {
    Ok(Json(
        state
            .content()
            .change_status(&user, id, params.new_status)
            .await?,
    ))
}
