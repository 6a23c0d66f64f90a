use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::Query as MultiQuery;
use content_hub_core::translation::{
    AvailableLanguages, NewTranslation, Translation, TranslationStatus, TranslationUpdate,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{ApiJson, AuthUser, MaybeUser};
use crate::state::AppState;

/// Translation routes, nested under content.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/content/{id}/translations",
            post(create_translation).get(list_translations),
        )
        .route(
            "/api/v1/content/{id}/translations/bulk",
            post(bulk_create_translations),
        )
        .route(
            "/api/v1/content/{id}/translations/{language}",
            get(get_translation_by_language),
        )
        .route("/api/v1/content/{id}/languages", get(available_languages))
        .route(
            "/api/v1/content/translations/{tid}",
            get(get_translation)
                .put(update_translation)
                .delete(delete_translation),
        )
        .route(
            "/api/v1/content/translations/{tid}/status",
            post(change_status),
        )
}

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(alias = "status_filter")]
    status: Option<TranslationStatus>,
}

#[derive(Debug, Deserialize)]
struct BulkParams {
    #[serde(default)]
    languages: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StatusParam {
    new_status: TranslationStatus,
}

async fn create_translation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(content_id): Path<Uuid>,
    ApiJson(input): ApiJson<NewTranslation>,
) -> ApiResult<(StatusCode, Json<Translation>)> {
    let translation = state
        .translations()
        .create(&user, content_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(translation)))
}

async fn list_translations(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(content_id): Path<Uuid>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Translation>>> {
    Ok(Json(
        state
            .translations()
            .list_for_content(viewer.user(), content_id, params.status)
            .await?,
    ))
}

async fn get_translation_by_language(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path((content_id, language)): Path<(Uuid, String)>,
) -> ApiResult<Json<Translation>> {
    Ok(Json(
        state
            .translations()
            .get_by_language(viewer.user(), content_id, &language)
            .await?,
    ))
}

/// `?languages=es&languages=fr`
async fn bulk_create_translations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(content_id): Path<Uuid>,
    MultiQuery(params): MultiQuery<BulkParams>,
) -> ApiResult<(StatusCode, Json<Vec<Translation>>)> {
    let created = state
        .translations()
        .bulk_create(&user, content_id, &params.languages)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn available_languages(
    State(state): State<AppState>,
    Path(content_id): Path<Uuid>,
) -> ApiResult<Json<AvailableLanguages>> {
    Ok(Json(
        state.translations().available_languages(content_id).await?,
    ))
}

async fn get_translation(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Translation>> {
    Ok(Json(state.translations().get(viewer.user(), id).await?))
}

async fn update_translation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(input): ApiJson<TranslationUpdate>,
) -> ApiResult<Json<Translation>> {
    Ok(Json(state.translations().update(&user, id, input).await?))
}

async fn delete_translation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.translations().delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn change_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Query(params): Query<StatusParam>,
) -> ApiResult<Json<Translation>> {
    Ok(Json(
        state
            .translations()
            .change_status(&user, id, params.new_status)
            .await?,
    ))
}
