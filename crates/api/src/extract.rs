//! Request extractors: bearer-token authentication and JSON bodies that
//! reject with the API's error shape.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Json, RequestPartsExt,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use content_hub_core::auth::CurrentUser;

use crate::error::ApiError;
use crate::state::AppState;

/// An authenticated, active caller. Rejects with 401 or 403.
#[derive(Debug, Clone)]
pub struct AuthUser(pub CurrentUser);

/// The caller when a bearer token is present. A token that is present but
/// invalid is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl MaybeUser {
    pub fn user(&self) -> Option<&CurrentUser> {
        self.0.as_ref()
    }
}

async fn authenticate(parts: &mut Parts, state: &AppState) -> Result<Option<CurrentUser>, ApiError> {
    let bearer = match parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(rejection) if rejection.is_missing() => return Ok(None),
        Err(_) => {
            return Err(ApiError::Unauthorized(
                "Malformed authorization header".into(),
            ))
        }
    };

    let user = state.tokens().verify(bearer.token()).map_err(|err| {
        tracing::debug!(error = %err, "token rejected");
        ApiError::Unauthorized("Could not validate credentials".into())
    })?;
    if !user.is_active {
        return Err(ApiError::Forbidden("Inactive user".into()));
    }
    Ok(Some(user))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authenticate(parts, state)
            .await?
            .map(AuthUser)
            .ok_or_else(|| ApiError::Unauthorized("Not authenticated".into()))
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(authenticate(parts, state).await?))
    }
}

/// `Json<T>` whose rejection is an [`ApiError`].
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(JsonRejection::MissingJsonContentType(rejection)) => {
                Err(ApiError::UnsupportedMediaType(rejection.body_text()))
            }
            Err(rejection) => Err(ApiError::Unprocessable(rejection.body_text())),
        }
    }
}
