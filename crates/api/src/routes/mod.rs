pub mod content;
pub mod health;
pub mod media;
pub mod translations;


use axum::Router;

use crate::state::AppState;

/// Assemble the full router with all route groups.
pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.config().max_upload_bytes;
    Router::new()
        .merge(health::routes())
        .merge(content::routes())
        .merge(translations::routes())
        .merge(media::routes(max_upload_bytes))
        .with_state(state)
}
