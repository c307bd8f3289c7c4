use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use vitrine_core::SearchResult;

use super::run_blocking;
use crate::server::error::ApiResult;
use crate::server::form::UploadForm;
use crate::server::state::AppState;

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

/// `POST /api/v1/search/`: fields `image` (file), `text`, `alpha`, `top_k`, all optional.
pub async fn search(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<SearchResponse>> {
    let form = UploadForm::read(multipart).await?;
    let defaults = &state.vitrine.config().search;
    let alpha: f32 = form.parse_or("alpha", defaults.default_alpha)?;
    let top_k: usize = form.parse_or("top_k", defaults.default_top_k)?;
    let text = form.text("text").map(str::to_string);

    let image = match form.image {
        Some(bytes) => Some(state.vitrine.decode(bytes).await?.image),
        None => None,
    };

    tracing::debug!(
        has_image = image.is_some(),
        has_text = text.is_some(),
        alpha,
        top_k,
        "Search request"
    );

    let vitrine = state.vitrine.clone();
    let results =
        run_blocking(move || vitrine.search(image.as_ref(), text.as_deref(), alpha, top_k))
            .await?;

    Ok(Json(SearchResponse { results }))
}
