use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use vitrine_core::classify::parse_labels;
use vitrine_core::LabelScore;

use super::run_blocking;
use crate::server::error::{ApiError, ApiResult};
use crate::server::form::UploadForm;
use crate::server::state::AppState;

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub results: Vec<LabelScore>,
}

/// `POST /api/v1/classify/`: fields `image` (file) and `labels` (comma list).
pub async fn classify(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<ClassifyResponse>> {
    let mut form = UploadForm::read(multipart).await?;
    let bytes = form.require_image()?;
    let labels = parse_labels(form.require_text("labels")?);
    if labels.is_empty() {
        return Err(ApiError::BadRequest(
            "'labels' must contain at least one non-blank label".to_string(),
        ));
    }

    let image = state.vitrine.decode(bytes).await?.image;

    let vitrine = state.vitrine.clone();
    let results = run_blocking(move || vitrine.classify(&image, &labels)).await?;

    Ok(Json(ClassifyResponse { results }))
}
