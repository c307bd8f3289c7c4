use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use vitrine_core::DetectedObject;

use super::run_blocking;
use crate::server::error::ApiResult;
use crate::server::form::UploadForm;
use crate::server::state::AppState;

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub detected_objects: Vec<DetectedObject>,
}

/// `POST /api/v1/detect/`: field `image` (file).
pub async fn detect(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<DetectResponse>> {
    let mut form = UploadForm::read(multipart).await?;
    let image = state.vitrine.decode(form.require_image()?).await?.image;

    let vitrine = state.vitrine.clone();
    let detected_objects = run_blocking(move || vitrine.detect(&image)).await?;

    Ok(Json(DetectResponse { detected_objects }))
}
