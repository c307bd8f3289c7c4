use axum::extract::{Multipart, State};
use axum::Json;
use vitrine_core::SegmentationReport;

use super::run_blocking;
use crate::server::error::ApiResult;
use crate::server::form::UploadForm;
use crate::server::state::AppState;

/// `POST /api/v1/segment/`: field `image` (file).
pub async fn segment(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<SegmentationReport>> {
    let mut form = UploadForm::read(multipart).await?;
    let image = state.vitrine.decode(form.require_image()?).await?.image;

    let vitrine = state.vitrine.clone();
    let report = run_blocking(move || vitrine.segment(&image)).await?;

    Ok(Json(report))
}
