use axum::{
  extract::{Path, State},
  http::header,
  response::{IntoResponse, Response},
};
use cie_persistence::content_type_for;
use cie_service::ServiceError;

use crate::{error::AppError, state::AppState};

/// Archivos subidos, servidos por clave (`/files/feedback-images/...`).
/// Los currículums se sirven sólo por `/api/applications/{id}/resume`.
pub async fn serve(State(state): State<AppState>, Path(key): Path<String>) -> Result<Response, AppError> {
  if key.starts_with("resumes/") {
    return Err(ServiceError::not_found("File").into());
  }
  let blobs = state.blobs.clone();
  let lookup = key.clone();
  let blob = tokio::task::spawn_blocking(move || blobs.get(&lookup)).await?
                                                                    .map_err(ServiceError::from)?
                                                                    .ok_or_else(|| ServiceError::not_found("File"))?;
  let content_type = blob.content_type
                         .or_else(|| content_type_for(&key).map(str::to_string))
                         .unwrap_or_else(|| "application/octet-stream".to_string());
  Ok(([(header::CONTENT_TYPE, content_type)], blob.bytes).into_response())
}
