use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use cie_service::ServiceError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
  #[error(transparent)]
  Service(#[from] ServiceError),

  #[error("Malformed payload: {0}")]
  MalformedPayload(String),

  #[error("Payload too large")]
  PayloadTooLarge,

  #[error("Internal error: {0}")]
  Internal(String),
}

impl From<tokio::task::JoinError> for AppError {
  fn from(e: tokio::task::JoinError) -> Self {
    AppError::Internal(format!("blocking task failed: {}", e))
  }
}

impl AppError {
  pub fn status(&self) -> StatusCode {
    match self {
      AppError::Service(e) => StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
      AppError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
      AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
      AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    let message = match &self {
      AppError::Service(e) => e.public_message(),
      AppError::MalformedPayload(m) => m.clone(),
      AppError::PayloadTooLarge => self.to_string(),
      AppError::Internal(_) => "Internal server error".to_string(),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
