// Archivo: routes/mod.rs
// Propósito: tabla de rutas de la API y utilidades comunes de los handlers
// (tipos de la ruta, cuerpos JSON y archivos multipart).
use axum::{
  extract::{
    multipart::MultipartError,
    rejection::{JsonRejection, PathRejection},
    Multipart, Path,
  },
  http::StatusCode,
  routing::{delete, get, post, put},
  Json, Router,
};
use cie_domain::{InventoryKind, TicketKind};
use cie_service::ServiceError;

use crate::{error::AppError, state::AppState};

pub mod admin;
pub mod courses;
pub mod files;
pub mod inventory;
pub mod opportunities;
pub mod projects;
pub mod requests;
pub mod tickets;

pub fn api_router() -> Router<AppState> {
  Router::new()
    .route("/health", get(health_handler))
    .route("/api/users", get(admin::list_users).post(admin::create_user))
    .route("/api/users/me", get(admin::me))
    .route("/api/dashboard", get(admin::dashboard))
    .route("/api/inventory/{kind}", get(inventory::list).post(inventory::create))
    .route("/api/inventory/{kind}/categories",
           get(inventory::categories).post(inventory::add_category).delete(inventory::remove_category))
    .route("/api/inventory/{kind}/locations", get(inventory::locations))
    .route("/api/inventory/{kind}/import", post(inventory::import_csv))
    .route("/api/inventory/{kind}/export", get(inventory::export_csv))
    .route("/api/inventory/{kind}/{id}", get(inventory::get_one).put(inventory::update).delete(inventory::remove))
    .route("/api/requests/{kind}", get(requests::list).post(requests::create))
    .route("/api/requests/{kind}/{id}", get(requests::get_one).patch(requests::update_status))
    .route("/api/tickets/{kind}", get(tickets::list).post(tickets::create))
    .route("/api/tickets/{kind}/images", post(tickets::upload_image))
    .route("/api/tickets/{kind}/{id}", get(tickets::get_one).patch(tickets::apply))
    .route("/api/opportunities", get(opportunities::list).post(opportunities::create))
    .route("/api/opportunities/my-applications", get(opportunities::my_applications))
    .route("/api/opportunities/{id}",
           get(opportunities::get_one).put(opportunities::update).delete(opportunities::remove))
    .route("/api/opportunities/{id}/accept", post(opportunities::accept))
    .route("/api/opportunities/{id}/apply", post(opportunities::apply))
    .route("/api/opportunities/{id}/applications", get(opportunities::list_applications))
    .route("/api/applications/{id}/status", put(opportunities::update_application_status))
    .route("/api/applications/{id}/resume", get(opportunities::resume))
    .route("/api/projects", get(projects::list).post(projects::create))
    .route("/api/projects/approve", get(projects::pending).put(projects::review))
    .route("/api/projects/{id}", get(projects::get_one).delete(projects::remove))
    .route("/api/project-requests", get(projects::list_requests).post(projects::create_request))
    .route("/api/project-requests/{id}", put(projects::decide_request).patch(projects::decide_request))
    .route("/api/domains", get(admin::list_domains).post(admin::create_domain))
    .route("/api/domains/{id}", delete(admin::delete_domain))
    .route("/api/coordinators/assign", post(admin::assign_coordinator))
    .route("/api/coordinators/assignments", get(admin::list_assignments))
    .route("/api/coordinators/assignments/{id}", delete(admin::remove_assignment))
    .route("/api/coordinators/check", get(admin::check_coordinator))
    .route("/api/courses", get(courses::list_courses).post(courses::create_course))
    .route("/api/enrollments", get(courses::list_enrollments).post(courses::enroll))
    .route("/api/enrollments/{id}/grade", put(courses::grade).patch(courses::grade))
    .route("/files/{*key}", get(files::serve))
}

async fn health_handler() -> Json<serde_json::Value> {
  Json(serde_json::json!({ "status": "ok" }))
}

/// Tipo de inventario a partir del segmento de ruta; desconocido -> 404.
pub(crate) fn inventory_kind(segment: &str) -> Result<InventoryKind, AppError> {
  InventoryKind::from_path(segment).ok_or_else(|| ServiceError::not_found("Inventory type").into())
}

pub(crate) fn ticket_kind(segment: &str) -> Result<TicketKind, AppError> {
  TicketKind::from_path(segment).ok_or_else(|| ServiceError::not_found("Ticket type").into())
}

/// Cuerpo JSON con el error en el formato de la API.
pub(crate) fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
  payload.map(|Json(v)| v).map_err(|e| AppError::MalformedPayload(e.body_text()))
}

/// Parámetros de ruta tipados (ids UUID); un id mal formado es 400 con el
/// mismo cuerpo `{"error": ...}` que el resto de la API.
pub(crate) fn path<T>(params: Result<Path<T>, PathRejection>) -> Result<T, AppError> {
  params.map(|Path(v)| v).map_err(|e| AppError::MalformedPayload(e.body_text()))
}

pub(crate) fn created<T>(value: T) -> (StatusCode, Json<T>) {
  (StatusCode::CREATED, Json(value))
}

pub(crate) fn deleted(what: &str) -> Json<serde_json::Value> {
  Json(serde_json::json!({ "message": format!("{} deleted successfully", what) }))
}

/// Archivo recibido en un campo multipart.
#[derive(Debug, Clone)]
pub(crate) struct UploadedFile {
  pub file_name: String,
  pub content_type: Option<String>,
  pub bytes: Vec<u8>,
}

fn multipart_error(e: MultipartError) -> AppError {
  if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
    AppError::PayloadTooLarge
  } else {
    AppError::MalformedPayload(e.body_text())
  }
}

/// Lee el campo `name` del multipart; el resto de campos se ignora.
pub(crate) async fn read_file(mut multipart: Multipart, name: &str) -> Result<UploadedFile, AppError> {
  while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
    if field.name() != Some(name) {
      continue;
    }
    let file_name = field.file_name().unwrap_or(name).to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await.map_err(multipart_error)?.to_vec();
    return Ok(UploadedFile { file_name, content_type, bytes });
  }
  Err(ServiceError::bad_request(format!("No {} file provided", name)).into())
}
