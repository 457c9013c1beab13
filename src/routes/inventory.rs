use axum::{
  extract::{rejection::{JsonRejection, PathRejection}, Multipart, Path, Query, State},
  http::{header, StatusCode},
  response::{IntoResponse, Response},
  Json,
};
use cie_domain::{ItemAvailability, ItemDraft};
use cie_service::ImportReport;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{body, created, deleted, inventory_kind, path, read_file};
use crate::{error::AppError, identity::Identity, state::AppState};

#[derive(Deserialize)]
pub struct CategoryParam {
  #[serde(default)]
  category: String,
}

#[derive(Serialize)]
pub struct ImportResponse {
  success: bool,
  #[serde(flatten)]
  report: ImportReport,
}

pub async fn list(State(state): State<AppState>,
                  identity: Identity,
                  Path(kind): Path<String>)
                  -> Result<Json<Vec<ItemAvailability>>, AppError> {
  let kind = inventory_kind(&kind)?;
  state.caller(identity).await?;
  state.run(move |s| s.inventory.list(kind)).await.map(Json)
}

pub async fn get_one(State(state): State<AppState>,
                     identity: Identity,
                     params: Result<Path<(String, Uuid)>, PathRejection>)
                     -> Result<Json<ItemAvailability>, AppError> {
  let (kind, id) = path(params)?;
  let kind = inventory_kind(&kind)?;
  state.caller(identity).await?;
  state.run(move |s| s.inventory.get(kind, id)).await.map(Json)
}

pub async fn create(State(state): State<AppState>,
                    identity: Identity,
                    Path(kind): Path<String>,
                    payload: Result<Json<ItemDraft>, JsonRejection>)
                    -> Result<(StatusCode, Json<ItemAvailability>), AppError> {
  let kind = inventory_kind(&kind)?;
  let caller = state.caller(identity).await?;
  let draft = body(payload)?;
  state.run(move |s| s.inventory.create(&caller, kind, draft)).await.map(created)
}

pub async fn update(State(state): State<AppState>,
                    identity: Identity,
                    params: Result<Path<(String, Uuid)>, PathRejection>,
                    payload: Result<Json<ItemDraft>, JsonRejection>)
                    -> Result<Json<ItemAvailability>, AppError> {
  let (kind, id) = path(params)?;
  let kind = inventory_kind(&kind)?;
  let caller = state.caller(identity).await?;
  let draft = body(payload)?;
  state.run(move |s| s.inventory.update(&caller, kind, id, draft)).await.map(Json)
}

pub async fn remove(State(state): State<AppState>,
                    identity: Identity,
                    params: Result<Path<(String, Uuid)>, PathRejection>)
                    -> Result<Json<Value>, AppError> {
  let (kind, id) = path(params)?;
  let kind = inventory_kind(&kind)?;
  let caller = state.caller(identity).await?;
  state.run(move |s| s.inventory.delete(&caller, kind, id)).await?;
  Ok(deleted("Item"))
}

pub async fn categories(State(state): State<AppState>,
                        identity: Identity,
                        Path(kind): Path<String>)
                        -> Result<Json<Vec<String>>, AppError> {
  let kind = inventory_kind(&kind)?;
  state.caller(identity).await?;
  state.run(move |s| s.inventory.categories(kind)).await.map(Json)
}

pub async fn locations(State(state): State<AppState>,
                       identity: Identity,
                       Path(kind): Path<String>)
                       -> Result<Json<Vec<String>>, AppError> {
  let kind = inventory_kind(&kind)?;
  state.caller(identity).await?;
  state.run(move |s| s.inventory.locations(kind)).await.map(Json)
}

pub async fn add_category(State(state): State<AppState>,
                          identity: Identity,
                          Path(kind): Path<String>,
                          payload: Result<Json<CategoryParam>, JsonRejection>)
                          -> Result<(StatusCode, Json<Value>), AppError> {
  let kind = inventory_kind(&kind)?;
  let caller = state.caller(identity).await?;
  let CategoryParam { category } = body(payload)?;
  let formatted = state.run(move |s| s.inventory.add_category(&caller, kind, &category)).await?;
  Ok(created(json!({ "message": "Category validated successfully", "category": formatted })))
}

/// `DELETE ...?category=Nombre`.
pub async fn remove_category(State(state): State<AppState>,
                             identity: Identity,
                             Path(kind): Path<String>,
                             Query(param): Query<CategoryParam>)
                             -> Result<Json<Value>, AppError> {
  let kind = inventory_kind(&kind)?;
  let caller = state.caller(identity).await?;
  state.run(move |s| s.inventory.remove_category(&caller, kind, &param.category)).await?;
  Ok(deleted("Category"))
}

/// Multipart con el archivo en el campo `csv`.
pub async fn import_csv(State(state): State<AppState>,
                        identity: Identity,
                        Path(kind): Path<String>,
                        multipart: Multipart)
                        -> Result<Json<ImportResponse>, AppError> {
  let kind = inventory_kind(&kind)?;
  let caller = state.caller(identity).await?;
  let file = read_file(multipart, "csv").await?;
  let report = state.run(move |s| s.inventory.import_csv(&caller, kind, &file.file_name, &file.bytes)).await?;
  Ok(Json(ImportResponse { success: true, report }))
}

pub async fn export_csv(State(state): State<AppState>,
                        identity: Identity,
                        Path(kind): Path<String>)
                        -> Result<Response, AppError> {
  let kind = inventory_kind(&kind)?;
  let caller = state.caller(identity).await?;
  let bytes = state.run(move |s| s.inventory.export_csv(&caller, kind)).await?;
  let disposition = format!("attachment; filename=\"{}_inventory.csv\"", kind.as_str().to_lowercase());
  Ok(([(header::CONTENT_TYPE, "text/csv".to_string()), (header::CONTENT_DISPOSITION, disposition)], bytes).into_response())
}
