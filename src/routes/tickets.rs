use axum::{
  extract::{rejection::{JsonRejection, PathRejection}, Multipart, Path, State},
  http::StatusCode,
  Json,
};
use cie_domain::ReviewTicket;
use cie_service::{ImageUpload, NewTicket, TicketUpdate};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{body, created, path, read_file, ticket_kind};
use crate::{error::AppError, identity::Identity, state::AppState};

pub async fn list(State(state): State<AppState>,
                  identity: Identity,
                  Path(kind): Path<String>)
                  -> Result<Json<Vec<ReviewTicket>>, AppError> {
  let kind = ticket_kind(&kind)?;
  let caller = state.caller(identity).await?;
  state.run(move |s| s.tickets.list(&caller, kind)).await.map(Json)
}

pub async fn create(State(state): State<AppState>,
                    identity: Identity,
                    Path(kind): Path<String>,
                    payload: Result<Json<NewTicket>, JsonRejection>)
                    -> Result<(StatusCode, Json<ReviewTicket>), AppError> {
  let kind = ticket_kind(&kind)?;
  let caller = state.caller(identity).await?;
  let input = body(payload)?;
  state.run(move |s| s.tickets.create(&caller, kind, input)).await.map(created)
}

pub async fn get_one(State(state): State<AppState>,
                     identity: Identity,
                     params: Result<Path<(String, Uuid)>, PathRejection>)
                     -> Result<Json<ReviewTicket>, AppError> {
  let (kind, id) = path(params)?;
  let kind = ticket_kind(&kind)?;
  let caller = state.caller(identity).await?;
  state.run(move |s| s.tickets.get(&caller, kind, id)).await.map(Json)
}

/// Cuerpo `{"action": "approve|reject|start|done|complete", ...}`.
pub async fn apply(State(state): State<AppState>,
                   identity: Identity,
                   params: Result<Path<(String, Uuid)>, PathRejection>,
                   payload: Result<Json<TicketUpdate>, JsonRejection>)
                   -> Result<Json<ReviewTicket>, AppError> {
  let (kind, id) = path(params)?;
  let kind = ticket_kind(&kind)?;
  let caller = state.caller(identity).await?;
  let update = body(payload)?;
  state.run(move |s| s.tickets.apply(&caller, kind, id, update)).await.map(Json)
}

/// Multipart con la imagen en el campo `image`; devuelve su URL pública.
pub async fn upload_image(State(state): State<AppState>,
                          identity: Identity,
                          Path(kind): Path<String>,
                          multipart: Multipart)
                          -> Result<(StatusCode, Json<Value>), AppError> {
  let kind = ticket_kind(&kind)?;
  let caller = state.caller(identity).await?;
  let file = read_file(multipart, "image").await?;
  let upload = ImageUpload { file_name: file.file_name, content_type: file.content_type, bytes: file.bytes };
  let key = state.run(move |s| s.tickets.upload_image(&caller, kind, upload)).await?;
  Ok(created(json!({ "url": state.config.public_url(&key), "key": key })))
}
