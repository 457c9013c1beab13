use axum::{
  extract::{rejection::{JsonRejection, PathRejection}, Multipart, Path, State},
  http::{header, StatusCode},
  response::{IntoResponse, Response},
  Json,
};
use cie_domain::{Opportunity, OpportunityApplication, OpportunityDraft};
use cie_service::{ApplicationView, OpportunityView, ResumeUpload};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::{body, created, deleted, path, read_file};
use crate::{error::AppError, identity::Identity, state::AppState};

#[derive(Deserialize)]
pub struct ApplicationStatusBody {
  #[serde(default)]
  status: String,
}

pub async fn list(State(state): State<AppState>, identity: Identity) -> Result<Json<Vec<OpportunityView>>, AppError> {
  let caller = state.caller(identity).await?;
  state.run(move |s| s.opportunities.list(&caller)).await.map(Json)
}

pub async fn create(State(state): State<AppState>,
                    identity: Identity,
                    payload: Result<Json<OpportunityDraft>, JsonRejection>)
                    -> Result<(StatusCode, Json<Opportunity>), AppError> {
  let caller = state.caller(identity).await?;
  let draft = body(payload)?;
  state.run(move |s| s.opportunities.create(&caller, draft)).await.map(created)
}

pub async fn get_one(State(state): State<AppState>,
                     identity: Identity,
                     id: Result<Path<Uuid>, PathRejection>)
                     -> Result<Json<OpportunityView>, AppError> {
  let id = path(id)?;
  let caller = state.caller(identity).await?;
  state.run(move |s| s.opportunities.get(&caller, id)).await.map(Json)
}

pub async fn update(State(state): State<AppState>,
                    identity: Identity,
                    id: Result<Path<Uuid>, PathRejection>,
                    payload: Result<Json<OpportunityDraft>, JsonRejection>)
                    -> Result<Json<Opportunity>, AppError> {
  let id = path(id)?;
  let caller = state.caller(identity).await?;
  let draft = body(payload)?;
  state.run(move |s| s.opportunities.update(&caller, id, draft)).await.map(Json)
}

pub async fn remove(State(state): State<AppState>,
                    identity: Identity,
                    id: Result<Path<Uuid>, PathRejection>)
                    -> Result<Json<Value>, AppError> {
  let id = path(id)?;
  let caller = state.caller(identity).await?;
  state.run(move |s| s.opportunities.delete(&caller, id)).await?;
  Ok(deleted("Opportunity"))
}

/// El docente dueño publica la oportunidad para los estudiantes.
pub async fn accept(State(state): State<AppState>,
                    identity: Identity,
                    id: Result<Path<Uuid>, PathRejection>)
                    -> Result<Json<Opportunity>, AppError> {
  let id = path(id)?;
  let caller = state.caller(identity).await?;
  state.run(move |s| s.opportunities.accept(&caller, id)).await.map(Json)
}

/// Multipart con el currículum (PDF) en el campo `resume`.
pub async fn apply(State(state): State<AppState>,
                   identity: Identity,
                   id: Result<Path<Uuid>, PathRejection>,
                   multipart: Multipart)
                   -> Result<Json<OpportunityApplication>, AppError> {
  let id = path(id)?;
  let caller = state.caller(identity).await?;
  let file = read_file(multipart, "resume").await?;
  let resume = ResumeUpload { file_name: file.file_name, content_type: file.content_type, bytes: file.bytes };
  state.run(move |s| s.opportunities.apply(&caller, id, resume)).await.map(Json)
}

pub async fn list_applications(State(state): State<AppState>,
                               identity: Identity,
                               id: Result<Path<Uuid>, PathRejection>)
                               -> Result<Json<Vec<ApplicationView>>, AppError> {
  let id = path(id)?;
  let caller = state.caller(identity).await?;
  state.run(move |s| s.opportunities.list_applications(&caller, id)).await.map(Json)
}

pub async fn my_applications(State(state): State<AppState>,
                             identity: Identity)
                             -> Result<Json<Vec<ApplicationView>>, AppError> {
  let caller = state.caller(identity).await?;
  state.run(move |s| s.opportunities.my_applications(&caller)).await.map(Json)
}

pub async fn update_application_status(State(state): State<AppState>,
                                       identity: Identity,
                                       id: Result<Path<Uuid>, PathRejection>,
                                       payload: Result<Json<ApplicationStatusBody>, JsonRejection>)
                                       -> Result<Json<ApplicationView>, AppError> {
  let id = path(id)?;
  let caller = state.caller(identity).await?;
  let ApplicationStatusBody { status } = body(payload)?;
  state.run(move |s| s.opportunities.update_application_status(&caller, id, &status)).await.map(Json)
}

pub async fn resume(State(state): State<AppState>,
                    identity: Identity,
                    id: Result<Path<Uuid>, PathRejection>)
                    -> Result<Response, AppError> {
  let id = path(id)?;
  let caller = state.caller(identity).await?;
  let blob = state.run(move |s| s.opportunities.resume(&caller, id)).await?;
  let file_name = blob.key.rsplit('/').next().unwrap_or("resume.pdf").to_string();
  let content_type = blob.content_type.unwrap_or_else(|| "application/pdf".to_string());
  Ok(([(header::CONTENT_TYPE, content_type),
       (header::CONTENT_DISPOSITION, format!("inline; filename=\"{}\"", file_name))],
      blob.bytes)
        .into_response())
}
