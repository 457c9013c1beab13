use axum::{
  extract::{
    rejection::{JsonRejection, PathRejection},
    Path, State,
  },
  http::StatusCode,
  Json,
};
use cie_domain::{Project, ProjectDraft, ProjectRequest};
use cie_service::{NewProjectRequest, ProjectRequestView, ProjectReview, ProjectView};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{body, created, deleted, path};
use crate::{error::AppError, identity::Identity, state::AppState};

#[derive(Deserialize)]
pub struct DecisionBody {
  #[serde(default)]
  status: String,
  #[serde(default)]
  faculty_notes: Option<String>,
}

pub async fn list(State(state): State<AppState>, identity: Identity) -> Result<Json<Vec<ProjectView>>, AppError> {
  let caller = state.caller(identity).await?;
  state.run(move |s| s.projects.list(&caller)).await.map(Json)
}

pub async fn create(State(state): State<AppState>,
                    identity: Identity,
                    payload: Result<Json<ProjectDraft>, JsonRejection>)
                    -> Result<(StatusCode, Json<Project>), AppError> {
  let caller = state.caller(identity).await?;
  let draft = body(payload)?;
  state.run(move |s| s.projects.create(&caller, draft)).await.map(created)
}

pub async fn get_one(State(state): State<AppState>,
                     identity: Identity,
                     id: Result<Path<Uuid>, PathRejection>)
                     -> Result<Json<ProjectView>, AppError> {
  let id = path(id)?;
  let caller = state.caller(identity).await?;
  state.run(move |s| s.projects.get(&caller, id)).await.map(Json)
}

pub async fn remove(State(state): State<AppState>,
                    identity: Identity,
                    id: Result<Path<Uuid>, PathRejection>)
                    -> Result<Json<Value>, AppError> {
  let id = path(id)?;
  let caller = state.caller(identity).await?;
  state.run(move |s| s.projects.delete(&caller, id)).await?;
  Ok(deleted("Project"))
}

/// Proyectos docentes pendientes, para coordinadores de Lab Components.
pub async fn pending(State(state): State<AppState>, identity: Identity) -> Result<Json<Vec<ProjectView>>, AppError> {
  let caller = state.caller(identity).await?;
  state.run(move |s| s.projects.pending_reviews(&caller)).await.map(Json)
}

/// `{ "project_id": ..., "status": "ONGOING" | "REJECTED" }`.
pub async fn review(State(state): State<AppState>,
                    identity: Identity,
                    payload: Result<Json<ProjectReview>, JsonRejection>)
                    -> Result<Json<Value>, AppError> {
  let caller = state.caller(identity).await?;
  let input = body(payload)?;
  let project = state.run(move |s| s.projects.review(&caller, input)).await?;
  let message = format!("Project {} successfully", project.status.as_str().to_lowercase());
  Ok(Json(json!({ "project": project, "message": message })))
}

pub async fn list_requests(State(state): State<AppState>,
                           identity: Identity)
                           -> Result<Json<Vec<ProjectRequestView>>, AppError> {
  let caller = state.caller(identity).await?;
  state.run(move |s| s.projects.list_requests(&caller)).await.map(Json)
}

pub async fn create_request(State(state): State<AppState>,
                            identity: Identity,
                            payload: Result<Json<NewProjectRequest>, JsonRejection>)
                            -> Result<(StatusCode, Json<ProjectRequest>), AppError> {
  let caller = state.caller(identity).await?;
  let input = body(payload)?;
  state.run(move |s| s.projects.create_request(&caller, input)).await.map(created)
}

pub async fn decide_request(State(state): State<AppState>,
                            identity: Identity,
                            id: Result<Path<Uuid>, PathRejection>,
                            payload: Result<Json<DecisionBody>, JsonRejection>)
                            -> Result<Json<ProjectRequestView>, AppError> {
  let id = path(id)?;
  let caller = state.caller(identity).await?;
  let DecisionBody { status, faculty_notes } = body(payload)?;
  state.run(move |s| s.projects.decide_request(&caller, id, &status, faculty_notes)).await.map(Json)
}
