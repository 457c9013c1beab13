// Archivo: routes/admin.rs
// Propósito: usuarios, tablero, dominios y asignación de coordinadores.
use axum::{
  extract::{rejection::{JsonRejection, PathRejection}, Path, Query, State},
  http::StatusCode,
  Json,
};
use cie_domain::{Domain, User};
use cie_service::{AssignCoordinator, CoordinatorAssignment, CoordinatorCheck, Dashboard, DomainSummary, NewDomain,
                  NewUser, UserProfile};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::{body, created, deleted, path};
use crate::{error::AppError, identity::Identity, state::AppState};

#[derive(Deserialize)]
pub struct UserQuery {
  role: Option<String>,
}

pub async fn list_users(State(state): State<AppState>,
                        identity: Identity,
                        Query(query): Query<UserQuery>)
                        -> Result<Json<Vec<User>>, AppError> {
  let caller = state.caller(identity).await?;
  state.run(move |s| s.users.list_users(&caller, query.role.as_deref())).await.map(Json)
}

pub async fn create_user(State(state): State<AppState>,
                         identity: Identity,
                         payload: Result<Json<NewUser>, JsonRejection>)
                         -> Result<(StatusCode, Json<UserProfile>), AppError> {
  let caller = state.caller(identity).await?;
  let input = body(payload)?;
  state.run(move |s| s.users.create_user(&caller, input)).await.map(created)
}

pub async fn me(State(state): State<AppState>, identity: Identity) -> Result<Json<UserProfile>, AppError> {
  let caller = state.caller(identity).await?;
  state.run(move |s| s.users.me(&caller)).await.map(Json)
}

pub async fn dashboard(State(state): State<AppState>, identity: Identity) -> Result<Json<Dashboard>, AppError> {
  let caller = state.caller(identity).await?;
  state.run(move |s| s.dashboard.summary(&caller)).await.map(Json)
}

pub async fn list_domains(State(state): State<AppState>,
                          identity: Identity)
                          -> Result<Json<Vec<DomainSummary>>, AppError> {
  state.caller(identity).await?;
  state.run(|s| s.coordinators.list_domains()).await.map(Json)
}

pub async fn create_domain(State(state): State<AppState>,
                           identity: Identity,
                           payload: Result<Json<NewDomain>, JsonRejection>)
                           -> Result<(StatusCode, Json<Domain>), AppError> {
  let caller = state.caller(identity).await?;
  let input = body(payload)?;
  state.run(move |s| s.coordinators.create_domain(&caller, input)).await.map(created)
}

pub async fn delete_domain(State(state): State<AppState>,
                           identity: Identity,
                           id: Result<Path<Uuid>, PathRejection>)
                           -> Result<Json<Value>, AppError> {
  let id = path(id)?;
  let caller = state.caller(identity).await?;
  state.run(move |s| s.coordinators.delete_domain(&caller, id)).await?;
  Ok(deleted("Domain"))
}

pub async fn assign_coordinator(State(state): State<AppState>,
                                identity: Identity,
                                payload: Result<Json<AssignCoordinator>, JsonRejection>)
                                -> Result<(StatusCode, Json<CoordinatorAssignment>), AppError> {
  let caller = state.caller(identity).await?;
  let input = body(payload)?;
  state.run(move |s| s.coordinators.assign(&caller, input)).await.map(created)
}

pub async fn list_assignments(State(state): State<AppState>,
                              identity: Identity)
                              -> Result<Json<Vec<CoordinatorAssignment>>, AppError> {
  let caller = state.caller(identity).await?;
  state.run(move |s| s.coordinators.list_assignments(&caller)).await.map(Json)
}

pub async fn remove_assignment(State(state): State<AppState>,
                               identity: Identity,
                               id: Result<Path<Uuid>, PathRejection>)
                               -> Result<Json<Value>, AppError> {
  let id = path(id)?;
  let caller = state.caller(identity).await?;
  state.run(move |s| s.coordinators.remove_assignment(&caller, id)).await?;
  Ok(deleted("Assignment"))
}

pub async fn check_coordinator(State(state): State<AppState>,
                               identity: Identity)
                               -> Result<Json<CoordinatorCheck>, AppError> {
  let caller = state.caller(identity).await?;
  state.run(move |s| s.coordinators.check(&caller)).await.map(Json)
}
