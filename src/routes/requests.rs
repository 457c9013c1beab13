use axum::{
  extract::{rejection::{JsonRejection, PathRejection}, Path, Query, State},
  http::StatusCode,
  Json,
};
use cie_service::{CheckoutView, NewCheckout};
use serde::Deserialize;
use uuid::Uuid;

use super::{body, created, inventory_kind, path};
use crate::{error::AppError, identity::Identity, state::AppState};

#[derive(Deserialize)]
pub struct ListQuery {
  status: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusUpdate {
  #[serde(default)]
  status: String,
  #[serde(default, alias = "facultyNotes")]
  faculty_notes: Option<String>,
}

pub async fn list(State(state): State<AppState>,
                  identity: Identity,
                  Path(kind): Path<String>,
                  Query(query): Query<ListQuery>)
                  -> Result<Json<Vec<CheckoutView>>, AppError> {
  let kind = inventory_kind(&kind)?;
  let caller = state.caller(identity).await?;
  state.run(move |s| s.checkout.list(&caller, kind, query.status.as_deref())).await.map(Json)
}

pub async fn create(State(state): State<AppState>,
                    identity: Identity,
                    Path(kind): Path<String>,
                    payload: Result<Json<NewCheckout>, JsonRejection>)
                    -> Result<(StatusCode, Json<CheckoutView>), AppError> {
  let kind = inventory_kind(&kind)?;
  let caller = state.caller(identity).await?;
  let input = body(payload)?;
  state.run(move |s| s.checkout.create(&caller, kind, input)).await.map(created)
}

pub async fn get_one(State(state): State<AppState>,
                     identity: Identity,
                     params: Result<Path<(String, Uuid)>, PathRejection>)
                     -> Result<Json<CheckoutView>, AppError> {
  let (kind, id) = path(params)?;
  let kind = inventory_kind(&kind)?;
  let caller = state.caller(identity).await?;
  state.run(move |s| s.checkout.get(&caller, kind, id)).await.map(Json)
}

/// Cuerpo `{"status": "...", "faculty_notes": "..."}`.
pub async fn update_status(State(state): State<AppState>,
                           identity: Identity,
                           params: Result<Path<(String, Uuid)>, PathRejection>,
                           payload: Result<Json<StatusUpdate>, JsonRejection>)
                           -> Result<Json<CheckoutView>, AppError> {
  let (kind, id) = path(params)?;
  let kind = inventory_kind(&kind)?;
  let caller = state.caller(identity).await?;
  let update = body(payload)?;
  state.run(move |s| s.checkout.update_status(&caller, kind, id, &update.status, update.faculty_notes))
       .await
       .map(Json)
}
