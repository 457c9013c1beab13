use axum::{
  extract::{rejection::{JsonRejection, PathRejection}, Path, State},
  http::StatusCode,
  Json,
};
use cie_domain::Course;
use cie_service::{EnrollmentView, NewCourse, NewEnrollment};
use serde::Deserialize;
use uuid::Uuid;

use super::{body, created, path};
use crate::{error::AppError, identity::Identity, state::AppState};

#[derive(Deserialize)]
pub struct GradeBody {
  grade: Option<String>,
}

pub async fn list_courses(State(state): State<AppState>, identity: Identity) -> Result<Json<Vec<Course>>, AppError> {
  state.caller(identity).await?;
  state.run(|s| s.enrollments.list_courses()).await.map(Json)
}

pub async fn create_course(State(state): State<AppState>,
                           identity: Identity,
                           payload: Result<Json<NewCourse>, JsonRejection>)
                           -> Result<(StatusCode, Json<Course>), AppError> {
  let caller = state.caller(identity).await?;
  let input = body(payload)?;
  state.run(move |s| s.enrollments.create_course(&caller, input)).await.map(created)
}

pub async fn list_enrollments(State(state): State<AppState>,
                              identity: Identity)
                              -> Result<Json<Vec<EnrollmentView>>, AppError> {
  let caller = state.caller(identity).await?;
  state.run(move |s| s.enrollments.list_enrollments(&caller)).await.map(Json)
}

pub async fn enroll(State(state): State<AppState>,
                    identity: Identity,
                    payload: Result<Json<NewEnrollment>, JsonRejection>)
                    -> Result<(StatusCode, Json<EnrollmentView>), AppError> {
  let caller = state.caller(identity).await?;
  let input = body(payload)?;
  state.run(move |s| s.enrollments.enroll(&caller, input)).await.map(created)
}

pub async fn grade(State(state): State<AppState>,
                   identity: Identity,
                   id: Result<Path<Uuid>, PathRejection>,
                   payload: Result<Json<GradeBody>, JsonRejection>)
                   -> Result<Json<EnrollmentView>, AppError> {
  let id = path(id)?;
  let caller = state.caller(identity).await?;
  let GradeBody { grade } = body(payload)?;
  state.run(move |s| s.enrollments.grade(&caller, id, grade.as_deref())).await.map(Json)
}
