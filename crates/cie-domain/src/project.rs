// project.rs
use crate::DomainError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Origen del proyecto: propuesto por un docente (pasa por el coordinador
/// de "Lab Components") o por un estudiante (lo decide el docente al que
/// se lo pide).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectKind {
  FacultyAssigned,
  StudentProposed,
}

impl ProjectKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ProjectKind::FacultyAssigned => "FACULTY_ASSIGNED",
      ProjectKind::StudentProposed => "STUDENT_PROPOSED",
    }
  }
}

impl FromStr for ProjectKind {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_uppercase().as_str() {
      "FACULTY_ASSIGNED" => Ok(ProjectKind::FacultyAssigned),
      "STUDENT_PROPOSED" => Ok(ProjectKind::StudentProposed),
      other => Err(DomainError::ValidationError(format!("Invalid project type: {}", other))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectStatus {
  Pending,
  Ongoing,
  Rejected,
  Completed,
}

impl ProjectStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      ProjectStatus::Pending => "PENDING",
      ProjectStatus::Ongoing => "ONGOING",
      ProjectStatus::Rejected => "REJECTED",
      ProjectStatus::Completed => "COMPLETED",
    }
  }
}

impl FromStr for ProjectStatus {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_uppercase().as_str() {
      "PENDING" => Ok(ProjectStatus::Pending),
      "ONGOING" => Ok(ProjectStatus::Ongoing),
      "REJECTED" => Ok(ProjectStatus::Rejected),
      "COMPLETED" => Ok(ProjectStatus::Completed),
      other => Err(DomainError::ValidationError(format!("Invalid project status: {}", other))),
    }
  }
}

impl fmt::Display for ProjectStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectRequestStatus {
  Pending,
  Approved,
  Rejected,
}

impl ProjectRequestStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      ProjectRequestStatus::Pending => "PENDING",
      ProjectRequestStatus::Approved => "APPROVED",
      ProjectRequestStatus::Rejected => "REJECTED",
    }
  }
}

impl FromStr for ProjectRequestStatus {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_uppercase().as_str() {
      "PENDING" => Ok(ProjectRequestStatus::Pending),
      "APPROVED" => Ok(ProjectRequestStatus::Approved),
      "REJECTED" => Ok(ProjectRequestStatus::Rejected),
      _ => Err(DomainError::ValidationError("Invalid status".to_string())),
    }
  }
}

impl fmt::Display for ProjectRequestStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Campos que envía quien crea el proyecto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDraft {
  pub name: String,
  #[serde(default)]
  pub description: String,
  /// Ids de componentes de laboratorio; no se reservan unidades.
  #[serde(default)]
  pub components_needed: Vec<Uuid>,
  pub expected_completion_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
  pub id: Uuid,
  pub name: String,
  pub description: String,
  pub components_needed: Vec<Uuid>,
  pub expected_completion_date: NaiveDate,
  #[serde(rename = "type")]
  pub kind: ProjectKind,
  pub status: ProjectStatus,
  pub created_by: Uuid,
  pub created_at: DateTime<Utc>,
  pub modified_by: Option<Uuid>,
  pub modified_at: DateTime<Utc>,
}

impl Project {
  pub fn new(draft: ProjectDraft, kind: ProjectKind, created_by: Uuid) -> Result<Self, DomainError> {
    if draft.name.trim().is_empty() {
      return Err(DomainError::ValidationError("Project name is required".to_string()));
    }
    let mut components: Vec<Uuid> = Vec::with_capacity(draft.components_needed.len());
    for id in draft.components_needed {
      if !components.contains(&id) {
        components.push(id);
      }
    }
    let now = Utc::now();
    Ok(Self { id: Uuid::new_v4(),
              name: draft.name.trim().to_string(),
              description: draft.description,
              components_needed: components,
              expected_completion_date: draft.expected_completion_date,
              kind,
              status: ProjectStatus::Pending,
              created_by,
              created_at: now,
              modified_by: None,
              modified_at: now })
  }

  /// Revisión del coordinador sobre un proyecto docente pendiente:
  /// PENDING -> ONGOING | REJECTED.
  pub fn review(&self, to: ProjectStatus, by: Uuid, at: DateTime<Utc>) -> Result<Self, DomainError> {
    if !matches!(to, ProjectStatus::Ongoing | ProjectStatus::Rejected) {
      return Err(DomainError::ValidationError("Invalid status. Must be ONGOING or REJECTED".to_string()));
    }
    if self.kind != ProjectKind::FacultyAssigned || self.status != ProjectStatus::Pending {
      return Err(DomainError::InvalidTransition(format!("Cannot change project status from {} to {}",
                                                        self.status, to)));
    }
    Ok(self.stamped(to, by, at))
  }

  /// Un proyecto de estudiante sigue la decisión sobre su solicitud.
  pub fn follow_decision(&self, decision: ProjectRequestStatus, by: Uuid, at: DateTime<Utc>) -> Self {
    match (self.kind, decision) {
      (ProjectKind::StudentProposed, ProjectRequestStatus::Approved) => self.stamped(ProjectStatus::Ongoing, by, at),
      (ProjectKind::StudentProposed, ProjectRequestStatus::Rejected) => self.stamped(ProjectStatus::Rejected, by, at),
      _ => self.clone(),
    }
  }

  fn stamped(&self, status: ProjectStatus, by: Uuid, at: DateTime<Utc>) -> Self {
    let mut next = self.clone();
    next.status = status;
    next.modified_by = Some(by);
    next.modified_at = at;
    next
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRequest {
  pub id: Uuid,
  pub project_id: Uuid,
  pub student_id: Uuid,
  pub faculty_id: Uuid,
  pub status: ProjectRequestStatus,
  pub student_notes: Option<String>,
  pub faculty_notes: Option<String>,
  pub request_date: DateTime<Utc>,
  pub accepted_date: Option<DateTime<Utc>>,
  pub rejected_date: Option<DateTime<Utc>>,
}

impl ProjectRequest {
  pub fn new(project_id: Uuid, student_id: Uuid, faculty_id: Uuid, student_notes: Option<String>) -> Self {
    Self { id: Uuid::new_v4(),
           project_id,
           student_id,
           faculty_id,
           status: ProjectRequestStatus::Pending,
           student_notes: student_notes.filter(|n| !n.trim().is_empty()),
           faculty_notes: None,
           request_date: Utc::now(),
           accepted_date: None,
           rejected_date: None }
  }

  /// PENDING -> APPROVED | REJECTED, con la marca de la decisión.
  pub fn decide(&self,
                to: ProjectRequestStatus,
                faculty_notes: Option<String>,
                at: DateTime<Utc>)
                -> Result<Self, DomainError> {
    if to == ProjectRequestStatus::Pending {
      return Err(DomainError::ValidationError("Invalid status".to_string()));
    }
    if self.status != ProjectRequestStatus::Pending {
      return Err(DomainError::InvalidTransition(format!("Project request already {}", self.status)));
    }
    let mut next = self.clone();
    next.status = to;
    next.faculty_notes = faculty_notes.filter(|n| !n.trim().is_empty());
    match to {
      ProjectRequestStatus::Approved => next.accepted_date = Some(at),
      _ => next.rejected_date = Some(at),
    }
    Ok(next)
  }
}
