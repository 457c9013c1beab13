// opportunity.rs
use crate::DomainError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OpportunityStatus {
  Open,
  Closed,
}

impl OpportunityStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OpportunityStatus::Open => "OPEN",
      OpportunityStatus::Closed => "CLOSED",
    }
  }
}

impl FromStr for OpportunityStatus {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_uppercase().as_str() {
      "OPEN" => Ok(OpportunityStatus::Open),
      "CLOSED" => Ok(OpportunityStatus::Closed),
      other => Err(DomainError::ValidationError(format!("Invalid opportunity status: {}", other))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApplicationStatus {
  Pending,
  Accepted,
  Rejected,
}

impl ApplicationStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      ApplicationStatus::Pending => "PENDING",
      ApplicationStatus::Accepted => "ACCEPTED",
      ApplicationStatus::Rejected => "REJECTED",
    }
  }
}

impl FromStr for ApplicationStatus {
  type Err = DomainError;

  /// `APPROVED` se acepta como alias de `ACCEPTED`.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_uppercase().as_str() {
      "PENDING" => Ok(ApplicationStatus::Pending),
      "ACCEPTED" | "APPROVED" => Ok(ApplicationStatus::Accepted),
      "REJECTED" => Ok(ApplicationStatus::Rejected),
      other => Err(DomainError::ValidationError(format!("Invalid application status: {}", other))),
    }
  }
}

impl fmt::Display for ApplicationStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
  pub id: Uuid,
  pub title: String,
  pub opportunity_type: String,
  pub description: String,
  pub start_date: NaiveDate,
  pub end_date: NaiveDate,
  pub application_start_date: NaiveDate,
  pub application_end_date: NaiveDate,
  pub remuneration: Option<String>,
  pub capacity: i64,
  pub faculty_id: Uuid,
  pub status: OpportunityStatus,
  /// El docente dueño aceptó la publicación; antes de eso los estudiantes
  /// no la ven.
  pub accepted: bool,
  pub accepted_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Campos editables de una oportunidad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpportunityDraft {
  pub title: String,
  #[serde(rename = "type")]
  pub opportunity_type: String,
  #[serde(default)]
  pub description: String,
  pub start_date: NaiveDate,
  pub end_date: NaiveDate,
  pub application_start_date: NaiveDate,
  pub application_end_date: NaiveDate,
  #[serde(default)]
  pub remuneration: Option<String>,
  pub capacity: i64,
  pub faculty_id: Uuid,
  #[serde(default)]
  pub status: Option<OpportunityStatus>,
}

impl OpportunityDraft {
  pub fn validate(&self) -> Result<(), DomainError> {
    if self.title.trim().is_empty() {
      return Err(DomainError::ValidationError("Title is required".to_string()));
    }
    if self.opportunity_type.trim().is_empty() {
      return Err(DomainError::ValidationError("Type is required".to_string()));
    }
    if self.capacity < 1 {
      return Err(DomainError::ValidationError("Capacity must be at least 1".to_string()));
    }
    if self.end_date < self.start_date {
      return Err(DomainError::ValidationError("End date must not be before start date".to_string()));
    }
    if self.application_end_date < self.application_start_date {
      return Err(DomainError::ValidationError("Application end date must not be before its start date".to_string()));
    }
    Ok(())
  }
}

impl Opportunity {
  pub fn new(draft: OpportunityDraft) -> Result<Self, DomainError> {
    draft.validate()?;
    let now = Utc::now();
    Ok(Self { id: Uuid::new_v4(),
              title: draft.title.trim().to_string(),
              opportunity_type: draft.opportunity_type.trim().to_string(),
              description: draft.description,
              start_date: draft.start_date,
              end_date: draft.end_date,
              application_start_date: draft.application_start_date,
              application_end_date: draft.application_end_date,
              remuneration: draft.remuneration,
              capacity: draft.capacity,
              faculty_id: draft.faculty_id,
              status: draft.status.unwrap_or(OpportunityStatus::Open),
              accepted: false,
              accepted_at: None,
              created_at: now,
              updated_at: now })
  }

  pub fn with_draft(&self, draft: OpportunityDraft) -> Result<Self, DomainError> {
    let status = draft.status.unwrap_or(self.status);
    let mut updated = Self::new(draft)?;
    updated.id = self.id;
    updated.status = status;
    updated.accepted = self.accepted;
    updated.accepted_at = self.accepted_at;
    updated.created_at = self.created_at;
    Ok(updated)
  }

  pub fn is_open(&self) -> bool {
    self.status == OpportunityStatus::Open
  }

  /// Abierta a postulaciones: aceptada por su docente y con estado OPEN.
  pub fn is_published(&self) -> bool {
    self.accepted && self.is_open()
  }

  /// Aceptar dos veces conserva la primera marca.
  pub fn accept(&self, at: DateTime<Utc>) -> Self {
    let mut next = self.clone();
    if !next.accepted {
      next.accepted = true;
      next.accepted_at = Some(at);
      next.updated_at = at;
    }
    next
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpportunityApplication {
  pub id: Uuid,
  pub opportunity_id: Uuid,
  pub student_id: Uuid,
  pub status: ApplicationStatus,
  pub resume_name: String,
  pub resume_key: String,
  pub applied_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl OpportunityApplication {
  pub fn new(opportunity_id: Uuid, student_id: Uuid, resume_name: &str, resume_key: &str) -> Self {
    let now = Utc::now();
    Self { id: Uuid::new_v4(),
           opportunity_id,
           student_id,
           status: ApplicationStatus::Pending,
           resume_name: resume_name.to_string(),
           resume_key: resume_key.to_string(),
           applied_at: now,
           updated_at: now }
  }

  /// Sólo se decide una solicitud pendiente: PENDING -> ACCEPTED | REJECTED.
  pub fn decide(&self, to: ApplicationStatus, at: DateTime<Utc>) -> Result<Self, DomainError> {
    if self.status != ApplicationStatus::Pending || to == ApplicationStatus::Pending {
      return Err(DomainError::InvalidTransition(format!("Cannot change application status from {} to {}",
                                                        self.status, to)));
    }
    let mut next = self.clone();
    next.status = to;
    next.updated_at = at;
    Ok(next)
  }
}

/// Un archivo es un currículum aceptable si declara `application/pdf`.
pub fn is_pdf(content_type: Option<&str>) -> bool {
  matches!(content_type.map(|c| c.trim().to_ascii_lowercase()), Some(c) if c == "application/pdf")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn draft() -> OpportunityDraft {
    let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
    OpportunityDraft { title: "Summer research".into(),
                       opportunity_type: "INTERNSHIP".into(),
                       description: String::new(),
                       start_date: d("2026-06-01"),
                       end_date: d("2026-08-01"),
                       application_start_date: d("2026-03-01"),
                       application_end_date: d("2026-04-01"),
                       remuneration: None,
                       capacity: 2,
                       faculty_id: Uuid::new_v4(),
                       status: None }
  }

  #[test]
  fn new_opportunity_defaults_to_open() {
    let o = Opportunity::new(draft()).unwrap();
    assert!(o.is_open());
  }

  #[test]
  fn acceptance_publishes_and_keeps_first_stamp() {
    let o = Opportunity::new(draft()).unwrap();
    assert!(!o.accepted);
    assert!(!o.is_published());
    let first = Utc::now();
    let accepted = o.accept(first);
    assert!(accepted.is_published());
    assert_eq!(accepted.accepted_at, Some(first));
    let again = accepted.accept(first + chrono::Duration::seconds(5));
    assert_eq!(again.accepted_at, Some(first));

    let edited = accepted.with_draft(draft()).unwrap();
    assert!(edited.accepted);
  }

  #[test]
  fn inverted_dates_are_rejected() {
    let mut d = draft();
    std::mem::swap(&mut d.start_date, &mut d.end_date);
    assert!(Opportunity::new(d).is_err());
  }

  #[test]
  fn application_decisions() {
    let a = OpportunityApplication::new(Uuid::new_v4(), Uuid::new_v4(), "cv.pdf", "resumes/cv.pdf");
    let accepted = a.decide("approved".parse().unwrap(), Utc::now()).unwrap();
    assert_eq!(accepted.status, ApplicationStatus::Accepted);
    assert!(accepted.decide(ApplicationStatus::Rejected, Utc::now()).is_err());
    assert!(a.decide(ApplicationStatus::Pending, Utc::now()).is_err());
    assert!("MAYBE".parse::<ApplicationStatus>().is_err());
  }

  #[test]
  fn pdf_detection() {
    assert!(is_pdf(Some("application/pdf")));
    assert!(is_pdf(Some("Application/PDF")));
    assert!(!is_pdf(Some("image/png")));
    assert!(!is_pdf(None));
  }
}
