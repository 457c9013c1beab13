// ticket.rs
use crate::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Tipo de ticket de revisión.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TicketKind {
  Feedback,
  Insight,
}

impl TicketKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      TicketKind::Feedback => "FEEDBACK",
      TicketKind::Insight => "INSIGHT",
    }
  }

  pub fn from_path(segment: &str) -> Option<Self> {
    match segment {
      "feedback" | "feedbacks" => Some(TicketKind::Feedback),
      "insights" | "insight" => Some(TicketKind::Insight),
      _ => None,
    }
  }
}

impl FromStr for TicketKind {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "FEEDBACK" => Ok(TicketKind::Feedback),
      "INSIGHT" => Ok(TicketKind::Insight),
      other => Err(DomainError::SerializationError(format!("ticket kind desconocido: {}", other))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
  Pending,
  Approved,
  InProgress,
  Done,
  Rejected,
  Completed,
}

impl TicketStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      TicketStatus::Pending => "PENDING",
      TicketStatus::Approved => "APPROVED",
      TicketStatus::InProgress => "IN_PROGRESS",
      TicketStatus::Done => "DONE",
      TicketStatus::Rejected => "REJECTED",
      TicketStatus::Completed => "COMPLETED",
    }
  }
}

impl FromStr for TicketStatus {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "PENDING" => Ok(TicketStatus::Pending),
      "APPROVED" => Ok(TicketStatus::Approved),
      "IN_PROGRESS" => Ok(TicketStatus::InProgress),
      "DONE" => Ok(TicketStatus::Done),
      "REJECTED" => Ok(TicketStatus::Rejected),
      "COMPLETED" => Ok(TicketStatus::Completed),
      other => Err(DomainError::SerializationError(format!("ticket status desconocido: {}", other))),
    }
  }
}

impl fmt::Display for TicketStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Comando sobre un ticket. Cada variante tiene su propio handler en
/// `ReviewTicket::apply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketAction {
  Approve,
  Reject { reason: Option<String> },
  Start,
  Done { rectified_image: Option<String> },
  Complete,
}

impl TicketAction {
  /// Construye la acción a partir del string recibido por la API
  /// (`approve`, `reject`, `start`, `done`, `complete`).
  pub fn parse(action: &str, reason: Option<String>, rectified_image: Option<String>) -> Result<Self, DomainError> {
    match action.trim().to_ascii_lowercase().as_str() {
      "approve" => Ok(TicketAction::Approve),
      "reject" => Ok(TicketAction::Reject { reason }),
      "start" => Ok(TicketAction::Start),
      "done" => Ok(TicketAction::Done { rectified_image }),
      "complete" => Ok(TicketAction::Complete),
      _ => Err(DomainError::ValidationError("Invalid action".to_string())),
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      TicketAction::Approve => "approve",
      TicketAction::Reject { .. } => "reject",
      TicketAction::Start => "start",
      TicketAction::Done { .. } => "done",
      TicketAction::Complete => "complete",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewTicket {
  pub id: Uuid,
  pub kind: TicketKind,
  pub title: String,
  pub description: String,
  pub category: Option<String>,
  pub image: Option<String>,
  pub created_by: Uuid,
  pub status: TicketStatus,
  pub approved_by: Option<Uuid>,
  pub approved_at: Option<DateTime<Utc>>,
  pub completed_at: Option<DateTime<Utc>>,
  pub rejection_reason: Option<String>,
  pub rectified_image: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl ReviewTicket {
  pub fn new(kind: TicketKind,
             title: &str,
             description: &str,
             category: Option<String>,
             image: Option<String>,
             created_by: Uuid)
             -> Result<Self, DomainError> {
    if title.trim().is_empty() {
      return Err(DomainError::ValidationError("Title is required".to_string()));
    }
    if description.trim().is_empty() {
      return Err(DomainError::ValidationError("Description is required".to_string()));
    }
    let now = Utc::now();
    Ok(Self { id: Uuid::new_v4(),
              kind,
              title: title.trim().to_string(),
              description: description.trim().to_string(),
              category,
              image,
              created_by,
              status: TicketStatus::Pending,
              approved_by: None,
              approved_at: None,
              completed_at: None,
              rejection_reason: None,
              rectified_image: None,
              created_at: now,
              updated_at: now })
  }

  pub fn apply(&self, action: TicketAction, actor: Uuid, at: DateTime<Utc>) -> Result<Self, DomainError> {
    let mut next = match action {
      TicketAction::Approve => self.approve(actor, at)?,
      TicketAction::Reject { reason } => self.reject(reason, actor, at)?,
      TicketAction::Start => self.start()?,
      TicketAction::Done { rectified_image } => self.done(rectified_image, at)?,
      TicketAction::Complete => self.complete()?,
    };
    next.updated_at = at;
    Ok(next)
  }

  fn approve(&self, actor: Uuid, at: DateTime<Utc>) -> Result<Self, DomainError> {
    self.require(&[TicketStatus::Pending], "approve")?;
    let mut next = self.clone();
    next.status = TicketStatus::Approved;
    next.approved_by = Some(actor);
    next.approved_at = Some(at);
    Ok(next)
  }

  /// Rechazo desde PENDING (revisión inicial) o desde DONE (rechazo final).
  /// Sólo el rechazo final exige motivo.
  fn reject(&self, reason: Option<String>, actor: Uuid, at: DateTime<Utc>) -> Result<Self, DomainError> {
    self.require(&[TicketStatus::Pending, TicketStatus::Done], "reject")?;
    let reason = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
    if self.status == TicketStatus::Done && reason.is_none() {
      return Err(DomainError::ValidationError("Rejection reason is required.".to_string()));
    }
    let mut next = self.clone();
    next.status = TicketStatus::Rejected;
    next.approved_by = Some(actor);
    next.approved_at = Some(at);
    if reason.is_some() {
      next.rejection_reason = reason;
    }
    Ok(next)
  }

  fn start(&self) -> Result<Self, DomainError> {
    self.require(&[TicketStatus::Approved], "start")?;
    let mut next = self.clone();
    next.status = TicketStatus::InProgress;
    Ok(next)
  }

  fn done(&self, rectified_image: Option<String>, at: DateTime<Utc>) -> Result<Self, DomainError> {
    self.require(&[TicketStatus::InProgress], "done")?;
    let mut next = self.clone();
    next.status = TicketStatus::Done;
    next.completed_at = Some(at);
    if rectified_image.is_some() {
      next.rectified_image = rectified_image;
    }
    Ok(next)
  }

  fn complete(&self) -> Result<Self, DomainError> {
    self.require(&[TicketStatus::Done], "complete")?;
    let mut next = self.clone();
    next.status = TicketStatus::Completed;
    Ok(next)
  }

  fn require(&self, from: &[TicketStatus], action: &str) -> Result<(), DomainError> {
    if from.contains(&self.status) {
      Ok(())
    } else {
      Err(DomainError::InvalidTransition(format!("Cannot {} a ticket in status {}", action, self.status)))
    }
  }
}
