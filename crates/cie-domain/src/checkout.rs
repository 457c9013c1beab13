// checkout.rs
//
// Máquina de estados de las solicitudes de préstamo (componentes de
// laboratorio e ítems de biblioteca).
//
//   PENDING -> APPROVED -> COLLECTED -> PENDING_RETURN -> RETURNED
//   PENDING | APPROVED -> REJECTED
//   PENDING -> PENDING_RETURN            (sólo el estudiante dueño)
use crate::inventory::InventoryKind;
use crate::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
  Pending,
  Approved,
  Rejected,
  Collected,
  PendingReturn,
  Returned,
}

impl RequestStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      RequestStatus::Pending => "PENDING",
      RequestStatus::Approved => "APPROVED",
      RequestStatus::Rejected => "REJECTED",
      RequestStatus::Collected => "COLLECTED",
      RequestStatus::PendingReturn => "PENDING_RETURN",
      RequestStatus::Returned => "RETURNED",
    }
  }

  /// Estados que cuentan contra el stock del ítem.
  pub fn is_active(&self) -> bool {
    matches!(self, RequestStatus::Approved | RequestStatus::Collected | RequestStatus::PendingReturn)
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, RequestStatus::Rejected | RequestStatus::Returned)
  }
}

impl FromStr for RequestStatus {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_uppercase().as_str() {
      "PENDING" => Ok(RequestStatus::Pending),
      "APPROVED" => Ok(RequestStatus::Approved),
      "REJECTED" => Ok(RequestStatus::Rejected),
      "COLLECTED" => Ok(RequestStatus::Collected),
      "PENDING_RETURN" => Ok(RequestStatus::PendingReturn),
      "RETURNED" => Ok(RequestStatus::Returned),
      _ => Err(DomainError::ValidationError("Invalid action".to_string())),
    }
  }
}

impl fmt::Display for RequestStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Quién puede recorrer una arista de la máquina de estados.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionAuthority {
  /// El estudiante dueño de la solicitud.
  Owner,
  /// El docente coordinador del dominio del ítem.
  Coordinator,
}

/// Tabla de aristas permitidas. `None` significa que la transición no
/// existe para nadie.
pub fn transition_authority(from: RequestStatus, to: RequestStatus) -> Option<TransitionAuthority> {
  use RequestStatus::*;
  match (from, to) {
    (Pending, PendingReturn) => Some(TransitionAuthority::Owner),
    (Pending, Approved)
    | (Pending, Rejected)
    | (Approved, Rejected)
    | (Approved, Collected)
    | (Collected, PendingReturn)
    | (PendingReturn, Returned) => Some(TransitionAuthority::Coordinator),
    _ => None,
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
  pub id: Uuid,
  pub kind: InventoryKind,
  pub item_id: Uuid,
  pub student_id: Uuid,
  pub status: RequestStatus,
  pub purpose: Option<String>,
  pub notes: Option<String>,
  pub faculty_notes: Option<String>,
  pub approved_by: Option<Uuid>,
  pub approved_at: Option<DateTime<Utc>>,
  pub collected_at: Option<DateTime<Utc>>,
  pub returned_at: Option<DateTime<Utc>>,
  pub requested_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl CheckoutRequest {
  pub fn new(kind: InventoryKind, item_id: Uuid, student_id: Uuid, purpose: Option<String>, notes: Option<String>) -> Self {
    let now = Utc::now();
    Self { id: Uuid::new_v4(),
           kind,
           item_id,
           student_id,
           status: RequestStatus::Pending,
           purpose,
           notes,
           faculty_notes: None,
           approved_by: None,
           approved_at: None,
           collected_at: None,
           returned_at: None,
           requested_at: now,
           updated_at: now }
  }

  /// Aplica una transición validando arista y autoridad. Devuelve una copia
  /// con el nuevo estado y los sellos de tiempo correspondientes.
  ///
  /// - arista inexistente -> `InvalidTransition`
  /// - arista existente pero de otra autoridad -> `Forbidden`
  pub fn transition(&self,
                    to: RequestStatus,
                    authority: TransitionAuthority,
                    actor: Uuid,
                    at: DateTime<Utc>)
                    -> Result<Self, DomainError> {
    let required = transition_authority(self.status, to).ok_or_else(|| {
                     DomainError::InvalidTransition(format!("Cannot change status from {} to {}", self.status, to))
                   })?;
    if required != authority {
      return Err(DomainError::Forbidden("Access denied".to_string()));
    }
    let mut next = self.clone();
    next.status = to;
    next.updated_at = at;
    match to {
      RequestStatus::Approved => {
        next.approved_by = Some(actor);
        next.approved_at = Some(at);
      }
      RequestStatus::Rejected => {
        next.approved_by = Some(actor);
      }
      RequestStatus::Collected => next.collected_at = Some(at),
      RequestStatus::Returned => next.returned_at = Some(at),
      RequestStatus::Pending | RequestStatus::PendingReturn => {}
    }
    Ok(next)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use RequestStatus::*;

  const ALL: [RequestStatus; 6] = [Pending, Approved, Rejected, Collected, PendingReturn, Returned];

  fn request() -> CheckoutRequest {
    CheckoutRequest::new(InventoryKind::LabComponent, Uuid::new_v4(), Uuid::new_v4(), None, None)
  }

  #[test]
  fn only_whitelisted_edges_exist() {
    let allowed = [(Pending, Approved),
                   (Pending, Rejected),
                   (Pending, PendingReturn),
                   (Approved, Rejected),
                   (Approved, Collected),
                   (Collected, PendingReturn),
                   (PendingReturn, Returned)];
    for from in ALL {
      for to in ALL {
        let expected = allowed.contains(&(from, to));
        assert_eq!(transition_authority(from, to).is_some(), expected, "{} -> {}", from, to);
      }
    }
  }

  #[test]
  fn terminal_states_have_no_exits() {
    for to in ALL {
      assert!(transition_authority(Rejected, to).is_none());
      assert!(transition_authority(Returned, to).is_none());
    }
  }

  #[test]
  fn approve_stamps_approver_and_time() {
    let faculty = Uuid::new_v4();
    let now = Utc::now();
    let r = request().transition(Approved, TransitionAuthority::Coordinator, faculty, now).unwrap();
    assert_eq!(r.status, Approved);
    assert_eq!(r.approved_by, Some(faculty));
    assert_eq!(r.approved_at, Some(now));
    let c = r.transition(Collected, TransitionAuthority::Coordinator, faculty, now).unwrap();
    assert_eq!(c.collected_at, Some(now));
  }

  #[test]
  fn pending_to_returned_is_invalid() {
    let err = request().transition(Returned, TransitionAuthority::Coordinator, Uuid::new_v4(), Utc::now())
                       .unwrap_err();
    assert!(matches!(err, DomainError::InvalidTransition(_)));
  }

  #[test]
  fn student_cannot_approve_and_coordinator_cannot_self_return() {
    let r = request();
    let err = r.transition(Approved, TransitionAuthority::Owner, r.student_id, Utc::now()).unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));
    let err = r.transition(PendingReturn, TransitionAuthority::Coordinator, Uuid::new_v4(), Utc::now())
               .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));
    let ok = r.transition(PendingReturn, TransitionAuthority::Owner, r.student_id, Utc::now()).unwrap();
    assert_eq!(ok.status, PendingReturn);
  }

  #[test]
  fn unknown_status_string_is_invalid_action() {
    let err = "CANCELLED".parse::<RequestStatus>().unwrap_err();
    assert_eq!(err.message(), "Invalid action");
    assert_eq!("pending_return".parse::<RequestStatus>().unwrap(), PendingReturn);
  }
}
