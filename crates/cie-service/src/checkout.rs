// Archivo: checkout.rs
// Propósito: solicitudes de préstamo de componentes de laboratorio y de
// ítems de biblioteca. El estudiante dueño sólo puede pedir la devolución;
// el resto de las transiciones las hace el coordinador del dominio del ítem.
use crate::coordinators::{faculty_scope, is_coordinator_for};
use crate::errors::{Result, ServiceError};
use crate::gate::Caller;
use chrono::Utc;
use cie_domain::{available_quantity, CampusRepository, CheckoutRequest, InventoryItem, InventoryKind, RequestFilter,
                 RequestStatus, Role, TransitionAuthority};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct NewCheckout {
  pub item_id: Uuid,
  #[serde(default)]
  pub purpose: Option<String>,
  #[serde(default)]
  pub notes: Option<String>,
}

/// Solicitud con los nombres del ítem y del estudiante.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutView {
  #[serde(flatten)]
  pub request: CheckoutRequest,
  pub item_name: String,
  pub student_name: String,
}

pub struct CheckoutService {
  repo: Arc<dyn CampusRepository>,
}

impl CheckoutService {
  pub fn new(repo: Arc<dyn CampusRepository>) -> Self {
    Self { repo }
  }

  fn item(&self, kind: InventoryKind, id: &Uuid) -> Result<InventoryItem> {
    self.repo
        .get_item(id)?
        .filter(|i| i.kind == kind)
        .ok_or_else(|| ServiceError::not_found("Item"))
  }

  fn view(&self, request: CheckoutRequest) -> Result<CheckoutView> {
    let item_name = self.repo.get_item(&request.item_id)?.map(|i| i.name).unwrap_or_default();
    let student_name = self.repo.get_user(&request.student_id)?.map(|u| u.name).unwrap_or_default();
    Ok(CheckoutView { request, item_name, student_name })
  }

  /// Nueva solicitud PENDING por una unidad del ítem.
  pub fn create(&self, caller: &Caller, kind: InventoryKind, input: NewCheckout) -> Result<CheckoutView> {
    caller.require(&[Role::Student])?;
    let item = self.item(kind, &input.item_id)?;
    if let Some(domain_id) = item.domain_id {
      if self.repo.list_coordinators(Some(domain_id), None)?.is_empty() {
        return Err(ServiceError::bad_request("No coordinator available for this item's domain"));
      }
    }
    let active = self.repo.count_active_requests(&item.id)?;
    if available_quantity(item.total_quantity, active) < 1 {
      return Err(ServiceError::bad_request("Item is not available"));
    }
    let request = CheckoutRequest::new(kind, item.id, caller.id(), input.purpose, input.notes);
    self.repo.save_request(&request)?;
    tracing::info!(request = %request.id, item = %item.id, student = %caller.id(), "solicitud creada");
    Ok(CheckoutView { request, item_name: item.name, student_name: caller.user.name.clone() })
  }

  /// Estudiante: las propias. Docente: las de sus dominios y las de ítems
  /// sin dominio. Administrador: todas.
  pub fn list(&self, caller: &Caller, kind: InventoryKind, status: Option<&str>) -> Result<Vec<CheckoutView>> {
    let mut filter = RequestFilter::kind(kind);
    filter.status = status.map(|s| s.parse::<RequestStatus>().map_err(|_| ServiceError::bad_request("Invalid status")))
                          .transpose()?;
    match caller.role() {
      Role::Student => filter.student_id = Some(caller.id()),
      Role::Faculty => filter.scope = Some(faculty_scope(self.repo.as_ref(), caller.id())?),
      Role::Admin => {}
    }
    self.repo.list_requests(&filter)?.into_iter().map(|r| self.view(r)).collect()
  }

  pub fn get(&self, caller: &Caller, kind: InventoryKind, id: Uuid) -> Result<CheckoutView> {
    let request = self.find(kind, id)?;
    let allowed = match caller.role() {
      Role::Admin => true,
      Role::Student => request.student_id == caller.id(),
      Role::Faculty => {
        let item = self.repo.get_item(&request.item_id)?;
        is_coordinator_for(self.repo.as_ref(), caller, item.and_then(|i| i.domain_id))?
      }
    };
    if !allowed {
      return Err(ServiceError::access_denied());
    }
    self.view(request)
  }

  fn find(&self, kind: InventoryKind, id: Uuid) -> Result<CheckoutRequest> {
    self.repo
        .get_request(&id)?
        .filter(|r| r.kind == kind)
        .ok_or_else(|| ServiceError::not_found("Request"))
  }

  /// Cambia el estado. Orden de validación: existencia (404), capacidad del
  /// llamador (403), estado destino (400), arista (400), autoridad (403).
  pub fn update_status(&self,
                       caller: &Caller,
                       kind: InventoryKind,
                       id: Uuid,
                       status: &str,
                       faculty_notes: Option<String>)
                       -> Result<CheckoutView> {
    let request = self.find(kind, id)?;
    let authority = match caller.role() {
      Role::Student if request.student_id == caller.id() => TransitionAuthority::Owner,
      Role::Faculty => {
        let item = self.repo.get_item(&request.item_id)?;
        if !is_coordinator_for(self.repo.as_ref(), caller, item.and_then(|i| i.domain_id))? {
          return Err(ServiceError::access_denied());
        }
        TransitionAuthority::Coordinator
      }
      _ => return Err(ServiceError::access_denied()),
    };
    let to: RequestStatus = status.parse()?;
    let mut next = request.transition(to, authority, caller.id(), Utc::now())?;
    if authority == TransitionAuthority::Coordinator {
      if let Some(notes) = faculty_notes.filter(|n| !n.trim().is_empty()) {
        next.faculty_notes = Some(notes);
      }
    }
    self.repo.save_request(&next)?;
    tracing::info!(request = %next.id, from = %request.status, to = %next.status, actor = %caller.id(),
                   "estado de solicitud actualizado");
    self.view(next)
  }
}
