// Archivo: coordinators.rs
// Propósito: dominios administrativos y asignación de docentes
// coordinadores, que son quienes aprueban las solicitudes de préstamo de
// los ítems de su dominio.
use crate::errors::{Result, ServiceError};
use crate::gate::Caller;
use cie_domain::{canonical_domain_name, CampusRepository, Domain, DomainCoordinator, DomainScope, InventoryKind,
                 Role, User};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct AssignCoordinator {
  pub faculty_id: Uuid,
  #[serde(default)]
  pub domain_id: Option<Uuid>,
  #[serde(default)]
  pub domain_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDomain {
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
}

/// Asignación con los datos del dominio y del docente.
#[derive(Debug, Clone, Serialize)]
pub struct CoordinatorAssignment {
  #[serde(flatten)]
  pub assignment: DomainCoordinator,
  pub domain_name: String,
  pub faculty_name: String,
  pub faculty_email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DomainSummary {
  #[serde(flatten)]
  pub domain: Domain,
  pub coordinators: Vec<CoordinatorAssignment>,
  pub item_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoordinatorCheck {
  pub is_coordinator: bool,
  pub domains: Vec<Domain>,
}

/// Alcance de un docente sobre las solicitudes: sus dominios coordinados y,
/// para ítems sin dominio, cualquier docente.
pub fn faculty_scope(repo: &dyn CampusRepository, faculty_id: Uuid) -> Result<DomainScope> {
  let domain_ids = repo.list_coordinators(None, Some(faculty_id))?.into_iter().map(|c| c.domain_id).collect();
  Ok(DomainScope { domain_ids, include_unassigned: true })
}

/// ¿Puede `caller` actuar como coordinador sobre un ítem del dominio dado?
pub fn is_coordinator_for(repo: &dyn CampusRepository, caller: &Caller, domain_id: Option<Uuid>) -> Result<bool> {
  if !caller.is(Role::Faculty) {
    return Ok(false);
  }
  match domain_id {
    Some(d) => Ok(!repo.list_coordinators(Some(d), Some(caller.id()))?.is_empty()),
    None => Ok(true),
  }
}

/// Busca un dominio por nombre: primero contra los nombres canónicos, luego
/// contra los existentes sin distinguir mayúsculas; si no hay, lo crea.
pub fn find_or_create_domain(repo: &dyn CampusRepository, name: &str, description: Option<String>) -> Result<Domain> {
  let wanted = canonical_domain_name(name).unwrap_or(name);
  if let Some(existing) = repo.list_domains()?.into_iter().find(|d| d.matches_name(wanted)) {
    return Ok(existing);
  }
  let domain = Domain::new(wanted, description)?;
  repo.save_domain(&domain)?;
  tracing::info!(domain = %domain.name, "dominio creado");
  Ok(domain)
}

pub struct CoordinatorService {
  repo: Arc<dyn CampusRepository>,
}

impl CoordinatorService {
  pub fn new(repo: Arc<dyn CampusRepository>) -> Self {
    Self { repo }
  }

  pub fn assign(&self, caller: &Caller, input: AssignCoordinator) -> Result<CoordinatorAssignment> {
    caller.require(&[Role::Admin])?;
    let faculty = self.repo.get_user(&input.faculty_id)?.ok_or_else(|| ServiceError::not_found("Faculty"))?;
    if faculty.role != Role::Faculty {
      return Err(ServiceError::bad_request("User is not a faculty member"));
    }
    let domain = match (input.domain_id, input.domain_name.as_deref()) {
      (Some(id), _) => self.repo.get_domain(&id)?.ok_or_else(|| ServiceError::not_found("Domain"))?,
      (None, Some(name)) if !name.trim().is_empty() => find_or_create_domain(self.repo.as_ref(), name, None)?,
      _ => return Err(ServiceError::bad_request("Faculty ID and domain are required")),
    };
    let assignment = DomainCoordinator::new(domain.id, faculty.id, caller.id());
    self.repo.insert_coordinator(&assignment)?;
    tracing::info!(domain = %domain.name, faculty = %faculty.id, "coordinador asignado");
    Ok(CoordinatorAssignment { assignment,
                               domain_name: domain.name,
                               faculty_name: faculty.name,
                               faculty_email: faculty.email })
  }

  pub fn list_assignments(&self, caller: &Caller) -> Result<Vec<CoordinatorAssignment>> {
    caller.require(&[Role::Admin])?;
    self.describe(self.repo.list_coordinators(None, None)?)
  }

  pub fn remove_assignment(&self, caller: &Caller, id: Uuid) -> Result<()> {
    caller.require(&[Role::Admin])?;
    if !self.repo.delete_coordinator(&id)? {
      return Err(ServiceError::not_found("Assignment"));
    }
    Ok(())
  }

  /// Dominios que coordina el llamador.
  pub fn check(&self, caller: &Caller) -> Result<CoordinatorCheck> {
    let mut domains = Vec::new();
    if caller.is(Role::Faculty) {
      for c in self.repo.list_coordinators(None, Some(caller.id()))? {
        if let Some(d) = self.repo.get_domain(&c.domain_id)? {
          domains.push(d);
        }
      }
    }
    Ok(CoordinatorCheck { is_coordinator: !domains.is_empty(), domains })
  }

  pub fn list_domains(&self) -> Result<Vec<DomainSummary>> {
    let mut items = self.repo.list_items(InventoryKind::LabComponent)?;
    items.extend(self.repo.list_items(InventoryKind::LibraryItem)?);
    let mut out = Vec::new();
    for domain in self.repo.list_domains()? {
      let coordinators = self.describe(self.repo.list_coordinators(Some(domain.id), None)?)?;
      let item_count = items.iter().filter(|i| i.domain_id == Some(domain.id)).count();
      out.push(DomainSummary { domain, coordinators, item_count });
    }
    Ok(out)
  }

  pub fn create_domain(&self, caller: &Caller, input: NewDomain) -> Result<Domain> {
    caller.require(&[Role::Admin])?;
    if input.name.trim().is_empty() {
      return Err(ServiceError::bad_request("Domain name is required"));
    }
    find_or_create_domain(self.repo.as_ref(), &input.name, input.description)
  }

  /// 409 mientras algún ítem del inventario apunte al dominio.
  pub fn delete_domain(&self, caller: &Caller, id: Uuid) -> Result<()> {
    caller.require(&[Role::Admin])?;
    let domain = self.repo.get_domain(&id)?.ok_or_else(|| ServiceError::not_found("Domain"))?;
    for kind in [InventoryKind::LabComponent, InventoryKind::LibraryItem] {
      if self.repo.list_items(kind)?.iter().any(|i| i.domain_id == Some(id)) {
        return Err(ServiceError::Conflict(format!("Domain {} is still used by inventory items", domain.name)));
      }
    }
    self.repo.delete_domain(&id)?;
    Ok(())
  }

  fn describe(&self, assignments: Vec<DomainCoordinator>) -> Result<Vec<CoordinatorAssignment>> {
    let mut out = Vec::with_capacity(assignments.len());
    for assignment in assignments {
      let domain_name = self.repo.get_domain(&assignment.domain_id)?.map(|d| d.name).unwrap_or_default();
      let (faculty_name, faculty_email) = match self.repo.get_user(&assignment.faculty_id)? {
        Some(User { name, email, .. }) => (name, email),
        None => (String::new(), String::new()),
      };
      out.push(CoordinatorAssignment { assignment, domain_name, faculty_name, faculty_email });
    }
    Ok(out)
  }
}
