// Archivo: gate.rs
// Propósito: resolver la identidad del llamador a un `User` y validar su
// rol contra la lista permitida de cada operación.
use crate::errors::{Result, ServiceError};
use cie_domain::{CampusRepository, Role, User};
use std::sync::Arc;
use uuid::Uuid;

/// Usuario autenticado que invoca una operación.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
  pub user: User,
}

impl Caller {
  pub fn id(&self) -> Uuid {
    self.user.id
  }

  pub fn role(&self) -> Role {
    self.user.role
  }

  pub fn is(&self, role: Role) -> bool {
    self.user.role == role
  }

  /// 403 si el rol no está en `allowed`.
  pub fn require(&self, allowed: &[Role]) -> Result<()> {
    if allowed.contains(&self.user.role) {
      Ok(())
    } else {
      tracing::debug!(user = %self.user.id, role = %self.user.role, "rol no permitido");
      Err(ServiceError::access_denied())
    }
  }
}

#[derive(Clone)]
pub struct RoleGate {
  repo: Arc<dyn CampusRepository>,
}

impl RoleGate {
  pub fn new(repo: Arc<dyn CampusRepository>) -> Self {
    Self { repo }
  }

  /// Resuelve la identidad (valor del header `x-user-id` o de la cookie de
  /// sesión). Ausente, mal formada o sin usuario -> 401.
  pub fn resolve(&self, identity: Option<&str>) -> Result<Caller> {
    let raw = identity.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(ServiceError::unauthorized)?;
    let id = Uuid::parse_str(raw).map_err(|_| ServiceError::unauthorized())?;
    let user = self.repo.get_user(&id)?.ok_or_else(ServiceError::unauthorized)?;
    Ok(Caller { user })
  }

  /// `resolve` + comprobación de rol.
  pub fn require(&self, identity: Option<&str>, allowed: &[Role]) -> Result<Caller> {
    let caller = self.resolve(identity)?;
    caller.require(allowed)?;
    Ok(caller)
  }
}
