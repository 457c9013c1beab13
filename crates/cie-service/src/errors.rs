// Archivo: errors.rs
// Propósito: errores de la capa de servicios y su correspondencia con
// códigos HTTP. Los handlers sólo necesitan `status_code` y
// `public_message`.
use cie_domain::DomainError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
  /// No hay identidad o no corresponde a ningún usuario.
  #[error("No autenticado: {0}")]
  Unauthenticated(String),
  /// El rol o la relación del llamador no autoriza la operación.
  #[error("Acceso denegado: {0}")]
  Forbidden(String),
  #[error("No encontrado: {0}")]
  NotFound(String),
  #[error("Solicitud inválida: {0}")]
  BadRequest(String),
  #[error("Conflicto: {0}")]
  Conflict(String),
  /// Errores originados en el dominio o en el repositorio.
  #[error("Error de dominio: {0}")]
  Domain(#[from] DomainError),
  /// Errores del almacenamiento de archivos.
  #[error("Error de almacenamiento: {0}")]
  Storage(String),
}

/// Alias de resultado usado por los servicios.
pub type Result<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
  pub fn unauthorized() -> Self {
    Self::Unauthenticated("Unauthorized".to_string())
  }

  pub fn access_denied() -> Self {
    Self::Forbidden("Access denied".to_string())
  }

  pub fn not_found(what: &str) -> Self {
    Self::NotFound(format!("{} not found", what))
  }

  pub fn bad_request(msg: impl Into<String>) -> Self {
    Self::BadRequest(msg.into())
  }

  pub fn status_code(&self) -> u16 {
    match self {
      Self::Unauthenticated(_) => 401,
      Self::Forbidden(_) => 403,
      Self::NotFound(_) => 404,
      Self::BadRequest(_) => 400,
      Self::Conflict(_) => 409,
      Self::Storage(_) => 500,
      Self::Domain(e) => match e {
        DomainError::ValidationError(_) | DomainError::InvalidTransition(_) | DomainError::Duplicate(_) => 400,
        DomainError::Forbidden(_) => 403,
        DomainError::NotFound(_) => 404,
        DomainError::Conflict(_) => 409,
        DomainError::ExternalError(_) | DomainError::SerializationError(_) => 500,
      },
    }
  }

  /// Mensaje para el cuerpo de la respuesta. Los 5xx no exponen detalles.
  pub fn public_message(&self) -> String {
    if self.status_code() >= 500 {
      return "Internal server error".to_string();
    }
    match self {
      Self::Unauthenticated(m) | Self::Forbidden(m) | Self::NotFound(m) | Self::BadRequest(m) | Self::Conflict(m) => {
        m.clone()
      }
      Self::Domain(e) => e.message().to_string(),
      Self::Storage(m) => m.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn domain_errors_map_to_http_codes() {
    assert_eq!(ServiceError::from(DomainError::InvalidTransition("x".into())).status_code(), 400);
    assert_eq!(ServiceError::from(DomainError::Duplicate("x".into())).status_code(), 400);
    assert_eq!(ServiceError::from(DomainError::Forbidden("x".into())).status_code(), 403);
    assert_eq!(ServiceError::from(DomainError::Conflict("x".into())).status_code(), 409);
    assert_eq!(ServiceError::from(DomainError::ExternalError("db down".into())).status_code(), 500);
  }

  #[test]
  fn internal_details_are_hidden() {
    let e = ServiceError::from(DomainError::ExternalError("db: disk I/O error".into()));
    assert_eq!(e.public_message(), "Internal server error");
    let e = ServiceError::from(DomainError::ValidationError("name is required".into()));
    assert_eq!(e.public_message(), "name is required");
  }
}
