// errors.rs
use thiserror::Error;

/// Errores del dominio del portal.
///
/// Los mensajes internos (el `String` de cada variante) son los que se
/// devuelven al cliente; el prefijo en español sólo aparece en los logs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
  #[error("Error de validación: {0}")]
  ValidationError(String),
  /// Transición de estado no permitida por la máquina de estados.
  #[error("Transición inválida: {0}")]
  InvalidTransition(String),
  /// El actor no tiene autoridad sobre la operación.
  #[error("Acceso denegado: {0}")]
  Forbidden(String),
  #[error("No encontrado: {0}")]
  NotFound(String),
  /// Registro duplicado (por ejemplo un par dominio/coordinador repetido).
  #[error("Duplicado: {0}")]
  Duplicate(String),
  /// Conflicto con el estado actual (capacidad agotada, registros en uso).
  #[error("Conflicto: {0}")]
  Conflict(String),
  #[error("Error externo: {0}")]
  ExternalError(String),
  #[error("Error de serialización: {0}")]
  SerializationError(String),
}

impl DomainError {
  /// Mensaje sin prefijo, apto para el cuerpo de una respuesta.
  pub fn message(&self) -> &str {
    match self {
      Self::ValidationError(m)
      | Self::InvalidTransition(m)
      | Self::Forbidden(m)
      | Self::NotFound(m)
      | Self::Duplicate(m)
      | Self::Conflict(m)
      | Self::ExternalError(m)
      | Self::SerializationError(m) => m,
    }
  }
}

impl From<serde_json::Error> for DomainError {
  fn from(e: serde_json::Error) -> Self {
    Self::SerializationError(e.to_string())
  }
}

impl From<uuid::Error> for DomainError {
  fn from(e: uuid::Error) -> Self {
    Self::SerializationError(format!("uuid inválido: {}", e))
  }
}
