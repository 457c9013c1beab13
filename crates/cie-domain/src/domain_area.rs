// domain_area.rs
//
// Dominios administrativos (Library, Electronics, ...) y la asignación de
// docentes coordinadores que aprueban las solicitudes de cada dominio.
use crate::DomainError;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Nombres canónicos conocidos, indexados por su clave normalizada.
static CANONICAL_DOMAINS: Lazy<Vec<(String, &'static str)>> = Lazy::new(|| {
  ["Library", "Electronics", "Lab"].iter().map(|name| (normalize_domain_name(name), *name)).collect()
});

/// Clave de comparación: minúsculas y sin espacios ("Electronics Lab" ->
/// "electronicslab").
pub fn normalize_domain_name(name: &str) -> String {
  name.chars().filter(|c| !c.is_whitespace()).flat_map(|c| c.to_lowercase()).collect()
}

/// Nombre canónico para `name` si coincide (sin distinguir mayúsculas) con un
/// dominio conocido.
pub fn canonical_domain_name(name: &str) -> Option<&'static str> {
  let key = normalize_domain_name(name);
  CANONICAL_DOMAINS.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
  pub id: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl Domain {
  /// Crea un dominio; si el nombre corresponde a uno canónico se usa la
  /// grafía canónica.
  pub fn new(name: &str, description: Option<String>) -> Result<Self, DomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
      return Err(DomainError::ValidationError("Domain name is required".to_string()));
    }
    let name = canonical_domain_name(trimmed).map(str::to_string).unwrap_or_else(|| trimmed.to_string());
    Ok(Self { id: Uuid::new_v4(), name, description, created_at: Utc::now() })
  }

  pub fn matches_name(&self, name: &str) -> bool {
    normalize_domain_name(&self.name) == normalize_domain_name(name)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainCoordinator {
  pub id: Uuid,
  pub domain_id: Uuid,
  pub faculty_id: Uuid,
  pub assigned_by: Uuid,
  pub assigned_at: DateTime<Utc>,
}

impl DomainCoordinator {
  pub fn new(domain_id: Uuid, faculty_id: Uuid, assigned_by: Uuid) -> Self {
    Self { id: Uuid::new_v4(), domain_id, faculty_id, assigned_by, assigned_at: Utc::now() }
  }
}
