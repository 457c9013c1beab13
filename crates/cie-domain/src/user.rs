// user.rs
use crate::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Rol canónico de un usuario. Se serializa siempre en mayúsculas; al
/// parsear se acepta cualquier capitalización (`"faculty"`, `"Faculty"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
  Admin,
  Faculty,
  Student,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::Admin => "ADMIN",
      Role::Faculty => "FACULTY",
      Role::Student => "STUDENT",
    }
  }
}

impl FromStr for Role {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_uppercase().as_str() {
      "ADMIN" => Ok(Role::Admin),
      "FACULTY" => Ok(Role::Faculty),
      "STUDENT" => Ok(Role::Student),
      other => Err(DomainError::ValidationError(format!("Unknown role: {}", other))),
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id: Uuid,
  pub email: String,
  pub name: String,
  pub role: Role,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub created_at: DateTime<Utc>,
}

impl User {
  pub fn new(email: &str, name: &str, role: Role, password: &str) -> Result<Self, DomainError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
      return Err(DomainError::ValidationError("A valid email is required".to_string()));
    }
    if name.trim().is_empty() {
      return Err(DomainError::ValidationError("Name is required".to_string()));
    }
    if password.len() < 6 {
      return Err(DomainError::ValidationError("Password must have at least 6 characters".to_string()));
    }
    Ok(Self { id: Uuid::new_v4(),
              email,
              name: name.trim().to_string(),
              role,
              password_hash: hash_password(password)?,
              created_at: Utc::now() })
  }

  pub fn verify_password(&self, password: &str) -> bool {
    verify_password(&self.password_hash, password)
  }
}

/// Perfil de docente; la clave es el `user_id` del usuario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyProfile {
  pub user_id: Uuid,
  pub department: Option<String>,
}

/// Perfil de estudiante; la clave es el `user_id` del usuario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
  pub user_id: Uuid,
  pub student_number: Option<String>,
  pub program: Option<String>,
}

/// Costo bcrypt de los hashes nuevos.
pub const PASSWORD_COST: u32 = 12;

/// Hash bcrypt (`$2b$...`), con la sal incluida en el propio hash.
pub fn hash_password(password: &str) -> Result<String, DomainError> {
  bcrypt::hash(password, PASSWORD_COST).map_err(|e| DomainError::ExternalError(format!("bcrypt: {}", e)))
}

/// Un hash ilegible cuenta como contraseña incorrecta.
pub fn verify_password(stored: &str, password: &str) -> bool {
  bcrypt::verify(password, stored).unwrap_or(false)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn role_parsing_is_case_insensitive() {
    assert_eq!("faculty".parse::<Role>().unwrap(), Role::Faculty);
    assert_eq!("FACULTY".parse::<Role>().unwrap(), Role::Faculty);
    assert_eq!(" Student ".parse::<Role>().unwrap(), Role::Student);
    assert!("teacher".parse::<Role>().is_err());
  }

  #[test]
  fn password_hash_roundtrip() {
    let u = User::new("Ana@Uni.edu", "Ana", Role::Student, "secret1").unwrap();
    assert_eq!(u.email, "ana@uni.edu");
    assert!(u.verify_password("secret1"));
    assert!(!u.verify_password("secret2"));
    assert!(u.password_hash.starts_with("$2b$12$"));
    // la sal cambia entre hashes del mismo password
    assert_ne!(hash_password("secret1").unwrap(), hash_password("secret1").unwrap());
  }

  #[test]
  fn malformed_hash_never_verifies() {
    assert!(!verify_password("sha256$salt$abc", "secret1"));
    assert!(!verify_password("", ""));
  }

  #[test]
  fn serialized_user_hides_password_hash() {
    let u = User::new("a@b.c", "A", Role::Admin, "123456").unwrap();
    let v = serde_json::to_value(&u).unwrap();
    assert!(v.get("password_hash").is_none());
    assert_eq!(v["role"], "ADMIN");
  }
}
