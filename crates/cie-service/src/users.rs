use crate::errors::Result;
use crate::gate::Caller;
use cie_domain::{CampusRepository, DomainError, FacultyProfile, Role, StudentProfile, User};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Alta de usuario por un administrador. El perfil se crea según el rol.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
  pub email: String,
  pub name: String,
  pub role: String,
  pub password: String,
  #[serde(default)]
  pub department: Option<String>,
  #[serde(default)]
  pub student_number: Option<String>,
  #[serde(default)]
  pub program: Option<String>,
}

/// Usuario con su perfil de rol.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
  #[serde(flatten)]
  pub user: User,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub faculty: Option<FacultyProfile>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub student: Option<StudentProfile>,
}

pub struct UserService {
  repo: Arc<dyn CampusRepository>,
}

impl UserService {
  pub fn new(repo: Arc<dyn CampusRepository>) -> Self {
    Self { repo }
  }

  pub fn create_user(&self, caller: &Caller, input: NewUser) -> Result<UserProfile> {
    caller.require(&[Role::Admin])?;
    let role: Role = input.role.parse()?;
    let user = User::new(&input.email, &input.name, role, &input.password)?;
    self.repo.insert_user(&user)?;
    let profile = self.create_profile(&user, input.department, input.student_number, input.program)?;
    tracing::info!(user = %user.id, role = %role, "usuario creado");
    Ok(profile)
  }

  fn create_profile(&self,
                    user: &User,
                    department: Option<String>,
                    student_number: Option<String>,
                    program: Option<String>)
                    -> Result<UserProfile> {
    let mut profile = UserProfile { user: user.clone(), faculty: None, student: None };
    match user.role {
      Role::Faculty => {
        let p = FacultyProfile { user_id: user.id, department };
        self.repo.save_faculty_profile(&p)?;
        profile.faculty = Some(p);
      }
      Role::Student => {
        let p = StudentProfile { user_id: user.id, student_number, program };
        self.repo.save_student_profile(&p)?;
        profile.student = Some(p);
      }
      Role::Admin => {}
    }
    Ok(profile)
  }

  pub fn list_users(&self, caller: &Caller, role: Option<&str>) -> Result<Vec<User>> {
    caller.require(&[Role::Admin])?;
    let role = role.map(str::parse::<Role>).transpose()?;
    let users = self.repo.list_users()?;
    Ok(users.into_iter().filter(|u| role.map_or(true, |r| u.role == r)).collect())
  }

  pub fn me(&self, caller: &Caller) -> Result<UserProfile> {
    let faculty = match caller.role() {
      Role::Faculty => self.repo.get_faculty_profile(&caller.id())?,
      _ => None,
    };
    let student = match caller.role() {
      Role::Student => self.repo.get_student_profile(&caller.id())?,
      _ => None,
    };
    Ok(UserProfile { user: caller.user.clone(), faculty, student })
  }

  /// Crea el administrador inicial si no existe un usuario con ese email.
  /// Devuelve `true` si lo creó.
  pub fn bootstrap_admin(&self, email: &str, password: &str) -> Result<bool> {
    if self.repo.find_user_by_email(email)?.is_some() {
      return Ok(false);
    }
    let admin = User::new(email, "Administrator", Role::Admin, password)?;
    match self.repo.insert_user(&admin) {
      Ok(()) => {
        tracing::info!(email = %admin.email, "administrador inicial creado");
        Ok(true)
      }
      // otro proceso lo creó entre la consulta y la inserción
      Err(DomainError::Duplicate(_)) => Ok(false),
      Err(e) => Err(e.into()),
    }
  }
}
