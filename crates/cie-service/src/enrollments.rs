use crate::errors::{Result, ServiceError};
use crate::gate::Caller;
use cie_domain::{CampusRepository, Course, Enrollment, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
  pub code: String,
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  /// Obligatorio cuando crea un administrador; un docente crea cursos propios.
  #[serde(default)]
  pub faculty_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEnrollment {
  pub course_id: Uuid,
  #[serde(default)]
  pub section: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentView {
  #[serde(flatten)]
  pub enrollment: Enrollment,
  pub course_code: String,
  pub course_name: String,
  pub student_name: String,
}

pub struct EnrollmentService {
  repo: Arc<dyn CampusRepository>,
}

impl EnrollmentService {
  pub fn new(repo: Arc<dyn CampusRepository>) -> Self {
    Self { repo }
  }

  pub fn create_course(&self, caller: &Caller, input: NewCourse) -> Result<Course> {
    caller.require(&[Role::Admin, Role::Faculty])?;
    let faculty_id = match caller.role() {
      Role::Faculty => caller.id(),
      _ => {
        let id = input.faculty_id.ok_or_else(|| ServiceError::bad_request("Faculty ID is required"))?;
        match self.repo.get_user(&id)? {
          Some(u) if u.role == Role::Faculty => id,
          _ => return Err(ServiceError::bad_request("User is not a faculty member")),
        }
      }
    };
    let course = Course::new(&input.code, &input.name, input.description, faculty_id)?;
    self.repo.save_course(&course)?;
    tracing::info!(course = %course.code, faculty = %faculty_id, "curso creado");
    Ok(course)
  }

  pub fn list_courses(&self) -> Result<Vec<Course>> {
    Ok(self.repo.list_courses()?)
  }

  pub fn enroll(&self, caller: &Caller, input: NewEnrollment) -> Result<EnrollmentView> {
    caller.require(&[Role::Student])?;
    let course = self.repo.get_course(&input.course_id)?.ok_or_else(|| ServiceError::not_found("Course"))?;
    let enrollment = Enrollment::new(course.id, caller.id(), &input.section)?;
    self.repo.insert_enrollment(&enrollment)?;
    tracing::info!(course = %course.code, student = %caller.id(), "inscripción registrada");
    Ok(EnrollmentView { enrollment,
                        course_code: course.code,
                        course_name: course.name,
                        student_name: caller.user.name.clone() })
  }

  /// Estudiante: las propias. Docente: las de sus cursos. Administrador: todas.
  pub fn list_enrollments(&self, caller: &Caller) -> Result<Vec<EnrollmentView>> {
    let enrollments = match caller.role() {
      Role::Student => self.repo.list_enrollments(None, Some(caller.id()))?,
      Role::Faculty => {
        let own: HashSet<Uuid> =
          self.repo.list_courses()?.into_iter().filter(|c| c.faculty_id == caller.id()).map(|c| c.id).collect();
        self.repo.list_enrollments(None, None)?.into_iter().filter(|e| own.contains(&e.course_id)).collect()
      }
      Role::Admin => self.repo.list_enrollments(None, None)?,
    };
    enrollments.into_iter().map(|e| self.view(e)).collect()
  }

  /// Sólo el docente dueño del curso califica.
  pub fn grade(&self, caller: &Caller, id: Uuid, grade: Option<&str>) -> Result<EnrollmentView> {
    let enrollment = self.repo.get_enrollment(&id)?.ok_or_else(|| ServiceError::not_found("Enrollment"))?;
    let course = self.repo.get_course(&enrollment.course_id)?.ok_or_else(|| ServiceError::not_found("Course"))?;
    if !caller.is(Role::Faculty) || course.faculty_id != caller.id() {
      return Err(ServiceError::access_denied());
    }
    let graded = enrollment.with_grade(grade.unwrap_or_default())?;
    self.repo.update_enrollment(&graded)?;
    self.view(graded)
  }

  fn view(&self, enrollment: Enrollment) -> Result<EnrollmentView> {
    let (course_code, course_name) = match self.repo.get_course(&enrollment.course_id)? {
      Some(c) => (c.code, c.name),
      None => (String::new(), String::new()),
    };
    let student_name = self.repo.get_user(&enrollment.student_id)?.map(|u| u.name).unwrap_or_default();
    Ok(EnrollmentView { enrollment, course_code, course_name, student_name })
  }
}
