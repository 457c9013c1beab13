// enrollment.rs
use crate::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
  pub id: Uuid,
  pub code: String,
  pub name: String,
  pub description: Option<String>,
  pub faculty_id: Uuid,
  pub created_at: DateTime<Utc>,
}

impl Course {
  pub fn new(code: &str, name: &str, description: Option<String>, faculty_id: Uuid) -> Result<Self, DomainError> {
    if code.trim().is_empty() || name.trim().is_empty() {
      return Err(DomainError::ValidationError("Course code and name are required".to_string()));
    }
    Ok(Self { id: Uuid::new_v4(),
              code: code.trim().to_uppercase(),
              name: name.trim().to_string(),
              description,
              faculty_id,
              created_at: Utc::now() })
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
  pub id: Uuid,
  pub course_id: Uuid,
  pub student_id: Uuid,
  pub section: String,
  pub grade: Option<String>,
  pub enrolled_at: DateTime<Utc>,
}

impl Enrollment {
  pub fn new(course_id: Uuid, student_id: Uuid, section: &str) -> Result<Self, DomainError> {
    if section.trim().is_empty() {
      return Err(DomainError::ValidationError("Missing required fields".to_string()));
    }
    Ok(Self { id: Uuid::new_v4(),
              course_id,
              student_id,
              section: section.trim().to_string(),
              grade: None,
              enrolled_at: Utc::now() })
  }

  pub fn with_grade(&self, grade: &str) -> Result<Self, DomainError> {
    if grade.trim().is_empty() {
      return Err(DomainError::ValidationError("Grade is required".to_string()));
    }
    let mut graded = self.clone();
    graded.grade = Some(grade.trim().to_string());
    Ok(graded)
  }
}
