// Archivo: opportunities.rs
// Propósito: publicación de oportunidades (pasantías, proyectos) y el ciclo
// de postulación con currículum en PDF.
use crate::errors::{Result, ServiceError};
use crate::gate::Caller;
use chrono::Utc;
use cie_domain::{content_digest, is_pdf, upload_key, ApplicationStatus, BlobStore, CampusRepository, Opportunity,
                 OpportunityApplication, OpportunityDraft, Role, StoredBlob};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Currículum recibido en la postulación.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
  pub file_name: String,
  pub content_type: Option<String>,
  pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpportunityView {
  #[serde(flatten)]
  pub opportunity: Opportunity,
  pub faculty_name: String,
  pub application_count: usize,
  /// Estado de la postulación del estudiante que consulta, si la hay.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub my_status: Option<ApplicationStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
  #[serde(flatten)]
  pub application: OpportunityApplication,
  pub student_name: String,
  pub student_email: String,
  pub opportunity_title: String,
}

pub struct OpportunityService {
  repo: Arc<dyn CampusRepository>,
  blobs: Arc<dyn BlobStore>,
}

impl OpportunityService {
  pub fn new(repo: Arc<dyn CampusRepository>, blobs: Arc<dyn BlobStore>) -> Self {
    Self { repo, blobs }
  }

  fn find(&self, id: Uuid) -> Result<Opportunity> {
    self.repo.get_opportunity(&id)?.ok_or_else(|| ServiceError::not_found("Opportunity"))
  }

  fn check_faculty(&self, draft: &OpportunityDraft) -> Result<()> {
    match self.repo.get_user(&draft.faculty_id)? {
      Some(u) if u.role == Role::Faculty => Ok(()),
      _ => Err(ServiceError::bad_request("Invalid faculty")),
    }
  }

  fn visible(&self, caller: &Caller, opportunity: &Opportunity) -> Result<bool> {
    Ok(match caller.role() {
      Role::Admin => true,
      Role::Faculty => opportunity.faculty_id == caller.id(),
      Role::Student => {
        opportunity.is_published() || self.repo.find_application(&opportunity.id, &caller.id())?.is_some()
      }
    })
  }

  fn view(&self, caller: &Caller, opportunity: Opportunity) -> Result<OpportunityView> {
    let faculty_name = self.repo.get_user(&opportunity.faculty_id)?.map(|u| u.name).unwrap_or_default();
    let application_count = self.repo.list_applications(Some(opportunity.id), None)?.len();
    let my_status = if caller.is(Role::Student) {
      self.repo.find_application(&opportunity.id, &caller.id())?.map(|a| a.status)
    } else {
      None
    };
    Ok(OpportunityView { opportunity, faculty_name, application_count, my_status })
  }

  fn application_view(&self, application: OpportunityApplication) -> Result<ApplicationView> {
    let (student_name, student_email) = match self.repo.get_user(&application.student_id)? {
      Some(u) => (u.name, u.email),
      None => (String::new(), String::new()),
    };
    let opportunity_title = self.repo.get_opportunity(&application.opportunity_id)?.map(|o| o.title).unwrap_or_default();
    Ok(ApplicationView { application, student_name, student_email, opportunity_title })
  }

  pub fn create(&self, caller: &Caller, draft: OpportunityDraft) -> Result<Opportunity> {
    caller.require(&[Role::Admin])?;
    self.check_faculty(&draft)?;
    let opportunity = Opportunity::new(draft)?;
    self.repo.save_opportunity(&opportunity)?;
    tracing::info!(opportunity = %opportunity.id, faculty = %opportunity.faculty_id, "oportunidad creada");
    Ok(opportunity)
  }

  /// Docente: las propias. Estudiante: las aceptadas por su docente y
  /// abiertas, más aquellas donde ya postuló. Administrador: todas.
  pub fn list(&self, caller: &Caller) -> Result<Vec<OpportunityView>> {
    let mut out = Vec::new();
    for opportunity in self.repo.list_opportunities()? {
      if self.visible(caller, &opportunity)? {
        out.push(self.view(caller, opportunity)?);
      }
    }
    Ok(out)
  }

  pub fn get(&self, caller: &Caller, id: Uuid) -> Result<OpportunityView> {
    let opportunity = self.find(id)?;
    if !self.visible(caller, &opportunity)? {
      return Err(ServiceError::access_denied());
    }
    self.view(caller, opportunity)
  }

  pub fn update(&self, caller: &Caller, id: Uuid, draft: OpportunityDraft) -> Result<Opportunity> {
    caller.require(&[Role::Admin])?;
    let current = self.find(id)?;
    self.check_faculty(&draft)?;
    let updated = current.with_draft(draft)?;
    self.repo.save_opportunity(&updated)?;
    Ok(updated)
  }

  /// Borra la oportunidad, sus postulaciones y, en lo posible, los
  /// currículums almacenados.
  pub fn delete(&self, caller: &Caller, id: Uuid) -> Result<()> {
    caller.require(&[Role::Admin])?;
    self.find(id)?;
    let applications = self.repo.list_applications(Some(id), None)?;
    self.repo.delete_opportunity(&id)?;
    for a in applications {
      if let Err(e) = self.blobs.delete(&a.resume_key) {
        tracing::warn!(key = %a.resume_key, error = %e, "no se pudo borrar el currículum");
      }
    }
    tracing::info!(opportunity = %id, "oportunidad eliminada");
    Ok(())
  }

  /// El docente dueño acepta la publicación creada por el administrador.
  pub fn accept(&self, caller: &Caller, id: Uuid) -> Result<Opportunity> {
    caller.require(&[Role::Faculty])?;
    let opportunity = self.find(id)?;
    if opportunity.faculty_id != caller.id() {
      return Err(ServiceError::access_denied());
    }
    let accepted = opportunity.accept(Utc::now());
    if accepted.accepted_at != opportunity.accepted_at {
      self.repo.save_opportunity(&accepted)?;
      tracing::info!(opportunity = %id, faculty = %caller.id(), "oportunidad aceptada");
    }
    Ok(accepted)
  }

  /// Postulación de un estudiante. El archivo se escribe antes del registro;
  /// si la inserción falla el archivo queda huérfano y sólo se registra.
  pub fn apply(&self, caller: &Caller, id: Uuid, resume: ResumeUpload) -> Result<OpportunityApplication> {
    caller.require(&[Role::Student])?;
    let opportunity = self.find(id)?;
    if !opportunity.is_published() {
      return Err(ServiceError::bad_request("This opportunity is not accepting applications"));
    }
    if resume.bytes.is_empty() {
      return Err(ServiceError::bad_request("Resume file is required"));
    }
    if !is_pdf(resume.content_type.as_deref()) {
      return Err(ServiceError::bad_request("Only PDF files are allowed"));
    }
    if self.repo.find_application(&id, &caller.id())?.is_some() {
      return Err(ServiceError::bad_request("Already applied to this opportunity."));
    }
    let key = upload_key(&format!("resumes/{}", id), &resume.file_name, Utc::now());
    self.blobs.put(&key, &resume.bytes, resume.content_type.as_deref())?;
    let application = OpportunityApplication::new(id, caller.id(), &resume.file_name, &key);
    if let Err(e) = self.repo.insert_application(&application) {
      tracing::error!(key = %key, error = %e, "postulación no registrada; el currículum queda sin referencia");
      return Err(e.into());
    }
    tracing::info!(application = %application.id, opportunity = %id, sha256 = %content_digest(&resume.bytes),
                   "postulación registrada");
    Ok(application)
  }

  fn require_owner(&self, caller: &Caller, opportunity: &Opportunity) -> Result<()> {
    match caller.role() {
      Role::Admin => Ok(()),
      Role::Faculty if opportunity.faculty_id == caller.id() => Ok(()),
      _ => Err(ServiceError::access_denied()),
    }
  }

  pub fn list_applications(&self, caller: &Caller, id: Uuid) -> Result<Vec<ApplicationView>> {
    let opportunity = self.find(id)?;
    self.require_owner(caller, &opportunity)?;
    self.repo.list_applications(Some(id), None)?.into_iter().map(|a| self.application_view(a)).collect()
  }

  pub fn my_applications(&self, caller: &Caller) -> Result<Vec<ApplicationView>> {
    caller.require(&[Role::Student])?;
    self.repo.list_applications(None, Some(caller.id()))?.into_iter().map(|a| self.application_view(a)).collect()
  }

  /// Decide una postulación pendiente. Aceptar más allá del cupo es 409.
  pub fn update_application_status(&self, caller: &Caller, application_id: Uuid, status: &str) -> Result<ApplicationView> {
    let application =
      self.repo.get_application(&application_id)?.ok_or_else(|| ServiceError::not_found("Application"))?;
    let opportunity = self.find(application.opportunity_id)?;
    self.require_owner(caller, &opportunity)?;
    let to: ApplicationStatus = status.parse()?;
    if to == ApplicationStatus::Accepted
       && self.repo.count_applications(&opportunity.id, ApplicationStatus::Accepted)? >= opportunity.capacity
    {
      return Err(ServiceError::Conflict("Opportunity capacity reached".to_string()));
    }
    let next = application.decide(to, Utc::now())?;
    self.repo.update_application(&next)?;
    tracing::info!(application = %next.id, status = %next.status, actor = %caller.id(), "postulación decidida");
    self.application_view(next)
  }

  /// Currículum de una postulación: lo ven el postulante, el docente dueño y
  /// el administrador.
  pub fn resume(&self, caller: &Caller, application_id: Uuid) -> Result<StoredBlob> {
    let application =
      self.repo.get_application(&application_id)?.ok_or_else(|| ServiceError::not_found("Application"))?;
    if application.student_id != caller.id() {
      let opportunity = self.find(application.opportunity_id)?;
      self.require_owner(caller, &opportunity)?;
    }
    self.blobs.get(&application.resume_key)?.ok_or_else(|| ServiceError::not_found("Resume"))
  }
}
