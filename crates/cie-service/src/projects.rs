// Archivo: projects.rs
// Propósito: proyectos de laboratorio y solicitudes de estudiantes para
// sumarse a ellos. Los proyectos docentes los habilita un coordinador del
// dominio de laboratorio; los propuestos por estudiantes, el docente al
// que se dirige la solicitud.
use crate::errors::{Result, ServiceError};
use crate::gate::Caller;
use chrono::Utc;
use cie_domain::{CampusRepository, InventoryKind, Project, ProjectDraft, ProjectKind, ProjectRequest,
                 ProjectRequestStatus, ProjectStatus, Role};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Dominios cuyos coordinadores revisan los proyectos docentes.
const PROJECT_REVIEW_DOMAINS: [&str; 2] = ["Lab Components", "Lab"];

#[derive(Debug, Clone, Deserialize)]
pub struct NewProjectRequest {
  pub project_id: Uuid,
  /// Sólo para proyectos propuestos por el estudiante; en los docentes la
  /// solicitud va al creador.
  #[serde(default)]
  pub faculty_id: Option<Uuid>,
  #[serde(default)]
  pub student_notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectReview {
  pub project_id: Uuid,
  #[serde(default)]
  pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentRef {
  pub id: Uuid,
  pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
  #[serde(flatten)]
  pub project: Project,
  pub creator_name: String,
  /// Componentes que todavía existen en el inventario.
  pub components_needed_details: Vec<ComponentRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectRequestView {
  #[serde(flatten)]
  pub request: ProjectRequest,
  pub project_name: String,
  pub student_name: String,
  pub faculty_name: String,
}

pub struct ProjectService {
  repo: Arc<dyn CampusRepository>,
}

impl ProjectService {
  pub fn new(repo: Arc<dyn CampusRepository>) -> Self {
    Self { repo }
  }

  fn find(&self, id: Uuid) -> Result<Project> {
    self.repo.get_project(&id)?.ok_or_else(|| ServiceError::not_found("Project"))
  }

  fn user_name(&self, id: &Uuid) -> Result<String> {
    Ok(self.repo.get_user(id)?.map(|u| u.name).unwrap_or_default())
  }

  fn view(&self, project: Project) -> Result<ProjectView> {
    let creator_name = self.user_name(&project.created_by)?;
    let mut components_needed_details = Vec::with_capacity(project.components_needed.len());
    for id in &project.components_needed {
      if let Some(item) = self.repo.get_item(id)? {
        components_needed_details.push(ComponentRef { id: item.id, name: item.name });
      }
    }
    Ok(ProjectView { project, creator_name, components_needed_details })
  }

  fn request_view(&self, request: ProjectRequest) -> Result<ProjectRequestView> {
    let project_name = self.repo.get_project(&request.project_id)?.map(|p| p.name).unwrap_or_default();
    let student_name = self.user_name(&request.student_id)?;
    let faculty_name = self.user_name(&request.faculty_id)?;
    Ok(ProjectRequestView { request, project_name, student_name, faculty_name })
  }

  /// Administrador: todos. Docente: los suyos y los que tienen solicitudes
  /// dirigidas a él. Estudiante: los docentes en curso, los propios y los
  /// que ya solicitó.
  fn visible(&self, caller: &Caller, project: &Project) -> Result<bool> {
    if caller.is(Role::Admin) || project.created_by == caller.id() {
      return Ok(true);
    }
    let requests = self.repo.list_project_requests(Some(project.id), None, None)?;
    Ok(match caller.role() {
      Role::Faculty => requests.iter().any(|r| r.faculty_id == caller.id()),
      Role::Student => {
        (project.kind == ProjectKind::FacultyAssigned && project.status == ProjectStatus::Ongoing)
        || requests.iter().any(|r| r.student_id == caller.id())
      }
      Role::Admin => true,
    })
  }

  /// Componentes pedidos: deben ser componentes de laboratorio existentes.
  fn check_components(&self, draft: &ProjectDraft) -> Result<()> {
    for id in &draft.components_needed {
      match self.repo.get_item(id)? {
        Some(item) if item.kind == InventoryKind::LabComponent => {}
        _ => return Err(ServiceError::bad_request(format!("Unknown lab component: {}", id))),
      }
    }
    Ok(())
  }

  /// Docente -> FACULTY_ASSIGNED, estudiante -> STUDENT_PROPOSED; ambos
  /// empiezan PENDING.
  pub fn create(&self, caller: &Caller, draft: ProjectDraft) -> Result<Project> {
    caller.require(&[Role::Faculty, Role::Student])?;
    self.check_components(&draft)?;
    let kind = if caller.is(Role::Faculty) { ProjectKind::FacultyAssigned } else { ProjectKind::StudentProposed };
    let project = Project::new(draft, kind, caller.id())?;
    self.repo.save_project(&project)?;
    tracing::info!(project = %project.id, kind = project.kind.as_str(), creator = %caller.id(), "proyecto creado");
    Ok(project)
  }

  pub fn list(&self, caller: &Caller) -> Result<Vec<ProjectView>> {
    let mut out = Vec::new();
    for project in self.repo.list_projects()? {
      if self.visible(caller, &project)? {
        out.push(self.view(project)?);
      }
    }
    Ok(out)
  }

  pub fn get(&self, caller: &Caller, id: Uuid) -> Result<ProjectView> {
    let project = self.find(id)?;
    if !self.visible(caller, &project)? {
      return Err(ServiceError::access_denied());
    }
    self.view(project)
  }

  /// Borra el proyecto y sus solicitudes; sólo el administrador o quien lo
  /// creó.
  pub fn delete(&self, caller: &Caller, id: Uuid) -> Result<()> {
    let project = self.find(id)?;
    if !caller.is(Role::Admin) && project.created_by != caller.id() {
      return Err(ServiceError::access_denied());
    }
    self.repo.delete_project(&id)?;
    tracing::info!(project = %id, "proyecto eliminado");
    Ok(())
  }

  fn require_reviewer(&self, caller: &Caller) -> Result<()> {
    caller.require(&[Role::Faculty])?;
    let domains = self.repo.list_domains()?;
    let coordinated = self.repo.list_coordinators(None, Some(caller.id()))?;
    let reviews = coordinated.iter().any(|c| {
                                      domains.iter().any(|d| {
                                                      d.id == c.domain_id
                                                      && PROJECT_REVIEW_DOMAINS.iter().any(|n| d.matches_name(n))
                                                    })
                                    });
    if reviews {
      Ok(())
    } else {
      Err(ServiceError::Forbidden("Only Lab Components coordinators can review projects".to_string()))
    }
  }

  /// Proyectos docentes esperando al coordinador.
  pub fn pending_reviews(&self, caller: &Caller) -> Result<Vec<ProjectView>> {
    self.require_reviewer(caller)?;
    self.repo
        .list_projects()?
        .into_iter()
        .filter(|p| p.kind == ProjectKind::FacultyAssigned && p.status == ProjectStatus::Pending)
        .map(|p| self.view(p))
        .collect()
  }

  /// ONGOING habilita el proyecto para solicitudes de estudiantes.
  pub fn review(&self, caller: &Caller, input: ProjectReview) -> Result<Project> {
    self.require_reviewer(caller)?;
    let to: ProjectStatus = input.status.parse()?;
    let project = self.find(input.project_id)?;
    let reviewed = project.review(to, caller.id(), Utc::now())?;
    self.repo.save_project(&reviewed)?;
    tracing::info!(project = %reviewed.id, status = reviewed.status.as_str(), coordinator = %caller.id(),
                   "proyecto revisado");
    Ok(reviewed)
  }

  pub fn create_request(&self, caller: &Caller, input: NewProjectRequest) -> Result<ProjectRequest> {
    caller.require(&[Role::Student])?;
    let project = self.find(input.project_id)?;
    let faculty_id = match project.kind {
      ProjectKind::FacultyAssigned => {
        if project.status != ProjectStatus::Ongoing {
          return Err(ServiceError::bad_request("This project is not open for requests"));
        }
        project.created_by
      }
      ProjectKind::StudentProposed => {
        if project.created_by != caller.id() {
          return Err(ServiceError::access_denied());
        }
        if project.status != ProjectStatus::Pending {
          return Err(ServiceError::bad_request("This project was already decided"));
        }
        let faculty_id = input.faculty_id.ok_or_else(|| ServiceError::bad_request("Faculty ID is required"))?;
        match self.repo.get_user(&faculty_id)? {
          Some(u) if u.role == Role::Faculty => faculty_id,
          _ => return Err(ServiceError::bad_request("Invalid faculty")),
        }
      }
    };
    let existing = self.repo.list_project_requests(Some(project.id), Some(caller.id()), None)?;
    if existing.iter().any(|r| r.status != ProjectRequestStatus::Rejected) {
      return Err(ServiceError::bad_request("Already requested this project"));
    }
    let request = ProjectRequest::new(project.id, caller.id(), faculty_id, input.student_notes);
    self.repo.save_project_request(&request)?;
    tracing::info!(request = %request.id, project = %project.id, faculty = %faculty_id, "solicitud de proyecto creada");
    Ok(request)
  }

  /// Administrador: todas. Docente: las dirigidas a él. Estudiante: las
  /// propias.
  pub fn list_requests(&self, caller: &Caller) -> Result<Vec<ProjectRequestView>> {
    let requests = match caller.role() {
      Role::Admin => self.repo.list_project_requests(None, None, None)?,
      Role::Faculty => self.repo.list_project_requests(None, None, Some(caller.id()))?,
      Role::Student => self.repo.list_project_requests(None, Some(caller.id()), None)?,
    };
    requests.into_iter().map(|r| self.request_view(r)).collect()
  }

  /// Decisión del docente destinatario. En proyectos de estudiante el
  /// proyecto sigue la decisión (ONGOING o REJECTED).
  pub fn decide_request(&self,
                        caller: &Caller,
                        id: Uuid,
                        status: &str,
                        faculty_notes: Option<String>)
                        -> Result<ProjectRequestView> {
    caller.require(&[Role::Faculty])?;
    let request = self.repo.get_project_request(&id)?.ok_or_else(|| ServiceError::not_found("Project request"))?;
    if request.faculty_id != caller.id() {
      return Err(ServiceError::access_denied());
    }
    let to: ProjectRequestStatus = status.parse()?;
    let now = Utc::now();
    let decided = request.decide(to, faculty_notes, now)?;
    self.repo.save_project_request(&decided)?;
    if let Some(project) = self.repo.get_project(&decided.project_id)? {
      let followed = project.follow_decision(decided.status, caller.id(), now);
      if followed != project {
        self.repo.save_project(&followed)?;
      }
    }
    tracing::info!(request = %id, status = decided.status.as_str(), faculty = %caller.id(),
                   "solicitud de proyecto decidida");
    self.request_view(decided)
  }
}
