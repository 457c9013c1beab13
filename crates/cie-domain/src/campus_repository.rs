// campus_repository.rs
use crate::checkout::{CheckoutRequest, RequestStatus};
use crate::domain_area::{Domain, DomainCoordinator};
use crate::enrollment::{Course, Enrollment};
use crate::inventory::{count_active, InventoryItem, InventoryKind};
use crate::opportunity::{ApplicationStatus, Opportunity, OpportunityApplication};
use crate::project::{Project, ProjectRequest};
use crate::ticket::{ReviewTicket, TicketKind};
use crate::user::{FacultyProfile, StudentProfile, User};
use crate::DomainError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Alcance por dominio al listar solicitudes de préstamo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainScope {
  pub domain_ids: Vec<Uuid>,
  /// Incluir ítems sin dominio asignado.
  pub include_unassigned: bool,
}

impl DomainScope {
  pub fn contains(&self, domain_id: Option<Uuid>) -> bool {
    match domain_id {
      Some(id) => self.domain_ids.contains(&id),
      None => self.include_unassigned,
    }
  }
}

/// Filtro de solicitudes de préstamo. `None` en un campo significa "sin
/// filtrar".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFilter {
  pub kind: InventoryKind,
  pub student_id: Option<Uuid>,
  pub item_id: Option<Uuid>,
  pub status: Option<RequestStatus>,
  pub scope: Option<DomainScope>,
}

impl RequestFilter {
  pub fn kind(kind: InventoryKind) -> Self {
    Self { kind, student_id: None, item_id: None, status: None, scope: None }
  }
}

/// Puerto de persistencia del portal. Las implementaciones deben ser
/// seguras para compartir entre hilos; el servidor las usa detrás de un
/// `Arc<dyn CampusRepository>`.
pub trait CampusRepository: Send + Sync {
  // --- usuarios ---
  /// Inserta un usuario. El email es único (`Duplicate`).
  fn insert_user(&self, user: &User) -> Result<(), DomainError>;
  fn get_user(&self, id: &Uuid) -> Result<Option<User>, DomainError>;
  fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;
  fn list_users(&self) -> Result<Vec<User>, DomainError>;
  fn save_faculty_profile(&self, profile: &FacultyProfile) -> Result<(), DomainError>;
  fn get_faculty_profile(&self, user_id: &Uuid) -> Result<Option<FacultyProfile>, DomainError>;
  fn save_student_profile(&self, profile: &StudentProfile) -> Result<(), DomainError>;
  fn get_student_profile(&self, user_id: &Uuid) -> Result<Option<StudentProfile>, DomainError>;

  // --- inventario ---
  /// Inserta o reemplaza un ítem.
  fn save_item(&self, item: &InventoryItem) -> Result<(), DomainError>;
  fn get_item(&self, id: &Uuid) -> Result<Option<InventoryItem>, DomainError>;
  fn list_items(&self, kind: InventoryKind) -> Result<Vec<InventoryItem>, DomainError>;
  /// Elimina el ítem y sus solicitudes. Devuelve `false` si no existía.
  fn delete_item(&self, id: &Uuid) -> Result<bool, DomainError>;

  // --- solicitudes de préstamo ---
  fn save_request(&self, request: &CheckoutRequest) -> Result<(), DomainError>;
  fn get_request(&self, id: &Uuid) -> Result<Option<CheckoutRequest>, DomainError>;
  /// Lista ordenada por `requested_at` descendente.
  fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<CheckoutRequest>, DomainError>;
  /// Solicitudes del ítem en APPROVED, COLLECTED o PENDING_RETURN.
  fn count_active_requests(&self, item_id: &Uuid) -> Result<i64, DomainError>;

  // --- tickets ---
  fn save_ticket(&self, ticket: &ReviewTicket) -> Result<(), DomainError>;
  fn get_ticket(&self, id: &Uuid) -> Result<Option<ReviewTicket>, DomainError>;
  fn list_tickets(&self, kind: TicketKind, created_by: Option<Uuid>) -> Result<Vec<ReviewTicket>, DomainError>;

  // --- oportunidades ---
  fn save_opportunity(&self, opportunity: &Opportunity) -> Result<(), DomainError>;
  fn get_opportunity(&self, id: &Uuid) -> Result<Option<Opportunity>, DomainError>;
  fn list_opportunities(&self) -> Result<Vec<Opportunity>, DomainError>;
  /// Elimina la oportunidad y sus postulaciones.
  fn delete_opportunity(&self, id: &Uuid) -> Result<bool, DomainError>;
  /// Inserta una postulación; el par (oportunidad, estudiante) es único
  /// (`Duplicate`).
  fn insert_application(&self, application: &OpportunityApplication) -> Result<(), DomainError>;
  fn update_application(&self, application: &OpportunityApplication) -> Result<(), DomainError>;
  fn get_application(&self, id: &Uuid) -> Result<Option<OpportunityApplication>, DomainError>;
  fn find_application(&self,
                      opportunity_id: &Uuid,
                      student_id: &Uuid)
                      -> Result<Option<OpportunityApplication>, DomainError>;
  fn list_applications(&self,
                       opportunity_id: Option<Uuid>,
                       student_id: Option<Uuid>)
                       -> Result<Vec<OpportunityApplication>, DomainError>;
  fn count_applications(&self, opportunity_id: &Uuid, status: ApplicationStatus) -> Result<i64, DomainError>;

  // --- dominios y coordinadores ---
  fn save_domain(&self, domain: &Domain) -> Result<(), DomainError>;
  fn get_domain(&self, id: &Uuid) -> Result<Option<Domain>, DomainError>;
  fn list_domains(&self) -> Result<Vec<Domain>, DomainError>;
  /// Elimina el dominio y sus asignaciones de coordinador.
  fn delete_domain(&self, id: &Uuid) -> Result<bool, DomainError>;
  /// Inserta una asignación; el par (dominio, docente) es único
  /// (`Duplicate`).
  fn insert_coordinator(&self, coordinator: &DomainCoordinator) -> Result<(), DomainError>;
  fn list_coordinators(&self,
                       domain_id: Option<Uuid>,
                       faculty_id: Option<Uuid>)
                       -> Result<Vec<DomainCoordinator>, DomainError>;
  fn delete_coordinator(&self, id: &Uuid) -> Result<bool, DomainError>;

  // --- cursos e inscripciones ---
  fn save_course(&self, course: &Course) -> Result<(), DomainError>;
  fn get_course(&self, id: &Uuid) -> Result<Option<Course>, DomainError>;
  fn list_courses(&self) -> Result<Vec<Course>, DomainError>;
  /// Inserta una inscripción; el par (curso, estudiante) es único
  /// (`Duplicate`).
  fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), DomainError>;
  fn update_enrollment(&self, enrollment: &Enrollment) -> Result<(), DomainError>;
  fn get_enrollment(&self, id: &Uuid) -> Result<Option<Enrollment>, DomainError>;
  fn list_enrollments(&self,
                      course_id: Option<Uuid>,
                      student_id: Option<Uuid>)
                      -> Result<Vec<Enrollment>, DomainError>;

  // --- proyectos ---
  fn save_project(&self, project: &Project) -> Result<(), DomainError>;
  fn get_project(&self, id: &Uuid) -> Result<Option<Project>, DomainError>;
  fn list_projects(&self) -> Result<Vec<Project>, DomainError>;
  /// Elimina el proyecto y sus solicitudes.
  fn delete_project(&self, id: &Uuid) -> Result<bool, DomainError>;
  fn save_project_request(&self, request: &ProjectRequest) -> Result<(), DomainError>;
  fn get_project_request(&self, id: &Uuid) -> Result<Option<ProjectRequest>, DomainError>;
  /// Más recientes primero.
  fn list_project_requests(&self,
                           project_id: Option<Uuid>,
                           student_id: Option<Uuid>,
                           faculty_id: Option<Uuid>)
                           -> Result<Vec<ProjectRequest>, DomainError>;
}

type Table<T> = Arc<Mutex<HashMap<Uuid, T>>>;

/// Implementación en memoria para tests y desarrollo.
#[derive(Default)]
pub struct InMemoryCampusRepository {
  users: Table<User>,
  faculty_profiles: Table<FacultyProfile>,
  student_profiles: Table<StudentProfile>,
  items: Table<InventoryItem>,
  requests: Table<CheckoutRequest>,
  tickets: Table<ReviewTicket>,
  opportunities: Table<Opportunity>,
  applications: Table<OpportunityApplication>,
  domains: Table<Domain>,
  coordinators: Table<DomainCoordinator>,
  courses: Table<Course>,
  enrollments: Table<Enrollment>,
  projects: Table<Project>,
  project_requests: Table<ProjectRequest>,
}

impl InMemoryCampusRepository {
  pub fn new() -> Self {
    Self::default()
  }

  // Mapea un mutex envenenado a DomainError
  fn lock_map<'a, T>(&'a self, m: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, DomainError> {
    m.lock().map_err(|e| DomainError::ExternalError(format!("Mutex '{}' poisoned: {}", name, e)))
  }

  fn get_cloned<T: Clone>(&self, table: &Table<T>, name: &str, id: &Uuid) -> Result<Option<T>, DomainError> {
    Ok(self.lock_map(table, name)?.get(id).cloned())
  }

  fn remove(&self, table: &Table<impl Sized>, name: &str, id: &Uuid) -> Result<bool, DomainError> {
    Ok(self.lock_map(table, name)?.remove(id).is_some())
  }
}

impl CampusRepository for InMemoryCampusRepository {
  fn insert_user(&self, user: &User) -> Result<(), DomainError> {
    let mut users = self.lock_map(&self.users, "users")?;
    if users.values().any(|u| u.email == user.email && u.id != user.id) {
      return Err(DomainError::Duplicate("A user with this email already exists".to_string()));
    }
    users.insert(user.id, user.clone());
    Ok(())
  }

  fn get_user(&self, id: &Uuid) -> Result<Option<User>, DomainError> {
    self.get_cloned(&self.users, "users", id)
  }

  fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
    let email = email.trim().to_lowercase();
    let users = self.lock_map(&self.users, "users")?;
    Ok(users.values().find(|u| u.email == email).cloned())
  }

  fn list_users(&self) -> Result<Vec<User>, DomainError> {
    let users = self.lock_map(&self.users, "users")?;
    let mut out: Vec<User> = users.values().cloned().collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(out)
  }

  fn save_faculty_profile(&self, profile: &FacultyProfile) -> Result<(), DomainError> {
    self.lock_map(&self.faculty_profiles, "faculty_profiles")?.insert(profile.user_id, profile.clone());
    Ok(())
  }

  fn get_faculty_profile(&self, user_id: &Uuid) -> Result<Option<FacultyProfile>, DomainError> {
    self.get_cloned(&self.faculty_profiles, "faculty_profiles", user_id)
  }

  fn save_student_profile(&self, profile: &StudentProfile) -> Result<(), DomainError> {
    self.lock_map(&self.student_profiles, "student_profiles")?.insert(profile.user_id, profile.clone());
    Ok(())
  }

  fn get_student_profile(&self, user_id: &Uuid) -> Result<Option<StudentProfile>, DomainError> {
    self.get_cloned(&self.student_profiles, "student_profiles", user_id)
  }

  fn save_item(&self, item: &InventoryItem) -> Result<(), DomainError> {
    self.lock_map(&self.items, "items")?.insert(item.id, item.clone());
    Ok(())
  }

  fn get_item(&self, id: &Uuid) -> Result<Option<InventoryItem>, DomainError> {
    self.get_cloned(&self.items, "items", id)
  }

  fn list_items(&self, kind: InventoryKind) -> Result<Vec<InventoryItem>, DomainError> {
    let items = self.lock_map(&self.items, "items")?;
    let mut out: Vec<InventoryItem> = items.values().filter(|i| i.kind == kind).cloned().collect();
    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
  }

  fn delete_item(&self, id: &Uuid) -> Result<bool, DomainError> {
    let removed = self.remove(&self.items, "items", id)?;
    if removed {
      self.lock_map(&self.requests, "requests")?.retain(|_, r| &r.item_id != id);
    }
    Ok(removed)
  }

  fn save_request(&self, request: &CheckoutRequest) -> Result<(), DomainError> {
    self.lock_map(&self.requests, "requests")?.insert(request.id, request.clone());
    Ok(())
  }

  fn get_request(&self, id: &Uuid) -> Result<Option<CheckoutRequest>, DomainError> {
    self.get_cloned(&self.requests, "requests", id)
  }

  fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<CheckoutRequest>, DomainError> {
    // el alcance por dominio necesita el dominio de cada ítem
    let item_domains: HashMap<Uuid, Option<Uuid>> = match &filter.scope {
      Some(_) => self.lock_map(&self.items, "items")?.values().map(|i| (i.id, i.domain_id)).collect(),
      None => HashMap::new(),
    };
    let requests = self.lock_map(&self.requests, "requests")?;
    let mut out: Vec<CheckoutRequest> =
      requests.values()
              .filter(|r| r.kind == filter.kind)
              .filter(|r| filter.student_id.map_or(true, |s| r.student_id == s))
              .filter(|r| filter.item_id.map_or(true, |i| r.item_id == i))
              .filter(|r| filter.status.map_or(true, |s| r.status == s))
              .filter(|r| match &filter.scope {
                Some(scope) => item_domains.get(&r.item_id).map_or(false, |d| scope.contains(*d)),
                None => true,
              })
              .cloned()
              .collect();
    out.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
    Ok(out)
  }

  fn count_active_requests(&self, item_id: &Uuid) -> Result<i64, DomainError> {
    let requests = self.lock_map(&self.requests, "requests")?;
    Ok(count_active(requests.values().filter(|r| &r.item_id == item_id).map(|r| &r.status)))
  }

  fn save_ticket(&self, ticket: &ReviewTicket) -> Result<(), DomainError> {
    self.lock_map(&self.tickets, "tickets")?.insert(ticket.id, ticket.clone());
    Ok(())
  }

  fn get_ticket(&self, id: &Uuid) -> Result<Option<ReviewTicket>, DomainError> {
    self.get_cloned(&self.tickets, "tickets", id)
  }

  fn list_tickets(&self, kind: TicketKind, created_by: Option<Uuid>) -> Result<Vec<ReviewTicket>, DomainError> {
    let tickets = self.lock_map(&self.tickets, "tickets")?;
    let mut out: Vec<ReviewTicket> = tickets.values()
                                            .filter(|t| t.kind == kind)
                                            .filter(|t| created_by.map_or(true, |c| t.created_by == c))
                                            .cloned()
                                            .collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(out)
  }

  fn save_opportunity(&self, opportunity: &Opportunity) -> Result<(), DomainError> {
    self.lock_map(&self.opportunities, "opportunities")?.insert(opportunity.id, opportunity.clone());
    Ok(())
  }

  fn get_opportunity(&self, id: &Uuid) -> Result<Option<Opportunity>, DomainError> {
    self.get_cloned(&self.opportunities, "opportunities", id)
  }

  fn list_opportunities(&self) -> Result<Vec<Opportunity>, DomainError> {
    let opportunities = self.lock_map(&self.opportunities, "opportunities")?;
    let mut out: Vec<Opportunity> = opportunities.values().cloned().collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(out)
  }

  fn delete_opportunity(&self, id: &Uuid) -> Result<bool, DomainError> {
    let removed = self.remove(&self.opportunities, "opportunities", id)?;
    if removed {
      self.lock_map(&self.applications, "applications")?.retain(|_, a| &a.opportunity_id != id);
    }
    Ok(removed)
  }

  fn insert_application(&self, application: &OpportunityApplication) -> Result<(), DomainError> {
    let mut applications = self.lock_map(&self.applications, "applications")?;
    if applications.values()
                   .any(|a| a.opportunity_id == application.opportunity_id && a.student_id == application.student_id)
    {
      return Err(DomainError::Duplicate("Already applied to this opportunity.".to_string()));
    }
    applications.insert(application.id, application.clone());
    Ok(())
  }

  fn update_application(&self, application: &OpportunityApplication) -> Result<(), DomainError> {
    let mut applications = self.lock_map(&self.applications, "applications")?;
    match applications.get_mut(&application.id) {
      Some(existing) => {
        *existing = application.clone();
        Ok(())
      }
      None => Err(DomainError::NotFound("Application not found".to_string())),
    }
  }

  fn get_application(&self, id: &Uuid) -> Result<Option<OpportunityApplication>, DomainError> {
    self.get_cloned(&self.applications, "applications", id)
  }

  fn find_application(&self,
                      opportunity_id: &Uuid,
                      student_id: &Uuid)
                      -> Result<Option<OpportunityApplication>, DomainError> {
    let applications = self.lock_map(&self.applications, "applications")?;
    Ok(applications.values()
                   .find(|a| &a.opportunity_id == opportunity_id && &a.student_id == student_id)
                   .cloned())
  }

  fn list_applications(&self,
                       opportunity_id: Option<Uuid>,
                       student_id: Option<Uuid>)
                       -> Result<Vec<OpportunityApplication>, DomainError> {
    let applications = self.lock_map(&self.applications, "applications")?;
    let mut out: Vec<OpportunityApplication> =
      applications.values()
                  .filter(|a| opportunity_id.map_or(true, |o| a.opportunity_id == o))
                  .filter(|a| student_id.map_or(true, |s| a.student_id == s))
                  .cloned()
                  .collect();
    out.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
    Ok(out)
  }

  fn count_applications(&self, opportunity_id: &Uuid, status: ApplicationStatus) -> Result<i64, DomainError> {
    let applications = self.lock_map(&self.applications, "applications")?;
    Ok(applications.values().filter(|a| &a.opportunity_id == opportunity_id && a.status == status).count() as i64)
  }

  fn save_domain(&self, domain: &Domain) -> Result<(), DomainError> {
    self.lock_map(&self.domains, "domains")?.insert(domain.id, domain.clone());
    Ok(())
  }

  fn get_domain(&self, id: &Uuid) -> Result<Option<Domain>, DomainError> {
    self.get_cloned(&self.domains, "domains", id)
  }

  fn list_domains(&self) -> Result<Vec<Domain>, DomainError> {
    let domains = self.lock_map(&self.domains, "domains")?;
    let mut out: Vec<Domain> = domains.values().cloned().collect();
    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
  }

  fn delete_domain(&self, id: &Uuid) -> Result<bool, DomainError> {
    let removed = self.remove(&self.domains, "domains", id)?;
    if removed {
      self.lock_map(&self.coordinators, "coordinators")?.retain(|_, c| &c.domain_id != id);
    }
    Ok(removed)
  }

  fn insert_coordinator(&self, coordinator: &DomainCoordinator) -> Result<(), DomainError> {
    let mut coordinators = self.lock_map(&self.coordinators, "coordinators")?;
    if coordinators.values()
                   .any(|c| c.domain_id == coordinator.domain_id && c.faculty_id == coordinator.faculty_id)
    {
      return Err(DomainError::Duplicate("This faculty is already a coordinator for this domain".to_string()));
    }
    coordinators.insert(coordinator.id, coordinator.clone());
    Ok(())
  }

  fn list_coordinators(&self,
                       domain_id: Option<Uuid>,
                       faculty_id: Option<Uuid>)
                       -> Result<Vec<DomainCoordinator>, DomainError> {
    let coordinators = self.lock_map(&self.coordinators, "coordinators")?;
    let mut out: Vec<DomainCoordinator> = coordinators.values()
                                                      .filter(|c| domain_id.map_or(true, |d| c.domain_id == d))
                                                      .filter(|c| faculty_id.map_or(true, |f| c.faculty_id == f))
                                                      .cloned()
                                                      .collect();
    out.sort_by(|a, b| b.assigned_at.cmp(&a.assigned_at));
    Ok(out)
  }

  fn delete_coordinator(&self, id: &Uuid) -> Result<bool, DomainError> {
    self.remove(&self.coordinators, "coordinators", id)
  }

  fn save_course(&self, course: &Course) -> Result<(), DomainError> {
    let mut courses = self.lock_map(&self.courses, "courses")?;
    if courses.values().any(|c| c.code == course.code && c.id != course.id) {
      return Err(DomainError::Duplicate("A course with this code already exists".to_string()));
    }
    courses.insert(course.id, course.clone());
    Ok(())
  }

  fn get_course(&self, id: &Uuid) -> Result<Option<Course>, DomainError> {
    self.get_cloned(&self.courses, "courses", id)
  }

  fn list_courses(&self) -> Result<Vec<Course>, DomainError> {
    let courses = self.lock_map(&self.courses, "courses")?;
    let mut out: Vec<Course> = courses.values().cloned().collect();
    out.sort_by(|a, b| a.code.cmp(&b.code));
    Ok(out)
  }

  fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), DomainError> {
    let mut enrollments = self.lock_map(&self.enrollments, "enrollments")?;
    if enrollments.values()
                  .any(|e| e.course_id == enrollment.course_id && e.student_id == enrollment.student_id)
    {
      return Err(DomainError::Duplicate("Already enrolled in this course".to_string()));
    }
    enrollments.insert(enrollment.id, enrollment.clone());
    Ok(())
  }

  fn update_enrollment(&self, enrollment: &Enrollment) -> Result<(), DomainError> {
    let mut enrollments = self.lock_map(&self.enrollments, "enrollments")?;
    match enrollments.get_mut(&enrollment.id) {
      Some(existing) => {
        *existing = enrollment.clone();
        Ok(())
      }
      None => Err(DomainError::NotFound("Enrollment not found".to_string())),
    }
  }

  fn get_enrollment(&self, id: &Uuid) -> Result<Option<Enrollment>, DomainError> {
    self.get_cloned(&self.enrollments, "enrollments", id)
  }

  fn list_enrollments(&self,
                      course_id: Option<Uuid>,
                      student_id: Option<Uuid>)
                      -> Result<Vec<Enrollment>, DomainError> {
    let enrollments = self.lock_map(&self.enrollments, "enrollments")?;
    let mut out: Vec<Enrollment> = enrollments.values()
                                              .filter(|e| course_id.map_or(true, |c| e.course_id == c))
                                              .filter(|e| student_id.map_or(true, |s| e.student_id == s))
                                              .cloned()
                                              .collect();
    out.sort_by(|a, b| b.enrolled_at.cmp(&a.enrolled_at));
    Ok(out)
  }

  fn save_project(&self, project: &Project) -> Result<(), DomainError> {
    self.lock_map(&self.projects, "projects")?.insert(project.id, project.clone());
    Ok(())
  }

  fn get_project(&self, id: &Uuid) -> Result<Option<Project>, DomainError> {
    self.get_cloned(&self.projects, "projects", id)
  }

  fn list_projects(&self) -> Result<Vec<Project>, DomainError> {
    let projects = self.lock_map(&self.projects, "projects")?;
    let mut out: Vec<Project> = projects.values().cloned().collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(out)
  }

  fn delete_project(&self, id: &Uuid) -> Result<bool, DomainError> {
    let removed = self.remove(&self.projects, "projects", id)?;
    if removed {
      self.lock_map(&self.project_requests, "project_requests")?.retain(|_, r| &r.project_id != id);
    }
    Ok(removed)
  }

  fn save_project_request(&self, request: &ProjectRequest) -> Result<(), DomainError> {
    self.lock_map(&self.project_requests, "project_requests")?.insert(request.id, request.clone());
    Ok(())
  }

  fn get_project_request(&self, id: &Uuid) -> Result<Option<ProjectRequest>, DomainError> {
    self.get_cloned(&self.project_requests, "project_requests", id)
  }

  fn list_project_requests(&self,
                           project_id: Option<Uuid>,
                           student_id: Option<Uuid>,
                           faculty_id: Option<Uuid>)
                           -> Result<Vec<ProjectRequest>, DomainError> {
    let requests = self.lock_map(&self.project_requests, "project_requests")?;
    let mut out: Vec<ProjectRequest> = requests.values()
                                               .filter(|r| project_id.map_or(true, |p| r.project_id == p))
                                               .filter(|r| student_id.map_or(true, |s| r.student_id == s))
                                               .filter(|r| faculty_id.map_or(true, |f| r.faculty_id == f))
                                               .cloned()
                                               .collect();
    out.sort_by(|a, b| b.request_date.cmp(&a.request_date));
    Ok(out)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::checkout::TransitionAuthority;
  use crate::inventory::ItemDraft;
  use crate::user::Role;
  use chrono::Utc;

  fn item(repo: &InMemoryCampusRepository, domain_id: Option<Uuid>) -> InventoryItem {
    let draft = ItemDraft { name: "Oscilloscope".into(),
                            description: "100MHz".into(),
                            category: "instruments".into(),
                            location: "Lab 1".into(),
                            total_quantity: 3,
                            domain_id,
                            ..Default::default() };
    let item = InventoryItem::new(InventoryKind::LabComponent, draft, "admin").unwrap();
    repo.save_item(&item).unwrap();
    item
  }

  #[test]
  fn duplicate_email_is_rejected() -> Result<(), DomainError> {
    let repo = InMemoryCampusRepository::new();
    repo.insert_user(&User::new("a@uni.edu", "A", Role::Student, "secret1")?)?;
    let err = repo.insert_user(&User::new("A@uni.edu", "B", Role::Faculty, "secret1")?).unwrap_err();
    assert!(matches!(err, DomainError::Duplicate(_)));
    assert!(repo.find_user_by_email(" A@UNI.EDU ")?.is_some());
    Ok(())
  }

  #[test]
  fn active_count_follows_request_status() -> Result<(), DomainError> {
    let repo = InMemoryCampusRepository::new();
    let it = item(&repo, None);
    let faculty = Uuid::new_v4();
    let pending = CheckoutRequest::new(InventoryKind::LabComponent, it.id, Uuid::new_v4(), None, None);
    repo.save_request(&pending)?;
    assert_eq!(repo.count_active_requests(&it.id)?, 0);
    let approved = pending.transition(RequestStatus::Approved, TransitionAuthority::Coordinator, faculty, Utc::now())?;
    repo.save_request(&approved)?;
    assert_eq!(repo.count_active_requests(&it.id)?, 1);
    assert_eq!(repo.count_active_requests(&it.id)?, 1);
    Ok(())
  }

  #[test]
  fn request_scope_filters_by_item_domain() -> Result<(), DomainError> {
    let repo = InMemoryCampusRepository::new();
    let d1 = Uuid::new_v4();
    let in_domain = item(&repo, Some(d1));
    let other = item(&repo, Some(Uuid::new_v4()));
    let unassigned = item(&repo, None);
    for it in [&in_domain, &other, &unassigned] {
      repo.save_request(&CheckoutRequest::new(InventoryKind::LabComponent, it.id, Uuid::new_v4(), None, None))?;
    }
    let mut filter = RequestFilter::kind(InventoryKind::LabComponent);
    filter.scope = Some(DomainScope { domain_ids: vec![d1], include_unassigned: false });
    assert_eq!(repo.list_requests(&filter)?.len(), 1);
    filter.scope = Some(DomainScope { domain_ids: vec![d1], include_unassigned: true });
    assert_eq!(repo.list_requests(&filter)?.len(), 2);
    assert!(repo.list_requests(&RequestFilter::kind(InventoryKind::LibraryItem))?.is_empty());
    Ok(())
  }

  #[test]
  fn delete_item_cascades_requests() -> Result<(), DomainError> {
    let repo = InMemoryCampusRepository::new();
    let it = item(&repo, None);
    let req = CheckoutRequest::new(InventoryKind::LabComponent, it.id, Uuid::new_v4(), None, None);
    repo.save_request(&req)?;
    assert!(repo.delete_item(&it.id)?);
    assert!(repo.get_request(&req.id)?.is_none());
    assert!(!repo.delete_item(&it.id)?);
    Ok(())
  }

  #[test]
  fn unique_pairs_are_enforced() -> Result<(), DomainError> {
    let repo = InMemoryCampusRepository::new();
    let (domain, faculty) = (Uuid::new_v4(), Uuid::new_v4());
    repo.insert_coordinator(&DomainCoordinator::new(domain, faculty, Uuid::new_v4()))?;
    let err = repo.insert_coordinator(&DomainCoordinator::new(domain, faculty, Uuid::new_v4())).unwrap_err();
    assert!(matches!(err, DomainError::Duplicate(_)));

    let (opp, student) = (Uuid::new_v4(), Uuid::new_v4());
    repo.insert_application(&OpportunityApplication::new(opp, student, "cv.pdf", "k1"))?;
    let err = repo.insert_application(&OpportunityApplication::new(opp, student, "cv.pdf", "k2")).unwrap_err();
    assert_eq!(err.message(), "Already applied to this opportunity.");

    let course = Uuid::new_v4();
    repo.insert_enrollment(&Enrollment::new(course, student, "A")?)?;
    assert!(repo.insert_enrollment(&Enrollment::new(course, student, "B")?).is_err());
    Ok(())
  }

  #[test]
  fn delete_project_cascades_requests() -> Result<(), DomainError> {
    use crate::project::{ProjectDraft, ProjectKind};
    let repo = InMemoryCampusRepository::new();
    let faculty = Uuid::new_v4();
    let draft = ProjectDraft { name: "Weather station".into(),
                               description: String::new(),
                               components_needed: vec![],
                               expected_completion_date: chrono::NaiveDate::from_ymd_opt(2026, 12, 1).unwrap() };
    let project = Project::new(draft, ProjectKind::FacultyAssigned, faculty)?;
    repo.save_project(&project)?;
    let request = ProjectRequest::new(project.id, Uuid::new_v4(), faculty, None);
    repo.save_project_request(&request)?;
    assert_eq!(repo.list_project_requests(None, None, Some(faculty))?.len(), 1);
    assert!(repo.list_project_requests(None, Some(faculty), None)?.is_empty());

    assert!(repo.delete_project(&project.id)?);
    assert!(repo.get_project_request(&request.id)?.is_none());
    assert!(!repo.delete_project(&project.id)?);
    Ok(())
  }

  #[test]
  fn poisoned_mutex_maps_to_external_error() {
    let repo = Arc::new(InMemoryCampusRepository::new());
    let r2 = repo.clone();
    let _ = std::thread::spawn(move || {
              let _guard = r2.users.lock().unwrap();
              panic!("poison");
            }).join();
    let err = repo.list_users().unwrap_err();
    assert!(matches!(err, DomainError::ExternalError(_)));
  }
}
