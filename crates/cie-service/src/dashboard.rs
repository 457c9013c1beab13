// Archivo: dashboard.rs
// Propósito: contadores de resumen para el tablero de cada rol.
use crate::coordinators::faculty_scope;
use crate::errors::Result;
use crate::gate::Caller;
use cie_domain::{ApplicationStatus, CampusRepository, InventoryKind, RequestFilter, RequestStatus, Role, TicketKind,
                 TicketStatus};
use serde::Serialize;
use std::sync::Arc;

const KINDS: [InventoryKind; 2] = [InventoryKind::LabComponent, InventoryKind::LibraryItem];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminDashboard {
  pub total_users: usize,
  pub faculty: usize,
  pub students: usize,
  pub lab_components: usize,
  pub library_items: usize,
  pub pending_requests: usize,
  pub pending_tickets: usize,
  pub open_opportunities: usize,
  pub courses: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacultyDashboard {
  pub courses: usize,
  pub enrolled_students: usize,
  pub pending_requests: usize,
  pub coordinated_domains: usize,
  pub opportunities: usize,
  pub pending_applications: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentDashboard {
  pub enrollments: usize,
  pub active_requests: usize,
  pub pending_requests: usize,
  /// Solicitudes cerradas (rechazadas o devueltas).
  pub closed_requests: usize,
  pub applications: usize,
  pub accepted_applications: usize,
  pub open_tickets: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "UPPERCASE")]
pub enum Dashboard {
  Admin(AdminDashboard),
  Faculty(FacultyDashboard),
  Student(StudentDashboard),
}

pub struct DashboardService {
  repo: Arc<dyn CampusRepository>,
}

impl DashboardService {
  pub fn new(repo: Arc<dyn CampusRepository>) -> Self {
    Self { repo }
  }

  pub fn summary(&self, caller: &Caller) -> Result<Dashboard> {
    match caller.role() {
      Role::Admin => self.admin().map(Dashboard::Admin),
      Role::Faculty => self.faculty(caller).map(Dashboard::Faculty),
      Role::Student => self.student(caller).map(Dashboard::Student),
    }
  }

  fn pending(&self, mut filter: RequestFilter) -> Result<usize> {
    filter.status = Some(RequestStatus::Pending);
    Ok(self.repo.list_requests(&filter)?.len())
  }

  fn admin(&self) -> Result<AdminDashboard> {
    let users = self.repo.list_users()?;
    let mut pending_requests = 0;
    for kind in KINDS {
      pending_requests += self.pending(RequestFilter::kind(kind))?;
    }
    let mut pending_tickets = 0;
    for kind in [TicketKind::Feedback, TicketKind::Insight] {
      pending_tickets += self.repo.list_tickets(kind, None)?.iter().filter(|t| t.status == TicketStatus::Pending).count();
    }
    Ok(AdminDashboard { total_users: users.len(),
                        faculty: users.iter().filter(|u| u.role == Role::Faculty).count(),
                        students: users.iter().filter(|u| u.role == Role::Student).count(),
                        lab_components: self.repo.list_items(InventoryKind::LabComponent)?.len(),
                        library_items: self.repo.list_items(InventoryKind::LibraryItem)?.len(),
                        pending_requests,
                        pending_tickets,
                        open_opportunities: self.repo.list_opportunities()?.iter().filter(|o| o.is_open()).count(),
                        courses: self.repo.list_courses()?.len() })
  }

  fn faculty(&self, caller: &Caller) -> Result<FacultyDashboard> {
    let courses: Vec<_> = self.repo.list_courses()?.into_iter().filter(|c| c.faculty_id == caller.id()).collect();
    let mut enrolled_students = 0;
    for c in &courses {
      enrolled_students += self.repo.list_enrollments(Some(c.id), None)?.len();
    }
    let scope = faculty_scope(self.repo.as_ref(), caller.id())?;
    let mut pending_requests = 0;
    for kind in KINDS {
      let mut filter = RequestFilter::kind(kind);
      filter.scope = Some(scope.clone());
      pending_requests += self.pending(filter)?;
    }
    let opportunities: Vec<_> =
      self.repo.list_opportunities()?.into_iter().filter(|o| o.faculty_id == caller.id()).collect();
    let mut pending_applications = 0;
    for o in &opportunities {
      pending_applications += self.repo.count_applications(&o.id, ApplicationStatus::Pending)? as usize;
    }
    Ok(FacultyDashboard { courses: courses.len(),
                          enrolled_students,
                          pending_requests,
                          coordinated_domains: scope.domain_ids.len(),
                          opportunities: opportunities.len(),
                          pending_applications })
  }

  fn student(&self, caller: &Caller) -> Result<StudentDashboard> {
    let mut active_requests = 0;
    let mut pending_requests = 0;
    let mut closed_requests = 0;
    for kind in KINDS {
      let mut filter = RequestFilter::kind(kind);
      filter.student_id = Some(caller.id());
      let requests = self.repo.list_requests(&filter)?;
      active_requests += requests.iter().filter(|r| r.status.is_active()).count();
      pending_requests += requests.iter().filter(|r| r.status == RequestStatus::Pending).count();
      closed_requests += requests.iter().filter(|r| r.status.is_terminal()).count();
    }
    let applications = self.repo.list_applications(None, Some(caller.id()))?;
    let mut open_tickets = 0;
    for kind in [TicketKind::Feedback, TicketKind::Insight] {
      open_tickets += self.repo
                          .list_tickets(kind, Some(caller.id()))?
                          .iter()
                          .filter(|t| !matches!(t.status, TicketStatus::Completed | TicketStatus::Rejected))
                          .count();
    }
    Ok(StudentDashboard { enrollments: self.repo.list_enrollments(None, Some(caller.id()))?.len(),
                          active_requests,
                          pending_requests,
                          closed_requests,
                          applications: applications.len(),
                          accepted_applications: applications.iter()
                                                             .filter(|a| a.status == ApplicationStatus::Accepted)
                                                             .count(),
                          open_tickets })
  }
}
