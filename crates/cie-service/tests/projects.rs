mod common;

use chrono::NaiveDate;
use cie_domain::{InventoryKind, ProjectDraft, ProjectKind, ProjectRequestStatus, ProjectStatus, Role};
use cie_service::{AssignCoordinator, Caller, NewProjectRequest, ProjectReview};
use common::Campus;
use uuid::Uuid;

fn draft(name: &str, components: Vec<Uuid>) -> ProjectDraft {
  ProjectDraft { name: name.into(),
                 description: "lab project".into(),
                 components_needed: components,
                 expected_completion_date: NaiveDate::from_ymd_opt(2026, 12, 15).unwrap() }
}

fn lab_coordinator(c: &Campus, admin: &Caller) -> Caller {
  let coordinator = c.user(Role::Faculty, "Coord");
  c.services
   .coordinators
   .assign(admin,
           AssignCoordinator { faculty_id: coordinator.id(),
                               domain_id: None,
                               domain_name: Some("Lab Components".into()) })
   .unwrap();
  coordinator
}

fn request(project_id: Uuid, faculty_id: Option<Uuid>) -> NewProjectRequest {
  NewProjectRequest { project_id, faculty_id, student_notes: Some("I'd like to join".into()) }
}

#[test]
fn faculty_project_needs_lab_coordinator_before_requests() {
  let c = Campus::new();
  let admin = c.user(Role::Admin, "Admin");
  let faculty = c.user(Role::Faculty, "Luis");
  let student = c.user(Role::Student, "Ana");
  let coordinator = lab_coordinator(&c, &admin);
  let component = c.item(&admin, InventoryKind::LabComponent, 3, None);

  let project = c.services.projects.create(&faculty, draft("Line follower", vec![component, component])).unwrap();
  assert_eq!(project.kind, ProjectKind::FacultyAssigned);
  assert_eq!(project.status, ProjectStatus::Pending);
  assert_eq!(project.components_needed, vec![component]);

  // pendiente: el estudiante no lo ve ni puede pedirlo
  assert!(c.services.projects.list(&student).unwrap().is_empty());
  assert_eq!(c.services.projects.get(&student, project.id).unwrap_err().status_code(), 403);
  assert_eq!(c.services.projects.create_request(&student, request(project.id, None)).unwrap_err().status_code(),
             400);

  // sólo coordinadores de Lab Components revisan
  assert_eq!(c.services.projects.pending_reviews(&faculty).unwrap_err().status_code(), 403);
  assert_eq!(c.services.projects.pending_reviews(&admin).unwrap_err().status_code(), 403);
  let pending = c.services.projects.pending_reviews(&coordinator).unwrap();
  assert_eq!(pending.len(), 1);
  assert_eq!(pending[0].components_needed_details.len(), 1);
  assert_eq!(pending[0].creator_name, "Luis");

  let bad = ProjectReview { project_id: project.id, status: "COMPLETED".into() };
  assert_eq!(c.services.projects.review(&coordinator, bad).unwrap_err().status_code(), 400);
  let unknown = ProjectReview { project_id: Uuid::new_v4(), status: "ONGOING".into() };
  assert_eq!(c.services.projects.review(&coordinator, unknown).unwrap_err().status_code(), 404);
  let ongoing = c.services
                 .projects
                 .review(&coordinator, ProjectReview { project_id: project.id, status: "ongoing".into() })
                 .unwrap();
  assert_eq!(ongoing.status, ProjectStatus::Ongoing);
  assert_eq!(ongoing.modified_by, Some(coordinator.id()));
  assert!(c.services.projects.pending_reviews(&coordinator).unwrap().is_empty());

  // en curso: la solicitud va al docente creador
  let req = c.services.projects.create_request(&student, request(project.id, Some(Uuid::new_v4()))).unwrap();
  assert_eq!(req.faculty_id, faculty.id());
  assert_eq!(c.services.projects.create_request(&student, request(project.id, None)).unwrap_err().status_code(),
             400);
  assert_eq!(c.services.projects.list(&student).unwrap().len(), 1);

  let other = c.user(Role::Faculty, "Marta");
  assert_eq!(c.services.projects.decide_request(&other, req.id, "APPROVED", None).unwrap_err().status_code(), 403);
  assert_eq!(c.services.projects.decide_request(&faculty, req.id, "DONE", None).unwrap_err().status_code(), 400);
  let rejected = c.services.projects.decide_request(&faculty, req.id, "REJECTED", Some("full".into())).unwrap();
  assert_eq!(rejected.request.status, ProjectRequestStatus::Rejected);
  assert!(rejected.request.rejected_date.is_some());
  assert_eq!(rejected.student_name, "Ana");
  // rechazar a un estudiante no cierra un proyecto docente
  assert_eq!(c.services.projects.get(&faculty, project.id).unwrap().project.status, ProjectStatus::Ongoing);
  assert_eq!(c.services.projects.decide_request(&faculty, req.id, "APPROVED", None).unwrap_err().status_code(),
             400);

  // rechazada, puede volver a pedirlo
  c.services.projects.create_request(&student, request(project.id, None)).unwrap();
}

#[test]
fn student_proposal_follows_the_faculty_decision() {
  let c = Campus::new();
  let faculty = c.user(Role::Faculty, "Luis");
  let student = c.user(Role::Student, "Ana");
  let classmate = c.user(Role::Student, "Beto");

  let project = c.services.projects.create(&student, draft("Weather station", vec![])).unwrap();
  assert_eq!(project.kind, ProjectKind::StudentProposed);

  assert_eq!(c.services.projects.create_request(&classmate, request(project.id, Some(faculty.id())))
                                .unwrap_err()
                                .status_code(),
             403);
  assert_eq!(c.services.projects.create_request(&student, request(project.id, None)).unwrap_err().status_code(),
             400);
  assert_eq!(c.services.projects.create_request(&student, request(project.id, Some(classmate.id())))
                                .unwrap_err()
                                .status_code(),
             400);

  let req = c.services.projects.create_request(&student, request(project.id, Some(faculty.id()))).unwrap();
  assert_eq!(c.services.projects.list_requests(&faculty).unwrap().len(), 1);
  assert_eq!(c.services.projects.list_requests(&student).unwrap().len(), 1);
  assert!(c.services.projects.list_requests(&classmate).unwrap().is_empty());
  // el docente ve el proyecto por la solicitud dirigida a él
  assert_eq!(c.services.projects.get(&faculty, project.id).unwrap().project.id, project.id);
  assert_eq!(c.services.projects.get(&classmate, project.id).unwrap_err().status_code(), 403);

  let approved = c.services.projects.decide_request(&faculty, req.id, "APPROVED", Some("go".into())).unwrap();
  assert!(approved.request.accepted_date.is_some());
  assert_eq!(approved.request.faculty_notes.as_deref(), Some("go"));
  let after = c.services.projects.get(&student, project.id).unwrap().project;
  assert_eq!(after.status, ProjectStatus::Ongoing);
  assert_eq!(after.modified_by, Some(faculty.id()));
}

#[test]
fn creation_and_deletion_rules() {
  let c = Campus::new();
  let admin = c.user(Role::Admin, "Admin");
  let faculty = c.user(Role::Faculty, "Luis");
  let student = c.user(Role::Student, "Ana");
  let book = c.item(&admin, InventoryKind::LibraryItem, 1, None);

  assert_eq!(c.services.projects.create(&admin, draft("Admin project", vec![])).unwrap_err().status_code(), 403);
  assert_eq!(c.services.projects.create(&faculty, draft("Books", vec![book])).unwrap_err().status_code(), 400);
  assert_eq!(c.services.projects.create(&faculty, draft("  ", vec![])).unwrap_err().status_code(), 400);

  let project = c.services.projects.create(&student, draft("Drone", vec![])).unwrap();
  c.services.projects.create_request(&student, request(project.id, Some(faculty.id()))).unwrap();
  assert_eq!(c.services.projects.delete(&faculty, project.id).unwrap_err().status_code(), 403);
  c.services.projects.delete(&student, project.id).unwrap();
  assert!(c.services.projects.list_requests(&admin).unwrap().is_empty());
  assert_eq!(c.services.projects.delete(&admin, project.id).unwrap_err().status_code(), 404);
}
