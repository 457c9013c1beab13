use chrono::{NaiveDate, Utc};
use cie_domain::{ApplicationStatus, CampusRepository, CheckoutRequest, Course, Domain, DomainCoordinator, DomainError,
                 DomainScope, Enrollment, FacultyProfile, InventoryItem, InventoryKind, ItemDraft, Opportunity,
                 OpportunityApplication, OpportunityDraft, Project, ProjectDraft, ProjectKind, ProjectRequest,
                 ProjectRequestStatus, ProjectStatus, RequestFilter, RequestStatus, ReviewTicket, Role,
                 StudentProfile, TicketAction, TicketKind, TransitionAuthority, User};
use cie_persistence::{new_from_env, DieselCampusRepository};
use std::path::PathBuf;
use uuid::Uuid;

// Base SQLite en un archivo temporal; se borra al salir del test.
struct TempDb {
  path: PathBuf,
  repo: DieselCampusRepository,
}

impl TempDb {
  fn new() -> Self {
    let path = std::env::temp_dir().join(format!("cie_test_{}.db", Uuid::new_v4()));
    let repo = DieselCampusRepository::new(path.to_str().unwrap()).expect("failed to create repo");
    Self { path, repo }
  }
}

impl Drop for TempDb {
  fn drop(&mut self) {
    let _ = std::fs::remove_file(&self.path);
  }
}

fn item(domain_id: Option<Uuid>) -> InventoryItem {
  let draft = ItemDraft { name: "Multimeter".into(),
                          description: "Digital".into(),
                          category: "instruments".into(),
                          location: "Rack B".into(),
                          total_quantity: 2,
                          domain_id,
                          purchase_value: Some(1200.5),
                          purchase_date: NaiveDate::from_ymd_opt(2025, 7, 1),
                          ..Default::default() };
  InventoryItem::new(InventoryKind::LabComponent, draft, "admin").unwrap()
}

#[test]
fn users_and_profiles_roundtrip() -> Result<(), DomainError> {
  if cfg!(feature = "pg") {
    eprintln!("skipping sqlite-only persistence test because 'pg' feature is enabled");
    return Ok(());
  }
  let db = TempDb::new();
  let user = User::new("prof@uni.edu", "Prof", Role::Faculty, "secret1")?;
  db.repo.insert_user(&user)?;
  let dup = User::new("prof@uni.edu", "Other", Role::Student, "secret1")?;
  assert!(matches!(db.repo.insert_user(&dup), Err(DomainError::Duplicate(_))));

  let got = db.repo.get_user(&user.id)?.expect("user");
  assert_eq!(got.email, "prof@uni.edu");
  assert_eq!(got.role, Role::Faculty);
  assert!(got.verify_password("secret1"));
  assert_eq!(db.repo.find_user_by_email("PROF@uni.edu")?.map(|u| u.id), Some(user.id));

  db.repo.save_faculty_profile(&FacultyProfile { user_id: user.id, department: Some("ECE".into()) })?;
  db.repo.save_faculty_profile(&FacultyProfile { user_id: user.id, department: None })?;
  assert_eq!(db.repo.get_faculty_profile(&user.id)?.unwrap().department, None);
  db.repo.save_student_profile(&StudentProfile { user_id: user.id,
                                                 student_number: Some("1XX21".into()),
                                                 program: None })?;
  assert_eq!(db.repo.get_student_profile(&user.id)?.unwrap().student_number.as_deref(), Some("1XX21"));
  Ok(())
}

#[test]
fn checkout_lifecycle_and_active_count() -> Result<(), DomainError> {
  if cfg!(feature = "pg") {
    return Ok(());
  }
  let db = TempDb::new();
  let domain = Domain::new("electronics", None)?;
  db.repo.save_domain(&domain)?;
  let it = item(Some(domain.id));
  db.repo.save_item(&it)?;
  let loaded = db.repo.get_item(&it.id)?.expect("item");
  assert_eq!(loaded.purchase_value, Some(1200.5));
  assert_eq!(loaded.purchase_date, NaiveDate::from_ymd_opt(2025, 7, 1));
  assert_eq!(loaded.domain_id, Some(domain.id));

  let faculty = Uuid::new_v4();
  let req = CheckoutRequest::new(InventoryKind::LabComponent, it.id, Uuid::new_v4(), Some("project".into()), None);
  db.repo.save_request(&req)?;
  assert_eq!(db.repo.count_active_requests(&it.id)?, 0);

  let approved = req.transition(RequestStatus::Approved, TransitionAuthority::Coordinator, faculty, Utc::now())?;
  db.repo.save_request(&approved)?;
  let stored = db.repo.get_request(&req.id)?.expect("request");
  assert_eq!(stored.status, RequestStatus::Approved);
  assert_eq!(stored.approved_by, Some(faculty));
  assert!(stored.approved_at.is_some());
  assert_eq!(db.repo.count_active_requests(&it.id)?, 1);

  let mut filter = RequestFilter::kind(InventoryKind::LabComponent);
  filter.scope = Some(DomainScope { domain_ids: vec![domain.id], include_unassigned: false });
  assert_eq!(db.repo.list_requests(&filter)?.len(), 1);
  filter.scope = Some(DomainScope { domain_ids: vec![Uuid::new_v4()], include_unassigned: true });
  assert!(db.repo.list_requests(&filter)?.is_empty());
  filter.scope = None;
  filter.status = Some(RequestStatus::Pending);
  assert!(db.repo.list_requests(&filter)?.is_empty());

  assert!(db.repo.delete_item(&it.id)?);
  assert!(db.repo.get_request(&req.id)?.is_none());
  Ok(())
}

#[test]
fn tickets_opportunities_and_unique_pairs() -> Result<(), DomainError> {
  if cfg!(feature = "pg") {
    return Ok(());
  }
  let db = TempDb::new();
  let author = Uuid::new_v4();
  let ticket = ReviewTicket::new(TicketKind::Insight, "Idea", "More benches", None, None, author)?;
  db.repo.save_ticket(&ticket)?;
  let approved = ticket.apply(TicketAction::Approve, Uuid::new_v4(), Utc::now())?;
  db.repo.save_ticket(&approved)?;
  let listed = db.repo.list_tickets(TicketKind::Insight, Some(author))?;
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].status, approved.status);
  assert!(db.repo.list_tickets(TicketKind::Feedback, None)?.is_empty());

  let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
  let opp = Opportunity::new(OpportunityDraft { title: "RA".into(),
                                                opportunity_type: "RESEARCH".into(),
                                                description: String::new(),
                                                start_date: d("2026-06-01"),
                                                end_date: d("2026-07-01"),
                                                application_start_date: d("2026-05-01"),
                                                application_end_date: d("2026-05-20"),
                                                remuneration: Some("stipend".into()),
                                                capacity: 1,
                                                faculty_id: Uuid::new_v4(),
                                                status: None })?;
  db.repo.save_opportunity(&opp)?;
  let stored = db.repo.get_opportunity(&opp.id)?.unwrap();
  assert_eq!(stored.start_date, d("2026-06-01"));
  assert!(!stored.accepted);
  db.repo.save_opportunity(&opp.accept(Utc::now()))?;
  let stored = db.repo.get_opportunity(&opp.id)?.unwrap();
  assert!(stored.accepted);
  assert!(stored.accepted_at.is_some());
  let student = Uuid::new_v4();
  let app = OpportunityApplication::new(opp.id, student, "cv.pdf", "resumes/x/1_cv.pdf");
  db.repo.insert_application(&app)?;
  let again = OpportunityApplication::new(opp.id, student, "cv.pdf", "resumes/x/2_cv.pdf");
  let err = db.repo.insert_application(&again).unwrap_err();
  assert_eq!(err, DomainError::Duplicate("Already applied to this opportunity.".into()));
  db.repo.update_application(&app.decide(ApplicationStatus::Accepted, Utc::now())?)?;
  assert_eq!(db.repo.count_applications(&opp.id, ApplicationStatus::Accepted)?, 1);
  assert!(db.repo.find_application(&opp.id, &student)?.is_some());
  assert!(db.repo.delete_opportunity(&opp.id)?);
  assert!(db.repo.get_application(&app.id)?.is_none());

  let domain = Domain::new("Library", None)?;
  db.repo.save_domain(&domain)?;
  let faculty = Uuid::new_v4();
  db.repo.insert_coordinator(&DomainCoordinator::new(domain.id, faculty, Uuid::new_v4()))?;
  let err = db.repo.insert_coordinator(&DomainCoordinator::new(domain.id, faculty, Uuid::new_v4())).unwrap_err();
  assert!(matches!(err, DomainError::Duplicate(_)));
  assert_eq!(db.repo.list_coordinators(None, Some(faculty))?.len(), 1);
  assert!(db.repo.delete_domain(&domain.id)?);
  assert!(db.repo.list_coordinators(Some(domain.id), None)?.is_empty());
  Ok(())
}

#[test]
fn courses_and_enrollments() -> Result<(), DomainError> {
  if cfg!(feature = "pg") {
    return Ok(());
  }
  let db = TempDb::new();
  let course = Course::new("cs101", "Intro", None, Uuid::new_v4())?;
  db.repo.save_course(&course)?;
  let clash = Course::new("CS101", "Other", None, Uuid::new_v4())?;
  assert!(matches!(db.repo.save_course(&clash), Err(DomainError::Duplicate(_))));

  let student = Uuid::new_v4();
  let enrollment = Enrollment::new(course.id, student, "A")?;
  db.repo.insert_enrollment(&enrollment)?;
  let err = db.repo.insert_enrollment(&Enrollment::new(course.id, student, "B")?).unwrap_err();
  assert_eq!(err.message(), "Already enrolled in this course");
  db.repo.update_enrollment(&enrollment.with_grade("A+")?)?;
  assert_eq!(db.repo.get_enrollment(&enrollment.id)?.unwrap().grade.as_deref(), Some("A+"));
  assert_eq!(db.repo.list_enrollments(Some(course.id), None)?.len(), 1);
  Ok(())
}

#[test]
fn projects_and_requests_roundtrip() -> Result<(), DomainError> {
  let db = TempDb::new();
  let repo = &db.repo;
  let (student, faculty) = (Uuid::new_v4(), Uuid::new_v4());
  let components = vec![Uuid::new_v4(), Uuid::new_v4()];
  let draft = ProjectDraft { name: "Line follower".into(),
                             description: "robot".into(),
                             components_needed: components.clone(),
                             expected_completion_date: NaiveDate::from_ymd_opt(2026, 12, 1).unwrap() };
  let project = Project::new(draft, ProjectKind::StudentProposed, student)?;
  repo.save_project(&project)?;
  let got = repo.get_project(&project.id)?.expect("project");
  assert_eq!(got.components_needed, components);
  assert_eq!(got.kind, ProjectKind::StudentProposed);
  assert_eq!(got.modified_by, None);

  let request = ProjectRequest::new(project.id, student, faculty, Some("please".into()));
  repo.save_project_request(&request)?;
  let approved = request.decide(ProjectRequestStatus::Approved, Some("ok".into()), Utc::now())?;
  repo.save_project_request(&approved)?;
  repo.save_project(&project.follow_decision(approved.status, faculty, Utc::now()))?;

  let listed = repo.list_project_requests(Some(project.id), None, Some(faculty))?;
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].status, ProjectRequestStatus::Approved);
  assert!(listed[0].accepted_date.is_some());
  assert_eq!(listed[0].faculty_notes.as_deref(), Some("ok"));
  assert_eq!(repo.get_project(&project.id)?.expect("project").status, ProjectStatus::Ongoing);

  assert!(repo.delete_project(&project.id)?);
  assert!(repo.get_project_request(&request.id)?.is_none());
  assert!(repo.list_projects()?.is_empty());
  Ok(())
}

#[test]
fn repo_from_env_uses_cie_db_url() -> Result<(), DomainError> {
  if cfg!(feature = "pg") {
    return Ok(());
  }
  let path = std::env::temp_dir().join(format!("cie_env_{}.db", Uuid::new_v4()));
  std::env::set_var("CIE_DB_URL", path.to_str().unwrap());
  let repo = new_from_env()?;
  assert!(repo.list_users()?.is_empty());
  assert!(path.exists());
  drop(repo);
  let _ = std::fs::remove_file(path);
  Ok(())
}
