mod common;

use cie_domain::{InventoryKind, ItemDraft, Role, TicketKind, TicketStatus};
use cie_service::{AssignCoordinator, Dashboard, ImageUpload, NewCourse, NewEnrollment, NewTicket, NewUser, TicketUpdate};
use common::Campus;

#[test]
fn gate_resolves_identity_and_checks_roles() {
  let c = Campus::new();
  let student = c.user(Role::Student, "Stu");
  assert_eq!(c.services.gate.resolve(None).unwrap_err().status_code(), 401);
  assert_eq!(c.services.gate.resolve(Some("not-a-uuid")).unwrap_err().status_code(), 401);
  assert_eq!(c.services.gate.resolve(Some(&uuid::Uuid::new_v4().to_string())).unwrap_err().status_code(), 401);
  let id = student.id().to_string();
  assert_eq!(c.services.gate.resolve(Some(&id)).unwrap().id(), student.id());
  assert_eq!(c.services.gate.require(Some(&id), &[Role::Admin]).unwrap_err().status_code(), 403);
}

#[test]
fn admin_creates_users_with_profiles() {
  let c = Campus::new();
  let admin = c.user(Role::Admin, "Admin");
  let input = NewUser { email: "NEW.Prof@Uni.edu".into(),
                        name: "New Prof".into(),
                        role: "faculty".into(),
                        password: "secret1".into(),
                        department: Some("ECE".into()),
                        student_number: None,
                        program: None };
  let created = c.services.users.create_user(&admin, input.clone()).unwrap();
  assert_eq!(created.user.role, Role::Faculty);
  assert_eq!(created.faculty.as_ref().and_then(|f| f.department.as_deref()), Some("ECE"));
  assert_eq!(c.services.users.create_user(&admin, input).unwrap_err().status_code(), 400);

  let json = serde_json::to_value(&created).unwrap();
  assert!(json.get("password_hash").is_none());
  assert_eq!(c.services.users.list_users(&admin, Some("FACULTY")).unwrap().len(), 1);
  let prof = cie_service::Caller { user: created.user };
  assert_eq!(c.services.users.list_users(&prof, None).unwrap_err().status_code(), 403);
  assert!(c.services.users.me(&prof).unwrap().faculty.is_some());

  assert!(c.services.users.bootstrap_admin("root@uni.edu", "secret1").unwrap());
  assert!(!c.services.users.bootstrap_admin("root@uni.edu", "secret1").unwrap());
}

#[test]
fn duplicate_coordinator_is_rejected_and_domain_in_use_conflicts() {
  let c = Campus::new();
  let admin = c.user(Role::Admin, "Admin");
  let faculty = c.user(Role::Faculty, "Prof");
  let student = c.user(Role::Student, "Stu");
  let assign = || AssignCoordinator { faculty_id: faculty.id(), domain_id: None, domain_name: Some("Library".into()) };

  let first = c.services.coordinators.assign(&admin, assign()).unwrap();
  let err = c.services.coordinators.assign(&admin, assign()).unwrap_err();
  assert_eq!(err.status_code(), 400);
  assert_eq!(err.public_message(), "This faculty is already a coordinator for this domain");

  let not_faculty = AssignCoordinator { faculty_id: student.id(), domain_id: None, domain_name: Some("Lab".into()) };
  assert_eq!(c.services.coordinators.assign(&admin, not_faculty).unwrap_err().public_message(),
             "User is not a faculty member");

  let check = c.services.coordinators.check(&faculty).unwrap();
  assert!(check.is_coordinator);
  assert_eq!(check.domains[0].name, "Library");

  let domain_id = first.assignment.domain_id;
  c.item(&admin, InventoryKind::LibraryItem, 1, Some(domain_id));
  let summaries = c.services.coordinators.list_domains().unwrap();
  assert_eq!(summaries[0].item_count, 1);
  assert_eq!(summaries[0].coordinators.len(), 1);
  assert_eq!(c.services.coordinators.delete_domain(&admin, domain_id).unwrap_err().status_code(), 409);

  c.services.coordinators.remove_assignment(&admin, first.assignment.id).unwrap();
  assert_eq!(c.services.coordinators.remove_assignment(&admin, first.assignment.id).unwrap_err().status_code(), 404);
  assert!(c.services.coordinators.list_assignments(&admin).unwrap().is_empty());
}

#[test]
fn inventory_categories_and_csv_import() {
  let c = Campus::new();
  let admin = c.user(Role::Admin, "Admin");
  let faculty = c.user(Role::Faculty, "Prof");
  let draft = ItemDraft { name: "Arduino".into(),
                          description: "Board".into(),
                          category: "micro controllers".into(),
                          location: "Rack A".into(),
                          total_quantity: 2,
                          tag_id: Some("LAB-1".into()),
                          ..Default::default() };
  c.services.inventory.create(&admin, InventoryKind::LabComponent, draft).unwrap();
  assert_eq!(c.services.inventory.categories(InventoryKind::LabComponent).unwrap(), vec!["Micro Controllers"]);
  assert_eq!(c.services.inventory.add_category(&admin, InventoryKind::LabComponent, "micro controllers")
                                 .unwrap_err()
                                 .status_code(),
             409);
  assert_eq!(c.services.inventory.add_category(&admin, InventoryKind::LabComponent, "sensors").unwrap(), "Sensors");
  assert_eq!(c.services.inventory.remove_category(&admin, InventoryKind::LabComponent, "Micro Controllers")
                                 .unwrap_err()
                                 .status_code(),
             409);
  assert_eq!(c.services.inventory.remove_category(&admin, InventoryKind::LabComponent, " micro controllers")
                                 .unwrap_err()
                                 .status_code(),
             409);

  let csv = "component_name,component_description,component_quantity,component_category,component_location,\
             component_tag_id\n\
             Arduino,Board,3,micro controllers,Rack A,LAB-1\n\
             Servo,Motor,4,motors,Rack B,\n\
             Relay,Module,abc,modules,Rack C,\n";
  let report =
    c.services.inventory.import_csv(&faculty, InventoryKind::LabComponent, "stock.csv", csv.as_bytes()).unwrap();
  assert_eq!(report.total_rows, 3);
  assert_eq!(report.processed, 2);
  assert_eq!(report.errors, 1);
  assert_eq!(report.processed_items[0].action, "updated");
  assert_eq!(report.processed_items[1].action, "created");

  let items = c.services.inventory.list(InventoryKind::LabComponent).unwrap();
  let arduino = items.iter().find(|i| i.item.name == "Arduino").unwrap();
  assert_eq!(arduino.item.total_quantity, 5);
  assert_eq!(arduino.available_quantity, 5);
  assert_eq!(c.services.inventory.import_csv(&faculty, InventoryKind::LabComponent, "stock.txt", csv.as_bytes())
                                 .unwrap_err()
                                 .status_code(),
             400);

  let exported = c.services.inventory.export_csv(&admin, InventoryKind::LabComponent).unwrap();
  let text = String::from_utf8(exported).unwrap();
  assert!(text.starts_with("component_name,"));
  assert_eq!(text.lines().count(), 3);
}

#[test]
fn ticket_workflow_with_rectified_image() {
  let c = Campus::new();
  let admin = c.user(Role::Admin, "Admin");
  let student = c.user(Role::Student, "Stu");
  let other = c.user(Role::Student, "Other");
  let ticket = c.services
                .tickets
                .create(&student,
                        TicketKind::Feedback,
                        NewTicket { title: "Broken tap".into(),
                                    description: "Lab 2".into(),
                                    category: None,
                                    image: None })
                .unwrap();
  assert_eq!(c.services.tickets.list(&other, TicketKind::Feedback).unwrap().len(), 0);
  assert_eq!(c.services.tickets.get(&other, TicketKind::Feedback, ticket.id).unwrap_err().status_code(), 403);

  let act = |action: &str, reason: Option<&str>, image: Option<String>| TicketUpdate { action: action.into(),
                                                                                       reason: reason.map(Into::into),
                                                                                       rectified_image: image };
  let err = c.services.tickets.apply(&student, TicketKind::Feedback, ticket.id, act("approve", None, None)).unwrap_err();
  assert_eq!(err.status_code(), 403);
  let err = c.services.tickets.apply(&admin, TicketKind::Feedback, ticket.id, act("explode", None, None)).unwrap_err();
  assert_eq!(err.public_message(), "Invalid action");

  c.services.tickets.apply(&admin, TicketKind::Feedback, ticket.id, act("approve", None, None)).unwrap();
  c.services.tickets.apply(&admin, TicketKind::Feedback, ticket.id, act("start", None, None)).unwrap();
  let key = c.services
             .tickets
             .upload_image(&admin,
                           TicketKind::Feedback,
                           ImageUpload { file_name: "fixed tap.png".into(),
                                         content_type: Some("image/png".into()),
                                         bytes: vec![1, 2, 3] })
             .unwrap();
  assert!(key.starts_with("feedback-images/"));
  let done = c.services.tickets.apply(&admin, TicketKind::Feedback, ticket.id, act("done", None, Some(key))).unwrap();
  assert_eq!(done.status, TicketStatus::Done);
  let err = c.services.tickets.apply(&admin, TicketKind::Feedback, ticket.id, act("reject", Some("  "), None)).unwrap_err();
  assert_eq!(err.public_message(), "Rejection reason is required.");
  let rejected =
    c.services.tickets.apply(&admin, TicketKind::Feedback, ticket.id, act("reject", Some("still leaks"), None)).unwrap();
  assert_eq!(rejected.rejection_reason.as_deref(), Some("still leaks"));
}

#[test]
fn only_the_course_owner_grades() {
  let c = Campus::new();
  let admin = c.user(Role::Admin, "Admin");
  let owner = c.user(Role::Faculty, "Owner");
  let other = c.user(Role::Faculty, "Other");
  let student = c.user(Role::Student, "Stu");
  let course = c.services
                .enrollments
                .create_course(&owner, NewCourse { code: "cs101".into(), name: "Intro".into(), description: None, faculty_id: None })
                .unwrap();
  assert_eq!(course.code, "CS101");
  let enrollment = c.services
                    .enrollments
                    .enroll(&student, NewEnrollment { course_id: course.id, section: "A".into() })
                    .unwrap();
  let again = c.services.enrollments.enroll(&student, NewEnrollment { course_id: course.id, section: "A".into() });
  assert_eq!(again.unwrap_err().public_message(), "Already enrolled in this course");

  let id = enrollment.enrollment.id;
  assert_eq!(c.services.enrollments.grade(&other, id, Some("A")).unwrap_err().status_code(), 403);
  assert_eq!(c.services.enrollments.grade(&admin, id, Some("A")).unwrap_err().status_code(), 403);
  assert_eq!(c.services.enrollments.grade(&owner, id, None).unwrap_err().status_code(), 400);
  let graded = c.services.enrollments.grade(&owner, id, Some("A+")).unwrap();
  assert_eq!(graded.enrollment.grade.as_deref(), Some("A+"));

  assert_eq!(c.services.enrollments.list_enrollments(&owner).unwrap().len(), 1);
  assert!(c.services.enrollments.list_enrollments(&other).unwrap().is_empty());
  assert_eq!(c.services.enrollments.list_enrollments(&admin).unwrap().len(), 1);
}

#[test]
fn dashboards_are_per_role() {
  let c = Campus::new();
  let admin = c.user(Role::Admin, "Admin");
  let faculty = c.user(Role::Faculty, "Prof");
  let student = c.user(Role::Student, "Stu");
  let item = c.item(&admin, InventoryKind::LabComponent, 2, None);
  c.services
   .checkout
   .create(&student, InventoryKind::LabComponent, cie_service::NewCheckout { item_id: item, purpose: None, notes: None })
   .unwrap();
  let declined = c.services
                  .checkout
                  .create(&student,
                          InventoryKind::LabComponent,
                          cie_service::NewCheckout { item_id: item, purpose: None, notes: None })
                  .unwrap();
  c.services
   .checkout
   .update_status(&faculty, InventoryKind::LabComponent, declined.request.id, "REJECTED", None)
   .unwrap();

  match c.services.dashboard.summary(&admin).unwrap() {
    Dashboard::Admin(d) => {
      assert_eq!(d.total_users, 3);
      assert_eq!(d.lab_components, 1);
      assert_eq!(d.pending_requests, 1);
    }
    other => panic!("unexpected dashboard {:?}", other),
  }
  match c.services.dashboard.summary(&faculty).unwrap() {
    Dashboard::Faculty(d) => assert_eq!(d.pending_requests, 1),
    other => panic!("unexpected dashboard {:?}", other),
  }
  let json = serde_json::to_value(c.services.dashboard.summary(&student).unwrap()).unwrap();
  assert_eq!(json["role"], "STUDENT");
  assert_eq!(json["pending_requests"], 1);
  assert_eq!(json["closed_requests"], 1);
}
