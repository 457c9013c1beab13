mod common;

use cie_domain::{ApplicationStatus, OpportunityStatus, Role};
use cie_service::ResumeUpload;
use common::{opportunity_draft, Campus};

fn pdf(name: &str) -> ResumeUpload {
  ResumeUpload { file_name: name.to_string(),
                 content_type: Some("application/pdf".into()),
                 bytes: b"%PDF-1.4 resume".to_vec() }
}

#[test]
fn second_application_is_rejected() {
  let c = Campus::new();
  let admin = c.user(Role::Admin, "Admin");
  let faculty = c.user(Role::Faculty, "Prof");
  let student = c.user(Role::Student, "Stu");
  let opp = c.published(&admin, &faculty, opportunity_draft(faculty.id(), 2));

  let app = c.services.opportunities.apply(&student, opp.id, pdf("cv.pdf")).unwrap();
  assert_eq!(app.status, ApplicationStatus::Pending);
  assert!(app.resume_key.starts_with(&format!("resumes/{}/", opp.id)));
  assert_eq!(c.blobs.len(), 1);

  let err = c.services.opportunities.apply(&student, opp.id, pdf("cv2.pdf")).unwrap_err();
  assert_eq!(err.status_code(), 400);
  assert_eq!(err.public_message(), "Already applied to this opportunity.");
  assert_eq!(c.blobs.len(), 1);
}

#[test]
fn only_open_opportunities_accept_pdf_resumes() {
  let c = Campus::new();
  let admin = c.user(Role::Admin, "Admin");
  let faculty = c.user(Role::Faculty, "Prof");
  let student = c.user(Role::Student, "Stu");
  let opp = c.published(&admin, &faculty, opportunity_draft(faculty.id(), 1));

  let word = ResumeUpload { content_type: Some("application/msword".into()), ..pdf("cv.doc") };
  assert_eq!(c.services.opportunities.apply(&student, opp.id, word).unwrap_err().public_message(),
             "Only PDF files are allowed");

  let mut closed = opportunity_draft(faculty.id(), 1);
  closed.status = Some(OpportunityStatus::Closed);
  let closed = c.published(&admin, &faculty, closed);
  assert_eq!(c.services.opportunities.apply(&student, closed.id, pdf("cv.pdf")).unwrap_err().status_code(), 400);
  assert_eq!(c.services.opportunities.apply(&faculty, opp.id, pdf("cv.pdf")).unwrap_err().status_code(), 403);
}

#[test]
fn owning_faculty_decides_within_capacity() {
  let c = Campus::new();
  let admin = c.user(Role::Admin, "Admin");
  let owner = c.user(Role::Faculty, "Owner");
  let other = c.user(Role::Faculty, "Other");
  let s1 = c.user(Role::Student, "S1");
  let s2 = c.user(Role::Student, "S2");
  let opp = c.published(&admin, &owner, opportunity_draft(owner.id(), 1));
  let a1 = c.services.opportunities.apply(&s1, opp.id, pdf("a.pdf")).unwrap();
  let a2 = c.services.opportunities.apply(&s2, opp.id, pdf("b.pdf")).unwrap();

  assert_eq!(c.services.opportunities.update_application_status(&other, a1.id, "ACCEPTED").unwrap_err().status_code(),
             403);
  let accepted = c.services.opportunities.update_application_status(&owner, a1.id, "approved").unwrap();
  assert_eq!(accepted.application.status, ApplicationStatus::Accepted);
  assert_eq!(c.services.opportunities.update_application_status(&owner, a2.id, "ACCEPTED").unwrap_err().status_code(),
             409);
  assert_eq!(c.services.opportunities.update_application_status(&admin, a1.id, "REJECTED").unwrap_err().status_code(),
             400);
  c.services.opportunities.update_application_status(&admin, a2.id, "REJECTED").unwrap();

  let listed = c.services.opportunities.list_applications(&owner, opp.id).unwrap();
  assert_eq!(listed.len(), 2);
  assert!(c.services.opportunities.list_applications(&other, opp.id).is_err());
}

#[test]
fn listing_is_filtered_by_role() {
  let c = Campus::new();
  let admin = c.user(Role::Admin, "Admin");
  let owner = c.user(Role::Faculty, "Owner");
  let other = c.user(Role::Faculty, "Other");
  let student = c.user(Role::Student, "Stu");
  let open = c.published(&admin, &owner, opportunity_draft(owner.id(), 3));
  c.published(&admin, &other, opportunity_draft(other.id(), 3));
  c.services.opportunities.create(&admin, opportunity_draft(other.id(), 3)).unwrap();

  let app = c.services.opportunities.apply(&student, open.id, pdf("cv.pdf")).unwrap();
  c.services.opportunities.update_application_status(&owner, app.id, "ACCEPTED").unwrap();
  let mut closing = opportunity_draft(owner.id(), 3);
  closing.status = Some(OpportunityStatus::Closed);
  c.services.opportunities.update(&admin, open.id, closing).unwrap();

  assert_eq!(c.services.opportunities.list(&admin).unwrap().len(), 3);
  assert_eq!(c.services.opportunities.list(&owner).unwrap().len(), 1);
  assert_eq!(c.services.opportunities.list(&other).unwrap().len(), 2);
  let visible = c.services.opportunities.list(&student).unwrap();
  assert_eq!(visible.len(), 2);
  let mine = visible.iter().find(|v| v.opportunity.id == open.id).unwrap();
  assert_eq!(mine.my_status, Some(ApplicationStatus::Accepted));
  assert_eq!(c.services.opportunities.my_applications(&student).unwrap().len(), 1);
}

#[test]
fn resume_is_visible_to_applicant_owner_and_admin() {
  let c = Campus::new();
  let admin = c.user(Role::Admin, "Admin");
  let owner = c.user(Role::Faculty, "Owner");
  let other = c.user(Role::Faculty, "Other");
  let student = c.user(Role::Student, "Stu");
  let intruder = c.user(Role::Student, "Intruder");
  let opp = c.published(&admin, &owner, opportunity_draft(owner.id(), 1));
  let app = c.services.opportunities.apply(&student, opp.id, pdf("cv.pdf")).unwrap();

  for who in [&student, &owner, &admin] {
    let blob = c.services.opportunities.resume(who, app.id).unwrap();
    assert_eq!(blob.content_type.as_deref(), Some("application/pdf"));
  }
  assert_eq!(c.services.opportunities.resume(&other, app.id).unwrap_err().status_code(), 403);
  assert_eq!(c.services.opportunities.resume(&intruder, app.id).unwrap_err().status_code(), 403);

  c.services.opportunities.delete(&admin, opp.id).unwrap();
  assert!(c.blobs.is_empty());
  assert_eq!(c.services.opportunities.resume(&admin, app.id).unwrap_err().status_code(), 404);
}

#[test]
fn students_only_see_postings_accepted_by_their_faculty() {
  let c = Campus::new();
  let admin = c.user(Role::Admin, "Admin");
  let owner = c.user(Role::Faculty, "Owner");
  let other = c.user(Role::Faculty, "Other");
  let student = c.user(Role::Student, "Stu");
  let opp = c.services.opportunities.create(&admin, opportunity_draft(owner.id(), 1)).unwrap();
  assert!(!opp.accepted);

  assert!(c.services.opportunities.list(&student).unwrap().is_empty());
  assert_eq!(c.services.opportunities.get(&student, opp.id).unwrap_err().status_code(), 403);
  assert_eq!(c.services.opportunities.apply(&student, opp.id, pdf("cv.pdf")).unwrap_err().status_code(), 400);
  assert!(c.blobs.is_empty());

  assert_eq!(c.services.opportunities.accept(&other, opp.id).unwrap_err().status_code(), 403);
  assert_eq!(c.services.opportunities.accept(&admin, opp.id).unwrap_err().status_code(), 403);
  assert_eq!(c.services.opportunities.accept(&owner, uuid::Uuid::new_v4()).unwrap_err().status_code(), 404);

  let accepted = c.services.opportunities.accept(&owner, opp.id).unwrap();
  assert!(accepted.accepted);
  assert!(accepted.accepted_at.is_some());
  assert_eq!(c.services.opportunities.list(&student).unwrap().len(), 1);
  c.services.opportunities.apply(&student, opp.id, pdf("cv.pdf")).unwrap();
}
