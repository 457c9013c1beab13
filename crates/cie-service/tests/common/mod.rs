#![allow(dead_code)]

use chrono::NaiveDate;
use cie_domain::{CampusRepository, InMemoryBlobStore, InMemoryCampusRepository, InventoryKind, ItemDraft, Opportunity,
                 OpportunityDraft, Role, User};
use cie_service::{CampusServices, Caller};
use std::sync::Arc;
use uuid::Uuid;

/// Servicios sobre repositorio y almacenamiento en memoria.
pub struct Campus {
  pub repo: Arc<InMemoryCampusRepository>,
  pub blobs: Arc<InMemoryBlobStore>,
  pub services: CampusServices,
}

impl Campus {
  pub fn new() -> Self {
    let repo = Arc::new(InMemoryCampusRepository::new());
    let blobs = Arc::new(InMemoryBlobStore::new());
    let services = CampusServices::new(repo.clone(), blobs.clone());
    Self { repo, blobs, services }
  }

  pub fn user(&self, role: Role, name: &str) -> Caller {
    let email = format!("{}-{}@uni.edu", name.to_lowercase(), Uuid::new_v4());
    let user = User::new(&email, name, role, "secret1").unwrap();
    self.repo.insert_user(&user).unwrap();
    Caller { user }
  }

  pub fn item(&self, admin: &Caller, kind: InventoryKind, quantity: i64, domain_id: Option<Uuid>) -> Uuid {
    let draft = ItemDraft { name: format!("Item {}", Uuid::new_v4()),
                            description: "test item".into(),
                            category: "general".into(),
                            location: "Rack A".into(),
                            total_quantity: quantity,
                            domain_id,
                            ..Default::default() };
    self.services.inventory.create(admin, kind, draft).unwrap().item.id
  }

  /// Publicación creada por el administrador y ya aceptada por su docente.
  pub fn published(&self, admin: &Caller, faculty: &Caller, draft: OpportunityDraft) -> Opportunity {
    let created = self.services.opportunities.create(admin, draft).unwrap();
    self.services.opportunities.accept(faculty, created.id).unwrap()
  }
}

pub fn opportunity_draft(faculty_id: Uuid, capacity: i64) -> OpportunityDraft {
  OpportunityDraft { title: "Summer research".into(),
                     opportunity_type: "Internship".into(),
                     description: "IoT lab".into(),
                     start_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
                     end_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
                     application_start_date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
                     application_end_date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
                     remuneration: None,
                     capacity,
                     faculty_id,
                     status: None }
}
