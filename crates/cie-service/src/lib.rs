//! cie-service: servicios del portal CIE
//!
//! Cada servicio recibe el `Caller` ya resuelto por `RoleGate`, valida rol y
//! relación (dueño, coordinador) y delega en `cie_domain::CampusRepository`
//! y `cie_domain::BlobStore`. Los servicios son síncronos; el servidor los
//! ejecuta en el pool de hilos bloqueantes.
//!
//! Ejemplo rápido:
//! ```rust
//! use cie_domain::{InMemoryBlobStore, InMemoryCampusRepository};
//! use std::sync::Arc;
//! let services = cie_service::CampusServices::new(Arc::new(InMemoryCampusRepository::new()),
//!                                                 Arc::new(InMemoryBlobStore::new()));
//! assert!(services.gate.resolve(None).is_err());
//! ```

pub mod checkout;
pub mod coordinators;
pub mod csv_io;
pub mod dashboard;
pub mod enrollments;
pub mod errors;
pub mod gate;
pub mod inventory;
pub mod opportunities;
pub mod projects;
pub mod tickets;
pub mod users;

pub use checkout::{CheckoutService, CheckoutView, NewCheckout};
pub use coordinators::{faculty_scope, find_or_create_domain, is_coordinator_for, AssignCoordinator, CoordinatorAssignment,
                       CoordinatorCheck, CoordinatorService, DomainSummary, NewDomain};
pub use dashboard::{AdminDashboard, Dashboard, DashboardService, FacultyDashboard, StudentDashboard};
pub use enrollments::{EnrollmentService, EnrollmentView, NewCourse, NewEnrollment};
pub use errors::{Result, ServiceError};
pub use gate::{Caller, RoleGate};
pub use inventory::{ImportReport, ImportedRow, InventoryService};
pub use opportunities::{ApplicationView, OpportunityService, OpportunityView, ResumeUpload};
pub use projects::{ComponentRef, NewProjectRequest, ProjectRequestView, ProjectReview, ProjectService, ProjectView};
pub use tickets::{ImageUpload, NewTicket, TicketService, TicketUpdate};
pub use users::{NewUser, UserProfile, UserService};

use cie_domain::{BlobStore, CampusRepository};
use std::sync::Arc;

/// Todos los servicios construidos sobre el mismo repositorio y
/// almacenamiento de archivos.
pub struct CampusServices {
  pub gate: RoleGate,
  pub users: UserService,
  pub inventory: InventoryService,
  pub checkout: CheckoutService,
  pub tickets: TicketService,
  pub opportunities: OpportunityService,
  pub projects: ProjectService,
  pub coordinators: CoordinatorService,
  pub enrollments: EnrollmentService,
  pub dashboard: DashboardService,
}

impl CampusServices {
  pub fn new(repo: Arc<dyn CampusRepository>, blobs: Arc<dyn BlobStore>) -> Self {
    Self { gate: RoleGate::new(repo.clone()),
           users: UserService::new(repo.clone()),
           inventory: InventoryService::new(repo.clone()),
           checkout: CheckoutService::new(repo.clone()),
           tickets: TicketService::new(repo.clone(), blobs.clone()),
           opportunities: OpportunityService::new(repo.clone(), blobs),
           projects: ProjectService::new(repo.clone()),
           coordinators: CoordinatorService::new(repo.clone()),
           enrollments: EnrollmentService::new(repo.clone()),
           dashboard: DashboardService::new(repo) }
  }
}
