mod campus_repository;
mod checkout;
mod domain_area;
mod enrollment;
mod errors;
mod inventory;
mod opportunity;
mod project;
mod storage;
mod ticket;
mod user;

pub use campus_repository::{CampusRepository, DomainScope, InMemoryCampusRepository, RequestFilter};
pub use checkout::{transition_authority, CheckoutRequest, RequestStatus, TransitionAuthority};
pub use domain_area::{canonical_domain_name, normalize_domain_name, Domain, DomainCoordinator};
pub use enrollment::{Course, Enrollment};
pub use errors::DomainError;
pub use inventory::{available_quantity, count_active, title_case, InventoryItem, InventoryKind, ItemAvailability,
                    ItemDraft, ACTIVE_STATUSES};
pub use opportunity::{is_pdf, ApplicationStatus, Opportunity, OpportunityApplication, OpportunityDraft,
                      OpportunityStatus};
pub use project::{Project, ProjectDraft, ProjectKind, ProjectRequest, ProjectRequestStatus, ProjectStatus};
pub use storage::{content_digest, sanitize_file_name, upload_key, validate_key, BlobStore, InMemoryBlobStore,
                  StoredBlob};
pub use ticket::{ReviewTicket, TicketAction, TicketKind, TicketStatus};
pub use user::{hash_password, verify_password, FacultyProfile, Role, StudentProfile, User};
