use crate::errors::{Result, ServiceError};
use crate::gate::Caller;
use chrono::Utc;
use cie_domain::{content_digest, upload_key, BlobStore, CampusRepository, ReviewTicket, Role, TicketAction, TicketKind};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct NewTicket {
  pub title: String,
  pub description: String,
  #[serde(default)]
  pub category: Option<String>,
  #[serde(default)]
  pub image: Option<String>,
}

/// Cuerpo del PATCH: `action` más los datos opcionales de cada acción.
#[derive(Debug, Clone, Deserialize)]
pub struct TicketUpdate {
  pub action: String,
  #[serde(default, alias = "rejectionReason")]
  pub reason: Option<String>,
  #[serde(default, alias = "rectifiedImage")]
  pub rectified_image: Option<String>,
}

/// Imagen subida por un ticket (adjunta o de rectificación).
#[derive(Debug, Clone)]
pub struct ImageUpload {
  pub file_name: String,
  pub content_type: Option<String>,
  pub bytes: Vec<u8>,
}

fn image_prefix(kind: TicketKind) -> &'static str {
  match kind {
    TicketKind::Feedback => "feedback-images",
    TicketKind::Insight => "insight-images",
  }
}

pub struct TicketService {
  repo: Arc<dyn CampusRepository>,
  blobs: Arc<dyn BlobStore>,
}

impl TicketService {
  pub fn new(repo: Arc<dyn CampusRepository>, blobs: Arc<dyn BlobStore>) -> Self {
    Self { repo, blobs }
  }

  pub fn create(&self, caller: &Caller, kind: TicketKind, input: NewTicket) -> Result<ReviewTicket> {
    let ticket = ReviewTicket::new(kind, &input.title, &input.description, input.category, input.image, caller.id())?;
    self.repo.save_ticket(&ticket)?;
    tracing::info!(ticket = %ticket.id, kind = kind.as_str(), "ticket creado");
    Ok(ticket)
  }

  /// Los estudiantes sólo ven sus propios tickets.
  pub fn list(&self, caller: &Caller, kind: TicketKind) -> Result<Vec<ReviewTicket>> {
    let created_by = if caller.is(Role::Student) { Some(caller.id()) } else { None };
    Ok(self.repo.list_tickets(kind, created_by)?)
  }

  pub fn get(&self, caller: &Caller, kind: TicketKind, id: Uuid) -> Result<ReviewTicket> {
    let ticket = self.find(kind, id)?;
    if caller.is(Role::Student) && ticket.created_by != caller.id() {
      return Err(ServiceError::access_denied());
    }
    Ok(ticket)
  }

  fn find(&self, kind: TicketKind, id: Uuid) -> Result<ReviewTicket> {
    self.repo
        .get_ticket(&id)?
        .filter(|t| t.kind == kind)
        .ok_or_else(|| ServiceError::not_found("Ticket"))
  }

  pub fn apply(&self, caller: &Caller, kind: TicketKind, id: Uuid, update: TicketUpdate) -> Result<ReviewTicket> {
    caller.require(&[Role::Admin, Role::Faculty])?;
    let ticket = self.find(kind, id)?;
    let action = TicketAction::parse(&update.action, update.reason, update.rectified_image)?;
    let name = action.name();
    let next = ticket.apply(action, caller.id(), Utc::now())?;
    self.repo.save_ticket(&next)?;
    tracing::info!(ticket = %next.id, action = name, status = %next.status, "ticket actualizado");
    Ok(next)
  }

  /// Guarda la imagen y devuelve su clave en el almacenamiento.
  pub fn upload_image(&self, caller: &Caller, kind: TicketKind, upload: ImageUpload) -> Result<String> {
    if !upload.content_type.as_deref().is_some_and(|ct| ct.starts_with("image/")) {
      return Err(ServiceError::bad_request("Only image files are allowed"));
    }
    if upload.bytes.is_empty() {
      return Err(ServiceError::bad_request("No image file provided"));
    }
    let key = upload_key(image_prefix(kind), &upload.file_name, Utc::now());
    self.blobs.put(&key, &upload.bytes, upload.content_type.as_deref())?;
    tracing::info!(key = %key, user = %caller.id(), sha256 = %content_digest(&upload.bytes), "imagen de ticket guardada");
    Ok(key)
  }
}
