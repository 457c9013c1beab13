use crate::csv_io::{export_inventory_csv, parse_inventory_csv};
use crate::errors::{Result, ServiceError};
use crate::gate::Caller;
use cie_domain::{title_case, CampusRepository, InventoryItem, InventoryKind, ItemAvailability, ItemDraft, Role};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

/// Fila procesada por la importación.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportedRow {
  pub action: &'static str,
  pub name: String,
  pub tag_id: Option<String>,
  pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
  pub total_rows: usize,
  pub processed: usize,
  pub errors: usize,
  pub error_details: Vec<String>,
  pub processed_items: Vec<ImportedRow>,
}

pub struct InventoryService {
  repo: Arc<dyn CampusRepository>,
}

impl InventoryService {
  pub fn new(repo: Arc<dyn CampusRepository>) -> Self {
    Self { repo }
  }

  fn with_availability(&self, item: InventoryItem) -> Result<ItemAvailability> {
    let active = self.repo.count_active_requests(&item.id)?;
    Ok(ItemAvailability::new(item, active))
  }

  /// Ítem del tipo pedido; un id de otro tipo cuenta como inexistente.
  pub fn find(&self, kind: InventoryKind, id: Uuid) -> Result<InventoryItem> {
    self.repo
        .get_item(&id)?
        .filter(|i| i.kind == kind)
        .ok_or_else(|| ServiceError::not_found("Item"))
  }

  /// Lista con la disponibilidad recalculada en cada lectura.
  pub fn list(&self, kind: InventoryKind) -> Result<Vec<ItemAvailability>> {
    self.repo.list_items(kind)?.into_iter().map(|i| self.with_availability(i)).collect()
  }

  pub fn get(&self, kind: InventoryKind, id: Uuid) -> Result<ItemAvailability> {
    let item = self.find(kind, id)?;
    self.with_availability(item)
  }

  pub fn create(&self, caller: &Caller, kind: InventoryKind, draft: ItemDraft) -> Result<ItemAvailability> {
    caller.require(&[Role::Admin])?;
    self.check_domain(&draft)?;
    let item = InventoryItem::new(kind, draft, &caller.id().to_string())?;
    self.repo.save_item(&item)?;
    tracing::info!(item = %item.id, kind = %kind, "ítem creado");
    Ok(ItemAvailability::new(item, 0))
  }

  pub fn update(&self, caller: &Caller, kind: InventoryKind, id: Uuid, draft: ItemDraft) -> Result<ItemAvailability> {
    caller.require(&[Role::Admin])?;
    let current = self.find(kind, id)?;
    self.check_domain(&draft)?;
    let updated = current.with_draft(draft)?;
    self.repo.save_item(&updated)?;
    self.with_availability(updated)
  }

  /// Borra el ítem junto con sus solicitudes.
  pub fn delete(&self, caller: &Caller, kind: InventoryKind, id: Uuid) -> Result<()> {
    caller.require(&[Role::Admin])?;
    self.find(kind, id)?;
    self.repo.delete_item(&id)?;
    tracing::info!(item = %id, "ítem eliminado");
    Ok(())
  }

  fn check_domain(&self, draft: &ItemDraft) -> Result<()> {
    if let Some(domain_id) = draft.domain_id {
      if self.repo.get_domain(&domain_id)?.is_none() {
        return Err(ServiceError::bad_request("Domain not found"));
      }
    }
    Ok(())
  }

  pub fn categories(&self, kind: InventoryKind) -> Result<Vec<String>> {
    let set: BTreeSet<String> = self.repo.list_items(kind)?.into_iter().map(|i| i.category).collect();
    Ok(set.into_iter().collect())
  }

  pub fn locations(&self, kind: InventoryKind) -> Result<Vec<String>> {
    let set: BTreeSet<String> = self.repo.list_items(kind)?.into_iter().map(|i| i.location).collect();
    Ok(set.into_iter().collect())
  }

  /// Las categorías viven en los ítems: "agregar" sólo valida y normaliza
  /// el nombre. 409 si ya existe.
  pub fn add_category(&self, caller: &Caller, kind: InventoryKind, category: &str) -> Result<String> {
    caller.require(&[Role::Admin])?;
    let formatted = title_case(category.trim());
    if formatted.is_empty() {
      return Err(ServiceError::bad_request("Category is required and must be a string"));
    }
    if self.categories(kind)?.contains(&formatted) {
      return Err(ServiceError::Conflict("Category already exists".to_string()));
    }
    Ok(formatted)
  }

  /// 409 mientras algún ítem use la categoría.
  pub fn remove_category(&self, caller: &Caller, kind: InventoryKind, category: &str) -> Result<()> {
    caller.require(&[Role::Admin])?;
    let formatted = title_case(category.trim());
    if formatted.is_empty() {
      return Err(ServiceError::bad_request("Category parameter is required"));
    }
    let in_use = self.repo.list_items(kind)?.iter().filter(|i| i.category == formatted).count();
    if in_use > 0 {
      return Err(ServiceError::Conflict(format!("Cannot delete category. It is currently being used by {} items.",
                                                in_use)));
    }
    Ok(())
  }

  /// Importación masiva. Las filas cuyo (nombre, tag) ya existe suman stock
  /// al ítem existente; el resto crea ítems nuevos.
  pub fn import_csv(&self, caller: &Caller, kind: InventoryKind, file_name: &str, bytes: &[u8]) -> Result<ImportReport> {
    caller.require(&[Role::Admin, Role::Faculty])?;
    if !file_name.to_ascii_lowercase().ends_with(".csv") {
      return Err(ServiceError::bad_request("File must be a CSV"));
    }
    let parsed = parse_inventory_csv(kind, bytes)?;
    let mut existing = self.repo.list_items(kind)?;
    let mut errors = parsed.errors;
    let mut processed = Vec::new();
    for row in parsed.rows {
      let quantity = row.draft.total_quantity;
      let name = row.draft.name.trim().to_string();
      let tag_id = row.draft.tag_id.clone();
      let outcome = match existing.iter().position(|i| i.name == name && i.tag_id == tag_id) {
        Some(pos) => existing[pos].add_stock(quantity).and_then(|updated| {
                                                       self.repo.save_item(&updated)?;
                                                       existing[pos] = updated;
                                                       Ok("updated")
                                                     }),
        None => InventoryItem::new(kind, row.draft, &caller.id().to_string()).and_then(|item| {
                                                                                self.repo.save_item(&item)?;
                                                                                existing.push(item);
                                                                                Ok("created")
                                                                              }),
      };
      match outcome {
        Ok(action) => processed.push(ImportedRow { action, name, tag_id, quantity }),
        Err(e) => {
          tracing::warn!(line = row.line, error = %e, "fila de importación rechazada");
          errors.push(format!("Row {}: Processing error - {}", row.line, e.message()));
        }
      }
    }
    errors.sort_by_key(|e| row_number(e));
    tracing::info!(kind = %kind, processed = processed.len(), errors = errors.len(), "importación CSV terminada");
    Ok(ImportReport { total_rows: parsed.total_rows,
                      processed: processed.len(),
                      errors: errors.len(),
                      error_details: errors,
                      processed_items: processed })
  }

  pub fn export_csv(&self, caller: &Caller, kind: InventoryKind) -> Result<Vec<u8>> {
    caller.require(&[Role::Admin, Role::Faculty])?;
    let mut items = self.repo.list_items(kind)?;
    items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    export_inventory_csv(kind, &items)
  }
}

fn row_number(message: &str) -> usize {
  message.strip_prefix("Row ")
         .and_then(|rest| rest.split(':').next())
         .and_then(|n| n.parse().ok())
         .unwrap_or(usize::MAX)
}
