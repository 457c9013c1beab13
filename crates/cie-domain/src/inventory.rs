// inventory.rs
use crate::checkout::RequestStatus;
use crate::DomainError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Tipo de inventario: componentes de laboratorio o ítems de biblioteca.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryKind {
  LabComponent,
  LibraryItem,
}

impl InventoryKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      InventoryKind::LabComponent => "LAB_COMPONENT",
      InventoryKind::LibraryItem => "LIBRARY_ITEM",
    }
  }

  /// Segmento de ruta usado por la API (`components` / `library`).
  pub fn from_path(segment: &str) -> Option<Self> {
    match segment {
      "components" | "lab-components" => Some(InventoryKind::LabComponent),
      "library" | "library-items" => Some(InventoryKind::LibraryItem),
      _ => None,
    }
  }
}

impl FromStr for InventoryKind {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "LAB_COMPONENT" => Ok(InventoryKind::LabComponent),
      "LIBRARY_ITEM" => Ok(InventoryKind::LibraryItem),
      other => Err(DomainError::SerializationError(format!("inventory kind desconocido: {}", other))),
    }
  }
}

impl fmt::Display for InventoryKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Estados que consumen stock al calcular la disponibilidad.
pub const ACTIVE_STATUSES: [RequestStatus; 3] =
  [RequestStatus::Approved, RequestStatus::Collected, RequestStatus::PendingReturn];

/// Disponibilidad derivada: `total - activos`. No se acota a cero; una
/// sobre-aprobación se ve como un valor negativo.
pub fn available_quantity(total_quantity: i64, active_requests: i64) -> i64 {
  total_quantity - active_requests
}

/// Cuenta las solicitudes activas de una lista de estados.
pub fn count_active<'a, I>(statuses: I) -> i64
  where I: IntoIterator<Item = &'a RequestStatus>
{
  statuses.into_iter().filter(|s| s.is_active()).count() as i64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
  pub id: Uuid,
  pub kind: InventoryKind,
  pub name: String,
  pub description: String,
  pub specification: Option<String>,
  pub category: String,
  pub location: String,
  pub total_quantity: i64,
  pub tag_id: Option<String>,
  pub domain_id: Option<Uuid>,
  pub invoice_number: Option<String>,
  pub purchase_value: Option<f64>,
  pub purchase_currency: String,
  pub purchase_date: Option<NaiveDate>,
  pub created_by: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Datos de entrada para crear o reemplazar un ítem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemDraft {
  pub name: String,
  pub description: String,
  #[serde(default)]
  pub specification: Option<String>,
  pub category: String,
  pub location: String,
  pub total_quantity: i64,
  #[serde(default)]
  pub tag_id: Option<String>,
  #[serde(default)]
  pub domain_id: Option<Uuid>,
  #[serde(default)]
  pub invoice_number: Option<String>,
  #[serde(default)]
  pub purchase_value: Option<f64>,
  #[serde(default)]
  pub purchase_currency: Option<String>,
  #[serde(default)]
  pub purchase_date: Option<NaiveDate>,
}

impl ItemDraft {
  pub fn validate(&self) -> Result<(), DomainError> {
    if self.name.trim().is_empty() {
      return Err(DomainError::ValidationError("name is required".to_string()));
    }
    if self.description.trim().is_empty() {
      return Err(DomainError::ValidationError("description is required".to_string()));
    }
    if self.category.trim().is_empty() {
      return Err(DomainError::ValidationError("category is required".to_string()));
    }
    if self.location.trim().is_empty() {
      return Err(DomainError::ValidationError("location is required".to_string()));
    }
    if self.total_quantity < 0 {
      return Err(DomainError::ValidationError("quantity must be a positive number".to_string()));
    }
    if matches!(self.purchase_value, Some(v) if v < 0.0 || v.is_nan()) {
      return Err(DomainError::ValidationError("purchase_value must be a positive number".to_string()));
    }
    Ok(())
  }
}

impl InventoryItem {
  pub fn new(kind: InventoryKind, draft: ItemDraft, created_by: &str) -> Result<Self, DomainError> {
    draft.validate()?;
    let now = Utc::now();
    Ok(Self { id: Uuid::new_v4(),
              kind,
              name: draft.name.trim().to_string(),
              description: draft.description.trim().to_string(),
              specification: clean(draft.specification),
              category: title_case(&draft.category),
              location: draft.location.trim().to_string(),
              total_quantity: draft.total_quantity,
              tag_id: clean(draft.tag_id),
              domain_id: draft.domain_id,
              invoice_number: clean(draft.invoice_number),
              purchase_value: draft.purchase_value,
              purchase_currency: clean(draft.purchase_currency).unwrap_or_else(|| "INR".to_string()),
              purchase_date: draft.purchase_date,
              created_by: created_by.to_string(),
              created_at: now,
              updated_at: now })
  }

  /// Reemplaza los campos editables conservando id, tipo y auditoría de
  /// creación.
  pub fn with_draft(&self, draft: ItemDraft) -> Result<Self, DomainError> {
    let mut updated = Self::new(self.kind, draft, &self.created_by)?;
    updated.id = self.id;
    updated.created_at = self.created_at;
    Ok(updated)
  }

  /// Suma stock (usado por la importación CSV al fusionar filas).
  pub fn add_stock(&self, quantity: i64) -> Result<Self, DomainError> {
    if quantity < 0 {
      return Err(DomainError::ValidationError("quantity must be a positive number".to_string()));
    }
    let mut updated = self.clone();
    updated.total_quantity += quantity;
    updated.updated_at = Utc::now();
    Ok(updated)
  }
}

/// Ítem con su disponibilidad calculada en el momento de la lectura.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemAvailability {
  #[serde(flatten)]
  pub item: InventoryItem,
  pub available_quantity: i64,
}

impl ItemAvailability {
  pub fn new(item: InventoryItem, active_requests: i64) -> Self {
    let available_quantity = available_quantity(item.total_quantity, active_requests);
    Self { item, available_quantity }
  }
}

fn clean(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// "lab  equipment" -> "Lab Equipment".
pub fn title_case(s: &str) -> String {
  s.split_whitespace()
   .map(|w| {
     let mut chars = w.chars();
     match chars.next() {
       Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect::<String>(),
       None => String::new(),
     }
   })
   .collect::<Vec<_>>()
   .join(" ")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn draft(qty: i64) -> ItemDraft {
    ItemDraft { name: "Arduino Uno".into(),
                description: "board".into(),
                category: "micro controllers".into(),
                location: "Rack A".into(),
                total_quantity: qty,
                ..Default::default() }
  }

  #[test]
  fn available_is_total_minus_active() {
    let statuses = [RequestStatus::Pending,
                    RequestStatus::Approved,
                    RequestStatus::Collected,
                    RequestStatus::PendingReturn,
                    RequestStatus::Returned,
                    RequestStatus::Rejected];
    let active = count_active(statuses.iter());
    assert_eq!(active, 3);
    assert_eq!(available_quantity(10, active), 7);
    // lecturas repetidas dan el mismo resultado
    assert_eq!(available_quantity(10, count_active(statuses.iter())), 7);
  }

  #[test]
  fn over_approval_is_visible_as_negative() {
    assert_eq!(available_quantity(1, 2), -1);
  }

  #[test]
  fn new_item_normalizes_fields() {
    let item = InventoryItem::new(InventoryKind::LabComponent, draft(5), "admin").unwrap();
    assert_eq!(item.category, "Micro Controllers");
    assert_eq!(item.purchase_currency, "INR");
    assert!(item.tag_id.is_none());
  }

  #[test]
  fn negative_quantity_is_rejected() {
    let err = InventoryItem::new(InventoryKind::LibraryItem, draft(-1), "admin").unwrap_err();
    assert!(matches!(err, DomainError::ValidationError(_)));
  }

  #[test]
  fn kind_from_path_segment() {
    assert_eq!(InventoryKind::from_path("components"), Some(InventoryKind::LabComponent));
    assert_eq!(InventoryKind::from_path("library"), Some(InventoryKind::LibraryItem));
    assert_eq!(InventoryKind::from_path("books"), None);
  }
}
