// Archivo: csv_io.rs
// Propósito: importación y exportación CSV del inventario. Las columnas
// llevan el prefijo del tipo (`component_*` para laboratorio, `item_*` para
// biblioteca) más las columnas de compra comunes.
use crate::errors::{Result, ServiceError};
use chrono::NaiveDate;
use cie_domain::{InventoryItem, InventoryKind, ItemDraft};
use std::collections::HashMap;

const PURCHASE_COLUMNS: [&str; 4] = ["invoice_number", "purchase_value", "purchase_currency", "purchase_date"];

fn prefix(kind: InventoryKind) -> &'static str {
  match kind {
    InventoryKind::LabComponent => "component",
    InventoryKind::LibraryItem => "item",
  }
}

/// Cabecera completa en el orden de exportación.
pub fn csv_header(kind: InventoryKind) -> Vec<String> {
  let p = prefix(kind);
  let mut cols: Vec<String> = ["name", "description", "specification", "quantity", "tag_id", "category", "location"]
    .iter()
    .map(|c| format!("{}_{}", p, c))
    .collect();
  cols.extend(PURCHASE_COLUMNS.iter().map(|c| c.to_string()));
  cols
}

fn required_columns(kind: InventoryKind) -> Vec<String> {
  let p = prefix(kind);
  ["name", "description", "quantity", "category", "location"].iter().map(|c| format!("{}_{}", p, c)).collect()
}

/// Fila ya validada, con su número de línea (la cabecera es la línea 1).
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
  pub line: usize,
  pub draft: ItemDraft,
}

/// Resultado del parseo: filas válidas y mensajes `Row N: ...` de las
/// inválidas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCsv {
  pub total_rows: usize,
  pub rows: Vec<ParsedRow>,
  pub errors: Vec<String>,
}

/// Parsea el CSV. Un CSV ilegible, sin filas o sin columnas obligatorias es
/// un 400; los errores por fila se acumulan en `errors`.
pub fn parse_inventory_csv(kind: InventoryKind, bytes: &[u8]) -> Result<ParsedCsv> {
  let mut reader = csv::ReaderBuilder::new().has_headers(true)
                                            .flexible(true)
                                            .trim(csv::Trim::All)
                                            .from_reader(bytes);
  let headers = reader.headers().map_err(|e| ServiceError::bad_request(format!("CSV parsing error: {}", e)))?;
  let index: HashMap<String, usize> =
    headers.iter().enumerate().map(|(i, h)| (h.trim_start_matches('\u{feff}').to_ascii_lowercase(), i)).collect();
  for col in required_columns(kind) {
    if !index.contains_key(&col) {
      return Err(ServiceError::bad_request(format!("Missing required column: {}", col)));
    }
  }

  let mut parsed = ParsedCsv::default();
  for (i, record) in reader.records().enumerate() {
    let line = i + 2;
    parsed.total_rows += 1;
    let record = match record {
      Ok(r) => r,
      Err(e) => {
        parsed.errors.push(format!("Row {}: {}", line, e));
        continue;
      }
    };
    let field = |name: &str| -> Option<String> {
      index.get(name).and_then(|&i| record.get(i)).map(str::to_string).filter(|s| !s.is_empty())
    };
    match row_to_draft(kind, &field) {
      Ok(draft) => parsed.rows.push(ParsedRow { line, draft }),
      Err(msg) => parsed.errors.push(format!("Row {}: {}", line, msg)),
    }
  }
  if parsed.total_rows == 0 {
    return Err(ServiceError::bad_request("No valid data found in CSV"));
  }
  Ok(parsed)
}

fn row_to_draft(kind: InventoryKind, field: &dyn Fn(&str) -> Option<String>) -> std::result::Result<ItemDraft, String> {
  let p = prefix(kind);
  let col = |c: &str| format!("{}_{}", p, c);
  let required = |c: &str| field(&col(c)).ok_or_else(|| format!("{} is required", col(c)));

  let name = required("name")?;
  let description = required("description")?;
  let quantity_raw = required("quantity")?;
  let category = required("category")?;
  let location = required("location")?;
  let total_quantity = quantity_raw.parse::<i64>()
                                   .ok()
                                   .filter(|q| *q >= 0)
                                   .ok_or_else(|| format!("{} must be a positive number", col("quantity")))?;
  let purchase_value = match field("purchase_value") {
    Some(v) => Some(v.parse::<f64>()
                     .ok()
                     .filter(|v| *v >= 0.0)
                     .ok_or_else(|| "purchase_value must be a positive number".to_string())?),
    None => None,
  };
  let purchase_date = match field("purchase_date") {
    Some(d) => {
      Some(NaiveDate::parse_from_str(&d, "%Y-%m-%d").map_err(|_| "purchase_date must be a valid date".to_string())?)
    }
    None => None,
  };
  Ok(ItemDraft { name,
                 description,
                 specification: field(&col("specification")),
                 category,
                 location,
                 total_quantity,
                 tag_id: field(&col("tag_id")),
                 domain_id: None,
                 invoice_number: field("invoice_number"),
                 purchase_value,
                 purchase_currency: field("purchase_currency"),
                 purchase_date })
}

/// Exporta los ítems con la misma cabecera que acepta la importación.
pub fn export_inventory_csv(kind: InventoryKind, items: &[InventoryItem]) -> Result<Vec<u8>> {
  let mut writer = csv::Writer::from_writer(Vec::new());
  let csv_err = |e: csv::Error| ServiceError::Storage(format!("csv: {}", e));
  writer.write_record(csv_header(kind)).map_err(csv_err)?;
  for item in items {
    writer.write_record([item.name.clone(),
                         item.description.clone(),
                         item.specification.clone().unwrap_or_default(),
                         item.total_quantity.to_string(),
                         item.tag_id.clone().unwrap_or_default(),
                         item.category.clone(),
                         item.location.clone(),
                         item.invoice_number.clone().unwrap_or_default(),
                         item.purchase_value.map(|v| v.to_string()).unwrap_or_default(),
                         item.purchase_currency.clone(),
                         item.purchase_date.map(|d| d.to_string()).unwrap_or_default()])
          .map_err(csv_err)?;
  }
  writer.into_inner().map_err(|e| ServiceError::Storage(format!("csv: {}", e)))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_valid_rows_and_reports_bad_ones() {
    let data = "component_name,component_description,component_quantity,component_category,component_location,\
                purchase_value,purchase_date\n\
                Arduino,Board,10,micro controllers,Rack A,450.5,2025-01-10\n\
                ,Missing name,1,x,y,,\n\
                Servo,Motor,-3,motors,Rack B,,\n\
                Relay,Module,4,modules,Rack C,,31/12/2024\n";
    let parsed = parse_inventory_csv(InventoryKind::LabComponent, data.as_bytes()).unwrap();
    assert_eq!(parsed.total_rows, 4);
    assert_eq!(parsed.rows.len(), 1);
    assert_eq!(parsed.rows[0].line, 2);
    assert_eq!(parsed.rows[0].draft.purchase_value, Some(450.5));
    assert_eq!(parsed.errors,
               vec!["Row 3: component_name is required".to_string(),
                    "Row 4: component_quantity must be a positive number".to_string(),
                    "Row 5: purchase_date must be a valid date".to_string()]);
  }

  #[test]
  fn missing_required_column_is_rejected() {
    let data = "item_name,item_description\nBook,Novel\n";
    let err = parse_inventory_csv(InventoryKind::LibraryItem, data.as_bytes()).unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert!(err.public_message().starts_with("Missing required column"));
  }

  #[test]
  fn export_then_import_preserves_rows() {
    let draft = ItemDraft { name: "Clean Code".into(),
                            description: "Book, \"classic\"".into(),
                            category: "software".into(),
                            location: "Shelf 3".into(),
                            total_quantity: 2,
                            tag_id: Some("LIB-1".into()),
                            ..Default::default() };
    let item = InventoryItem::new(InventoryKind::LibraryItem, draft, "admin").unwrap();
    let bytes = export_inventory_csv(InventoryKind::LibraryItem, &[item]).unwrap();
    let parsed = parse_inventory_csv(InventoryKind::LibraryItem, &bytes).unwrap();
    assert!(parsed.errors.is_empty());
    assert_eq!(parsed.rows[0].draft.description, "Book, \"classic\"");
    assert_eq!(parsed.rows[0].draft.tag_id.as_deref(), Some("LIB-1"));
    assert_eq!(parsed.rows[0].draft.purchase_currency.as_deref(), Some("INR"));
  }
}
