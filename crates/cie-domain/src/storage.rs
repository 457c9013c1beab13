// storage.rs
//
// Puerto de almacenamiento de archivos subidos (currículums, imágenes de
// tickets). Las claves son rutas relativas con `/` como separador.
use crate::DomainError;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;

/// Archivo recuperado del almacenamiento.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
  pub key: String,
  pub bytes: Vec<u8>,
  pub content_type: Option<String>,
}

pub trait BlobStore: Send + Sync {
  /// Escribe (o sobrescribe) el contenido bajo `key`.
  fn put(&self, key: &str, bytes: &[u8], content_type: Option<&str>) -> Result<(), DomainError>;
  fn get(&self, key: &str) -> Result<Option<StoredBlob>, DomainError>;
  /// Devuelve `false` si la clave no existía.
  fn delete(&self, key: &str) -> Result<bool, DomainError>;
}

/// Rechaza claves vacías, absolutas o con segmentos `..`.
pub fn validate_key(key: &str) -> Result<(), DomainError> {
  if key.is_empty()
     || key.starts_with('/')
     || key.contains('\\')
     || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..")
  {
    return Err(DomainError::ValidationError(format!("Invalid storage key: {}", key)));
  }
  Ok(())
}

/// Nombre de archivo seguro: sólo alfanuméricos, `.`, `-` y `_`; el resto
/// se reemplaza por `_`.
pub fn sanitize_file_name(name: &str) -> String {
  let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
  let cleaned: String =
    base.chars().map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' }).collect();
  let cleaned = cleaned.trim_start_matches('.').to_string();
  if cleaned.is_empty() {
    "file".to_string()
  } else {
    cleaned
  }
}

/// Clave `{prefix}/{millis}_{nombre}`. Dos subidas con el mismo nombre en el
/// mismo milisegundo colisionan.
pub fn upload_key(prefix: &str, file_name: &str, at: DateTime<Utc>) -> String {
  format!("{}/{}_{}", prefix.trim_matches('/'), at.timestamp_millis(), sanitize_file_name(file_name))
}

/// Huella SHA-256 en hex, usada en los logs de subida.
pub fn content_digest(bytes: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(bytes);
  format!("{:x}", hasher.finalize())
}

/// Almacenamiento en memoria para tests.
#[derive(Default)]
pub struct InMemoryBlobStore {
  blobs: Mutex<HashMap<String, StoredBlob>>,
}

impl InMemoryBlobStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, StoredBlob>>, DomainError> {
    self.blobs.lock().map_err(|e| DomainError::ExternalError(format!("Mutex 'blobs' poisoned: {}", e)))
  }

  pub fn len(&self) -> usize {
    self.lock().map(|m| m.len()).unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl BlobStore for InMemoryBlobStore {
  fn put(&self, key: &str, bytes: &[u8], content_type: Option<&str>) -> Result<(), DomainError> {
    validate_key(key)?;
    let blob = StoredBlob { key: key.to_string(), bytes: bytes.to_vec(), content_type: content_type.map(str::to_string) };
    self.lock()?.insert(key.to_string(), blob);
    Ok(())
  }

  fn get(&self, key: &str) -> Result<Option<StoredBlob>, DomainError> {
    validate_key(key)?;
    Ok(self.lock()?.get(key).cloned())
  }

  fn delete(&self, key: &str) -> Result<bool, DomainError> {
    validate_key(key)?;
    Ok(self.lock()?.remove(key).is_some())
  }
}
