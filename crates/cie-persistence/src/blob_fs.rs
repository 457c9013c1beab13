use cie_domain::{validate_key, BlobStore, DomainError, StoredBlob};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// `BlobStore` sobre el sistema de archivos: cada clave es una ruta relativa
/// bajo `root` (el directorio público servido como estático).
#[derive(Debug, Clone)]
pub struct FsBlobStore {
  root: PathBuf,
}

impl FsBlobStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn path_for(&self, key: &str) -> Result<PathBuf, DomainError> {
    validate_key(key)?;
    Ok(key.split('/').fold(self.root.clone(), |p, seg| p.join(seg)))
  }
}

fn io_err(action: &str, key: &str, e: std::io::Error) -> DomainError {
  DomainError::ExternalError(format!("blob {} '{}': {}", action, key, e))
}

/// Tipo de contenido deducido de la extensión.
pub fn content_type_for(key: &str) -> Option<&'static str> {
  let ext = key.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase())?;
  match ext.as_str() {
    "pdf" => Some("application/pdf"),
    "png" => Some("image/png"),
    "jpg" | "jpeg" => Some("image/jpeg"),
    "gif" => Some("image/gif"),
    "webp" => Some("image/webp"),
    "csv" => Some("text/csv"),
    "txt" => Some("text/plain"),
    _ => None,
  }
}

impl BlobStore for FsBlobStore {
  fn put(&self, key: &str, bytes: &[u8], _content_type: Option<&str>) -> Result<(), DomainError> {
    let path = self.path_for(key)?;
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).map_err(|e| io_err("mkdir", key, e))?;
    }
    // escritura directa, sin rename atómico
    fs::write(&path, bytes).map_err(|e| io_err("write", key, e))?;
    log::debug!("blob escrito: {} ({} bytes)", path.display(), bytes.len());
    Ok(())
  }

  fn get(&self, key: &str) -> Result<Option<StoredBlob>, DomainError> {
    let path = self.path_for(key)?;
    match fs::read(&path) {
      Ok(bytes) => Ok(Some(StoredBlob { key: key.to_string(),
                                        bytes,
                                        content_type: content_type_for(key).map(str::to_string) })),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(io_err("read", key, e)),
    }
  }

  fn delete(&self, key: &str) -> Result<bool, DomainError> {
    let path = self.path_for(key)?;
    match fs::remove_file(&path) {
      Ok(()) => Ok(true),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
      Err(e) => Err(io_err("delete", key, e)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use uuid::Uuid;

  #[test]
  fn put_get_delete_roundtrip_on_disk() -> Result<(), DomainError> {
    let root = std::env::temp_dir().join(format!("cie_blobs_{}", Uuid::new_v4()));
    let store = FsBlobStore::new(&root);
    store.put("resumes/o1/1_cv.pdf", b"%PDF-1.4", Some("application/pdf"))?;
    assert!(root.join("resumes").join("o1").join("1_cv.pdf").exists());
    let blob = store.get("resumes/o1/1_cv.pdf")?.expect("blob");
    assert_eq!(blob.bytes, b"%PDF-1.4");
    assert_eq!(blob.content_type.as_deref(), Some("application/pdf"));
    assert!(store.delete("resumes/o1/1_cv.pdf")?);
    assert!(store.get("resumes/o1/1_cv.pdf")?.is_none());
    assert!(!store.delete("resumes/o1/1_cv.pdf")?);
    let _ = fs::remove_dir_all(root);
    Ok(())
  }

  #[test]
  fn traversal_is_rejected() {
    let store = FsBlobStore::new(std::env::temp_dir());
    assert!(store.put("../escape.txt", b"x", None).is_err());
    assert!(store.get("/etc/passwd").is_err());
  }

  #[test]
  fn content_type_from_extension() {
    assert_eq!(content_type_for("a/b.PDF"), Some("application/pdf"));
    assert_eq!(content_type_for("a/b.jpeg"), Some("image/jpeg"));
    assert_eq!(content_type_for("a/b"), None);
  }
}
