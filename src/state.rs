use std::sync::Arc;

use cie_domain::{BlobStore, CampusRepository, DomainError};
use cie_persistence::{DieselCampusRepository, FsBlobStore};
use cie_service::{CampusServices, Caller};
use tracing::{info, warn};

use super::{config::Config, error::AppError, identity::Identity};

/// Estado compartido por los handlers. Se crea una vez al arrancar.
#[derive(Clone)]
pub struct AppState {
  pub config: Arc<Config>,
  pub services: Arc<CampusServices>,
  pub blobs: Arc<dyn BlobStore>,
}

impl AppState {
  pub fn new(config: Config, repo: Arc<dyn CampusRepository>, blobs: Arc<dyn BlobStore>) -> Self {
    let services = CampusServices::new(repo, blobs.clone());
    Self { config: Arc::new(config), services: Arc::new(services), blobs }
  }

  /// Abre la base configurada, aplica migraciones y crea el administrador
  /// inicial si está configurado.
  pub fn from_config(config: Config) -> Result<Self, DomainError> {
    let repo = DieselCampusRepository::new(&config.db_url)?;
    let blobs = FsBlobStore::new(config.upload_dir.clone());
    info!(upload_dir = %blobs.root().display(), "file storage ready");
    let state = Self::new(config, Arc::new(repo), Arc::new(blobs));
    if let Some((email, password)) = &state.config.bootstrap_admin {
      match state.services.users.bootstrap_admin(email, password) {
        Ok(true) => info!(email = %email, "bootstrap admin created"),
        Ok(false) => {}
        Err(e) => warn!(error = %e, "bootstrap admin not created"),
      }
    }
    Ok(state)
  }

  /// Ejecuta una operación de servicio en el pool de hilos bloqueantes.
  pub async fn run<T, F>(&self, f: F) -> Result<T, AppError>
    where F: FnOnce(&CampusServices) -> cie_service::Result<T> + Send + 'static,
          T: Send + 'static
  {
    let services = self.services.clone();
    let out = tokio::task::spawn_blocking(move || f(&services)).await?;
    Ok(out?)
  }

  /// Resuelve el llamador (401 si no hay identidad válida).
  pub async fn caller(&self, identity: Identity) -> Result<Caller, AppError> {
    self.run(move |s| s.gate.resolve(identity.as_deref())).await
  }
}
