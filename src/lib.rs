//! cie-portal: servidor HTTP del portal CIE
//!
//! Une los servicios de `cie-service` con axum. Cada handler resuelve
//! primero la identidad (`x-user-id` o la cookie `cie_session`), después
//! lee el cuerpo y ejecuta la operación en el pool de hilos bloqueantes.
//!
//! Variables de entorno (ver `config::Config`):
//! - `CIE_DB_URL` / `DATABASE_URL`: base de datos (SQLite por defecto).
//! - `CIE_PORT`: puerto de escucha (3000).
//! - `CIE_UPLOAD_DIR`: raíz de archivos subidos (`public`).
//! - `RUST_LOG`: filtro de `tracing_subscriber`.
use std::{error::Error, time::Duration};

use axum::{
  extract::DefaultBodyLimit,
  http::{
    header::{CONTENT_TYPE, COOKIE},
    HeaderName, Method,
  },
  Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;
pub mod state;

use config::Config;
use identity::USER_ID_HEADER;
use state::AppState;

/// Router completo con límites de cuerpo, CORS y trazas por petición.
pub fn build_router(state: AppState) -> Router {
  let cors = CorsLayer::new().allow_origin(Any)
                             .allow_methods([Method::GET,
                                             Method::POST,
                                             Method::PUT,
                                             Method::PATCH,
                                             Method::DELETE,
                                             Method::OPTIONS])
                             .allow_headers([CONTENT_TYPE, COOKIE, HeaderName::from_static(USER_ID_HEADER)])
                             .max_age(Duration::from_secs(60 * 60));

  routes::api_router().layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
                      .layer(cors)
                      .layer(TraceLayer::new_for_http())
                      .with_state(state)
}

pub async fn start_server() -> Result<(), Box<dyn Error>> {
  fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
       .init();

  let config = Config::load();
  let port = config.port;
  info!(db_url = %config.redacted_db_url(), "Initializing state...");
  let state = tokio::task::spawn_blocking(move || AppState::from_config(config)).await??;

  let address = format!("0.0.0.0:{}", port);
  info!("Binding to {address}");
  let listener = TcpListener::bind(&address).await?;
  info!("Server running on {address}");

  axum::serve(listener, build_router(state)).with_graceful_shutdown(shutdown_signal())
                                            .await?;

  info!("Server shut down");
  Ok(())
}

async fn shutdown_signal() {
  let ctrl_c = async {
    match signal::ctrl_c().await {
      Ok(()) => info!("Received Ctrl+C, shutting down"),
      Err(e) => {
        error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await
      }
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
        info!("Received terminate signal, shutting down");
      }
      Err(e) => {
        error!(error = %e, "failed to install signal handler");
        std::future::pending::<()>().await
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
}
