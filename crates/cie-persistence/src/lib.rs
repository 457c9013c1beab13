//! Persistencia del portal: repositorio Diesel que implementa
//! `CampusRepository` (SQLite por defecto, Postgres con la feature `pg`) y
//! un `BlobStore` sobre el sistema de archivos.

mod blob_fs;
mod campus_persistence;
pub mod schema;

pub use blob_fs::{content_type_for, FsBlobStore};
pub use campus_persistence::{new_from_env, DieselCampusRepository, DEFAULT_SQLITE_URL, MIGRATIONS};
