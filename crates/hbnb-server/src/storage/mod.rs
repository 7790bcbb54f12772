//! Storage engines
//!
//! `file` keeps objects in a DashMap serialized to one JSON file.
//! `db` uses SQLite (embedded) through sqlx.
//! `session` scopes staged writes to one request.

pub mod db;
pub mod file;
pub mod session;

pub use db::DbStorage;
pub use file::FileStorage;

use crate::config::{Settings, StorageType};
use hbnb_core::{Result, Storage};
use std::sync::Arc;
use tracing::info;

/// Open the engine selected by `settings`, ready to serve requests.
pub async fn open(settings: &Settings) -> Result<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match settings.type_storage {
        StorageType::File => Arc::new(file::open(&settings.file_path).await?),
        StorageType::Db => Arc::new(db::open(&settings.database_path, settings.is_test()).await?),
    };
    info!("Storage engine ready: {:?}", settings.type_storage);
    Ok(storage)
}
