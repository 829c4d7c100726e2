pub mod blob;
pub mod gateway;
pub mod memory;
pub mod pool;
pub mod postgres;

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;

pub use gateway::{BlobStore, CvStore, ScanStore, UserStore};

/// The storage handles a running server talks to.
#[derive(Clone)]
pub struct Gateway {
    pub cvs: Arc<dyn CvStore>,
    pub users: Arc<dyn UserStore>,
    pub scans: Arc<dyn ScanStore>,
    pub blobs: Arc<dyn BlobStore>,
}

impl Gateway {
    pub fn in_memory(blobs: Arc<dyn BlobStore>) -> Self {
        let store = Arc::new(memory::MemoryStore::new());
        Self {
            cvs: store.clone(),
            users: store.clone(),
            scans: store,
            blobs,
        }
    }

    pub fn postgres(pool: sqlx::PgPool, blobs: Arc<dyn BlobStore>) -> Self {
        let store = Arc::new(postgres::PgStore::new(pool));
        Self {
            cvs: store.clone(),
            users: store.clone(),
            scans: store,
            blobs,
        }
    }
}

/// Picks PostgreSQL when `DATABASE_URL` is set, the in-memory store otherwise.
pub async fn connect(config: &Config) -> Result<Gateway> {
    let blobs: Arc<dyn BlobStore> = Arc::new(blob::LocalBlobStore::new(
        &config.upload_dir,
        &config.public_base_url,
    )?);

    match &config.database_url {
        Some(url) => {
            let pool = pool::create_pool(url).await?;
            pool::run_migrations(&pool).await?;
            tracing::info!("Connected to PostgreSQL");
            Ok(Gateway::postgres(pool, blobs))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory store");
            Ok(Gateway::in_memory(blobs))
        }
    }
}
