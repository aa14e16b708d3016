use async_trait::async_trait;
use nr_core::{Error, Result, Storage};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info};

pub mod backends;
pub mod media;

pub use backends::*;
pub use media::MediaStore;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn get_error_message() -> &'static str;

    /// Open the backend. `url` is backend specific; `None` picks the default.
    async fn connect(url: Option<&str>) -> Result<Self>
    where
        Self: Sized;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    Sqlite,
}

impl Default for StorageKind {
    fn default() -> Self {
        Self::Sqlite
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Memory => write!(f, "memory"),
            StorageKind::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(Error::Storage(format!(
                "Unknown storage backend: {} (expected memory or sqlite)",
                other
            ))),
        }
    }
}

pub async fn create_storage(kind: StorageKind, url: Option<&str>) -> Result<Arc<dyn Storage>> {
    match kind {
        StorageKind::Memory => connect::<MemoryStorage>(kind, url).await,
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => connect::<SQLiteStorage>(kind, url).await,
        #[cfg(not(feature = "sqlite"))]
        StorageKind::Sqlite => Err(Error::Storage(
            "nr_storage was built without the `sqlite` feature".to_string(),
        )),
    }
}

async fn connect<T>(kind: StorageKind, url: Option<&str>) -> Result<Arc<dyn Storage>>
where
    T: StorageBackend + Storage + 'static,
{
    match T::connect(url).await {
        Ok(storage) => {
            info!("🏦 Storage backend initialized (using {})", kind);
            Ok(Arc::new(storage))
        }
        Err(e) => {
            error!("{} ({})", T::get_error_message(), e);
            Err(e)
        }
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, MediaStore, StorageBackend, StorageKind};
}
