use nr_core::Storage;
use nr_storage::MediaStore;
use std::sync::Arc;

use crate::config::WebConfig;
use crate::serializers::Serializer;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub media: MediaStore,
    pub config: Arc<WebConfig>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, media: MediaStore, config: WebConfig) -> Self {
        Self {
            storage,
            media,
            config: Arc::new(config),
        }
    }

    pub fn serializer(&self) -> Serializer<'_> {
        Serializer::new(self.storage.as_ref(), &self.config)
    }
}
