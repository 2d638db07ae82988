use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::PreferenceStore;

/// Non-durable store for tests and dry runs.
#[derive(Default)]
pub struct InMemoryPreferenceStore {
    pub map: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.map.lock().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.map
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
