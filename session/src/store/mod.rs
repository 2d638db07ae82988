pub mod memory;
pub mod sqlite_store;

use tracing::{info, warn};

use crate::config::CartConfig;

/// Fixed key the carting preferences are stored under.
pub const CONFIG_KEY: &str = "cartConfig";

/// Key-value persistence for user preferences. Values are opaque JSON text.
#[async_trait::async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn load(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn save(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// Reads the saved config and overlays it on the defaults.
///
/// A blob that fails to parse or validate is logged and ignored; the
/// defaults are returned instead. Only store I/O errors propagate.
pub async fn load_config<S: PreferenceStore + ?Sized>(store: &S) -> anyhow::Result<CartConfig> {
    let Some(raw) = store.load(CONFIG_KEY).await? else {
        info!("no saved cart configuration; using defaults");
        return Ok(CartConfig::default());
    };

    let parsed = match serde_json::from_str::<CartConfig>(&raw) {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "saved cart configuration unreadable; using defaults");
            return Ok(CartConfig::default());
        }
    };

    if let Err(e) = parsed.validate() {
        warn!(error = %e, "saved cart configuration invalid; using defaults");
        return Ok(CartConfig::default());
    }

    info!(
        enabled = parsed.enabled,
        ticket_quantity = parsed.ticket_quantity,
        max_price = %parsed.max_price,
        "loaded saved cart configuration"
    );
    Ok(parsed)
}

pub async fn save_config<S: PreferenceStore + ?Sized>(
    store: &S,
    config: &CartConfig,
) -> anyhow::Result<()> {
    let raw = serde_json::to_string(config)?;
    store.save(CONFIG_KEY, &raw).await?;
    info!("saved cart configuration");
    Ok(())
}
