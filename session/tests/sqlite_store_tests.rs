use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use uuid::Uuid;

use rust_decimal::Decimal;
use session::config::{CartConfig, CartConfigPatch};
use session::store::sqlite_store::SqlitePreferenceStore;
use session::store::{CONFIG_KEY, PreferenceStore, load_config, save_config};

/// Isolated shared-cache in-memory DB per test, so two stores over the same
/// pool see the same rows.
async fn memory_pool() -> SqlitePool {
    let url = format!("sqlite:file:{}?mode=memory&cache=shared", Uuid::new_v4());
    SqlitePoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect sqlite memory db")
}

#[tokio::test]
async fn missing_key_loads_as_none() -> anyhow::Result<()> {
    let store = SqlitePreferenceStore::from_pool(memory_pool().await).await?;

    assert!(store.load(CONFIG_KEY).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn save_then_load_returns_latest_value() -> anyhow::Result<()> {
    let store = SqlitePreferenceStore::from_pool(memory_pool().await).await?;

    store.save("k", "first").await?;
    store.save("k", "second").await?;

    assert_eq!(store.load("k").await?.as_deref(), Some("second"));
    Ok(())
}

#[tokio::test]
async fn config_survives_store_restart() -> anyhow::Result<()> {
    let pool = memory_pool().await;

    let first = SqlitePreferenceStore::from_pool(pool.clone()).await?;
    let cfg = CartConfig::default()
        .apply(CartConfigPatch {
            enabled: Some(true),
            ticket_quantity: Some(6),
            max_price: Some(Decimal::new(3255, 1)),
            preferred_sections: Some(vec!["Floor".into(), "Palco".into()]),
            ..Default::default()
        })
        .expect("valid patch");
    save_config(&first, &cfg).await?;

    // Schema creation is idempotent on reopen.
    let second = SqlitePreferenceStore::from_pool(pool).await?;
    let loaded = load_config(&second).await?;

    assert_eq!(loaded, cfg);
    Ok(())
}

#[tokio::test]
async fn unreadable_blob_falls_back_to_defaults() -> anyhow::Result<()> {
    let store = SqlitePreferenceStore::from_pool(memory_pool().await).await?;
    store.save(CONFIG_KEY, "{not json").await?;

    assert_eq!(load_config(&store).await?, CartConfig::default());
    Ok(())
}

#[tokio::test]
async fn invalid_saved_quantity_falls_back_to_defaults() -> anyhow::Result<()> {
    let store = SqlitePreferenceStore::from_pool(memory_pool().await).await?;
    store
        .save(CONFIG_KEY, r#"{"enabled":true,"ticketQuantity":12}"#)
        .await?;

    assert_eq!(load_config(&store).await?, CartConfig::default());
    Ok(())
}
