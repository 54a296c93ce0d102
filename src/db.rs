use anyhow::{Context, Result};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::models::{RateUsageRecord, Theme, Widget};

// =====================================================================
// PERSISTED RECORDS
// =====================================================================
// Three independent JSON blobs, each under a fixed key. Reads and writes
// are blind read-modify-write: last writer wins, matching the local
// storage model this store replaces.

pub const WIDGETS_KEY: &str = "finboard_widgets";
pub const THEME_KEY: &str = "finboard_theme";
pub const API_USAGE_KEY: &str = "finboard_api_usage";

/// Map of provider identifier to its current usage window.
pub type RateUsageMap = HashMap<String, RateUsageRecord>;

/// Resolves the data directory: `FINBOARD_DATA_DIR` (a `.env` file is
/// honored) with a `./data` fallback.
pub fn default_data_dir() -> PathBuf {
    dotenvy::dotenv().ok();
    std::env::var("FINBOARD_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./data"))
}

pub async fn init(data_dir: &Path) -> Result<SqlitePool> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;

    let db_path = data_dir.join("finboard.db");
    let database_url = format!("sqlite://{}?mode=rwc", db_path.to_string_lossy());

    tracing::info!("connecting to SQLite store: {}", database_url);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("store initialized");
    Ok(pool)
}

/// Ephemeral in-memory store, used by tests and throwaway sessions.
pub async fn init_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

pub async fn save_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES ($1, $2)
         ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = CURRENT_TIMESTAMP",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let row = sqlx::query("SELECT value FROM settings WHERE key = $1")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(record) => Ok(Some(record.try_get("value")?)),
        None => Ok(None),
    }
}

// =====================================================================
// TYPED WRAPPERS
// =====================================================================
// A corrupt blob degrades to the empty default rather than failing the
// whole dashboard; the damage is logged and the next save overwrites it.

pub async fn load_widgets(pool: &SqlitePool) -> Result<Vec<Widget>> {
    match get_setting(pool, WIDGETS_KEY).await? {
        Some(raw) => Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("discarding corrupt widget list: {}", e);
            Vec::new()
        })),
        None => Ok(Vec::new()),
    }
}

pub async fn save_widgets(pool: &SqlitePool, widgets: &[Widget]) -> Result<()> {
    let raw = serde_json::to_string(widgets)?;
    save_setting(pool, WIDGETS_KEY, &raw).await
}

/// The theme is stored as the bare string "light" / "dark".
pub async fn load_theme(pool: &SqlitePool) -> Result<Theme> {
    Ok(get_setting(pool, THEME_KEY)
        .await?
        .map(|raw| Theme::parse(&raw))
        .unwrap_or_default())
}

pub async fn save_theme(pool: &SqlitePool, theme: Theme) -> Result<()> {
    save_setting(pool, THEME_KEY, theme.as_str()).await
}

pub async fn load_usage(pool: &SqlitePool) -> Result<RateUsageMap> {
    match get_setting(pool, API_USAGE_KEY).await? {
        Some(raw) => Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("discarding corrupt API usage map: {}", e);
            RateUsageMap::new()
        })),
        None => Ok(RateUsageMap::new()),
    }
}

pub async fn save_usage(pool: &SqlitePool, usage: &RateUsageMap) -> Result<()> {
    let raw = serde_json::to_string(usage)?;
    save_setting(pool, API_USAGE_KEY, &raw).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DisplayType, RateLimit, RatePeriod};
    use chrono::{TimeZone, Utc};

    fn sample_widget(id: &str) -> Widget {
        Widget {
            id: id.to_string(),
            name: "Bitcoin Price".to_string(),
            api: "https://api.coinbase.com/v2/exchange-rates?currency=BTC".to_string(),
            refresh: 30,
            fields: vec!["data.rates.USD".to_string()],
            display_type: DisplayType::Card,
            provider: Some("coinbase".to_string()),
            rate_limit: Some(RateLimit {
                requests: 10_000,
                period: RatePeriod::Hour,
            }),
        }
    }

    #[tokio::test]
    async fn test_widget_list_round_trip() {
        let pool = init_in_memory().await.unwrap();

        assert!(load_widgets(&pool).await.unwrap().is_empty());

        let widgets = vec![sample_widget("a"), sample_widget("b")];
        save_widgets(&pool, &widgets).await.unwrap();

        let loaded = load_widgets(&pool).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, "a");
        assert_eq!(loaded[1].fields, vec!["data.rates.USD"]);
    }

    #[tokio::test]
    async fn test_theme_defaults_to_dark() {
        let pool = init_in_memory().await.unwrap();
        assert_eq!(load_theme(&pool).await.unwrap(), Theme::Dark);

        save_theme(&pool, Theme::Light).await.unwrap();
        assert_eq!(load_theme(&pool).await.unwrap(), Theme::Light);
    }

    #[tokio::test]
    async fn test_usage_map_round_trip() {
        let pool = init_in_memory().await.unwrap();

        let mut usage = RateUsageMap::new();
        usage.insert(
            "twelvedata".to_string(),
            RateUsageRecord {
                count: 3,
                reset_time: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
            },
        );
        save_usage(&pool, &usage).await.unwrap();

        let loaded = load_usage(&pool).await.unwrap();
        assert_eq!(loaded.get("twelvedata").unwrap().count, 3);
    }

    #[tokio::test]
    async fn test_corrupt_blob_degrades_to_default() {
        let pool = init_in_memory().await.unwrap();
        save_setting(&pool, WIDGETS_KEY, "not json").await.unwrap();
        assert!(load_widgets(&pool).await.unwrap().is_empty());
    }
}
