//! Persistent store access for the sentinel
//!
//! SQLite via sqlx. The engine's internals are not this crate's concern:
//! everything above this module consumes the store through the three
//! operations in [`events`] (range lookup, insert, patch).

pub mod events;

use firewatch_common::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize the store connection pool, creating the database file and
/// schema on first run.
pub async fn init_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to store: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the fires table and its lookup index if missing.
async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS fires (
            id TEXT PRIMARY KEY,
            lat REAL NOT NULL,
            lon REAL NOT NULL,
            first_seen TEXT NOT NULL,
            last_seen TEXT NOT NULL,
            source TEXT NOT NULL,
            alert_count INTEGER NOT NULL DEFAULT 1,
            frp_mw REAL NOT NULL DEFAULT 0.0,
            confidence REAL NOT NULL DEFAULT 0.0,
            est_area_m2 REAL NOT NULL DEFAULT 0.0,
            zone TEXT NOT NULL DEFAULT 'OTHER',
            land_type TEXT NOT NULL DEFAULT 'UNVERIFIED'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_fires_lat_lon ON fires (lat, lon)")
        .execute(pool)
        .await?;

    tracing::info!("Store schema initialized (fires)");
    Ok(())
}
