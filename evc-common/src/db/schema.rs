//! Preference store schema and versioned migrations
//!
//! The `schema_version` table records every applied migration. Migrations
//! are idempotent and run in order on every open.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - databases in the wild already ran them
//! 2. **Always add new migrations** - one function per schema change, bump
//!    [`CURRENT_SCHEMA_VERSION`]
//! 3. **Prefer ALTER TABLE** over DROP/CREATE so stored preferences survive

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Latest applied schema version, 0 for a fresh database
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Bring the database up to [`CURRENT_SCHEMA_VERSION`]
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;

    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Preference store schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Preference store schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running preference store migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("Migration v1 completed");
    }

    Ok(())
}

/// Migration v1: users, preferences and search history tables
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT,
            email TEXT,
            is_onboarded INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users(email)")
        .execute(&mut *tx)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_is_onboarded ON users(is_onboarded)")
        .execute(&mut *tx)
        .await?;

    // location and interests hold JSON documents
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS preferences (
            id TEXT PRIMARY KEY,
            location TEXT,
            interests TEXT NOT NULL DEFAULT '[]',
            budget_min REAL NOT NULL DEFAULT 0,
            budget_max REAL NOT NULL DEFAULT 200,
            group_size TEXT NOT NULL DEFAULT 'solo',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_preferences_updated_at ON preferences(updated_at)",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS search_history (
            id TEXT PRIMARY KEY,
            query TEXT NOT NULL,
            filters TEXT NOT NULL DEFAULT '{}',
            timestamp TEXT NOT NULL
        )
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_search_history_timestamp ON search_history(timestamp)",
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
