//! Client preference store
//!
//! A local SQLite database holding the single user's profile, preferences and
//! search history. The store owns exactly one pool of exactly one connection,
//! created lazily on first use; concurrent first callers wait on the same
//! initialisation instead of opening their own connection.
//!
//! Every write runs inside an explicit transaction and only returns after
//! `commit()` has completed. Journal mode is DELETE so a commit is on disk
//! when it is acknowledged.

use crate::db::schema::run_migrations;
use crate::models::{
    BudgetRange, SearchFilters, SearchHistoryEntry, UserLocation, UserPreferences, UserProfile,
    DEFAULT_USER_ID,
};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use uuid::Uuid;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection options shared by the store and anything inspecting its file
pub fn connect_options(path: &Path) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Delete)
        .busy_timeout(BUSY_TIMEOUT)
        .foreign_keys(true)
}

pub struct PreferenceStore {
    path: PathBuf,
    pool: OnceCell<SqlitePool>,
}

impl PreferenceStore {
    /// Create a store for the database at `path` without connecting
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pool: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.pool.initialized()
    }

    /// Open the connection and apply migrations. Later calls reuse the same pool.
    pub async fn open(&self) -> Result<&SqlitePool> {
        self.pool
            .get_or_try_init(|| async {
                if let Some(parent) = self.path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }

                let newly_created = !self.path.exists();
                let pool = SqlitePoolOptions::new()
                    .max_connections(1)
                    .min_connections(1)
                    .connect_with(connect_options(&self.path))
                    .await?;

                if newly_created {
                    info!("Created preference store: {}", self.path.display());
                } else {
                    info!("Opened preference store: {}", self.path.display());
                }

                run_migrations(&pool).await?;
                Ok::<_, Error>(pool)
            })
            .await
    }

    /// Close the connection. The store cannot be reopened afterwards.
    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
            debug!("Preference store closed");
        }
    }

    async fn pool(&self) -> Result<&SqlitePool> {
        self.open().await
    }

    // ---------------------------------------------------------------------
    // Users
    // ---------------------------------------------------------------------

    pub async fn get_user_profile(&self, id: &str) -> Result<Option<UserProfile>> {
        let pool = self.pool().await?;
        let row = sqlx::query(
            "SELECT id, name, email, is_onboarded, created_at, updated_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        row.as_ref().map(profile_from_row).transpose()
    }

    pub async fn get_default_user_profile(&self) -> Result<Option<UserProfile>> {
        self.get_user_profile(DEFAULT_USER_ID).await
    }

    /// Upsert by id; `created_at` of an existing row is kept
    pub async fn save_user_profile(&self, profile: &UserProfile) -> Result<UserProfile> {
        let pool = self.pool().await?;
        let mut tx = pool.begin().await?;

        upsert_profile(&mut tx, profile, Utc::now()).await?;
        let saved = fetch_profile(&mut tx, &profile.id).await?;

        tx.commit().await?;
        debug!(user_id = %profile.id, "Saved user profile");
        Ok(saved)
    }

    /// Return the default profile, creating it (not onboarded) when absent
    ///
    /// Insert-if-absent and read happen in one transaction, so repeated
    /// calls never duplicate or reset the profile.
    pub async fn ensure_default_user(&self) -> Result<UserProfile> {
        let pool = self.pool().await?;
        let mut tx = pool.begin().await?;

        let now = Utc::now();
        let inserted = sqlx::query(
            r#"
            INSERT INTO users (id, name, email, is_onboarded, created_at, updated_at)
            VALUES (?, NULL, NULL, 0, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(DEFAULT_USER_ID)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let profile = fetch_profile(&mut tx, DEFAULT_USER_ID).await?;
        tx.commit().await?;

        if inserted > 0 {
            info!("Created default user profile");
        }
        Ok(profile)
    }

    // ---------------------------------------------------------------------
    // Preferences
    // ---------------------------------------------------------------------

    pub async fn get_user_preferences(&self, id: &str) -> Result<Option<UserPreferences>> {
        let pool = self.pool().await?;
        let row = sqlx::query(
            r#"
            SELECT id, location, interests, budget_min, budget_max, group_size, created_at, updated_at
            FROM preferences WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        row.as_ref().map(preferences_from_row).transpose()
    }

    pub async fn get_default_user_preferences(&self) -> Result<Option<UserPreferences>> {
        self.get_user_preferences(DEFAULT_USER_ID).await
    }

    /// Upsert by id; `created_at` of an existing row is kept
    pub async fn save_user_preferences(&self, prefs: &UserPreferences) -> Result<UserPreferences> {
        let pool = self.pool().await?;
        let mut tx = pool.begin().await?;

        upsert_preferences(&mut tx, prefs, Utc::now()).await?;
        let saved = fetch_preferences(&mut tx, &prefs.id).await?;

        tx.commit().await?;
        debug!(user_id = %prefs.id, "Saved user preferences");
        Ok(saved)
    }

    /// Return stored preferences, persisting the defaults when none exist
    pub async fn ensure_default_preferences(&self) -> Result<UserPreferences> {
        let pool = self.pool().await?;
        let mut tx = pool.begin().await?;

        let defaults = UserPreferences::new_default();
        sqlx::query(
            r#"
            INSERT INTO preferences
                (id, location, interests, budget_min, budget_max, group_size, created_at, updated_at)
            VALUES (?, NULL, '[]', ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&defaults.id)
        .bind(defaults.budget_range.min)
        .bind(defaults.budget_range.max)
        .bind(defaults.group_size.as_str())
        .bind(defaults.created_at)
        .bind(defaults.updated_at)
        .execute(&mut *tx)
        .await?;

        let prefs = fetch_preferences(&mut tx, DEFAULT_USER_ID).await?;
        tx.commit().await?;
        Ok(prefs)
    }

    /// Persist finished onboarding: preferences plus the onboarded flag, atomically
    pub async fn complete_onboarding(
        &self,
        prefs: &UserPreferences,
    ) -> Result<(UserProfile, UserPreferences)> {
        let pool = self.pool().await?;
        let mut tx = pool.begin().await?;
        let now = Utc::now();

        upsert_preferences(&mut tx, prefs, now).await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, is_onboarded, created_at, updated_at)
            VALUES (?, NULL, NULL, 1, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                is_onboarded = 1,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&prefs.id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let profile = fetch_profile(&mut tx, &prefs.id).await?;
        let saved = fetch_preferences(&mut tx, &prefs.id).await?;

        tx.commit().await?;
        info!(
            user_id = %prefs.id,
            interests = saved.interests.len(),
            "Onboarding completed"
        );
        Ok((profile, saved))
    }

    // ---------------------------------------------------------------------
    // Search history
    // ---------------------------------------------------------------------

    pub async fn add_search_history(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<SearchHistoryEntry> {
        let pool = self.pool().await?;
        let entry = SearchHistoryEntry {
            id: Uuid::new_v4().to_string(),
            query: query.to_string(),
            filters: filters.clone(),
            timestamp: Utc::now(),
        };

        let mut tx = pool.begin().await?;
        sqlx::query("INSERT INTO search_history (id, query, filters, timestamp) VALUES (?, ?, ?, ?)")
            .bind(&entry.id)
            .bind(&entry.query)
            .bind(serde_json::to_string(&entry.filters)?)
            .bind(entry.timestamp)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(entry)
    }

    /// Most recent entries first, at most `limit`
    pub async fn recent_search_history(&self, limit: u32) -> Result<Vec<SearchHistoryEntry>> {
        let pool = self.pool().await?;
        let rows = sqlx::query(
            r#"
            SELECT id, query, filters, timestamp FROM search_history
            ORDER BY timestamp DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(pool)
        .await?;

        rows.iter().map(history_from_row).collect()
    }

    pub async fn clear_search_history(&self) -> Result<()> {
        let pool = self.pool().await?;
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM search_history")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Delete every record in every collection, all or nothing
    pub async fn clear_all_data(&self) -> Result<()> {
        let pool = self.pool().await?;
        let mut tx = pool.begin().await?;

        for table in ["users", "preferences", "search_history"] {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!("Cleared all preference store data");
        Ok(())
    }
}

async fn upsert_profile(
    conn: &mut SqliteConnection,
    profile: &UserProfile,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, is_onboarded, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            email = excluded.email,
            is_onboarded = excluded.is_onboarded,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&profile.id)
    .bind(&profile.name)
    .bind(&profile.email)
    .bind(profile.is_onboarded)
    .bind(profile.created_at)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(())
}

async fn upsert_preferences(
    conn: &mut SqliteConnection,
    prefs: &UserPreferences,
    now: DateTime<Utc>,
) -> Result<()> {
    let location = prefs
        .location
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let interests = serde_json::to_string(&prefs.interests)?;

    sqlx::query(
        r#"
        INSERT INTO preferences
            (id, location, interests, budget_min, budget_max, group_size, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            location = excluded.location,
            interests = excluded.interests,
            budget_min = excluded.budget_min,
            budget_max = excluded.budget_max,
            group_size = excluded.group_size,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&prefs.id)
    .bind(location)
    .bind(interests)
    .bind(prefs.budget_range.min)
    .bind(prefs.budget_range.max)
    .bind(prefs.group_size.as_str())
    .bind(prefs.created_at)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(())
}

async fn fetch_profile(conn: &mut SqliteConnection, id: &str) -> Result<UserProfile> {
    let row = sqlx::query(
        "SELECT id, name, email, is_onboarded, created_at, updated_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| Error::NotFound(format!("User profile {}", id)))?;

    profile_from_row(&row)
}

async fn fetch_preferences(conn: &mut SqliteConnection, id: &str) -> Result<UserPreferences> {
    let row = sqlx::query(
        r#"
        SELECT id, location, interests, budget_min, budget_max, group_size, created_at, updated_at
        FROM preferences WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Preferences {}", id)))?;

    preferences_from_row(&row)
}

fn profile_from_row(row: &SqliteRow) -> Result<UserProfile> {
    Ok(UserProfile {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        is_onboarded: row.try_get("is_onboarded")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn preferences_from_row(row: &SqliteRow) -> Result<UserPreferences> {
    let location: Option<String> = row.try_get("location")?;
    let location: Option<UserLocation> = location
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?;
    let interests: String = row.try_get("interests")?;
    let group_size: String = row.try_get("group_size")?;

    Ok(UserPreferences {
        id: row.try_get("id")?,
        location,
        interests: serde_json::from_str(&interests)?,
        budget_range: BudgetRange {
            min: row.try_get("budget_min")?,
            max: row.try_get("budget_max")?,
        },
        group_size: group_size.parse()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn history_from_row(row: &SqliteRow) -> Result<SearchHistoryEntry> {
    let filters: String = row.try_get("filters")?;
    Ok(SearchHistoryEntry {
        id: row.try_get("id")?,
        query: row.try_get("query")?,
        filters: serde_json::from_str(&filters)?,
        timestamp: row.try_get("timestamp")?,
    })
}
