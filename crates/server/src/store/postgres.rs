//! `PostgreSQL` stores.
//!
//! Queries are built at runtime with `sqlx::query`/`query_as` so the crate
//! builds without a live database.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use folio_core::{AdminToken, Post, Project, SettingValue, SettingsAuditEntry, SettingsPatch};
use sqlx::PgPool;
use sqlx::types::Json;

use super::{
    AdminSession, ContentStore, SessionStore, SettingsStore, StoreError, StoredSettings,
};

/// Id of the singleton settings row.
const SETTINGS_ROW_ID: &str = "site_settings";

/// Postgres unique-violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

fn map_unique_violation(err: sqlx::Error, what: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::Conflict(format!("{what} already exists"))
        }
        _ => StoreError::Database(err),
    }
}

// =============================================================================
// Sessions
// =============================================================================

/// Sessions in `folio.admin_session`.
#[derive(Debug, Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    /// Create a store over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn insert(&self, session: &AdminSession) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO folio.admin_session (token, admin_identity, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(&session.token)
        .bind(&session.admin_identity)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "session token"))?;

        Ok(())
    }

    async fn find(&self, token: &AdminToken) -> Result<Option<AdminSession>, StoreError> {
        let session = sqlx::query_as::<_, AdminSession>(
            r"
            SELECT token, admin_identity, created_at, expires_at
            FROM folio.admin_session
            WHERE token = $1
            ",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn delete(&self, token: &AdminToken) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM folio.admin_session WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM folio.admin_session WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM folio.admin_session")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Settings in `folio.site_settings` with the log in `folio.settings_audit`.
#[derive(Debug, Clone)]
pub struct PgSettingsStore {
    pool: PgPool,
}

impl PgSettingsStore {
    /// Create a store over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SettingsRow {
    flags: Json<BTreeMap<String, serde_json::Value>>,
    updated_at: Option<DateTime<Utc>>,
    updated_by: Option<String>,
}

impl TryFrom<SettingsRow> for StoredSettings {
    type Error = StoreError;

    fn try_from(row: SettingsRow) -> Result<Self, Self::Error> {
        let mut flags = BTreeMap::new();
        for (key, value) in row.flags.0 {
            let value = match value {
                serde_json::Value::Bool(b) => SettingValue::Bool(b),
                serde_json::Value::String(s) => SettingValue::Text(s),
                other => {
                    return Err(StoreError::DataCorruption(format!(
                        "setting {key} has unsupported value {other}"
                    )));
                }
            };
            flags.insert(key, value);
        }
        Ok(Self {
            flags,
            updated_at: row.updated_at,
            updated_by: row.updated_by,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AuditRow {
    changed_keys: Json<Vec<String>>,
    changed_by: String,
    changed_at: DateTime<Utc>,
}

impl From<AuditRow> for SettingsAuditEntry {
    fn from(row: AuditRow) -> Self {
        Self {
            changed_keys: row.changed_keys.0,
            changed_by: row.changed_by,
            changed_at: row.changed_at,
        }
    }
}

#[async_trait]
impl SettingsStore for PgSettingsStore {
    async fn load(&self) -> Result<Option<StoredSettings>, StoreError> {
        let row = sqlx::query_as::<_, SettingsRow>(
            "SELECT flags, updated_at, updated_by FROM folio.site_settings WHERE id = $1",
        )
        .bind(SETTINGS_ROW_ID)
        .fetch_optional(&self.pool)
        .await?;

        row.map(StoredSettings::try_from).transpose()
    }

    async fn apply(
        &self,
        patch: &SettingsPatch,
        audit: &SettingsAuditEntry,
    ) -> Result<StoredSettings, StoreError> {
        let mut tx = self.pool.begin().await?;

        // `||` merges the patch into the stored object key by key.
        let row = sqlx::query_as::<_, SettingsRow>(
            r"
            INSERT INTO folio.site_settings (id, flags, updated_at, updated_by)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET flags = folio.site_settings.flags || EXCLUDED.flags,
                updated_at = EXCLUDED.updated_at,
                updated_by = EXCLUDED.updated_by
            RETURNING flags, updated_at, updated_by
            ",
        )
        .bind(SETTINGS_ROW_ID)
        .bind(Json(patch.to_json()))
        .bind(audit.changed_at)
        .bind(&audit.changed_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r"
            INSERT INTO folio.settings_audit (changed_keys, changed_by, changed_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(Json(&audit.changed_keys))
        .bind(&audit.changed_by)
        .bind(audit.changed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        StoredSettings::try_from(row)
    }

    async fn recent_audit(&self, limit: u32) -> Result<Vec<SettingsAuditEntry>, StoreError> {
        let rows = sqlx::query_as::<_, AuditRow>(
            r"
            SELECT changed_keys, changed_by, changed_at
            FROM folio.settings_audit
            ORDER BY changed_at DESC, id DESC
            LIMIT $1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SettingsAuditEntry::from).collect())
    }
}

// =============================================================================
// Content
// =============================================================================

/// Posts in `folio.post` and projects in `folio.project`.
#[derive(Debug, Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    /// Create a store over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn list_posts(&self, include_drafts: bool) -> Result<Vec<Post>, StoreError> {
        let posts = sqlx::query_as::<_, Post>(
            r"
            SELECT slug, title, excerpt, content, published, created_at, updated_at
            FROM folio.post
            WHERE published OR $1
            ORDER BY created_at DESC
            ",
        )
        .bind(include_drafts)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn find_post(&self, slug: &str) -> Result<Option<Post>, StoreError> {
        let post = sqlx::query_as::<_, Post>(
            r"
            SELECT slug, title, excerpt, content, published, created_at, updated_at
            FROM folio.post
            WHERE slug = $1
            ",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn insert_post(&self, post: &Post) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO folio.post (slug, title, excerpt, content, published, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.excerpt)
        .bind(&post.content)
        .bind(post.published)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, &format!("post {}", post.slug)))?;

        Ok(())
    }

    async fn list_projects(&self, include_drafts: bool) -> Result<Vec<Project>, StoreError> {
        let projects = sqlx::query_as::<_, Project>(
            r"
            SELECT id, title, summary, url, published, position, created_at
            FROM folio.project
            WHERE published OR $1
            ORDER BY position ASC, id ASC
            ",
        )
        .bind(include_drafts)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    async fn insert_project(&self, project: &Project) -> Result<Project, StoreError> {
        let stored = sqlx::query_as::<_, Project>(
            r"
            INSERT INTO folio.project (title, summary, url, published, position, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, summary, url, published, position, created_at
            ",
        )
        .bind(&project.title)
        .bind(&project.summary)
        .bind(&project.url)
        .bind(project.published)
        .bind(project.position)
        .bind(project.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }
}
