//! In-memory stores for development and tests.
//!
//! Used when no database URL is configured. Nothing survives a restart.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use folio_core::{AdminToken, Post, Project, SettingsAuditEntry, SettingsPatch};
use tokio::sync::RwLock;

use super::{
    AdminSession, ContentStore, SessionStore, SettingsStore, StoreError, StoredSettings,
};

// =============================================================================
// Sessions
// =============================================================================

/// Sessions held in a map keyed by token.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<AdminToken, AdminSession>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the store holds no sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, session: &AdminSession) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.token) {
            return Err(StoreError::Conflict("duplicate session token".to_owned()));
        }
        sessions.insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn find(&self, token: &AdminToken) -> Result<Option<AdminSession>, StoreError> {
        Ok(self.sessions.read().await.get(token).cloned())
    }

    async fn delete(&self, token: &AdminToken) -> Result<bool, StoreError> {
        Ok(self.sessions.write().await.remove(token).is_some())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.len() as u64;
        sessions.clear();
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// =============================================================================
// Settings
// =============================================================================

/// The settings document and audit log held in memory.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    inner: RwLock<SettingsState>,
}

#[derive(Debug, Default)]
struct SettingsState {
    stored: Option<StoredSettings>,
    audit: Vec<SettingsAuditEntry>,
}

impl MemorySettingsStore {
    /// Create a store with nothing written yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<Option<StoredSettings>, StoreError> {
        Ok(self.inner.read().await.stored.clone())
    }

    async fn apply(
        &self,
        patch: &SettingsPatch,
        audit: &SettingsAuditEntry,
    ) -> Result<StoredSettings, StoreError> {
        let mut state = self.inner.write().await;
        let stored = state.stored.get_or_insert_with(StoredSettings::default);
        for (key, value) in patch.iter() {
            stored.flags.insert(key.to_owned(), value.clone());
        }
        stored.updated_at = Some(audit.changed_at);
        stored.updated_by = Some(audit.changed_by.clone());
        let result = stored.clone();
        state.audit.push(audit.clone());
        Ok(result)
    }

    async fn recent_audit(&self, limit: u32) -> Result<Vec<SettingsAuditEntry>, StoreError> {
        let state = self.inner.read().await;
        Ok(state
            .audit
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

// =============================================================================
// Content
// =============================================================================

/// Posts and projects held in memory.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    posts: RwLock<BTreeMap<String, Post>>,
    projects: RwLock<Vec<Project>>,
}

impl MemoryContentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn list_posts(&self, include_drafts: bool) -> Result<Vec<Post>, StoreError> {
        let posts = self.posts.read().await;
        let mut list: Vec<Post> = posts
            .values()
            .filter(|post| include_drafts || post.published)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn find_post(&self, slug: &str) -> Result<Option<Post>, StoreError> {
        Ok(self.posts.read().await.get(slug).cloned())
    }

    async fn insert_post(&self, post: &Post) -> Result<(), StoreError> {
        let mut posts = self.posts.write().await;
        if posts.contains_key(&post.slug) {
            return Err(StoreError::Conflict(format!(
                "post {} already exists",
                post.slug
            )));
        }
        posts.insert(post.slug.clone(), post.clone());
        Ok(())
    }

    async fn list_projects(&self, include_drafts: bool) -> Result<Vec<Project>, StoreError> {
        let projects = self.projects.read().await;
        let mut list: Vec<Project> = projects
            .iter()
            .filter(|project| include_drafts || project.published)
            .cloned()
            .collect();
        list.sort_by_key(|project| (project.position, project.id));
        Ok(list)
    }

    async fn insert_project(&self, project: &Project) -> Result<Project, StoreError> {
        let mut projects = self.projects.write().await;
        let id = projects.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let stored = Project {
            id,
            ..project.clone()
        };
        projects.push(stored.clone());
        Ok(stored)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use folio_core::SettingValue;

    use super::*;

    fn session(token: &str, expires_at: DateTime<Utc>) -> AdminSession {
        AdminSession {
            token: AdminToken::parse(token).unwrap(),
            admin_identity: "admin@example.com".to_owned(),
            created_at: expires_at - Duration::hours(1),
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_session_insert_find_delete() {
        let store = MemorySessionStore::new();
        let s = session("tok-a", Utc::now());
        store.insert(&s).await.unwrap();

        assert_eq!(store.find(&s.token).await.unwrap(), Some(s.clone()));
        assert!(store.delete(&s.token).await.unwrap());
        assert!(!store.delete(&s.token).await.unwrap());
        assert!(store.find(&s.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_expired_keeps_live_sessions() {
        let store = MemorySessionStore::new();
        let now = Utc::now();
        store.insert(&session("old", now - Duration::seconds(1))).await.unwrap();
        store.insert(&session("live", now + Duration::hours(1))).await.unwrap();

        assert_eq!(store.delete_expired(now).await.unwrap(), 1);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.delete_all().await.unwrap(), 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_settings_apply_merges_and_audits() {
        let store = MemorySettingsStore::new();
        assert!(store.load().await.unwrap().is_none());

        let at = Utc::now();
        let audit = |keys: &[&str]| SettingsAuditEntry {
            changed_keys: keys.iter().map(|k| (*k).to_owned()).collect(),
            changed_by: "a***@example.com".to_owned(),
            changed_at: at,
        };

        store
            .apply(&SettingsPatch::new().set("showStats", false), &audit(&["showStats"]))
            .await
            .unwrap();
        let stored = store
            .apply(&SettingsPatch::new().set("showBlog", false), &audit(&["showBlog"]))
            .await
            .unwrap();

        assert_eq!(stored.flags.get("showStats"), Some(&SettingValue::Bool(false)));
        assert_eq!(stored.flags.get("showBlog"), Some(&SettingValue::Bool(false)));
        assert_eq!(stored.updated_by.as_deref(), Some("a***@example.com"));

        let log = store.recent_audit(10).await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].changed_keys, vec!["showBlog".to_owned()]);
        assert_eq!(store.recent_audit(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_posts_hide_drafts_and_sort_newest_first() {
        let store = MemoryContentStore::new();
        let now = Utc::now();
        let post = |slug: &str, published: bool, age: i64| Post {
            slug: slug.to_owned(),
            title: slug.to_owned(),
            excerpt: String::new(),
            content: String::new(),
            published,
            created_at: now - Duration::days(age),
            updated_at: now,
        };
        store.insert_post(&post("old", true, 3)).await.unwrap();
        store.insert_post(&post("draft", false, 1)).await.unwrap();
        store.insert_post(&post("new", true, 0)).await.unwrap();

        let public: Vec<String> = store
            .list_posts(false)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.slug)
            .collect();
        assert_eq!(public, vec!["new", "old"]);
        assert_eq!(store.list_posts(true).await.unwrap().len(), 3);

        let err = store.insert_post(&post("new", true, 0)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_projects_ordered_by_position() {
        let store = MemoryContentStore::new();
        let project = |title: &str, position: i32, published: bool| Project {
            id: 0,
            title: title.to_owned(),
            summary: String::new(),
            url: None,
            published,
            position,
            created_at: Utc::now(),
        };
        store.insert_project(&project("second", 2, true)).await.unwrap();
        let first = store.insert_project(&project("first", 1, true)).await.unwrap();
        store.insert_project(&project("hidden", 0, false)).await.unwrap();

        assert_eq!(first.id, 2);
        let titles: Vec<String> = store
            .list_projects(false)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["first", "second"]);
        assert_eq!(store.list_projects(true).await.unwrap()[0].title, "hidden");
    }
}
