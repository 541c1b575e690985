//! Preview data adapter.
//!
//! Each public page type has a data loader here. In an active admin tab the
//! loader sends the tab's token so drafts are included; otherwise it reads
//! exactly what an anonymous visitor gets, even when the browser holds an
//! admin cookie. A 401 on a preview read triggers
//! one reseed through the session cookie and one retry, never more.

use folio_core::{Post, Project, SiteSettings};
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::client::AdminClient;
use crate::error::ClientError;
use crate::storage::TabStorage;
use crate::tab::AdminTab;

/// Number of posts shown on the home page.
const RECENT_POSTS_COUNT: usize = 3;

/// Data behind the home page.
#[derive(Debug, Clone)]
pub struct HomeData {
    pub settings: SiteSettings,
    pub recent_posts: Vec<Post>,
}

/// Data behind the blog index.
#[derive(Debug, Clone)]
pub struct BlogListData {
    pub settings: SiteSettings,
    pub posts: Vec<Post>,
}

/// Data behind a single post page.
#[derive(Debug, Clone)]
pub struct PostData {
    pub settings: SiteSettings,
    pub post: Post,
}

/// Data behind the projects page.
#[derive(Debug, Clone)]
pub struct ProjectsData {
    pub settings: SiteSettings,
    pub projects: Vec<Project>,
}

/// Loads page data for public or admin-preview rendering.
#[derive(Debug, Clone)]
pub struct PreviewAdapter {
    client: AdminClient,
}

impl PreviewAdapter {
    /// Create an adapter over `client`.
    #[must_use]
    pub const fn new(client: AdminClient) -> Self {
        Self { client }
    }

    /// The underlying client.
    #[must_use]
    pub const fn client(&self) -> &AdminClient {
        &self.client
    }

    /// Home page: settings and the newest posts.
    ///
    /// # Errors
    ///
    /// Returns error if a read fails after the single retry.
    pub async fn home<S: TabStorage>(
        &self,
        tab: &mut AdminTab<S>,
    ) -> Result<HomeData, ClientError> {
        let settings = self.client.settings().await?;
        let mut recent_posts: Vec<Post> = self.fetch(tab, "/api/posts").await?;
        recent_posts.truncate(RECENT_POSTS_COUNT);
        Ok(HomeData {
            settings,
            recent_posts,
        })
    }

    /// Blog index: settings and every visible post.
    ///
    /// # Errors
    ///
    /// Returns error if a read fails after the single retry.
    pub async fn blog_list<S: TabStorage>(
        &self,
        tab: &mut AdminTab<S>,
    ) -> Result<BlogListData, ClientError> {
        let settings = self.client.settings().await?;
        let posts = self.fetch(tab, "/api/posts").await?;
        Ok(BlogListData { settings, posts })
    }

    /// Single post page.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` for unknown slugs, and for drafts
    /// outside an active admin tab.
    pub async fn post<S: TabStorage>(
        &self,
        tab: &mut AdminTab<S>,
        slug: &str,
    ) -> Result<PostData, ClientError> {
        let settings = self.client.settings().await?;
        let post = self.fetch(tab, &format!("/api/posts/{slug}")).await?;
        Ok(PostData { settings, post })
    }

    /// Projects page.
    ///
    /// # Errors
    ///
    /// Returns error if a read fails after the single retry.
    pub async fn projects<S: TabStorage>(
        &self,
        tab: &mut AdminTab<S>,
    ) -> Result<ProjectsData, ClientError> {
        let settings = self.client.settings().await?;
        let projects = self.fetch(tab, "/api/projects").await?;
        Ok(ProjectsData { settings, projects })
    }

    /// GET `path` as the tab sees it.
    #[instrument(skip(self, tab))]
    async fn fetch<T, S>(&self, tab: &mut AdminTab<S>, path: &str) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        S: TabStorage,
    {
        if !tab.is_active() {
            return self.client.get_anonymous(path).await;
        }

        let token = tab.token();
        match self.client.get_json(path, token.as_ref()).await {
            Err(ClientError::Unauthorized) => {}
            other => return other,
        }

        // The tab token is dead; only the cookie can vouch for a new one.
        tracing::info!("preview read unauthorized, reseeding tab session");
        let issued = match self.client.seed(None).await {
            Ok(issued) => issued,
            Err(e) => {
                if e.is_unauthorized() {
                    tab.deactivate();
                }
                return Err(e);
            }
        };
        tab.adopt_token(&issued.token);

        self.client.get_json(path, Some(&issued.token)).await
    }
}
