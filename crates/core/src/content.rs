//! Post and project records exposed by the public API.
//!
//! Unpublished records are drafts: only a validated admin ever sees them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum slug length.
pub const MAX_SLUG_LENGTH: usize = 100;

/// Maximum title length.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Errors raised when validating submitted content.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// The slug is empty, too long, or not lowercase-kebab.
    #[error("slug must be 1-{MAX_SLUG_LENGTH} lowercase letters, digits or dashes")]
    InvalidSlug,
    /// The title is empty or too long.
    #[error("title must be 1-{MAX_TITLE_LENGTH} characters")]
    InvalidTitle,
}

/// A blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Post {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Whether the post is a draft.
    #[must_use]
    pub const fn is_draft(&self) -> bool {
        !self.published
    }
}

/// Body of a post creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub published: bool,
}

impl NewPost {
    /// Check slug and title, returning the normalized request.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] for a malformed slug or title.
    pub fn validate(mut self) -> Result<Self, ContentError> {
        self.slug = self.slug.trim().to_owned();
        self.title = self.title.trim().to_owned();

        if !is_valid_slug(&self.slug) {
            return Err(ContentError::InvalidSlug);
        }
        if self.title.is_empty() || self.title.chars().count() > MAX_TITLE_LENGTH {
            return Err(ContentError::InvalidTitle);
        }
        Ok(self)
    }

    /// Turn the request into a stored post stamped with `now`.
    #[must_use]
    pub fn into_post(self, now: DateTime<Utc>) -> Post {
        Post {
            slug: self.slug,
            title: self.title,
            excerpt: self.excerpt,
            content: self.content,
            published: self.published,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A portfolio project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub url: Option<String>,
    pub published: bool,
    /// Display order, ascending.
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= MAX_SLUG_LENGTH
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn new_post(slug: &str, title: &str) -> NewPost {
        NewPost {
            slug: slug.to_owned(),
            title: title.to_owned(),
            excerpt: String::new(),
            content: String::new(),
            published: false,
        }
    }

    #[test]
    fn test_validate_trims_and_accepts() {
        let post = new_post(" hello-world-2 ", " Hello ").validate().unwrap();
        assert_eq!(post.slug, "hello-world-2");
        assert_eq!(post.title, "Hello");
    }

    #[test]
    fn test_validate_rejects_bad_slugs() {
        for slug in ["", "Upper", "with space", "-lead", "trail-", "a/b"] {
            assert_eq!(
                new_post(slug, "Title").validate(),
                Err(ContentError::InvalidSlug),
                "{slug}"
            );
        }
        let long = "a".repeat(MAX_SLUG_LENGTH + 1);
        assert_eq!(
            new_post(&long, "Title").validate(),
            Err(ContentError::InvalidSlug)
        );
    }

    #[test]
    fn test_validate_rejects_empty_title() {
        assert_eq!(
            new_post("ok", "   ").validate(),
            Err(ContentError::InvalidTitle)
        );
    }

    #[test]
    fn test_new_post_defaults_to_draft() {
        let parsed: NewPost =
            serde_json::from_str(r#"{"slug": "draft", "title": "Draft"}"#).unwrap();
        let post = parsed.into_post(Utc::now());
        assert!(post.is_draft());
        assert_eq!(post.created_at, post.updated_at);
    }

    #[test]
    fn test_post_serializes_camel_case() {
        let post = new_post("a", "A").into_post(Utc::now());
        let value = serde_json::to_value(&post).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("created_at").is_none());
    }
}
