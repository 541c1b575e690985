//! URL handoff between admin tabs.
//!
//! A link opened from an authenticated tab may carry two query parameters:
//!
//! - [`ADMIN_TOKEN_PARAM`]: a one-time per-tab token, copied into the new
//!   tab's storage on load.
//! - [`ADMIN_VIEW_PARAM`]: switches the new tab into admin preview.
//!
//! Both are consumed on page load and removed from the visible URL
//! ([`take_handoff`]). Neither authorizes anything by itself: the server
//! validates the token on every privileged read.

use url::Url;

use crate::types::AdminToken;

/// Query parameter carrying a one-time per-tab token.
pub const ADMIN_TOKEN_PARAM: &str = "admin_token";

/// Query parameter activating admin preview in the receiving tab.
pub const ADMIN_VIEW_PARAM: &str = "admin_view";

/// Where an admin lands after leaving preview.
pub const ADMIN_ENTRY_PATH: &str = "/admin";

/// Parameters consumed from a page URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Handoff {
    /// Token handed over by the opening tab, if any.
    pub token: Option<AdminToken>,
    /// Whether the link asked for admin preview.
    pub admin_view: bool,
}

impl Handoff {
    /// Whether the URL carried any handoff parameter.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.token.is_none() && !self.admin_view
    }
}

/// Consume the handoff parameters and strip them from `url`.
///
/// All other query pairs and the fragment are preserved in order. A malformed
/// token is dropped (and still stripped). `admin_view` counts as set for any
/// non-empty value.
///
/// ```
/// use folio_core::handoff::take_handoff;
/// use url::Url;
///
/// let mut url = Url::parse("https://example.com/blog?admin_token=abc&page=2&admin_view=1").unwrap();
/// let handoff = take_handoff(&mut url);
/// assert!(handoff.admin_view);
/// assert_eq!(url.as_str(), "https://example.com/blog?page=2");
/// ```
pub fn take_handoff(url: &mut Url) -> Handoff {
    let mut handoff = Handoff::default();
    let mut kept: Vec<(String, String)> = Vec::new();

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            ADMIN_TOKEN_PARAM => handoff.token = AdminToken::parse(&value).ok(),
            ADMIN_VIEW_PARAM => handoff.admin_view |= !value.is_empty(),
            _ => kept.push((key.into_owned(), value.into_owned())),
        }
    }

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    handoff
}

/// Build a link that opens `path` in admin preview.
///
/// With a token the receiving tab gets its own session immediately;
/// without one it falls back to the shared cookie and asks the server for a
/// per-tab token once verified.
///
/// # Errors
///
/// Returns an error if `path` cannot be joined onto `base`.
pub fn handoff_url(
    base: &Url,
    path: &str,
    token: Option<&AdminToken>,
) -> Result<Url, url::ParseError> {
    let mut url = base.join(path)?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair(ADMIN_VIEW_PARAM, "1");
        if let Some(token) = token {
            pairs.append_pair(ADMIN_TOKEN_PARAM, token.as_str());
        }
    }
    Ok(url)
}

/// Rewrite a public link so it stays in admin preview.
///
/// Returns `None` for links that must stay untouched: empty, the site root,
/// absolute `http(s)` links, `mailto:`, in-page anchors and anything already
/// under `/admin`. Relative links are resolved against `current_path`.
///
/// ```
/// use folio_core::handoff::preview_href;
///
/// assert_eq!(preview_href("/blog/hello", "/").as_deref(), Some("/blog/hello?admin_view=1"));
/// assert_eq!(preview_href("mailto:me@example.com", "/"), None);
/// ```
#[must_use]
pub fn preview_href(href: &str, current_path: &str) -> Option<String> {
    if href.is_empty()
        || href == "/"
        || href.starts_with("http")
        || href.starts_with("mailto:")
        || href.starts_with('#')
        || href.starts_with(ADMIN_ENTRY_PATH)
    {
        return None;
    }

    let origin = Url::parse("http://preview.invalid/").ok()?;
    let current = origin.join(current_path).ok()?;
    let mut url = current.join(href).ok()?;

    if url.query_pairs().any(|(k, _)| k == ADMIN_VIEW_PARAM) {
        return None;
    }
    url.query_pairs_mut().append_pair(ADMIN_VIEW_PARAM, "1");

    let mut out = url.path().to_owned();
    if let Some(query) = url.query() {
        out.push('?');
        out.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        out.push('#');
        out.push_str(fragment);
    }
    Some(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_take_handoff_strips_both_params() {
        let mut url =
            Url::parse("http://localhost:3000/blog?admin_token=abc123&admin_view=1").unwrap();
        let handoff = take_handoff(&mut url);

        assert_eq!(handoff.token.unwrap().as_str(), "abc123");
        assert!(handoff.admin_view);
        assert_eq!(url.as_str(), "http://localhost:3000/blog");
        assert!(!url.as_str().contains(ADMIN_TOKEN_PARAM));
        assert!(!url.as_str().contains(ADMIN_VIEW_PARAM));
    }

    #[test]
    fn test_take_handoff_keeps_other_params_and_fragment() {
        let mut url =
            Url::parse("http://localhost/blog?tag=rust&admin_view=1&page=2#top").unwrap();
        let handoff = take_handoff(&mut url);

        assert!(handoff.token.is_none());
        assert!(handoff.admin_view);
        assert_eq!(url.as_str(), "http://localhost/blog?tag=rust&page=2#top");
    }

    #[test]
    fn test_take_handoff_without_params_is_noop() {
        let mut url = Url::parse("http://localhost/projects?sort=new").unwrap();
        let handoff = take_handoff(&mut url);

        assert!(handoff.is_empty());
        assert_eq!(url.as_str(), "http://localhost/projects?sort=new");
    }

    #[test]
    fn test_take_handoff_drops_malformed_token() {
        let mut url = Url::parse("http://localhost/?admin_token=").unwrap();
        let handoff = take_handoff(&mut url);

        assert!(handoff.token.is_none());
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_empty_admin_view_is_ignored() {
        let mut url = Url::parse("http://localhost/?admin_view=").unwrap();
        assert!(!take_handoff(&mut url).admin_view);
    }

    #[test]
    fn test_handoff_url_carries_params() {
        let base = Url::parse("http://localhost:3000").unwrap();
        let token = AdminToken::parse("tok123").unwrap();

        let url = handoff_url(&base, "/blog", Some(&token)).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/blog?admin_view=1&admin_token=tok123"
        );

        let url = handoff_url(&base, "/projects", None).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/projects?admin_view=1");
    }

    #[test]
    fn test_preview_href_skips_non_site_links() {
        for href in [
            "",
            "/",
            "https://github.com/",
            "http://example.com",
            "mailto:a@b.c",
            "#section",
            "/admin",
            "/admin/settings",
        ] {
            assert_eq!(preview_href(href, "/"), None, "{href}");
        }
    }

    #[test]
    fn test_preview_href_resolves_relative_links() {
        assert_eq!(
            preview_href("hello", "/blog/").as_deref(),
            Some("/blog/hello?admin_view=1")
        );
        assert_eq!(
            preview_href("/projects?sort=new#list", "/").as_deref(),
            Some("/projects?sort=new&admin_view=1#list")
        );
    }

    #[test]
    fn test_preview_href_is_idempotent() {
        assert_eq!(preview_href("/blog?admin_view=1", "/"), None);
    }
}
