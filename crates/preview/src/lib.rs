//! Folio Preview - client side of the per-tab admin view.
//!
//! A browser tab that an admin opens from the dashboard keeps its own
//! session token and a preview marker in tab-local storage. This crate
//! models that tab ([`AdminTab`]), the origin-wide logout broadcast
//! ([`OriginChannel`]), an HTTP client for the admin session API
//! ([`AdminClient`]) and the loaders that fetch draft-inclusive page data
//! for an active preview ([`PreviewAdapter`]).
//!
//! # Example
//!
//! ```rust,ignore
//! let channel = OriginChannel::new();
//! let client = AdminClient::new(Url::parse("http://localhost:3000")?)?;
//! client.login("admin@example.com", "secret").await?;
//!
//! let mut tab = AdminTab::open(&channel);
//! let mut url = Url::parse("http://localhost:3000/blog?admin_view=1")?;
//! tab.on_page_load(&mut url);
//! tab.verify(&client).await?;
//!
//! let data = PreviewAdapter::new(client).blog_list(&mut tab).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod adapter;
pub mod channel;
pub mod client;
pub mod error;
pub mod storage;
pub mod tab;

pub use adapter::{BlogListData, HomeData, PostData, PreviewAdapter, ProjectsData};
pub use channel::{OriginChannel, OriginSignal};
pub use client::{AdminClient, IssuedToken, LoginSession};
pub use error::ClientError;
pub use storage::{AdminViewMarker, MemoryTabStorage, TabStorage};
pub use tab::{AdminTab, SessionApi, ViewState};
