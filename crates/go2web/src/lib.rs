//! go2web - minimal socket-level HTTP client
//!
//! This crate speaks HTTP/1.1 directly over TCP (or TLS), follows
//! redirects, prettifies JSON, and caches response bodies on disk keyed by
//! URL. The single core operation is [`Fetcher::fetch`]: fetch the body of a
//! URL, following redirects, honoring the cache.
//!
//! ```no_run
//! # async fn run() -> Result<(), go2web::FetchError> {
//! use go2web::{FetchRequest, Fetcher};
//! use std::time::Duration;
//!
//! let fetcher = Fetcher::builder()
//!     .cache_dir("/tmp/go2web-cache")
//!     .max_age(Duration::from_secs(300))
//!     .build();
//! let body = fetcher.fetch(&FetchRequest::new("example.com")).await?;
//! println!("{}", body);
//! # Ok(())
//! # }
//! ```
//!
//! The [`search`] module layers DuckDuckGo result extraction on top.

pub mod cache;
pub mod client;
pub mod connector;
mod convert;
mod error;
pub mod http;
pub mod search;
mod types;

pub use cache::DiskCache;
pub use client::{fetch, FetchConfig, Fetcher, FetcherBuilder};
pub use connector::{Connection, Connector, TcpConnector};
pub use convert::{html_to_text, is_html, prettify_json, to_pretty_json};
pub use error::FetchError;
pub use types::{normalize_url, FetchRequest, Scheme, SearchResult, Target};

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str = "go2web/1.0";
