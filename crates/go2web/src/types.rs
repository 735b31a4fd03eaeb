//! Core types for go2web

use crate::error::FetchError;
use serde::{Deserialize, Serialize};
use url::Url;

/// Transport scheme of a request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scheme {
    /// Plain TCP
    #[default]
    Http,
    /// TCP with TLS
    Https,
}

impl Scheme {
    /// Port used when the URL does not name one
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scheme::Http => write!(f, "http"),
            Scheme::Https => write!(f, "https"),
        }
    }
}

/// Where a single request goes: resolved from a normalized URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    /// Path plus `?query`, never empty
    pub path: String,
}

impl Target {
    /// Resolve a target from an already-normalized URL
    pub fn from_url(url: &Url) -> Result<Self, FetchError> {
        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => {
                return Err(FetchError::InvalidUrl(format!(
                    "unsupported scheme '{}'",
                    other
                )))
            }
        };

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| FetchError::InvalidUrl(format!("no host in '{}'", url)))?;
        // IPv6 literals come back bracketed; sockets and SNI want them bare
        let host = host.trim_start_matches('[').trim_end_matches(']').to_string();

        let port = url.port().unwrap_or_else(|| scheme.default_port());

        let mut path = if url.path().is_empty() {
            "/".to_string()
        } else {
            url.path().to_string()
        };
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }

        Ok(Self {
            scheme,
            host,
            port,
            path,
        })
    }

    /// Value for the `Host` header; the port is only spelled out when it
    /// differs from the scheme default
    pub fn host_header(&self) -> String {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        if self.port == self.scheme.default_port() {
            host
        } else {
            format!("{}:{}", host, self.port)
        }
    }
}

/// Normalize caller input into an absolute http(s) URL
///
/// Input without an `http://` or `https://` prefix gets `http://` prepended.
pub fn normalize_url(raw: &str) -> Result<Url, FetchError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FetchError::MissingUrl);
    }

    let lower = raw.to_ascii_lowercase();
    let absolute = if lower.starts_with("http://") || lower.starts_with("https://") {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    };

    Url::parse(&absolute).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", raw, e)))
}

/// Request to fetch a URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    /// The URL to fetch; the scheme may be omitted
    pub url: String,

    /// Read from and write to the disk cache
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,

    /// Ask for JSON and leave JSON bodies untouched for strict parsing
    #[serde(default)]
    pub want_json: bool,
}

fn default_use_cache() -> bool {
    true
}

impl FetchRequest {
    /// Create a new request with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            use_cache: true,
            want_json: false,
        }
    }

    /// Negotiate JSON
    pub fn json(mut self) -> Self {
        self.want_json = true;
        self
    }

    /// Bypass the disk cache
    pub fn no_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    /// Set cache usage explicitly
    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// Accept header sent for this request
    pub fn accept(&self) -> &'static str {
        if self.want_json {
            "application/json"
        } else {
            "text/html, application/json"
        }
    }
}

/// One extracted search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// 1-based rank on the results page
    pub index: usize,
    pub title: String,
    pub url: String,
}
