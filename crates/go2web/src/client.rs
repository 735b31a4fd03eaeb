//! HTTP client for go2web
//!
//! [`Fetcher`] owns the request lifecycle: normalize the URL, consult the
//! disk cache, connect, send, read until the server closes, parse, follow
//! redirects, post-process the body and write it back to the cache.

use crate::cache::{DiskCache, DEFAULT_CACHE_DIR, DEFAULT_MAX_AGE};
use crate::connector::{Connection, Connector, TcpConnector};
use crate::convert::{is_json_content_type, prettify_json};
use crate::error::FetchError;
use crate::http::{build_request, parse_response, Response};
use crate::types::{normalize_url, FetchRequest, Target};
use crate::DEFAULT_USER_AGENT;
use bytes::BytesMut;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};

/// Bytes requested from the socket per read
const READ_CHUNK_SIZE: usize = 4096;

/// Default deadline for TCP connect and for the TLS handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default deadline for each send and each receive call
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Default redirect hop limit
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Fetcher configuration
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Directory holding cache records
    pub cache_dir: PathBuf,
    /// Records older than this are ignored for reads
    pub max_age: Duration,
    /// Deadline for TCP connect and, separately, the TLS handshake
    pub connect_timeout: Duration,
    /// Deadline for each send and each receive call
    pub read_timeout: Duration,
    /// Redirect hops allowed before giving up
    pub max_redirects: usize,
    /// User-Agent header value
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            max_age: DEFAULT_MAX_AGE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Builder for configuring a [`Fetcher`]
#[derive(Default)]
pub struct FetcherBuilder {
    config: FetchConfig,
    connector: Option<Arc<dyn Connector>>,
}

impl FetcherBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn config(mut self, config: FetchConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the cache directory
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = dir.into();
        self
    }

    /// Set the cache freshness window
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.config.max_age = max_age;
        self
    }

    /// Set the connect and TLS handshake deadline
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the per-call send and receive deadline
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Set the redirect hop limit
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.config.max_redirects = max;
        self
    }

    /// Set a custom User-Agent
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    /// Replace the network connector
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Build the fetcher
    pub fn build(self) -> Fetcher {
        let cache = DiskCache::new(self.config.cache_dir.clone(), self.config.max_age);
        Fetcher {
            config: self.config,
            cache,
            connector: self
                .connector
                .unwrap_or_else(|| Arc::new(TcpConnector::new())),
        }
    }
}

/// Configured HTTP fetcher
pub struct Fetcher {
    config: FetchConfig,
    cache: DiskCache,
    connector: Arc<dyn Connector>,
}

impl Default for Fetcher {
    fn default() -> Self {
        FetcherBuilder::new().build()
    }
}

impl Fetcher {
    /// Create a fetcher with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new fetcher builder
    pub fn builder() -> FetcherBuilder {
        FetcherBuilder::new()
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn cache(&self) -> &DiskCache {
        &self.cache
    }

    /// Fetch `url` with caching on and no JSON negotiation
    pub async fn get(&self, url: &str) -> Result<String, FetchError> {
        self.fetch(&FetchRequest::new(url)).await
    }

    /// Fetch the body of a URL, following redirects and honoring the cache
    ///
    /// Each hop checks the cache for its own URL before any network I/O.
    /// The terminal body is cached under the URL the caller passed in, also
    /// when it came from a later hop's cache record.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        if request.url.trim().is_empty() {
            return Err(FetchError::MissingUrl);
        }

        let mut current = request.url.clone();
        let mut hops = 0;

        loop {
            if request.use_cache {
                if let Some(body) = self.cache.get(&current).await {
                    debug!(url = %current, "Cache hit");
                    if hops > 0 {
                        self.store(&request.url, &body).await;
                    }
                    return Ok(body);
                }
            }

            let url = normalize_url(&current)?;
            let target = Target::from_url(&url)?;
            let response = self.round_trip(&target, request.accept()).await?;

            if let Some(location) = response.redirect_location() {
                if hops >= self.config.max_redirects {
                    return Err(FetchError::TooManyRedirects(self.config.max_redirects));
                }
                let next = url.join(location).map_err(|e| {
                    FetchError::InvalidUrl(format!("redirect target '{}': {}", location, e))
                })?;
                debug!(
                    status = response.status_code,
                    from = %url,
                    to = %next,
                    "Following redirect"
                );
                hops += 1;
                current = next.to_string();
                continue;
            }

            let body = negotiate(&response, request.want_json);

            if request.use_cache {
                self.store(&request.url, &body).await;
            }

            return Ok(body);
        }
    }

    async fn store(&self, url: &str, body: &str) {
        if let Err(e) = self.cache.put(url, body).await {
            warn!("Unable to write to cache: {}", e);
        }
    }

    /// One request/response exchange on a fresh connection
    async fn round_trip(&self, target: &Target, accept: &str) -> Result<Response, FetchError> {
        let mut conn = self
            .connector
            .connect(target, self.config.connect_timeout)
            .await?;

        let request = build_request(target, accept, &self.config.user_agent);
        debug!(host = %target.host, path = %target.path, "Sending request");

        self.send(&mut conn, request.as_bytes()).await?;
        let raw = self.receive(&mut conn).await?;

        let response = parse_response(&raw);
        debug!(
            status = response.status_code,
            bytes = raw.len(),
            "Received response"
        );
        Ok(response)
    }

    async fn send(&self, conn: &mut Box<dyn Connection>, bytes: &[u8]) -> Result<(), FetchError> {
        let deadline = self.config.read_timeout;
        tokio::time::timeout(deadline, async {
            conn.write_all(bytes).await?;
            conn.flush().await
        })
        .await
        .map_err(|_| FetchError::Timeout {
            phase: "send",
            after: deadline,
        })?
        .map_err(FetchError::Send)
    }

    /// Read until the peer closes the connection
    async fn receive(&self, conn: &mut Box<dyn Connection>) -> Result<BytesMut, FetchError> {
        let deadline = self.config.read_timeout;
        let mut raw = BytesMut::new();
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        loop {
            let read = tokio::time::timeout(deadline, conn.read(&mut chunk))
                .await
                .map_err(|_| FetchError::Timeout {
                    phase: "receive",
                    after: deadline,
                })?;
            let n = match read {
                Ok(n) => n,
                // TLS peer closed the socket without close_notify
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => 0,
                Err(e) => return Err(FetchError::Receive(e)),
            };
            if n == 0 {
                return Ok(raw);
            }
            raw.extend_from_slice(&chunk[..n]);
        }
    }
}

/// Turn a terminal response into the body string handed to the caller
///
/// JSON is prettified for display unless the caller negotiated JSON itself;
/// bodies that fail to parse are kept verbatim.
fn negotiate(response: &Response, want_json: bool) -> String {
    let text = response.text();
    if want_json || !is_json_content_type(response.content_type()) {
        return text;
    }
    match prettify_json(&text) {
        Some(pretty) => pretty,
        None => {
            debug!("Body labelled as JSON did not parse, keeping raw text");
            text
        }
    }
}

/// Fetch a URL with the default configuration
///
/// For custom cache location, timeouts or redirect limits, use
/// [`Fetcher::builder`].
pub async fn fetch(url: &str) -> Result<String, FetchError> {
    Fetcher::new().get(url).await
}
