//! Error types for go2web

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during fetch operations
///
/// Malformed responses are never errors; they degrade to defaults while
/// parsing. Everything here is a failure to complete the exchange.
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL is missing
    #[error("Missing required parameter: url")]
    MissingUrl,

    /// URL could not be parsed, has no host, or uses an unsupported scheme
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// DNS resolution or TCP connect failed
    #[error("Error creating connection: {0}")]
    Connect(#[source] io::Error),

    /// TLS setup or handshake failed
    #[error("SSL error: {0}")]
    Tls(String),

    /// Writing the request failed
    #[error("Error sending request: {0}")]
    Send(#[source] io::Error),

    /// Reading the response failed
    #[error("Error receiving data: {0}")]
    Receive(#[source] io::Error),

    /// A connect, handshake, send or receive deadline elapsed
    #[error("Timed out during {phase} after {} ms", .after.as_millis())]
    Timeout {
        /// Which step of the exchange stalled
        phase: &'static str,
        /// Configured deadline for that step
        after: Duration,
    },

    /// Redirect chain exceeded the configured hop limit
    #[error("Too many redirects (limit: {0})")]
    TooManyRedirects(usize),
}

impl FetchError {
    /// Map a TLS handshake I/O error.
    ///
    /// tokio-rustls reports handshake failures as `io::Error` wrapping the
    /// rustls alert, so the message is all that is worth keeping.
    pub(crate) fn from_handshake(err: io::Error) -> Self {
        FetchError::Tls(err.to_string())
    }
}
