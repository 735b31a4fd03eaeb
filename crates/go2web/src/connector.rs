//! Connection establishment
//!
//! [`Connector`] is the seam between the fetch lifecycle and the network.
//! [`TcpConnector`] opens a TCP socket and, for https targets, wraps it in
//! TLS verified against the platform trust store.

use crate::error::FetchError;
use crate::types::{Scheme, Target};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::OnceCell;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};

/// A byte stream to one server, plain or encrypted
pub trait Connection: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Connection for T {}

/// Opens connections for the fetcher
///
/// Each call must return a fresh connection; the fetcher never reuses one.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect to `target`, giving up after `timeout` for each of the TCP
    /// connect and the TLS handshake
    async fn connect(
        &self,
        target: &Target,
        timeout: Duration,
    ) -> Result<Box<dyn Connection>, FetchError>;
}

/// Default connector: TCP, plus TLS for https
#[derive(Default)]
pub struct TcpConnector {
    tls: OnceCell<TlsConnector>,
}

impl TcpConnector {
    /// Create a new connector; the trust store is loaded on first https use
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a connector that trusts exactly what `config` trusts
    pub fn with_tls_config(config: ClientConfig) -> Self {
        Self {
            tls: OnceCell::new_with(Some(TlsConnector::from(Arc::new(config)))),
        }
    }

    async fn tls_connector(&self) -> Result<&TlsConnector, FetchError> {
        self.tls
            .get_or_try_init(|| async { load_tls_connector() })
            .await
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(
        &self,
        target: &Target,
        timeout: Duration,
    ) -> Result<Box<dyn Connection>, FetchError> {
        debug!(host = %target.host, port = target.port, scheme = %target.scheme, "Connecting");

        let tcp = tokio::time::timeout(
            timeout,
            TcpStream::connect((target.host.as_str(), target.port)),
        )
        .await
        .map_err(|_| FetchError::Timeout {
            phase: "connect",
            after: timeout,
        })?
        .map_err(FetchError::Connect)?;

        if target.scheme == Scheme::Http {
            return Ok(Box::new(tcp));
        }

        let server_name = ServerName::try_from(target.host.as_str())
            .map(|name| name.to_owned())
            .map_err(|e| FetchError::Tls(format!("invalid server name '{}': {}", target.host, e)))?;

        let connector = self.tls_connector().await?;
        let tls = tokio::time::timeout(timeout, connector.connect(server_name, tcp))
            .await
            .map_err(|_| FetchError::Timeout {
                phase: "TLS handshake",
                after: timeout,
            })?
            .map_err(FetchError::from_handshake)?;

        Ok(Box::new(tls))
    }
}

/// Build a TLS client config from the platform's native certificates
fn load_tls_connector() -> Result<TlsConnector, FetchError> {
    let native = rustls_native_certs::load_native_certs();
    for err in &native.errors {
        warn!("Error loading native certificate: {}", err);
    }

    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(native.certs);
    debug!(added, ignored, "Loaded native trust store");

    if roots.is_empty() {
        return Err(FetchError::Tls(
            "no usable certificates in the platform trust store".to_string(),
        ));
    }

    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(config)))
}
