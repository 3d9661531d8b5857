//! Resolution of this service's externally reachable base URL.
//!
//! The endpoint is resolved once per process, in the background after the
//! listener is bound. Strategy order:
//!
//! 1. a statically configured base URL
//! 2. a tunnel, if one is configured
//! 3. `http://localhost:<port>`, which remote services cannot reach
//!
//! Readers never wait: [`EndpointResolver::current`] returns `None` until
//! resolution has finished, and handlers answer `EndpointUnresolved`.

use daybook_core::{EndpointSource, Error, Result, ServiceEndpoint};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::tunnel::TunnelProvider;

/// Owns the process-wide [`ServiceEndpoint`]. Written at most once.
pub struct EndpointResolver {
    cell: OnceCell<ServiceEndpoint>,
    static_url: Option<String>,
    tunnel: Option<Arc<dyn TunnelProvider>>,
    tunnel_timeout: Duration,
    local_port: u16,
}

impl EndpointResolver {
    /// Resolver that will fall back to the local address on `local_port`
    /// unless a static URL or tunnel is added.
    pub fn new(local_port: u16) -> Self {
        Self {
            cell: OnceCell::new(),
            static_url: None,
            tunnel: None,
            tunnel_timeout: Duration::from_secs(daybook_core::defaults::TUNNEL_TIMEOUT_SECS),
            local_port,
        }
    }

    pub fn with_static_url(mut self, url: impl Into<String>) -> Self {
        self.static_url = Some(url.into());
        self
    }

    pub fn with_tunnel(mut self, tunnel: Arc<dyn TunnelProvider>, timeout: Duration) -> Self {
        self.tunnel = Some(tunnel);
        self.tunnel_timeout = timeout;
        self
    }

    /// The resolved endpoint, or `None` if resolution has not completed.
    pub fn current(&self) -> Option<&ServiceEndpoint> {
        self.cell.get()
    }

    /// The resolved endpoint, failing fast with `EndpointUnresolved`.
    pub fn require(&self) -> Result<&ServiceEndpoint> {
        self.current().ok_or(Error::EndpointUnresolved)
    }

    /// Resolve the endpoint, or return the already resolved one.
    ///
    /// Concurrent callers share a single resolution; the value never changes
    /// afterwards.
    pub async fn resolve(&self) -> Result<&ServiceEndpoint> {
        self.cell.get_or_try_init(|| self.establish()).await
    }

    async fn establish(&self) -> Result<ServiceEndpoint> {
        if let Some(url) = &self.static_url {
            let endpoint = ServiceEndpoint::new(url.clone(), EndpointSource::Static);
            info!(
                subsystem = "endpoint",
                op = "resolve",
                source = endpoint.source.as_str(),
                base_url = %endpoint.base_url,
                "Using configured public base URL"
            );
            return Ok(endpoint);
        }

        if let Some(tunnel) = &self.tunnel {
            match tokio::time::timeout(self.tunnel_timeout, tunnel.open(self.local_port)).await {
                Ok(Ok(url)) => {
                    let endpoint = ServiceEndpoint::new(url, EndpointSource::Tunnel);
                    info!(
                        subsystem = "endpoint",
                        op = "resolve",
                        source = endpoint.source.as_str(),
                        tunnel = tunnel.name(),
                        base_url = %endpoint.base_url,
                        "Tunnel established"
                    );
                    return Ok(endpoint);
                }
                Ok(Err(e)) => {
                    warn!(
                        subsystem = "endpoint",
                        op = "resolve",
                        tunnel = tunnel.name(),
                        error = %e,
                        "Tunnel establishment failed"
                    );
                }
                Err(_) => {
                    warn!(
                        subsystem = "endpoint",
                        op = "resolve",
                        tunnel = tunnel.name(),
                        timeout_secs = self.tunnel_timeout.as_secs(),
                        "Tunnel establishment timed out"
                    );
                }
            }
        }

        let endpoint = ServiceEndpoint::new(
            format!("http://localhost:{}", self.local_port),
            EndpointSource::LocalFallback,
        );
        warn!(
            subsystem = "endpoint",
            op = "resolve",
            source = endpoint.source.as_str(),
            base_url = %endpoint.base_url,
            "Falling back to local address; it is not externally reachable, so image URLs \
             sent to the completion API will not resolve"
        );
        Ok(endpoint)
    }
}
