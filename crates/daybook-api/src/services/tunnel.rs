//! Outbound tunnels that publish the local port at a public address.
//!
//! [`NgrokAgentTunnel`] drives a locally running ngrok agent through its
//! HTTP API (default `http://127.0.0.1:4040`). An existing tunnel forwarding
//! to our port is reused; otherwise a new one is started.

use async_trait::async_trait;
use daybook_core::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Something that can expose a local port at a publicly reachable URL.
#[async_trait]
pub trait TunnelProvider: Send + Sync {
    /// Open (or reuse) a tunnel to `local_port` and return its public base URL.
    async fn open(&self, local_port: u16) -> Result<String>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct TunnelList {
    #[serde(default)]
    tunnels: Vec<AgentTunnel>,
}

#[derive(Debug, Deserialize)]
struct AgentTunnel {
    #[serde(default)]
    public_url: Option<String>,
    #[serde(default)]
    config: Option<AgentTunnelConfig>,
}

#[derive(Debug, Deserialize)]
struct AgentTunnelConfig {
    #[serde(default)]
    addr: String,
}

#[derive(Debug, Serialize)]
struct StartTunnel<'a> {
    name: &'a str,
    proto: &'a str,
    addr: String,
}

/// Tunnel opened through the ngrok agent API.
pub struct NgrokAgentTunnel {
    client: Client,
    api_url: String,
    tunnel_name: String,
}

impl NgrokAgentTunnel {
    pub fn new(api_url: impl Into<String>, tunnel_name: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            tunnel_name: tunnel_name.into(),
        })
    }

    async fn existing(&self, local_port: u16) -> Result<Option<String>> {
        let url = format!("{}/api/tunnels", self.api_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::TransportError(format!("tunnel agent unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamError {
                status: status.as_u16(),
                detail,
            });
        }

        let list: TunnelList = response.json().await.map_err(|e| {
            Error::UpstreamContractViolation(format!("unexpected tunnel list: {}", e))
        })?;

        let mut candidates: Vec<String> = list
            .tunnels
            .into_iter()
            .filter(|t| {
                t.config
                    .as_ref()
                    .is_some_and(|c| forwards_to(&c.addr, local_port))
            })
            .filter_map(|t| t.public_url)
            .collect();

        // https first
        candidates.sort_by_key(|u| !u.starts_with("https://"));
        Ok(candidates.into_iter().next())
    }

    async fn start(&self, local_port: u16) -> Result<String> {
        let url = format!("{}/api/tunnels", self.api_url);
        let body = StartTunnel {
            name: &self.tunnel_name,
            proto: "http",
            addr: local_port.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::TransportError(format!("tunnel agent unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamError {
                status: status.as_u16(),
                detail,
            });
        }

        let tunnel: AgentTunnel = response.json().await.map_err(|e| {
            Error::UpstreamContractViolation(format!("unexpected tunnel response: {}", e))
        })?;

        tunnel
            .public_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                Error::UpstreamContractViolation("tunnel response has no public_url".to_string())
            })
    }
}

#[async_trait]
impl TunnelProvider for NgrokAgentTunnel {
    async fn open(&self, local_port: u16) -> Result<String> {
        if let Some(url) = self.existing(local_port).await? {
            debug!(subsystem = "endpoint", public_url = %url, "Reusing existing tunnel");
            return Ok(url);
        }

        let url = self.start(local_port).await?;
        info!(subsystem = "endpoint", public_url = %url, local_port, "Started tunnel");
        Ok(url)
    }

    fn name(&self) -> &str {
        "ngrok-agent"
    }
}

/// Whether an agent `addr` (`3000`, `localhost:3000`, `http://localhost:3000`)
/// points at `port`.
fn forwards_to(addr: &str, port: u16) -> bool {
    let addr = addr.trim_end_matches('/');
    let port = port.to_string();
    addr == port || addr.rsplit_once(':').is_some_and(|(_, p)| p == port)
}
