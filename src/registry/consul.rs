// Consul agent implementation of the Registry capability.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use hyper::body::Bytes;
use hyper::{Method, StatusCode, Uri};
use tracing::debug;

use super::wire::{AgentService, AgentServiceRegistration};
use super::{Registry, RegistryError};
use crate::http::{self, HyperClient};
use crate::model::Registration;

pub const DEFAULT_REGISTRY_ADDR: &str = "127.0.0.1:8500";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const TOKEN_HEADER: &str = "X-Consul-Token";
const SERVICE_PATH: &str = "/v1/agent/service/";
const REGISTER_PATH: &str = "/v1/agent/service/register";

/// Where and how to reach the agent.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// `host:port` or a full `http(s)://` URL.
    pub address: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_REGISTRY_ADDR.to_string(),
            token: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Normalizes an agent address into a base URL without a trailing slash.
pub fn base_url(address: &str) -> Result<String> {
    let address = address.trim();
    if address.is_empty() {
        bail!("registry address is empty");
    }
    let with_scheme = if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    };

    let uri: Uri = with_scheme
        .parse()
        .with_context(|| format!("invalid registry address {:?}", address))?;
    match uri.scheme_str() {
        Some("http") | Some("https") => {}
        other => bail!("unsupported registry scheme {:?} in {:?}", other, address),
    }
    if uri.host().map_or(true, str::is_empty) {
        bail!("registry address {:?} has no host", address);
    }

    Ok(with_scheme.trim_end_matches('/').to_string())
}

/// Talks to the local Consul agent over its HTTP API.
pub struct ConsulRegistry {
    client: HyperClient,
    base: String,
    token: Option<String>,
    timeout: Duration,
}

impl ConsulRegistry {
    pub fn new(cfg: RegistryConfig) -> Result<Self> {
        let base = base_url(&cfg.address)?;
        let client = http::create_client();
        let timeout = if cfg.timeout.is_zero() {
            DEFAULT_REQUEST_TIMEOUT
        } else {
            cfg.timeout
        };
        Ok(Self {
            client,
            base,
            token: cfg.token.filter(|t| !t.is_empty()),
            timeout,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn uri(&self, path: &str) -> Result<Uri, RegistryError> {
        format!("{}{}", self.base, path)
            .parse()
            .map_err(RegistryError::unavailable)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        match self.token.as_deref() {
            Some(token) => vec![(TOKEN_HEADER, token)],
            None => Vec::new(),
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: Uri,
        body: Option<Bytes>,
    ) -> Result<http::HttpResponse, RegistryError> {
        http::send(&self.client, method, uri, &self.headers(), body, self.timeout)
            .await
            .map_err(|err| RegistryError::Unavailable(format!("{:#}", err)))
    }
}

fn unexpected_status(status: StatusCode, body: &[u8]) -> RegistryError {
    RegistryError::Unavailable(format!(
        "unexpected response code {}: {}",
        status.as_u16(),
        String::from_utf8_lossy(body).trim()
    ))
}

#[async_trait::async_trait]
impl Registry for ConsulRegistry {
    async fn get_service(&self, id: &str) -> Result<Option<Registration>, RegistryError> {
        let uri = self.uri(&format!("{}{}", SERVICE_PATH, urlencoding::encode(id)))?;
        let resp = self.send(Method::GET, uri, None).await?;

        match resp.status {
            StatusCode::NOT_FOUND => return Ok(None),
            status if !status.is_success() => return Err(unexpected_status(status, &resp.body)),
            _ => {}
        }

        let svc: Option<AgentService> = serde_json::from_slice(&resp.body).map_err(|err| {
            RegistryError::Unavailable(format!("failed to decode service {}: {}", id, err))
        })?;
        debug!(
            component = "registry",
            event = "service_fetched",
            service = %id,
            found = svc.is_some(),
            "service fetched"
        );
        Ok(svc.map(Registration::from))
    }

    async fn register_service(&self, registration: &Registration) -> Result<(), RegistryError> {
        let payload = serde_json::to_vec(&AgentServiceRegistration::from(registration))
            .map_err(RegistryError::unavailable)?;
        let uri = self.uri(REGISTER_PATH)?;
        let resp = self
            .send(Method::PUT, uri, Some(Bytes::from(payload)))
            .await?;

        if !resp.status.is_success() {
            return Err(unexpected_status(resp.status, &resp.body));
        }
        debug!(
            component = "registry",
            event = "service_registered",
            service = %registration.id,
            tags = ?registration.tags,
            "service registered"
        );
        Ok(())
    }
}
