// gNMI gateway HTTP client
//
// Executes gNMI Capabilities and Get through an HTTP/JSON gateway that
// fronts the device's gRPC endpoint. Request and response bodies are the
// proto3 JSON mapping of the gNMI messages; credentials travel as HTTP
// basic auth and are forwarded by the gateway as gNMI call metadata.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::gnmi::{CapabilityResponse, GetRequest, GetResponse};
use crate::transport::TransportConfig;

const CAPABILITIES_PATH: &str = "gnmi/v1/capabilities";
const GET_PATH: &str = "gnmi/v1/get";

/// Raw HTTP client for one gNMI target behind a gateway.
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: Url,
    username: Option<String>,
    password: Option<SecretString>,
}

impl GatewayClient {
    /// Create a client for a `host:port` target.
    pub fn new(target: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let base_url = transport.base_url(target)?;
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            username: None,
            password: None,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;
        Ok(Self {
            http,
            base_url,
            username: None,
            password: None,
        })
    }

    /// Attach call credentials sent with every request.
    pub fn with_credentials(mut self, username: impl Into<String>, password: SecretString) -> Self {
        self.username = Some(username.into());
        self.password = Some(password);
        self
    }

    // ── RPCs ─────────────────────────────────────────────────────────

    /// `gnmi.gNMI/Capabilities`.
    pub async fn capabilities(&self) -> Result<CapabilityResponse, Error> {
        self.post(CAPABILITIES_PATH, &serde_json::json!({})).await
    }

    /// `gnmi.gNMI/Get`.
    pub async fn get(&self, request: &GetRequest) -> Result<GetResponse, Error> {
        self.post(GET_PATH, request).await
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn rpc_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &impl Serialize) -> Result<T, Error> {
        let url = self.rpc_url(path)?;
        debug!("POST {}", url);

        let mut req = self.http.post(url).json(body);
        if let Some(ref username) = self.username {
            let password = self.password.as_ref().map(|p| p.expose_secret().to_owned());
            req = req.basic_auth(username, password);
        }

        let resp = req.send().await.map_err(Error::Transport)?;
        Self::parse_response(resp).await
    }

    /// Map HTTP status onto the error taxonomy, then decode the body.
    async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Authentication {
                message: format!("gateway rejected credentials (HTTP {})", status.as_u16()),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            return Err(Error::Gateway {
                status: status.as_u16(),
                message: gateway_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}

/// Pull the `message` out of a gateway error body (`{"code":..,"message":..}`),
/// falling back to the raw text.
fn gateway_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_owned))
        .unwrap_or_else(|| body.trim().to_owned())
}
