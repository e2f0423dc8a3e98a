// ── Device session ──
//
// Binds one `DeviceConfig` to a gateway client and exposes it as a
// `StateSource`. Transport errors are translated into `CoreError` with the
// target and configured timeout filled in.

use netstate_api::transport::{TlsMode, TransportConfig};
use netstate_api::{CapabilityResponse, GatewayClient, GetResponse, Update};
use tracing::{debug, info, warn};

use crate::config::{DeviceConfig, TlsVerification};
use crate::error::CoreError;
use crate::pathspec::PathQuery;
use crate::snapshot::{DeviceSnapshot, StateSource, assemble};

/// A gNMI target reachable through the gateway.
pub struct Device {
    config: DeviceConfig,
    client: GatewayClient,
}

impl Device {
    /// Build the client for `config` without touching the network.
    pub fn new(config: DeviceConfig) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let mut client = GatewayClient::new(&config.target, &transport)?;
        if let Some(creds) = &config.credentials {
            client = client.with_credentials(creds.username.clone(), creds.password.clone());
        }
        Ok(Self { config, client })
    }

    /// Build the client and verify the target answers Capabilities.
    pub async fn connect(config: DeviceConfig) -> Result<Self, CoreError> {
        let device = Self::new(config)?;
        device.capabilities().await?;
        Ok(device)
    }

    pub fn target(&self) -> &str {
        &self.config.target
    }

    /// Query the target's capabilities. An encoding the target does not
    /// advertise is logged, not rejected: some targets omit the list.
    pub async fn capabilities(&self) -> Result<CapabilityResponse, CoreError> {
        let caps = self
            .client
            .capabilities()
            .await
            .map_err(|e| self.translate(e))?;

        let encoding = self.config.query.encoding;
        if !caps.supported_encodings.is_empty() && !caps.supports(encoding) {
            warn!(
                device = %self.config.target,
                %encoding,
                "target does not advertise the requested encoding"
            );
        }
        info!(
            device = %self.config.target,
            gnmi_version = %caps.gnmi_version,
            models = caps.supported_models.len(),
            "connected"
        );
        Ok(caps)
    }

    /// Run every built-in query and assemble the snapshot.
    pub async fn snapshot(&self) -> Result<DeviceSnapshot, CoreError> {
        assemble(self, &self.config.target, self.config.query).await
    }

    fn translate(&self, err: netstate_api::Error) -> CoreError {
        match CoreError::from(err) {
            CoreError::Timeout { .. } => CoreError::Timeout {
                timeout_secs: self.config.timeout.as_secs(),
            },
            CoreError::ConnectionFailed { reason, .. } => CoreError::ConnectionFailed {
                target: self.config.target.clone(),
                reason,
            },
            other => other,
        }
    }
}

impl StateSource for Device {
    async fn execute(&self, query: &PathQuery) -> Result<Vec<Update>, CoreError> {
        let response = self
            .client
            .get(&query.to_request())
            .await
            .map_err(|e| self.translate(e))?;
        let updates = GetResponse::into_updates(response);
        debug!(device = %self.config.target, path = %query.path, updates = updates.len(), "get complete");
        Ok(updates)
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn build_transport(config: &DeviceConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        TlsVerification::Plaintext => TlsMode::Plaintext,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use secrecy::SecretString;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::Credentials;

    fn config_for(server: &MockServer) -> DeviceConfig {
        let mut config = DeviceConfig::new(server.uri());
        config.tls = TlsVerification::Plaintext;
        config.timeout = Duration::from_secs(2);
        config
    }

    fn elem(name: &str) -> serde_json::Value {
        json!({ "name": name })
    }

    fn keyed(name: &str, key: &str, value: &str) -> serde_json::Value {
        let mut keys = serde_json::Map::new();
        keys.insert(key.to_owned(), json!(value));
        json!({ "name": name, "key": keys })
    }

    fn nbr_prefix(vrf: &str, nbr: &str) -> serde_json::Value {
        json!({
            "elem": [
                elem("network-instances"),
                keyed("network-instance", "name", vrf),
                elem("protocols"),
                keyed("protocol", "identifier", "BGP"),
                elem("bgp"),
                elem("neighbors"),
                keyed("neighbor", "neighbor-address", nbr),
            ]
        })
    }

    async fn mount_get(server: &MockServer, last_elem: &str, notification: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/gnmi/v1/get"))
            .and(body_partial_json(json!({ "type": "STATE", "encoding": "JSON_IETF" })))
            .and(GetLeaf(last_elem.to_owned()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "notification": [notification]
            })))
            .mount(server)
            .await;
    }

    /// Matches a Get whose single path ends in the given element.
    struct GetLeaf(String);

    impl wiremock::Match for GetLeaf {
        fn matches(&self, request: &wiremock::Request) -> bool {
            let Ok(body) = serde_json::from_slice::<serde_json::Value>(&request.body) else {
                return false;
            };
            body["path"][0]["elem"]
                .as_array()
                .and_then(|elems| elems.last())
                .and_then(|e| e["name"].as_str())
                == Some(self.0.as_str())
        }
    }

    #[tokio::test]
    async fn snapshot_over_gateway() {
        let server = MockServer::start().await;

        mount_get(
            &server,
            "session-state",
            json!({
                "timestamp": "1700000000000000000",
                "prefix": nbr_prefix("default", "10.0.0.1"),
                "update": [{
                    "path": { "elem": [elem("state"), elem("session-state")] },
                    "val": { "stringVal": "ESTABLISHED" }
                }]
            }),
        )
        .await;
        mount_get(
            &server,
            "enabled",
            json!({
                "prefix": nbr_prefix("default", "10.0.0.1"),
                "update": [{
                    "path": { "elem": [
                        elem("afi-safis"),
                        keyed("afi-safi", "afi-safi-name", "ipv4-unicast"),
                        elem("config"),
                        elem("enabled")
                    ] },
                    "val": { "boolVal": true }
                }]
            }),
        )
        .await;
        mount_get(
            &server,
            "received",
            json!({
                "prefix": nbr_prefix("default", "10.0.0.1"),
                "update": [
                    {
                        "path": { "elem": [
                            elem("afi-safis"),
                            keyed("afi-safi", "afi-safi-name", "ipv4-unicast"),
                            elem("state"), elem("prefixes"), elem("received")
                        ] },
                        "val": { "uintVal": "42" }
                    },
                    {
                        "path": { "elem": [
                            elem("afi-safis"),
                            keyed("afi-safi", "afi-safi-name", "ipv6-unicast"),
                            elem("state"), elem("prefixes"), elem("received")
                        ] },
                        "val": { "uintVal": 7 }
                    }
                ]
            }),
        )
        .await;
        mount_get(
            &server,
            "system-name",
            json!({
                "update": [{
                    "path": { "elem": [
                        elem("lldp"), elem("interfaces"),
                        keyed("interface", "name", "Ethernet1"),
                        elem("neighbors"), keyed("neighbor", "id", "1"),
                        elem("state"), elem("system-name")
                    ] },
                    "val": { "stringVal": "spine1" }
                }]
            }),
        )
        .await;

        let device = Device::new(config_for(&server)).unwrap();
        let snap = device.snapshot().await.unwrap();

        assert_eq!(snap.bgp_neighbors.len(), 1);
        assert_eq!(snap.bgp_neighbors[0].session_state, "ESTABLISHED");
        assert_eq!(snap.bgp_received_routes.len(), 1);
        assert_eq!(snap.bgp_received_routes[0].prefixes_received, 42);
        assert_eq!(snap.lldp_neighbors[0].local_interface, "Ethernet1");
    }

    #[tokio::test]
    async fn connect_sends_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gnmi/v1/capabilities"))
            .and(header("authorization", "Basic YWRtaW46c2VjcmV0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "supportedEncodings": ["JSON", "JSON_IETF"],
                "gNMIVersion": "0.8.0"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = config_for(&server);
        config.credentials = Some(Credentials {
            username: "admin".into(),
            password: SecretString::from("secret"),
        });
        let device = Device::connect(config).await.unwrap();
        assert_eq!(device.target(), server.uri());
    }

    #[tokio::test]
    async fn rejected_credentials_are_authentication_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = Device::connect(config_for(&server)).await.err().unwrap();
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    }

    #[tokio::test]
    async fn slow_gateway_reports_configured_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let mut config = config_for(&server);
        config.timeout = Duration::from_secs(1);
        let device = Device::new(config).unwrap();
        let err = device.snapshot().await.unwrap_err();
        assert!(matches!(err.root(), CoreError::Timeout { timeout_secs: 1 }));
    }

    #[tokio::test]
    async fn gateway_error_fails_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gnmi/v1/get"))
            .respond_with(
                ResponseTemplate::new(502).set_body_json(json!({ "code": 14, "message": "device unreachable" })),
            )
            .mount(&server)
            .await;

        let device = Device::new(config_for(&server)).unwrap();
        let err = device.snapshot().await.unwrap_err();
        assert!(err.to_string().contains("device unreachable"), "{err}");
    }
}
