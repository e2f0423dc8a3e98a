// Shared transport configuration for building reqwest::Client instances.
//
// Every gateway client built during a poll run shares the same TLS and
// timeout settings through this module.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::Error;

/// TLS mode (api-level mirror of core's `TlsVerification`).
#[derive(Debug, Clone)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (self-signed device certificates).
    DangerAcceptInvalid,
    /// Plain HTTP, no TLS at all.
    Plaintext,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("netstate/", env!("CARGO_PKG_VERSION")));

        match &self.tls {
            TlsMode::System | TlsMode::Plaintext => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Gateway base URL for a `host:port` target.
    ///
    /// Targets that already carry a scheme are used as-is.
    pub fn base_url(&self, target: &str) -> Result<Url, Error> {
        if target.trim().is_empty() {
            return Err(Error::InvalidTarget {
                target: target.into(),
                reason: "empty target".into(),
            });
        }

        let raw = if target.contains("://") {
            target.to_owned()
        } else {
            let scheme = match self.tls {
                TlsMode::Plaintext => "http",
                _ => "https",
            };
            format!("{scheme}://{target}")
        };

        let url = Url::parse(&raw)?;
        if url.host_str().is_none() {
            return Err(Error::InvalidTarget {
                target: target.into(),
                reason: "missing host".into(),
            });
        }
        Ok(url)
    }
}
