// ── Runtime connection configuration ──
//
// These types describe *how* to reach one gNMI target. They carry
// credential data and connection tuning, but never touch disk.
// The CLI builds a `DeviceConfig` per target and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use netstate_api::{DataType, Encoding};
use secrecy::SecretString;

/// Call credentials forwarded to the target.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed device certificates).
    DangerAcceptInvalid,
    /// No TLS at all.
    Plaintext,
}

/// Data scope and encoding attached to every query of a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub data_type: DataType,
    pub encoding: Encoding,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            data_type: DataType::State,
            encoding: Encoding::JsonIetf,
        }
    }
}

/// Configuration for polling a single target.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Opaque `host:port` identifier; also the snapshot key.
    pub target: String,
    pub credentials: Option<Credentials>,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    pub query: QueryOptions,
}

impl DeviceConfig {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            credentials: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            query: QueryOptions::default(),
        }
    }
}

/// Strip the port from a `host:port` target, leaving bracketed IPv6 hosts intact.
pub fn hostname(target: &str) -> &str {
    let without_scheme = target.split_once("://").map_or(target, |(_, rest)| rest);
    if let Some(rest) = without_scheme.strip_prefix('[') {
        return rest.split_once(']').map_or(without_scheme, |(host, _)| host);
    }
    match without_scheme.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => {
            host
        }
        _ => without_scheme,
    }
}
