//! Shared configuration for netstate.
//!
//! TOML profiles plus credential, TLS and timeout resolution. The CLI adds
//! flag overrides and interactive prompting on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use netstate_core::{Credentials, TlsVerification};

/// Environment variable consulted first for the call username.
pub const USERNAME_ENV: &str = "GRPC_USERNAME";
/// Environment variable consulted first for the call password.
pub const PASSWORD_ENV: &str = "GRPC_PASSWORD";

const ENV_PREFIX: &str = "NETSTATE_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named target profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Look up `name`, or the default profile when `name` is `None`.
    ///
    /// A missing default profile is not an error; an explicitly named one is.
    pub fn profile(&self, name: Option<&str>) -> Result<Option<(&str, &Profile)>, ConfigError> {
        match name {
            Some(name) => self
                .profiles
                .get_key_value(name)
                .map(|(k, p)| Some((k.as_str(), p)))
                .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() }),
            None => Ok(self
                .default_profile
                .as_deref()
                .and_then(|name| self.profiles.get_key_value(name))
                .map(|(k, p)| (k.as_str(), p))),
        }
    }

    /// Copy of this config with every plaintext password replaced.
    pub fn redacted(&self) -> Self {
        let mut out = self.clone();
        for profile in out.profiles.values_mut() {
            if profile.password.is_some() {
                profile.password = Some("********".into());
            }
        }
        out
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default)]
    pub plaintext: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            plaintext: false,
            timeout: default_timeout(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_output() -> String {
    "text".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_concurrency() -> usize {
    8
}

/// A named set of targets sharing credentials and transport settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// `host:port` targets polled by default.
    #[serde(default)]
    pub targets: Vec<String>,

    pub username: Option<String>,

    /// Password (plaintext; prefer `password_env`).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override plaintext setting.
    pub plaintext: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "netstate", "netstate").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("netstate");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` + environment. A missing file yields defaults.
///
/// Environment keys nest on `__`, e.g. `NETSTATE_DEFAULTS__TIMEOUT=5`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve the username: `GRPC_USERNAME`, then the profile.
pub fn resolve_username(
    profile: Option<&Profile>,
    env: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    env(USERNAME_ENV).or_else(|| profile.and_then(|p| p.username.clone()))
}

/// Resolve the password: `GRPC_PASSWORD`, then the profile's
/// `password_env`, then its plaintext `password`.
pub fn resolve_password(
    profile: Option<&Profile>,
    env: impl Fn(&str) -> Option<String>,
) -> Option<SecretString> {
    if let Some(pw) = env(PASSWORD_ENV) {
        return Some(SecretString::from(pw));
    }
    let profile = profile?;
    if let Some(pw) = profile.password_env.as_deref().and_then(&env) {
        return Some(SecretString::from(pw));
    }
    profile.password.clone().map(SecretString::from)
}

/// Resolve call credentials non-interactively.
///
/// `Ok(None)` when nothing is configured (unauthenticated gateway);
/// an error when only half of the pair is available.
pub fn resolve_credentials(
    profile: Option<&Profile>,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Option<Credentials>, ConfigError> {
    let username = resolve_username(profile, &env);
    let password = resolve_password(profile, &env);
    match (username, password) {
        (Some(username), Some(password)) => Ok(Some(Credentials { username, password })),
        (None, None) => Ok(None),
        _ => Err(ConfigError::NoCredentials {
            profile: profile_name.into(),
        }),
    }
}

/// Process environment lookup for the resolution functions.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

// ── Translation to core config ──────────────────────────────────────

/// Transport settings for a profile, falling back to global defaults.
pub fn tls_for(profile: Option<&Profile>, defaults: &Defaults) -> TlsVerification {
    let plaintext = profile.and_then(|p| p.plaintext).unwrap_or(defaults.plaintext);
    let insecure = profile.and_then(|p| p.insecure).unwrap_or(defaults.insecure);
    if plaintext {
        TlsVerification::Plaintext
    } else if insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ca) = profile.and_then(|p| p.ca_cert.clone()) {
        TlsVerification::CustomCa(ca)
    } else {
        TlsVerification::SystemDefaults
    }
}

pub fn timeout_for(profile: Option<&Profile>, defaults: &Defaults) -> Duration {
    Duration::from_secs(profile.and_then(|p| p.timeout).unwrap_or(defaults.timeout))
}
