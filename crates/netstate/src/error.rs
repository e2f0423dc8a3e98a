//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use netstate_config::ConfigError;
use netstate_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to {target}")]
    #[diagnostic(
        code(netstate::connection_failed),
        help(
            "Check that the gNMI gateway for {target} is running and reachable.\n\
             Reason: {reason}\n\
             Use --plaintext for gateways without TLS, or --insecure (-k) for self-signed certificates."
        )
    )]
    ConnectionFailed { target: String, reason: String },

    #[error("Transport error: {message}")]
    #[diagnostic(code(netstate::transport))]
    Transport { message: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(netstate::auth_failed),
        help(
            "Verify the username and password.\n\
             Credentials are read from --username, GRPC_USERNAME / GRPC_PASSWORD,\n\
             or the profile's username / password_env / password."
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(netstate::no_credentials),
        help(
            "Set GRPC_USERNAME and GRPC_PASSWORD, pass --username,\n\
             or configure the profile with: netstate config init"
        )
    )]
    NoCredentials { profile: String },

    // ── Queries ──────────────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(code(netstate::query_failed))]
    Query { message: String },

    #[error("Invalid field specification '{spec}': {reason}")]
    #[diagnostic(
        code(netstate::invalid_path_spec),
        help("Expected /elem/elem[key=value]/... with placeholders such as {{vrf_name}}.")
    )]
    InvalidPathSpec { spec: String, reason: String },

    #[error("{failed} of {total} targets failed")]
    #[diagnostic(code(netstate::partial_failure))]
    PartialFailure { failed: usize, total: usize },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(netstate::validation))]
    Validation { field: String, reason: String },

    #[error("No targets to poll")]
    #[diagnostic(
        code(netstate::no_targets),
        help(
            "Pass targets as arguments (netstate poll leaf1:6030),\n\
             or list them under `targets` in a profile."
        )
    )]
    NoTargets,

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(netstate::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: netstate config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(netstate::config))]
    Config(Box<ConfigError>),

    // ── Timeout ──────────────────────────────────────────────────────

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(netstate::timeout),
        help("Increase timeout with --timeout or check target responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(netstate::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(netstate::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(netstate::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::NoTargets
            | Self::InvalidPathSpec { .. }
            | Self::ProfileNotFound { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { target, reason } => {
                CliError::ConnectionFailed { target, reason }
            }

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::Transport { message } => CliError::Transport { message },

            // The failing query's root cause decides the exit code.
            CoreError::QueryFailed { source, .. } => CliError::from(*source),

            err @ CoreError::ValueKind { .. } => CliError::Query {
                message: err.to_string(),
            },

            CoreError::InvalidPathSpec(e) => CliError::InvalidPathSpec {
                spec: e.spec,
                reason: e.reason,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "configuration".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            other => CliError::Config(Box::new(other)),
        }
    }
}
