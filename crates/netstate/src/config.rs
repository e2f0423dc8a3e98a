//! CLI configuration: thin wrapper around `netstate_config`.
//!
//! Adds `GlobalOpts` flag overrides and interactive credential prompting
//! on top of the shared profile resolution.

use std::io::{self, IsTerminal};
use std::time::Duration;

use dialoguer::Input;
use secrecy::SecretString;

use netstate_config::{
    USERNAME_ENV, process_env, resolve_password, resolve_username, timeout_for, tls_for,
};
use netstate_core::{Credentials, DeviceConfig, QueryOptions, TlsVerification};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use netstate_config::{Config, Profile, config_path, load_config, save_config};

// ── Poll plan ───────────────────────────────────────────────────────

/// Everything `poll` needs, resolved from flags, config and environment.
#[derive(Debug)]
pub struct PollPlan {
    pub devices: Vec<DeviceConfig>,
    pub concurrency: usize,
}

/// Resolve the active profile from `--profile` or the config default.
pub fn active_profile<'a>(
    global: &GlobalOpts,
    config: &'a Config,
) -> Result<Option<(&'a str, &'a Profile)>, CliError> {
    config.profile(global.profile.as_deref()).map_err(|e| match e {
        netstate_config::ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
            name,
            available: available_profiles(config),
        },
        other => other.into(),
    })
}

fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Output format: flag, then config default, then text.
pub fn output_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    global.output.unwrap_or_else(|| {
        clap::ValueEnum::from_str(&config.defaults.output, true).unwrap_or(OutputFormat::Text)
    })
}

/// Build one `DeviceConfig` per target. CLI flags override profile values.
pub fn build_poll_plan(
    targets: &[String],
    global: &GlobalOpts,
    config: &Config,
) -> Result<PollPlan, CliError> {
    let active = active_profile(global, config)?;
    let profile = active.map(|(_, p)| p);
    let profile_name = active.map_or("default", |(name, _)| name);

    // 1. Targets (arguments > profile)
    let targets: Vec<String> = if targets.is_empty() {
        profile.map(|p| p.targets.clone()).unwrap_or_default()
    } else {
        targets.to_vec()
    };
    if targets.is_empty() {
        return Err(CliError::NoTargets);
    }

    // 2. TLS verification (flags > profile > defaults)
    let tls = if global.plaintext {
        TlsVerification::Plaintext
    } else if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca) = global.ca_cert {
        TlsVerification::CustomCa(ca.clone())
    } else {
        tls_for(profile, &config.defaults)
    };

    // 3. Timeout
    let timeout = global
        .timeout
        .map_or_else(|| timeout_for(profile, &config.defaults), Duration::from_secs);

    // 4. Credentials
    let credentials = resolve_credentials(
        global,
        profile,
        profile_name,
        io::stdin().is_terminal(),
        process_env,
    )?;

    let concurrency = global
        .concurrency
        .map_or(config.defaults.concurrency, usize::from);

    let devices = targets
        .into_iter()
        .map(|target| DeviceConfig {
            target,
            credentials: credentials.clone(),
            tls: tls.clone(),
            timeout,
            query: QueryOptions::default(),
        })
        .collect();

    Ok(PollPlan {
        devices,
        concurrency,
    })
}

/// Credential chain: `--username`, environment, profile, then prompt.
///
/// Without a terminal nothing is prompted: a complete pair is used, no
/// credentials at all means an unauthenticated gateway, and half a pair is
/// an error.
fn resolve_credentials(
    global: &GlobalOpts,
    profile: Option<&Profile>,
    profile_name: &str,
    interactive: bool,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Option<Credentials>, CliError> {
    // `--username` outranks GRPC_USERNAME.
    let lookup = |name: &str| match (&global.username, name) {
        (Some(user), USERNAME_ENV) => Some(user.clone()),
        _ => env(name),
    };
    if !interactive {
        return Ok(netstate_config::resolve_credentials(
            profile,
            profile_name,
            &lookup,
        )?);
    }

    let username = match resolve_username(profile, &lookup) {
        Some(u) => u,
        None => prompt_username()?,
    };
    let password = match resolve_password(profile, &lookup) {
        Some(p) => p,
        None => prompt_password(&username)?,
    };
    Ok(Some(Credentials { username, password }))
}

// ── Prompts ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_username() -> Result<String, CliError> {
    Input::new()
        .with_prompt("Username")
        .interact_text()
        .map_err(prompt_err)
}

fn prompt_password(username: &str) -> Result<SecretString, CliError> {
    let pw = rpassword::prompt_password(format!("Password for {username}: ")).map_err(prompt_err)?;
    if pw.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(SecretString::from(pw))
}
