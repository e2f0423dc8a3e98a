//! Config subcommand handlers.

use std::io::{self, IsTerminal};

use dialoguer::{Confirm, Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile, prompt_err};
use crate::error::CliError;
use crate::output;

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let rendered = toml::to_string_pretty(&cfg.redacted())
                .map_err(|e| CliError::Internal(format!("failed to render config: {e}")))?;
            output::print_output(rendered.trim_end(), global.quiet);
            Ok(())
        }
        ConfigCommand::Init => init(),
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init() -> Result<(), CliError> {
    if !io::stdin().is_terminal() {
        return Err(CliError::Validation {
            field: "config init".into(),
            reason: "the setup wizard needs an interactive terminal".into(),
        });
    }

    let config_path = config::config_path();
    eprintln!("netstate configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let mut cfg = if config_path.exists() {
        config::load_config()?
    } else {
        Config::default()
    };

    // 1. Profile name
    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    if cfg.profiles.contains_key(&profile_name)
        && !Confirm::new()
            .with_prompt(format!("Profile '{profile_name}' exists. Replace it?"))
            .default(false)
            .interact()
            .map_err(prompt_err)?
    {
        eprintln!("   Aborted, nothing written.");
        return Ok(());
    }

    // 2. Targets
    let targets_raw: String = Input::new()
        .with_prompt("Targets (host:port, comma separated)")
        .interact_text()
        .map_err(prompt_err)?;
    let targets: Vec<String> = targets_raw
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect();
    if targets.is_empty() {
        return Err(CliError::Validation {
            field: "targets".into(),
            reason: "at least one target is required".into(),
        });
    }

    // 3. Transport
    let transport_choices = &[
        "TLS, verify certificates",
        "TLS, accept self-signed certificates",
        "Plain HTTP (gateway without TLS)",
    ];
    let transport = Select::new()
        .with_prompt("Gateway transport")
        .items(transport_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    // 4. Credentials
    let username: String = Input::new()
        .with_prompt("Username (empty for none)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let (password, password_env) = if username.is_empty() {
        (None, None)
    } else {
        prompt_password_storage()?
    };

    let profile = Profile {
        targets,
        username: (!username.is_empty()).then_some(username),
        password,
        password_env,
        ca_cert: None,
        insecure: (transport == 1).then_some(true),
        plaintext: (transport == 2).then_some(true),
        timeout: None,
    };

    cfg.profiles.insert(profile_name.clone(), profile);
    if cfg.default_profile.is_none() || cfg.profiles.len() == 1 {
        cfg.default_profile = Some(profile_name.clone());
    }

    let path = config::save_config(&cfg)?;
    eprintln!("\n   Profile '{profile_name}' saved to {}", path.display());
    Ok(())
}

/// Ask where the password lives: an environment variable or the config file.
fn prompt_password_storage() -> Result<(Option<String>, Option<String>), CliError> {
    let choices = &[
        "Read from an environment variable (recommended)",
        "Save to config file (plaintext)",
        "Prompt on every run",
    ];
    let selection = Select::new()
        .with_prompt("Where should the password come from?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    match selection {
        0 => {
            let var: String = Input::new()
                .with_prompt("Environment variable")
                .default(netstate_config::PASSWORD_ENV.into())
                .interact_text()
                .map_err(prompt_err)?;
            Ok((None, Some(var)))
        }
        1 => {
            let pass = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
            if pass.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "password cannot be empty".into(),
                });
            }
            Ok((Some(pass), None))
        }
        _ => Ok((None, None)),
    }
}
