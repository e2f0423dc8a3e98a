//! Clap derive structures for the `netstate` CLI.
//!
//! Defines the command tree, global flags, and shared types. Compiled into
//! build.rs as well, so it must only depend on clap and clap_complete.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// netstate -- BGP and LLDP state snapshots over gNMI
#[derive(Debug, Parser)]
#[command(
    name = "netstate",
    version,
    about = "Poll BGP and LLDP state from gNMI targets",
    long_about = "Polls operational state from network devices over gNMI (through an\n\
        HTTP/JSON gateway), decodes key-addressed response paths and joins\n\
        related queries into one snapshot per device.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Target profile to use
    #[arg(long, short = 'p', env = "NETSTATE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Output format [default: from config, else text]
    #[arg(long, short = 'o', env = "NETSTATE_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Talk to the gateway over plain HTTP
    #[arg(long, global = true, conflicts_with = "insecure")]
    pub plaintext: bool,

    /// CA certificate (PEM) used to verify targets
    #[arg(long, value_name = "FILE", global = true)]
    pub ca_cert: Option<PathBuf>,

    /// Username sent with every request
    #[arg(long, short = 'u', global = true)]
    pub username: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "NETSTATE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Maximum number of targets polled at once
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..), global = true)]
    pub concurrency: Option<u16>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `Hostname:` header followed by one line per record
    Text,
    /// Pretty-printed JSON keyed by target
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// One table per result set
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll targets and print their state snapshots
    #[command(alias = "get")]
    Poll(PollArgs),

    /// List the built-in field templates and their identity bindings
    Fields,

    /// Show the Get request a field specification resolves to
    Resolve(ResolveArgs),

    /// Manage configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct PollArgs {
    /// Targets as host:port (defaults to the profile's targets)
    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Field specification, e.g. /lldp/interfaces/interface[name={local_interface}]/state
    pub spec: String,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create a config file with guided setup
    Init,

    /// Display the resolved configuration (passwords masked)
    Show,

    /// Print the config file location
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
