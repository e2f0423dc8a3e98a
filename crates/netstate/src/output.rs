//! Output formatting: text, table, JSON, YAML.
//!
//! Renders snapshots in the format selected by `--output`. Structured
//! formats serialize through serde and key snapshots by target; text and
//! table walk each result set's flat records.

use std::fmt::Write as _;
use std::io::{self, IsTerminal, Write};

use indexmap::IndexMap;
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use netstate_core::DeviceSnapshot;
use netstate_core::config::hostname;

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Snapshot rendering ───────────────────────────────────────────────

/// Render successful snapshots, in poll order.
pub fn render_snapshots(
    format: OutputFormat,
    snapshots: &[&DeviceSnapshot],
    color: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Text => Ok(render_text(snapshots, color)),
        OutputFormat::Table => Ok(render_tables(snapshots, color)),
        OutputFormat::Json => render_json(&keyed(snapshots), false),
        OutputFormat::JsonCompact => render_json(&keyed(snapshots), true),
        OutputFormat::Yaml => render_yaml(&keyed(snapshots)),
    }
}

fn keyed<'a>(snapshots: &[&'a DeviceSnapshot]) -> IndexMap<&'a str, &'a DeviceSnapshot> {
    snapshots.iter().map(|s| (s.target.as_str(), *s)).collect()
}

/// `Hostname: <host>` followed by `<result-set>: k=v ...` per record.
fn render_text(snapshots: &[&DeviceSnapshot], color: bool) -> String {
    let mut out = String::new();
    for snapshot in snapshots {
        let host = hostname(&snapshot.target);
        if color {
            let _ = writeln!(out, "{} {}", "Hostname:".bold(), host.cyan());
        } else {
            let _ = writeln!(out, "Hostname: {host}");
        }
        for (set, records) in snapshot.result_sets() {
            for record in records {
                let fields: Vec<String> = record.iter().map(|(k, v)| format!("{k}={v}")).collect();
                let _ = writeln!(out, "{set}: {}", fields.join(" "));
            }
        }
    }
    out.trim_end().to_owned()
}

fn render_tables(snapshots: &[&DeviceSnapshot], color: bool) -> String {
    let mut out = String::new();
    for snapshot in snapshots {
        if color {
            let _ = writeln!(out, "{}", snapshot.target.bold());
        } else {
            let _ = writeln!(out, "{}", snapshot.target);
        }
        for (set, records) in snapshot.result_sets() {
            let _ = writeln!(out, "{set} ({})", records.len());
            let Some(first) = records.first() else {
                continue;
            };
            let mut builder = Builder::default();
            builder.push_record(first.keys().copied());
            for record in &records {
                builder.push_record(record.values().cloned());
            }
            let _ = writeln!(out, "{}", builder.build().with(Style::rounded()));
        }
        out.push('\n');
    }
    out.trim_end().to_owned()
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

pub fn render_json<T: Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let text = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(text)
}

pub fn render_yaml<T: Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}
