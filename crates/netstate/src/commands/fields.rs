//! `netstate fields`: list built-in field templates.

use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use netstate_core::pathspec::builtin_fields;
use netstate_core::{Binding, PathTemplate};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct FieldInfo {
    name: &'static str,
    kind: String,
    spec: &'static str,
    bindings: Vec<Binding>,
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    name: &'static str,
    #[tabled(rename = "Value")]
    kind: String,
    #[tabled(rename = "Identity")]
    identity: String,
}

impl From<&FieldInfo> for FieldRow {
    fn from(f: &FieldInfo) -> Self {
        Self {
            name: f.name,
            kind: f.kind.clone(),
            identity: binding_summary(&f.bindings),
        }
    }
}

fn binding_summary(bindings: &[Binding]) -> String {
    bindings
        .iter()
        .map(|b| format!("{}@{}[{}]", b.field, b.segment, b.key))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn handle(global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    let fields = builtin_fields()
        .into_iter()
        .map(|(name, spec, kind)| -> Result<FieldInfo, CliError> {
            let template = PathTemplate::parse(spec).map_err(netstate_core::CoreError::from)?;
            Ok(FieldInfo {
                name,
                kind: kind.to_string(),
                spec,
                bindings: template.bindings().to_vec(),
            })
        })
        .collect::<Result<Vec<_>, CliError>>()?;

    let rendered = match config::output_format(global, cfg) {
        OutputFormat::Text => fields
            .iter()
            .map(|f| format!("{} ({}): {}\n    {}", f.name, f.kind, binding_summary(&f.bindings), f.spec))
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Table => {
            let rows: Vec<FieldRow> = fields.iter().map(FieldRow::from).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Json => output::render_json(&fields, false)?,
        OutputFormat::JsonCompact => output::render_json(&fields, true)?,
        OutputFormat::Yaml => output::render_yaml(&fields)?,
    };
    output::print_output(&rendered, global.quiet);
    Ok(())
}
