//! `netstate resolve`: show the Get request a field specification becomes.

use serde::Serialize;

use netstate_core::{Binding, PathTemplate, QueryOptions};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct Resolved {
    spec: String,
    query: String,
    request: serde_json::Value,
    bindings: Vec<Binding>,
}

pub fn handle(spec: &str, global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    let template = PathTemplate::parse(spec).map_err(netstate_core::CoreError::from)?;
    let options = QueryOptions::default();
    let query = template.query(options.data_type, options.encoding);

    let resolved = Resolved {
        spec: template.to_string(),
        query: query.path.to_string(),
        request: serde_json::to_value(query.to_request())?,
        bindings: template.bindings().to_vec(),
    };

    let rendered = match config::output_format(global, cfg) {
        OutputFormat::Yaml => output::render_yaml(&resolved)?,
        OutputFormat::JsonCompact => output::render_json(&resolved, true)?,
        OutputFormat::Text | OutputFormat::Table | OutputFormat::Json => {
            output::render_json(&resolved, false)?
        }
    };
    output::print_output(&rendered, global.quiet);
    Ok(())
}
